//! General constant enums used in the terminal.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bar interval of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timeframe {
    /// 1 minute
    M1,
    /// 5 minutes
    M5,
    /// 15 minutes
    M15,
    /// 30 minutes
    #[default]
    M30,
    /// 1 hour
    H1,
    /// Daily
    D1,
    /// Weekly
    W1,
}

impl Timeframe {
    /// Get timeframe value string
    pub fn value(&self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::D1 => "D1",
            Timeframe::W1 => "W1",
        }
    }

    /// Parse a value string such as `"M30"`, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|tf| tf.value().eq_ignore_ascii_case(value.trim()))
    }

    /// Length of one bar
    pub fn duration(&self) -> Duration {
        match self {
            Timeframe::M1 => Duration::minutes(1),
            Timeframe::M5 => Duration::minutes(5),
            Timeframe::M15 => Duration::minutes(15),
            Timeframe::M30 => Duration::minutes(30),
            Timeframe::H1 => Duration::hours(1),
            Timeframe::D1 => Duration::days(1),
            Timeframe::W1 => Duration::weeks(1),
        }
    }

    /// Whether bars are shorter than a trading day
    pub fn is_intraday(&self) -> bool {
        self.duration() < Duration::days(1)
    }

    /// Get all timeframes for UI selection
    pub fn all() -> Vec<Timeframe> {
        vec![
            Timeframe::M1,
            Timeframe::M5,
            Timeframe::M15,
            Timeframe::M30,
            Timeframe::H1,
            Timeframe::D1,
            Timeframe::W1,
        ]
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// How bars are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChartType {
    #[default]
    Candlestick,
    Line,
    Ohlc,
}

impl ChartType {
    pub fn value(&self) -> &'static str {
        match self {
            ChartType::Candlestick => "Candlestick",
            ChartType::Line => "Line",
            ChartType::Ohlc => "OHLC",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|ct| ct.value().eq_ignore_ascii_case(value.trim()))
    }

    pub fn all() -> Vec<ChartType> {
        vec![ChartType::Candlestick, ChartType::Line, ChartType::Ohlc]
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_value() {
        assert_eq!(Timeframe::M30.value(), "M30");
        assert_eq!(Timeframe::parse("h1"), Some(Timeframe::H1));
        assert_eq!(Timeframe::parse("M2"), None);
    }

    #[test]
    fn test_timeframe_intraday() {
        assert!(Timeframe::M1.is_intraday());
        assert!(Timeframe::H1.is_intraday());
        assert!(!Timeframe::D1.is_intraday());
        assert!(!Timeframe::W1.is_intraday());
        assert_eq!(Timeframe::M15.duration(), Duration::minutes(15));
    }

    #[test]
    fn test_chart_type_parse() {
        assert_eq!(ChartType::parse("ohlc"), Some(ChartType::Ohlc));
        assert_eq!(ChartType::parse("Candlestick"), Some(ChartType::Candlestick));
        assert_eq!(ChartType::parse("Bars"), None);
        assert_eq!(ChartType::default().to_string(), "Candlestick");
    }
}
