//! Technical overlays for the price chart.
//!
//! Overlays are derived data: they are recomputed from the full series when
//! the series or the active indicator changes, then sliced to the visible
//! window with the same start index as the bars.

use std::fmt;
use std::ops::Range;

use super::base::{Rgba, EMA_FAST_COLOR, EMA_SLOW_COLOR, SMA_COLOR};
use super::series::SeriesBuffer;

/// EMA periods offered in the indicator menu.
pub const EMA_PRESETS: [usize; 5] = [10, 25, 50, 100, 200];

/// SMA period offered in the indicator menu.
pub const SMA_PRESET: usize = 20;

/// Active overlay selection. At most one is shown at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Indicator {
    #[default]
    None,
    Ema(usize),
    Sma(usize),
}

impl Indicator {
    /// Parse a menu label such as `"EMA 25"`, `"SMA 20"` or `"None"`.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("none") || label.is_empty() {
            return Some(Indicator::None);
        }

        let mut parts = label.split_whitespace();
        let kind = parts.next()?;
        let period: usize = parts.next()?.parse().ok()?;
        if parts.next().is_some() || period == 0 {
            return None;
        }

        match kind.to_ascii_uppercase().as_str() {
            "EMA" => Some(Indicator::Ema(period)),
            "SMA" | "MA" => Some(Indicator::Sma(period)),
            _ => None,
        }
    }

    /// Every selection the indicator menu offers.
    pub fn presets() -> Vec<Indicator> {
        std::iter::once(Indicator::None)
            .chain(EMA_PRESETS.iter().map(|&p| Indicator::Ema(p)))
            .chain(std::iter::once(Indicator::Sma(SMA_PRESET)))
            .collect()
    }

    pub fn period(&self) -> Option<usize> {
        match self {
            Indicator::None => None,
            Indicator::Ema(period) | Indicator::Sma(period) => Some(*period),
        }
    }

    pub fn color(&self) -> Rgba {
        match self {
            Indicator::Ema(period) if *period >= 100 => EMA_SLOW_COLOR,
            Indicator::Ema(_) => EMA_FAST_COLOR,
            Indicator::Sma(_) | Indicator::None => SMA_COLOR,
        }
    }

    /// Compute the overlay over the whole series.
    ///
    /// Returns `None` for [`Indicator::None`] and when the series is shorter
    /// than the period.
    pub fn compute(&self, series: &SeriesBuffer) -> Option<IndicatorSeries> {
        let (values, offset) = match *self {
            Indicator::None => return None,
            Indicator::Ema(period) => (compute_ema(series, period)?, 0),
            Indicator::Sma(period) => (compute_sma(series, period)?, period - 1),
        };
        Some(IndicatorSeries { indicator: *self, values, offset })
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indicator::None => write!(f, "None"),
            Indicator::Ema(period) => write!(f, "EMA {}", period),
            Indicator::Sma(period) => write!(f, "SMA {}", period),
        }
    }
}

/// Exponential moving average of closes, same length as the series.
///
/// Seeded with the first close, then smoothed with `k = 2 / (period + 1)`.
pub fn compute_ema(series: &SeriesBuffer, period: usize) -> Option<Vec<f64>> {
    if period == 0 || series.len() < period {
        return None;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(series.len());
    let mut ema = series.bars()[0].close;
    values.push(ema);

    for bar in &series.bars()[1..] {
        ema = bar.close * k + ema * (1.0 - k);
        values.push(ema);
    }

    Some(values)
}

/// Simple moving average of closes, `len - period + 1` values.
///
/// Value `j` averages closes `[j, j + period)`, so it belongs to bar
/// `j + period - 1`.
pub fn compute_sma(series: &SeriesBuffer, period: usize) -> Option<Vec<f64>> {
    if period == 0 || series.len() < period {
        return None;
    }

    let values = series
        .bars()
        .windows(period)
        .map(|window| window.iter().map(|bar| bar.close).sum::<f64>() / period as f64)
        .collect();

    Some(values)
}

/// Overlay values aligned to bar indices.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator: Indicator,
    values: Vec<f64>,
    /// Bar index of `values[0]`
    offset: usize,
}

impl IndicatorSeries {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Value belonging to a bar, if the overlay covers it.
    pub fn value_at(&self, bar_index: usize) -> Option<f64> {
        bar_index
            .checked_sub(self.offset)
            .and_then(|i| self.values.get(i))
            .copied()
    }

    /// `(bar index, value)` pairs inside the visible bar range.
    pub fn visible(&self, range: Range<usize>) -> Vec<(usize, f64)> {
        let start = range.start.max(self.offset);
        let end = range.end.min(self.offset + self.values.len());
        (start..end)
            .map(|index| (index, self.values[index - self.offset]))
            .collect()
    }
}
