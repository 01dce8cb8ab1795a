//! Bar series storage for the chart module.
//!
//! Holds the ordered bar sequence of the active (symbol, timeframe) and
//! answers index and range queries over it. Every index-based computation
//! downstream relies on the ordering checked at ingestion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One OHLCV observation for a fixed time interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self { timestamp, open, high, low, close, volume }
    }

    /// Whether the bar closed at or above its open.
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }
}

/// Raised when a bar sequence is not strictly ordered by timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSeriesError {
    #[error("bar {index} at {timestamp} precedes the previous bar at {previous}")]
    OutOfOrder {
        index: usize,
        previous: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
    #[error("bar {index} repeats timestamp {timestamp}")]
    DuplicateTimestamp { index: usize, timestamp: DateTime<Utc> },
}

/// Check that `bars` is strictly increasing by timestamp.
pub fn validate_bars(bars: &[Bar]) -> Result<(), InvalidSeriesError> {
    for (index, pair) in bars.windows(2).enumerate() {
        let (previous, current) = (pair[0].timestamp, pair[1].timestamp);
        if current == previous {
            return Err(InvalidSeriesError::DuplicateTimestamp {
                index: index + 1,
                timestamp: current,
            });
        }
        if current < previous {
            return Err(InvalidSeriesError::OutOfOrder {
                index: index + 1,
                previous,
                timestamp: current,
            });
        }
    }
    Ok(())
}

/// Ordered, deduplicated bar sequence
#[derive(Debug, Clone, Default)]
pub struct SeriesBuffer {
    bars: Vec<Bar>,
}

impl SeriesBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new sequence, replacing the current one.
    ///
    /// The stored sequence is left untouched when validation fails.
    pub fn replace(&mut self, bars: Vec<Bar>) -> Result<(), InvalidSeriesError> {
        validate_bars(&bars)?;
        self.bars = bars;
        Ok(())
    }

    /// Append bars newer than the last stored one.
    ///
    /// Bars at or before the newest stored timestamp are already known and
    /// skipped. Returns the number of bars appended.
    pub fn append(&mut self, bars: Vec<Bar>) -> Result<usize, InvalidSeriesError> {
        validate_bars(&bars)?;
        let newest = self.bars.last().map(|bar| bar.timestamp);
        let before = self.bars.len();
        self.bars.extend(
            bars.into_iter()
                .filter(|bar| newest.map_or(true, |newest| bar.timestamp > newest)),
        );
        Ok(self.bars.len() - before)
    }

    /// Get total number of bars
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Get the bar at an index
    pub fn at(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Get bars in `[start, end)`, with both bounds clamped to `[0, len]`.
    pub fn slice(&self, start: usize, end: usize) -> &[Bar] {
        let end = end.min(self.bars.len());
        let start = start.min(end);
        &self.bars[start..end]
    }

    /// Get all bar data
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Lowest low and highest high over `[start, end)`, if any bar is in range.
    pub fn price_range(&self, start: usize, end: usize) -> Option<(f64, f64)> {
        let bars = self.slice(start, end);
        let first = bars.first()?;

        Some(bars.iter().skip(1).fold((first.low, first.high), |(low, high), bar| {
            (low.min(bar.low), high.max(bar.high))
        }))
    }

    /// Clear all data
    pub fn clear(&mut self) {
        self.bars.clear();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    pub(crate) fn make_bars(count: usize, price: impl Fn(usize) -> f64) -> Vec<Bar> {
        let origin = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
        (0..count)
            .map(|i| {
                let close = price(i);
                Bar::new(origin + Duration::minutes(30 * i as i64), close, close + 1.0, close - 1.0, close, 1000.0)
            })
            .collect()
    }

    #[test]
    fn test_replace_and_query() {
        let mut buffer = SeriesBuffer::new();
        buffer.replace(make_bars(10, |i| 100.0 + i as f64)).unwrap();

        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.at(3).map(|b| b.close), Some(103.0));
        assert!(buffer.at(10).is_none());
        assert_eq!(buffer.slice(8, 20).len(), 2);
        assert_eq!(buffer.slice(12, 20).len(), 0);
        assert_eq!(buffer.slice(5, 2).len(), 0);
    }

    #[test]
    fn test_replace_rejects_out_of_order() {
        let mut buffer = SeriesBuffer::new();
        buffer.replace(make_bars(3, |_| 1.0)).unwrap();

        let mut bars = make_bars(5, |_| 2.0);
        bars.swap(1, 3);
        let err = buffer.replace(bars).unwrap_err();
        assert!(matches!(err, InvalidSeriesError::OutOfOrder { index: 2, .. }));
        // Previous sequence survives a rejected replace
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_replace_rejects_duplicates() {
        let mut bars = make_bars(4, |_| 2.0);
        bars[2].timestamp = bars[1].timestamp;
        let err = SeriesBuffer::new().replace(bars).unwrap_err();
        assert!(matches!(err, InvalidSeriesError::DuplicateTimestamp { index: 2, .. }));
    }

    #[test]
    fn test_append_skips_known_bars() {
        let all = make_bars(8, |i| i as f64);
        let mut buffer = SeriesBuffer::new();
        buffer.replace(all[..5].to_vec()).unwrap();

        let appended = buffer.append(all[3..].to_vec()).unwrap();
        assert_eq!(appended, 3);
        assert_eq!(buffer.len(), 8);
        assert_eq!(buffer.last().map(|b| b.close), Some(7.0));
    }

    #[test]
    fn test_price_range() {
        let mut buffer = SeriesBuffer::new();
        buffer.replace(make_bars(5, |i| 100.0 + i as f64 * 2.0)).unwrap();

        assert_eq!(buffer.price_range(0, 5), Some((99.0, 109.0)));
        assert_eq!(buffer.price_range(1, 3), Some((101.0, 105.0)));
        assert_eq!(buffer.price_range(5, 5), None);
    }
}
