//! Periodic chart refresh.
//!
//! [`RefreshSchedule`] decides when the next refresh is due. [`RefreshWorker`]
//! runs datafeed queries on the tokio runtime and hands the results back to
//! the UI thread, which owns the series and applies them between frames.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use tokio::runtime::Handle;

use super::datafeed::{fetch_bars, BarRequest, BaseDatafeed};
use crate::chart::Bar;

/// Wall-clock aligned refresh timer.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshSchedule {
    period: Duration,
    next: DateTime<Utc>,
}

impl RefreshSchedule {
    /// Schedule refreshes every `period_minutes`, aligned to multiples of
    /// the period (minute 0/15/30/45 for the default quarter hour).
    pub fn new(period_minutes: u32, now: DateTime<Utc>) -> Self {
        let period = Duration::minutes(i64::from(period_minutes.max(1)));
        let mut schedule = Self { period, next: now };
        schedule.next = schedule.next_after(now);
        schedule
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// First aligned instant strictly after `now`, seconds zeroed.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let period_secs = self.period.num_seconds();
        let secs = (now.timestamp().div_euclid(period_secs) + 1) * period_secs;
        Utc.timestamp_opt(secs, 0).single().unwrap_or(now + self.period)
    }

    /// Next scheduled refresh
    pub fn next(&self) -> DateTime<Utc> {
        self.next
    }

    /// Whether a refresh is due at `now`; advances the schedule when it is.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        if now < self.next {
            return false;
        }
        self.next = self.next_after(now);
        true
    }

    /// Time left until the next refresh, zero when overdue
    pub fn time_until(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.next - now).to_std().unwrap_or_default()
    }
}

/// Bars delivered by a finished refresh
#[derive(Debug, Clone)]
pub struct RefreshResult {
    pub request: BarRequest,
    pub bars: Vec<Bar>,
    /// Sequence number of the request that produced this result
    pub generation: u64,
}

/// Runs datafeed queries off the UI thread.
pub struct RefreshWorker {
    handle: Handle,
    feed: Arc<dyn BaseDatafeed>,
    sender: Sender<RefreshResult>,
    receiver: Receiver<RefreshResult>,
    generation: u64,
}

impl RefreshWorker {
    pub fn new(handle: Handle, feed: Arc<dyn BaseDatafeed>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            handle,
            feed,
            sender,
            receiver,
            generation: 0,
        }
    }

    /// Start a query. Results of earlier requests still in flight are
    /// dropped when they arrive.
    pub fn request(&mut self, request: BarRequest) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        let feed = self.feed.clone();
        let sender = self.sender.clone();

        tracing::debug!(symbol = %request.symbol, timeframe = %request.timeframe, generation, "refresh requested");
        self.handle.spawn(async move {
            let bars = fetch_bars(feed.as_ref(), &request).await;
            // The receiver is gone once the UI shut down
            let _ = sender.send(RefreshResult { request, bars, generation });
        });
        generation
    }

    /// Latest result of the newest request, if one arrived. Never blocks.
    pub fn try_recv(&mut self) -> Option<RefreshResult> {
        let mut latest = None;
        while let Ok(result) = self.receiver.try_recv() {
            if result.generation == self.generation {
                latest = Some(result);
            } else {
                tracing::debug!(generation = result.generation, "dropping stale refresh result");
            }
        }
        latest
    }

    /// Block up to `timeout` for the result of the newest request.
    pub fn wait(&mut self, timeout: std::time::Duration) -> Option<RefreshResult> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(std::time::Instant::now());
            let result = self.receiver.recv_timeout(left).ok()?;
            if result.generation == self.generation {
                return Some(result);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::constant::Timeframe;
    use crate::terminal::datafeed::{EmptyDatafeed, SyntheticDatafeed};

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, hour, minute, second).unwrap()
    }

    #[test]
    fn test_next_quarter_hour() {
        let schedule = RefreshSchedule::new(15, at(10, 2, 11));
        assert_eq!(schedule.next(), at(10, 15, 0));
        assert_eq!(schedule.next_after(at(10, 15, 0)), at(10, 30, 0));
        assert_eq!(schedule.next_after(at(10, 47, 59)), at(11, 0, 0));
        assert_eq!(schedule.next_after(at(23, 59, 0)), Utc.with_ymd_and_hms(2024, 6, 4, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_poll_advances() {
        let mut schedule = RefreshSchedule::new(15, at(10, 2, 0));
        assert!(!schedule.poll(at(10, 14, 59)));
        assert!(schedule.poll(at(10, 15, 0)));
        assert_eq!(schedule.next(), at(10, 30, 0));
        assert!(!schedule.poll(at(10, 16, 0)));

        // A long stall fires once, then realigns
        assert!(schedule.poll(at(12, 7, 0)));
        assert_eq!(schedule.next(), at(12, 15, 0));
        assert_eq!(schedule.time_until(at(12, 14, 0)), std::time::Duration::from_secs(60));
        assert_eq!(schedule.time_until(at(13, 0, 0)), std::time::Duration::ZERO);
    }

    #[test]
    fn test_worker_delivers_newest_result() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let feed: Arc<dyn BaseDatafeed> = Arc::new(SyntheticDatafeed::new(5, 300).with_end(at(16, 0, 0)));
        let mut worker = RefreshWorker::new(runtime.handle().clone(), feed);

        worker.request(BarRequest::new("AAPL", Timeframe::M30));
        let newest = worker.request(BarRequest::new("MSFT", Timeframe::H1));

        let result = worker.wait(std::time::Duration::from_secs(5)).unwrap();
        assert_eq!(result.generation, newest);
        assert_eq!(result.request.symbol, "MSFT");
        assert_eq!(result.bars.len(), 300);

        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(worker.try_recv().is_none());
    }

    #[test]
    fn test_worker_failure_yields_empty() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut worker = RefreshWorker::new(runtime.handle().clone(), Arc::new(EmptyDatafeed));

        worker.request(BarRequest::new("AAPL", Timeframe::M30));
        let result = worker.wait(std::time::Duration::from_secs(5)).unwrap();
        assert!(result.bars.is_empty());
    }
}
