//! Platform pieces around the chart: settings, logging, data sources and
//! the refresh loop.

pub mod cache;
pub mod constant;
pub mod datafeed;
pub mod logger;
pub mod refresh;
pub mod setting;
pub mod utility;

pub use cache::TtlCache;
pub use constant::{ChartType, Timeframe};
pub use datafeed::{
    create_datafeed, fetch_bars, BarRequest, BaseDatafeed, CachedDatafeed, DatafeedError, EmptyDatafeed,
    JsonFileDatafeed, SyntheticDatafeed,
};
pub use logger::{init_logger, level_from_int};
pub use refresh::{RefreshResult, RefreshSchedule, RefreshWorker};
pub use setting::{ChartConfig, SettingValue, Settings, SettingsError};
