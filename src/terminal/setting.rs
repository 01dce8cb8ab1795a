//! Settings of the chart terminal.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;
use thiserror::Error;

use super::constant::{ChartType, Timeframe};
use super::utility::get_file_path;
use crate::chart::{Indicator, DEFAULT_VISIBLE, SCROLL_SPEED, ZOOM_SPEED};

/// Setting filename
pub const SETTING_FILENAME: &str = "chart_setting.json";

/// Default settings
fn default_settings() -> HashMap<String, SettingValue> {
    let mut settings = HashMap::new();

    // Chart settings
    settings.insert("chart.symbol".to_string(), SettingValue::String("AAPL".to_string()));
    settings.insert("chart.timeframe".to_string(), SettingValue::String("M30".to_string()));
    settings.insert("chart.type".to_string(), SettingValue::String("Candlestick".to_string()));
    settings.insert("chart.indicator".to_string(), SettingValue::String("EMA 25".to_string()));
    settings.insert("chart.visible_count".to_string(), SettingValue::Int(DEFAULT_VISIBLE as i64));
    settings.insert("chart.zoom_speed".to_string(), SettingValue::Int(ZOOM_SPEED));
    settings.insert("chart.scroll_speed".to_string(), SettingValue::Float(SCROLL_SPEED));
    settings.insert("chart.refresh_minutes".to_string(), SettingValue::Int(15));

    // Datafeed settings
    settings.insert("datafeed.name".to_string(), SettingValue::String("synthetic".to_string()));
    settings.insert("datafeed.path".to_string(), SettingValue::String(String::new()));

    // Log settings
    settings.insert("log.level".to_string(), SettingValue::Int(20)); // INFO level
    settings.insert("log.console".to_string(), SettingValue::Bool(true));
    settings.insert("log.file".to_string(), SettingValue::Bool(false));

    settings
}

/// Errors raised while reading or writing the setting file
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("setting file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("setting file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Setting value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl SettingValue {
    /// Get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as i64
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64
    pub fn as_float(&self) -> Option<f64> {
        match self {
            SettingValue::Float(f) => Some(*f),
            SettingValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Key/value settings store
pub struct Settings {
    settings: RwLock<HashMap<String, SettingValue>>,
}

impl Settings {
    /// Defaults overlaid with the setting file in the app directory, if any
    pub fn new() -> Self {
        let settings = Self::with_defaults();
        let filepath = get_file_path(SETTING_FILENAME);
        if filepath.exists() {
            if let Err(e) = settings.load_from(&filepath) {
                tracing::warn!(path = %filepath.display(), error = %e, "ignoring unreadable setting file");
            }
        }
        settings
    }

    /// Built-in defaults only
    pub fn with_defaults() -> Self {
        Self {
            settings: RwLock::new(default_settings()),
        }
    }

    /// Overlay values read from a JSON file
    pub fn load_from(&self, path: &Path) -> Result<(), SettingsError> {
        let content = fs::read_to_string(path)?;
        let file_settings: HashMap<String, SettingValue> = serde_json::from_str(&content)?;
        self.update(file_settings);
        Ok(())
    }

    /// Get a setting value
    pub fn get(&self, key: &str) -> Option<SettingValue> {
        self.settings.read().ok()?.get(key).cloned()
    }

    /// Get a string setting
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(|s| s.to_string()))
    }

    /// Get an integer setting
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_int())
    }

    /// Get a float setting
    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_float())
    }

    /// Get a bool setting
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    /// Set a setting value
    pub fn set(&self, key: impl Into<String>, value: SettingValue) {
        if let Ok(mut settings) = self.settings.write() {
            settings.insert(key.into(), value);
        }
    }

    /// Update settings from a map
    pub fn update(&self, new_settings: HashMap<String, SettingValue>) {
        if let Ok(mut settings) = self.settings.write() {
            settings.extend(new_settings);
        }
    }

    /// Get all settings as HashMap
    pub fn get_all(&self) -> HashMap<String, SettingValue> {
        self.settings.read()
            .map(|settings| settings.clone())
            .unwrap_or_default()
    }

    /// Save settings to the app directory
    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to(&get_file_path(SETTING_FILENAME))
    }

    /// Save settings to a file as pretty JSON
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(&self.get_all())?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// Typed chart configuration read from [`Settings`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub chart_type: ChartType,
    pub indicator: Indicator,
    pub visible_count: usize,
    pub zoom_speed: i64,
    pub scroll_speed: f64,
    pub refresh_minutes: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            symbol: "AAPL".to_string(),
            timeframe: Timeframe::M30,
            chart_type: ChartType::Candlestick,
            indicator: Indicator::Ema(25),
            visible_count: DEFAULT_VISIBLE,
            zoom_speed: ZOOM_SPEED,
            scroll_speed: SCROLL_SPEED,
            refresh_minutes: 15,
        }
    }
}

impl ChartConfig {
    /// Read the `chart.*` keys, keeping defaults for missing or malformed values.
    pub fn from_settings(settings: &Settings) -> Self {
        let default = Self::default();

        let symbol = settings
            .get_string("chart.symbol")
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or(default.symbol);

        let timeframe = parse_or(settings, "chart.timeframe", Timeframe::parse, default.timeframe);
        let chart_type = parse_or(settings, "chart.type", ChartType::parse, default.chart_type);
        let indicator = parse_or(settings, "chart.indicator", Indicator::parse, default.indicator);

        let visible_count = settings
            .get_int("chart.visible_count")
            .filter(|v| *v > 0)
            .map_or(default.visible_count, |v| v as usize);
        let zoom_speed = settings
            .get_int("chart.zoom_speed")
            .filter(|v| *v > 0)
            .unwrap_or(default.zoom_speed);
        let scroll_speed = settings
            .get_float("chart.scroll_speed")
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(default.scroll_speed);
        let refresh_minutes = settings
            .get_int("chart.refresh_minutes")
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(default.refresh_minutes);

        Self {
            symbol,
            timeframe,
            chart_type,
            indicator,
            visible_count,
            zoom_speed,
            scroll_speed,
            refresh_minutes,
        }
    }

    /// Write the configuration back into the store
    pub fn apply_to(&self, settings: &Settings) {
        settings.set("chart.symbol", SettingValue::String(self.symbol.clone()));
        settings.set("chart.timeframe", SettingValue::String(self.timeframe.value().to_string()));
        settings.set("chart.type", SettingValue::String(self.chart_type.value().to_string()));
        settings.set("chart.indicator", SettingValue::String(self.indicator.to_string()));
        settings.set("chart.visible_count", SettingValue::Int(self.visible_count as i64));
    }
}

fn parse_or<T>(settings: &Settings, key: &str, parse: impl Fn(&str) -> Option<T>, default: T) -> T {
    match settings.get_string(key) {
        Some(raw) => parse(&raw).unwrap_or_else(|| {
            tracing::warn!(key, value = %raw, "unrecognized setting value, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_value_types() {
        let s = SettingValue::String("test".to_string());
        assert_eq!(s.as_str(), Some("test"));

        let i = SettingValue::Int(42);
        assert_eq!(i.as_int(), Some(42));
        assert_eq!(i.as_float(), Some(42.0));

        let b = SettingValue::Bool(true);
        assert_eq!(b.as_bool(), Some(true));
        assert_eq!(b.as_str(), None);
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::with_defaults();
        assert_eq!(settings.get_string("chart.symbol").as_deref(), Some("AAPL"));
        assert_eq!(settings.get_int("chart.refresh_minutes"), Some(15));
        assert_eq!(settings.get_float("chart.scroll_speed"), Some(0.5));
        assert_eq!(ChartConfig::from_settings(&settings), ChartConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTING_FILENAME);

        let settings = Settings::with_defaults();
        settings.set("chart.symbol", SettingValue::String("MSFT".to_string()));
        settings.set("chart.indicator", SettingValue::String("SMA 20".to_string()));
        settings.save_to(&path).unwrap();

        let loaded = Settings::with_defaults();
        loaded.load_from(&path).unwrap();
        let config = ChartConfig::from_settings(&loaded);
        assert_eq!(config.symbol, "MSFT");
        assert_eq!(config.indicator, Indicator::Sma(20));
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTING_FILENAME);
        fs::write(&path, "{ not json").unwrap();

        let settings = Settings::with_defaults();
        assert!(matches!(settings.load_from(&path), Err(SettingsError::Json(_))));
        assert!(matches!(
            settings.load_from(&dir.path().join("missing.json")),
            Err(SettingsError::Io(_))
        ));
        // Defaults survive a failed load
        assert_eq!(settings.get_string("chart.symbol").as_deref(), Some("AAPL"));
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let settings = Settings::with_defaults();
        settings.set("chart.timeframe", SettingValue::String("M7".to_string()));
        settings.set("chart.indicator", SettingValue::String("RSI 14".to_string()));
        settings.set("chart.zoom_speed", SettingValue::Int(-3));
        settings.set("chart.refresh_minutes", SettingValue::String("soon".to_string()));
        settings.set("chart.type", SettingValue::String("line".to_string()));

        let config = ChartConfig::from_settings(&settings);
        assert_eq!(config.timeframe, Timeframe::M30);
        assert_eq!(config.indicator, Indicator::Ema(25));
        assert_eq!(config.zoom_speed, ZOOM_SPEED);
        assert_eq!(config.refresh_minutes, 15);
        assert_eq!(config.chart_type, ChartType::Line);
    }

    #[test]
    fn test_apply_round_trip() {
        let settings = Settings::with_defaults();
        let config = ChartConfig {
            symbol: "NVDA".to_string(),
            timeframe: Timeframe::D1,
            chart_type: ChartType::Ohlc,
            indicator: Indicator::None,
            ..ChartConfig::default()
        };
        config.apply_to(&settings);
        assert_eq!(ChartConfig::from_settings(&settings), config);
    }
}
