//! TOML-based scenario configuration and preset definitions.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;

use crate::catalog::{BaseLoad, DeviceRecord, LoadCatalog};
use crate::error::DataShapeError;
use crate::forecast::{CsvForecast, ForecastSource, Site, SyntheticSolar};
use crate::schedule::engine::Scheduler;
use crate::schedule::types::SLOTS_PER_DAY;

/// Top-level scenario configuration parsed from TOML.
///
/// All sections have defaults matching the campus scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::campus`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Location and reference time zone.
    #[serde(default)]
    pub site: SiteConfig,
    /// Scheduler parameters.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Forecast source and synthetic curve parameters.
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Fixed base consumption.
    #[serde(default)]
    pub base_load: BaseLoadConfig,
    /// Load catalog entries, in catalog order.
    #[serde(default)]
    pub devices: Vec<DeviceRecord>,
}

/// Location and reference time zone.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Display name.
    pub name: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// IANA zone the day's slots are laid out in.
    pub timezone: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Nairobi campus".to_string(),
            latitude: -1.2921,
            longitude: 36.8219,
            timezone: "Africa/Nairobi".to_string(),
        }
    }
}

/// Scheduler parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Per-slot ceiling on total draw (kW); `0` disables it.
    pub capacity_kw: f32,
}

/// Forecast source and synthetic curve parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// `"synthetic"` or `"csv"`.
    pub source: String,
    /// CSV file for the `csv` source.
    pub path: Option<PathBuf>,
    /// Interval each input point covers (minutes).
    pub cadence_minutes: u32,
    /// How long a fetched forecast is reused (seconds).
    pub cache_ttl_seconds: u64,
    /// Synthetic: generation in the best slot (Wh).
    pub peak_wh: f32,
    /// Synthetic: first daylight slot (inclusive).
    pub sunrise_slot: usize,
    /// Synthetic: first dark slot after daylight (exclusive).
    pub sunset_slot: usize,
    /// Synthetic: noise standard deviation as a fraction of output.
    pub noise_std: f32,
    /// Synthetic: random seed.
    pub seed: u64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            source: "synthetic".to_string(),
            path: None,
            cadence_minutes: 30,
            cache_ttl_seconds: 900,
            peak_wh: 15_000.0,
            sunrise_slot: 13,
            sunset_slot: 38,
            noise_std: 0.05,
            seed: 42,
        }
    }
}

/// Fixed base consumption.
///
/// `profile_kw`, when given, wins over the sinusoidal parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BaseLoadConfig {
    /// Mean draw (kW).
    pub kw: f32,
    /// Daily swing amplitude (kW).
    pub amp_kw: f32,
    /// Phase offset (radians).
    pub phase_rad: f32,
    /// Explicit 24 hourly or 48 half-hourly values (kW).
    pub profile_kw: Option<Vec<f32>>,
}

impl Default for BaseLoadConfig {
    fn default() -> Self {
        Self {
            kw: 4.0,
            amp_kw: 1.5,
            phase_rad: 1.2,
            profile_kw: None,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"forecast.sunrise_slot"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn device(
    name: &str,
    power_kw: f32,
    duration_slots: usize,
    window: Option<(usize, usize)>,
    priority: u32,
) -> DeviceRecord {
    DeviceRecord {
        name: Some(name.to_string()),
        power_kw: Some(power_kw),
        duration_slots: Some(duration_slots),
        earliest_slot: window.map(|w| w.0),
        latest_slot: window.map(|w| w.1),
        priority: Some(priority),
        kind: None,
    }
}

impl ScenarioConfig {
    /// Returns the campus scenario: five shiftable loads, no ceiling.
    pub fn campus() -> Self {
        Self {
            site: SiteConfig::default(),
            scheduler: SchedulerConfig::default(),
            forecast: ForecastConfig::default(),
            base_load: BaseLoadConfig::default(),
            devices: vec![
                device("water_pump", 3.0, 4, Some((12, 35)), 1),
                device("lab_chiller", 5.0, 6, Some((14, 33)), 2),
                device("ev_fleet_charger", 7.0, 4, None, 3),
                device("laundry", 2.5, 3, Some((16, 39)), 4),
                device("dishwasher", 1.5, 2, Some((30, 45)), 5),
            ],
        }
    }

    /// Returns the constrained preset: the campus loads under a tight
    /// per-slot ceiling.
    pub fn constrained() -> Self {
        Self {
            scheduler: SchedulerConfig { capacity_kw: 12.0 },
            ..Self::campus()
        }
    }

    /// Returns the empty preset: base load only.
    pub fn empty() -> Self {
        Self {
            devices: Vec::new(),
            ..Self::campus()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["campus", "constrained", "empty"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "campus" => Ok(Self::campus()),
            "constrained" => Ok(Self::constrained()),
            "empty" => Ok(Self::empty()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Forecast location.
    pub fn site(&self) -> Site {
        Site {
            latitude: self.site.latitude,
            longitude: self.site.longitude,
        }
    }

    /// Parsed reference time zone.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `site.timezone` is not an IANA zone name.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.site
            .timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::new("site.timezone", format!("{e}")))
    }

    /// Base load profile described by `[base_load]`.
    ///
    /// # Errors
    ///
    /// Returns a [`DataShapeError`] for a malformed explicit profile.
    pub fn base_load(&self) -> Result<BaseLoad, DataShapeError> {
        let b = &self.base_load;
        match &b.profile_kw {
            Some(values) => BaseLoad::from_profile(values),
            None => Ok(BaseLoad::sinusoidal(b.kw, b.amp_kw, b.phase_rad)),
        }
    }

    /// Builds the validated load catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`DataShapeError`] for missing or invalid device fields.
    pub fn build_catalog(&self) -> Result<LoadCatalog, DataShapeError> {
        LoadCatalog::from_records(self.devices.clone(), self.base_load()?)
    }

    /// Scheduler with the configured ceiling.
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(Some(self.scheduler.capacity_kw))
    }

    /// Configured forecast provider.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an unknown source or a CSV source
    /// without a path.
    pub fn forecast_source(&self) -> Result<ForecastSource, ConfigError> {
        let f = &self.forecast;
        match f.source.as_str() {
            "synthetic" => Ok(ForecastSource::Synthetic(SyntheticSolar::new(
                f.peak_wh,
                f.sunrise_slot,
                f.sunset_slot,
                f.noise_std,
                f.seed,
            ))),
            "csv" => f
                .path
                .clone()
                .map(|path| ForecastSource::Csv(CsvForecast { path }))
                .ok_or_else(|| ConfigError::new("forecast.path", "required for source \"csv\"")),
            other => Err(ConfigError::new(
                "forecast.source",
                format!("must be \"synthetic\" or \"csv\", got \"{other}\""),
            )),
        }
    }

    /// Lifetime of cached forecasts.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.forecast.cache_ttl_seconds)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. Device window
    /// constraints are not checked here; the scheduler reports those per
    /// device.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let site = &self.site;
        if !(-90.0..=90.0).contains(&site.latitude) {
            errors.push(ConfigError::new("site.latitude", "must be in [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&site.longitude) {
            errors.push(ConfigError::new("site.longitude", "must be in [-180, 180]"));
        }
        if let Err(e) = self.timezone() {
            errors.push(e);
        }

        let cap = self.scheduler.capacity_kw;
        if !cap.is_finite() || cap < 0.0 {
            errors.push(ConfigError::new(
                "scheduler.capacity_kw",
                "must be >= 0 (0 disables the ceiling)",
            ));
        }

        let f = &self.forecast;
        if let Err(e) = self.forecast_source() {
            errors.push(e);
        }
        if f.cadence_minutes == 0 {
            errors.push(ConfigError::new("forecast.cadence_minutes", "must be > 0"));
        }
        if f.sunrise_slot >= f.sunset_slot {
            errors.push(ConfigError::new(
                "forecast.sunrise_slot",
                "must be < forecast.sunset_slot",
            ));
        }
        if f.sunset_slot > SLOTS_PER_DAY {
            errors.push(ConfigError::new(
                "forecast.sunset_slot",
                format!("must be <= {SLOTS_PER_DAY}"),
            ));
        }
        if f.peak_wh < 0.0 {
            errors.push(ConfigError::new("forecast.peak_wh", "must be >= 0"));
        }
        if f.noise_std < 0.0 {
            errors.push(ConfigError::new("forecast.noise_std", "must be >= 0"));
        }

        if self.base_load.kw < 0.0 {
            errors.push(ConfigError::new("base_load.kw", "must be >= 0"));
        }
        if let Err(e) = self.base_load() {
            errors.push(ConfigError::new("base_load.profile_kw", e.to_string()));
        }

        let mut names = HashSet::new();
        for (i, record) in self.devices.iter().enumerate() {
            match record.clone().into_device(i) {
                Ok(d) => {
                    if !names.insert(d.name.clone()) {
                        errors.push(ConfigError::new(
                            format!("devices[{i}].name"),
                            format!("duplicate device name \"{}\"", d.name),
                        ));
                    }
                }
                Err(e) => errors.push(ConfigError::new(format!("devices[{i}]"), e.to_string())),
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campus_preset_valid() {
        let cfg = ScenarioConfig::campus();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "campus should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent").unwrap_err();
        assert!(err.message.contains("unknown preset"));
        assert!(err.to_string().starts_with("config error: preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[site]
name = "Test site"
latitude = 10.0
longitude = 20.0
timezone = "Europe/Berlin"

[scheduler]
capacity_kw = 8.0

[forecast]
source = "synthetic"
cadence_minutes = 60
peak_wh = 5000.0
sunrise_slot = 12
sunset_slot = 40

[base_load]
profile_kw = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0,
              2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0, 1.0, 1.0, 1.0]

[[devices]]
name = "pump"
power_kw = 2.0
duration_slots = 3
earliest_slot = 10
latest_slot = 30
priority = 1

[[devices]]
name = "fridge"
power_kw = 0.2
kind = "base"
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        assert!(cfg.validate().is_empty(), "{:?}", cfg.validate());
        assert_eq!(cfg.timezone().unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(cfg.scheduler().capacity_kw(), Some(8.0));
        let catalog = cfg.build_catalog().unwrap();
        assert_eq!(catalog.controllable().len(), 1);
        assert!((catalog.base_load().kw_at(36) - 3.2).abs() < 1e-5);
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[scheduler]
capacity_kw = 3.0
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[forecast]
seed = 99
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.forecast.seed, 99);
        assert_eq!(cfg.forecast.cache_ttl_seconds, 900);
        assert_eq!(cfg.site.timezone, "Africa/Nairobi");
        assert!(cfg.devices.is_empty());
    }

    #[test]
    fn validation_catches_bad_timezone() {
        let mut cfg = ScenarioConfig::campus();
        cfg.site.timezone = "Mars/Olympus".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "site.timezone"));
    }

    #[test]
    fn validation_catches_csv_without_path() {
        let mut cfg = ScenarioConfig::campus();
        cfg.forecast.source = "csv".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "forecast.path"));
    }

    #[test]
    fn validation_catches_daylight_window() {
        let mut cfg = ScenarioConfig::campus();
        cfg.forecast.sunrise_slot = 40;
        cfg.forecast.sunset_slot = 50;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "forecast.sunset_slot"));
    }

    #[test]
    fn validation_reports_every_bad_device() {
        let mut cfg = ScenarioConfig::campus();
        cfg.devices[1].priority = None;
        cfg.devices[3].power_kw = Some(-1.0);
        cfg.devices[4].name = Some("water_pump".to_string());
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"devices[1]".to_string()));
        assert!(fields.contains(&"devices[3]".to_string()));
        assert!(fields.contains(&"devices[4].name".to_string()));
    }

    #[test]
    fn negative_capacity_rejected() {
        let mut cfg = ScenarioConfig::campus();
        cfg.scheduler.capacity_kw = -1.0;
        assert!(
            cfg.validate()
                .iter()
                .any(|e| e.field == "scheduler.capacity_kw")
        );
    }

    #[test]
    fn constrained_preset_has_ceiling() {
        assert_eq!(ScenarioConfig::campus().scheduler().capacity_kw(), None);
        assert_eq!(
            ScenarioConfig::constrained().scheduler().capacity_kw(),
            Some(12.0)
        );
    }

    #[test]
    fn empty_preset_builds_base_only_catalog() {
        let catalog = ScenarioConfig::empty().build_catalog().unwrap();
        assert!(catalog.controllable().is_empty());
        assert!(catalog.base_load().kw_at(0) > 0.0);
    }
}
