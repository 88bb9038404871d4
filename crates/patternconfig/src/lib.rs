use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

use pattern_kernel::WORKGROUP_SIZE;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Reference workgroup counts: a 1000×1000 grid at 10×10 invocations per group.
pub const DEFAULT_WORKGROUPS: [u32; 2] = [100, 100];

#[derive(Debug, Clone, Deserialize)]
pub struct PatternConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub pattern: PatternSection,
    #[serde(default)]
    pub dispatch: DispatchSection,
    #[serde(default)]
    pub clock: ClockSection,
    #[serde(default)]
    pub window: WindowSection,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            pattern: PatternSection::default(),
            dispatch: DispatchSection::default(),
            clock: ClockSection::default(),
            window: WindowSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatternSection {
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_band_width")]
    pub band_width: f32,
}

impl Default for PatternSection {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            band_width: default_band_width(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSection {
    #[serde(default = "default_workgroups")]
    pub workgroups: [u32; 2],
    /// Output texture size; the grid extent is used when absent.
    #[serde(default)]
    pub surface: Option<[u32; 2]>,
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            workgroups: DEFAULT_WORKGROUPS,
            surface: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClockSection {
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,
    #[serde(default, deserialize_with = "deserialize_duration")]
    pub start_offset: Duration,
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub fixed_step: Option<Duration>,
}

impl Default for ClockSection {
    fn default() -> Self {
        Self {
            time_scale: default_time_scale(),
            start_offset: Duration::ZERO,
            fixed_step: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSetting {
    Low,
    #[default]
    High,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowSection {
    #[serde(default = "default_title")]
    pub title: String,
    /// Window size; the output texture size is used when absent.
    #[serde(default)]
    pub size: Option<[u32; 2]>,
    #[serde(default = "default_vsync")]
    pub vsync: bool,
    #[serde(default)]
    pub power: PowerSetting,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            title: default_title(),
            size: None,
            vsync: default_vsync(),
            power: PowerSetting::default(),
        }
    }
}

fn default_version() -> u32 {
    1
}

fn default_speed() -> f32 {
    100.0
}

fn default_band_width() -> f32 {
    1000.0
}

fn default_workgroups() -> [u32; 2] {
    DEFAULT_WORKGROUPS
}

fn default_time_scale() -> f32 {
    1.0
}

fn default_title() -> String {
    "scrollband".to_string()
}

fn default_vsync() -> bool {
    true
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_duration_opt(deserializer).map(|d| d.unwrap_or(Duration::ZERO))
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl PatternConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: PatternConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Loads `path` when it exists, otherwise falls back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Grid extent implied by the workgroup counts and the kernel's workgroup size.
    pub fn grid_size(&self) -> [u32; 2] {
        let [x, y] = self.dispatch.workgroups;
        [
            x.saturating_mul(WORKGROUP_SIZE.x),
            y.saturating_mul(WORKGROUP_SIZE.y),
        ]
    }

    /// Output texture size, defaulting to the grid extent.
    pub fn surface_size(&self) -> [u32; 2] {
        self.dispatch.surface.unwrap_or_else(|| self.grid_size())
    }

    /// Window size, defaulting to the output texture size.
    pub fn window_size(&self) -> [u32; 2] {
        self.window.size.unwrap_or_else(|| self.surface_size())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if !self.pattern.speed.is_finite() {
            return Err(ConfigError::Invalid("pattern.speed must be finite".into()));
        }

        if !self.pattern.band_width.is_finite() || self.pattern.band_width <= 0.0 {
            return Err(ConfigError::Invalid(
                "pattern.band_width must be greater than zero".into(),
            ));
        }

        let [wx, wy] = self.dispatch.workgroups;
        if wx == 0 || wy == 0 {
            return Err(ConfigError::Invalid(format!(
                "dispatch.workgroups must be non-zero on both axes (got {wx}x{wy})"
            )));
        }
        if wx.checked_mul(WORKGROUP_SIZE.x).is_none()
            || wy.checked_mul(WORKGROUP_SIZE.y).is_none()
        {
            return Err(ConfigError::Invalid(format!(
                "dispatch.workgroups {wx}x{wy} overflows the grid extent"
            )));
        }

        if let Some([w, h]) = self.dispatch.surface {
            if w == 0 || h == 0 {
                return Err(ConfigError::Invalid(format!(
                    "dispatch.surface must be non-zero on both axes (got {w}x{h})"
                )));
            }
        }

        if !self.clock.time_scale.is_finite() {
            return Err(ConfigError::Invalid("clock.time_scale must be finite".into()));
        }

        if let Some(step) = self.clock.fixed_step {
            if step.is_zero() {
                return Err(ConfigError::Invalid(
                    "clock.fixed_step must be greater than zero".into(),
                ));
            }
        }

        if let Some([w, h]) = self.window.size {
            if w == 0 || h == 0 {
                return Err(ConfigError::Invalid(format!(
                    "window.size must be non-zero on both axes (got {w}x{h})"
                )));
            }
        }

        if self.window.title.trim().is_empty() {
            return Err(ConfigError::Invalid("window.title may not be empty".into()));
        }

        Ok(())
    }
}
