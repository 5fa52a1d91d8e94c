//! Tray configuration
//!
//! All fields have defaults, so an empty TOML table is a valid config and a
//! missing config file means "use the defaults".

use crate::error::ConfigError;
use chrono::TimeDelta;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

/// Upload category used for story media
pub const DEFAULT_UPLOAD_CATEGORY: &str = "stories";

/// Story tray configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrayConfig {
    /// How long a story stays visible
    pub retention_secs: u64,
    /// Auto-advance delay for images
    pub image_advance_ms: u64,
    /// Auto-advance delay for videos
    pub video_advance_ms: u64,
    /// How often the driver re-checks expiry
    pub expiry_check_ms: u64,
    /// Destination category passed to the uploader
    pub upload_category: String,
}

impl TrayConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With retention window
    #[inline]
    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention_secs = retention.as_secs();
        self
    }

    /// With auto-advance delays
    #[inline]
    #[must_use]
    pub fn with_advance_delays(mut self, image: Duration, video: Duration) -> Self {
        self.image_advance_ms = duration_ms(image);
        self.video_advance_ms = duration_ms(video);
        self
    }

    /// With expiry check interval
    #[inline]
    #[must_use]
    pub fn with_expiry_check(mut self, interval: Duration) -> Self {
        self.expiry_check_ms = duration_ms(interval);
        self
    }

    /// Retention window as a signed delta for timestamp arithmetic
    #[must_use]
    pub fn retention(&self) -> TimeDelta {
        i64::try_from(self.retention_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Auto-advance delay for images
    #[inline]
    #[must_use]
    pub fn image_advance(&self) -> Duration {
        Duration::from_millis(self.image_advance_ms)
    }

    /// Auto-advance delay for videos
    #[inline]
    #[must_use]
    pub fn video_advance(&self) -> Duration {
        Duration::from_millis(self.video_advance_ms)
    }

    /// Expiry check interval, never zero
    #[inline]
    #[must_use]
    pub fn expiry_check(&self) -> Duration {
        Duration::from_millis(self.expiry_check_ms.max(1))
    }
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            retention_secs: 24 * 60 * 60,
            image_advance_ms: 6_000,
            video_advance_ms: 10_000,
            expiry_check_ms: 30_000,
            upload_category: DEFAULT_UPLOAD_CATEGORY.to_string(),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Load a TOML config file, falling back to defaults when it does not exist
pub fn load_toml<T>(path: impl AsRef<Path>) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    let path = path.as_ref();
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(T::default());
        }
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_story_semantics() {
        let config = TrayConfig::default();
        assert_eq!(config.retention(), TimeDelta::hours(24));
        assert_eq!(config.image_advance(), Duration::from_secs(6));
        assert_eq!(config.video_advance(), Duration::from_secs(10));
        assert_eq!(config.upload_category, "stories");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: TrayConfig = toml::from_str("image_advance_ms = 4000").unwrap();
        assert_eq!(config.image_advance(), Duration::from_secs(4));
        assert_eq!(config.video_advance(), Duration::from_secs(10));
    }

    #[test]
    fn huge_retention_saturates() {
        let config = TrayConfig {
            retention_secs: u64::MAX,
            ..TrayConfig::default()
        };
        assert_eq!(config.retention(), TimeDelta::MAX);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config: TrayConfig = load_toml(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, TrayConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "retention_secs = \"forever\"").unwrap();
        let result: Result<TrayConfig, _> = load_toml(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
