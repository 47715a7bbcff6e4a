//! Settings for polling and artifact collection
//!
//! Every value can be overridden from the environment or a YAML
//! document.

use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variable which overrides the artifact root directory
pub const ARTIFACT_DIR_VAR: &str = "ARTIFACT_DIR";

/// Environment variable which overrides the poll interval in milliseconds
pub const POLL_INTERVAL_VAR: &str = "E2E_POLL_INTERVAL_MS";

/// Directory below the working directory which is used if
/// `ARTIFACT_DIR` is not set
pub const DEFAULT_ARTIFACT_SUBDIR: &str = "tmp";

/// Interval and deadline of a poll loop
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Poll {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Poll {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Poll { interval, timeout }
    }
}

/// Settings shared by the lifecycle helpers and the artifact collector
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Settings {
    pub poll_interval: Duration,
    pub create_timeout: Duration,
    pub delete_timeout: Duration,
    pub artifact_root: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            poll_interval: Duration::from_secs(1),
            create_timeout: Duration::from_secs(10 * 60),
            delete_timeout: Duration::from_secs(60),
            artifact_root: PathBuf::from(DEFAULT_ARTIFACT_SUBDIR),
        }
    }
}

/// Optional overrides as they appear in a YAML document
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SettingsFile {
    poll_interval_ms: Option<u64>,
    create_timeout_secs: Option<u64>,
    delete_timeout_secs: Option<u64>,
    artifact_dir: Option<PathBuf>,
}

impl Settings {
    /// Creates the settings from the process environment.
    ///
    /// The artifact root is taken from `ARTIFACT_DIR` and defaults to
    /// `tmp` below the current working directory.
    pub fn from_env() -> Result<Self> {
        let working_dir =
            env::current_dir().map_err(|source| Error::WorkingDirectory { source })?;

        let mut settings = Settings {
            artifact_root: resolve_artifact_root(env::var_os(ARTIFACT_DIR_VAR), &working_dir),
            ..Settings::default()
        };

        if let Some(value) = env::var_os(POLL_INTERVAL_VAR) {
            settings.poll_interval = parse_millis(POLL_INTERVAL_VAR, &value)?;
        }

        Ok(settings)
    }

    /// Applies the overrides of the given YAML document to the defaults.
    ///
    /// ```yaml
    /// pollIntervalMs: 500
    /// createTimeoutSecs: 300
    /// deleteTimeoutSecs: 60
    /// artifactDir: /tmp/artifacts
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: SettingsFile = if yaml.trim().is_empty() {
            SettingsFile::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|source| Error::Settings { source })?
        };

        let defaults = Settings::default();
        Ok(Settings {
            poll_interval: file
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            create_timeout: file
                .create_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.create_timeout),
            delete_timeout: file
                .delete_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.delete_timeout),
            artifact_root: file.artifact_dir.unwrap_or(defaults.artifact_root),
        })
    }

    /// Poll settings for waiting on a created resource
    pub fn create_poll(&self, timeout: Duration) -> Poll {
        Poll::new(self.poll_interval, timeout)
    }

    /// Poll settings for waiting on a deleted resource
    pub fn delete_poll(&self) -> Poll {
        Poll::new(self.poll_interval, self.delete_timeout)
    }
}

/// Returns the artifact root: the given override if it is set and not
/// empty, `<working_dir>/tmp` otherwise.
pub fn resolve_artifact_root(override_dir: Option<OsString>, working_dir: &Path) -> PathBuf {
    match override_dir {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => working_dir.join(DEFAULT_ARTIFACT_SUBDIR),
    }
}

fn parse_millis(key: &'static str, value: &OsString) -> Result<Duration> {
    value
        .to_str()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .ok_or_else(|| Error::SettingsVariable {
            key,
            value: value.to_string_lossy().into_owned(),
        })
}
