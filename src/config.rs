//! Config model and persistence helpers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

use crate::draft::FormLimits;

/// Written above the generated TOML so the lookup cost is visible before the first `g`.
const CONFIG_HEADER: &str = "\
# city_report_tui configuration
#
# [geolocation] provider = \"ip\" sends your public IP address to `endpoint`
# when you press the GPS key. The free ip-api.com service only answers over
# plain HTTP, so the request and the returned position are not encrypted.
# Use provider = \"fixed\" (with latitude/longitude) or \"disabled\" to avoid
# any network lookup, or point `endpoint` at an HTTPS ip-api compatible service.

";

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Field limits and attachment capacity.
    #[serde(default)]
    pub form: FormCfg,
    /// Simulated submission behavior.
    #[serde(default)]
    pub submission: SubmissionCfg,
    /// Where "current position" comes from.
    #[serde(default)]
    pub geolocation: GeolocationCfg,
}

/// Form field limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormCfg {
    /// Maximum number of staged attachments.
    pub max_attachments: usize,
    /// Hard cap applied to the description on every edit.
    pub description_max_chars: usize,
    /// Minimum trimmed description length accepted on submit.
    pub description_min_chars: usize,
}

/// Submission latency and failure simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionCfg {
    /// Fixed latency of one submission attempt.
    pub delay_ms: u64,
    /// Make every attempt fail (exercises the failure path).
    pub simulate_failure: bool,
    /// Attempts before giving up; 1 means no retry.
    pub max_attempts: u32,
    /// Linear backoff unit between attempts.
    pub retry_backoff_ms: u64,
}

/// Supported position sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoProvider {
    /// Behave as a platform without geolocation.
    Disabled,
    /// Always report the configured coordinates.
    Fixed,
    /// Look up an approximate position by IP address.
    Ip,
}

/// Geolocation provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationCfg {
    pub provider: GeoProvider,
    /// Latitude reported by the `fixed` provider.
    pub latitude: f64,
    /// Longitude reported by the `fixed` provider.
    pub longitude: f64,
    /// ip-api compatible endpoint used by the `ip` provider.
    pub endpoint: String,
    /// HTTP timeout for the `ip` provider.
    pub timeout_secs: u64,
}

impl Config {
    /// Load from disk or create defaults when missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            Ok(toml::from_str(&s)?)
        } else {
            let cfg = Self::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    /// Persist the config as pretty TOML, prefixed with the explanatory header.
    pub fn save(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self)?;
        fs::write(path, format!("{CONFIG_HEADER}{s}"))?;
        Ok(())
    }

    /// Description limits derived from the form section.
    pub fn limits(&self) -> FormLimits {
        FormLimits {
            description_max_chars: self.form.description_max_chars,
            description_min_chars: self.form.description_min_chars,
        }
    }
}

impl SubmissionCfg {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for FormCfg {
    fn default() -> Self {
        Self {
            max_attachments: crate::attachments::DEFAULT_MAX_ATTACHMENTS,
            description_max_chars: 500,
            description_min_chars: 10,
        }
    }
}

impl Default for SubmissionCfg {
    /// Defaults reproduce the always-succeeds, two second submission.
    fn default() -> Self {
        Self {
            delay_ms: 2000,
            simulate_failure: false,
            max_attempts: 1,
            retry_backoff_ms: 500,
        }
    }
}

impl Default for GeolocationCfg {
    fn default() -> Self {
        Self {
            provider: GeoProvider::Ip,
            latitude: -15.793889,
            longitude: -47.882778,
            endpoint: "http://ip-api.com/json".into(),
            timeout_secs: 10,
        }
    }
}
