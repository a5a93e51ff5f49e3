//! Watcher configuration loaded from TOML.
//!
//! Every field has a default matching the production deployment, so an empty
//! file (or no file at all) yields a working configuration:
//! ```toml
//! battles_limit = 50
//! battles_max_age_minutes = 120
//! webhook_url = "https://discord.com/api/webhooks/..."
//!
//! [servers]
//! europe = "https://gameinfo-ams.albiononline.com/api/gameinfo"
//!
//! [formats.lethal_5v5]
//! ip_cap = 1100.0
//! softcap_percent = 35
//! power_tolerance = 100.0
//! ```

use crate::error::{HellwatchError, Result};
use crate::formats::FormatSpec;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Feed base URLs keyed by server name.
    pub servers: BTreeMap<String, String>,
    /// Item icon renderer base URL.
    pub render_api_url: String,
    /// Page size of the `/battles` listing.
    pub battles_limit: usize,
    /// Stop paging once the fetched window spans more than this.
    pub battles_max_age_minutes: i64,
    /// Hard page cap per cycle, in case the feed misbehaves.
    pub max_pages: usize,
    pub check_interval_minutes: u64,
    pub request_timeout_seconds: u64,
    /// Pause between listing pages.
    pub rate_limit_delay_ms: u64,
    pub image_folder: PathBuf,
    pub ledger_path: PathBuf,
    /// Scorecards are posted here when set; otherwise they stay on disk.
    pub webhook_url: Option<String>,
    pub formats: FormatsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormatsConfig {
    pub lethal_5v5: FormatParams,
    pub lethal_2v2: FormatParams,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormatParams {
    pub ip_cap: f64,
    pub softcap_percent: i32,
    pub power_tolerance: f64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        let mut servers = BTreeMap::new();
        servers.insert(
            "europe".to_string(),
            "https://gameinfo-ams.albiononline.com/api/gameinfo".to_string(),
        );
        servers.insert(
            "americas".to_string(),
            "https://gameinfo.albiononline.com/api/gameinfo".to_string(),
        );
        servers.insert(
            "asia".to_string(),
            "https://gameinfo-sgp.albiononline.com/api/gameinfo".to_string(),
        );
        Self {
            servers,
            render_api_url: "https://render.albiononline.com/v1/item".to_string(),
            battles_limit: 50,
            battles_max_age_minutes: 120,
            max_pages: 20,
            check_interval_minutes: 1,
            request_timeout_seconds: 30,
            rate_limit_delay_ms: 500,
            image_folder: PathBuf::from("./images"),
            ledger_path: PathBuf::from("./data/reported_battles.json"),
            webhook_url: None,
            formats: FormatsConfig::default(),
        }
    }
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            lethal_5v5: FormatParams::default(),
            lethal_2v2: FormatParams::default(),
        }
    }
}

impl Default for FormatParams {
    fn default() -> Self {
        Self {
            ip_cap: 1100.0,
            softcap_percent: 35,
            power_tolerance: 100.0,
        }
    }
}

impl WatcherConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HellwatchError::Config(format!("failed to read config from {:?}: {}", path, e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| HellwatchError::Config(format!("failed to parse config TOML: {}", e)))
    }

    pub fn item_image_folder(&self) -> PathBuf {
        self.image_folder.join("items")
    }

    pub fn battle_report_folder(&self) -> PathBuf {
        self.image_folder.join("battle_reports")
    }

    /// The supported formats with this configuration's cap tables applied.
    pub fn format_specs(&self) -> Vec<FormatSpec> {
        let apply = |mut spec: FormatSpec, params: &FormatParams| {
            spec.ip_cap = params.ip_cap;
            spec.softcap_percent = params.softcap_percent;
            spec.power_tolerance = params.power_tolerance;
            spec
        };
        vec![
            apply(FormatSpec::lethal_5v5(), &self.formats.lethal_5v5),
            apply(FormatSpec::lethal_2v2(), &self.formats.lethal_2v2),
        ]
    }
}
