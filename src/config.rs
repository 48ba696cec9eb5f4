use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Deserialize;

/// Shortest pause between location feed reconnect attempts.
pub const MIN_RECONNECT_MS: u64 = 100;

// ---------------------------------------------------------------------------
// ConfigFile — deserialized from TOML (all fields optional)
// ---------------------------------------------------------------------------

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub seed_id: Option<i64>,
    pub location_url: Option<String>,
    #[serde(default)]
    pub window: WindowConfigFile,
    #[serde(default)]
    pub viewer: ViewerConfigFile,
    #[serde(default)]
    pub transport: TransportConfigFile,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct WindowConfigFile {
    pub rows: Option<usize>,
    pub scroll_speed: Option<usize>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfigFile {
    pub frame_budget_ms: Option<u64>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct TransportConfigFile {
    pub timeout_ms: Option<u64>,
    pub reconnect_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Config — resolved (all fields concrete)
// ---------------------------------------------------------------------------

pub struct Config {
    pub base_url: String,
    pub seed_id: i64,
    pub location_url: String,
    pub window: WindowConfig,
    pub viewer: ViewerConfig,
    pub transport: TransportConfig,
}

pub struct WindowConfig {
    pub rows: usize,
    pub scroll_speed: usize,
}

pub struct ViewerConfig {
    pub frame_budget: Duration,
}

pub struct TransportConfig {
    pub timeout: Duration,
    pub reconnect: Duration,
}

/// CLI values that override the config file.
#[derive(Default, Clone)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub seed_id: Option<i64>,
    pub location_url: Option<String>,
    pub rows: Option<usize>,
    pub scroll_speed: Option<usize>,
}

impl Config {
    /// Locator of the seed record.
    pub fn seed_locator(&self) -> String {
        format!("{}{}", self.base_url, self.seed_id)
    }
}

impl ConfigFile {
    /// Merge CLI values (overwrites non-None fields).
    pub fn merge_cli(&mut self, cli: &CliOverrides) {
        if let Some(ref v) = cli.base_url {
            debug!("config: CLI override base_url={v}");
            self.base_url = cli.base_url.clone();
        }
        if let Some(v) = cli.seed_id {
            debug!("config: CLI override seed_id={v}");
            self.seed_id = cli.seed_id;
        }
        if let Some(ref v) = cli.location_url {
            debug!("config: CLI override location_url={v}");
            self.location_url = cli.location_url.clone();
        }
        if let Some(v) = cli.rows {
            debug!("config: CLI override rows={v}");
            self.window.rows = cli.rows;
        }
        if let Some(v) = cli.scroll_speed {
            debug!("config: CLI override scroll_speed={v}");
            self.window.scroll_speed = cli.scroll_speed;
        }
    }

    /// Resolve to a Config by applying defaults to missing fields.
    ///
    /// `rows` is at least 2 and `scroll_speed` lies in `1..rows`, so a scroll
    /// always keeps part of the window. `reconnect_ms` has a floor of
    /// [`MIN_RECONNECT_MS`].
    pub fn resolve(self) -> Config {
        let rows = self.window.rows.unwrap_or(5).max(2);
        let requested_speed = self.window.scroll_speed.unwrap_or(2);
        let scroll_speed = requested_speed.clamp(1, rows - 1);
        if scroll_speed != requested_speed {
            warn!("config: scroll_speed={requested_speed} clamped to {scroll_speed} for rows={rows}");
        }
        let requested_reconnect = self.transport.reconnect_ms.unwrap_or(2000);
        let reconnect_ms = requested_reconnect.max(MIN_RECONNECT_MS);
        if reconnect_ms != requested_reconnect {
            warn!("config: reconnect_ms={requested_reconnect} raised to {reconnect_ms}");
        }
        let mut base_url = self
            .base_url
            .unwrap_or_else(|| "http://localhost:3000/dark-jedis/".into());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let config = Config {
            base_url,
            seed_id: self.seed_id.unwrap_or(3616),
            location_url: self
                .location_url
                .unwrap_or_else(|| "ws://localhost:4000".into()),
            window: WindowConfig { rows, scroll_speed },
            viewer: ViewerConfig {
                frame_budget: Duration::from_millis(self.viewer.frame_budget_ms.unwrap_or(32)),
            },
            transport: TransportConfig {
                timeout: Duration::from_millis(self.transport.timeout_ms.unwrap_or(5000)),
                reconnect: Duration::from_millis(reconnect_ms),
            },
        };
        info!(
            "config: resolved base_url={}, seed_id={}, location_url={}, rows={}, \
             scroll_speed={}, frame_budget={}ms, timeout={}ms, reconnect={}ms",
            config.base_url,
            config.seed_id,
            config.location_url,
            config.window.rows,
            config.window.scroll_speed,
            config.viewer.frame_budget.as_millis(),
            config.transport.timeout.as_millis(),
            config.transport.reconnect.as_millis(),
        );
        config
    }
}

/// Resolve the XDG config path for holocron.
fn config_path() -> Option<PathBuf> {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(config_dir.join("holocron").join("config.toml"))
}

/// Load config file. Returns `ConfigFile::default()` if no file exists.
/// Returns an error if the file exists but cannot be parsed.
pub fn load_config() -> anyhow::Result<ConfigFile> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            info!("config: no HOME or XDG_CONFIG_HOME set, using defaults");
            return Ok(ConfigFile::default());
        }
    };
    debug!("config: looking for {}", path.display());
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            info!("config: loaded from {}", path.display());
            let cfg: ConfigFile = toml::from_str(&text)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("config: {} not found, using defaults", path.display());
            Ok(ConfigFile::default())
        }
        Err(e) => Err(anyhow::anyhow!("failed to read {}: {e}", path.display())),
    }
}
