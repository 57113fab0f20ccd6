use galsniff_core::{SerialConfig, DEFAULT_FRAME_GAP};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bus address {0:?}: expected a hex byte such as 0x10")]
    InvalidAddress(String),
    #[error("frame_gap_us must be greater than zero")]
    ZeroFrameGap,
    #[error("reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// On-disk configuration. Every field is optional and overrides the
/// built-in default.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
    pub frame_gap_us: Option<u64>,
    /// Hex address to display name.
    pub components: Option<BTreeMap<String, String>>,
    pub ignore: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub serial: SerialConfig,
    pub frame_gap: Duration,
    pub components: HashMap<u8, String>,
    pub ignore: BTreeSet<u8>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            frame_gap: DEFAULT_FRAME_GAP,
            components: HashMap::from([
                (0x10, "Reader".to_string()),
                (0x11, "Panel".to_string()),
            ]),
            // prox reader inside the keypad
            ignore: BTreeSet::from([0x90]),
        }
    }
}

impl Settings {
    pub fn apply_file(&mut self, file: FileConfig) -> Result<(), ConfigError> {
        if let Some(port) = file.port {
            self.serial.port_name = port;
        }
        if let Some(baud_rate) = file.baud_rate {
            self.serial.baud_rate = baud_rate;
        }
        match file.frame_gap_us {
            Some(0) => return Err(ConfigError::ZeroFrameGap),
            Some(us) => self.frame_gap = Duration::from_micros(us),
            None => {}
        }
        if let Some(components) = file.components {
            self.components = components
                .into_iter()
                .map(|(address, name)| Ok((parse_address(&address)?, name)))
                .collect::<Result<_, ConfigError>>()?;
        }
        if let Some(ignore) = file.ignore {
            self.ignore = ignore
                .iter()
                .map(String::as_str)
                .map(parse_address)
                .collect::<Result<_, _>>()?;
        }
        Ok(())
    }
}

/// Parses a bus address written as hex, with or without a `0x` prefix.
pub fn parse_address(s: &str) -> Result<u8, ConfigError> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() || digits.len() > 2 {
        return Err(ConfigError::InvalidAddress(s.to_string()));
    }
    u8::from_str_radix(digits, 16).map_err(|_| ConfigError::InvalidAddress(s.to_string()))
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("galsniff").join("config.json"))
}

pub fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Defaults, overlaid with `explicit` if given, otherwise with the per-user
/// config file when one exists.
pub fn load(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();

    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path().filter(|path| path.is_file()),
    };

    if let Some(path) = path {
        log::debug!("loading configuration from {}", path.display());
        settings.apply_file(read_file(&path)?)?;
    }

    Ok(settings)
}
