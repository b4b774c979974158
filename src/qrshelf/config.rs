use crate::collection::DEFAULT_BATCH_SIZE;
use crate::error::{QrError, Result};
use crate::render::DEFAULT_SCALE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";

/// Keys accepted by [`ShelfConfig::get`] and [`ShelfConfig::set`].
pub const KEYS: [&str; 3] = ["batch-size", "qr-scale", "photo-dir"];

/// Configuration for qrshelf, stored as config.json in the data directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShelfConfig {
    /// Items revealed per page
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pixels per QR module
    #[serde(default = "default_qr_scale")]
    pub qr_scale: u32,

    /// Where exported photos go. Defaults to `<data dir>/photos`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_dir: Option<PathBuf>,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_qr_scale() -> u32 {
    DEFAULT_SCALE
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            qr_scale: DEFAULT_SCALE,
            photo_dir: None,
        }
    }
}

impl ShelfConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(QrError::Io)?;
        let config: ShelfConfig =
            serde_json::from_str(&content).map_err(QrError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(QrError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(QrError::Serialization)?;
        fs::write(config_path, content).map_err(QrError::Io)?;
        Ok(())
    }

    /// The photo directory, falling back to `<data_dir>/photos`.
    pub fn photo_dir_or(&self, data_dir: &Path) -> PathBuf {
        self.photo_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("photos"))
    }

    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "batch-size" => Ok(self.batch_size.to_string()),
            "qr-scale" => Ok(self.qr_scale.to_string()),
            "photo-dir" => Ok(self
                .photo_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()),
            _ => Err(unknown_key(key)),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "batch-size" => self.batch_size = parse_positive(key, value)?,
            "qr-scale" => self.qr_scale = parse_positive(key, value)?,
            "photo-dir" => {
                let value = value.trim();
                self.photo_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }
}

fn unknown_key(key: &str) -> QrError {
    QrError::Api(format!(
        "Unknown config key '{}'. Valid keys: {}",
        key,
        KEYS.join(", ")
    ))
}

fn parse_positive<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(QrError::Api(format!(
            "Invalid value '{}' for {}: expected a positive number",
            value, key
        ))),
    }
}
