use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tempo_core::rounding::RoundingPolicy;
use time::{format_description::BorrowedFormatItem, macros::format_description, UtcOffset};

const OFFSET_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[offset_hour sign:mandatory]:[offset_minute]");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempoConfig {
    /// JSON file holding projects and frames. Defaults to the platform data
    /// directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
    /// Offset used for calendar days and CSV wall-clock times, e.g. "+02:00"
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
    /// Report template id
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default)]
    pub rounding: RoundingPolicy,
    #[serde(default)]
    pub include_archived: bool,
}

fn default_utc_offset() -> String {
    "+00:00".to_string()
}

fn default_template() -> String {
    "default".to_string()
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            utc_offset: default_utc_offset(),
            template: default_template(),
            rounding: RoundingPolicy::none(),
            include_archived: false,
        }
    }
}

impl TempoConfig {
    pub fn config_path() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Cannot determine config directory")?
            .join("tempo")
            .join("config.toml"))
    }

    /// Load config from disk. Returns default config if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        Ok(config)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(&path, raw)?;
        Ok(())
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        match &self.data_file {
            Some(path) => Ok(path.clone()),
            None => Ok(dirs::data_dir()
                .context("Cannot determine data directory")?
                .join("tempo")
                .join("data.json")),
        }
    }

    pub fn offset(&self) -> Result<UtcOffset> {
        parse_offset(&self.utc_offset)
            .with_context(|| format!("Invalid utc_offset '{}' in config", self.utc_offset))
    }
}

pub fn parse_offset(value: &str) -> Result<UtcOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("utc") || value == "Z" {
        return Ok(UtcOffset::UTC);
    }
    Ok(UtcOffset::parse(value, OFFSET_FORMAT)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempo_core::rounding::RoundingDirection;
    use time::macros::offset;

    #[test]
    fn missing_fields_use_defaults() {
        let config: TempoConfig = toml::from_str("template = \"timelog\"").unwrap();
        assert_eq!(config.template, "timelog");
        assert_eq!(config.offset().unwrap(), UtcOffset::UTC);
        assert_eq!(config.rounding, RoundingPolicy::none());
        assert!(!config.include_archived);
    }

    #[test]
    fn reads_rounding_and_offset() {
        let raw = r#"
utc_offset = "+05:30"

[rounding]
direction = "nearest"
minutes = 15
"#;
        let config: TempoConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.offset().unwrap(), offset!(+5:30));
        assert_eq!(config.rounding.direction, RoundingDirection::Nearest);
        assert_eq!(config.rounding.minutes, 15);
    }

    #[test]
    fn offsets_need_a_sign() {
        assert_eq!(parse_offset("-03:00").unwrap(), offset!(-3));
        assert_eq!(parse_offset("utc").unwrap(), UtcOffset::UTC);
        assert!(parse_offset("02:00").is_err());
    }
}
