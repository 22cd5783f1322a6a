use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use qa_core::AssemblerConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub wolfram: WolframConfigEntry,

    #[serde(default)]
    pub cloudinary: CloudinaryConfigEntry,

    #[serde(default)]
    pub assembler: AssemblerConfigEntry,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WolframConfigEntry {
    /// Falls back to $WOLFRAM_APP_ID
    #[serde(default)]
    pub app_id: Option<String>,

    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudinaryConfigEntry {
    /// Falls back to $CLOUDINARY_CLOUD_NAME
    #[serde(default)]
    pub cloud_name: Option<String>,

    /// Unsigned upload preset. Falls back to $CLOUDINARY_UPLOAD_PRESET
    #[serde(default)]
    pub upload_preset: Option<String>,

    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblerConfigEntry {
    /// Upper bound on a single image rehost, in seconds
    #[serde(default)]
    pub rehost_timeout_secs: Option<u64>,

    #[serde(default)]
    pub accent_color: Option<String>,

    /// Prefix for title links back to the Wolfram|Alpha web UI
    #[serde(default)]
    pub web_base_url: Option<String>,
}

fn from_config_or_env(value: &Option<String>, var: &str) -> Option<String> {
    value
        .clone()
        .or_else(|| std::env::var(var).ok())
        .filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load `~/.config/qa/config.toml`. A missing file is not an error;
    /// credentials may come from the environment instead.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("qa"))
    }

    pub fn wolfram_app_id(&self) -> Option<String> {
        from_config_or_env(&self.wolfram.app_id, "WOLFRAM_APP_ID")
    }

    pub fn cloudinary_cloud_name(&self) -> Option<String> {
        from_config_or_env(&self.cloudinary.cloud_name, "CLOUDINARY_CLOUD_NAME")
    }

    pub fn cloudinary_upload_preset(&self) -> Option<String> {
        from_config_or_env(&self.cloudinary.upload_preset, "CLOUDINARY_UPLOAD_PRESET")
    }

    pub fn assembler_config(&self) -> AssemblerConfig {
        let mut config = AssemblerConfig::default();
        if let Some(secs) = self.assembler.rehost_timeout_secs {
            config = config.with_rehost_timeout(Duration::from_secs(secs));
        }
        if let Some(color) = &self.assembler.accent_color {
            config = config.with_accent_color(color);
        }
        if let Some(url) = &self.assembler.web_base_url {
            config = config.with_web_base_url(url);
        }
        config
    }
}

/// Show the first few characters of a secret.
pub fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r##"
            [wolfram]
            app_id = "ABCD-1234"

            [cloudinary]
            cloud_name = "demo"
            upload_preset = "unsigned"

            [assembler]
            rehost_timeout_secs = 5
            accent_color = "#123456"
        "##;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.wolfram_app_id(), Some("ABCD-1234".to_string()));
        assert_eq!(config.cloudinary_cloud_name(), Some("demo".to_string()));
        assert_eq!(config.cloudinary_upload_preset(), Some("unsigned".to_string()));

        let assembler = config.assembler_config();
        assert_eq!(assembler.rehost_timeout, Duration::from_secs(5));
        assert_eq!(assembler.accent_color, "#123456");
        assert_eq!(assembler.web_base_url, qa_core::assembler::DEFAULT_WEB_BASE_URL);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.wolfram.base_url.is_none());

        let assembler = config.assembler_config();
        assert_eq!(assembler.accent_color, qa_core::assembler::DEFAULT_ACCENT_COLOR);
        assert_eq!(assembler.rehost_timeout, qa_core::assembler::DEFAULT_REHOST_TIMEOUT);
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("ABCD-1234"), "ABCD****");
        assert_eq!(mask("abc"), "****");
    }
}
