// Handles configuration loading, saving, and defaults.
use crate::context::AppContext;
use anyhow::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    /// Root of the backend API, e.g. `https://exams.example.edu/api`.
    pub api_url: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub allow_insecure_certs: bool,
    /// Where exported PDF/Excel files are written; defaults to the data dir.
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            username: String::new(),
            password: String::new(),
            allow_insecure_certs: false,
            export_dir: None,
        }
    }
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    /// Returns a contextualized error if reading or parsing fails.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        // Explicitly detect missing file so callers (onboarding) can behave accordingly.
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    /// Detects whether an error indicates that the config file was missing,
    /// as opposed to being unreadable or malformed.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        for cause in err.chain() {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
                && io_err.kind() == std::io::ErrorKind::NotFound
            {
                return true;
            }
        }

        false
    }

    /// Save configuration using an explicit context.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        let toml_str = toml::to_string_pretty(self)?;
        fs::write(&path, toml_str).map_err(|e| {
            anyhow::anyhow!("Failed to write config file '{}': {}", path.display(), e)
        })?;
        Ok(())
    }

    /// Get the path string using an explicit context.
    pub fn get_path_string(ctx: &dyn AppContext) -> Result<String> {
        let path = ctx.get_config_file_path()?;
        Ok(path.to_string_lossy().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;

    #[test]
    fn missing_config_is_detected() {
        let ctx = TestContext::new();
        let err = Config::load(&ctx).unwrap_err();
        assert!(Config::is_missing_config_error(&err));
    }

    #[test]
    fn roundtrip_save_load() {
        let ctx = TestContext::new();
        let mut cfg = Config::default();
        cfg.api_url = "https://exams.example.edu/api".to_string();
        cfg.username = "coordinator".to_string();
        cfg.password = "secret".to_string();
        cfg.save(&ctx).unwrap();

        let loaded = Config::load(&ctx).unwrap();
        assert_eq!(loaded.api_url, cfg.api_url);
        assert_eq!(loaded.username, cfg.username);
        assert!(!loaded.allow_insecure_certs);
    }
}
