use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

/// Credentials for the OpenWeatherMap weather feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenWeatherConfig {
    pub api_key: String,
    /// Language code for weather descriptions, e.g. "ja" or "en".
    pub lang: Option<String>,
}

/// Credentials for the LINE Messaging API channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineConfig {
    pub channel_access_token: String,
    pub channel_secret: Option<String>,
}

/// Notion internal-integration token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    pub api_key: String,
}

/// Rakuten application credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RakutenConfig {
    pub app_id: String,
    pub affiliate_id: Option<String>,
}

/// Top-level configuration stored on disk, one section per service.
///
/// Example TOML:
/// ```toml
/// [openweather]
/// api_key = "..."
/// lang = "ja"
///
/// [line]
/// channel_access_token = "..."
/// ```
///
/// Every credential accessor falls back to the service's conventional
/// environment variable when the section is absent, so the config file is
/// optional in scripted environments.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub openweather: Option<OpenWeatherConfig>,
    pub line: Option<LineConfig>,
    pub notion: Option<NotionConfig>,
    pub rakuten: Option<RakutenConfig>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skillpack", "skillpack-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn openweather_api_key(&self) -> Option<String> {
        value_or_env(
            self.openweather.as_ref().map(|c| c.api_key.clone()),
            "OPENWEATHERMAP_API_KEY",
        )
    }

    /// Weather description language, "ja" unless configured otherwise.
    pub fn openweather_lang(&self) -> String {
        self.openweather
            .as_ref()
            .and_then(|c| c.lang.clone())
            .unwrap_or_else(|| crate::weather::gateway::DEFAULT_LANG.to_string())
    }

    pub fn line_channel_access_token(&self) -> Option<String> {
        value_or_env(
            self.line.as_ref().map(|c| c.channel_access_token.clone()),
            "LINE_CHANNEL_ACCESS_TOKEN",
        )
    }

    pub fn line_channel_secret(&self) -> Option<String> {
        value_or_env(
            self.line.as_ref().and_then(|c| c.channel_secret.clone()),
            "LINE_CHANNEL_SECRET",
        )
    }

    pub fn notion_api_key(&self) -> Option<String> {
        value_or_env(
            self.notion.as_ref().map(|c| c.api_key.clone()),
            "NOTION_API_KEY",
        )
    }

    pub fn rakuten_app_id(&self) -> Option<String> {
        value_or_env(
            self.rakuten.as_ref().map(|c| c.app_id.clone()),
            "RAKUTEN_APP_ID",
        )
    }

    pub fn rakuten_affiliate_id(&self) -> Option<String> {
        value_or_env(
            self.rakuten.as_ref().and_then(|c| c.affiliate_id.clone()),
            "RAKUTEN_AFFILIATE_ID",
        )
    }
}

/// An explicitly configured value wins over the environment; empty strings
/// count as unset in both places.
fn value_or_env(value: Option<String>, env_name: &str) -> Option<String> {
    value
        .filter(|v| !v.is_empty())
        .or_else(|| env::var(env_name).ok().filter(|v| !v.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_per_service_sections() {
        let cfg: Config = toml::from_str(
            r#"
            [openweather]
            api_key = "OW_KEY"
            lang = "en"

            [rakuten]
            app_id = "APP"
            affiliate_id = "AFF"
            "#,
        )
        .expect("config TOML should parse");

        assert_eq!(cfg.openweather_api_key(), Some("OW_KEY".to_string()));
        assert_eq!(cfg.openweather_lang(), "en");
        assert_eq!(cfg.rakuten_app_id(), Some("APP".to_string()));
        assert_eq!(cfg.rakuten_affiliate_id(), Some("AFF".to_string()));
        assert!(cfg.line.is_none());
        assert!(cfg.notion.is_none());
    }

    #[test]
    fn lang_defaults_to_japanese() {
        let cfg: Config = toml::from_str(
            r#"
            [openweather]
            api_key = "OW_KEY"
            "#,
        )
        .expect("config TOML should parse");

        assert_eq!(cfg.openweather_lang(), "ja");
    }

    #[test]
    fn configured_value_wins_over_environment() {
        // value_or_env is also what backs the env fallback; an explicit
        // value must short-circuit before the environment is consulted.
        let picked = value_or_env(Some("explicit".to_string()), "SKILLPACK_TEST_UNSET_VAR");
        assert_eq!(picked, Some("explicit".to_string()));
    }

    #[test]
    fn empty_configured_value_counts_as_unset() {
        let picked = value_or_env(Some(String::new()), "SKILLPACK_TEST_UNSET_VAR");
        assert_eq!(picked, None);
    }

    #[test]
    fn roundtrips_through_toml() {
        let cfg = Config {
            openweather: Some(OpenWeatherConfig {
                api_key: "KEY".to_string(),
                lang: None,
            }),
            line: Some(LineConfig {
                channel_access_token: "TOKEN".to_string(),
                channel_secret: None,
            }),
            notion: None,
            rakuten: None,
        };

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&text).expect("parse");

        assert_eq!(parsed.openweather_api_key(), Some("KEY".to_string()));
        assert_eq!(
            parsed.line_channel_access_token(),
            Some("TOKEN".to_string())
        );
    }
}
