use crate::application::trend_source::TrendQuery;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub trends: TrendsSettings,
    #[serde(default)]
    pub poll: PollSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrendsSettings {
    /// Empty means "ask on stdin at start-up".
    pub keyword: String,
    pub geo: String,
    pub category: i64,
    pub time_range: String,
    pub language: String,
    pub timezone_offset: i32,
    /// Autocomplete topic type whose entity id replaces the keyword.
    pub topic_type: Option<String>,
    pub base_url: String,
}

impl Default for TrendsSettings {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            geo: "US".to_string(),
            category: 31,
            time_range: "now 4-H".to_string(),
            language: "EN".to_string(),
            timezone_offset: 0,
            topic_type: Some("Language".to_string()),
            base_url: "https://trends.google.com".to_string(),
        }
    }
}

impl TrendsSettings {
    pub fn query(&self) -> TrendQuery {
        TrendQuery {
            keyword: self.keyword.clone(),
            geo: self.geo.clone(),
            category: self.category,
            time_range: self.time_range.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollSettings {
    pub interval_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self { interval_secs: 600 }
    }
}

impl PollSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreSettings {
    pub directory: PathBuf,
    pub base_name: String,
    /// Continue after the newest existing generation instead of starting at 0.
    pub resume: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            base_name: "bleptech".to_string(),
            resume: true,
        }
    }
}

/// Load `config/trends.*` (optional) overlaid with `TRENDCHAIN__SECTION__KEY`
/// environment variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/trends").required(false))
        .add_source(
            config::Environment::with_prefix("TRENDCHAIN")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    validate(&app_config)?;
    Ok(app_config)
}

fn validate(app_config: &AppConfig) -> anyhow::Result<()> {
    if app_config.poll.interval_secs == 0 {
        anyhow::bail!("poll.interval_secs must be greater than zero");
    }
    let base_name = &app_config.store.base_name;
    if base_name.is_empty() || base_name.contains(['/', '\\']) {
        anyhow::bail!("store.base_name must be a plain, non-empty file name: {:?}", base_name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    fn from_toml(source: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let app_config = from_toml("");

        assert_eq!(app_config.trends.geo, "US");
        assert_eq!(app_config.trends.category, 31);
        assert_eq!(app_config.trends.time_range, "now 4-H");
        assert_eq!(app_config.trends.topic_type.as_deref(), Some("Language"));
        assert_eq!(app_config.poll.interval(), Duration::from_secs(600));
        assert_eq!(app_config.store.base_name, "bleptech");
        assert!(app_config.store.resume);
        assert!(validate(&app_config).is_ok());
    }

    #[test]
    fn test_overrides() {
        let app_config = from_toml(
            r#"
            [trends]
            keyword = "rust"
            geo = "DE"
            category = 0

            [poll]
            interval_secs = 30

            [store]
            directory = "/var/lib/trends"
            base_name = "rust-de"
            resume = false
            "#,
        );

        let query = app_config.trends.query();
        assert_eq!(query.keyword, "rust");
        assert_eq!(query.geo, "DE");
        assert_eq!(query.category, 0);
        assert_eq!(query.time_range, "now 4-H");
        assert_eq!(app_config.poll.interval_secs, 30);
        assert_eq!(app_config.store.directory, PathBuf::from("/var/lib/trends"));
        assert!(!app_config.store.resume);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut app_config = AppConfig::default();
        app_config.poll.interval_secs = 0;
        assert!(validate(&app_config).is_err());

        let mut app_config = AppConfig::default();
        app_config.store.base_name = "../escape".to_string();
        assert!(validate(&app_config).is_err());
    }
}
