use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub cache: CacheConfig,
    pub lists: ListConfig,
    pub digest: DigestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub country: String,
    pub request_timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_minutes: i64,
    pub category_page_size: usize,
    pub aggregate_page_size: usize,
    pub min_batch: usize,
    pub max_batch: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    pub news_limit: usize,
    pub filter_limit: usize,
    pub category_limit: usize,
    pub min_local_matches: usize,
    pub search_window_days: i64,
    pub retention_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    pub max_items: usize,
    pub description_budget: usize,
    pub hour: u32,
    pub minute: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org/v2".to_string(),
            api_key: String::new(),
            country: "us".to_string(),
            request_timeout_seconds: 15,
            user_agent: "newsdesk/0.1".to_string(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 30,
            category_page_size: 3,
            aggregate_page_size: 10,
            min_batch: 5,
            max_batch: 15,
        }
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            news_limit: 10,
            filter_limit: 5,
            category_limit: 8,
            min_local_matches: 3,
            search_window_days: 7,
            retention_hours: 3,
        }
    }
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            max_items: 5,
            description_budget: 100,
            hour: 9,
            minute: 0,
        }
    }
}

impl AppConfig {
    pub fn config_file_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_dir = dirs::config_dir().ok_or("could not locate the user config directory")?;

        let app_config_dir = config_dir.join("newsdesk");
        std::fs::create_dir_all(&app_config_dir)?;

        Ok(app_config_dir.join("config.json"))
    }

    /// Loads the config file, falling back to defaults when it is missing
    /// or unreadable.
    pub fn load() -> Self {
        match Self::load_from_file() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("could not load config: {}; using defaults", e);
                let default_config = Self::default();
                if let Err(save_err) = default_config.save() {
                    eprintln!("could not save default config: {}", save_err);
                }
                default_config
            }
        }
    }

    fn load_from_file() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = Self::config_file_path()?;
        let config_content = std::fs::read_to_string(config_path)?;
        let config: AppConfig = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let config_path = Self::config_file_path()?;
        let config_json = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, config_json)?;
        Ok(())
    }
}
