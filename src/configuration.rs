use std::time::Duration;

use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    pub application: ApplicationSettings,
    #[serde(default)]
    pub api_keys: ApiKeys,
    pub search: SearchSettings,
    pub crawler: CrawlerSettings,
    pub extractor: ExtractorSettings,
    pub summarizer: SummarizerSettings,
    pub bulk: BulkSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    #[serde(default)]
    pub debug: bool,
}

/// Keys for the hosted collaborators. Blank values count as missing.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ApiKeys {
    #[serde(default)]
    pub serper: Option<String>,
    #[serde(default)]
    pub gemini: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    pub base_url: String,
    pub results_per_query: u8,
    pub pages: u8,
    pub gl: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerSettings {
    pub max_concurrency: usize,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub backoff_base_millis: u64,
    pub max_candidate_pages: usize,
    pub max_internal_links: usize,
    pub probe_well_known_paths: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorSettings {
    pub max_executives: usize,
    pub max_text_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummarizerSettings {
    pub base_url: String,
    pub model: String,
    pub max_words: usize,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkSettings {
    pub limit: usize,
    pub concurrency: usize,
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("No current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let mut settings = settings.try_deserialize::<Settings>()?;
    settings.api_keys = settings.api_keys.with_env_fallback();

    Ok(settings)
}

impl ApiKeys {
    /// Fills blank keys from `SERPER_API_KEY` / `GOOGLE_API_KEY`.
    pub fn with_env_fallback(self) -> Self {
        ApiKeys {
            serper: non_blank(self.serper).or_else(|| env_key("SERPER_API_KEY")),
            gemini: non_blank(self.gemini).or_else(|| env_key("GOOGLE_API_KEY")),
        }
    }

    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = vec![];
        if non_blank(self.serper.clone()).is_none() {
            missing.push("SERPER_API_KEY");
        }
        if non_blank(self.gemini.clone()).is_none() {
            missing.push("GOOGLE_API_KEY");
        }
        missing
    }
}

fn env_key(name: &str) -> Option<String> {
    non_blank(std::env::var(name).ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl SearchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl CrawlerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_millis)
    }
}

impl SummarizerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 8000,
            debug: false,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            base_url: "https://google.serper.dev".to_string(),
            results_per_query: 6,
            pages: 1,
            gl: "us".to_string(),
            timeout_seconds: 20,
        }
    }
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        CrawlerSettings {
            max_concurrency: 4,
            timeout_seconds: 15,
            max_retries: 2,
            backoff_base_millis: 500,
            max_candidate_pages: 12,
            max_internal_links: 6,
            probe_well_known_paths: true,
        }
    }
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        ExtractorSettings {
            max_executives: 12,
            max_text_chars: 12_000,
        }
    }
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        SummarizerSettings {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-flash".to_string(),
            max_words: 150,
            timeout_seconds: 30,
        }
    }
}

impl Default for BulkSettings {
    fn default() -> Self {
        BulkSettings {
            limit: 100,
            concurrency: 2,
        }
    }
}
