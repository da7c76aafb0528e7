pub mod categorizer;
pub mod contact_extractor;
pub mod crawl_fetcher;
pub mod executive_extractor;
pub mod exporter;
pub mod http;
pub mod page_text;
pub mod profile_builder;
pub mod query_dispatcher;
pub mod serper_client;
pub mod summarizer;

pub use crawl_fetcher::CrawlFetcher;
pub use exporter::{export, Export, ExportFormat};
pub use profile_builder::ProfileBuilder;
pub use serper_client::{SearchProvider, SerperClient};
pub use summarizer::{GeminiClient, LanguageModel};
