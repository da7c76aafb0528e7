//! Offline collaborators shared by unit tests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    configuration::Settings,
    domain::contact::NewsItem,
    error::{SearchError, SummarizerError},
    services::{serper_client::OrganicResult, LanguageModel, ProfileBuilder, SearchProvider},
};

pub struct NoSearch;

#[async_trait]
impl SearchProvider for NoSearch {
    async fn search(&self, _query: &str, _page: u8) -> Result<Vec<OrganicResult>, SearchError> {
        Err(SearchError::MissingApiKey)
    }

    async fn news(&self, _query: &str) -> Result<Vec<NewsItem>, SearchError> {
        Err(SearchError::MissingApiKey)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

pub struct NoModel;

#[async_trait]
impl LanguageModel for NoModel {
    async fn generate(&self, _prompt: &str) -> Result<String, SummarizerError> {
        Err(SummarizerError::MissingApiKey)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

/// A builder that never touches the network.
pub fn offline_builder(bulk_limit: usize) -> ProfileBuilder {
    let mut settings = Settings::default();
    settings.bulk.limit = bulk_limit;
    ProfileBuilder::new(&settings, Arc::new(NoSearch), Arc::new(NoModel)).unwrap()
}
