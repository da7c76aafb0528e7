use serde::Serialize;

use crate::error::FetchError;

use super::organization::domain_of;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    SearchResult,
    WellKnownPath,
    InternalLink,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateUrl {
    pub url: String,
    pub source: DiscoverySource,
}

impl CandidateUrl {
    pub fn new(url: impl Into<String>, source: DiscoverySource) -> Self {
        CandidateUrl {
            url: url.into(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchStatus {
    Fetched { status: u16, attempts: u32 },
    Failed(FetchError),
}

/// One crawled page. Lives only until extraction has run over it.
#[derive(Debug, Clone)]
pub struct CandidatePage {
    pub url: String,
    /// URL after redirects; the official-domain check runs against this.
    pub final_url: Option<String>,
    pub source: DiscoverySource,
    pub status: FetchStatus,
    pub content: Option<String>,
}

impl CandidatePage {
    pub fn fetched(
        candidate: CandidateUrl,
        final_url: String,
        status: u16,
        attempts: u32,
        content: String,
    ) -> Self {
        CandidatePage {
            url: candidate.url,
            final_url: Some(final_url),
            source: candidate.source,
            status: FetchStatus::Fetched { status, attempts },
            content: Some(content),
        }
    }

    pub fn failed(candidate: CandidateUrl, error: FetchError) -> Self {
        CandidatePage {
            url: candidate.url,
            final_url: None,
            source: candidate.source,
            status: FetchStatus::Failed(error),
            content: None,
        }
    }

    pub fn effective_url(&self) -> &str {
        self.final_url.as_deref().unwrap_or(&self.url)
    }

    pub fn domain(&self) -> Option<String> {
        domain_of(self.effective_url())
    }

    pub fn html(&self) -> Option<&str> {
        match self.status {
            FetchStatus::Fetched { .. } => {
                self.content.as_deref().filter(|c| !c.trim().is_empty())
            }
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, FetchStatus::Failed(_))
    }
}
