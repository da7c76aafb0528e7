use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{
    contact::{Contacts, NewsItem, Socials},
    executive::Executive,
    organization::Organization,
    summary::SummaryRecord,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrawlStats {
    /// The search API was unreachable, unconfigured, or returned an error.
    pub search_failed: bool,
    /// Dispatch produced no candidate pages at all.
    pub no_candidates: bool,
    pub candidates: usize,
    pub fetched: usize,
    pub failed: usize,
    pub official: usize,
}

/// Final per-organization output, shared by the JSON, CSV, and PDF views.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub organization: Organization,
    pub website: Option<String>,
    pub executives: Vec<Executive>,
    pub contacts: Contacts,
    pub socials: Socials,
    pub recent_posts: Vec<NewsItem>,
    pub summary: SummaryRecord,
    pub category: String,
    pub crawl: CrawlStats,
    pub generated_at: DateTime<Utc>,
    pub latency_ms: u64,
}

impl Report {
    pub fn empty(organization: Organization) -> Self {
        let summary = SummaryRecord::empty(&organization.name);
        Report {
            website: organization.website(),
            organization,
            executives: vec![],
            contacts: Contacts::default(),
            socials: Socials::default(),
            recent_posts: vec![],
            summary,
            category: "Other".to_string(),
            crawl: CrawlStats {
                no_candidates: true,
                ..Default::default()
            },
            generated_at: Utc::now(),
            latency_ms: 0,
        }
    }

    /// File name stem safe for a `Content-Disposition` header.
    pub fn file_stem(&self) -> String {
        let base = self
            .organization
            .domain
            .clone()
            .unwrap_or_else(|| self.organization.name.clone());
        safe_filename(&base, "company")
    }
}

pub fn safe_filename(raw: &str, default: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_sep = false;

    for c in raw.trim().chars() {
        match c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
            true => {
                out.push(c);
                last_was_sep = false;
            }
            false if !last_was_sep => {
                out.push('_');
                last_was_sep = true;
            }
            false => {}
        }
    }

    let out = out.trim_matches('_');
    match out.is_empty() {
        true => default.to_string(),
        false => out.to_string(),
    }
}
