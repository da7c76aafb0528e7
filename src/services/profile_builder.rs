use std::{collections::HashSet, sync::Arc, time::Instant};

use chrono::Utc;
use futures::StreamExt;
use scraper::Html;

use crate::{
    configuration::Settings,
    domain::{
        candidate_page::{CandidatePage, CandidateUrl, FetchStatus},
        contact::NewsItem,
        organization::Organization,
        report::{CrawlStats, Report},
    },
};

use super::{
    categorizer::Categorizer,
    contact_extractor::extract_from_pages,
    crawl_fetcher::CrawlFetcher,
    executive_extractor::{is_official, ExecutiveExtractor},
    page_text::{readable_text, truncate_chars},
    query_dispatcher::{discover_internal_links, QueryDispatcher},
    serper_client::SearchProvider,
    summarizer::{LanguageModel, Summarizer, SummaryRequest},
};

const MAX_NEWS_ITEMS: usize = 8;

/// Runs the whole lookup for one organization. Every stage degrades to its
/// empty value, so building a report never fails.
pub struct ProfileBuilder {
    search: Arc<dyn SearchProvider>,
    dispatcher: QueryDispatcher,
    fetcher: CrawlFetcher,
    extractor: ExecutiveExtractor,
    summarizer: Summarizer,
    categorizer: Categorizer,
    max_internal_links: usize,
    max_text_chars: usize,
    bulk_concurrency: usize,
    bulk_limit: usize,
}

impl ProfileBuilder {
    pub fn new(
        settings: &Settings,
        search: Arc<dyn SearchProvider>,
        model: Arc<dyn LanguageModel>,
    ) -> Result<Self, reqwest::Error> {
        Ok(ProfileBuilder {
            dispatcher: QueryDispatcher::new(search.clone(), &settings.search, &settings.crawler),
            fetcher: CrawlFetcher::new(&settings.crawler)?,
            extractor: ExecutiveExtractor::new(&settings.extractor),
            summarizer: Summarizer::new(model.clone(), &settings.summarizer),
            categorizer: Categorizer::new(model),
            search,
            max_internal_links: settings.crawler.max_internal_links,
            max_text_chars: settings.extractor.max_text_chars,
            bulk_concurrency: settings.bulk.concurrency.max(1),
            bulk_limit: settings.bulk.limit,
        })
    }

    pub fn search_configured(&self) -> bool {
        self.search.is_configured()
    }

    pub fn summarizer_configured(&self) -> bool {
        self.summarizer.is_configured()
    }

    pub fn bulk_limit(&self) -> usize {
        self.bulk_limit
    }

    pub async fn build_report(&self, organization: Organization) -> Report {
        let started = Instant::now();
        if organization.is_empty() {
            return Report::empty(organization);
        }

        let organization = self.dispatcher.resolve_domain(organization).await;

        let dispatch = self.dispatcher.dispatch(&organization).await;
        let no_candidates = dispatch.no_candidates_found();
        let search_failed = dispatch.search_failed;
        if no_candidates {
            log::warn!(
                "No candidate pages for {} (search failed: {})",
                organization.name,
                search_failed
            );
        }

        let pages = self.crawl(dispatch.candidates, &organization).await;

        let executives = self.extractor.extract_all(&pages, &organization);
        let (contacts, socials) = extract_from_pages(&pages, &organization);
        let page_text = self.official_text(&pages, &organization);
        let recent_posts = self.recent_news(&organization).await;

        let summary = self
            .summarizer
            .summarize(SummaryRequest {
                organization: &organization,
                page_text: &page_text,
                headlines: &recent_posts,
            })
            .await;
        let category = self.categorizer.categorize(&organization, &socials).await;

        let crawl = CrawlStats {
            search_failed,
            no_candidates,
            ..crawl_stats(&pages, &organization)
        };
        let latency_ms = started.elapsed().as_millis() as u64;
        log::info!(
            "Built report for {} in {}ms: {} executives from {}/{} official pages",
            organization.name,
            latency_ms,
            executives.len(),
            crawl.official,
            crawl.candidates
        );

        Report {
            website: organization.website(),
            organization,
            executives,
            contacts,
            socials,
            recent_posts,
            summary,
            category,
            crawl,
            generated_at: Utc::now(),
            latency_ms,
        }
    }

    /// Reports in input order, at most `bulk.concurrency` in flight.
    pub async fn build_reports(&self, organizations: Vec<Organization>) -> Vec<Report> {
        futures::stream::iter(organizations)
            .map(|organization| self.build_report(organization))
            .buffered(self.bulk_concurrency)
            .collect()
            .await
    }

    /// First batch from the dispatcher, then one level of internal links.
    async fn crawl(
        &self,
        candidates: Vec<CandidateUrl>,
        organization: &Organization,
    ) -> Vec<CandidatePage> {
        let mut pages = self.fetcher.fetch_all(candidates).await;

        let seen: HashSet<String> = pages
            .iter()
            .flat_map(|p| [Some(p.url.as_str()), p.final_url.as_deref()])
            .flatten()
            .map(|u| u.trim_end_matches('/').to_string())
            .collect();

        let internal =
            discover_internal_links(&pages, organization, &seen, self.max_internal_links);
        if !internal.is_empty() {
            log::info!(
                "Following {} internal links for {}",
                internal.len(),
                organization.name
            );
            pages.extend(self.fetcher.fetch_all(internal).await);
        }

        pages
    }

    fn official_text(&self, pages: &[CandidatePage], organization: &Organization) -> String {
        let text = pages
            .iter()
            .filter(|p| is_official(p, organization))
            .filter_map(|p| p.html())
            .map(|html| readable_text(&Html::parse_document(html), self.max_text_chars))
            .filter(|t| !t.is_empty())
            .collect::<Vec<String>>()
            .join("\n\n");

        truncate_chars(&text, self.max_text_chars)
    }

    async fn recent_news(&self, organization: &Organization) -> Vec<NewsItem> {
        if !self.search.is_configured() {
            return vec![];
        }

        match self.search.news(&organization.search_query()).await {
            Ok(news) => news.into_iter().take(MAX_NEWS_ITEMS).collect(),
            Err(e) => {
                log::error!("Failed to fetch news for {}: {}", organization.name, e);
                vec![]
            }
        }
    }
}

fn crawl_stats(pages: &[CandidatePage], organization: &Organization) -> CrawlStats {
    CrawlStats {
        search_failed: false,
        no_candidates: pages.is_empty(),
        candidates: pages.len(),
        fetched: pages
            .iter()
            .filter(|p| matches!(p.status, FetchStatus::Fetched { .. }))
            .count(),
        failed: pages.iter().filter(|p| p.is_failed()).count(),
        official: pages
            .iter()
            .filter(|p| p.html().is_some() && is_official(p, organization))
            .count(),
    }
}
