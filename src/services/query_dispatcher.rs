use std::{collections::HashSet, sync::Arc};

use futures::future::join_all;
use scraper::{Html, Selector};
use url::Url;

use crate::{
    configuration::{CrawlerSettings, SearchSettings},
    domain::{
        candidate_page::{CandidatePage, CandidateUrl, DiscoverySource},
        organization::{domain_of, Organization},
    },
    error::SearchError,
};

use super::serper_client::SearchProvider;

const LEADERSHIP_QUERIES: [&str; 5] = [
    "leadership",
    "team",
    "executive team",
    "board of directors",
    "management",
];

pub const LEADERSHIP_PATHS: [&str; 16] = [
    "/leadership",
    "/team",
    "/management",
    "/executive-team",
    "/leadership-team",
    "/board",
    "/board-of-directors",
    "/about/leadership",
    "/about/team",
    "/about/company",
    "/company/leadership",
    "/company/team",
    "/people",
    "/who-we-are",
    "/our-team",
    "/investors/corporate-governance",
];

/// Path fragments that mark an internal link as worth a second crawl batch.
const LEADERSHIP_LINK_MARKERS: [&str; 9] = [
    "leadership",
    "team",
    "management",
    "executive",
    "board",
    "people",
    "governance",
    "founder",
    "about",
];

const SKIP_MARKERS: [&str; 8] = [
    "/help",
    "/support",
    "/customer",
    "/account",
    "/orders",
    "/wishlist",
    "/login",
    "/cart",
];

/// Hosts that are never an organization's own site when resolving a domain
/// from a name search.
const NON_OFFICIAL_HOSTS: [&str; 14] = [
    "linkedin.com",
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "youtube.com",
    "wikipedia.org",
    "crunchbase.com",
    "bloomberg.com",
    "glassdoor.com",
    "indeed.com",
    "zoominfo.com",
    "amazon.com",
    "google.com",
];

/// Ordered candidate URLs plus whether the search API was reachable.
#[derive(Debug, Default)]
pub struct Dispatch {
    pub candidates: Vec<CandidateUrl>,
    pub search_failed: bool,
}

impl Dispatch {
    pub fn no_candidates_found(&self) -> bool {
        self.candidates.is_empty()
    }
}

pub struct QueryDispatcher {
    search: Arc<dyn SearchProvider>,
    pages: u8,
    max_candidates: usize,
    probe_well_known_paths: bool,
}

impl QueryDispatcher {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        search_settings: &SearchSettings,
        crawler_settings: &CrawlerSettings,
    ) -> Self {
        QueryDispatcher {
            search,
            pages: search_settings.pages.max(1),
            max_candidates: crawler_settings.max_candidate_pages,
            probe_well_known_paths: crawler_settings.probe_well_known_paths,
        }
    }

    /// Fills in the domain of a name-only organization from an
    /// "official site" search. Leaves the organization untouched on failure.
    pub async fn resolve_domain(&self, organization: Organization) -> Organization {
        if organization.domain.is_some()
            || organization.name.is_empty()
            || !self.search.is_configured()
        {
            return organization;
        }

        let query = format!("{} official site", organization.name);
        let results = match self.search.search(&query, 1).await {
            Ok(results) => results,
            Err(e) => {
                log::error!("Failed to resolve domain for {}: {}", organization.name, e);
                return organization;
            }
        };

        match results
            .iter()
            .filter_map(|r| domain_of(&r.link))
            .find(|domain| !is_non_official_host(domain))
        {
            Some(domain) => {
                log::info!("Resolved {} to {}", organization.name, domain);
                organization.with_domain(&domain)
            }
            None => {
                log::warn!("No official site found for {}", organization.name);
                organization
            }
        }
    }

    /// Never fails: search errors are logged and count as zero results.
    pub async fn dispatch(&self, organization: &Organization) -> Dispatch {
        let Some(host) = organization.site_host() else {
            log::warn!("No domain for {}, nothing to search", organization.name);
            return Dispatch::default();
        };

        let (mut urls, search_failed) = match self.search.is_configured() {
            true => self.search_leadership_pages(&host).await,
            false => {
                log::warn!("Search API not configured, skipping search for {}", host);
                (vec![], true)
            }
        };

        // Well-known paths only supplement a search that found something;
        // an empty or failed search yields no candidates.
        if self.probe_well_known_paths && !urls.is_empty() {
            if let Some(website) = organization.website() {
                urls.extend(well_known_urls(&website));
            }
        }

        let candidates = filter_candidate_urls(urls, self.max_candidates);
        log::info!(
            "Dispatched {} candidate urls for {}",
            candidates.len(),
            organization.name
        );

        Dispatch {
            candidates,
            search_failed,
        }
    }

    async fn search_leadership_pages(&self, host: &str) -> (Vec<CandidateUrl>, bool) {
        let queries = build_leadership_queries(host);
        let results = join_all(queries.iter().map(|q| self.search_paginated(q))).await;

        let mut search_failed = false;
        let mut urls: Vec<CandidateUrl> = vec![];
        for (query, result) in queries.iter().zip(results) {
            match result {
                Ok(links) => urls.extend(
                    links
                        .into_iter()
                        .map(|link| CandidateUrl::new(link, DiscoverySource::SearchResult)),
                ),
                Err(e) => {
                    log::error!("Search failed for query {}: {}", query, e);
                    search_failed = true;
                }
            }
        }

        (urls, search_failed)
    }

    /// Links from pages `1..=pages`, stopping at the first empty page.
    async fn search_paginated(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let mut links = vec![];

        for page in 1..=self.pages {
            let results = match self.search.search(query, page).await {
                Ok(results) => results,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    log::warn!("Stopping pagination of {} at page {}: {}", query, page, e);
                    break;
                }
            };

            if results.is_empty() {
                break;
            }
            links.extend(results.into_iter().map(|r| r.link));
        }

        Ok(links)
    }
}

pub fn build_leadership_queries(host: &str) -> Vec<String> {
    LEADERSHIP_QUERIES
        .iter()
        .map(|q| format!("site:{} {}", host, q))
        .collect()
}

pub fn well_known_urls(website: &str) -> Vec<CandidateUrl> {
    let base = website.trim_end_matches('/');
    LEADERSHIP_PATHS
        .iter()
        .map(|path| CandidateUrl::new(format!("{}{}", base, path), DiscoverySource::WellKnownPath))
        .collect()
}

/// Dedups on the URL without its fragment, keeps first-seen order, drops
/// non-http and account/support style URLs, and caps the list.
pub fn filter_candidate_urls(urls: Vec<CandidateUrl>, max: usize) -> Vec<CandidateUrl> {
    let mut seen = HashSet::new();

    urls.into_iter()
        .filter_map(|candidate| {
            let mut parsed = Url::parse(candidate.url.trim()).ok()?;
            parsed.set_fragment(None);
            match parsed.scheme() {
                "http" | "https" => {}
                _ => return None,
            }
            parsed.host_str().filter(|h| !h.is_empty())?;

            Some(CandidateUrl::new(parsed.to_string(), candidate.source))
        })
        .filter(|candidate| !is_skipped(&candidate.url))
        .filter(|candidate| seen.insert(candidate.url.trim_end_matches('/').to_string()))
        .take(max)
        .collect()
}

/// Leadership-looking links on official pages that have not been seen yet.
pub fn discover_internal_links(
    pages: &[CandidatePage],
    organization: &Organization,
    seen: &HashSet<String>,
    max: usize,
) -> Vec<CandidateUrl> {
    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return vec![];
    };

    let mut found: Vec<CandidateUrl> = vec![];
    for page in pages {
        let Some(html) = page.html() else { continue };
        if !organization.is_official_url(page.effective_url()) {
            continue;
        }
        let Ok(base) = Url::parse(page.effective_url()) else {
            continue;
        };

        let document = Html::parse_document(html);
        for href in document
            .select(&anchor_selector)
            .filter_map(|a| a.value().attr("href"))
        {
            let Ok(mut link) = base.join(href.trim()) else {
                continue;
            };
            link.set_fragment(None);
            let link = link.to_string();

            if organization.is_official_url(&link) && is_leadership_link(&link) {
                found.push(CandidateUrl::new(link, DiscoverySource::InternalLink));
            }
        }
    }

    let found = filter_candidate_urls(found, usize::MAX);
    found
        .into_iter()
        .filter(|c| !seen.contains(c.url.trim_end_matches('/')))
        .take(max)
        .collect()
}

fn is_leadership_link(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            let path = parsed.path().to_lowercase();
            LEADERSHIP_LINK_MARKERS.iter().any(|m| path.contains(m))
        }
        Err(_) => false,
    }
}

fn is_skipped(url: &str) -> bool {
    let url = url.to_lowercase();
    SKIP_MARKERS.iter().any(|marker| url.contains(marker))
}

fn is_non_official_host(domain: &str) -> bool {
    NON_OFFICIAL_HOSTS
        .iter()
        .any(|host| domain == *host || domain.ends_with(&format!(".{}", host)))
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        domain::contact::NewsItem,
        services::serper_client::OrganicResult,
    };

    #[derive(Default)]
    struct FakeSearch {
        results: HashMap<(String, u8), Vec<&'static str>>,
        failing: bool,
        calls: Mutex<Vec<(String, u8)>>,
    }

    impl FakeSearch {
        fn with(mut self, query: &str, page: u8, links: Vec<&'static str>) -> Self {
            self.results.insert((query.to_string(), page), links);
            self
        }
    }

    #[async_trait]
    impl SearchProvider for FakeSearch {
        async fn search(&self, query: &str, page: u8) -> Result<Vec<OrganicResult>, SearchError> {
            self.calls.lock().unwrap().push((query.to_string(), page));
            if self.failing {
                return Err(SearchError::Status(500));
            }
            Ok(self
                .results
                .get(&(query.to_string(), page))
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(|link| OrganicResult {
                    title: String::new(),
                    link: link.to_string(),
                    snippet: None,
                    position: None,
                })
                .collect())
        }

        async fn news(&self, _query: &str) -> Result<Vec<NewsItem>, SearchError> {
            Ok(vec![])
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    fn dispatcher(
        search: Arc<FakeSearch>,
        pages: u8,
        well_known_paths: bool,
    ) -> QueryDispatcher {
        QueryDispatcher::new(
            search,
            &SearchSettings {
                pages,
                ..Default::default()
            },
            &CrawlerSettings {
                probe_well_known_paths: well_known_paths,
                ..Default::default()
            },
        )
    }

    fn urls(candidates: &[CandidateUrl]) -> Vec<&str> {
        candidates.iter().map(|c| c.url.as_str()).collect()
    }

    #[test]
    fn filter_candidate_urls_invalid() {
        let raw_urls = [
            "https://acme.com/help/leadership",
            "https://acme.com/support",
            "https://acme.com/account/login",
            "https://acme.com/Customer-Care",
            "mailto:press@acme.com",
            "/leadership",
            "#",
        ];
        let raw_urls = raw_urls
            .iter()
            .map(|u| CandidateUrl::new(*u, DiscoverySource::SearchResult))
            .collect();

        assert!(filter_candidate_urls(raw_urls, 12).is_empty());
    }

    #[test]
    fn filter_candidate_urls_dedups_and_caps() {
        let raw_urls = [
            "https://acme.com/leadership",
            "https://acme.com/leadership#board",
            "https://acme.com/leadership/",
            "https://acme.com/team",
            "https://acme.com/board",
        ];
        let raw_urls = raw_urls
            .iter()
            .map(|u| CandidateUrl::new(*u, DiscoverySource::SearchResult))
            .collect();

        let results = filter_candidate_urls(raw_urls, 2);

        assert_eq!(
            urls(&results),
            vec!["https://acme.com/leadership", "https://acme.com/team"]
        );
    }

    #[test]
    fn leadership_queries_are_site_scoped() {
        let queries = build_leadership_queries("acme.com");

        assert_eq!(queries[0], "site:acme.com leadership");
        assert_eq!(queries.len(), LEADERSHIP_QUERIES.len());
    }

    #[test]
    fn well_known_urls_join_website() {
        let candidates = well_known_urls("https://acme.com/");

        assert_eq!(candidates[0].url, "https://acme.com/leadership");
        assert!(candidates
            .iter()
            .all(|c| c.source == DiscoverySource::WellKnownPath));
    }

    #[tokio::test]
    async fn dispatch_orders_search_results_before_well_known_paths() {
        let search = Arc::new(
            FakeSearch::default()
                .with("site:acme.com leadership", 1, vec!["https://acme.com/about/leaders"])
                .with("site:acme.com team", 1, vec!["https://acme.com/our-people"]),
        );

        let dispatch = dispatcher(search, 1, true)
            .dispatch(&Organization::new("Acme Corp", "acme.com"))
            .await;

        assert!(!dispatch.search_failed);
        assert_eq!(dispatch.candidates[0].url, "https://acme.com/about/leaders");
        assert_eq!(dispatch.candidates[1].url, "https://acme.com/our-people");
        assert_eq!(dispatch.candidates[2].url, "https://acme.com/leadership");
        assert_eq!(dispatch.candidates[2].source, DiscoverySource::WellKnownPath);
    }

    #[tokio::test]
    async fn pagination_stops_at_first_empty_page() {
        let search = Arc::new(
            FakeSearch::default()
                .with("site:acme.com leadership", 1, vec!["https://acme.com/a"])
                .with("site:acme.com leadership", 2, vec!["https://acme.com/b"]),
        );

        let dispatch = dispatcher(search.clone(), 5, false)
            .dispatch(&Organization::new("Acme Corp", "acme.com"))
            .await;

        assert_eq!(
            urls(&dispatch.candidates),
            vec!["https://acme.com/a", "https://acme.com/b"]
        );
        let calls = search.calls.lock().unwrap();
        let leadership_pages: Vec<u8> = calls
            .iter()
            .filter(|(q, _)| q == "site:acme.com leadership")
            .map(|(_, p)| *p)
            .collect();
        assert_eq!(leadership_pages.len(), 3);
    }

    #[tokio::test]
    async fn empty_results_signal_no_candidates() {
        let search = Arc::new(FakeSearch::default());

        let dispatch = QueryDispatcher::new(
            search,
            &SearchSettings::default(),
            &CrawlerSettings::default(),
        )
        .dispatch(&Organization::new("Acme Corp", "acme.com"))
        .await;

        assert!(dispatch.candidates.is_empty());
        assert!(dispatch.no_candidates_found());
        assert!(!dispatch.search_failed);
    }

    #[tokio::test]
    async fn search_failure_is_reported_not_raised() {
        let search = Arc::new(FakeSearch {
            failing: true,
            ..Default::default()
        });

        let dispatch = dispatcher(search, 1, true)
            .dispatch(&Organization::new("Acme Corp", "acme.com"))
            .await;

        assert!(dispatch.search_failed);
        assert!(dispatch.no_candidates_found());
    }

    #[tokio::test]
    async fn resolve_domain_skips_social_hosts() {
        let search = Arc::new(FakeSearch::default().with(
            "Acme Corp official site",
            1,
            vec![
                "https://www.linkedin.com/company/acme",
                "https://en.wikipedia.org/wiki/Acme",
                "https://www.acme.com/",
            ],
        ));

        let organization = dispatcher(search, 1, false)
            .resolve_domain(Organization::new("Acme Corp", ""))
            .await;

        assert_eq!(organization.domain.as_deref(), Some("acme.com"));
        assert_eq!(organization.name, "Acme Corp");
    }

    #[test]
    fn internal_links_stay_on_official_domain() {
        let page = CandidatePage::fetched(
            CandidateUrl::new("https://acme.com/about", DiscoverySource::WellKnownPath),
            "https://acme.com/about".to_string(),
            200,
            1,
            r#"<html><body>
                <a href="/company/leadership-team">Leadership</a>
                <a href="https://investors.acme.com/governance/board">Board</a>
                <a href="https://acme-fan-blog.com/team">Fans</a>
                <a href="/products">Products</a>
                <a href="/team">Team</a>
            </body></html>"#
                .to_string(),
        );
        let seen: HashSet<String> = ["https://acme.com/team".to_string()].into_iter().collect();

        let links = discover_internal_links(
            &[page],
            &Organization::new("Acme Corp", "acme.com"),
            &seen,
            6,
        );

        assert_eq!(
            urls(&links),
            vec![
                "https://acme.com/company/leadership-team",
                "https://investors.acme.com/governance/board"
            ]
        );
        assert!(links
            .iter()
            .all(|c| c.source == DiscoverySource::InternalLink));
    }
}
