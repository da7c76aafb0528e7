use std::{sync::Arc, time::Duration};

use rand::Rng;
use reqwest::{header::USER_AGENT, Client, StatusCode};
use tokio::{sync::Semaphore, task::JoinSet};
use url::Url;

use crate::{
    configuration::CrawlerSettings,
    domain::candidate_page::{CandidatePage, CandidateUrl},
    error::FetchError,
};

use super::http::{build_crawl_client, random_user_agent};

/// Fetches candidate pages with a concurrency cap, a per-request timeout,
/// and bounded retries for transient failures.
#[derive(Clone)]
pub struct CrawlFetcher {
    client: Client,
    semaphore: Arc<Semaphore>,
    max_retries: u32,
    backoff_base: Duration,
}

enum Attempt {
    Done {
        final_url: String,
        status: u16,
        body: String,
    },
    Permanent(FetchError),
    Transient(FetchError),
}

impl CrawlFetcher {
    pub fn new(settings: &CrawlerSettings) -> Result<Self, reqwest::Error> {
        let client = build_crawl_client(settings.timeout())?;

        Ok(CrawlFetcher {
            client,
            semaphore: Arc::new(Semaphore::new(settings.max_concurrency.max(1))),
            max_retries: settings.max_retries,
            backoff_base: settings.backoff_base(),
        })
    }

    /// One entry per input URL, in input order. Never fails as a whole.
    pub async fn fetch_all(&self, candidates: Vec<CandidateUrl>) -> Vec<CandidatePage> {
        if candidates.is_empty() {
            return vec![];
        }
        log::info!("Fetching {} candidate pages", candidates.len());

        let mut tasks = JoinSet::new();
        for (index, candidate) in candidates.iter().cloned().enumerate() {
            let fetcher = self.clone();
            tasks.spawn(async move {
                let _permit = fetcher.semaphore.clone().acquire_owned().await.ok();
                (index, fetcher.fetch(candidate).await)
            });
        }

        // Single accumulation point; tasks only hand back their own page.
        let mut slots: Vec<Option<CandidatePage>> = vec![None; candidates.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, page)) => slots[index] = Some(page),
                Err(e) => log::error!("Fetch task failed to complete: {:?}", e),
            }
        }

        slots
            .into_iter()
            .zip(candidates)
            .map(|(slot, candidate)| {
                slot.unwrap_or_else(|| {
                    CandidatePage::failed(
                        candidate,
                        FetchError::Network {
                            message: "fetch task aborted".to_string(),
                            attempts: 0,
                        },
                    )
                })
            })
            .collect()
    }

    pub async fn fetch(&self, candidate: CandidateUrl) -> CandidatePage {
        match Url::parse(&candidate.url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            _ => {
                let error = FetchError::InvalidUrl(candidate.url.clone());
                return CandidatePage::failed(candidate, error);
            }
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.attempt(&candidate.url, attempts).await {
                Attempt::Done {
                    final_url,
                    status,
                    body,
                } => {
                    log::info!(
                        "Fetched {} ({} bytes, attempt {})",
                        final_url,
                        body.len(),
                        attempts
                    );
                    return CandidatePage::fetched(candidate, final_url, status, attempts, body);
                }
                Attempt::Permanent(error) => {
                    log::warn!("Not retrying {}: {}", candidate.url, error);
                    return CandidatePage::failed(candidate, error);
                }
                Attempt::Transient(error) if attempts <= self.max_retries => {
                    let delay = self.backoff(attempts);
                    log::warn!(
                        "Retrying {} in {:?} after: {}",
                        candidate.url,
                        delay,
                        error
                    );
                    tokio::time::sleep(delay).await;
                }
                Attempt::Transient(error) => {
                    log::error!("Giving up on {}: {}", candidate.url, error);
                    return CandidatePage::failed(candidate, error);
                }
            }
        }
    }

    async fn attempt(&self, url: &str, attempts: u32) -> Attempt {
        let request = self.client.get(url).header(USER_AGENT, random_user_agent());
        let res = match request.send().await {
            Ok(res) => res,
            Err(e) if e.is_timeout() => return Attempt::Transient(FetchError::Timeout { attempts }),
            Err(e) if e.is_redirect() || e.is_builder() => {
                return Attempt::Permanent(FetchError::Network {
                    message: e.to_string(),
                    attempts,
                })
            }
            Err(e) => {
                return Attempt::Transient(FetchError::Network {
                    message: e.to_string(),
                    attempts,
                })
            }
        };

        let status = res.status();
        if is_transient_status(status) {
            return Attempt::Transient(FetchError::Transient {
                status: status.as_u16(),
                attempts,
            });
        }
        if !status.is_success() {
            return Attempt::Permanent(FetchError::Permanent(status.as_u16()));
        }

        if let Some(content_type) = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_textual(content_type) {
                return Attempt::Permanent(FetchError::Body(format!(
                    "unsupported content type {}",
                    content_type
                )));
            }
        }

        let final_url = res.url().to_string();
        match res.text().await {
            Ok(body) => Attempt::Done {
                final_url,
                status: status.as_u16(),
                body,
            },
            Err(e) if e.is_timeout() => Attempt::Transient(FetchError::Timeout { attempts }),
            Err(e) => Attempt::Transient(FetchError::Body(e.to_string())),
        }
    }

    /// base * 2^(attempt - 1) plus up to half a base of jitter.
    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.backoff_base.as_millis() as u64;
        let exponential = base.saturating_mul(1u64 << (attempt.saturating_sub(1)).min(10));
        let jitter = rand::thread_rng().gen_range(0..=base / 2);
        Duration::from_millis(exponential + jitter)
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn is_textual(content_type: &str) -> bool {
    let content_type = content_type.to_lowercase();
    content_type.contains("html")
        || content_type.contains("xml")
        || content_type.starts_with("text/")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use tokio::time::Instant;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;
    use crate::{
        domain::candidate_page::{DiscoverySource, FetchStatus},
        services::http::USER_AGENTS,
    };

    fn fetcher(max_retries: u32, timeout_seconds: u64) -> CrawlFetcher {
        CrawlFetcher::new(&CrawlerSettings {
            max_concurrency: 2,
            timeout_seconds,
            max_retries,
            backoff_base_millis: 0,
            ..Default::default()
        })
        .unwrap()
    }

    fn candidate(url: String) -> CandidateUrl {
        CandidateUrl::new(url, DiscoverySource::WellKnownPath)
    }

    #[tokio::test]
    async fn successful_fetch_returns_content() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/leadership"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_string("<html><body>Hi</body></html>"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let page = fetcher(2, 5)
            .fetch(candidate(format!("{}/leadership", mock_server.uri())))
            .await;

        assert_eq!(
            page.status,
            FetchStatus::Fetched {
                status: 200,
                attempts: 1
            }
        );
        assert_eq!(page.html(), Some("<html><body>Hi</body></html>"));
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/team"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        let page = fetcher(3, 5)
            .fetch(candidate(format!("{}/team", mock_server.uri())))
            .await;

        assert_eq!(page.status, FetchStatus::Failed(FetchError::Permanent(404)));
    }

    #[tokio::test]
    async fn server_errors_are_retried_up_to_the_bound() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/board"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&mock_server)
            .await;

        let page = fetcher(2, 5)
            .fetch(candidate(format!("{}/board", mock_server.uri())))
            .await;

        assert_eq!(
            page.status,
            FetchStatus::Failed(FetchError::Transient {
                status: 503,
                attempts: 3
            })
        );
    }

    #[tokio::test]
    async fn too_many_requests_recovers_on_retry() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/people"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/people"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<p>ok</p>"),
            )
            .mount(&mock_server)
            .await;

        let page = fetcher(2, 5)
            .fetch(candidate(format!("{}/people", mock_server.uri())))
            .await;

        assert_eq!(
            page.status,
            FetchStatus::Fetched {
                status: 200,
                attempts: 2
            }
        );
    }

    #[tokio::test]
    async fn slow_responses_time_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&mock_server)
            .await;

        let page = fetcher(0, 1)
            .fetch(candidate(format!("{}/slow", mock_server.uri())))
            .await;

        assert_eq!(
            page.status,
            FetchStatus::Failed(FetchError::Timeout { attempts: 1 })
        );
    }

    #[tokio::test]
    async fn invalid_urls_fail_without_a_request() {
        let page = fetcher(2, 5)
            .fetch(candidate("mailto:ceo@acme.com".to_string()))
            .await;

        assert!(matches!(
            page.status,
            FetchStatus::Failed(FetchError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn fetch_all_preserves_input_order_and_records_failures() {
        let mock_server = MockServer::start().await;
        for (p, status) in [("/a", 200), ("/b", 404), ("/c", 200)] {
            Mock::given(method("GET"))
                .and(path(p))
                .respond_with(
                    ResponseTemplate::new(status)
                        .insert_header("content-type", "text/html")
                        .set_body_string(p),
                )
                .mount(&mock_server)
                .await;
        }

        let candidates = ["/a", "/b", "/c"]
            .iter()
            .map(|p| candidate(format!("{}{}", mock_server.uri(), p)))
            .collect();
        let pages = fetcher(0, 5).fetch_all(candidates).await;

        assert_eq!(pages.len(), 3);
        assert!(pages[0].url.ends_with("/a"));
        assert!(pages[1].is_failed());
        assert_eq!(pages[2].html(), Some("/c"));
    }

    async fn mount_slow_pages(mock_server: &MockServer, delay: Duration) {
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<p>slow</p>")
                    .set_delay(delay),
            )
            .mount(mock_server)
            .await;
    }

    fn slow_candidates(mock_server: &MockServer, count: usize) -> Vec<CandidateUrl> {
        (0..count)
            .map(|i| candidate(format!("{}/page-{}", mock_server.uri(), i)))
            .collect()
    }

    #[tokio::test]
    async fn fetch_all_never_exceeds_the_concurrency_cap() {
        let mock_server = MockServer::start().await;
        mount_slow_pages(&mock_server, Duration::from_millis(300)).await;

        // Six 300ms pages through two slots take three waves.
        let started = Instant::now();
        let pages = fetcher(0, 5)
            .fetch_all(slow_candidates(&mock_server, 6))
            .await;
        let elapsed = started.elapsed();

        assert_eq!(pages.len(), 6);
        assert!(pages.iter().all(|p| p.html() == Some("<p>slow</p>")));
        assert!(
            elapsed >= Duration::from_millis(900),
            "finished in {:?}, cap was not enforced",
            elapsed
        );
        assert!(
            elapsed < Duration::from_millis(1800),
            "finished in {:?}, pages were fetched serially",
            elapsed
        );
    }

    #[tokio::test]
    async fn wider_cap_fetches_in_a_single_wave() {
        let mock_server = MockServer::start().await;
        mount_slow_pages(&mock_server, Duration::from_millis(300)).await;

        let wide = CrawlFetcher::new(&CrawlerSettings {
            max_concurrency: 6,
            timeout_seconds: 5,
            max_retries: 0,
            backoff_base_millis: 0,
            ..Default::default()
        })
        .unwrap();

        let started = Instant::now();
        let pages = wide.fetch_all(slow_candidates(&mock_server, 6)).await;
        let elapsed = started.elapsed();

        assert_eq!(pages.len(), 6);
        assert!(elapsed < Duration::from_millis(900), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn retries_wait_for_exponential_backoff() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&mock_server)
            .await;

        let patient = CrawlFetcher::new(&CrawlerSettings {
            max_concurrency: 1,
            timeout_seconds: 5,
            max_retries: 2,
            backoff_base_millis: 200,
            ..Default::default()
        })
        .unwrap();

        // 200ms before the second attempt, 400ms before the third.
        let started = Instant::now();
        let page = patient
            .fetch(candidate(format!("{}/busy", mock_server.uri())))
            .await;
        let elapsed = started.elapsed();

        assert_eq!(
            page.status,
            FetchStatus::Failed(FetchError::Transient {
                status: 503,
                attempts: 3
            })
        );
        assert!(elapsed >= Duration::from_millis(600), "took {:?}", elapsed);
    }

    #[test]
    fn backoff_doubles_per_attempt_within_jitter() {
        let paced = CrawlFetcher::new(&CrawlerSettings {
            backoff_base_millis: 100,
            ..Default::default()
        })
        .unwrap();

        for (attempt, floor) in [(1, 100), (2, 200), (3, 400)] {
            let delay = paced.backoff(attempt).as_millis() as u64;
            assert!(delay >= floor && delay <= floor + 50, "{} -> {}", attempt, delay);
        }
    }

    #[tokio::test]
    async fn each_request_carries_a_rotated_user_agent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<p>hi</p>"),
            )
            .mount(&mock_server)
            .await;

        let candidates = (0..20)
            .map(|i| candidate(format!("{}/p{}", mock_server.uri(), i)))
            .collect();
        fetcher(0, 5).fetch_all(candidates).await;

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 20);
        let agents: HashSet<&str> = requests
            .iter()
            .map(|r| {
                r.headers
                    .get("user-agent")
                    .and_then(|v| v.to_str().ok())
                    .unwrap()
            })
            .collect();
        assert!(agents.iter().all(|ua| USER_AGENTS.contains(ua)));
        // Twenty draws from the rotation all landing on one entry is
        // vanishingly unlikely unless the agent is fixed per client.
        assert!(agents.len() > 1);
    }
}
