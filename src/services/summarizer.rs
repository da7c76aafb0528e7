use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    configuration::SummarizerSettings,
    domain::{contact::NewsItem, organization::Organization, summary::SummaryRecord},
    error::SummarizerError,
};

use super::{http::build_api_client, page_text::truncate_chars};

const MAX_HEADLINES: usize = 8;
const MAX_PROMPT_TEXT_CHARS: usize = 6_000;

/// Seam over the generative-language API.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, SummarizerError>;

    fn is_configured(&self) -> bool;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(
        settings: &SummarizerSettings,
        api_key: Option<String>,
    ) -> Result<Self, SummarizerError> {
        let client = build_api_client(settings.timeout())
            .map_err(|e| SummarizerError::Http(format!("failed to build HTTP client: {}", e)))?;

        Ok(GeminiClient {
            client,
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        })
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, SummarizerError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SummarizerError::MissingApiKey)?;

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let res = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| SummarizerError::Http(e.to_string()))?;

        if !res.status().is_success() {
            return Err(SummarizerError::Status(res.status().as_u16()));
        }

        let response: GenerateResponse = res
            .json()
            .await
            .map_err(|e| SummarizerError::Http(e.to_string()))?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<String>>()
                    .join("")
            })
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(SummarizerError::EmptyResponse)?;

        Ok(text)
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Everything the synopsis is allowed to draw on.
pub struct SummaryRequest<'a> {
    pub organization: &'a Organization,
    pub page_text: &'a str,
    pub headlines: &'a [NewsItem],
}

impl SummaryRequest<'_> {
    pub fn prompt(&self, max_words: usize) -> String {
        let name = self.organization.search_query();
        let mut prompt = format!(
            "In {}-{} words, write a neutral overview of {}: what it does, its products or services, \
             and its market position. Focus on official announcements, partnerships, and financial \
             updates. Use only the material below and do not invent facts.",
            max_words.saturating_sub(30).max(1),
            max_words,
            name
        );

        if !self.headlines.is_empty() {
            prompt.push_str("\n\nRecent headlines:\n");
            for item in self.headlines.iter().take(MAX_HEADLINES) {
                prompt.push_str(&format!("- {}", item.title));
                if let Some(date) = &item.date {
                    prompt.push_str(&format!(" ({})", date));
                }
                prompt.push('\n');
            }
        }

        let text = self.page_text.trim();
        if !text.is_empty() {
            prompt.push_str("\n\nFrom the company's own website:\n");
            prompt.push_str(&truncate_chars(text, MAX_PROMPT_TEXT_CHARS));
        }

        prompt
    }
}

pub struct Summarizer {
    model: Arc<dyn LanguageModel>,
    max_words: usize,
}

impl Summarizer {
    pub fn new(model: Arc<dyn LanguageModel>, settings: &SummarizerSettings) -> Self {
        Summarizer {
            model,
            max_words: settings.max_words,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_configured()
    }

    /// Falls back to an empty synopsis whenever the model is unavailable.
    pub async fn summarize(&self, request: SummaryRequest<'_>) -> SummaryRecord {
        let name = &request.organization.name;
        if !self.model.is_configured() {
            log::warn!("Summarizer not configured, empty synopsis for {}", name);
            return SummaryRecord::empty(name);
        }
        if request.page_text.trim().is_empty() && request.headlines.is_empty() {
            log::info!("No source material, empty synopsis for {}", name);
            return SummaryRecord::empty(name);
        }

        match self.model.generate(&request.prompt(self.max_words)).await {
            Ok(text) => {
                let synopsis = trim_to_max_words(&text, self.max_words);
                log::info!(
                    "Generated {} word synopsis for {}",
                    synopsis.split_whitespace().count(),
                    name
                );
                SummaryRecord::new(name, synopsis)
            }
            Err(e) => {
                log::error!("Failed to summarize {}: {}", name, e);
                SummaryRecord::empty(name)
            }
        }
    }
}

pub fn trim_to_max_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return words.join(" ");
    }

    let mut trimmed = words[..max_words].join(" ");
    if !trimmed.ends_with(['.', '!', '?']) {
        trimmed = trimmed.trim_end_matches([',', ';', ':']).to_string();
        trimmed.push('.');
    }
    trimmed
}
