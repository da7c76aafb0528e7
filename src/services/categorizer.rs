use std::sync::Arc;

use crate::domain::{contact::Socials, organization::Organization};

use super::summarizer::LanguageModel;

pub const OTHER: &str = "Other";

const CATEGORY_RULES: [(&str, &[&str]); 8] = [
    (
        "Tech",
        &[
            "software", "saas", "ai", "cloud", "tech", "data", "developer", "app", "apps",
            "platform", "streaming", "cyber", "digital", "labs",
        ],
    ),
    (
        "Retail",
        &["store", "shop", "retail", "ecommerce", "fashion", "apparel", "outlet"],
    ),
    (
        "Health",
        &[
            "health", "clinic", "medical", "pharma", "biotech", "hospital", "wellness", "care",
        ],
    ),
    (
        "Finance",
        &[
            "bank", "fintech", "trading", "investment", "insurance", "accounting", "capital",
        ],
    ),
    (
        "Education",
        &["school", "university", "academy", "education", "edtech", "training", "college"],
    ),
    (
        "Hospitality",
        &["hotel", "hotels", "restaurant", "cafe", "resort", "hospitality", "food"],
    ),
    (
        "Real Estate",
        &["realty", "property", "properties", "realtor", "housing", "estate"],
    ),
    (
        "Manufacturing",
        &["manufacturing", "factory", "industrial", "industries", "automation", "hardware"],
    ),
];

/// Keyword rules first, then the language model restricted to the same
/// label set, then `Other`.
pub struct Categorizer {
    model: Arc<dyn LanguageModel>,
}

impl Categorizer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Categorizer { model }
    }

    pub async fn categorize(&self, organization: &Organization, socials: &Socials) -> String {
        if let Some(category) = categorize_by_rules(organization, socials) {
            return category.to_string();
        }

        if !self.model.is_configured() {
            return OTHER.to_string();
        }

        let prompt = format!(
            "Categorize '{}' (domain {}) into exactly one of: {}, {}. Return only the category.",
            organization.name,
            organization.domain.as_deref().unwrap_or("unknown"),
            labels().join(", "),
            OTHER
        );

        match self.model.generate(&prompt).await {
            Ok(answer) => match_label(&answer).unwrap_or(OTHER).to_string(),
            Err(e) => {
                log::warn!("Failed to categorize {}: {}", organization.name, e);
                OTHER.to_string()
            }
        }
    }
}

/// Whole-word match over name, domain labels, and social platform names.
pub fn categorize_by_rules(
    organization: &Organization,
    socials: &Socials,
) -> Option<&'static str> {
    let mut haystack = vec![organization.name.clone()];
    haystack.extend(organization.domain.clone());
    haystack.extend(socials.links.keys().map(|p| p.label().to_string()));

    let words: Vec<String> = haystack
        .join(" ")
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect();

    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| words.iter().any(|w| keywords.contains(&w.as_str())))
        .map(|(label, _)| *label)
}

fn labels() -> Vec<&'static str> {
    CATEGORY_RULES.iter().map(|(label, _)| *label).collect()
}

/// Maps a free-form model answer onto a known label.
fn match_label(answer: &str) -> Option<&'static str> {
    let answer = answer.trim().trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
    labels()
        .into_iter()
        .chain([OTHER])
        .find(|label| answer.starts_with(&label.to_lowercase()))
}
