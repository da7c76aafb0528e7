use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use crate::domain::{
    candidate_page::CandidatePage,
    contact::{Address, Contacts, SocialPlatform, Socials},
    organization::Organization,
};

use super::{executive_extractor::is_official, page_text::text_lines};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid regex")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\d[\d\s().-]{6,}\d").expect("valid regex"));

const PHONE_KEYWORDS: [&str; 5] = ["phone", "tel", "call", "mobile", "fax"];

const IMAGE_SUFFIXES: [&str; 6] = [".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

/// Social URLs that point at a post, a video, or a share dialog rather
/// than a profile.
const SOCIAL_SKIP_MARKERS: [&str; 15] = [
    "/status",
    "/with_replies",
    "/watch",
    "/reel",
    "/video",
    "/photos",
    "/posts",
    "/p/",
    "/share",
    "/sharer",
    "/intent",
    "/careers",
    "/jobs",
    "/life",
    "/about",
];

const ADDRESS_FIELDS: [&str; 5] = [
    "streetAddress",
    "addressLocality",
    "addressRegion",
    "postalCode",
    "addressCountry",
];

/// Contacts and social links gathered from the organization's own pages.
pub fn extract_from_pages(
    pages: &[CandidatePage],
    organization: &Organization,
) -> (Contacts, Socials) {
    let mut contacts = Contacts::default();
    let mut socials = Socials::default();

    for page in pages.iter().filter(|p| is_official(p, organization)) {
        let Some(html) = page.html() else { continue };
        let document = Html::parse_document(html);
        let url = page.effective_url();

        contacts.merge(extract_contacts(&document, url));
        socials.merge(extract_socials(&document, url));
    }

    let contacts = contacts.finalize();
    log::info!(
        "Found {} emails, {} phones, {} addresses and {} social links for {}",
        contacts.emails.len(),
        contacts.phones.len(),
        contacts.addresses.len(),
        socials.links.len(),
        organization.name
    );
    (contacts, socials)
}

pub fn extract_contacts(document: &Html, page_url: &str) -> Contacts {
    let mut contacts = Contacts::default();

    for href in hrefs(document) {
        let lower = href.to_lowercase();
        if let Some(address) = lower.strip_prefix("mailto:") {
            let address = address.split('?').next().unwrap_or_default().trim();
            if is_email(address) {
                contacts.emails.push(address.to_string());
            }
        } else if lower.starts_with("tel:") {
            if let Some(phone) = normalize_phone(&href[4..]) {
                contacts.phones.push(phone);
            }
        }
    }

    for line in text_lines(document) {
        contacts.emails.extend(
            EMAIL_RE
                .find_iter(&line.text)
                .map(|m| m.as_str().trim_end_matches('.'))
                .filter(|e| is_email(e))
                .map(|e| e.to_string()),
        );

        let lower = line.text.to_lowercase();
        let has_keyword = PHONE_KEYWORDS.iter().any(|k| lower.contains(k));
        contacts.phones.extend(
            PHONE_RE
                .find_iter(&line.text)
                .map(|m| m.as_str())
                .filter(|m| has_keyword || m.starts_with('+'))
                .filter_map(normalize_phone),
        );
    }

    for value in json_ld(document) {
        collect_json_ld(&value, page_url, &mut contacts);
    }

    contacts
}

pub fn extract_socials(document: &Html, page_url: &str) -> Socials {
    let mut socials = Socials::default();
    let base = Url::parse(page_url).ok();

    let same_as = json_ld(document)
        .iter()
        .flat_map(same_as_links)
        .collect::<Vec<String>>();

    for href in same_as.into_iter().chain(hrefs(document)) {
        let absolute = match &base {
            Some(base) => base.join(&href).ok(),
            None => Url::parse(&href).ok(),
        };
        if let Some((platform, url)) = absolute.and_then(|u| classify_social(&u)) {
            socials.links.entry(platform).or_insert(url);
        }
    }

    socials
}

/// Canonical profile URL (no query, fragment, or trailing slash) for a
/// recognised platform.
pub fn classify_social(url: &Url) -> Option<(SocialPlatform, String)> {
    let platform = SocialPlatform::from_host(url.host_str()?)?;
    let path = url.path().trim_end_matches('/');
    let lower = format!("{}/", path.to_lowercase());

    if path.is_empty() || SOCIAL_SKIP_MARKERS.iter().any(|m| lower.contains(m)) {
        return None;
    }
    if platform == SocialPlatform::Linkedin
        && !(lower.starts_with("/company/") || lower.starts_with("/showcase/"))
    {
        return None;
    }

    Some((
        platform,
        format!("{}://{}{}", url.scheme(), url.host_str()?, path),
    ))
}

/// `+digits` for international numbers, bare digits otherwise. 8 to 15
/// digits or nothing.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    let (international, digits) = match (raw.starts_with('+'), digits.strip_prefix("00")) {
        (true, _) => (true, digits.clone()),
        (false, Some(rest)) if raw.starts_with("00") => (true, rest.to_string()),
        _ => (false, digits.clone()),
    };

    if !(8..=15).contains(&digits.len()) {
        return None;
    }

    match international {
        true => Some(format!("+{}", digits)),
        false => Some(digits),
    }
}

fn is_email(candidate: &str) -> bool {
    let lower = candidate.to_lowercase();
    EMAIL_RE.is_match(candidate) && !IMAGE_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

fn hrefs(document: &Html) -> Vec<String> {
    match Selector::parse("a[href]") {
        Ok(selector) => document
            .select(&selector)
            .filter_map(|a| a.value().attr("href"))
            .map(|h| h.trim().to_string())
            .collect(),
        Err(_) => vec![],
    }
}

fn json_ld(document: &Html) -> Vec<Value> {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return vec![];
    };

    document
        .select(&selector)
        .filter_map(|script| {
            let raw = script.text().collect::<String>();
            match serde_json::from_str::<Value>(raw.trim()) {
                Ok(value) => Some(value),
                Err(e) => {
                    log::warn!("Skipping malformed JSON-LD block: {}", e);
                    None
                }
            }
        })
        .collect()
}

fn collect_json_ld(value: &Value, page_url: &str, contacts: &mut Contacts) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_json_ld(item, page_url, contacts);
            }
        }
        Value::Object(map) => {
            if map.get("@type").and_then(Value::as_str) == Some("PostalAddress") {
                if let Some(address) = format_address(value) {
                    contacts.addresses.push(Address {
                        value: address,
                        source: page_url.to_string(),
                    });
                }
            }

            if let Some(phone) = map
                .get("telephone")
                .and_then(Value::as_str)
                .and_then(normalize_phone)
            {
                contacts.phones.push(phone);
            }

            if let Some(email) = map.get("email").and_then(Value::as_str) {
                let email = email.trim_start_matches("mailto:").trim();
                if is_email(email) {
                    contacts.emails.push(email.to_string());
                }
            }

            for (key, child) in map {
                match (key.as_str(), child) {
                    ("address", Value::String(address)) if !address.trim().is_empty() => {
                        contacts.addresses.push(Address {
                            value: address.trim().to_string(),
                            source: page_url.to_string(),
                        });
                    }
                    ("address", Value::Object(address)) if !address.contains_key("@type") => {
                        if let Some(address) = format_address(child) {
                            contacts.addresses.push(Address {
                                value: address,
                                source: page_url.to_string(),
                            });
                        }
                    }
                    (_, Value::Object(_)) | (_, Value::Array(_)) => {
                        collect_json_ld(child, page_url, contacts)
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

fn format_address(value: &Value) -> Option<String> {
    let parts: Vec<String> = ADDRESS_FIELDS
        .iter()
        .filter_map(|field| match value.get(field)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(o) => o.get("name").and_then(Value::as_str).map(|s| s.trim().to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect();

    (!parts.is_empty()).then(|| parts.join(", "))
}

fn same_as_links(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().flat_map(same_as_links).collect(),
        Value::Object(map) => {
            let mut links: Vec<String> = match map.get("sameAs") {
                Some(Value::String(s)) => vec![s.clone()],
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|s| s.to_string())
                    .collect(),
                _ => vec![],
            };
            links.extend(
                map.iter()
                    .filter(|(k, _)| k.as_str() != "sameAs")
                    .flat_map(|(_, v)| same_as_links(v)),
            );
            links
        }
        _ => vec![],
    }
}
