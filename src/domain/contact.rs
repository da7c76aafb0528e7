use std::collections::BTreeMap;

use itertools::Itertools;
use serde::Serialize;

const MAX_EMAILS: usize = 8;
const MAX_PHONES: usize = 5;
const MAX_ADDRESSES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Address {
    pub value: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Contacts {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub addresses: Vec<Address>,
}

impl Contacts {
    pub fn merge(&mut self, other: Contacts) {
        self.emails.extend(other.emails);
        self.phones.extend(other.phones);
        self.addresses.extend(other.addresses);
    }

    /// Deduplicates case-insensitively, keeps discovery order, caps each list.
    pub fn finalize(self) -> Contacts {
        Contacts {
            emails: self
                .emails
                .into_iter()
                .map(|e| e.to_lowercase())
                .unique()
                .take(MAX_EMAILS)
                .collect(),
            phones: self.phones.into_iter().unique().take(MAX_PHONES).collect(),
            addresses: self
                .addresses
                .into_iter()
                .unique_by(|a| a.value.to_lowercase())
                .take(MAX_ADDRESSES)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Facebook,
    Instagram,
    Linkedin,
    Twitter,
    Youtube,
}

impl SocialPlatform {
    pub fn label(&self) -> &'static str {
        match self {
            SocialPlatform::Facebook => "Facebook",
            SocialPlatform::Instagram => "Instagram",
            SocialPlatform::Linkedin => "LinkedIn",
            SocialPlatform::Twitter => "X/Twitter",
            SocialPlatform::Youtube => "YouTube",
        }
    }

    pub fn from_host(host: &str) -> Option<SocialPlatform> {
        let host = host.to_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        let host = host.strip_prefix("m.").unwrap_or(host);
        match host {
            "facebook.com" | "fb.com" => Some(SocialPlatform::Facebook),
            "instagram.com" => Some(SocialPlatform::Instagram),
            "linkedin.com" => Some(SocialPlatform::Linkedin),
            "x.com" | "twitter.com" => Some(SocialPlatform::Twitter),
            "youtube.com" => Some(SocialPlatform::Youtube),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Socials {
    pub links: BTreeMap<SocialPlatform, String>,
}

impl Socials {
    /// First link seen per platform wins.
    pub fn merge(&mut self, other: Socials) {
        for (platform, url) in other.links {
            self.links.entry(platform).or_insert(url);
        }
    }

    pub fn get(&self, platform: SocialPlatform) -> Option<&str> {
        self.links.get(&platform).map(|s| s.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub date: Option<String>,
    pub source: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_deduplicates_and_caps() {
        let contacts = Contacts {
            emails: vec![
                "Press@Acme.com".to_string(),
                "press@acme.com".to_string(),
                "info@acme.com".to_string(),
            ],
            phones: vec!["+15550100".to_string(), "+15550100".to_string()],
            addresses: (0..5)
                .map(|i| Address {
                    value: format!("{} Main St, Springfield", i),
                    source: "https://acme.com/contact".to_string(),
                })
                .collect(),
        };

        let contacts = contacts.finalize();

        assert_eq!(contacts.emails, vec!["press@acme.com", "info@acme.com"]);
        assert_eq!(contacts.phones.len(), 1);
        assert_eq!(contacts.addresses.len(), MAX_ADDRESSES);
    }

    #[test]
    fn platform_from_host() {
        assert_eq!(
            SocialPlatform::from_host("www.linkedin.com"),
            Some(SocialPlatform::Linkedin)
        );
        assert_eq!(
            SocialPlatform::from_host("m.facebook.com"),
            Some(SocialPlatform::Facebook)
        );
        assert_eq!(SocialPlatform::from_host("x.com"), Some(SocialPlatform::Twitter));
        assert_eq!(SocialPlatform::from_host("example.com"), None);
    }

    #[test]
    fn socials_merge_keeps_first_link() {
        let mut socials = Socials::default();
        socials.links.insert(
            SocialPlatform::Twitter,
            "https://x.com/acme".to_string(),
        );

        let mut other = Socials::default();
        other.links.insert(
            SocialPlatform::Twitter,
            "https://twitter.com/acme_old".to_string(),
        );
        other.links.insert(
            SocialPlatform::Youtube,
            "https://youtube.com/@acme".to_string(),
        );
        socials.merge(other);

        assert_eq!(socials.get(SocialPlatform::Twitter), Some("https://x.com/acme"));
        assert_eq!(
            socials.get(SocialPlatform::Youtube),
            Some("https://youtube.com/@acme")
        );
    }
}
