use std::collections::HashSet;

use serde::Serialize;

/// Curated set of recognized C-suite roles, most senior first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExecutiveTitle {
    #[serde(rename = "CEO")]
    Ceo,
    #[serde(rename = "President")]
    President,
    #[serde(rename = "COO")]
    Coo,
    #[serde(rename = "CFO")]
    Cfo,
    #[serde(rename = "CTO")]
    Cto,
    #[serde(rename = "CMO")]
    Cmo,
    #[serde(rename = "CIO")]
    Cio,
    #[serde(rename = "CISO")]
    Ciso,
    #[serde(rename = "CPO")]
    Cpo,
    #[serde(rename = "CHRO")]
    Chro,
    #[serde(rename = "CRO")]
    Cro,
    #[serde(rename = "CDO")]
    Cdo,
    #[serde(rename = "CLO")]
    Clo,
    #[serde(rename = "Chair")]
    Chair,
    #[serde(rename = "Founder")]
    Founder,
}

const ALL_TITLES: [ExecutiveTitle; 15] = [
    ExecutiveTitle::Ceo,
    ExecutiveTitle::President,
    ExecutiveTitle::Coo,
    ExecutiveTitle::Cfo,
    ExecutiveTitle::Cto,
    ExecutiveTitle::Cmo,
    ExecutiveTitle::Cio,
    ExecutiveTitle::Ciso,
    ExecutiveTitle::Cpo,
    ExecutiveTitle::Chro,
    ExecutiveTitle::Cro,
    ExecutiveTitle::Cdo,
    ExecutiveTitle::Clo,
    ExecutiveTitle::Chair,
    ExecutiveTitle::Founder,
];

/// Words that mark a line as a role rather than a person's name.
pub const TITLE_KEYWORDS: [&str; 14] = [
    "chief", "officer", "ceo", "cfo", "cto", "coo", "president", "founder", "chair", "chairman",
    "director", "head", "vp", "board",
];

impl ExecutiveTitle {
    pub fn label(&self) -> &'static str {
        match self {
            ExecutiveTitle::Ceo => "CEO",
            ExecutiveTitle::President => "President",
            ExecutiveTitle::Coo => "COO",
            ExecutiveTitle::Cfo => "CFO",
            ExecutiveTitle::Cto => "CTO",
            ExecutiveTitle::Cmo => "CMO",
            ExecutiveTitle::Cio => "CIO",
            ExecutiveTitle::Ciso => "CISO",
            ExecutiveTitle::Cpo => "CPO",
            ExecutiveTitle::Chro => "CHRO",
            ExecutiveTitle::Cro => "CRO",
            ExecutiveTitle::Cdo => "CDO",
            ExecutiveTitle::Clo => "CLO",
            ExecutiveTitle::Chair => "Chair",
            ExecutiveTitle::Founder => "Founder",
        }
    }

    /// Lower is more senior.
    pub fn rank(&self) -> u8 {
        match self {
            ExecutiveTitle::Ceo => 0,
            ExecutiveTitle::President => 1,
            ExecutiveTitle::Coo | ExecutiveTitle::Cfo | ExecutiveTitle::Cto => 2,
            ExecutiveTitle::Cmo
            | ExecutiveTitle::Cio
            | ExecutiveTitle::Ciso
            | ExecutiveTitle::Cpo
            | ExecutiveTitle::Chro
            | ExecutiveTitle::Cro
            | ExecutiveTitle::Cdo
            | ExecutiveTitle::Clo => 3,
            ExecutiveTitle::Chair => 4,
            ExecutiveTitle::Founder => 5,
        }
    }

    fn phrases(&self) -> &'static [&'static str] {
        match self {
            ExecutiveTitle::Ceo => &["chief executive officer", "chief executive"],
            ExecutiveTitle::President => &["president"],
            ExecutiveTitle::Coo => &["chief operating officer", "chief operations officer"],
            ExecutiveTitle::Cfo => &["chief financial officer", "chief finance officer"],
            ExecutiveTitle::Cto => &["chief technology officer", "chief technical officer"],
            ExecutiveTitle::Cmo => &["chief marketing officer"],
            ExecutiveTitle::Cio => &["chief information officer"],
            ExecutiveTitle::Ciso => &[
                "chief information security officer",
                "chief security officer",
            ],
            ExecutiveTitle::Cpo => &["chief product officer"],
            ExecutiveTitle::Chro => &[
                "chief human resources officer",
                "chief people officer",
            ],
            ExecutiveTitle::Cro => &["chief revenue officer"],
            ExecutiveTitle::Cdo => &["chief data officer", "chief digital officer"],
            ExecutiveTitle::Clo => &["chief legal officer", "general counsel"],
            ExecutiveTitle::Chair => &["chairman", "chairwoman", "chairperson", "chair"],
            ExecutiveTitle::Founder => &["founder", "cofounder"],
        }
    }

    fn abbreviation(&self) -> Option<&'static str> {
        match self {
            ExecutiveTitle::Ceo => Some("ceo"),
            ExecutiveTitle::Coo => Some("coo"),
            ExecutiveTitle::Cfo => Some("cfo"),
            ExecutiveTitle::Cto => Some("cto"),
            ExecutiveTitle::Cmo => Some("cmo"),
            ExecutiveTitle::Cio => Some("cio"),
            ExecutiveTitle::Ciso => Some("ciso"),
            ExecutiveTitle::Cpo => Some("cpo"),
            ExecutiveTitle::Chro => Some("chro"),
            ExecutiveTitle::Cro => Some("cro"),
            ExecutiveTitle::Cdo => Some("cdo"),
            ExecutiveTitle::Clo => Some("clo"),
            ExecutiveTitle::President | ExecutiveTitle::Chair | ExecutiveTitle::Founder => None,
        }
    }

    /// Maps free text such as "Co-Founder & Chief Executive Officer" to the
    /// most senior recognized title it mentions.
    pub fn parse(text: &str) -> Option<ExecutiveTitle> {
        let words: Vec<String> = text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_string())
            .collect();
        if words.is_empty() {
            return None;
        }

        // Padded so phrase matching stays on word boundaries.
        let joined = format!(" {} ", words.join(" "));
        let joined = joined
            .replace(" vice president ", " ")
            .replace(" vice chair ", " ")
            .replace(" vice chairman ", " ")
            .replace(" co founder ", " cofounder ");

        ALL_TITLES.into_iter().find(|title| {
            title
                .phrases()
                .iter()
                .any(|phrase| joined.contains(&format!(" {} ", phrase)))
                || title
                    .abbreviation()
                    .map(|abbr| joined.contains(&format!(" {} ", abbr)))
                    .unwrap_or(false)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Executive {
    pub name: String,
    pub title: ExecutiveTitle,
    /// Role text as printed on the page.
    pub title_text: String,
    pub source_page: String,
    /// Set only by the extractor after the official-domain check passed.
    pub official: bool,
    pub linkedin: Option<String>,
}

impl Executive {
    pub fn rank(&self) -> u8 {
        self.title.rank()
    }

    pub fn dedup_key(&self) -> (String, ExecutiveTitle) {
        (normalize_name(&self.name), self.title)
    }
}

const HONORIFICS: [&str; 6] = ["dr.", "dr", "mr.", "mrs.", "ms.", "prof."];

/// Strips honorifics and trailing credentials: "Dr. Jane Doe, PhD" -> "Jane Doe".
pub fn clean_person_name(raw: &str) -> String {
    let name = match raw.split_once(',') {
        Some((left, _)) => left,
        None => raw,
    };

    let mut tokens: Vec<&str> = name.split_whitespace().collect();
    while let Some(first) = tokens.first() {
        match HONORIFICS.contains(&first.to_lowercase().as_str()) {
            true => {
                tokens.remove(0);
            }
            false => break,
        }
    }

    tokens.join(" ")
}

pub fn normalize_name(name: &str) -> String {
    clean_person_name(name)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Append-only accumulator enforcing the official-page invariant and
/// (normalized name, title) uniqueness.
#[derive(Debug, Default)]
pub struct ExecutiveSet {
    seen: HashSet<(String, ExecutiveTitle)>,
    executives: Vec<Executive>,
}

impl ExecutiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the record was rejected or already present.
    pub fn insert(&mut self, executive: Executive) -> bool {
        if !executive.official {
            return false;
        }

        let key = executive.dedup_key();
        if self.seen.contains(&key) {
            if let Some(existing) = self
                .executives
                .iter_mut()
                .find(|e| e.dedup_key() == key && e.linkedin.is_none())
            {
                existing.linkedin = executive.linkedin;
            }
            return false;
        }

        self.seen.insert(key);
        self.executives.push(executive);
        true
    }

    pub fn extend(&mut self, executives: impl IntoIterator<Item = Executive>) {
        for executive in executives {
            self.insert(executive);
        }
    }

    pub fn len(&self) -> usize {
        self.executives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executives.is_empty()
    }

    /// Most senior first, discovery order within a rank.
    pub fn into_ranked(self, limit: usize) -> Vec<Executive> {
        let mut executives = self.executives;
        executives.sort_by_key(|e| e.rank());
        executives.truncate(limit);
        executives
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executive(name: &str, title: ExecutiveTitle) -> Executive {
        Executive {
            name: name.to_string(),
            title,
            title_text: title.label().to_string(),
            source_page: "https://acme.com/leadership".to_string(),
            official: true,
            linkedin: None,
        }
    }

    #[test]
    fn parse_long_form_titles() {
        let cases = [
            ("Chief Executive Officer", ExecutiveTitle::Ceo),
            ("Chief Financial Officer", ExecutiveTitle::Cfo),
            ("EVP & Chief Technology Officer", ExecutiveTitle::Cto),
            ("Chief People Officer", ExecutiveTitle::Chro),
            ("General Counsel and Secretary", ExecutiveTitle::Clo),
            ("Chairman of the Board", ExecutiveTitle::Chair),
            ("Co-Founder", ExecutiveTitle::Founder),
        ];

        for (text, expected) in cases {
            assert_eq!(ExecutiveTitle::parse(text), Some(expected), "text: {}", text);
        }
    }

    #[test]
    fn parse_picks_most_senior_title() {
        assert_eq!(
            ExecutiveTitle::parse("Co-Founder & CEO"),
            Some(ExecutiveTitle::Ceo)
        );
        assert_eq!(
            ExecutiveTitle::parse("President and Chief Operating Officer"),
            Some(ExecutiveTitle::President)
        );
    }

    #[test]
    fn parse_ignores_vice_roles_and_unknown_titles() {
        assert_eq!(ExecutiveTitle::parse("Vice President, Sales"), None);
        assert_eq!(ExecutiveTitle::parse("Head of Design"), None);
        assert_eq!(ExecutiveTitle::parse("Director of Marketing"), None);
        assert_eq!(ExecutiveTitle::parse("Executive chef"), None);
        assert_eq!(ExecutiveTitle::parse(""), None);
    }

    #[test]
    fn parse_abbreviations_on_word_boundaries() {
        assert_eq!(ExecutiveTitle::parse("CFO"), Some(ExecutiveTitle::Cfo));
        assert_eq!(ExecutiveTitle::parse("cto."), Some(ExecutiveTitle::Cto));
        assert_eq!(ExecutiveTitle::parse("Costco"), None);
    }

    #[test]
    fn clean_person_name_strips_honorifics_and_credentials() {
        assert_eq!(clean_person_name("Dr. Jane Doe, PhD"), "Jane Doe");
        assert_eq!(clean_person_name("Mr.  John   Smith"), "John Smith");
        assert_eq!(clean_person_name("Jane Doe"), "Jane Doe");
    }

    #[test]
    fn set_deduplicates_on_normalized_name_and_title() {
        let mut set = ExecutiveSet::new();

        assert!(set.insert(executive("Jane Doe", ExecutiveTitle::Ceo)));
        assert!(!set.insert(executive("  jane   DOE ", ExecutiveTitle::Ceo)));
        assert!(!set.insert(executive("Dr. Jane Doe", ExecutiveTitle::Ceo)));
        assert!(set.insert(executive("Jane Doe", ExecutiveTitle::Founder)));

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn set_rejects_unofficial_records() {
        let mut set = ExecutiveSet::new();
        let mut record = executive("Jane Doe", ExecutiveTitle::Ceo);
        record.official = false;

        assert!(!set.insert(record));
        assert!(set.is_empty());
    }

    #[test]
    fn duplicate_fills_missing_linkedin() {
        let mut set = ExecutiveSet::new();
        set.insert(executive("Jane Doe", ExecutiveTitle::Ceo));

        let mut duplicate = executive("Jane Doe", ExecutiveTitle::Ceo);
        duplicate.linkedin = Some("https://www.linkedin.com/in/janedoe".to_string());
        set.insert(duplicate);

        let ranked = set.into_ranked(10);
        assert_eq!(
            ranked[0].linkedin.as_deref(),
            Some("https://www.linkedin.com/in/janedoe")
        );
    }

    #[test]
    fn into_ranked_sorts_by_seniority_and_caps() {
        let mut set = ExecutiveSet::new();
        set.insert(executive("Ann Founder", ExecutiveTitle::Founder));
        set.insert(executive("Bob Money", ExecutiveTitle::Cfo));
        set.insert(executive("Cat Boss", ExecutiveTitle::Ceo));

        let ranked = set.into_ranked(2);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name, "Cat Boss");
        assert_eq!(ranked[1].name, "Bob Money");
    }
}
