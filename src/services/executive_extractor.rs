use scraper::Html;

use crate::{
    configuration::ExtractorSettings,
    domain::{
        candidate_page::CandidatePage,
        executive::{clean_person_name, Executive, ExecutiveSet, ExecutiveTitle, TITLE_KEYWORDS},
        organization::{is_official_page, Organization},
    },
};

use super::page_text::{normalise_whitespace, text_lines, TextLine};

const MAX_LINE_CHARS: usize = 160;
const MAX_TITLE_LINE_CHARS: usize = 100;
const CARD_LOOKAHEAD: usize = 2;

const SEPARATORS: [&str; 7] = [",", " - ", " – ", " — ", "|", ":", " at "];

/// Words that open a role when a line has no separator,
/// as in "Jane Doe Chief Executive Officer".
const TITLE_START_WORDS: [&str; 20] = [
    "chief", "president", "founder", "co-founder", "cofounder", "chair", "chairman",
    "chairwoman", "chairperson", "ceo", "cfo", "coo", "cto", "cmo", "cio", "ciso", "cpo", "chro",
    "cro", "general",
];

const NAME_PARTICLES: [&str; 12] = [
    "de", "da", "di", "del", "der", "van", "von", "la", "le", "bin", "al", "dos",
];

const STOP_WORDS: [&str; 48] = [
    "about", "contact", "home", "our", "team", "leadership", "meet", "read", "more", "view",
    "learn", "news", "careers", "privacy", "policy", "terms", "cookie", "cookies", "menu",
    "search", "login", "sign", "directors", "management", "company", "inc", "llc", "ltd", "corp",
    "the", "and", "for", "with", "services", "products", "investors", "executive", "senior",
    "vice", "global", "group", "profile", "bio", "linkedin", "email", "follow", "us", "officers",
];

#[derive(Debug, Clone, PartialEq)]
struct Pairing {
    name: String,
    title: ExecutiveTitle,
    title_text: String,
    /// Index of the last line the pairing used.
    end: usize,
}

pub struct ExecutiveExtractor {
    max_executives: usize,
}

impl ExecutiveExtractor {
    pub fn new(settings: &ExtractorSettings) -> Self {
        ExecutiveExtractor {
            max_executives: settings.max_executives,
        }
    }

    /// Deduplicated executives from every official page, most senior first.
    pub fn extract_all(
        &self,
        pages: &[CandidatePage],
        organization: &Organization,
    ) -> Vec<Executive> {
        let mut set = ExecutiveSet::new();
        for page in pages {
            set.extend(self.extract(page, organization));
        }

        log::info!(
            "Extracted {} executives for {} from {} pages",
            set.len(),
            organization.name,
            pages.len()
        );
        set.into_ranked(self.max_executives)
    }

    /// Name/title pairs from a single page. Empty unless the page sits on
    /// the organization's verified domain.
    pub fn extract(&self, page: &CandidatePage, organization: &Organization) -> Vec<Executive> {
        let Some(html) = page.html() else {
            return vec![];
        };

        if !is_official(page, organization) {
            log::warn!(
                "Skipping non-official page {} for {}",
                page.effective_url(),
                organization.name
            );
            return vec![];
        }

        let lines = text_lines(&Html::parse_document(html));
        let source_page = page.effective_url().to_string();

        find_pairings(&lines)
            .into_iter()
            .map(|(start, pairing)| Executive {
                linkedin: linkedin_between(&lines, start, pairing.end),
                name: pairing.name,
                title: pairing.title,
                title_text: pairing.title_text,
                source_page: source_page.clone(),
                official: true,
            })
            .collect()
    }
}

pub fn is_official(page: &CandidatePage, organization: &Organization) -> bool {
    match (page.domain(), &organization.domain) {
        (Some(page_domain), Some(org_domain)) => is_official_page(&page_domain, org_domain),
        _ => false,
    }
}

fn find_pairings(lines: &[TextLine]) -> Vec<(usize, Pairing)> {
    let mut pairings = vec![];
    let mut i = 0;

    while i < lines.len() {
        let text = lines[i].text.as_str();
        if text.chars().count() > MAX_LINE_CHARS {
            i += 1;
            continue;
        }

        let pairing = pair_with_separator(text, i)
            .or_else(|| pair_without_separator(text, i))
            .or_else(|| pair_card(lines, i));

        match pairing {
            Some(pairing) => {
                let next = pairing.end + 1;
                pairings.push((i, pairing));
                i = next;
            }
            None => i += 1,
        }
    }

    pairings
}

/// "Jane Doe, Chief Executive Officer" or "CEO: Jane Doe".
fn pair_with_separator(line: &str, index: usize) -> Option<Pairing> {
    SEPARATORS.iter().find_map(|sep| {
        let (left, right) = line.split_once(sep)?;
        let (left, right) = (left.trim(), right.trim());

        name_title(left, right, index).or_else(|| name_title(right, left, index))
    })
}

/// "Jane Doe Chief Executive Officer"
fn pair_without_separator(line: &str, index: usize) -> Option<Pairing> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let split_at = tokens
        .iter()
        .enumerate()
        .skip(2)
        .find(|(_, t)| TITLE_START_WORDS.contains(&t.to_lowercase().trim_matches(',')))
        .map(|(idx, _)| idx)?;

    let name = tokens[..split_at].join(" ");
    let title = tokens[split_at..].join(" ");
    name_title(&name, &title, index)
}

/// A name line followed within a couple of lines by a short title line.
fn pair_card(lines: &[TextLine], index: usize) -> Option<Pairing> {
    let name = clean_person_name(&lines[index].text);
    if !looks_like_name(&name) {
        return None;
    }

    lines
        .iter()
        .enumerate()
        .skip(index + 1)
        .take(CARD_LOOKAHEAD)
        .take_while(|(_, line)| !looks_like_name(&clean_person_name(&line.text)))
        .find_map(|(idx, line)| {
            if line.text.chars().count() > MAX_TITLE_LINE_CHARS {
                return None;
            }
            let title = ExecutiveTitle::parse(&line.text)?;
            Some(Pairing {
                name: name.clone(),
                title,
                title_text: normalise_whitespace(&line.text),
                end: idx,
            })
        })
}

fn name_title(raw_name: &str, raw_title: &str, index: usize) -> Option<Pairing> {
    let name = clean_person_name(raw_name);
    if !looks_like_name(&name) || raw_title.chars().count() > MAX_TITLE_LINE_CHARS {
        return None;
    }

    let title = ExecutiveTitle::parse(raw_title)?;
    Some(Pairing {
        name,
        title,
        title_text: normalise_whitespace(raw_title),
        end: index,
    })
}

fn linkedin_between(lines: &[TextLine], start: usize, end: usize) -> Option<String> {
    lines
        .get(start..=end)?
        .iter()
        .flat_map(|l| l.links.iter())
        .find(|href| href.to_lowercase().contains("linkedin.com/in/"))
        .map(|href| href.split(['?', '#']).next().unwrap_or(href).to_string())
}

/// 2 to 4 capitalised tokens with no UI words or role keywords.
pub fn looks_like_name(text: &str) -> bool {
    let text = text.trim();
    let len = text.chars().count();
    if !(3..=60).contains(&len) {
        return false;
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if !(2..=4).contains(&tokens.len()) {
        return false;
    }

    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 3 && letters.iter().all(|c| c.is_uppercase()) {
        return false;
    }

    tokens.iter().all(|token| {
        let lower = token.to_lowercase();
        let word = lower.trim_matches(|c: char| !c.is_alphabetic());

        let valid_chars = token
            .chars()
            .all(|c| c.is_alphabetic() || c == '-' || c == '\'' || c == '.' || c == '’');
        let capitalised = token.chars().next().map(|c| c.is_uppercase()).unwrap_or(false);

        valid_chars
            && (capitalised || NAME_PARTICLES.contains(&word))
            && !STOP_WORDS.contains(&word)
            && !TITLE_KEYWORDS.contains(&word)
    })
}
