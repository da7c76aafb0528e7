use serde::Serialize;
use url::Url;

/// The root input of a lookup. `domain` is the verified domain every
/// executive and contact must come from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Organization {
    pub name: String,
    pub domain: Option<String>,
    pub website: Option<String>,
}

impl Organization {
    pub fn new(name: &str, domain: &str) -> Self {
        let domain = normalize_domain(domain);
        let domain = (!domain.is_empty()).then_some(domain);
        let name = name.split_whitespace().collect::<Vec<&str>>().join(" ");
        let name = match (name.is_empty(), &domain) {
            (true, Some(domain)) => company_name_from_domain(domain),
            _ => name,
        };

        Organization {
            name,
            domain,
            website: None,
        }
    }

    /// Overrides the `https://{domain}` default base URL.
    pub fn with_website(mut self, website: &str) -> Self {
        let website = website.trim().trim_end_matches('/');
        if !website.is_empty() {
            self.website = Some(website.to_string());
        }
        self
    }

    pub fn with_domain(mut self, domain: &str) -> Self {
        let domain = normalize_domain(domain);
        if !domain.is_empty() {
            if self.name.is_empty() {
                self.name = company_name_from_domain(&domain);
            }
            self.domain = Some(domain);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.domain.is_none()
    }

    pub fn website(&self) -> Option<String> {
        match (&self.website, &self.domain) {
            (Some(website), _) => Some(website.clone()),
            (None, Some(domain)) => Some(format!("https://{}", domain)),
            (None, None) => None,
        }
    }

    /// Host used in `site:` queries.
    pub fn site_host(&self) -> Option<String> {
        self.website()
            .and_then(|w| domain_of(&w))
            .or_else(|| self.domain.clone())
    }

    pub fn search_query(&self) -> String {
        match (&self.name, &self.domain) {
            (name, _) if !name.is_empty() => name.clone(),
            (_, Some(domain)) => domain.clone(),
            _ => String::new(),
        }
    }

    pub fn is_official_url(&self, url: &str) -> bool {
        match (&self.domain, domain_of(url)) {
            (Some(org_domain), Some(page_domain)) => is_official_page(&page_domain, org_domain),
            _ => false,
        }
    }
}

/// Pure predicate deciding whether a page domain belongs to the
/// organization's verified domain. Subdomains (`investors.acme.com`) count,
/// look-alikes (`acme-fan-blog.com`, `notacme.com`) do not.
pub fn is_official_page(page_domain: &str, org_domain: &str) -> bool {
    let page = normalize_domain(page_domain);
    let org = normalize_domain(org_domain);

    if page.is_empty() || org.is_empty() {
        return false;
    }

    page == org || page.ends_with(&format!(".{}", org))
}

/// Lowercased host without scheme, port, path, or a leading `www.`.
pub fn normalize_domain(raw: &str) -> String {
    let raw = raw.trim().to_lowercase();
    if raw.is_empty() {
        return raw;
    }

    let with_scheme = match raw.contains("://") {
        true => raw.clone(),
        false => format!("http://{}", raw),
    };

    let host = match Url::parse(&with_scheme) {
        Ok(parsed) => parsed.host_str().map(|h| h.to_string()),
        Err(_) => None,
    }
    .unwrap_or_else(|| raw.trim_matches('/').to_string());

    let host = host.trim_end_matches('.');
    match host.strip_prefix("www.") {
        Some(h) => h.to_string(),
        None => host.to_string(),
    }
}

pub fn domain_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    if host.is_empty() {
        return None;
    }
    Some(normalize_domain(host))
}

/// `acme.com` -> `Acme`
pub fn company_name_from_domain(domain: &str) -> String {
    let label = domain.split('.').next().unwrap_or_default();
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
