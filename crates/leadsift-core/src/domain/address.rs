use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use regex::Regex;

/// An address pulled out of a raw header value such as `"Jane Doe" <jane@co.com>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAddress {
    pub email: String,
    pub display_name: Option<String>,
    pub domain: String,
}

fn address_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("address regex")
    })
}

pub fn normalize_email(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_lowercase())
}

/// Parses a single header address. Returns `None` when nothing address-shaped
/// is present; malformed input is never an error.
pub fn parse_address(raw: &str) -> Option<ParsedAddress> {
    let email = match bracketed(raw) {
        Some(inner) => normalize_email(inner)?,
        None => address_pattern().find(raw)?.as_str().to_lowercase(),
    };
    let domain = domain_of(&email)?.to_string();

    Some(ParsedAddress {
        display_name: display_name(raw),
        email,
        domain,
    })
}

/// Splits a `To:`/`Cc:` style value on commas that sit outside quotes and
/// angle brackets, so `"Doe, Jane" <jane@co.com>` stays in one piece.
pub fn split_address_list(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut start = 0;

    for (idx, ch) in raw.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => in_angle = true,
            '>' if !in_quotes => in_angle = false,
            ',' if !in_quotes && !in_angle => {
                parts.push(raw[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(raw[start..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}

/// Derives a company label from a domain: `www.` dropped, first label kept,
/// dashes and underscores turned into spaces, then title-cased.
pub fn company_from_domain(domain: &str) -> String {
    let domain = domain.trim().to_lowercase();
    let domain = domain.strip_prefix("www.").unwrap_or(&domain);
    let label = domain.split('.').next().unwrap_or_default();
    label
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn bracketed(raw: &str) -> Option<&str> {
    let open = raw.find('<')?;
    let close = raw[open + 1..].find('>')? + open + 1;
    Some(&raw[open + 1..close])
}

fn display_name(raw: &str) -> Option<String> {
    let open = raw.find('<')?;
    let name = raw[..open]
        .trim()
        .trim_matches(&['"', '\''][..])
        .trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Returns the domain when `email` has exactly one `@` and a dot after it.
fn domain_of(email: &str) -> Option<&str> {
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.contains('@') {
        return None;
    }
    let dot = domain.find('.')?;
    if dot == 0 || domain.ends_with('.') {
        return None;
    }
    Some(domain)
}
