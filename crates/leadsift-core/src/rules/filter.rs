use crate::domain::ParsedAddress;
use serde::{Deserialize, Serialize};

pub const AUTOMATED_SENDER_PATTERNS: &[&str] = &[
    "noreply",
    "no-reply",
    "donotreply",
    "do-not-reply",
    "notification",
    "mailer-daemon",
    "postmaster",
    "support",
    "newsletter",
    "unsubscribe",
    "marketing",
    "promo",
    "info@",
    "admin@",
    "contact@",
    "hello@",
];

pub const MARKETING_SUBJECT_KEYWORDS: &[&str] = &[
    "newsletter",
    "unsubscribe",
    "promotional",
    "sale",
    "discount",
    "offer",
];

pub const VENDOR_DOMAINS: &[&str] = &[
    "stripe.com",
    "gusto.com",
    "quickbooks",
    "mercury.com",
    "calendly.com",
    "zoom.us",
    "google.com",
    "apple.com",
    "microsoft.com",
    "adobe.com",
    "typeform.com",
    "mailchimp.com",
    "constant-contact.com",
    "sendgrid.com",
    "postmarkapp.com",
    "hubspot.com",
    "salesforce.com",
    "slack.com",
    "notion.so",
    "atlassian.com",
    "github.com",
    "linkedin.com",
    "facebook.com",
    "twitter.com",
];

pub const PERSONAL_DOMAINS: &[&str] = &[
    "gmail.com",
    "googlemail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "live.com",
    "msn.com",
    "aol.com",
    "icloud.com",
    "me.com",
    "protonmail.com",
];

pub const INSTITUTIONAL_INDICATORS: &[&str] = &[
    ".org",
    ".edu",
    ".gov",
    "school",
    "university",
    "college",
    "foundation",
    "association",
    "society",
    "institute",
    "council",
    "chamber",
    "alliance",
    "nonprofit",
    "charity",
];

pub const BUSINESS_SUBJECT_KEYWORDS: &[&str] = &[
    "proposal",
    "quote",
    "pricing",
    "project",
    "contract",
    "agreement",
    "consultation",
    "meeting",
    "call",
    "business",
    "services",
    "partnership",
    "collaboration",
    "opportunity",
    "discussion",
    "presentation",
    "deck",
    "strategy",
    "brand",
    "campaign",
    "creative",
    "design",
];

/// Which header fields of a message contribute contact observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AddressScope {
    /// From, To and Cc of every message.
    #[default]
    AllParticipants,
    /// From of received messages, To and Cc of sent ones.
    Counterparty,
    /// From of received messages only.
    SendersOnly,
}

impl AddressScope {
    pub const fn as_str(self) -> &'static str {
        match self {
            AddressScope::AllParticipants => "all-participants",
            AddressScope::Counterparty => "counterparty",
            AddressScope::SendersOnly => "senders-only",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPolicy {
    pub owner_addresses: Vec<String>,
    pub owner_domains: Vec<String>,
    pub reject_owner_domains: bool,
    pub automated_patterns: Vec<String>,
    pub marketing_subject_keywords: Vec<String>,
    pub excluded_domains: Vec<String>,
    pub personal_domains: Vec<String>,
    pub reject_personal_domains: bool,
    pub institutional_indicators: Vec<String>,
    pub reject_institutional: bool,
    pub business_subject_keywords: Vec<String>,
    pub require_business_signal: bool,
    pub scope: AddressScope,
}

impl FilterPolicy {
    /// Baseline filter: drops automated senders, marketing mail and vendors.
    pub fn business_email() -> Self {
        Self {
            owner_addresses: Vec::new(),
            owner_domains: Vec::new(),
            reject_owner_domains: false,
            automated_patterns: owned(AUTOMATED_SENDER_PATTERNS),
            marketing_subject_keywords: owned(MARKETING_SUBJECT_KEYWORDS),
            excluded_domains: owned(VENDOR_DOMAINS),
            personal_domains: owned(PERSONAL_DOMAINS),
            reject_personal_domains: false,
            institutional_indicators: owned(INSTITUTIONAL_INDICATORS),
            reject_institutional: false,
            business_subject_keywords: owned(BUSINESS_SUBJECT_KEYWORDS),
            require_business_signal: false,
            scope: AddressScope::AllParticipants,
        }
    }

    /// Stricter filter for prospect and client lists: colleagues, personal
    /// webmail and institutional domains are also dropped.
    pub fn prospect_client_strict() -> Self {
        Self {
            reject_owner_domains: true,
            reject_personal_domains: true,
            reject_institutional: true,
            require_business_signal: true,
            scope: AddressScope::Counterparty,
            ..Self::business_email()
        }
    }

    pub fn is_owner(&self, address: &ParsedAddress) -> bool {
        self.owner_addresses.iter().any(|owner| *owner == address.email)
            || self
                .owner_domains
                .iter()
                .any(|domain| domain_matches(&address.domain, domain))
    }

    pub fn is_personal_domain(&self, domain: &str) -> bool {
        self.personal_domains
            .iter()
            .any(|entry| domain_matches(domain, entry))
    }

    pub fn is_business_contact(&self, email: &str, subject: &str) -> bool {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return false;
        }
        if self.owner_addresses.iter().any(|owner| *owner == email) {
            return false;
        }
        let domain = email.split_once('@').map(|(_, domain)| domain).unwrap_or("");

        if self.reject_owner_domains
            && self
                .owner_domains
                .iter()
                .any(|owner| domain_matches(domain, owner))
        {
            return false;
        }

        if contains_any(&email, &self.automated_patterns) {
            return false;
        }

        let subject = subject.to_lowercase();
        if contains_any(&subject, &self.marketing_subject_keywords) {
            return false;
        }

        if self
            .excluded_domains
            .iter()
            .any(|entry| domain_matches(domain, entry))
        {
            return false;
        }

        if self.reject_institutional && contains_any(domain, &self.institutional_indicators) {
            return false;
        }

        let personal = self.is_personal_domain(domain);
        if self.reject_personal_domains && personal {
            return false;
        }

        if self.require_business_signal {
            return !personal || contains_any(&subject, &self.business_subject_keywords);
        }

        true
    }
}

/// Entries with a dot match the domain or any subdomain of it; bare entries
/// such as `quickbooks` match anywhere in the domain.
pub fn domain_matches(domain: &str, entry: &str) -> bool {
    let entry = entry.trim().trim_start_matches('@').to_lowercase();
    if entry.is_empty() {
        return false;
    }
    let domain = domain.to_lowercase();
    if entry.contains('.') {
        domain == entry || domain.ends_with(&format!(".{entry}"))
    } else {
        domain.contains(&entry)
    }
}

pub(crate) fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .any(|needle| !needle.is_empty() && haystack.contains(needle.as_str()))
}

pub(crate) fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
