use crate::domain::address::title_case;
use crate::domain::Category;
use serde::{Deserialize, Serialize};

pub const MAX_SUBJECT_CHARS: usize = 100;

/// Which way a message travelled relative to the mailbox owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The contact wrote to the owner.
    Inbound,
    /// The owner wrote to the contact.
    Outreach,
    /// The contact was a co-recipient of a message the owner received.
    Copied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedContact {
    pub email: String,
    pub name: String,
    pub company: String,
    pub domain: String,
    pub first_seen: String,
    pub last_seen: String,
    pub first_seen_at: Option<i64>,
    pub last_seen_at: Option<i64>,
    pub email_count: u32,
    pub inbound_count: u32,
    pub outreach_count: u32,
    pub subjects: Vec<String>,
    pub category: Category,
    pub personal_domain: bool,
}

impl AggregatedContact {
    /// Adds a subject unless the same text (after capping) is already present.
    pub fn record_subject(&mut self, subject: &str) -> bool {
        let capped = cap_subject(subject);
        if capped.is_empty() || self.subjects.iter().any(|existing| *existing == capped) {
            return false;
        }
        self.subjects.push(capped);
        true
    }

    /// Longest display name wins.
    pub fn offer_name(&mut self, candidate: Option<&str>) {
        let Some(candidate) = candidate.map(str::trim).filter(|name| !name.is_empty()) else {
            return;
        };
        if candidate.chars().count() > self.name.chars().count() {
            self.name = candidate.to_string();
        }
    }

    pub fn record_direction(&mut self, direction: Direction) {
        match direction {
            Direction::Inbound => self.inbound_count += 1,
            Direction::Outreach => self.outreach_count += 1,
            Direction::Copied => {}
        }
    }

    /// Lower-cased subjects joined by spaces, the text keyword rules run over.
    pub fn subject_text(&self) -> String {
        self.subjects.join(" ").to_lowercase()
    }

    /// The stored name, or the title-cased local part when no display name was seen.
    pub fn label(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        let local = self.email.split('@').next().unwrap_or_default();
        local
            .split(['.', '_', '-'])
            .filter(|part| !part.is_empty())
            .map(title_case)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub(crate) fn cap_subject(subject: &str) -> String {
    subject.trim().chars().take(MAX_SUBJECT_CHARS).collect()
}
