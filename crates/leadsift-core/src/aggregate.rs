use std::collections::HashMap;

use crate::domain::{
    company_from_domain, parse_address, split_address_list, AggregatedContact, Direction,
    MessageObservation, ParsedAddress,
};
use crate::dto::ScoredContact;
use crate::rules::{AddressScope, ContactPolicy, RecencyMode};
use crate::time::parse_message_date;

/// One qualifying sighting of an address, ready to be folded.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    pub address: &'a ParsedAddress,
    pub subject: &'a str,
    pub date: &'a str,
    pub occurred_at: Option<i64>,
    pub direction: Direction,
}

/// Folds observations into one contact per lower-cased address.
///
/// Contacts keep the order in which their address was first seen.
#[derive(Debug, Clone)]
pub struct ContactAggregator {
    policy: ContactPolicy,
    contacts: Vec<AggregatedContact>,
    index: HashMap<String, usize>,
}

impl ContactAggregator {
    pub fn new(policy: ContactPolicy) -> Self {
        Self {
            policy,
            contacts: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn get(&self, email: &str) -> Option<&AggregatedContact> {
        let key = email.trim().to_lowercase();
        self.index.get(&key).map(|&idx| &self.contacts[idx])
    }

    pub fn contacts(&self) -> &[AggregatedContact] {
        &self.contacts
    }

    /// Parses, filters and folds every address field of one message that the
    /// policy's scope selects. Returns how many observations were folded.
    pub fn ingest(&mut self, message: &MessageObservation) -> usize {
        let sender = parse_address(&message.from_field);
        let sent = sender
            .as_ref()
            .is_some_and(|address| self.policy.filter.is_owner(address));
        let occurred_at = parse_message_date(&message.date);

        let mut fields: Vec<(&str, Direction)> = Vec::with_capacity(3);
        match (self.policy.filter.scope, sent) {
            // Colleagues on an owner domain still count as participants; the
            // owner's own address is dropped by the filter.
            (AddressScope::AllParticipants, true) => {
                fields.push((message.from_field.as_str(), Direction::Copied));
                fields.push((message.to_field.as_str(), Direction::Outreach));
                fields.push((message.cc_field.as_str(), Direction::Outreach));
            }
            (AddressScope::Counterparty, true) => {
                fields.push((message.to_field.as_str(), Direction::Outreach));
                fields.push((message.cc_field.as_str(), Direction::Outreach));
            }
            (AddressScope::AllParticipants, false) => {
                fields.push((message.from_field.as_str(), Direction::Inbound));
                fields.push((message.to_field.as_str(), Direction::Copied));
                fields.push((message.cc_field.as_str(), Direction::Copied));
            }
            (AddressScope::Counterparty, false) | (AddressScope::SendersOnly, false) => {
                fields.push((message.from_field.as_str(), Direction::Inbound));
            }
            (AddressScope::SendersOnly, true) => {}
        }

        let mut folded = 0;
        for (field, direction) in fields {
            for raw in split_address_list(field) {
                let Some(address) = parse_address(raw) else {
                    continue;
                };
                if !self
                    .policy
                    .filter
                    .is_business_contact(&address.email, &message.subject)
                {
                    continue;
                }
                self.fold(Observation {
                    address: &address,
                    subject: &message.subject,
                    date: &message.date,
                    occurred_at,
                    direction,
                });
                folded += 1;
            }
        }
        folded
    }

    /// Merges one observation. No filtering happens here.
    pub fn fold(&mut self, observation: Observation<'_>) {
        let Observation {
            address,
            subject,
            date,
            occurred_at,
            direction,
        } = observation;
        let date = date.trim();

        let idx = match self.index.get(&address.email) {
            Some(&idx) => {
                let recency = self.policy.recency;
                let contact = &mut self.contacts[idx];
                contact.email_count = contact.email_count.saturating_add(1);
                update_recency(contact, recency, date, occurred_at);
                contact.record_subject(subject);
                contact.offer_name(address.display_name.as_deref());
                idx
            }
            None => {
                let personal_domain = self.policy.filter.is_personal_domain(&address.domain);
                let mut contact = AggregatedContact {
                    email: address.email.clone(),
                    name: String::new(),
                    company: company_from_domain(&address.domain),
                    domain: address.domain.clone(),
                    first_seen: date.to_string(),
                    last_seen: date.to_string(),
                    first_seen_at: occurred_at,
                    last_seen_at: occurred_at,
                    email_count: 1,
                    inbound_count: 0,
                    outreach_count: 0,
                    subjects: Vec::new(),
                    category: self.policy.categories.fallback,
                    personal_domain,
                };
                contact.record_subject(subject);
                contact.offer_name(address.display_name.as_deref());
                self.contacts.push(contact);
                let idx = self.contacts.len() - 1;
                self.index.insert(address.email.clone(), idx);
                idx
            }
        };

        let contact = &mut self.contacts[idx];
        contact.record_direction(direction);
        contact.category = self.policy.categories.categorize(contact);
    }

    /// Scores every contact and returns them best first (ties by email).
    pub fn ranked(&self) -> Vec<ScoredContact> {
        let scoring = &self.policy.scoring;
        let mut ranked: Vec<ScoredContact> = self
            .contacts
            .iter()
            .map(|contact| {
                let priority_score = scoring.score(contact);
                ScoredContact {
                    contact: contact.clone(),
                    priority_score,
                    priority: scoring.tier_for(priority_score),
                }
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.priority_score
                .cmp(&a.priority_score)
                .then_with(|| a.contact.email.cmp(&b.contact.email))
        });
        ranked
    }
}

fn update_recency(
    contact: &mut AggregatedContact,
    mode: RecencyMode,
    date: &str,
    occurred_at: Option<i64>,
) {
    if date.is_empty() {
        return;
    }
    if contact.first_seen.is_empty() {
        contact.first_seen = date.to_string();
        contact.first_seen_at = occurred_at;
    }

    match (mode, occurred_at) {
        (RecencyMode::Chronological, Some(ts)) => {
            if contact.last_seen_at.map_or(true, |last| ts > last) {
                contact.last_seen = date.to_string();
                contact.last_seen_at = Some(ts);
            }
            if contact.first_seen_at.map_or(true, |first| ts < first) {
                contact.first_seen = date.to_string();
                contact.first_seen_at = Some(ts);
            }
        }
        // Unparseable dates cannot be ordered, so only fill gaps.
        (RecencyMode::Chronological, None) => {
            if contact.last_seen_at.is_none() {
                contact.last_seen = date.to_string();
            }
        }
        (RecencyMode::LastProcessed, _) => {
            contact.last_seen = date.to_string();
            contact.last_seen_at = occurred_at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ContactAggregator, Observation};
    use crate::domain::{parse_address, Category, Direction, MessageObservation};
    use crate::rules::{ContactPolicy, RecencyMode};

    fn message(from: &str, to: &str, subject: &str, date: &str) -> MessageObservation {
        MessageObservation {
            subject: subject.to_string(),
            from_field: from.to_string(),
            to_field: to.to_string(),
            cc_field: String::new(),
            date: date.to_string(),
        }
    }

    fn observe<'a>(
        address: &'a crate::domain::ParsedAddress,
        subject: &'a str,
        date: &'a str,
    ) -> Observation<'a> {
        Observation {
            address,
            subject,
            date,
            occurred_at: crate::time::parse_message_date(date),
            direction: Direction::Inbound,
        }
    }

    #[test]
    fn folding_same_observation_twice_counts_twice_and_keeps_one_subject() {
        let mut aggregator = ContactAggregator::new(ContactPolicy::business_email());
        let address = parse_address("Ada <ada@acme.com>").unwrap();
        aggregator.fold(observe(&address, "Kickoff", "2024-10-01"));
        let before = aggregator.get("ada@acme.com").unwrap().email_count;
        aggregator.fold(observe(&address, "Kickoff", "2024-10-01"));
        aggregator.fold(observe(&address, "Kickoff", "2024-10-01"));

        let contact = aggregator.get("ada@acme.com").unwrap();
        assert_eq!(contact.email_count, before + 2);
        assert_eq!(contact.subjects, vec!["Kickoff"]);
        assert_eq!(aggregator.len(), 1);
    }

    #[test]
    fn longest_name_wins_in_either_order() {
        let short = parse_address("Alice <alice@acme.com>").unwrap();
        let long = parse_address("Alice Smit <alice@acme.com>").unwrap();
        assert_eq!(short.display_name.as_deref().map(str::len), Some(5));
        assert_eq!(long.display_name.as_deref().map(str::len), Some(10));

        for order in [[&short, &long], [&long, &short]] {
            let mut aggregator = ContactAggregator::new(ContactPolicy::business_email());
            for address in order {
                aggregator.fold(observe(address, "Hi", "2024-10-01"));
            }
            assert_eq!(aggregator.get("alice@acme.com").unwrap().name, "Alice Smit");
        }
    }

    #[test]
    fn addresses_are_keyed_case_insensitively() {
        let mut aggregator = ContactAggregator::new(ContactPolicy::business_email());
        aggregator.ingest(&message("Ada <ADA@Acme.com>", "", "One", ""));
        aggregator.ingest(&message("ada@acme.COM", "", "Two", ""));
        assert_eq!(aggregator.len(), 1);
        assert_eq!(aggregator.get("Ada@Acme.com").unwrap().email_count, 2);
    }

    #[test]
    fn chronological_recency_ignores_processing_order() {
        let mut aggregator = ContactAggregator::new(ContactPolicy::business_email());
        aggregator.ingest(&message("ada@acme.com", "", "B", "Wed, 2 Oct 2024 09:00:00 +0000"));
        aggregator.ingest(&message("ada@acme.com", "", "C", "Thu, 3 Oct 2024 09:00:00 +0000"));
        aggregator.ingest(&message("ada@acme.com", "", "A", "Tue, 1 Oct 2024 09:00:00 +0000"));

        let contact = aggregator.get("ada@acme.com").unwrap();
        assert_eq!(contact.first_seen, "Tue, 1 Oct 2024 09:00:00 +0000");
        assert_eq!(contact.last_seen, "Thu, 3 Oct 2024 09:00:00 +0000");
    }

    #[test]
    fn last_processed_recency_keeps_legacy_overwrite() {
        let policy = ContactPolicy::business_email().with_recency(RecencyMode::LastProcessed);
        let mut aggregator = ContactAggregator::new(policy);
        aggregator.ingest(&message("ada@acme.com", "", "C", "Thu, 3 Oct 2024 09:00:00 +0000"));
        aggregator.ingest(&message("ada@acme.com", "", "A", "Tue, 1 Oct 2024 09:00:00 +0000"));

        let contact = aggregator.get("ada@acme.com").unwrap();
        assert_eq!(contact.first_seen, "Thu, 3 Oct 2024 09:00:00 +0000");
        assert_eq!(contact.last_seen, "Tue, 1 Oct 2024 09:00:00 +0000");
    }

    #[test]
    fn all_participants_scope_reads_every_field() {
        let policy = ContactPolicy::business_email()
            .with_owner(["me@studio.com"], ["studio.com"])
            .unwrap();
        let mut aggregator = ContactAggregator::new(policy);
        let mut received = message(
            "Ada <ada@acme.com>",
            "me@studio.com, \"Lee, Bo\" <bo@acme.com>",
            "Kickoff",
            "",
        );
        received.cc_field = "cy@partner.io".to_string();
        assert_eq!(aggregator.ingest(&received), 3);

        assert_eq!(aggregator.get("ada@acme.com").unwrap().inbound_count, 1);
        let bo = aggregator.get("bo@acme.com").unwrap();
        assert_eq!(bo.name, "Lee, Bo");
        assert_eq!((bo.inbound_count, bo.outreach_count), (0, 0));
        assert!(aggregator.get("me@studio.com").is_none());
    }

    #[test]
    fn all_participants_scope_keeps_colleague_senders() {
        let policy = ContactPolicy::business_email()
            .with_owner(["me@studio.com"], ["studio.com"])
            .unwrap();
        let mut aggregator = ContactAggregator::new(policy);
        aggregator.ingest(&message("Pat <pat@studio.com>", "me@studio.com", "Project sync", ""));
        aggregator.ingest(&message("Me <me@studio.com>", "pat@studio.com", "Re: Project sync", ""));

        assert_eq!(aggregator.len(), 1);
        let pat = aggregator.get("pat@studio.com").unwrap();
        assert_eq!(pat.name, "Pat");
        assert_eq!(pat.email_count, 2);
        assert_eq!((pat.inbound_count, pat.outreach_count), (0, 1));
        assert!(aggregator.get("me@studio.com").is_none());
    }

    #[test]
    fn chronological_recency_fills_gaps_with_unparseable_dates() {
        let mut aggregator = ContactAggregator::new(ContactPolicy::business_email());
        aggregator.ingest(&message("ada@acme.com", "", "A", "sometime last week"));
        let contact = aggregator.get("ada@acme.com").unwrap();
        assert_eq!(contact.first_seen, "sometime last week");
        assert_eq!(contact.last_seen_at, None);

        aggregator.ingest(&message("ada@acme.com", "", "B", "early October"));
        assert_eq!(aggregator.get("ada@acme.com").unwrap().last_seen, "early October");

        aggregator.ingest(&message("ada@acme.com", "", "C", "Wed, 2 Oct 2024 09:00:00 +0000"));
        aggregator.ingest(&message("ada@acme.com", "", "D", "around Halloween"));
        let contact = aggregator.get("ada@acme.com").unwrap();
        assert_eq!(contact.last_seen, "Wed, 2 Oct 2024 09:00:00 +0000");
        assert_eq!(contact.first_seen, "Wed, 2 Oct 2024 09:00:00 +0000");
        assert!(contact.last_seen_at.is_some());
    }

    #[test]
    fn counterparty_scope_tracks_direction() {
        let policy = ContactPolicy::prospect_client_strict()
            .with_owner(["me@studio.com"], ["studio.com"])
            .unwrap();
        let mut aggregator = ContactAggregator::new(policy);
        aggregator.ingest(&message("Me <me@studio.com>", "cfo@acme.com", "Intro", ""));
        aggregator.ingest(&message("Me <me@studio.com>", "cfo@acme.com", "Following up", ""));
        assert_eq!(
            aggregator.get("cfo@acme.com").unwrap().category,
            Category::ColdOutreach
        );

        aggregator.ingest(&message(
            "cfo@acme.com",
            "me@studio.com, pat@studio.com",
            "Re: Intro",
            "",
        ));
        let contact = aggregator.get("cfo@acme.com").unwrap();
        assert_eq!((contact.outreach_count, contact.inbound_count), (2, 1));
        assert_eq!(contact.category, Category::RespondedToOutreach);
        assert!(aggregator.get("pat@studio.com").is_none());
    }

    #[test]
    fn ranked_orders_by_score_then_email() {
        let mut aggregator = ContactAggregator::new(ContactPolicy::business_email());
        aggregator.ingest(&message("zed@acme.com", "", "Hello there", ""));
        aggregator.ingest(&message("amy@acme.com", "", "Hello there", ""));
        aggregator.ingest(&message("bea@acme.com", "", "Contract draft", ""));

        let ranked = aggregator.ranked();
        let emails: Vec<&str> = ranked.iter().map(|c| c.contact.email.as_str()).collect();
        assert_eq!(emails, vec!["bea@acme.com", "amy@acme.com", "zed@acme.com"]);
        assert!(ranked[0].priority_score > ranked[1].priority_score);
    }
}
