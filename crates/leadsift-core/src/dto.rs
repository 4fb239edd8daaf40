use crate::domain::{AggregatedContact, Category};
use crate::rules::PriorityTier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredContact {
    #[serde(flatten)]
    pub contact: AggregatedContact,
    pub priority_score: u32,
    pub priority: PriorityTier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCountDto {
    pub category: Category,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactSummaryDto {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub inbound_only: usize,
    pub outreach_only: usize,
    pub both_directions: usize,
    pub categories: Vec<CategoryCountDto>,
}

impl ContactSummaryDto {
    /// Tier and direction counts plus a category breakdown, largest first.
    pub fn from_ranked(contacts: &[ScoredContact]) -> Self {
        let mut summary = Self {
            total: contacts.len(),
            ..Self::default()
        };
        let mut categories: BTreeMap<Category, usize> = BTreeMap::new();
        for scored in contacts {
            match scored.priority {
                PriorityTier::High => summary.high += 1,
                PriorityTier::Medium => summary.medium += 1,
                PriorityTier::Low => summary.low += 1,
            }
            let contact = &scored.contact;
            match (contact.inbound_count > 0, contact.outreach_count > 0) {
                (true, false) => summary.inbound_only += 1,
                (false, true) => summary.outreach_only += 1,
                (true, true) => summary.both_directions += 1,
                (false, false) => {}
            }
            *categories.entry(contact.category).or_default() += 1;
        }
        summary.categories = categories
            .into_iter()
            .map(|(category, count)| CategoryCountDto { category, count })
            .collect();
        summary
            .categories
            .sort_by(|a, b| b.count.cmp(&a.count).then(a.category.cmp(&b.category)));
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::{ContactSummaryDto, ScoredContact};
    use crate::domain::{AggregatedContact, Category};
    use crate::rules::PriorityTier;

    fn scored(email: &str, category: Category, tier: PriorityTier) -> ScoredContact {
        ScoredContact {
            contact: AggregatedContact {
                email: email.to_string(),
                name: String::new(),
                company: "Acme".to_string(),
                domain: "acme.com".to_string(),
                first_seen: String::new(),
                last_seen: String::new(),
                first_seen_at: None,
                last_seen_at: None,
                email_count: 1,
                inbound_count: 1,
                outreach_count: 0,
                subjects: Vec::new(),
                category,
                personal_domain: false,
            },
            priority_score: 0,
            priority: tier,
        }
    }

    #[test]
    fn summary_counts_tiers_and_categories() {
        let contacts = vec![
            scored("a@acme.com", Category::CurrentClient, PriorityTier::High),
            scored("b@acme.com", Category::ActiveProspect, PriorityTier::Low),
            scored("c@acme.com", Category::CurrentClient, PriorityTier::Medium),
        ];
        let summary = ContactSummaryDto::from_ranked(&contacts);
        assert_eq!((summary.high, summary.medium, summary.low), (1, 1, 1));
        assert_eq!(summary.inbound_only, 3);
        assert_eq!(summary.categories[0].category, Category::CurrentClient);
        assert_eq!(summary.categories[0].count, 2);
    }

    #[test]
    fn scored_contact_flattens_into_json() {
        let contact = scored("a@acme.com", Category::CurrentClient, PriorityTier::High);
        let value = serde_json::to_value(contact).expect("serialize");
        assert_eq!(value["email"], "a@acme.com");
        assert_eq!(value["category"], "Current Client");
        assert_eq!(value["priority"], "High");
    }
}
