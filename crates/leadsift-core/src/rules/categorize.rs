use crate::domain::{AggregatedContact, Category};
use crate::rules::filter::{contains_any, owned};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleMatch {
    /// Any keyword appears in the lower-cased subject text.
    AnyKeyword(Vec<String>),
    /// The owner wrote and never heard back.
    OutreachWithoutReply,
    /// The owner wrote and the contact replied at least once.
    OutreachWithReply,
}

impl RuleMatch {
    fn matches(&self, contact: &AggregatedContact, subject_text: &str) -> bool {
        match self {
            RuleMatch::AnyKeyword(keywords) => contains_any(subject_text, keywords),
            RuleMatch::OutreachWithoutReply => {
                contact.outreach_count > 0 && contact.inbound_count == 0
            }
            RuleMatch::OutreachWithReply => contact.outreach_count > 0 && contact.inbound_count > 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    pub category: Category,
    pub matcher: RuleMatch,
}

impl CategoryRule {
    pub fn keywords(category: Category, keywords: &[&str]) -> Self {
        Self {
            category,
            matcher: RuleMatch::AnyKeyword(owned(keywords)),
        }
    }
}

/// Ordered rule table; the first matching rule decides the category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    pub rules: Vec<CategoryRule>,
    pub fallback: Category,
    pub personal_fallback: Category,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self {
            rules: vec![
                CategoryRule::keywords(
                    Category::ActiveProspect,
                    &["proposal", "quote", "pricing", "contract", "agreement", "sow"],
                ),
                CategoryRule::keywords(
                    Category::ProjectOpportunity,
                    &["project", "campaign", "presentation", "deck", "strategy"],
                ),
                CategoryRule::keywords(
                    Category::EngagedProspect,
                    &["meeting", "call", "discussion", "consultation"],
                ),
                CategoryRule::keywords(Category::CurrentClient, &["invoice", "payment", "billing"]),
                CategoryRule {
                    category: Category::ColdOutreach,
                    matcher: RuleMatch::OutreachWithoutReply,
                },
                CategoryRule {
                    category: Category::RespondedToOutreach,
                    matcher: RuleMatch::OutreachWithReply,
                },
                CategoryRule::keywords(
                    Category::NetworkPartnership,
                    &["introduction", "intro", "connect", "partnership", "collaboration"],
                ),
            ],
            fallback: Category::GeneralBusinessContact,
            personal_fallback: Category::PersonalNetwork,
        }
    }
}

impl CategoryTable {
    pub fn categorize(&self, contact: &AggregatedContact) -> Category {
        let subject_text = contact.subject_text();
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(contact, &subject_text))
            .map(|rule| rule.category)
            .unwrap_or(if contact.personal_domain {
                self.personal_fallback
            } else {
                self.fallback
            })
    }
}

#[cfg(test)]
mod tests {
    use super::CategoryTable;
    use crate::domain::{AggregatedContact, Category};

    fn contact_with(subjects: &[&str]) -> AggregatedContact {
        AggregatedContact {
            email: "ada@acme.com".to_string(),
            name: "Ada".to_string(),
            company: "Acme".to_string(),
            domain: "acme.com".to_string(),
            first_seen: String::new(),
            last_seen: String::new(),
            first_seen_at: None,
            last_seen_at: None,
            email_count: subjects.len() as u32,
            inbound_count: 0,
            outreach_count: 0,
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
            category: Category::GeneralBusinessContact,
            personal_domain: false,
        }
    }

    #[test]
    fn proposal_outranks_invoice_in_any_order() {
        let table = CategoryTable::default();
        let a = contact_with(&["Invoice #12", "Updated proposal"]);
        let b = contact_with(&["Updated proposal", "Invoice #12"]);
        assert_eq!(table.categorize(&a), Category::ActiveProspect);
        assert_eq!(table.categorize(&b), Category::ActiveProspect);
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let table = CategoryTable::default();
        let contact = contact_with(&["MEETING notes"]);
        assert_eq!(table.categorize(&contact), Category::EngagedProspect);
    }

    #[test]
    fn invoice_only_is_current_client() {
        let table = CategoryTable::default();
        assert_eq!(
            table.categorize(&contact_with(&["Invoice #1023"])),
            Category::CurrentClient
        );
    }

    #[test]
    fn direction_rules_sit_between_client_and_network() {
        let table = CategoryTable::default();
        let mut cold = contact_with(&["Partnership idea"]);
        cold.outreach_count = 2;
        assert_eq!(table.categorize(&cold), Category::ColdOutreach);

        let mut replied = cold.clone();
        replied.inbound_count = 1;
        assert_eq!(table.categorize(&replied), Category::RespondedToOutreach);

        let mut billed = replied.clone();
        billed.subjects.push("Billing question".to_string());
        assert_eq!(table.categorize(&billed), Category::CurrentClient);
    }

    #[test]
    fn fallback_depends_on_personal_domain() {
        let table = CategoryTable::default();
        let mut contact = contact_with(&["Dinner Friday"]);
        assert_eq!(table.categorize(&contact), Category::GeneralBusinessContact);
        contact.personal_domain = true;
        assert_eq!(table.categorize(&contact), Category::PersonalNetwork);
    }
}
