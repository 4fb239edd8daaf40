use crate::domain::{AggregatedContact, Category};
use crate::error::CoreError;
use crate::rules::filter::owned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Signal {
    /// Number of messages folded into the contact.
    EmailCount,
    /// 1 when the domain is not a personal webmail domain.
    BusinessDomain,
    /// Number of scoring keywords found across subjects.
    KeywordHits,
    /// Inbound replies per outreach message, only when both happened.
    ResponseRate,
}

impl Signal {
    pub const fn as_str(self) -> &'static str {
        match self {
            Signal::EmailCount => "email-count",
            Signal::BusinessDomain => "business-domain",
            Signal::KeywordHits => "keyword-hits",
            Signal::ResponseRate => "response-rate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightedSignal {
    pub signal: Signal,
    pub weight: u32,
    pub cap: Option<u32>,
}

impl WeightedSignal {
    pub const fn new(signal: Signal, weight: u32, cap: Option<u32>) -> Self {
        Self {
            signal,
            weight,
            cap,
        }
    }

    fn points(&self, contact: &AggregatedContact, keyword_hits: u32) -> u32 {
        let raw = match self.signal {
            Signal::EmailCount => contact.email_count.saturating_mul(self.weight),
            Signal::BusinessDomain => {
                if contact.personal_domain {
                    0
                } else {
                    self.weight
                }
            }
            Signal::KeywordHits => keyword_hits.saturating_mul(self.weight),
            Signal::ResponseRate => {
                if contact.outreach_count > 0 && contact.inbound_count > 0 {
                    contact.inbound_count.saturating_mul(self.weight) / contact.outreach_count
                } else {
                    0
                }
            }
        };
        match self.cap {
            Some(cap) => raw.min(cap),
            None => raw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityTier {
    High,
    Medium,
    Low,
}

impl PriorityTier {
    pub const fn as_str(self) -> &'static str {
        match self {
            PriorityTier::High => "High",
            PriorityTier::Medium => "Medium",
            PriorityTier::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierThresholds {
    high_above: u32,
    medium_above: u32,
}

impl TierThresholds {
    pub fn new(high_above: u32, medium_above: u32) -> Result<Self, CoreError> {
        if high_above <= medium_above {
            return Err(CoreError::InvalidTierThresholds {
                high: high_above,
                medium: medium_above,
            });
        }
        Ok(Self {
            high_above,
            medium_above,
        })
    }

    pub fn high_above(&self) -> u32 {
        self.high_above
    }

    pub fn medium_above(&self) -> u32 {
        self.medium_above
    }

    pub fn tier_for(&self, score: u32) -> PriorityTier {
        if score > self.high_above {
            PriorityTier::High
        } else if score > self.medium_above {
            PriorityTier::Medium
        } else {
            PriorityTier::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringPolicy {
    pub signals: Vec<WeightedSignal>,
    pub category_points: Vec<(Category, u32)>,
    pub keywords: Vec<String>,
    pub tiers: TierThresholds,
    /// Contacts scoring at or below this are left out of exports.
    pub min_score: u32,
}

impl ScoringPolicy {
    pub fn business_email() -> Self {
        Self {
            signals: vec![
                WeightedSignal::new(Signal::EmailCount, 5, Some(40)),
                WeightedSignal::new(Signal::BusinessDomain, 20, None),
                WeightedSignal::new(Signal::KeywordHits, 2, Some(10)),
            ],
            category_points: vec![
                (Category::ActiveProspect, 30),
                (Category::CurrentClient, 28),
                (Category::ProjectOpportunity, 25),
                (Category::EngagedProspect, 20),
                (Category::RespondedToOutreach, 20),
                (Category::NetworkPartnership, 15),
                (Category::GeneralBusinessContact, 15),
                (Category::ColdOutreach, 10),
                (Category::PersonalNetwork, 5),
            ],
            keywords: owned(&[
                "meeting",
                "project",
                "business",
                "proposal",
                "contract",
                "partnership",
            ]),
            tiers: TierThresholds {
                high_above: 50,
                medium_above: 30,
            },
            min_score: 15,
        }
    }

    pub fn prospect_client() -> Self {
        Self {
            signals: vec![
                WeightedSignal::new(Signal::EmailCount, 10, Some(60)),
                WeightedSignal::new(Signal::BusinessDomain, 25, None),
                WeightedSignal::new(Signal::KeywordHits, 5, Some(55)),
                WeightedSignal::new(Signal::ResponseRate, 25, Some(25)),
            ],
            category_points: vec![
                (Category::ActiveProspect, 50),
                (Category::CurrentClient, 45),
                (Category::ProjectOpportunity, 40),
                (Category::RespondedToOutreach, 40),
                (Category::EngagedProspect, 35),
                (Category::NetworkPartnership, 25),
                (Category::GeneralBusinessContact, 15),
                (Category::ColdOutreach, 15),
                (Category::PersonalNetwork, 5),
            ],
            keywords: owned(&[
                "proposal",
                "quote",
                "pricing",
                "budget",
                "contract",
                "agreement",
                "project",
                "campaign",
                "strategy",
                "consultation",
                "partnership",
            ]),
            tiers: TierThresholds {
                high_above: 70,
                medium_above: 50,
            },
            min_score: 25,
        }
    }

    pub fn category_points(&self, category: Category) -> u32 {
        self.category_points
            .iter()
            .find(|(candidate, _)| *candidate == category)
            .map(|(_, points)| *points)
            .unwrap_or(0)
    }

    pub fn keyword_hits(&self, contact: &AggregatedContact) -> u32 {
        let text = contact.subject_text();
        self.keywords
            .iter()
            .filter(|keyword| !keyword.is_empty() && text.contains(keyword.as_str()))
            .count() as u32
    }

    pub fn score(&self, contact: &AggregatedContact) -> u32 {
        let hits = self.keyword_hits(contact);
        self.signals
            .iter()
            .map(|signal| signal.points(contact, hits))
            .fold(self.category_points(contact.category), u32::saturating_add)
    }

    pub fn tier_for(&self, score: u32) -> PriorityTier {
        self.tiers.tier_for(score)
    }
}
