use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Active Prospect")]
    ActiveProspect,
    #[serde(rename = "Project Opportunity")]
    ProjectOpportunity,
    #[serde(rename = "Engaged Prospect")]
    EngagedProspect,
    #[serde(rename = "Current Client")]
    CurrentClient,
    #[serde(rename = "Cold Outreach (No Response)")]
    ColdOutreach,
    #[serde(rename = "Responded to Outreach")]
    RespondedToOutreach,
    #[serde(rename = "Network/Partnership")]
    NetworkPartnership,
    #[serde(rename = "General Business Contact")]
    GeneralBusinessContact,
    #[serde(rename = "Personal/Network")]
    PersonalNetwork,
}

impl Category {
    pub const fn as_str(self) -> &'static str {
        match self {
            Category::ActiveProspect => "Active Prospect",
            Category::ProjectOpportunity => "Project Opportunity",
            Category::EngagedProspect => "Engaged Prospect",
            Category::CurrentClient => "Current Client",
            Category::ColdOutreach => "Cold Outreach (No Response)",
            Category::RespondedToOutreach => "Responded to Outreach",
            Category::NetworkPartnership => "Network/Partnership",
            Category::GeneralBusinessContact => "General Business Contact",
            Category::PersonalNetwork => "Personal/Network",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        let trimmed = value.trim();
        Category::all()
            .iter()
            .copied()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CoreError::UnknownCategory(trimmed.to_string()))
    }

    /// Categories that earn a "high value" note in exports.
    pub const fn is_high_value(self) -> bool {
        matches!(
            self,
            Category::ActiveProspect | Category::CurrentClient | Category::ProjectOpportunity
        )
    }

    pub const fn all() -> &'static [Category] {
        &[
            Category::ActiveProspect,
            Category::ProjectOpportunity,
            Category::EngagedProspect,
            Category::CurrentClient,
            Category::ColdOutreach,
            Category::RespondedToOutreach,
            Category::NetworkPartnership,
            Category::GeneralBusinessContact,
            Category::PersonalNetwork,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
