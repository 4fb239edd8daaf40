use crate::domain::normalize_email;
use crate::error::CoreError;
use crate::rules::categorize::CategoryTable;
use crate::rules::filter::FilterPolicy;
use crate::rules::score::ScoringPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyPreset {
    #[default]
    BusinessEmail,
    ProspectClient,
}

impl PolicyPreset {
    pub const fn as_str(self) -> &'static str {
        match self {
            PolicyPreset::BusinessEmail => "business-email",
            PolicyPreset::ProspectClient => "prospect-client",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "business-email" | "business" => Ok(PolicyPreset::BusinessEmail),
            "prospect-client" | "prospect-client-strict" | "strict" => {
                Ok(PolicyPreset::ProspectClient)
            }
            _ => Err(CoreError::UnknownPolicy(value.trim().to_string())),
        }
    }

    pub const fn all() -> &'static [PolicyPreset] {
        &[PolicyPreset::BusinessEmail, PolicyPreset::ProspectClient]
    }
}

/// How `last_seen`/`first_seen` react to a new observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RecencyMode {
    /// Compare parsed timestamps; processing order does not matter.
    #[default]
    Chronological,
    /// The most recently processed message always wins.
    LastProcessed,
}

impl RecencyMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            RecencyMode::Chronological => "chronological",
            RecencyMode::LastProcessed => "last-processed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "chronological" => Ok(RecencyMode::Chronological),
            "last-processed" => Ok(RecencyMode::LastProcessed),
            _ => Err(CoreError::UnknownRecencyMode(value.trim().to_string())),
        }
    }
}

/// Everything one aggregation run needs to decide what to keep and how to rank it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactPolicy {
    pub preset: PolicyPreset,
    pub filter: FilterPolicy,
    pub categories: CategoryTable,
    pub scoring: ScoringPolicy,
    pub recency: RecencyMode,
}

impl ContactPolicy {
    pub fn preset(preset: PolicyPreset) -> Self {
        let (filter, scoring) = match preset {
            PolicyPreset::BusinessEmail => {
                (FilterPolicy::business_email(), ScoringPolicy::business_email())
            }
            PolicyPreset::ProspectClient => (
                FilterPolicy::prospect_client_strict(),
                ScoringPolicy::prospect_client(),
            ),
        };
        Self {
            preset,
            filter,
            categories: CategoryTable::default(),
            scoring,
            recency: RecencyMode::default(),
        }
    }

    pub fn business_email() -> Self {
        Self::preset(PolicyPreset::BusinessEmail)
    }

    pub fn prospect_client_strict() -> Self {
        Self::preset(PolicyPreset::ProspectClient)
    }

    /// Registers the mailbox owner's own addresses and domains.
    pub fn with_owner<A, D>(mut self, addresses: A, domains: D) -> Result<Self, CoreError>
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        for address in addresses {
            let raw = address.as_ref();
            let email = normalize_email(raw)
                .filter(|email| email.contains('@'))
                .ok_or_else(|| CoreError::InvalidOwnerAddress(raw.to_string()))?;
            if !self.filter.owner_addresses.contains(&email) {
                self.filter.owner_addresses.push(email);
            }
        }
        for domain in domains {
            let domain = domain.as_ref().trim().trim_start_matches('@').to_lowercase();
            if !domain.is_empty() && !self.filter.owner_domains.contains(&domain) {
                self.filter.owner_domains.push(domain);
            }
        }
        Ok(self)
    }

    pub fn with_excluded_domains<I>(mut self, domains: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for domain in domains {
            let domain = domain.as_ref().trim().to_lowercase();
            if !domain.is_empty() && !self.filter.excluded_domains.contains(&domain) {
                self.filter.excluded_domains.push(domain);
            }
        }
        self
    }

    pub fn with_recency(mut self, recency: RecencyMode) -> Self {
        self.recency = recency;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{ContactPolicy, PolicyPreset, RecencyMode};
    use crate::rules::AddressScope;

    #[test]
    fn preset_parse_accepts_aliases() {
        assert_eq!(
            PolicyPreset::parse("prospect_client_strict").unwrap(),
            PolicyPreset::ProspectClient
        );
        assert_eq!(
            PolicyPreset::parse(" Business-Email ").unwrap(),
            PolicyPreset::BusinessEmail
        );
        assert!(PolicyPreset::parse("lenient").is_err());
    }

    #[test]
    fn preset_round_trip() {
        for preset in PolicyPreset::all() {
            assert_eq!(PolicyPreset::parse(preset.as_str()).unwrap(), *preset);
        }
    }

    #[test]
    fn recency_parse() {
        assert_eq!(
            RecencyMode::parse("last_processed").unwrap(),
            RecencyMode::LastProcessed
        );
        assert!(RecencyMode::parse("newest").is_err());
    }

    #[test]
    fn presets_differ_in_scope_and_strictness() {
        let business = ContactPolicy::business_email();
        let strict = ContactPolicy::prospect_client_strict();
        assert_eq!(business.filter.scope, AddressScope::AllParticipants);
        assert_eq!(strict.filter.scope, AddressScope::Counterparty);
        assert!(!business.filter.reject_personal_domains);
        assert!(strict.filter.reject_personal_domains);
    }

    #[test]
    fn with_owner_normalizes_and_validates() {
        let policy = ContactPolicy::business_email()
            .with_owner([" Me@Studio.com "], ["@Studio.com"])
            .expect("owner");
        assert_eq!(policy.filter.owner_addresses, vec!["me@studio.com"]);
        assert_eq!(policy.filter.owner_domains, vec!["studio.com"]);

        let err = ContactPolicy::business_email()
            .with_owner(["nobody"], Vec::<String>::new())
            .unwrap_err();
        assert!(err.to_string().contains("invalid owner address"));
    }
}
