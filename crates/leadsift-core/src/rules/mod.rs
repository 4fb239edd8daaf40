pub mod categorize;
pub mod filter;
pub mod policy;
pub mod score;

pub use categorize::{CategoryRule, CategoryTable, RuleMatch};
pub use filter::{domain_matches, AddressScope, FilterPolicy};
pub use policy::{ContactPolicy, PolicyPreset, RecencyMode};
pub use score::{PriorityTier, ScoringPolicy, Signal, TierThresholds, WeightedSignal};
