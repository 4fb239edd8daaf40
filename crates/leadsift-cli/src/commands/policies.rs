use crate::commands::{print_json, Context};
use anyhow::Result;
use clap::Args;
use leadsift_core::{AddressScope, Category, PolicyPreset, RuleMatch, Signal};
use serde::Serialize;

#[derive(Debug, Args)]
pub struct PoliciesArgs {
    /// Only show this preset
    #[arg(long)]
    pub policy: Option<String>,
}

#[derive(Debug, Serialize)]
struct PolicyDto {
    name: &'static str,
    default: bool,
    scope: AddressScope,
    reject_owner_domains: bool,
    reject_personal_domains: bool,
    reject_institutional: bool,
    require_business_signal: bool,
    excluded_domains: Vec<String>,
    high_above: u32,
    medium_above: u32,
    min_score: u32,
    signals: Vec<SignalDto>,
    categories: Vec<CategoryRuleDto>,
}

#[derive(Debug, Serialize)]
struct SignalDto {
    signal: Signal,
    weight: u32,
    cap: Option<u32>,
}

#[derive(Debug, Serialize)]
struct CategoryRuleDto {
    category: Category,
    points: u32,
    matches: String,
}

pub fn show_policies(ctx: &Context<'_>, args: PoliciesArgs) -> Result<()> {
    let presets = match args.policy.as_deref() {
        Some(value) => vec![PolicyPreset::parse(value)?],
        None => PolicyPreset::all().to_vec(),
    };
    let policies = presets
        .into_iter()
        .map(|preset| describe(ctx, preset))
        .collect::<Result<Vec<_>>>()?;

    if ctx.json {
        return print_json(&policies);
    }

    for (idx, policy) in policies.iter().enumerate() {
        if idx > 0 {
            println!();
        }
        let marker = if policy.default { " (default)" } else { "" };
        println!("{}{}", policy.name, marker);
        println!("  scope: {}", policy.scope.as_str());
        println!(
            "  tiers: high > {}, medium > {}, export floor > {}",
            policy.high_above, policy.medium_above, policy.min_score
        );
        let mut rejects = Vec::new();
        if policy.reject_owner_domains {
            rejects.push("owner domains");
        }
        if policy.reject_personal_domains {
            rejects.push("personal webmail");
        }
        if policy.reject_institutional {
            rejects.push("institutional domains");
        }
        if !rejects.is_empty() {
            println!("  also rejects: {}", rejects.join(", "));
        }
        if policy.require_business_signal {
            println!("  requires a business domain or business subject keyword");
        }
        println!("  signals:");
        for signal in &policy.signals {
            match signal.cap {
                Some(cap) => println!(
                    "    {} x{} (cap {})",
                    signal.signal.as_str(),
                    signal.weight,
                    cap
                ),
                None => println!("    {} x{}", signal.signal.as_str(), signal.weight),
            }
        }
        println!("  categories:");
        for rule in &policy.categories {
            println!("    {} [{}]: {}", rule.category, rule.points, rule.matches);
        }
    }
    Ok(())
}

fn describe(ctx: &Context<'_>, preset: PolicyPreset) -> Result<PolicyDto> {
    let policy = ctx.config.contact_policy(preset, ctx.config.recency)?;
    let scoring = &policy.scoring;
    let table = &policy.categories;

    let mut categories: Vec<CategoryRuleDto> = table
        .rules
        .iter()
        .map(|rule| CategoryRuleDto {
            category: rule.category,
            points: scoring.category_points(rule.category),
            matches: match &rule.matcher {
                RuleMatch::AnyKeyword(keywords) => {
                    format!("subject mentions {}", keywords.join("|"))
                }
                RuleMatch::OutreachWithoutReply => "outreach with no reply".to_string(),
                RuleMatch::OutreachWithReply => "outreach with a reply".to_string(),
            },
        })
        .collect();
    categories.push(CategoryRuleDto {
        category: table.fallback,
        points: scoring.category_points(table.fallback),
        matches: "anything else".to_string(),
    });
    categories.push(CategoryRuleDto {
        category: table.personal_fallback,
        points: scoring.category_points(table.personal_fallback),
        matches: "anything else on a personal domain".to_string(),
    });

    Ok(PolicyDto {
        name: preset.as_str(),
        default: preset == ctx.config.policy,
        scope: policy.filter.scope,
        reject_owner_domains: policy.filter.reject_owner_domains,
        reject_personal_domains: policy.filter.reject_personal_domains,
        reject_institutional: policy.filter.reject_institutional,
        require_business_signal: policy.filter.require_business_signal,
        excluded_domains: policy.filter.excluded_domains.clone(),
        high_above: scoring.tiers.high_above(),
        medium_above: scoring.tiers.medium_above(),
        min_score: scoring.min_score,
        signals: scoring
            .signals
            .iter()
            .map(|signal| SignalDto {
                signal: signal.signal,
                weight: signal.weight,
                cap: signal.cap,
            })
            .collect(),
        categories,
    })
}
