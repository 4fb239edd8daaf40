use std::collections::BTreeMap;

use leadsift_core::time::format_timestamp_date;
use leadsift_core::ScoredContact;

use crate::error::Result;
use crate::known::KnownContacts;

pub const CSV_COLUMNS: [&str; 10] = [
    "Priority",
    "Name",
    "Email",
    "Company",
    "Category",
    "Email_Count",
    "Last_Contact",
    "Priority_Score",
    "Sample_Subjects",
    "Notes",
];

const SAMPLE_SUBJECTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// The ranked contacts that survive the score floor, the known-contacts list
/// and the row limit.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub contacts: Vec<ScoredContact>,
    pub below_floor: usize,
    pub skipped_known: usize,
}

pub fn select(
    ranked: Vec<ScoredContact>,
    min_score: u32,
    known: Option<&KnownContacts>,
    limit: Option<usize>,
) -> Selection {
    let mut selection = Selection::default();
    for scored in ranked {
        if scored.priority_score <= min_score {
            selection.below_floor += 1;
            continue;
        }
        if known.is_some_and(|known| known.contains(&scored.contact.email)) {
            selection.skipped_known += 1;
            continue;
        }
        selection.contacts.push(scored);
    }
    if let Some(limit) = limit {
        selection.contacts.truncate(limit);
    }
    selection
}

pub fn render(format: ExportFormat, contacts: &[ScoredContact]) -> Result<String> {
    match format {
        ExportFormat::Csv => Ok(render_csv(contacts)),
        ExportFormat::Json => render_json(contacts),
    }
}

pub fn render_csv(contacts: &[ScoredContact]) -> String {
    let mut out = String::new();
    push_row(&mut out, CSV_COLUMNS.iter().map(|column| column.to_string()));
    for scored in contacts {
        let contact = &scored.contact;
        push_row(
            &mut out,
            [
                scored.priority.as_str().to_string(),
                contact.label(),
                contact.email.clone(),
                contact.company.clone(),
                contact.category.as_str().to_string(),
                contact.email_count.to_string(),
                last_contact(scored),
                scored.priority_score.to_string(),
                sample_subjects(scored),
                notes(scored),
            ],
        );
    }
    out
}

/// Email address to contact, pretty-printed.
pub fn render_json(contacts: &[ScoredContact]) -> Result<String> {
    let map: BTreeMap<&str, &ScoredContact> = contacts
        .iter()
        .map(|scored| (scored.contact.email.as_str(), scored))
        .collect();
    let mut json = serde_json::to_string_pretty(&map)?;
    json.push('\n');
    Ok(json)
}

pub fn last_contact(scored: &ScoredContact) -> String {
    match scored.contact.last_seen_at {
        Some(ts) => format_timestamp_date(ts),
        None => scored.contact.last_seen.clone(),
    }
}

pub fn sample_subjects(scored: &ScoredContact) -> String {
    scored
        .contact
        .subjects
        .iter()
        .take(SAMPLE_SUBJECTS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn notes(scored: &ScoredContact) -> String {
    let contact = &scored.contact;
    let mut notes = vec![format!("Contacted {}x", contact.email_count)];
    match (contact.inbound_count > 0, contact.outreach_count > 0) {
        (true, false) => notes.push("inbound lead".to_string()),
        (false, true) => notes.push("follow up: no response".to_string()),
        (true, true) => notes.push("engaged".to_string()),
        (false, false) => {}
    }
    if contact.category.is_high_value() {
        notes.push(format!("high value: {}", contact.category));
    }
    notes.join(" | ")
}

fn push_row<I>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = String>,
{
    for (idx, field) in fields.into_iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(&field));
    }
    out.push_str("\r\n");
}

fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{escape_field, notes, render_csv, render_json, sample_subjects, select};
    use crate::known::KnownContacts;
    use leadsift_core::{AggregatedContact, Category, PriorityTier, ScoredContact};

    fn scored(email: &str, score: u32) -> ScoredContact {
        ScoredContact {
            contact: AggregatedContact {
                email: email.to_string(),
                name: String::new(),
                company: "Acme".to_string(),
                domain: "acme.com".to_string(),
                first_seen: "Tue, 1 Oct 2024 10:00:00 +0000".to_string(),
                last_seen: "Wed, 2 Oct 2024 10:00:00 +0000".to_string(),
                first_seen_at: Some(1_727_776_800),
                last_seen_at: Some(1_727_863_200),
                email_count: 2,
                inbound_count: 1,
                outreach_count: 1,
                subjects: vec![
                    "Contract, v2".to_string(),
                    "Pricing".to_string(),
                    "Kickoff".to_string(),
                    "Recap".to_string(),
                ],
                category: Category::ActiveProspect,
                personal_domain: false,
            },
            priority_score: score,
            priority: PriorityTier::Medium,
        }
    }

    #[test]
    fn csv_quotes_fields_with_separators() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a, b"), "\"a, b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn csv_has_header_and_one_row_per_contact() {
        let csv = render_csv(&[scored("jane.doe@acme.com", 60)]);
        let lines: Vec<&str> = csv.split("\r\n").filter(|line| !line.is_empty()).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Priority,Name,Email,Company"));
        assert!(lines[1].starts_with(
            "Medium,Jane Doe,jane.doe@acme.com,Acme,Active Prospect,2,2024-10-02,60,"
        ));
        assert!(lines[1].contains("\"Contract, v2; Pricing; Kickoff\""));
    }

    #[test]
    fn samples_and_notes() {
        let contact = scored("a@acme.com", 60);
        assert_eq!(sample_subjects(&contact), "Contract, v2; Pricing; Kickoff");
        assert_eq!(
            notes(&contact),
            "Contacted 2x | engaged | high value: Active Prospect"
        );
    }

    #[test]
    fn select_applies_floor_known_and_limit() {
        let known = KnownContacts::parse("b@acme.com\n").expect("known");
        let ranked = vec![
            scored("a@acme.com", 90),
            scored("b@acme.com", 80),
            scored("c@acme.com", 70),
            scored("d@acme.com", 25),
        ];
        let selection = select(ranked, 25, Some(&known), Some(1));
        assert_eq!(selection.below_floor, 1);
        assert_eq!(selection.skipped_known, 1);
        assert_eq!(selection.contacts.len(), 1);
        assert_eq!(selection.contacts[0].contact.email, "a@acme.com");
    }

    #[test]
    fn json_maps_email_to_contact() {
        let json = render_json(&[scored("a@acme.com", 60)]).expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["a@acme.com"]["priority_score"], 60);
        assert_eq!(value["a@acme.com"]["category"], "Active Prospect");
    }
}
