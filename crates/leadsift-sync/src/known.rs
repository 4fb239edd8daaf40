use std::collections::HashSet;
use std::fs;
use std::path::Path;

use leadsift_core::parse_address;
use serde_json::Value;

use crate::error::{Result, SyncError};

/// Addresses already tracked elsewhere (a CRM export, a previous run).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownContacts {
    emails: HashSet<String>,
}

impl KnownContacts {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
            .map_err(|err| SyncError::Parse(format!("known contacts {}: {err}", path.display())))
    }

    /// Accepts a JSON export from this tool (object keyed by address, or an
    /// array of addresses/objects with an `email` field), a CSV with an
    /// email column, or one address per line.
    pub fn parse(contents: &str) -> Result<Self> {
        let trimmed = contents.trim_start_matches('\u{feff}').trim();
        let mut known = Self::default();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            let value: Value = serde_json::from_str(trimmed)?;
            known.extend_json(&value);
            return Ok(known);
        }

        let mut lines = trimmed.lines().filter(|line| !line.trim().is_empty());
        let Some(first) = lines.next() else {
            return Ok(known);
        };
        match email_column(first) {
            Some(column) => {
                for line in lines {
                    if let Some(field) = split_csv_line(line).get(column) {
                        known.insert(field);
                    }
                }
            }
            None => {
                known.insert(first);
                for line in lines {
                    known.insert(line);
                }
            }
        }
        Ok(known)
    }

    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(&email.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    fn insert(&mut self, raw: &str) {
        if let Some(parsed) = parse_address(raw) {
            self.emails.insert(parsed.email);
        }
    }

    fn extend_json(&mut self, value: &Value) {
        match value {
            Value::Object(map) => {
                if let Some(Value::String(email)) = map.get("email") {
                    self.insert(email);
                    return;
                }
                for key in map.keys() {
                    self.insert(key);
                }
            }
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::String(email) => self.insert(email),
                        Value::Object(_) => self.extend_json(item),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
}

/// Index of the first header column named like `email`, when the line looks
/// like a header rather than data.
fn email_column(header: &str) -> Option<usize> {
    if header.contains('@') {
        return None;
    }
    split_csv_line(header).iter().position(|column| {
        let normalized: String = column
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        normalized.contains("email")
    })
}

fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(ch),
        }
    }
    fields.push(field);
    fields
}

#[cfg(test)]
mod tests {
    use super::{split_csv_line, KnownContacts};

    #[test]
    fn csv_uses_the_email_column_only() {
        let known = KnownContacts::parse(
            "Name,Owner,Email Address\n\"Doe, Jane\",rep@studio.com,Jane@Acme.com\n",
        )
        .expect("parse");
        assert_eq!(known.len(), 1);
        assert!(known.contains("jane@acme.com"));
        assert!(!known.contains("rep@studio.com"));
    }

    #[test]
    fn plain_list_and_display_names() {
        let known =
            KnownContacts::parse("ada@acme.com\n\nBob <bob@beta.io>\nnot an address\n")
                .expect("parse");
        assert_eq!(known.len(), 2);
        assert!(known.contains("BOB@beta.io"));
    }

    #[test]
    fn json_export_keys_and_arrays() {
        let known = KnownContacts::parse(r#"{"ada@acme.com": {"email": "ada@acme.com"}}"#)
            .expect("object");
        assert!(known.contains("ada@acme.com"));

        let known =
            KnownContacts::parse(r#"["bob@beta.io", {"email": "cy@gamma.org"}]"#).expect("array");
        assert_eq!(known.len(), 2);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(KnownContacts::parse("{ nope").is_err());
    }

    #[test]
    fn split_handles_escaped_quotes() {
        assert_eq!(
            split_csv_line(r#"a,"b, ""c""",d"#),
            vec!["a", "b, \"c\"", "d"]
        );
    }
}
