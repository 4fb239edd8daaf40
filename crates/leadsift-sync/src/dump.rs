use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SyncError};
use crate::source::{MessageRef, MessageSource, RawMessage};

/// Reads messages saved from the Gmail API (`users.messages.get` with
/// `format=metadata`): either a bare array or an object with a `messages`
/// array.
#[derive(Debug, Clone)]
pub struct JsonDumpSource {
    path: PathBuf,
    messages: Option<Vec<DumpMessage>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum DumpFile {
    Messages(Vec<DumpMessage>),
    Wrapped { messages: Vec<DumpMessage> },
}

#[derive(Debug, Clone, Deserialize)]
struct DumpMessage {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    payload: Option<DumpPayload>,
}

#[derive(Debug, Clone, Deserialize)]
struct DumpPayload {
    #[serde(default)]
    headers: Vec<DumpHeader>,
}

#[derive(Debug, Clone, Deserialize)]
struct DumpHeader {
    name: String,
    #[serde(default)]
    value: String,
}

impl JsonDumpSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            messages: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&mut self) -> Result<&[DumpMessage]> {
        if self.messages.is_none() {
            let contents = fs::read_to_string(&self.path)?;
            let parsed: DumpFile = serde_json::from_str(&contents).map_err(|err| {
                SyncError::Parse(format!("message dump {}: {err}", self.path.display()))
            })?;
            self.messages = Some(match parsed {
                DumpFile::Messages(messages) => messages,
                DumpFile::Wrapped { messages } => messages,
            });
        }
        Ok(self.messages.as_deref().unwrap_or_default())
    }
}

impl MessageSource for JsonDumpSource {
    fn source_name(&self) -> &'static str {
        "json-dump"
    }

    fn list_messages(&mut self) -> Result<Vec<MessageRef>> {
        let messages = self.load()?;
        Ok(messages
            .iter()
            .enumerate()
            .map(|(index, message)| MessageRef {
                id: message
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("#{}", index + 1)),
                mailbox: None,
                uid: index as u32,
            })
            .collect())
    }

    fn fetch_message(&mut self, message: &MessageRef) -> Result<RawMessage> {
        let messages = self.load()?;
        let entry = messages
            .get(message.uid as usize)
            .ok_or_else(|| SyncError::MissingMessage(message.id.clone()))?;
        let payload = entry
            .payload
            .as_ref()
            .ok_or_else(|| SyncError::Parse(format!("message {} has no payload", message.id)))?;
        Ok(RawMessage {
            id: message.id.clone(),
            headers: payload
                .headers
                .iter()
                .map(|header| (header.name.clone(), header.value.clone()))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::JsonDumpSource;
    use crate::source::MessageSource;
    use crate::SyncError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn lists_and_fetches_gmail_shaped_messages() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("dump.json");
        fs::write(
            &path,
            r#"{"messages": [
                {"id": "m1", "payload": {"headers": [
                    {"name": "From", "value": "Ada <ada@acme.com>"},
                    {"name": "Subject", "value": "Pricing"}
                ]}},
                {"payload": {"headers": []}}
            ]}"#,
        )
        .expect("write dump");

        let mut source = JsonDumpSource::new(&path);
        let refs = source.list_messages().expect("list");
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].id, "m1");
        assert_eq!(refs[1].id, "#2");

        let message = source.fetch_message(&refs[0]).expect("fetch");
        let observation = message.observation();
        assert_eq!(observation.from_field, "Ada <ada@acme.com>");
        assert_eq!(observation.subject, "Pricing");
    }

    #[test]
    fn message_without_payload_fails_alone() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("dump.json");
        fs::write(&path, r#"[{"id": "broken"}]"#).expect("write dump");

        let mut source = JsonDumpSource::new(&path);
        let refs = source.list_messages().expect("list");
        let err = source.fetch_message(&refs[0]).unwrap_err();
        assert!(matches!(err, SyncError::Parse(_)));
    }

    #[test]
    fn missing_file_fails_listing() {
        let temp = TempDir::new().expect("tempdir");
        let mut source = JsonDumpSource::new(temp.path().join("absent.json"));
        let err = source.list_messages().unwrap_err();
        assert!(matches!(err, SyncError::Io(_)));
    }
}
