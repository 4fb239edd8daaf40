use crate::Result;
use leadsift_core::MessageObservation;

/// Handle to one message inside a source, cheap to list in bulk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub id: String,
    pub mailbox: Option<String>,
    /// Source-local locator: the IMAP UID, or the position in a dump file.
    pub uid: u32,
}

/// Header name/value pairs of a fetched message, in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMessage {
    pub id: String,
    pub headers: Vec<(String, String)>,
}

impl RawMessage {
    pub fn observation(&self) -> MessageObservation {
        MessageObservation::from_headers(
            self.headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        )
    }
}

pub trait MessageSource {
    fn source_name(&self) -> &'static str;
    fn list_messages(&mut self) -> Result<Vec<MessageRef>>;
    fn fetch_message(&mut self, message: &MessageRef) -> Result<RawMessage>;
}
