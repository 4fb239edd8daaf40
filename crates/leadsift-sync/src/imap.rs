use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct ImapAccount {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub tls: ImapTls,
    pub mailboxes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImapTls {
    Tls,
    StartTls,
    None,
}

/// Header-only view of one or more IMAP mailboxes, limited to messages
/// received on or after `since`.
#[cfg_attr(not(feature = "imap-sync"), allow(dead_code))]
pub struct ImapSource {
    account: ImapAccount,
    since: NaiveDate,
    max_messages: usize,
    #[cfg(feature = "imap-sync")]
    session: Option<imp::Session>,
    #[cfg(feature = "imap-sync")]
    selected: Option<String>,
}

impl ImapSource {
    pub fn new(account: ImapAccount, since: NaiveDate, max_messages: usize) -> Self {
        Self {
            account,
            since,
            max_messages,
            #[cfg(feature = "imap-sync")]
            session: None,
            #[cfg(feature = "imap-sync")]
            selected: None,
        }
    }

    pub fn since(&self) -> NaiveDate {
        self.since
    }
}

/// IMAP `SEARCH` date, e.g. `05-Mar-2025`.
pub fn since_criterion(date: NaiveDate) -> String {
    format!("SINCE {}", date.format("%d-%b-%Y"))
}

/// Keeps the newest `limit` UIDs, returned in ascending order.
#[cfg_attr(not(feature = "imap-sync"), allow(dead_code))]
fn newest_uids(mut uids: Vec<u32>, limit: usize) -> Vec<u32> {
    uids.sort_unstable();
    uids.dedup();
    if uids.len() > limit {
        uids.drain(..uids.len() - limit);
    }
    uids
}

#[cfg(feature = "imap-sync")]
mod imp {
    use super::{newest_uids, since_criterion, ImapAccount, ImapSource, ImapTls};
    use crate::error::{Result, SyncError};
    use crate::source::{MessageRef, MessageSource, RawMessage};
    use tracing::debug;

    pub(super) type Session = ::imap::Session<::imap::Connection>;

    const HEADER_QUERY: &str = "BODY.PEEK[HEADER.FIELDS (DATE FROM TO CC SUBJECT)]";

    impl ImapSource {
        fn session(&mut self) -> Result<&mut Session> {
            if self.session.is_none() {
                self.session = Some(connect(&self.account)?);
                self.selected = None;
            }
            self.session
                .as_mut()
                .ok_or_else(|| SyncError::Command("imap session closed".to_string()))
        }

        fn select(&mut self, mailbox: &str) -> Result<()> {
            if self.selected.as_deref() == Some(mailbox) {
                return Ok(());
            }
            let session = self.session()?;
            session
                .select(mailbox)
                .map_err(|err| SyncError::Command(err.to_string()))?;
            self.selected = Some(mailbox.to_string());
            Ok(())
        }

        fn reset(&mut self) {
            if let Some(mut session) = self.session.take() {
                let _ = session.logout();
            }
            self.selected = None;
        }
    }

    impl MessageSource for ImapSource {
        fn source_name(&self) -> &'static str {
            "imap"
        }

        fn list_messages(&mut self) -> Result<Vec<MessageRef>> {
            let criterion = since_criterion(self.since);
            let mut refs = Vec::new();
            for mailbox in self.account.mailboxes.clone() {
                self.select(&mailbox)?;
                let session = self.session()?;
                let uids = session
                    .uid_search(&criterion)
                    .map_err(|err| SyncError::Command(err.to_string()))?;
                let remaining = self.max_messages.saturating_sub(refs.len());
                let uids = newest_uids(uids.into_iter().collect(), remaining);
                debug!(mailbox = %mailbox, count = uids.len(), "listed imap messages");
                refs.extend(uids.into_iter().map(|uid| MessageRef {
                    id: format!("{mailbox}:{uid}"),
                    mailbox: Some(mailbox.clone()),
                    uid,
                }));
                if refs.len() >= self.max_messages {
                    break;
                }
            }
            Ok(refs)
        }

        fn fetch_message(&mut self, message: &MessageRef) -> Result<RawMessage> {
            let mailbox = message
                .mailbox
                .clone()
                .unwrap_or_else(|| "INBOX".to_string());
            let result = self.fetch_headers(&mailbox, message);
            if matches!(result, Err(SyncError::Command(_))) {
                // Reconnect on the next attempt.
                self.reset();
            }
            result
        }
    }

    impl ImapSource {
        fn fetch_headers(&mut self, mailbox: &str, message: &MessageRef) -> Result<RawMessage> {
            self.select(mailbox)?;
            let session = self.session()?;
            let fetches = session
                .uid_fetch(message.uid.to_string(), HEADER_QUERY)
                .map_err(|err| SyncError::Command(err.to_string()))?;
            let fetch = fetches
                .iter()
                .find(|fetch| fetch.uid == Some(message.uid))
                .ok_or_else(|| SyncError::MissingMessage(message.id.clone()))?;
            let header_bytes = fetch
                .header()
                .ok_or_else(|| SyncError::Parse(format!("message {} has no headers", message.id)))?;
            let (parsed, _) = mailparse::parse_headers(header_bytes)
                .map_err(|err| SyncError::Parse(format!("mail header parse: {err}")))?;
            Ok(RawMessage {
                id: message.id.clone(),
                headers: parsed
                    .iter()
                    .map(|header| (header.get_key(), header.get_value()))
                    .collect(),
            })
        }
    }

    impl Drop for ImapSource {
        fn drop(&mut self) {
            self.reset();
        }
    }

    fn connect(account: &ImapAccount) -> Result<Session> {
        let mode = match account.tls {
            ImapTls::Tls => ::imap::ConnectionMode::Tls,
            ImapTls::StartTls => ::imap::ConnectionMode::StartTls,
            ImapTls::None => ::imap::ConnectionMode::Plaintext,
        };
        let client = ::imap::ClientBuilder::new(account.host.as_str(), account.port)
            .mode(mode)
            .connect()
            .map_err(|err| SyncError::Command(err.to_string()))?;
        let session = client
            .login(&account.username, &account.password)
            .map_err(|err| SyncError::Command(err.0.to_string()))?;
        Ok(session)
    }
}

#[cfg(not(feature = "imap-sync"))]
impl crate::source::MessageSource for ImapSource {
    fn source_name(&self) -> &'static str {
        "imap"
    }

    fn list_messages(&mut self) -> crate::error::Result<Vec<crate::source::MessageRef>> {
        Err(crate::error::SyncError::Unavailable(
            "imap sources require the imap-sync feature".to_string(),
        ))
    }

    fn fetch_message(
        &mut self,
        _message: &crate::source::MessageRef,
    ) -> crate::error::Result<crate::source::RawMessage> {
        Err(crate::error::SyncError::Unavailable(
            "imap sources require the imap-sync feature".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{newest_uids, since_criterion};
    use chrono::NaiveDate;

    #[test]
    fn since_uses_imap_date_format() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 5).expect("date");
        assert_eq!(since_criterion(date), "SINCE 05-Mar-2025");
    }

    #[test]
    fn newest_uids_keeps_the_tail() {
        assert_eq!(newest_uids(vec![9, 3, 7, 3, 1], 2), vec![7, 9]);
        assert_eq!(newest_uids(vec![2, 1], 5), vec![1, 2]);
        assert!(newest_uids(vec![4], 0).is_empty());
    }
}
