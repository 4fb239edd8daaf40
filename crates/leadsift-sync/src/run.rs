use leadsift_core::ContactAggregator;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::source::MessageSource;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub source: String,
    pub listed: usize,
    pub processed: usize,
    pub failed: usize,
    pub observations: usize,
    pub contacts: usize,
    pub skipped_known: usize,
}

/// Folds every message of `source` into `aggregator`.
///
/// A listing failure aborts the run. A message that still fails after the
/// retry policy is logged with its position and skipped.
pub fn collect<S>(
    source: &mut S,
    aggregator: &mut ContactAggregator,
    retry: &RetryPolicy,
) -> Result<RunReport>
where
    S: MessageSource + ?Sized,
{
    let name = source.source_name();
    let refs = source.list_messages()?;
    info!("{name}: {} messages listed", refs.len());

    let mut report = RunReport {
        source: name.to_string(),
        listed: refs.len(),
        ..RunReport::default()
    };

    for (index, message) in refs.iter().enumerate() {
        let label = format!("{name} message {}", message.id);
        match retry.run(&label, || source.fetch_message(message)) {
            Ok(raw) => {
                let added = aggregator.ingest(&raw.observation());
                debug!("{label}: {added} observations");
                report.observations += added;
                report.processed += 1;
            }
            Err(err) => {
                warn!("skipping message {} ({}): {err}", index + 1, message.id);
                report.failed += 1;
            }
        }
    }

    report.contacts = aggregator.len();
    Ok(report)
}
