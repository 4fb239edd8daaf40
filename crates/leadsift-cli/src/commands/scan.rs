use crate::commands::{print_json, Context};
use crate::error::{invalid_input, not_found};
use anyhow::{anyhow, Context as _, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::{Args, ValueEnum};
use leadsift_config::{EmailAccountConfig, EmailTlsConfig};
use leadsift_core::{ContactAggregator, ContactSummaryDto, PolicyPreset, RecencyMode};
use leadsift_sync::dump::JsonDumpSource;
use leadsift_sync::export::{self, ExportFormat};
use leadsift_sync::imap::{ImapAccount, ImapSource, ImapTls};
use leadsift_sync::known::KnownContacts;
use leadsift_sync::retry::RetryPolicy;
use leadsift_sync::run::{collect, RunReport};
use leadsift_sync::source::MessageSource;
use serde::Serialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Gmail-API-shaped JSON message dump
    #[arg(long, conflicts_with = "account", required_unless_present = "account")]
    pub input: Option<PathBuf>,
    /// IMAP account name from the config file
    #[arg(long)]
    pub account: Option<String>,
    /// business-email or prospect-client
    #[arg(long)]
    pub policy: Option<String>,
    /// chronological or last-processed
    #[arg(long)]
    pub recency: Option<String>,
    #[arg(long)]
    pub days_back: Option<u32>,
    #[arg(long)]
    pub max_messages: Option<usize>,
    /// Addresses to leave out of the export (CSV, JSON or one per line)
    #[arg(long)]
    pub known: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
    pub format: FormatArg,
    /// Output file, or a directory to receive a dated file
    #[arg(long)]
    pub out: Option<PathBuf>,
    #[arg(long)]
    pub min_score: Option<u32>,
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

#[derive(Debug, Serialize)]
struct ScanReport {
    policy: &'static str,
    recency: &'static str,
    min_score: u32,
    run: RunReport,
    below_floor: usize,
    exported: usize,
    format: &'static str,
    output: Option<String>,
    summary: ContactSummaryDto,
}

pub fn scan(ctx: &Context<'_>, args: ScanArgs) -> Result<()> {
    let preset = match args.policy.as_deref() {
        Some(value) => PolicyPreset::parse(value)?,
        None => ctx.config.policy,
    };
    let recency = match args.recency.as_deref() {
        Some(value) => RecencyMode::parse(value)?,
        None => ctx.config.recency,
    };
    if args.days_back == Some(0) {
        return Err(invalid_input("--days-back must be positive"));
    }
    if args.max_messages == Some(0) {
        return Err(invalid_input("--max-messages must be positive"));
    }
    if ctx.json && args.out.is_none() {
        return Err(anyhow!("--json requires --out for scan exports"));
    }

    let account = match args.account.as_deref() {
        Some(name) => Some(
            ctx.config
                .account(name)
                .ok_or_else(|| not_found(format!("email account {name}")))?,
        ),
        None => None,
    };
    let mut policy = match account {
        Some(account) => ctx.config.account_policy(preset, recency, account),
        None => ctx.config.contact_policy(preset, recency),
    }
    .with_context(|| "build contact policy")?;
    if let Some(min_score) = args.min_score {
        policy.scoring.min_score = min_score;
    }
    let min_score = policy.scoring.min_score;

    let known = match args.known.as_deref() {
        Some(path) => {
            let known = KnownContacts::load(path)
                .with_context(|| format!("load known contacts {}", path.display()))?;
            info!("{} known contacts loaded", known.len());
            Some(known)
        }
        None => None,
    };

    let mut source = open_source(ctx, &args, account)?;
    let retry = retry_policy(ctx);
    let mut aggregator = ContactAggregator::new(policy);
    let mut run = collect(source.as_mut(), &mut aggregator, &retry)
        .with_context(|| format!("scan {} messages", source.source_name()))?;

    let selection = export::select(aggregator.ranked(), min_score, known.as_ref(), args.limit);
    run.skipped_known = selection.skipped_known;
    let format = ExportFormat::from(args.format);
    let data = export::render(format, &selection.contacts)?;

    let report = ScanReport {
        policy: preset.as_str(),
        recency: recency.as_str(),
        min_score,
        run,
        below_floor: selection.below_floor,
        exported: selection.contacts.len(),
        format: format.extension(),
        output: None,
        summary: ContactSummaryDto::from_ranked(&selection.contacts),
    };

    match args.out.as_deref() {
        Some(out) => {
            let path = output_path(out, format);
            write_export(&path, &data)?;
            let report = ScanReport {
                output: Some(path.display().to_string()),
                ..report
            };
            if ctx.json {
                return print_json(&report);
            }
            print_summary(&report, &mut std::io::stdout().lock())?;
            println!("Exported {} contacts to {}", report.exported, path.display());
        }
        None => {
            print!("{}", data);
            print_summary(&report, &mut std::io::stderr().lock())?;
        }
    }
    Ok(())
}

fn open_source(
    ctx: &Context<'_>,
    args: &ScanArgs,
    account: Option<&EmailAccountConfig>,
) -> Result<Box<dyn MessageSource>> {
    if let Some(input) = args.input.as_ref() {
        if !input.exists() {
            return Err(not_found(format!("message dump {}", input.display())));
        }
        return Ok(Box::new(JsonDumpSource::new(input)));
    }

    let account =
        account.ok_or_else(|| invalid_input("either --input or --account is required"))?;
    let days_back = args.days_back.unwrap_or(ctx.config.fetch.days_back);
    let max_messages = args.max_messages.unwrap_or(ctx.config.fetch.max_messages);
    let since = since_date(Utc::now(), days_back)?;
    Ok(Box::new(ImapSource::new(
        imap_account(account)?,
        since,
        max_messages,
    )))
}

fn since_date(now: DateTime<Utc>, days_back: u32) -> Result<NaiveDate> {
    Duration::try_days(i64::from(days_back))
        .and_then(|window| now.checked_sub_signed(window))
        .map(|since| since.date_naive())
        .ok_or_else(|| invalid_input(format!("--days-back {days_back} is out of range")))
}

fn imap_account(account: &EmailAccountConfig) -> Result<ImapAccount> {
    let password = env::var(&account.password_env).map_err(|_| {
        invalid_input(format!(
            "missing password env var {} for account {}",
            account.password_env, account.name
        ))
    })?;
    Ok(ImapAccount {
        host: account.host.clone(),
        port: account.port,
        username: account.username.clone(),
        password,
        tls: match account.tls {
            EmailTlsConfig::Tls => ImapTls::Tls,
            EmailTlsConfig::StartTls => ImapTls::StartTls,
            EmailTlsConfig::None => ImapTls::None,
        },
        mailboxes: account.mailboxes.clone(),
    })
}

fn retry_policy(ctx: &Context<'_>) -> RetryPolicy {
    let fetch = &ctx.config.fetch;
    RetryPolicy {
        max_retries: fetch.retry_attempts,
        initial_delay: std::time::Duration::from_millis(fetch.retry_initial_delay_ms),
        backoff_factor: fetch.retry_backoff_factor,
    }
}

fn output_path(out: &Path, format: ExportFormat) -> PathBuf {
    if out.is_dir() {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        out.join(format!("contacts_{stamp}.{}", format.extension()))
    } else {
        out.to_path_buf()
    }
}

fn write_export(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create export directory {}", parent.display()))?;
        }
    }
    fs::write(path, data).with_context(|| format!("write export file {}", path.display()))
}

fn print_summary(report: &ScanReport, out: &mut impl std::io::Write) -> Result<()> {
    let run = &report.run;
    writeln!(
        out,
        "Scanned {} messages from {}: processed {}, failed {}",
        run.listed, run.source, run.processed, run.failed
    )?;
    writeln!(
        out,
        "Contacts: {} found, {} at or below score {}, {} already known, {} exported",
        run.contacts, report.below_floor, report.min_score, run.skipped_known, report.exported
    )?;
    let summary = &report.summary;
    writeln!(
        out,
        "Priority: {} high, {} medium, {} low",
        summary.high, summary.medium, summary.low
    )?;
    writeln!(
        out,
        "Direction: {} inbound only, {} outreach only, {} both",
        summary.inbound_only, summary.outreach_only, summary.both_directions
    )?;
    for entry in &summary.categories {
        writeln!(out, "  {}: {}", entry.category, entry.count)?;
    }
    Ok(())
}
