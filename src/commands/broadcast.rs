//! Broadcast command: search groups, pick targets, send one message to each
//!
//! Anything not given on the command line is asked for interactively.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use super::prompt;
use super::search::{explain_search_error, find_groups, format_groups, RELOGIN_HINT};
use super::selection::parse_selection;
use crate::config::Config;
use crate::dispatch::{BatchReport, DispatchEvent, Dispatcher};
use crate::error::{Error, FailureKind};
use crate::session::{SessionClient, SessionLock, LOCK_FILE};
use crate::weibo::{DirectoryClient, GroupRecord, GroupSender};

/// Broadcast options from the command line.
#[derive(Debug, Clone, Default)]
pub struct BroadcastArgs {
    pub keyword: Option<String>,
    pub select: Option<String>,
    pub message: Option<String>,
    /// Explicit group ids; skips the search step.
    pub groups: Vec<i64>,
    /// Overrides `send_delay` from config.
    pub delay: Option<u64>,
    pub report_csv: Option<PathBuf>,
    pub yes: bool,
}

/// Groups picked for a batch, in send order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Targets {
    pub ids: Vec<i64>,
    names: HashMap<i64, String>,
}

impl Targets {
    fn from_ids(ids: Vec<i64>) -> Self {
        Self {
            ids,
            names: HashMap::new(),
        }
    }

    fn from_groups(groups: &[GroupRecord], indices: &[usize]) -> Self {
        let mut targets = Self::default();
        for &i in indices {
            if let Some(group) = groups.get(i) {
                targets.ids.push(group.id);
                targets.names.insert(group.id, group.name.clone());
            }
        }
        targets
    }

    /// `name (ID: gid)` when the name is known, `ID: gid` otherwise.
    pub fn label(&self, group_id: i64) -> String {
        match self.names.get(&group_id) {
            Some(name) => format!("{} (ID: {})", name, group_id),
            None => format!("ID: {}", group_id),
        }
    }
}

/// Terminal line for a dispatch event.
pub fn describe_event(event: &DispatchEvent<'_>, targets: &Targets) -> String {
    match event {
        DispatchEvent::Sending {
            index,
            total,
            group_id,
        } => format!(
            "[{}/{}] Sending to {}...",
            index + 1,
            total,
            targets.label(*group_id)
        ),
        DispatchEvent::Finished { outcome, .. } => match outcome.failure_ref() {
            None => "  ✅ Sent".to_string(),
            Some(failure) => format!("  ❌ Failed: {}", failure.detail),
        },
        DispatchEvent::Pausing { delay } => {
            format!("  ⏳ Waiting {}s...", delay.as_secs_f64())
        }
        DispatchEvent::Cancelled { remaining } => {
            format!("🛑 Cancelled, {} groups not attempted", remaining)
        }
    }
}

/// Final summary block.
pub fn summarize(report: &BatchReport, targets: &Targets) -> String {
    let mut lines = vec![
        "==============================".to_string(),
        format!(
            "Done: {} succeeded, {} failed (total {})",
            report.succeeded(),
            report.failed(),
            report.total()
        ),
    ];
    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        lines.push("Failed groups:".to_string());
        for outcome in failures {
            let kind = outcome.kind().map(|k| k.as_str()).unwrap_or_default();
            lines.push(format!("  - {} [{}]", targets.label(outcome.group_id), kind));
        }
    }
    lines.join("\n")
}

/// Resolve the target groups: explicit ids, or search + selection.
async fn choose_targets(
    session: &SessionClient,
    config: &Config,
    args: &BroadcastArgs,
) -> Result<Option<Targets>> {
    if !args.groups.is_empty() {
        return Ok(Some(Targets::from_ids(args.groups.clone())));
    }

    let keyword = prompt::value_or_ask(args.keyword.clone(), "Search keyword: ")?;
    if keyword.is_empty() {
        return Err(Error::InvalidArgument("search keyword must not be empty".to_string()).into());
    }

    let directory = DirectoryClient::new(session.clone());
    let groups = find_groups(&directory, &keyword, &config.source)
        .await
        .map_err(explain_search_error)?;

    if groups.is_empty() {
        println!("No groups found for '{}'", keyword);
        return Ok(None);
    }

    println!("Found {} groups:", groups.len());
    println!("{}", format_groups(&groups));

    let raw = prompt::value_or_ask(
        args.select.clone(),
        "Select groups (e.g. 1,2,3 or all): ",
    )?;
    let selection = parse_selection(&raw, groups.len())?;
    for entry in &selection.invalid {
        println!("⚠️  Skipping invalid selection: {}", entry);
    }
    if selection.is_empty() {
        return Err(Error::InvalidArgument("no valid groups selected".to_string()).into());
    }

    Ok(Some(Targets::from_groups(&groups, &selection.indices)))
}

fn effective_delay(config: &Config, override_secs: Option<u64>) -> Duration {
    match override_secs {
        Some(secs) => {
            let mut config = config.clone();
            config.send_delay = i64::try_from(secs).unwrap_or(i64::MAX);
            config.send_delay()
        }
        None => config.send_delay(),
    }
}

/// Lock file kept next to the config, so runs sharing a config are serialized
/// whatever their working directory.
fn lock_path(config_path: &Path) -> PathBuf {
    config_path.with_file_name(LOCK_FILE)
}

fn write_report(report: &BatchReport, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;
    report.write_csv(file)?;
    println!("📄 Report written to {}", path.display());
    Ok(())
}

pub async fn run(config_path: &Path, args: BroadcastArgs) -> Result<()> {
    let config = Config::load(config_path)?;
    let credential = match config.credential() {
        Ok(credential) => credential,
        Err(err @ Error::NotLoggedIn) => {
            println!("🔐 No session stored. Run `weibo_group_sender login` first.");
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    let _lock = SessionLock::acquire_at(lock_path(config_path))?;
    let session = SessionClient::new(&credential)?;

    let Some(targets) = choose_targets(&session, &config, &args).await? else {
        return Ok(());
    };

    let message = prompt::value_or_ask(args.message.clone(), "Message: ")?;
    if message.is_empty() {
        return Err(Error::InvalidArgument("message must not be empty".to_string()).into());
    }

    if !args.yes {
        let question = format!("Send to {} groups? [y/N]: ", targets.ids.len());
        if !prompt::confirm(&question)? {
            println!("Aborted");
            return Ok(());
        }
    }

    let delay = effective_delay(&config, args.delay);
    let dispatcher = Dispatcher::new(GroupSender::new(session), config.source.clone(), delay);

    let token = dispatcher.cancellation_token();
    let ctrl_c = tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            println!("\n🛑 Stopping after the current send...");
            token.cancel();
        }
    });

    info!(targets = targets.ids.len(), "Broadcast confirmed");
    let report = dispatcher
        .dispatch_with(&targets.ids, &message, |event| {
            println!("{}", describe_event(&event, &targets));
        })
        .await;
    ctrl_c.abort();

    println!("{}", summarize(&report, &targets));

    if report
        .failures()
        .any(|o| o.kind() == Some(FailureKind::Unauthorized))
    {
        println!("🔒 {}", RELOGIN_HINT);
    }

    if let Some(path) = args.report_csv.as_deref() {
        if let Err(err) = write_report(&report, path) {
            warn!("Report export failed: {:#}", err);
            return Err(err);
        }
    }

    Ok(())
}
