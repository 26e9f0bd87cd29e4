//! Command-line interface

use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::auth;
use crate::client::{MailClient, ProductionMailClient};
use crate::config::Config;
use crate::deleter::{DeletionObserver, MessageDeleter};
use crate::error::{DeleterError, Result};
use crate::models::{DeletionPlan, SearchFilter};
use crate::prompt::{self, FilterKind};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Parser, Debug)]
#[command(name = "gmail-deleter")]
#[command(version)]
#[command(about = "Bulk-delete Gmail messages by label and/or search query", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "gmail-deleter.toml")]
    pub config: PathBuf,

    /// Path to the OAuth2 client credentials file ("Desktop app" client)
    #[arg(long, default_value = "oauth-client-credentials.json")]
    pub credentials: PathBuf,

    /// Path to token cache file
    #[arg(long, default_value = "token.json")]
    pub token_cache: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate with Gmail API
    Auth {
        /// Force re-authentication even if token exists
        #[arg(long)]
        force: bool,
    },

    /// List the labels in the account
    Labels,

    /// Permanently delete messages (prompts for filters when none are given)
    Delete {
        /// Delete messages carrying this label (repeatable; all labels must match)
        #[arg(long = "label", value_name = "NAME")]
        labels: Vec<String>,

        /// Delete messages matching this Gmail search query
        #[arg(short, long)]
        query: Option<String>,

        /// Delete every message in the account
        #[arg(long, conflicts_with_all = ["labels", "query"])]
        all: bool,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Generate example configuration file
    InitConfig {
        /// Path to create config file
        #[arg(short, long, default_value = "gmail-deleter.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

/// Progress reporter using indicatif
pub struct ProgressReporter {
    multi: MultiProgress,
    spinner_style: ProgressStyle,
}

impl ProgressReporter {
    /// Share an existing MultiProgress (the one tracing writes through)
    pub fn with_multi_progress(multi: MultiProgress) -> Self {
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.blue} [{elapsed:>6}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");

        Self {
            multi,
            spinner_style,
        }
    }

    pub fn multi_progress(&self) -> &MultiProgress {
        &self.multi
    }

    pub fn add_spinner(&self, msg: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(self.spinner_style.clone());
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Finish a spinner and clear it from the multi-progress display
    pub fn finish_spinner(&self, pb: &ProgressBar, msg: &str) {
        pb.finish_and_clear();
        self.println(format!("  ✓ {}", msg));
    }

    pub fn println<S: AsRef<str>>(&self, msg: S) {
        let _ = self.multi.println(msg);
    }

    pub fn print_plan(&self, plan: &DeletionPlan) {
        self.println("");
        for line in plan.describe() {
            if line.starts_with("Warning!") {
                self.println("");
                self.println(line.red().bold().to_string());
            } else {
                self.println(line);
            }
        }
        self.println("");
    }
}

/// Renders delete-run events as log lines above a running-total spinner
pub struct ConsoleObserver {
    multi: MultiProgress,
    status: ProgressBar,
}

impl ConsoleObserver {
    pub fn new(reporter: &ProgressReporter) -> Self {
        let status = reporter.add_spinner("Searching for messages...");
        Self {
            multi: reporter.multi_progress().clone(),
            status,
        }
    }
}

// Clears the spinner when a run ends with an error instead of on_complete
impl Drop for ConsoleObserver {
    fn drop(&mut self) {
        if !self.status.is_finished() {
            self.status.finish_and_clear();
        }
    }
}

impl DeletionObserver for ConsoleObserver {
    fn on_page_deleting(&self, count: usize) {
        let stamp = format!("{}:", Local::now().format(TIMESTAMP_FORMAT));
        let _ = self.multi.println(format!(
            "{} Deleting {} messages{}",
            stamp.grey(),
            count.to_string().green(),
            "...".grey()
        ));
    }

    fn on_progress(&self, deleted_so_far: u64) {
        self.status
            .set_message(format!("Total deleted so far: {} messages", deleted_so_far));
    }

    fn on_retryable_error(&self, message: &str, at: DateTime<Local>) {
        let prefix = format!("{}: Received error:", at.format(TIMESTAMP_FORMAT));
        let _ = self
            .multi
            .println(format!("{} {}", prefix.red(), message));
    }

    fn on_complete(&self, total_deleted: u64) {
        self.status.finish_and_clear();
        let _ = self.multi.println(
            format!("Done! Deleted {} messages", total_deleted)
                .blue()
                .bold()
                .to_string(),
        );
    }
}

/// Authenticate (optionally discarding the cached token) and report the account
pub async fn run_auth(cli: &Cli, force: bool) -> Result<String> {
    let config = Config::load(&cli.config).await?;

    if force {
        auth::clear_token_cache(&cli.token_cache).await?;
    }

    let hub = auth::initialize_gmail_hub(&cli.credentials, &cli.token_cache).await?;
    let client = ProductionMailClient::new(hub, config.api.request_timeout());
    client.current_user_email().await
}

/// Print every label, sorted by name
pub async fn run_labels(cli: &Cli) -> Result<()> {
    let config = Config::load(&cli.config).await?;
    let hub = auth::initialize_gmail_hub(&cli.credentials, &cli.token_cache).await?;
    let client = ProductionMailClient::new(hub, config.api.request_timeout());

    let labels = prompt::sorted_labels(&client.list_labels().await?);
    let width = labels.iter().map(|l| l.name.chars().count()).max().unwrap_or(0);
    for label in &labels {
        println!("{:<width$}  {}", label.name, label.id, width = width);
    }
    info!("Listed {} labels", labels.len());
    Ok(())
}

/// Filters given on the command line for `delete`
#[derive(Debug, Clone, Default)]
pub struct DeleteArgs {
    pub labels: Vec<String>,
    pub query: Option<String>,
    pub all: bool,
    pub yes: bool,
}

impl DeleteArgs {
    /// No filter flags at all means the user is asked interactively
    pub fn is_interactive(&self) -> bool {
        self.labels.is_empty() && self.query.is_none() && !self.all
    }
}

/// Run the delete command end to end; returns the number of deleted messages
pub async fn run_delete(cli: &Cli, args: DeleteArgs, multi: MultiProgress) -> Result<u64> {
    let config = Config::load(&cli.config).await?;
    let reporter = ProgressReporter::with_multi_progress(multi);

    let auth_spinner = reporter.add_spinner("Authenticating with Gmail API...");
    let hub = auth::initialize_gmail_hub(&cli.credentials, &cli.token_cache).await;
    let hub = match hub {
        Ok(hub) => hub,
        Err(e) => {
            auth_spinner.finish_and_clear();
            return Err(e);
        }
    };
    reporter.finish_spinner(&auth_spinner, "Gmail API authenticated");

    let client = ProductionMailClient::new(hub, config.api.request_timeout());
    let user = client.current_user_email().await?;
    reporter.println("");
    reporter.println(format!("Logged in as user: {}", user));
    reporter.println("");

    let deleter = MessageDeleter::new(client, config.retry.policy());
    let interactive = args.is_interactive();

    let mut plan = loop {
        let plan = if interactive {
            prompt_for_plan(deleter.client(), reporter.multi_progress()).await?
        } else {
            plan_from_args(deleter.client(), &args).await?
        };

        reporter.print_plan(&plan);

        if args.yes || reporter.multi_progress().suspend(prompt::confirm_deletion)? {
            break plan;
        }
        if !interactive {
            reporter.println("Aborted. No messages were deleted.");
            return Ok(0);
        }
    };

    let observer = ConsoleObserver::new(&reporter);
    let total = deleter.run(&mut plan, &observer).await?;

    reporter.println("Successfully deleted messages.");
    Ok(total)
}

/// Ask the user for filter kinds, labels and query
pub async fn prompt_for_plan<C>(client: &C, multi: &MultiProgress) -> Result<DeletionPlan>
where
    C: MailClient + ?Sized,
{
    let kinds = multi.suspend(prompt::prompt_filter_kinds)?;

    let labels = if kinds.contains(&FilterKind::Label) {
        let available = client.list_labels().await?;
        multi.suspend(|| prompt::prompt_labels(&available))?
    } else {
        Vec::new()
    };

    let query = if kinds.contains(&FilterKind::SearchQuery) {
        Some(multi.suspend(prompt::prompt_search_query)?)
    } else {
        None
    };

    Ok(DeletionPlan::from_selection(&labels, query.as_deref()))
}

/// Build a plan from command-line filters
///
/// Label names are resolved against the account's labels. Deleting without
/// any filter requires `--all`.
pub async fn plan_from_args<C>(client: &C, args: &DeleteArgs) -> Result<DeletionPlan>
where
    C: MailClient + ?Sized,
{
    if args.all {
        return Ok(DeletionPlan::new(SearchFilter::match_all()));
    }

    let labels = if args.labels.is_empty() {
        Vec::new()
    } else {
        prompt::resolve_label_names(&client.list_labels().await?, &args.labels)?
    };

    let plan = DeletionPlan::from_selection(&labels, args.query.as_deref());
    if plan.filter.is_match_all() {
        return Err(DeleterError::ConfigError(
            "No filter given; pass --label, a non-empty --query, or --all to delete everything"
                .to_string(),
        ));
    }

    Ok(plan)
}
