use anyhow::Result;
use clap::Parser;
use gmail_message_deleter::cli::{self, Cli, Commands, DeleteArgs};
use gmail_message_deleter::config::Config;
use gmail_message_deleter::error::DeleterError;
use indicatif::MultiProgress;
use std::io::Write;
use std::process;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// A writer that prints through MultiProgress to avoid progress bar conflicts
#[derive(Clone)]
struct MultiProgressWriter {
    multi: MultiProgress,
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MultiProgressWriter {
    fn new(multi: MultiProgress) -> Self {
        Self {
            multi,
            buffer: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Write for MultiProgressWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut buffer = self
            .buffer
            .lock()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "log buffer poisoned"))?;
        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut buffer = self
            .buffer
            .lock()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "log buffer poisoned"))?;
        if !buffer.is_empty() {
            let msg = String::from_utf8_lossy(&buffer);
            let msg = msg.trim_end_matches('\n');
            if !msg.is_empty() {
                let _ = self.multi.println(msg);
            }
            buffer.clear();
        }
        Ok(())
    }
}

impl Drop for MultiProgressWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// MakeWriter implementation for tracing
#[derive(Clone)]
struct MultiProgressMakeWriter {
    multi: MultiProgress,
}

impl<'a> MakeWriter<'a> for MultiProgressMakeWriter {
    type Writer = MultiProgressWriter;

    fn make_writer(&'a self) -> Self::Writer {
        MultiProgressWriter::new(self.multi.clone())
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        if let Some(DeleterError::OperationCancelled(_)) = e.downcast_ref::<DeleterError>() {
            eprintln!("Cancelled. No messages were deleted.");
            process::exit(0);
        }
        display_error(&e);
        eprintln!("\nFor help, run: gmail-deleter --help");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Several dependencies pull in rustls; pick the crypto provider explicitly
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_message_deleter=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_message_deleter=warn,error"))
    };

    // Logs print above the spinner instead of tearing it
    let multi_progress = MultiProgress::new();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(MultiProgressMakeWriter {
            multi: multi_progress.clone(),
        })
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    tracing::debug!("gmail-deleter starting");

    match &cli.command {
        Commands::Auth { force } => {
            let user = cli::run_auth(&cli, *force).await?;
            println!("Successfully authenticated with Gmail API");
            println!("Token cached at: {:?}", cli.token_cache);
            println!("Connected to account: {}", user);
            Ok(())
        }

        Commands::Labels => {
            cli::run_labels(&cli).await?;
            Ok(())
        }

        Commands::Delete {
            labels,
            query,
            all,
            yes,
        } => {
            let args = DeleteArgs {
                labels: labels.clone(),
                query: query.clone(),
                all: *all,
                yes: *yes,
            };
            cli::run_delete(&cli, args, multi_progress).await?;
            Ok(())
        }

        Commands::InitConfig { output, force } => {
            if output.exists() && !force {
                return Err(DeleterError::ConfigError(format!(
                    "Configuration file already exists at {:?}. Use --force to overwrite.",
                    output
                ))
                .into());
            }

            Config::create_example(output).await?;

            println!("Created example configuration file at: {:?}", output);
            println!("Key settings:");
            println!("  - retry.initial_backoff_ms: first delay before retrying a failed delete");
            println!("  - api.request_timeout_secs: upper bound for a single Gmail API call");
            Ok(())
        }
    }
}

/// Display error with context
fn display_error(error: &anyhow::Error) {
    eprintln!("Error: {}", error);

    let mut cause = error.source();
    while let Some(e) = cause {
        eprintln!("  Caused by: {}", e);
        cause = e.source();
    }

    if let Some(deleter_err) = error.downcast_ref::<DeleterError>() {
        match deleter_err {
            DeleterError::AuthError(_) => {
                eprintln!("\nHint: Make sure your OAuth client file is a valid \"Desktop app\" client");
                eprintln!("      with the https://mail.google.com/ scope enabled.");
                eprintln!("      Try running: gmail-deleter auth --force");
            }
            DeleterError::Unauthorized(_) => {
                eprintln!("\nHint: Gmail no longer accepts the cached token.");
                eprintln!("      Run: gmail-deleter auth --force");
            }
            DeleterError::LabelNotFound(_) => {
                eprintln!("\nHint: Run `gmail-deleter labels` to see the available label names.");
            }
            DeleterError::ConfigError(_) => {
                eprintln!("\nHint: Check your configuration file and command-line flags.");
                eprintln!("      Run: gmail-deleter init-config --force");
            }
            e if e.is_remote() => {
                eprintln!("\nHint: The Gmail API call failed; nothing after the last reported batch was deleted.");
                eprintln!("      Run the same command again to continue.");
            }
            _ => {}
        }
    }
}
