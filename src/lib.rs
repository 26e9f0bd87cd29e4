//! Gmail Message Deleter
//!
//! Bulk-deletes Gmail messages selected by label and/or search query.
//!
//! # Overview
//!
//! - **Authentication**: OAuth2 installed-app flow with a cached refresh token
//! - **Client**: the four Gmail API calls the tool needs, behind [`MailClient`]
//! - **Deleter**: search two pages at a time, delete them in one batch, follow
//!   the page token until the results run out
//! - **Retry**: failed deletes are retried forever with doubling backoff
//! - **Prompts**: interactive selection of labels, query and confirmation
//!
//! # Example Usage
//!
//! ```no_run
//! use gmail_message_deleter::{
//!     auth, client::ProductionMailClient, config::Config, DeletionPlan, MessageDeleter,
//!     NoopObserver, SearchFilter,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("gmail-deleter.toml".as_ref()).await?;
//!     let hub = auth::initialize_gmail_hub(
//!         "oauth-client-credentials.json".as_ref(),
//!         "token.json".as_ref(),
//!     )
//!     .await?;
//!
//!     let client = ProductionMailClient::new(hub, config.api.request_timeout());
//!     let deleter = MessageDeleter::new(client, config.retry.policy());
//!
//!     let mut plan = DeletionPlan::new(SearchFilter::default().with_query("older_than:5y"));
//!     let deleted = deleter.run(&mut plan, &NoopObserver).await?;
//!     println!("Deleted {} messages", deleted);
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`] - OAuth2 authentication and Gmail API initialization
//! - [`client`] - Gmail API client trait and production implementation
//! - [`cli`] - Command-line interface and console rendering
//! - [`config`] - Configuration management
//! - [`deleter`] - Search-delete control loop and its observer
//! - [`error`] - Error types and result aliases
//! - [`models`] - Core data structures
//! - [`prompt`] - Interactive prompts
//! - [`retry`] - Exponential backoff for deletes

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod deleter;
pub mod error;
pub mod models;
pub mod prompt;
pub mod retry;

pub use error::{DeleterError, Result};

pub use models::{DeletionPlan, Label, MessageRef, SearchFilter, SearchPage};

pub use client::{
    MailClient, ProductionMailClient, BATCH_DELETE_LIMIT, PAGES_PER_BATCH, SEARCH_PAGE_SIZE,
};

pub use deleter::{DeletionObserver, MessageDeleter, NoopObserver};

pub use retry::{RetryPolicy, Sleeper, TokioSleeper};

pub use config::Config;
