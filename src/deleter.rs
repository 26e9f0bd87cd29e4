//! Search-then-delete control loop
//!
//! Each iteration fetches up to [`PAGES_PER_BATCH`] search pages, deletes the
//! merged ids in a single batch call and follows the last page token. The run
//! ends only when a batch carries no further page token; an empty batch with a
//! token keeps going.

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::client::{MailClient, PAGES_PER_BATCH};
use crate::error::Result;
use crate::models::{DeletionPlan, SearchFilter, SearchPage};
use crate::retry::{retry_until_success, RetryPolicy, Sleeper, TokioSleeper};

/// Callbacks fired while a delete run progresses
pub trait DeletionObserver: Send + Sync {
    /// A batch of `count` messages is about to be deleted
    fn on_page_deleting(&self, count: usize);

    /// Running total after a batch delete succeeded
    fn on_progress(&self, deleted_so_far: u64);

    /// A delete attempt failed and will be retried
    fn on_retryable_error(&self, message: &str, at: DateTime<Local>);

    /// The run finished
    fn on_complete(&self, total_deleted: u64);
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DeletionObserver for NoopObserver {
    fn on_page_deleting(&self, _count: usize) {}
    fn on_progress(&self, _deleted_so_far: u64) {}
    fn on_retryable_error(&self, _message: &str, _at: DateTime<Local>) {}
    fn on_complete(&self, _total_deleted: u64) {}
}

/// Drives search and deletion to completion for one plan
pub struct MessageDeleter<C, S = TokioSleeper> {
    client: C,
    retry: RetryPolicy,
    sleeper: S,
}

impl<C: MailClient> MessageDeleter<C> {
    pub fn new(client: C, retry: RetryPolicy) -> Self {
        Self {
            client,
            retry,
            sleeper: TokioSleeper,
        }
    }
}

impl<C: MailClient, S: Sleeper> MessageDeleter<C, S> {
    /// Replace the sleeper used between delete retries
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> MessageDeleter<C, T> {
        MessageDeleter {
            client: self.client,
            retry: self.retry,
            sleeper,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetch one delete batch worth of results starting at `page_token`
    ///
    /// Search errors are returned as-is; only deletes are retried.
    pub async fn fetch_batch(
        &self,
        filter: &SearchFilter,
        page_token: Option<String>,
    ) -> Result<SearchPage> {
        let mut batch = self.client.search_page(filter, page_token).await?;
        let mut pages = 1;

        while pages < PAGES_PER_BATCH {
            let Some(token) = batch.next_page_token.clone() else {
                break;
            };
            let next = self.client.search_page(filter, Some(token)).await?;
            batch.merge(next);
            pages += 1;
        }

        debug!(
            "Fetched {} messages across {} page(s), more results: {}",
            batch.len(),
            pages,
            !batch.is_last()
        );
        Ok(batch)
    }

    /// Delete every message matching the plan's filter
    ///
    /// Counting starts from zero for every run; `plan.deleted` is updated
    /// after each successful batch delete, so it stays accurate when a search
    /// fails part way. Returns the number of messages deleted by this run.
    pub async fn run<O>(&self, plan: &mut DeletionPlan, observer: &O) -> Result<u64>
    where
        O: DeletionObserver + ?Sized,
    {
        info!(
            "Starting delete run (labels: {}, query: {:?})",
            plan.filter.label_ids().count(),
            plan.filter.query()
        );

        let mut page_token: Option<String> = None;
        let mut total: u64 = 0;
        plan.deleted = 0;

        loop {
            let batch = self.fetch_batch(&plan.filter, page_token.take()).await?;

            if !batch.is_empty() {
                let ids = batch.message_ids();
                observer.on_page_deleting(ids.len());

                let failures = retry_until_success(
                    &self.retry,
                    &self.sleeper,
                    observer,
                    "messages.batchDelete",
                    || self.client.batch_delete(&ids),
                )
                .await;
                if failures > 0 {
                    info!("Batch of {} deleted after {} retries", ids.len(), failures);
                }

                total += ids.len() as u64;
                plan.deleted = total;
                observer.on_progress(total);
            }

            match batch.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!("Delete run complete: {} messages deleted", total);
        observer.on_complete(total);
        Ok(total)
    }
}
