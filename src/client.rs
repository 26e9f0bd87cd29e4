//! Gmail API client exposing the four calls the deleter needs

use async_trait::async_trait;
use google_gmail1::api::BatchDeleteMessagesRequest;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::{GmailHub, MAIL_SCOPE};
use crate::error::{DeleterError, Result};
use crate::models::{Label, MessageRef, SearchFilter, SearchPage};

/// Maximum results Gmail returns per messages.list page
pub const SEARCH_PAGE_SIZE: u32 = 500;

/// Maximum ids accepted by a single messages.batchDelete call
pub const BATCH_DELETE_LIMIT: usize = 1000;

/// Search pages merged into one delete batch
pub const PAGES_PER_BATCH: usize = BATCH_DELETE_LIMIT / SEARCH_PAGE_SIZE as usize;

/// Operations against the remote mailbox
#[async_trait]
pub trait MailClient: Send + Sync {
    /// List all labels in the account
    async fn list_labels(&self) -> Result<Vec<Label>>;

    /// Email address of the authenticated account
    async fn current_user_email(&self) -> Result<String>;

    /// Fetch one page of messages matching the filter, starting at `page_token`
    async fn search_page(
        &self,
        filter: &SearchFilter,
        page_token: Option<String>,
    ) -> Result<SearchPage>;

    /// Permanently delete the given messages in one call
    ///
    /// An empty id list succeeds without contacting the server.
    async fn batch_delete(&self, message_ids: &[String]) -> Result<()>;
}

/// Gmail client backed by the google-gmail1 hub
pub struct ProductionMailClient {
    hub: GmailHub,
    request_timeout: Duration,
}

impl ProductionMailClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `hub` - Authenticated Gmail API hub
    /// * `request_timeout` - Upper bound for any single API call
    pub fn new(hub: GmailHub, request_timeout: Duration) -> Self {
        Self {
            hub,
            request_timeout,
        }
    }

    /// Run an API call under the configured timeout
    async fn with_timeout<T, Fut>(&self, operation_name: &str, call: Fut) -> Result<T>
    where
        Fut: Future<Output = std::result::Result<T, google_gmail1::Error>>,
    {
        debug!("Calling Gmail API: {}", operation_name);
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => {
                debug!("Gmail API {} call completed", operation_name);
                result.map_err(DeleterError::from)
            }
            Err(_) => {
                warn!(
                    "Gmail API {} call timed out after {:?}",
                    operation_name, self.request_timeout
                );
                Err(DeleterError::NetworkError(format!(
                    "API call timed out after {:?}",
                    self.request_timeout
                )))
            }
        }
    }
}

#[async_trait]
impl MailClient for ProductionMailClient {
    async fn list_labels(&self) -> Result<Vec<Label>> {
        let call = self
            .hub
            .users()
            .labels_list("me")
            .add_scope(MAIL_SCOPE)
            .doit();
        let (_, response) = self.with_timeout("labels.list", call).await?;

        let labels: Vec<Label> = response
            .labels
            .unwrap_or_default()
            .into_iter()
            .filter_map(|label| match (label.id, label.name) {
                (Some(id), Some(name)) => Some(Label { id, name }),
                _ => None,
            })
            .collect();

        debug!("Successfully parsed {} labels", labels.len());
        Ok(labels)
    }

    async fn current_user_email(&self) -> Result<String> {
        let call = self
            .hub
            .users()
            .get_profile("me")
            .add_scope(MAIL_SCOPE)
            .doit();
        let (_, profile) = self.with_timeout("getProfile", call).await?;

        profile
            .email_address
            .ok_or_else(|| DeleterError::InvalidResponse("Profile has no email address".to_string()))
    }

    async fn search_page(
        &self,
        filter: &SearchFilter,
        page_token: Option<String>,
    ) -> Result<SearchPage> {
        let mut call = self
            .hub
            .users()
            .messages_list("me")
            .max_results(SEARCH_PAGE_SIZE);

        if let Some(query) = filter.query() {
            call = call.q(query);
        }
        for label_id in filter.label_ids() {
            call = call.add_label_ids(label_id);
        }
        if let Some(token) = page_token.as_deref() {
            call = call.page_token(token);
        }

        let (_, response) = self
            .with_timeout("messages.list", call.add_scope(MAIL_SCOPE).doit())
            .await?;

        let messages: Vec<MessageRef> = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|msg| msg.id.map(MessageRef::new))
            .collect();

        debug!(
            "Search page returned {} messages (more: {})",
            messages.len(),
            response.next_page_token.is_some()
        );

        Ok(SearchPage::new(messages, response.next_page_token))
    }

    async fn batch_delete(&self, message_ids: &[String]) -> Result<()> {
        if message_ids.is_empty() {
            return Ok(());
        }

        let request = BatchDeleteMessagesRequest {
            ids: Some(message_ids.to_vec()),
        };
        let call = self
            .hub
            .users()
            .messages_batch_delete(request, "me")
            .add_scope(MAIL_SCOPE)
            .doit();
        self.with_timeout("messages.batchDelete", call).await?;

        debug!("Deleted batch of {} messages", message_ids.len());
        Ok(())
    }
}

// Implement MailClient for Arc<T> to allow shared ownership
#[async_trait]
impl<T: MailClient + ?Sized> MailClient for Arc<T> {
    async fn list_labels(&self) -> Result<Vec<Label>> {
        self.as_ref().list_labels().await
    }

    async fn current_user_email(&self) -> Result<String> {
        self.as_ref().current_user_email().await
    }

    async fn search_page(
        &self,
        filter: &SearchFilter,
        page_token: Option<String>,
    ) -> Result<SearchPage> {
        self.as_ref().search_page(filter, page_token).await
    }

    async fn batch_delete(&self, message_ids: &[String]) -> Result<()> {
        self.as_ref().batch_delete(message_ids).await
    }
}
