//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Local};
use gmail_message_deleter::client::MailClient;
use gmail_message_deleter::deleter::DeletionObserver;
use gmail_message_deleter::error::{DeleterError, Result};
use gmail_message_deleter::models::{Label, MessageRef, SearchFilter, SearchPage};
use gmail_message_deleter::retry::Sleeper;
use mockall::mock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Create a page of `count` messages with ids `{prefix}{n}`
pub fn make_page(prefix: &str, count: usize, next_page_token: Option<&str>) -> SearchPage {
    SearchPage::new(
        (0..count)
            .map(|i| MessageRef::new(format!("{}{}", prefix, i)))
            .collect(),
        next_page_token.map(String::from),
    )
}

pub fn create_test_label(id: &str, name: &str) -> Label {
    Label::new(id, name)
}

// Mock implementation of MailClient for testing
mock! {
    pub MailClient {}

    #[async_trait::async_trait]
    impl MailClient for MailClient {
        async fn list_labels(&self) -> Result<Vec<Label>>;
        async fn current_user_email(&self) -> Result<String>;
        async fn search_page(
            &self,
            filter: &SearchFilter,
            page_token: Option<String>,
        ) -> Result<SearchPage>;
        async fn batch_delete(&self, message_ids: &[String]) -> Result<()>;
    }
}

/// Sleeper that records requested delays and returns immediately
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObservedEvent {
    PageDeleting(usize),
    Progress(u64),
    RetryableError(String),
    Complete(u64),
}

/// Observer that keeps every event in order
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
    error_times: Mutex<Vec<DateTime<Local>>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn retry_messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObservedEvent::RetryableError(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn error_times(&self) -> Vec<DateTime<Local>> {
        self.error_times.lock().unwrap().clone()
    }
}

impl DeletionObserver for RecordingObserver {
    fn on_page_deleting(&self, count: usize) {
        self.events.lock().unwrap().push(ObservedEvent::PageDeleting(count));
    }

    fn on_progress(&self, deleted_so_far: u64) {
        self.events.lock().unwrap().push(ObservedEvent::Progress(deleted_so_far));
    }

    fn on_retryable_error(&self, message: &str, at: DateTime<Local>) {
        self.events
            .lock()
            .unwrap()
            .push(ObservedEvent::RetryableError(message.to_string()));
        self.error_times.lock().unwrap().push(at);
    }

    fn on_complete(&self, total_deleted: u64) {
        self.events.lock().unwrap().push(ObservedEvent::Complete(total_deleted));
    }
}

#[derive(Debug, Clone)]
struct StoredMessage {
    id: String,
    labels: HashSet<String>,
    terms: HashSet<String>,
    deleted: bool,
}

/// In-memory mailbox modelling search and delete as a plain store
///
/// Queries match a message when the message was stored with that exact
/// term. Page tokens are positions in insertion order, so deleting earlier
/// results does not shift later pages.
pub struct FakeMailbox {
    messages: Mutex<Vec<StoredMessage>>,
    labels: Vec<Label>,
    page_size: usize,
    failing_deletes: AtomicU32,
    search_calls: AtomicUsize,
    delete_calls: Mutex<Vec<Vec<String>>>,
}

impl FakeMailbox {
    pub fn new(page_size: usize) -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            labels: Vec::new(),
            page_size,
            failing_deletes: AtomicU32::new(0),
            search_calls: AtomicUsize::new(0),
            delete_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_labels(mut self, labels: Vec<Label>) -> Self {
        self.labels = labels;
        self
    }

    /// Store `count` messages carrying the given labels and query terms
    pub fn add_messages(&self, prefix: &str, count: usize, labels: &[&str], terms: &[&str]) {
        let mut messages = self.messages.lock().unwrap();
        for i in 0..count {
            messages.push(StoredMessage {
                id: format!("{}{}", prefix, i),
                labels: labels.iter().map(|l| l.to_string()).collect(),
                terms: terms.iter().map(|t| t.to_string()).collect(),
                deleted: false,
            });
        }
    }

    /// Make the next `n` batch deletes fail with a server error
    pub fn fail_next_deletes(&self, n: u32) {
        self.failing_deletes.store(n, Ordering::SeqCst);
    }

    pub fn remaining(&self) -> usize {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| !m.deleted)
            .count()
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> Vec<Vec<String>> {
        self.delete_calls.lock().unwrap().clone()
    }

    fn matches(message: &StoredMessage, filter: &SearchFilter) -> bool {
        !message.deleted
            && filter.label_ids().all(|l| message.labels.contains(l))
            && filter.query().map_or(true, |q| message.terms.contains(q))
    }
}

#[async_trait]
impl MailClient for FakeMailbox {
    async fn list_labels(&self) -> Result<Vec<Label>> {
        Ok(self.labels.clone())
    }

    async fn current_user_email(&self) -> Result<String> {
        Ok("me@example.com".to_string())
    }

    async fn search_page(
        &self,
        filter: &SearchFilter,
        page_token: Option<String>,
    ) -> Result<SearchPage> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);

        let start = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| DeleterError::BadRequest(format!("Invalid page token {}", token)))?,
            None => 0,
        };

        let messages = self.messages.lock().unwrap();
        let mut found = Vec::new();
        let mut position = start;

        while position < messages.len() && found.len() < self.page_size {
            if Self::matches(&messages[position], filter) {
                found.push(MessageRef::new(messages[position].id.clone()));
            }
            position += 1;
        }

        let more = messages[position.min(messages.len())..]
            .iter()
            .any(|m| Self::matches(m, filter));
        let next_page_token = if more { Some(position.to_string()) } else { None };

        Ok(SearchPage::new(found, next_page_token))
    }

    async fn batch_delete(&self, message_ids: &[String]) -> Result<()> {
        let should_fail = self
            .failing_deletes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(DeleterError::ServerError {
                status: 503,
                message: "Backend Error [retry]\n".to_string(),
            });
        }

        self.delete_calls.lock().unwrap().push(message_ids.to_vec());

        let ids: HashSet<&String> = message_ids.iter().collect();
        for message in self.messages.lock().unwrap().iter_mut() {
            if ids.contains(&message.id) {
                message.deleted = true;
            }
        }
        Ok(())
    }
}

