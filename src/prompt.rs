//! Interactive prompts for choosing what to delete

use inquire::{InquireError, MultiSelect, Select, Text};
use std::fmt;

use crate::error::{DeleterError, Result};
use crate::models::Label;

const LABEL_PAGE_SIZE: usize = 12;

/// Ways of narrowing down the messages to delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Label,
    SearchQuery,
}

impl FilterKind {
    pub const ALL: [FilterKind; 2] = [FilterKind::Label, FilterKind::SearchQuery];
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Label => f.write_str("Delete messages matching a label"),
            FilterKind::SearchQuery => f.write_str("Delete messages matching a search query"),
        }
    }
}

/// Answer to the final confirmation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confirmation::Yes => f.write_str("Yes"),
            Confirmation::No => f.write_str("No"),
        }
    }
}

fn map_inquire_error(error: InquireError) -> DeleterError {
    match error {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            DeleterError::OperationCancelled("prompt dismissed".to_string())
        }
        other => DeleterError::PromptError(other.to_string()),
    }
}

/// Ask which filter kinds to combine; several may be selected
pub fn prompt_filter_kinds() -> Result<Vec<FilterKind>> {
    MultiSelect::new(
        "How would you like to select the messages to delete?",
        FilterKind::ALL.to_vec(),
    )
    .with_help_message(
        "Select several options to delete messages matching all of them. \
         ↑↓ to move, space to toggle, enter to accept",
    )
    .prompt()
    .map_err(map_inquire_error)
}

/// Ask which labels to delete, listed alphabetically
pub fn prompt_labels(labels: &[Label]) -> Result<Vec<Label>> {
    MultiSelect::new("Select label(s) to delete", sorted_labels(labels))
        .with_page_size(LABEL_PAGE_SIZE)
        .with_help_message("space to toggle a label, enter to accept, type to filter")
        .prompt()
        .map_err(map_inquire_error)
}

/// Ask for a Gmail search query
pub fn prompt_search_query() -> Result<String> {
    Text::new("Enter Query:")
        .with_help_message(
            "The syntax matches the search box on gmail.com. \
             Test your query there before entering it here!",
        )
        .prompt()
        .map(|q| q.trim().to_string())
        .map_err(map_inquire_error)
}

/// Final go/no-go before deleting anything
pub fn confirm_deletion() -> Result<bool> {
    Select::new("Start deleting?", vec![Confirmation::Yes, Confirmation::No])
        .prompt()
        .map(|answer| answer == Confirmation::Yes)
        .map_err(map_inquire_error)
}

/// Labels ordered by name for display
pub fn sorted_labels(labels: &[Label]) -> Vec<Label> {
    let mut sorted = labels.to_vec();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted
}

/// Resolve label names to labels, ignoring case
///
/// Fails on the first name that matches no label.
pub fn resolve_label_names(labels: &[Label], names: &[String]) -> Result<Vec<Label>> {
    names
        .iter()
        .map(|name| {
            labels
                .iter()
                .find(|l| l.name.eq_ignore_ascii_case(name.trim()))
                .cloned()
                .ok_or_else(|| DeleterError::LabelNotFound(name.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_labels() -> Vec<Label> {
        vec![
            Label::new("Label_3", "Receipts"),
            Label::new("INBOX", "INBOX"),
            Label::new("Label_1", "Newsletters"),
        ]
    }

    #[test]
    fn test_sorted_labels_by_name() {
        let names: Vec<String> = sorted_labels(&account_labels())
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["INBOX", "Newsletters", "Receipts"]);
    }

    #[test]
    fn test_resolve_label_names_case_insensitive() {
        let resolved = resolve_label_names(
            &account_labels(),
            &["receipts".to_string(), " NEWSLETTERS ".to_string()],
        )
        .unwrap();

        let ids: Vec<&str> = resolved.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["Label_3", "Label_1"]);
    }

    #[test]
    fn test_resolve_label_names_unknown_label() {
        let err = resolve_label_names(&account_labels(), &["Promotions".to_string()]).unwrap_err();
        assert!(matches!(err, DeleterError::LabelNotFound(ref name) if name == "Promotions"));
    }

    #[test]
    fn test_filter_kind_display() {
        assert_eq!(FilterKind::Label.to_string(), "Delete messages matching a label");
        assert_eq!(
            FilterKind::SearchQuery.to_string(),
            "Delete messages matching a search query"
        );
    }

    #[test]
    fn test_cancelled_prompt_maps_to_cancelled_error() {
        assert!(matches!(
            map_inquire_error(InquireError::OperationCanceled),
            DeleterError::OperationCancelled(_)
        ));
        assert!(matches!(
            map_inquire_error(InquireError::NotTTY),
            DeleterError::PromptError(_)
        ));
    }
}
