//! Choosing which checked-out items a command acts on

use crate::error::CliError;
use chrono::{NaiveDateTime, TimeDelta};
use sirsi_client::{Item, normalize_token};

/// Items due no later than `days` days after `now`, soonest first
///
/// Items without a known due date are left out.
pub fn due_within(items: Vec<Item>, days: u32, now: NaiveDateTime) -> Vec<Item> {
    let cutoff = now + TimeDelta::days(i64::from(days));
    let mut due: Vec<Item> = items
        .into_iter()
        .filter(|item| item.due_date.is_some_and(|d| d <= cutoff))
        .collect();
    due.sort_by_key(|item| item.due_date);
    due
}

/// Items that have not been renewed yet and are not known to be blocked
pub fn unrenewed(items: Vec<Item>) -> Vec<Item> {
    items
        .into_iter()
        .filter(|item| item.times_renewed < 1 && item.is_renewable != Some(false))
        .collect()
}

/// The items matching `tokens`, which may carry action prefixes
///
/// Every token must match a checked-out item.
pub fn by_tokens(items: Vec<Item>, tokens: &[String]) -> Result<Vec<Item>, CliError> {
    let wanted: Vec<&str> = tokens.iter().map(|t| normalize_token(t)).collect();

    let unknown: Vec<String> = wanted
        .iter()
        .filter(|token| !items.iter().any(|item| item.token() == **token))
        .map(|token| token.to_string())
        .collect();
    if !unknown.is_empty() {
        return Err(CliError::UnknownTokens(unknown));
    }

    Ok(items
        .into_iter()
        .filter(|item| wanted.contains(&item.token()))
        .collect())
}
