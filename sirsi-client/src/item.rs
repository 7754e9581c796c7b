//! Checked-out library materials

use chrono::NaiveDateTime;
use std::fmt;

/// Prefix the catalog puts on control names in the renewal form
pub const RENEW_PREFIX: &str = "RENEW^";

/// Prefix the catalog uses when referencing a title for holds
pub const HOLD_PREFIX: &str = "HLD^TITLE^";

/// Strip a single leading renewal or hold prefix from a raw token
///
/// Tokens without a recognized prefix are returned unchanged.
pub fn normalize_token(raw: &str) -> &str {
    raw.strip_prefix(RENEW_PREFIX)
        .or_else(|| raw.strip_prefix(HOLD_PREFIX))
        .unwrap_or(raw)
}

/// A borrowed item as listed on the "Renew My Materials" page
///
/// The catalog references materials by an opaque token whose prefix depends
/// on the action being performed. The token is stored bare and the prefixed
/// variants are derived with [`Item::renew_token`] and [`Item::hold_token`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    token: String,
    /// Human readable title, for display only
    pub name: String,
    /// When the item is due back
    pub due_date: Option<NaiveDateTime>,
    /// Number of successful renewals so far
    pub times_renewed: u32,
    /// Whether the item is an inter-library loan, if known
    pub is_interlibrary_loan: Option<bool>,
    /// Whether the catalog offers the item for renewal, if known
    pub is_renewable: Option<bool>,
}

impl Item {
    /// Create an item from a raw token, which may carry either prefix
    pub fn new(token: &str, name: impl Into<String>) -> Self {
        Self {
            token: normalize_token(token).to_string(),
            name: name.into(),
            due_date: None,
            times_renewed: 0,
            is_interlibrary_loan: None,
            is_renewable: None,
        }
    }

    /// The bare token, without any action prefix
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Control name used by the renewal form
    pub fn renew_token(&self) -> String {
        format!("{}{}", RENEW_PREFIX, self.token)
    }

    /// Identifier used when placing a hold on this title
    pub fn hold_token(&self) -> String {
        format!("{}{}", HOLD_PREFIX, self.token)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_interlibrary_loan == Some(true) {
            f.write_str("ILL ")?;
        }
        f.write_str(&self.name)?;
        if let Some(due) = self.due_date {
            write!(f, ", due {}", due)?;
        }
        Ok(())
    }
}
