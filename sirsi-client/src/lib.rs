//! SirsiDynix Patron Account Client
//!
//! This library drives the patron pages of a SirsiDynix library catalog,
//! which offers no API of its own, the way a browser would: it logs in,
//! walks the account menus, scrapes the pages and submits their forms.
//!
//! # Features
//!
//! - Lazy login, with one transparent re-login when the catalog session expires
//! - Checked-out items with due dates, renewal counts and inter-library loan flags
//! - Total fines as an exact decimal amount
//! - Renewal of all items or a chosen set, all-or-nothing
//! - Cookie-backed session over rustls, with a bounded request timeout
//! - Blocking synchronous API
//! - Well-typed errors using thiserror
//!
//! # Example
//!
//! ```no_run
//! use sirsi_client::Account;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut account = Account::new("https://catalog.example.org/", "21234000123456", "1234")?;
//!
//! let items = account.items()?;
//! let fresh: Vec<_> = items.into_iter().filter(|i| i.times_renewed == 0).collect();
//! if !fresh.is_empty() {
//!     println!("{}", account.renew(&fresh)?);
//! }
//!
//! println!("You owe ${}", account.fines()?);
//! account.logout()?;
//! # Ok(())
//! # }
//! ```

mod account;
mod error;
mod form;
mod item;
mod parser;
mod session;

pub use account::{Account, AccountBuilder, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use error::SirsiError;
pub use item::{HOLD_PREFIX, Item, RENEW_PREFIX, normalize_token};
pub use session::PageKind;

pub use rust_decimal::Decimal;
