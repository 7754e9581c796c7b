//! HTML response parsing utilities
//!
//! Extraction rules for the catalog pages:
//!
//! * item rows are `<tr>` elements with a direct child cell whose class
//!   contains `itemlisting` (the site alternates `itemlisting` and
//!   `itemlisting2`); within a row the first named `<input>` carries the
//!   token, the first `<label>` the title, and the first two `<strong>`
//!   elements the due date and the renewal count, in that order
//! * fines live in the first `<li>` of the list nested in `li.summary`
//! * the renewal outcome is the first `<h3>` of the response

use crate::error::SirsiError;
use crate::item::Item;
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use std::cell::OnceCell;
use std::str::FromStr;

const ITEMS_PAGE: &str = "renew my materials";
const SUMMARY_PAGE: &str = "account summary";
const RENEWAL_PAGE: &str = "renewal result";

const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y,%H:%M",
    "%m/%d/%Y, %H:%M",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%B %d, %Y %H:%M",
];

// Two-digit years must be tried first, `%Y` would accept "14" as year 14
const DATE_FORMATS: &[&str] = &[
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y-%m-%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d-%b-%Y",
];

/// Parser for catalog HTML responses with cached regex patterns and selectors
#[derive(Clone, Debug)]
pub(crate) struct ResponseParser {
    welcome_regex: OnceCell<Regex>,
    separator_regex: OnceCell<Regex>,
    whitespace_regex: OnceCell<Regex>,
    row_selector: OnceCell<Selector>,
    input_selector: OnceCell<Selector>,
    label_selector: OnceCell<Selector>,
    strong_selector: OnceCell<Selector>,
    summary_selector: OnceCell<Selector>,
    nested_item_selector: OnceCell<Selector>,
    heading_selector: OnceCell<Selector>,
    link_selector: OnceCell<Selector>,
}

impl ResponseParser {
    /// Create a new parser with uninitialized caches
    pub fn new() -> Self {
        Self {
            welcome_regex: OnceCell::new(),
            separator_regex: OnceCell::new(),
            whitespace_regex: OnceCell::new(),
            row_selector: OnceCell::new(),
            input_selector: OnceCell::new(),
            label_selector: OnceCell::new(),
            strong_selector: OnceCell::new(),
            summary_selector: OnceCell::new(),
            nested_item_selector: OnceCell::new(),
            heading_selector: OnceCell::new(),
            link_selector: OnceCell::new(),
        }
    }

    fn welcome_regex(&self) -> &Regex {
        self.welcome_regex
            .get_or_init(|| Regex::new(r"Welcome, \w+").unwrap())
    }

    /// Matches the non-breaking space run between title and author in labels
    fn separator_regex(&self) -> &Regex {
        self.separator_regex
            .get_or_init(|| Regex::new(r"\x{a0}{2}\s*").unwrap())
    }

    fn whitespace_regex(&self) -> &Regex {
        self.whitespace_regex
            .get_or_init(|| Regex::new(r"\s+").unwrap())
    }

    fn row_selector(&self) -> &Selector {
        self.row_selector.get_or_init(|| Selector::parse("tr").unwrap())
    }

    fn input_selector(&self) -> &Selector {
        self.input_selector
            .get_or_init(|| Selector::parse("input[name]").unwrap())
    }

    fn label_selector(&self) -> &Selector {
        self.label_selector
            .get_or_init(|| Selector::parse("label").unwrap())
    }

    fn strong_selector(&self) -> &Selector {
        self.strong_selector
            .get_or_init(|| Selector::parse("strong").unwrap())
    }

    fn summary_selector(&self) -> &Selector {
        self.summary_selector
            .get_or_init(|| Selector::parse("li.summary").unwrap())
    }

    fn nested_item_selector(&self) -> &Selector {
        self.nested_item_selector
            .get_or_init(|| Selector::parse("ul li").unwrap())
    }

    fn heading_selector(&self) -> &Selector {
        self.heading_selector
            .get_or_init(|| Selector::parse("h3").unwrap())
    }

    fn link_selector(&self) -> &Selector {
        self.link_selector
            .get_or_init(|| Selector::parse("a[href]").unwrap())
    }

    /// Whether a page greets the patron, which only happens when logged in
    pub fn has_login_marker(&self, html: &str) -> bool {
        self.welcome_regex().is_match(html)
    }

    /// Collapse runs of whitespace into single spaces and trim
    fn normalize_text(&self, text: &str) -> String {
        self.whitespace_regex()
            .replace_all(text.trim(), " ")
            .into_owned()
    }

    fn element_text(&self, element: ElementRef) -> String {
        self.normalize_text(&element.text().collect::<String>())
    }

    /// Find the `href` of the first link whose text matches `text`
    pub fn find_link(&self, html: &str, text: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let wanted = self.normalize_text(text);
        document
            .select(self.link_selector())
            .find(|link| self.element_text(*link) == wanted)
            .and_then(|link| link.value().attr("href"))
            .map(str::to_string)
    }

    /// Title text of an item label with the title/author gap replaced by ` -- `
    fn item_name(&self, label: ElementRef) -> String {
        let raw = label.text().collect::<String>();
        let separated = self.separator_regex().replace_all(raw.trim(), " -- ");
        self.normalize_text(&separated)
    }

    fn is_item_row(row: ElementRef) -> bool {
        row.children().filter_map(ElementRef::wrap).any(|cell| {
            cell.value()
                .classes()
                .any(|class| class.contains("itemlisting"))
        })
    }

    /// Extract all checked-out items from the "Renew My Materials" page
    pub fn parse_items(&self, html: &str) -> Result<Vec<Item>, SirsiError> {
        let document = Html::parse_document(html);

        document
            .select(self.row_selector())
            .filter(|row| Self::is_item_row(*row))
            .map(|row| self.parse_item_row(row))
            .collect()
    }

    fn parse_item_row(&self, row: ElementRef) -> Result<Item, SirsiError> {
        let input = row
            .select(self.input_selector())
            .next()
            .ok_or_else(|| SirsiError::parse(ITEMS_PAGE, "item row has no input control"))?;
        // Selector guarantees the attribute exists
        let token = input.value().attr("name").unwrap_or_default();

        let label = row
            .select(self.label_selector())
            .next()
            .ok_or_else(|| SirsiError::parse(ITEMS_PAGE, format!("item {} has no label", token)))?;

        let mut strong = row.select(self.strong_selector()).map(|s| self.element_text(s));
        let (Some(due_text), Some(renewed_text)) = (strong.next(), strong.next()) else {
            return Err(SirsiError::parse(
                ITEMS_PAGE,
                format!("item {} lacks due date or renewal count", token),
            ));
        };

        let due_date = parse_due_date(&due_text).ok_or_else(|| {
            SirsiError::parse(
                ITEMS_PAGE,
                format!("unrecognized due date {:?} for item {}", due_text, token),
            )
        })?;
        let (times_renewed, is_interlibrary_loan) = parse_times_renewed(&renewed_text);

        let mut item = Item::new(token, self.item_name(label));
        item.due_date = Some(due_date);
        item.times_renewed = times_renewed;
        item.is_interlibrary_loan = is_interlibrary_loan;
        item.is_renewable = Some(input.value().attr("disabled").is_none());
        Ok(item)
    }

    /// Extract the total fines owed from the "Account Summary" page
    pub fn parse_fines(&self, html: &str) -> Result<Decimal, SirsiError> {
        let document = Html::parse_document(html);

        let summary = document
            .select(self.summary_selector())
            .next()
            .ok_or_else(|| SirsiError::parse(SUMMARY_PAGE, "no li.summary element"))?;
        let entry = summary
            .select(self.nested_item_selector())
            .next()
            .ok_or_else(|| SirsiError::parse(SUMMARY_PAGE, "summary has no nested list item"))?;

        parse_amount(&self.element_text(entry))
    }

    /// Extract the status message shown after a renewal submission
    pub fn parse_renewal_status(&self, html: &str) -> Result<String, SirsiError> {
        let document = Html::parse_document(html);

        let heading = document
            .select(self.heading_selector())
            .next()
            .ok_or_else(|| SirsiError::parse(RENEWAL_PAGE, "no h3 status heading"))?;

        Ok(self.element_text(heading))
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a due date in any of the formats the catalog has been seen to use
pub(crate) fn parse_due_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    let text = match text.get(..4) {
        Some(label) if label.eq_ignore_ascii_case("due:") => text[4..].trim_start(),
        _ => match text.get(..3) {
            Some(label) if label.eq_ignore_ascii_case("due") => text[3..].trim_start(),
            _ => text,
        },
    };

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Renewal count and inter-library loan flag from the count column
///
/// ILL rows leave the count blank. Unreadable counts are treated as zero
/// renewals with an unknown loan type.
pub(crate) fn parse_times_renewed(text: &str) -> (u32, Option<bool>) {
    let text = text.trim();
    if text.is_empty() {
        return (0, Some(true));
    }
    match text.parse::<u32>() {
        Ok(count) => (count, Some(false)),
        Err(_) => (0, None),
    }
}

/// Parse text such as `You owe $1,012.50` into an exact amount
pub(crate) fn parse_amount(text: &str) -> Result<Decimal, SirsiError> {
    let text = text.trim();
    let text = match text.get(..7) {
        Some(label) if label.eq_ignore_ascii_case("you owe") => text[7..].trim_start(),
        _ => text,
    };
    let digits: String = text
        .trim_start_matches('$')
        .trim()
        .chars()
        .filter(|c| *c != ',')
        .collect();

    let amount = Decimal::from_str(&digits).map_err(|e| {
        SirsiError::parse(SUMMARY_PAGE, format!("invalid amount {:?}: {}", text, e))
    })?;
    if amount.is_sign_negative() {
        return Err(SirsiError::parse(
            SUMMARY_PAGE,
            format!("negative amount {:?}", text),
        ));
    }
    Ok(amount)
}
