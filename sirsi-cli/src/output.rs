//! Console rendering of account data

use sirsi_client::{Decimal, Item};

/// One-line overview of the account
pub fn summary_line(item_count: usize, fines: Decimal) -> String {
    format!(
        "You have {} item{} checked out. You owe ${} in fines.",
        item_count,
        if item_count == 1 { "" } else { "s" },
        fines
    )
}

/// Report on items due soon, or `None` when nothing is due
pub fn due_digest(due: &[Item], days: u32, fines: Decimal) -> Option<String> {
    if due.is_empty() {
        return None;
    }
    let mut out = format!(
        "{} item{} due within {} day{}.\n\n",
        due.len(),
        if due.len() == 1 { "" } else { "s" },
        days,
        if days == 1 { "" } else { "s" },
    );
    out.push_str(&item_table(due));
    if fines > Decimal::ZERO {
        out.push_str(&format!("\nYou have ${} in fines.\n", fines));
    }
    Some(out)
}

/// Render items as an aligned table
pub fn item_table(items: &[Item]) -> String {
    let rows: Vec<[String; 4]> = items
        .iter()
        .map(|item| {
            [
                item.token().to_string(),
                item.due_date
                    .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
                item.times_renewed.to_string(),
                match item.is_interlibrary_loan {
                    Some(true) => format!("[ILL] {}", item.name),
                    _ => item.name.clone(),
                },
            ]
        })
        .collect();

    let header = ["Token", "Due", "Renewed", "Title"];
    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_row = |cells: [&str; 4]| {
        let line = format!(
            "{:<w0$}  {:<w1$}  {:>w2$}  {}",
            cells[0],
            cells[1],
            cells[2],
            cells[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        );
        out.push_str(line.trim_end());
        out.push('\n');
    };
    push_row(header);
    for row in &rows {
        push_row([&row[0], &row[1], &row[2], &row[3]]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_summary_line() {
        assert_eq!(
            summary_line(1, Decimal::new(1250, 2)),
            "You have 1 item checked out. You owe $12.50 in fines."
        );
        assert_eq!(
            summary_line(0, Decimal::ZERO),
            "You have 0 items checked out. You owe $0 in fines."
        );
    }

    #[test]
    fn test_item_table() {
        let mut dune = Item::new("RENEW^1001", "Dune");
        dune.due_date = NaiveDate::from_ymd_opt(2014, 3, 14).and_then(|d| d.and_hms_opt(23, 59, 0));
        dune.times_renewed = 2;
        let mut thesis = Item::new("ILL42", "Thesis");
        thesis.is_interlibrary_loan = Some(true);

        let table = item_table(&[dune, thesis]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Token  Due               Renewed  Title");
        assert_eq!(lines[1], "1001   2014-03-14 23:59        2  Dune");
        assert_eq!(lines[2], "ILL42  -                       0  [ILL] Thesis");
    }

    #[test]
    fn test_due_digest() {
        assert_eq!(due_digest(&[], 7, Decimal::new(300, 2)), None);

        let mut dune = Item::new("1001", "Dune");
        dune.due_date = NaiveDate::from_ymd_opt(2014, 3, 14).and_then(|d| d.and_hms_opt(23, 59, 0));
        let items = [dune];

        let digest = due_digest(&items, 7, Decimal::ZERO).unwrap();
        assert!(digest.starts_with("1 item due within 7 days.\n\nToken"));
        assert!(digest.contains("1001   2014-03-14 23:59"));
        assert!(!digest.contains("fines"));

        let digest = due_digest(&items, 1, Decimal::new(300, 2)).unwrap();
        assert!(digest.starts_with("1 item due within 1 day.\n"));
        assert!(digest.ends_with("\nYou have $3.00 in fines.\n"));
    }
}
