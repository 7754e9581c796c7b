//! Basic usage example for the SirsiDynix client
//!
//! This example demonstrates how to:
//! - Create an account with default settings
//! - Create an account with a custom timeout
//! - List checked-out items and fines
//! - Renew items that have never been renewed
//!
//! Note: This example needs real library credentials in the SIRSI_CATALOG,
//! SIRSI_USERID and SIRSI_PASSWORD environment variables.

use sirsi_client::Account;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = std::env::var("SIRSI_CATALOG")?;
    let userid = std::env::var("SIRSI_USERID")?;
    let password = std::env::var("SIRSI_PASSWORD")?;

    println!("=== Default Account ===");
    let _default = Account::new(&catalog, &userid, &password)?;
    println!(
        "✓ Account created with a {:?} timeout",
        sirsi_client::DEFAULT_TIMEOUT
    );

    println!("\n=== Custom Timeout ===");
    let mut account = Account::builder()
        .catalog(catalog.as_str())?
        .credentials(&userid, &password)
        .timeout(Duration::from_secs(10))
        .build()?;
    println!("✓ Account created with a 10s timeout");

    println!("\nFetching items...");
    let items = account.items()?;
    for item in &items {
        println!("  {} (renewed {} times)", item, item.times_renewed);
    }

    println!("\nFetching fines...");
    println!("✓ You owe ${}", account.fines()?);

    let fresh: Vec<_> = items
        .into_iter()
        .filter(|item| item.times_renewed == 0 && item.is_renewable != Some(false))
        .collect();
    if fresh.is_empty() {
        println!("\nNothing to renew.");
    } else {
        println!("\nRenewing {} items...", fresh.len());
        println!("✓ {}", account.renew(&fresh)?);
    }

    account.logout()?;
    Ok(())
}
