//! Sirsi CLI - Command-line interface for a SirsiDynix library account

mod cli;
mod config;
mod error;
mod output;
mod select;

use clap::Parser;
use cli::{Args, Command};
use config::Config;
use log::LevelFilter;
use sirsi_client::Account;

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr at a level chosen by `-v` flags, unless `RUST_LOG` says otherwise
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(args: Args) -> Result<(), error::CliError> {
    let command = args.command.clone().unwrap_or(Command::Auto);
    let config = Config::from_args(args)?;

    let mut account = Account::builder()
        .catalog(config.catalog.as_str())?
        .credentials(&config.userid, &config.password)
        .timeout(config.timeout)
        .build()?;

    match command {
        Command::Auto => run_auto(&mut account),
        Command::Items { due_within } => {
            let mut items = account.items()?;
            if let Some(days) = due_within {
                let now = chrono::Local::now().naive_local();
                items = select::due_within(items, days, now);
            }
            if items.is_empty() {
                println!("No items.");
            } else {
                print!("{}", output::item_table(&items));
            }
            Ok(())
        }
        Command::Fines => {
            println!("${}", account.fines()?);
            Ok(())
        }
        Command::RenewAll => {
            println!("{}", account.renew_all()?);
            Ok(())
        }
        Command::Cron { due_within } => run_cron(&mut account, due_within),
        Command::Renew { tokens } => {
            let items = select::by_tokens(account.items()?, &tokens)?;
            println!("{}", account.renew(&items)?);
            Ok(())
        }
    }
}

/// Report, renew everything, then list what is checked out
fn run_auto(account: &mut Account) -> Result<(), error::CliError> {
    let items = account.items()?;
    let fines = account.fines()?;
    println!("{}", output::summary_line(items.len(), fines));
    if items.is_empty() {
        return Ok(());
    }

    println!();
    println!("Renewing all items... {}", account.renew_all()?);
    println!();
    for item in &items {
        println!("{}", item);
    }
    Ok(())
}

/// Renew items that were never renewed, then report what is due soon
fn run_cron(account: &mut Account, days: u32) -> Result<(), error::CliError> {
    let fresh = select::unrenewed(account.items()?);
    if !fresh.is_empty() {
        println!(
            "Renewing {} item(s)... {}",
            fresh.len(),
            account.renew(&fresh)?
        );
    }

    let items = account.items()?;
    let fines = account.fines()?;
    let now = chrono::Local::now().naive_local();
    let due = select::due_within(items, days, now);
    if let Some(digest) = output::due_digest(&due, days, fines) {
        print!("{}", digest);
    }
    Ok(())
}
