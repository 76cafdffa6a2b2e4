//! Command-line entry point over `interact_core`.
//!
//! # Responsibility
//! - Drive the same account, lookup and history use-cases as the mobile
//!   surface against a local store.
//! - Keep output line-oriented so it can be diffed in quick sanity checks.

use clap::{Parser, Subcommand};
use interact_core::db::open_db;
use interact_core::{
    init_logging, mock_check, AccountService, ClearConfirmation, CoreConfig, HistoryDraft,
    HistoryService, InteractionQuery, InteractionRecord, InteractionService, NormalizedResult,
    SqliteBackend,
};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "interact",
    version = env!("CARGO_PKG_VERSION"),
    about = "Look up food/drug interactions and keep a short per-user history",
    long_about = None
)]
struct Cli {
    /// Override the store path (defaults to INTERACT_DB_PATH or a temp file)
    #[arg(global = true, long = "db")]
    db: Option<PathBuf>,

    /// Write rolling logs to this absolute directory
    #[arg(global = true, long = "log-dir")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print core linkage info
    Ping,

    /// Register a new account
    Signup {
        email: String,
        password: String,
        username: String,
    },

    /// Sign in and keep the session in the store
    Login { email: String, password: String },

    /// End the current session
    Logout,

    /// Show the signed-in username
    Whoami,

    /// Search every interaction column for TEXT
    Search { text: String },

    /// Find interactions mentioning both substances
    Check {
        first: String,
        second: String,
        /// Save the first match (or "Unknown") to history
        #[arg(long)]
        save: bool,
    },

    /// Offline mock verdict for two substances
    Mock {
        first: String,
        second: String,
        #[arg(long)]
        save: bool,
    },

    /// List saved lookups, newest first
    History,

    /// Delete every saved lookup of the signed-in user
    Clear {
        /// Confirm the irreversible delete
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    if let Err(err) = run(Cli::parse()) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = CoreConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(config.log_level, log_dir)?;
    }

    if let Command::Ping = cli.command {
        println!("interact_core ping={}", interact_core::ping());
        println!("interact_core version={}", interact_core::core_version());
        return Ok(());
    }

    let conn = open_db(&config.db_path)?;
    let backend = SqliteBackend::new(&conn);
    let accounts = AccountService::new(&backend);
    let lookups = InteractionService::new(&backend);
    let history = HistoryService::new(&backend, config.retention_policy());

    match cli.command {
        Command::Ping => {}
        Command::Signup {
            email,
            password,
            username,
        } => {
            let profile = accounts.sign_up(&email, &password, &username)?;
            println!("signed up username={}", profile.username);
        }
        Command::Login { email, password } => {
            let user = accounts.sign_in(&email, &password)?;
            println!("signed in email={}", user.email);
        }
        Command::Logout => {
            accounts.sign_out()?;
            println!("signed out");
        }
        Command::Whoami => println!("{}", accounts.display_username()),
        Command::Search { text } => print_results(&lookups.search_interactions(&text)?),
        Command::Check {
            first,
            second,
            save,
        } => {
            let query = InteractionQuery::new(first, second);
            let results = lookups.lookup_pair(&query)?;
            print_results(&results);
            if save {
                let unknown = InteractionRecord::default().normalize();
                let draft = HistoryDraft::from_result(&query, results.first().unwrap_or(&unknown));
                let report = history.save_and_prune(&draft)?;
                print_save(report.kept, report.prune_error.is_some());
            }
        }
        Command::Mock {
            first,
            second,
            save,
        } => {
            let query = InteractionQuery::new(first, second);
            let verdict = mock_check(&query)?;
            println!("{}\t{}", verdict.risk, verdict.description);
            if save {
                let report = history.save_and_prune(&HistoryDraft::from_mock(&query, &verdict))?;
                print_save(report.kept, report.prune_error.is_some());
            }
        }
        Command::History => {
            let entries = history.list_history()?;
            if entries.is_empty() {
                println!("no history");
            }
            for entry in entries {
                println!(
                    "{}\t{} + {}\t{}\t{}",
                    entry.created_at,
                    entry.drug1,
                    entry.drug2,
                    entry.result.as_deref().unwrap_or("-"),
                    entry.description.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Clear { yes } => {
            let confirmation = if yes {
                ClearConfirmation::Confirmed
            } else {
                ClearConfirmation::Cancelled
            };
            let removed = history.clear_history(confirmation)?;
            println!("cleared {removed} entries");
        }
    }

    Ok(())
}

fn print_results(results: &[NormalizedResult]) {
    if results.is_empty() {
        println!("no interactions found");
    }
    for result in results {
        println!(
            "{} + {}\t{}\t{}",
            result.drug.as_deref().unwrap_or("?"),
            result.food.as_deref().unwrap_or("?"),
            result.result,
            result.description
        );
    }
}

fn print_save(kept: usize, prune_pending: bool) {
    if prune_pending {
        println!("saved (cleanup of older entries pending)");
    } else {
        println!("saved kept={kept}");
    }
}
