//! walkv CLI
//!
//! Operates directly on a data directory. Every invocation opens the WAL,
//! replays it to rebuild the map, then runs a single command.

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkv::wal::{codec, WalRecovery};
use walkv::{Config, KvError, RecoveryStats, SyncMode, TransactionalStore, Value, WalWriter};

/// walkv CLI
#[derive(Parser, Debug)]
#[command(name = "walkv")]
#[command(about = "Inspect and modify a write-ahead logged key-value store")]
#[command(version)]
struct Args {
    /// Data directory holding wal.log
    #[arg(short, long, default_value = "./walkv_data")]
    data_dir: String,

    /// How appends are synced to disk
    #[arg(long, value_enum, default_value_t = SyncArg::Full)]
    sync: SyncArg,

    /// Do not take the cross-process advisory file lock
    #[arg(long)]
    no_file_lock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SyncArg {
    Full,
    Data,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value, as JSON (anything that is not valid JSON is stored as a string)
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Print every valid log record, one JSON line each
    Dump,

    /// Replay the log and print the recovery statistics
    Recover,

    /// Check the log for malformed lines and sequence anomalies
    Verify,
}

fn main() -> ExitCode {
    // Logs go to stderr; stdout carries command output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> walkv::Result<ExitCode> {
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .sync_mode(match args.sync {
            SyncArg::Full => SyncMode::Full,
            SyncArg::Data => SyncMode::Data,
        })
        .file_lock(!args.no_file_lock)
        .recover_on_open(false)
        .build();

    tracing::debug!(data_dir = %args.data_dir, "walkv v{}", walkv::VERSION);

    match args.command {
        Commands::Get { key } => {
            let (store, _) = open_store(config)?;
            match store.get(&key) {
                Some(value) => println!("{}", value),
                None => {
                    eprintln!("(not found)");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::Set { key, value } => {
            let (store, _) = open_store(config)?;
            let value = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
            let sequence = store.put(key, value)?;
            println!("OK (sequence {})", sequence);
        }
        Commands::Del { key } => {
            let (store, _) = open_store(config)?;
            if !store.delete(&key)? {
                eprintln!("(not found)");
                return Ok(ExitCode::FAILURE);
            }
            println!("OK");
        }
        Commands::Dump => {
            let wal = WalWriter::open_with(config.wal_path(), config.wal_options())?;
            for record in wal.read_all()? {
                println!("{}", codec::encode(&record)?);
            }
        }
        Commands::Recover => {
            let (store, stats) = open_store(config)?;
            print_json(&stats)?;
            println!("keys: {}", store.size());
        }
        Commands::Verify => {
            let report = WalRecovery::verify(&config.wal_path())?;
            print_json(&report)?;
            if !report.is_healthy() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Open the store and rebuild its map from the log
fn open_store(config: Config) -> walkv::Result<(TransactionalStore, RecoveryStats)> {
    let store = TransactionalStore::open(config)?;
    let stats = store.recover()?;
    Ok((store, stats))
}

fn print_json<T: Serialize>(value: &T) -> walkv::Result<()> {
    let text =
        serde_json::to_string_pretty(value).map_err(|e| KvError::Serialization(e.to_string()))?;
    println!("{}", text);
    Ok(())
}
