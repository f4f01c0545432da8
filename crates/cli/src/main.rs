use anyhow::Context;
use clap::{Parser, Subcommand};
use lixi_core::{
    format_vnd, read_log, CardKind, DeviceFingerprint, ParticipationGate, PrizeEngine, RngState,
};
use lixi_cui::{terminal_signals, LaunchOptions};
use lixi_data::{default_assets_dir, default_store_path, load_game_config, JsonFileStore};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lixi")]
#[command(about = "Lucky money envelopes for Tết")]
#[command(version)]
struct Cli {
    /// Directory holding game.json
    #[arg(short, long, global = true)]
    assets: Option<PathBuf>,

    /// Key/value store file (defaults to $LIXI_STORE or ~/.lixi_store.json)
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the envelope grid in the terminal
    Play {
        /// Fixed seed for the deal
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print one deal without playing it
    Deal {
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the participation log
    Log {
        /// Emit raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Show this terminal's fingerprint and whether it may still play
    Check,
}

fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "warn" };
    format!("lixi={level},lixi_core={level},lixi_data={level},lixi_cui={level}")
}

/// `--verbose` wins; otherwise `RUST_LOG`, then the quiet default.
fn log_filter(verbose: bool) -> tracing_subscriber::EnvFilter {
    if verbose {
        return tracing_subscriber::EnvFilter::new(default_directives(true));
    }
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directives(false)))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(log_filter(cli.verbose))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let assets_dir = cli.assets.unwrap_or_else(default_assets_dir);
    let store_path = cli
        .store
        .or_else(default_store_path)
        .unwrap_or_else(|| PathBuf::from("lixi_store.json"));

    match cli.command {
        Commands::Play { seed } => lixi_cui::run(LaunchOptions {
            assets_dir,
            store_path,
            seed,
        }),
        Commands::Deal { seed } => print_deal(&assets_dir, seed),
        Commands::Log { json } => print_log(&assets_dir, &store_path, json),
        Commands::Check => print_check(&assets_dir, &store_path),
    }
}

fn print_deal(assets_dir: &Path, seed: Option<u64>) -> anyhow::Result<()> {
    let config = load_game_config(assets_dir)?;
    let engine = PrizeEngine::new(config.prizes).context("validate prize rules")?;
    let mut rng = seed.map(RngState::from_seed).unwrap_or_else(RngState::from_entropy);
    let prizes = engine.deal(&mut rng);
    println!("seed {}", rng.seed());
    for face in prizes.faces() {
        let marker = match face.kind {
            CardKind::User => " <- yours",
            CardKind::Top => " *",
            CardKind::Lesser => "",
        };
        println!("{:>3}  {:>10}{}", face.index + 1, face.label, marker);
    }
    let missed: Vec<String> = prizes
        .missed_positions()
        .iter()
        .map(|pos| pos.to_string())
        .collect();
    println!(
        "you get {}, top prize at {}",
        format_vnd(prizes.user_amount()),
        missed.join(", ")
    );
    Ok(())
}

fn print_log(assets_dir: &Path, store_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_game_config(assets_dir)?;
    let store = JsonFileStore::new(store_path);
    let log = read_log(&store, &config.storage)
        .with_context(|| format!("read log from {}", store_path.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&log)?);
        return Ok(());
    }
    if log.is_empty() {
        println!("no plays recorded");
    }
    for record in log {
        println!(
            "{}  {:<20} {:>10}  {}",
            record.time.format("%Y-%m-%d %H:%M:%S"),
            record.name,
            format_vnd(record.amount),
            record.device_id
        );
    }
    Ok(())
}

fn print_check(assets_dir: &Path, store_path: &Path) -> anyhow::Result<()> {
    let config = load_game_config(assets_dir)?;
    let device = DeviceFingerprint::derive(&terminal_signals(), &config.storage.fingerprint_prefix);
    let store = JsonFileStore::new(store_path);
    let gate = ParticipationGate::new(device.clone(), config.storage);
    let eligibility = gate.check(&store);
    let verdict = if eligibility.is_blocked() {
        "already played"
    } else {
        "may play"
    };
    println!("device {device}: {verdict}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_every_crate_to_debug() {
        assert_eq!(
            default_directives(true),
            "lixi=debug,lixi_core=debug,lixi_data=debug,lixi_cui=debug"
        );
        assert!(log_filter(true).to_string().contains("lixi_core=debug"));
    }

    #[test]
    fn quiet_default_is_warn() {
        assert!(default_directives(false).starts_with("lixi=warn"));
    }
}
