use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use trk_core::config::{ifw_dir, load_config};
use trk_core::firewall::rules_path;
use trk_core::parcel::{Parcel, Parcelable};
use trk_core::{envelope, IntentFirewall, TrackerRecord};

mod output;

#[derive(Parser)]
#[command(name = "trk", about = "trk: inspect, encode and block Android tracker components")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON array of tracker records into a parcel file
    Encode {
        /// JSON file with tracker records
        input: PathBuf,

        /// Parcel file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Write a single bare record without the versioned header
        #[arg(long)]
        raw: bool,
    },

    /// Decode a parcel file and print its records
    Decode {
        /// Parcel file to read
        input: PathBuf,

        /// Input is a single bare record without the versioned header
        #[arg(long)]
        raw: bool,

        /// Output format
        #[arg(long, default_value = "rich")]
        format: String,
    },

    /// Show which trackers are blocked by the package's firewall rules
    Status {
        /// JSON file with tracker records
        input: PathBuf,

        /// Package the trackers belong to
        #[arg(short, long)]
        package: String,

        /// Intent firewall rules directory
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "rich")]
        format: String,
    },

    /// Block trackers through the intent firewall
    Block {
        /// JSON file with tracker records
        input: PathBuf,

        /// Package the trackers belong to
        #[arg(short, long)]
        package: String,

        /// Intent firewall rules directory
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Actually write the rules file (default is dry-run)
        #[arg(long)]
        apply: bool,
    },

    /// Remove intent firewall rules for trackers
    Unblock {
        /// JSON file with tracker records
        input: PathBuf,

        /// Package the trackers belong to
        #[arg(short, long)]
        package: String,

        /// Intent firewall rules directory
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Actually write the rules file (default is dry-run)
        #[arg(long)]
        apply: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode { input, output, raw } => cmd_encode(&input, &output, raw),
        Commands::Decode { input, raw, format } => cmd_decode(&input, raw, &format),
        Commands::Status {
            input,
            package,
            dir,
            format,
        } => cmd_status(&input, &package, dir, &format),
        Commands::Block {
            input,
            package,
            dir,
            apply,
        } => cmd_firewall(&input, &package, dir, apply, FirewallAction::Block),
        Commands::Unblock {
            input,
            package,
            dir,
            apply,
        } => cmd_firewall(&input, &package, dir, apply, FirewallAction::Unblock),
    }
}

fn read_records_json(path: &Path) -> Result<Vec<TrackerRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let records: Vec<TrackerRecord> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of tracker records", path.display()))?;
    log::debug!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Bare layout of exactly one record.
fn encode_raw(records: &[TrackerRecord]) -> Result<Vec<u8>> {
    let [record] = records else {
        bail!(
            "--raw encodes exactly one record, input has {}",
            records.len()
        );
    };
    let mut parcel = Parcel::new();
    record.write_to_parcel(&mut parcel, 0);
    Ok(parcel.into_bytes())
}

fn decode_raw(bytes: Vec<u8>) -> Result<TrackerRecord> {
    let mut parcel = Parcel::from_bytes(bytes);
    let record = TrackerRecord::read_from_parcel(&mut parcel)?;
    if parcel.data_avail() > 0 {
        log::warn!(
            "{} unread bytes after record, input may not be a bare record",
            parcel.data_avail()
        );
    }
    Ok(record)
}

fn cmd_encode(input: &Path, output: &Path, raw: bool) -> Result<()> {
    let records = read_records_json(input)?;
    let bytes = if raw {
        encode_raw(&records)?
    } else {
        envelope::marshall(&records)
    };
    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Encoded {} record{} ({} bytes) to {}",
        records.len(),
        if records.len() == 1 { "" } else { "s" },
        bytes.len(),
        output.display()
    );
    Ok(())
}

fn cmd_decode(input: &Path, raw: bool, format: &str) -> Result<()> {
    let bytes =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let records = if raw {
        vec![decode_raw(bytes)?]
    } else {
        envelope::unmarshall(&bytes)
            .with_context(|| format!("Failed to decode {}", input.display()))?
    };
    output::print_records(&records, format)?;
    Ok(())
}

fn resolve_rules(package: &str, dir: Option<PathBuf>) -> PathBuf {
    let dir = dir.unwrap_or_else(|| ifw_dir(&load_config()));
    rules_path(&dir, package)
}

fn cmd_status(input: &Path, package: &str, dir: Option<PathBuf>, format: &str) -> Result<()> {
    let mut records = read_records_json(input)?;
    let path = resolve_rules(package, dir);
    let rules = IntentFirewall::load(&path)?;
    rules.mark_blocked(&mut records, package);
    output::print_records(&records, format)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FirewallAction {
    Block,
    Unblock,
}

fn cmd_firewall(
    input: &Path,
    package: &str,
    dir: Option<PathBuf>,
    apply: bool,
    action: FirewallAction,
) -> Result<()> {
    let config = load_config();
    let mut records = read_records_json(input)?;
    let path = match dir {
        Some(dir) => rules_path(&dir, package),
        None => rules_path(&ifw_dir(&config), package),
    };

    let mut rules = IntentFirewall::load(&path)?;
    let changed = match action {
        FirewallAction::Block => rules.block(&mut records, package, config.firewall.log),
        FirewallAction::Unblock => rules.unblock(&mut records, package),
    };

    let verb = match action {
        FirewallAction::Block => "block",
        FirewallAction::Unblock => "unblock",
    };

    if changed == 0 {
        println!("Nothing to {verb}: rules for {package} are already up to date.");
        return Ok(());
    }

    output::print_records(&records, "rich")?;

    if apply {
        rules.save(&path)?;
        println!(
            "{} {changed} rule{} in {}",
            "Updated".green().bold(),
            if changed == 1 { "" } else { "s" },
            path.display()
        );
    } else {
        println!(
            "{} would {verb} {changed} rule{} in {}",
            "Dry run:".yellow().bold(),
            if changed == 1 { "" } else { "s" },
            path.display()
        );
        println!("{}", rules.to_xml()?.dimmed());
        println!("Re-run with --apply to write the file.");
    }
    Ok(())
}
