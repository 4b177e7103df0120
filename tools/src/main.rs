use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use codec::CodecLimits;
use entropy::Huffman;
use tools::{change_list_json, decode_payload, format_change_pretty, inspect_payload};

#[derive(Parser)]
#[command(
    name = "snapnet-tools",
    version,
    about = "snapnet inspection and decoding tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a directory JSON file and print its canonical form and hash.
    Dump {
        /// Path to the directory JSON.
        directory: PathBuf,
    },
    /// Print only the directory hash, as it appears on the wire.
    Hash {
        /// Path to the directory JSON.
        directory: PathBuf,
    },
    /// Summarize a compressed delta payload.
    Inspect {
        /// Path to the payload bytes.
        payload: PathBuf,
        /// Directory JSON describing the payload contents.
        #[arg(long)]
        directory: PathBuf,
    },
    /// Decode a compressed delta payload into its change-list.
    Decode {
        /// Path to the payload bytes.
        payload: PathBuf,
        /// Directory JSON describing the payload contents.
        #[arg(long)]
        directory: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value_t = DecodeFormat::Json)]
        format: DecodeFormat,
    },
    /// Compress a file with the static entropy table.
    Compress {
        input: PathBuf,
        output: PathBuf,
    },
    /// Decompress a file produced by `compress`.
    Decompress {
        input: PathBuf,
        output: PathBuf,
        /// Upper bound on the decompressed size, in bytes.
        #[arg(long, default_value_t = 16 * 1024 * 1024)]
        max_size: usize,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DecodeFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Dump { directory } => {
            let directory = load_directory(&directory)?;
            let json = serde_json::to_string_pretty(&directory).context("serialize json")?;
            println!("{json}");
            println!("hash: 0x{:016x}", directory::directory_hash(&directory));
        }
        Command::Hash { directory } => {
            let directory = load_directory(&directory)?;
            println!("0x{:016x}", directory::directory_hash(&directory));
        }
        Command::Inspect { payload, directory } => {
            let bytes = read_payload(&payload)?;
            let directory = load_directory(&directory)?;
            let report = inspect_payload(&bytes, &directory, &CodecLimits::default())?;
            if report.from_tick.is_none() {
                println!("full snapshot @ tick {}", report.to_tick.raw());
            } else {
                println!(
                    "delta {} -> {}",
                    report.from_tick.raw(),
                    report.to_tick.raw()
                );
            }
            println!(
                "wire: {} bytes, change-list: {} bytes",
                report.compressed_len, report.payload_len
            );
            println!(
                "removed: {}  added: {}  changed: {} ({} fields)",
                report.removed, report.added, report.changed, report.changed_fields
            );
        }
        Command::Decode {
            payload,
            directory,
            format,
        } => {
            let bytes = read_payload(&payload)?;
            let directory = load_directory(&directory)?;
            let change = decode_payload(&bytes, &directory, &CodecLimits::default())?;
            match format {
                DecodeFormat::Json => {
                    let value = change_list_json(&change, &directory);
                    let json = serde_json::to_string_pretty(&value).context("serialize json")?;
                    println!("{json}");
                }
                DecodeFormat::Pretty => {
                    print!("{}", format_change_pretty(&change, &directory));
                }
            }
        }
        Command::Compress { input, output } => {
            let bytes = fs::read(&input).with_context(|| format!("read {}", input.display()))?;
            let mut compressed = vec![0u8; bytes.len() * 4 + 16];
            let written = Huffman::global()
                .compress(&bytes, &mut compressed)
                .context("entropy encode")?;
            compressed.truncate(written);
            fs::write(&output, &compressed)
                .with_context(|| format!("write {}", output.display()))?;
            println!("{} -> {} bytes", bytes.len(), written);
        }
        Command::Decompress {
            input,
            output,
            max_size,
        } => {
            let bytes = fs::read(&input).with_context(|| format!("read {}", input.display()))?;
            let mut expanded = vec![0u8; max_size];
            let written = Huffman::global()
                .decompress(&bytes, &mut expanded)
                .context("entropy decode")?;
            expanded.truncate(written);
            fs::write(&output, &expanded)
                .with_context(|| format!("write {}", output.display()))?;
            println!("{} -> {} bytes", bytes.len(), written);
        }
    }
    Ok(())
}

fn load_directory(path: &PathBuf) -> Result<codec::Directory> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read directory {}", path.display()))?;
    let directory: codec::Directory =
        serde_json::from_str(&contents).context("parse directory json")?;
    directory
        .validate()
        .map_err(|err| anyhow::anyhow!("directory validation failed: {err}"))?;
    Ok(directory)
}

fn read_payload(path: &PathBuf) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("read payload {}", path.display()))
}
