//! blindwire - Inspect protobuf-encoded bytes without a schema
//!
//! This tool decodes raw protobuf wire format data from files, directories,
//! hex strings or stdin and prints the recovered field structure.

use anyhow::{bail, Context, Result};
use blindwire_core::render::hex_preview;
use blindwire_core::{
    Decoder, DecoderConfig, Field, FieldList, RenderConfig, StatsVisitor, TreeRenderer,
};
use clap::{Args, Parser, ValueEnum};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Inspect protobuf-encoded bytes without a schema
#[derive(Parser, Debug)]
#[command(name = "blindwire")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value = "tree")]
    format: OutputFormat,

    /// Never treat a leading zero byte as a framing header
    #[arg(long)]
    no_frame: bool,

    /// Maximum nesting depth for nested message inference
    #[arg(long, default_value_t = blindwire_core::decoder::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Maximum number of payload bytes shown per field (0 = unlimited)
    #[arg(long, default_value = "64")]
    max_bytes: usize,

    /// Show printable payloads as hex instead of strings
    #[arg(long)]
    no_strings: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a file containing encoded bytes
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory of files to decode
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Encoded bytes as a hex string (whitespace and a 0x prefix are ignored)
    #[arg(long)]
    hex: Option<String>,

    /// Read encoded bytes from stdin
    #[arg(long)]
    stdin: bool,
}

/// Output format for decoded data
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Nested field tree
    Tree,
    /// Top-level fields only, without nested message inference
    Flat,
    /// Field counts per wire type
    Stats,
}

/// Tracks seen inputs so identical files are only decoded once
#[derive(Default)]
struct InputRegistry {
    /// Maps content hash -> first path with that content
    seen: HashMap<blake3::Hash, PathBuf>,
    /// Statistics
    stats: RegistryStats,
}

#[derive(Default)]
struct RegistryStats {
    total_found: usize,
    duplicates_skipped: usize,
    decoded: usize,
}

impl InputRegistry {
    fn new() -> Self {
        Self::default()
    }

    /// Compute the blake3 hash of the content
    fn content_hash(data: &[u8]) -> blake3::Hash {
        blake3::hash(data)
    }

    /// Short form of a hash for display (first 8 hex chars)
    fn short_hash(hash: &blake3::Hash) -> String {
        hash.to_hex()[..8].to_string()
    }

    /// Register an input, returning the earlier path if the content was
    /// already seen
    fn register(&mut self, path: &Path, content_hash: blake3::Hash) -> Option<PathBuf> {
        self.stats.total_found += 1;

        if let Some(first) = self.seen.get(&content_hash) {
            debug!(
                "Skipping duplicate: {} (same content as {})",
                path.display(),
                first.display()
            );
            self.stats.duplicates_skipped += 1;
            return Some(first.clone());
        }

        self.seen.insert(content_hash, path.to_path_buf());
        None
    }

    fn print_summary(&self) {
        info!(
            "Summary: {} found, {} duplicates skipped, {} decoded",
            self.stats.total_found, self.stats.duplicates_skipped, self.stats.decoded
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&cli, &mut out)
}

/// Dispatch based on input mode
fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    if let Some(ref file) = cli.input.file {
        process_single_file(cli, file, out)
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(cli, directory, out)
    } else if let Some(ref hex) = cli.input.hex {
        let data = parse_hex(hex)?;
        write_decoded(cli, data, out)
    } else if cli.input.stdin {
        let mut data = Vec::new();
        io::stdin()
            .read_to_end(&mut data)
            .context("Failed to read stdin")?;
        write_decoded(cli, data, out)
    } else {
        bail!("One of --file, --directory, --hex or --stdin must be specified")
    }
}

/// Decode a single file
fn process_single_file(cli: &Cli, file: &Path, out: &mut impl Write) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    trace!("Reading {}", file.display());
    let data = fs::read(file)
        .with_context(|| format!("Failed to read input file: {}", file.display()))?;
    write_decoded(cli, data, out)
}

/// Decode every file in a directory recursively
fn process_directory(cli: &Cli, directory: &Path, out: &mut impl Write) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut registry = InputRegistry::new();

    // Sorted so output order does not depend on the filesystem
    for entry in WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        // Skip directories
        if !path.is_file() {
            continue;
        }

        // Skip hidden files
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
        {
            continue;
        }

        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                // Log error but continue with other files
                warn!("Error reading {}: {}", path.display(), e);
                continue;
            }
        };

        let content_hash = InputRegistry::content_hash(&data);
        if let Some(first) = registry.register(path, content_hash) {
            writeln!(out, "== {} (same as {})", path.display(), first.display())?;
            continue;
        }

        writeln!(
            out,
            "== {} ({} bytes, blake3 {})",
            path.display(),
            data.len(),
            InputRegistry::short_hash(&content_hash)
        )?;
        write_decoded(cli, data, out)?;
        registry.stats.decoded += 1;
    }

    registry.print_summary();
    Ok(())
}

/// Parse hex input, tolerating whitespace and a `0x` prefix
fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let compact: String = input.split_whitespace().collect();
    let digits = compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
        .unwrap_or(&compact);
    hex::decode(digits).with_context(|| format!("Invalid hex input: {}", input))
}

fn decoder_for(cli: &Cli) -> Decoder {
    Decoder::with_config(
        DecoderConfig::new()
            .skip_frame_header(!cli.no_frame)
            .max_depth(cli.max_depth),
    )
}

fn render_config_for(cli: &Cli) -> RenderConfig {
    RenderConfig::new()
        .max_bytes(cli.max_bytes)
        .detect_strings(!cli.no_strings)
}

fn write_decoded(cli: &Cli, data: Vec<u8>, out: &mut impl Write) -> Result<()> {
    out.write_all(format_output(cli, data).as_bytes())?;
    Ok(())
}

/// Decode `data` and format it according to the selected output format
fn format_output(cli: &Cli, data: Vec<u8>) -> String {
    let decoder = decoder_for(cli);
    let mut output = String::new();

    match cli.format {
        OutputFormat::Tree => {
            let report = decoder.decode_report(data);
            if let Some(header) = report.frame_header {
                output.push_str(&format!(
                    "# frame header: flag {}, length {}\n",
                    header.flag, header.length
                ));
            }
            output.push_str(
                &TreeRenderer::new(&report.fields)
                    .with_config(render_config_for(cli))
                    .render(),
            );
            push_leftover(&mut output, &report.leftover, cli.max_bytes);
        }
        OutputFormat::Flat => {
            let segment = decoder.decode_segment(data);
            let fields: FieldList = segment.fields.into_iter().map(Field::from).collect();
            output.push_str(
                &TreeRenderer::new(&fields)
                    .with_config(render_config_for(cli))
                    .render(),
            );
            push_leftover(&mut output, &segment.leftover, cli.max_bytes);
        }
        OutputFormat::Stats => {
            let report = decoder.decode_report(data);
            let stats = StatsVisitor::collect(&report.fields);
            output.push_str(&format!(
                "fields: {}\nvarint: {}\ni32: {}\ni64: {}\nlen: {}\nmessages: {}\nmax depth: {}\nleftover bytes: {}\n",
                stats.field_count,
                stats.varint_count,
                stats.fixed32_count,
                stats.fixed64_count,
                stats.length_delimited_count,
                stats.message_count,
                stats.max_depth,
                report.leftover.len()
            ));
        }
    }

    output
}

fn push_leftover(output: &mut String, leftover: &[u8], max_bytes: usize) {
    if !leftover.is_empty() {
        output.push_str(&format!(
            "# {} undecoded byte(s): {}\n",
            leftover.len(),
            hex_preview(leftover, max_bytes)
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("blindwire").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("089601").unwrap(), vec![0x08, 0x96, 0x01]);
        assert_eq!(parse_hex("0x08 96 01").unwrap(), vec![0x08, 0x96, 0x01]);
        assert!(parse_hex("0g").is_err());
    }

    #[test]
    fn test_tree_output() {
        let cli = cli(&["--hex", "1a0c089601120774657374696e67ff"]);
        let output = format_output(&cli, parse_hex(cli.input.hex.as_deref().unwrap()).unwrap());
        assert_eq!(
            output,
            "3: {\n  1: 150\n  2: \"testing\"\n}\n# 1 undecoded byte(s): ff\n"
        );
    }

    #[test]
    fn test_tree_output_with_frame() {
        let cli = cli(&["--hex", "0000000003089601"]);
        let output = format_output(&cli, vec![0, 0, 0, 0, 3, 0x08, 0x96, 0x01]);
        assert_eq!(output, "# frame header: flag 0, length 3\n1: 150\n");
    }

    #[test]
    fn test_no_frame_flag() {
        let cli = cli(&["--hex", "00", "--no-frame", "--format", "flat"]);
        let output = format_output(&cli, vec![0, 0, 0, 0, 0]);
        assert_eq!(output, "0: 0\n0: 0\n# 1 undecoded byte(s): 00\n");
    }

    #[test]
    fn test_flat_output() {
        let cli = cli(&["--hex", "00", "--format", "flat"]);
        let output = format_output(&cli, vec![0x0A, 0x02, 0x08, 0x01]);
        assert_eq!(output, "1: bytes 0801\n");
    }

    #[test]
    fn test_stats_output() {
        let cli = cli(&["--hex", "00", "--format", "stats"]);
        let output = format_output(&cli, vec![0x0A, 0x02, 0x08, 0x01]);
        assert!(output.contains("fields: 2\n"));
        assert!(output.contains("messages: 1\n"));
        assert!(output.contains("max depth: 1\n"));
        assert!(output.contains("leftover bytes: 0\n"));
    }

    #[test]
    fn test_input_registry_deduplication() {
        let mut registry = InputRegistry::new();
        let hash = InputRegistry::content_hash(b"\x08\x01");

        assert!(registry.register(Path::new("a.bin"), hash).is_none());
        let first = registry.register(Path::new("b.bin"), hash);
        assert_eq!(first, Some(PathBuf::from("a.bin")));

        let other = InputRegistry::content_hash(b"\x08\x02");
        assert!(registry.register(Path::new("c.bin"), other).is_none());

        assert_eq!(registry.stats.total_found, 3);
        assert_eq!(registry.stats.duplicates_skipped, 1);
    }

    #[test]
    fn test_content_hash() {
        let hash1 = InputRegistry::content_hash(b"hello");
        let hash2 = InputRegistry::content_hash(b"hello");
        let hash3 = InputRegistry::content_hash(b"world");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
        assert_eq!(InputRegistry::short_hash(&hash1).len(), 8);
    }

    #[test]
    fn test_registry_keys_on_full_hash() {
        let mut low = [0u8; 32];
        let mut high = [0u8; 32];
        low[31] = 0x01;
        high[31] = 0x02;
        let (low, high) = (blake3::Hash::from(low), blake3::Hash::from(high));
        assert_eq!(InputRegistry::short_hash(&low), InputRegistry::short_hash(&high));

        let mut registry = InputRegistry::new();
        assert!(registry.register(Path::new("a.bin"), low).is_none());
        assert!(registry.register(Path::new("b.bin"), high).is_none());
        assert_eq!(registry.stats.duplicates_skipped, 0);
    }

    #[test]
    fn test_process_directory() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.bin"), b"\x08\x96\x01").unwrap();
        fs::write(temp_dir.path().join("b.bin"), b"\x08\x96\x01").unwrap();
        fs::write(temp_dir.path().join(".hidden"), b"\x08\x01").unwrap();

        let dir = temp_dir.path().to_str().unwrap();
        let cli = cli(&["--directory", dir]);
        let mut out = Vec::new();
        run(&cli, &mut out).unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("a.bin (3 bytes, blake3 "));
        assert!(output.contains("1: 150\n"));
        assert!(output.contains("b.bin (same as "));
        assert!(!output.contains(".hidden"));
    }

    #[test]
    fn test_process_single_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("msg.bin");
        fs::write(&path, b"\x12\x07testing").unwrap();

        let cli = cli(&["--file", path.to_str().unwrap()]);
        let mut out = Vec::new();
        run(&cli, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "2: \"testing\"\n");
    }

    #[test]
    fn test_missing_file() {
        let cli = cli(&["--file", "/definitely/not/here.bin"]);
        assert!(run(&cli, &mut Vec::<u8>::new()).is_err());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
