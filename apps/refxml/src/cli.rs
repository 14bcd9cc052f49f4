//! # CLI Module
//!
//! Command definitions and handlers. Every handler takes plain paths and
//! options so integration tests can call it without going through clap.

use clap::{Parser, Subcommand};
use refxml_core::formats::{decode_snapshot, encode_snapshot, is_snapshot};
use refxml_core::{Document, GraphStats, ReferenceMode, SerializerConfig, XmlSerializer, fixtures};
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};

pub type CliResult<T> = Result<T, Box<dyn Error>>;

// =============================================================================
// ARGUMENTS
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "refxml", version, about = "Reference-preserving XML serializer")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON file with serializer options
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Reference keying: byid, generated or disabled
    #[arg(long, global = true)]
    pub references: Option<ReferenceMode>,

    /// Write XML without indentation
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a fixture document
    Sample {
        /// cycle, alias, list, dictionary, chain or full
        kind: String,
        #[arg(short, long)]
        output: PathBuf,
        /// Item count for list, dictionary and chain
        #[arg(long, default_value_t = 3)]
        size: usize,
        /// xml or binary
        #[arg(long, default_value = "xml")]
        format: String,
    },
    /// Read a document, write it back out, and verify the result is equivalent
    Roundtrip {
        input: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Report object count, cycles and shared objects
    Inspect {
        input: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Convert between XML and binary snapshots
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// xml or binary
        #[arg(long)]
        to: String,
    },
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> CliResult<()> {
    let config = load_config(cli.config.as_deref(), cli.references, cli.compact)?;
    match cli.command {
        Commands::Sample {
            kind,
            output,
            size,
            format,
        } => cmd_sample(&kind, size, &output, &format, &config),
        Commands::Roundtrip { input, json } => cmd_roundtrip(&input, &config, json).map(|_| ()),
        Commands::Inspect { input, json } => cmd_inspect(&input, &config, json).map(|_| ()),
        Commands::Convert { input, output, to } => cmd_convert(&input, &output, &to, &config),
    }
}

// =============================================================================
// CONFIG AND FILE HELPERS
// =============================================================================

/// Build the serializer config: defaults, then the JSON file, then flags.
pub fn load_config(
    path: Option<&Path>,
    references: Option<ReferenceMode>,
    compact: bool,
) -> CliResult<SerializerConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str(&text)?
        }
        None => SerializerConfig::default(),
    };
    if let Some(mode) = references {
        config.reference_mode = mode;
    }
    if compact {
        config.indent = None;
    }
    tracing::debug!(?config, "serializer config");
    Ok(config)
}

/// Load a document, detecting binary snapshots by their header.
pub fn read_document(path: &Path, config: &SerializerConfig) -> CliResult<Document> {
    let bytes = std::fs::read(path)?;
    let doc = if is_snapshot(&bytes) {
        decode_snapshot(&bytes)?
    } else {
        let xml = String::from_utf8(bytes)?;
        XmlSerializer::new(config.clone()).deserialize(&xml)?
    };
    tracing::info!(
        path = %path.display(),
        objects = doc.graph.len(),
        root = doc.root.type_name(),
        "loaded document"
    );
    Ok(doc)
}

/// Write a document as `xml` or `binary`.
pub fn write_document(
    doc: &Document,
    path: &Path,
    format: &str,
    config: &SerializerConfig,
) -> CliResult<()> {
    let bytes = match format {
        "xml" => XmlSerializer::new(config.clone()).serialize(doc)?.into_bytes(),
        "binary" => encode_snapshot(doc)?,
        other => return Err(format!("unknown format '{other}' (expected xml or binary)").into()),
    };
    std::fs::write(path, &bytes)?;
    tracing::info!(path = %path.display(), format, bytes = bytes.len(), "wrote document");
    Ok(())
}

// =============================================================================
// COMMANDS
// =============================================================================

/// `sample`: write a named fixture.
pub fn cmd_sample(
    kind: &str,
    size: usize,
    output: &Path,
    format: &str,
    config: &SerializerConfig,
) -> CliResult<()> {
    let doc = fixtures::by_name(kind, size).ok_or_else(|| {
        format!(
            "unknown sample '{kind}' (expected one of: {})",
            fixtures::FIXTURE_NAMES.join(", ")
        )
    })?;
    write_document(&doc, output, format, config)?;
    println!("Wrote {kind} sample to {}", output.display());
    Ok(())
}

/// Outcome of a roundtrip check.
#[derive(Debug, Clone, Serialize)]
pub struct RoundtripReport {
    pub input: String,
    pub objects_before: usize,
    pub objects_after: usize,
    pub xml_bytes: usize,
    pub equivalent: bool,
}

/// `roundtrip`: read, serialize to XML, read back, compare.
pub fn cmd_roundtrip(
    input: &Path,
    config: &SerializerConfig,
    json: bool,
) -> CliResult<RoundtripReport> {
    let doc = read_document(input, config)?;
    let serializer = XmlSerializer::new(config.clone());
    tracing::debug!(mode = %serializer.config().reference_mode, "serializing");
    let xml = serializer.serialize(&doc)?;
    let restored = serializer.deserialize(&xml)?;

    let report = RoundtripReport {
        input: input.display().to_string(),
        objects_before: doc.graph.len(),
        objects_after: restored.graph.len(),
        xml_bytes: xml.len(),
        equivalent: restored.equivalent(&doc),
    };
    tracing::info!(equivalent = report.equivalent, "roundtrip finished");

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{}: {} -> {} objects, {} bytes of XML, {}",
            report.input,
            report.objects_before,
            report.objects_after,
            report.xml_bytes,
            if report.equivalent { "equivalent" } else { "NOT equivalent" }
        );
    }

    if !report.equivalent {
        return Err(format!("roundtrip of {} is not equivalent", input.display()).into());
    }
    Ok(report)
}

/// `inspect`: print graph statistics.
pub fn cmd_inspect(input: &Path, config: &SerializerConfig, json: bool) -> CliResult<GraphStats> {
    let doc = read_document(input, config)?;
    let stats = doc.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Root:      {}", stats.root_type);
        println!("Objects:   {}", stats.objects);
        println!("Reachable: {}", stats.reachable);
        println!("Cycle:     {}", if stats.has_cycle { "yes" } else { "no" });
        if stats.shared.is_empty() {
            println!("Shared:    none");
        } else {
            let shared: Vec<String> = stats.shared.iter().map(ToString::to_string).collect();
            println!("Shared:    {}", shared.join(", "));
        }
    }
    Ok(stats)
}

/// `convert`: rewrite a document in another format.
pub fn cmd_convert(
    input: &Path,
    output: &Path,
    to: &str,
    config: &SerializerConfig,
) -> CliResult<()> {
    let doc = read_document(input, config)?;
    write_document(&doc, output, to, config)?;
    println!("Converted {} -> {} ({to})", input.display(), output.display());
    Ok(())
}
