//! Command-line front end: decode PATA task-file traffic from capture files.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;

use pata_taskfile::capture;
use pata_taskfile::decoder::{CycleDecoder, DecoderOptions};
use pata_taskfile::format::OutputFormat;
use pata_taskfile::tables::{self, CommandTables};
use pata_taskfile::Annotation;

#[derive(Debug, Parser)]
#[command(
    name = "pata_taskfile",
    about = "Decode PATA/IDE task-file register traffic from logic-trace captures"
)]
struct Args {
    /// Capture files (CSV, one column per wired channel)
    #[arg(required = true)]
    captures: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not decode ATAPI PACKET CDB bytes into mnemonics
    #[arg(long)]
    no_parse_cdb: bool,

    /// Annotate raw Data register accesses outside a CDB window
    #[arg(long)]
    show_data: bool,

    /// Keep cycles observed while DMARQ is asserted
    #[arg(long)]
    no_squelch_dma: bool,

    /// Annotate ordinary register reads in addition to Status/AltStatus
    #[arg(long)]
    emit_reads: bool,

    /// JSON file overriding ATA command mnemonics, e.g. {"0x85": "MY OP"}
    #[arg(long)]
    ata_table: Option<PathBuf>,

    /// JSON file overriding ATAPI CDB mnemonics
    #[arg(long)]
    cdb_table: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let options = DecoderOptions {
        parse_cdb: !args.no_parse_cdb,
        ignore_data: !args.show_data,
        squelch_dma: !args.no_squelch_dma,
        emit_reads: args.emit_reads,
    };

    let mut command_tables = CommandTables::new();
    if let Some(path) = &args.ata_table {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        command_tables.custom_commands = tables::parse_overrides(&json)?;
    }
    if let Some(path) = &args.cdb_table {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        command_tables.custom_cdb = tables::parse_overrides(&json)?;
    }

    // Each capture is an independent decode session; fan out, then print in
    // input order.
    let results: Vec<Result<String>> = args
        .captures
        .par_iter()
        .map(|path| decode_capture(path, options, &command_tables, args.format))
        .collect();

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };

    let banner = args.captures.len() > 1 && args.format == OutputFormat::Text;
    for (path, result) in args.captures.iter().zip(results) {
        let formatted = result?;
        if banner {
            writeln!(out, "== {} ==", path.display())?;
        }
        out.write_all(formatted.as_bytes())?;
    }

    Ok(())
}

fn decode_capture(
    path: &PathBuf,
    options: DecoderOptions,
    command_tables: &CommandTables,
    format: OutputFormat,
) -> Result<String> {
    let mut sampler = capture::load_capture_file(path)
        .with_context(|| format!("failed to load capture {}", path.display()))?;

    let mut decoder = CycleDecoder::with_tables(options, command_tables.clone());
    let mut annotations: Vec<Annotation> = Vec::new();
    decoder.run(&mut sampler, &mut annotations);
    log::debug!("{}: {} annotations", path.display(), annotations.len());

    Ok(format.get_formatter().format(&annotations)?)
}
