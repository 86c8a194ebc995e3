//! Python bindings for the pata_taskfile decoder

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::capture;
use crate::decoder::{CycleDecoder, DecoderOptions};
use crate::format::OutputFormat;
use crate::tables::{self, CommandTables};
use crate::Annotation;

/// Decode a CSV capture with the given options and output format
#[pyfunction]
#[pyo3(signature = (
    capture_csv,
    parse_cdb=true,
    ignore_data=true,
    squelch_dma=true,
    emit_reads=false,
    output_format="text",
    ata_overrides=None,
    cdb_overrides=None
))]
fn decode(
    capture_csv: &str,
    parse_cdb: bool,
    ignore_data: bool,
    squelch_dma: bool,
    emit_reads: bool,
    output_format: &str,
    ata_overrides: Option<&str>,
    cdb_overrides: Option<&str>,
) -> PyResult<String> {
    let mut sampler = capture::read_capture(capture_csv.as_bytes())
        .map_err(|e| PyValueError::new_err(format!("Failed to parse capture: {}", e)))?;

    let format: OutputFormat = output_format
        .parse()
        .map_err(|e: String| PyValueError::new_err(e))?;

    let mut command_tables = CommandTables::new();
    if let Some(json) = ata_overrides {
        command_tables.custom_commands = tables::parse_overrides(json)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
    }
    if let Some(json) = cdb_overrides {
        command_tables.custom_cdb = tables::parse_overrides(json)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
    }

    let options = DecoderOptions { parse_cdb, ignore_data, squelch_dma, emit_reads };
    let mut decoder = CycleDecoder::with_tables(options, command_tables);
    let mut annotations: Vec<Annotation> = Vec::new();
    decoder.run(&mut sampler, &mut annotations);

    format
        .get_formatter()
        .format(&annotations)
        .map_err(|e| PyValueError::new_err(format!("Failed to format output: {}", e)))
}

/// The pata_taskfile Python module
#[pymodule]
fn pata_taskfile(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(decode, m)?)?;
    Ok(())
}
