//! Output format module implementation

mod json;
mod csv;
mod summary;

pub use self::json::*;
pub use self::csv::*;
pub use self::summary::*;

use crate::{Annotation, DecodeError};
use std::fmt;
use std::str::FromStr;
use clap::ValueEnum;

/// Supported output formats for decoded annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output (default)
    Text,
    /// JSON format (hierarchical)
    Json,
    /// JSON Lines format (one JSON object per line)
    JsonLines,
    /// CSV format (comma-separated values)
    Csv,
    /// Aggregate counts per annotation class
    Summary,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::JsonLines => write!(f, "jsonl"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Summary => write!(f, "summary"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "jsonlines" => Ok(OutputFormat::JsonLines),
            "csv" => Ok(OutputFormat::Csv),
            "summary" => Ok(OutputFormat::Summary),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

impl OutputFormat {
    /// Get all available output formats
    pub fn available_formats() -> &'static [Self] {
        &[
            OutputFormat::Text,
            OutputFormat::Json,
            OutputFormat::JsonLines,
            OutputFormat::Csv,
            OutputFormat::Summary,
        ]
    }

    /// Get a formatter for this output format
    pub fn get_formatter(&self) -> Box<dyn AnnotationFormatter> {
        match self {
            OutputFormat::Text => Box::new(TextFormatter),
            OutputFormat::Json => Box::new(JsonFormatter),
            OutputFormat::JsonLines => Box::new(JsonLinesFormatter),
            OutputFormat::Csv => Box::new(CsvFormatter),
            OutputFormat::Summary => Box::new(SummaryFormatter),
        }
    }
}

/// Formatter trait for decoded annotations
pub trait AnnotationFormatter {
    /// Format an annotation stream
    fn format(&self, annotations: &[Annotation]) -> Result<String, DecodeError>;
}

/// Format annotations as aligned plain text
pub struct TextFormatter;

/// Format annotations as JSON
pub struct JsonFormatter;

/// Format annotations as JSON Lines
pub struct JsonLinesFormatter;

/// Format annotations as CSV
pub struct CsvFormatter;

/// Format an aggregate summary of the annotation stream
pub struct SummaryFormatter;

impl AnnotationFormatter for TextFormatter {
    fn format(&self, annotations: &[Annotation]) -> Result<String, DecodeError> {
        let mut output = String::new();
        for ann in annotations {
            output.push_str(&format!(
                "{:>10} {:>10}  {:<6}  {}\n",
                ann.start,
                ann.end,
                ann.kind.label(),
                ann.text
            ));
        }
        Ok(output)
    }
}
