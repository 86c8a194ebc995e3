//! JSON and JSON Lines output formatters

use serde::{Serialize, Deserialize};
use serde_json::json;

use crate::{Annotation, DecodeError};
use super::AnnotationFormatter;

/// Serializable annotation for JSON output
#[derive(Serialize, Deserialize)]
struct AnnotationJson {
    /// Sample index of the cycle start
    start: u64,
    /// Sample index of the cycle end
    end: u64,
    /// Annotation class tag
    kind: String,
    /// Display row the class belongs to
    row: String,
    /// Human-readable text
    text: String,
}

/// Serializable decode result for JSON output
#[derive(Serialize, Deserialize)]
struct DecodeJson {
    annotations: Vec<AnnotationJson>,
}

fn annotation_to_json(ann: &Annotation) -> AnnotationJson {
    AnnotationJson {
        start: ann.start,
        end: ann.end,
        kind: ann.kind.label().to_string(),
        row: ann.kind.row().label().to_string(),
        text: ann.text.clone(),
    }
}

impl AnnotationFormatter for super::JsonFormatter {
    fn format(&self, annotations: &[Annotation]) -> Result<String, DecodeError> {
        let result = DecodeJson {
            annotations: annotations.iter().map(annotation_to_json).collect(),
        };

        serde_json::to_string_pretty(&result)
            .map_err(|e| DecodeError::Generic(format!("JSON serialization error: {}", e)))
    }
}

impl AnnotationFormatter for super::JsonLinesFormatter {
    fn format(&self, annotations: &[Annotation]) -> Result<String, DecodeError> {
        let mut output = String::new();

        for ann in annotations {
            let record = json!({
                "start": ann.start,
                "end": ann.end,
                "kind": ann.kind.label(),
                "row": ann.kind.row().label(),
                "text": ann.text,
            });

            output.push_str(&serde_json::to_string(&record)
                .map_err(|e| DecodeError::Generic(format!("JSON serialization error: {}", e)))?);
            output.push('\n');
        }

        Ok(output)
    }
}
