//! Aggregate summary formatter

use std::collections::HashMap;

use crate::{Annotation, DecodeError};
use super::AnnotationFormatter;

impl AnnotationFormatter for super::SummaryFormatter {
    fn format(&self, annotations: &[Annotation]) -> Result<String, DecodeError> {
        let mut output = String::new();

        if annotations.is_empty() {
            output.push_str("0 annotations\n");
            return Ok(output);
        }

        let first = annotations.first().map(|a| a.start).unwrap_or(0);
        let last = annotations.last().map(|a| a.end).unwrap_or(0);
        output.push_str(&format!(
            "{} annotations over samples {}..{}\n\n",
            annotations.len(),
            first,
            last
        ));

        // Count per annotation class
        let mut by_kind: HashMap<&'static str, usize> = HashMap::new();
        for ann in annotations {
            *by_kind.entry(ann.kind.label()).or_insert(0) += 1;
        }

        let mut counts: Vec<(&str, usize)> = by_kind.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

        for (label, count) in counts {
            output.push_str(&format!("{:>8}  {}\n", count, label));
        }

        Ok(output)
    }
}
