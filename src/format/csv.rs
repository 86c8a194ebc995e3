//! CSV output formatter

use crate::{Annotation, DecodeError};
use super::AnnotationFormatter;

impl AnnotationFormatter for super::CsvFormatter {
    fn format(&self, annotations: &[Annotation]) -> Result<String, DecodeError> {
        let mut output = String::new();

        // CSV header
        output.push_str("start,end,kind,row,text\n");

        for ann in annotations {
            // Escape the free-form text field, which may contain commas
            let text = escape_csv_field(&ann.text);

            output.push_str(&format!(
                "{},{},{},{},{}\n",
                ann.start,
                ann.end,
                ann.kind.label(),
                ann.kind.row().label(),
                text
            ));
        }

        Ok(output)
    }
}

/// Quote a field when it contains a comma, quote, or newline.
fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::super::{AnnotationFormatter, CsvFormatter};
    use super::escape_csv_field;
    use crate::{Annotation, AnnotationKind};

    #[test]
    fn test_csv_formatter() {
        let annotations = vec![
            Annotation::new(4, 4, AnnotationKind::Status, "STATUS read: 0x50".to_string()),
            Annotation::new(7, 7, AnnotationKind::Warning, "a, b".to_string()),
        ];
        let result = CsvFormatter.format(&annotations).unwrap();
        let lines: Vec<&str> = result.lines().collect();

        assert_eq!(lines[0], "start,end,kind,row,text");
        assert_eq!(lines[1], "4,4,status,regs,STATUS read: 0x50");
        assert_eq!(lines[2], "7,7,warn,ints,\"a, b\"");
    }

    #[test]
    fn test_escape_csv_field() {
        assert_eq!(escape_csv_field("plain"), "plain");
        assert_eq!(escape_csv_field("has,comma"), "\"has,comma\"");
        assert_eq!(escape_csv_field("has\"quote"), "\"has\"\"quote\"");
    }
}
