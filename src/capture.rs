//! CSV capture loader.
//!
//! A capture is a CSV file with one row per sample and one column per wired
//! channel, named per [`ChannelId::name`] (case-insensitive). An optional
//! `sample` (or `time`/`index`) column carries the sample index; without it,
//! rows are numbered from zero. Cell values are `0` or `1`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::sampler::{ChannelId, LogicSample, TraceSampler};
use crate::{DecodeError, SampleIndex};

/// Column names accepted for the sample-index column.
const INDEX_COLUMNS: [&str; 3] = ["sample", "time", "index"];

/// Load a capture file from disk.
pub fn load_capture_file(path: &Path) -> Result<TraceSampler, DecodeError> {
    let file = File::open(path)?;
    read_capture(file)
}

/// Read a capture from any CSV source.
pub fn read_capture<R: Read>(source: R) -> Result<TraceSampler, DecodeError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let mut index_column: Option<usize> = None;
    let mut channel_columns: Vec<(usize, ChannelId)> = Vec::new();
    let mut present = [false; ChannelId::COUNT];

    for (column, header) in headers.iter().enumerate() {
        let lower = header.to_ascii_lowercase();
        if INDEX_COLUMNS.contains(&lower.as_str()) {
            if index_column.is_some() {
                return Err(DecodeError::CaptureError("duplicate sample-index column".to_string()));
            }
            index_column = Some(column);
            continue;
        }
        let ch = ChannelId::from_name(&lower)
            .ok_or_else(|| DecodeError::CaptureError(format!("unknown channel column '{}'", header)))?;
        if present[ch.index()] {
            return Err(DecodeError::CaptureError(format!("duplicate channel column '{}'", header)));
        }
        present[ch.index()] = true;
        channel_columns.push((column, ch));
    }

    for ch in ChannelId::MANDATORY {
        if !present[ch.index()] {
            return Err(DecodeError::MissingChannel(ch));
        }
    }

    let mut samples: Vec<LogicSample> = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let index: SampleIndex = match index_column {
            Some(column) => parse_index(record.get(column).unwrap_or(""), row)?,
            None => row as SampleIndex,
        };
        if let Some(last) = samples.last() {
            if index <= last.index {
                return Err(DecodeError::CaptureError(format!(
                    "non-monotonic sample index {} at row {}",
                    index,
                    row + 1
                )));
            }
        }

        let mut levels = [false; ChannelId::COUNT];
        for &(column, ch) in &channel_columns {
            levels[ch.index()] = parse_level(record.get(column).unwrap_or(""), ch, row)?;
        }
        samples.push(LogicSample::new(index, levels));
    }

    log::debug!("capture loaded: {} samples, {} channels", samples.len(), channel_columns.len());
    Ok(TraceSampler::new(samples, present))
}

fn parse_index(cell: &str, row: usize) -> Result<SampleIndex, DecodeError> {
    cell.parse().map_err(|_| {
        DecodeError::CaptureError(format!("bad sample index '{}' at row {}", cell, row + 1))
    })
}

fn parse_level(cell: &str, ch: ChannelId, row: usize) -> Result<bool, DecodeError> {
    match cell {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(DecodeError::CaptureError(format!(
            "bad level '{}' for {} at row {}",
            other,
            ch,
            row + 1
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::BusSampler;
    use std::io::Write;

    const HEADER: &str = "d0,d1,d2,d3,d4,d5,d6,d7,diow,dior,cs0,cs1,da0,da1,da2";

    fn idle_row() -> &'static str {
        // Strobes and selects high, everything else low.
        "0,0,0,0,0,0,0,0,1,1,1,1,0,0,0"
    }

    #[test]
    fn test_minimal_capture() {
        // Idle, then DIOW- falls with CS0 asserted, DA=7, data 0x20.
        let csv = format!(
            "{}\n{}\n0,0,0,0,0,1,0,0,1,1,0,1,1,1,1\n0,0,0,0,0,1,0,0,0,1,0,1,1,1,1\n",
            HEADER,
            idle_row()
        );
        let mut sampler = read_capture(csv.as_bytes()).unwrap();
        assert_eq!(sampler.len(), 3);

        let (ch, at) = sampler.wait_edge(&[ChannelId::Diow, ChannelId::Dior]).unwrap();
        assert_eq!(ch, ChannelId::Diow);
        assert_eq!(at, 2);
        let snap = sampler.snapshot();
        assert_eq!(snap.data_bus(), 0x20);
        assert_eq!(snap.address(), 7);
        assert!(!sampler.is_wired(ChannelId::Dmarq));
    }

    #[test]
    fn test_explicit_index_column() {
        let csv = format!("sample,{}\n100,{}\n250,{}\n", HEADER, idle_row(), idle_row());
        let sampler = read_capture(csv.as_bytes()).unwrap();
        assert_eq!(sampler.len(), 2);
        assert_eq!(sampler.snapshot().index, 100);
    }

    #[test]
    fn test_optional_channels_wired() {
        let csv = format!("{},dmarq\n{},1\n", HEADER, idle_row());
        let sampler = read_capture(csv.as_bytes()).unwrap();
        assert!(sampler.is_wired(ChannelId::Dmarq));
        assert!(sampler.snapshot().level(ChannelId::Dmarq));
    }

    #[test]
    fn test_missing_mandatory_channel() {
        let err = read_capture("d0,d1\n0,0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::MissingChannel(_)));
    }

    #[test]
    fn test_unknown_column_rejected() {
        let csv = format!("{},bogus\n{},0\n", HEADER, idle_row());
        let err = read_capture(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::CaptureError(_)));
    }

    #[test]
    fn test_non_monotonic_index_rejected() {
        let csv = format!("sample,{}\n5,{}\n5,{}\n", HEADER, idle_row(), idle_row());
        let err = read_capture(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::CaptureError(_)));
    }

    #[test]
    fn test_bad_level_rejected() {
        let csv = format!("{}\n2,0,0,0,0,0,0,0,1,1,1,1,0,0,0\n", HEADER);
        let err = read_capture(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::CaptureError(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}\n{}\n", HEADER, idle_row()).unwrap();
        let sampler = load_capture_file(file.path()).unwrap();
        assert_eq!(sampler.len(), 1);
    }
}
