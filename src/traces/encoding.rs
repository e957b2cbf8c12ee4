//! Binary trace container codec
//!
//! Layout: `[magic:4][version:1][flags:1][meta_len:u32 LE][meta JSON]`
//! `[count:u32 LE][records]` where each record is 20 bytes:
//! timestamp as u64 LE nanoseconds, then x/y/buttons as i32 LE.
//!
//! Decoding validates magic and version strictly — an unsupported version is
//! a hard error, which is also how a file truncated by a crash mid-write is
//! detected on the next load. A reader for the older JSON container remains
//! for traces written before the binary format existed.

use crate::capture::types::Sample;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;

/// File magic for binary trace containers.
pub const TRACE_MAGIC: [u8; 4] = *b"ATRC";

/// Current (and only) binary container version.
pub const TRACE_VERSION: u8 = 1;

/// Stored timestamps are nanosecond-scaled from the millisecond samples.
const NANOS_PER_MILLI: i64 = 1_000_000;

/// Bytes per fixed-size sample record.
const SAMPLE_RECORD_BYTES: usize = 20;

/// Upper bound on the metadata blob; anything larger is corrupt.
const MAX_META_BYTES: u32 = 1 << 20;

/// Errors from encoding or decoding trace containers.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("invalid magic header")]
    BadMagic,

    #[error("unsupported trace version: {0}")]
    UnsupportedVersion(u8),

    #[error("corrupt trace container: {0}")]
    Corrupt(String),

    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("no trace found for {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-session persisted trace data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceContainer {
    pub version: u8,
    pub file_name: String,
    pub scenario_name: String,
    /// RFC 3339 timestamp of the session, as recorded at capture time.
    pub date_played: String,
    pub samples: Vec<Sample>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TraceMetadata {
    file_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    scenario_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    date_played: String,
}

/// Encode a container into the binary format.
pub fn write_binary<W: Write>(writer: &mut W, data: &TraceContainer) -> Result<(), TraceError> {
    writer.write_all(&TRACE_MAGIC)?;
    writer.write_all(&[TRACE_VERSION])?;
    // flags: reserved
    writer.write_all(&[0])?;

    let meta = TraceMetadata {
        file_name: data.file_name.clone(),
        scenario_name: data.scenario_name.clone(),
        date_played: data.date_played.clone(),
    };
    let meta_bytes = serde_json::to_vec(&meta)?;
    writer.write_all(&(meta_bytes.len() as u32).to_le_bytes())?;
    writer.write_all(&meta_bytes)?;

    writer.write_all(&(data.samples.len() as u32).to_le_bytes())?;
    let mut record = [0u8; SAMPLE_RECORD_BYTES];
    for sample in &data.samples {
        let nanos = sample.ts.wrapping_mul(NANOS_PER_MILLI) as u64;
        record[0..8].copy_from_slice(&nanos.to_le_bytes());
        record[8..12].copy_from_slice(&sample.x.to_le_bytes());
        record[12..16].copy_from_slice(&sample.y.to_le_bytes());
        record[16..20].copy_from_slice(&sample.buttons.to_le_bytes());
        writer.write_all(&record)?;
    }
    Ok(())
}

/// Decode a binary container, validating magic and version.
pub fn read_binary<R: Read>(reader: &mut R) -> Result<TraceContainer, TraceError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != TRACE_MAGIC {
        return Err(TraceError::BadMagic);
    }

    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    let version = byte[0];
    if version != TRACE_VERSION {
        return Err(TraceError::UnsupportedVersion(version));
    }
    // flags: reserved, ignored
    reader.read_exact(&mut byte)?;

    let meta_len = read_u32_le(reader)?;
    if meta_len > MAX_META_BYTES {
        return Err(TraceError::Corrupt(format!(
            "metadata length {meta_len} exceeds limit"
        )));
    }
    let mut meta_bytes = vec![0u8; meta_len as usize];
    reader.read_exact(&mut meta_bytes)?;
    let meta: TraceMetadata = serde_json::from_slice(&meta_bytes)?;

    let count = read_u32_le(reader)?;
    let mut samples = Vec::with_capacity((count as usize).min(1 << 20));
    let mut record = [0u8; SAMPLE_RECORD_BYTES];
    for _ in 0..count {
        reader.read_exact(&mut record)?;
        let nanos = u64::from_le_bytes(record[0..8].try_into().unwrap_or_default()) as i64;
        samples.push(Sample {
            ts: nanos / NANOS_PER_MILLI,
            x: i32::from_le_bytes(record[8..12].try_into().unwrap_or_default()),
            y: i32::from_le_bytes(record[12..16].try_into().unwrap_or_default()),
            buttons: i32::from_le_bytes(record[16..20].try_into().unwrap_or_default()),
        });
    }

    Ok(TraceContainer {
        version,
        file_name: meta.file_name,
        scenario_name: meta.scenario_name,
        date_played: meta.date_played,
        samples,
    })
}

fn read_u32_le<R: Read>(reader: &mut R) -> Result<u32, TraceError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Legacy JSON container reader.
///
/// Older trace files stored samples as JSON with timestamps encoded either as
/// unix-millisecond numbers or as RFC 3339 strings. Unparsable timestamps
/// degrade to zero rather than failing the whole decode.
pub fn read_legacy_json(bytes: &[u8]) -> Result<TraceContainer, TraceError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LegacyTimestamp {
        Millis(f64),
        Text(String),
    }

    #[derive(Deserialize)]
    struct LegacyPoint {
        #[serde(default)]
        ts: Option<LegacyTimestamp>,
        #[serde(default)]
        x: i32,
        #[serde(default)]
        y: i32,
        #[serde(default)]
        buttons: i32,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct LegacyContainer {
        #[serde(default)]
        version: u8,
        #[serde(default)]
        file_name: String,
        #[serde(default)]
        scenario_name: String,
        #[serde(default)]
        date_played: String,
        #[serde(default)]
        mouse_trace: Vec<LegacyPoint>,
    }

    let legacy: LegacyContainer = serde_json::from_slice(bytes)?;
    let samples = legacy
        .mouse_trace
        .into_iter()
        .map(|point| {
            let ts = match point.ts {
                Some(LegacyTimestamp::Millis(ms)) => ms as i64,
                Some(LegacyTimestamp::Text(text)) => {
                    chrono::DateTime::parse_from_rfc3339(&text)
                        .map(|t| t.timestamp_millis())
                        .unwrap_or(0)
                }
                None => 0,
            };
            Sample {
                ts,
                x: point.x,
                y: point.y,
                buttons: point.buttons,
            }
        })
        .collect();

    Ok(TraceContainer {
        version: legacy.version,
        file_name: legacy.file_name,
        scenario_name: legacy.scenario_name,
        date_played: legacy.date_played,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> TraceContainer {
        TraceContainer {
            version: TRACE_VERSION,
            file_name: "Sixshot - Challenge - 2024.01.05-20.11.33 Stats.csv".into(),
            scenario_name: "Sixshot".into(),
            date_played: "2024-01-05T20:11:33+01:00".into(),
            samples: vec![
                Sample {
                    ts: 1_704_481_893_000,
                    x: -250,
                    y: 4096,
                    buttons: 0,
                },
                Sample {
                    ts: 1_704_481_893_008,
                    x: -248,
                    y: 4099,
                    buttons: 1,
                },
            ],
        }
    }

    fn encode(data: &TraceContainer) -> Vec<u8> {
        let mut buf = Vec::new();
        write_binary(&mut buf, data).unwrap();
        buf
    }

    #[test]
    fn test_roundtrip_preserves_everything() {
        let original = container();
        let bytes = encode(&original);
        let decoded = read_binary(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded, original);

        // the sample payload must survive byte-for-byte
        let reencoded = encode(&decoded);
        assert_eq!(reencoded, bytes);
    }

    #[test]
    fn test_rejects_corrupt_magic() {
        let mut bytes = encode(&container());
        bytes[0] = b'X';
        match read_binary(&mut bytes.as_slice()) {
            Err(TraceError::BadMagic) => {}
            other => panic!("expected BadMagic, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut bytes = encode(&container());
        bytes[4] = 99;
        match read_binary(&mut bytes.as_slice()) {
            Err(TraceError::UnsupportedVersion(99)) => {}
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_truncated_payload() {
        let bytes = encode(&container());
        let truncated = &bytes[..bytes.len() - 7];
        assert!(matches!(
            read_binary(&mut &truncated[..]),
            Err(TraceError::Io(_))
        ));
    }

    #[test]
    fn test_empty_sample_list() {
        let mut data = container();
        data.samples.clear();
        let decoded = read_binary(&mut encode(&data).as_slice()).unwrap();
        assert!(decoded.samples.is_empty());
        assert_eq!(decoded.scenario_name, data.scenario_name);
    }

    #[test]
    fn test_timestamp_nanosecond_scaling() {
        let bytes = encode(&container());
        // metadata json begins after [magic:4][version:1][flags:1][len:4]
        let meta_len = u32::from_le_bytes(bytes[6..10].try_into().unwrap()) as usize;
        let records = &bytes[10 + meta_len + 4..];
        let nanos = u64::from_le_bytes(records[0..8].try_into().unwrap());
        assert_eq!(nanos, 1_704_481_893_000u64 * 1_000_000);
    }

    #[test]
    fn test_legacy_numeric_timestamps() {
        let json = br#"{
            "version": 1,
            "fileName": "Old Scenario Stats.csv",
            "mouseTrace": [
                {"ts": 1700000000123.0, "x": 5, "y": -5, "buttons": 2},
                {"ts": 1700000000456, "x": 6, "y": -6}
            ]
        }"#;
        let decoded = read_legacy_json(json).unwrap();
        assert_eq!(decoded.samples.len(), 2);
        assert_eq!(decoded.samples[0].ts, 1_700_000_000_123);
        assert_eq!(decoded.samples[0].buttons, 2);
        assert_eq!(decoded.samples[1].ts, 1_700_000_000_456);
        assert_eq!(decoded.samples[1].buttons, 0);
    }

    #[test]
    fn test_legacy_string_timestamps() {
        let json = br#"{
            "fileName": "Old Scenario Stats.csv",
            "mouseTrace": [{"ts": "2023-11-14T22:13:20Z", "x": 1, "y": 2, "buttons": 0}]
        }"#;
        let decoded = read_legacy_json(json).unwrap();
        assert_eq!(decoded.samples[0].ts, 1_700_000_000_000);
    }

    #[test]
    fn test_legacy_unparsable_timestamp_degrades_to_zero() {
        let json = br#"{
            "fileName": "Old Scenario Stats.csv",
            "mouseTrace": [
                {"ts": "not a timestamp", "x": 1, "y": 2, "buttons": 0},
                {"x": 3, "y": 4, "buttons": 0}
            ]
        }"#;
        let decoded = read_legacy_json(json).unwrap();
        assert_eq!(decoded.samples[0].ts, 0);
        assert_eq!(decoded.samples[1].ts, 0);
        assert_eq!(decoded.samples[1].x, 3);
    }

    #[test]
    fn test_legacy_invalid_json_fails() {
        assert!(read_legacy_json(b"{ nope").is_err());
    }
}
