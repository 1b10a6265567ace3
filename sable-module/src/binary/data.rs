//! Section payload encodings
//!
//! Hand-rolled little-endian encoding for the definition table and the
//! lowered symbol table; serde_json blobs for attribute values and the debug
//! chunk. The definition table is always encoded from a sorted view, which
//! makes its bytes (and the version id derived from them) independent of
//! declaration order.

use crate::defs::{Clause, DefKind};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload decode errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    UnexpectedEof,
    BadUtf8,
    BadKind(u8),
    Json(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnexpectedEof => write!(f, "unexpected end of section payload"),
            DecodeError::BadUtf8 => write!(f, "invalid utf-8 in section payload"),
            DecodeError::BadKind(value) => write!(f, "invalid definition kind: {}", value),
            DecodeError::Json(detail) => write!(f, "invalid json payload: {}", detail),
        }
    }
}

impl std::error::Error for DecodeError {}

/// One emitted definition header (clause bodies live in the debug chunk)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefRecord {
    pub name: String,
    pub arity: u8,
    pub kind: DefKind,
    pub clause_count: u16,
    pub line: u32,
    pub column: u32,
}

/// One lowered-form symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweredSymbol {
    pub name: String,
    pub arity: u8,
    pub kind: DefKind,
    pub clause_count: u16,
}

/// Debug chunk: enough structure to reconstruct the pre-lowering
/// representation of every definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugChunk {
    pub unit: String,
    pub definitions: Vec<DebugDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugDefinition {
    pub name: String,
    pub arity: u8,
    pub kind: DefKind,
    pub clauses: Vec<Clause>,
}

// ---- primitive helpers ----

fn write_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u16).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.pos + n > self.bytes.len() {
            return Err(DecodeError::UnexpectedEof);
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_str(&mut self) -> Result<String, DecodeError> {
        let len = self.read_u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::BadUtf8)
    }
}

// ---- definition table ----

/// Version-id input: sorted records without the unit name and without
/// source locations. Reordering source shifts every definition's line, so
/// locations must stay out of the hash for identical content to keep an
/// identical id.
pub fn encode_version_input(records: &[DefRecord]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(records.len() as u32).to_le_bytes());
    for record in records {
        write_str(&mut buf, &record.name);
        buf.push(record.arity);
        buf.push(record.kind.to_u8());
        buf.extend_from_slice(&record.clause_count.to_le_bytes());
    }
    buf
}

/// Record payload without the unit name (locations included; these bytes
/// land in the `DefTable` section)
pub fn encode_def_records(records: &[DefRecord]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(records.len() as u32).to_le_bytes());
    for record in records {
        write_str(&mut buf, &record.name);
        buf.push(record.arity);
        buf.push(record.kind.to_u8());
        buf.extend_from_slice(&record.clause_count.to_le_bytes());
        buf.extend_from_slice(&record.line.to_le_bytes());
        buf.extend_from_slice(&record.column.to_le_bytes());
    }
    buf
}

pub fn encode_def_table(unit: &str, records: &[DefRecord]) -> Vec<u8> {
    let mut buf = Vec::new();
    write_str(&mut buf, unit);
    buf.extend_from_slice(&encode_def_records(records));
    buf
}

pub fn decode_def_table(bytes: &[u8]) -> Result<(String, Vec<DefRecord>), DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let unit = cursor.read_str()?;
    let count = cursor.read_u32()? as usize;
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let name = cursor.read_str()?;
        let arity = cursor.read_u8()?;
        let kind_raw = cursor.read_u8()?;
        let kind = DefKind::from_u8(kind_raw).ok_or(DecodeError::BadKind(kind_raw))?;
        let clause_count = cursor.read_u16()?;
        let line = cursor.read_u32()?;
        let column = cursor.read_u32()?;
        records.push(DefRecord {
            name,
            arity,
            kind,
            clause_count,
            line,
            column,
        });
    }
    Ok((unit, records))
}

// ---- persisted attributes ----

pub fn encode_persisted_attrs(
    attrs: &[(String, Vec<Value>)],
) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(attrs.len() as u32).to_le_bytes());
    for (key, values) in attrs {
        write_str(&mut buf, key);
        buf.extend_from_slice(&(values.len() as u32).to_le_bytes());
        for value in values {
            let blob = serde_json::to_vec(value)?;
            buf.extend_from_slice(&(blob.len() as u32).to_le_bytes());
            buf.extend_from_slice(&blob);
        }
    }
    Ok(buf)
}

pub fn decode_persisted_attrs(bytes: &[u8]) -> Result<Vec<(String, Vec<Value>)>, DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let count = cursor.read_u32()? as usize;
    let mut attrs = Vec::with_capacity(count);
    for _ in 0..count {
        let key = cursor.read_str()?;
        let value_count = cursor.read_u32()? as usize;
        let mut values = Vec::with_capacity(value_count);
        for _ in 0..value_count {
            let len = cursor.read_u32()? as usize;
            let blob = cursor.take(len)?;
            let value: Value =
                serde_json::from_slice(blob).map_err(|e| DecodeError::Json(e.to_string()))?;
            values.push(value);
        }
        attrs.push((key, values));
    }
    Ok(attrs)
}

// ---- debug chunk ----

pub fn encode_debug_chunk(chunk: &DebugChunk) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(chunk)
}

pub fn decode_debug_chunk(bytes: &[u8]) -> Result<DebugChunk, DecodeError> {
    serde_json::from_slice(bytes).map_err(|e| DecodeError::Json(e.to_string()))
}

// ---- lowered symbol table ----

pub fn encode_lowered(symbols: &[LoweredSymbol]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(symbols.len() as u32).to_le_bytes());
    for symbol in symbols {
        write_str(&mut buf, &symbol.name);
        buf.push(symbol.arity);
        buf.push(symbol.kind.to_u8());
        buf.extend_from_slice(&symbol.clause_count.to_le_bytes());
    }
    buf
}

pub fn decode_lowered(bytes: &[u8]) -> Result<Vec<LoweredSymbol>, DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let count = cursor.read_u32()? as usize;
    let mut symbols = Vec::with_capacity(count);
    for _ in 0..count {
        let name = cursor.read_str()?;
        let arity = cursor.read_u8()?;
        let kind_raw = cursor.read_u8()?;
        let kind = DefKind::from_u8(kind_raw).ok_or(DecodeError::BadKind(kind_raw))?;
        let clause_count = cursor.read_u16()?;
        symbols.push(LoweredSymbol {
            name,
            arity,
            kind,
            clause_count,
        });
    }
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<DefRecord> {
        vec![
            DefRecord {
                name: "alpha".to_string(),
                arity: 1,
                kind: DefKind::PublicFunction,
                clause_count: 2,
                line: 3,
                column: 1,
            },
            DefRecord {
                name: "beta".to_string(),
                arity: 0,
                kind: DefKind::PrivateMacro,
                clause_count: 1,
                line: 9,
                column: 3,
            },
        ]
    }

    #[test]
    fn test_def_table_roundtrip() {
        let bytes = encode_def_table("Sample", &sample_records());
        let (unit, records) = decode_def_table(&bytes).unwrap();
        assert_eq!(unit, "Sample");
        assert_eq!(records, sample_records());
    }

    #[test]
    fn test_def_table_truncated() {
        let bytes = encode_def_table("Sample", &sample_records());
        let err = decode_def_table(&bytes[..bytes.len() - 3]).unwrap_err();
        assert_eq!(err, DecodeError::UnexpectedEof);
    }

    #[test]
    fn test_def_table_bad_kind() {
        let mut bytes = encode_def_table(
            "M",
            &[DefRecord {
                name: "f".to_string(),
                arity: 0,
                kind: DefKind::PublicFunction,
                clause_count: 1,
                line: 1,
                column: 1,
            }],
        );
        // kind byte: unit str (2+1) + count (4) + name str (2+1) + arity (1)
        let kind_pos = 2 + 1 + 4 + 2 + 1 + 1;
        bytes[kind_pos] = 9;
        assert_eq!(decode_def_table(&bytes).unwrap_err(), DecodeError::BadKind(9));
    }

    #[test]
    fn test_persisted_attrs_roundtrip() {
        let attrs = vec![
            (
                "compile".to_string(),
                vec![Value::Int(1), Value::atom("inline")],
            ),
            ("vsn".to_string(), vec![Value::Nil]),
        ];
        let bytes = encode_persisted_attrs(&attrs).unwrap();
        assert_eq!(decode_persisted_attrs(&bytes).unwrap(), attrs);
    }

    #[test]
    fn test_debug_chunk_roundtrip() {
        let chunk = DebugChunk {
            unit: "Sample".to_string(),
            definitions: vec![DebugDefinition {
                name: "run".to_string(),
                arity: 1,
                kind: DefKind::PublicFunction,
                clauses: vec![Clause {
                    params: vec![Value::atom("x")],
                    guard: None,
                    body: Value::Int(42),
                    line: 3,
                    column: 1,
                }],
            }],
        };
        let bytes = encode_debug_chunk(&chunk).unwrap();
        assert_eq!(decode_debug_chunk(&bytes).unwrap(), chunk);
    }

    #[test]
    fn test_lowered_roundtrip() {
        let symbols = vec![LoweredSymbol {
            name: "run".to_string(),
            arity: 2,
            kind: DefKind::PublicMacro,
            clause_count: 3,
        }];
        let bytes = encode_lowered(&symbols);
        assert_eq!(decode_lowered(&bytes).unwrap(), symbols);
    }

    #[test]
    fn test_version_input_excludes_locations() {
        let a = sample_records();
        let mut b = sample_records();
        b[0].line = 99;
        b[1].column = 7;
        assert_eq!(encode_version_input(&a), encode_version_input(&b));
        // The table bytes themselves do carry locations
        assert_ne!(encode_def_records(&a), encode_def_records(&b));
    }

    #[test]
    fn test_sorted_content_is_order_independent() {
        // Same records, same bytes: the encoder has no hidden state
        let a = encode_def_table("M", &sample_records());
        let b = encode_def_table("M", &sample_records());
        assert_eq!(a, b);
    }
}
