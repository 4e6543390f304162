// Copyright 2026 the ISA Model Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Instruction encoding formats.
//!
//! A format name spells out the operand fields that follow the opcode byte(s):
//! - `op_v1_4_v2_4`: two 4-bit register fields `v1` and `v2`,
//! - `op_v_8_id_16`: an 8-bit register and a 16-bit id,
//! - `pref_op_imm_32`: a prefixed (two opcode bytes) format with a 32-bit immediate,
//! - `op_none`: no operands.
//!
//! Widths may also be written compactly as trailing digits of the field name (`op_imm8_v4`).
//!
//! Fields are laid out back to back starting right after the opcode, i.e. at bit 8 for plain
//! formats and at bit 16 for prefixed ones.

use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::IsaError;

const PREFIX_MARKER: &str = "pref_";
const OPCODE_MARKER: &str = "op_";
const NO_FIELDS: &str = "none";

/// A named bit-field of a format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    name: String,
    width: u32,
    offset: u32,
}

impl Field {
    /// Field name as spelled in the format (`v1`, `imm`, `id`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field kind: the name without its index digits (`v1` → `v`).
    #[must_use]
    pub fn kind(&self) -> &str {
        self.name.trim_end_matches(|c: char| c.is_ascii_digit())
    }

    /// Width in bits.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Bit offset from the start of the encoded instruction.
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset
    }
}

/// A byte-level encoding layout shared by instructions with the same operand shape.
///
/// Equality is structural: two formats are equal iff their [`Format::pretty`] names are.
#[derive(Clone, Debug)]
pub struct Format {
    name: String,
    pretty: String,
    prefixed: bool,
    fields: Vec<Field>,
    size: usize,
}

impl Format {
    /// Parses a raw format name.
    pub fn parse(name: &str) -> Result<Self, IsaError> {
        let malformed = || IsaError::MalformedFormat {
            format: name.to_string(),
        };

        let (prefixed, rest) = match name.strip_prefix(PREFIX_MARKER) {
            Some(rest) => (true, rest),
            None => (false, name),
        };
        let body = rest.strip_prefix(OPCODE_MARKER).ok_or_else(malformed)?;

        let mut offset: u32 = if prefixed { 16 } else { 8 };
        let mut fields: Vec<Field> = Vec::new();
        if body != NO_FIELDS {
            let tokens: Vec<&str> = body.split('_').collect();
            let mut i = 0;
            while i < tokens.len() {
                let token = tokens[i];
                let (field_name, width) = match tokens.get(i + 1) {
                    Some(next) if is_digits(next) => {
                        i += 2;
                        (token, parse_width(next).ok_or_else(malformed)?)
                    }
                    _ => {
                        i += 1;
                        let split = token.trim_end_matches(|c: char| c.is_ascii_digit()).len();
                        let (field_name, digits) = token.split_at(split);
                        (field_name, parse_width(digits).ok_or_else(malformed)?)
                    }
                };
                if !field_name.starts_with(|c: char| c.is_ascii_alphabetic()) {
                    return Err(malformed());
                }
                if fields.iter().any(|f| f.name == field_name) {
                    return Err(malformed());
                }
                fields.push(Field {
                    name: field_name.to_string(),
                    width,
                    offset,
                });
                offset = offset.checked_add(width).ok_or_else(malformed)?;
            }
        }

        let bits: u32 = fields.iter().map(|f| f.width).sum();
        if bits % 8 != 0 {
            return Err(IsaError::UnalignedFormat {
                format: name.to_string(),
                bits,
            });
        }
        let opcode_bytes = if prefixed { 2 } else { 1 };
        let size = bits as usize / 8 + opcode_bytes;

        Ok(Self {
            name: name.to_string(),
            pretty: pretty_of(prefixed, &fields),
            prefixed,
            fields,
            size,
        })
    }

    /// Raw format name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical name with field indices dropped (`op_v1_4_v2_4` → `v4_v4`).
    #[must_use]
    pub fn pretty(&self) -> &str {
        &self.pretty
    }

    /// Returns `true` for formats with a two-byte (prefix + secondary) opcode.
    #[must_use]
    pub fn is_prefixed(&self) -> bool {
        self.prefixed
    }

    /// Number of opcode bytes preceding the fields.
    #[must_use]
    pub fn opcode_bytes(&self) -> usize {
        if self.prefixed { 2 } else { 1 }
    }

    /// Encoded instruction size in bytes, opcode included.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Fields in encoding order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by operand name.
    ///
    /// Every id-like name (`method_id`, `string_id`, ...) maps to the single `id` field; other
    /// names are matched verbatim.
    pub fn field(&self, key: &str) -> Result<&Field, IsaError> {
        let key = field_key(key);
        self.fields
            .iter()
            .find(|f| f.name == key)
            .ok_or_else(|| IsaError::UnknownField {
                format: self.name.clone(),
                field: key.to_string(),
            })
    }
}

impl PartialEq for Format {
    fn eq(&self, other: &Self) -> bool {
        self.pretty == other.pretty
    }
}

impl Eq for Format {}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty)
    }
}

/// Returns the canonical pretty name for a raw format name.
pub fn pretty(name: &str) -> Result<String, IsaError> {
    Format::parse(name).map(|f| f.pretty)
}

fn pretty_of(prefixed: bool, fields: &[Field]) -> String {
    let mut out = String::new();
    if prefixed {
        out.push_str(PREFIX_MARKER);
    }
    if fields.is_empty() {
        out.push_str(NO_FIELDS);
        return out;
    }
    for (i, field) in fields.iter().enumerate() {
        if i != 0 {
            out.push('_');
        }
        out.push_str(field.kind());
        out.push_str(&field.width.to_string());
    }
    out
}

fn field_key(name: &str) -> &str {
    if name.ends_with("id") { "id" } else { name }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_width(digits: &str) -> Option<u32> {
    if !is_digits(digits) {
        return None;
    }
    digits.parse::<u32>().ok().filter(|w| (1..=64).contains(w))
}

/// Formats parsed during one run, memoized by raw name.
#[derive(Clone, Debug, Default)]
pub struct FormatTable {
    by_name: BTreeMap<String, Arc<Format>>,
}

impl FormatTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared format for `name`, parsing it on first use.
    pub fn intern(&mut self, name: &str) -> Result<Arc<Format>, IsaError> {
        if let Some(format) = self.by_name.get(name) {
            return Ok(Arc::clone(format));
        }
        let format = Arc::new(Format::parse(name)?);
        debug!(format = name, pretty = format.pretty(), size = format.size(), "format parsed");
        self.by_name.insert(name.to_string(), Arc::clone(&format));
        Ok(format)
    }

    /// Looks up an already interned format by raw name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<Format>> {
        self.by_name.get(name)
    }

    /// Distinct encodings: one format per pretty name, sorted by pretty name.
    ///
    /// When several raw names share a pretty name the lexicographically first raw name wins.
    #[must_use]
    pub fn unique(&self) -> Vec<Arc<Format>> {
        let mut by_pretty: BTreeMap<&str, &Arc<Format>> = BTreeMap::new();
        for format in self.by_name.values() {
            by_pretty.entry(format.pretty()).or_insert(format);
        }
        by_pretty.into_values().map(Arc::clone).collect()
    }
}
