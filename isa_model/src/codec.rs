// Copyright 2026 the ISA Model Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bit-level instruction codec over [`Format`] layouts.
//!
//! An encoded instruction is `format.size()` bytes:
//! - the opcode byte, or for prefixed formats the prefix opcode followed by the secondary opcode
//!   (the little-endian bytes of [`crate::instruction::Instruction::encoded_opcode`]),
//! - then the fields, each packed LSB-first starting at its bit offset. Two 4-bit fields share a
//!   byte, low nibble first.
//!
//! Field values are raw bits: signed immediates are passed truncated to the field width.

use core::fmt;

use crate::format::Format;

/// Encoding failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// Value count differs from the format's field count.
    ArityMismatch {
        /// Field count of the format.
        expected: usize,
        /// Provided value count.
        actual: usize,
    },
    /// A value does not fit its field.
    ValueOutOfRange {
        /// Field index.
        index: usize,
        /// Field width in bits.
        width: u32,
        /// Offending value.
        value: u64,
    },
    /// A two-byte opcode was given for a non-prefixed format.
    OpcodeMismatch {
        /// Offending opcode.
        opcode: u16,
    },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArityMismatch { expected, actual } => {
                write!(f, "arity mismatch: expected {expected}, got {actual}")
            }
            Self::ValueOutOfRange {
                index,
                width,
                value,
            } => write!(f, "field {index} value {value:#x} does not fit {width} bits"),
            Self::OpcodeMismatch { opcode } => {
                write!(f, "opcode {opcode:#06x} needs a prefixed format")
            }
        }
    }
}

impl core::error::Error for EncodeError {}

/// Decoding failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes than the format needs.
    Truncated {
        /// Bytes needed.
        needed: usize,
        /// Bytes available.
        got: usize,
    },
    /// No instruction has this opcode.
    UnknownOpcode {
        /// Primary opcode, or `secondary << 8 | prefix` behind a prefix.
        opcode: u16,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { needed, got } => {
                write!(f, "truncated instruction: need {needed} bytes, got {got}")
            }
            Self::UnknownOpcode { opcode } => write!(f, "unknown opcode {opcode:#06x}"),
        }
    }
}

impl core::error::Error for DecodeError {}

/// A decoded instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// Opcode as in [`crate::instruction::Instruction::encoded_opcode`].
    pub opcode: u16,
    /// Field values in format field order.
    pub values: Vec<u64>,
    /// Total instruction byte length (including opcode bytes).
    pub byte_len: usize,
}

/// Encodes one instruction.
pub fn encode(format: &Format, opcode: u16, values: &[u64]) -> Result<Vec<u8>, EncodeError> {
    let fields = format.fields();
    if values.len() != fields.len() {
        return Err(EncodeError::ArityMismatch {
            expected: fields.len(),
            actual: values.len(),
        });
    }
    if !format.is_prefixed() && opcode > 0xff {
        return Err(EncodeError::OpcodeMismatch { opcode });
    }

    let mut out = vec![0_u8; format.size()];
    out[..format.opcode_bytes()].copy_from_slice(&opcode.to_le_bytes()[..format.opcode_bytes()]);
    for (index, (field, &value)) in fields.iter().zip(values).enumerate() {
        if field.width() < 64 && value >> field.width() != 0 {
            return Err(EncodeError::ValueOutOfRange {
                index,
                width: field.width(),
                value,
            });
        }
        write_bits(&mut out, field.offset(), field.width(), value);
    }
    Ok(out)
}

/// Decodes one instruction of a known format from the start of `bytes`.
pub fn decode(format: &Format, bytes: &[u8]) -> Result<DecodedInstruction, DecodeError> {
    let needed = format.size();
    if bytes.len() < needed {
        return Err(DecodeError::Truncated {
            needed,
            got: bytes.len(),
        });
    }

    let mut opcode_bytes = [0_u8; 2];
    opcode_bytes[..format.opcode_bytes()].copy_from_slice(&bytes[..format.opcode_bytes()]);
    let values = format
        .fields()
        .iter()
        .map(|field| read_bits(&bytes[..needed], field.offset(), field.width()))
        .collect();

    Ok(DecodedInstruction {
        opcode: u16::from_le_bytes(opcode_bytes),
        values,
        byte_len: needed,
    })
}

fn write_bits(out: &mut [u8], offset: u32, width: u32, value: u64) {
    for bit in 0..width {
        if (value >> bit) & 1 == 1 {
            let pos = (offset + bit) as usize;
            out[pos / 8] |= 1 << (pos % 8);
        }
    }
}

fn read_bits(bytes: &[u8], offset: u32, width: u32) -> u64 {
    (0..width).fold(0_u64, |acc, bit| {
        let pos = (offset + bit) as usize;
        acc | (u64::from((bytes[pos / 8] >> (pos % 8)) & 1) << bit)
    })
}
