// Copyright 2026 the ISA Model Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors produced while building an ISA model.
//!
//! Every error is fatal for the run that produced it: the model is a pure function of its
//! description, so the only recovery is fixing the description and rebuilding.

use core::fmt;

use crate::assign::Scope;

/// A fatal error while loading or building an ISA model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IsaError {
    /// The description could not be deserialized.
    Parse {
        /// Deserializer message.
        message: String,
    },
    /// A format name does not follow the `[pref_]op_<field>_<width>...` shape.
    MalformedFormat {
        /// Raw format name.
        format: String,
    },
    /// The fields of a format do not add up to whole bytes.
    UnalignedFormat {
        /// Raw format name.
        format: String,
        /// Total operand bits.
        bits: u32,
    },
    /// A field was looked up in a format that does not declare it.
    UnknownField {
        /// Raw format name.
        format: String,
        /// Lookup key after normalization.
        field: String,
    },
    /// An instruction or accumulator signature could not be parsed.
    BadSignature {
        /// Instruction mnemonic.
        mnemonic: String,
        /// Offending signature fragment.
        signature: String,
    },
    /// An operand name does not denote a known operand kind.
    UnknownOperandKind {
        /// Instruction mnemonic.
        mnemonic: String,
        /// Operand name as written.
        operand: String,
    },
    /// An operand value type is not in the supported set.
    UnknownValueType {
        /// Instruction mnemonic.
        mnemonic: String,
        /// Type as written.
        ty: String,
    },
    /// `opcode_idx` and `format` lists have different lengths.
    OpcodeCountMismatch {
        /// Instruction mnemonic.
        mnemonic: String,
        /// Number of formats.
        formats: usize,
        /// Number of explicit opcodes.
        opcodes: usize,
    },
    /// A prefixed format is used without a prefix, or a prefix with a non-prefixed format.
    PrefixMismatch {
        /// Instruction mnemonic.
        mnemonic: String,
        /// Raw format name.
        format: String,
    },
    /// Two instructions expand to the same format-qualified opcode identifier.
    DuplicateInstruction {
        /// The repeated identifier.
        opcode: String,
    },
    /// Two prefixes share a name.
    DuplicatePrefix {
        /// The repeated name.
        name: String,
    },
    /// A prefix name is not declared.
    UnknownPrefix {
        /// The unresolved name.
        name: String,
    },
    /// A tag is not defined in its category.
    UnknownTag {
        /// The unresolved tag.
        tag: String,
    },
    /// A prefix owns no instructions, so it has no secondary opcode bound.
    EmptyPrefix {
        /// Prefix name.
        name: String,
    },
    /// An explicit opcode is pinned twice in one scope.
    DuplicateOpcode {
        /// Scope of the collision.
        scope: Scope,
        /// The repeated opcode.
        opcode: u8,
        /// Item that tried to pin it second.
        item: String,
    },
    /// More items contend for a scope than it has opcodes.
    ScopeOverflow {
        /// Overfull scope.
        scope: Scope,
        /// Number of contending items.
        count: usize,
    },
    /// No free opcode was left for an item.
    ScopeExhausted {
        /// Exhausted scope.
        scope: Scope,
        /// Item left without an opcode.
        item: String,
    },
    /// Non-prefixed instructions and prefixes do not fit in one primary opcode byte.
    PrimaryOpcodeSpaceOverflow {
        /// Non-prefixed instruction count plus prefix count.
        count: usize,
    },
    /// A required invalid-opcode gap collapsed to nothing.
    OpcodeSpaceExhausted {
        /// Which gap collapsed.
        gap: Gap,
    },
    /// Opcode regions that must be ordered overlap.
    OpcodeSpaceOverlap {
        /// Which gap is inverted.
        gap: Gap,
    },
}

/// The two invalid-opcode gaps of the primary dispatch table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Gap {
    /// Between the highest non-prefixed opcode and the lowest prefix opcode.
    NonPrefixed,
    /// Between the highest public prefix opcode and the lowest private prefix opcode.
    Prefixes,
}

impl fmt::Display for Gap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPrefixed => write!(f, "non-prefixed instructions and prefixes"),
            Self::Prefixes => write!(f, "public and private prefixes"),
        }
    }
}

impl fmt::Display for IsaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { message } => write!(f, "invalid ISA description: {message}"),
            Self::MalformedFormat { format } => write!(f, "malformed format name '{format}'"),
            Self::UnalignedFormat { format, bits } => {
                write!(f, "format '{format}' has {bits} operand bits, not a whole number of bytes")
            }
            Self::UnknownField { format, field } => {
                write!(f, "format '{format}' has no field '{field}'")
            }
            Self::BadSignature {
                mnemonic,
                signature,
            } => write!(f, "{mnemonic}: unexpected signature '{signature}'"),
            Self::UnknownOperandKind { mnemonic, operand } => {
                write!(f, "{mnemonic}: incorrect operand '{operand}'")
            }
            Self::UnknownValueType { mnemonic, ty } => {
                write!(f, "{mnemonic}: incorrect operand type '{ty}'")
            }
            Self::OpcodeCountMismatch {
                mnemonic,
                formats,
                opcodes,
            } => write!(
                f,
                "{mnemonic}: {opcodes} explicit opcodes for {formats} formats"
            ),
            Self::PrefixMismatch { mnemonic, format } => write!(
                f,
                "{mnemonic}: format '{format}' disagrees with the instruction prefix"
            ),
            Self::DuplicateInstruction { opcode } => {
                write!(f, "instruction '{opcode}' is defined more than once")
            }
            Self::DuplicatePrefix { name } => write!(f, "prefix '{name}' is defined more than once"),
            Self::UnknownPrefix { name } => write!(f, "prefix '{name}' not found"),
            Self::UnknownTag { tag } => write!(f, "tag '{tag}' not found"),
            Self::EmptyPrefix { name } => write!(f, "prefix '{name}' owns no instructions"),
            Self::DuplicateOpcode {
                scope,
                opcode,
                item,
            } => write!(f, "{item}: opcode {opcode:#04x} already taken in {scope}"),
            Self::ScopeOverflow { scope, count } => {
                write!(f, "{count} items do not fit the 256 opcodes of {scope}")
            }
            Self::ScopeExhausted { scope, item } => {
                write!(f, "{item}: no free opcode left in {scope}")
            }
            Self::PrimaryOpcodeSpaceOverflow { count } => write!(
                f,
                "{count} non-prefixed instructions and prefixes do not fit one opcode byte"
            ),
            Self::OpcodeSpaceExhausted { gap } => {
                write!(f, "no invalid-opcode gap left between {gap}")
            }
            Self::OpcodeSpaceOverlap { gap } => write!(f, "opcodes of {gap} overlap"),
        }
    }
}

impl core::error::Error for IsaError {}
