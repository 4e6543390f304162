// Copyright 2026 the ISA Model Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Final, opcode-assigned instructions and prefixes.

use std::sync::Arc;

use crate::codec::{self, EncodeError};
use crate::format::Format;
use crate::operand::{Operand, OperandType};

const NO_FORMAT_SUFFIX: &str = "none";

/// One concrete (mnemonic, format) instruction with its assigned opcode.
///
/// Immutable once built by [`crate::isa::Isa`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub(crate) mnemonic: String,
    pub(crate) sig: String,
    pub(crate) acc: String,
    pub(crate) properties: Vec<String>,
    pub(crate) exceptions: Vec<String>,
    pub(crate) verification: Vec<String>,
    pub(crate) format: Arc<Format>,
    pub(crate) prefix: Option<String>,
    pub(crate) opcode_idx: u8,
    pub(crate) prefix_opcode: Option<u8>,
    pub(crate) public: bool,
    /// Accumulator operands followed by explicit operands.
    pub(crate) acc_and_operands: Vec<Operand>,
    /// Index of the first explicit operand in `acc_and_operands`.
    pub(crate) explicit_start: usize,
    pub(crate) opcode: String,
}

impl Instruction {
    /// First word of the signature (`call.short`).
    #[must_use]
    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    /// Mnemonic up to the first `.` (`call`).
    #[must_use]
    pub fn stripped_mnemonic(&self) -> &str {
        self.mnemonic
            .split_once('.')
            .map_or(self.mnemonic.as_str(), |(head, _)| head)
    }

    /// Full signature as declared.
    #[must_use]
    pub fn sig(&self) -> &str {
        &self.sig
    }

    /// Accumulator signature as declared.
    #[must_use]
    pub fn acc(&self) -> &str {
        &self.acc
    }

    /// Property tags (instruction-level list, else the group's).
    #[must_use]
    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    /// Exception tags.
    #[must_use]
    pub fn exceptions(&self) -> &[String] {
        &self.exceptions
    }

    /// Verification tags.
    #[must_use]
    pub fn verification(&self) -> &[String] {
        &self.verification
    }

    /// Returns `true` if `tag` is among the properties.
    #[must_use]
    pub fn has_property(&self, tag: &str) -> bool {
        self.properties.iter().any(|p| p == tag)
    }

    /// Encoding format.
    #[must_use]
    pub fn format(&self) -> &Arc<Format> {
        &self.format
    }

    /// Owning prefix name.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Primary opcode for non-prefixed instructions, secondary opcode for prefixed ones.
    #[must_use]
    pub fn opcode_idx(&self) -> u8 {
        self.opcode_idx
    }

    /// Opcode of the owning prefix.
    #[must_use]
    pub fn prefix_opcode(&self) -> Option<u8> {
        self.prefix_opcode
    }

    /// Full opcode index: `secondary << 8 | prefix` for prefixed instructions.
    ///
    /// This is the little-endian value of the opcode bytes as they appear in the encoding.
    #[must_use]
    pub fn encoded_opcode(&self) -> u16 {
        match self.prefix_opcode {
            Some(prefix) => (u16::from(self.opcode_idx) << 8) | u16::from(prefix),
            None => u16::from(self.opcode_idx),
        }
    }

    /// `true` iff the opcode was pinned in the description.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.public
    }

    /// Unique identifier: mnemonic with `.` → `_`, suffixed with the pretty format name.
    #[must_use]
    pub fn opcode(&self) -> &str {
        &self.opcode
    }

    /// Dispatch handler name (upper-cased [`Instruction::opcode`]).
    #[must_use]
    pub fn handler_name(&self) -> String {
        self.opcode.to_uppercase()
    }

    /// Accumulator operands first, then explicit operands; `inout` split into `out` + `in`.
    #[must_use]
    pub fn acc_and_operands(&self) -> &[Operand] {
        &self.acc_and_operands
    }

    /// Explicit operands only.
    #[must_use]
    pub fn operands(&self) -> &[Operand] {
        &self.acc_and_operands[self.explicit_start..]
    }

    /// Type of the single destination operand, `none` if nothing is written.
    #[must_use]
    pub fn dtype(&self) -> OperandType {
        self.acc_and_operands
            .iter()
            .find(|op| op.is_dst())
            .map_or(OperandType::NONE, Operand::ty)
    }

    /// Type of the `index`-th source operand, `none` if there is no such source.
    #[must_use]
    pub fn src_type(&self, index: usize) -> OperandType {
        self.acc_and_operands
            .iter()
            .filter(|op| op.is_src())
            .nth(index)
            .map_or(OperandType::NONE, Operand::ty)
    }

    /// Bit size of the first source type.
    #[must_use]
    pub fn op_size(&self) -> u32 {
        self.src_type(0).base.bits()
    }

    /// Bit size of the destination type.
    #[must_use]
    pub fn dest_op_size(&self) -> u32 {
        self.dtype().base.bits()
    }

    /// Has the `float` property.
    #[must_use]
    pub fn is_float(&self) -> bool {
        self.has_property("float")
    }

    /// Has the `jump` property.
    #[must_use]
    pub fn is_jump(&self) -> bool {
        self.has_property("jump")
    }

    /// Has the `conditional` property.
    #[must_use]
    pub fn is_conditional(&self) -> bool {
        self.has_property("conditional")
    }

    /// May throw: no `x_none` among the exceptions.
    #[must_use]
    pub fn is_throwing(&self) -> bool {
        !self.exceptions.iter().any(|e| e == "x_none")
    }

    /// Encodes this instruction with explicit field values in format field order.
    pub fn encode(&self, values: &[u64]) -> Result<Vec<u8>, EncodeError> {
        codec::encode(&self.format, self.encoded_opcode(), values)
    }
}

/// A prefix: a namespace of secondary opcodes behind one primary opcode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prefix {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) opcode_idx: u8,
    pub(crate) public: bool,
}

impl Prefix {
    /// Prefix name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Documentation, if declared.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Primary opcode.
    #[must_use]
    pub fn opcode_idx(&self) -> u8 {
        self.opcode_idx
    }

    /// `true` iff the opcode was pinned in the description.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.public
    }

    /// Dispatch handler name (upper-cased name).
    #[must_use]
    pub fn handler_name(&self) -> String {
        self.name.to_uppercase()
    }
}

/// Builds the format-qualified opcode identifier of `mnemonic` in `format`.
pub(crate) fn opcode_identifier(mnemonic: &str, format: &Format) -> String {
    let mn = mnemonic.replace('.', "_");
    if format.pretty() == NO_FORMAT_SUFFIX {
        mn
    } else {
        format!("{mn}_{}", format.pretty())
    }
}
