// Copyright 2026 the ISA Model Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The ISA model: a description run through the build pipeline.
//!
//! Building is eager and runs in a fixed order:
//! 1. prefix declarations are indexed (names must be unique),
//! 2. groups are expanded into one instruction per format, interning formats on the way,
//! 3. prefixes get primary opcodes (highest free first),
//! 4. instructions get primary or per-prefix secondary opcodes (lowest free first),
//! 5. the dispatch table is laid out.
//!
//! Any failure aborts the build; a constructed [`Isa`] is complete and immutable.

use std::collections::BTreeMap;
use std::sync::Arc;

use hashbrown::HashMap;
use tracing::info;

use crate::assign::{Assignable, Scope, SelectionPolicy, assign};
use crate::codec::{self, DecodeError, DecodedInstruction};
use crate::description::{Description, PrefixDecl, TagDef};
use crate::dispatch::DispatchTable;
use crate::error::IsaError;
use crate::expand::expand;
use crate::format::{Format, FormatTable};
use crate::instruction::{Instruction, Prefix};
use crate::opcode_set::OpcodeSet;

impl Assignable for PrefixDecl {
    fn scope(&self) -> Scope {
        Scope::NonPrefixed
    }

    fn explicit_opcode(&self) -> Option<u8> {
        self.opcode_idx
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

/// A fully built ISA.
#[derive(Debug)]
pub struct Isa {
    description: Description,
    formats: FormatTable,
    instructions: Vec<Instruction>,
    prefixes: Vec<Prefix>,
    dispatch: DispatchTable,
    by_encoded_opcode: BTreeMap<u16, usize>,
    prefix_opcodes: OpcodeSet,
}

impl Isa {
    /// Parses a JSON description and builds it.
    pub fn from_json_str(json: &str) -> Result<Self, IsaError> {
        Self::from_description(Description::from_json_str(json)?)
    }

    /// Builds the model for `description`.
    pub fn from_description(description: Description) -> Result<Self, IsaError> {
        let mut prefix_index: HashMap<String, usize> =
            HashMap::with_capacity(description.prefixes.len());
        for (i, decl) in description.prefixes.iter().enumerate() {
            if prefix_index.insert(decl.name.clone(), i).is_some() {
                return Err(IsaError::DuplicatePrefix {
                    name: decl.name.clone(),
                });
            }
        }

        let mut formats = FormatTable::new();
        let pending = expand(&description.groups, &prefix_index, &mut formats)?;

        let prefix_opcodes = assign(&description.prefixes, SelectionPolicy::SelectMax)?;
        let mut prefixes: Vec<Prefix> = description
            .prefixes
            .iter()
            .zip(&prefix_opcodes)
            .map(|(decl, &opcode_idx)| Prefix {
                name: decl.name.clone(),
                description: decl.description.clone(),
                opcode_idx,
                public: decl.opcode_idx.is_some(),
            })
            .collect();

        let opcodes = assign(&pending, SelectionPolicy::SelectMin)?;
        let mut instructions: Vec<Instruction> = Vec::with_capacity(pending.len());
        for (insn, opcode_idx) in pending.into_iter().zip(opcodes) {
            let prefix_opcode = insn
                .prefix()
                .and_then(|name| prefix_index.get(name))
                .map(|&i| prefix_opcodes[i]);
            instructions.push(insn.into_instruction(opcode_idx, prefix_opcode));
        }

        instructions.sort_by_key(Instruction::encoded_opcode);
        prefixes.sort_by_key(Prefix::opcode_idx);

        let dispatch = DispatchTable::build(&instructions, &prefixes)?;

        let by_encoded_opcode = instructions
            .iter()
            .enumerate()
            .map(|(i, insn)| (insn.encoded_opcode(), i))
            .collect();
        let mut prefix_set = OpcodeSet::new_empty();
        for prefix in &prefixes {
            prefix_set.insert(prefix.opcode_idx());
        }

        let isa = Self {
            description,
            formats,
            instructions,
            prefixes,
            dispatch,
            by_encoded_opcode,
            prefix_opcodes: prefix_set,
        };
        info!(
            instructions = isa.instructions.len(),
            prefixes = isa.prefixes.len(),
            formats = isa.formats.unique().len(),
            handlers = isa.dispatch.handler_names().len(),
            "ISA built"
        );
        Ok(isa)
    }

    /// The description this model was built from.
    #[must_use]
    pub fn description(&self) -> &Description {
        &self.description
    }

    /// All instructions, sorted by encoded opcode.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// All prefixes, sorted by opcode.
    #[must_use]
    pub fn prefixes(&self) -> &[Prefix] {
        &self.prefixes
    }

    /// Distinct formats, one per pretty name, sorted by pretty name.
    #[must_use]
    pub fn formats(&self) -> Vec<Arc<Format>> {
        self.formats.unique()
    }

    /// The dispatch table layout.
    #[must_use]
    pub fn dispatch_table(&self) -> &DispatchTable {
        &self.dispatch
    }

    /// Looks up an instruction by its opcode identifier (`mov_v4_v4`).
    #[must_use]
    pub fn instruction(&self, opcode: &str) -> Option<&Instruction> {
        self.instructions.iter().find(|i| i.opcode() == opcode)
    }

    /// Looks up an instruction by [`Instruction::encoded_opcode`].
    #[must_use]
    pub fn instruction_by_encoded_opcode(&self, opcode: u16) -> Option<&Instruction> {
        self.by_encoded_opcode
            .get(&opcode)
            .map(|&i| &self.instructions[i])
    }

    /// Description of a property tag.
    pub fn property_description(&self, tag: &str) -> Result<&str, IsaError> {
        tag_description(&self.description.properties, tag)
    }

    /// Description of an exception tag.
    pub fn exception_description(&self, tag: &str) -> Result<&str, IsaError> {
        tag_description(&self.description.exceptions, tag)
    }

    /// Description of a verification tag.
    pub fn verification_description(&self, tag: &str) -> Result<&str, IsaError> {
        tag_description(&self.description.verification, tag)
    }

    /// 32-bit content hash of the description.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        self.description.checksum()
    }

    /// Decodes the instruction at the start of `bytes`.
    pub fn decode(&self, bytes: &[u8]) -> Result<(&Instruction, DecodedInstruction), DecodeError> {
        let &primary = bytes
            .first()
            .ok_or(DecodeError::Truncated { needed: 1, got: 0 })?;
        let opcode = if self.prefix_opcodes.contains(primary) {
            let &secondary = bytes
                .get(1)
                .ok_or(DecodeError::Truncated { needed: 2, got: 1 })?;
            u16::from_le_bytes([primary, secondary])
        } else {
            u16::from(primary)
        };
        let insn = self
            .instruction_by_encoded_opcode(opcode)
            .ok_or(DecodeError::UnknownOpcode { opcode })?;
        Ok((insn, codec::decode(insn.format(), bytes)?))
    }

    /// Decodes a whole byte stream.
    pub fn decode_all(
        &self,
        bytes: &[u8],
    ) -> Result<Vec<(&Instruction, DecodedInstruction)>, DecodeError> {
        let mut out = Vec::new();
        let mut offset = 0;
        while offset < bytes.len() {
            let (insn, decoded) = self.decode(&bytes[offset..])?;
            offset += decoded.byte_len;
            out.push((insn, decoded));
        }
        Ok(out)
    }
}

fn tag_description<'a>(tags: &'a [TagDef], tag: &str) -> Result<&'a str, IsaError> {
    tags.iter()
        .find(|t| t.tag == tag)
        .map(|t| t.description.as_str())
        .ok_or_else(|| IsaError::UnknownTag {
            tag: tag.to_string(),
        })
}
