// Copyright 2026 the ISA Model Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch table layout.
//!
//! The primary table has exactly 256 entries and entry `i` handles primary opcode `i`:
//! 1. non-prefixed instruction handlers,
//! 2. the invalid gap up to the lowest prefix opcode,
//! 3. public prefix handlers,
//! 4. the invalid gap between public and private prefixes,
//! 5. private prefix handlers.
//!
//! Unused opcodes anywhere in that range (including holes left by pinned opcodes) hold
//! `INVALID` filler.
//!
//! Prefixed instruction handlers follow at index 256, one run per prefix in prefix-opcode order.
//! Entry `offset + s` of a run handles secondary opcode `s`, so a prefix handler re-dispatches
//! with [`DispatchTable::secondary_opcode_offset`] and [`DispatchTable::secondary_opcode_bound`].

use core::fmt;
use core::ops::Range;

use hashbrown::HashMap;

use crate::error::{Gap, IsaError};
use crate::instruction::{Instruction, Prefix};
use crate::opcode_set::OPCODE_SPACE;

const PRIMARY_END: u16 = OPCODE_SPACE as u16;

/// One entry of the handler list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerName {
    /// An instruction handler (upper-cased opcode identifier).
    Instruction(String),
    /// A prefix re-dispatch handler (upper-cased prefix name).
    Prefix(String),
    /// Filler for an unused opcode (primary, or secondary within a prefix run).
    Invalid(u8),
}

impl HandlerName {
    /// Returns `true` for filler entries.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }
}

impl fmt::Display for HandlerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instruction(name) | Self::Prefix(name) => f.write_str(name),
            Self::Invalid(_) => f.write_str("INVALID"),
        }
    }
}

/// Secondary dispatch data of one prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixDispatch {
    /// Prefix name.
    pub name: String,
    /// Primary opcode of the prefix.
    pub opcode: u8,
    /// Handler-list index of secondary opcode 0 of the prefix.
    pub offset: usize,
    /// Length of the prefix's run: its largest secondary opcode plus one, `0` when it owns no
    /// instructions.
    pub len: usize,
}

/// The final handler ordering and the data needed to dispatch through it.
#[derive(Clone, Debug)]
pub struct DispatchTable {
    handlers: Vec<HandlerName>,
    invalid_non_prefixed: Range<u16>,
    invalid_prefixes: Range<u16>,
    prefixes: Vec<PrefixDispatch>,
    by_name: HashMap<String, usize>,
}

impl DispatchTable {
    /// Lays out the table.
    ///
    /// `instructions` must be sorted by encoded opcode and `prefixes` by opcode.
    pub fn build(instructions: &[Instruction], prefixes: &[Prefix]) -> Result<Self, IsaError> {
        let non_prefixed: Vec<&Instruction> =
            instructions.iter().filter(|i| i.prefix().is_none()).collect();

        let count = non_prefixed.len() + prefixes.len();
        if count > OPCODE_SPACE {
            return Err(IsaError::PrimaryOpcodeSpaceOverflow { count });
        }

        let (public, private): (Vec<&Prefix>, Vec<&Prefix>) =
            prefixes.iter().partition(|p| p.is_public());

        let first_prefix = prefixes
            .iter()
            .map(|p| u16::from(p.opcode_idx()))
            .min()
            .unwrap_or(PRIMARY_END);
        let invalid_non_prefixed = checked_gap(
            Gap::NonPrefixed,
            non_prefixed
                .iter()
                .map(|i| u16::from(i.opcode_idx()) + 1)
                .max()
                .unwrap_or(0),
            first_prefix,
        )?;

        let invalid_prefixes = match public.iter().map(|p| u16::from(p.opcode_idx()) + 1).max() {
            Some(start) => checked_gap(
                Gap::Prefixes,
                start,
                private
                    .iter()
                    .map(|p| u16::from(p.opcode_idx()))
                    .min()
                    .unwrap_or(PRIMARY_END),
            )?,
            None => first_prefix..first_prefix,
        };

        let mut handlers: Vec<HandlerName> = filler(OPCODE_SPACE).collect();
        for insn in &non_prefixed {
            handlers[usize::from(insn.opcode_idx())] = HandlerName::Instruction(insn.handler_name());
        }
        for prefix in prefixes {
            handlers[usize::from(prefix.opcode_idx())] = HandlerName::Prefix(prefix.handler_name());
        }

        let mut dispatch: Vec<PrefixDispatch> = Vec::with_capacity(prefixes.len());
        let mut by_name: HashMap<String, usize> = HashMap::with_capacity(prefixes.len());
        for prefix in prefixes {
            let owned: Vec<&Instruction> = instructions
                .iter()
                .filter(|i| i.prefix() == Some(prefix.name()))
                .collect();
            let len = owned
                .iter()
                .map(|i| usize::from(i.opcode_idx()) + 1)
                .max()
                .unwrap_or(0);
            let offset = handlers.len();
            handlers.extend(filler(len));
            for insn in owned {
                handlers[offset + usize::from(insn.opcode_idx())] =
                    HandlerName::Instruction(insn.handler_name());
            }
            by_name.insert(prefix.name().to_string(), dispatch.len());
            dispatch.push(PrefixDispatch {
                name: prefix.name().to_string(),
                opcode: prefix.opcode_idx(),
                offset,
                len,
            });
        }

        Ok(Self {
            handlers,
            invalid_non_prefixed,
            invalid_prefixes,
            prefixes: dispatch,
            by_name,
        })
    }

    /// The full handler list: 256 primary entries, then the per-prefix runs.
    #[must_use]
    pub fn handler_names(&self) -> &[HandlerName] {
        &self.handlers
    }

    /// Unused primary opcodes between non-prefixed instructions and prefixes (half-open).
    #[must_use]
    pub fn invalid_non_prefixed_interval(&self) -> Range<u16> {
        self.invalid_non_prefixed.clone()
    }

    /// Unused primary opcodes between public and private prefixes (half-open).
    ///
    /// Empty (starting at the lowest prefix opcode) when there are no public prefixes.
    #[must_use]
    pub fn invalid_prefixes_interval(&self) -> Range<u16> {
        self.invalid_prefixes.clone()
    }

    /// Highest prefix opcode, i.e. the largest first byte that needs secondary dispatch.
    #[must_use]
    pub fn primary_opcode_bound(&self) -> Option<u8> {
        self.prefixes.iter().map(|p| p.opcode).max()
    }

    /// Largest secondary opcode used by `prefix`.
    pub fn secondary_opcode_bound(&self, prefix: &str) -> Result<u8, IsaError> {
        let slot = self.slot(prefix)?;
        slot.len
            .checked_sub(1)
            .and_then(|bound| u8::try_from(bound).ok())
            .ok_or_else(|| IsaError::EmptyPrefix {
                name: prefix.to_string(),
            })
    }

    /// Handler-list index of secondary opcode 0 of `prefix`.
    pub fn secondary_opcode_offset(&self, prefix: &str) -> Result<usize, IsaError> {
        self.slot(prefix).map(|slot| slot.offset)
    }

    /// Secondary dispatch data of every prefix, in prefix-opcode order.
    #[must_use]
    pub fn prefixes(&self) -> &[PrefixDispatch] {
        &self.prefixes
    }

    fn slot(&self, prefix: &str) -> Result<&PrefixDispatch, IsaError> {
        self.by_name
            .get(prefix)
            .map(|&i| &self.prefixes[i])
            .ok_or_else(|| IsaError::UnknownPrefix {
                name: prefix.to_string(),
            })
    }
}

fn checked_gap(gap: Gap, start: u16, end: u16) -> Result<Range<u16>, IsaError> {
    if start > end {
        return Err(IsaError::OpcodeSpaceOverlap { gap });
    }
    if start == end {
        return Err(IsaError::OpcodeSpaceExhausted { gap });
    }
    Ok(start..end)
}

fn filler(len: usize) -> impl Iterator<Item = HandlerName> {
    (0..len)
        .filter_map(|code| u8::try_from(code).ok())
        .map(HandlerName::Invalid)
}
