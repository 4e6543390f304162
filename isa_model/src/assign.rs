// Copyright 2026 the ISA Model Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opcode assignment.
//!
//! A single allocator serves both instructions and prefixes. Items are grouped into scopes, each
//! owning a full byte of opcode space:
//! 1. every scope is checked to hold at most 256 items,
//! 2. explicit (public) opcodes are consumed in declaration order,
//! 3. the remaining (private) items take free opcodes in declaration order, lowest first or
//!    highest first depending on the [`SelectionPolicy`].

use core::fmt;
use std::collections::BTreeMap;

use tracing::debug;

use crate::error::IsaError;
use crate::opcode_set::{OPCODE_SPACE, OpcodeSet};

/// An independent opcode namespace.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    /// Primary opcodes of non-prefixed instructions (and, in their own run, of prefixes).
    NonPrefixed,
    /// Secondary opcodes of the instructions owned by one prefix.
    Prefix(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPrefixed => write!(f, "the non-prefixed opcode space"),
            Self::Prefix(name) => write!(f, "prefix '{name}'"),
        }
    }
}

/// Which free opcode a private item receives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Lowest free opcode (instructions).
    SelectMin,
    /// Highest free opcode (prefixes).
    SelectMax,
}

/// Something that needs an opcode.
pub(crate) trait Assignable {
    /// Scope the item lives in.
    fn scope(&self) -> Scope;
    /// Pinned opcode, if the declaration supplied one.
    fn explicit_opcode(&self) -> Option<u8>;
    /// Name used in diagnostics.
    fn label(&self) -> String;
}

/// Per-scope used-opcode sets for one assignment pass.
#[derive(Debug)]
pub struct OpcodeAssigner {
    policy: SelectionPolicy,
    used: BTreeMap<Scope, OpcodeSet>,
}

impl OpcodeAssigner {
    /// Creates an assigner with no opcode used yet.
    #[must_use]
    pub fn new(policy: SelectionPolicy) -> Self {
        Self {
            policy,
            used: BTreeMap::new(),
        }
    }

    /// Marks an explicit opcode as taken.
    pub fn consume(&mut self, scope: &Scope, opcode: u8, item: &str) -> Result<(), IsaError> {
        let set = self
            .used
            .entry(scope.clone())
            .or_insert_with(OpcodeSet::new_empty);
        if !set.insert(opcode) {
            return Err(IsaError::DuplicateOpcode {
                scope: scope.clone(),
                opcode,
                item: item.to_string(),
            });
        }
        Ok(())
    }

    /// Takes the next free opcode of `scope` according to the policy.
    pub fn next_free(&mut self, scope: &Scope, item: &str) -> Result<u8, IsaError> {
        let set = self
            .used
            .entry(scope.clone())
            .or_insert_with(OpcodeSet::new_empty);
        let free = match self.policy {
            SelectionPolicy::SelectMin => set.min_free(),
            SelectionPolicy::SelectMax => set.max_free(),
        };
        let Some(opcode) = free else {
            return Err(IsaError::ScopeExhausted {
                scope: scope.clone(),
                item: item.to_string(),
            });
        };
        set.insert(opcode);
        Ok(opcode)
    }

    /// Number of opcodes taken in `scope`.
    #[must_use]
    pub fn used(&self, scope: &Scope) -> usize {
        self.used.get(scope).map_or(0, OpcodeSet::len)
    }
}

/// Assigns an opcode to every item, returning them in item order.
pub(crate) fn assign<T: Assignable>(
    items: &[T],
    policy: SelectionPolicy,
) -> Result<Vec<u8>, IsaError> {
    let mut counts: BTreeMap<Scope, usize> = BTreeMap::new();
    for item in items {
        *counts.entry(item.scope()).or_default() += 1;
    }
    if let Some((scope, &count)) = counts.iter().find(|(_, c)| **c > OPCODE_SPACE) {
        return Err(IsaError::ScopeOverflow {
            scope: scope.clone(),
            count,
        });
    }

    let mut assigner = OpcodeAssigner::new(policy);
    let mut out: Vec<Option<u8>> = vec![None; items.len()];

    for (slot, item) in out.iter_mut().zip(items) {
        if let Some(opcode) = item.explicit_opcode() {
            assigner.consume(&item.scope(), opcode, &item.label())?;
            *slot = Some(opcode);
        }
    }

    for (slot, item) in out.iter_mut().zip(items) {
        if slot.is_none() {
            let scope = item.scope();
            let label = item.label();
            let opcode = assigner.next_free(&scope, &label)?;
            debug!(item = %label, %scope, opcode, "opcode assigned");
            *slot = Some(opcode);
        }
    }

    Ok(out.into_iter().flatten().collect())
}
