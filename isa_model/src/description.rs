// Copyright 2026 the ISA Model Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed ISA description records.
//!
//! This is the deserialized form of an ISA description file. It carries no derived data: formats,
//! operands and opcodes are computed from it by [`crate::isa::Isa`].
//!
//! ```
//! use isa_model::description::Description;
//!
//! let desc = Description::from_json_str(r#"{
//!     "groups": [{
//!         "title": "No operation",
//!         "properties": ["acc_none"],
//!         "exceptions": ["x_none"],
//!         "verification": ["none"],
//!         "instructions": [{ "sig": "nop", "acc": "none", "format": ["op_none"] }]
//!     }]
//! }"#)?;
//! assert_eq!(desc.groups[0].instructions[0].mnemonic(), "nop");
//! # Ok::<(), isa_model::IsaError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::IsaError;

/// A tag (property, exception or verification kind) and its documentation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagDef {
    /// Tag name.
    pub tag: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

/// A declared prefix.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PrefixDecl {
    /// Unique prefix name.
    pub name: String,
    /// Documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Pinned primary opcode, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opcode_idx: Option<u8>,
}

/// A group of instructions sharing properties, exceptions and verification tags.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct GroupDecl {
    /// Group title.
    #[serde(default)]
    pub title: String,
    /// Documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Property tags shared by the group.
    #[serde(default)]
    pub properties: Vec<String>,
    /// Exception tags shared by the group.
    #[serde(default)]
    pub exceptions: Vec<String>,
    /// Verification tags shared by the group.
    #[serde(default)]
    pub verification: Vec<String>,
    /// Instruction declarations.
    pub instructions: Vec<InstructionDecl>,
}

/// One instruction declaration of a group, possibly available in several formats.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct InstructionDecl {
    /// Signature: mnemonic followed by operands.
    pub sig: String,
    /// Accumulator signature.
    #[serde(default = "acc_none")]
    pub acc: String,
    /// Supported formats, one instruction per entry.
    pub format: Vec<String>,
    /// Pinned opcodes, one per format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opcode_idx: Option<Vec<u8>>,
    /// Owning prefix name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Overrides the group property tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<String>>,
    /// Overrides the group exception tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exceptions: Option<Vec<String>>,
    /// Overrides the group verification tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<Vec<String>>,
}

fn acc_none() -> String {
    "none".to_string()
}

impl InstructionDecl {
    /// First word of the signature.
    #[must_use]
    pub fn mnemonic(&self) -> &str {
        self.sig.split_whitespace().next().unwrap_or_default()
    }
}

/// A complete (possibly merged) ISA description.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Description {
    /// Property tag definitions.
    #[serde(default)]
    pub properties: Vec<TagDef>,
    /// Exception tag definitions.
    #[serde(default)]
    pub exceptions: Vec<TagDef>,
    /// Verification tag definitions.
    #[serde(default)]
    pub verification: Vec<TagDef>,
    /// Prefix declarations.
    #[serde(default)]
    pub prefixes: Vec<PrefixDecl>,
    /// Instruction groups.
    #[serde(default)]
    pub groups: Vec<GroupDecl>,
}

impl Description {
    /// Parses a JSON description.
    pub fn from_json_str(json: &str) -> Result<Self, IsaError> {
        serde_json::from_str(json).map_err(|e| IsaError::Parse {
            message: e.to_string(),
        })
    }

    /// Parses a JSON description from raw bytes.
    pub fn from_json_slice(json: &[u8]) -> Result<Self, IsaError> {
        serde_json::from_slice(json).map_err(|e| IsaError::Parse {
            message: e.to_string(),
        })
    }

    /// Appends another description fragment.
    ///
    /// Collections are concatenated in order; conflicts surface when the merged description is
    /// built.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.properties.extend(other.properties);
        self.exceptions.extend(other.exceptions);
        self.verification.extend(other.verification);
        self.prefixes.extend(other.prefixes);
        self.groups.extend(other.groups);
        self
    }

    /// 32-bit content hash of the canonical serialized description.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        // Serializing plain structs with string keys cannot fail.
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        (fnv1a64(&bytes) & 0xffff_ffff) as u32
    }
}

const FNV1A_OFFSET_BASIS_64: u64 = 0xcbf2_9ce4_8422_2325;
const FNV1A_PRIME_64: u64 = 0x0000_0100_0000_01b3;

fn fnv1a64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV1A_OFFSET_BASIS_64, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV1A_PRIME_64)
    })
}
