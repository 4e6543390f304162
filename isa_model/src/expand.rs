// Copyright 2026 the ISA Model Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Expansion of instruction groups into one pending instruction per (declaration, format).

use std::collections::BTreeSet;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::assign::{Assignable, Scope};
use crate::description::{GroupDecl, InstructionDecl};
use crate::error::IsaError;
use crate::format::{Format, FormatTable};
use crate::instruction::{Instruction, opcode_identifier};
use crate::operand::{Operand, parse_acc_signature, parse_operands};

/// An expanded instruction still waiting for its opcode.
#[derive(Clone, Debug)]
pub(crate) struct PendingInstruction {
    mnemonic: String,
    sig: String,
    acc: String,
    properties: Vec<String>,
    exceptions: Vec<String>,
    verification: Vec<String>,
    format: Arc<Format>,
    prefix: Option<String>,
    explicit_opcode: Option<u8>,
    acc_and_operands: Vec<Operand>,
    explicit_start: usize,
    opcode: String,
}

impl PendingInstruction {
    pub(crate) fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Freezes the instruction with its assigned opcode(s). Consumes the pending record.
    pub(crate) fn into_instruction(self, opcode_idx: u8, prefix_opcode: Option<u8>) -> Instruction {
        Instruction {
            mnemonic: self.mnemonic,
            sig: self.sig,
            acc: self.acc,
            properties: self.properties,
            exceptions: self.exceptions,
            verification: self.verification,
            format: self.format,
            public: self.explicit_opcode.is_some(),
            prefix: self.prefix,
            opcode_idx,
            prefix_opcode,
            acc_and_operands: self.acc_and_operands,
            explicit_start: self.explicit_start,
            opcode: self.opcode,
        }
    }
}

impl Assignable for PendingInstruction {
    fn scope(&self) -> Scope {
        self.prefix
            .as_ref()
            .map_or(Scope::NonPrefixed, |p| Scope::Prefix(p.clone()))
    }

    fn explicit_opcode(&self) -> Option<u8> {
        self.explicit_opcode
    }

    fn label(&self) -> String {
        self.opcode.clone()
    }
}

/// Expands every group in declaration order: groups, then instructions, then formats.
///
/// `prefixes` maps declared prefix names to their declaration index.
pub(crate) fn expand(
    groups: &[GroupDecl],
    prefixes: &HashMap<String, usize>,
    formats: &mut FormatTable,
) -> Result<Vec<PendingInstruction>, IsaError> {
    let mut out: Vec<PendingInstruction> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for group in groups {
        for decl in &group.instructions {
            expand_decl(group, decl, prefixes, formats, &mut out)?;
        }
    }

    for insn in &out {
        if !seen.insert(insn.opcode.clone()) {
            return Err(IsaError::DuplicateInstruction {
                opcode: insn.opcode.clone(),
            });
        }
    }
    Ok(out)
}

fn expand_decl(
    group: &GroupDecl,
    decl: &InstructionDecl,
    prefixes: &HashMap<String, usize>,
    formats: &mut FormatTable,
    out: &mut Vec<PendingInstruction>,
) -> Result<(), IsaError> {
    let mnemonic = decl.mnemonic();
    if mnemonic.is_empty() {
        return Err(IsaError::BadSignature {
            mnemonic: String::new(),
            signature: decl.sig.clone(),
        });
    }
    if let Some(opcodes) = &decl.opcode_idx {
        if opcodes.len() != decl.format.len() {
            return Err(IsaError::OpcodeCountMismatch {
                mnemonic: mnemonic.to_string(),
                formats: decl.format.len(),
                opcodes: opcodes.len(),
            });
        }
    }
    if let Some(prefix) = &decl.prefix {
        if !prefixes.contains_key(prefix) {
            return Err(IsaError::UnknownPrefix {
                name: prefix.clone(),
            });
        }
    }

    let properties = decl.properties.as_ref().unwrap_or(&group.properties);
    let exceptions = decl.exceptions.as_ref().unwrap_or(&group.exceptions);
    let verification = decl.verification.as_ref().unwrap_or(&group.verification);
    let acc_operands = parse_acc_signature(mnemonic, &decl.acc)?;

    for (slot, format_name) in decl.format.iter().enumerate() {
        let format = formats.intern(format_name)?;
        if format.is_prefixed() != decl.prefix.is_some() {
            return Err(IsaError::PrefixMismatch {
                mnemonic: mnemonic.to_string(),
                format: format_name.clone(),
            });
        }

        let mut acc_and_operands = acc_operands.clone();
        let explicit_start = acc_and_operands.len();
        acc_and_operands.extend(parse_operands(mnemonic, &decl.sig, &format)?);

        out.push(PendingInstruction {
            mnemonic: mnemonic.to_string(),
            sig: decl.sig.clone(),
            acc: decl.acc.clone(),
            properties: properties.clone(),
            exceptions: exceptions.clone(),
            verification: verification.clone(),
            opcode: opcode_identifier(mnemonic, &format),
            format,
            prefix: decl.prefix.clone(),
            explicit_opcode: decl.opcode_idx.as_ref().map(|ops| ops[slot]),
            acc_and_operands,
            explicit_start,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use hashbrown::HashMap;

    use super::expand;
    use crate::assign::{Assignable, Scope};
    use crate::description::Description;
    use crate::error::IsaError;
    use crate::format::FormatTable;

    fn run(json: &str, prefixes: &[&str]) -> Result<Vec<super::PendingInstruction>, IsaError> {
        let desc = Description::from_json_str(json).unwrap();
        let known: HashMap<String, usize> = prefixes
            .iter()
            .enumerate()
            .map(|(i, p)| (p.to_string(), i))
            .collect();
        expand(&desc.groups, &known, &mut FormatTable::new())
    }

    #[test]
    fn one_instruction_per_format_with_group_inheritance() {
        let json = r#"{ "groups": [{
            "properties": ["acc_none"],
            "exceptions": ["x_none"],
            "verification": ["v2_i32"],
            "instructions": [
                { "sig": "mov v1:out:i32, v2:in:i32", "format": ["op_v1_4_v2_4", "op_v1_8_v2_8"],
                  "opcode_idx": [1, 2] },
                { "sig": "nop", "format": ["op_none"], "properties": ["acc_none", "x"] }
            ]
        }] }"#;
        let out = run(json, &[]).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].opcode, "mov_v4_v4");
        assert_eq!(out[1].opcode, "mov_v8_v8");
        assert_eq!(out[1].explicit_opcode(), Some(2));
        assert_eq!(out[0].verification, ["v2_i32"]);
        assert_eq!(out[2].properties, ["acc_none", "x"]);
        assert_eq!(out[2].exceptions, ["x_none"]);
        assert_eq!(out[2].explicit_opcode(), None);
        assert_eq!(out[2].scope(), Scope::NonPrefixed);
    }

    #[test]
    fn opcode_list_length_must_match_formats() {
        let json = r#"{ "groups": [{ "instructions": [
            { "sig": "ldai imm:i32", "acc": "out:i32", "format": ["op_imm_8", "op_imm_16"],
              "opcode_idx": [4] }
        ] }] }"#;
        assert_eq!(
            run(json, &[]).unwrap_err(),
            IsaError::OpcodeCountMismatch {
                mnemonic: "ldai".to_string(),
                formats: 2,
                opcodes: 1
            }
        );
    }

    #[test]
    fn prefix_must_be_declared_and_agree_with_format() {
        let prefixed = r#"{ "groups": [{ "instructions": [
            { "sig": "throw v:in:ref", "format": ["pref_op_v_8"], "prefix": "throw" }
        ] }] }"#;
        assert!(matches!(
            run(prefixed, &[]),
            Err(IsaError::UnknownPrefix { name }) if name == "throw"
        ));
        let out = run(prefixed, &["throw"]).unwrap();
        assert_eq!(out[0].scope(), Scope::Prefix("throw".to_string()));

        let missing_prefix = r#"{ "groups": [{ "instructions": [
            { "sig": "throw v:in:ref", "format": ["pref_op_v_8"] }
        ] }] }"#;
        assert!(matches!(
            run(missing_prefix, &["throw"]),
            Err(IsaError::PrefixMismatch { .. })
        ));

        let plain_format = r#"{ "groups": [{ "instructions": [
            { "sig": "throw v:in:ref", "format": ["op_v_8"], "prefix": "throw" }
        ] }] }"#;
        assert!(matches!(
            run(plain_format, &["throw"]),
            Err(IsaError::PrefixMismatch { .. })
        ));
    }

    #[test]
    fn same_mnemonic_and_format_twice_is_fatal() {
        let json = r#"{ "groups": [
            { "instructions": [{ "sig": "nop", "format": ["op_none"] }] },
            { "instructions": [{ "sig": "nop", "format": ["op_none"] }] }
        ] }"#;
        assert_eq!(
            run(json, &[]).unwrap_err(),
            IsaError::DuplicateInstruction {
                opcode: "nop".to_string()
            }
        );
    }

    #[test]
    fn accumulator_operands_precede_explicit_ones() {
        let json = r#"{ "groups": [{ "instructions": [
            { "sig": "add2 v:in:i32", "acc": "inout:i32", "format": ["op_v_8"] }
        ] }] }"#;
        let out = run(json, &[]).unwrap();
        let insn = out.into_iter().next().unwrap().into_instruction(8, None);
        assert_eq!(insn.acc_and_operands().len(), 3);
        assert_eq!(insn.operands().len(), 1);
        assert!(insn.operands()[0].is_reg());
        assert!(insn.acc_and_operands()[0].is_acc() && insn.acc_and_operands()[0].is_dst());
        assert!(!insn.is_public());
        assert_eq!(insn.encoded_opcode(), 8);
    }
}
