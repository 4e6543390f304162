// Copyright 2026 the ISA Model Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named consistency checks over a built [`Isa`].
//!
//! These are properties a well-formed ISA description is expected to have but that do not stop
//! the model from being built. [`run_all`] evaluates every check and reports every failure, so a
//! driver can print them all in one go.

use core::fmt;
use std::collections::{BTreeMap, BTreeSet};

use crate::description::{InstructionDecl, TagDef};
use crate::instruction::Instruction;
use crate::isa::Isa;

/// A failed check with the items that violate it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckFailure {
    /// Check name.
    pub name: &'static str,
    /// One entry per offending item.
    pub details: Vec<String>,
}

/// Outcome of [`run_all`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckReport {
    failures: Vec<CheckFailure>,
}

impl CheckReport {
    /// Returns `true` if every check passed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failed checks in evaluation order.
    #[must_use]
    pub fn failures(&self) -> &[CheckFailure] {
        &self.failures
    }

    /// Returns the failure of the check called `name`, if it failed.
    #[must_use]
    pub fn failure(&self, name: &str) -> Option<&CheckFailure> {
        self.failures.iter().find(|f| f.name == name)
    }

    fn record(&mut self, name: &'static str, details: Vec<String>) {
        if !details.is_empty() {
            self.failures.push(CheckFailure { name, details });
        }
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for failure in &self.failures {
            writeln!(f, "'{}' check failed: {}", failure.name, failure.details.join(", "))?;
        }
        Ok(())
    }
}

/// Names of the checks run by [`run_all`], in evaluation order.
pub const CHECKS: [&str; 18] = [
    TAGS_UNIQUE,
    TAGS_USED,
    TAGS_DEFINED,
    GROUPS_TAGGED,
    MNEMONIC_OPERANDS,
    DTYPE_NONE,
    FLOAT_TYPES,
    CONDITIONAL_JUMPS,
    ACC_NONE_EXCLUSIVE,
    CALLS_WRITE_ACC,
    CALLS_NON_PREFIXED,
    JUMPS_DISTINCT,
    CONVERSION_SIZES,
    SINGLE_DST,
    SINGLE_ID,
    REGISTER_WIDTHS,
    CALL_PROPERTY,
    CALL_VIRT_PROPERTY,
];

/// Tags are unique between categories.
pub const TAGS_UNIQUE: &str = "All tags are unique between categories";
/// Every defined tag is used by some instruction.
pub const TAGS_USED: &str = "All tags are used";
/// Every used tag is defined.
pub const TAGS_DEFINED: &str = "All tags are defined";
/// Groups carry verification, exception and property tags.
pub const GROUPS_TAGGED: &str =
    "Verification, exceptions and properties are not empty for every instruction group";
/// All formats of a mnemonic take the same operands.
pub const MNEMONIC_OPERANDS: &str = "Mnemonic defines operand types";
/// `dtype` is `none` exactly when nothing is written.
pub const DTYPE_NONE: &str = "Dtype is none iff the instruction writes nothing";
/// The `float` property matches float operand types.
pub const FLOAT_TYPES: &str = "Float property matches operand types";
/// Conditionals are jumps.
pub const CONDITIONAL_JUMPS: &str = "Conditionals are jumps";
/// `acc_none` excludes `acc_read` and `acc_write`.
pub const ACC_NONE_EXCLUSIVE: &str = "Acc_none is exclusive with other accumulator properties";
/// Calls write the accumulator.
pub const CALLS_WRITE_ACC: &str = "All calls write into accumulator";
/// Calls are not prefixed, polymorphic calls aside.
pub const CALLS_NON_PREFIXED: &str = "Calls are non-prefixed";
/// Throw, call and return are not jumps.
pub const JUMPS_DISTINCT: &str = "Jumps differ from other control-flow";
/// Conversion mnemonics agree with operand sizes.
pub const CONVERSION_SIZES: &str = "Conversions correspond to source and destination types";
/// At most one destination.
pub const SINGLE_DST: &str = "At most one destination operand";
/// At most one id operand.
pub const SINGLE_ID: &str = "At most one id operand";
/// Register fields of one instruction share a width.
pub const REGISTER_WIDTHS: &str = "Register encoding width is the same in an instruction";
/// Mnemonics containing `call` have the `call` property.
pub const CALL_PROPERTY: &str = "Calls have call property";
/// Mnemonics containing `call.virt` have the `call_virt` property.
pub const CALL_VIRT_PROPERTY: &str = "Virtual calls have call_virt property";

/// Runs every check.
#[must_use]
pub fn run_all(isa: &Isa) -> CheckReport {
    let mut report = CheckReport::default();
    let desc = isa.description();
    let insns = isa.instructions();
    let categories: [(&str, &[TagDef], fn(&Instruction) -> &[String]); 3] = [
        ("verification", &desc.verification, Instruction::verification),
        ("exceptions", &desc.exceptions, Instruction::exceptions),
        ("properties", &desc.properties, Instruction::properties),
    ];

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut repeated: BTreeSet<&str> = BTreeSet::new();
    for (_, defs, _) in &categories {
        for def in *defs {
            if !seen.insert(def.tag.as_str()) {
                repeated.insert(def.tag.as_str());
            }
        }
    }
    report.record(TAGS_UNIQUE, repeated.into_iter().map(str::to_string).collect());

    let mut unused = Vec::new();
    let mut undefined = Vec::new();
    for (category, defs, tags) in &categories {
        let defined: BTreeSet<&str> = defs.iter().map(|d| d.tag.as_str()).collect();
        let used: BTreeSet<&str> = insns
            .iter()
            .flat_map(|i| tags(i).iter().map(String::as_str))
            .collect();
        unused.extend(defined.difference(&used).map(|t| format!("{category}: {t}")));
        undefined.extend(used.difference(&defined).map(|t| format!("{category}: {t}")));
    }
    report.record(TAGS_USED, unused);
    report.record(TAGS_DEFINED, undefined);

    report.record(
        GROUPS_TAGGED,
        desc.groups
            .iter()
            .filter(|g| {
                !(covers(&g.verification, &g.instructions, |d| d.verification.as_ref())
                    && covers(&g.exceptions, &g.instructions, |d| d.exceptions.as_ref())
                    && covers(&g.properties, &g.instructions, |d| d.properties.as_ref()))
            })
            .map(|g| g.title.clone())
            .collect(),
    );

    let mut shapes: BTreeMap<&str, BTreeSet<Vec<&str>>> = BTreeMap::new();
    for insn in insns {
        shapes
            .entry(insn.mnemonic())
            .or_default()
            .insert(insn.operands().iter().map(|op| op.name()).collect());
    }
    report.record(
        MNEMONIC_OPERANDS,
        shapes
            .into_iter()
            .filter(|(_, s)| s.len() > 1)
            .map(|(m, _)| m.to_string())
            .collect(),
    );

    per_instruction(&mut report, insns, DTYPE_NONE, |i| {
        i.has_property("language")
            || i.acc_and_operands().iter().any(|op| op.is_dst()) == !i.dtype().is_none()
    });
    per_instruction(&mut report, insns, FLOAT_TYPES, |i| {
        i.is_float() == i.acc_and_operands().iter().any(|op| op.ty().base.is_float())
    });
    per_instruction(&mut report, insns, CONDITIONAL_JUMPS, |i| {
        !i.is_conditional() || i.is_jump()
    });
    per_instruction(&mut report, insns, ACC_NONE_EXCLUSIVE, |i| {
        i.has_property("acc_none") != (i.has_property("acc_read") || i.has_property("acc_write"))
    });
    per_instruction(&mut report, insns, CALLS_WRITE_ACC, |i| {
        !i.has_property("call") || i.has_property("acc_write")
    });
    per_instruction(&mut report, insns, CALLS_NON_PREFIXED, |i| {
        !i.has_property("call") || i.mnemonic().contains("polymorphic") || i.prefix().is_none()
    });
    per_instruction(&mut report, insns, JUMPS_DISTINCT, |i| {
        let m = i.mnemonic();
        !(m.starts_with("throw") || m.starts_with("call") || m.starts_with("return"))
            || !i.is_jump()
    });
    per_instruction(&mut report, insns, CONVERSION_SIZES, |i| {
        let Some((src, dst)) = conversion_sizes(i.mnemonic()) else {
            return true;
        };
        i.op_size() >= src && i.dest_op_size() >= dst
    });
    per_instruction(&mut report, insns, SINGLE_DST, |i| {
        i.acc_and_operands().iter().filter(|op| op.is_dst()).count() <= 1
    });
    per_instruction(&mut report, insns, SINGLE_ID, |i| {
        i.operands().iter().filter(|op| op.is_id()).count() <= 1
    });
    per_instruction(&mut report, insns, REGISTER_WIDTHS, |i| {
        let widths: BTreeSet<u32> = i
            .operands()
            .iter()
            .filter(|op| op.is_reg())
            .map(|op| op.width())
            .collect();
        widths.len() <= 1
    });
    per_instruction(&mut report, insns, CALL_PROPERTY, |i| {
        !i.mnemonic().contains("call") || i.has_property("call")
    });
    per_instruction(&mut report, insns, CALL_VIRT_PROPERTY, |i| {
        !i.mnemonic().contains("call.virt") || i.has_property("call_virt")
    });

    report
}

/// A group category is covered by its own tags or by every instruction overriding it.
fn covers(
    group_tags: &[String],
    decls: &[InstructionDecl],
    overrides: impl Fn(&InstructionDecl) -> Option<&Vec<String>>,
) -> bool {
    !group_tags.is_empty()
        || decls
            .iter()
            .all(|d| overrides(d).is_some_and(|tags| !tags.is_empty()))
}

fn per_instruction(
    report: &mut CheckReport,
    insns: &[Instruction],
    name: &'static str,
    holds: impl Fn(&Instruction) -> bool,
) {
    report.record(
        name,
        insns
            .iter()
            .filter(|i| !holds(i))
            .map(|i| i.opcode().to_string())
            .collect(),
    );
}

/// Finds `<i|f|u>N to <i|f|u>M` in a mnemonic (`i32tof64`, `f64toi32`).
fn conversion_sizes(mnemonic: &str) -> Option<(u32, u32)> {
    let bytes = mnemonic.as_bytes();
    let is_kind = |b: u8| matches!(b, b'i' | b'f' | b'u');
    let digits_at = |start: usize| -> usize {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    for start in 0..bytes.len() {
        if !is_kind(bytes[start]) {
            continue;
        }
        let src_len = digits_at(start + 1);
        if src_len == 0 {
            continue;
        }
        let to = start + 1 + src_len;
        if !mnemonic[to..].starts_with("to") || to + 2 >= bytes.len() || !is_kind(bytes[to + 2]) {
            continue;
        }
        let dst_len = digits_at(to + 3);
        if dst_len == 0 {
            continue;
        }
        let src = mnemonic[start + 1..to].parse().ok()?;
        let dst = mnemonic[to + 3..to + 3 + dst_len].parse().ok()?;
        return Some((src, dst));
    }
    None
}
