// Copyright 2026 the ISA Model Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(missing_docs, reason = "integration test crate")]

use std::collections::BTreeSet;

use isa_model::assign::Scope;
use isa_model::checks;
use isa_model::description::Description;
use isa_model::error::Gap;
use isa_model::format::{Format, pretty};
use isa_model::operand::{Direction, OperandType, ValueType};
use isa_model::{Isa, IsaError};

const SAMPLE: &str = include_str!("../../isa_model/isa.json");

fn sample() -> Isa {
    Isa::from_json_str(SAMPLE).unwrap()
}

fn handler_strings(isa: &Isa) -> Vec<String> {
    isa.dispatch_table()
        .handler_names()
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn untagged_group(instructions: &[String]) -> String {
    format!(
        r#"{{ "groups": [{{ "instructions": [{}] }}] }}"#,
        instructions.join(",")
    )
}

#[test]
fn golden_sample_layout() {
    let isa = sample();
    let table = isa.dispatch_table();

    let non_prefixed: Vec<(&str, u16)> = isa
        .instructions()
        .iter()
        .filter(|i| i.prefix().is_none())
        .map(|i| (i.opcode(), i.encoded_opcode()))
        .collect();
    assert_eq!(
        non_prefixed,
        [
            ("nop", 0),
            ("mov_v4_v4", 1),
            ("mov_v8_v8", 2),
            ("mov_v16_v16", 3),
            ("ldai_imm8", 4),
            ("ldai_imm16", 5),
            ("ldai_imm32", 6),
            ("fldai_imm64", 7),
            ("add2_v8", 8),
            ("fadd2_64_v8", 9),
            ("jeqz_imm8", 10),
            ("jeqz_imm16", 11),
            ("jmp_imm8", 12),
            ("call_short_v4_v4_id16", 13),
            ("return", 14),
            ("i32tof64", 15),
        ]
    );

    let prefixes: Vec<(&str, u8, bool)> = isa
        .prefixes()
        .iter()
        .map(|p| (p.name(), p.opcode_idx(), p.is_public()))
        .collect();
    assert_eq!(
        prefixes,
        [("wide", 252, true), ("throw", 253, true), ("builtin", 255, false)]
    );

    assert_eq!(table.invalid_non_prefixed_interval(), 16..252);
    assert_eq!(table.invalid_prefixes_interval(), 254..255);
    assert_eq!(table.primary_opcode_bound(), Some(255));

    let handlers = handler_strings(&isa);
    assert_eq!(handlers.len(), 260);
    assert_eq!(handlers[0], "NOP");
    assert_eq!(handlers[15], "I32TOF64");
    assert!(handlers[16..252].iter().all(|h| h == "INVALID"));
    assert_eq!(handlers[252], "WIDE");
    assert_eq!(handlers[253], "THROW");
    assert_eq!(handlers[254], "INVALID");
    assert_eq!(handlers[255], "BUILTIN");
    assert_eq!(
        handlers[256..],
        [
            "MOV_WIDE_PREF_V16_V16",
            "THROW_PREF_V8",
            "BUILTIN_IDIV_PREF_V8",
            "BUILTIN_IMOD_PREF_V8",
        ]
    );

    assert_eq!(table.secondary_opcode_offset("wide").unwrap(), 256);
    assert_eq!(table.secondary_opcode_offset("throw").unwrap(), 257);
    assert_eq!(table.secondary_opcode_offset("builtin").unwrap(), 258);
    assert_eq!(table.secondary_opcode_bound("wide").unwrap(), 0);
    assert_eq!(table.secondary_opcode_bound("builtin").unwrap(), 1);

    let imod = isa.instruction("builtin_imod_pref_v8").unwrap();
    assert_eq!(imod.opcode_idx(), 1);
    assert_eq!(imod.prefix_opcode(), Some(255));
    assert_eq!(imod.encoded_opcode(), 0x01ff);
    assert!(!imod.is_public());
}

#[test]
fn sample_formats_are_deduplicated_and_sorted() {
    let pretty: Vec<String> = sample()
        .formats()
        .iter()
        .map(|f| f.pretty().to_string())
        .collect();
    assert_eq!(
        pretty,
        [
            "imm16",
            "imm32",
            "imm64",
            "imm8",
            "none",
            "pref_v16_v16",
            "pref_v8",
            "v16_v16",
            "v4_v4",
            "v4_v4_id16",
            "v8",
            "v8_v8",
        ]
    );
}

#[test]
fn sample_passes_every_consistency_check() {
    let report = checks::run_all(&sample());
    assert!(report.is_ok(), "{report}");
}

#[test]
fn builds_are_deterministic() {
    let a = sample();
    let b = sample();
    assert_eq!(handler_strings(&a), handler_strings(&b));
    let opcodes = |isa: &Isa| -> Vec<(String, u16)> {
        isa.instructions()
            .iter()
            .map(|i| (i.opcode().to_string(), i.encoded_opcode()))
            .collect()
    };
    assert_eq!(opcodes(&a), opcodes(&b));
    assert_eq!(a.checksum(), b.checksum());
}

#[test]
fn identifiers_and_scoped_opcodes_are_unique() {
    let isa = sample();
    let ids: BTreeSet<&str> = isa.instructions().iter().map(|i| i.opcode()).collect();
    assert_eq!(ids.len(), isa.instructions().len());

    let scoped: BTreeSet<(Option<&str>, u8)> = isa
        .instructions()
        .iter()
        .map(|i| (i.prefix(), i.opcode_idx()))
        .collect();
    assert_eq!(scoped.len(), isa.instructions().len());

    let primary: BTreeSet<u8> = isa
        .instructions()
        .iter()
        .filter(|i| i.prefix().is_none())
        .map(|i| i.opcode_idx())
        .chain(isa.prefixes().iter().map(|p| p.opcode_idx()))
        .collect();
    assert_eq!(primary.len(), 16 + 3);
}

#[test]
fn explicit_opcodes_win_and_the_rest_take_the_lowest_free() {
    let isa = Isa::from_json_str(&untagged_group(&[
        r#"{ "sig": "a", "format": ["op_none"], "opcode_idx": [5] }"#.to_string(),
        r#"{ "sig": "b", "format": ["op_none"] }"#.to_string(),
        r#"{ "sig": "c", "format": ["op_none"] }"#.to_string(),
    ]))
    .unwrap();
    let op = |id: &str| isa.instruction(id).unwrap().opcode_idx();
    assert_eq!((op("a"), op("b"), op("c")), (5, 0, 1));
    assert!(isa.instruction("a").unwrap().is_public());
    assert!(!isa.instruction("b").unwrap().is_public());
}

#[test]
fn auto_prefixes_take_the_highest_free_opcodes() {
    let isa = Isa::from_json_str(
        r#"{
            "prefixes": [{ "name": "p1" }, { "name": "pinned", "opcode_idx": 250 }, { "name": "p2" }],
            "groups": [{ "instructions": [
                { "sig": "p1.a", "format": ["pref_op_none"], "prefix": "p1" },
                { "sig": "pinned.a", "format": ["pref_op_none"], "prefix": "pinned" },
                { "sig": "p2.a", "format": ["pref_op_none"], "prefix": "p2" }
            ] }]
        }"#,
    )
    .unwrap();
    let prefixes: Vec<(&str, u8)> = isa
        .prefixes()
        .iter()
        .map(|p| (p.name(), p.opcode_idx()))
        .collect();
    assert_eq!(prefixes, [("pinned", 250), ("p2", 254), ("p1", 255)]);
    assert_eq!(isa.dispatch_table().invalid_prefixes_interval(), 251..254);

    // A public prefix above a private one inverts the prefix gap.
    assert_eq!(
        Isa::from_json_str(
            r#"{ "prefixes": [{ "name": "p" }, { "name": "q", "opcode_idx": 255 }], "groups": [] }"#
        )
        .unwrap_err(),
        IsaError::OpcodeSpaceOverlap { gap: Gap::Prefixes }
    );
}

#[test]
fn three_instructions_and_an_auto_prefix() {
    let isa = Isa::from_json_str(
        r#"{
            "prefixes": [{ "name": "ext" }],
            "groups": [{ "instructions": [
                { "sig": "zero", "format": ["op_none"], "opcode_idx": [0] },
                { "sig": "two", "format": ["op_none"], "opcode_idx": [2] },
                { "sig": "auto", "format": ["op_none"] },
                { "sig": "ext.first v:in:i32", "format": ["pref_op_v_8"], "prefix": "ext" },
                { "sig": "ext.second v:in:i32", "format": ["pref_op_v_8"], "prefix": "ext" }
            ] }]
        }"#,
    )
    .unwrap();

    let primary: Vec<u8> = isa
        .instructions()
        .iter()
        .filter(|i| i.prefix().is_none())
        .map(|i| i.opcode_idx())
        .collect();
    assert_eq!(primary, [0, 1, 2]);
    assert_eq!(isa.instruction("auto").unwrap().opcode_idx(), 1);
    assert_eq!(isa.prefixes()[0].opcode_idx(), 255);

    let secondary: Vec<u8> = isa
        .instructions()
        .iter()
        .filter(|i| i.prefix() == Some("ext"))
        .map(|i| i.opcode_idx())
        .collect();
    assert_eq!(secondary, [0, 1]);

    let table = isa.dispatch_table();
    assert_eq!(table.secondary_opcode_offset("ext").unwrap(), 256);
    assert_eq!(table.secondary_opcode_bound("ext").unwrap(), 1);
    assert_eq!(table.invalid_non_prefixed_interval(), 3..255);
    assert_eq!(table.handler_names().len(), 258);
}

#[test]
fn handler_index_is_the_opcode_despite_holes() {
    let isa = Isa::from_json_str(
        r#"{
            "prefixes": [{ "name": "ext" }, { "name": "wide", "opcode_idx": 240 }],
            "groups": [{ "instructions": [
                { "sig": "a", "format": ["op_none"], "opcode_idx": [0] },
                { "sig": "b", "format": ["op_none"], "opcode_idx": [5] },
                { "sig": "wide.w", "format": ["pref_op_none"], "prefix": "wide" },
                { "sig": "ext.x", "format": ["pref_op_none"], "prefix": "ext", "opcode_idx": [5] },
                { "sig": "ext.y", "format": ["pref_op_none"], "prefix": "ext" }
            ] }]
        }"#,
    )
    .unwrap();
    let table = isa.dispatch_table();
    let handlers = handler_strings(&isa);

    for insn in isa.instructions() {
        let index = match insn.prefix() {
            None => usize::from(insn.opcode_idx()),
            Some(prefix) => {
                assert!(insn.opcode_idx() <= table.secondary_opcode_bound(prefix).unwrap());
                table.secondary_opcode_offset(prefix).unwrap() + usize::from(insn.opcode_idx())
            }
        };
        assert_eq!(handlers[index], insn.handler_name(), "{}", insn.opcode());
    }
    for prefix in isa.prefixes() {
        assert_eq!(handlers[usize::from(prefix.opcode_idx())], prefix.handler_name());
    }

    assert_eq!(handlers[1], "INVALID");
    assert_eq!(handlers[5], "B");
    assert_eq!(table.secondary_opcode_bound("ext").unwrap(), 5);
    assert_eq!(table.secondary_opcode_offset("wide").unwrap(), 256);
    assert_eq!(table.secondary_opcode_offset("ext").unwrap(), 257);
    assert_eq!(handlers.len(), 256 + 1 + 6);
}

#[test]
fn scope_capacity_is_one_byte() {
    let insns: Vec<String> = (0..257)
        .map(|i| format!(r#"{{ "sig": "i{i}", "format": ["op_none"] }}"#))
        .collect();
    assert_eq!(
        Isa::from_json_str(&untagged_group(&insns)).unwrap_err(),
        IsaError::ScopeOverflow {
            scope: Scope::NonPrefixed,
            count: 257
        }
    );

    let insns: Vec<String> = (0..257)
        .map(|i| format!(r#"{{ "sig": "p.i{i}", "format": ["pref_op_none"], "prefix": "p" }}"#))
        .collect();
    let json = format!(
        r#"{{ "prefixes": [{{ "name": "p" }}], "groups": [{{ "instructions": [{}] }}] }}"#,
        insns.join(",")
    );
    assert_eq!(
        Isa::from_json_str(&json).unwrap_err(),
        IsaError::ScopeOverflow {
            scope: Scope::Prefix("p".to_string()),
            count: 257
        }
    );
}

#[test]
fn gaps_separate_instructions_public_and_private_prefixes() {
    let isa = sample();
    let table = isa.dispatch_table();
    let max_non_prefixed = isa
        .instructions()
        .iter()
        .filter(|i| i.prefix().is_none())
        .map(|i| u16::from(i.opcode_idx()))
        .max()
        .unwrap();
    let min_public_prefix = isa
        .prefixes()
        .iter()
        .filter(|p| p.is_public())
        .map(|p| u16::from(p.opcode_idx()))
        .min()
        .unwrap();
    let gap = table.invalid_non_prefixed_interval();
    assert!(max_non_prefixed < gap.start);
    assert!(gap.start < gap.end);
    assert_eq!(gap.end, min_public_prefix);

    let gap = table.invalid_prefixes_interval();
    assert!(isa
        .prefixes()
        .iter()
        .filter(|p| p.is_public())
        .all(|p| u16::from(p.opcode_idx()) < gap.start));
    assert!(isa
        .prefixes()
        .iter()
        .filter(|p| !p.is_public())
        .all(|p| u16::from(p.opcode_idx()) >= gap.end));
}

#[test]
fn pinned_instruction_inside_the_prefix_range_overlaps() {
    let json = r#"{
        "prefixes": [{ "name": "p", "opcode_idx": 200 }],
        "groups": [{ "instructions": [
            { "sig": "late", "format": ["op_none"], "opcode_idx": [210] },
            { "sig": "p.a", "format": ["pref_op_none"], "prefix": "p" }
        ] }]
    }"#;
    assert_eq!(
        Isa::from_json_str(json).unwrap_err(),
        IsaError::OpcodeSpaceOverlap {
            gap: Gap::NonPrefixed
        }
    );
}

#[test]
fn pretty_names_ignore_field_numbering() {
    assert_eq!(pretty("op_v1_4_v2_4").unwrap(), "v4_v4");
    assert_eq!(pretty("op_v2_4_v5_4").unwrap(), "v4_v4");
    assert_eq!(pretty("op_imm8").unwrap(), pretty("op_imm_8").unwrap());
    assert_eq!(
        pretty("pref_op_v1_8_v2_8_id_16").unwrap(),
        pretty("pref_op_v3_8_v4_8_id_16").unwrap()
    );
    assert_eq!(
        Format::parse("op_v1_8_imm_16").unwrap(),
        Format::parse("op_v2_8_imm_16").unwrap()
    );
}

#[test]
fn unaligned_format_is_fatal() {
    assert_eq!(
        Format::parse("op_imm8_v4").unwrap_err(),
        IsaError::UnalignedFormat {
            format: "op_imm8_v4".to_string(),
            bits: 12
        }
    );
    let err = Isa::from_json_str(&untagged_group(&[
        r#"{ "sig": "odd imm:i8, v:in:i32", "format": ["op_imm8_v4"] }"#.to_string(),
    ]))
    .unwrap_err();
    assert!(matches!(err, IsaError::UnalignedFormat { bits: 12, .. }), "{err}");
}

#[test]
fn inout_accumulator_is_split_into_two_operands() {
    let isa = sample();
    let add2 = isa.instruction("add2_v8").unwrap();
    let acc: Vec<(Direction, OperandType)> = add2
        .acc_and_operands()
        .iter()
        .filter(|o| o.is_acc())
        .map(|o| (o.direction(), o.ty()))
        .collect();
    let i32_ty = OperandType {
        base: ValueType::I32,
        array: false,
    };
    assert_eq!(acc, [(Direction::Out, i32_ty), (Direction::In, i32_ty)]);
    assert_eq!(add2.operands().len(), 1);
    assert_eq!(add2.dtype(), i32_ty);

    let conv = isa.instruction("i32tof64").unwrap();
    assert_eq!(conv.dtype().base, ValueType::F64);
    assert_eq!(conv.src_type(0).base, ValueType::I32);
    assert_eq!((conv.op_size(), conv.dest_op_size()), (32, 64));
}

#[test]
fn operand_layout_follows_the_format() {
    let isa = sample();
    let call = isa.instruction("call_short_v4_v4_id16").unwrap();
    let layout: Vec<(&str, u32, u32)> = call
        .operands()
        .iter()
        .map(|o| (o.name(), o.width(), o.offset()))
        .collect();
    assert_eq!(layout, [("method_id", 16, 16), ("v", 4, 8), ("v", 4, 12)]);
    assert_eq!(call.format().size(), 4);
    assert_eq!(call.handler_name(), "CALL_SHORT_V4_V4_ID16");
}

#[test]
fn encoded_stream_decodes_back_to_its_instructions() {
    let isa = sample();
    let program: [(&str, &[u64]); 4] = [
        ("mov_v4_v4", &[1, 2]),
        ("mov_wide_pref_v16_v16", &[0x1234, 7]),
        ("builtin_idiv_pref_v8", &[9]),
        ("return", &[]),
    ];
    let mut bytes = Vec::new();
    for (id, values) in program {
        bytes.extend(isa.instruction(id).unwrap().encode(values).unwrap());
    }
    assert_eq!(
        bytes,
        [
            0x01, 0x21, // mov v1, v2
            0xfc, 0x00, 0x34, 0x12, 0x07, 0x00, // mov.wide
            0xff, 0x00, 0x09, // builtin.idiv
            0x0e, // return
        ]
    );

    let decoded = isa.decode_all(&bytes).unwrap();
    let ids: Vec<&str> = decoded.iter().map(|(insn, _)| insn.opcode()).collect();
    assert_eq!(
        ids,
        ["mov_v4_v4", "mov_wide_pref_v16_v16", "builtin_idiv_pref_v8", "return"]
    );
    assert_eq!(decoded[1].1.values, [0x1234, 7]);
}

#[test]
fn merged_fragments_must_not_repeat_instructions() {
    let base = Description::from_json_str(SAMPLE).unwrap();
    let fragment = Description::from_json_str(
        r#"{ "groups": [{ "instructions": [{ "sig": "jmp imm:i32", "format": ["op_imm_8"] }] }] }"#,
    )
    .unwrap();
    assert_eq!(
        Isa::from_description(base.merge(fragment)).unwrap_err(),
        IsaError::DuplicateInstruction {
            opcode: "jmp_imm8".to_string()
        }
    );
}

#[test]
fn checksum_ignores_formatting() {
    let compact: serde_json::Value = serde_json::from_str(SAMPLE).unwrap();
    let reformatted = serde_json::to_string(&compact).unwrap();
    assert_ne!(reformatted, SAMPLE);
    assert_eq!(
        Isa::from_json_str(&reformatted).unwrap().checksum(),
        sample().checksum()
    );
}

#[test]
fn broken_descriptions_fail_named_checks() {
    let isa = Isa::from_json_str(
        r#"{
            "properties": [{ "tag": "jump" }, { "tag": "conditional" }, { "tag": "unused" }],
            "groups": [{
                "properties": ["conditional", "acc_none"],
                "exceptions": ["x_none"],
                "verification": ["none"],
                "instructions": [{ "sig": "jnz imm:i32", "format": ["op_imm_8"] }]
            }]
        }"#,
    )
    .unwrap();
    let report = checks::run_all(&isa);
    assert!(!report.is_ok());
    assert!(report.failure(checks::CONDITIONAL_JUMPS).is_some(), "{report}");
    assert!(report.failure(checks::TAGS_USED).is_some(), "{report}");
    assert!(report.failure(checks::TAGS_DEFINED).is_some(), "{report}");
    assert!(report.failure(checks::FLOAT_TYPES).is_none(), "{report}");
}
