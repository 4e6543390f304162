// Copyright 2026 the ISA Model Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `isa_model`: opcode, format and dispatch-table assignment for a bytecode ISA description.
//!
//! Given a declarative description of instruction groups, formats and prefixes, the model
//! deterministically:
//! - expands each group into one concrete instruction per supported format,
//! - assigns primary opcodes to non-prefixed instructions and prefixes, and secondary opcodes
//!   within each prefix (pinned opcodes first, then lowest free for instructions and highest free
//!   for prefixes),
//! - computes operand bit offsets and widths per format,
//! - lays out the linear handler list used for dispatch.
//!
//! ## Example
//!
//! ```
//! use isa_model::Isa;
//!
//! let isa = Isa::from_json_str(r#"{
//!     "prefixes": [{ "name": "ext" }],
//!     "groups": [{
//!         "properties": ["acc_none"],
//!         "instructions": [
//!             { "sig": "nop", "format": ["op_none"] },
//!             { "sig": "mov v1:out:i32, v2:in:i32", "format": ["op_v1_4_v2_4"] },
//!             { "sig": "ext.mov v1:out:i32, v2:in:i32", "format": ["pref_op_v1_8_v2_8"],
//!               "prefix": "ext" }
//!         ]
//!     }]
//! }"#)?;
//!
//! let mov = isa.instruction("mov_v4_v4").unwrap();
//! assert_eq!(mov.opcode_idx(), 1);
//! assert_eq!(mov.encode(&[2, 3])?, [0x01, 0x32]);
//!
//! let table = isa.dispatch_table();
//! assert_eq!(table.invalid_non_prefixed_interval(), 2..255);
//! assert_eq!(table.secondary_opcode_offset("ext")?, 256);
//! assert_eq!(table.handler_names()[256].to_string(), "EXT_MOV_PREF_V8_V8");
//! # Ok::<(), Box<dyn core::error::Error>>(())
//! ```

pub mod assign;
pub mod checks;
pub mod codec;
pub mod description;
pub mod dispatch;
pub mod error;
pub(crate) mod expand;
pub mod format;
pub mod instruction;
pub mod isa;
pub(crate) mod opcode_set;
pub mod operand;

pub use error::IsaError;
pub use isa::Isa;
