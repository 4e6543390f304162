// Copyright 2026 the ISA Model Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![doc = "Code generator for `isa_model` dispatch tables.\n\n\
          Loads an ISA description (plus optional fragments merged into it), runs the consistency \
          checks and renders a Rust source file with the opcode enum and dispatch tables.\n"]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use isa_model::Isa;
use isa_model::checks;
use isa_model::description::Description;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: isa_model_codegen [isa.json] [dispatch_out.rs] [fragment.json ...]";

fn load(path: &Path) -> Result<Description> {
    let json = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Description::from_json_slice(&json).with_context(|| format!("parse {}", path.display()))
}

/// Builds the model and insists on every consistency check passing.
fn build(description: Description) -> Result<Isa> {
    let isa = Isa::from_description(description).context("build ISA model")?;
    let report = checks::run_all(&isa);
    if !report.is_ok() {
        for failure in report.failures() {
            warn!(check = failure.name, items = %failure.details.join(", "), "check failed");
        }
        bail!("{} consistency checks failed", report.failures().len());
    }
    Ok(isa)
}

/// `call_short_v4_v4_id16` -> `CallShortV4V4Id16`.
fn rust_variant_name(opcode: &str) -> String {
    let mut s = String::with_capacity(opcode.len());
    let mut upper_next = true;
    for ch in opcode.chars() {
        if ch == '_' {
            upper_next = true;
            continue;
        }
        if upper_next {
            s.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            s.push(ch);
        }
    }
    s
}

fn fmt_range(r: &core::ops::Range<u16>) -> String {
    format!("{}..{}", r.start, r.end)
}

fn render(isa: &Isa) -> Result<String> {
    let insns = isa.instructions();
    let mut variants: Vec<String> = Vec::with_capacity(insns.len());
    for insn in insns {
        let v = rust_variant_name(insn.opcode());
        if variants.contains(&v) {
            bail!("opcode '{}' maps to an already used variant '{v}'", insn.opcode());
        }
        variants.push(v);
    }

    let table = isa.dispatch_table();
    let handlers = table.handler_names();

    let mut out = String::new();
    out.push_str("// Copyright 2026 the ISA Model Authors\n");
    out.push_str("// SPDX-License-Identifier: Apache-2.0 OR MIT\n\n");
    out.push_str("// @generated by isa_model_codegen. Do not edit by hand.\n");
    out.push_str(&format!("// ISA checksum: {:#010x}\n\n", isa.checksum()));

    out.push_str("/// Instruction opcodes; the value is the little-endian opcode bytes.\n");
    out.push_str("#[allow(missing_docs, reason = \"generated\")]\n");
    out.push_str("#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]\n");
    out.push_str("#[repr(u16)]\n");
    out.push_str("pub enum Opcode {\n");
    for (insn, v) in insns.iter().zip(&variants) {
        out.push_str(&format!("    {v} = {:#06x},\n", insn.encoded_opcode()));
    }
    out.push_str("}\n\n");

    out.push_str("impl Opcode {\n");
    out.push_str("    /// Every opcode, sorted by value.\n");
    out.push_str(&format!("    pub const ALL: [Self; {}] = [\n", variants.len()));
    for v in &variants {
        out.push_str(&format!("        Self::{v},\n"));
    }
    out.push_str("    ];\n\n");

    out.push_str("    /// Opcode identifier.\n");
    out.push_str("    #[must_use]\n");
    out.push_str("    pub fn name(self) -> &'static str {\n");
    out.push_str("        match self {\n");
    for (insn, v) in insns.iter().zip(&variants) {
        out.push_str(&format!("            Self::{v} => \"{}\",\n", insn.opcode()));
    }
    out.push_str("        }\n");
    out.push_str("    }\n\n");

    out.push_str("    /// Encoded size in bytes.\n");
    out.push_str("    #[must_use]\n");
    out.push_str("    pub fn size(self) -> usize {\n");
    out.push_str("        match self {\n");
    for (insn, v) in insns.iter().zip(&variants) {
        out.push_str(&format!("            Self::{v} => {},\n", insn.format().size()));
    }
    out.push_str("        }\n");
    out.push_str("    }\n");
    out.push_str("}\n\n");

    out.push_str("/// Dispatch handlers: entry `i` handles primary opcode `i`, then one run per prefix.\n");
    out.push_str(&format!(
        "pub const HANDLER_NAMES: [&str; {}] = [\n",
        handlers.len()
    ));
    for h in handlers {
        out.push_str(&format!("    \"{h}\",\n"));
    }
    out.push_str("];\n\n");

    out.push_str("/// Unused primary opcodes between non-prefixed instructions and prefixes.\n");
    out.push_str(&format!(
        "pub const INVALID_NON_PREFIXED: core::ops::Range<u16> = {};\n",
        fmt_range(&table.invalid_non_prefixed_interval())
    ));
    out.push_str("/// Unused primary opcodes between public and private prefixes.\n");
    out.push_str(&format!(
        "pub const INVALID_PREFIXES: core::ops::Range<u16> = {};\n",
        fmt_range(&table.invalid_prefixes_interval())
    ));
    out.push_str("/// Highest primary opcode that needs secondary dispatch.\n");
    out.push_str(&format!(
        "pub const PRIMARY_OPCODE_BOUND: Option<u8> = {:?};\n\n",
        table.primary_opcode_bound()
    ));

    out.push_str("/// Secondary dispatch data of one prefix.\n");
    out.push_str("#[derive(Copy, Clone, Debug, PartialEq, Eq)]\n");
    out.push_str("pub struct PrefixInfo {\n");
    out.push_str("    /// Prefix name.\n");
    out.push_str("    pub name: &'static str,\n");
    out.push_str("    /// Primary opcode.\n");
    out.push_str("    pub opcode: u8,\n");
    out.push_str("    /// Index of secondary opcode 0 in `HANDLER_NAMES`.\n");
    out.push_str("    pub offset: usize,\n");
    out.push_str("    /// Largest secondary opcode, `None` for a prefix without instructions.\n");
    out.push_str("    pub bound: Option<u8>,\n");
    out.push_str("}\n\n");

    out.push_str("/// Prefixes, sorted by opcode.\n");
    out.push_str(&format!(
        "pub const PREFIXES: [PrefixInfo; {}] = [\n",
        table.prefixes().len()
    ));
    for p in table.prefixes() {
        let bound = table.secondary_opcode_bound(&p.name).ok();
        out.push_str(&format!(
            "    PrefixInfo {{ name: \"{}\", opcode: {:#04x}, offset: {}, bound: {bound:?} }},\n",
            p.name, p.opcode, p.offset
        ));
    }
    out.push_str("];\n");

    Ok(out)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let isa_path: PathBuf = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("isa_model/isa.json"));
    let out_path: PathBuf = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("target/isa_model/dispatch_gen.rs"));
    let fragments: Vec<PathBuf> = args.map(PathBuf::from).collect();
    if [&isa_path, &out_path]
        .into_iter()
        .chain(&fragments)
        .any(|p| p.to_string_lossy().starts_with('-'))
    {
        bail!(USAGE);
    }

    let mut description = load(&isa_path)?;
    for fragment in &fragments {
        description = description.merge(load(fragment)?);
        info!(fragment = %fragment.display(), "merged description fragment");
    }

    let isa = build(description)?;
    let rendered = render(&isa)?;

    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(&out_path, rendered.as_bytes())
        .with_context(|| format!("write {}", out_path.display()))?;
    info!(
        path = %out_path.display(),
        handlers = isa.dispatch_table().handler_names().len(),
        checksum = isa.checksum(),
        "dispatch table written"
    );
    Ok(())
}
