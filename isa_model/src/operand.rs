// Copyright 2026 the ISA Model Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Instruction operands and signature parsing.
//!
//! Signatures use a small notation:
//! - instruction: `mnemonic op, op, ...` where each `op` is `name`, `name:type` or
//!   `name:access:type` (`access` is `in`, `out` or `inout`, default `in`);
//! - accumulator: `none`, `access:type`, or `inout:src_type->dst_type`.
//!
//! An `inout` operand never survives parsing as one value: it becomes an `out` operand followed
//! by an `in` operand with the same name, type and placement.

use core::fmt;

use crate::error::IsaError;
use crate::format::Format;

/// Semantic operand kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperandKind {
    /// A virtual register (`v`).
    Reg,
    /// The implicit accumulator (`acc`).
    Acc,
    /// An immediate (`imm`).
    Imm,
    /// A method id.
    MethodId,
    /// A type id.
    TypeId,
    /// A field id.
    FieldId,
    /// A string id.
    StringId,
    /// A literal array id.
    LiteralArrayId,
}

impl OperandKind {
    /// Parses an operand name with index digits already removed.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "v" => Self::Reg,
            "acc" => Self::Acc,
            "imm" => Self::Imm,
            "method_id" => Self::MethodId,
            "type_id" => Self::TypeId,
            "field_id" => Self::FieldId,
            "string_id" => Self::StringId,
            "literalarray_id" => Self::LiteralArrayId,
            _ => return None,
        })
    }

    /// Canonical operand name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Reg => "v",
            Self::Acc => "acc",
            Self::Imm => "imm",
            Self::MethodId => "method_id",
            Self::TypeId => "type_id",
            Self::FieldId => "field_id",
            Self::StringId => "string_id",
            Self::LiteralArrayId => "literalarray_id",
        }
    }

    /// Returns `true` for the id-reference kinds.
    #[must_use]
    pub fn is_id(self) -> bool {
        matches!(
            self,
            Self::MethodId | Self::TypeId | Self::FieldId | Self::StringId | Self::LiteralArrayId
        )
    }
}

/// Operand direction after `inout` splitting.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Read by the instruction.
    In,
    /// Written by the instruction.
    Out,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Access {
    In,
    Out,
    InOut,
}

impl Access {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "in" => Self::In,
            "out" => Self::Out,
            "inout" => Self::InOut,
            _ => return None,
        })
    }

    fn directions(self) -> &'static [Direction] {
        match self {
            Self::In => &[Direction::In],
            Self::Out => &[Direction::Out],
            Self::InOut => &[Direction::Out, Direction::In],
        }
    }
}

/// Base value type of an operand.
#[allow(missing_docs, reason = "variants are the type names")]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    None,
    U1,
    U2,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    B32,
    F32,
    I64,
    U64,
    B64,
    F64,
    Ref,
    Top,
    Any,
}

impl ValueType {
    /// Parses a type name without array suffix.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "none" => Self::None,
            "u1" => Self::U1,
            "u2" => Self::U2,
            "i8" => Self::I8,
            "u8" => Self::U8,
            "i16" => Self::I16,
            "u16" => Self::U16,
            "i32" => Self::I32,
            "u32" => Self::U32,
            "b32" => Self::B32,
            "f32" => Self::F32,
            "i64" => Self::I64,
            "u64" => Self::U64,
            "b64" => Self::B64,
            "f64" => Self::F64,
            "ref" => Self::Ref,
            "top" => Self::Top,
            "any" => Self::Any,
            _ => return None,
        })
    }

    /// Type name as written in signatures.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::U1 => "u1",
            Self::U2 => "u2",
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::B32 => "b32",
            Self::F32 => "f32",
            Self::I64 => "i64",
            Self::U64 => "u64",
            Self::B64 => "b64",
            Self::F64 => "f64",
            Self::Ref => "ref",
            Self::Top => "top",
            Self::Any => "any",
        }
    }

    /// Size in bits for sized types, `0` for `none`, `ref`, `top` and `any`.
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            Self::None | Self::Ref | Self::Top | Self::Any => 0,
            Self::U1 => 1,
            Self::U2 => 2,
            Self::I8 | Self::U8 => 8,
            Self::I16 | Self::U16 => 16,
            Self::I32 | Self::U32 | Self::B32 | Self::F32 => 32,
            Self::I64 | Self::U64 | Self::B64 | Self::F64 => 64,
        }
    }

    /// Returns `true` for `f32` and `f64`.
    #[must_use]
    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

/// Operand type: a [`ValueType`], possibly array-flavored (`i32[]`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OperandType {
    /// Element (or scalar) type.
    pub base: ValueType,
    /// `true` for `T[]`.
    pub array: bool,
}

impl OperandType {
    /// The `none` type.
    pub const NONE: Self = Self {
        base: ValueType::None,
        array: false,
    };

    /// Parses `T` or `T[]`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (base, array) = match s.strip_suffix("[]") {
            Some(base) => (base, true),
            None => (s, false),
        };
        ValueType::parse(base).map(|base| Self { base, array })
    }

    /// Returns `true` for the scalar `none` type.
    #[must_use]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for OperandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base.name())?;
        if self.array {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

/// One explicit instruction argument or the accumulator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operand {
    name: String,
    kind: OperandKind,
    direction: Direction,
    ty: OperandType,
    width: u32,
    offset: u32,
}

impl Operand {
    /// Operand name with index digits removed (`v`, `acc`, `imm`, `method_id`, ...).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operand kind.
    #[must_use]
    pub fn kind(&self) -> OperandKind {
        self.kind
    }

    /// Operand direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Operand type.
    #[must_use]
    pub fn ty(&self) -> OperandType {
        self.ty
    }

    /// Encoded width in bits (`0` for the accumulator).
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Encoded bit offset (`0` for the accumulator).
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Register operand.
    #[must_use]
    pub fn is_reg(&self) -> bool {
        self.kind == OperandKind::Reg
    }

    /// Accumulator operand.
    #[must_use]
    pub fn is_acc(&self) -> bool {
        self.kind == OperandKind::Acc
    }

    /// Immediate operand.
    #[must_use]
    pub fn is_imm(&self) -> bool {
        self.kind == OperandKind::Imm
    }

    /// Id-reference operand.
    #[must_use]
    pub fn is_id(&self) -> bool {
        self.kind.is_id()
    }

    /// Written by the instruction.
    #[must_use]
    pub fn is_dst(&self) -> bool {
        self.direction == Direction::Out
    }

    /// Read by the instruction.
    #[must_use]
    pub fn is_src(&self) -> bool {
        self.direction == Direction::In
    }

    /// Size in bits of the operand type.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.ty.base.bits()
    }
}

/// Parses an accumulator signature into zero, one or two accumulator operands.
pub(crate) fn parse_acc_signature(mnemonic: &str, sig: &str) -> Result<Vec<Operand>, IsaError> {
    let bad = || IsaError::BadSignature {
        mnemonic: mnemonic.to_string(),
        signature: sig.to_string(),
    };
    let acc = |direction: Direction, ty: &str| -> Result<Operand, IsaError> {
        Ok(Operand {
            name: OperandKind::Acc.name().to_string(),
            kind: OperandKind::Acc,
            direction,
            ty: parse_type(mnemonic, ty)?,
            width: 0,
            offset: 0,
        })
    };

    let sig = sig.trim();
    if sig == "none" {
        return Ok(Vec::new());
    }
    let (access, ty) = sig.split_once(':').ok_or_else(bad)?;
    let access = Access::parse(access).ok_or_else(bad)?;
    if let Some((src, dst)) = ty.split_once("->") {
        if access != Access::InOut {
            return Err(bad());
        }
        return Ok(vec![acc(Direction::Out, dst)?, acc(Direction::In, src)?]);
    }
    access
        .directions()
        .iter()
        .map(|&direction| acc(direction, ty))
        .collect()
}

/// Parses the explicit operands of an instruction signature, resolving their placement in
/// `format`.
pub(crate) fn parse_operands(
    mnemonic: &str,
    sig: &str,
    format: &Format,
) -> Result<Vec<Operand>, IsaError> {
    let Some((_, list)) = sig.trim().split_once(' ') else {
        return Ok(Vec::new());
    };

    let mut out: Vec<Operand> = Vec::new();
    for part in list.split(',') {
        let part = part.trim();
        let bad = || IsaError::BadSignature {
            mnemonic: mnemonic.to_string(),
            signature: part.to_string(),
        };
        let pieces: Vec<&str> = part.split(':').collect();
        let (raw_name, access, ty) = match pieces.as_slice() {
            [name] => (*name, Access::In, "none"),
            [name, ty] => (*name, Access::In, *ty),
            [name, access, ty] => (*name, Access::parse(access).ok_or_else(bad)?, *ty),
            _ => return Err(bad()),
        };
        if raw_name.is_empty() {
            return Err(bad());
        }

        let name: String = raw_name.chars().filter(|c| !c.is_ascii_digit()).collect();
        let kind = OperandKind::from_name(&name).ok_or_else(|| IsaError::UnknownOperandKind {
            mnemonic: mnemonic.to_string(),
            operand: raw_name.to_string(),
        })?;
        let ty = parse_type(mnemonic, ty)?;
        let field = format.field(raw_name)?;

        for &direction in access.directions() {
            out.push(Operand {
                name: name.clone(),
                kind,
                direction,
                ty,
                width: field.width(),
                offset: field.offset(),
            });
        }
    }
    Ok(out)
}

fn parse_type(mnemonic: &str, ty: &str) -> Result<OperandType, IsaError> {
    OperandType::parse(ty).ok_or_else(|| IsaError::UnknownValueType {
        mnemonic: mnemonic.to_string(),
        ty: ty.to_string(),
    })
}
