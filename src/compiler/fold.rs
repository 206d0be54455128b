// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Constant folding and pre-codegen tree rewrites.
//!
//! Bottom-up walk that replaces integer operators over literal operands
//! with a single literal of the computed value at the table's integer
//! width, canonicalizes 0, 1 and all-ones to their single-byte constant
//! ops, and synthesizes the declared size of buffers that omit one. The
//! pass is idempotent: a second run over a folded tree changes nothing.

use crate::compiler::context::CompilationContext;
use crate::core::ast::{AstArena, NodeId, NodeValue, ParseOp, SourceLoc};
use crate::core::diagnostics::{AslError, AslErrorKind};
use crate::core::walk::walk_up;

pub fn fold_constants(
    arena: &mut AstArena,
    root: NodeId,
    ctx: &mut CompilationContext,
) -> Result<(), AslError> {
    walk_up(
        arena,
        root,
        |arena, id, _depth, ctx: &mut CompilationContext| {
            fold_node(arena, id, ctx);
            Ok(())
        },
        ctx,
    )
}

fn fold_node(arena: &mut AstArena, id: NodeId, ctx: &mut CompilationContext) {
    let op = arena.node(id).op;
    match op {
        ParseOp::Integer => canonicalize_literal(arena, id, ctx),
        ParseOp::Buffer => ensure_buffer_size_child(arena, id),
        _ if foldable_operator(op) => try_fold_operator(arena, id, ctx),
        _ => {}
    }
}

fn foldable_operator(op: ParseOp) -> bool {
    matches!(
        op,
        ParseOp::Add
            | ParseOp::Subtract
            | ParseOp::Multiply
            | ParseOp::Divide
            | ParseOp::Mod
            | ParseOp::ShiftLeft
            | ParseOp::ShiftRight
            | ParseOp::BitAnd
            | ParseOp::BitOr
            | ParseOp::BitXor
            | ParseOp::BitNot
            | ParseOp::LAnd
            | ParseOp::LOr
            | ParseOp::LNot
            | ParseOp::LEqual
            | ParseOp::LGreater
            | ParseOp::LLess
    )
}

fn try_fold_operator(arena: &mut AstArena, id: NodeId, ctx: &mut CompilationContext) {
    let children = arena.children(id);
    let mut operands = Vec::with_capacity(children.len());
    for &child in &children {
        match arena.node(child).integer_value() {
            Some(v) => operands.push(v),
            None => return,
        }
    }
    let op = arena.node(id).op;
    let mask = ctx.integer_width_mask();
    let loc = arena.node(id).loc;
    let result = match operands.len() {
        1 => apply_unary(op, operands[0], mask),
        2 => apply_binary(op, operands[0], operands[1], mask),
        _ => return,
    };
    match result {
        Ok(value) => {
            truncation_remark(value, mask, loc, ctx);
            arena.replace_with_integer(id, value & mask, mask);
        }
        Err(msg) => {
            ctx.error(AslErrorKind::Type, &msg, None, loc);
        }
    }
}

/// Evaluate a unary integer operator at the given width.
pub fn apply_unary(op: ParseOp, a: u64, mask: u64) -> Result<u64, String> {
    let a = a & mask;
    let value = match op {
        ParseOp::BitNot => !a,
        ParseOp::LNot => bool_value(a == 0, mask),
        _ => return Err(format!("Operator {op:?} is not unary")),
    };
    Ok(value & mask)
}

/// Evaluate a binary integer operator at the given width.
pub fn apply_binary(op: ParseOp, a: u64, b: u64, mask: u64) -> Result<u64, String> {
    let (a, b) = (a & mask, b & mask);
    let value = match op {
        ParseOp::Add => a.wrapping_add(b),
        ParseOp::Subtract => a.wrapping_sub(b),
        ParseOp::Multiply => a.wrapping_mul(b),
        ParseOp::Divide => {
            if b == 0 {
                return Err("Divide by zero in constant expression".to_string());
            }
            a / b
        }
        ParseOp::Mod => {
            if b == 0 {
                return Err("Divide by zero in constant expression".to_string());
            }
            a % b
        }
        ParseOp::ShiftLeft => {
            if b >= 64 {
                0
            } else {
                a.wrapping_shl(b as u32)
            }
        }
        ParseOp::ShiftRight => {
            if b >= 64 {
                0
            } else {
                a.wrapping_shr(b as u32)
            }
        }
        ParseOp::BitAnd => a & b,
        ParseOp::BitOr => a | b,
        ParseOp::BitXor => a ^ b,
        ParseOp::LAnd => bool_value(a != 0 && b != 0, mask),
        ParseOp::LOr => bool_value(a != 0 || b != 0, mask),
        ParseOp::LEqual => bool_value(a == b, mask),
        ParseOp::LGreater => bool_value(a > b, mask),
        ParseOp::LLess => bool_value(a < b, mask),
        _ => return Err(format!("Operator {op:?} is not binary")),
    };
    Ok(value & mask)
}

/// AML logical results are Ones or Zero at the table's integer width.
fn bool_value(cond: bool, mask: u64) -> u64 {
    if cond {
        mask
    } else {
        0
    }
}

/// A literal wider than the table's integer width loses its upper bits.
fn truncation_remark(value: u64, mask: u64, loc: SourceLoc, ctx: &mut CompilationContext) {
    if value & !mask != 0 {
        ctx.remark(
            AslErrorKind::Type,
            "Integer constant truncated to 32 bits for this table revision",
            None,
            loc,
        );
    }
}

fn canonicalize_literal(arena: &mut AstArena, id: NodeId, ctx: &mut CompilationContext) {
    let Some(value) = arena.node(id).value.as_integer() else {
        return;
    };
    let mask = ctx.integer_width_mask();
    let loc = arena.node(id).loc;
    truncation_remark(value, mask, loc, ctx);
    let masked = value & mask;
    if masked == 0 || masked == 1 || masked == mask {
        arena.replace_with_integer(id, masked, mask);
    } else if masked != value {
        arena.node_mut(id).value = NodeValue::Integer(masked);
    }
}

/// Buffers may omit their declared size; the initializer length supplies
/// it. Codegen relies on the size child being present.
pub(crate) fn ensure_buffer_size_child(arena: &mut AstArena, id: NodeId) {
    let node = arena.node(id);
    let has_size_child = node.first_child.is_some();
    if has_size_child {
        return;
    }
    let data_len = match &node.value {
        NodeValue::Buffer(bytes) => bytes.len() as u64,
        _ => 0,
    };
    let loc = node.loc;
    let size = arena.add_node(ParseOp::Integer, loc);
    {
        let size_node = arena.node_mut(size);
        size_node.value = NodeValue::Integer(data_len);
        size_node.synthesized = true;
        size_node.btype = crate::core::btype::BType::INTEGER;
    }
    arena.link_child(id, size);
    // Keep the synthesized literal canonical without a second pass.
    if data_len <= 1 {
        arena.replace_with_integer(size, data_len, u64::MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_ops_wrap_at_width() {
        let mask32 = u32::MAX as u64;
        assert_eq!(apply_binary(ParseOp::Add, mask32, 1, mask32), Ok(0));
        assert_eq!(
            apply_binary(ParseOp::Add, mask32, 1, u64::MAX),
            Ok(0x1_0000_0000)
        );
        assert_eq!(apply_binary(ParseOp::ShiftLeft, 1, 80, u64::MAX), Ok(0));
    }

    #[test]
    fn logical_results_are_ones_or_zero() {
        assert_eq!(
            apply_binary(ParseOp::LEqual, 5, 5, u64::MAX),
            Ok(u64::MAX)
        );
        assert_eq!(apply_binary(ParseOp::LEqual, 5, 6, u64::MAX), Ok(0));
        assert_eq!(apply_unary(ParseOp::LNot, 0, u64::MAX), Ok(u64::MAX));
    }

    #[test]
    fn divide_by_zero_is_an_error() {
        assert!(apply_binary(ParseOp::Divide, 1, 0, u64::MAX).is_err());
        assert!(apply_binary(ParseOp::Mod, 1, 0, u64::MAX).is_err());
    }
}
