// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Operand type analysis.
//!
//! Bottom-up walk assigning every expression node a bit-type: the set of
//! runtime object types it may evaluate to. Literals and resolved
//! references seed the lattice; operators check each operand by
//! intersection against the expected set and report a type mismatch when
//! the intersection is empty, continuing with the expected set so later
//! passes still run.

use crate::compiler::context::CompilationContext;
use crate::core::ast::{AstArena, NodeId, ParseOp};
use crate::core::btype::BType;
use crate::core::diagnostics::{AslError, AslErrorKind};
use crate::core::opcodes::opcode_entry;
use crate::core::walk::walk_up;

pub fn propagate_types(
    arena: &mut AstArena,
    root: NodeId,
    ctx: &mut CompilationContext,
) -> Result<(), AslError> {
    walk_up(
        arena,
        root,
        |arena, id, _depth, ctx: &mut CompilationContext| {
            assign_btype(arena, id, ctx);
            Ok(())
        },
        ctx,
    )
}

/// Expected operand set for child `index` of `op`, or `None` when the
/// operand is not type-checked (targets, statement bodies, name args).
fn expected_operand(op: ParseOp, index: usize) -> Option<BType> {
    match op {
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
        | ParseOp::LAnd
        | ParseOp::LOr
        | ParseOp::LEqual
        | ParseOp::LGreater
        | ParseOp::LLess => (index < 2).then_some(BType::COMPUTE_DATA),
        ParseOp::BitNot | ParseOp::LNot => (index == 0).then_some(BType::COMPUTE_DATA),
        // Predicates convert to Integer; statement bodies are unchecked.
        ParseOp::If | ParseOp::While => (index == 0).then_some(BType::COMPUTE_DATA),
        _ => None,
    }
}

fn assign_btype(arena: &mut AstArena, id: NodeId, ctx: &mut CompilationContext) {
    let op = arena.node(id).op;

    // Operand checks against children already typed by the up-walk.
    let children = arena.children(id);
    for (index, child) in children.iter().enumerate() {
        let Some(expected) = expected_operand(op, index) else {
            continue;
        };
        let child_node = arena.node(*child);
        let found = child_node.btype;
        if found.is_empty() {
            // Untyped operand (declaration or statement); nothing to check.
            continue;
        }
        if found.intersect(expected).is_empty() {
            let op_name = opcode_entry(op).map(|e| e.name).unwrap_or("operator");
            let loc = child_node.loc;
            ctx.error(
                AslErrorKind::Type,
                &format!("Invalid operand type for {op_name}, expected [{expected}]"),
                Some(&format!("found [{found}]")),
                loc,
            );
            // Best effort: assume the operand had a legal type.
            arena.node_mut(*child).btype = expected;
        }
    }

    let btype = match op {
        ParseOp::Zero | ParseOp::One | ParseOp::Ones | ParseOp::Integer => BType::INTEGER,
        ParseOp::StringLiteral => BType::STRING,
        ParseOp::Buffer | ParseOp::ResourceTemplate => BType::BUFFER,
        ParseOp::Package => BType::PACKAGE,
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
        | ParseOp::LLess => BType::INTEGER,
        ParseOp::Store | ParseOp::Return => children
            .first()
            .map(|c| arena.node(*c).btype)
            .unwrap_or(BType::NONE),
        ParseOp::NamePath => match arena.node(id).ns_node {
            Some(ns) => ctx.namespace.node(ns).object_type.btype(),
            // Unresolved references are externals of unknown shape.
            None => BType::ALL,
        },
        ParseOp::MethodCall => BType::ALL,
        ParseOp::Arg(_) | ParseOp::Local(_) => BType::ALL,
        _ => BType::NONE,
    };
    arena.node_mut(id).btype = btype;
}
