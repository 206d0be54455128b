// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Cross-reference resolution pass.
//!
//! Second full walk: every name-reference operand is resolved against the
//! namespace built by the load pass. Resolution tries the absolute form,
//! then explicit parent prefixes, then the search-to-root rule; the first
//! match wins and is cached on the parse node for later passes. A miss is
//! recorded as an external reference, deduplicated by normalized path and
//! inferred object type.

use crate::compiler::context::CompilationContext;
use crate::compiler::scopes::ScopeStack;
use crate::core::ast::{AstArena, NodeId, ParseOp, SourceLoc};
use crate::core::diagnostics::{AslError, AslErrorKind, Severity};
use crate::core::namespace::{NamePath, ObjectType};
use crate::core::walk::{walk_tree, WalkAction, WalkMode};

struct XrefPass<'a> {
    ctx: &'a mut CompilationContext,
    scopes: ScopeStack,
}

pub fn resolve_references(
    arena: &mut AstArena,
    root: NodeId,
    ctx: &mut CompilationContext,
) -> Result<(), AslError> {
    let ns_root = ctx.namespace.root();
    let mut pass = XrefPass {
        ctx,
        scopes: ScopeStack::new(ns_root),
    };
    walk_tree(arena, root, WalkMode::Both, xref_enter, xref_exit, &mut pass)
}

fn xref_enter(
    arena: &mut AstArena,
    id: NodeId,
    _depth: u32,
    pass: &mut XrefPass,
) -> Result<WalkAction, AslError> {
    let op = arena.node(id).op;
    if op.opens_scope() {
        // The load pass linked scoping nodes to their namespace nodes;
        // unresolved ones degrade to the enclosing scope.
        match arena.node(id).ns_node {
            Some(ns) => pass.scopes.push(ns),
            None => pass.scopes.push_current(),
        }
        return Ok(WalkAction::Continue);
    }

    match op {
        ParseOp::NamePath => resolve_reference(arena, id, None, pass),
        ParseOp::MethodCall => {
            let arity = arena.child_count(id) as u8;
            resolve_reference(arena, id, Some(arity), pass);
        }
        _ => {}
    }
    Ok(WalkAction::Continue)
}

fn xref_exit(
    arena: &mut AstArena,
    id: NodeId,
    _depth: u32,
    pass: &mut XrefPass,
) -> Result<(), AslError> {
    if arena.node(id).op.opens_scope() {
        pass.scopes.pop();
    }
    Ok(())
}

fn resolve_reference(
    arena: &mut AstArena,
    id: NodeId,
    call_arity: Option<u8>,
    pass: &mut XrefPass,
) {
    let loc = arena.node(id).loc;
    let Some(name) = arena.node(id).name.clone() else {
        pass.ctx.error(
            AslErrorKind::Reference,
            "Reference is missing a namestring",
            None,
            loc,
        );
        return;
    };
    let path = match NamePath::parse(&name) {
        Ok(path) => path,
        Err(err) => {
            pass.ctx.diag(Severity::Error, err, loc);
            return;
        }
    };

    let current = pass.scopes.current();
    match pass.ctx.namespace.resolve(current, &path) {
        Some(found) => {
            arena.node_mut(id).ns_node = Some(found);
            let node = pass.ctx.namespace.node_mut(found);
            node.referenced = true;
            let object_type = node.object_type;
            if call_arity.is_some() && object_type != ObjectType::Method {
                pass.ctx.error(
                    AslErrorKind::Reference,
                    "Called object is not a method",
                    Some(&path.normalized()),
                    loc,
                );
            }
        }
        None => record_external(&path, call_arity, loc, pass),
    }
}

fn record_external(path: &NamePath, call_arity: Option<u8>, loc: SourceLoc, pass: &mut XrefPass) {
    let (object_type, arg_count) = match call_arity {
        Some(arity) => (ObjectType::Method, Some(arity.min(7))),
        None => (ObjectType::Unknown, None),
    };
    pass.ctx
        .add_external(path.normalized(), object_type, arg_count, loc);
}
