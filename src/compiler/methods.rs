// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Method and reserved-name analysis.
//!
//! Validates call-site arity against declared parameter counts, checks
//! that value-returning methods return on every control path, and applies
//! the reserved-name conformance rules from the predefined-name table.

use crate::compiler::context::CompilationContext;
use crate::core::ast::{AstArena, NodeId, ParseOp};
use crate::core::btype::BType;
use crate::core::diagnostics::{AslError, AslErrorKind};
use crate::core::namespace::NameSeg;
use crate::core::predefined::{is_unknown_reserved, predefined_entry, PackageExpect};
use crate::core::walk::{walk_down, WalkAction};

pub fn analyze_methods(
    arena: &mut AstArena,
    root: NodeId,
    ctx: &mut CompilationContext,
) -> Result<(), AslError> {
    walk_down(
        arena,
        root,
        |arena, id, _depth, ctx: &mut CompilationContext| {
            match arena.node(id).op {
                ParseOp::Method => analyze_method(arena, id, ctx),
                ParseOp::MethodCall => check_call_arity(arena, id, ctx),
                ParseOp::Name => check_reserved_name_data(arena, id, ctx),
                _ => {}
            }
            Ok(WalkAction::Continue)
        },
        ctx,
    )
}

fn decl_seg(arena: &AstArena, id: NodeId, ctx: &CompilationContext) -> Option<NameSeg> {
    arena
        .node(id)
        .ns_node
        .map(|ns| ctx.namespace.node(ns).seg)
}

fn check_call_arity(arena: &AstArena, id: NodeId, ctx: &mut CompilationContext) {
    let Some(ns) = arena.node(id).ns_node else {
        // Unresolved calls were recorded as externals with this arity.
        return;
    };
    let Some(declared) = ctx.namespace.node(ns).arg_count else {
        return;
    };
    let actual = arena.child_count(id);
    if actual != declared as usize {
        let loc = arena.node(id).loc;
        let path = ctx.namespace.full_path(ns);
        ctx.error(
            AslErrorKind::Method,
            &format!("Call passes {actual} arguments, method declares {declared}"),
            Some(&path),
            loc,
        );
    }
}

fn analyze_method(arena: &AstArena, id: NodeId, ctx: &mut CompilationContext) {
    let body = arena.children(id);
    let mut value_returns = Vec::new();
    collect_value_returns(arena, &body, &mut value_returns);
    let returns_value = !value_returns.is_empty();

    if returns_value {
        let mut failures = Vec::new();
        check_return_complete(arena, id, &body, &mut failures);
        let method_name = arena.node(id).name.clone().unwrap_or_default();
        for failure in failures {
            let loc = arena.node(failure).loc;
            ctx.error(
                AslErrorKind::Method,
                "Method does not return a value on all control paths",
                Some(&method_name),
                loc,
            );
        }
    }

    check_reserved_method(arena, id, &value_returns, returns_value, ctx);
}

/// Collect Return statements that carry a value, without descending into
/// nested scopes that cannot belong to this method body.
fn collect_value_returns(arena: &AstArena, stmts: &[NodeId], out: &mut Vec<NodeId>) {
    for &stmt in stmts {
        let node = arena.node(stmt);
        if node.op == ParseOp::Return && arena.child_count(stmt) > 0 {
            out.push(stmt);
        }
        if !node.op.opens_scope() {
            collect_value_returns(arena, &arena.children(stmt), out);
        }
    }
}

/// A statement list is return-complete when its last statement is
/// unconditionally a Return, or a terminal If/Else whose branches are all
/// return-complete, recursively. Each failing branch is recorded once.
fn check_return_complete(
    arena: &AstArena,
    owner: NodeId,
    stmts: &[NodeId],
    failures: &mut Vec<NodeId>,
) {
    let Some(&last) = stmts.last() else {
        failures.push(owner);
        return;
    };
    match arena.node(last).op {
        ParseOp::Return => {
            if arena.child_count(last) == 0 {
                failures.push(last);
            }
        }
        ParseOp::Else => {
            let prev = stmts.len().checked_sub(2).map(|i| stmts[i]);
            match prev {
                Some(if_node) if arena.node(if_node).op == ParseOp::If => {
                    // If children: predicate then branch body.
                    let if_branch: Vec<NodeId> =
                        arena.children(if_node).into_iter().skip(1).collect();
                    check_return_complete(arena, if_node, &if_branch, failures);
                    let else_branch = arena.children(last);
                    check_return_complete(arena, last, &else_branch, failures);
                }
                _ => failures.push(last),
            }
        }
        _ => failures.push(owner),
    }
}

fn check_reserved_method(
    arena: &AstArena,
    id: NodeId,
    value_returns: &[NodeId],
    returns_value: bool,
    ctx: &mut CompilationContext,
) {
    let Some(seg) = decl_seg(arena, id, ctx) else {
        return;
    };
    let loc = arena.node(id).loc;
    if is_unknown_reserved(&seg) {
        ctx.warning(
            AslErrorKind::Method,
            "Unknown reserved name",
            Some(seg.as_str()),
            loc,
        );
        return;
    }
    let Some(entry) = predefined_entry(&seg) else {
        return;
    };

    let declared = arena
        .node(id)
        .value
        .as_integer()
        .map(|flags| (flags & 0x07) as u8)
        .unwrap_or(0);
    if declared != entry.arg_count {
        ctx.error(
            AslErrorKind::Method,
            &format!(
                "Reserved method has {declared} arguments, should have {}",
                entry.arg_count
            ),
            Some(seg.as_str()),
            loc,
        );
    }

    if entry.return_btype == BType::NONE {
        if returns_value {
            ctx.warning(
                AslErrorKind::Method,
                "Reserved method should not return a value",
                Some(seg.as_str()),
                loc,
            );
        }
        return;
    }
    if !returns_value {
        ctx.error(
            AslErrorKind::Method,
            "Reserved method must return a value",
            Some(seg.as_str()),
            loc,
        );
        return;
    }
    for &ret in value_returns {
        let Some(value) = arena.child(ret, 0) else {
            continue;
        };
        let found = arena.node(value).btype;
        if !found.is_empty() && found.intersect(entry.return_btype).is_empty() {
            let loc = arena.node(value).loc;
            ctx.error(
                AslErrorKind::Method,
                &format!(
                    "Reserved method return type mismatch, expected [{}]",
                    entry.return_btype
                ),
                Some(&format!("found [{found}]")),
                loc,
            );
        }
        if let Some(expect) = entry.package {
            if arena.node(value).op == ParseOp::Package {
                check_package_shape(arena, value, seg, expect, ctx);
            }
        }
    }
}

/// `Name(_XXX, Package {...})` for a reserved name gets the same shape
/// checks as a returned package.
fn check_reserved_name_data(arena: &AstArena, id: NodeId, ctx: &mut CompilationContext) {
    let Some(seg) = decl_seg(arena, id, ctx) else {
        return;
    };
    let loc = arena.node(id).loc;
    if is_unknown_reserved(&seg) {
        ctx.warning(
            AslErrorKind::Method,
            "Unknown reserved name",
            Some(seg.as_str()),
            loc,
        );
        return;
    }
    let Some(entry) = predefined_entry(&seg) else {
        return;
    };
    let Some(data) = arena.child(id, 0) else {
        return;
    };
    let found = arena.node(data).btype;
    if entry.return_btype != BType::NONE
        && !found.is_empty()
        && found.intersect(entry.return_btype).is_empty()
    {
        ctx.error(
            AslErrorKind::Method,
            &format!(
                "Reserved name value type mismatch, expected [{}]",
                entry.return_btype
            ),
            Some(seg.as_str()),
            loc,
        );
    }
    if let Some(expect) = entry.package {
        if arena.node(data).op == ParseOp::Package {
            check_package_shape(arena, data, seg, expect, ctx);
        }
    }
}

fn check_package_shape(
    arena: &AstArena,
    pkg: NodeId,
    seg: NameSeg,
    expect: PackageExpect,
    ctx: &mut CompilationContext,
) {
    let elements = arena.children(pkg);
    match expect {
        PackageExpect::Fixed(types) => {
            if elements.len() != types.len() {
                let loc = arena.node(pkg).loc;
                ctx.error(
                    AslErrorKind::Method,
                    &format!(
                        "Reserved package has {} elements, should have {}",
                        elements.len(),
                        types.len()
                    ),
                    Some(seg.as_str()),
                    loc,
                );
            }
            for (&element, expected) in elements.iter().zip(types.iter()) {
                check_package_element(arena, element, seg, *expected, ctx);
            }
        }
        PackageExpect::Uniform(expected) => {
            for &element in &elements {
                check_package_element(arena, element, seg, expected, ctx);
            }
        }
    }
}

fn check_package_element(
    arena: &AstArena,
    element: NodeId,
    seg: NameSeg,
    expected: BType,
    ctx: &mut CompilationContext,
) {
    let found = arena.node(element).btype;
    if !found.is_empty() && found.intersect(expected).is_empty() {
        let loc = arena.node(element).loc;
        ctx.error(
            AslErrorKind::Method,
            &format!("Reserved package element type mismatch, expected [{expected}]"),
            Some(seg.as_str()),
            loc,
        );
    }
}
