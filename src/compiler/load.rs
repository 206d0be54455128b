// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Namespace construction pass.
//!
//! First full walk over the parse tree: every name-declaring op gets a
//! namespace node in the enclosing scope, linked bidirectionally with the
//! parse node. Scoping constructs push on enter and pop on exit, which is
//! why this pass needs the walk's descending/ascending pairing. Duplicate
//! declarations are an error; the first definition wins and compilation
//! continues.

use crate::compiler::context::CompilationContext;
use crate::compiler::scopes::ScopeStack;
use crate::core::ast::{AstArena, NodeId, ParseOp};
use crate::core::diagnostics::{AslError, AslErrorKind, Severity};
use crate::core::namespace::{NamePath, NsId, ObjectType};
use crate::core::walk::{walk_tree, WalkAction, WalkMode};

struct LoadPass<'a> {
    ctx: &'a mut CompilationContext,
    scopes: ScopeStack,
}

pub fn build_namespace(
    arena: &mut AstArena,
    root: NodeId,
    ctx: &mut CompilationContext,
) -> Result<(), AslError> {
    let ns_root = ctx.namespace.root();
    let mut pass = LoadPass {
        ctx,
        scopes: ScopeStack::new(ns_root),
    };
    walk_tree(arena, root, WalkMode::Both, load_enter, load_exit, &mut pass)
}

fn load_enter(
    arena: &mut AstArena,
    id: NodeId,
    _depth: u32,
    pass: &mut LoadPass,
) -> Result<WalkAction, AslError> {
    let op = arena.node(id).op;
    match op {
        ParseOp::DefinitionBlock => {
            let root = pass.ctx.namespace.root();
            arena.node_mut(id).ns_node = Some(root);
            pass.scopes.push(root);
        }
        ParseOp::Scope => {
            // Scope() opens an existing scope rather than declaring one.
            match parse_decl_path(arena, id, pass) {
                Some(path) => {
                    let current = pass.scopes.current();
                    match pass.ctx.namespace.resolve(current, &path) {
                        Some(target) => {
                            arena.node_mut(id).ns_node = Some(target);
                            pass.scopes.push(target);
                        }
                        None => {
                            let loc = arena.node(id).loc;
                            pass.ctx.error(
                                AslErrorKind::Namespace,
                                "Scope target not found",
                                Some(&path.normalized()),
                                loc,
                            );
                            pass.scopes.push_current();
                        }
                    }
                }
                None => pass.scopes.push_current(),
            }
        }
        ParseOp::Device => {
            let ns = declare(arena, id, ObjectType::Device, pass);
            push_declared(ns, pass);
        }
        ParseOp::PowerResource => {
            let ns = declare(arena, id, ObjectType::PowerResource, pass);
            push_declared(ns, pass);
        }
        ParseOp::Processor => {
            let ns = declare(arena, id, ObjectType::Processor, pass);
            push_declared(ns, pass);
        }
        ParseOp::ThermalZone => {
            let ns = declare(arena, id, ObjectType::ThermalZone, pass);
            push_declared(ns, pass);
        }
        ParseOp::Method => {
            let arg_count = method_arg_count(arena, id);
            let ns = declare(arena, id, ObjectType::Method, pass);
            if let Some(ns_id) = ns {
                let node = pass.ctx.namespace.node_mut(ns_id);
                if node.arg_count.is_none() {
                    node.arg_count = Some(arg_count);
                }
            }
            push_declared(ns, pass);
        }
        ParseOp::Name => {
            let data_type = name_data_type(arena, id);
            declare(arena, id, data_type, pass);
        }
        ParseOp::Mutex => {
            declare(arena, id, ObjectType::Mutex, pass);
        }
        ParseOp::External => {
            let object_type = arena
                .child(id, 0)
                .and_then(|c| arena.node(c).integer_value())
                .map(object_type_from_code)
                .unwrap_or(ObjectType::Unknown);
            let arg_count = arena
                .child(id, 1)
                .and_then(|c| arena.node(c).integer_value())
                .map(|v| v.min(7) as u8);
            if let Some(ns_id) = declare(arena, id, object_type, pass) {
                let node = pass.ctx.namespace.node_mut(ns_id);
                if node.decl == Some(id) {
                    node.external = true;
                    node.arg_count = arg_count;
                }
            }
        }
        _ => {}
    }
    Ok(WalkAction::Continue)
}

fn load_exit(
    arena: &mut AstArena,
    id: NodeId,
    _depth: u32,
    pass: &mut LoadPass,
) -> Result<(), AslError> {
    if arena.node(id).op.opens_scope() {
        pass.scopes.pop();
    }
    Ok(())
}

fn push_declared(ns: Option<NsId>, pass: &mut LoadPass) {
    match ns {
        Some(id) => pass.scopes.push(id),
        None => pass.scopes.push_current(),
    }
}

fn parse_decl_path(arena: &AstArena, id: NodeId, pass: &mut LoadPass) -> Option<NamePath> {
    let node = arena.node(id);
    let loc = node.loc;
    let Some(name) = node.name.clone() else {
        pass.ctx.error(
            AslErrorKind::Syntax,
            "Declaration is missing a name",
            None,
            loc,
        );
        return None;
    };
    match NamePath::parse(&name) {
        Ok(path) if !path.segs.is_empty() => Some(path),
        Ok(_) => {
            pass.ctx.error(
                AslErrorKind::Namespace,
                "Declaration name has no segments",
                Some(&name),
                loc,
            );
            None
        }
        Err(err) => {
            pass.ctx.diag(Severity::Error, err, loc);
            None
        }
    }
}

/// Create the namespace node for a declaration and link it to the parse
/// node. On a name conflict the first definition is kept and an error is
/// reported against the duplicate.
fn declare(
    arena: &mut AstArena,
    id: NodeId,
    object_type: ObjectType,
    pass: &mut LoadPass,
) -> Option<NsId> {
    let path = parse_decl_path(arena, id, pass)?;
    let loc = arena.node(id).loc;
    let current = pass.scopes.current();
    let Some((scope, seg)) = pass.ctx.namespace.resolve_parent_scope(current, &path) else {
        pass.ctx.error(
            AslErrorKind::Namespace,
            "Parent scope of declaration not found",
            Some(&path.normalized()),
            loc,
        );
        return None;
    };

    if let Some(existing) = pass.ctx.namespace.find_child(scope, seg) {
        let existing_node = pass.ctx.namespace.node(existing);
        if existing_node.decl == Some(id) {
            // Same parse node on a repeated walk; nothing to do.
            arena.node_mut(id).ns_node = Some(existing);
            return Some(existing);
        }
        if existing_node.external {
            // A prior External declaration is completed by the real one.
            let node = pass.ctx.namespace.node_mut(existing);
            node.external = false;
            node.object_type = object_type;
            node.decl = Some(id);
            arena.node_mut(id).ns_node = Some(existing);
            return Some(existing);
        }
        let first_line = existing_node
            .decl
            .map(|d| arena.node(d).loc.line)
            .unwrap_or(0);
        let note = if first_line > 0 {
            Some(format!("first defined at line {first_line}"))
        } else {
            Some("conflicts with a predefined name".to_string())
        };
        pass.ctx.diag_with_note(
            Severity::Error,
            AslError::new(
                AslErrorKind::Namespace,
                "Name already exists in scope",
                Some(seg.as_str()),
            ),
            loc,
            note,
        );
        arena.node_mut(id).ns_node = Some(existing);
        return Some(existing);
    }

    let ns_id = pass.ctx.namespace.insert_child(scope, seg, object_type, Some(id));
    arena.node_mut(id).ns_node = Some(ns_id);
    Some(ns_id)
}

fn method_arg_count(arena: &AstArena, id: NodeId) -> u8 {
    // The node value carries the AML method flags byte; the low three bits
    // are the parameter count.
    arena
        .node(id)
        .value
        .as_integer()
        .map(|flags| (flags & 0x07) as u8)
        .unwrap_or(0)
}

fn name_data_type(arena: &AstArena, id: NodeId) -> ObjectType {
    match arena.child(id, 0).map(|c| arena.node(c).op) {
        Some(op) if op.is_integer_literal() => ObjectType::Integer,
        Some(ParseOp::StringLiteral) => ObjectType::String,
        Some(ParseOp::Buffer) | Some(ParseOp::ResourceTemplate) => ObjectType::Buffer,
        Some(ParseOp::Package) => ObjectType::Package,
        _ => ObjectType::Unknown,
    }
}

fn object_type_from_code(code: u64) -> ObjectType {
    match code {
        1 => ObjectType::Integer,
        2 => ObjectType::String,
        3 => ObjectType::Buffer,
        4 => ObjectType::Package,
        6 => ObjectType::Device,
        8 => ObjectType::Method,
        9 => ObjectType::Mutex,
        11 => ObjectType::PowerResource,
        12 => ObjectType::Processor,
        13 => ObjectType::ThermalZone,
        _ => ObjectType::Unknown,
    }
}
