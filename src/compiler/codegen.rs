// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! AML code generation.
//!
//! Two phases: an iterated bottom-up length pass that sizes every node and
//! its package-length field until no width changes, then a single emission
//! pass that writes the table header and the byte stream. Package-length
//! widths only ever grow between iterations, so the fixpoint is reached in
//! at most four steps; the iteration cap turns a logic error into a
//! diagnostic instead of a hang.

use crate::compiler::context::CompilationContext;
use crate::core::ast::{AstArena, NodeId, NodeValue, ParseOp};
use crate::core::diagnostics::{AslError, AslErrorKind};
use crate::core::namespace::NamePath;
use crate::core::opcodes::{
    encode_name_string, encode_pkg_length, opcode_entry, pkg_length_width,
};
use crate::core::walk::walk_up;

const TABLE_HEADER_LEN: usize = 36;
const MAX_LENGTH_ITERATIONS: u32 = 5;

const OEM_ID: &[u8; 6] = b"AFORGE";
const OEM_TABLE_ID: &[u8; 8] = b"AMLMODUL";
const OEM_REVISION: u32 = 1;
const CREATOR_ID: &[u8; 4] = b"AFRG";
const CREATOR_REVISION: u32 = 0x0004_0000;

pub fn generate_aml(
    arena: &mut AstArena,
    root: NodeId,
    ctx: &mut CompilationContext,
) -> Result<Vec<u8>, AslError> {
    let mut iterations = 0;
    loop {
        let mut pass = SizePass {
            ctx: &mut *ctx,
            changed: false,
            report: iterations == 0,
        };
        walk_up(arena, root, size_node, &mut pass)?;
        if !pass.changed {
            break;
        }
        iterations += 1;
        if iterations >= MAX_LENGTH_ITERATIONS {
            return Err(AslError::new(
                AslErrorKind::Codegen,
                "Package length computation did not converge",
                None,
            ));
        }
    }

    let body_len = arena.node(root).subtree_length as usize;
    let mut out = Vec::with_capacity(TABLE_HEADER_LEN + body_len);
    emit_table_header(arena, root, ctx, &mut out);
    emit_node(arena, root, &mut out);

    debug_assert_eq!(out.len(), TABLE_HEADER_LEN + body_len);
    patch_header(&mut out);
    Ok(out)
}

struct SizePass<'a> {
    ctx: &'a mut CompilationContext,
    changed: bool,
    /// Overflow diagnostics fire on the first iteration only; later
    /// iterations revisit the same nodes.
    report: bool,
}

fn size_node(
    arena: &mut AstArena,
    id: NodeId,
    _depth: u32,
    pass: &mut SizePass,
) -> Result<(), AslError> {
    if pass.report && arena.node(id).op == ParseOp::Package {
        let count = arena.child_count(id);
        if count > 0xFF {
            let loc = arena.node(id).loc;
            pass.ctx.error(
                AslErrorKind::Codegen,
                "Package element count does not fit in 8 bits",
                Some(&count.to_string()),
                loc,
            );
        }
    }

    let children_len: u32 = arena
        .children(id)
        .iter()
        .map(|c| arena.node(*c).subtree_length)
        .sum();

    let node = arena.node(id);
    let (aml_length, has_pkg, opcode_bytes) = match opcode_entry(node.op) {
        Some(entry) => {
            let mut len = entry.byte_count as u32;
            if entry.name_arg {
                len += name_string_len(node.name.as_deref());
            }
            len += entry.null_targets as u32;
            len += match node.op {
                // Method flags, Mutex sync flags, Package element count.
                ParseOp::Method | ParseOp::Mutex | ParseOp::Package => 1,
                // ProcID byte, PBlk address dword, PBlk length byte.
                ParseOp::Processor => 6,
                // SystemLevel byte, ResourceOrder word.
                ParseOp::PowerResource => 3,
                ParseOp::Buffer => buffer_data_len(node),
                _ => 0,
            };
            (len, entry.has_pkg_length, entry.byte_count as u32)
        }
        None => match node.op {
            ParseOp::Integer => (integer_encoding_len(node.value.as_integer().unwrap_or(0)), false, 0),
            ParseOp::StringLiteral => {
                let len = match &node.value {
                    NodeValue::String(s) => s.len() as u32,
                    _ => 0,
                };
                (2 + len, false, 0)
            }
            ParseOp::NamePath | ParseOp::MethodCall => {
                (name_string_len(node.name.as_deref()), false, 0)
            }
            // Externals and the root produce no bytes of their own.
            _ => (0, false, 0),
        },
    };

    let mut pkg_width = 0u8;
    if has_pkg {
        let payload = aml_length - opcode_bytes + children_len;
        match pkg_length_width(payload) {
            // Widths never shrink between iterations.
            Some(width) => pkg_width = width.max(node.pkg_len_bytes),
            None => {
                let loc = node.loc;
                if node.pkg_len_bytes < 4 {
                    pass.ctx.error(
                        AslErrorKind::Codegen,
                        "Package is too large to encode",
                        None,
                        loc,
                    );
                }
                pkg_width = 4;
            }
        }
    }

    let subtree_length = aml_length + pkg_width as u32 + children_len;
    let node = arena.node_mut(id);
    if node.aml_length != aml_length
        || node.pkg_len_bytes != pkg_width
        || node.subtree_length != subtree_length
    {
        pass.changed = true;
        node.aml_length = aml_length;
        node.pkg_len_bytes = pkg_width;
        node.subtree_length = subtree_length;
    }
    Ok(())
}

fn name_string_len(name: Option<&str>) -> u32 {
    match name.and_then(|n| NamePath::parse(n).ok()) {
        Some(path) => encode_name_string(&path).len() as u32,
        // Earlier passes reported the malformed name; emit a null name.
        None => 1,
    }
}

fn buffer_data_len(node: &crate::core::ast::AstNode) -> u32 {
    match &node.value {
        NodeValue::Buffer(bytes) => bytes.len() as u32,
        _ => 0,
    }
}

/// Integer literals pick the narrowest prefix their magnitude allows.
fn integer_encoding_len(value: u64) -> u32 {
    if value <= 0xFF {
        2
    } else if value <= 0xFFFF {
        3
    } else if value <= 0xFFFF_FFFF {
        5
    } else {
        9
    }
}

fn emit_node(arena: &AstArena, id: NodeId, out: &mut Vec<u8>) {
    let node = arena.node(id);
    let children = arena.children(id);

    let Some(entry) = opcode_entry(node.op) else {
        match node.op {
            ParseOp::Integer => emit_integer(node.value.as_integer().unwrap_or(0), out),
            ParseOp::StringLiteral => {
                out.push(0x0D);
                if let NodeValue::String(s) = &node.value {
                    out.extend_from_slice(s.as_bytes());
                }
                out.push(0x00);
            }
            ParseOp::NamePath => emit_name_string(node.name.as_deref(), out),
            ParseOp::MethodCall => {
                emit_name_string(node.name.as_deref(), out);
                for child in children {
                    emit_node(arena, child, out);
                }
            }
            ParseOp::External => {}
            // The root has no encoding of its own.
            _ => {
                for child in children {
                    emit_node(arena, child, out);
                }
            }
        }
        return;
    };

    out.extend_from_slice(&entry.bytes[..entry.byte_count as usize]);
    if entry.has_pkg_length {
        let total = node.subtree_length - entry.byte_count as u32;
        out.extend_from_slice(&encode_pkg_length(total, node.pkg_len_bytes));
    }
    if entry.name_arg {
        emit_name_string(node.name.as_deref(), out);
    }
    match node.op {
        ParseOp::Method => {
            out.push((node.value.as_integer().unwrap_or(0) & 0xFF) as u8);
        }
        ParseOp::Mutex => {
            out.push((node.value.as_integer().unwrap_or(0) & 0x0F) as u8);
        }
        ParseOp::Package => {
            out.push(children.len().min(0xFF) as u8);
        }
        ParseOp::Processor => {
            out.push((node.value.as_integer().unwrap_or(0) & 0xFF) as u8);
            out.extend_from_slice(&0u32.to_le_bytes());
            out.push(0x00);
        }
        ParseOp::PowerResource => {
            out.push((node.value.as_integer().unwrap_or(0) & 0xFF) as u8);
            out.extend_from_slice(&0u16.to_le_bytes());
        }
        _ => {}
    }
    for child in children {
        emit_node(arena, child, out);
    }
    if node.op == ParseOp::Buffer {
        if let NodeValue::Buffer(bytes) = &node.value {
            out.extend_from_slice(bytes);
        }
    }
    for _ in 0..entry.null_targets {
        out.push(0x00);
    }
}

fn emit_integer(value: u64, out: &mut Vec<u8>) {
    if value <= 0xFF {
        out.push(0x0A);
        out.push(value as u8);
    } else if value <= 0xFFFF {
        out.push(0x0B);
        out.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xFFFF_FFFF {
        out.push(0x0C);
        out.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        out.push(0x0E);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

fn emit_name_string(name: Option<&str>, out: &mut Vec<u8>) {
    match name.and_then(|n| NamePath::parse(n).ok()) {
        Some(path) => out.extend_from_slice(&encode_name_string(&path)),
        None => out.push(0x00),
    }
}

fn emit_table_header(
    arena: &AstArena,
    root: NodeId,
    ctx: &CompilationContext,
    out: &mut Vec<u8>,
) {
    let node = arena.node(root);
    let mut signature = *b"DSDT";
    if let Some(name) = node.name.as_deref() {
        for (dst, src) in signature.iter_mut().zip(name.bytes()) {
            *dst = src;
        }
    }
    let revision = node
        .value
        .as_integer()
        .map(|v| (v & 0xFF) as u8)
        .unwrap_or(ctx.options.table_revision);
    let total = (TABLE_HEADER_LEN as u32) + node.subtree_length;

    out.extend_from_slice(&signature);
    out.extend_from_slice(&total.to_le_bytes());
    out.push(revision);
    out.push(0x00); // checksum, patched after emission
    out.extend_from_slice(OEM_ID);
    out.extend_from_slice(OEM_TABLE_ID);
    out.extend_from_slice(&OEM_REVISION.to_le_bytes());
    out.extend_from_slice(CREATOR_ID);
    out.extend_from_slice(&CREATOR_REVISION.to_le_bytes());
}

/// Set the checksum byte so the whole table sums to zero mod 256.
fn patch_header(out: &mut [u8]) {
    out[9] = 0;
    let sum = out.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    out[9] = sum.wrapping_neg();
}
