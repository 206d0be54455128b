// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Resource template compilation.
//!
//! Each `ResourceTemplate` node is lowered into a plain Buffer whose bytes
//! are the concatenated descriptor encodings plus the terminating end tag.
//! Descriptor macros validate their operands here; codegen afterwards sees
//! only an ordinary buffer.

mod address;
mod large;
mod small;

use crate::compiler::context::CompilationContext;
use crate::compiler::fold::ensure_buffer_size_child;
use crate::core::ast::{AstArena, NodeId, NodeValue, ParseOp};
use crate::core::btype::BType;
use crate::core::diagnostics::{AslError, AslErrorKind};
use crate::core::walk::{walk_down, WalkAction};

/// Small-resource end tag, followed by a zero checksum byte meaning
/// "checksum not computed".
const END_TAG: [u8; 2] = [0x79, 0x00];

pub fn compile_templates(
    arena: &mut AstArena,
    root: NodeId,
    ctx: &mut CompilationContext,
) -> Result<(), AslError> {
    let mut templates = Vec::new();
    walk_down(
        arena,
        root,
        |arena, id, _depth, templates: &mut Vec<NodeId>| {
            if arena.node(id).op == ParseOp::ResourceTemplate {
                templates.push(id);
                return Ok(WalkAction::SkipChildren);
            }
            Ok(WalkAction::Continue)
        },
        &mut templates,
    )?;
    for template in templates {
        compile_template(arena, template, ctx);
    }
    Ok(())
}

fn compile_template(arena: &mut AstArena, id: NodeId, ctx: &mut CompilationContext) {
    let mut bytes = Vec::new();
    for desc in arena.children(id) {
        let op = arena.node(desc).op;
        match op {
            ParseOp::RtIrq => small::irq(arena, desc, true, ctx, &mut bytes),
            ParseOp::RtIrqNoFlags => small::irq(arena, desc, false, ctx, &mut bytes),
            ParseOp::RtDma => small::dma(arena, desc, ctx, &mut bytes),
            ParseOp::RtIo => small::io(arena, desc, ctx, &mut bytes),
            ParseOp::RtFixedIo => small::fixed_io(arena, desc, ctx, &mut bytes),
            ParseOp::RtVendorShort => small::vendor_short(arena, desc, ctx, &mut bytes),
            ParseOp::RtMemory32 => large::memory32(arena, desc, ctx, &mut bytes),
            ParseOp::RtMemory32Fixed => large::memory32_fixed(arena, desc, ctx, &mut bytes),
            ParseOp::RtWordIo => {
                large::address_space(arena, desc, ctx, large::AddressWidth::Word, 1, &mut bytes)
            }
            ParseOp::RtWordBusNumber => {
                large::address_space(arena, desc, ctx, large::AddressWidth::Word, 2, &mut bytes)
            }
            ParseOp::RtDwordIo => {
                large::address_space(arena, desc, ctx, large::AddressWidth::Dword, 1, &mut bytes)
            }
            ParseOp::RtDwordMemory => {
                large::address_space(arena, desc, ctx, large::AddressWidth::Dword, 0, &mut bytes)
            }
            ParseOp::RtQwordMemory => {
                large::address_space(arena, desc, ctx, large::AddressWidth::Qword, 0, &mut bytes)
            }
            ParseOp::RtInterrupt => large::extended_interrupt(arena, desc, ctx, &mut bytes),
            _ => {
                let loc = arena.node(desc).loc;
                ctx.error(
                    AslErrorKind::Resource,
                    "Object is not valid inside a resource template",
                    None,
                    loc,
                );
            }
        }
    }
    bytes.extend_from_slice(&END_TAG);

    let node = arena.node_mut(id);
    node.op = ParseOp::Buffer;
    node.first_child = None;
    node.last_child = None;
    node.value = NodeValue::Buffer(bytes);
    node.btype = BType::BUFFER;
    node.synthesized = true;
    ensure_buffer_size_child(arena, id);
}

/// Read descriptor operand `index` as an integer that must fit `bits`.
/// Out-of-range values are reported and clamped so encoding continues.
fn rs_field(
    arena: &AstArena,
    desc: NodeId,
    index: usize,
    bits: u32,
    field: &str,
    ctx: &mut CompilationContext,
) -> u64 {
    let Some(child) = arena.child(desc, index) else {
        return 0;
    };
    let loc = arena.node(child).loc;
    let Some(value) = arena.node(child).integer_value() else {
        ctx.error(
            AslErrorKind::Resource,
            &format!("{field} must be an integer constant"),
            None,
            loc,
        );
        return 0;
    };
    let mask = if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    };
    if value & !mask != 0 {
        ctx.error(
            AslErrorKind::Resource,
            &format!("{field} does not fit in {bits} bits"),
            Some(&format!("0x{value:X}")),
            loc,
        );
    }
    value & mask
}

fn operand_loc(arena: &AstArena, desc: NodeId, index: usize) -> crate::core::ast::SourceLoc {
    arena
        .child(desc, index)
        .map(|c| arena.node(c).loc)
        .unwrap_or(arena.node(desc).loc)
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}
