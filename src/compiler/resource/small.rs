// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Small (type-0) resource descriptors.
//!
//! A small descriptor packs its type and body length into one tag byte:
//! bits 7..3 are the type, bits 2..0 the length of the body that follows.

use super::{push_u16, rs_field};
use crate::compiler::context::CompilationContext;
use crate::core::ast::{AstArena, NodeId};
use crate::core::diagnostics::AslErrorKind;

fn small_tag(descriptor_type: u8, body_len: u8) -> u8 {
    (descriptor_type << 3) | (body_len & 0x07)
}

/// IRQ descriptor. With flags the body carries an info byte after the
/// 16-bit interrupt mask; the no-flags form omits it and defaults to
/// edge-triggered, active-high, exclusive.
pub(super) fn irq(
    arena: &AstArena,
    desc: NodeId,
    with_flags: bool,
    ctx: &mut CompilationContext,
    out: &mut Vec<u8>,
) {
    let first_irq = if with_flags { 3 } else { 0 };
    let mut mask: u16 = 0;
    for (index, child) in arena.children(desc).into_iter().enumerate().skip(first_irq) {
        let value = rs_field(arena, desc, index, 64, "Interrupt number", ctx);
        if value > 15 {
            let loc = arena.node(child).loc;
            ctx.error(
                AslErrorKind::Resource,
                "Invalid interrupt number, must be 0..15",
                Some(&value.to_string()),
                loc,
            );
            continue;
        }
        mask |= 1 << value;
    }

    if with_flags {
        let mode = rs_field(arena, desc, 0, 1, "Interrupt mode", ctx) as u8;
        let polarity = rs_field(arena, desc, 1, 1, "Interrupt polarity", ctx) as u8;
        let sharing = rs_field(arena, desc, 2, 1, "Interrupt sharing", ctx) as u8;
        out.push(small_tag(0x04, 3));
        push_u16(out, mask);
        out.push(mode | (polarity << 3) | (sharing << 4));
    } else {
        out.push(small_tag(0x04, 2));
        push_u16(out, mask);
    }
}

/// DMA descriptor: channel mask byte plus a flags byte packing channel
/// speed, bus-master capability and transfer width.
pub(super) fn dma(
    arena: &AstArena,
    desc: NodeId,
    ctx: &mut CompilationContext,
    out: &mut Vec<u8>,
) {
    let channel_type = rs_field(arena, desc, 0, 2, "DMA channel type", ctx) as u8;
    let bus_master = rs_field(arena, desc, 1, 1, "DMA bus master flag", ctx) as u8;
    let transfer = rs_field(arena, desc, 2, 2, "DMA transfer width", ctx) as u8;

    let mut mask: u8 = 0;
    for (index, child) in arena.children(desc).into_iter().enumerate().skip(3) {
        let value = rs_field(arena, desc, index, 64, "DMA channel", ctx);
        if value > 7 {
            let loc = arena.node(child).loc;
            ctx.error(
                AslErrorKind::Resource,
                "Invalid DMA channel, must be 0..7",
                Some(&value.to_string()),
                loc,
            );
            continue;
        }
        mask |= 1 << value;
    }

    out.push(small_tag(0x05, 2));
    out.push(mask);
    out.push((channel_type << 5) | (bus_master << 2) | transfer);
}

/// IO port descriptor: decode flag, 16-bit min/max, alignment, length.
pub(super) fn io(arena: &AstArena, desc: NodeId, ctx: &mut CompilationContext, out: &mut Vec<u8>) {
    let decode = rs_field(arena, desc, 0, 1, "IO decode", ctx) as u8;
    let min = rs_field(arena, desc, 1, 16, "IO range minimum", ctx) as u16;
    let max = rs_field(arena, desc, 2, 16, "IO range maximum", ctx) as u16;
    let align = rs_field(arena, desc, 3, 8, "IO alignment", ctx) as u8;
    let len = rs_field(arena, desc, 4, 8, "IO range length", ctx) as u8;

    out.push(small_tag(0x08, 7));
    out.push(decode);
    push_u16(out, min);
    push_u16(out, max);
    out.push(align);
    out.push(len);
}

/// Short vendor-defined descriptor: up to 7 opaque data bytes.
pub(super) fn vendor_short(
    arena: &AstArena,
    desc: NodeId,
    ctx: &mut CompilationContext,
    out: &mut Vec<u8>,
) {
    let count = arena.child_count(desc);
    if count > 7 {
        let loc = arena.node(desc).loc;
        ctx.error(
            AslErrorKind::Resource,
            "Vendor descriptor holds at most 7 bytes",
            Some(&count.to_string()),
            loc,
        );
    }
    let count = count.min(7);
    out.push(small_tag(0x0E, count as u8));
    for index in 0..count {
        out.push(rs_field(arena, desc, index, 8, "Vendor data byte", ctx) as u8);
    }
}

/// Fixed-location IO descriptor: ten base-address bits and a length.
pub(super) fn fixed_io(
    arena: &AstArena,
    desc: NodeId,
    ctx: &mut CompilationContext,
    out: &mut Vec<u8>,
) {
    let base = rs_field(arena, desc, 0, 10, "Fixed IO base address", ctx) as u16;
    let len = rs_field(arena, desc, 1, 8, "Fixed IO range length", ctx) as u8;

    out.push(small_tag(0x09, 3));
    push_u16(out, base);
    out.push(len);
}
