// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Large (type-1) resource descriptors.
//!
//! A large descriptor starts with a tag byte (bit 7 set) and a 16-bit
//! little-endian body length.

use super::address::{
    validate, AddressRange, OP_DECODE, OP_GRAN, OP_LENGTH, OP_MAX, OP_MAX_FIXED, OP_MIN,
    OP_MIN_FIXED, OP_TRANSLATION,
};
use super::{push_u16, push_u32, push_u64, rs_field};
use crate::compiler::context::CompilationContext;
use crate::core::ast::{AstArena, NodeId};
use crate::core::diagnostics::AslErrorKind;

fn large_header(out: &mut Vec<u8>, tag: u8, body_len: u16) {
    out.push(tag);
    push_u16(out, body_len);
}

/// 32-bit memory range descriptor.
pub(super) fn memory32(
    arena: &AstArena,
    desc: NodeId,
    ctx: &mut CompilationContext,
    out: &mut Vec<u8>,
) {
    let write = rs_field(arena, desc, 0, 1, "Memory write status", ctx) as u8;
    let min = rs_field(arena, desc, 1, 32, "Memory range minimum", ctx) as u32;
    let max = rs_field(arena, desc, 2, 32, "Memory range maximum", ctx) as u32;
    let align = rs_field(arena, desc, 3, 32, "Memory alignment", ctx) as u32;
    let len = rs_field(arena, desc, 4, 32, "Memory range length", ctx) as u32;

    large_header(out, 0x85, 17);
    out.push(write);
    push_u32(out, min);
    push_u32(out, max);
    push_u32(out, align);
    push_u32(out, len);
}

/// Fixed 32-bit memory range descriptor.
pub(super) fn memory32_fixed(
    arena: &AstArena,
    desc: NodeId,
    ctx: &mut CompilationContext,
    out: &mut Vec<u8>,
) {
    let write = rs_field(arena, desc, 0, 1, "Memory write status", ctx) as u8;
    let base = rs_field(arena, desc, 1, 32, "Memory base address", ctx) as u32;
    let len = rs_field(arena, desc, 2, 32, "Memory range length", ctx) as u32;

    large_header(out, 0x86, 9);
    out.push(write);
    push_u32(out, base);
    push_u32(out, len);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum AddressWidth {
    Word,
    Dword,
    Qword,
}

impl AddressWidth {
    fn bits(self) -> u32 {
        match self {
            AddressWidth::Word => 16,
            AddressWidth::Dword => 32,
            AddressWidth::Qword => 64,
        }
    }

    fn tag(self) -> u8 {
        match self {
            AddressWidth::Word => 0x88,
            AddressWidth::Dword => 0x87,
            AddressWidth::Qword => 0x8A,
        }
    }

    fn body_len(self) -> u16 {
        // Resource type, general flags, type-specific flags, then five
        // address fields at the descriptor width.
        3 + 5 * (self.bits() as u16 / 8)
    }
}

/// Word/DWord/QWord address-space descriptor. `resource_type` is 0 for
/// memory ranges, 1 for IO ranges, 2 for bus numbers.
pub(super) fn address_space(
    arena: &AstArena,
    desc: NodeId,
    ctx: &mut CompilationContext,
    width: AddressWidth,
    resource_type: u8,
    out: &mut Vec<u8>,
) {
    let bits = width.bits();
    let min_fixed = rs_field(arena, desc, OP_MIN_FIXED, 1, "MinFixed flag", ctx) != 0;
    let max_fixed = rs_field(arena, desc, OP_MAX_FIXED, 1, "MaxFixed flag", ctx) != 0;
    let decode = rs_field(arena, desc, OP_DECODE, 1, "Decode flag", ctx) as u8;
    let mut range = AddressRange {
        min_fixed,
        max_fixed,
        gran: rs_field(arena, desc, OP_GRAN, bits, "Address granularity", ctx),
        min: rs_field(arena, desc, OP_MIN, bits, "Address minimum", ctx),
        max: rs_field(arena, desc, OP_MAX, bits, "Address maximum", ctx),
        length: rs_field(arena, desc, OP_LENGTH, bits, "Address length", ctx),
    };
    let translation = rs_field(arena, desc, OP_TRANSLATION, bits, "Translation offset", ctx);
    validate(&mut range, arena, desc, ctx);

    let general_flags = (decode << 1) | ((min_fixed as u8) << 2) | ((max_fixed as u8) << 3);
    let type_specific = if resource_type == 1 { 0x03 } else { 0x00 };

    large_header(out, width.tag(), width.body_len());
    out.push(resource_type);
    out.push(general_flags);
    out.push(type_specific);
    for field in [range.gran, range.min, range.max, translation, range.length] {
        match width {
            AddressWidth::Word => push_u16(out, field as u16),
            AddressWidth::Dword => push_u32(out, field as u32),
            AddressWidth::Qword => push_u64(out, field),
        }
    }
}

/// Extended interrupt descriptor: flags byte, interrupt count, then one
/// 32-bit interrupt number per entry.
pub(super) fn extended_interrupt(
    arena: &AstArena,
    desc: NodeId,
    ctx: &mut CompilationContext,
    out: &mut Vec<u8>,
) {
    let consumer = rs_field(arena, desc, 0, 1, "Resource usage", ctx) as u8;
    let mode = rs_field(arena, desc, 1, 1, "Interrupt mode", ctx) as u8;
    let polarity = rs_field(arena, desc, 2, 1, "Interrupt polarity", ctx) as u8;
    let sharing = rs_field(arena, desc, 3, 1, "Interrupt sharing", ctx) as u8;

    let mut interrupts = Vec::new();
    for index in 4..arena.child_count(desc) {
        interrupts.push(rs_field(arena, desc, index, 32, "Interrupt number", ctx) as u32);
    }
    if interrupts.is_empty() {
        let loc = arena.node(desc).loc;
        ctx.error(
            AslErrorKind::Resource,
            "Interrupt descriptor has an empty interrupt list",
            None,
            loc,
        );
    }
    if interrupts.len() > u8::MAX as usize {
        let loc = arena.node(desc).loc;
        ctx.error(
            AslErrorKind::Resource,
            "Interrupt count does not fit in 8 bits",
            Some(&interrupts.len().to_string()),
            loc,
        );
    }
    let count = interrupts.len().min(u8::MAX as usize) as u8;

    large_header(out, 0x89, 2 + 4 * count as u16);
    out.push(consumer | (mode << 1) | (polarity << 2) | (sharing << 3));
    out.push(count);
    for interrupt in interrupts.iter().take(count as usize) {
        push_u32(out, *interrupt);
    }
}
