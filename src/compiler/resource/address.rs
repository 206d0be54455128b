// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Address-range validation shared by the Word/DWord/QWord descriptors.
//!
//! The four derivable quantities (Min, Max, Length and the fixed flags)
//! are cross-checked: an omitted length is computed from fixed endpoints,
//! an underdetermined endpoint is computed from the length, and an
//! over-determined triple must be consistent. Granularity must be a
//! power of two minus one and both endpoints must be aligned to it.
//! Errors are attributed to the operand that is wrong.

use super::operand_loc;
use crate::compiler::context::CompilationContext;
use crate::core::ast::{AstArena, NodeId};
use crate::core::diagnostics::AslErrorKind;

// Operand order of the address-space descriptor macros.
pub(super) const OP_MIN_FIXED: usize = 0;
pub(super) const OP_MAX_FIXED: usize = 1;
pub(super) const OP_DECODE: usize = 2;
pub(super) const OP_GRAN: usize = 3;
pub(super) const OP_MIN: usize = 4;
pub(super) const OP_MAX: usize = 5;
pub(super) const OP_TRANSLATION: usize = 6;
pub(super) const OP_LENGTH: usize = 7;

pub(super) struct AddressRange {
    pub min_fixed: bool,
    pub max_fixed: bool,
    pub gran: u64,
    pub min: u64,
    pub max: u64,
    pub length: u64,
}

pub(super) fn validate(
    range: &mut AddressRange,
    arena: &AstArena,
    desc: NodeId,
    ctx: &mut CompilationContext,
) {
    if range.gran != 0 && range.gran & (range.gran + 1) != 0 {
        ctx.error(
            AslErrorKind::Resource,
            "Granularity must be a power of two minus one",
            Some(&format!("0x{:X}", range.gran)),
            operand_loc(arena, desc, OP_GRAN),
        );
    }

    if range.length == 0 {
        if range.min_fixed && range.max_fixed {
            if range.max < range.min {
                ctx.error(
                    AslErrorKind::Resource,
                    "Address Maximum is less than address Minimum",
                    Some(&format!("0x{:X}", range.max)),
                    operand_loc(arena, desc, OP_MAX),
                );
            } else {
                range.length = range.max - range.min + 1;
            }
        }
    } else if range.min_fixed && range.max_fixed {
        let expected = range.max.wrapping_sub(range.min).wrapping_add(1);
        if range.length != expected {
            ctx.error(
                AslErrorKind::Resource,
                &format!("Address Length does not match Min/Max window, should be 0x{expected:X}"),
                Some(&format!("0x{:X}", range.length)),
                operand_loc(arena, desc, OP_LENGTH),
            );
        }
    } else if range.min_fixed {
        range.max = range.min.wrapping_add(range.length).wrapping_sub(1);
    } else if range.max_fixed {
        range.min = range.max.wrapping_sub(range.length).wrapping_add(1);
    }

    if range.gran != 0 {
        if range.min & range.gran != 0 {
            ctx.error(
                AslErrorKind::Resource,
                "Address Minimum is not aligned to Granularity",
                Some(&format!("0x{:X}", range.min)),
                operand_loc(arena, desc, OP_MIN),
            );
        }
        if range.max.wrapping_add(1) & range.gran != 0 {
            ctx.error(
                AslErrorKind::Resource,
                "Address Maximum is not aligned to Granularity",
                Some(&format!("0x{:X}", range.max)),
                operand_loc(arena, desc, OP_MAX),
            );
        }
    }
}
