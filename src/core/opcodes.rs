// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Static AML encoding tables.
//!
//! Maps parse ops to their AML opcode bytes and operand shape, and provides
//! the self-referential package-length encoding. Integer and namestring
//! encodings are disambiguated by value shape in the code generator; this
//! module owns the raw encoding rules.

use crate::core::ast::ParseOp;
use crate::core::namespace::NamePath;

/// AML encoding of one parse op.
#[derive(Debug, Clone, Copy)]
pub struct AmlOpcodeEntry {
    pub name: &'static str,
    pub bytes: [u8; 2],
    pub byte_count: u8,
    /// Op carries a package-length field after the opcode bytes.
    pub has_pkg_length: bool,
    /// A namestring operand follows the opcode (and package length).
    pub name_arg: bool,
    /// Trailing implicit targets emitted as null names when unused.
    pub null_targets: u8,
}

const fn entry(
    name: &'static str,
    bytes: [u8; 2],
    byte_count: u8,
    has_pkg_length: bool,
    name_arg: bool,
    null_targets: u8,
) -> AmlOpcodeEntry {
    AmlOpcodeEntry {
        name,
        bytes,
        byte_count,
        has_pkg_length,
        name_arg,
        null_targets,
    }
}

/// Fixed AML encoding for `op`, or `None` for ops that have no direct
/// opcode (literals with magnitude-selected prefixes, namestrings, and
/// constructs consumed before code generation).
pub fn opcode_entry(op: ParseOp) -> Option<AmlOpcodeEntry> {
    let e = match op {
        ParseOp::Zero => entry("ZeroOp", [0x00, 0], 1, false, false, 0),
        ParseOp::One => entry("OneOp", [0x01, 0], 1, false, false, 0),
        ParseOp::Ones => entry("OnesOp", [0xFF, 0], 1, false, false, 0),
        ParseOp::Name => entry("NameOp", [0x08, 0], 1, false, true, 0),
        ParseOp::Scope => entry("ScopeOp", [0x10, 0], 1, true, true, 0),
        ParseOp::Buffer => entry("BufferOp", [0x11, 0], 1, true, false, 0),
        ParseOp::Package => entry("PackageOp", [0x12, 0], 1, true, false, 0),
        ParseOp::Method => entry("MethodOp", [0x14, 0], 1, true, true, 0),
        ParseOp::Mutex => entry("MutexOp", [0x5B, 0x01], 2, false, true, 0),
        ParseOp::Device => entry("DeviceOp", [0x5B, 0x82], 2, true, true, 0),
        ParseOp::Processor => entry("ProcessorOp", [0x5B, 0x83], 2, true, true, 0),
        ParseOp::PowerResource => entry("PowerResOp", [0x5B, 0x84], 2, true, true, 0),
        ParseOp::ThermalZone => entry("ThermalZoneOp", [0x5B, 0x85], 2, true, true, 0),
        ParseOp::Store => entry("StoreOp", [0x70, 0], 1, false, false, 0),
        ParseOp::Add => entry("AddOp", [0x72, 0], 1, false, false, 1),
        ParseOp::Subtract => entry("SubtractOp", [0x74, 0], 1, false, false, 1),
        ParseOp::Multiply => entry("MultiplyOp", [0x77, 0], 1, false, false, 1),
        ParseOp::Divide => entry("DivideOp", [0x78, 0], 1, false, false, 2),
        ParseOp::ShiftLeft => entry("ShiftLeftOp", [0x79, 0], 1, false, false, 1),
        ParseOp::ShiftRight => entry("ShiftRightOp", [0x7A, 0], 1, false, false, 1),
        ParseOp::BitAnd => entry("AndOp", [0x7B, 0], 1, false, false, 1),
        ParseOp::BitOr => entry("OrOp", [0x7D, 0], 1, false, false, 1),
        ParseOp::BitXor => entry("XorOp", [0x7F, 0], 1, false, false, 1),
        ParseOp::BitNot => entry("NotOp", [0x80, 0], 1, false, false, 1),
        ParseOp::Mod => entry("ModOp", [0x85, 0], 1, false, false, 1),
        ParseOp::LAnd => entry("LandOp", [0x90, 0], 1, false, false, 0),
        ParseOp::LOr => entry("LorOp", [0x91, 0], 1, false, false, 0),
        ParseOp::LNot => entry("LnotOp", [0x92, 0], 1, false, false, 0),
        ParseOp::LEqual => entry("LequalOp", [0x93, 0], 1, false, false, 0),
        ParseOp::LGreater => entry("LgreaterOp", [0x94, 0], 1, false, false, 0),
        ParseOp::LLess => entry("LlessOp", [0x95, 0], 1, false, false, 0),
        ParseOp::If => entry("IfOp", [0xA0, 0], 1, true, false, 0),
        ParseOp::Else => entry("ElseOp", [0xA1, 0], 1, true, false, 0),
        ParseOp::While => entry("WhileOp", [0xA2, 0], 1, true, false, 0),
        ParseOp::Return => entry("ReturnOp", [0xA4, 0], 1, false, false, 0),
        ParseOp::Arg(n) => entry("ArgOp", [0x68 + n.min(6), 0], 1, false, false, 0),
        ParseOp::Local(n) => entry("LocalOp", [0x60 + n.min(7), 0], 1, false, false, 0),
        // No direct opcode: encoded by shape, consumed before codegen, or
        // emitted only into the externals table.
        ParseOp::DefinitionBlock
        | ParseOp::External
        | ParseOp::Integer
        | ParseOp::StringLiteral
        | ParseOp::NamePath
        | ParseOp::MethodCall
        | ParseOp::ResourceTemplate
        | ParseOp::RtIrq
        | ParseOp::RtIrqNoFlags
        | ParseOp::RtDma
        | ParseOp::RtIo
        | ParseOp::RtFixedIo
        | ParseOp::RtMemory32
        | ParseOp::RtMemory32Fixed
        | ParseOp::RtVendorShort
        | ParseOp::RtWordIo
        | ParseOp::RtWordBusNumber
        | ParseOp::RtDwordIo
        | ParseOp::RtDwordMemory
        | ParseOp::RtQwordMemory
        | ParseOp::RtInterrupt => return None,
    };
    Some(e)
}

/// Maximum total (payload + field) a package-length field of `width` bytes
/// can express.
pub fn pkg_length_max(width: u8) -> u32 {
    match width {
        1 => 0x3F,
        2 => 0xFFF,
        3 => 0xF_FFFF,
        _ => 0xFFF_FFFF,
    }
}

/// Smallest field width able to carry `payload` plus the field itself.
/// The required width only ever grows as payload estimates increase, which
/// is what bounds the length fixpoint.
pub fn pkg_length_width(payload: u32) -> Option<u8> {
    for width in 1u8..=4 {
        let total = payload.checked_add(width as u32)?;
        if total <= pkg_length_max(width) {
            return Some(width);
        }
    }
    None
}

/// Encode a package length `total` (which already includes the field's own
/// bytes) into `width` bytes.
pub fn encode_pkg_length(total: u32, width: u8) -> Vec<u8> {
    debug_assert!(total <= pkg_length_max(width));
    if width == 1 {
        return vec![(total & 0x3F) as u8];
    }
    let mut out = Vec::with_capacity(width as usize);
    out.push(((width - 1) << 6) | (total & 0x0F) as u8);
    let mut rest = total >> 4;
    for _ in 1..width {
        out.push((rest & 0xFF) as u8);
        rest >>= 8;
    }
    out
}

/// Decode a package length field, returning `(total, field_width)`.
pub fn decode_pkg_length(bytes: &[u8]) -> Option<(u32, u8)> {
    let lead = *bytes.first()?;
    let width = (lead >> 6) + 1;
    if bytes.len() < width as usize {
        return None;
    }
    if width == 1 {
        return Some(((lead & 0x3F) as u32, 1));
    }
    let mut total = (lead & 0x0F) as u32;
    for (i, &b) in bytes[1..width as usize].iter().enumerate() {
        total |= (b as u32) << (4 + 8 * i);
    }
    Some((total, width))
}

/// Encode a namestring: prefix bytes, then the null/single/dual/multi
/// segment form selected by segment count.
pub fn encode_name_string(path: &NamePath) -> Vec<u8> {
    let mut out = Vec::new();
    if path.root {
        out.push(0x5C);
    }
    for _ in 0..path.carats {
        out.push(0x5E);
    }
    match path.segs.len() {
        0 => out.push(0x00),
        1 => out.extend_from_slice(&path.segs[0].bytes()),
        2 => {
            out.push(0x2E);
            out.extend_from_slice(&path.segs[0].bytes());
            out.extend_from_slice(&path.segs[1].bytes());
        }
        n => {
            out.push(0x2F);
            out.push(n as u8);
            for seg in &path.segs {
                out.extend_from_slice(&seg.bytes());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::namespace::NamePath;

    #[test]
    fn width_selection_accounts_for_field_itself() {
        // 0x3F total is the largest 1-byte package; payload 0x3E fits,
        // payload 0x3F needs 2 bytes because the field adds one.
        assert_eq!(pkg_length_width(0x3E), Some(1));
        assert_eq!(pkg_length_width(0x3F), Some(2));
        assert_eq!(pkg_length_width(0xFFD), Some(2));
        assert_eq!(pkg_length_width(0xFFE), Some(3));
        assert_eq!(pkg_length_width(0xFFF_FFFF), None);
    }

    #[test]
    fn encode_decode_round_trip() {
        for total in [0x00u32, 0x3F, 0x40, 0xFFF, 0x1000, 0xF_FFFF, 0x10_0000] {
            let width = (1u8..=4)
                .find(|w| total <= pkg_length_max(*w))
                .unwrap();
            let bytes = encode_pkg_length(total, width);
            assert_eq!(bytes.len(), width as usize);
            assert_eq!(decode_pkg_length(&bytes), Some((total, width)));
        }
    }

    #[test]
    fn name_string_forms() {
        let single = NamePath::parse("ABCD").unwrap();
        assert_eq!(encode_name_string(&single), b"ABCD".to_vec());

        let dual = NamePath::parse("\\AB.CD").unwrap();
        assert_eq!(
            encode_name_string(&dual),
            vec![0x5C, 0x2E, b'A', b'B', b'_', b'_', b'C', b'D', b'_', b'_']
        );

        let multi = NamePath::parse("^A.B.C").unwrap();
        let encoded = encode_name_string(&multi);
        assert_eq!(encoded[0], 0x5E);
        assert_eq!(encoded[1], 0x2F);
        assert_eq!(encoded[2], 3);
        assert_eq!(encoded.len(), 3 + 12);
    }

    #[test]
    fn extended_opcodes_carry_prefix_byte() {
        let dev = opcode_entry(ParseOp::Device).unwrap();
        assert_eq!(dev.bytes, [0x5B, 0x82]);
        assert_eq!(dev.byte_count, 2);
        assert!(dev.has_pkg_length);
        assert!(dev.name_arg);

        assert!(opcode_entry(ParseOp::ResourceTemplate).is_none());
        assert_eq!(opcode_entry(ParseOp::Arg(2)).unwrap().bytes[0], 0x6A);
        assert_eq!(opcode_entry(ParseOp::Local(7)).unwrap().bytes[0], 0x67);
    }
}
