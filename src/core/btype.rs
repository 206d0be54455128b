// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Bit-type lattice for expression analysis.
//!
//! A `BType` is a bitmask over the runtime ACPI object types an expression
//! may evaluate to. A node can be polymorphic over several legal types, so
//! operand checking works with set intersection rather than single-type
//! equality.

use std::fmt;

/// Set of possible runtime object types for an expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BType(u32);

impl BType {
    pub const NONE: BType = BType(0);
    pub const INTEGER: BType = BType(0x0000_0001);
    pub const STRING: BType = BType(0x0000_0002);
    pub const BUFFER: BType = BType(0x0000_0004);
    pub const PACKAGE: BType = BType(0x0000_0008);
    pub const FIELD_UNIT: BType = BType(0x0000_0010);
    pub const DEVICE: BType = BType(0x0000_0020);
    pub const EVENT: BType = BType(0x0000_0040);
    pub const METHOD: BType = BType(0x0000_0080);
    pub const MUTEX: BType = BType(0x0000_0100);
    pub const REGION: BType = BType(0x0000_0200);
    pub const POWER: BType = BType(0x0000_0400);
    pub const PROCESSOR: BType = BType(0x0000_0800);
    pub const THERMAL: BType = BType(0x0000_1000);
    pub const BUFFER_FIELD: BType = BType(0x0000_2000);
    pub const DDB_HANDLE: BType = BType(0x0000_4000);
    pub const DEBUG: BType = BType(0x0000_8000);
    pub const REFERENCE: BType = BType(0x0001_0000);

    /// Types usable as arithmetic/logical source operands after implicit
    /// conversion.
    pub const COMPUTE_DATA: BType =
        BType(Self::INTEGER.0 | Self::STRING.0 | Self::BUFFER.0 | Self::FIELD_UNIT.0);
    /// All data object types.
    pub const DATA: BType = BType(Self::COMPUTE_DATA.0 | Self::PACKAGE.0);
    /// Any object type at all.
    pub const ALL: BType = BType(0x0001_FFFF);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn intersect(self, other: BType) -> BType {
        BType(self.0 & other.0)
    }

    pub const fn union(self, other: BType) -> BType {
        BType(self.0 | other.0)
    }

    pub const fn contains(self, other: BType) -> bool {
        self.0 & other.0 == other.0
    }
}

const BTYPE_NAMES: &[(BType, &str)] = &[
    (BType::INTEGER, "Integer"),
    (BType::STRING, "String"),
    (BType::BUFFER, "Buffer"),
    (BType::PACKAGE, "Package"),
    (BType::FIELD_UNIT, "FieldUnit"),
    (BType::DEVICE, "Device"),
    (BType::EVENT, "Event"),
    (BType::METHOD, "Method"),
    (BType::MUTEX, "Mutex"),
    (BType::REGION, "OperationRegion"),
    (BType::POWER, "PowerResource"),
    (BType::PROCESSOR, "Processor"),
    (BType::THERMAL, "ThermalZone"),
    (BType::BUFFER_FIELD, "BufferField"),
    (BType::DDB_HANDLE, "DdbHandle"),
    (BType::DEBUG, "Debug"),
    (BType::REFERENCE, "Reference"),
];

impl fmt::Display for BType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "None");
        }
        if *self == BType::ALL {
            return write!(f, "Any");
        }
        let mut first = true;
        for (bit, name) in BTYPE_NAMES {
            if self.contains(*bit) {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}
