// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Reserved-name reference table.
//!
//! Static data consumed by method analysis: for each ACPI reserved name,
//! the expected argument count, the bit-types a returned value may have
//! (`BType::NONE` when the name must not return one), and the expected
//! package shape for names that return a Package.

use crate::core::btype::BType;
use crate::core::namespace::NameSeg;

/// Expected shape of a returned Package.
#[derive(Debug, Clone, Copy)]
pub enum PackageExpect {
    /// Fixed element count with per-element expected types.
    Fixed(&'static [BType]),
    /// Variable element count, every element of the given type.
    Uniform(BType),
}

#[derive(Debug, Clone, Copy)]
pub struct PredefinedEntry {
    pub name: &'static str,
    pub arg_count: u8,
    pub return_btype: BType,
    pub package: Option<PackageExpect>,
}

const INT: BType = BType::INTEGER;
const STR: BType = BType::STRING;
const INT_OR_STR: BType = BType::INTEGER.union(BType::STRING);

// _BIF: 9 integers followed by 4 strings.
static BIF_SHAPE: [BType; 13] = [
    INT, INT, INT, INT, INT, INT, INT, INT, INT, STR, STR, STR, STR,
];

pub static PREDEFINED_NAMES: &[PredefinedEntry] = &[
    PredefinedEntry {
        name: "_ADR",
        arg_count: 0,
        return_btype: BType::INTEGER,
        package: None,
    },
    PredefinedEntry {
        name: "_BIF",
        arg_count: 0,
        return_btype: BType::PACKAGE,
        package: Some(PackageExpect::Fixed(&BIF_SHAPE)),
    },
    PredefinedEntry {
        name: "_CID",
        arg_count: 0,
        return_btype: INT_OR_STR.union(BType::PACKAGE),
        package: Some(PackageExpect::Uniform(INT_OR_STR)),
    },
    PredefinedEntry {
        name: "_CRS",
        arg_count: 0,
        return_btype: BType::BUFFER,
        package: None,
    },
    PredefinedEntry {
        name: "_DSM",
        arg_count: 4,
        return_btype: BType::ALL,
        package: None,
    },
    PredefinedEntry {
        name: "_HID",
        arg_count: 0,
        return_btype: INT_OR_STR,
        package: None,
    },
    PredefinedEntry {
        name: "_INI",
        arg_count: 0,
        return_btype: BType::NONE,
        package: None,
    },
    PredefinedEntry {
        name: "_OFF",
        arg_count: 0,
        return_btype: BType::NONE,
        package: None,
    },
    PredefinedEntry {
        name: "_ON_",
        arg_count: 0,
        return_btype: BType::NONE,
        package: None,
    },
    PredefinedEntry {
        name: "_OSC",
        arg_count: 4,
        return_btype: BType::BUFFER,
        package: None,
    },
    PredefinedEntry {
        name: "_PLD",
        arg_count: 0,
        return_btype: BType::PACKAGE,
        package: Some(PackageExpect::Uniform(BType::BUFFER)),
    },
    PredefinedEntry {
        name: "_PRS",
        arg_count: 0,
        return_btype: BType::BUFFER,
        package: None,
    },
    PredefinedEntry {
        name: "_PRT",
        arg_count: 0,
        return_btype: BType::PACKAGE,
        package: Some(PackageExpect::Uniform(BType::PACKAGE)),
    },
    PredefinedEntry {
        name: "_PSC",
        arg_count: 0,
        return_btype: BType::INTEGER,
        package: None,
    },
    PredefinedEntry {
        name: "_REG",
        arg_count: 2,
        return_btype: BType::NONE,
        package: None,
    },
    PredefinedEntry {
        name: "_SRS",
        arg_count: 1,
        return_btype: BType::NONE,
        package: None,
    },
    PredefinedEntry {
        name: "_STA",
        arg_count: 0,
        return_btype: BType::INTEGER,
        package: None,
    },
    PredefinedEntry {
        name: "_UID",
        arg_count: 0,
        return_btype: INT_OR_STR,
        package: None,
    },
];

/// Look up a reserved name. Only underscore-prefixed segments can match.
pub fn predefined_entry(seg: &NameSeg) -> Option<&'static PredefinedEntry> {
    PREDEFINED_NAMES.iter().find(|e| e.name == seg.as_str())
}

/// Whether a segment is in the reserved-name lexical space (`_`-prefixed)
/// without being a known reserved name.
pub fn is_unknown_reserved(seg: &NameSeg) -> bool {
    seg.as_str().starts_with('_') && predefined_entry(seg).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::namespace::NameSeg;

    #[test]
    fn known_names_resolve_with_shape() {
        let sta = predefined_entry(&NameSeg::parse("_STA").unwrap()).unwrap();
        assert_eq!(sta.arg_count, 0);
        assert_eq!(sta.return_btype, BType::INTEGER);

        let prt = predefined_entry(&NameSeg::parse("_PRT").unwrap()).unwrap();
        assert!(matches!(prt.package, Some(PackageExpect::Uniform(_))));
    }

    #[test]
    fn unknown_reserved_is_flagged() {
        assert!(is_unknown_reserved(&NameSeg::parse("_XYZ").unwrap()));
        assert!(!is_unknown_reserved(&NameSeg::parse("_STA").unwrap()));
        assert!(!is_unknown_reserved(&NameSeg::parse("FOO").unwrap()));
    }
}
