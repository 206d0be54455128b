// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Hierarchical ACPI namespace.
//!
//! Namespace nodes live in an arena addressed by stable `NsId` indices;
//! owning-scope and parse-node back-references are index-based weak links,
//! so the aliased graph carries no shared ownership. Lookup within a scope
//! is case-sensitive exact match on the 4-character segment.

use std::fmt;

use crate::core::ast::NodeId;
use crate::core::btype::BType;
use crate::core::diagnostics::{AslError, AslErrorKind};

/// Stable index of a node in the namespace arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NsId(u32);

impl NsId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Object type of a declared name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Unknown,
    Scope,
    Integer,
    String,
    Buffer,
    Package,
    Device,
    Method,
    Mutex,
    PowerResource,
    Processor,
    ThermalZone,
}

impl ObjectType {
    /// Bit-type an expression referencing this object may produce.
    pub fn btype(self) -> BType {
        match self {
            ObjectType::Unknown => BType::ALL,
            ObjectType::Scope => BType::NONE,
            ObjectType::Integer => BType::INTEGER,
            ObjectType::String => BType::STRING,
            ObjectType::Buffer => BType::BUFFER,
            ObjectType::Package => BType::PACKAGE,
            ObjectType::Device => BType::DEVICE,
            // A method reference evaluates to whatever the method returns.
            ObjectType::Method => BType::ALL,
            ObjectType::Mutex => BType::MUTEX,
            ObjectType::PowerResource => BType::POWER,
            ObjectType::Processor => BType::PROCESSOR,
            ObjectType::ThermalZone => BType::THERMAL,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectType::Unknown => "UnknownObj",
            ObjectType::Scope => "Scope",
            ObjectType::Integer => "IntObj",
            ObjectType::String => "StrObj",
            ObjectType::Buffer => "BuffObj",
            ObjectType::Package => "PkgObj",
            ObjectType::Device => "DeviceObj",
            ObjectType::Method => "MethodObj",
            ObjectType::Mutex => "MutexObj",
            ObjectType::PowerResource => "PowerResObj",
            ObjectType::Processor => "ProcessorObj",
            ObjectType::ThermalZone => "ThermalZoneObj",
        };
        write!(f, "{name}")
    }
}

/// Fixed-width 4-character name segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameSeg([u8; 4]);

impl NameSeg {
    /// Parse one segment: 1-4 chars, lead char `A-Z` or `_`, rest
    /// alphanumeric or `_`. Lowercase input is folded to uppercase and
    /// short segments are padded with `_`.
    pub fn parse(text: &str) -> Result<NameSeg, AslError> {
        if text.is_empty() || text.len() > 4 {
            return Err(AslError::new(
                AslErrorKind::Namespace,
                "Invalid name segment",
                Some(text),
            ));
        }
        let mut seg = [b'_'; 4];
        for (i, ch) in text.bytes().enumerate() {
            let up = ch.to_ascii_uppercase();
            let valid_lead = up.is_ascii_uppercase() || up == b'_';
            let valid = valid_lead || up.is_ascii_digit();
            if (i == 0 && !valid_lead) || !valid {
                return Err(AslError::new(
                    AslErrorKind::Namespace,
                    "Invalid character in name segment",
                    Some(text),
                ));
            }
            seg[i] = up;
        }
        Ok(NameSeg(seg))
    }

    pub fn as_str(&self) -> &str {
        // Construction only admits ASCII.
        std::str::from_utf8(&self.0).unwrap_or("????")
    }

    pub fn bytes(&self) -> [u8; 4] {
        self.0
    }
}

impl fmt::Display for NameSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed namestring: optional root prefix, parent prefixes, segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePath {
    pub root: bool,
    pub carats: u8,
    pub segs: Vec<NameSeg>,
}

impl NamePath {
    pub fn parse(text: &str) -> Result<NamePath, AslError> {
        let mut rest = text;
        let root = rest.starts_with('\\');
        if root {
            rest = &rest[1..];
        }
        let mut carats = 0u8;
        while !root && rest.starts_with('^') {
            carats += 1;
            rest = &rest[1..];
        }
        let mut segs = Vec::new();
        if !rest.is_empty() {
            for part in rest.split('.') {
                segs.push(NameSeg::parse(part)?);
            }
        }
        Ok(NamePath { root, carats, segs })
    }

    pub fn is_single_seg(&self) -> bool {
        !self.root && self.carats == 0 && self.segs.len() == 1
    }

    /// Canonical rendering with padded segments, used as dedup key for
    /// external references.
    pub fn normalized(&self) -> String {
        let mut out = String::new();
        if self.root {
            out.push('\\');
        }
        for _ in 0..self.carats {
            out.push('^');
        }
        for (i, seg) in self.segs.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(seg.as_str());
        }
        out
    }
}

impl fmt::Display for NamePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized())
    }
}

/// One declared named object.
#[derive(Debug, Clone)]
pub struct NsNode {
    pub seg: NameSeg,
    pub object_type: ObjectType,
    pub parent: Option<NsId>,
    pub children: Vec<NsId>,
    /// Back-reference to the declaring parse node, absent for predefined
    /// and external names.
    pub decl: Option<NodeId>,
    /// Declared parameter count for methods.
    pub arg_count: Option<u8>,
    pub predefined: bool,
    pub external: bool,
    pub referenced: bool,
}

/// Namespace arena. The root scope is created once per compilation and is
/// the single entry point for all lookups.
pub struct Namespace {
    nodes: Vec<NsNode>,
    root: NsId,
}

/// Predefined root-level names installed at namespace creation.
struct PredefinedRootName {
    name: &'static str,
    object_type: ObjectType,
    arg_count: Option<u8>,
}

const PREDEFINED_ROOT_NAMES: &[PredefinedRootName] = &[
    PredefinedRootName { name: "_SB_", object_type: ObjectType::Scope, arg_count: None },
    PredefinedRootName { name: "_GPE", object_type: ObjectType::Scope, arg_count: None },
    PredefinedRootName { name: "_PR_", object_type: ObjectType::Scope, arg_count: None },
    PredefinedRootName { name: "_TZ_", object_type: ObjectType::Scope, arg_count: None },
    PredefinedRootName { name: "_SI_", object_type: ObjectType::Scope, arg_count: None },
    PredefinedRootName { name: "_OS_", object_type: ObjectType::String, arg_count: None },
    PredefinedRootName { name: "_REV", object_type: ObjectType::Integer, arg_count: None },
    PredefinedRootName { name: "_GL_", object_type: ObjectType::Mutex, arg_count: None },
    PredefinedRootName { name: "_OSI", object_type: ObjectType::Method, arg_count: Some(1) },
];

impl Namespace {
    pub fn new() -> Self {
        let root_node = NsNode {
            seg: NameSeg([b'_'; 4]),
            object_type: ObjectType::Scope,
            parent: None,
            children: Vec::new(),
            decl: None,
            arg_count: None,
            predefined: true,
            external: false,
            referenced: false,
        };
        let mut ns = Self {
            nodes: vec![root_node],
            root: NsId(0),
        };
        for entry in PREDEFINED_ROOT_NAMES {
            let seg = NameSeg::parse(entry.name).expect("predefined name table is well-formed");
            let id = ns.insert_child(ns.root, seg, entry.object_type, None);
            let node = ns.node_mut(id);
            node.predefined = true;
            node.arg_count = entry.arg_count;
        }
        ns
    }

    pub fn root(&self) -> NsId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NsId) -> &NsNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NsId) -> &mut NsNode {
        &mut self.nodes[id.index()]
    }

    pub fn find_child(&self, scope: NsId, seg: NameSeg) -> Option<NsId> {
        self.nodes[scope.index()]
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child.index()].seg == seg)
    }

    /// Insert a new child into `scope`. Conflict checking is the caller's
    /// responsibility.
    pub fn insert_child(
        &mut self,
        scope: NsId,
        seg: NameSeg,
        object_type: ObjectType,
        decl: Option<NodeId>,
    ) -> NsId {
        let id = NsId(self.nodes.len() as u32);
        self.nodes.push(NsNode {
            seg,
            object_type,
            parent: Some(scope),
            children: Vec::new(),
            decl,
            arg_count: None,
            predefined: false,
            external: false,
            referenced: false,
        });
        self.nodes[scope.index()].children.push(id);
        id
    }

    fn descend(&self, mut scope: NsId, segs: &[NameSeg]) -> Option<NsId> {
        for seg in segs {
            scope = self.find_child(scope, *seg)?;
        }
        Some(scope)
    }

    fn ancestor(&self, mut scope: NsId, levels: u8) -> Option<NsId> {
        for _ in 0..levels {
            scope = self.nodes[scope.index()].parent?;
        }
        Some(scope)
    }

    /// Resolve a namestring starting from `start` scope.
    ///
    /// Absolute paths descend from the root. Parent prefixes are consumed
    /// one per level first, and the remaining name is searched only at the
    /// resulting scope with no further upward search. A bare single segment
    /// follows the search-to-root rule; a multi-segment relative path
    /// anchors its first segment search-to-root, then descends exactly.
    /// A relative path with no segments at all never resolves.
    pub fn resolve(&self, start: NsId, path: &NamePath) -> Option<NsId> {
        if path.root {
            return self.descend(self.root, &path.segs);
        }
        if path.carats > 0 {
            let scope = self.ancestor(start, path.carats)?;
            return self.descend(scope, &path.segs);
        }
        match path.segs.len() {
            0 => None,
            1 => {
                let mut scope = Some(start);
                while let Some(s) = scope {
                    if let Some(found) = self.find_child(s, path.segs[0]) {
                        return Some(found);
                    }
                    scope = self.nodes[s.index()].parent;
                }
                None
            }
            _ => {
                let mut scope = Some(start);
                while let Some(s) = scope {
                    if let Some(anchor) = self.find_child(s, path.segs[0]) {
                        return self.descend(anchor, &path.segs[1..]);
                    }
                    scope = self.nodes[s.index()].parent;
                }
                None
            }
        }
    }

    /// Locate the scope a declaration path inserts into, returning the
    /// scope id and the final segment. The parent portion of the path must
    /// already exist.
    pub fn resolve_parent_scope(
        &self,
        start: NsId,
        path: &NamePath,
    ) -> Option<(NsId, NameSeg)> {
        let (last, prefix) = path.segs.split_last()?;
        let prefix_path = NamePath {
            root: path.root,
            carats: path.carats,
            segs: prefix.to_vec(),
        };
        let scope = if prefix.is_empty() && !path.root && path.carats == 0 {
            start
        } else {
            self.resolve(start, &prefix_path)?
        };
        Some((scope, *last))
    }

    /// Absolute path of a node, e.g. `\_SB_.PCI0`.
    pub fn full_path(&self, id: NsId) -> String {
        if id == self.root {
            return "\\".to_string();
        }
        let mut segs = Vec::new();
        let mut cursor = Some(id);
        while let Some(c) = cursor {
            if c == self.root {
                break;
            }
            segs.push(self.nodes[c.index()].seg);
            cursor = self.nodes[c.index()].parent;
        }
        segs.reverse();
        let mut out = String::from("\\");
        for (i, seg) in segs.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(seg.as_str());
        }
        out
    }

    /// Deterministic dump of the whole tree, used by idempotence tests.
    pub fn dump(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.index()];
            out.push(format!("{} {}", self.full_path(id), node.object_type));
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_seg_pads_and_uppercases() {
        let seg = NameSeg::parse("ab1").unwrap();
        assert_eq!(seg.as_str(), "AB1_");
        assert!(NameSeg::parse("1AB").is_err());
        assert!(NameSeg::parse("TOOLONG").is_err());
        assert!(NameSeg::parse("").is_err());
    }

    #[test]
    fn name_path_parses_prefixes() {
        let path = NamePath::parse("^^AB.CDEF").unwrap();
        assert!(!path.root);
        assert_eq!(path.carats, 2);
        assert_eq!(path.normalized(), "^^AB__.CDEF");

        let abs = NamePath::parse("\\_SB_.PCI0").unwrap();
        assert!(abs.root);
        assert_eq!(abs.normalized(), "\\_SB_.PCI0");

        let root_only = NamePath::parse("\\").unwrap();
        assert!(root_only.root);
        assert!(root_only.segs.is_empty());
    }

    #[test]
    fn predefined_root_scopes_resolve_absolutely() {
        let ns = Namespace::new();
        let path = NamePath::parse("\\_SB_").unwrap();
        let sb = ns.resolve(ns.root(), &path).unwrap();
        assert_eq!(ns.node(sb).object_type, ObjectType::Scope);
        assert!(ns.node(sb).predefined);
        assert_eq!(ns.full_path(sb), "\\_SB_");
    }

    #[test]
    fn search_to_root_finds_nearest_enclosing() {
        let mut ns = Namespace::new();
        let foo_seg = NameSeg::parse("FOO").unwrap();
        let outer = ns.insert_child(ns.root(), NameSeg::parse("OUT").unwrap(), ObjectType::Device, None);
        let inner = ns.insert_child(outer, NameSeg::parse("INN").unwrap(), ObjectType::Device, None);
        let at_root = ns.insert_child(ns.root(), foo_seg, ObjectType::Integer, None);
        let at_outer = ns.insert_child(outer, foo_seg, ObjectType::Integer, None);

        let path = NamePath::parse("FOO").unwrap();
        assert_eq!(ns.resolve(inner, &path), Some(at_outer));
        assert_eq!(ns.resolve(ns.root(), &path), Some(at_root));
    }

    #[test]
    fn carat_prefix_disables_further_upward_search() {
        let mut ns = Namespace::new();
        let a = ns.insert_child(ns.root(), NameSeg::parse("AAAA").unwrap(), ObjectType::Device, None);
        let b = ns.insert_child(a, NameSeg::parse("BBBB").unwrap(), ObjectType::Device, None);
        // FOO exists at root but not in AAAA.
        ns.insert_child(ns.root(), NameSeg::parse("FOO").unwrap(), ObjectType::Integer, None);

        // ^FOO from BBBB lands in AAAA, where FOO does not exist; the
        // remaining name must not be searched further upward.
        let path = NamePath::parse("^FOO").unwrap();
        assert_eq!(ns.resolve(b, &path), None);
    }

    #[test]
    fn empty_relative_path_never_resolves() {
        let ns = Namespace::new();
        let empty = NamePath::parse("").unwrap();
        assert_eq!(ns.resolve(ns.root(), &empty), None);

        // The bare root prefix still names the root scope.
        let root_only = NamePath::parse("\\").unwrap();
        assert_eq!(ns.resolve(ns.root(), &root_only), Some(ns.root()));
    }

    #[test]
    fn parent_scope_resolution_for_declarations() {
        let mut ns = Namespace::new();
        let sb = ns
            .resolve(ns.root(), &NamePath::parse("\\_SB_").unwrap())
            .unwrap();
        let path = NamePath::parse("\\_SB_.PCI0").unwrap();
        let (scope, seg) = ns.resolve_parent_scope(ns.root(), &path).unwrap();
        assert_eq!(scope, sb);
        assert_eq!(seg.as_str(), "PCI0");
    }
}
