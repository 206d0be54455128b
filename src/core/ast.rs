// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Parse-tree arena.
//!
//! One `AstNode` per source construct, owned by an `AstArena` and addressed
//! by stable `NodeId` indices. Parent/child/peer relations are index links;
//! the arena lives for the whole compilation unit. Nodes are created by the
//! external parser (or the interchange loader) and only the transformer pass
//! may rewrite them in place.

use crate::core::btype::BType;
use crate::core::namespace::NsId;

/// Stable index of a node in the parse-tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Tagged kind of a parse node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOp {
    // Declarations
    DefinitionBlock,
    Scope,
    Device,
    Method,
    Name,
    PowerResource,
    Processor,
    ThermalZone,
    Mutex,
    External,

    // Data objects
    Zero,
    One,
    Ones,
    Integer,
    StringLiteral,
    Buffer,
    Package,

    // Expression operators
    Add,
    Subtract,
    Multiply,
    Divide,
    Mod,
    ShiftLeft,
    ShiftRight,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    LAnd,
    LOr,
    LNot,
    LEqual,
    LGreater,
    LLess,
    Store,

    // Control flow
    If,
    Else,
    While,
    Return,

    // References
    NamePath,
    MethodCall,
    Arg(u8),
    Local(u8),

    // Resource template and descriptor macros
    ResourceTemplate,
    RtIrq,
    RtIrqNoFlags,
    RtDma,
    RtIo,
    RtFixedIo,
    RtMemory32,
    RtMemory32Fixed,
    RtVendorShort,
    RtWordIo,
    RtWordBusNumber,
    RtDwordIo,
    RtDwordMemory,
    RtQwordMemory,
    RtInterrupt,
}

impl ParseOp {
    /// Ops that open a new namespace scope for their body.
    pub fn opens_scope(self) -> bool {
        matches!(
            self,
            ParseOp::DefinitionBlock
                | ParseOp::Scope
                | ParseOp::Device
                | ParseOp::Method
                | ParseOp::PowerResource
                | ParseOp::Processor
                | ParseOp::ThermalZone
        )
    }

    /// Ops that declare a named object in the enclosing scope.
    pub fn declares_name(self) -> bool {
        matches!(
            self,
            ParseOp::Scope
                | ParseOp::Device
                | ParseOp::Method
                | ParseOp::Name
                | ParseOp::PowerResource
                | ParseOp::Processor
                | ParseOp::ThermalZone
                | ParseOp::Mutex
                | ParseOp::External
        )
    }

    /// Integer literal ops, including the single-byte constant forms.
    pub fn is_integer_literal(self) -> bool {
        matches!(
            self,
            ParseOp::Zero | ParseOp::One | ParseOp::Ones | ParseOp::Integer
        )
    }

    /// Resource descriptor macro ops.
    pub fn is_resource_macro(self) -> bool {
        matches!(
            self,
            ParseOp::RtIrq
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
                | ParseOp::RtInterrupt
        )
    }
}

/// Optional literal payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValue {
    None,
    Integer(u64),
    String(String),
    Buffer(Vec<u8>),
}

impl NodeValue {
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            NodeValue::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

/// Source position of a node. `file` indexes the arena's file table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLoc {
    pub file: u16,
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

/// One parse-tree node.
#[derive(Debug, Clone)]
pub struct AstNode {
    pub op: ParseOp,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub next_peer: Option<NodeId>,
    pub loc: SourceLoc,
    /// Source namestring for declaring/referencing ops.
    pub name: Option<String>,
    pub value: NodeValue,
    pub btype: BType,
    /// Weak back-reference to the declared/resolved namespace node.
    pub ns_node: Option<NsId>,
    /// Total AML bytes for this node including children (codegen).
    pub subtree_length: u32,
    /// AML bytes owned by this node excluding children (codegen).
    pub aml_length: u32,
    /// Width of the package-length field, 0 when the op has none.
    pub pkg_len_bytes: u8,
    /// Set on nodes created by the transformer rather than the parser.
    pub synthesized: bool,
}

impl AstNode {
    fn new(op: ParseOp, loc: SourceLoc) -> Self {
        Self {
            op,
            parent: None,
            first_child: None,
            last_child: None,
            next_peer: None,
            loc,
            name: None,
            value: NodeValue::None,
            btype: BType::NONE,
            ns_node: None,
            subtree_length: 0,
            aml_length: 0,
            pkg_len_bytes: 0,
            synthesized: false,
        }
    }

    pub fn integer_value(&self) -> Option<u64> {
        if self.op.is_integer_literal() {
            self.value.as_integer()
        } else {
            None
        }
    }
}

/// Arena owning all parse nodes of one compilation unit.
pub struct AstArena {
    nodes: Vec<AstNode>,
    files: Vec<String>,
}

impl AstArena {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_file(&mut self, name: impl Into<String>) -> u16 {
        self.files.push(name.into());
        (self.files.len() - 1) as u16
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn add_node(&mut self, op: ParseOp, loc: SourceLoc) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(AstNode::new(op, loc));
        id
    }

    /// Iterate all node ids in creation order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    pub fn node(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut AstNode {
        &mut self.nodes[id.index()]
    }

    /// Append `child` as the last child of `parent`.
    pub fn link_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        match self.nodes[parent.index()].last_child {
            Some(last) => {
                self.nodes[last.index()].next_peer = Some(child);
                self.nodes[parent.index()].last_child = Some(child);
            }
            None => {
                self.nodes[parent.index()].first_child = Some(child);
                self.nodes[parent.index()].last_child = Some(child);
            }
        }
    }

    /// Collect the ordered children of a node.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.nodes[id.index()].first_child;
        while let Some(child) = cursor {
            out.push(child);
            cursor = self.nodes[child.index()].next_peer;
        }
        out
    }

    pub fn child(&self, id: NodeId, n: usize) -> Option<NodeId> {
        let mut cursor = self.nodes[id.index()].first_child;
        let mut idx = 0;
        while let Some(child) = cursor {
            if idx == n {
                return Some(child);
            }
            idx += 1;
            cursor = self.nodes[child.index()].next_peer;
        }
        None
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        let mut count = 0;
        let mut cursor = self.nodes[id.index()].first_child;
        while let Some(child) = cursor {
            count += 1;
            cursor = self.nodes[child.index()].next_peer;
        }
        count
    }

    /// Rewrite a node into an integer literal, detaching its children.
    ///
    /// Values 0, 1 and the all-ones value for the given width canonicalize
    /// to the dedicated single-byte constant ops.
    pub fn replace_with_integer(&mut self, id: NodeId, value: u64, width_mask: u64) {
        let node = &mut self.nodes[id.index()];
        node.op = if value == 0 {
            ParseOp::Zero
        } else if value == 1 {
            ParseOp::One
        } else if value == width_mask {
            ParseOp::Ones
        } else {
            ParseOp::Integer
        };
        node.value = NodeValue::Integer(value);
        node.name = None;
        node.first_child = None;
        node.last_child = None;
        node.btype = BType::INTEGER;
        node.synthesized = true;
    }
}

impl Default for AstArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Incremental tree constructor used by tests and the interchange loader.
pub struct TreeBuilder {
    arena: AstArena,
    stack: Vec<NodeId>,
    root: Option<NodeId>,
    line: u32,
}

impl TreeBuilder {
    pub fn new() -> Self {
        let mut arena = AstArena::new();
        arena.add_file("<builder>");
        Self {
            arena,
            stack: Vec::new(),
            root: None,
            line: 0,
        }
    }

    fn attach(&mut self, id: NodeId) {
        if let Some(&parent) = self.stack.last() {
            self.arena.link_child(parent, id);
        } else if self.root.is_none() {
            self.root = Some(id);
        }
    }

    /// Open a node; subsequent nodes become its children until `end`.
    pub fn begin(&mut self, op: ParseOp) -> NodeId {
        self.line += 1;
        let loc = SourceLoc {
            line: self.line,
            ..SourceLoc::default()
        };
        let id = self.arena.add_node(op, loc);
        self.attach(id);
        self.stack.push(id);
        id
    }

    pub fn begin_named(&mut self, op: ParseOp, name: &str) -> NodeId {
        let id = self.begin(op);
        self.arena.node_mut(id).name = Some(name.to_string());
        id
    }

    pub fn end(&mut self) {
        self.stack.pop();
    }

    pub fn leaf(&mut self, op: ParseOp) -> NodeId {
        let id = self.begin(op);
        self.end();
        id
    }

    pub fn leaf_named(&mut self, op: ParseOp, name: &str) -> NodeId {
        let id = self.begin_named(op, name);
        self.end();
        id
    }

    pub fn int(&mut self, value: u64) -> NodeId {
        let id = self.leaf(ParseOp::Integer);
        self.arena.node_mut(id).value = NodeValue::Integer(value);
        id
    }

    pub fn set_value(&mut self, id: NodeId, value: NodeValue) {
        self.arena.node_mut(id).value = value;
    }

    pub fn arena_mut(&mut self) -> &mut AstArena {
        &mut self.arena
    }

    pub fn finish(self) -> (AstArena, NodeId) {
        let root = self.root.expect("tree builder produced no root node");
        (self.arena, root)
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_preserve_declaration_order() {
        let mut arena = AstArena::new();
        let root = arena.add_node(ParseOp::Scope, SourceLoc::default());
        let a = arena.add_node(ParseOp::Zero, SourceLoc::default());
        let b = arena.add_node(ParseOp::One, SourceLoc::default());
        let c = arena.add_node(ParseOp::Ones, SourceLoc::default());
        arena.link_child(root, a);
        arena.link_child(root, b);
        arena.link_child(root, c);
        assert_eq!(arena.children(root), vec![a, b, c]);
        assert_eq!(arena.child(root, 1), Some(b));
        assert_eq!(arena.child(root, 3), None);
    }

    #[test]
    fn replace_with_integer_detaches_children_and_canonicalizes() {
        let mut t = TreeBuilder::new();
        let add = t.begin(ParseOp::Add);
        t.int(0);
        t.int(1);
        t.end();
        let (mut arena, _) = t.finish();
        arena.replace_with_integer(add, 1, u64::MAX);
        let node = arena.node(add);
        assert_eq!(node.op, ParseOp::One);
        assert_eq!(node.value, NodeValue::Integer(1));
        assert!(node.first_child.is_none());

        arena.replace_with_integer(add, u64::MAX, u64::MAX);
        assert_eq!(arena.node(add).op, ParseOp::Ones);
    }
}
