// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Parse-tree interchange loader.
//!
//! The front end hands over the parse tree as a JSON document: a `files`
//! array and a `tree` of nested node objects with `op`, optional `name`,
//! `value`, location fields and `children`. Interchange errors are fatal;
//! there is nothing to recover into.

use serde_json::Value;

use crate::core::ast::{AstArena, NodeId, NodeValue, ParseOp, SourceLoc};
use crate::core::diagnostics::{AslError, AslErrorKind};

pub fn load_tree(doc: &Value) -> Result<(AstArena, NodeId), AslError> {
    let mut arena = AstArena::new();
    match doc.get("files").and_then(Value::as_array) {
        Some(files) => {
            for file in files {
                let name = file.as_str().ok_or_else(|| {
                    AslError::new(
                        AslErrorKind::Interchange,
                        "File table entries must be strings",
                        None,
                    )
                })?;
                arena.add_file(name);
            }
        }
        None => {
            arena.add_file("<input>");
        }
    }

    let tree = doc.get("tree").unwrap_or(doc);
    let root = load_node(&mut arena, tree)?;
    if arena.node(root).op != ParseOp::DefinitionBlock {
        return Err(AslError::new(
            AslErrorKind::Interchange,
            "Tree root must be a DefinitionBlock",
            None,
        ));
    }
    Ok((arena, root))
}

fn load_node(arena: &mut AstArena, value: &Value) -> Result<NodeId, AslError> {
    let obj = value.as_object().ok_or_else(|| {
        AslError::new(AslErrorKind::Interchange, "Tree node must be an object", None)
    })?;
    let op_name = obj.get("op").and_then(Value::as_str).ok_or_else(|| {
        AslError::new(AslErrorKind::Interchange, "Tree node is missing an op", None)
    })?;
    let op = parse_op(op_name).ok_or_else(|| {
        AslError::new(
            AslErrorKind::Interchange,
            "Unknown parse op in tree",
            Some(op_name),
        )
    })?;

    let loc = SourceLoc {
        file: field_u64(obj, "file") as u16,
        line: field_u64(obj, "line") as u32,
        column: field_u64(obj, "column") as u32,
        offset: field_u64(obj, "offset") as u32,
    };
    let id = arena.add_node(op, loc);

    if let Some(name) = obj.get("name").and_then(Value::as_str) {
        arena.node_mut(id).name = Some(name.to_string());
    }
    if let Some(value) = obj.get("value") {
        arena.node_mut(id).value = load_value(value, op_name)?;
    }

    if let Some(children) = obj.get("children").and_then(Value::as_array) {
        for child in children {
            let child_id = load_node(arena, child)?;
            arena.link_child(id, child_id);
        }
    }
    Ok(id)
}

fn field_u64(obj: &serde_json::Map<String, Value>, key: &str) -> u64 {
    obj.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn load_value(value: &Value, op_name: &str) -> Result<NodeValue, AslError> {
    match value {
        Value::Null => Ok(NodeValue::None),
        Value::Number(n) => n.as_u64().map(NodeValue::Integer).ok_or_else(|| {
            AslError::new(
                AslErrorKind::Interchange,
                "Node value must be an unsigned integer",
                Some(op_name),
            )
        }),
        Value::String(s) => Ok(NodeValue::String(s.clone())),
        Value::Array(items) => {
            let mut bytes = Vec::with_capacity(items.len());
            for item in items {
                let byte = item.as_u64().filter(|v| *v <= 0xFF).ok_or_else(|| {
                    AslError::new(
                        AslErrorKind::Interchange,
                        "Buffer values must be byte arrays",
                        Some(op_name),
                    )
                })?;
                bytes.push(byte as u8);
            }
            Ok(NodeValue::Buffer(bytes))
        }
        _ => Err(AslError::new(
            AslErrorKind::Interchange,
            "Unsupported node value",
            Some(op_name),
        )),
    }
}

fn parse_op(name: &str) -> Option<ParseOp> {
    if let Some(n) = name.strip_prefix("Arg") {
        if let Ok(n) = n.parse::<u8>() {
            if n <= 6 {
                return Some(ParseOp::Arg(n));
            }
        }
        return None;
    }
    if let Some(n) = name.strip_prefix("Local") {
        if let Ok(n) = n.parse::<u8>() {
            if n <= 7 {
                return Some(ParseOp::Local(n));
            }
        }
        return None;
    }
    let op = match name {
        "DefinitionBlock" => ParseOp::DefinitionBlock,
        "Scope" => ParseOp::Scope,
        "Device" => ParseOp::Device,
        "Method" => ParseOp::Method,
        "Name" => ParseOp::Name,
        "PowerResource" => ParseOp::PowerResource,
        "Processor" => ParseOp::Processor,
        "ThermalZone" => ParseOp::ThermalZone,
        "Mutex" => ParseOp::Mutex,
        "External" => ParseOp::External,
        "Zero" => ParseOp::Zero,
        "One" => ParseOp::One,
        "Ones" => ParseOp::Ones,
        "Integer" => ParseOp::Integer,
        "String" => ParseOp::StringLiteral,
        "Buffer" => ParseOp::Buffer,
        "Package" => ParseOp::Package,
        "Add" => ParseOp::Add,
        "Subtract" => ParseOp::Subtract,
        "Multiply" => ParseOp::Multiply,
        "Divide" => ParseOp::Divide,
        "Mod" => ParseOp::Mod,
        "ShiftLeft" => ParseOp::ShiftLeft,
        "ShiftRight" => ParseOp::ShiftRight,
        "And" => ParseOp::BitAnd,
        "Or" => ParseOp::BitOr,
        "Xor" => ParseOp::BitXor,
        "Not" => ParseOp::BitNot,
        "LAnd" => ParseOp::LAnd,
        "LOr" => ParseOp::LOr,
        "LNot" => ParseOp::LNot,
        "LEqual" => ParseOp::LEqual,
        "LGreater" => ParseOp::LGreater,
        "LLess" => ParseOp::LLess,
        "Store" => ParseOp::Store,
        "If" => ParseOp::If,
        "Else" => ParseOp::Else,
        "While" => ParseOp::While,
        "Return" => ParseOp::Return,
        "NamePath" => ParseOp::NamePath,
        "MethodCall" => ParseOp::MethodCall,
        "ResourceTemplate" => ParseOp::ResourceTemplate,
        "Irq" => ParseOp::RtIrq,
        "IrqNoFlags" => ParseOp::RtIrqNoFlags,
        "Dma" => ParseOp::RtDma,
        "Io" => ParseOp::RtIo,
        "FixedIo" => ParseOp::RtFixedIo,
        "Memory32" => ParseOp::RtMemory32,
        "Memory32Fixed" => ParseOp::RtMemory32Fixed,
        "VendorShort" => ParseOp::RtVendorShort,
        "WordIo" => ParseOp::RtWordIo,
        "WordBusNumber" => ParseOp::RtWordBusNumber,
        "DwordIo" => ParseOp::RtDwordIo,
        "DwordMemory" => ParseOp::RtDwordMemory,
        "QwordMemory" => ParseOp::RtQwordMemory,
        "Interrupt" => ParseOp::RtInterrupt,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loads_a_minimal_block() {
        let doc = json!({
            "files": ["main.asl"],
            "tree": {
                "op": "DefinitionBlock", "name": "DSDT", "value": 2, "line": 1,
                "children": [
                    { "op": "Name", "name": "ANSW", "line": 2,
                      "children": [ { "op": "Integer", "value": 42, "line": 2 } ] }
                ]
            }
        });
        let (arena, root) = load_tree(&doc).unwrap();
        assert_eq!(arena.node(root).op, ParseOp::DefinitionBlock);
        assert_eq!(arena.files(), &["main.asl".to_string()]);
        let name = arena.child(root, 0).unwrap();
        assert_eq!(arena.node(name).name.as_deref(), Some("ANSW"));
        let lit = arena.child(name, 0).unwrap();
        assert_eq!(arena.node(lit).value, NodeValue::Integer(42));
    }

    #[test]
    fn rejects_unknown_ops_and_bad_roots() {
        let doc = json!({ "tree": { "op": "Teleport" } });
        assert!(load_tree(&doc).is_err());

        let doc = json!({ "tree": { "op": "Scope", "name": "_SB_" } });
        assert!(load_tree(&doc).is_err());
    }

    #[test]
    fn arg_and_local_ops_parse_by_index() {
        assert_eq!(parse_op("Arg0"), Some(ParseOp::Arg(0)));
        assert_eq!(parse_op("Arg6"), Some(ParseOp::Arg(6)));
        assert_eq!(parse_op("Arg7"), None);
        assert_eq!(parse_op("Local7"), Some(ParseOp::Local(7)));
        assert_eq!(parse_op("Local8"), None);
    }
}
