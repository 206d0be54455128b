// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Pass pipeline tests: namespace idempotence, folding, resource
//! descriptors, method analysis, and byte-exact code generation.

use proptest::prelude::*;

use crate::compiler::context::{CompilationContext, CompilerOptions};
use crate::compiler::{compile, load, resource, xref, CompileOutput};
use crate::core::ast::{AstArena, NodeId, NodeValue, ParseOp, TreeBuilder};
use crate::core::diagnostics::Severity;
use crate::core::namespace::ObjectType;
use crate::core::opcodes::{decode_pkg_length, encode_pkg_length, pkg_length_width};

fn block(build: impl FnOnce(&mut TreeBuilder)) -> (AstArena, NodeId) {
    let mut t = TreeBuilder::new();
    let root = t.begin_named(ParseOp::DefinitionBlock, "DSDT");
    t.set_value(root, NodeValue::Integer(2));
    build(&mut t);
    t.end();
    t.finish()
}

fn compile_block(build: impl FnOnce(&mut TreeBuilder)) -> CompileOutput {
    let (mut arena, root) = block(build);
    compile(&mut arena, root, CompilerOptions::default()).expect("pipeline runs")
}

fn method(t: &mut TreeBuilder, name: &str, body: impl FnOnce(&mut TreeBuilder)) {
    let m = t.begin_named(ParseOp::Method, name);
    t.set_value(m, NodeValue::Integer(0));
    body(t);
    t.end();
}

#[test]
fn load_and_xref_are_idempotent() {
    let (mut arena, root) = block(|t| {
        t.begin_named(ParseOp::Device, "PCI0");
        t.begin_named(ParseOp::Name, "_HID");
        t.int(0x0A03);
        t.end();
        t.end();
        method(t, "CHCK", |t| {
            t.begin(ParseOp::Return);
            t.leaf_named(ParseOp::NamePath, "PCI0");
            t.end();
        });
    });

    let mut ctx = CompilationContext::new(CompilerOptions::default());
    load::build_namespace(&mut arena, root, &mut ctx).unwrap();
    xref::resolve_references(&mut arena, root, &mut ctx).unwrap();
    let first_dump = ctx.namespace.dump();
    let first_externals = ctx.externals().len();
    let first_errors = ctx.error_count();

    load::build_namespace(&mut arena, root, &mut ctx).unwrap();
    xref::resolve_references(&mut arena, root, &mut ctx).unwrap();
    assert_eq!(ctx.namespace.dump(), first_dump);
    assert_eq!(ctx.externals().len(), first_externals);
    assert_eq!(ctx.error_count(), first_errors);
}

#[test]
fn duplicate_names_keep_the_first_definition() {
    let output = compile_block(|t| {
        t.begin_named(ParseOp::Device, "PCI0");
        t.end();
        t.begin_named(ParseOp::Device, "PCI0");
        t.end();
    });
    assert!(!output.succeeded());
    assert_eq!(output.counts.errors, 1);
    let diag = &output.diagnostics[0];
    assert!(diag.message().contains("Name already exists"));
    assert!(diag.notes()[0].contains("first defined at line"));
}

#[test]
fn bare_segment_searches_to_root() {
    let (mut arena, root) = block(|t| {
        t.begin_named(ParseOp::Name, "FLAG");
        t.int(1);
        t.end();
        t.begin_named(ParseOp::Device, "OUTR");
        t.begin_named(ParseOp::Device, "INNR");
        method(t, "USEF", |t| {
            t.begin(ParseOp::Return);
            t.leaf_named(ParseOp::NamePath, "FLAG");
            t.end();
        });
        t.end();
        t.end();
    });

    let mut ctx = CompilationContext::new(CompilerOptions::default());
    load::build_namespace(&mut arena, root, &mut ctx).unwrap();
    xref::resolve_references(&mut arena, root, &mut ctx).unwrap();
    assert_eq!(ctx.error_count(), 0);
    assert!(ctx.externals().is_empty());

    let resolved = arena
        .node_ids()
        .find(|id| arena.node(*id).op == ParseOp::NamePath)
        .and_then(|id| arena.node(id).ns_node)
        .expect("reference resolved");
    assert_eq!(ctx.namespace.full_path(resolved), "\\FLAG");
}

#[test]
fn unresolved_method_calls_coalesce_into_one_external() {
    let output = compile_block(|t| {
        method(t, "MAIN", |t| {
            t.begin_named(ParseOp::MethodCall, "XDSM");
            t.int(1);
            t.int(2);
            t.end();
            t.begin_named(ParseOp::MethodCall, "XDSM");
            t.int(3);
            t.int(4);
            t.end();
        });
    });
    assert!(output.succeeded());
    assert_eq!(output.externals.len(), 1);
    let ext = &output.externals[0];
    assert_eq!(ext.path, "XDSM");
    assert_eq!(ext.object_type, ObjectType::Method);
    assert_eq!(ext.arg_count, Some(2));
}

#[test]
fn calling_a_non_method_is_an_error() {
    let output = compile_block(|t| {
        t.begin_named(ParseOp::Name, "DATA");
        t.int(5);
        t.end();
        method(t, "MAIN", |t| {
            t.begin_named(ParseOp::MethodCall, "DATA");
            t.end();
        });
    });
    assert!(!output.succeeded());
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.message().contains("not a method")));
}

#[test]
fn call_arity_is_checked_against_the_declaration() {
    let output = compile_block(|t| {
        let m = t.begin_named(ParseOp::Method, "TWOA");
        t.set_value(m, NodeValue::Integer(2));
        t.end();
        method(t, "MAIN", |t| {
            t.begin_named(ParseOp::MethodCall, "TWOA");
            t.int(1);
            t.end();
        });
    });
    assert!(!output.succeeded());
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.message().contains("passes 1 arguments, method declares 2")));
}

#[test]
fn operand_type_mismatch_is_reported_once_per_operand() {
    let output = compile_block(|t| {
        method(t, "MAIN", |t| {
            t.begin(ParseOp::Return);
            t.begin(ParseOp::Add);
            t.begin(ParseOp::Package);
            t.int(1);
            t.end();
            t.int(1);
            t.end();
            t.end();
        });
    });
    assert!(!output.succeeded());
    let mismatches: Vec<_> = output
        .diagnostics
        .iter()
        .filter(|d| d.message().contains("Invalid operand type"))
        .collect();
    assert_eq!(mismatches.len(), 1);
    assert!(mismatches[0].message().contains("AddOp"));
}

#[test]
fn string_operands_convert_implicitly_in_arithmetic() {
    let output = compile_block(|t| {
        method(t, "MAIN", |t| {
            t.begin(ParseOp::Return);
            t.begin(ParseOp::Add);
            let s = t.leaf(ParseOp::StringLiteral);
            t.set_value(s, NodeValue::String("4".into()));
            t.int(1);
            t.end();
            t.end();
        });
    });
    assert_eq!(output.counts.errors, 0);
    assert!(output.succeeded());
}

#[test]
fn folding_is_idempotent_and_confluent() {
    let (mut arena, root) = block(|t| {
        method(t, "MAIN", |t| {
            t.begin(ParseOp::Return);
            t.begin(ParseOp::Add);
            t.begin(ParseOp::Add);
            t.int(1);
            t.int(2);
            t.end();
            t.int(3);
            t.end();
            t.end();
        });
    });
    let mut ctx = CompilationContext::new(CompilerOptions::default());
    load::build_namespace(&mut arena, root, &mut ctx).unwrap();
    xref::resolve_references(&mut arena, root, &mut ctx).unwrap();
    crate::compiler::analyze::propagate_types(&mut arena, root, &mut ctx).unwrap();
    crate::compiler::fold::fold_constants(&mut arena, root, &mut ctx).unwrap();

    let method_node = arena.child(root, 0).unwrap();
    let ret = arena.child(method_node, 0).unwrap();
    let folded = arena.child(ret, 0).unwrap();
    assert_eq!(arena.node(folded).op, ParseOp::Integer);
    assert_eq!(arena.node(folded).value, NodeValue::Integer(6));
    assert!(arena.node(folded).synthesized);

    crate::compiler::fold::fold_constants(&mut arena, root, &mut ctx).unwrap();
    assert_eq!(arena.node(folded).op, ParseOp::Integer);
    assert_eq!(arena.node(folded).value, NodeValue::Integer(6));
    assert_eq!(ctx.error_count(), 0);
}

#[test]
fn folded_constants_canonicalize_and_division_by_zero_errors() {
    let output = compile_block(|t| {
        method(t, "MAIN", |t| {
            t.begin(ParseOp::Return);
            t.begin(ParseOp::Divide);
            t.int(4);
            t.int(0);
            t.end();
            t.end();
        });
    });
    assert!(!output.succeeded());
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.message().contains("Divide by zero")));

    let (mut arena, root) = block(|t| {
        method(t, "MAIN", |t| {
            t.begin(ParseOp::Return);
            t.begin(ParseOp::Subtract);
            t.int(3);
            t.int(2);
            t.end();
            t.end();
        });
    });
    let mut ctx = CompilationContext::new(CompilerOptions::default());
    crate::compiler::fold::fold_constants(&mut arena, root, &mut ctx).unwrap();
    let method_node = arena.child(root, 0).unwrap();
    let ret = arena.child(method_node, 0).unwrap();
    let folded = arena.child(ret, 0).unwrap();
    // 1 folds to the dedicated single-byte constant op.
    assert_eq!(arena.node(folded).op, ParseOp::One);
}

#[test]
fn value_returning_method_must_return_on_every_path() {
    let output = compile_block(|t| {
        method(t, "MAIN", |t| {
            t.begin(ParseOp::If);
            t.int(1);
            t.begin(ParseOp::Return);
            t.int(1);
            t.end();
            t.end();
        });
    });
    assert!(!output.succeeded());
    let failures: Vec<_> = output
        .diagnostics
        .iter()
        .filter(|d| d.message().contains("return a value on all control paths"))
        .collect();
    assert_eq!(failures.len(), 1);
}

#[test]
fn terminal_if_else_with_returns_is_complete() {
    let output = compile_block(|t| {
        method(t, "MAIN", |t| {
            t.begin(ParseOp::If);
            t.int(1);
            t.begin(ParseOp::Return);
            t.int(1);
            t.end();
            t.end();
            t.begin(ParseOp::Else);
            t.begin(ParseOp::Return);
            t.int(2);
            t.end();
            t.end();
        });
    });
    assert!(output.succeeded(), "diagnostics: {:?}", output.diagnostics);
}

#[test]
fn reserved_method_arity_is_enforced() {
    let output = compile_block(|t| {
        t.begin_named(ParseOp::Device, "PCI0");
        let m = t.begin_named(ParseOp::Method, "_STA");
        t.set_value(m, NodeValue::Integer(1));
        t.begin(ParseOp::Return);
        t.int(0x0F);
        t.end();
        t.end();
        t.end();
    });
    assert!(!output.succeeded());
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.message().contains("has 1 arguments, should have 0")));
}

#[test]
fn unknown_reserved_names_warn() {
    let output = compile_block(|t| {
        method(t, "_XYZ", |_| {});
    });
    assert!(output.succeeded());
    assert_eq!(output.counts.warnings, 1);
    assert!(output.diagnostics[0]
        .message()
        .contains("Unknown reserved name"));
}

fn word_io_template(t: &mut TreeBuilder, max: u64, length: u64) -> NodeId {
    t.begin_named(ParseOp::Name, "_CRS");
    t.begin(ParseOp::ResourceTemplate);
    t.begin(ParseOp::RtWordIo);
    t.int(1); // MinFixed
    t.int(1); // MaxFixed
    t.int(0); // Decode
    t.int(0xFFF);
    t.int(0x1000);
    let max_node = t.int(max);
    t.int(0);
    t.int(length);
    t.end();
    t.end();
    t.end();
    max_node
}

#[test]
fn word_descriptor_derives_length_from_fixed_endpoints() {
    let (mut arena, root) = block(|t| {
        word_io_template(t, 0x1FFF, 0);
    });
    let mut ctx = CompilationContext::new(CompilerOptions::default());
    load::build_namespace(&mut arena, root, &mut ctx).unwrap();
    resource::compile_templates(&mut arena, root, &mut ctx).unwrap();
    assert_eq!(ctx.error_count(), 0);

    let name = arena.child(root, 0).unwrap();
    let buffer = arena.child(name, 0).unwrap();
    assert_eq!(arena.node(buffer).op, ParseOp::Buffer);
    let NodeValue::Buffer(bytes) = &arena.node(buffer).value else {
        panic!("template did not lower to a buffer");
    };
    assert_eq!(
        bytes,
        &vec![
            0x88, 0x0D, 0x00, // WordAddressSpace, body length 13
            0x01, // IO range
            0x0C, // MinFixed | MaxFixed
            0x03, // entire range
            0xFF, 0x0F, // granularity
            0x00, 0x10, // minimum
            0xFF, 0x1F, // maximum
            0x00, 0x00, // translation
            0x00, 0x10, // derived length 0x1000
            0x79, 0x00, // end tag
        ]
    );
}

#[test]
fn word_descriptor_with_max_below_min_blames_the_maximum() {
    let mut max_node = None;
    let (mut arena, root) = block(|t| {
        max_node = Some(word_io_template(t, 0x0FFF, 0));
    });
    let max_line = arena.node(max_node.unwrap()).loc.line;
    let mut ctx = CompilationContext::new(CompilerOptions::default());
    load::build_namespace(&mut arena, root, &mut ctx).unwrap();
    resource::compile_templates(&mut arena, root, &mut ctx).unwrap();

    let errors: Vec<_> = ctx
        .diagnostics()
        .iter()
        .filter(|d| d.severity() == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message().contains("Maximum is less than"));
    assert_eq!(errors[0].line(), max_line);
}

#[test]
fn irq_descriptor_packs_mask_and_flags() {
    let (mut arena, root) = block(|t| {
        t.begin_named(ParseOp::Name, "_CRS");
        t.begin(ParseOp::ResourceTemplate);
        t.begin(ParseOp::RtIrq);
        t.int(1); // edge
        t.int(0); // active high
        t.int(0); // exclusive
        t.int(5);
        t.int(10);
        t.end();
        t.end();
        t.end();
    });
    let mut ctx = CompilationContext::new(CompilerOptions::default());
    load::build_namespace(&mut arena, root, &mut ctx).unwrap();
    resource::compile_templates(&mut arena, root, &mut ctx).unwrap();
    assert_eq!(ctx.error_count(), 0);

    let name = arena.child(root, 0).unwrap();
    let buffer = arena.child(name, 0).unwrap();
    let NodeValue::Buffer(bytes) = &arena.node(buffer).value else {
        panic!("template did not lower to a buffer");
    };
    assert_eq!(bytes, &vec![0x23, 0x20, 0x04, 0x01, 0x79, 0x00]);
}

#[test]
fn vendor_short_descriptor_carries_raw_bytes() {
    let (mut arena, root) = block(|t| {
        t.begin_named(ParseOp::Name, "_CRS");
        t.begin(ParseOp::ResourceTemplate);
        t.begin(ParseOp::RtVendorShort);
        t.int(0xDE);
        t.int(0xAD);
        t.end();
        t.end();
        t.end();
    });
    let mut ctx = CompilationContext::new(CompilerOptions::default());
    load::build_namespace(&mut arena, root, &mut ctx).unwrap();
    resource::compile_templates(&mut arena, root, &mut ctx).unwrap();
    assert_eq!(ctx.error_count(), 0);

    let name = arena.child(root, 0).unwrap();
    let buffer = arena.child(name, 0).unwrap();
    let NodeValue::Buffer(bytes) = &arena.node(buffer).value else {
        panic!("template did not lower to a buffer");
    };
    assert_eq!(bytes, &vec![0x72, 0xDE, 0xAD, 0x79, 0x00]);
}

#[test]
fn oversized_interrupt_list_reports_and_clamps_the_count() {
    let (mut arena, root) = block(|t| {
        t.begin_named(ParseOp::Name, "_CRS");
        t.begin(ParseOp::ResourceTemplate);
        t.begin(ParseOp::RtInterrupt);
        t.int(0);
        t.int(0);
        t.int(0);
        t.int(0);
        for n in 0..300u64 {
            t.int(n);
        }
        t.end();
        t.end();
        t.end();
    });
    let mut ctx = CompilationContext::new(CompilerOptions::default());
    load::build_namespace(&mut arena, root, &mut ctx).unwrap();
    resource::compile_templates(&mut arena, root, &mut ctx).unwrap();
    assert_eq!(ctx.error_count(), 1);
    assert!(ctx
        .diagnostics()
        .iter()
        .any(|d| d.message().contains("Interrupt count does not fit in 8 bits")));

    let name = arena.child(root, 0).unwrap();
    let buffer = arena.child(name, 0).unwrap();
    let NodeValue::Buffer(bytes) = &arena.node(buffer).value else {
        panic!("template did not lower to a buffer");
    };
    // Tag, body length, flags byte, then the clamped count.
    assert_eq!(bytes[0], 0x89);
    assert_eq!(bytes[4], 255);
}

#[test]
fn oversized_package_reports_and_suppresses_emission() {
    let output = compile_block(|t| {
        t.begin_named(ParseOp::Name, "BIGP");
        t.begin(ParseOp::Package);
        for _ in 0..300 {
            t.int(1);
        }
        t.end();
        t.end();
    });
    assert!(!output.succeeded());
    assert_eq!(output.counts.errors, 1);
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.message().contains("Package element count does not fit in 8 bits")));
}

#[test]
fn out_of_range_interrupt_number_is_rejected() {
    let (mut arena, root) = block(|t| {
        t.begin_named(ParseOp::Name, "_CRS");
        t.begin(ParseOp::ResourceTemplate);
        t.begin(ParseOp::RtIrqNoFlags);
        t.int(16);
        t.end();
        t.end();
        t.end();
    });
    let mut ctx = CompilationContext::new(CompilerOptions::default());
    load::build_namespace(&mut arena, root, &mut ctx).unwrap();
    resource::compile_templates(&mut arena, root, &mut ctx).unwrap();
    assert_eq!(ctx.error_count(), 1);
    assert!(ctx.diagnostics()[0]
        .message()
        .contains("Invalid interrupt number"));
}

#[test]
fn end_to_end_method_block_is_byte_exact() {
    let output = compile_block(|t| {
        method(t, "MAIN", |t| {
            t.begin(ParseOp::Return);
            t.begin(ParseOp::Add);
            t.int(2);
            t.int(2);
            t.end();
            t.end();
        });
    });
    assert!(output.succeeded(), "diagnostics: {:?}", output.diagnostics);
    let aml = output.aml.unwrap();
    assert_eq!(aml.len(), 46);

    // 36-byte table header.
    assert_eq!(&aml[0..4], b"DSDT");
    assert_eq!(u32::from_le_bytes([aml[4], aml[5], aml[6], aml[7]]), 46);
    assert_eq!(aml[8], 2);
    let sum = aml.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    assert_eq!(sum, 0);

    // MethodOp, PkgLength 9, "MAIN", flags 0, ReturnOp, BytePrefix 4.
    assert_eq!(
        &aml[36..],
        &[0x14, 0x09, b'M', b'A', b'I', b'N', 0x00, 0xA4, 0x0A, 0x04]
    );
}

#[test]
fn errors_suppress_emission_but_warnings_do_not() {
    let failing = compile_block(|t| {
        t.begin_named(ParseOp::Device, "DUP0");
        t.end();
        t.begin_named(ParseOp::Device, "DUP0");
        t.end();
    });
    assert!(failing.aml.is_none());

    let warning_only = compile_block(|t| {
        method(t, "_XYZ", |_| {});
    });
    assert!(warning_only.aml.is_some());
    assert_eq!(warning_only.counts.warnings, 1);
}

#[test]
fn package_lengths_grow_nested_scopes_consistently() {
    // 16 nested devices are enough to force multi-byte package lengths on
    // the outer scopes while the innermost stays at one byte.
    let output = compile_block(|t| {
        let mut names = Vec::new();
        for i in 0..16 {
            names.push(format!("D{i:03}"));
        }
        for name in &names {
            t.begin_named(ParseOp::Device, name);
            t.begin_named(ParseOp::Name, "BUFX");
            let b = t.begin(ParseOp::Buffer);
            t.set_value(b, NodeValue::Buffer(vec![0xAB; 16]));
            t.end();
            t.end();
        }
        for _ in &names {
            t.end();
        }
    });
    assert!(output.succeeded(), "diagnostics: {:?}", output.diagnostics);
    let aml = output.aml.unwrap();
    assert_eq!(
        u32::from_le_bytes([aml[4], aml[5], aml[6], aml[7]]) as usize,
        aml.len()
    );

    // Outermost device carries a 2-byte package length.
    assert_eq!(aml[36], 0x5B);
    assert_eq!(aml[37], 0x82);
    assert_eq!(aml[38] >> 6, 1);
}

proptest! {
    #[test]
    fn pkg_length_encoding_round_trips(payload in 0u32..0x0FFF_FFB0) {
        let width = pkg_length_width(payload).unwrap();
        let total = payload + width as u32;
        let bytes = encode_pkg_length(total, width);
        prop_assert_eq!(bytes.len(), width as usize);
        prop_assert_eq!(decode_pkg_length(&bytes), Some((total, width)));
    }

    #[test]
    fn pkg_length_width_is_monotonic(payload in 0u32..0x0FFF_FF00) {
        let w1 = pkg_length_width(payload).unwrap();
        let w2 = pkg_length_width(payload + 1).unwrap();
        prop_assert!(w2 >= w1);
    }
}
