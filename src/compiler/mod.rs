// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Compilation driver.
//!
//! Runs the fixed pass pipeline over one parse tree: namespace load,
//! cross-reference resolution, operand type analysis, method analysis,
//! constant folding, resource template compilation, code generation.
//! Recoverable conditions accumulate in the context; any error suppresses
//! byte emission but every pass still runs so one compile reports as much
//! as possible.

pub mod analyze;
pub mod codegen;
pub mod context;
pub mod fold;
pub mod json_input;
pub mod load;
pub mod methods;
pub mod resource;
pub mod scopes;
pub mod xref;

#[cfg(test)]
mod tests;

pub use context::{CompilationContext, CompilerOptions, ExternalRef};

use serde_json::Value;

use crate::core::ast::{AstArena, NodeId};
use crate::core::diagnostics::{AslError, CompileFailure, Diagnostic, PassCounts};

/// Result of one compilation unit. `aml` is `None` when errors were
/// reported; the diagnostics and externals are always populated.
pub struct CompileOutput {
    pub aml: Option<Vec<u8>>,
    pub externals: Vec<ExternalRef>,
    pub counts: PassCounts,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    pub fn succeeded(&self) -> bool {
        self.aml.is_some()
    }
}

/// Compile a parse tree handed over as a JSON interchange document.
/// Interchange errors are fatal and carried through `CompileFailure`.
pub fn compile_json(doc: &Value, options: CompilerOptions) -> Result<CompileOutput, CompileFailure> {
    let (mut arena, root) = json_input::load_tree(doc)
        .map_err(|err| CompileFailure::new(err, Vec::new(), Vec::new()))?;
    compile(&mut arena, root, options)
}

/// Run the full pass pipeline over an already-loaded parse tree.
pub fn compile(
    arena: &mut AstArena,
    root: NodeId,
    options: CompilerOptions,
) -> Result<CompileOutput, CompileFailure> {
    let mut ctx = CompilationContext::new(options);
    ctx.set_file_names(arena.files().to_vec());

    match run_passes(arena, root, &mut ctx) {
        Ok(aml) => {
            let counts = PassCounts {
                nodes: arena.len() as u32,
                errors: ctx.error_count(),
                warnings: ctx.warning_count(),
            };
            Ok(CompileOutput {
                aml,
                externals: ctx.take_externals(),
                counts,
                diagnostics: ctx.take_diagnostics(),
            })
        }
        Err(err) => Err(CompileFailure::new(err, ctx.take_diagnostics(), Vec::new())),
    }
}

fn run_passes(
    arena: &mut AstArena,
    root: NodeId,
    ctx: &mut CompilationContext,
) -> Result<Option<Vec<u8>>, AslError> {
    load::build_namespace(arena, root, ctx)?;
    xref::resolve_references(arena, root, ctx)?;
    analyze::propagate_types(arena, root, ctx)?;
    methods::analyze_methods(arena, root, ctx)?;
    fold::fold_constants(arena, root, ctx)?;
    resource::compile_templates(arena, root, ctx)?;

    let mut aml = None;
    if ctx.error_count() == 0 {
        let bytes = codegen::generate_aml(arena, root, ctx)?;
        // Codegen itself may report encoding errors.
        if ctx.error_count() == 0 {
            aml = Some(bytes);
        }
    }
    Ok(aml)
}
