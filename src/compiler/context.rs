// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Compilation context threaded through every pass.
//!
//! Owns the namespace, the diagnostic log, the external-reference table,
//! and the per-unit options. The driver creates one context per compilation
//! unit and passes it by reference; no compiler state is global.

use crate::core::ast::SourceLoc;
use crate::core::diagnostics::{AslError, AslErrorKind, Diagnostic, Severity, SeverityOverrides};
use crate::core::namespace::{Namespace, ObjectType};

/// Per-unit configuration assembled by the caller (CLI or embedder).
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Definition-block revision; revision >= 2 selects 64-bit integers.
    pub table_revision: u8,
    pub severity_overrides: SeverityOverrides,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            table_revision: 2,
            severity_overrides: SeverityOverrides::new(),
        }
    }
}

/// A name used but not declared in the compiled source, recorded for
/// emission as an External declaration downstream.
#[derive(Debug, Clone)]
pub struct ExternalRef {
    /// Normalized source path, the dedup key together with the type.
    pub path: String,
    pub object_type: ObjectType,
    /// Call-site arity when the reference implies a method.
    pub arg_count: Option<u8>,
    pub loc: SourceLoc,
}

pub struct CompilationContext {
    pub namespace: Namespace,
    pub options: CompilerOptions,
    externals: Vec<ExternalRef>,
    diagnostics: Vec<Diagnostic>,
    file_names: Vec<String>,
    errors: u32,
    warnings: u32,
}

impl CompilationContext {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            namespace: Namespace::new(),
            options,
            externals: Vec::new(),
            diagnostics: Vec::new(),
            file_names: Vec::new(),
            errors: 0,
            warnings: 0,
        }
    }

    pub fn set_file_names(&mut self, names: Vec<String>) {
        self.file_names = names;
    }

    pub fn integer_width_64(&self) -> bool {
        self.options.table_revision >= 2
    }

    /// All-ones mask at the table's integer width.
    pub fn integer_width_mask(&self) -> u64 {
        if self.integer_width_64() {
            u64::MAX
        } else {
            u32::MAX as u64
        }
    }

    /// Record a diagnostic, applying severity overrides. The condition is
    /// always recorded; suppression only affects counting and rendering.
    pub fn diag(&mut self, severity: Severity, error: AslError, loc: SourceLoc) {
        self.diag_with_note(severity, error, loc, None);
    }

    pub fn diag_with_note(
        &mut self,
        severity: Severity,
        error: AslError,
        loc: SourceLoc,
        note: Option<String>,
    ) {
        let mut diag = Diagnostic::new(loc.line, severity, error)
            .with_column(if loc.column > 0 {
                Some(loc.column as usize)
            } else {
                None
            })
            .with_file(self.file_names.get(loc.file as usize).cloned());
        if let Some(note) = note {
            diag = diag.with_note(note);
        }
        let (effective, suppressed) = self
            .options
            .severity_overrides
            .apply(diag.code(), severity);
        diag.severity = effective;
        diag.suppressed = suppressed;
        if !suppressed {
            match effective {
                Severity::Error => self.errors += 1,
                Severity::Warning => self.warnings += 1,
                Severity::Remark => {}
            }
        }
        self.diagnostics.push(diag);
    }

    pub fn error(&mut self, kind: AslErrorKind, msg: &str, param: Option<&str>, loc: SourceLoc) {
        self.diag(Severity::Error, AslError::new(kind, msg, param), loc);
    }

    pub fn warning(&mut self, kind: AslErrorKind, msg: &str, param: Option<&str>, loc: SourceLoc) {
        self.diag(Severity::Warning, AslError::new(kind, msg, param), loc);
    }

    pub fn remark(&mut self, kind: AslErrorKind, msg: &str, param: Option<&str>, loc: SourceLoc) {
        self.diag(Severity::Remark, AslError::new(kind, msg, param), loc);
    }

    pub fn error_count(&self) -> u32 {
        self.errors
    }

    pub fn warning_count(&self) -> u32 {
        self.warnings
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Record an unresolved reference, coalescing duplicates of the same
    /// normalized path and inferred type.
    pub fn add_external(
        &mut self,
        path: String,
        object_type: ObjectType,
        arg_count: Option<u8>,
        loc: SourceLoc,
    ) {
        if let Some(existing) = self
            .externals
            .iter_mut()
            .find(|e| e.path == path && e.object_type == object_type)
        {
            // Keep the widest observed arity.
            if existing.arg_count < arg_count {
                existing.arg_count = arg_count;
            }
            return;
        }
        self.externals.push(ExternalRef {
            path,
            object_type,
            arg_count,
            loc,
        });
    }

    pub fn externals(&self) -> &[ExternalRef] {
        &self.externals
    }

    pub fn take_externals(&mut self) -> Vec<ExternalRef> {
        std::mem::take(&mut self.externals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_references_coalesce_by_path_and_type() {
        let mut ctx = CompilationContext::new(CompilerOptions::default());
        let loc = SourceLoc::default();
        ctx.add_external("\\FOO_".into(), ObjectType::Method, Some(1), loc);
        ctx.add_external("\\FOO_".into(), ObjectType::Method, Some(2), loc);
        ctx.add_external("\\FOO_".into(), ObjectType::Unknown, None, loc);
        assert_eq!(ctx.externals().len(), 2);
        assert_eq!(ctx.externals()[0].arg_count, Some(2));
    }

    #[test]
    fn suppressed_diagnostics_do_not_count() {
        let mut options = CompilerOptions::default();
        options.severity_overrides.suppress("asl301");
        let mut ctx = CompilationContext::new(options);
        ctx.error(AslErrorKind::Type, "mismatch", None, SourceLoc::default());
        assert_eq!(ctx.error_count(), 0);
        assert_eq!(ctx.diagnostics().len(), 1);
        assert!(ctx.diagnostics()[0].is_suppressed());
    }

    #[test]
    fn revision_selects_integer_width() {
        let mut options = CompilerOptions::default();
        options.table_revision = 1;
        let ctx = CompilationContext::new(options);
        assert_eq!(ctx.integer_width_mask(), u32::MAX as u64);
        let ctx = CompilationContext::new(CompilerOptions::default());
        assert_eq!(ctx.integer_width_mask(), u64::MAX);
    }
}
