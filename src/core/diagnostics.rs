// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types, diagnostics, and reporting for the compiler.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Categories of compiler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AslErrorKind {
    Syntax,
    Namespace,
    Reference,
    Type,
    Method,
    Resource,
    Codegen,
    Interchange,
    Cli,
    Io,
}

/// A compiler error with a kind and message.
#[derive(Debug, Clone)]
pub struct AslError {
    kind: AslErrorKind,
    message: String,
}

impl AslError {
    pub fn new(kind: AslErrorKind, msg: &str, param: Option<&str>) -> Self {
        Self {
            kind,
            message: format_error(msg, param),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> AslErrorKind {
        self.kind
    }
}

impl fmt::Display for AslError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AslError {}

/// Severity level for diagnostics.
///
/// Only `Error` suppresses bytecode emission; warnings and remarks are
/// informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Remark,
    Warning,
    Error,
}

/// A diagnostic message with location and context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub(crate) line: u32,
    pub(crate) column: Option<usize>,
    pub(crate) code: String,
    pub(crate) severity: Severity,
    pub(crate) error: AslError,
    pub(crate) file: Option<String>,
    pub(crate) source: Option<String>,
    pub(crate) notes: Vec<String>,
    /// Set when a severity override filtered this diagnostic out. The
    /// condition is still evaluated and recorded either way.
    pub(crate) suppressed: bool,
}

impl Diagnostic {
    pub fn new(line: u32, severity: Severity, error: AslError) -> Self {
        Self {
            line,
            column: None,
            code: default_diagnostic_code(error.kind()).to_string(),
            severity,
            error,
            file: None,
            source: None,
            notes: Vec::new(),
            suppressed: false,
        }
    }

    pub fn with_column(mut self, column: Option<usize>) -> Self {
        self.column = column;
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.file = file;
        self
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn format(&self) -> String {
        format!(
            "{}: {} [{}] - {}",
            self.line,
            severity_label(self.severity),
            self.code,
            self.error.message()
        )
    }

    pub fn format_with_context(&self, lines: Option<&[String]>, use_color: bool) -> String {
        let sev = severity_label(self.severity);
        let header = match &self.file {
            Some(file) => format!("{file}:{}: {sev} [{}]", self.line, self.code),
            None => format!("{}: {sev} [{}]", self.line, self.code),
        };

        let mut out = String::new();
        out.push_str(&header);
        out.push('\n');

        for line in build_context_lines(
            self.line,
            self.column,
            lines,
            self.source.as_deref(),
            use_color,
        ) {
            out.push_str(&line);
            out.push('\n');
        }

        for note in &self.notes {
            out.push_str("note: ");
            out.push_str(note);
            out.push('\n');
        }

        out.push_str(&format!("{sev}: {}", self.error.message()));
        out
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> Option<usize> {
        self.column
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn message(&self) -> &str {
        self.error.message()
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Remark => "REMARK",
        Severity::Warning => "WARNING",
        Severity::Error => "ERROR",
    }
}

/// Per-message-code severity remapping supplied by the configuration layer.
///
/// The compiler always evaluates every condition and routes the result
/// through the same sink; overrides only change how the record is counted
/// and rendered.
#[derive(Debug, Clone, Default)]
pub struct SeverityOverrides {
    map: HashMap<String, SeverityAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityAction {
    Remap(Severity),
    Suppress,
}

impl SeverityOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remap(&mut self, code: impl Into<String>, severity: Severity) {
        self.map.insert(code.into(), SeverityAction::Remap(severity));
    }

    pub fn suppress(&mut self, code: impl Into<String>) {
        self.map.insert(code.into(), SeverityAction::Suppress);
    }

    /// Returns the effective severity and whether the record is suppressed.
    pub fn apply(&self, code: &str, default: Severity) -> (Severity, bool) {
        match self.map.get(code) {
            Some(SeverityAction::Remap(sev)) => (*sev, false),
            Some(SeverityAction::Suppress) => (default, true),
            None => (default, false),
        }
    }
}

/// Terminal failure of a compilation, carrying the diagnostic log.
#[derive(Debug)]
pub struct CompileFailure {
    error: AslError,
    diagnostics: Vec<Diagnostic>,
    source_lines: Arc<Vec<String>>,
}

impl CompileFailure {
    pub fn new(
        error: AslError,
        diagnostics: Vec<Diagnostic>,
        source_lines: impl Into<Arc<Vec<String>>>,
    ) -> Self {
        Self {
            error,
            diagnostics,
            source_lines: source_lines.into(),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn source_lines(&self) -> &[String] {
        &self.source_lines
    }

    pub fn error(&self) -> &AslError {
        &self.error
    }
}

impl fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for CompileFailure {}

/// Per-pass statistics.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassCounts {
    pub nodes: u32,
    pub errors: u32,
    pub warnings: u32,
}

impl PassCounts {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Build context lines for error display.
pub fn build_context_lines(
    line_num: u32,
    column: Option<usize>,
    lines: Option<&[String]>,
    source_override: Option<&str>,
    use_color: bool,
) -> Vec<String> {
    let line_idx = line_num.saturating_sub(1) as usize;

    if let Some(source) = source_override {
        let highlighted = crate::report::highlight_line(source, column, use_color);
        return vec![format!("{:>5} | {}", line_num, highlighted)];
    }

    let lines = match lines {
        Some(lines) if !lines.is_empty() => lines,
        _ => return vec![format!("{:>5} | <source unavailable>", line_num)],
    };
    if line_idx >= lines.len() {
        return vec![format!("{:>5} | <source unavailable>", line_num)];
    }

    let display = crate::report::highlight_line(&lines[line_idx], column, use_color);
    vec![format!("{:>5} | {}", line_num, display)]
}

fn default_diagnostic_code(kind: AslErrorKind) -> &'static str {
    match kind {
        AslErrorKind::Syntax => "asl001",
        AslErrorKind::Namespace => "asl101",
        AslErrorKind::Reference => "asl201",
        AslErrorKind::Type => "asl301",
        AslErrorKind::Method => "asl401",
        AslErrorKind::Resource => "asl501",
        AslErrorKind::Codegen => "asl601",
        AslErrorKind::Interchange => "asl701",
        AslErrorKind::Cli => "asl801",
        AslErrorKind::Io => "asl901",
    }
}

/// Format an error message with an optional parameter.
pub fn format_error(msg: &str, param: Option<&str>) -> String {
    match param {
        Some(p) => format!("{msg}: {p}"),
        None => msg.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_format_includes_line_and_severity() {
        let err = AslError::new(AslErrorKind::Namespace, "Name already exists", Some("FOO_"));
        let diag = Diagnostic::new(12, Severity::Error, err);
        assert_eq!(
            diag.format(),
            "12: ERROR [asl101] - Name already exists: FOO_"
        );
    }

    #[test]
    fn format_with_context_renders_notes_after_source() {
        let err = AslError::new(AslErrorKind::Namespace, "Name already exists", Some("FOO_"));
        let diag = Diagnostic::new(2, Severity::Error, err)
            .with_file(Some("dsdt.asl".to_string()))
            .with_column(Some(3))
            .with_note("first defined at line 1");
        let lines = vec!["Device (FOO_)".to_string(), "  Device (FOO_)".to_string()];

        let rendered = diag.format_with_context(Some(&lines), false);
        assert!(rendered.starts_with("dsdt.asl:2: ERROR [asl101]"));
        assert!(rendered.contains("    2 |   Device (FOO_)"));
        assert!(rendered.contains("note: first defined at line 1"));
        assert!(rendered.ends_with("ERROR: Name already exists: FOO_"));
    }

    #[test]
    fn severity_overrides_remap_and_suppress() {
        let mut overrides = SeverityOverrides::new();
        overrides.remap("asl301", Severity::Error);
        overrides.suppress("asl401");

        assert_eq!(
            overrides.apply("asl301", Severity::Warning),
            (Severity::Error, false)
        );
        assert_eq!(
            overrides.apply("asl401", Severity::Warning),
            (Severity::Warning, true)
        );
        assert_eq!(
            overrides.apply("asl101", Severity::Error),
            (Severity::Error, false)
        );
    }
}
