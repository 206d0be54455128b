// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for amlforge.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde_json::json;

use amlforge::compiler::{compile_json, CompileOutput, CompilerOptions, ExternalRef};
use amlforge::core::diagnostics::{Diagnostic, Severity};

#[derive(Parser, Debug)]
#[command(
    name = "amlforge",
    version,
    about = "Compiles an ASL parse-tree interchange document to an AML table"
)]
struct Cli {
    /// Parse-tree interchange document (JSON) produced by the front end
    input: PathBuf,

    /// Output table path; defaults to the input path with an .aml extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the definition block revision (revision >= 2 selects
    /// 64-bit integer arithmetic)
    #[arg(long, value_name = "N")]
    table_revision: Option<u8>,

    /// Emit diagnostics as JSON lines instead of text
    #[arg(long)]
    json_diagnostics: bool,

    /// Treat warnings as errors
    #[arg(long)]
    werror: bool,

    /// Print the unresolved external references after a successful compile
    #[arg(long)]
    print_externals: bool,
}

fn severity_to_str(severity: Severity) -> &'static str {
    match severity {
        Severity::Remark => "remark",
        Severity::Warning => "warning",
        Severity::Error => "error",
    }
}

fn format_diagnostic_line(diag: &Diagnostic, use_color: bool, as_json: bool) -> String {
    if as_json {
        json!({
            "code": diag.code(),
            "severity": severity_to_str(diag.severity()),
            "message": diag.message(),
            "file": diag.file(),
            "line": diag.line(),
            "column": diag.column(),
            "notes": diag.notes(),
        })
        .to_string()
    } else {
        diag.format_with_context(None, use_color)
    }
}

fn emit_diagnostics(output: &CompileOutput, use_color: bool, as_json: bool) {
    for diag in &output.diagnostics {
        if diag.is_suppressed() {
            continue;
        }
        eprintln!("{}", format_diagnostic_line(diag, use_color, as_json));
    }
}

fn print_externals(externals: &[ExternalRef]) {
    for ext in externals {
        match ext.arg_count {
            Some(argc) => println!("External: {} {} ({argc} args)", ext.path, ext.object_type),
            None => println!("External: {} {}", ext.path, ext.object_type),
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, String> {
    let text = fs::read_to_string(&cli.input)
        .map_err(|err| format!("Cannot read {}: {err}", cli.input.display()))?;
    let doc: serde_json::Value = serde_json::from_str(&text)
        .map_err(|err| format!("Input is not valid JSON: {err}"))?;

    let mut options = CompilerOptions::default();
    if let Some(revision) = cli.table_revision {
        options.table_revision = revision;
    }

    let use_color = std::env::var("NO_COLOR").is_err();
    let output = match compile_json(&doc, options) {
        Ok(output) => output,
        Err(failure) => {
            for diag in failure.diagnostics() {
                eprintln!(
                    "{}",
                    format_diagnostic_line(diag, use_color, cli.json_diagnostics)
                );
            }
            eprintln!("{failure}");
            return Ok(ExitCode::from(1));
        }
    };
    emit_diagnostics(&output, use_color, cli.json_diagnostics);

    let failed = !output.succeeded() || (cli.werror && output.counts.warnings > 0);
    if failed {
        eprintln!(
            "Compilation failed: {} errors, {} warnings",
            output.counts.errors, output.counts.warnings
        );
        return Ok(ExitCode::from(1));
    }

    let aml = output.aml.as_deref().unwrap_or_default();
    let out_path = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("aml"));
    fs::write(&out_path, aml)
        .map_err(|err| format!("Cannot write {}: {err}", out_path.display()))?;

    if cli.print_externals {
        print_externals(&output.externals);
    }
    eprintln!(
        "Compiled {} nodes, {} bytes, {} warnings",
        output.counts.nodes,
        aml.len(),
        output.counts.warnings
    );
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
    }
}
