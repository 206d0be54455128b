// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Pass-agnostic compiler core: parse-tree arena, traversal engine,
//! namespace, diagnostics, and the static AML reference tables.

pub mod ast;
pub mod btype;
pub mod diagnostics;
pub mod namespace;
pub mod opcodes;
pub mod predefined;
pub mod walk;
