// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Scope stack shared by the namespace-building and cross-reference walks.
//!
//! Scoping constructs push on the walk's enter callback and pop on exit;
//! the stack therefore always mirrors the lexical nesting at the node
//! being visited. A push is recorded even when scope resolution failed so
//! the enter/exit pairing stays balanced.

use crate::core::namespace::NsId;

pub struct ScopeStack {
    stack: Vec<NsId>,
}

impl ScopeStack {
    pub fn new(root: NsId) -> Self {
        Self { stack: vec![root] }
    }

    /// Innermost enclosing scope.
    pub fn current(&self) -> NsId {
        *self
            .stack
            .last()
            .expect("scope stack never pops past the root")
    }

    pub fn push(&mut self, scope: NsId) {
        self.stack.push(scope);
    }

    /// Re-push the current scope; used when a scoping construct failed to
    /// resolve but its exit callback will still pop.
    pub fn push_current(&mut self) {
        self.push(self.current());
    }

    pub fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
