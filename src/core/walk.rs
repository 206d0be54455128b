// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Generic parse-tree traversal engine.
//!
//! Every pass is a client of `walk_tree`: depth-first, pre-order for the
//! enter callback, post-order for the exit callback, siblings in declaration
//! order. The engine is data-driven; node-kind-specific behavior lives in
//! the callbacks. Callbacks receive the current nesting depth so passes can
//! maintain scope stacks in their own context instead of global state.

use crate::core::ast::{AstArena, NodeId};
use crate::core::diagnostics::AslError;

/// Which callbacks fire during a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// Pre-order enter callback only.
    Down,
    /// Post-order exit callback only.
    Up,
    /// Both callbacks, paired per node.
    Both,
}

/// Enter-callback verdict for the current subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAction {
    Continue,
    /// Skip the node's children; the exit callback still fires.
    SkipChildren,
}

/// Walk the subtree rooted at `root`.
///
/// An `Err` from either callback aborts the remainder of the walk and
/// propagates to the caller. The traversal is iterative so deeply nested
/// trees cannot overflow the call stack.
pub fn walk_tree<C>(
    arena: &mut AstArena,
    root: NodeId,
    mode: WalkMode,
    mut on_enter: impl FnMut(&mut AstArena, NodeId, u32, &mut C) -> Result<WalkAction, AslError>,
    mut on_exit: impl FnMut(&mut AstArena, NodeId, u32, &mut C) -> Result<(), AslError>,
    ctx: &mut C,
) -> Result<(), AslError> {
    struct Frame {
        node: NodeId,
        depth: u32,
        entered: bool,
    }

    let mut stack = vec![Frame {
        node: root,
        depth: 0,
        entered: false,
    }];

    while let Some(frame) = stack.pop() {
        if frame.entered {
            if mode != WalkMode::Down {
                on_exit(arena, frame.node, frame.depth, ctx)?;
            }
            continue;
        }

        let action = if mode != WalkMode::Up {
            on_enter(arena, frame.node, frame.depth, ctx)?
        } else {
            WalkAction::Continue
        };

        stack.push(Frame {
            node: frame.node,
            depth: frame.depth,
            entered: true,
        });

        if action == WalkAction::Continue {
            let children = arena.children(frame.node);
            for child in children.into_iter().rev() {
                stack.push(Frame {
                    node: child,
                    depth: frame.depth + 1,
                    entered: false,
                });
            }
        }
    }
    Ok(())
}

/// Pre-order-only walk.
pub fn walk_down<C>(
    arena: &mut AstArena,
    root: NodeId,
    on_enter: impl FnMut(&mut AstArena, NodeId, u32, &mut C) -> Result<WalkAction, AslError>,
    ctx: &mut C,
) -> Result<(), AslError> {
    walk_tree(arena, root, WalkMode::Down, on_enter, |_, _, _, _| Ok(()), ctx)
}

/// Post-order-only walk.
pub fn walk_up<C>(
    arena: &mut AstArena,
    root: NodeId,
    on_exit: impl FnMut(&mut AstArena, NodeId, u32, &mut C) -> Result<(), AslError>,
    ctx: &mut C,
) -> Result<(), AslError> {
    walk_tree(
        arena,
        root,
        WalkMode::Up,
        |_, _, _, _| Ok(WalkAction::Continue),
        on_exit,
        ctx,
    )
}
