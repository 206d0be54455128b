// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Shared reporting helpers used by diagnostic rendering.

/// Highlight the character at `column` (1-based) in a source line.
///
/// With color enabled the character is wrapped in an ANSI red escape;
/// without color the line is returned as-is, except when the column lies
/// past the end of the line, where a caret is appended to mark it.
pub fn highlight_line(line: &str, column: Option<usize>, use_color: bool) -> String {
    let col = match column {
        Some(col) if col > 0 => col,
        _ => return line.to_string(),
    };
    let idx = col - 1;
    if idx >= line.len() {
        if use_color {
            return format!("{line}\x1b[31m^\x1b[0m");
        }
        return format!("{line}^");
    }
    let (head, tail) = line.split_at(idx);
    let ch = tail.chars().next().unwrap_or(' ');
    let rest = &tail[ch.len_utf8()..];
    if use_color {
        format!("{head}\x1b[31m{ch}\x1b[0m{rest}")
    } else {
        format!("{head}{ch}{rest}")
    }
}

#[cfg(test)]
mod tests {
    use super::highlight_line;

    #[test]
    fn column_past_end_appends_caret() {
        assert_eq!(highlight_line("abc", Some(10), false), "abc^");
    }

    #[test]
    fn color_wraps_target_character() {
        assert_eq!(
            highlight_line("abc", Some(2), true),
            "a\x1b[31mb\x1b[0mc"
        );
    }
}
