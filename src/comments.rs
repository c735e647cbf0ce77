use crate::scan::{ScanState, Scanner, fuses, is_word_char};

/// Remove every PHP comment while keeping line numbers intact.
///
/// - `//`, `#` and `/* */` comments inside PHP code are dropped.
/// - Newlines that were inside a comment are kept, so the output has exactly
///   as many lines as the input. A `\r` right before such a newline is kept
///   too, so CRLF line endings survive.
/// - Strings and text outside `<?php ... ?>` are copied untouched.
pub fn strip_comments(src: &str) -> String {
    let mut scan = Scanner::new(src);
    let mut out = String::with_capacity(src.len());

    // Whether the block comment being skipped spanned a newline.
    let mut block_had_newline = false;

    while let Some(c) = scan.current() {
        let from = scan.state();
        let to = scan.classify(c);

        match (from, to) {
            (ScanState::PhpCode, ScanState::LineComment | ScanState::BlockComment) => {
                // Two-char openers arrive one char at a time: the `/` is already out.
                if c != '#' && out.ends_with('/') {
                    out.pop();
                }
                block_had_newline = false;
            }
            (ScanState::LineComment, ScanState::PhpCode) => out.push(c),
            (ScanState::LineComment | ScanState::BlockComment, _)
                if c == '\r' && scan.peek(1) == Some('\n') =>
            {
                out.push(c);
            }
            (ScanState::BlockComment, ScanState::BlockComment) => {
                if c == '\n' {
                    out.push(c);
                    block_had_newline = true;
                }
            }
            (ScanState::BlockComment, ScanState::PhpCode) => {
                // Keep the tokens on both sides of an inline comment apart.
                let before = out.chars().next_back();
                let after = scan.peek(1);
                let glued = match (before, after) {
                    (Some(b), Some(a)) => (is_word_char(b) && is_word_char(a)) || fuses(b, a),
                    _ => false,
                };
                if !block_had_newline && glued {
                    out.push(' ');
                }
            }
            (ScanState::LineComment, _) => {}
            _ => out.push(c),
        }

        scan.advance();
    }

    out
}
