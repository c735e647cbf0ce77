//! Whitespace compaction for PHP code.
//!
//! Only blanks (spaces and tabs) that sit in PHP code are ever removed:
//!
//! - indentation and repeated blanks,
//! - blanks before or after operator punctuation,
//! - trailing blanks at the end of a line.
//!
//! Newlines, strings, comments and text outside `<?php ... ?>` are copied
//! verbatim. A blank is kept whenever removing it would glue two tokens into a
//! different one (`$a - -1`, `1 . 'x'`, `'x' . 1`).

use crate::scan::{
    ScanState, Scanner, fuses, is_blank, is_digit, is_line_break, is_number_char, is_operator,
};

/// Collapse the whitespace of every PHP region in `src`.
pub fn compact_whitespace(src: &str) -> String {
    let mut scan = Scanner::new(src);
    let mut out = String::with_capacity(src.len());
    // Length of `out` right after the last opening tag; its separator stays.
    let mut tag_end = 0;

    while let Some(c) = scan.current() {
        let from = scan.state();
        let prev = scan.prev();
        let to = scan.classify(c);

        if from == ScanState::OutsidePhp && to == ScanState::PhpCode {
            out.push(c);
            scan.advance();
            copy_open_tag(&mut scan, &mut out);
            tag_end = out.len();
            continue;
        }

        if from != ScanState::PhpCode || to != ScanState::PhpCode {
            out.push(c);
            scan.advance();
            continue;
        }

        let prev_is_blank = prev.is_some_and(is_blank);

        if prev_is_blank && (is_line_break(c) || is_operator(c)) {
            drop_trailing_blank(&mut out, c, tag_end);
            out.push(c);
            scan.advance();
            if c == '.' {
                concat_number_operand(&mut scan, &mut out);
            }
        } else if is_blank(c)
            && prev.is_some_and(|p| is_blank(p) || is_line_break(p) || is_operator(p))
        {
            let keep = prev.is_some_and(is_operator)
                && scan.peek(1).is_some_and(|next| fuses(prev.unwrap_or(c), next));
            if keep {
                out.push(c);
                scan.advance();
            } else {
                // Dropped blanks are invisible to the next decision.
                scan.skip();
            }
        } else {
            out.push(c);
            scan.advance();
        }
    }

    out
}

/// Delete the blank at the end of `out` unless `next` would fuse with what
/// precedes it, or the blank is the separator of an opening tag.
fn drop_trailing_blank(out: &mut String, next: char, tag_end: usize) {
    if out.len() <= tag_end {
        return;
    }
    let mut tail = out.chars().rev();
    let last = tail.next();
    let before = tail.next();

    if !last.is_some_and(is_blank) {
        return;
    }
    if before.is_some_and(|b| fuses(b, next)) {
        return;
    }
    out.pop();
}

/// `php` and the single separator after it belong to the opening tag.
fn copy_open_tag(scan: &mut Scanner, out: &mut String) {
    let tag_len = match scan.peek(3) {
        Some(sep) if is_blank(sep) || is_line_break(sep) => 4,
        _ => 3,
    };
    for _ in 0..tag_len {
        match scan.current() {
            Some(c) => {
                out.push(c);
                scan.advance();
            }
            None => break,
        }
    }
}

/// Bounded lookahead run right after a `.` was emitted.
///
/// When blanks separate the `.` from a number (`'a' . 125 . 'b'`), the `.`
/// and the number must not touch, or PHP reads `.125` as a float. In that
/// case one space is written and the number is copied verbatim. Blanks after
/// the number collapse to one space in front of another `.` or a word, and
/// vanish in front of any other operator or a line break. Otherwise nothing is
/// consumed.
fn concat_number_operand(scan: &mut Scanner, out: &mut String) {
    let start = scan.position();

    let mut skipped = 0;
    while scan.current().is_some_and(is_blank) {
        scan.skip();
        skipped += 1;
    }

    let operand = scan.current();
    if skipped == 0 || !operand.is_some_and(|c| is_digit(c) || c == '.') {
        scan.rewind_to(start);
        return;
    }

    out.push(' ');
    while let Some(c) = scan.current() {
        if !is_number_char(c) {
            break;
        }
        out.push(c);
        scan.advance();
    }

    let mut trailing = false;
    while scan.current().is_some_and(is_blank) {
        scan.skip();
        trailing = true;
    }
    if !trailing {
        return;
    }
    match scan.current() {
        Some('.') => out.push(' '),
        Some(next) if !is_operator(next) && !is_line_break(next) => out.push(' '),
        _ => {}
    }
}
