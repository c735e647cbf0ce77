//! The region scanner shared by every stage.
//!
//! PHP text is split into regions: raw template text outside `<?php ... ?>`,
//! code, comments and quoted strings. Stages walk the text with a [`Scanner`]
//! and only ever edit characters the scanner reports as plain code.

/// Lexical region the scanner is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    OutsidePhp,
    PhpCode,
    LineComment,
    BlockComment,
    SingleQuotedString,
    DoubleQuotedString,
}

/// Punctuation that never needs a blank in front of it.
pub fn is_operator(c: char) -> bool {
    matches!(
        c,
        '.' | '='
            | '+'
            | '-'
            | '*'
            | '/'
            | '?'
            | ':'
            | ';'
            | '('
            | ')'
            | '{'
            | '}'
            | '['
            | ']'
            | '&'
            | '%'
            | '!'
            | ','
            | '<'
            | '>'
    )
}

/// Space or tab. Line breaks are handled on their own.
pub fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t')
}

pub fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r')
}

pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Characters that can appear inside a PHP number (`125`, `.5`, `0x1F`, `1_000`, `2e3`).
pub fn is_number_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Characters that make up identifiers, keywords and variables.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || !c.is_ascii()
}

/// Whether `left` and `right` would read as a different token once adjacent
/// (`+ +`, `/ *`, `? >`, `1 .`, `. 5`).
pub fn fuses(left: char, right: char) -> bool {
    matches!(
        (left, right),
        ('+', '+') | ('-', '-') | ('/', '/') | ('/', '*') | ('.', '.') | ('?', '>')
    ) || (is_digit(left) && right == '.')
        || (left == '.' && is_digit(right))
}

/// Cursor over a source text that tracks the current region.
///
/// A stage drives it one character at a time: [`Scanner::classify`] commits
/// the region transition triggered by the current character, then
/// [`Scanner::advance`] moves past it. The previous character, the escape flag
/// inside strings and the `php` lookahead are handled here so every stage
/// agrees on where code ends and strings or comments begin.
#[derive(Debug)]
pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    state: ScanState,
    prev: Option<char>,
    escaped: bool,
    // Set when the current char opened or closed a comment.
    forget_prev: bool,
}

impl Scanner {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            state: ScanState::OutsidePhp,
            prev: None,
            escaped: false,
            forget_prev: false,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Previous character that can take part in a two-character transition.
    pub fn prev(&self) -> Option<char> {
        self.prev
    }

    pub fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Character `ahead` positions after the current one, if any.
    pub fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    /// Whether the characters right after the current one spell `word`.
    pub fn lookahead_is(&self, word: &str) -> bool {
        let mut ahead = 1;
        for expected in word.chars() {
            if self.peek(ahead) != Some(expected) {
                return false;
            }
            ahead += 1;
        }
        true
    }

    /// Commits the transition triggered by `c` (the current character) and
    /// returns the new state.
    pub fn classify(&mut self, c: char) -> ScanState {
        let prev = self.prev;
        self.forget_prev = false;

        self.state = match self.state {
            ScanState::OutsidePhp => {
                if c == '?' && prev == Some('<') && self.lookahead_is("php") {
                    ScanState::PhpCode
                } else {
                    ScanState::OutsidePhp
                }
            }
            ScanState::PhpCode => match c {
                '/' if prev == Some('/') => {
                    self.forget_prev = true;
                    ScanState::LineComment
                }
                '*' if prev == Some('/') => {
                    self.forget_prev = true;
                    ScanState::BlockComment
                }
                // `#[` opens a PHP 8 attribute.
                '#' if self.peek(1) != Some('[') => ScanState::LineComment,
                '\'' => {
                    self.escaped = false;
                    ScanState::SingleQuotedString
                }
                '"' => {
                    self.escaped = false;
                    ScanState::DoubleQuotedString
                }
                '>' if prev == Some('?') => ScanState::OutsidePhp,
                _ => ScanState::PhpCode,
            },
            ScanState::LineComment => {
                if c == '\n' {
                    ScanState::PhpCode
                } else {
                    ScanState::LineComment
                }
            }
            ScanState::BlockComment => {
                if c == '/' && prev == Some('*') {
                    self.forget_prev = true;
                    ScanState::PhpCode
                } else {
                    ScanState::BlockComment
                }
            }
            ScanState::SingleQuotedString => self.string_step(c, '\''),
            ScanState::DoubleQuotedString => self.string_step(c, '"'),
        };

        self.state
    }

    fn string_step(&mut self, c: char, quote: char) -> ScanState {
        if c == quote && !self.escaped {
            return ScanState::PhpCode;
        }
        self.escaped = c == '\\' && !self.escaped;
        self.state
    }

    /// Moves past the current character, which becomes the previous one.
    pub fn advance(&mut self) {
        self.prev = if self.forget_prev {
            None
        } else {
            self.current()
        };
        self.forget_prev = false;
        self.pos += 1;
    }

    /// Moves past the current character without making it the previous one.
    pub fn skip(&mut self) {
        self.pos += 1;
    }

    /// Jumps back (or forward) to `pos`, keeping the previous character.
    pub fn rewind_to(&mut self, pos: usize) {
        self.pos = pos.min(self.chars.len());
    }
}
