//! Lexical analysis: turns a source string into a lazy sequence of [`Lexeme`]s.
//!
//! The lexer is a deterministic finite-state machine over a character stream. Every
//! `read_*`/`skip_*` method below corresponds to one state from the design: `Idle`
//! is [`Lexer::next_lexeme`]'s top-level dispatch, `ComplexOp` is
//! [`Lexer::read_complex_op`], `ReadWord` is [`Lexer::read_word`], `ReadInteger`/
//! `ReadReal` are both folded into [`Lexer::read_number`] (the transition between
//! them is just "did we see a `.`"), `ReadString`/`ReadEscape` are
//! [`Lexer::read_string`], and the two comment-skipping states are
//! [`Lexer::skip_line_comment`]/[`Lexer::skip_block_comment`].

mod error;
mod lexeme;

pub use error::LexicalError;
pub use lexeme::{Lexeme, LexemeKind, Payload};

use std::{collections::HashMap, iter::Peekable, str::Chars};

use once_cell::sync::Lazy;

pub type LexResult<T> = Result<T, LexicalError>;

static KEYWORDS: Lazy<HashMap<&'static str, LexemeKind>> = Lazy::new(|| {
    use LexemeKind::*;
    HashMap::from([
        ("break", Break),
        ("case", Case),
        ("continue", Continue),
        ("do", Do),
        ("else", Else),
        ("end", End),
        ("false", False),
        ("for", For),
        ("if", If),
        ("of", Of),
        ("program", Program),
        ("read", Read),
        ("true", True),
        ("while", While),
        ("write", Write),
        ("int", Int),
        ("real", Real),
        ("string", Str),
        ("boolean", Boolean),
        ("and", And),
        ("or", Or),
        ("not", Not),
    ])
});

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            finished: false,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Lookahead one character past `peek()`, without consuming either.
    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next();
        if ch == Some('\n') {
            self.line += 1;
        }
        ch
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut buf = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            buf.push(c);
            self.bump();
        }
        buf
    }

    /// `Idle`'s whitespace/comment handling: skip runs of whitespace and comments
    /// until a character that starts a real lexeme (or end-of-stream) is next.
    fn skip_trivia(&mut self) -> LexResult<()> {
        loop {
            self.take_while(|c| c.is_whitespace());

            if self.peek() == Some('/') {
                match self.peek_second() {
                    Some('/') => {
                        self.bump();
                        self.bump();
                        self.skip_line_comment();
                        continue;
                    }
                    Some('*') => {
                        let start_line = self.line;
                        self.bump();
                        self.bump();
                        self.skip_block_comment(start_line)?;
                        continue;
                    }
                    _ => return Ok(()),
                }
            }

            return Ok(());
        }
    }

    /// `LineComment`: consume until (not including) the newline, then back to `Idle`.
    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    /// `BlockCommentSeekStar`/`BlockCommentSeekSlash`: classic two-state `*/` scan.
    fn skip_block_comment(&mut self, start_line: usize) -> LexResult<()> {
        loop {
            match self.bump() {
                None => {
                    return Err(LexicalError::new(
                        "unterminated block comment",
                        start_line,
                    ))
                }
                Some('*') => loop {
                    match self.bump() {
                        None => {
                            return Err(LexicalError::new(
                                "unterminated block comment",
                                start_line,
                            ))
                        }
                        Some('/') => return Ok(()),
                        Some('*') => continue,
                        Some(_) => break,
                    }
                },
                Some(_) => continue,
            }
        }
    }

    /// `ReadWord`: accumulate ASCII letters, then resolve against the keyword table.
    fn read_word(&mut self, line: usize) -> LexResult<Lexeme> {
        let word = self.take_while(|c| c.is_ascii_alphabetic());

        if let Some(kind) = KEYWORDS.get(word.as_str()) {
            Ok(Lexeme::simple(*kind, line))
        } else {
            Ok(Lexeme::id(word, line))
        }
    }

    /// `ReadInteger`/`ReadReal`: accumulate digits, optionally a `.` and more digits.
    fn read_number(&mut self, line: usize) -> LexResult<Lexeme> {
        let int_part = self.take_while(|c| c.is_ascii_digit());

        if self.peek() == Some('.') {
            self.bump();
            let frac_part = self.take_while(|c| c.is_ascii_digit());
            let text = format!("{int_part}.{frac_part}");
            let value: f64 = text
                .parse()
                .map_err(|_| LexicalError::new(format!("malformed real literal '{text}'"), line))?;
            return Ok(Lexeme::real(value, line));
        }

        if let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() || c == '_' {
                return Err(LexicalError::new(
                    format!("unexpected character '{c}' following integer literal"),
                    line,
                ));
            }
        }

        let value: i32 = int_part
            .parse()
            .map_err(|_| LexicalError::new(format!("integer literal '{int_part}' out of range"), line))?;
        Ok(Lexeme::int(value, line))
    }

    /// `ReadString`/`ReadEscape`: accumulate until the closing quote, resolving the
    /// five documented escapes along the way.
    fn read_string(&mut self, line: usize) -> LexResult<Lexeme> {
        self.bump(); // opening quote
        let mut buf = String::new();

        loop {
            match self.bump() {
                None => return Err(LexicalError::new("unterminated string literal", line)),
                Some('\n') => return Err(LexicalError::new("newline in string literal", line)),
                Some('"') => return Ok(Lexeme::string(buf, line)),
                Some('\\') => match self.bump() {
                    None => return Err(LexicalError::new("unterminated string literal", line)),
                    Some('n') => buf.push('\n'),
                    Some('t') => buf.push('\t'),
                    Some('r') => buf.push('\r'),
                    Some('"') => buf.push('"'),
                    Some('\\') => buf.push('\\'),
                    Some(other) => buf.push(other),
                },
                Some(c) => buf.push(c),
            }
        }
    }

    /// `ComplexOp`: decide between a one- and two-character token for `!`, `=`,
    /// `<`, `>` (comments starting with `/` are already stripped by
    /// [`Lexer::skip_trivia`] before this runs, so `/` here is always division).
    fn read_complex_op(&mut self, line: usize) -> LexResult<Lexeme> {
        let first = self.bump().expect("read_complex_op called at end of input");

        let two_char = |lexer: &mut Self, expected_second, two_kind, one_kind| -> LexResult<Lexeme> {
            if lexer.peek() == Some(expected_second) {
                lexer.bump();
                Ok(Lexeme::simple(two_kind, line))
            } else {
                Ok(Lexeme::simple(one_kind, line))
            }
        };

        match first {
            '=' => two_char(self, '=', LexemeKind::Eq, LexemeKind::Assign),
            '<' => two_char(self, '=', LexemeKind::Le, LexemeKind::Lt),
            '>' => two_char(self, '=', LexemeKind::Ge, LexemeKind::Gt),
            '/' => Ok(Lexeme::simple(LexemeKind::Slash, line)),
            '!' => {
                if self.peek() == Some('=') {
                    self.bump();
                    Ok(Lexeme::simple(LexemeKind::Ne, line))
                } else {
                    Err(LexicalError::new("expected '=' after '!'", line))
                }
            }
            _ => unreachable!("read_complex_op dispatched on a non-complex starter"),
        }
    }

    /// `Idle`: the top-level dispatch on the next significant character.
    fn next_lexeme(&mut self) -> LexResult<Lexeme> {
        self.skip_trivia()?;
        let line = self.line;

        let Some(ch) = self.peek() else {
            return Ok(Lexeme::eof(line));
        };

        match ch {
            'a'..='z' | 'A'..='Z' => self.read_word(line),
            '0'..='9' => self.read_number(line),
            '"' => self.read_string(line),
            '!' | '=' | '<' | '>' | '/' => self.read_complex_op(line),
            '+' => self.single(LexemeKind::Plus, line),
            '-' => self.single(LexemeKind::Minus, line),
            '*' => self.single(LexemeKind::Star, line),
            '%' => self.single(LexemeKind::Percent, line),
            ';' => self.single(LexemeKind::Semicolon, line),
            ',' => self.single(LexemeKind::Comma, line),
            '{' => self.single(LexemeKind::LBrace, line),
            '}' => self.single(LexemeKind::RBrace, line),
            '(' => self.single(LexemeKind::LParen, line),
            ')' => self.single(LexemeKind::RParen, line),
            other => Err(LexicalError::new(format!("unexpected character '{other}'"), line)),
        }
    }

    fn single(&mut self, kind: LexemeKind, line: usize) -> LexResult<Lexeme> {
        self.bump();
        Ok(Lexeme::simple(kind, line))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = LexResult<Lexeme>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.next_lexeme() {
            Ok(lexeme) => {
                if lexeme.kind == LexemeKind::Eof {
                    self.finished = true;
                }
                Some(Ok(lexeme))
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<LexemeKind> {
        Lexer::new(source)
            .map(|result| result.expect("lexing should not fail").kind)
            .collect()
    }

    #[test]
    fn lexes_identifier_and_keyword() {
        assert_eq!(kinds("foo program"), vec![LexemeKind::Id, LexemeKind::Program, LexemeKind::Eof]);
    }

    #[test]
    fn lexes_integer() {
        let lexemes: Vec<_> = Lexer::new("1337").map(|r| r.unwrap()).collect();
        assert_eq!(lexemes[0].payload, Payload::Int(1337));
    }

    #[test]
    fn lexes_real() {
        let lexemes: Vec<_> = Lexer::new("3.14").map(|r| r.unwrap()).collect();
        assert_eq!(lexemes[0].kind, LexemeKind::RealValue);
        assert_eq!(lexemes[0].payload, Payload::Real(3.14));
    }

    #[test]
    fn rejects_identifier_like_suffix_on_integer() {
        let mut lexer = Lexer::new("123abc");
        assert!(lexer.next().unwrap().is_err());
    }

    #[test]
    fn lexes_string_with_escapes() {
        let lexemes: Vec<_> = Lexer::new(r#""a\nb\t\"c\\""#).map(|r| r.unwrap()).collect();
        assert_eq!(lexemes[0].payload, Payload::Str("a\nb\t\"c\\".to_string()));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut lexer = Lexer::new("\"abc");
        assert!(lexer.next().unwrap().is_err());
    }

    #[test]
    fn newline_inside_string_is_an_error() {
        let mut lexer = Lexer::new("\"abc\ndef\"");
        assert!(lexer.next().unwrap().is_err());
    }

    #[test]
    fn lexes_complex_operators() {
        assert_eq!(
            kinds("!= == <= >= < > = /"),
            vec![
                LexemeKind::Ne,
                LexemeKind::Eq,
                LexemeKind::Le,
                LexemeKind::Ge,
                LexemeKind::Lt,
                LexemeKind::Gt,
                LexemeKind::Assign,
                LexemeKind::Slash,
                LexemeKind::Eof,
            ]
        );
    }

    #[test]
    fn bang_without_equals_is_an_error() {
        let mut lexer = Lexer::new("!x");
        assert!(lexer.next().unwrap().is_err());
    }

    #[test]
    fn skips_line_and_block_comments() {
        assert_eq!(
            kinds("// a comment\nx /* block\ncomment */ y"),
            vec![LexemeKind::Id, LexemeKind::Id, LexemeKind::Eof]
        );
    }

    #[test]
    fn unterminated_block_comment_is_an_error() {
        let mut lexer = Lexer::new("x /* never closes");
        let results: Vec<_> = lexer.by_ref().collect();
        assert!(results.last().unwrap().is_err());
    }

    #[test]
    fn terminates_with_exactly_one_eof_sentinel() {
        let results: Vec<_> = Lexer::new("x;").collect();
        assert_eq!(results.len(), 3);
        assert_eq!(results[2].as_ref().unwrap().kind, LexemeKind::Eof);
    }

    #[test]
    fn reserved_but_unused_keywords_still_lex_as_keywords() {
        assert_eq!(
            kinds("case of for end"),
            vec![LexemeKind::Case, LexemeKind::Of, LexemeKind::For, LexemeKind::End, LexemeKind::Eof]
        );
    }

    #[test]
    fn tracks_line_numbers_across_newlines() {
        let lexemes: Vec<_> = Lexer::new("a\nb\n\nc").map(|r| r.unwrap()).collect();
        assert_eq!(lexemes[0].line, 1);
        assert_eq!(lexemes[1].line, 2);
        assert_eq!(lexemes[2].line, 4);
    }
}
