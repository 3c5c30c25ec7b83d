//! The BSON tokenizer (spec §4.1).
//!
//! Operates on raw bytes rather than `&str` so that the "invalid UTF-8
//! substitutes codepoint -1" rule in spec §4.1 is actually reachable; a
//! `&str` input would already have rejected that at the type boundary.

use std::fmt;

/// One lexical token, tagged with its source position for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token and any text it carries.
    pub kind: TokenKind,
    /// 1-based line number the token starts on.
    pub line: u32,
    /// 1-based column the token starts on.
    pub col: u32,
}

/// The kinds of token the tokenizer can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A run of space/tab/CR, coalesced into one token.
    Whitespace,
    /// A `//` line comment, not including the terminating newline.
    Comment,
    /// `[A-Za-z_][A-Za-z0-9_]*`.
    Identifier(String),
    /// `=`
    Equals,
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `/`
    Slash,
    /// `*`
    Star,
    /// `.`
    Dot,
    /// A double-quoted string, with escapes already resolved.
    StringLiteral(String),
    /// A run of decimal digits. Sign and decimal point are separate tokens;
    /// the parser reassembles them (spec §4.1, §4.2).
    NumericLiteral(String),
    /// `true`/`false` (case-insensitive in the source, normalized here).
    Boolean(bool),
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// A line terminator. Significant: it closes numeric-literal
    /// accumulation in the parser.
    Newline,
    /// End of input.
    Eof,
}

/// Failure tokenizing a BSON source buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizeError {
    /// Human-readable description of what went wrong.
    pub message: String,
    /// 1-based line the error occurred on.
    pub line: u32,
    /// 1-based column the error occurred on.
    pub col: u32,
}

impl fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.col, self.message)
    }
}
impl std::error::Error for TokenizeError {}

/// Decode one UTF-8 codepoint starting at `pos`.
///
/// Returns `(-1, 1)` on an invalid sequence, matching spec §4.1's "substitute
/// codepoint -1 with a warning and advance 1 byte."
fn decode_codepoint(bytes: &[u8], pos: usize) -> (i32, usize) {
    let remaining = &bytes[pos..];
    match std::str::from_utf8(remaining) {
        Ok(s) => {
            if let Some(c) = s.chars().next() {
                (c as i32, c.len_utf8())
            } else {
                (-1, 1)
            }
        }
        Err(e) => {
            // Try to decode just the valid prefix, if any.
            let valid_up_to = e.valid_up_to();
            if valid_up_to > 0 {
                let s = std::str::from_utf8(&remaining[..valid_up_to]).unwrap();
                let c = s.chars().next().unwrap();
                (c as i32, c.len_utf8())
            } else {
                tracing::warn!(pos, "invalid UTF-8 byte sequence, substituting codepoint -1");
                (-1, 1)
            }
        }
    }
}

fn is_ident_start(c: i32) -> bool {
    matches!(c, 0x41..=0x5A | 0x61..=0x7A | 0x5F)
}
fn is_ident_continue(c: i32) -> bool {
    is_ident_start(c) || (0x30..=0x39).contains(&c)
}
fn is_digit(c: i32) -> bool {
    (0x30..=0x39).contains(&c)
}

/// Tokenize a BSON source buffer.
///
/// On malformed input, no partial token list is returned: the caller gets a
/// [`TokenizeError`] and nothing else.
pub fn tokenize(source: &[u8]) -> Result<Vec<Token>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut pos = 0usize;
    let mut line = 1u32;
    let mut col = 1u32;

    macro_rules! advance_pos {
        ($n:expr, $cp:expr) => {{
            pos += $n;
            if $cp == '\n' as i32 {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }};
    }

    while pos < source.len() {
        let start_line = line;
        let start_col = col;
        let (cp, width) = decode_codepoint(source, pos);

        // Whitespace run (space, tab, CR).
        if cp == ' ' as i32 || cp == '\t' as i32 || cp == '\r' as i32 {
            while pos < source.len() {
                let (c, w) = decode_codepoint(source, pos);
                if c == ' ' as i32 || c == '\t' as i32 || c == '\r' as i32 {
                    advance_pos!(w, c);
                } else {
                    break;
                }
            }
            tokens.push(Token {
                kind: TokenKind::Whitespace,
                line: start_line,
                col: start_col,
            });
            continue;
        }

        // Newline.
        if cp == '\n' as i32 {
            advance_pos!(width, cp);
            tokens.push(Token {
                kind: TokenKind::Newline,
                line: start_line,
                col: start_col,
            });
            continue;
        }

        // Line comment.
        if cp == '/' as i32 {
            let (next_cp, _) = decode_codepoint(source, pos + width);
            if next_cp == '/' as i32 {
                // consume through (but not including) the next '\n'.
                advance_pos!(width, cp);
                let (_, w2) = decode_codepoint(source, pos);
                advance_pos!(w2, '/' as i32);
                while pos < source.len() {
                    let (c, w) = decode_codepoint(source, pos);
                    if c == '\n' as i32 {
                        break;
                    }
                    advance_pos!(w, c);
                }
                tokens.push(Token {
                    kind: TokenKind::Comment,
                    line: start_line,
                    col: start_col,
                });
                continue;
            } else {
                advance_pos!(width, cp);
                tokens.push(Token {
                    kind: TokenKind::Slash,
                    line: start_line,
                    col: start_col,
                });
                continue;
            }
        }

        // Single-character operators.
        let single = match cp as u8 as char {
            '=' if cp < 128 => Some(TokenKind::Equals),
            '-' if cp < 128 => Some(TokenKind::Minus),
            '+' if cp < 128 => Some(TokenKind::Plus),
            '*' if cp < 128 => Some(TokenKind::Star),
            '.' if cp < 128 => Some(TokenKind::Dot),
            '{' if cp < 128 => Some(TokenKind::LBrace),
            '}' if cp < 128 => Some(TokenKind::RBrace),
            '[' if cp < 128 => Some(TokenKind::LBracket),
            ']' if cp < 128 => Some(TokenKind::RBracket),
            _ => None,
        };
        if let Some(kind) = single {
            advance_pos!(width, cp);
            tokens.push(Token {
                kind,
                line: start_line,
                col: start_col,
            });
            continue;
        }

        // String literal.
        if cp == '"' as i32 {
            advance_pos!(width, cp);
            let mut text = String::new();
            let mut closed = false;
            while pos < source.len() {
                let (c, w) = decode_codepoint(source, pos);
                if c == '"' as i32 {
                    // Unescaped iff preceding codepoint is not `\`, or the
                    // preceding two are `\\` (spec §4.1).
                    let backslash_run = text.chars().rev().take_while(|&ch| ch == '\\').count();
                    if backslash_run % 2 == 0 {
                        advance_pos!(w, c);
                        closed = true;
                        break;
                    } else {
                        text.push('"');
                        advance_pos!(w, c);
                        continue;
                    }
                }
                if let Some(ch) = char::from_u32(c as u32) {
                    text.push(ch);
                } else {
                    text.push('\u{FFFD}');
                }
                advance_pos!(w, c);
            }
            if !closed {
                return Err(TokenizeError {
                    message: "unterminated string literal".into(),
                    line: start_line,
                    col: start_col,
                });
            }
            // Resolve escapes: `\\` -> `\`, `\"` -> `"`.
            let resolved = text.replace("\\\\", "\u{0}BSLASH\u{0}");
            let resolved = resolved.replace("\\\"", "\"");
            let resolved = resolved.replace("\u{0}BSLASH\u{0}", "\\");
            tokens.push(Token {
                kind: TokenKind::StringLiteral(resolved),
                line: start_line,
                col: start_col,
            });
            continue;
        }

        // Numeric literal: a run of decimal digits only (sign/dot are
        // separate tokens, reassembled by the parser).
        if is_digit(cp) {
            let mut text = String::new();
            while pos < source.len() {
                let (c, w) = decode_codepoint(source, pos);
                if is_digit(c) {
                    text.push((c as u8) as char);
                    advance_pos!(w, c);
                } else {
                    break;
                }
            }
            tokens.push(Token {
                kind: TokenKind::NumericLiteral(text),
                line: start_line,
                col: start_col,
            });
            continue;
        }

        // Reserved words `true`/`false` (case-insensitive), else identifier.
        if is_ident_start(cp) {
            let mut text = String::new();
            while pos < source.len() {
                let (c, w) = decode_codepoint(source, pos);
                if is_ident_continue(c) {
                    text.push((c as u8) as char);
                    advance_pos!(w, c);
                } else {
                    break;
                }
            }
            let kind = if text.eq_ignore_ascii_case("true") {
                TokenKind::Boolean(true)
            } else if text.eq_ignore_ascii_case("false") {
                TokenKind::Boolean(false)
            } else {
                TokenKind::Identifier(text)
            };
            tokens.push(Token {
                kind,
                line: start_line,
                col: start_col,
            });
            continue;
        }

        return Err(TokenizeError {
            message: format!("unexpected character {cp:#x}"),
            line: start_line,
            col: start_col,
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        line,
        col,
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src.as_bytes())
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn identifiers_and_operator() {
        let k = kinds("foo = 3\n");
        assert_eq!(
            k,
            vec![
                TokenKind::Identifier("foo".into()),
                TokenKind::Whitespace,
                TokenKind::Equals,
                TokenKind::Whitespace,
                TokenKind::NumericLiteral("3".into()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn negative_float_is_three_tokens() {
        let k = kinds("-1.5\n");
        assert_eq!(
            k,
            vec![
                TokenKind::Minus,
                TokenKind::NumericLiteral("1".into()),
                TokenKind::Dot,
                TokenKind::NumericLiteral("5".into()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn booleans_are_case_insensitive() {
        let k = kinds("TRUE False\n");
        assert_eq!(
            k,
            vec![
                TokenKind::Boolean(true),
                TokenKind::Whitespace,
                TokenKind::Boolean(false),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_comment_discards_through_newline() {
        let k = kinds("a = 1 // hi\nb = 2\n");
        assert!(k.contains(&TokenKind::Comment));
        // The newline that ends the comment is still emitted.
        assert_eq!(k.iter().filter(|t| **t == TokenKind::Newline).count(), 2);
    }

    #[test]
    fn string_literal_handles_escaped_backslash_then_quote() {
        // `"\\"` is a one-character string containing a single backslash.
        let k = kinds(r#""\\""#);
        assert_eq!(k[0], TokenKind::StringLiteral("\\".into()));
    }

    #[test]
    fn string_literal_handles_escaped_quote() {
        let k = kinds(r#""say \"hi\"""#);
        assert_eq!(k[0], TokenKind::StringLiteral("say \"hi\"".into()));
    }

    #[test]
    fn unterminated_string_fails() {
        assert!(tokenize(br#""unterminated"#).is_err());
    }

    #[test]
    fn invalid_character_fails() {
        assert!(tokenize(b"@").is_err());
    }

    #[test]
    fn invalid_utf8_substitutes_and_fails_on_unknown_char() {
        // A lone continuation byte decodes as codepoint -1, which then fails
        // as "any other character" rather than silently being accepted.
        let err = tokenize(&[0x80]).unwrap_err();
        assert_eq!(err.line, 1);
    }
}
