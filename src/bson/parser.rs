//! The BSON parser (spec §4.2): turns a token stream into a [`Tree`].

use std::fmt;

use super::token::{Token, TokenKind};
use super::tree::{Object, ObjectKind, Property, Tree, Value};

/// A parse failure, with the source position of the offending token.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// What went wrong.
    pub message: String,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub col: u32,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.col, self.message)
    }
}
impl std::error::Error for ParseError {}

struct Frame {
    object: Object,
    /// Name to attach this frame under when it's popped into its parent.
    /// `None` both for the (never attached) root and for array elements.
    attach_name: Option<String>,
}

struct Parser {
    stack: Vec<Frame>,
    pending_name: Option<String>,
    numeric_acc: Option<String>,
    numeric_negative: bool,
}

impl Parser {
    fn err(&self, token: &Token, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            line: token.line,
            col: token.col,
        }
    }

    fn top(&mut self) -> &mut Frame {
        self.stack.last_mut().expect("scope stack is never empty")
    }

    fn finish_numeric(&mut self, token: &Token) -> Result<(), ParseError> {
        let Some(acc) = self.numeric_acc.take() else {
            return Ok(());
        };
        let negative = std::mem::take(&mut self.numeric_negative);
        let text = if negative { format!("-{acc}") } else { acc };
        let value = if text.contains('.') {
            let f: f64 = text
                .parse()
                .map_err(|_| self.err(token, format!("invalid numeric literal {text:?}")))?;
            Value::Float(f as f32)
        } else {
            let i: i64 = text
                .parse()
                .map_err(|_| self.err(token, format!("invalid numeric literal {text:?}")))?;
            Value::Int(i)
        };
        self.attach_value(token, value)
    }

    fn attach_value(&mut self, token: &Token, value: Value) -> Result<(), ParseError> {
        let pending = self.pending_name.take();
        let frame = self.top();
        match frame.object.kind {
            ObjectKind::Object => {
                let name = pending
                    .ok_or_else(|| self.err(token, "expected `name = value`, got a bare value"))?;
                frame.object.properties.push(Property {
                    name: Some(name),
                    value,
                });
            }
            ObjectKind::Array => {
                frame.object.properties.push(Property { name: None, value });
            }
        }
        Ok(())
    }

    fn open_scope(&mut self, token: &Token, kind: ObjectKind) -> Result<(), ParseError> {
        self.finish_numeric(token)?;
        let pending = self.pending_name.take();
        let parent_kind = self.top().object.kind;
        if parent_kind == ObjectKind::Object && pending.is_none() {
            return Err(self.err(token, "expected `name = ` before an opening brace/bracket"));
        }
        let object = match kind {
            ObjectKind::Object => Object::new_object(),
            ObjectKind::Array => Object::new_array(),
        };
        self.stack.push(Frame {
            object,
            attach_name: pending,
        });
        Ok(())
    }

    fn close_scope(&mut self, token: &Token) -> Result<(), ParseError> {
        self.finish_numeric(token)?;
        if self.stack.len() == 1 {
            return Err(self.err(token, "unbalanced closing brace/bracket"));
        }
        let popped = self.stack.pop().unwrap();
        // NOTE: we intentionally don't check that `}` closed an object-kind
        // scope and `]` closed an array-kind one. The reference parser's
        // `ENSURE_IDENTIFIER` guard at every scope-close site is commented
        // out (spec §9), so malformed nesting like `foo = { 1 2 ]` is
        // accepted rather than rejected. We preserve that looseness here;
        // see DESIGN.md for the rationale.
        let frame = self.top();
        match frame.object.kind {
            ObjectKind::Object => {
                let name = popped.attach_name.ok_or_else(|| {
                    self.err(token, "closed scope has no name to attach under")
                })?;
                frame.object.properties.push(Property {
                    name: Some(name),
                    value: Value::Object(popped.object),
                });
            }
            ObjectKind::Array => {
                frame.object.properties.push(Property {
                    name: None,
                    value: Value::Object(popped.object),
                });
            }
        }
        Ok(())
    }
}

/// Parse a successful token sequence (from [`super::token::tokenize`]) into a
/// [`Tree`].
pub fn parse(tokens: &[Token]) -> Result<Tree, ParseError> {
    let mut p = Parser {
        stack: vec![Frame {
            object: Object::new_object(),
            attach_name: None,
        }],
        pending_name: None,
        numeric_acc: None,
        numeric_negative: false,
    };

    for token in tokens {
        match &token.kind {
            TokenKind::Comment => continue,

            TokenKind::Whitespace => {
                p.finish_numeric(token)?;
            }

            TokenKind::Identifier(name) => {
                if p.numeric_acc.is_some() {
                    return Err(p.err(token, "unexpected identifier while parsing a number"));
                }
                if p.top().object.kind != ObjectKind::Object {
                    return Err(p.err(token, "identifiers are only valid in object scope"));
                }
                if p.pending_name.is_some() {
                    return Err(p.err(token, "expected `=` after identifier"));
                }
                p.pending_name = Some(name.clone());
            }

            TokenKind::Equals => {
                if p.pending_name.is_none() {
                    return Err(p.err(token, "unexpected `=`"));
                }
            }

            TokenKind::Plus => {
                return Err(p.err(token, "`+` is not a supported operator"));
            }

            TokenKind::Minus => {
                if p.numeric_acc.is_some() {
                    return Err(p.err(token, "unexpected `-` inside a numeric literal"));
                }
                p.numeric_acc = Some(String::new());
                p.numeric_negative = true;
            }

            TokenKind::Dot => {
                if let Some(acc) = p.numeric_acc.as_mut() {
                    if acc.contains('.') {
                        return Err(p.err(token, "numeric literal has more than one `.`"));
                    }
                    acc.push('.');
                } else {
                    return Err(p.err(token, "`.` outside a numeric literal is not supported"));
                }
            }

            TokenKind::NumericLiteral(digits) => {
                p.numeric_acc.get_or_insert_with(String::new).push_str(digits);
            }

            TokenKind::StringLiteral(s) => {
                p.finish_numeric(token)?;
                p.attach_value(token, Value::String(s.clone()))?;
            }

            TokenKind::Boolean(b) => {
                p.finish_numeric(token)?;
                p.attach_value(token, Value::Bool(*b))?;
            }

            TokenKind::LBrace => p.open_scope(token, ObjectKind::Object)?,
            TokenKind::LBracket => p.open_scope(token, ObjectKind::Array)?,
            TokenKind::RBrace | TokenKind::RBracket => p.close_scope(token)?,

            TokenKind::Newline => {
                p.finish_numeric(token)?;
            }

            TokenKind::Eof => {
                p.finish_numeric(token)?;
                if p.stack.len() != 1 {
                    return Err(p.err(token, "unexpected end of input: a scope was never closed"));
                }
                if p.pending_name.is_some() {
                    return Err(p.err(token, "unexpected end of input: property has no value"));
                }
                break;
            }
        }
    }

    Ok(Tree {
        root: p.stack.pop().unwrap().object,
    })
}

/// Parse raw BSON source text directly, combining [`super::token::tokenize`]
/// and [`parse`].
pub fn parse_str(source: &str) -> anyhow::Result<Tree> {
    let tokens = super::token::tokenize(source.as_bytes())
        .map_err(|e| anyhow::anyhow!("bson tokenize error: {e}"))?;
    parse(&tokens).map_err(|e| anyhow::anyhow!("bson parse error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bson::tree::Value;

    #[test]
    fn scenario_1_round_trip() {
        let src = r#"
foo = 3
bar = "hi"
vec = "1.0 2.0 3.0"
sub = {
    x = true
    arr = [ 1 2 3 ]
}
"#;
        let tree = parse_str(src).unwrap();
        assert_eq!(tree.root.len(), 4);
        assert_eq!(tree.root.get_int("foo").unwrap(), 3);
        assert_eq!(tree.root.get_string("bar").unwrap(), "hi");
        assert_eq!(tree.root.get_vec3("vec").unwrap(), [1.0, 2.0, 3.0]);

        let sub = tree.root.get_object("sub").unwrap();
        assert!(sub.get_bool("x").unwrap());
        let arr = sub.get_object("arr").unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.get_int_at(0).unwrap(), 1);
        assert_eq!(arr.get_int_at(1).unwrap(), 2);
        assert_eq!(arr.get_int_at(2).unwrap(), 3);

        // Re-serializing and re-parsing yields the same tree.
        let text = super::super::writer::write(&tree);
        let tree2 = parse_str(&text).unwrap();
        assert_eq!(tree, tree2);
    }

    #[test]
    fn negative_float() {
        let tree = parse_str("x = -1.5\n").unwrap();
        assert_eq!(tree.root.get_float("x").unwrap(), -1.5);
    }

    #[test]
    fn negative_int() {
        let tree = parse_str("x = -7\n").unwrap();
        assert_eq!(tree.root.get_int("x").unwrap(), -7);
    }

    #[test]
    fn plus_is_unsupported() {
        assert!(parse_str("x = +1\n").is_err());
    }

    #[test]
    fn dot_outside_number_is_unsupported() {
        assert!(parse_str("foo.bar = 1\n").is_err());
    }

    #[test]
    fn unbalanced_scope_fails() {
        assert!(parse_str("x = {\n").is_err());
    }

    #[test]
    fn array_of_objects() {
        let src = "xs = [\n { a = 1 }\n { a = 2 }\n]\n";
        let tree = parse_str(src).unwrap();
        let xs = tree.root.get_object("xs").unwrap();
        assert_eq!(xs.len(), 2);
        assert_eq!(xs.get_object_at(0).unwrap().get_int("a").unwrap(), 1);
        assert_eq!(xs.get_object_at(1).unwrap().get_int("a").unwrap(), 2);
    }

    #[test]
    fn loose_scope_nesting_is_accepted() {
        // Mismatched `]`/`}` are accepted per spec §9 — the reference
        // parser's ENSURE_IDENTIFIER checks are disabled.
        let tree = parse_str("x = {\n a = 1\n]\n").unwrap();
        assert_eq!(
            tree.root.get_object("x").unwrap().get_int("a").unwrap(),
            1
        );
    }

    #[test]
    fn comments_are_skipped() {
        let tree = parse_str("// a comment\nx = 1 // trailing\n").unwrap();
        assert_eq!(tree.root.get_int("x").unwrap(), 1);
    }

    #[test]
    fn value_kind_is_int_not_float_without_dot() {
        let tree = parse_str("x = 3\n").unwrap();
        assert!(tree.root.get_object("x").is_err());
        assert_eq!(tree.root.get_int("x").unwrap(), 3);
        let _ = Value::Int(3); // kind asserted via get_int above
    }
}
