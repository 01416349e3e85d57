//! Recursive-descent parser for the supported CSS selector subset.
//!
//! Supported: type and universal selectors, `#id`, `.class`, attribute
//! selectors with all CSS2/3 operators and the `i`/`s` flags, the four
//! combinators (descendant, `>`, `+`, `~`) and comma-separated groups.
//! Pseudo-classes, pseudo-elements, namespaces and escapes are rejected.

use super::SelectorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttrOp {
    Exists,
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttrCondition {
    pub name: String,
    pub op: AttrOp,
    pub value: String,
    pub case_insensitive: bool,
}

/// A compound selector: everything between two combinators.
///
/// A `None` tag means universal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Compound {
    pub tag: Option<String>,
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrCondition>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.ids.is_empty()
            && self.classes.is_empty()
            && self.attrs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Part {
    pub compound: Compound,
    /// Relation to the part on the left; `None` for the leftmost part.
    pub combinator: Option<Combinator>,
}

/// A complex selector, leftmost part first.
pub(crate) type Complex = Vec<Part>;

/// Parse a selector (possibly a comma-separated group) into its complex selectors.
pub(crate) fn parse_selector(source: &str) -> Result<Vec<Complex>, SelectorError> {
    if source.trim().is_empty() {
        return Err(SelectorError::Empty {
            selector: source.to_string(),
        });
    }

    let mut parser = Parser::new(source);
    let mut groups = Vec::new();
    loop {
        groups.push(parser.complex()?);
        parser.skip_ws();
        match parser.peek() {
            None => break,
            Some(',') => parser.bump(),
            Some(c) => return Err(parser.unexpected(c)),
        }
    }
    Ok(groups)
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    /// Skip whitespace, returning whether any was consumed.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos > start
    }

    fn unexpected(&self, found: char) -> SelectorError {
        SelectorError::Unexpected {
            selector: self.source.to_string(),
            position: self.pos,
            found,
        }
    }

    fn unexpected_end(&self, expected: &'static str) -> SelectorError {
        SelectorError::UnexpectedEnd {
            selector: self.source.to_string(),
            expected,
        }
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        self.skip_ws();
        let mut parts = vec![Part {
            compound: self.compound()?,
            combinator: None,
        }];

        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if had_ws => Combinator::Descendant,
                Some(c) => return Err(self.unexpected(c)),
            };

            if combinator != Combinator::Descendant {
                self.bump();
                self.skip_ws();
                if matches!(self.peek(), None | Some(',')) {
                    return Err(SelectorError::DanglingCombinator {
                        selector: self.source.to_string(),
                    });
                }
            }

            parts.push(Part {
                compound: self.compound()?,
                combinator: Some(combinator),
            });
        }

        Ok(parts)
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut universal = false;

        match self.peek() {
            Some('*') => {
                self.bump();
                universal = true;
            }
            Some(c) if is_ident_start(c) => {
                compound.tag = Some(self.ident("a tag name")?.to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.ids.push(self.ident("an id")?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.ident("a class name")?);
                }
                Some('[') => {
                    self.bump();
                    compound.attrs.push(self.attribute()?);
                }
                Some(':') => return Err(self.unsupported()),
                Some('\\') | Some('|') => return Err(self.unsupported()),
                _ => break,
            }
        }

        if !universal && compound.is_empty() {
            return match self.peek() {
                None => Err(self.unexpected_end("a selector")),
                Some(c) => Err(self.unexpected(c)),
            };
        }

        Ok(compound)
    }

    fn unsupported(&self) -> SelectorError {
        let syntax: String = self.chars[self.pos..]
            .iter()
            .take_while(|c| !c.is_whitespace() && !matches!(c, ',' | '>' | '+' | '~'))
            .collect();
        SelectorError::Unsupported {
            selector: self.source.to_string(),
            syntax,
        }
    }

    fn ident(&mut self, expected: &'static str) -> Result<String, SelectorError> {
        match self.peek() {
            None => return Err(self.unexpected_end(expected)),
            Some(c) if !is_ident_start(c) => return Err(self.unexpected(c)),
            Some(_) => {}
        }

        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    /// Parse the body of `[...]`; the opening bracket is already consumed.
    fn attribute(&mut self) -> Result<AttrCondition, SelectorError> {
        self.skip_ws();
        let name = self.ident("an attribute name")?.to_ascii_lowercase();
        self.skip_ws();

        let op = match (self.peek(), self.peek_at(1)) {
            (Some(']'), _) => {
                self.bump();
                return Ok(AttrCondition {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                    case_insensitive: false,
                });
            }
            (Some('='), _) => AttrOp::Equals,
            (Some('~'), Some('=')) => AttrOp::Includes,
            (Some('|'), Some('=')) => AttrOp::DashMatch,
            (Some('^'), Some('=')) => AttrOp::Prefix,
            (Some('$'), Some('=')) => AttrOp::Suffix,
            (Some('*'), Some('=')) => AttrOp::Substring,
            (Some(c), _) => return Err(self.unexpected(c)),
            (None, _) => return Err(self.unexpected_end("']'")),
        };
        self.pos += if op == AttrOp::Equals { 1 } else { 2 };
        self.skip_ws();

        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                self.quoted(quote)?
            }
            _ => self.ident("an attribute value")?,
        };
        self.skip_ws();

        let mut case_insensitive = false;
        match self.peek() {
            Some('i' | 'I') => {
                self.bump();
                case_insensitive = true;
                self.skip_ws();
            }
            Some('s' | 'S') => {
                self.bump();
                self.skip_ws();
            }
            _ => {}
        }

        match self.peek() {
            Some(']') => self.bump(),
            Some(c) => return Err(self.unexpected(c)),
            None => return Err(self.unexpected_end("']'")),
        }

        Ok(AttrCondition {
            name,
            op,
            value,
            case_insensitive,
        })
    }

    /// Read a quoted string; the opening quote is already consumed.
    fn quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.unexpected_end("a closing quote")),
                Some('\\') => {
                    self.bump();
                    match self.peek() {
                        Some(escaped) => {
                            value.push(escaped);
                            self.bump();
                        }
                        None => return Err(self.unexpected_end("an escaped character")),
                    }
                }
                Some(c) if c == quote => {
                    self.bump();
                    return Ok(value);
                }
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}
