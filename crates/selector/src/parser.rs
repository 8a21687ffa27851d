//! Selector text → ordered list of simple selectors
//!
//! A single left-to-right scan. The scanner keeps track of which token is open
//! (tag, `#id`, `.class`, `:pseudo`) and jumps over bracketed content (`[...]`,
//! `(...)`) as a whole, so nested text such as `:not(.foo[bar='>'])` never
//! leaks top-level delimiters. A backslash escapes the next character.
//!
//! Each part records how it relates to the part before it; combinators are
//! never separate list entries. A trailing combinator gets an implicit `*`.

use smallvec::SmallVec;
use std::fmt;

use crate::error::{Result, SelectorError};

/// How a part connects to the part before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// `>`
    Child,
    /// `~`
    Sibling,
    /// `+`
    Adjacent,
}

impl Combinator {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '>' => Some(Combinator::Child),
            '~' => Some(Combinator::Sibling),
            '+' => Some(Combinator::Adjacent),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Combinator::Child => '>',
            Combinator::Sibling => '~',
            Combinator::Adjacent => '+',
        }
    }
}

/// Attribute operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrOp {
    /// `[attr]`
    Exists,
    /// `=`
    Equals,
    /// `^=`
    Prefix,
    /// `$=`
    Suffix,
    /// `*=`
    Substring,
    /// `~=`
    Includes,
    /// `|=`
    DashMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSelector {
    pub name: String,
    pub op: AttrOp,
    /// Unquoted value, empty for `Exists`
    pub value: String,
}

/// A pseudo-class as written; resolved to a check by the predicate compiler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PseudoSpec {
    pub name: String,
    pub arg: Option<String>,
}

/// One simple selector plus its relation to the previous one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorPart {
    /// Tag name, `*` when none was written
    pub tag: String,
    pub id: Option<String>,
    pub classes: SmallVec<[String; 2]>,
    pub attrs: SmallVec<[AttrSelector; 1]>,
    pub pseudos: SmallVec<[PseudoSpec; 1]>,
    /// `None` for descendant (or the first part without a leading combinator)
    pub combinator: Option<Combinator>,
    /// Literal text of the simple selector
    pub source: String,
}

impl SelectorPart {
    fn universal() -> Self {
        Self {
            tag: "*".to_string(),
            id: None,
            classes: SmallVec::new(),
            attrs: SmallVec::new(),
            pseudos: SmallVec::new(),
            combinator: None,
            source: String::new(),
        }
    }

    pub fn is_universal(&self) -> bool {
        self.tag == "*"
    }

    /// Anything beyond the tag name to test
    pub fn has_filters(&self) -> bool {
        self.id.is_some()
            || !self.classes.is_empty()
            || !self.attrs.is_empty()
            || !self.pseudos.is_empty()
    }

    /// Memo key: combinator plus literal text
    pub fn key(&self) -> String {
        match self.combinator {
            Some(c) => format!("{} {}", c.symbol(), self.source),
            None => self.source.clone(),
        }
    }
}

impl fmt::Display for SelectorPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Split on top-level commas; empty alternatives are dropped
pub fn split_alternatives(selector: &str) -> Vec<&str> {
    let mut alternatives = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (pos, c) in selector.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                alternatives.push(selector[start..pos].trim());
                start = pos + 1;
            }
            _ => {}
        }
    }
    alternatives.push(selector[start..].trim());
    alternatives.retain(|alt| !alt.is_empty());
    alternatives
}

/// Parse one comma-free selector chain
pub fn parse(selector: &str) -> Result<Vec<SelectorPart>> {
    Parser::new(selector.trim()).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inside {
    Tag,
    Id,
    Class,
    Pseudo,
}

struct Parser<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    parts: Vec<SelectorPart>,
    current: SelectorPart,
    /// Whether `current` has seen any token yet
    started: bool,
    part_start: usize,
    pending: Option<Combinator>,
    inside: Inside,
    token_start: usize,
    buf: String,
    pseudo_arg: Option<String>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().collect(),
            parts: Vec::new(),
            current: SelectorPart::universal(),
            started: false,
            part_start: 0,
            pending: None,
            inside: Inside::Tag,
            token_start: 0,
            buf: String::new(),
            pseudo_arg: None,
        }
    }

    fn run(mut self) -> Result<Vec<SelectorPart>> {
        let mut i = 0;
        while i < self.chars.len() {
            let (pos, c) = self.chars[i];
            match c {
                '\\' => {
                    self.started = true;
                    if let Some(&(_, next)) = self.chars.get(i + 1) {
                        self.buf.push(next);
                        i += 1;
                    }
                }
                '#' => self.open(Inside::Id, pos)?,
                '.' => self.open(Inside::Class, pos)?,
                ':' => self.open(Inside::Pseudo, pos)?,
                '[' => {
                    self.close_token()?;
                    self.started = true;
                    let end = self.find_close(i, '[', ']')?;
                    let body = &self.src[pos + 1..self.chars[end].0];
                    let attr = parse_attribute(self.src, body)?;
                    self.current.attrs.push(attr);
                    i = end;
                }
                '(' => {
                    if self.inside != Inside::Pseudo {
                        return Err(self.unexpected(c, pos));
                    }
                    let end = self.find_close(i, '(', ')')?;
                    self.pseudo_arg = Some(self.src[pos + 1..self.chars[end].0].trim().to_string());
                    self.close_token()?;
                    i = end;
                }
                ']' | ')' | '\'' | '"' | ',' => return Err(self.unexpected(c, pos)),
                c if c.is_whitespace() || Combinator::from_char(c).is_some() => {
                    i = self.combinator(i)?;
                    continue;
                }
                c => {
                    self.started = true;
                    self.buf.push(c);
                }
            }
            i += 1;
        }

        self.close_part(self.src.len())?;
        if let Some(combinator) = self.pending.take() {
            let mut padding = SelectorPart::universal();
            padding.combinator = Some(combinator);
            padding.source = "*".to_string();
            self.parts.push(padding);
        }
        Ok(self.parts)
    }

    /// Close the open token and start a new one of `kind`
    fn open(&mut self, kind: Inside, pos: usize) -> Result<()> {
        self.close_token()?;
        self.started = true;
        self.inside = kind;
        self.token_start = pos;
        Ok(())
    }

    fn close_token(&mut self) -> Result<()> {
        let text = std::mem::take(&mut self.buf);
        match self.inside {
            Inside::Tag => {
                if !text.is_empty() {
                    if self.current.tag != "*" || self.current.has_filters() {
                        return Err(SelectorError::UnexpectedChar {
                            selector: self.src.to_string(),
                            found: text.chars().next().unwrap_or(' '),
                            position: self.token_start,
                        });
                    }
                    self.current.tag = text;
                }
            }
            Inside::Id => {
                self.current.id = Some(self.named(text)?);
            }
            Inside::Class => {
                let class = self.named(text)?;
                self.current.classes.push(class);
            }
            Inside::Pseudo => {
                let name = self.named(text)?.to_ascii_lowercase();
                self.current.pseudos.push(PseudoSpec {
                    name,
                    arg: self.pseudo_arg.take(),
                });
            }
        }
        self.inside = Inside::Tag;
        Ok(())
    }

    fn named(&self, text: String) -> Result<String> {
        if text.is_empty() {
            return Err(SelectorError::MissingName {
                selector: self.src.to_string(),
                position: self.token_start,
            });
        }
        Ok(text)
    }

    /// Finish the current part (if it has any content)
    fn close_part(&mut self, end: usize) -> Result<()> {
        self.close_token()?;
        if !self.started {
            return Ok(());
        }
        let mut part = std::mem::replace(&mut self.current, SelectorPart::universal());
        part.combinator = self.pending.take();
        part.source = self.src[self.part_start..end].trim().to_string();
        self.parts.push(part);
        self.started = false;
        Ok(())
    }

    /// Consume whitespace and at most one combinator starting at `i`
    fn combinator(&mut self, i: usize) -> Result<usize> {
        self.close_part(self.chars[i].0)?;

        let mut j = i;
        let mut found = None;
        while let Some(&(pos, c)) = self.chars.get(j) {
            if c.is_whitespace() {
                j += 1;
            } else if let Some(combinator) = Combinator::from_char(c) {
                if found.is_some() || self.pending.is_some() {
                    return Err(self.unexpected(c, pos));
                }
                found = Some(combinator);
                j += 1;
            } else {
                break;
            }
        }

        if found.is_some() {
            self.pending = found;
        }
        self.part_start = self.chars.get(j).map(|&(pos, _)| pos).unwrap_or(self.src.len());
        self.token_start = self.part_start;
        Ok(j)
    }

    /// Index of the `close` matching the `open` at `start`
    fn find_close(&self, start: usize, open: char, close: char) -> Result<usize> {
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut j = start;

        while let Some(&(_, c)) = self.chars.get(j) {
            match (quote, c) {
                (_, '\\') => j += 1,
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '\'' | '"') => quote = Some(c),
                (None, c) if c == open => depth += 1,
                (None, c) if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(j);
                    }
                }
                _ => {}
            }
            j += 1;
        }

        let (open, position) = match quote {
            Some(q) => (q, self.chars[start].0),
            None => (open, self.chars[start].0),
        };
        Err(SelectorError::Unbalanced {
            selector: self.src.to_string(),
            open,
            position,
        })
    }

    fn unexpected(&self, found: char, position: usize) -> SelectorError {
        SelectorError::UnexpectedChar {
            selector: self.src.to_string(),
            found,
            position,
        }
    }
}

/// Parse the text between `[` and `]`
fn parse_attribute(selector: &str, body: &str) -> Result<AttrSelector> {
    let invalid = |reason: &str| SelectorError::InvalidAttribute {
        selector: selector.to_string(),
        reason: reason.to_string(),
    };

    let Some(eq) = body.find('=') else {
        let name = body.trim();
        if name.is_empty() {
            return Err(invalid("empty attribute name"));
        }
        return Ok(AttrSelector {
            name: unescape(name),
            op: AttrOp::Exists,
            value: String::new(),
        });
    };

    let (left, right) = (&body[..eq], &body[eq + 1..]);
    let (name, op) = match left.chars().last() {
        Some('^') => (&left[..left.len() - 1], AttrOp::Prefix),
        Some('$') => (&left[..left.len() - 1], AttrOp::Suffix),
        Some('*') => (&left[..left.len() - 1], AttrOp::Substring),
        Some('~') => (&left[..left.len() - 1], AttrOp::Includes),
        Some('|') => (&left[..left.len() - 1], AttrOp::DashMatch),
        Some(c) if !c.is_alphanumeric() && !matches!(c, '-' | '_' | ' ') => {
            return Err(invalid(&format!("unsupported operator '{}='", c)));
        }
        _ => (left, AttrOp::Equals),
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(invalid("empty attribute name"));
    }

    Ok(AttrSelector {
        name: unescape(name),
        op,
        value: unquote(right.trim()),
    })
}

/// Strip one level of matching quotes, then resolve escapes
pub(crate) fn unquote(value: &str) -> String {
    let bytes = value.as_bytes();
    let quoted = bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0];
    if quoted {
        unescape(&value[1..value.len() - 1])
    } else {
        unescape(value)
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
