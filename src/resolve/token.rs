//! Name reference tokens: `{{ fromName('<name>') }}`.
//!
//! Grammar, with `ws` meaning any run of whitespace:
//!
//! ```text
//! token := "{{" ws "fromName" ws "(" ws "'" name "'" ws ")" ws "}}"
//! name  := ( any char except "'" and "\" | "\'" | "\\" )+
//! ```
//!
//! A `{{` block whose expression does not start with `fromName` is not a
//! reference and is kept as literal text. Once `fromName` has been seen the
//! rest of the call must be well formed.

use crate::constants::{TOKEN_CLOSE, TOKEN_FUNCTION, TOKEN_OPEN};
use std::fmt;

/// A piece of a parsed string value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    /// Unescaped name as written in the token
    Reference(String),
}

/// A malformed `fromName` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenError {
    /// Byte offset into the scanned text
    pub offset: usize,
    pub detail: String,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at offset {})", self.detail, self.offset)
    }
}

impl std::error::Error for TokenError {}

/// Builds the token for `name`. Names are lowercased; quotes and backslashes
/// are escaped.
#[must_use]
pub fn format_reference(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        if c == '\'' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("{{{{ {TOKEN_FUNCTION}('{escaped}') }}}}")
}

/// Quick filter: can `text` contain a token at all?
#[must_use]
pub fn may_contain_reference(text: &str) -> bool {
    text.contains(TOKEN_OPEN) && text.contains(TOKEN_FUNCTION)
}

/// Splits `text` into literal runs and references.
///
/// # Errors
///
/// Returns the first malformed `fromName` call.
pub fn parse(text: &str) -> Result<Vec<Segment<'_>>, TokenError> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find(TOKEN_OPEN) {
        let open = cursor + found;
        let mut scanner = Scanner::new(text, open + TOKEN_OPEN.len());
        scanner.skip_ws();
        if !scanner.at_function() {
            cursor = open + TOKEN_OPEN.len();
            continue;
        }

        let (name, end) = scanner.finish_call()?;
        if open > literal_start {
            segments.push(Segment::Literal(&text[literal_start..open]));
        }
        segments.push(Segment::Reference(name));
        literal_start = end;
        cursor = end;
    }

    if literal_start < text.len() {
        segments.push(Segment::Literal(&text[literal_start..]));
    }
    Ok(segments)
}

/// Names referenced in `text`, in order of appearance.
///
/// # Errors
///
/// Returns the first malformed `fromName` call.
pub fn references(text: &str) -> Result<Vec<String>, TokenError> {
    Ok(parse(text)?
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Reference(name) => Some(name),
            Segment::Literal(_) => None,
        })
        .collect())
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    const fn new(text: &'a str, pos: usize) -> Self {
        Self { text, pos }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn at_function(&self) -> bool {
        let Some(after) = self.rest().strip_prefix(TOKEN_FUNCTION) else {
            return false;
        };
        !after
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
    }

    fn error(&self, detail: impl Into<String>) -> TokenError {
        TokenError {
            offset: self.pos,
            detail: detail.into(),
        }
    }

    fn expect(&mut self, literal: &str, what: &str) -> Result<(), TokenError> {
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            Ok(())
        } else {
            let found = self
                .rest()
                .chars()
                .next()
                .map_or_else(|| "end of text".to_string(), |c| format!("'{c}'"));
            Err(self.error(format!("expected {what}, found {found}")))
        }
    }

    /// Parses `( 'name' ) }}` after the function name; returns the name and
    /// the offset just past the closing braces.
    fn finish_call(mut self) -> Result<(String, usize), TokenError> {
        self.pos += TOKEN_FUNCTION.len();
        self.skip_ws();
        self.expect("(", "'(' after fromName")?;
        self.skip_ws();
        if self.rest().starts_with('"') {
            return Err(self.error("names must be enclosed in single quotes"));
        }
        self.expect("'", "a single-quoted name")?;
        let name = self.quoted_name()?;
        self.skip_ws();
        self.expect(")", "')' after the name")?;
        self.skip_ws();
        self.expect(TOKEN_CLOSE, "'}}' closing the reference")?;
        Ok((name, self.pos))
    }

    fn quoted_name(&mut self) -> Result<String, TokenError> {
        let start = self.pos;
        let mut name = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\'' => {
                    self.pos += i + 1;
                    if name.is_empty() {
                        return Err(TokenError {
                            offset: start,
                            detail: "empty name in fromName".to_string(),
                        });
                    }
                    return Ok(name);
                }
                '\\' => match chars.next() {
                    Some((_, escaped @ ('\'' | '\\'))) => name.push(escaped),
                    Some((_, other)) => {
                        name.push('\\');
                        name.push(other);
                    }
                    None => break,
                },
                _ => name.push(c),
            }
        }
        Err(TokenError {
            offset: start,
            detail: "unterminated name in fromName".to_string(),
        })
    }
}
