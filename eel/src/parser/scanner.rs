use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::Cell;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_\-]*").unwrap());
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?[0-9]+(?:\.[0-9]+)?").unwrap());
static SINGLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^'((?:\\'|[^'])*)'").unwrap());
static DOUBLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^"((?:\\"|[^"])*)""#).unwrap());
static BOOLEAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i:true|false)").unwrap());
static NOT_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^not\s+").unwrap());
static BANG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^!\s*").unwrap());

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_ws(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\x0b' | '\x0c')
}

/// Lexical matchers over an expression. Every matcher takes a byte offset and returns the
/// offset after the match; failures record the furthest offset reached for error reporting.
pub struct InputScanner<'l> {
    input: &'l str,
    furthest: Cell<usize>,
}

impl<'l> InputScanner<'l> {
    pub fn new(input: &'l str) -> InputScanner<'l> {
        InputScanner {
            input,
            furthest: Cell::new(0),
        }
    }

    pub fn input(&self) -> &'l str {
        self.input
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn furthest_failure(&self) -> usize {
        self.furthest.get()
    }

    fn rest(&self, pos: usize) -> &'l str {
        self.input.get(pos..).unwrap_or("")
    }

    fn fail<T>(&self, pos: usize) -> Option<T> {
        if pos > self.furthest.get() {
            self.furthest.set(pos);
        }
        None
    }

    pub fn peek(&self, pos: usize) -> Option<char> {
        self.rest(pos).chars().next()
    }

    pub fn skip_ws(&self, pos: usize) -> usize {
        let rest = self.rest(pos);
        pos + (rest.len() - rest.trim_start_matches(is_ws).len())
    }

    /// Matches `token` exactly at `pos`.
    pub fn exact(&self, pos: usize, token: &str) -> Option<usize> {
        if self.rest(pos).starts_with(token) {
            Some(pos + token.len())
        } else {
            self.fail(pos)
        }
    }

    /// Matches one of `tokens` at `pos`, first listed wins.
    pub fn one_of<T: Copy>(&self, pos: usize, tokens: &[(&str, T)]) -> Option<(T, usize)> {
        let rest = self.rest(pos);
        for (tok, val) in tokens {
            if rest.starts_with(tok) {
                return Some((*val, pos + tok.len()));
            }
        }
        self.fail(pos)
    }

    /// Matches a word operator such as `or`, which must be followed by one whitespace
    /// character. The returned offset is after that character.
    pub fn word_op(&self, pos: usize, word: &str) -> Option<usize> {
        let rest = self.rest(pos);
        if rest.starts_with(word) {
            if let Some(c) = rest[word.len()..].chars().next() {
                if is_ws(c) {
                    return Some(pos + word.len() + c.len_utf8());
                }
            }
        }
        self.fail(pos)
    }

    /// `!` with optional whitespace, or `not` with mandatory whitespace.
    pub fn not_op(&self, pos: usize) -> Option<usize> {
        let rest = self.rest(pos);
        BANG.find(rest)
            .or_else(|| NOT_WORD.find(rest))
            .map(|m| pos + m.end())
            .or_else(|| self.fail(pos))
    }

    pub fn identifier(&self, pos: usize) -> Option<(&'l str, usize)> {
        match IDENTIFIER.find(self.rest(pos)) {
            Some(m) => Some((m.as_str(), pos + m.end())),
            None => self.fail(pos),
        }
    }

    pub fn number(&self, pos: usize) -> Option<(&'l str, usize)> {
        match NUMBER.find(self.rest(pos)) {
            Some(m) => Some((m.as_str(), pos + m.end())),
            None => self.fail(pos),
        }
    }

    /// Case insensitive `true`/`false` not followed by an identifier character.
    pub fn boolean(&self, pos: usize) -> Option<(bool, usize)> {
        let rest = self.rest(pos);
        if let Some(m) = BOOLEAN.find(rest) {
            let followed_by_ident = rest[m.end()..].chars().next().is_some_and(is_ident_char);
            if !followed_by_ident {
                return Some((m.as_str().eq_ignore_ascii_case("true"), pos + m.end()));
            }
        }
        self.fail(pos)
    }

    /// A quoted string with only the matching quote unescaped.
    pub fn string(&self, pos: usize) -> Option<(String, usize)> {
        let rest = self.rest(pos);
        let (re, escaped, quote) = match rest.chars().next() {
            Some('\'') => (&*SINGLE_QUOTED, "\\'", "'"),
            Some('"') => (&*DOUBLE_QUOTED, "\\\"", "\""),
            _ => return self.fail(pos),
        };

        match re.captures(rest) {
            Some(caps) => {
                let whole = caps.get(0).map_or(0, |m| m.end());
                let content = caps.get(1).map_or("", |m| m.as_str());
                Some((content.replace(escaped, quote), pos + whole))
            }
            None => self.fail(pos),
        }
    }
}
