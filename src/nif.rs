// ABOUTME: The NIF token buffer and cursor: a flat, immutable sequence of tagged
// ABOUTME: tokens walked by forward-only cursors.
// ABOUTME: This is the wire format the overload resolver's type cursors and the
// ABOUTME: emitter's grammar recognisers both walk.

use std::rc::Rc;

/// A single NIF token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `(` opening a parenthesised form tagged with a symbol, e.g. `(stmts ...)`.
    ParLe(Rc<str>),
    ParRi,
    IntLit(i64),
    UIntLit(u64),
    FloatLit(f64),
    StringLit(Rc<str>),
    CharLit(char),
    Ident(Rc<str>),
    Symbol(Rc<str>),
    SymbolDef(Rc<str>),
    DotToken,
    UnknownToken,
    EofToken,
}

impl Token {
    pub fn par_le_tag(&self) -> Option<&str> {
        match self {
            Token::ParLe(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn as_ident_or_symbol(&self) -> Option<&str> {
        match self {
            Token::Ident(s) | Token::Symbol(s) | Token::SymbolDef(s) => Some(s),
            _ => None,
        }
    }
}

/// A forward-only index into a `TokenBuffer`. `Copy` and cheap to
/// clone for look-ahead; the buffer itself is never mutated during a pass, so cloning a
/// cursor is the only way to "rewind" (by discarding the advanced copy and keeping the
/// original).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(usize);

impl Cursor {
    pub const fn new(index: usize) -> Self {
        Cursor(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// An immutable flat sequence of tokens. Every recogniser in `sigmatch` and
/// `emit` takes a `&TokenBuffer` plus a `Cursor` and returns an advanced `Cursor`.
#[derive(Debug, Clone)]
pub struct TokenBuffer {
    tokens: Vec<Token>,
}

impl TokenBuffer {
    pub fn new(tokens: Vec<Token>) -> Self {
        TokenBuffer { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The token at `cursor`, or `Token::EofToken` past the end — callers never need to
    /// special-case running off the buffer.
    pub fn at(&self, cursor: Cursor) -> &Token {
        self.tokens.get(cursor.index()).unwrap_or(&Token::EofToken)
    }

    /// Advance one token forward. Saturates at the buffer length so repeatedly
    /// advancing past the end stays well-defined (always yields `EofToken`) instead of
    /// panicking — a grammar bug should surface as a recogniser returning an emitter
    /// error, never as an index panic.
    pub fn advance(&self, cursor: Cursor) -> Cursor {
        Cursor(cursor.index().saturating_add(1).min(self.tokens.len()))
    }

    pub fn skip(&self, cursor: Cursor, n: usize) -> Cursor {
        let mut c = cursor;
        for _ in 0..n {
            c = self.advance(c);
        }
        c
    }

    /// Find the cursor just past the `ParRi` matching the `ParLe` at `open` (which must
    /// point at a `ParLe`). Used by recognisers that bail out of a section without
    /// having consumed every token inside it, to resynchronise.
    pub fn skip_to_matching_close(&self, open: Cursor) -> Cursor {
        let mut depth = 0i32;
        let mut c = open;
        loop {
            match self.at(c) {
                Token::ParLe(_) => {
                    depth += 1;
                    c = self.advance(c);
                }
                Token::ParRi => {
                    depth -= 1;
                    c = self.advance(c);
                    if depth == 0 {
                        return c;
                    }
                }
                Token::EofToken => return c,
                _ => c = self.advance(c),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TokenBuffer {
        TokenBuffer::new(vec![
            Token::ParLe(Rc::from("stmts")),
            Token::Ident(Rc::from("x")),
            Token::ParRi,
        ])
    }

    #[test]
    fn advance_walks_forward_and_saturates() {
        let buf = sample();
        let mut c = Cursor::new(0);
        assert_eq!(buf.at(c).par_le_tag(), Some("stmts"));
        c = buf.advance(c);
        assert_eq!(buf.at(c).as_ident_or_symbol(), Some("x"));
        c = buf.advance(c);
        assert_eq!(buf.at(c), &Token::ParRi);
        c = buf.advance(c);
        assert_eq!(buf.at(c), &Token::EofToken);
        c = buf.advance(c);
        assert_eq!(buf.at(c), &Token::EofToken);
    }

    #[test]
    fn skip_to_matching_close_handles_nesting() {
        let buf = TokenBuffer::new(vec![
            Token::ParLe(Rc::from("outer")),
            Token::ParLe(Rc::from("inner")),
            Token::ParRi,
            Token::ParRi,
            Token::EofToken,
        ]);
        let after = buf.skip_to_matching_close(Cursor::new(0));
        assert_eq!(after.index(), 4);
    }
}
