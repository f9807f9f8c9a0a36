// ABOUTME: `linearMatch`: a token-by-token structural comparator between a
// ABOUTME: pattern tree (possibly containing type-variable symbols) and an actual tree,
// ABOUTME: used both directly by generic-instantiation/proc matching and indirectly via
// ABOUTME: `single_arg`'s named-type and structural-kind branches.

use crate::error::MatchErrorKind;
use crate::nif::{Cursor, Token, TokenBuffer};
use std::collections::HashMap;
use std::rc::Rc;

/// Walk `pattern` and `actual` in lockstep. The first occurrence of a type-variable
/// symbol in `pattern` binds it to the corresponding `actual` sub-tree; later
/// occurrences must structurally equal the binding. Returns the cursors
/// just past each consumed sub-tree on success.
pub fn linear_match(
    buf: &TokenBuffer,
    typevars: &mut HashMap<Rc<str>, Cursor>,
    pattern: Cursor,
    actual: Cursor,
) -> Result<(Cursor, Cursor), MatchErrorKind> {
    match buf.at(pattern) {
        Token::Ident(name) if name.starts_with('\'') => {
            let act_end = skip_subtree(buf, actual);
            if let Some(&bound) = typevars.get(name.as_ref()) {
                if !structural_eq(buf, bound, actual) {
                    return Err(MatchErrorKind::Mismatch);
                }
            } else {
                typevars.insert(name.clone(), actual);
            }
            Ok((buf.advance(pattern), act_end))
        }
        Token::ParLe(tag) => {
            let act_tag = buf.at(actual).par_le_tag().ok_or(MatchErrorKind::Mismatch)?;
            if act_tag != tag.as_ref() {
                return Err(MatchErrorKind::Mismatch);
            }
            let mut p = buf.advance(pattern);
            let mut a = buf.advance(actual);
            loop {
                match (buf.at(p), buf.at(a)) {
                    (Token::ParRi, Token::ParRi) => {
                        return Ok((buf.advance(p), buf.advance(a)));
                    }
                    (Token::ParRi, _) | (_, Token::ParRi) => {
                        return Err(MatchErrorKind::FormalParamsMismatch);
                    }
                    _ => {
                        let (np, na) = linear_match(buf, typevars, p, a)?;
                        p = np;
                        a = na;
                    }
                }
            }
        }
        pat_tok => {
            if !atoms_equal(pat_tok, buf.at(actual)) {
                return Err(MatchErrorKind::Mismatch);
            }
            Ok((buf.advance(pattern), buf.advance(actual)))
        }
    }
}

/// Structural equality between two sub-trees, with no type-variable binding (used to
/// check a rematch against an already-bound type variable).
pub fn structural_eq(buf: &TokenBuffer, a: Cursor, b: Cursor) -> bool {
    match (buf.at(a), buf.at(b)) {
        (Token::ParLe(ta), Token::ParLe(tb)) => {
            if ta != tb {
                return false;
            }
            let mut ca = buf.advance(a);
            let mut cb = buf.advance(b);
            loop {
                match (buf.at(ca), buf.at(cb)) {
                    (Token::ParRi, Token::ParRi) => return true,
                    (Token::ParRi, _) | (_, Token::ParRi) => return false,
                    _ => {
                        if !structural_eq(buf, ca, cb) {
                            return false;
                        }
                        ca = skip_subtree(buf, ca);
                        cb = skip_subtree(buf, cb);
                    }
                }
            }
        }
        (x, y) => atoms_equal(x, y),
    }
}

fn atoms_equal(a: &Token, b: &Token) -> bool {
    match (a, b) {
        (Token::Ident(x), Token::Ident(y)) => x == y,
        (Token::Symbol(x), Token::Symbol(y)) => x == y,
        (Token::Ident(x), Token::Symbol(y)) | (Token::Symbol(x), Token::Ident(y)) => x == y,
        (Token::IntLit(x), Token::IntLit(y)) => x == y,
        (Token::UIntLit(x), Token::UIntLit(y)) => x == y,
        (Token::FloatLit(x), Token::FloatLit(y)) => x == y,
        (Token::StringLit(x), Token::StringLit(y)) => x == y,
        (Token::CharLit(x), Token::CharLit(y)) => x == y,
        (Token::DotToken, Token::DotToken) => true,
        _ => false,
    }
}

pub(crate) fn skip_subtree(buf: &TokenBuffer, cursor: Cursor) -> Cursor {
    match buf.at(cursor) {
        Token::ParLe(_) => buf.skip_to_matching_close(cursor),
        _ => buf.advance(cursor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_typevar_on_first_occurrence() {
        let buf = TokenBuffer::new(vec![
            Token::Ident(Rc::from("'T")),
            Token::Ident(Rc::from("int32")),
        ]);
        let mut tv = HashMap::new();
        let (p, a) = linear_match(&buf, &mut tv, Cursor::new(0), Cursor::new(1)).unwrap();
        assert_eq!(p.index(), 1);
        assert_eq!(a.index(), 2);
        assert_eq!(tv.get("'T").unwrap().index(), 1);
    }

    #[test]
    fn second_occurrence_must_structurally_match_binding() {
        let buf = TokenBuffer::new(vec![
            Token::ParLe(Rc::from("pair")),
            Token::Ident(Rc::from("'T")),
            Token::Ident(Rc::from("'T")),
            Token::ParRi,
            Token::ParLe(Rc::from("pair")),
            Token::Ident(Rc::from("int32")),
            Token::Ident(Rc::from("int64")),
            Token::ParRi,
        ]);
        let mut tv = HashMap::new();
        let err = linear_match(&buf, &mut tv, Cursor::new(0), Cursor::new(4)).unwrap_err();
        assert_eq!(err, MatchErrorKind::Mismatch);
    }

    #[test]
    fn nested_structural_tags_must_agree() {
        let buf = TokenBuffer::new(vec![
            Token::ParLe(Rc::from("ptr")),
            Token::Ident(Rc::from("int32")),
            Token::ParRi,
            Token::ParLe(Rc::from("ref")),
            Token::Ident(Rc::from("int32")),
            Token::ParRi,
        ]);
        let mut tv = HashMap::new();
        assert!(linear_match(&buf, &mut tv, Cursor::new(0), Cursor::new(3)).is_err());
    }
}
