// ABOUTME: Type-cursor head classification, so `singleArg` can dispatch by the kind of
// ABOUTME: the formal type. A type is a sub-tree of a `TokenBuffer`; this module
// ABOUTME: only answers "what shape is the tree rooted at this cursor", leaving the actual
// ABOUTME: matching logic to `single_arg` and `linear`.

use crate::nif::{Cursor, Token, TokenBuffer};
use std::rc::Rc;

/// The classified shape of a formal-type tree, read from its head token(s).
#[derive(Debug, Clone, PartialEq)]
pub enum TypeHead {
    /// A type-variable symbol, written `'T` in the token stream.
    TypeVar(Rc<str>),
    /// A nominal named type, e.g. `int32`, `MyObject`.
    Named(Rc<str>),
    Int(u8),
    UInt(u8),
    Float(u8),
    Char,
    Bool,
    Mut,
    Out,
    Lent,
    Sink,
    Static,
    Invoke,
    Range,
    Array,
    Set,
    UncheckedArray,
    OpenArray,
    Tuple,
    Ptr,
    Ref,
    Proc,
    Pointer,
    Cstring,
    Typedesc,
    Untyped,
    Typed,
    Varargs,
    Alias(Rc<str>),
    Unknown(Rc<str>),
}

const INTEGRAL_TAGS: &[&str] = &[
    "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32", "uint64", "float32",
    "float64",
];

fn bit_width(tag: &str) -> Option<u8> {
    tag.trim_start_matches(|c: char| c.is_alphabetic())
        .parse()
        .ok()
}

/// Classify the type tree at `cursor`. Returns the head plus the cursor just past the
/// head token (for atomic heads) or past the opening `ParLe` (for structural heads, so
/// callers can walk the children).
pub fn classify(buf: &TokenBuffer, cursor: Cursor) -> (TypeHead, Cursor) {
    match buf.at(cursor) {
        Token::Ident(name) if name.starts_with('\'') => {
            (TypeHead::TypeVar(Rc::from(name.as_ref())), buf.advance(cursor))
        }
        Token::Ident(name) | Token::Symbol(name) => {
            let head = classify_named(name);
            (head, buf.advance(cursor))
        }
        Token::ParLe(tag) => {
            let head = classify_tagged(tag);
            (head, buf.advance(cursor))
        }
        _ => (TypeHead::Unknown(Rc::from("?")), buf.advance(cursor)),
    }
}

fn classify_named(name: &Rc<str>) -> TypeHead {
    if name.as_ref() == "bool" {
        return TypeHead::Bool;
    }
    if name.as_ref() == "char" {
        return TypeHead::Char;
    }
    if INTEGRAL_TAGS.contains(&name.as_ref()) {
        let width = bit_width(name).unwrap_or(32);
        return if name.starts_with("uint") {
            TypeHead::UInt(width)
        } else if name.starts_with("float") {
            TypeHead::Float(width)
        } else {
            TypeHead::Int(width)
        };
    }
    TypeHead::Named(name.clone())
}

fn classify_tagged(tag: &Rc<str>) -> TypeHead {
    match tag.as_ref() {
        "mut" => TypeHead::Mut,
        "out" => TypeHead::Out,
        "lent" => TypeHead::Lent,
        "sink" => TypeHead::Sink,
        "static" => TypeHead::Static,
        "invoke" => TypeHead::Invoke,
        "range" => TypeHead::Range,
        "array" => TypeHead::Array,
        "set" => TypeHead::Set,
        "uarray" => TypeHead::UncheckedArray,
        "openarray" => TypeHead::OpenArray,
        "tuple" => TypeHead::Tuple,
        "ptr" => TypeHead::Ptr,
        "ref" => TypeHead::Ref,
        "proc" => TypeHead::Proc,
        "pointer" => TypeHead::Pointer,
        "cstring" => TypeHead::Cstring,
        "typedesc" => TypeHead::Typedesc,
        "untyped" => TypeHead::Untyped,
        "typed" => TypeHead::Typed,
        "varargs" => TypeHead::Varargs,
        "alias" => TypeHead::Alias(tag.clone()),
        other => TypeHead::Unknown(Rc::from(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_integral_widths() {
        let buf = TokenBuffer::new(vec![Token::Ident(Rc::from("int32"))]);
        let (head, _) = classify(&buf, Cursor::new(0));
        assert_eq!(head, TypeHead::Int(32));
    }

    #[test]
    fn classifies_type_variable_by_leading_quote() {
        let buf = TokenBuffer::new(vec![Token::Ident(Rc::from("'T"))]);
        let (head, _) = classify(&buf, Cursor::new(0));
        assert_eq!(head, TypeHead::TypeVar(Rc::from("'T")));
    }

    #[test]
    fn classifies_structural_tags() {
        let buf = TokenBuffer::new(vec![Token::ParLe(Rc::from("array"))]);
        let (head, _) = classify(&buf, Cursor::new(0));
        assert_eq!(head, TypeHead::Array);
    }
}
