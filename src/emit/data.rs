// ABOUTME: Data declarations: a symbol followed by
// ABOUTME: one or more typed items, each either a literal or a `(times N value)` repeat.

use crate::error::{EmitError, SourcePos};
use crate::nif::{Cursor, Token, TokenBuffer};

fn directive_for(tag: &str) -> &'static str {
    match tag {
        "string" => ".string",
        "byte" => ".byte",
        "word" => ".word",
        "long" => ".long",
        "quad" => ".quad",
        _ => unreachable!("emit_data_decl only dispatches known typed-item tags"),
    }
}

/// `(decl SYM item…)` → `SYM:` followed by one directive line per item.
pub fn emit_data_decl(buf: &TokenBuffer, cursor: Cursor, out: &mut String) -> Result<Cursor, EmitError> {
    let tag = buf
        .at(cursor)
        .par_le_tag()
        .ok_or_else(|| EmitError::new("DataDecl", "expected a tagged data declaration", SourcePos::default()))?;
    if tag != "decl" {
        return Err(EmitError::new("DataDecl", format!("expected 'decl', found '{tag}'"), SourcePos::default()));
    }
    let mut c = buf.advance(cursor);
    let sym = match buf.at(c).as_ident_or_symbol() {
        Some(s) => s.to_string(),
        None => return Err(EmitError::new("DataDecl", "expected a symbol name", SourcePos::default())),
    };
    c = buf.advance(c);
    out.push_str(&sym);
    out.push_str(":\n");

    loop {
        match buf.at(c).par_le_tag() {
            Some(item_tag @ ("string" | "byte" | "word" | "long" | "quad")) => {
                c = emit_data_item(buf, c, item_tag, out)?;
            }
            _ => break,
        }
    }

    if !matches!(buf.at(c), Token::ParRi) {
        return Err(EmitError::new("DataDecl", "data declaration not fully consumed", SourcePos::default()));
    }
    Ok(buf.advance(c))
}

fn emit_data_item(buf: &TokenBuffer, cursor: Cursor, tag: &str, out: &mut String) -> Result<Cursor, EmitError> {
    let directive = directive_for(tag);
    let c = buf.advance(cursor);

    let after = if buf.at(c).par_le_tag() == Some("times") {
        let nc = buf.advance(c);
        let (count, nc) = read_count(buf, nc)?;
        let (value, nc) = read_item_value(buf, nc, tag)?;
        if !matches!(buf.at(nc), Token::ParRi) {
            return Err(EmitError::new("times", "expected a closing paren", SourcePos::default()));
        }
        for _ in 0..count {
            out.push_str(directive);
            out.push(' ');
            out.push_str(&value);
            out.push('\n');
        }
        buf.advance(nc)
    } else {
        let (value, nc) = read_item_value(buf, c, tag)?;
        out.push_str(directive);
        out.push(' ');
        out.push_str(&value);
        out.push('\n');
        nc
    };

    if !matches!(buf.at(after), Token::ParRi) {
        return Err(EmitError::new(tag, "data item not fully consumed", SourcePos::default()));
    }
    Ok(buf.advance(after))
}

fn read_count(buf: &TokenBuffer, cursor: Cursor) -> Result<(i64, Cursor), EmitError> {
    match buf.at(cursor) {
        Token::IntLit(n) => Ok((*n, buf.advance(cursor))),
        Token::UIntLit(n) => Ok((*n as i64, buf.advance(cursor))),
        _ => Err(EmitError::new("times", "expected an integer repeat count", SourcePos::default())),
    }
}

fn read_item_value(buf: &TokenBuffer, cursor: Cursor, tag: &str) -> Result<(String, Cursor), EmitError> {
    match (tag, buf.at(cursor)) {
        ("string", Token::StringLit(s)) => Ok((format!("\"{s}\""), buf.advance(cursor))),
        (_, Token::IntLit(n)) => Ok((n.to_string(), buf.advance(cursor))),
        (_, Token::UIntLit(n)) => Ok((n.to_string(), buf.advance(cursor))),
        (_, Token::CharLit(c)) => Ok(((*c as u32).to_string(), buf.advance(cursor))),
        _ => Err(EmitError::new("DataItem", "unexpected data item value", SourcePos::default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn string_and_quad_items_emit_directives() {
        let buf = TokenBuffer::new(vec![
            Token::ParLe(Rc::from("decl")),
            Token::Ident(Rc::from("greeting")),
            Token::ParLe(Rc::from("string")),
            Token::StringLit(Rc::from("hi")),
            Token::ParRi,
            Token::ParLe(Rc::from("quad")),
            Token::IntLit(42),
            Token::ParRi,
            Token::ParRi,
        ]);
        let mut out = String::new();
        emit_data_decl(&buf, Cursor::new(0), &mut out).unwrap();
        assert_eq!(out, "greeting:\n.string \"hi\"\n.quad 42\n");
    }

    #[test]
    fn times_repeats_the_value() {
        let buf = TokenBuffer::new(vec![
            Token::ParLe(Rc::from("decl")),
            Token::Ident(Rc::from("buf")),
            Token::ParLe(Rc::from("byte")),
            Token::ParLe(Rc::from("times")),
            Token::IntLit(3),
            Token::IntLit(0),
            Token::ParRi,
            Token::ParRi,
            Token::ParRi,
        ]);
        let mut out = String::new();
        emit_data_decl(&buf, Cursor::new(0), &mut out).unwrap();
        assert_eq!(out, "buf:\n.byte 0\n.byte 0\n.byte 0\n");
    }
}
