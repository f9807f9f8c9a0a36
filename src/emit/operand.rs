// ABOUTME: The operand grammar: registers and symbols pass through verbatim;
// ABOUTME: `(rel SYM)`, `(fs SYM)`, and the four memory-addressing shapes lower to
// ABOUTME: their Intel-syntax bracket forms.

use crate::error::{EmitError, SourcePos};
use crate::nif::{Cursor, Token, TokenBuffer};
use std::rc::Rc;

pub(crate) fn ident_at<'a>(buf: &'a TokenBuffer, cursor: Cursor) -> Result<(&'a str, Cursor), EmitError> {
    match buf.at(cursor).as_ident_or_symbol() {
        Some(s) => Ok((s, buf.advance(cursor))),
        None => Err(EmitError::new("operand", "expected a symbol", SourcePos::default())),
    }
}

fn expect_close(buf: &TokenBuffer, cursor: Cursor, rule: &str) -> Result<Cursor, EmitError> {
    if matches!(buf.at(cursor), Token::ParRi) {
        Ok(buf.advance(cursor))
    } else {
        Err(EmitError::new(rule, "expected a closing paren", SourcePos::default()))
    }
}

/// Emit one operand, returning its textual form and the cursor just past it.
pub fn emit_operand(buf: &TokenBuffer, cursor: Cursor) -> Result<(String, Cursor), EmitError> {
    match buf.at(cursor) {
        Token::Ident(name) | Token::Symbol(name) => Ok((name.to_string(), buf.advance(cursor))),
        Token::IntLit(n) => Ok((n.to_string(), buf.advance(cursor))),
        Token::UIntLit(n) => Ok((n.to_string(), buf.advance(cursor))),
        Token::ParLe(tag) => emit_tagged_operand(buf, tag, cursor),
        other => Err(EmitError::new(
            "operand",
            format!("unexpected token {other:?} in operand position"),
            SourcePos::default(),
        )),
    }
}

fn emit_tagged_operand(buf: &TokenBuffer, tag: &Rc<str>, cursor: Cursor) -> Result<(String, Cursor), EmitError> {
    let c = buf.advance(cursor);
    match tag.as_ref() {
        "rel" => {
            let (sym, c) = ident_at(buf, c)?;
            let c = expect_close(buf, c, "rel")?;
            Ok((format!("[rip+{sym}]"), c))
        }
        "fs" => {
            let (sym, c) = ident_at(buf, c)?;
            let c = expect_close(buf, c, "fs")?;
            Ok((format!("fs:[{sym}@TPOFF]"), c))
        }
        "byte" => {
            let (inner, c) = emit_operand(buf, c)?;
            let c = expect_close(buf, c, "byte")?;
            Ok((format!("BYTE PTR {inner}"), c))
        }
        "word" => {
            let (inner, c) = emit_operand(buf, c)?;
            let c = expect_close(buf, c, "word")?;
            Ok((format!("WORD PTR {inner}"), c))
        }
        "mem1" => {
            let (p, c) = emit_operand(buf, c)?;
            let c = expect_close(buf, c, "mem1")?;
            Ok((format!("[{p}]"), c))
        }
        "mem2" => {
            let (p1, c) = emit_operand(buf, c)?;
            let (p2, c) = emit_operand(buf, c)?;
            let c = expect_close(buf, c, "mem2")?;
            Ok((format!("[{p1}+{p2}]"), c))
        }
        "mem3" => {
            let (p1, c) = emit_operand(buf, c)?;
            let (p2, c) = emit_operand(buf, c)?;
            let (scale, c) = emit_operand(buf, c)?;
            let c = expect_close(buf, c, "mem3")?;
            Ok((format!("[{p1}+{p2}*{scale}]"), c))
        }
        "mem4" => {
            let (p1, c) = emit_operand(buf, c)?;
            let (p2, c) = emit_operand(buf, c)?;
            let (scale, c) = emit_operand(buf, c)?;
            let (disp, c) = emit_operand(buf, c)?;
            let c = expect_close(buf, c, "mem4")?;
            Ok((format!("[{p1}+{p2}*{scale}+{disp}]"), c))
        }
        other => Err(EmitError::new(
            "operand",
            format!("unknown operand form '{other}'"),
            SourcePos::default(),
        )),
    }
}
