// ABOUTME: The grammar-directed assembly emitter: `gen_module` walks a
// ABOUTME: NIF token stream and materialises Intel-syntax AMD64 assembly, one mutually
// ABOUTME: recursive recogniser per non-terminal, through the peephole optimiser.

pub mod data;
pub mod instr;
pub mod operand;
pub mod peephole;

use crate::error::{EmitError, SourcePos};
use crate::nif::{Cursor, Token, TokenBuffer};
use peephole::Peephole;

/// `genModule`: requires the outer `stmts` tag, emits the Intel
/// directive, then reads `Section`s until the matching close paren.
pub fn gen_module(buf: &TokenBuffer, start: Cursor) -> Result<String, EmitError> {
    if buf.at(start).par_le_tag() != Some("stmts") {
        return Err(EmitError::new("genModule", "expected the outer 'stmts' tag", SourcePos::default()));
    }
    let mut out = String::from(".intel_syntax noprefix\n");
    let mut c = buf.advance(start);
    loop {
        match buf.at(c) {
            Token::ParRi => {
                return Ok(out);
            }
            Token::EofToken => {
                return Err(EmitError::new("genModule", "unexpected end of stream", SourcePos::default()))
            }
            _ => c = emit_section(buf, c, &mut out)?,
        }
    }
}

fn require_ident(buf: &TokenBuffer, cursor: Cursor, rule: &str) -> Result<(String, Cursor), EmitError> {
    match buf.at(cursor).as_ident_or_symbol() {
        Some(s) => Ok((s.to_string(), buf.advance(cursor))),
        None => Err(EmitError::new(rule, "expected a symbol", SourcePos::default())),
    }
}

fn emit_section(buf: &TokenBuffer, cursor: Cursor, out: &mut String) -> Result<Cursor, EmitError> {
    let tag = buf
        .at(cursor)
        .par_le_tag()
        .ok_or_else(|| EmitError::new("Section", "expected a tagged section", SourcePos::default()))?
        .to_string();
    let mut c = buf.advance(cursor);

    match tag.as_str() {
        "global" => {
            let (sym, nc) = require_ident(buf, c, "global")?;
            c = nc;
            out.push_str("global ");
            out.push_str(&sym);
            out.push('\n');
        }
        "extern" => {
            let (sym, nc) = require_ident(buf, c, "extern")?;
            c = nc;
            out.push_str("extern ");
            out.push_str(&sym);
            out.push('\n');
        }
        "text" => {
            let (sym, nc) = require_ident(buf, c, "text")?;
            c = nc;
            out.push_str(&sym);
            out.push_str(":\n");
            let mut peephole = Peephole::new();
            while !matches!(buf.at(c), Token::ParRi) {
                c = instr::emit_instruction(buf, c, &mut peephole, out)?;
            }
            peephole.flush(out);
        }
        "data" => {
            out.push_str(".bss\n");
            while !matches!(buf.at(c), Token::ParRi) {
                c = data::emit_data_decl(buf, c, out)?;
            }
        }
        "rodata" => {
            out.push_str(".rodata\n");
            while !matches!(buf.at(c), Token::ParRi) {
                c = data::emit_data_decl(buf, c, out)?;
            }
        }
        other => return Err(EmitError::new("Section", format!("unknown section kind '{other}'"), SourcePos::default())),
    }

    if !matches!(buf.at(c), Token::ParRi) {
        return Err(EmitError::new(&tag, "section not fully consumed", SourcePos::default()));
    }
    Ok(buf.advance(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn empty_module_emits_only_the_directive() {
        let buf = TokenBuffer::new(vec![Token::ParLe(Rc::from("stmts")), Token::ParRi]);
        let out = gen_module(&buf, Cursor::new(0)).unwrap();
        assert_eq!(out, ".intel_syntax noprefix\n");
    }

    #[test]
    fn global_and_extern_directives() {
        let buf = TokenBuffer::new(vec![
            Token::ParLe(Rc::from("stmts")),
            Token::ParLe(Rc::from("global")),
            Token::Ident(Rc::from("main")),
            Token::ParRi,
            Token::ParLe(Rc::from("extern")),
            Token::Ident(Rc::from("printf")),
            Token::ParRi,
            Token::ParRi,
        ]);
        let out = gen_module(&buf, Cursor::new(0)).unwrap();
        assert_eq!(out, ".intel_syntax noprefix\nglobal main\nextern printf\n");
    }

    #[test]
    fn text_section_emits_a_label_then_instructions() {
        let buf = TokenBuffer::new(vec![
            Token::ParLe(Rc::from("stmts")),
            Token::ParLe(Rc::from("text")),
            Token::Ident(Rc::from("main")),
            Token::ParLe(Rc::from("mov")),
            Token::Ident(Rc::from("rax")),
            Token::IntLit(60),
            Token::ParRi,
            Token::ParLe(Rc::from("syscall")),
            Token::ParRi,
            Token::ParRi,
            Token::ParRi,
        ]);
        let out = gen_module(&buf, Cursor::new(0)).unwrap();
        assert_eq!(out, ".intel_syntax noprefix\nmain:\nmov rax, 60\nsyscall\n");
    }

    #[test]
    fn missing_stmts_tag_is_a_grammar_error() {
        let buf = TokenBuffer::new(vec![Token::ParLe(Rc::from("oops")), Token::ParRi]);
        assert!(gen_module(&buf, Cursor::new(0)).is_err());
    }
}
