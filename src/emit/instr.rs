// ABOUTME: The x86-64 instruction repertoire: one recogniser
// ABOUTME: per mnemonic shape (zero/one/two operands, labels, jumps, comments), each
// ABOUTME: feeding the peephole optimiser rather than writing straight to the buffer.

use crate::emit::operand::{emit_operand, ident_at};
use crate::emit::peephole::{Instr, Peephole};
use crate::error::{EmitError, SourcePos};
use crate::nif::{Cursor, Token, TokenBuffer};

const TWO_OPERAND: &[&str] = &[
    "mov", "movapd", "movsd", "lea", "add", "sub", "mul", "imul", "div", "idiv", "xor", "or",
    "and", "shl", "shr", "sal", "sar", "addsd", "subsd", "mulsd", "divsd", "cmp", "test",
];
const ONE_OPERAND: &[&str] = &["push", "pop", "inc", "dec", "neg", "not", "call"];
const ZERO_OPERAND: &[&str] = &["nop", "ret", "syscall"];

fn is_jump(tag: &str) -> bool {
    tag.starts_with('j') && tag.len() > 1
}

fn is_setcc(tag: &str) -> bool {
    tag.starts_with("set") && tag.len() > 3
}

/// Emit one instruction form, returning the cursor just past its closing paren.
pub fn emit_instruction(
    buf: &TokenBuffer,
    cursor: Cursor,
    peephole: &mut Peephole,
    out: &mut String,
) -> Result<Cursor, EmitError> {
    let tag = buf
        .at(cursor)
        .par_le_tag()
        .ok_or_else(|| EmitError::new("Instruction", "expected a tagged instruction form", SourcePos::default()))?
        .to_string();
    let mut c = buf.advance(cursor);

    match tag.as_str() {
        "lab" | "looplab" => {
            let (sym, nc) = ident_at(buf, c)?;
            let sym = sym.to_string();
            c = nc;
            peephole.reset(out);
            out.push_str(&sym);
            out.push_str(":\n");
        }
        "comment" => {
            let text = match buf.at(c) {
                Token::StringLit(s) => s.to_string(),
                _ => return Err(EmitError::new("comment", "expected a string literal", SourcePos::default())),
            };
            c = buf.advance(c);
            peephole.flush(out);
            out.push_str("; ");
            out.push_str(&text);
            out.push('\n');
        }
        "jloop" => {
            let (target, nc) = ident_at(buf, c)?;
            let target = target.to_string();
            c = nc;
            peephole.push(Instr { mnemonic: "jmp".to_string(), operands: vec![target] }, out);
        }
        other if is_jump(other) || is_setcc(other) => {
            let (op, nc) = emit_operand(buf, c)?;
            c = nc;
            peephole.push(Instr { mnemonic: other.to_string(), operands: vec![op] }, out);
        }
        other if ZERO_OPERAND.contains(&other) => {
            peephole.push(Instr { mnemonic: other.to_string(), operands: vec![] }, out);
        }
        other if ONE_OPERAND.contains(&other) => {
            let (op, nc) = emit_operand(buf, c)?;
            c = nc;
            peephole.push(Instr { mnemonic: other.to_string(), operands: vec![op] }, out);
        }
        other if TWO_OPERAND.contains(&other) => {
            let (op1, nc) = emit_operand(buf, c)?;
            c = nc;
            let (op2, nc) = emit_operand(buf, c)?;
            c = nc;
            peephole.push(Instr { mnemonic: other.to_string(), operands: vec![op1, op2] }, out);
        }
        other => {
            return Err(EmitError::new("Instruction", format!("unknown mnemonic '{other}'"), SourcePos::default()))
        }
    }

    if !matches!(buf.at(c), Token::ParRi) {
        return Err(EmitError::new(&tag, "instruction form not fully consumed", SourcePos::default()));
    }
    Ok(buf.advance(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn run(tokens: Vec<Token>) -> String {
        let buf = TokenBuffer::new(tokens);
        let mut peephole = Peephole::new();
        let mut out = String::new();
        let mut c = Cursor::new(0);
        loop {
            if matches!(buf.at(c), Token::EofToken) {
                break;
            }
            c = emit_instruction(&buf, c, &mut peephole, &mut out).unwrap();
        }
        peephole.flush(&mut out);
        out
    }

    #[test]
    fn mem3_addressing_round_trips() {
        let out = run(vec![
            Token::ParLe(Rc::from("mov")),
            Token::Ident(Rc::from("rax")),
            Token::ParLe(Rc::from("mem3")),
            Token::Ident(Rc::from("rbx")),
            Token::Ident(Rc::from("rcx")),
            Token::IntLit(4),
            Token::ParRi,
            Token::ParRi,
        ]);
        assert_eq!(out, "mov rax, [rbx+rcx*4]\n");
    }

    #[test]
    fn jloop_lowers_to_jmp() {
        let out = run(vec![
            Token::ParLe(Rc::from("jloop")),
            Token::Ident(Rc::from("top")),
            Token::ParRi,
        ]);
        assert_eq!(out, "jmp top\n");
    }

    #[test]
    fn label_resets_peephole_state() {
        let out = run(vec![
            Token::ParLe(Rc::from("mov")),
            Token::Ident(Rc::from("rax")),
            Token::IntLit(1),
            Token::ParRi,
            Token::ParLe(Rc::from("lab")),
            Token::Ident(Rc::from("top")),
            Token::ParRi,
            Token::ParLe(Rc::from("mov")),
            Token::Ident(Rc::from("rax")),
            Token::IntLit(1),
            Token::ParRi,
        ]);
        assert_eq!(out, "mov rax, 1\ntop:\nmov rax, 1\n");
    }

    #[test]
    fn zero_operand_instructions_need_no_operands() {
        let out = run(vec![Token::ParLe(Rc::from("ret")), Token::ParRi]);
        assert_eq!(out, "ret\n");
    }
}
