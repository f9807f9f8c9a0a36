// ABOUTME: The peephole optimiser: a one-instruction lookahead buffer threaded
// ABOUTME: explicitly through the emitter as an object rather than a module-level
// ABOUTME: singleton, since rewrites must never cross a label or control-flow boundary.

/// One emitted instruction: a mnemonic plus its textual operands, post single-instruction
/// rewriting but pre cross-instruction rewriting.
#[derive(Debug, Clone, PartialEq)]
pub struct Instr {
    pub mnemonic: String,
    pub operands: Vec<String>,
}

/// Holds at most one not-yet-emitted instruction, so a later instruction can still
/// cause the earlier one to be dropped (rule 1) before it ever reaches the output.
#[derive(Debug, Default)]
pub struct Peephole {
    pending: Option<Instr>,
}

impl Peephole {
    pub fn new() -> Self {
        Peephole::default()
    }

    /// Feed one instruction through the optimiser, writing whatever the rules decide
    /// should be emitted (possibly nothing yet) to `out`.
    pub fn push(&mut self, mut instr: Instr, out: &mut String) {
        rewrite_single(&mut instr);
        if let Some(prev) = &self.pending {
            if prev.mnemonic == "mov" && instr.mnemonic == "mov" && prev.operands.first() == instr.operands.first() {
                // Rule 1: the dropped `prev` never reaches `out`.
                self.pending = Some(instr);
                return;
            }
        }
        self.flush(out);
        self.pending = Some(instr);
    }

    /// Emit any buffered instruction as-is. Called at the end of a text section and
    /// before a label/boundary reset, since a label may be the very next thing a
    /// dropped-mov rule would have looked past.
    pub fn flush(&mut self, out: &mut String) {
        if let Some(instr) = self.pending.take() {
            emit_line(&instr, out);
        }
    }

    /// A label or function boundary: flush, since rewrites must never cross one.
    pub fn reset(&mut self, out: &mut String) {
        self.flush(out);
    }
}

fn rewrite_single(instr: &mut Instr) {
    if instr.mnemonic == "mov" && instr.operands.len() == 2 && instr.operands[1] == "0" {
        instr.mnemonic = "xor".to_string();
        instr.operands[1] = instr.operands[0].clone();
    } else if instr.mnemonic == "add" && instr.operands.len() == 2 && instr.operands[1] == "1" {
        instr.mnemonic = "inc".to_string();
        instr.operands.truncate(1);
    } else if instr.mnemonic == "sub" && instr.operands.len() == 2 && instr.operands[1] == "1" {
        instr.mnemonic = "dec".to_string();
        instr.operands.truncate(1);
    }
}

fn emit_line(instr: &Instr, out: &mut String) {
    out.push_str(&instr.mnemonic);
    if !instr.operands.is_empty() {
        out.push(' ');
        out.push_str(&instr.operands.join(", "));
    }
    out.push('\n');
}
