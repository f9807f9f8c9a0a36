// ABOUTME: The thin CLI collaborator: reads a single source file,
// ABOUTME: dispatches on its extension to either the eval pipeline or the emitter, and
// ABOUTME: prints `[Error] file(line, col): message` on any failure before exiting
// ABOUTME: non-zero — this binary owns file I/O and process exit, the core never does.

use clap::Parser;
use l0c::config;
use l0c::emit;
use l0c::error::{CoreError, ReadError, SourcePos};
use l0c::eval::eval;
use l0c::macros::macroexpand;
use l0c::nif::{Cursor, Token, TokenBuffer};
use l0c::prelude;
use l0c::reader::{parse_string_all, ParseStatus, ParseStatusKind};
use l0c::value::{Arena, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

/// L0 evaluator, sigmatch, and the AMD64 emitter, driven from a single source file.
#[derive(Parser, Debug)]
#[command(name = "l0c")]
#[command(version = config::VERSION)]
#[command(about = config::BANNER)]
struct CliArgs {
    /// Source file: `.nif` is run through the assembly emitter, anything else through
    /// the evaluator.
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let display_path = args.file.display().to_string();

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            report(&display_path, 0, 0, format!("cannot read file: {e}"));
            return ExitCode::FAILURE;
        }
    };

    let is_nif = args.file.extension().and_then(|e| e.to_str()) == Some("nif");

    let result = if is_nif {
        run_emit(&source)
    } else {
        run_eval(&source)
    };

    match result {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let pos = e.pos();
            report(&display_path, pos.line, pos.col, e);
            ExitCode::FAILURE
        }
    }
}

/// `[Error] file(line, col): message`, the uniform diagnostic shared by every pipeline
/// stage.
fn report(file: &str, line: u32, col: u32, message: impl std::fmt::Display) {
    println!("[Error] {file}({line}, {col}): {message}");
}

/// `ParseStatus` (the reader's own status record) carries no `ReadError`; map its kind
/// across and keep its line/col, since `ReadError` itself carries no position.
fn read_error(status: &ParseStatus) -> CoreError {
    let kind = match status.kind {
        ParseStatusKind::UnexpectedEof => ReadError::UnexpectedEof,
        ParseStatusKind::InvalidSyntax => ReadError::InvalidSyntax(status.message.clone()),
        ParseStatusKind::Memory => ReadError::Memory,
        ParseStatusKind::Runtime => ReadError::Runtime(status.message.clone()),
    };
    CoreError::read(kind, SourcePos::new(status.line, status.col))
}

/// parse → macroexpand → eval, printing the last top-level form's result.
fn run_eval(source: &str) -> Result<String, CoreError> {
    let arena = Arena::new();
    let env = l0c::env::Environment::new();
    prelude::register(&env, &arena);

    let forms = parse_string_all(&arena, source).map_err(|status| read_error(&status))?;
    let forms = forms.list_to_vec().expect("parse_string_all always yields a proper list");

    let mut last = arena.nil();
    for form in forms {
        let expanded = macroexpand(form, &env, &arena)?;
        last = eval(expanded, env.clone(), &arena)?;
    }
    Ok(format!("{last}\n"))
}

/// Lower the single `(stmts ...)` top-level form to a NIF token stream and hand it to the
/// grammar-directed emitter. Source files in this mode are plain L0 syntax whose every
/// list is tag-headed, which is exactly the shape `gen_module` expects.
fn run_emit(source: &str) -> Result<String, CoreError> {
    let arena = Arena::new();
    let forms = parse_string_all(&arena, source).map_err(|status| read_error(&status))?;
    let forms = forms.list_to_vec().expect("parse_string_all always yields a proper list");
    if forms.len() != 1 {
        return Err(CoreError::read(
            ReadError::InvalidSyntax("expected a single top-level 'stmts' form".to_string()),
            SourcePos::default(),
        ));
    }

    let mut tokens = Vec::new();
    lower_to_tokens(&forms[0], &mut tokens).map_err(|msg| {
        CoreError::read(ReadError::InvalidSyntax(msg), SourcePos::default())
    })?;
    let buf = TokenBuffer::new(tokens);

    Ok(emit::gen_module(&buf, Cursor::new(0))?)
}

/// Every NIF list is tag-headed: `(tag item…)` becomes `ParLe(tag) item… ParRi`. Atoms
/// carry straight across since `Value::Symbol`/`String` already wrap the same `Rc<str>`
/// the token buffer expects.
fn lower_to_tokens(value: &Value, out: &mut Vec<Token>) -> Result<(), String> {
    match value {
        Value::Int(n) => out.push(Token::IntLit(*n)),
        Value::Float(n) => out.push(Token::FloatLit(*n)),
        Value::Symbol(s) => out.push(Token::Ident(Rc::clone(s))),
        Value::String(s) => out.push(Token::StringLit(Rc::clone(s))),
        Value::Nil => return Err("unexpected empty list in NIF source".to_string()),
        Value::Pair(_) => {
            let items = value
                .list_to_vec()
                .ok_or_else(|| "improper list in NIF source".to_string())?;
            let tag = items
                .first()
                .and_then(Value::as_symbol)
                .ok_or_else(|| "list head must be a tag symbol".to_string())?
                .to_string();
            out.push(Token::ParLe(Rc::from(tag.as_str())));
            for item in &items[1..] {
                lower_to_tokens(item, out)?;
            }
            out.push(Token::ParRi);
        }
        other => return Err(format!("{} is not representable in NIF source", other.type_name())),
    }
    Ok(())
}
