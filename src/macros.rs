// ABOUTME: The macro table and the top-down `macroexpand` traversal. The table itself
// ABOUTME: is a plain binding in the global environment, not a side channel.

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::{Arena, Value};
use std::rc::Rc;

/// The symbol under which the macro table lives in the global environment.
pub const MACRO_TABLE_SYM: &str = "*macro-table*";

/// Ensure `*macro-table*` exists in the global frame, bound to the empty list. Safe to
/// call more than once; only the first call has an effect.
pub fn init_macro_table(global: &Rc<Environment>, arena: &Arena) {
    if !global.has_local(MACRO_TABLE_SYM) {
        global.define(MACRO_TABLE_SYM, arena.nil());
    }
}

/// Bind `name` to `transformer` in the macro table, consing onto the front of the
/// existing assoc list. A later `define-macro` of the same name shadows the earlier one
/// (lookup below takes the first match, i.e. the most recent).
pub fn define_macro(env: &Rc<Environment>, arena: &Arena, name: &str, transformer: Value) {
    let global = env.global();
    init_macro_table(&global, arena);
    let table = global.get(MACRO_TABLE_SYM).unwrap_or_else(|| arena.nil());
    let entry = arena.cons(arena.symbol(name), transformer);
    let new_table = arena.cons(entry, table);
    global.define(MACRO_TABLE_SYM, new_table);
}

/// Look up `name` in the macro table reachable from `env`, returning its transformer
/// closure if bound.
pub fn lookup_macro(env: &Rc<Environment>, name: &str) -> Option<Value> {
    let table = env.get(MACRO_TABLE_SYM)?;
    let mut cur = table;
    loop {
        match cur {
            Value::Pair(cell) => {
                let cell = cell.borrow();
                if let Value::Pair(entry) = &cell.car {
                    let entry = entry.borrow();
                    if entry.car.as_symbol() == Some(name) {
                        return Some(entry.cdr.clone());
                    }
                }
                cur = cell.cdr.clone();
            }
            _ => return None,
        }
    }
}

/// `macroexpand(expr, env, arena)` traverses the AST top-down. At every `Pair` whose
/// `car` is a `Symbol` the macro table binds to a transformer closure, the transformer
/// is applied to the *unevaluated* argument forms, and the result is recursively
/// macroexpanded. Non-macro forms are rewritten by recursing into `car` and `cdr`.
/// Quoted sub-forms are not expanded.
///
/// Known pitfall: the transformer contract does not guarantee
/// single-evaluation of its arguments — a transformer's body is free to splice an
/// unevaluated argument form into the output more than once, and if that form has a
/// side effect (e.g. `(define seen 1)`), evaluating the expanded code runs it once per
/// splice. This is implemented as literal tree substitution; avoiding the duplication
/// is the macro author's responsibility, not the expander's.
pub fn macroexpand(expr: Value, env: &Rc<Environment>, arena: &Arena) -> Result<Value, EvalError> {
    match &expr {
        Value::Pair(cell) => {
            let (car, cdr) = {
                let cell = cell.borrow();
                (cell.car.clone(), cell.cdr.clone())
            };

            if let Value::Symbol(name) = &car {
                if name.as_ref() == "quote" {
                    return Ok(expr);
                }
                if let Some(transformer) = lookup_macro(env, name) {
                    let args = cdr
                        .list_to_vec()
                        .ok_or_else(|| EvalError::Custom(format!("{name}: malformed macro call")))?;
                    let expanded = apply_transformer(&transformer, &args, env, arena)?;
                    return macroexpand(expanded, env, arena);
                }
            }

            let expanded_car = macroexpand(car, env, arena)?;
            let expanded_cdr = macroexpand(cdr, env, arena)?;
            Ok(arena.cons(expanded_car, expanded_cdr))
        }
        _ => Ok(expr),
    }
}

/// Invoke a transformer closure against raw, unevaluated argument forms: bind the
/// closure's parameters positionally to those forms in a fresh frame, then evaluate the
/// closure body (the macro template) in that frame to produce the expansion.
fn apply_transformer(
    transformer: &Value,
    raw_args: &[Value],
    env: &Rc<Environment>,
    arena: &Arena,
) -> Result<Value, EvalError> {
    match transformer {
        Value::Closure {
            params,
            body,
            captured_env,
        } => {
            if params.len() != raw_args.len() {
                return Err(EvalError::arity_mismatch(
                    "macro transformer",
                    params.len(),
                    raw_args.len(),
                ));
            }
            let frame = Environment::with_outer(captured_env.clone());
            for (param, arg) in params.iter().zip(raw_args.iter()) {
                frame.define(param.clone(), arg.clone());
            }
            let _ = env; // the transformer's own captured env takes precedence
            crate::eval::eval(body.as_ref().clone(), frame, arena)
        }
        other => Err(EvalError::NotApplicable(other.type_name().to_string())),
    }
}
