// ABOUTME: A small arithmetic/comparison/list/mutation primitive library registered
// ABOUTME: directly into the global frame as `Value::Primitive` bindings.

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::{Arena, Value};
use std::rc::Rc;

/// Register the full supplemental primitive set into `env`'s frame.
pub fn register(env: &Rc<Environment>, arena: &Arena) {
    for (name, func) in PRIMITIVES {
        env.define(*name, arena.primitive(name, *func));
    }
}

type Prim = crate::value::PrimitiveFn;

const PRIMITIVES: &[(&str, Prim)] = &[
    ("+", add),
    ("-", sub),
    ("*", mul),
    ("/", div),
    ("=", num_eq),
    ("<", num_lt),
    (">", num_gt),
    ("<=", num_le),
    (">=", num_ge),
    ("cons", cons),
    ("car", car),
    ("cdr", cdr),
    ("list", list),
    ("length", length),
    ("null?", is_null),
    ("set-car!", set_car),
    ("set-cdr!", set_cdr),
];

/// The numeric tower used by the arithmetic/comparison primitives: an integer result
/// stays exact as long as every operand was an `Int`; a single `Float` operand promotes
/// the whole operation to `Float`.
#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

fn as_num(v: &Value, fname: &str, pos: usize) -> Result<Num, EvalError> {
    match v {
        Value::Int(i) => Ok(Num::Int(*i)),
        Value::Float(f) => Ok(Num::Float(*f)),
        other => Err(EvalError::type_error(fname, "number", other.type_name(), pos)),
    }
}

fn to_value(n: Num, arena: &Arena) -> Value {
    match n {
        Num::Int(i) => arena.int(i),
        Num::Float(f) => arena.float(f),
    }
}

fn to_f64(n: Num) -> f64 {
    match n {
        Num::Int(i) => i as f64,
        Num::Float(f) => f,
    }
}

fn fold_nums(
    args: &[Value],
    fname: &str,
    ident: Num,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> Result<Num, EvalError> {
    let mut acc = ident;
    for (i, arg) in args.iter().enumerate() {
        let n = as_num(arg, fname, i + 1)?;
        acc = match (acc, n) {
            (Num::Int(a), Num::Int(b)) => Num::Int(int_op(a, b)),
            (a, b) => Num::Float(float_op(to_f64(a), to_f64(b))),
        };
    }
    Ok(acc)
}

fn add(args: &[Value], _env: &Rc<Environment>, arena: &Arena) -> Result<Value, EvalError> {
    fold_nums(args, "+", Num::Int(0), |a, b| a + b, |a, b| a + b).map(|n| to_value(n, arena))
}

fn mul(args: &[Value], _env: &Rc<Environment>, arena: &Arena) -> Result<Value, EvalError> {
    fold_nums(args, "*", Num::Int(1), |a, b| a * b, |a, b| a * b).map(|n| to_value(n, arena))
}

fn sub(args: &[Value], _env: &Rc<Environment>, arena: &Arena) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity_mismatch("-", 1, 0));
    }
    let first = as_num(&args[0], "-", 1)?;
    if args.len() == 1 {
        let negated = match first {
            Num::Int(i) => Num::Int(-i),
            Num::Float(f) => Num::Float(-f),
        };
        return Ok(to_value(negated, arena));
    }
    let rest = fold_nums(&args[1..], "-", first, |a, b| a - b, |a, b| a - b)?;
    Ok(to_value(rest, arena))
}

fn div(args: &[Value], _env: &Rc<Environment>, arena: &Arena) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity_mismatch("/", 1, 0));
    }
    let first = to_f64(as_num(&args[0], "/", 1)?);
    if args.len() == 1 {
        return Ok(arena.float(1.0 / first));
    }
    let mut acc = first;
    for (i, arg) in args[1..].iter().enumerate() {
        let n = to_f64(as_num(arg, "/", i + 2)?);
        acc /= n;
    }
    Ok(arena.float(acc))
}

fn num_cmp(args: &[Value], fname: &str, op: fn(f64, f64) -> bool) -> Result<bool, EvalError> {
    if args.len() < 2 {
        return Err(EvalError::arity_mismatch(fname, 2, args.len()));
    }
    for w in args.windows(2) {
        let a = to_f64(as_num(&w[0], fname, 1)?);
        let b = to_f64(as_num(&w[1], fname, 2)?);
        if !op(a, b) {
            return Ok(false);
        }
    }
    Ok(true)
}

fn num_eq(args: &[Value], _env: &Rc<Environment>, arena: &Arena) -> Result<Value, EvalError> {
    Ok(arena.bool_(num_cmp(args, "=", |a, b| a == b)?))
}
fn num_lt(args: &[Value], _env: &Rc<Environment>, arena: &Arena) -> Result<Value, EvalError> {
    Ok(arena.bool_(num_cmp(args, "<", |a, b| a < b)?))
}
fn num_gt(args: &[Value], _env: &Rc<Environment>, arena: &Arena) -> Result<Value, EvalError> {
    Ok(arena.bool_(num_cmp(args, ">", |a, b| a > b)?))
}
fn num_le(args: &[Value], _env: &Rc<Environment>, arena: &Arena) -> Result<Value, EvalError> {
    Ok(arena.bool_(num_cmp(args, "<=", |a, b| a <= b)?))
}
fn num_ge(args: &[Value], _env: &Rc<Environment>, arena: &Arena) -> Result<Value, EvalError> {
    Ok(arena.bool_(num_cmp(args, ">=", |a, b| a >= b)?))
}

fn cons(args: &[Value], _env: &Rc<Environment>, arena: &Arena) -> Result<Value, EvalError> {
    let args = require_arity(args, "cons", 2)?;
    Ok(arena.cons(args[0].clone(), args[1].clone()))
}

fn car(args: &[Value], _env: &Rc<Environment>, _arena: &Arena) -> Result<Value, EvalError> {
    let args = require_arity(args, "car", 1)?;
    match &args[0] {
        Value::Pair(cell) => Ok(cell.borrow().car.clone()),
        other => Err(EvalError::type_error("car", "pair", other.type_name(), 1)),
    }
}

fn cdr(args: &[Value], _env: &Rc<Environment>, _arena: &Arena) -> Result<Value, EvalError> {
    let args = require_arity(args, "cdr", 1)?;
    match &args[0] {
        Value::Pair(cell) => Ok(cell.borrow().cdr.clone()),
        other => Err(EvalError::type_error("cdr", "pair", other.type_name(), 1)),
    }
}

fn list(args: &[Value], _env: &Rc<Environment>, arena: &Arena) -> Result<Value, EvalError> {
    Ok(arena.list(args))
}

fn length(args: &[Value], _env: &Rc<Environment>, arena: &Arena) -> Result<Value, EvalError> {
    let args = require_arity(args, "length", 1)?;
    let items = args[0]
        .list_to_vec()
        .ok_or_else(|| EvalError::type_error("length", "proper list", args[0].type_name(), 1))?;
    Ok(arena.int(items.len() as i64))
}

fn is_null(args: &[Value], _env: &Rc<Environment>, arena: &Arena) -> Result<Value, EvalError> {
    let args = require_arity(args, "null?", 1)?;
    Ok(arena.bool_(args[0].is_nil()))
}

fn set_car(args: &[Value], _env: &Rc<Environment>, arena: &Arena) -> Result<Value, EvalError> {
    let args = require_arity(args, "set-car!", 2)?;
    match &args[0] {
        Value::Pair(cell) => {
            cell.borrow_mut().car = args[1].clone();
            Ok(arena.nil())
        }
        other => Err(EvalError::type_error("set-car!", "pair", other.type_name(), 1)),
    }
}

fn set_cdr(args: &[Value], _env: &Rc<Environment>, arena: &Arena) -> Result<Value, EvalError> {
    let args = require_arity(args, "set-cdr!", 2)?;
    match &args[0] {
        Value::Pair(cell) => {
            cell.borrow_mut().cdr = args[1].clone();
            Ok(arena.nil())
        }
        other => Err(EvalError::type_error("set-cdr!", "pair", other.type_name(), 1)),
    }
}

fn require_arity<'a>(args: &'a [Value], fname: &str, n: usize) -> Result<&'a [Value], EvalError> {
    if args.len() != n {
        Err(EvalError::arity_mismatch(fname, n, args.len()))
    } else {
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::eval;

    fn run(src: &str) -> Value {
        let arena = Arena::new();
        let env = Environment::new();
        register(&env, &arena);
        let forms = crate::reader::parse_string_all(&arena, src).unwrap();
        let mut result = arena.nil();
        for form in forms.list_to_vec().unwrap() {
            result = eval(form, env.clone(), &arena).unwrap();
        }
        result
    }

    #[test]
    fn arithmetic_promotes_to_float_on_mixed_operands() {
        assert_eq!(run("(+ 1 2 3)"), Value::Int(6));
        assert_eq!(run("(+ 1 2.5)"), Value::Float(3.5));
        assert_eq!(run("(- 5)"), Value::Int(-5));
        assert_eq!(run("(- 10 3 2)"), Value::Int(5));
        assert_eq!(run("(* 2 3 4)"), Value::Int(24));
    }

    #[test]
    fn comparisons_chain() {
        assert_eq!(run("(< 1 2 3)"), Value::Bool(true));
        assert_eq!(run("(< 1 3 2)"), Value::Bool(false));
    }

    #[test]
    fn list_primitives_round_trip() {
        assert_eq!(run("(car (cons 1 2))"), Value::Int(1));
        assert_eq!(run("(cdr (cons 1 2))"), Value::Int(2));
        assert_eq!(run("(length (list 1 2 3))"), Value::Int(3));
        assert_eq!(run("(null? (list))"), Value::Bool(true));
    }

    #[test]
    fn set_car_mutates_in_place() {
        assert_eq!(run("(define p (cons 1 2)) (set-car! p 9) (car p)"), Value::Int(9));
    }
}
