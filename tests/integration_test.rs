// ABOUTME: Black-box pipeline tests: full parse -> macroexpand -> eval runs, an
// ABOUTME: overload-resolution disambiguation scenario, and an emitter round trip,
// ABOUTME: exercised entirely through the crate's public API.

use l0c::emit;
use l0c::env::Environment;
use l0c::error::MatchErrorKind;
use l0c::eval::eval;
use l0c::macros::macroexpand;
use l0c::nif::{Cursor, Token, TokenBuffer};
use l0c::prelude;
use l0c::reader::parse_string_all;
use l0c::sigmatch::{
    match_call, Candidate, CandidateKind, Comparison, InheritanceRegistry, Item,
};
use l0c::value::{Arena, Value};
use std::rc::Rc;

fn run_all(arena: &Arena, env: &Rc<Environment>, src: &str) -> Value {
    let forms = parse_string_all(arena, src).expect("source parses");
    let forms = forms.list_to_vec().unwrap();
    let mut last = arena.nil();
    for form in forms {
        let expanded = macroexpand(form, env, arena).expect("macroexpand succeeds");
        last = eval(expanded, env.clone(), arena).expect("eval succeeds");
    }
    last
}

#[test]
fn factorial_via_self_recursive_define_and_let() {
    let arena = Arena::new();
    let env = Environment::new();
    prelude::register(&env, &arena);

    let result = run_all(
        &arena,
        &env,
        "(define (fact n) (if (= n 0) 1 (* n (fact (- n 1))))) (fact 6)",
    );
    assert_eq!(result, Value::Int(720));
}

#[test]
fn define_macro_expands_before_evaluation() {
    let arena = Arena::new();
    let env = Environment::new();
    prelude::register(&env, &arena);

    let result = run_all(
        &arena,
        &env,
        "(define-macro (unless cond body) (list 'if cond (list 'quote 'skipped) body))
         (unless #f (+ 1 2))",
    );
    assert_eq!(result, Value::Int(3));
}

#[test]
fn tail_recursive_loop_does_not_overflow_the_rust_stack() {
    let arena = Arena::new();
    let env = Environment::new();
    prelude::register(&env, &arena);

    let result = run_all(
        &arena,
        &env,
        "(define (count-down n acc) (if (= n 0) acc (count-down (- n 1) (+ acc 1))))
         (count-down 200000 0)",
    );
    assert_eq!(result, Value::Int(200000));
}

#[test]
fn int_width_disambiguation_prefers_the_exact_match() {
    // f(int32) and f(int64) called with an int32 actual prefer the exact-match
    // overload over the one requiring an implicit widening.
    let mut tokens = vec![
        Token::ParLe(Rc::from("sig")),
        Token::ParLe(Rc::from("params")),
        Token::ParLe(Rc::from("param")),
        Token::Ident(Rc::from("int32")),
        Token::ParRi,
        Token::ParRi,
        Token::Ident(Rc::from("int32")),
        Token::ParRi,
        Token::ParLe(Rc::from("sig")),
        Token::ParLe(Rc::from("params")),
        Token::ParLe(Rc::from("param")),
        Token::Ident(Rc::from("int64")),
        Token::ParRi,
        Token::ParRi,
        Token::Ident(Rc::from("int64")),
        Token::ParRi,
    ];
    let wide_sig_cursor = Cursor::new(8);
    let actual_pos = tokens.len();
    tokens.push(Token::Ident(Rc::from("int32")));
    let buf = TokenBuffer::new(tokens);
    let actual = Cursor::new(actual_pos);

    let registry = InheritanceRegistry::new();
    let exact = Candidate { kind: CandidateKind::Proc, sym: 1, type_cursor: Cursor::new(0) };
    let widening = Candidate { kind: CandidateKind::Proc, sym: 2, type_cursor: wide_sig_cursor };

    let exact_state = match_call(&buf, &registry, &exact, &[Item::positional(Cursor::new(0), actual)], &[])
        .expect("int32 matches int32 exactly");
    let widening_state = match_call(&buf, &registry, &widening, &[Item::positional(Cursor::new(0), actual)], &[])
        .expect("int32 widens into int64");

    assert_eq!(exact_state.int_costs, 0);
    assert_eq!(widening_state.int_costs, 1);
    assert_eq!(
        l0c::sigmatch::cmp_matches(&exact_state.cost_vector(), &widening_state.cost_vector()),
        Comparison::FirstWins
    );
}

#[test]
fn derived_overload_wins_on_zero_inheritance_cost() {
    // f(Base) and f(Derived) called with a Derived actual prefer the Derived overload
    // via zero inheritance cost.
    let mut tokens = vec![
        Token::ParLe(Rc::from("sig")),
        Token::ParLe(Rc::from("params")),
        Token::ParLe(Rc::from("param")),
        Token::Ident(Rc::from("Base")),
        Token::ParRi,
        Token::ParRi,
        Token::Ident(Rc::from("Base")),
        Token::ParRi,
        Token::ParLe(Rc::from("sig")),
        Token::ParLe(Rc::from("params")),
        Token::ParLe(Rc::from("param")),
        Token::Ident(Rc::from("Derived")),
        Token::ParRi,
        Token::ParRi,
        Token::Ident(Rc::from("Derived")),
        Token::ParRi,
    ];
    let derived_sig_cursor = Cursor::new(8);
    let actual_pos = tokens.len();
    tokens.push(Token::Ident(Rc::from("Derived")));
    let buf = TokenBuffer::new(tokens);
    let actual = Cursor::new(actual_pos);

    let mut registry = InheritanceRegistry::new();
    registry.register("Derived", "Base");

    let base_overload = Candidate { kind: CandidateKind::Proc, sym: 1, type_cursor: Cursor::new(0) };
    let derived_overload = Candidate { kind: CandidateKind::Proc, sym: 2, type_cursor: derived_sig_cursor };

    let base_state = match_call(&buf, &registry, &base_overload, &[Item::positional(Cursor::new(0), actual)], &[])
        .expect("Derived coerces up to Base");
    let derived_state = match_call(&buf, &registry, &derived_overload, &[Item::positional(Cursor::new(0), actual)], &[])
        .expect("Derived matches Derived exactly");

    assert_eq!(
        l0c::sigmatch::cmp_matches(&derived_state.cost_vector(), &base_state.cost_vector()),
        Comparison::FirstWins
    );
}

#[test]
fn mismatched_argument_count_reports_too_few_arguments() {
    let tokens = vec![
        Token::ParLe(Rc::from("sig")),
        Token::ParLe(Rc::from("params")),
        Token::ParLe(Rc::from("param")),
        Token::Ident(Rc::from("int32")),
        Token::ParRi,
        Token::ParRi,
        Token::Ident(Rc::from("int32")),
        Token::ParRi,
    ];
    let buf = TokenBuffer::new(tokens);
    let registry = InheritanceRegistry::new();
    let candidate = Candidate { kind: CandidateKind::Proc, sym: 1, type_cursor: Cursor::new(0) };

    let err = match_call(&buf, &registry, &candidate, &[], &[]).unwrap_err();
    assert_eq!(err.kind, MatchErrorKind::TooFewArguments);
}

#[test]
fn gen_module_round_trips_the_peephole_scenario() {
    // Driven end to end through `gen_module` rather than the peephole unit in isolation.
    let buf = TokenBuffer::new(vec![
        Token::ParLe(Rc::from("stmts")),
        Token::ParLe(Rc::from("text")),
        Token::Ident(Rc::from("reduce")),
        Token::ParLe(Rc::from("mov")),
        Token::Ident(Rc::from("rax")),
        Token::IntLit(0),
        Token::ParRi,
        Token::ParLe(Rc::from("add")),
        Token::Ident(Rc::from("rbx")),
        Token::IntLit(1),
        Token::ParRi,
        Token::ParLe(Rc::from("sub")),
        Token::Ident(Rc::from("rcx")),
        Token::IntLit(1),
        Token::ParRi,
        Token::ParRi,
        Token::ParRi,
    ]);

    let out = emit::gen_module(&buf, Cursor::new(0)).expect("well-formed module emits");
    assert_eq!(
        out,
        ".intel_syntax noprefix\nreduce:\nxor rax, rax\ninc rbx\ndec rcx\n"
    );
}

#[test]
fn gen_module_round_trips_memory_addressing() {
    let buf = TokenBuffer::new(vec![
        Token::ParLe(Rc::from("stmts")),
        Token::ParLe(Rc::from("text")),
        Token::Ident(Rc::from("copy")),
        Token::ParLe(Rc::from("mov")),
        Token::Ident(Rc::from("rax")),
        Token::ParLe(Rc::from("mem3")),
        Token::Ident(Rc::from("rbx")),
        Token::Ident(Rc::from("rcx")),
        Token::IntLit(4),
        Token::ParRi,
        Token::ParRi,
        Token::ParRi,
        Token::ParRi,
    ]);

    let out = emit::gen_module(&buf, Cursor::new(0)).expect("well-formed module emits");
    assert_eq!(
        out,
        ".intel_syntax noprefix\ncopy:\nmov rax, [rbx+rcx*4]\n"
    );
}

#[test]
fn gen_module_rejects_an_unclosed_section() {
    let buf = TokenBuffer::new(vec![
        Token::ParLe(Rc::from("stmts")),
        Token::ParLe(Rc::from("global")),
        Token::Ident(Rc::from("main")),
        Token::ParRi,
    ]);
    assert!(emit::gen_module(&buf, Cursor::new(0)).is_err());
}
