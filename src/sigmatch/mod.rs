// ABOUTME: The overload resolver: matches an argument list
// ABOUTME: against a candidate routine's formal parameters over a NIF token stream,
// ABOUTME: unifying type variables, accumulating conversion costs, and producing either
// ABOUTME: a `MatchState` ready for disambiguation or the first error encountered.

pub mod constraints;
pub mod disambiguate;
pub mod linear;
pub mod single_arg;
pub mod types;

use crate::error::{MatchError, MatchErrorKind};
use crate::nif::{Cursor, Token, TokenBuffer};
use std::collections::HashMap;
use std::rc::Rc;

pub use disambiguate::{cmp_matches, Comparison, CostVector};

/// What kind of entity `sym` names; only `Proc`-shaped candidates carry a calling
/// convention, but all three share the same signature grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Proc,
    Template,
    Macro,
}

/// `candidate = {kind, sym, type_cursor}`. `type_cursor` points at a
/// `(sig (generics …) (params …) returnType)` form.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub kind: CandidateKind,
    pub sym: u32,
    pub type_cursor: Cursor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Positional,
    Named(Rc<str>),
    ExplicitGeneric,
}

/// `Item{n, typ, kind}`: one actual-argument record. `n` is the
/// argument expression's own cursor (carried through for the coercion-wrapper output,
/// not inspected by the matcher itself); `typ` is its static type's cursor.
#[derive(Debug, Clone)]
pub struct Item {
    pub n: Cursor,
    pub typ: Cursor,
    pub kind: ItemKind,
}

impl Item {
    pub fn positional(n: Cursor, typ: Cursor) -> Self {
        Item { n, typ, kind: ItemKind::Positional }
    }
}

/// A synthetic "HconvX / OconvX" wrapper node recorded in the output buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Coercion {
    /// Hidden integral/floating widening conversion.
    HconvX,
    /// Object upcast along an inheritance chain of the given depth.
    OconvX { depth: i32 },
}

/// Match state, constructed per candidate and consumed by
/// the disambiguator.
#[derive(Debug, Clone)]
pub struct MatchState {
    pub typevars: HashMap<Rc<str>, Cursor>,
    pub candidate_sym: u32,
    pub candidate_kind: CandidateKind,
    pub coerced: Vec<Coercion>,
    pub error: Option<MatchError>,
    pub inheritance_costs: i32,
    pub int_costs: i32,
    pub param_pos: usize,
    pub return_type: Option<Cursor>,
}

impl MatchState {
    fn new(candidate: &Candidate) -> Self {
        MatchState {
            typevars: HashMap::new(),
            candidate_sym: candidate.sym,
            candidate_kind: candidate.kind,
            coerced: Vec::new(),
            error: None,
            inheritance_costs: 0,
            int_costs: 0,
            param_pos: 0,
            return_type: None,
        }
    }

    /// Only the first error is retained.
    fn record_first_error(&mut self, err: MatchError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    pub fn cost_vector(&self) -> CostVector {
        CostVector {
            inheritance_costs: self.inheritance_costs,
            int_costs: self.int_costs,
            inferred_count: self.typevars.len(),
        }
    }
}

/// A minimal nominal-object inheritance map plus a type-alias table: a tiny registry
/// for exercising the overload resolver's inheritance-walk branch. Built by the front
/// end that owns the symbol table; the matcher only ever reads it.
#[derive(Debug, Clone, Default)]
pub struct InheritanceRegistry {
    parents: HashMap<Rc<str>, Rc<str>>,
    aliases: HashMap<Rc<str>, Rc<str>>,
}

impl InheritanceRegistry {
    pub fn new() -> Self {
        InheritanceRegistry::default()
    }

    pub fn register(&mut self, child: &str, parent: &str) {
        self.parents.insert(Rc::from(child), Rc::from(parent));
    }

    pub fn register_alias(&mut self, alias: &str, target: &str) {
        self.aliases.insert(Rc::from(alias), Rc::from(target));
    }

    pub fn resolve_alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(|s| s.as_ref())
    }

    /// The number of `is-a` hops from `descendant` up to `ancestor`, or `None` if
    /// `ancestor` is not on `descendant`'s parent chain; the walk terminates when the
    /// parent is not a registered nominal object type.
    pub fn depth_to_ancestor(&self, descendant: &str, ancestor: &str) -> Option<i32> {
        if descendant == ancestor {
            return Some(0);
        }
        let mut depth = 0;
        let mut cur = descendant;
        while let Some(parent) = self.parents.get(cur) {
            depth += 1;
            if parent.as_ref() == ancestor {
                return Some(depth);
            }
            cur = parent.as_ref();
        }
        None
    }
}

struct Param {
    type_cursor: Cursor,
    default: Option<Cursor>,
}

struct Sig {
    generics: Vec<(Rc<str>, Option<Cursor>)>,
    params: Vec<Param>,
    return_type: Cursor,
}

/// Parse a `(sig (generics (tv 'T constraint)…) (params (param type [default])…)
/// returnType)` form.
fn parse_sig(buf: &TokenBuffer, sig: Cursor) -> Result<Sig, MatchErrorKind> {
    let tag = buf.at(sig).par_le_tag().filter(|t| *t == "sig");
    if tag.is_none() {
        return Err(MatchErrorKind::UnhandledType);
    }
    let mut c = buf.advance(sig);

    let mut generics = Vec::new();
    if buf.at(c).par_le_tag() == Some("generics") {
        c = buf.advance(c);
        loop {
            match buf.at(c).par_le_tag() {
                Some("tv") => {
                    let mut tv_c = buf.advance(c);
                    let name = match buf.at(tv_c).as_ident_or_symbol() {
                        Some(n) => Rc::<str>::from(n),
                        None => return Err(MatchErrorKind::UnhandledType),
                    };
                    tv_c = buf.advance(tv_c);
                    let constraint = if matches!(buf.at(tv_c), Token::ParRi) {
                        None
                    } else {
                        Some(tv_c)
                    };
                    generics.push((name, constraint));
                    c = buf.skip_to_matching_close(c);
                }
                _ => break,
            }
        }
        // consume the "generics" ParRi
        c = buf.advance(c);
    }

    if buf.at(c).par_le_tag() != Some("params") {
        return Err(MatchErrorKind::UnhandledType);
    }
    let mut p = buf.advance(c);
    let mut params = Vec::new();
    loop {
        match buf.at(p).par_le_tag() {
            Some("param") => {
                let type_cursor = buf.advance(p);
                let after_type = linear::skip_subtree(buf, type_cursor);
                let default = if buf.at(after_type).par_le_tag() == Some("default") {
                    Some(buf.advance(after_type))
                } else {
                    None
                };
                params.push(Param { type_cursor, default });
                p = buf.skip_to_matching_close(p);
            }
            _ => break,
        }
    }
    // consume the "params" ParRi
    let return_type = buf.advance(p);
    Ok(Sig { generics, params, return_type })
}

/// Run the full match algorithm for one candidate against one
/// argument list.
pub fn match_call(
    buf: &TokenBuffer,
    registry: &InheritanceRegistry,
    candidate: &Candidate,
    args: &[Item],
    explicit_generics: &[Cursor],
) -> Result<MatchState, MatchError> {
    let mut state = MatchState::new(candidate);
    let sig = match parse_sig(buf, candidate.type_cursor) {
        Ok(s) => s,
        Err(kind) => return Err(MatchError::new(kind, 0, "well-formed signature", "malformed")),
    };

    // Step 1: type-variable preparation.
    if !explicit_generics.is_empty() {
        if sig.generics.is_empty() {
            return Err(MatchError::new(MatchErrorKind::RoutineIsNotGeneric, 0, "0", explicit_generics.len().to_string()));
        }
        if explicit_generics.len() < sig.generics.len() {
            return Err(MatchError::new(
                MatchErrorKind::MissingExplicitGenericParameter,
                0,
                sig.generics.len().to_string(),
                explicit_generics.len().to_string(),
            ));
        }
        if explicit_generics.len() > sig.generics.len() {
            return Err(MatchError::new(
                MatchErrorKind::ExtraGenericParameter,
                0,
                sig.generics.len().to_string(),
                explicit_generics.len().to_string(),
            ));
        }
        for ((name, constraint), explicit) in sig.generics.iter().zip(explicit_generics.iter()) {
            if let Some(constraint) = constraint {
                match constraints::satisfies(buf, *constraint, *explicit) {
                    Ok(true) => {}
                    Ok(false) => {
                        return Err(MatchError::new(MatchErrorKind::ConstraintMismatch, 0, "constrained type", "explicit argument")
                            .with_typevar(name.to_string()));
                    }
                    Err(kind) => {
                        return Err(MatchError::new(kind, 0, "solvable constraint", "concept constraint")
                            .with_typevar(name.to_string()));
                    }
                }
            }
            state.typevars.insert(name.clone(), *explicit);
        }
    }

    // Step 2 + 3: parameter loop with default-value fallback.
    let mut arg_idx = 0usize;
    for (param_idx, param) in sig.params.iter().enumerate() {
        state.param_pos = param_idx + 1;
        let (head, _) = types::classify(buf, param.type_cursor);
        if head == types::TypeHead::Varargs {
            let inner = buf.advance(param.type_cursor);
            while arg_idx < args.len() {
                if let Err(kind) = single_arg::single_arg(buf, &mut state, registry, inner, &args[arg_idx], false) {
                    let err = MatchError::new(kind, arg_idx + 1, "varargs element", "argument");
                    state.record_first_error(err.clone());
                    return Err(err);
                }
                arg_idx += 1;
            }
            continue;
        }

        if arg_idx >= args.len() {
            if param.default.is_some() {
                continue;
            }
            let err = MatchError::new(MatchErrorKind::TooFewArguments, param_idx + 1, "argument", "nothing");
            state.record_first_error(err.clone());
            return Err(err);
        }

        if let Err(kind) = single_arg::single_arg(buf, &mut state, registry, param.type_cursor, &args[arg_idx], false) {
            let err = MatchError::new(kind, arg_idx + 1, "formal parameter type", "argument type");
            state.record_first_error(err.clone());
            return Err(err);
        }
        arg_idx += 1;
    }

    if arg_idx < args.len() {
        let err = MatchError::new(MatchErrorKind::TooManyArguments, arg_idx + 1, "end of parameter list", "more arguments");
        state.record_first_error(err.clone());
        return Err(err);
    }

    // Step 4: return type capture.
    state.return_type = Some(sig.return_type);

    // Step 5: type-variable completeness.
    for (name, _) in &sig.generics {
        if !state.typevars.contains_key(name) {
            let err = MatchError::new(MatchErrorKind::CouldNotInferTypeVar, 0, "inferred binding", "none")
                .with_typevar(name.to_string());
            state.record_first_error(err.clone());
            return Err(err);
        }
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nif::Token;

    // (sig (params (param int32)) int32) followed by a standalone actual type `int32`.
    fn int_to_int_sig_with_actual() -> (TokenBuffer, Cursor) {
        let mut tokens = vec![
            Token::ParLe(Rc::from("sig")),
            Token::ParLe(Rc::from("params")),
            Token::ParLe(Rc::from("param")),
            Token::Ident(Rc::from("int32")),
            Token::ParRi,
            Token::ParRi,
            Token::Ident(Rc::from("int32")),
            Token::ParRi,
        ];
        let actual_pos = tokens.len();
        tokens.push(Token::Ident(Rc::from("int32")));
        (TokenBuffer::new(tokens), Cursor::new(actual_pos))
    }

    fn int_to_int_sig() -> TokenBuffer {
        int_to_int_sig_with_actual().0
    }

    #[test]
    fn exact_type_match_succeeds_with_zero_cost() {
        let (buf, actual) = int_to_int_sig_with_actual();
        let registry = InheritanceRegistry::new();
        let candidate = Candidate { kind: CandidateKind::Proc, sym: 1, type_cursor: Cursor::new(0) };
        let item = Item::positional(Cursor::new(0), actual);
        let state = match_call(&buf, &registry, &candidate, &[item], &[]).unwrap();
        assert_eq!(state.inheritance_costs, 0);
        assert_eq!(state.int_costs, 0);
    }

    #[test]
    fn too_few_arguments_without_default_errors() {
        let buf = int_to_int_sig();
        let registry = InheritanceRegistry::new();
        let candidate = Candidate { kind: CandidateKind::Proc, sym: 1, type_cursor: Cursor::new(0) };
        let err = match_call(&buf, &registry, &candidate, &[], &[]).unwrap_err();
        assert_eq!(err.kind, MatchErrorKind::TooFewArguments);
    }
}
