// ABOUTME: `singleArg`: dispatches on the kind of one formal parameter's
// ABOUTME: type and matches it against one actual argument, threading cost accumulation
// ABOUTME: and type-variable binding through the shared `MatchState`.

use crate::error::MatchErrorKind;
use crate::nif::{Cursor, Token, TokenBuffer};
use crate::sigmatch::linear::{linear_match, skip_subtree, structural_eq};
use crate::sigmatch::types::{classify, TypeHead};
use crate::sigmatch::{Coercion, InheritanceRegistry, Item, MatchState};

fn is_nil_actual(buf: &TokenBuffer, cursor: Cursor) -> bool {
    matches!(buf.at(cursor).as_ident_or_symbol(), Some("nil"))
}

/// Match one formal parameter's type tree (rooted at `formal`) against `item`'s actual
/// type. `mut_context` is true once a `Mut`/`Out` modifier has been peeled, forbidding
/// implicit widening and subtype coercion for the remainder of the recursion.
pub fn single_arg(
    buf: &TokenBuffer,
    state: &mut MatchState,
    registry: &InheritanceRegistry,
    formal: Cursor,
    item: &Item,
    mut_context: bool,
) -> Result<(), MatchErrorKind> {
    let (head, formal_after) = classify(buf, formal);
    match head {
        TypeHead::TypeVar(name) => match state.typevars.get(&name).copied() {
            Some(bound) => {
                if structural_eq(buf, bound, item.typ) {
                    Ok(())
                } else {
                    Err(MatchErrorKind::InvalidRematch)
                }
            }
            None => {
                state.typevars.insert(name, item.typ);
                Ok(())
            }
        },

        TypeHead::Named(name) => {
            if let Some(target) = registry.resolve_alias(&name) {
                let target = target.to_string();
                return match_named(buf, state, registry, &target, item, mut_context);
            }
            match_named(buf, state, registry, &name, item, mut_context)
        }

        TypeHead::Int(w) => match_integral(state, buf, item, "int", w, mut_context),
        TypeHead::UInt(w) => match_integral(state, buf, item, "uint", w, mut_context),
        TypeHead::Float(w) => match_integral(state, buf, item, "float", w, mut_context),

        TypeHead::Char => match_atom_tag(buf, item, "char"),
        TypeHead::Bool => match_atom_tag(buf, item, "bool"),

        TypeHead::Mut | TypeHead::Out | TypeHead::Lent | TypeHead::Sink | TypeHead::Static => {
            let modifier_tag = modifier_tag(&head);
            let inner_actual = if buf.at(item.typ).par_le_tag() == Some(modifier_tag) {
                buf.advance(item.typ)
            } else {
                item.typ
            };
            let forbids_widening = matches!(head, TypeHead::Mut | TypeHead::Out);
            single_arg(
                buf,
                state,
                registry,
                formal_after,
                &Item { n: item.n, typ: inner_actual, kind: item.kind.clone() },
                mut_context || forbids_widening,
            )
        }

        TypeHead::Invoke => {
            let (actual_head, actual_after) = classify(buf, item.typ);
            if actual_head != TypeHead::Invoke {
                return Err(MatchErrorKind::Mismatch);
            }
            linear_match(buf, &mut state.typevars, formal_after, actual_after)
                .map(|_| ())
        }

        TypeHead::Range => {
            let (actual_head, actual_after) = classify(buf, item.typ);
            if actual_head != TypeHead::Range {
                return Err(MatchErrorKind::Mismatch);
            }
            single_arg(
                buf,
                state,
                registry,
                formal_after,
                &Item { n: item.n, typ: actual_after, kind: item.kind.clone() },
                mut_context,
            )
        }

        TypeHead::Array => {
            let (actual_head, actual_after) = classify(buf, item.typ);
            if actual_head != TypeHead::Array {
                return Err(MatchErrorKind::Mismatch);
            }
            let (formal_elem, actual_elem) =
                linear_match(buf, &mut state.typevars, formal_after, actual_after)?;
            single_arg(
                buf,
                state,
                registry,
                formal_elem,
                &Item { n: item.n, typ: actual_elem, kind: item.kind.clone() },
                mut_context,
            )
        }

        TypeHead::Tuple => {
            let (actual_head, actual_after) = classify(buf, item.typ);
            if actual_head != TypeHead::Tuple {
                return Err(MatchErrorKind::Mismatch);
            }
            let mut f = formal_after;
            let mut a = actual_after;
            loop {
                match (buf.at(f), buf.at(a)) {
                    (Token::ParRi, Token::ParRi) => return Ok(()),
                    (Token::ParRi, _) | (_, Token::ParRi) => {
                        return Err(MatchErrorKind::FormalParamsMismatch)
                    }
                    _ => {
                        single_arg(
                            buf,
                            state,
                            registry,
                            f,
                            &Item { n: item.n, typ: a, kind: item.kind.clone() },
                            mut_context,
                        )?;
                        f = skip_subtree(buf, f);
                        a = skip_subtree(buf, a);
                    }
                }
            }
        }

        TypeHead::Set | TypeHead::UncheckedArray | TypeHead::OpenArray => {
            let (actual_head, actual_after) = classify(buf, item.typ);
            if std::mem::discriminant(&actual_head) != std::mem::discriminant(&head) {
                return Err(MatchErrorKind::Mismatch);
            }
            single_arg(
                buf,
                state,
                registry,
                formal_after,
                &Item { n: item.n, typ: actual_after, kind: item.kind.clone() },
                mut_context,
            )
        }

        TypeHead::Ptr | TypeHead::Ref => {
            if is_nil_actual(buf, item.typ) {
                return Ok(());
            }
            let (actual_head, actual_after) = classify(buf, item.typ);
            if std::mem::discriminant(&actual_head) != std::mem::discriminant(&head) {
                return Err(MatchErrorKind::Mismatch);
            }
            single_arg(
                buf,
                state,
                registry,
                formal_after,
                &Item { n: item.n, typ: actual_after, kind: item.kind.clone() },
                mut_context,
            )
        }

        TypeHead::Cstring => {
            if is_nil_actual(buf, item.typ) {
                return Ok(());
            }
            if matches!(buf.at(item.typ), Token::StringLit(_)) {
                if mut_context {
                    return Err(MatchErrorKind::ImplicitConversionNotMutable);
                }
                state.coerced.push(Coercion::HconvX);
                state.int_costs += 1;
                return Ok(());
            }
            Err(MatchErrorKind::Mismatch)
        }

        TypeHead::Pointer => {
            if is_nil_actual(buf, item.typ) {
                return Ok(());
            }
            let (actual_head, _) = classify(buf, item.typ);
            if actual_head == TypeHead::Ptr {
                if mut_context {
                    return Err(MatchErrorKind::ImplicitConversionNotMutable);
                }
                state.coerced.push(Coercion::HconvX);
                state.int_costs += 1;
                return Ok(());
            }
            Err(MatchErrorKind::Mismatch)
        }

        TypeHead::Proc => {
            let (actual_head, actual_after) = classify(buf, item.typ);
            if actual_head != TypeHead::Proc {
                return Err(MatchErrorKind::Mismatch);
            }
            let formal_callconv = buf.at(formal_after).as_ident_or_symbol();
            let actual_callconv = buf.at(actual_after).as_ident_or_symbol();
            if formal_callconv != actual_callconv {
                return Err(MatchErrorKind::CallConvMismatch);
            }
            let formal_params = buf.advance(formal_after);
            let actual_params = buf.advance(actual_after);
            if buf.at(formal_params).par_le_tag() != Some("params")
                || buf.at(actual_params).par_le_tag() != Some("params")
            {
                return Err(MatchErrorKind::FormalParamsMismatch);
            }
            let (formal_after_params, actual_after_params) =
                linear_match(buf, &mut state.typevars, formal_params, actual_params)?;
            if !structural_eq(buf, formal_after_params, actual_after_params) {
                return Err(MatchErrorKind::FormalParamsMismatch);
            }
            Ok(())
        }

        TypeHead::Typedesc => {
            let (actual_head, _) = classify(buf, item.typ);
            if actual_head == TypeHead::Typedesc {
                Ok(())
            } else {
                Err(MatchErrorKind::Mismatch)
            }
        }

        TypeHead::Untyped | TypeHead::Typed => Ok(()),

        TypeHead::Varargs => {
            // The parameter loop special-cases varargs before reaching here; a
            // `Varargs` formal appearing nested (e.g. inside a tuple) just matches its
            // inner type once, non-repeating.
            single_arg(buf, state, registry, formal_after, item, mut_context)
        }

        TypeHead::Alias(_) => single_arg(buf, state, registry, formal_after, item, mut_context),

        TypeHead::Unknown(_) => Err(MatchErrorKind::UnhandledType),
    }
}

fn modifier_tag(head: &TypeHead) -> &'static str {
    match head {
        TypeHead::Mut => "mut",
        TypeHead::Out => "out",
        TypeHead::Lent => "lent",
        TypeHead::Sink => "sink",
        TypeHead::Static => "static",
        _ => unreachable!("modifier_tag called with a non-modifier head"),
    }
}

fn match_named(
    buf: &TokenBuffer,
    state: &mut MatchState,
    registry: &InheritanceRegistry,
    name: &str,
    item: &Item,
    mut_context: bool,
) -> Result<(), MatchErrorKind> {
    let (actual_head, _) = classify(buf, item.typ);
    let actual_name = match &actual_head {
        TypeHead::Named(n) => n.to_string(),
        _ => return Err(MatchErrorKind::Mismatch),
    };
    if actual_name == name {
        return Ok(());
    }
    match registry.depth_to_ancestor(&actual_name, name) {
        Some(0) => Ok(()),
        Some(depth) => {
            if mut_context {
                return Err(MatchErrorKind::UnavailableSubtypeRelation);
            }
            state.coerced.push(Coercion::OconvX { depth });
            state.inheritance_costs += depth;
            Ok(())
        }
        None => Err(MatchErrorKind::Mismatch),
    }
}

fn match_integral(
    state: &mut MatchState,
    buf: &TokenBuffer,
    item: &Item,
    family: &str,
    formal_width: u8,
    mut_context: bool,
) -> Result<(), MatchErrorKind> {
    let (actual_head, _) = classify(buf, item.typ);
    let actual_width = match (family, &actual_head) {
        ("int", TypeHead::Int(w)) => *w,
        ("uint", TypeHead::UInt(w)) => *w,
        ("float", TypeHead::Float(w)) => *w,
        _ => return Err(MatchErrorKind::Mismatch),
    };
    if actual_width == formal_width {
        return Ok(());
    }
    if actual_width < formal_width {
        if mut_context {
            return Err(MatchErrorKind::ImplicitConversionNotMutable);
        }
        state.coerced.push(Coercion::HconvX);
        state.int_costs += 1;
        return Ok(());
    }
    Err(MatchErrorKind::Mismatch)
}

fn match_atom_tag(buf: &TokenBuffer, item: &Item, tag: &str) -> Result<(), MatchErrorKind> {
    let matches_tag = match tag {
        "char" => matches!(classify(buf, item.typ).0, TypeHead::Char),
        "bool" => matches!(classify(buf, item.typ).0, TypeHead::Bool),
        _ => false,
    };
    if matches_tag {
        Ok(())
    } else {
        Err(MatchErrorKind::Mismatch)
    }
}
