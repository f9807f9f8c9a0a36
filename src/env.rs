// ABOUTME: Environment module: a chain of frames mapping symbols to values.

use crate::error::EvalError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A single association list inside an environment. Logically a
/// proper list of `(symbol . value)` pairs; stored as a `HashMap` for O(1) lookup within
/// the frame.
#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<Rc<str>, Value>>,
    /// `outer` is a weak relation: lookup only, never ownership. `Rc`
    /// sharing is fine here because frames never form a cycle — a closure's captured
    /// environment is always an ancestor of any frame it's later looked up from.
    outer: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new global environment with no parent.
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            outer: None,
        })
    }

    /// Creates a new child environment extending `outer`.
    pub fn with_outer(outer: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            outer: Some(outer),
        })
    }

    /// `define` mutates the current frame only.
    pub fn define(&self, name: impl Into<Rc<str>>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    /// A lookup that fails in the current frame recurses into `outer`.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.outer.as_ref().and_then(|outer| outer.get(name))
    }

    /// `set!` mutates the nearest enclosing frame containing the binding.
    pub fn set(&self, name: &str, value: Value) -> Result<(), EvalError> {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(Rc::from(name), value);
            return Ok(());
        }
        match &self.outer {
            Some(outer) => outer.set(name, value),
            None => Err(EvalError::UnboundSymbol(name.to_string())),
        }
    }

    /// True if `name` is bound in this frame specifically (not an ancestor). Used by
    /// `eval_define` to distinguish "rebind in this scope" from "shadow an outer
    /// binding", and by the macro table to check whether `*macro-table*` already
    /// exists in the global frame before seeding it.
    pub fn has_local(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    /// Walk to the outermost frame — the global environment is the tail of every chain.
    pub fn global(self: &Rc<Self>) -> Rc<Environment> {
        let mut cur = self.clone();
        while let Some(outer) = cur.outer.clone() {
            cur = outer;
        }
        cur
    }
}
