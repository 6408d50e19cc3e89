//! Environment frames: one mapping from name to value per lexical scope,
//! chained through an optional enclosing frame.
//!
//! Frames are shared (`Rc<RefCell<…>>`) because every closure created inside
//! a scope co-owns that scope's frame; mutating an outer variable through one
//! closure is visible through all others that captured the same frame.
//!
//! Resolved locals are accessed by exact hop count (`get_at` / `assign_at`);
//! the name-walking `get` / `assign` pair serves the global frame, where
//! late binding and forward references are the point.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// A root frame with no parent (the global environment).
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    /// A child frame whose parent is `enclosing`.
    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind `name` in *this* frame, shadowing any outer binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up through the frame chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// Assign to an existing binding somewhere in the chain.  Returns `false`
    /// if no frame holds `name`.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            true
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            false
        }
    }

    /// Read `name` from the frame exactly `distance` hops up the chain.
    /// `None` means the resolver's distance and the runtime chain disagree —
    /// the caller turns that into an undefined-variable error.
    pub fn get_at(&self, distance: usize, name: &str) -> Option<Value> {
        if distance == 0 {
            self.values.get(name).cloned()
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get_at(distance - 1, name)
        } else {
            None
        }
    }

    /// Assign to `name` in the frame exactly `distance` hops up the chain.
    pub fn assign_at(&mut self, distance: usize, name: &str, value: Value) -> bool {
        if distance == 0 {
            if let Some(slot) = self.values.get_mut(name) {
                *slot = value;
                return true;
            }

            false
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign_at(distance - 1, name, value)
        } else {
            false
        }
    }
}
