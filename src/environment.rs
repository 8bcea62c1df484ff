use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::value::Value;

/// A lexical frame mapping names to values, chained to an enclosing frame.
///
/// Bindings are keyed by lexeme string. The chain is acyclic and rooted at a
/// single globals frame created once per interpreter; closures share frames
/// through `Rc`.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look up `name`, walking outward through enclosing frames.
    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Assign to an existing binding, walking outward through enclosing
    /// frames. Assignment never creates a binding.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Look up `name` in exactly the frame `distance` hops out from `env`.
    ///
    /// The resolver guarantees the binding exists at that depth; a miss is
    /// surfaced as an undefined-variable error rather than a panic.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        line: usize,
    ) -> Result<Value> {
        let frame = Self::ancestor(env, distance, name, line)?;

        let value = frame.borrow().values.get(name).cloned();

        value.ok_or_else(|| LoxError::runtime(line, format!("Undefined variable '{}'.", name)))
    }

    /// Assign to `name` in exactly the frame `distance` hops out from `env`.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<()> {
        let frame = Self::ancestor(env, distance, name, line)?;

        if frame.borrow().values.contains_key(name) {
            frame.borrow_mut().values.insert(name.to_string(), value);
            Ok(())
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        line: usize,
    ) -> Result<Rc<RefCell<Environment>>> {
        let mut frame = Rc::clone(env);

        for _ in 0..distance {
            let enclosing = frame.borrow().enclosing.clone();

            match enclosing {
                Some(parent) => frame = parent,
                None => {
                    return Err(LoxError::runtime(
                        line,
                        format!("Undefined variable '{}'.", name),
                    ));
                }
            }
        }

        Ok(frame)
    }
}
