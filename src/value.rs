use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::error::Result;
use crate::stmt::FunctionDecl;

/// A Lox runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    NativeFunction {
        name: String,
        arity: usize,
        func: fn(&[Value]) -> Result<Value>,
    },
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
    Instance(Rc<LoxInstance>),
}

/// Structural equality within `nil`/bool/number/string; identity for
/// functions, classes and instances. Two distinct instances are unequal even
/// when their fields match.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,

            (Value::Bool(a), Value::Bool(b)) => a == b,

            (Value::Number(a), Value::Number(b)) => a == b,

            (Value::String(a), Value::String(b)) => a == b,

            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),

            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),

            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),

            (
                Value::NativeFunction { name: a, func: f, .. },
                Value::NativeFunction { name: b, func: g, .. },
            ) => a == b && *f as usize == *g as usize,

            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::NativeFunction { .. } => write!(f, "<native fn>"),

            Value::Function(function) => write!(f, "<fn {}>", function.declaration.name.lexeme),

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => write!(f, "{} instance", instance.class.name),
        }
    }
}

/// A user-declared function: its declaration plus the environment it closed
/// over. Binding to an instance chains a fresh `this` frame onto the closure.
pub struct LoxFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Produce a copy of this function whose closure additionally defines
    /// `this` as the target instance.
    pub fn bind(&self, instance: Rc<LoxInstance>) -> LoxFunction {
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));

        environment.define("this", Value::Instance(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }
}

// Closures can capture environments that contain the function itself, so the
// derived Debug would recurse through the cycle.
impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.declaration.name.lexeme)
    }
}

#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    pub superclass: Option<Rc<LoxClass>>,
    pub methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        LoxClass {
            name,
            superclass,
            methods,
        }
    }

    /// Walk the inheritance chain for a method.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        self.methods.get(name).cloned().or_else(|| {
            self.superclass
                .as_ref()
                .and_then(|superclass| superclass.find_method(name))
        })
    }

    /// The class's call arity: its `init` arity (including inherited), or 0.
    pub fn arity(&self) -> usize {
        self.find_method("init")
            .map(|init| init.arity())
            .unwrap_or(0)
    }
}

pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    pub fields: RefCell<HashMap<String, Value>>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    /// Property read: fields shadow methods; methods come back bound to the
    /// instance. `None` means undefined property.
    pub fn get(instance: &Rc<LoxInstance>, name: &str) -> Option<Value> {
        if let Some(value) = instance.fields.borrow().get(name) {
            return Some(value.clone());
        }

        instance
            .class
            .find_method(name)
            .map(|method| Value::Function(Rc::new(method.bind(Rc::clone(instance)))))
    }

    /// Fields are created on first assignment.
    pub fn set(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }
}

// Fields may contain the instance itself (`obj.me = obj;`), so the derived
// Debug would recurse through the cycle.
impl fmt::Debug for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.class.name)
    }
}
