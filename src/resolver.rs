//! Static resolution pass for the Lox interpreter.
//!
//! This module performs a single AST walk to:
//! 1. **Build lexical scopes**: maintains a stack of `HashMap<String,bool>` tracking declared
//!    (false) and fully defined (true) names in each nested block or function.
//! 2. **Enforce static rules**: reports errors such as redeclaration in the same scope,
//!    reading a variable in its own initializer, invalid `return` outside functions,
//!    and illegal use of `this` and `super` outside of class bodies.
//! 3. **Record binding distances**: for every `Variable`, `Assign`, `This` and `Super`
//!    occurrence, calls back into the interpreter to note whether it is a local
//!    (and at what depth) or a global. This enables the runtime to perform
//!    lookups by climbing exactly the right number of environment frames.
//!
//! Errors are reported through the shared [`ErrorReporter`] sink and resolution
//! continues, so one pass surfaces as many static errors as possible.

use std::collections::HashMap;
use std::io::Write;

use log::{debug, info};

use crate::error::ErrorReporter;
use crate::expr::{Expr, ExprId};
use crate::interpreter::Interpreter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;

/// Are we inside a user function?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ClassType {
    /// Not inside any class
    None,

    /// Inside a class declaration _without_ a superclass
    Class,

    /// Inside a class declaration _with_ a superclass
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances (locals vs. globals) by calling back into the interpreter.
pub struct Resolver<'a, 'o, W: Write> {
    interpreter: &'a mut Interpreter<'o, W>,
    reporter: &'a ErrorReporter,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'a, 'o, W: Write> Resolver<'a, 'o, W> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'a mut Interpreter<'o, W>, reporter: &'a ErrorReporter) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top‑level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                // 1. Save and enter the class context
                let enclosing_class: ClassType = self.current_class;
                self.current_class = ClassType::Class;

                // 2. Declare & define the class name so methods can refer to it
                self.declare(name);
                self.define(name);

                // 3. If there is a superclass, resolve it and bind `super`
                if let Some(superclass) = superclass {
                    if let Expr::Variable {
                        name: super_name, ..
                    } = superclass
                    {
                        // 3a. Self‑inheritance guard
                        if super_name.lexeme == name.lexeme {
                            self.reporter
                                .error_token(super_name, "A class can't inherit from itself.");
                        }
                    }

                    self.current_class = ClassType::Subclass;

                    // 3b. The superclass name is an ordinary variable read
                    self.resolve_expr(superclass);

                    // 3c. Open a scope for `super`
                    self.begin_scope();
                    if let Some(scope) = self.scopes.last_mut() {
                        scope.insert("super".to_string(), true);
                    }
                }

                // 4. Open the implicit `this` scope for methods
                self.begin_scope();
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert("this".to_string(), true);
                }

                // 5. Resolve each method in its own function context
                for method in methods {
                    let kind = if method.name.lexeme == "init" {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };

                    self.resolve_function(kind, method);
                }

                // 6. Close the `this` scope
                self.end_scope();

                // 7. If we opened a `super` scope, close it now
                if superclass.is_some() {
                    self.end_scope();
                }

                // 8. Restore the outer class context
                self.current_class = enclosing_class;
            }

            Stmt::Block(statements) => {
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // 1. Declare the variable name (marked but not yet defined)
                self.declare(name);

                // 2. Resolve the initializer expression, if any
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                // 3. Define the variable so it’s available in this scope
                self.define(name);
            }

            Stmt::Function(function) => {
                // Declare & define eagerly so the function can recurse.
                self.declare(&function.name);
                self.define(&function.name);

                self.resolve_function(FunctionType::Function, function);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                // 1. Ensure we're inside a function or method
                if self.current_function == FunctionType::None {
                    self.reporter
                        .error_token(keyword, "Can't return from top-level code.");
                }

                if let Some(expr) = value {
                    // 2. In an initializer, only bare `return;` is allowed
                    if self.current_function == FunctionType::Initializer {
                        self.reporter
                            .error_token(keyword, "Can't return a value from an initializer.");
                    }

                    self.resolve_expr(expr);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {
                // Literals have no sub‑expressions
            }

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                // 1. Prevent reading a variable in its own initializer
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.reporter.error_token(
                            name,
                            "Can't read local variable in its own initializer.",
                        );
                    }
                }

                // 2. Bind this variable occurrence at its lexical depth
                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // Resolve the right‑hand side first, then bind the assignment
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => {
                self.resolve_expr(object);
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { id, keyword } => {
                // 'this' only valid inside class methods
                if self.current_class == ClassType::None {
                    self.reporter
                        .error_token(keyword, "Can't use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                // 1. Disallow outside any class
                if self.current_class == ClassType::None {
                    self.reporter
                        .error_token(keyword, "Can't use 'super' outside of a class.");
                } else if self.current_class != ClassType::Subclass {
                    // 2. Disallow in a class with no superclass
                    self.reporter
                        .error_token(keyword, "Can't use 'super' in a class with no superclass.");
                }

                // 3. Bind 'super' like a local variable.
                self.resolve_local(*id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function’s parameters + body.
    ///
    /// `kind` distinguishes plain functions, methods and initializers.
    fn resolve_function(&mut self, kind: FunctionType, function: &FunctionDecl) {
        // 1. Save the enclosing function context so we can restore it later.
        let enclosing = self.current_function;
        self.current_function = kind;

        // 2. Begin a new lexical scope for the function parameters & body.
        self.begin_scope();

        // 3. Declare and immediately define each parameter in this new scope.
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }

        // 4. Resolve each statement in the function body under the current context.
        for stmt in &function.body {
            self.resolve_stmt(stmt);
        }

        // 5. End the function’s parameter/body scope.
        self.end_scope();

        // 6. Restore the previous function context.
        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        // In a local scope, ensure no duplicate declarations; the global
        // scope permits redeclaration.
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.reporter
                    .error_token(name, "Already a variable with this name in this scope.");
            }

            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this variable occurrence as either:
    ///  - a local at depth `d`, or
    ///  - a global if not found in any scope (no entry in the side-table).
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        // 1. Search each scope from innermost outward
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                // 2. Tell the interpreter about the local binding
                self.interpreter.resolve_local(id, depth);
                return;
            }
        }

        // 3. Not found in any scope → it's a global
        debug!("Resolved '{}' as global", name.lexeme);
    }
}
