use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::environment::Environment;
use crate::error::{ErrorReporter, LoxError};
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::{LoxClass, LoxFunction, LoxInstance, Value};

/// Non-local exit from statement execution: either a runtime error, or a
/// `return` travelling up to the enclosing call frame. Never surfaces to the
/// driver; `interpret` catches errors and call frames catch returns.
pub enum Unwind {
    Err(LoxError),
    Return(Value),
}

impl From<LoxError> for Unwind {
    fn from(err: LoxError) -> Self {
        Unwind::Err(err)
    }
}

impl From<std::io::Error> for Unwind {
    fn from(err: std::io::Error) -> Self {
        Unwind::Err(LoxError::Io(err))
    }
}

/// Tree-walking evaluator.
///
/// Owns the globals frame, the mutable current-environment pointer threaded
/// through execution, and the resolution side-table populated by the
/// resolver. Program output (`print`, REPL echo) goes through the injected
/// writer so embedders and tests can capture it.
pub struct Interpreter<'o, W: Write> {
    output: &'o mut W,
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
}

impl<'o, W: Write> Interpreter<'o, W> {
    pub fn new(output: &'o mut W) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: clock_native,
            },
        );

        let environment = Rc::clone(&globals);

        Interpreter {
            output,
            globals,
            environment,
            locals: HashMap::new(),
        }
    }

    /// Record a resolved local binding distance for an expression node.
    /// Called by the resolver; absence of an entry means "global".
    pub fn resolve_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Execute a top-level program. A runtime error aborts the remaining
    /// statements and is reported through the sink; in REPL mode the final
    /// expression statement's value is echoed to the output.
    pub fn interpret(&mut self, reporter: &ErrorReporter, statements: &[Stmt], echo: bool) {
        for (index, statement) in statements.iter().enumerate() {
            let is_last = index + 1 == statements.len();

            let result = match statement {
                Stmt::Expression(expr) if echo && is_last => self
                    .evaluate(expr)
                    .and_then(|value| writeln!(self.output, "{}", value).map_err(Unwind::from)),

                _ => self.execute(statement),
            };

            match result {
                Ok(()) => {}

                Err(Unwind::Err(err)) => {
                    reporter.runtime_error(&err);
                    return;
                }

                Err(Unwind::Return(_)) => {
                    unreachable!("top-level return rejected by the resolver")
                }
            }
        }
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), Unwind> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = if let Some(expr) = initializer {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let environment = Environment::with_enclosing(Rc::clone(&self.environment));

                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Function(declaration) => {
                let function = Value::Function(Rc::new(LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                )));

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, function);

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let return_value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(Unwind::Return(return_value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class_decl(name, superclass.as_ref(), methods),
        }
    }

    /// Class declaration: resolve the superclass, pre-declare the name, bind
    /// `super` for the method closures, build the method table, then assign
    /// the finished class to the already-declared name.
    fn execute_class_decl(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<(), Unwind> {
        let superclass_value: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => {
                let value = self.evaluate(expr)?;

                match value {
                    Value::Class(class) => Some(class),

                    _ => {
                        let line = match expr {
                            Expr::Variable { name, .. } => name.line,
                            _ => name.line,
                        };

                        return Err(LoxError::runtime(line, "Superclass must be a class.").into());
                    }
                }
            }

            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        // Method closures chain through an extra frame holding `super`.
        let method_closure: Rc<RefCell<Environment>> = match &superclass_value {
            Some(class) => {
                let mut environment = Environment::with_enclosing(Rc::clone(&self.environment));

                environment.define("super", Value::Class(Rc::clone(class)));

                Rc::new(RefCell::new(environment))
            }

            None => Rc::clone(&self.environment),
        };

        let mut class_methods: HashMap<String, Rc<LoxFunction>> = HashMap::new();

        for method in methods {
            let is_initializer = method.name.lexeme == "init";

            let function = LoxFunction::new(
                Rc::clone(method),
                Rc::clone(&method_closure),
                is_initializer,
            );

            class_methods.insert(method.name.lexeme.clone(), Rc::new(function));
        }

        let class = Value::Class(Rc::new(LoxClass::new(
            name.lexeme.clone(),
            superclass_value,
            class_methods,
        )));

        self.environment
            .borrow_mut()
            .assign(&name.lexeme, class, name.line)?;

        Ok(())
    }

    /// Execute `statements` in `environment`, restoring the previous current
    /// environment on every exit path (normal, error, or non-local return).
    fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Environment,
    ) -> Result<(), Unwind> {
        let previous = std::mem::replace(&mut self.environment, Rc::new(RefCell::new(environment)));

        let mut result = Ok(());

        for statement in statements {
            result = self.execute(statement);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, Unwind> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Nil => Value::Nil,
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val: Value = self.evaluate(left)?;

                if operator.token_type == TokenType::OR {
                    if is_truthy(&left_val) {
                        return Ok(left_val);
                    }
                } else if !is_truthy(&left_val) {
                    return Ok(left_val);
                }

                self.evaluate(right)
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(distance) => Environment::assign_at(
                        &self.environment,
                        *distance,
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,

                    None => {
                        self.globals
                            .borrow_mut()
                            .assign(&name.lexeme, value.clone(), name.line)?
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());

                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.call_value(&callee_val, args, paren)
            }

            Expr::Get { object, name } => {
                let object: Value = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => LoxInstance::get(&instance, &name.lexeme)
                        .ok_or_else(|| {
                            LoxError::runtime(
                                name.line,
                                format!("Undefined property '{}'.", name.lexeme),
                            )
                            .into()
                        }),

                    _ => {
                        Err(LoxError::runtime(name.line, "Only instances have properties.").into())
                    }
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object: Value = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => {
                        let value: Value = self.evaluate(value)?;

                        instance.set(&name.lexeme, value.clone());

                        Ok(value)
                    }

                    _ => Err(LoxError::runtime(name.line, "Only instances have fields.").into()),
                }
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value, Unwind> {
        let value: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(operator.line, "Operand must be a number.").into()),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&value))),

            _ => Err(LoxError::runtime(operator.line, "Invalid unary operator.").into()),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Value, Unwind> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => {
                let (a, b) = check_number_operands(operator, &left_val, &right_val)?;

                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = check_number_operands(operator, &left_val, &right_val)?;

                Ok(Value::Number(a * b))
            }

            TokenType::SLASH => {
                let (a, b) = check_number_operands(operator, &left_val, &right_val)?;

                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => {
                let (a, b) = check_number_operands(operator, &left_val, &right_val)?;

                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = check_number_operands(operator, &left_val, &right_val)?;

                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = check_number_operands(operator, &left_val, &right_val)?;

                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = check_number_operands(operator, &left_val, &right_val)?;

                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => Err(LoxError::runtime(operator.line, "Invalid binary operator.").into()),
        }
    }

    /// Variable and `this` lookup: the side-table depth is authoritative for
    /// locals (no fallback); everything else goes straight to globals.
    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value, Unwind> {
        match self.locals.get(&id) {
            Some(distance) => {
                Environment::get_at(&self.environment, *distance, &name.lexeme, name.line)
                    .map_err(Unwind::from)
            }

            None => self
                .globals
                .borrow()
                .get(&name.lexeme, name.line)
                .map_err(Unwind::from),
        }
    }

    /// `super.method`: the recorded depth finds `super` (the superclass);
    /// `this` (the instance) lives one frame closer.
    fn evaluate_super(
        &mut self,
        id: ExprId,
        keyword: &Token,
        method: &Token,
    ) -> Result<Value, Unwind> {
        let distance: usize = match self.locals.get(&id) {
            Some(distance) => *distance,

            None => {
                return Err(
                    LoxError::runtime(keyword.line, "Undefined variable 'super'.").into(),
                );
            }
        };

        let superclass =
            Environment::get_at(&self.environment, distance, "super", keyword.line)?;

        let instance =
            Environment::get_at(&self.environment, distance - 1, "this", keyword.line)?;

        let (Value::Class(superclass), Value::Instance(instance)) = (superclass, instance) else {
            return Err(LoxError::runtime(keyword.line, "Undefined variable 'super'.").into());
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),

            None => Err(LoxError::runtime(
                method.line,
                format!("Undefined property '{}'.", method.lexeme),
            )
            .into()),
        }
    }

    /// Dispatch a call to a user function, class constructor or built-in,
    /// after checking callability and arity.
    fn call_value(
        &mut self,
        callee: &Value,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value, Unwind> {
        let arity: usize = match callee {
            Value::Function(function) => function.arity(),
            Value::Class(class) => class.arity(),
            Value::NativeFunction { arity, .. } => *arity,

            _ => {
                return Err(LoxError::runtime(
                    paren.line,
                    "Can only call functions and classes.",
                )
                .into());
            }
        };

        if arguments.len() != arity {
            return Err(LoxError::runtime(
                paren.line,
                format!("Expected {} arguments but got {}.", arity, arguments.len()),
            )
            .into());
        }

        match callee {
            Value::Function(function) => self.call_function(function, arguments),

            Value::Class(class) => self.instantiate(class, arguments),

            Value::NativeFunction { func, .. } => func(&arguments).map_err(Unwind::from),

            _ => unreachable!("non-callable rejected above"),
        }
    }

    /// Invoke a user function: bind parameters in a fresh frame chained on
    /// the closure, run the body, and catch a non-local `return`.
    /// Initializers always yield `this` from their closure.
    fn call_function(
        &mut self,
        function: &LoxFunction,
        arguments: Vec<Value>,
    ) -> Result<Value, Unwind> {
        let mut environment = Environment::with_enclosing(Rc::clone(&function.closure));

        for (param, argument) in function.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let result = self.execute_block(&function.declaration.body, environment);

        match result {
            Ok(()) => {
                if function.is_initializer {
                    self.initializer_this(function)
                } else {
                    Ok(Value::Nil)
                }
            }

            Err(Unwind::Return(value)) => {
                if function.is_initializer {
                    self.initializer_this(function)
                } else {
                    Ok(value)
                }
            }

            Err(err) => Err(err),
        }
    }

    /// An initializer's effective return value: `this` at depth 0 of its
    /// closure, both on fall-through and on explicit bare `return;`.
    fn initializer_this(&self, function: &LoxFunction) -> Result<Value, Unwind> {
        Environment::get_at(&function.closure, 0, "this", function.declaration.name.line)
            .map_err(Unwind::from)
    }

    /// Class call: construct an instance and run `init` (possibly inherited)
    /// bound to it.
    fn instantiate(
        &mut self,
        class: &Rc<LoxClass>,
        arguments: Vec<Value>,
    ) -> Result<Value, Unwind> {
        let instance = Rc::new(LoxInstance::new(Rc::clone(class)));

        if let Some(initializer) = class.find_method("init") {
            let bound = initializer.bind(Rc::clone(&instance));

            self.call_function(&bound, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

/// Only `nil` and `false` are falsey; everything else, including `0` and
/// `""`, is truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,

        Value::Bool(b) => *b,

        _ => true,
    }
}

fn check_number_operands(
    operator: &Token,
    left: &Value,
    right: &Value,
) -> Result<(f64, f64), Unwind> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),

        _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.").into()),
    }
}

fn clock_native(_args: &[Value]) -> crate::error::Result<Value> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LoxError::runtime(0, format!("Clock error: {}", e)))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}
