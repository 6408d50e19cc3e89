//! Tree-walking evaluator.
//!
//! Executes statements and computes expression values over the runtime
//! [`Value`] model.  Variable references resolved by the static pass are
//! fetched by exact environment hop count; everything else goes to the
//! persistent global frame by name.
//!
//! Control flow out of a function body travels as a structurally distinct
//! signal: [`InterpretError::Return`] unwinds through blocks, conditionals,
//! and loops unmodified and is absorbed exactly at the call boundary.  It is
//! *not* a failure and must never be conflated with a runtime error.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

use log::{debug, info};
use thiserror::Error;

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::environment::Environment;
use crate::resolver::Locals;
use crate::token::{Token, TokenType};
use crate::value::{Instance, LoxClass, LoxFunction, NativeFunction, Value};

#[derive(Error, Debug)]
pub enum InterpretError {
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Output sink failure (surfaced through `?` on `writeln!`).
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Expected control flow, not a failure: carries a function's result up
    /// to the nearest call boundary.
    #[error("Return signal with value: {0}")]
    Return(Value),
}

impl InterpretError {
    fn runtime<S: Into<String>>(line: usize, message: S) -> Self {
        InterpretError::Runtime {
            message: message.into(),
            line,
        }
    }
}

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, InterpretError>;

pub struct Interpreter {
    /// Root frame; lives for the whole session so REPL lines accumulate
    /// definitions.
    globals: Rc<RefCell<Environment>>,

    /// Current frame during execution.
    environment: Rc<RefCell<Environment>>,

    /// Hop-count table from the resolver.  Extended (never replaced) across
    /// runs: function bodies from earlier REPL lines keep their entries.
    locals: HashMap<ExprId, usize>,

    /// Sink for `print` output.
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter printing to standard output.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Interpreter with a custom `print` sink (tests capture output here).
    /// Native functions (`clock`) are defined in the fresh global frame.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction(Rc::new(NativeFunction {
                name: "clock",
                arity: 0,
                func: |_args: &[Value]| {
                    let timestamp: f64 = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .map_err(|e: SystemTimeError| format!("Clock error: {}", e))?
                        .as_secs_f64();

                    Ok(Value::Number(timestamp))
                },
            })),
        );

        Self {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Merge a resolution table in.  Called once per run, before
    /// [`Self::interpret`].
    pub fn resolve(&mut self, locals: Locals) {
        debug!("Recording {} resolved local(s)", locals.len());

        self.locals.extend(locals);
    }

    /// Interprets a list of statements (a "program").
    pub fn interpret(&mut self, statements: &[Stmt]) -> IResult<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            self.execute(stmt)?;
        }

        info!("Interpretation completed successfully");

        Ok(())
    }

    // ───────────────────────── statement execution ──────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> IResult<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let frame = Rc::new(RefCell::new(Environment::with_enclosing(
                    self.environment.clone(),
                )));

                self.execute_block(statements, frame)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(())
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);

                // The frame current *here* becomes the closure's defining
                // environment.
                let function = LoxFunction {
                    declaration: decl.clone(),
                    closure: self.environment.clone(),
                    is_initializer: false,
                };

                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(InterpretError::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let superclass = match superclass {
                    Some(expr) => match self.evaluate(expr)? {
                        Value::Class(class) => Some(class),

                        _ => {
                            return Err(InterpretError::runtime(
                                name.line,
                                "Superclass must be a class.",
                            ));
                        }
                    },

                    None => None,
                };

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Nil);

                // Methods of a subclass close over an extra frame holding
                // `super`, so `super.m()` binds at class-definition time.
                let previous = self.environment.clone();

                if let Some(sc) = &superclass {
                    let frame = Rc::new(RefCell::new(Environment::with_enclosing(
                        previous.clone(),
                    )));

                    frame.borrow_mut().define("super", Value::Class(sc.clone()));

                    self.environment = frame;
                }

                let mut method_map: HashMap<String, Rc<LoxFunction>> = HashMap::new();

                for method in methods {
                    let function = LoxFunction {
                        declaration: method.clone(),
                        closure: self.environment.clone(),
                        is_initializer: method.name.lexeme == "init",
                    };

                    method_map.insert(method.name.lexeme.clone(), Rc::new(function));
                }

                if superclass.is_some() {
                    self.environment = previous;
                }

                let class = LoxClass {
                    name: name.lexeme.clone(),
                    superclass,
                    methods: method_map,
                };

                debug!("Defined class '{}'", class.name);

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Class(Rc::new(class)));

                Ok(())
            }
        }
    }

    /// Run `statements` inside `frame`, restoring the previous frame on the
    /// way out — including when a return signal or error unwinds through.
    fn execute_block(
        &mut self,
        statements: &[Stmt],
        frame: Rc<RefCell<Environment>>,
    ) -> IResult<()> {
        let previous = std::mem::replace(&mut self.environment, frame);

        let result = statements.iter().try_for_each(|stmt| self.execute(stmt));

        self.environment = previous;

        result
    }

    // ───────────────────────── expression evaluation ────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::Str(Rc::from(s.as_str())),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
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
                let left_val = self.evaluate(left)?;

                // The produced value is one of the operands, never a coerced
                // Boolean.
                match operator.token_type {
                    TokenType::OR if left_val.is_truthy() => Ok(left_val),
                    TokenType::AND if !left_val.is_truthy() => Ok(left_val),
                    _ => self.evaluate(right),
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                let assigned = match self.locals.get(id) {
                    Some(distance) => self.environment.borrow_mut().assign_at(
                        *distance,
                        &name.lexeme,
                        value.clone(),
                    ),

                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone()),
                };

                if !assigned {
                    return Err(InterpretError::runtime(
                        name.line,
                        format!("Undefined variable '{}'.", name.lexeme),
                    ));
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(callee)?;

                let mut arg_values = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(arg)?);
                }

                self.invoke_callable(&callee_val, paren, &arg_values)
            }

            Expr::Get { object, name } => {
                let object_val = self.evaluate(object)?;

                match object_val {
                    Value::Instance(instance) => self.get_property(&instance, name),

                    _ => Err(InterpretError::runtime(
                        name.line,
                        "Only instances have properties.",
                    )),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object_val = self.evaluate(object)?;

                match object_val {
                    Value::Instance(instance) => {
                        let value = self.evaluate(value)?;

                        instance
                            .borrow_mut()
                            .fields
                            .insert(name.lexeme.clone(), value.clone());

                        Ok(value)
                    }

                    _ => Err(InterpretError::runtime(
                        name.line,
                        "Only instances have fields.",
                    )),
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

    fn evaluate_unary(&mut self, op: &Token, expr: &Expr) -> IResult<Value> {
        let right_val = self.evaluate(expr)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(InterpretError::runtime(
                    op.line,
                    "Operand must be a number.",
                )),
            },

            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),

            _ => Err(InterpretError::runtime(op.line, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> IResult<Value> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        match op.token_type {
            // `+` is overloaded: numeric addition or string concatenation,
            // never a mix.
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::Str(a), Value::Str(b)) => {
                    let mut joined = String::with_capacity(a.len() + b.len());
                    joined.push_str(&a);
                    joined.push_str(&b);

                    Ok(Value::Str(Rc::from(joined)))
                }

                _ => Err(InterpretError::runtime(
                    op.line,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => self.numeric_op(op, left_val, right_val, |a, b| a - b),
            TokenType::STAR => self.numeric_op(op, left_val, right_val, |a, b| a * b),

            // IEEE-754 division: x/0 is an infinity (or NaN), not an error.
            TokenType::SLASH => self.numeric_op(op, left_val, right_val, |a, b| a / b),

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            TokenType::LESS => self.comparison_op(op, left_val, right_val, |a, b| a < b),
            TokenType::LESS_EQUAL => self.comparison_op(op, left_val, right_val, |a, b| a <= b),
            TokenType::GREATER => self.comparison_op(op, left_val, right_val, |a, b| a > b),
            TokenType::GREATER_EQUAL => self.comparison_op(op, left_val, right_val, |a, b| a >= b),

            _ => Err(InterpretError::runtime(op.line, "Invalid binary operator.")),
        }
    }

    fn numeric_op(
        &self,
        op: &Token,
        left: Value,
        right: Value,
        f: fn(f64, f64) -> f64,
    ) -> IResult<Value> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(f(a, b))),

            _ => Err(InterpretError::runtime(
                op.line,
                "Operands must be numbers.",
            )),
        }
    }

    fn comparison_op(
        &self,
        op: &Token,
        left: Value,
        right: Value,
        f: fn(f64, f64) -> bool,
    ) -> IResult<Value> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(f(a, b))),

            _ => Err(InterpretError::runtime(
                op.line,
                "Operands must be numbers.",
            )),
        }
    }

    // ───────────────────────── variables & properties ───────────────────────

    /// Resolved locals walk exactly their recorded hop count; everything else
    /// is a by-name global lookup (late binding for top-level declarations).
    fn look_up_variable(&self, id: ExprId, name: &Token) -> IResult<Value> {
        let value = match self.locals.get(&id) {
            Some(distance) => self.environment.borrow().get_at(*distance, &name.lexeme),
            None => self.globals.borrow().get(&name.lexeme),
        };

        value.ok_or_else(|| {
            InterpretError::runtime(
                name.line,
                format!("Undefined variable '{}'.", name.lexeme),
            )
        })
    }

    /// Property read: fields shadow methods; a method hit is bound to the
    /// instance before being handed out as a first-class value.
    fn get_property(&self, instance: &Rc<RefCell<Instance>>, name: &Token) -> IResult<Value> {
        if let Some(value) = instance.borrow().fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        let method = instance.borrow().class.find_method(&name.lexeme);

        match method {
            Some(method) => Ok(Value::Function(Rc::new(
                method.bind(Value::Instance(instance.clone())),
            ))),

            None => Err(InterpretError::runtime(
                name.line,
                format!("Undefined property '{}'.", name.lexeme),
            )),
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> IResult<Value> {
        // The resolver recorded the distance to the frame holding `super`;
        // `this` always lives one frame closer (the bound-method frame).
        let distance = *self.locals.get(&id).ok_or_else(|| {
            InterpretError::runtime(keyword.line, "Cannot use 'super' here.")
        })?;

        let superclass = match self.environment.borrow().get_at(distance, "super") {
            Some(Value::Class(class)) => class,

            _ => {
                return Err(InterpretError::runtime(
                    keyword.line,
                    "Cannot use 'super' here.",
                ));
            }
        };

        let object = self
            .environment
            .borrow()
            .get_at(distance - 1, "this")
            .ok_or_else(|| InterpretError::runtime(keyword.line, "Cannot use 'super' here."))?;

        let found = superclass.find_method(&method.lexeme).ok_or_else(|| {
            InterpretError::runtime(
                method.line,
                format!("Undefined property '{}'.", method.lexeme),
            )
        })?;

        Ok(Value::Function(Rc::new(found.bind(object))))
    }

    // ───────────────────────────── call machinery ───────────────────────────

    /// Invokes a callable: native function, user function/method, or class
    /// (construction).
    fn invoke_callable(
        &mut self,
        callee_val: &Value,
        paren: &Token,
        arg_values: &[Value],
    ) -> IResult<Value> {
        match callee_val {
            Value::NativeFunction(native) => {
                debug!("Calling native function '{}'", native.name);

                self.check_arity(native.arity, arg_values.len(), paren)?;

                (native.func)(arg_values)
                    .map_err(|message| InterpretError::runtime(paren.line, message))
            }

            Value::Function(function) => {
                debug!("Calling function '{}'", function.declaration.name.lexeme);

                self.check_arity(function.arity(), arg_values.len(), paren)?;

                self.call_function(function, arg_values)
            }

            Value::Class(class) => {
                debug!("Constructing instance of '{}'", class.name);

                self.check_arity(class.arity(), arg_values.len(), paren)?;

                let instance =
                    Value::Instance(Rc::new(RefCell::new(Instance::new(class.clone()))));

                if let Some(init) = class.find_method("init") {
                    let bound = init.bind(instance.clone());
                    self.call_function(&bound, arg_values)?;
                }

                Ok(instance)
            }

            _ => Err(InterpretError::runtime(
                paren.line,
                "Can only call functions and classes.",
            )),
        }
    }

    fn check_arity(&self, arity: usize, got: usize, paren: &Token) -> IResult<()> {
        if arity != got {
            return Err(InterpretError::runtime(
                paren.line,
                format!("Expected {} arguments but got {}.", arity, got),
            ));
        }

        Ok(())
    }

    /// Call a user function: parameters bind into a fresh frame whose parent
    /// is the *captured defining environment*, never the caller's frame.  A
    /// return signal is absorbed here; `init` yields the bound instance no
    /// matter how the body exits.
    fn call_function(&mut self, function: &LoxFunction, arg_values: &[Value]) -> IResult<Value> {
        let frame = Rc::new(RefCell::new(Environment::with_enclosing(
            function.closure.clone(),
        )));

        for (param, arg) in function.declaration.params.iter().zip(arg_values) {
            frame.borrow_mut().define(&param.lexeme, arg.clone());
        }

        let result = self.execute_block(&function.declaration.body, frame);

        match result {
            Ok(()) => {
                if function.is_initializer {
                    self.bound_instance(function)
                } else {
                    Ok(Value::Nil)
                }
            }

            Err(InterpretError::Return(value)) => {
                if function.is_initializer {
                    self.bound_instance(function)
                } else {
                    Ok(value)
                }
            }

            Err(e) => Err(e),
        }
    }

    /// The `this` binding of an initializer's closure (frame created by
    /// `bind`, so it sits at distance 0).
    fn bound_instance(&self, function: &LoxFunction) -> IResult<Value> {
        function
            .closure
            .borrow()
            .get_at(0, "this")
            .ok_or_else(|| {
                InterpretError::runtime(
                    function.declaration.name.line,
                    "Initializer called without a bound instance.",
                )
            })
    }
}
