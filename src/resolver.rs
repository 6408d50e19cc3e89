//! Static resolver pass for the interpreter.
//!
//! One AST walk that does three things:
//! 1. Build lexical scopes (a stack of `HashMap<String, bool>` tracking
//!    declared vs. defined names).  The stack is scratch state — it is
//!    discarded when the pass ends.
//! 2. Report static errors: same-scope redeclaration, reading a local in its
//!    own initializer, `return` outside a function, `return <value>` inside
//!    `init`, `this`/`super` outside a class (or outside a subclass), and a
//!    class inheriting from itself.  All errors in a program are collected in
//!    one pass.
//! 3. Record, for every local variable occurrence, the number of environment
//!    hops between its use and its declaring scope.  Names not found in any
//!    scope are *deliberately absent* from the table: they are globals,
//!    looked up by name at use time, which is what permits forward references
//!    among top-level declarations.

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::error::LoxError;
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;
use std::mem;

/// The hop-count table: expression identity → environment distance.
pub type Locals = HashMap<ExprId, usize>;

/// What kind of function body are we inside?  Validates `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

/// What kind of class body are we inside?  Validates `this` / `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and records binding
/// distances for the evaluator.
pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    locals: Locals,
    errors: Vec<LoxError>,
    current_function: FunctionType,
    current_class: ClassType,

    /// Name of the top-level `var` whose initializer is being resolved, if
    /// any.  Top level has no scope frame, so the not-ready mechanism cannot
    /// catch `var a = a;` there; this does.
    pending_global: Option<String>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        info!("Resolver instantiated");

        Resolver {
            scopes: Vec::new(),
            locals: Locals::new(),
            errors: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            pending_global: None,
        }
    }

    /// Walk all top-level statements.  Returns the hop-count table, or every
    /// static error found.
    pub fn resolve(mut self, statements: &[Stmt]) -> Result<Locals, Vec<LoxError>> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        if self.errors.is_empty() {
            Ok(self.locals)
        } else {
            Err(mem::take(&mut self.errors))
        }
    }

    fn error<S: Into<String>>(&mut self, line: usize, message: S) {
        self.errors.push(LoxError::resolve(line, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define, so a reference to
                // the declared name inside its own initializer is seen while
                // the name is still not-ready.
                self.declare(name);

                if let Some(expr) = initializer {
                    let at_top = self.scopes.is_empty();

                    if at_top {
                        self.pending_global = Some(name.lexeme.clone());
                    }

                    self.resolve_expr(expr);

                    if at_top {
                        self.pending_global = None;
                    }
                }

                self.define(name);
            }

            Stmt::Function(decl) => {
                // The name is visible inside its own body (recursion).
                self.declare(&decl.name);
                self.define(&decl.name);

                self.resolve_function(decl, FunctionType::Function);
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
                if self.current_function == FunctionType::None {
                    self.error(keyword.line, "Cannot return from top-level code");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword.line, "Cannot return a value from an initializer");
                    }

                    self.resolve_expr(expr);
                }
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let enclosing = self.current_class;
                self.current_class = ClassType::Class;

                self.declare(name);
                self.define(name);

                if let Some(sc) = superclass {
                    if let Expr::Variable { name: sc_name, .. } = sc {
                        if sc_name.lexeme == name.lexeme {
                            self.error(sc_name.line, "A class cannot inherit from itself");
                        }
                    }

                    self.current_class = ClassType::Subclass;
                    self.resolve_expr(sc);

                    // Implicit scope holding `super` around all methods.
                    self.begin_scope();
                    self.define_name("super");
                }

                // Implicit `this` scope around all methods.
                self.begin_scope();
                self.define_name("this");

                for method in methods {
                    let declaration = if method.name.lexeme == "init" {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };

                    self.resolve_function(method, declaration);
                }

                self.end_scope();

                if superclass.is_some() {
                    self.end_scope();
                }

                self.current_class = enclosing;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

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
                // Not-ready in the innermost scope means this is the very
                // variable whose initializer we are inside.  The reference
                // binds to the next outer binding of the same name (inner
                // `var a = a + 1;` reads the outer `a` before shadowing
                // completes); with no outer local binding the lookup falls
                // through to the globals.
                let in_own_initializer = self
                    .scopes
                    .last()
                    .and_then(|scope| scope.get(&name.lexeme))
                    == Some(&false);

                if in_own_initializer {
                    for (depth, scope) in self.scopes.iter().rev().enumerate().skip(1) {
                        if scope.contains_key(&name.lexeme) {
                            debug!(
                                "Shadowing initializer: '{}' bound at depth {}",
                                name.lexeme, depth
                            );

                            self.locals.insert(*id, depth);
                            return;
                        }
                    }

                    // No outer local binding: leave it to the global
                    // environment at runtime.
                    return;
                }

                if self.scopes.is_empty()
                    && self.pending_global.as_deref() == Some(name.lexeme.as_str())
                {
                    self.error(
                        name.line,
                        "Cannot read local variable in its own initializer",
                    );
                    return;
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // First resolve RHS, then bind LHS.
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

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword.line, "Cannot use 'this' outside of a class");
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.error(keyword.line, "Cannot use 'super' outside of a class");
                        return;
                    }

                    ClassType::Class => {
                        self.error(
                            keyword.line,
                            "Cannot use 'super' in a class with no superclass",
                        );
                        return;
                    }

                    ClassType::Subclass => {}
                }

                self.resolve_local(*id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, decl: &FunctionDecl, ftype: FunctionType) {
        let enclosing = self.current_function;
        self.current_function = ftype;

        self.begin_scope();

        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }

        for stmt in &decl.body {
            self.resolve_stmt(stmt);
        }

        self.end_scope();

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
        let mut duplicate = false;

        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                duplicate = true;
            } else {
                scope.insert(name.lexeme.clone(), false);
            }
        }

        if duplicate {
            self.error(name.line, "Variable already declared in this scope");
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    /// Define a synthetic name (`this` / `super`) in the innermost scope.
    fn define_name(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this variable occurrence as a local at its hop count, or leave
    /// it out of the table entirely (⇒ global, late-bound by name).
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                self.locals.insert(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
