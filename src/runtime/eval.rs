use crate::language::ast::{CatchClause, ClassDef, Expr, PatternExpr};
use crate::names;
use crate::runtime::{
    class::{ClassRef, FieldDef},
    environment::{BindingError, Scope},
    error::{RuntimeError, RuntimeResult},
    interpreter::Interpreter,
    module::Context,
    multimethod::Method,
    pattern::Pattern,
    value::Obj,
};
use std::rc::Rc;

impl Interpreter {
    pub fn evaluate(&mut self, expr: &Expr, ctx: &Context, scope: &Rc<Scope>) -> RuntimeResult<Obj> {
        match expr {
            Expr::Int(value) => Ok(self.create_int(*value)),
            Expr::Str(value) => Ok(self.create_string(value.clone())),
            Expr::Bool(value) => Ok(self.create_bool(*value)),
            Expr::Nothing => Ok(self.nothing()),
            Expr::Name(name) => self.eval_name(name, ctx, scope),
            Expr::Sequence(items) => {
                let inner = scope.child();
                let mut last = self.nothing();
                for item in items {
                    last = self.evaluate(item, ctx, &inner)?;
                }
                Ok(last)
            }
            Expr::Define {
                name,
                value,
                mutable,
            } => {
                let value = self.evaluate(value, ctx, scope)?;
                scope.declare(name, value.clone(), *mutable);
                Ok(value)
            }
            Expr::Assign { name, value } => {
                let value = self.evaluate(value, ctx, scope)?;
                match scope.assign(name, value.clone()) {
                    Ok(()) => Ok(value),
                    Err(error) => Err(self.binding_error(error)),
                }
            }
            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.evaluate(condition, ctx, scope)?;
                if self.is_truthy(&condition) {
                    self.evaluate(then_branch, ctx, scope)
                } else if let Some(branch) = else_branch {
                    self.evaluate(branch, ctx, scope)
                } else {
                    Ok(self.nothing())
                }
            }
            Expr::Record(fields) => {
                let mut values = Vec::with_capacity(fields.len());
                for (name, value) in fields {
                    values.push((name.clone(), self.evaluate(value, ctx, scope)?));
                }
                Ok(self.create_record(values))
            }
            Expr::Call {
                method,
                left,
                right,
            } => {
                let left_value = self.evaluate(left, ctx, scope)?;
                let right_value = self.evaluate(right, ctx, scope)?;
                self.eval_call(method, left_value, right_value, right, ctx, scope)
            }
            Expr::Class(def) => self.eval_class(def, scope),
            Expr::Method(def) => {
                let left = self.resolve_pattern(&def.left, ctx, scope)?;
                let right = self.resolve_pattern(&def.right, ctx, scope)?;
                scope.define_method(
                    &def.name,
                    Method::interpreted(left, right, scope.clone(), def.body.clone()),
                );
                Ok(self.nothing())
            }
            Expr::Function(def) => {
                let pattern = self.resolve_pattern(&def.pattern, ctx, scope)?;
                Ok(self.create_fn(pattern, def.body.clone(), scope.clone()))
            }
            Expr::Import(name) => {
                let module = self.import_module(name)?;
                scope.import_all(module.scope());
                self.module(ctx.module()).import_syntax(&module);
                Ok(self.nothing())
            }
            Expr::Quote(expr) => Ok(self.create_expression(expr.clone())),
            Expr::DefSyntax(rule) => {
                self.module(ctx.module()).define_syntax(rule.clone());
                Ok(self.nothing())
            }
            Expr::Try { body, catches } => match self.evaluate(body, ctx, scope) {
                Err(RuntimeError::Raised(error)) => self.eval_catch(error, catches, ctx, scope),
                other => other,
            },
        }
    }

    /// A bare name is a variable, or else a call of the multimethod with that
    /// name on `nothing`.
    fn eval_name(&mut self, name: &str, ctx: &Context, scope: &Rc<Scope>) -> RuntimeResult<Obj> {
        if let Some(value) = scope.get(name) {
            return Ok(value);
        }
        match scope.look_up_multimethod(name) {
            Some(multimethod) => {
                let nothing = self.nothing();
                multimethod.invoke(self, ctx, nothing.clone(), nothing)
            }
            None => Err(self.binding_error(BindingError::Unknown {
                name: name.to_string(),
            })),
        }
    }

    fn eval_call(
        &mut self,
        method: &str,
        left: Obj,
        right: Obj,
        right_expr: &Expr,
        ctx: &Context,
        scope: &Rc<Scope>,
    ) -> RuntimeResult<Obj> {
        if let Some(multimethod) = scope.look_up_multimethod(method) {
            return multimethod.invoke(self, ctx, left, right);
        }
        // `(f x)` on a variable holding a function calls it; a second
        // argument turns the call into one on a pair.
        if let Some(function) = scope.get(method) {
            if function.as_function().is_some() {
                let arg = match right_expr {
                    Expr::Nothing => left,
                    _ => self.create_tuple(vec![left, right]),
                };
                return self.invoke_in(scope, ctx, names::CALL, function, arg);
            }
        }
        Err(self.raise_error(
            names::NO_METHOD_ERROR,
            format!("Could not find a method named \"{method}\"."),
        ))
    }

    fn eval_class(&mut self, def: &ClassDef, scope: &Rc<Scope>) -> RuntimeResult<Obj> {
        let mut parents = Vec::with_capacity(def.parents.len());
        for parent in &def.parents {
            parents.push(self.resolve_class(parent, scope)?);
        }
        let fields = def
            .fields
            .iter()
            .map(|field| FieldDef::new(field.name.clone(), field.mutable, field.initializer.clone()))
            .collect();
        let class = self.create_class(&def.name, parents, fields, scope, def.doc.clone())?;
        scope.declare(&def.name, class.clone(), false);
        Ok(class)
    }

    fn eval_catch(
        &mut self,
        error: Obj,
        catches: &[CatchClause],
        ctx: &Context,
        scope: &Rc<Scope>,
    ) -> RuntimeResult<Obj> {
        for clause in catches {
            let class = self.resolve_class(&clause.class, scope)?;
            if !error.class().is_subclass_of(&class) {
                continue;
            }
            let handler_scope = scope.child();
            if let Some(binding) = &clause.binding {
                handler_scope.declare(binding, error.clone(), false);
            }
            return self.evaluate(&clause.body, ctx, &handler_scope);
        }
        Err(RuntimeError::Raised(error))
    }

    pub fn resolve_pattern(
        &mut self,
        pattern: &PatternExpr,
        ctx: &Context,
        scope: &Rc<Scope>,
    ) -> RuntimeResult<Pattern> {
        Ok(match pattern {
            PatternExpr::Wildcard => Pattern::Wildcard,
            PatternExpr::Bind { name, inner } => {
                Pattern::bind(name.clone(), self.resolve_pattern(inner, ctx, scope)?)
            }
            PatternExpr::Is(class) => Pattern::Class(self.resolve_class(class, scope)?),
            PatternExpr::Equals(expr) => Pattern::Value(self.evaluate(expr, ctx, scope)?),
            PatternExpr::Record(fields) => {
                let mut resolved = Vec::with_capacity(fields.len());
                for (name, field) in fields {
                    resolved.push((name.clone(), self.resolve_pattern(field, ctx, scope)?));
                }
                Pattern::Record(resolved)
            }
        })
    }

    fn resolve_class(&mut self, name: &str, scope: &Scope) -> RuntimeResult<ClassRef> {
        match scope.get(name) {
            Some(value) => match value.as_class() {
                Some(class) => Ok(class.clone()),
                None => Err(self.raise_error(
                    names::TYPE_ERROR,
                    format!("\"{name}\" is a {}, not a class.", value.class().name()),
                )),
            },
            None => Err(self.binding_error(BindingError::Unknown {
                name: name.to_string(),
            })),
        }
    }

    fn binding_error(&mut self, error: BindingError) -> RuntimeError {
        let class = match error {
            BindingError::Unknown { .. } => names::NO_VARIABLE_ERROR,
            BindingError::Immutable { .. } => names::IMMUTABLE_VARIABLE_ERROR,
        };
        self.raise_error(class, error.to_string())
    }
}
