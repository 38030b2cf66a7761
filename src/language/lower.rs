use crate::language::{
    ast::{CatchClause, ClassDef, Expr, FieldDecl, FunctionDef, MethodDef, PatternExpr},
    errors::SyntaxError,
    reader::{Form, FormKind},
    syntax::{SyntaxRule, SyntaxTable},
};
use crate::names;
use std::collections::HashSet;
use std::rc::Rc;

const MAX_EXPANSION_DEPTH: usize = 64;

/// Turns a read form into an expression, expanding any syntax rules known to
/// `syntax` first.
pub fn lower(form: &Form, syntax: &SyntaxTable) -> Result<Expr, SyntaxError> {
    Lowerer { syntax, depth: 0 }.expr(form)
}

struct Lowerer<'a> {
    syntax: &'a SyntaxTable,
    depth: usize,
}

impl<'a> Lowerer<'a> {
    fn expr(&mut self, form: &Form) -> Result<Expr, SyntaxError> {
        match &form.kind {
            FormKind::Int(value) => Ok(Expr::Int(*value)),
            FormKind::Str(text) => Ok(Expr::Str(text.clone())),
            FormKind::Keyword(name) => Err(SyntaxError::new(
                format!("unexpected keyword `:{name}`"),
                form.span,
            )
            .with_help("keywords only name fields inside `record` forms")),
            FormKind::Symbol(name) => Ok(match name.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                "nothing" => Expr::Nothing,
                _ => Expr::Name(name.clone()),
            }),
            FormKind::List(items) => self.list(form, items),
        }
    }

    fn list(&mut self, form: &Form, items: &[Form]) -> Result<Expr, SyntaxError> {
        let Some((head, args)) = items.split_first() else {
            return Err(SyntaxError::new("empty form", form.span));
        };
        let Some(name) = head.symbol() else {
            return Err(SyntaxError::new(
                format!(
                    "expected a method name or special form, found {}",
                    head.describe()
                ),
                head.span,
            ));
        };
        let syntax = self.syntax;
        if let Some(rule) = syntax.get(name) {
            return self.expand(rule, form, args);
        }
        match name {
            "do" => Ok(Expr::Sequence(
                args.iter()
                    .map(|arg| self.expr(arg))
                    .collect::<Result<_, _>>()?,
            )),
            "val" | "var" => self.define(form, args, name == "var"),
            "set!" => self.assign(form, args),
            "if" => self.conditional(form, args),
            "record" => self.record(args),
            "defclass" => self.class(form, args),
            "def" => self.method(form, args),
            "fn" => self.function(form, args),
            "import" => self.import(form, args),
            "quote" => {
                let [quoted] = args else {
                    return Err(usage(form, "(quote expr)"));
                };
                Ok(Expr::Quote(Rc::new(self.expr(quoted)?)))
            }
            "defsyntax" => self.defsyntax(form, args),
            "try" => self.try_catch(form, args),
            _ => self.call(form, name, args),
        }
    }

    fn expand(&mut self, rule: &SyntaxRule, form: &Form, args: &[Form]) -> Result<Expr, SyntaxError> {
        if self.depth >= MAX_EXPANSION_DEPTH {
            return Err(SyntaxError::new(
                format!("expansion of syntax `{}` does not terminate", rule.name),
                form.span,
            ));
        }
        let expanded = rule.expand(args, form.span)?;
        self.depth += 1;
        let result = self.expr(&expanded);
        self.depth -= 1;
        result
    }

    fn call(&mut self, form: &Form, name: &str, args: &[Form]) -> Result<Expr, SyntaxError> {
        if args.len() > 2 {
            return Err(SyntaxError::new(
                format!("`{name}` takes at most two arguments"),
                form.span,
            )
            .with_help("pass several values as a record"));
        }
        let left = match args.first() {
            Some(arg) => self.expr(arg)?,
            None => Expr::Nothing,
        };
        let right = match args.get(1) {
            Some(arg) => self.expr(arg)?,
            None => Expr::Nothing,
        };
        Ok(Expr::call(name, left, right))
    }

    fn define(&mut self, form: &Form, args: &[Form], mutable: bool) -> Result<Expr, SyntaxError> {
        let [name, value] = args else {
            return Err(usage(form, "(val name expr) or (var name expr)"));
        };
        Ok(Expr::Define {
            name: symbol(name, "a variable name")?.to_string(),
            value: Box::new(self.expr(value)?),
            mutable,
        })
    }

    fn assign(&mut self, form: &Form, args: &[Form]) -> Result<Expr, SyntaxError> {
        let [target, value] = args else {
            return Err(usage(form, "(set! name expr) or (set! (field object) expr)"));
        };
        let value = self.expr(value)?;
        if let Some(name) = target.symbol() {
            return Ok(Expr::Assign {
                name: name.to_string(),
                value: Box::new(value),
            });
        }
        match target.list() {
            Some([field, object]) => {
                let field = symbol(field, "a field name")?;
                Ok(Expr::call(names::assigner(field), self.expr(object)?, value))
            }
            _ => Err(SyntaxError::new("invalid assignment target", target.span)
                .with_help("assign to a variable name or to `(field object)`")),
        }
    }

    fn conditional(&mut self, form: &Form, args: &[Form]) -> Result<Expr, SyntaxError> {
        let (condition, then_branch, else_branch) = match args {
            [condition, then_branch] => (condition, then_branch, None),
            [condition, then_branch, else_branch] => (condition, then_branch, Some(else_branch)),
            _ => return Err(usage(form, "(if condition then else?)")),
        };
        Ok(Expr::If {
            condition: Box::new(self.expr(condition)?),
            then_branch: Box::new(self.expr(then_branch)?),
            else_branch: match else_branch {
                Some(branch) => Some(Box::new(self.expr(branch)?)),
                None => None,
            },
        })
    }

    fn record(&mut self, args: &[Form]) -> Result<Expr, SyntaxError> {
        let entries = record_entries(args)?;
        let mut fields = Vec::with_capacity(entries.len());
        for (name, value) in entries {
            fields.push((name, self.expr(value)?));
        }
        Ok(Expr::Record(fields))
    }

    fn class(&mut self, form: &Form, args: &[Form]) -> Result<Expr, SyntaxError> {
        let [name, parents, members @ ..] = args else {
            return Err(usage(form, "(defclass Name (Parents...) fields...)"));
        };
        let name = symbol(name, "a class name")?.to_string();
        let Some(parents) = parents.list() else {
            return Err(SyntaxError::new("expected a list of parent classes", parents.span)
                .with_help("write `()` for a class without parents"));
        };
        let parents = parents
            .iter()
            .map(|parent| symbol(parent, "a parent class name").map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;

        let mut fields: Vec<FieldDecl> = Vec::new();
        let mut doc = None;
        for member in members {
            if let FormKind::Str(text) = &member.kind {
                if doc.is_some() {
                    return Err(SyntaxError::new("class already has a doc string", member.span));
                }
                doc = Some(text.clone());
                continue;
            }
            let field = self.field(member)?;
            if fields.iter().any(|existing| existing.name == field.name) {
                return Err(SyntaxError::new(
                    format!("field `{}` is declared twice", field.name),
                    member.span,
                ));
            }
            fields.push(field);
        }
        Ok(Expr::Class(ClassDef {
            name,
            parents,
            fields,
            doc,
        }))
    }

    fn field(&mut self, member: &Form) -> Result<FieldDecl, SyntaxError> {
        let invalid = || {
            SyntaxError::new("expected a field declaration", member.span)
                .with_help("fields are written `(var name default?)` or `(val name default?)`")
        };
        let Some([keyword, name, rest @ ..]) = member.list() else {
            return Err(invalid());
        };
        let mutable = match keyword.symbol() {
            Some("var") => true,
            Some("val") => false,
            _ => return Err(invalid()),
        };
        let initializer = match rest {
            [] => None,
            [value] => Some(Rc::new(self.expr(value)?)),
            _ => return Err(invalid()),
        };
        Ok(FieldDecl {
            name: symbol(name, "a field name")?.to_string(),
            mutable,
            initializer,
        })
    }

    fn method(&mut self, form: &Form, args: &[Form]) -> Result<Expr, SyntaxError> {
        let [name, left, right, body @ ..] = args else {
            return Err(usage(form, "(def name left-pattern right-pattern body...)"));
        };
        if body.is_empty() {
            return Err(usage(form, "(def name left-pattern right-pattern body...)"));
        }
        Ok(Expr::Method(MethodDef {
            name: symbol(name, "a method name")?.to_string(),
            left: self.pattern(left)?,
            right: self.pattern(right)?,
            body: Rc::new(self.body(body)?),
        }))
    }

    fn function(&mut self, form: &Form, args: &[Form]) -> Result<Expr, SyntaxError> {
        let [pattern, body @ ..] = args else {
            return Err(usage(form, "(fn pattern body...)"));
        };
        if body.is_empty() {
            return Err(usage(form, "(fn pattern body...)"));
        }
        Ok(Expr::Function(FunctionDef {
            pattern: self.pattern(pattern)?,
            body: Rc::new(self.body(body)?),
        }))
    }

    fn import(&mut self, form: &Form, args: &[Form]) -> Result<Expr, SyntaxError> {
        match args {
            [Form {
                kind: FormKind::Str(name),
                ..
            }] => Ok(Expr::Import(name.clone())),
            _ => Err(usage(form, "(import \"module.name\")")),
        }
    }

    fn defsyntax(&mut self, form: &Form, args: &[Form]) -> Result<Expr, SyntaxError> {
        let [name, params, template] = args else {
            return Err(usage(form, "(defsyntax name (params...) template)"));
        };
        let Some(params) = params.list() else {
            return Err(SyntaxError::new("expected a parameter list", params.span));
        };
        let params = params
            .iter()
            .map(|param| symbol(param, "a parameter name").map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Expr::DefSyntax(SyntaxRule {
            name: symbol(name, "a syntax name")?.to_string(),
            params,
            template: template.clone(),
        }))
    }

    fn try_catch(&mut self, form: &Form, args: &[Form]) -> Result<Expr, SyntaxError> {
        let [body, clauses @ ..] = args else {
            return Err(usage(form, "(try body (catch ErrorClass name handler...)...)"));
        };
        let mut catches = Vec::with_capacity(clauses.len());
        for clause in clauses {
            let Some([keyword, class, binding, handler @ ..]) = clause.list() else {
                return Err(usage(clause, "(catch ErrorClass name handler...)"));
            };
            if keyword.symbol() != Some("catch") {
                return Err(usage(clause, "(catch ErrorClass name handler...)"));
            }
            let binding = match symbol(binding, "a variable name")? {
                "_" => None,
                name => Some(name.to_string()),
            };
            catches.push(CatchClause {
                class: symbol(class, "an error class name")?.to_string(),
                binding,
                body: self.body(handler)?,
            });
        }
        Ok(Expr::Try {
            body: Box::new(self.expr(body)?),
            catches,
        })
    }

    fn body(&mut self, forms: &[Form]) -> Result<Expr, SyntaxError> {
        match forms {
            [] => Ok(Expr::Nothing),
            [single] => self.expr(single),
            _ => Ok(Expr::Sequence(
                forms
                    .iter()
                    .map(|form| self.expr(form))
                    .collect::<Result<_, _>>()?,
            )),
        }
    }

    fn pattern(&mut self, form: &Form) -> Result<PatternExpr, SyntaxError> {
        match &form.kind {
            FormKind::Symbol(name) => Ok(match name.as_str() {
                "_" => PatternExpr::Wildcard,
                "nothing" | "true" | "false" => PatternExpr::Equals(Box::new(self.expr(form)?)),
                _ => PatternExpr::bind(name.clone(), PatternExpr::Wildcard),
            }),
            FormKind::Int(_) | FormKind::Str(_) => {
                Ok(PatternExpr::Equals(Box::new(self.expr(form)?)))
            }
            FormKind::Keyword(_) => Err(malformed_pattern(form)),
            FormKind::List(items) => {
                let heads: Vec<Option<&str>> = items.iter().map(Form::symbol).collect();
                match (heads.as_slice(), items.as_slice()) {
                    ([Some("is"), Some(class)], _) => Ok(PatternExpr::Is(class.to_string())),
                    ([Some("=="), _], [_, value]) => {
                        Ok(PatternExpr::Equals(Box::new(self.expr(value)?)))
                    }
                    ([Some(name), Some("is"), Some(class)], _) => Ok(PatternExpr::bind(
                        *name,
                        PatternExpr::Is(class.to_string()),
                    )),
                    ([Some(name), Some("=="), _], [_, _, value]) => Ok(PatternExpr::bind(
                        *name,
                        PatternExpr::Equals(Box::new(self.expr(value)?)),
                    )),
                    ([Some("record"), ..], [_, entries @ ..]) => {
                        let mut fields = Vec::new();
                        for (name, value) in record_entries(entries)? {
                            fields.push((name, self.pattern(value)?));
                        }
                        Ok(PatternExpr::Record(fields))
                    }
                    _ => Err(malformed_pattern(form)),
                }
            }
        }
    }
}

/// Pairs each record value with its field name: `:name value` entries keep
/// their name, bare values are numbered positionally.
fn record_entries(args: &[Form]) -> Result<Vec<(String, &Form)>, SyntaxError> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    let mut position = 0;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let (name, value) = match &arg.kind {
            FormKind::Keyword(name) => {
                let Some(value) = iter.next() else {
                    return Err(SyntaxError::new(
                        format!("field `:{name}` has no value"),
                        arg.span,
                    ));
                };
                (name.clone(), value)
            }
            _ => {
                let name = names::tuple_field(position);
                position += 1;
                (name, arg)
            }
        };
        if !seen.insert(name.clone()) {
            return Err(SyntaxError::new(
                format!("record field `{name}` appears twice"),
                arg.span,
            ));
        }
        entries.push((name, value));
    }
    Ok(entries)
}

fn symbol<'f>(form: &'f Form, what: &str) -> Result<&'f str, SyntaxError> {
    form.symbol().ok_or_else(|| {
        SyntaxError::new(
            format!("expected {what}, found {}", form.describe()),
            form.span,
        )
    })
}

fn usage(form: &Form, shape: &str) -> SyntaxError {
    SyntaxError::new("malformed form", form.span).with_help(format!("expected {shape}"))
}

fn malformed_pattern(form: &Form) -> SyntaxError {
    SyntaxError::new("malformed pattern", form.span).with_help(
        "patterns are `_`, `name`, `(is Class)`, `(name is Class)`, `(== value)`, \
         `(name == value)` or `(record :field pattern ...)`",
    )
}
