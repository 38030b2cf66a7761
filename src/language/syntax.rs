use crate::language::{
    errors::SyntaxError,
    reader::{Form, FormKind},
    span::Span,
};
use std::collections::HashMap;

/// A substitution rule registered by `defsyntax`. Each use of `name` is
/// replaced by `template` with every parameter symbol swapped for the
/// corresponding argument form.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntaxRule {
    pub name: String,
    pub params: Vec<String>,
    pub template: Form,
}

impl SyntaxRule {
    pub fn expand(&self, args: &[Form], span: Span) -> Result<Form, SyntaxError> {
        if args.len() != self.params.len() {
            return Err(SyntaxError::new(
                format!(
                    "syntax `{}` expects {} arguments but received {}",
                    self.name,
                    self.params.len(),
                    args.len()
                ),
                span,
            ));
        }
        let bindings: HashMap<&str, &Form> = self
            .params
            .iter()
            .map(String::as_str)
            .zip(args.iter())
            .collect();
        Ok(substitute(&self.template, &bindings, span))
    }
}

fn substitute(template: &Form, bindings: &HashMap<&str, &Form>, span: Span) -> Form {
    match &template.kind {
        FormKind::Symbol(name) => match bindings.get(name.as_str()) {
            Some(arg) => (*arg).clone(),
            None => Form::new(template.kind.clone(), span),
        },
        FormKind::List(items) => Form::new(
            FormKind::List(
                items
                    .iter()
                    .map(|item| substitute(item, bindings, span))
                    .collect(),
            ),
            span,
        ),
        other => Form::new(other.clone(), span),
    }
}

#[derive(Clone, Debug, Default)]
pub struct SyntaxTable {
    rules: HashMap<String, SyntaxRule>,
}

impl SyntaxTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, rule: SyntaxRule) {
        self.rules.insert(rule.name.clone(), rule);
    }

    pub fn get(&self, name: &str) -> Option<&SyntaxRule> {
        self.rules.get(name)
    }

    pub fn import_from(&mut self, other: &SyntaxTable) {
        for (name, rule) in &other.rules {
            self.rules.entry(name.clone()).or_insert_with(|| rule.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::reader::read_all;

    fn rule(source: &str, name: &str, params: &[&str]) -> SyntaxRule {
        let template = read_all(source).unwrap().remove(0);
        SyntaxRule {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            template,
        }
    }

    #[test]
    fn expansion_substitutes_parameters_recursively() {
        let unless = rule("(if c nothing (do body))", "unless", &["c", "body"]);
        let args = read_all("(== a b) (print a)").unwrap();
        let expanded = unless.expand(&args, Span::new(0, 3)).unwrap();
        let items = expanded.list().unwrap();
        assert_eq!(items[0].symbol(), Some("if"));
        assert_eq!(items[1], args[0]);
        assert_eq!(items[3].list().unwrap()[1], args[1]);
    }

    #[test]
    fn expansion_checks_arity() {
        let twice = rule("(+ x x)", "twice", &["x"]);
        let err = twice.expand(&[], Span::new(4, 9)).unwrap_err();
        assert!(err.message.contains("expects 1 arguments"));
        assert_eq!(err.span, Span::new(4, 9));
    }

    #[test]
    fn import_keeps_existing_rules() {
        let mut local = SyntaxTable::new();
        local.define(rule("(a)", "shared", &[]));
        let mut other = SyntaxTable::new();
        other.define(rule("(b)", "shared", &[]));
        other.define(rule("(c)", "extra", &[]));
        local.import_from(&other);
        assert_eq!(local.len(), 2);
        assert_eq!(
            local.get("shared").unwrap().template.list().unwrap()[0].symbol(),
            Some("a")
        );
    }
}
