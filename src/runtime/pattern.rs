use crate::runtime::{
    class::ClassRef,
    environment::Scope,
    error::RuntimeResult,
    interpreter::Interpreter,
    value::Obj,
};
use std::fmt;
use std::rc::Rc;

/// A resolved pattern: class names and value expressions have already been
/// looked up in the scope that defined the method or function.
#[derive(Clone)]
pub enum Pattern {
    Wildcard,
    Bind { name: String, inner: Box<Pattern> },
    Class(ClassRef),
    Value(Obj),
    Record(Vec<(String, Pattern)>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Specificity {
    More,
    Same,
    Less,
    Unrelated,
}

impl Specificity {
    pub fn at_least_as_specific(self) -> bool {
        matches!(self, Specificity::More | Specificity::Same)
    }
}

impl Pattern {
    pub fn bind(name: impl Into<String>, inner: Pattern) -> Self {
        Pattern::Bind {
            name: name.into(),
            inner: Box::new(inner),
        }
    }

    pub fn matches(&self, interp: &mut Interpreter, value: &Obj) -> RuntimeResult<bool> {
        match self {
            Pattern::Wildcard => Ok(true),
            Pattern::Bind { inner, .. } => inner.matches(interp, value),
            Pattern::Class(class) => Ok(value.class().is_subclass_of(class)),
            Pattern::Value(expected) => interp.values_equal(expected, value),
            Pattern::Record(fields) => {
                for (name, pattern) in fields {
                    let Some(field) = value.get_field(name) else {
                        return Ok(false);
                    };
                    if !pattern.matches(interp, &field)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Declares every name bound by this pattern. Only call after `matches`
    /// succeeded for the same value.
    pub fn bind_into(&self, value: &Obj, scope: &Scope) {
        match self {
            Pattern::Bind { name, inner } => {
                scope.declare(name, value.clone(), false);
                inner.bind_into(value, scope);
            }
            Pattern::Record(fields) => {
                for (name, pattern) in fields {
                    if let Some(field) = value.get_field(name) {
                        pattern.bind_into(&field, scope);
                    }
                }
            }
            Pattern::Wildcard | Pattern::Class(_) | Pattern::Value(_) => {}
        }
    }

    fn unbound(&self) -> &Pattern {
        match self {
            Pattern::Bind { inner, .. } => inner.unbound(),
            other => other,
        }
    }

    /// How this pattern ranks against `other` when both match a value.
    pub fn compare(&self, other: &Pattern) -> Specificity {
        match (self.unbound(), other.unbound()) {
            (Pattern::Wildcard, Pattern::Wildcard) => Specificity::Same,
            (_, Pattern::Wildcard) => Specificity::More,
            (Pattern::Wildcard, _) => Specificity::Less,
            (Pattern::Value(_), Pattern::Value(_)) => Specificity::Same,
            (Pattern::Value(_), _) => Specificity::More,
            (_, Pattern::Value(_)) => Specificity::Less,
            (Pattern::Class(left), Pattern::Class(right)) => {
                if Rc::ptr_eq(left, right) {
                    Specificity::Same
                } else if left.is_subclass_of(right) {
                    Specificity::More
                } else if right.is_subclass_of(left) {
                    Specificity::Less
                } else {
                    Specificity::Unrelated
                }
            }
            (Pattern::Record(left), Pattern::Record(right)) => compare_records(left, right),
            _ => Specificity::Unrelated,
        }
    }
}

/// A record pattern naming a superset of the other's fields, each at least
/// as specific, is the more specific one.
fn compare_records(left: &[(String, Pattern)], right: &[(String, Pattern)]) -> Specificity {
    let covers = |wide: &[(String, Pattern)], narrow: &[(String, Pattern)]| {
        narrow.iter().all(|(name, narrow_pattern)| {
            wide.iter()
                .find(|(other, _)| other == name)
                .map(|(_, wide_pattern)| wide_pattern.compare(narrow_pattern).at_least_as_specific())
                .unwrap_or(false)
        })
    };
    match (covers(left, right), covers(right, left)) {
        (true, true) => Specificity::Same,
        (true, false) => Specificity::More,
        (false, true) => Specificity::Less,
        (false, false) => Specificity::Unrelated,
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Wildcard => write!(f, "_"),
            Pattern::Bind { name, inner } => match inner.as_ref() {
                Pattern::Wildcard => write!(f, "{name}"),
                inner => write!(f, "({name} {inner:?})"),
            },
            Pattern::Class(class) => write!(f, "is {}", class.name()),
            Pattern::Value(value) => write!(f, "== {value:?}"),
            Pattern::Record(fields) => {
                write!(f, "(record")?;
                for (name, pattern) in fields {
                    write!(f, " :{name} {pattern:?}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{class::ClassDescriptor, module::ModuleId};

    fn class(name: &str, parents: &[&ClassRef]) -> ClassRef {
        Rc::new(ClassDescriptor::new(
            name,
            parents.iter().map(|parent| Rc::clone(parent)).collect(),
            Vec::new(),
            Scope::root(ModuleId::new(0)),
            None,
        ))
    }

    #[test]
    fn subclass_patterns_are_more_specific() {
        let shape = class("Shape", &[]);
        let circle = class("Circle", &[&shape]);
        let unrelated = class("Color", &[]);
        let general = Pattern::Class(shape);
        let specific = Pattern::bind("c", Pattern::Class(circle));
        assert_eq!(specific.compare(&general), Specificity::More);
        assert_eq!(general.compare(&specific), Specificity::Less);
        assert_eq!(general.compare(&general.clone()), Specificity::Same);
        assert_eq!(
            general.compare(&Pattern::Class(unrelated)),
            Specificity::Unrelated
        );
    }

    #[test]
    fn wildcard_is_least_specific() {
        let shape = class("Shape", &[]);
        assert_eq!(Pattern::Class(shape.clone()).compare(&Pattern::Wildcard), Specificity::More);
        assert_eq!(Pattern::Wildcard.compare(&Pattern::Class(shape)), Specificity::Less);
        assert_eq!(
            Pattern::bind("x", Pattern::Wildcard).compare(&Pattern::Wildcard),
            Specificity::Same
        );
    }

    #[test]
    fn record_with_more_fields_is_more_specific() {
        let wide = Pattern::Record(vec![
            ("x".to_string(), Pattern::Wildcard),
            ("y".to_string(), Pattern::Wildcard),
        ]);
        let narrow = Pattern::Record(vec![("x".to_string(), Pattern::Wildcard)]);
        let other = Pattern::Record(vec![("z".to_string(), Pattern::Wildcard)]);
        assert_eq!(wide.compare(&narrow), Specificity::More);
        assert_eq!(narrow.compare(&wide), Specificity::Less);
        assert_eq!(narrow.compare(&other), Specificity::Unrelated);
    }
}
