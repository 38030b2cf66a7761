use crate::language::ast::Expr;
use crate::runtime::{class::ClassRef, environment::Scope, pattern::Pattern};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub type Obj = Rc<Object>;

/// Opaque payload attached to an object when it is created. Only intrinsics
/// look inside it.
pub enum Native {
    Bool(bool),
    Int(i64),
    Str(String),
    Class(ClassRef),
    Function(Rc<Function>),
    Elements(RefCell<Vec<Obj>>),
    Expression(Rc<Expr>),
    Host(Rc<dyn Any>),
}

impl fmt::Debug for Native {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Native::Bool(value) => write!(f, "{value}"),
            Native::Int(value) => write!(f, "{value}"),
            Native::Str(value) => write!(f, "{value:?}"),
            Native::Class(class) => write!(f, "class {}", class.name()),
            Native::Function(_) => write!(f, "<fn>"),
            Native::Elements(items) => write!(f, "<{} elements>", items.borrow().len()),
            Native::Expression(expr) => write!(f, "{expr:?}"),
            Native::Host(_) => write!(f, "<host value>"),
        }
    }
}

pub struct Object {
    class: ClassRef,
    native: Option<Native>,
    fields: RefCell<HashMap<String, Obj>>,
}

impl Object {
    pub fn new(class: ClassRef, native: Option<Native>) -> Obj {
        Rc::new(Self {
            class,
            native,
            fields: RefCell::new(HashMap::new()),
        })
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    pub fn native(&self) -> Option<&Native> {
        self.native.as_ref()
    }

    pub fn get_field(&self, name: &str) -> Option<Obj> {
        self.fields.borrow().get(name).cloned()
    }

    pub fn set_field(&self, name: &str, value: Obj) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.borrow().contains_key(name)
    }

    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.fields.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.native {
            Some(Native::Bool(value)) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.native {
            Some(Native::Int(value)) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.native {
            Some(Native::Str(value)) => Some(value),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassRef> {
        match &self.native {
            Some(Native::Class(class)) => Some(class),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Rc<Function>> {
        match &self.native {
            Some(Native::Function(function)) => Some(function),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&Rc<Expr>> {
        match &self.native {
            Some(Native::Expression(expr)) => Some(expr),
            _ => None,
        }
    }

    pub fn elements(&self) -> Option<&RefCell<Vec<Obj>>> {
        match &self.native {
            Some(Native::Elements(items)) => Some(items),
            _ => None,
        }
    }

    pub fn host<T: Any>(&self) -> Option<&T> {
        match &self.native {
            Some(Native::Host(value)) => value.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Object");
        debug.field("class", &self.class.name());
        if let Some(native) = &self.native {
            debug.field("native", native);
        }
        if let Ok(fields) = self.fields.try_borrow() {
            let mut names: Vec<&String> = fields.keys().collect();
            names.sort();
            debug.field("fields", &names);
        }
        debug.finish()
    }
}

/// Identity comparison. Two handles to the same class descriptor are the
/// same class even when wrapped by different objects.
pub fn is_identical(a: &Obj, b: &Obj) -> bool {
    if Rc::ptr_eq(a, b) {
        return true;
    }
    match (a.as_class(), b.as_class()) {
        (Some(left), Some(right)) => Rc::ptr_eq(left, right),
        _ => false,
    }
}

pub struct Function {
    pub pattern: Pattern,
    pub body: Rc<Expr>,
    pub closure: Rc<Scope>,
}
