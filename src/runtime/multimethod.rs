use crate::language::ast::Expr;
use crate::names;
use crate::runtime::{
    environment::Scope,
    error::RuntimeResult,
    interpreter::Interpreter,
    intrinsics::Intrinsic,
    module::{Context, ModuleId},
    pattern::{Pattern, Specificity},
    value::Obj,
};
use std::cell::RefCell;
use std::fmt;
use std::ptr;
use std::rc::Rc;

#[derive(Clone)]
pub enum Callable {
    Interpreted { closure: Rc<Scope>, body: Rc<Expr> },
    Intrinsic(Rc<dyn Intrinsic>),
}

/// One clause of a multimethod.
#[derive(Clone)]
pub struct Method {
    pub left: Pattern,
    pub right: Pattern,
    pub callable: Callable,
    /// Module whose scope defined the clause, stamped by `Scope::define_method`.
    pub origin: Option<ModuleId>,
}

impl Method {
    pub fn interpreted(left: Pattern, right: Pattern, closure: Rc<Scope>, body: Rc<Expr>) -> Self {
        Self {
            left,
            right,
            callable: Callable::Interpreted { closure, body },
            origin: None,
        }
    }

    pub fn intrinsic(left: Pattern, right: Pattern, intrinsic: impl Intrinsic + 'static) -> Self {
        Self {
            left,
            right,
            callable: Callable::Intrinsic(Rc::new(intrinsic)),
            origin: None,
        }
    }

    pub fn matches(&self, interp: &mut Interpreter, left: &Obj, right: &Obj) -> RuntimeResult<bool> {
        Ok(self.left.matches(interp, left)? && self.right.matches(interp, right)?)
    }

    /// True when this clause should be preferred over `other`.
    pub fn beats(&self, other: &Method) -> bool {
        let left = self.left.compare(&other.left);
        let right = self.right.compare(&other.right);
        left.at_least_as_specific()
            && right.at_least_as_specific()
            && (left == Specificity::More || right == Specificity::More)
    }

    pub fn invoke(
        &self,
        interp: &mut Interpreter,
        ctx: &Context,
        left: Obj,
        right: Obj,
    ) -> RuntimeResult<Obj> {
        match &self.callable {
            Callable::Intrinsic(intrinsic) => intrinsic.invoke(interp, ctx, left, right),
            Callable::Interpreted { closure, body } => {
                let scope = closure.child();
                self.left.bind_into(&left, &scope);
                self.right.bind_into(&right, &scope);
                interp.evaluate(body, &Context::new(closure.module()), &scope)
            }
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.callable {
            Callable::Interpreted { .. } => "interpreted",
            Callable::Intrinsic(_) => "intrinsic",
        };
        write!(f, "{:?} {:?} ({kind})", self.left, self.right)
    }
}

/// A named operation dispatched on both arguments. Clauses accumulate from
/// every module that defines a method of this name.
pub struct Multimethod {
    name: String,
    methods: RefCell<Vec<Rc<Method>>>,
}

impl Multimethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: RefCell::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&self, method: Method) {
        self.methods.borrow_mut().push(Rc::new(method));
    }

    /// Appends the clauses of `other` this multimethod does not already hold.
    pub fn merge(&self, other: &Multimethod) -> usize {
        if ptr::eq(self, other) {
            return 0;
        }
        let theirs = other.methods();
        let mut ours = self.methods.borrow_mut();
        let mut added = 0;
        for method in theirs {
            if !ours.iter().any(|existing| Rc::ptr_eq(existing, &method)) {
                ours.push(method);
                added += 1;
            }
        }
        added
    }

    /// Drops every clause defined by `module`, returning how many went.
    pub fn forget_module(&self, module: ModuleId) -> usize {
        let mut methods = self.methods.borrow_mut();
        let before = methods.len();
        methods.retain(|method| method.origin != Some(module));
        before - methods.len()
    }

    pub fn len(&self) -> usize {
        self.methods.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.borrow().is_empty()
    }

    pub fn methods(&self) -> Vec<Rc<Method>> {
        self.methods.borrow().clone()
    }

    /// Picks the unique most specific clause applicable to the arguments.
    pub fn select(&self, interp: &mut Interpreter, left: &Obj, right: &Obj) -> RuntimeResult<Rc<Method>> {
        // Snapshot so value patterns may dispatch `==` (and even extend this
        // multimethod) while we are matching.
        let candidates = self.methods();
        let mut applicable = Vec::new();
        for method in candidates {
            if method.matches(interp, left, right)? {
                applicable.push(method);
            }
        }

        let winners: Vec<Rc<Method>> = applicable
            .iter()
            .filter(|method| !applicable.iter().any(|other| other.beats(method)))
            .cloned()
            .collect();

        match winners.as_slice() {
            [winner] => Ok(winner.clone()),
            [] => Err(interp.raise_error(
                names::NO_METHOD_ERROR,
                format!(
                    "No method `{}` matches ({}, {}).",
                    self.name,
                    left.class().name(),
                    right.class().name()
                ),
            )),
            _ => Err(interp.raise_error(
                names::AMBIGUOUS_METHOD_ERROR,
                format!(
                    "Call to `{}` with ({}, {}) is ambiguous between {} methods.",
                    self.name,
                    left.class().name(),
                    right.class().name(),
                    winners.len()
                ),
            )),
        }
    }

    pub fn invoke(
        &self,
        interp: &mut Interpreter,
        ctx: &Context,
        left: Obj,
        right: Obj,
    ) -> RuntimeResult<Obj> {
        let method = self.select(interp, &left, &right)?;
        method.invoke(interp, ctx, left, right)
    }
}

impl fmt::Debug for Multimethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Multimethod")
            .field("name", &self.name)
            .field("methods", &self.methods.borrow().len())
            .finish()
    }
}
