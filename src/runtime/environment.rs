use crate::runtime::{
    module::ModuleId,
    multimethod::{Method, Multimethod},
    value::Obj,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct Variable {
    pub value: Obj,
    pub mutable: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("Could not find a variable named \"{name}\".")]
    Unknown { name: String },
    #[error("Variable \"{name}\" is immutable and cannot be assigned.")]
    Immutable { name: String },
}

/// A lexical namespace. Variables and multimethods live side by side so a
/// field getter and a local variable may share a name.
pub struct Scope {
    parent: Option<Rc<Scope>>,
    module: ModuleId,
    variables: RefCell<HashMap<String, Variable>>,
    multimethods: RefCell<HashMap<String, Rc<Multimethod>>>,
}

impl Scope {
    pub fn root(module: ModuleId) -> Rc<Self> {
        Rc::new(Self {
            parent: None,
            module,
            variables: RefCell::new(HashMap::new()),
            multimethods: RefCell::new(HashMap::new()),
        })
    }

    pub fn child(self: &Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            parent: Some(self.clone()),
            module: self.module,
            variables: RefCell::new(HashMap::new()),
            multimethods: RefCell::new(HashMap::new()),
        })
    }

    pub fn parent(&self) -> Option<&Rc<Scope>> {
        self.parent.as_ref()
    }

    pub fn module(&self) -> ModuleId {
        self.module
    }

    pub fn declare(&self, name: &str, value: Obj, mutable: bool) {
        self.variables
            .borrow_mut()
            .insert(name.to_string(), Variable { value, mutable });
    }

    pub fn assign(&self, name: &str, value: Obj) -> Result<(), BindingError> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(variable) = current.variables.borrow_mut().get_mut(name) {
                if !variable.mutable {
                    return Err(BindingError::Immutable {
                        name: name.to_string(),
                    });
                }
                variable.value = value;
                return Ok(());
            }
            scope = current.parent.as_deref();
        }
        Err(BindingError::Unknown {
            name: name.to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<Obj> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(variable) = current.variables.borrow().get(name) {
                return Some(variable.value.clone());
            }
            scope = current.parent.as_deref();
        }
        None
    }

    pub fn look_up_multimethod(&self, name: &str) -> Option<Rc<Multimethod>> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(multimethod) = current.multimethods.borrow().get(name) {
                return Some(multimethod.clone());
            }
            scope = current.parent.as_deref();
        }
        None
    }

    /// Adds a clause to the multimethod `name`. An enclosing or imported
    /// multimethod of that name is extended rather than shadowed. The clause
    /// is stamped with this scope's module.
    pub fn define_method(&self, name: &str, mut method: Method) -> Rc<Multimethod> {
        method.origin = Some(self.module);
        let existing = self.multimethods.borrow().get(name).cloned();
        let multimethod = match existing {
            Some(multimethod) => multimethod,
            None => {
                let multimethod = self
                    .parent
                    .as_ref()
                    .and_then(|parent| parent.look_up_multimethod(name))
                    .unwrap_or_else(|| Rc::new(Multimethod::new(name)));
                self.multimethods
                    .borrow_mut()
                    .insert(name.to_string(), multimethod.clone());
                multimethod
            }
        };
        multimethod.add(method);
        multimethod
    }

    /// Copies every binding defined directly in `other`. Multimethods this
    /// scope lacks are shared, so later definitions in either scope extend
    /// the same method; one this scope already has takes in the imported
    /// clauses instead.
    pub fn import_all(&self, other: &Scope) {
        if std::ptr::eq(self, other) {
            return;
        }
        {
            let theirs = other.variables.borrow();
            let mut ours = self.variables.borrow_mut();
            for (name, variable) in theirs.iter() {
                ours.insert(name.clone(), variable.clone());
            }
        }
        let theirs = other.multimethods.borrow();
        let mut ours = self.multimethods.borrow_mut();
        for (name, multimethod) in theirs.iter() {
            match ours.get(name) {
                Some(existing) => {
                    existing.merge(multimethod);
                }
                None => {
                    ours.insert(name.clone(), multimethod.clone());
                }
            }
        }
    }

    /// Multimethods bound directly in this scope.
    pub fn multimethods(&self) -> Vec<Rc<Multimethod>> {
        self.multimethods.borrow().values().cloned().collect()
    }

    pub fn variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.variables.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn multimethod_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.multimethods.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("module", &self.module)
            .field("variables", &self.variable_names())
            .field("multimethods", &self.multimethod_names())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}
