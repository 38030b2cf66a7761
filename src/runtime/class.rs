use crate::language::ast::Expr;
use crate::runtime::environment::Scope;
use std::collections::HashSet;
use std::fmt;
use std::ptr;
use std::rc::Rc;

pub type ClassRef = Rc<ClassDescriptor>;

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub mutable: bool,
    /// Evaluated in the defining class's scope each time an instance is made.
    pub initializer: Option<Rc<Expr>>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, mutable: bool, initializer: Option<Rc<Expr>>) -> Self {
        Self {
            name: name.into(),
            mutable,
            initializer,
        }
    }

    /// A field with no default must be supplied by the canonical initializer.
    pub fn is_required(&self) -> bool {
        self.initializer.is_none()
    }
}

pub struct ClassDescriptor {
    name: String,
    parents: Vec<ClassRef>,
    fields: Vec<FieldDef>,
    scope: Rc<Scope>,
    doc: Option<String>,
}

impl ClassDescriptor {
    pub fn new(
        name: impl Into<String>,
        parents: Vec<ClassRef>,
        fields: Vec<FieldDef>,
        scope: Rc<Scope>,
        doc: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            parents,
            fields,
            scope,
            doc,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parents(&self) -> &[ClassRef] {
        &self.parents
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn scope(&self) -> &Rc<Scope> {
        &self.scope
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn is_subclass_of(&self, other: &ClassDescriptor) -> bool {
        ptr::eq(self, other)
            || self
                .parents
                .iter()
                .any(|parent| parent.is_subclass_of(other))
    }

    /// This class followed by every ancestor, depth-first, each once.
    pub fn lineage(self: &Rc<Self>) -> Vec<ClassRef> {
        let mut seen = HashSet::new();
        let mut lineage = Vec::new();
        let mut stack = vec![self.clone()];
        while let Some(class) = stack.pop() {
            if !seen.insert(Rc::as_ptr(&class)) {
                continue;
            }
            stack.extend(class.parents.iter().rev().cloned());
            lineage.push(class);
        }
        lineage
    }

    /// Returns the first ancestor reachable through more than one parent
    /// edge, walking the parent graph depth-first.
    pub fn find_collision(&self) -> Option<ClassRef> {
        let mut seen = HashSet::new();
        let mut stack: Vec<ClassRef> = self.parents.iter().rev().cloned().collect();
        while let Some(class) = stack.pop() {
            if !seen.insert(Rc::as_ptr(&class)) {
                return Some(class);
            }
            stack.extend(class.parents.iter().rev().cloned());
        }
        None
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field(
                "parents",
                &self
                    .parents
                    .iter()
                    .map(|parent| parent.name())
                    .collect::<Vec<_>>(),
            )
            .field("fields", &self.fields)
            .finish()
    }
}
