use crate::language::{
    ast::Expr,
    errors::SyntaxError,
    lower::lower,
    reader::read_form,
    syntax::{SyntaxRule, SyntaxTable},
};
use crate::project::host::SourceFile;
use crate::runtime::environment::Scope;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Stable index of a module in the interpreter's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(usize);

impl ModuleId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Evaluation context handed to every call: which module the running code
/// belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Context {
    module: ModuleId,
}

impl Context {
    pub fn new(module: ModuleId) -> Self {
        Self { module }
    }

    pub fn module(&self) -> ModuleId {
        self.module
    }
}

pub struct Module {
    id: ModuleId,
    name: String,
    scope: Rc<Scope>,
    source: SourceFile,
    cursor: Cell<usize>,
    syntax: RefCell<SyntaxTable>,
}

impl Module {
    pub fn new(id: ModuleId, name: impl Into<String>, source: SourceFile) -> Self {
        Self {
            id,
            name: name.into(),
            scope: Scope::root(id),
            source,
            cursor: Cell::new(0),
            syntax: RefCell::new(SyntaxTable::new()),
        }
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &Rc<Scope> {
        &self.scope
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    /// Reads and lowers the next top-level form. Lowering happens with the
    /// syntax rules known at this point, so a `defsyntax` evaluated earlier
    /// in the same module applies to everything after it.
    pub fn next_expression(&self) -> Result<Option<Expr>, SyntaxError> {
        let Some((form, next)) = read_form(&self.source.text, self.cursor.get())? else {
            self.cursor.set(self.source.text.len());
            return Ok(None);
        };
        self.cursor.set(next);
        let syntax = self.syntax.borrow();
        lower(&form, &syntax).map(Some)
    }

    pub fn define_syntax(&self, rule: SyntaxRule) {
        self.syntax.borrow_mut().define(rule);
    }

    pub fn import_syntax(&self, other: &Module) {
        if self.id == other.id {
            return;
        }
        let theirs = other.syntax.borrow();
        self.syntax.borrow_mut().import_from(&theirs);
    }

    pub fn has_syntax(&self, name: &str) -> bool {
        self.syntax.borrow().get(name).is_some()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("path", &self.source.path)
            .finish()
    }
}

/// Resolves a leading-dot module name against the module that is importing
/// it: `.c` inside `a.b` names `a.b.c`.
pub fn resolve_name(current: &str, name: &str) -> String {
    match name.strip_prefix('.') {
        Some(relative) if current.is_empty() => relative.to_string(),
        Some(relative) => format!("{current}.{relative}"),
        None => name.to_string(),
    }
}
