use crate::language::ast::Expr;
use crate::names;
use crate::project::{
    config::RuntimeConfig,
    host::{ModuleHost, SourceFile},
};
use crate::runtime::{
    builder::{self, CoreEnvironment, EnvironmentBuilder},
    class::{ClassDescriptor, ClassRef, FieldDef},
    environment::Scope,
    error::{RuntimeError, RuntimeResult},
    intrinsics::install_class_methods,
    module::{resolve_name, Context, Module, ModuleId},
    pattern::Pattern,
    value::{is_identical, Function, Native, Obj, Object},
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::rc::Rc;

pub struct Interpreter {
    host: Box<dyn ModuleHost>,
    syntax_name: String,
    modules: Vec<Rc<Module>>,
    cache: HashMap<String, ModuleId>,
    loading: Vec<ModuleId>,
    base: ModuleId,
    core: CoreEnvironment,
    constructing: Vec<Obj>,
    initializing: i64,
    in_values_equal: bool,
    output: Box<dyn Write>,
}

impl Interpreter {
    /// Loads the base module's source and builds the native classes into its
    /// scope, without evaluating any source yet. Until the base module has
    /// run there is no `==` and equality is identity.
    pub fn new(host: impl ModuleHost + 'static, config: &RuntimeConfig) -> RuntimeResult<Self> {
        let base_name = config.runtime.base_module.clone();
        let source = host.load_module(&base_name).map_err(|error| {
            RuntimeError::quit(format!("Could not load base module: {error}"))
        })?;
        let base = ModuleId::new(0);
        let module = Rc::new(Module::new(base, base_name.clone(), source));
        let core = EnvironmentBuilder::new(module.scope().clone()).build();

        let mut cache = HashMap::new();
        cache.insert(base_name, base);
        Ok(Self {
            host: Box::new(host),
            syntax_name: config.runtime.syntax_module.clone(),
            modules: vec![module],
            cache,
            loading: Vec::new(),
            base,
            core,
            constructing: Vec::new(),
            initializing: 0,
            in_values_equal: false,
            output: Box::new(io::stdout()),
        })
    }

    /// Builds the interpreter and runs the base and syntax modules. Syntax
    /// rules exported by the syntax module become visible to every module
    /// loaded afterwards.
    pub fn bootstrap(host: impl ModuleHost + 'static, config: &RuntimeConfig) -> RuntimeResult<Self> {
        let mut interp = Self::new(host, config)?;
        let base = interp.base_module();
        tracing::debug!(module = %base.name(), "evaluating base module");
        interp.evaluate_module(&base)?;

        if !interp.syntax_name.is_empty() {
            let name = interp.syntax_name.clone();
            tracing::debug!(module = %name, "importing syntax module");
            let syntax = interp.import_module(&name)?;
            base.import_syntax(&syntax);
        }
        Ok(interp)
    }

    pub fn set_output(&mut self, output: Box<dyn Write>) {
        self.output = output;
    }

    pub fn write_line(&mut self, text: &str) -> RuntimeResult<()> {
        let result = writeln!(self.output, "{text}").and_then(|_| self.output.flush());
        result.map_err(|error| {
            self.raise_error(names::IO_ERROR, format!("Could not write output: {error}."))
        })
    }

    pub fn core(&self) -> &CoreEnvironment {
        &self.core
    }

    pub fn base_module(&self) -> Rc<Module> {
        self.module(self.base)
    }

    pub fn module(&self, id: ModuleId) -> Rc<Module> {
        self.modules[id.index()].clone()
    }

    pub fn cached_module(&self, name: &str) -> Option<Rc<Module>> {
        self.cache.get(name).map(|id| self.module(*id))
    }

    /// Names of the modules currently being evaluated, outermost first.
    pub fn loading_modules(&self) -> Vec<String> {
        self.loading
            .iter()
            .map(|id| self.modules[id.index()].name().to_string())
            .collect()
    }

    fn resolve_module_name(&self, name: &str) -> String {
        let current = self
            .loading
            .last()
            .map(|id| self.modules[id.index()].name())
            .unwrap_or("");
        resolve_name(current, name)
    }

    /// Returns the module called `name`, loading and evaluating it on first
    /// use. A module is cached before its body runs, so importing a module
    /// that is still loading is reported as a cycle.
    #[tracing::instrument(skip(self))]
    pub fn import_module(&mut self, name: &str) -> RuntimeResult<Rc<Module>> {
        let name = self.resolve_module_name(name);
        if let Some(&id) = self.cache.get(&name) {
            if self.loading.contains(&id) {
                let chain = self.loading_modules().join(" -> ");
                return Err(self.raise_error(
                    names::MODULE_ERROR,
                    format!("Module \"{name}\" is imported while it is still loading ({chain})."),
                ));
            }
            return Ok(self.module(id));
        }

        let source = match self.host.load_module(&name) {
            Ok(source) => source,
            Err(error) => return Err(self.raise_error(names::MODULE_ERROR, error.to_string())),
        };
        let id = ModuleId::new(self.modules.len());
        let module = Rc::new(Module::new(id, name.clone(), source));
        self.modules.push(module.clone());
        self.cache.insert(name.clone(), id);
        tracing::debug!(id = id.index(), path = %module.source().path, "loading module");

        if let Err(error) = self.evaluate_module(&module) {
            self.cache.remove(&name);
            let removed = self.forget_clauses(id);
            tracing::debug!(error = %error, removed, "module failed to load");
            return Err(error);
        }
        Ok(module)
    }

    /// Withdraws the clauses a failed module added to multimethods visible
    /// from any module, so a retried import starts from a clean slate.
    fn forget_clauses(&self, id: ModuleId) -> usize {
        let mut visited = HashSet::new();
        let mut removed = 0;
        for module in &self.modules {
            for multimethod in module.scope().multimethods() {
                if visited.insert(Rc::as_ptr(&multimethod)) {
                    removed += multimethod.forget_module(id);
                }
            }
        }
        removed
    }

    /// Runs a source file as an anonymous module. It is never cached, and
    /// relative imports inside it resolve to top-level names.
    ///
    /// The module keeps its arena slot after evaluation: clauses and closures
    /// it defined may outlive the call and still refer to it by id. Hosts
    /// that evaluate many independent snippets should use a fresh
    /// interpreter per batch.
    pub fn interpret(&mut self, source: SourceFile) -> RuntimeResult<Obj> {
        self.interpret_module(source).map(|(_, value)| value)
    }

    pub fn interpret_module(&mut self, source: SourceFile) -> RuntimeResult<(Rc<Module>, Obj)> {
        let id = ModuleId::new(self.modules.len());
        let module = Rc::new(Module::new(id, "", source));
        self.modules.push(module.clone());
        let value = self.evaluate_module(&module)?;
        Ok((module, value))
    }

    fn evaluate_module(&mut self, module: &Rc<Module>) -> RuntimeResult<Obj> {
        self.loading.push(module.id());
        let result = self.run_module(module);
        self.loading.pop();
        result
    }

    fn run_module(&mut self, module: &Rc<Module>) -> RuntimeResult<Obj> {
        if module.id() != self.base {
            let base = self.base_module();
            module.scope().import_all(base.scope());
            module.import_syntax(&base);
        }

        // Read one expression at a time: a `defsyntax` changes how the rest
        // of the file is read.
        let ctx = Context::new(module.id());
        let mut last = self.nothing();
        loop {
            let expr = match module.next_expression() {
                Ok(Some(expr)) => expr,
                Ok(None) => break,
                Err(error) => {
                    return Err(RuntimeError::Syntax {
                        path: module.source().path.clone(),
                        text: module.source().text.clone(),
                        error,
                    })
                }
            };
            last = self.evaluate(&expr, &ctx, module.scope())?;
        }
        Ok(last)
    }

    pub fn create_class(
        &mut self,
        name: &str,
        parents: Vec<ClassRef>,
        fields: Vec<FieldDef>,
        scope: &Rc<Scope>,
        doc: Option<String>,
    ) -> RuntimeResult<Obj> {
        let class = Rc::new(ClassDescriptor::new(name, parents, fields, scope.clone(), doc));
        if let Some(colliding) = class.find_collision() {
            return Err(self.raise_error(
                names::PARENT_COLLISION_ERROR,
                format!(
                    "Class \"{}\" is trying to inherit from \"{}\" more than once.",
                    name,
                    colliding.name()
                ),
            ));
        }

        let object = self.class_object(class.clone());
        install_class_methods(&object, &class, scope, &self.core.nothing_value);
        tracing::debug!(
            class = %name,
            parents = class.parents().len(),
            fields = class.fields().len(),
            "created class"
        );
        Ok(object)
    }

    /// Allocates an object and runs the field initializers of the class and
    /// all of its ancestors, each in the scope of the class declaring it.
    pub fn instantiate(&mut self, class: &ClassRef, native: Option<Native>) -> RuntimeResult<Obj> {
        let object = Object::new(class.clone(), native);
        for ancestor in class.lineage().iter().rev() {
            for field in ancestor.fields() {
                let Some(initializer) = &field.initializer else {
                    continue;
                };
                let scope = ancestor.scope().child();
                let value = self.evaluate(initializer, &Context::new(scope.module()), &scope)?;
                object.set_field(&field.name, value);
            }
        }
        Ok(object)
    }

    pub fn construct(&mut self, ctx: &Context, class_object: Obj, arg: Obj) -> RuntimeResult<Obj> {
        let Some(class) = class_object.as_class().cloned() else {
            return Err(self.raise_error(
                names::TYPE_ERROR,
                format!("Cannot construct an instance of {}.", class_object.class().name()),
            ));
        };
        let object = self.instantiate(&class, None)?;

        self.constructing.push(object.clone());
        let result = self.initialize_new_object(ctx, class_object, arg);
        self.constructing.pop();

        result.map(|_| object)
    }

    /// Dispatches `init` for `class_object`. Whatever clause runs must reach
    /// exactly one canonical initializer, which calls
    /// [`Interpreter::finish_initialization`].
    pub fn initialize_new_object(
        &mut self,
        ctx: &Context,
        class_object: Obj,
        arg: Obj,
    ) -> RuntimeResult<()> {
        let Some(class) = class_object.as_class().cloned() else {
            return Err(self.raise_error(
                names::TYPE_ERROR,
                format!("Cannot initialize an instance of {}.", class_object.class().name()),
            ));
        };
        let Some(init) = class.scope().look_up_multimethod(names::INIT) else {
            return Err(self.raise_error(
                names::NO_METHOD_ERROR,
                format!("Class {} has no initializer.", class.name()),
            ));
        };

        let baseline = self.initializing;
        self.initializing += 1;
        if let Err(error) = init.invoke(self, ctx, class_object, arg) {
            self.initializing = baseline;
            return Err(error);
        }

        let remaining = self.initializing;
        if remaining != baseline {
            self.initializing = baseline;
            tracing::debug!(class = %class.name(), remaining, baseline, "initialization did not balance");
            let message = if remaining > baseline {
                format!("Instance of class {} was not initialized.", class.name())
            } else {
                format!("Instance of class {} was initialized more than once.", class.name())
            };
            return Err(self.raise_error(names::INITIALIZATION_ERROR, message));
        }
        Ok(())
    }

    pub fn finish_initialization(&mut self) {
        self.initializing -= 1;
    }

    pub fn constructing_object(&self) -> Option<Obj> {
        self.constructing.last().cloned()
    }

    pub fn initializing_count(&self) -> i64 {
        self.initializing
    }

    /// Builds an error object of the named class from the base module. If the
    /// class cannot be found the runtime cannot recover and quits.
    pub fn raise_error(&mut self, class_name: &str, message: impl Into<String>) -> RuntimeError {
        let message = message.into();
        let class = self
            .base_module()
            .scope()
            .get(class_name)
            .and_then(|object| object.as_class().cloned());
        let Some(class) = class else {
            return RuntimeError::quit(format!(
                "Missing error class {class_name} while raising: {message}"
            ));
        };
        match self.create_error(&class, message) {
            Ok(error) => RuntimeError::Raised(error),
            Err(error) => error,
        }
    }

    pub fn create_error(&mut self, class: &ClassRef, message: String) -> RuntimeResult<Obj> {
        self.instantiate(class, Some(Native::Str(message)))
    }

    /// Language-level equality. Identity always wins; the two booleans are
    /// never equal; and while a comparison is running, or before `==` has
    /// been defined, nested comparisons fall back to identity.
    pub fn values_equal(&mut self, a: &Obj, b: &Obj) -> RuntimeResult<bool> {
        if is_identical(a, b) {
            return Ok(true);
        }
        if let (Some(left), Some(right)) = (a.as_bool(), b.as_bool()) {
            return Ok(left == right);
        }
        if self.in_values_equal {
            return Ok(false);
        }
        let Some(equals) = self.base_module().scope().look_up_multimethod(names::EQEQ) else {
            return Ok(false);
        };

        self.in_values_equal = true;
        let ctx = Context::new(self.base);
        let result = equals.invoke(self, &ctx, a.clone(), b.clone());
        self.in_values_equal = false;
        Ok(self.is_truthy(&result?))
    }

    pub fn is_truthy(&self, value: &Obj) -> bool {
        match value.as_bool() {
            Some(flag) => flag,
            None => !Rc::ptr_eq(value.class(), &self.core.nothing),
        }
    }

    /// Calls a multimethod visible from the base module.
    pub fn invoke(&mut self, name: &str, left: Obj, right: Obj) -> RuntimeResult<Obj> {
        let scope = self.base_module().scope().clone();
        self.invoke_in(&scope, &Context::new(self.base), name, left, right)
    }

    pub fn invoke_in(
        &mut self,
        scope: &Scope,
        ctx: &Context,
        name: &str,
        left: Obj,
        right: Obj,
    ) -> RuntimeResult<Obj> {
        match scope.look_up_multimethod(name) {
            Some(multimethod) => multimethod.invoke(self, ctx, left, right),
            None => Err(self.raise_error(
                names::NO_METHOD_ERROR,
                format!("Could not find a method named \"{name}\"."),
            )),
        }
    }

    pub fn evaluate_to_string(&mut self, value: &Obj) -> RuntimeResult<String> {
        let nothing = self.nothing();
        let text = self.invoke(names::TO_STRING, value.clone(), nothing)?;
        match text.as_str() {
            Some(text) => Ok(text.to_string()),
            None => Err(self.raise_error(
                names::TYPE_ERROR,
                format!("toString returned a {} instead of a String.", text.class().name()),
            )),
        }
    }

    pub fn nothing(&self) -> Obj {
        self.core.nothing_value.clone()
    }

    pub fn create_bool(&self, value: bool) -> Obj {
        if value {
            self.core.true_value.clone()
        } else {
            self.core.false_value.clone()
        }
    }

    pub fn create_int(&self, value: i64) -> Obj {
        Object::new(self.core.int.clone(), Some(Native::Int(value)))
    }

    pub fn create_string(&self, value: impl Into<String>) -> Obj {
        Object::new(self.core.string.clone(), Some(Native::Str(value.into())))
    }

    pub fn create_array(&self, elements: Vec<Obj>) -> Obj {
        Object::new(
            self.core.array.clone(),
            Some(Native::Elements(RefCell::new(elements))),
        )
    }

    pub fn create_list(&self, elements: Vec<Obj>) -> Obj {
        Object::new(
            self.core.list.clone(),
            Some(Native::Elements(RefCell::new(elements))),
        )
    }

    /// A record whose fields are named `_0`, `_1`, ... in order.
    pub fn create_tuple(&self, fields: Vec<Obj>) -> Obj {
        let record = Object::new(self.core.record.clone(), None);
        for (index, value) in fields.into_iter().enumerate() {
            record.set_field(&names::tuple_field(index), value);
        }
        record
    }

    pub fn create_record(&self, fields: Vec<(String, Obj)>) -> Obj {
        let record = Object::new(self.core.record.clone(), None);
        for (name, value) in fields {
            record.set_field(&name, value);
        }
        record
    }

    pub fn create_fn(&self, pattern: Pattern, body: Rc<Expr>, closure: Rc<Scope>) -> Obj {
        let function = Function {
            pattern,
            body,
            closure,
        };
        Object::new(
            self.core.function.clone(),
            Some(Native::Function(Rc::new(function))),
        )
    }

    pub fn create_expression(&self, expr: Rc<Expr>) -> Obj {
        Object::new(self.core.expression.clone(), Some(Native::Expression(expr)))
    }

    pub fn class_object(&self, class: ClassRef) -> Obj {
        builder::class_object(&self.core.class, &class)
    }
}
