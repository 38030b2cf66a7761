use crate::names;
use crate::runtime::{
    class::{ClassDescriptor, ClassRef},
    environment::Scope,
    intrinsics::{self, install_class_methods},
    value::{Native, Obj, Object},
};
use std::rc::Rc;

/// Classes and singletons the runtime needs before any source is evaluated.
#[derive(Debug, Clone)]
pub struct CoreEnvironment {
    pub class: ClassRef,
    pub array: ClassRef,
    pub bool: ClassRef,
    pub expression: ClassRef,
    pub file: ClassRef,
    pub function: ClassRef,
    pub int: ClassRef,
    pub list: ClassRef,
    pub nothing: ClassRef,
    pub record: ClassRef,
    pub string: ClassRef,
    pub error: ClassRef,
    pub true_value: Obj,
    pub false_value: Obj,
    pub nothing_value: Obj,
}

/// Populates the base module's scope with the natively built classes and
/// every intrinsic.
pub struct EnvironmentBuilder {
    scope: Rc<Scope>,
}

impl EnvironmentBuilder {
    pub fn new(scope: Rc<Scope>) -> Self {
        Self { scope }
    }

    pub fn build(self) -> CoreEnvironment {
        // Class and Nothing come first: every other class object is an
        // instance of Class, and getters dispatch on the nothing singleton.
        let class = self.skeleton(names::CLASS, Vec::new());
        let meta = class_object(&class, &class);
        let nothing = self.skeleton(names::NOTHING, Vec::new());
        let nothing_value = Object::new(nothing.clone(), None);

        self.bind(&meta, &class, &nothing_value);
        self.bind(&class_object(&class, &nothing), &nothing, &nothing_value);

        let make = |name: &str, parents: Vec<ClassRef>| {
            let descriptor = self.skeleton(name, parents);
            self.bind(&class_object(&class, &descriptor), &descriptor, &nothing_value);
            descriptor
        };
        let array = make(names::ARRAY, Vec::new());
        let bool = make(names::BOOL, Vec::new());
        let expression = make(names::EXPRESSION, Vec::new());
        let file = make(names::FILE, Vec::new());
        let function = make(names::FUNCTION, Vec::new());
        let int = make(names::INT, Vec::new());
        let list = make(names::LIST, Vec::new());
        let record = make(names::RECORD, Vec::new());
        let string = make(names::STRING, Vec::new());
        let error = make(names::ERROR, Vec::new());
        for &name in names::ERROR_CLASSES {
            make(name, vec![error.clone()]);
        }

        let core = CoreEnvironment {
            true_value: Object::new(bool.clone(), Some(Native::Bool(true))),
            false_value: Object::new(bool.clone(), Some(Native::Bool(false))),
            nothing_value,
            class,
            array,
            bool,
            expression,
            file,
            function,
            int,
            list,
            nothing,
            record,
            string,
            error,
        };
        intrinsics::core::register(&self.scope, &core);
        intrinsics::io::register(&self.scope, &core);
        tracing::debug!(
            variables = self.scope.variable_names().len(),
            multimethods = self.scope.multimethod_names().len(),
            "built core environment"
        );
        core
    }

    fn skeleton(&self, name: &str, parents: Vec<ClassRef>) -> ClassRef {
        Rc::new(ClassDescriptor::new(
            name,
            parents,
            Vec::new(),
            self.scope.clone(),
            None,
        ))
    }

    fn bind(&self, class_object: &Obj, class: &ClassRef, nothing: &Obj) {
        self.scope.declare(class.name(), class_object.clone(), false);
        install_class_methods(class_object, class, &self.scope, nothing);
    }
}

/// Wraps a descriptor in an object whose class is `Class`.
pub fn class_object(class_class: &ClassRef, class: &ClassRef) -> Obj {
    Object::new(class_class.clone(), Some(Native::Class(class.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::module::ModuleId;

    #[test]
    fn error_classes_inherit_from_error() {
        let scope = Scope::root(ModuleId::new(0));
        let core = EnvironmentBuilder::new(scope.clone()).build();
        for name in names::ERROR_CLASSES {
            let object = scope.get(name).expect("error class is bound");
            let class = object.as_class().expect("class object");
            assert!(class.is_subclass_of(&core.error), "{name}");
        }
    }

    #[test]
    fn class_objects_are_instances_of_class() {
        let scope = Scope::root(ModuleId::new(0));
        let core = EnvironmentBuilder::new(scope.clone()).build();
        let int = scope.get(names::INT).unwrap();
        assert!(Rc::ptr_eq(int.class(), &core.class));
        assert!(Rc::ptr_eq(int.as_class().unwrap(), &core.int));
        assert!(scope.look_up_multimethod(names::INIT).is_some());
        assert!(scope.look_up_multimethod(names::TO_STRING).is_some());
        assert_eq!(core.true_value.as_bool(), Some(true));
    }
}
