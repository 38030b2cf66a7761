//! Methods implemented in Rust rather than in the language itself.

pub mod core;
pub mod io;

use crate::names;
use crate::runtime::{
    class::ClassRef,
    environment::Scope,
    error::{RuntimeError, RuntimeResult},
    interpreter::Interpreter,
    module::Context,
    multimethod::Method,
    pattern::Pattern,
    value::Obj,
};

pub trait Intrinsic {
    fn invoke(
        &self,
        interp: &mut Interpreter,
        ctx: &Context,
        left: Obj,
        right: Obj,
    ) -> RuntimeResult<Obj>;
}

impl<F> Intrinsic for F
where
    F: Fn(&mut Interpreter, &Context, Obj, Obj) -> RuntimeResult<Obj>,
{
    fn invoke(
        &self,
        interp: &mut Interpreter,
        ctx: &Context,
        left: Obj,
        right: Obj,
    ) -> RuntimeResult<Obj> {
        self(interp, ctx, left, right)
    }
}

/// The initializer every class gets. Parents are initialized first, each
/// with the record field named after the parent when the argument has one,
/// otherwise with the whole argument. Then the class's own fields are copied
/// out of the argument.
pub struct ClassInit {
    class: ClassRef,
}

impl ClassInit {
    pub fn new(class: ClassRef) -> Self {
        Self { class }
    }
}

impl Intrinsic for ClassInit {
    fn invoke(
        &self,
        interp: &mut Interpreter,
        ctx: &Context,
        _left: Obj,
        right: Obj,
    ) -> RuntimeResult<Obj> {
        let object = interp.constructing_object().ok_or_else(|| {
            RuntimeError::quit(format!(
                "Reached the initializer of class {} outside of construction.",
                self.class.name()
            ))
        })?;

        for parent in self.class.parents() {
            let arg = right.get_field(parent.name()).unwrap_or_else(|| right.clone());
            let parent_object = interp.class_object(parent.clone());
            interp.initialize_new_object(ctx, parent_object, arg)?;
        }

        for field in self.class.fields() {
            if let Some(value) = right.get_field(&field.name) {
                object.set_field(&field.name, value);
            }
        }

        interp.finish_initialization();
        Ok(interp.nothing())
    }
}

pub struct FieldGetter {
    field: String,
}

impl Intrinsic for FieldGetter {
    fn invoke(
        &self,
        interp: &mut Interpreter,
        _ctx: &Context,
        left: Obj,
        _right: Obj,
    ) -> RuntimeResult<Obj> {
        Ok(left.get_field(&self.field).unwrap_or_else(|| interp.nothing()))
    }
}

pub struct FieldSetter {
    field: String,
}

impl Intrinsic for FieldSetter {
    fn invoke(
        &self,
        _interp: &mut Interpreter,
        _ctx: &Context,
        left: Obj,
        right: Obj,
    ) -> RuntimeResult<Obj> {
        left.set_field(&self.field, right.clone());
        Ok(right)
    }
}

/// Registers `init`, one getter per field and one setter per mutable field
/// in the scope where the class is declared.
pub fn install_class_methods(class_object: &Obj, class: &ClassRef, scope: &Scope, nothing: &Obj) {
    let required: Vec<(String, Pattern)> = class
        .fields()
        .iter()
        .filter(|field| field.is_required())
        .map(|field| (field.name.clone(), Pattern::Wildcard))
        .collect();
    let init_arg = if required.is_empty() {
        Pattern::Wildcard
    } else {
        Pattern::Record(required)
    };
    scope.define_method(
        names::INIT,
        Method::intrinsic(
            Pattern::Value(class_object.clone()),
            init_arg,
            ClassInit::new(class.clone()),
        ),
    );

    for field in class.fields() {
        scope.define_method(
            &field.name,
            Method::intrinsic(
                Pattern::Class(class.clone()),
                Pattern::Value(nothing.clone()),
                FieldGetter {
                    field: field.name.clone(),
                },
            ),
        );
        if field.mutable {
            scope.define_method(
                &names::assigner(&field.name),
                Method::intrinsic(
                    Pattern::Class(class.clone()),
                    Pattern::Wildcard,
                    FieldSetter {
                        field: field.name.clone(),
                    },
                ),
            );
        }
    }
}

/// Shorthand used by the builder to register a Rust function as a clause.
pub fn define<F>(scope: &Scope, name: &str, left: Pattern, right: Pattern, function: F)
where
    F: Fn(&mut Interpreter, &Context, Obj, Obj) -> RuntimeResult<Obj> + 'static,
{
    scope.define_method(name, Method::intrinsic(left, right, function));
}

pub(crate) fn expect_int(interp: &mut Interpreter, method: &str, value: &Obj) -> RuntimeResult<i64> {
    value.as_int().ok_or_else(|| {
        interp.raise_error(
            names::TYPE_ERROR,
            format!("`{method}` expects an Int, found {}.", value.class().name()),
        )
    })
}

pub(crate) fn expect_string(
    interp: &mut Interpreter,
    method: &str,
    value: &Obj,
) -> RuntimeResult<String> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        interp.raise_error(
            names::TYPE_ERROR,
            format!("`{method}` expects a String, found {}.", value.class().name()),
        )
    })
}
