use super::{define, expect_int, expect_string};
use crate::names;
use crate::runtime::{
    builder::CoreEnvironment,
    class::ClassRef,
    environment::Scope,
    error::{RuntimeError, RuntimeResult},
    interpreter::Interpreter,
    module::Context,
    pattern::Pattern,
    value::{is_identical, Native, Obj},
};

pub fn register(scope: &Scope, core: &CoreEnvironment) {
    let nothing = || Pattern::Value(core.nothing_value.clone());
    let is = |class: &ClassRef| Pattern::Class(class.clone());

    // Construction and identity.
    define(scope, "construct", is(&core.class), Pattern::Wildcard, |interp, ctx, left, right| {
        interp.construct(ctx, left, right)
    });
    define(scope, "constructing", nothing(), nothing(), |interp, _, _, _| {
        Ok(interp
            .constructing_object()
            .unwrap_or_else(|| interp.nothing()))
    });
    define(scope, "identical?", Pattern::Wildcard, Pattern::Wildcard, |interp, _, left, right| {
        Ok(interp.create_bool(is_identical(&left, &right)))
    });
    define(scope, "equal?", Pattern::Wildcard, Pattern::Wildcard, |interp, _, left, right| {
        let equal = interp.values_equal(&left, &right)?;
        Ok(interp.create_bool(equal))
    });
    define(scope, "native==", Pattern::Wildcard, Pattern::Wildcard, |interp, _, left, right| {
        Ok(interp.create_bool(natives_equal(&left, &right)))
    });

    // Arithmetic.
    define(scope, "+", is(&core.int), is(&core.int), |interp, _, left, right| {
        arithmetic(interp, "+", &left, &right, i64::checked_add)
    });
    define(scope, "-", is(&core.int), is(&core.int), |interp, _, left, right| {
        arithmetic(interp, "-", &left, &right, i64::checked_sub)
    });
    define(scope, "*", is(&core.int), is(&core.int), |interp, _, left, right| {
        arithmetic(interp, "*", &left, &right, i64::checked_mul)
    });
    define(scope, "<", is(&core.int), is(&core.int), |interp, _, left, right| {
        let left = expect_int(interp, "<", &left)?;
        let right = expect_int(interp, "<", &right)?;
        Ok(interp.create_bool(left < right))
    });
    define(scope, "+", is(&core.string), is(&core.string), |interp, _, left, right| {
        let mut text = expect_string(interp, "+", &left)?;
        text.push_str(&expect_string(interp, "+", &right)?);
        Ok(interp.create_string(text))
    });

    // Stringification.
    define(scope, names::TO_STRING, Pattern::Wildcard, nothing(), |interp, _, left, _| {
        Ok(interp.create_string(format!("<{}>", left.class().name())))
    });
    for class in [&core.int, &core.string, &core.bool, &core.nothing] {
        define(scope, names::TO_STRING, is(class), nothing(), |interp, _, left, _| {
            Ok(interp.create_string(primitive_to_string(&left)))
        });
    }
    define(scope, names::TO_STRING, is(&core.class), nothing(), |interp, _, left, _| {
        let name = left
            .as_class()
            .map(|class| class.name().to_string())
            .unwrap_or_else(|| left.class().name().to_string());
        Ok(interp.create_string(name))
    });
    define(scope, names::TO_STRING, is(&core.error), nothing(), |interp, _, left, _| {
        let text = match left.as_str() {
            Some(message) => format!("{}: {}", left.class().name(), message),
            None => left.class().name().to_string(),
        };
        Ok(interp.create_string(text))
    });
    define(scope, names::TO_STRING, is(&core.record), nothing(), |interp, _, left, _| {
        let text = record_to_string(interp, &left)?;
        Ok(interp.create_string(text))
    });
    for class in [&core.array, &core.list] {
        define(scope, names::TO_STRING, is(class), nothing(), |interp, _, left, _| {
            let items = left
                .elements()
                .map(|items| items.borrow().clone())
                .unwrap_or_default();
            let mut parts = Vec::with_capacity(items.len());
            for item in &items {
                parts.push(interp.evaluate_to_string(item)?);
            }
            Ok(interp.create_string(format!("[{}]", parts.join(", "))))
        });
    }

    define(scope, "print", Pattern::Wildcard, nothing(), |interp, _, left, _| {
        let text = interp.evaluate_to_string(&left)?;
        interp.write_line(&text)?;
        Ok(interp.nothing())
    });

    // Reflection.
    define(scope, "class", Pattern::Wildcard, nothing(), |interp, _, left, _| {
        Ok(interp.class_object(left.class().clone()))
    });
    define(scope, "name", is(&core.class), nothing(), |interp, _, left, _| {
        let name = left.as_class().map(|class| class.name().to_string());
        Ok(match name {
            Some(name) => interp.create_string(name),
            None => interp.nothing(),
        })
    });
    define(scope, "doc", is(&core.class), nothing(), |interp, _, left, _| {
        let doc = left.as_class().and_then(|class| class.doc().map(str::to_string));
        Ok(match doc {
            Some(doc) => interp.create_string(doc),
            None => interp.nothing(),
        })
    });
    define(scope, "field", Pattern::Wildcard, is(&core.string), |interp, _, left, right| {
        let name = expect_string(interp, "field", &right)?;
        Ok(left.get_field(&name).unwrap_or_else(|| interp.nothing()))
    });

    // Errors.
    define(scope, "message", is(&core.error), nothing(), |interp, _, left, _| {
        Ok(match left.as_str() {
            Some(message) => interp.create_string(message.to_string()),
            None => interp.nothing(),
        })
    });
    define(scope, "raise", is(&core.class), is(&core.string), |interp, _, left, right| {
        let Some(class) = left.as_class().cloned() else {
            return Err(RuntimeError::quit("`raise` received a class without a descriptor."));
        };
        let message = expect_string(interp, "raise", &right)?;
        let error = interp.create_error(&class, message)?;
        Err(RuntimeError::Raised(error))
    });

    // Collections.
    for class in [&core.array, &core.list] {
        define(scope, "count", is(class), nothing(), |interp, _, left, _| {
            let count = left.elements().map(|items| items.borrow().len()).unwrap_or(0);
            Ok(interp.create_int(count as i64))
        });
        define(scope, "at", is(class), is(&core.int), |interp, _, left, right| {
            let index = expect_int(interp, "at", &right)?;
            let item = left.elements().and_then(|items| {
                usize::try_from(index)
                    .ok()
                    .and_then(|index| items.borrow().get(index).cloned())
            });
            item.ok_or_else(|| {
                interp.raise_error(
                    names::TYPE_ERROR,
                    format!("Index {index} is out of bounds."),
                )
            })
        });
    }
    define(scope, "add", is(&core.list), Pattern::Wildcard, |interp, _, left, right| {
        if let Some(items) = left.elements() {
            items.borrow_mut().push(right);
        }
        Ok(interp.nothing())
    });

    // Functions and quoted code.
    define(scope, names::CALL, is(&core.function), Pattern::Wildcard, |interp, _, left, right| {
        let Some(function) = left.as_function().cloned() else {
            return Err(RuntimeError::quit("`call` received a function without a body."));
        };
        if !function.pattern.matches(interp, &right)? {
            return Err(interp.raise_error(
                names::NO_METHOD_ERROR,
                format!("Function does not accept an argument of class {}.", right.class().name()),
            ));
        }
        let scope = function.closure.child();
        function.pattern.bind_into(&right, &scope);
        interp.evaluate(&function.body, &Context::new(function.closure.module()), &scope)
    });
    define(scope, "evaluate", is(&core.expression), nothing(), |interp, ctx, left, _| {
        let Some(expr) = left.as_expression().cloned() else {
            return Err(RuntimeError::quit("`evaluate` received an expression without code."));
        };
        let scope = interp.module(ctx.module()).scope().child();
        interp.evaluate(&expr, ctx, &scope)
    });
}

fn arithmetic(
    interp: &mut Interpreter,
    method: &str,
    left: &Obj,
    right: &Obj,
    op: fn(i64, i64) -> Option<i64>,
) -> RuntimeResult<Obj> {
    let a = expect_int(interp, method, left)?;
    let b = expect_int(interp, method, right)?;
    match op(a, b) {
        Some(result) => Ok(interp.create_int(result)),
        None => Err(interp.raise_error(
            names::TYPE_ERROR,
            format!("Integer overflow in {a} {method} {b}."),
        )),
    }
}

fn natives_equal(left: &Obj, right: &Obj) -> bool {
    match (left.native(), right.native()) {
        (Some(Native::Int(a)), Some(Native::Int(b))) => a == b,
        (Some(Native::Str(a)), Some(Native::Str(b))) => a == b,
        (Some(Native::Bool(a)), Some(Native::Bool(b))) => a == b,
        _ => is_identical(left, right),
    }
}

fn primitive_to_string(value: &Obj) -> String {
    match value.native() {
        Some(Native::Int(number)) => number.to_string(),
        Some(Native::Str(text)) => text.clone(),
        Some(Native::Bool(flag)) => flag.to_string(),
        _ => names::NOTHING.to_lowercase(),
    }
}

/// `(1, a)` for positional records, `(x: 1, y: 2)` otherwise.
fn record_to_string(interp: &mut Interpreter, record: &Obj) -> RuntimeResult<String> {
    let fields = record.field_names();
    let positional = (0..fields.len()).all(|index| fields.contains(&names::tuple_field(index)));
    let mut parts = Vec::with_capacity(fields.len());
    if positional {
        for index in 0..fields.len() {
            if let Some(value) = record.get_field(&names::tuple_field(index)) {
                parts.push(interp.evaluate_to_string(&value)?);
            }
        }
    } else {
        for name in &fields {
            if let Some(value) = record.get_field(name) {
                parts.push(format!("{name}: {}", interp.evaluate_to_string(&value)?));
            }
        }
    }
    Ok(format!("({})", parts.join(", ")))
}
