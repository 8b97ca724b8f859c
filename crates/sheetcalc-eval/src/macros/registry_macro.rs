/// Register built-in function structs with the global registry.
macro_rules! register_functions {
    ( $($fn:path),+ $(,)? ) => {{
        use std::sync::Arc;
        $(
            $crate::function_registry::register_builtin(Arc::new($fn));
        )+
    }};
}

pub(crate) use register_functions;
