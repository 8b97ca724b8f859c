mod registry_macro;

pub(crate) use registry_macro::register_functions;
