//! Built-in node and annotation types

mod annotations;
mod nodes;

pub(crate) use annotations::register as register_annotations;
pub(crate) use nodes::register as register_nodes;
