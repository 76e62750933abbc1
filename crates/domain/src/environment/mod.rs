//! Environment and variable domain types

mod resolution;
mod variable;

pub use resolution::{ResolutionScope, ResolvedVariable, VariableScope};
pub use variable::{Environment, GlobalVars, find_active};
