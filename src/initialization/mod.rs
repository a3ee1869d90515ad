//! Generators for the initial values of a network's parameters.

mod literal;
mod param_gen;
mod random;

pub use literal::LiteralParamGen;
pub use param_gen::ParamGen;
pub use random::RandParamGen;
