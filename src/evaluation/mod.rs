pub mod evaluator;
pub mod accuracy;

pub use evaluator::*;
pub use accuracy::*;
