//! Response templates and their evaluation.

pub mod evaluator;
pub mod node;

pub use evaluator::EvalContext;
pub use node::{Condition, Guard, LearnDef, PatternPart, StringOp, TemplateNode};
