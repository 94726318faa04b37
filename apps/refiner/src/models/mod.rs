pub mod input;
pub mod prompt;

pub use input::{InputMetadata, ProcessedInput};
pub use prompt::{Domain, InputType, PriorityLevel, RefinedPrompt, Requirement, TechnicalConstraint};
