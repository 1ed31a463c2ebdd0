pub mod error_layer;
pub mod json;
pub mod problem;

pub use json::JsonBody;
pub use problem::{FieldError, Problem, ProblemResponse, APPLICATION_PROBLEM_JSON};
