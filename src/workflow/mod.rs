pub mod assign;
pub mod submit;
