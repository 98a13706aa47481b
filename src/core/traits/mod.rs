pub mod engine;
pub mod presenter;
