// Module exports for models

pub mod label;
pub mod project;
pub mod settings;
pub mod task;
