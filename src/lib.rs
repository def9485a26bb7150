// Task Calendar Library
// Scheduling core shared by the command-line front-end and the tests

pub mod models;
pub mod services;
pub mod utils;
