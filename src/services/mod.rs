// Service module exports

pub mod auth;
pub mod drag;
pub mod notice;
pub mod scheduling;
pub mod settings;
pub mod todoist;
