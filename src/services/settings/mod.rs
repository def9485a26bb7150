// Settings service module
// TOML-backed settings file plus the application's standard directories

mod service;

pub use service::SettingsService;

use directories::ProjectDirs;

/// Standard config/data directories for this application.
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "KenBoyle", "TaskCalendar")
}
