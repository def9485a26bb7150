// Settings module
// User-editable configuration, persisted as TOML

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::utils::date::{default_slots, CalendarZone, TimeSlot};

pub const DEFAULT_API_BASE_URL: &str = "https://api.todoist.com/sync/v9";
pub const DEFAULT_TOUCH_DRAG_THRESHOLD_PX: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Distance a touch must travel before it counts as a drag rather than a tap.
    pub touch_drag_threshold_px: f64,
    pub time_slots: Vec<TimeSlot>,
    /// IANA zone name such as "Europe/Berlin"; the system zone when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 20,
            touch_drag_threshold_px: DEFAULT_TOUCH_DRAG_THRESHOLD_PX,
            time_slots: default_slots(),
            timezone: None,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), String> {
        if !self.api_base_url.starts_with("https://") {
            return Err("API base URL must use HTTPS".to_string());
        }

        if self.request_timeout_secs == 0 {
            return Err("Request timeout must be greater than 0 seconds".to_string());
        }

        if !(self.touch_drag_threshold_px.is_finite() && self.touch_drag_threshold_px > 0.0) {
            return Err("Touch drag threshold must be a positive number of pixels".to_string());
        }

        if self.time_slots.is_empty() {
            return Err("At least one time slot is required".to_string());
        }

        let mut seen = HashSet::new();
        for slot in &self.time_slots {
            if !seen.insert(*slot) {
                return Err(format!("Duplicate time slot '{}'", slot));
            }
        }

        self.zone()?;
        Ok(())
    }

    /// Time slots in display order.
    pub fn sorted_slots(&self) -> Vec<TimeSlot> {
        let mut slots = self.time_slots.clone();
        slots.sort();
        slots.dedup();
        slots
    }

    pub fn zone(&self) -> Result<CalendarZone, String> {
        match self.timezone.as_deref().map(str::trim) {
            None | Some("") => Ok(CalendarZone::Local),
            Some(name) => name
                .parse::<chrono_tz::Tz>()
                .map(CalendarZone::Named)
                .map_err(|_| format!("Unknown timezone '{}'", name)),
        }
    }
}
