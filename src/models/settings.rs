use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_UPDATE_INTERVAL_MINUTES: u64 = 5;
/// One week; longer intervals are rejected at load.
pub const MAX_UPDATE_INTERVAL_MINUTES: u64 = 7 * 24 * 60;
pub const DEFAULT_TIME_ZONE: &str = "America/Chicago";
pub const TIME_API_BASE: &str = "https://worldtimeapi.org/api/timezone";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub network: NetworkSettings,
    pub time: TimeSettings,
    pub update_interval_minutes: u64,
    /// Raw per-slot entries; slot 0 is the primary person.
    pub people: Vec<PersonSettings>,
}

impl Settings {
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_minutes.saturating_mul(60))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            network: NetworkSettings::default(),
            time: TimeSettings::default(),
            update_interval_minutes: DEFAULT_UPDATE_INTERVAL_MINUTES,
            people: vec![],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkSettings {
    pub wifi_ssid: Option<String>,
    #[serde(skip_serializing)]
    pub wifi_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSettings {
    pub time_zone: String,
    #[serde(default)]
    pub api_url: Option<String>,
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self {
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            api_url: None,
        }
    }
}

impl TimeSettings {
    /// Explicit override, else the zone-scoped worldtimeapi endpoint.
    pub fn endpoint(&self) -> String {
        match &self.api_url {
            Some(url) => url.clone(),
            None => format!("{}/{}", TIME_API_BASE, self.time_zone),
        }
    }
}

/// One configuration triple exactly as read; parsing happens in the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonSettings {
    /// `P1`..`P5`, used when no name is configured and in fatal messages.
    pub slot_name: String,
    pub name: Option<String>,
    pub birth_date: Option<String>,
    pub birth_time: Option<String>,
    /// Config keys this slot was read from, for diagnostics.
    pub keys: [String; 3],
}

impl PersonSettings {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.slot_name)
    }

    pub fn is_complete(&self) -> bool {
        self.birth_date.is_some() && self.birth_time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_interval_is_in_seconds_and_saturates() {
        let mut settings = Settings::default();
        assert_eq!(settings.update_interval(), Duration::from_secs(300));

        settings.update_interval_minutes = u64::MAX;
        assert_eq!(settings.update_interval(), Duration::from_secs(u64::MAX));
    }
}
