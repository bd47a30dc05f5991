use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{
    NetworkSettings, PersonSettings, Settings, TimeSettings, DEFAULT_UPDATE_INTERVAL_MINUTES,
    MAX_UPDATE_INTERVAL_MINUTES,
};

const ENV_WIFI_SSID: &str = "WIFI_SSID";
const ENV_WIFI_PASSWORD: &str = "WIFI_PASSWORD";
const ENV_UPDATE_INTERVAL: &str = "UPDATE_INTERVAL_MINUTES";
const ENV_TIME_ZONE: &str = "TIME_ZONE";
const ENV_TIME_API_URL: &str = "TIME_API_URL";

pub const MAX_PEOPLE: usize = 5;

const DEFAULT_SETTINGS_FILE: &str = ".env";

/// Loads settings from the process environment with an env-style file
/// layered on top.
///
/// An explicit path must exist; the default `.env` is optional.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let env: HashMap<String, String> = std::env::vars().collect();
    let file = match path {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = Path::new(DEFAULT_SETTINGS_FILE);
            default.is_file().then(|| default.to_path_buf())
        }
    };
    settings_from_sources(file.as_deref(), env)
}

/// File values override `env` values key by key.
pub fn settings_from_sources(
    file: Option<&Path>,
    mut env: HashMap<String, String>,
) -> Result<Settings> {
    if let Some(path) = file {
        let values = read_settings_file(path)?;
        log::info!("Loaded {} settings from {}", values.len(), path.display());
        env.extend(values);
    }
    Ok(settings_from_map(&env))
}

/// Reads an env-style file without touching the process environment.
pub fn read_settings_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut values = HashMap::new();
    let iter = dotenvy::from_path_iter(path)
        .with_context(|| format!("failed to open settings file {}", path.display()))?;
    for item in iter {
        let (key, value) = item.with_context(|| format!("malformed line in {}", path.display()))?;
        values.insert(key, value);
    }
    Ok(values)
}

/// Builds settings from key/value pairs. Blank values count as missing.
pub fn settings_from_map(values: &HashMap<String, String>) -> Settings {
    let get = |key: &str| {
        values
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let defaults = Settings::default();
    let update_interval_minutes = match get(ENV_UPDATE_INTERVAL) {
        None => defaults.update_interval_minutes,
        Some(raw) => match raw.parse::<u64>() {
            Ok(minutes) if (1..=MAX_UPDATE_INTERVAL_MINUTES).contains(&minutes) => minutes,
            _ => {
                log::warn!(
                    "{} `{}` is not an integer in 1..={}, using {}",
                    ENV_UPDATE_INTERVAL,
                    raw,
                    MAX_UPDATE_INTERVAL_MINUTES,
                    DEFAULT_UPDATE_INTERVAL_MINUTES
                );
                DEFAULT_UPDATE_INTERVAL_MINUTES
            }
        },
    };

    let people = (0..MAX_PEOPLE)
        .map(|slot| {
            let keys = person_keys(slot);
            PersonSettings {
                slot_name: format!("P{}", slot + 1),
                name: get(&keys[0]),
                birth_date: get(&keys[1]),
                birth_time: get(&keys[2]),
                keys,
            }
        })
        .collect();

    Settings {
        network: NetworkSettings {
            wifi_ssid: get(ENV_WIFI_SSID),
            wifi_password: get(ENV_WIFI_PASSWORD),
        },
        time: TimeSettings {
            time_zone: get(ENV_TIME_ZONE).unwrap_or(defaults.time.time_zone),
            api_url: get(ENV_TIME_API_URL),
        },
        update_interval_minutes,
        people,
    }
}

/// Config keys for a person slot: name, birth date, birth time.
fn person_keys(slot: usize) -> [String; 3] {
    if slot == 0 {
        [
            "DISPLAY_NAME".to_string(),
            "BIRTH_DATE".to_string(),
            "BIRTH_TIME".to_string(),
        ]
    } else {
        let prefix = format!("FAMILY_MEMBER_{}", slot);
        [
            format!("{}_NAME", prefix),
            format!("{}_BIRTH_DATE", prefix),
            format!("{}_BIRTH_TIME", prefix),
        ]
    }
}
