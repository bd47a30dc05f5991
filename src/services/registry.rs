use crate::error::{ConfigParseError, StartupError};
use crate::models::{Instant, Person, PersonSettings};
use crate::utils::config::MAX_PEOPLE;

/// Ordered set of tracked people; index 0 is the primary person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRegistry {
    people: Vec<Person>,
}

impl PersonRegistry {
    /// Builds the registry from the configured slots.
    ///
    /// The primary slot must be complete and valid or startup fails.
    /// Incomplete secondary slots are skipped silently; invalid ones are
    /// skipped with a warning.
    pub fn load(slots: &[PersonSettings]) -> Result<Self, StartupError> {
        let mut people = Vec::with_capacity(MAX_PEOPLE);

        for (slot, entry) in slots.iter().take(MAX_PEOPLE).enumerate() {
            if !entry.is_complete() {
                if slot == 0 {
                    log::error!(
                        "Missing one or more settings for primary person: {}",
                        entry.keys.join(", ")
                    );
                    return Err(StartupError::MissingPrimary {
                        slot_name: entry.slot_name.clone(),
                        keys: entry.keys.join(", "),
                    });
                }
                continue;
            }

            match parse_person(slot, entry) {
                Ok(person) => {
                    log::info!("Loaded config for: {}", person.name);
                    people.push(person);
                }
                Err(err) if slot == 0 => {
                    log::error!("{}", err);
                    return Err(StartupError::InvalidPrimary(err));
                }
                Err(err) => {
                    log::warn!("Skipping person: {}", err);
                }
            }
        }

        if people.is_empty() {
            // Only reachable with no slots at all.
            return Err(StartupError::MissingPrimary {
                slot_name: "P1".to_string(),
                keys: "DISPLAY_NAME, BIRTH_DATE, BIRTH_TIME".to_string(),
            });
        }

        Ok(Self { people })
    }

    pub fn primary(&self) -> &Person {
        &self.people[0]
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }
}

fn parse_person(slot: usize, entry: &PersonSettings) -> Result<Person, ConfigParseError> {
    let date = entry.birth_date.as_deref().unwrap_or_default();
    let time = entry.birth_time.as_deref().unwrap_or_default();
    let birth = Instant::parse_birth(date, time).map_err(|source| ConfigParseError {
        slot,
        name: entry.display_name().to_string(),
        source,
    })?;
    Ok(Person::new(entry.display_name(), birth))
}
