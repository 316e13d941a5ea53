use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier the door assigns to a registered pet (RFID index).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PetId(String);

impl PetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PetId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for PetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Pet species, resolved once from the wire string.
///
/// Anything the door reports that isn't a cat or a dog collapses into
/// [`Other`](Self::Other).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Species {
    Cat,
    Dog,
    Other,
}

impl Species {
    /// Resolve a wire species string. Matching is case-insensitive;
    /// absent or unrecognized values become [`Other`](Self::Other).
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.eq_ignore_ascii_case("cat") => Self::Cat,
            Some(s) if s.eq_ignore_ascii_case("dog") => Self::Dog,
            _ => Self::Other,
        }
    }
}

/// A pet registered with the door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pet {
    pub id: PetId,
    pub name: Option<String>,
    pub species: Species,
}

impl Pet {
    /// Stable lowercase identifier for display and log correlation,
    /// e.g. `pet_cat_miezi`. `None` when the pet has no name at all.
    pub fn slug(&self) -> Option<String> {
        let name = self.name.as_deref()?;
        match self.species {
            Species::Other => Some(format!("pet_{}", name.to_lowercase())),
            species => Some(format!("pet_{species}_{}", name.to_lowercase())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_from_wire() {
        assert_eq!(Species::from_wire(Some("cat")), Species::Cat);
        assert_eq!(Species::from_wire(Some("Dog")), Species::Dog);
        assert_eq!(Species::from_wire(Some("hamster")), Species::Other);
        assert_eq!(Species::from_wire(None), Species::Other);
    }

    #[test]
    fn slug_includes_species_when_known() {
        let pet = Pet {
            id: PetId::from("p1"),
            name: Some("Miezi".into()),
            species: Species::Cat,
        };
        assert_eq!(pet.slug().as_deref(), Some("pet_cat_miezi"));
    }

    #[test]
    fn slug_without_species_or_name() {
        let unnamed = Pet {
            id: PetId::from("p2"),
            name: None,
            species: Species::Dog,
        };
        assert!(unnamed.slug().is_none());

        let other = Pet {
            id: PetId::from("p3"),
            name: Some("Fluff".into()),
            species: Species::Other,
        };
        assert_eq!(other.slug().as_deref(), Some("pet_fluff"));
    }
}
