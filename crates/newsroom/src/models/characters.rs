use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::media::ImageRef;

pub const MIN_ROSTER_SIZE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CharacterKind {
    /// Victims, officers, bystanders.
    Person,
    /// Perpetrators, drawn featureless.
    Scammer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub role: String,
    #[serde(rename = "type")]
    pub kind: CharacterKind,
    pub description: String,
    #[serde(default)]
    pub image: Option<ImageRef>,
}

/// Cast of the video, addressed by role name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterRoster {
    pub characters: Vec<Character>,
}

impl CharacterRoster {
    /// Roles must be unique and non-empty and a populated roster needs two entries.
    pub fn from_candidates(characters: Vec<Character>) -> Result<Self, String> {
        if characters.len() < MIN_ROSTER_SIZE {
            return Err(format!(
                "roster needs at least {} characters, got {}",
                MIN_ROSTER_SIZE,
                characters.len()
            ));
        }
        for (index, character) in characters.iter().enumerate() {
            if character.role.trim().is_empty() {
                return Err(format!("character {} has an empty role", index + 1));
            }
            if characters[..index].iter().any(|c| c.role == character.role) {
                return Err(format!("duplicate character role: {}", character.role));
            }
        }
        Ok(Self { characters })
    }

    pub fn get_mut(&mut self, role: &str) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.role == role)
    }

    pub fn contains(&self, role: &str) -> bool {
        self.characters.iter().any(|c| c.role == role)
    }

    pub fn roles(&self) -> Vec<String> {
        self.characters.iter().map(|c| c.role.clone()).collect()
    }
}

#[cfg(any(test, feature = "test-support"))]
pub(crate) fn sample_characters() -> Vec<Character> {
    vec![
        Character {
            role: "Retired nurse".to_string(),
            kind: CharacterKind::Person,
            description: "Malaysian woman in her sixties, baju kurung, reading glasses".to_string(),
            image: None,
        },
        Character {
            role: "Fake courier".to_string(),
            kind: CharacterKind::Scammer,
            description: "Featureless silhouette holding a phone".to_string(),
            image: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_requires_two_unique_roles() {
        assert!(CharacterRoster::from_candidates(sample_characters()).is_ok());
        assert!(CharacterRoster::from_candidates(sample_characters()[..1].to_vec()).is_err());

        let mut dupes = sample_characters();
        dupes[1].role = dupes[0].role.clone();
        assert!(CharacterRoster::from_candidates(dupes)
            .unwrap_err()
            .contains("duplicate"));
    }

    #[test]
    fn kind_serializes_as_type() {
        let value = serde_json::to_value(&sample_characters()[1]).unwrap();
        assert_eq!(value["type"], "scammer");
    }
}
