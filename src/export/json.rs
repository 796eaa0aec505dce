//! JSON import/export module for topics.
//! Saves a topic's name and its flashcards' front/back text to a JSON file and
//! reads such files back. Ids and timestamps are never exported, the store
//! issues fresh ones on import.

use crate::models::{Flashcard, Topic};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardExport {
    pub front: String,
    pub back: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicExport {
    pub name: String,
    pub flashcards: Vec<CardExport>,
}

impl TopicExport {
    pub fn from_topic(topic: &Topic, cards: &[Flashcard]) -> Self {
        Self {
            name: topic.name.clone(),
            flashcards: cards
                .iter()
                .map(|c| CardExport {
                    front: c.front.clone(),
                    back: c.back.clone(),
                })
                .collect(),
        }
    }
}

/// Exports a topic and its cards to a JSON file at the specified path.
/// Returns an error if file creation or writing fails.
pub fn export_topic_to_path(
    topic: &Topic,
    cards: &[Flashcard],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let json_string = serde_json::to_string_pretty(&TopicExport::from_topic(topic, cards))?;
    let mut file = File::create(path.as_ref())?;
    file.write_all(json_string.as_bytes())?;
    tracing::info!(
        "Topic '{}' exported to '{}'",
        topic.name,
        path.as_ref().display()
    );
    Ok(())
}

/// Imports a topic from a JSON file.
/// Returns an error if the file doesn't exist or contains invalid JSON.
pub fn import_topic(path: impl AsRef<Path>) -> Result<TopicExport, Box<dyn std::error::Error>> {
    let mut file = File::open(path.as_ref())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let topic: TopicExport = serde_json::from_str(&contents)?;

    tracing::info!(
        "Topic '{}' read from '{}'",
        topic.name,
        path.as_ref().display()
    );
    Ok(topic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identity;
    use chrono::Utc;
    use std::fs;

    fn create_test_topic() -> (Topic, Vec<Flashcard>) {
        let topic = Topic {
            id: 3,
            owner: Identity::new("alice"),
            name: "Polish Vocabulary".to_string(),
            created_at: Utc::now(),
            next_review: Utc::now(),
        };
        let cards = vec![
            Flashcard {
                id: 10,
                topic_id: 3,
                front: "cześć".to_string(),
                back: "hello".to_string(),
                created_at: Utc::now(),
            },
            Flashcard {
                id: 11,
                topic_id: 3,
                front: "do widzenia".to_string(),
                back: "goodbye".to_string(),
                created_at: Utc::now(),
            },
        ];
        (topic, cards)
    }

    #[test]
    fn test_export_writes_names_and_sides_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("polish.json");
        let (topic, cards) = create_test_topic();

        export_topic_to_path(&topic, &cards, &path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["name"], "Polish Vocabulary");
        assert_eq!(written["flashcards"][1]["front"], "do widzenia");
        assert!(written["flashcards"][0].get("id").is_none());
    }

    #[test]
    fn test_import_json() {
        let json_content = r#"{
  "name": "Import Test Topic",
  "flashcards": [
    {
      "front": "test front",
      "back": "test back"
    }
  ]
}"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        fs::write(&path, json_content).unwrap();

        let topic = import_topic(&path).unwrap();
        assert_eq!(topic.name, "Import Test Topic");
        assert_eq!(topic.flashcards.len(), 1);
        assert_eq!(topic.flashcards[0].front, "test front");
        assert_eq!(topic.flashcards[0].back, "test back");
    }

    #[test]
    fn test_import_nonexistent_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = import_topic(dir.path().join("nonexistent_file_xyz123.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_import_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        assert!(import_topic(&path).is_err());
    }
}
