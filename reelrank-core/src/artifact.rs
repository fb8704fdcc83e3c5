//! Flat-file hand-off between the fetch and ranking stages.

use crate::error::CoreError;
use crate::types::RenderedDocument;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentArtifact {
    pub content: String,
}

impl From<&RenderedDocument> for ContentArtifact {
    fn from(doc: &RenderedDocument) -> Self {
        Self {
            content: doc.content(),
        }
    }
}

fn ensure_parent(path: &Path) -> Result<(), CoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(fs::create_dir_all(parent)?),
        _ => Ok(()),
    }
}

pub fn write_content(path: &Path, document: &RenderedDocument) -> Result<(), CoreError> {
    ensure_parent(path)?;
    let artifact = ContentArtifact::from(document);
    let json = serde_json::to_string(&artifact)?;
    fs::write(path, json)?;
    debug!(
        "Wrote {} characters to {}",
        artifact.content.len(),
        path.display()
    );
    Ok(())
}

pub fn read_content(path: &Path) -> Result<String, CoreError> {
    let raw = fs::read_to_string(path).map_err(|e| CoreError::Artifact {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let artifact: ContentArtifact =
        serde_json::from_str(&raw).map_err(|e| CoreError::Artifact {
            path: path.display().to_string(),
            reason: format!("not a content artifact: {}", e),
        })?;
    Ok(artifact.content)
}

/// Writes `value` as four-space indented JSON.
pub fn write_ranking(path: &Path, value: &Value) -> Result<(), CoreError> {
    ensure_parent(path)?;
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    fs::write(path, buffer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("comedy.json");

        let mut doc = RenderedDocument::new();
        doc.push_line("## 1. \"Quoted\" title (from r/movies)");
        doc.push_blank();
        doc.push_line("1. unicode ✓ and\ttabs");

        write_content(&path, &doc).unwrap();
        assert_eq!(read_content(&path).unwrap(), doc.content());

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw.get("content").is_some());
    }

    #[test]
    fn test_read_missing_or_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            read_content(&missing),
            Err(CoreError::Artifact { .. })
        ));

        let wrong = dir.path().join("wrong.json");
        fs::write(&wrong, r#"{"text": "nope"}"#).unwrap();
        assert!(matches!(read_content(&wrong), Err(CoreError::Artifact { .. })));
    }

    #[test]
    fn test_ranking_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranked.json");
        let value = json!({"ranked_movies": [{"rank": 1, "title": "Heat", "reason": "r"}]});

        write_ranking(&path, &value).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("{\n    \"ranked_movies\": ["));
        assert_eq!(serde_json::from_str::<Value>(&written).unwrap(), value);
    }
}
