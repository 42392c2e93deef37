mod retriever;

pub use retriever::{
    KnowledgeRetriever, RetrievalQuery, RetrievalResult, RetrievedDocument,
    DEFAULT_RETRIEVAL_LIMIT,
};

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::domain::{BuildingType, TableLoadError};

const BUILTIN_DOCUMENTS: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/data/knowledge_base.json"
));

/// One reference snippet used to ground generated reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub id: String,
    pub source: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Building types added to the tag set. An empty list adds no building-type tag, so
    /// such a document only matches on its topic tags.
    #[serde(default)]
    pub building_types: Vec<BuildingType>,
    pub body: String,
}

impl KnowledgeDocument {
    /// Lowercased topic tags plus the applicable building types.
    pub fn tag_set(&self) -> BTreeSet<String> {
        self.tags
            .iter()
            .map(|tag| normalize_tag(tag))
            .chain(
                self.building_types
                    .iter()
                    .map(|building_type| building_type.as_str().to_string()),
            )
            .collect()
    }

    /// Leading excerpt of the body cut on a word boundary.
    pub fn snippet(&self, max_chars: usize) -> String {
        if self.body.chars().count() <= max_chars {
            return self.body.clone();
        }

        let cut: String = self.body.chars().take(max_chars).collect();
        let trimmed = match cut.rfind(' ') {
            Some(index) if index > 0 => &cut[..index],
            _ => cut.as_str(),
        };
        format!("{}...", trimmed.trim_end_matches(|c: char| matches!(c, ',' | '.' | ';')))
    }
}

pub(crate) fn normalize_tag(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace(|c: char| c == ' ' || c == '-', "_")
}

/// Immutable, insertion-ordered collection of knowledge documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeBase {
    documents: Vec<KnowledgeDocument>,
}

impl KnowledgeBase {
    /// Documents compiled into the crate.
    pub fn builtin() -> Result<Self, TableLoadError> {
        Self::from_json_str(BUILTIN_DOCUMENTS, "built-in knowledge base")
    }

    pub fn from_documents(documents: Vec<KnowledgeDocument>) -> Result<Self, TableLoadError> {
        let mut base = Self::default();
        base.extend(documents, "knowledge documents")?;
        Ok(base)
    }

    pub fn from_json_str(raw: &str, origin: &str) -> Result<Self, TableLoadError> {
        let mut base = Self::default();
        base.extend_from_json(raw, origin)?;
        Ok(base)
    }

    /// Loads a single JSON file, or every `*.json` file of a directory in file-name order.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TableLoadError> {
        let path = path.as_ref();
        let io_error = |source| TableLoadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        if path.is_dir() {
            for entry in fs::read_dir(path).map_err(io_error)? {
                let entry_path = entry.map_err(io_error)?.path();
                if entry_path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                    files.push(entry_path);
                }
            }
            files.sort();
        } else {
            files.push(path.to_path_buf());
        }

        let mut base = Self::default();
        for file in files {
            let raw = fs::read_to_string(&file).map_err(|source| TableLoadError::Io {
                path: file.clone(),
                source,
            })?;
            base.extend_from_json(&raw, &file.display().to_string())?;
        }
        Ok(base)
    }

    fn extend_from_json(&mut self, raw: &str, origin: &str) -> Result<(), TableLoadError> {
        let documents: Vec<KnowledgeDocument> =
            serde_json::from_str(raw).map_err(|source| TableLoadError::Json {
                origin: origin.to_string(),
                source,
            })?;
        self.extend(documents, origin)
    }

    fn extend(
        &mut self,
        documents: Vec<KnowledgeDocument>,
        origin: &str,
    ) -> Result<(), TableLoadError> {
        let mut seen: HashSet<String> = self.documents.iter().map(|doc| doc.id.clone()).collect();
        for document in documents {
            if document.body.trim().is_empty() {
                return Err(TableLoadError::Invalid {
                    origin: origin.to_string(),
                    detail: format!("document '{}' has an empty body", document.id),
                });
            }
            if !seen.insert(document.id.clone()) {
                return Err(TableLoadError::Invalid {
                    origin: origin.to_string(),
                    detail: format!("duplicate document id '{}'", document.id),
                });
            }
            self.documents.push(document);
        }
        Ok(())
    }

    pub fn documents(&self) -> &[KnowledgeDocument] {
        &self.documents
    }

    pub fn get(&self, id: &str) -> Option<&KnowledgeDocument> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
