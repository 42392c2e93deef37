use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use super::super::domain::{BuildingType, EfficiencyLabel};
use super::{normalize_tag, KnowledgeBase, KnowledgeDocument};

pub const DEFAULT_RETRIEVAL_LIMIT: usize = 3;

/// Terms describing what a report needs grounding for.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalQuery<'q> {
    pub building_type: &'q BuildingType,
    pub label: EfficiencyLabel,
    pub topic: Option<&'q str>,
}

impl<'q> RetrievalQuery<'q> {
    pub fn new(building_type: &'q BuildingType, label: EfficiencyLabel) -> Self {
        Self {
            building_type,
            label,
            topic: None,
        }
    }

    pub fn with_topic(mut self, topic: Option<&'q str>) -> Self {
        self.topic = topic;
        self
    }

    /// Query tags: building type, verdict label, and the topic as a whole and per word.
    pub fn tags(&self) -> BTreeSet<String> {
        let mut tags = BTreeSet::new();
        tags.insert(self.building_type.as_str().to_string());
        tags.insert(self.label.as_str().to_string());

        if let Some(topic) = self.topic.map(str::trim).filter(|topic| !topic.is_empty()) {
            tags.insert(normalize_tag(topic));
            tags.extend(
                topic
                    .split(|c: char| !c.is_alphanumeric() && c != '_')
                    .filter(|word| !word.is_empty())
                    .map(normalize_tag),
            );
        }

        tags
    }
}

/// Document matched by a query together with its tag-overlap count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RetrievedDocument<'a> {
    pub document: &'a KnowledgeDocument,
    pub relevance: usize,
}

/// Documents ordered by relevance, highest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievalResult<'a> {
    pub matches: Vec<RetrievedDocument<'a>>,
}

impl<'a> RetrievalResult<'a> {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn documents(&self) -> impl Iterator<Item = &'a KnowledgeDocument> + '_ {
        self.matches.iter().map(|matched| matched.document)
    }

    pub fn document_ids(&self) -> Vec<String> {
        self.documents().map(|doc| doc.id.clone()).collect()
    }
}

/// Pure tag-overlap retriever over the shared knowledge base.
#[derive(Debug, Clone)]
pub struct KnowledgeRetriever {
    base: Arc<KnowledgeBase>,
    limit: usize,
}

impl KnowledgeRetriever {
    pub fn new(base: Arc<KnowledgeBase>) -> Self {
        Self::with_limit(base, DEFAULT_RETRIEVAL_LIMIT)
    }

    pub fn with_limit(base: Arc<KnowledgeBase>, limit: usize) -> Self {
        Self { base, limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn base(&self) -> &KnowledgeBase {
        &self.base
    }

    pub fn retrieve(&self, query: &RetrievalQuery<'_>) -> RetrievalResult<'_> {
        let query_tags = query.tags();

        let mut matches: Vec<RetrievedDocument<'_>> = self
            .base
            .documents()
            .iter()
            .filter_map(|document| {
                let relevance = document.tag_set().intersection(&query_tags).count();
                (relevance > 0).then_some(RetrievedDocument {
                    document,
                    relevance,
                })
            })
            .collect();

        // stable: equal relevance keeps insertion order
        matches.sort_by(|left, right| right.relevance.cmp(&left.relevance));
        matches.truncate(self.limit);

        RetrievalResult { matches }
    }
}
