//! In-memory document library, loadable from a TOML manifest.
//!
//! ```toml
//! [[versifications]]
//! name = "KJV"
//! books = [
//!     { osis = "Gen", name = "Gen", aliases = ["Genesis"], verses = [31, 25] },
//! ]
//!
//! [[documents]]
//! initials = "StrongsGreek"
//! category = "Dictionary"
//! features = ["GreekDef"]
//! entries = ["00025", "00026"]
//!
//! [defaults]
//! strongs_greek = ["StrongsGreek"]
//! ```
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs::read_to_string,
    path::Path,
    sync::Arc,
};

use crate::{
    document::{
        BookCategory, Document, DocumentLibrary, DocumentRef, FeatureSet, IndexStatus, Key,
    },
    error::AndBibleError,
    versification::{BookInfo, Passage, Versification},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersificationRecord {
    pub name: String,
    pub books: Vec<BookInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub initials: String,
    #[serde(default)]
    pub name: Option<String>,
    pub category: BookCategory,
    #[serde(default)]
    pub features: FeatureSet,
    /// Versification name for Bibles and commentaries.
    #[serde(default)]
    pub versification: Option<String>,
    /// Dictionary / general book keys.
    #[serde(default)]
    pub entries: BTreeSet<String>,
    #[serde(default)]
    pub index_status: IndexStatus,
    /// Canned search results: query text to hit count.
    #[serde(default)]
    pub search_hits: BTreeMap<String, usize>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryDefaults {
    #[serde(default)]
    pub strongs_greek: Vec<String>,
    #[serde(default)]
    pub strongs_hebrew: Vec<String>,
    #[serde(default)]
    pub robinson: Vec<String>,
    pub bible_with_strongs: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryManifest {
    #[serde(default)]
    pub versifications: Vec<VersificationRecord>,
    #[serde(default)]
    pub documents: Vec<DocumentRecord>,
    #[serde(default)]
    pub defaults: LibraryDefaults,
}

/// A document whose keys are held in memory.
#[derive(Debug)]
pub struct MemoryDocument {
    record: DocumentRecord,
    v11n: Option<Arc<Versification>>,
}

impl MemoryDocument {
    pub fn new(record: DocumentRecord, v11n: Option<Arc<Versification>>) -> Self {
        MemoryDocument { record, v11n }
    }

    pub fn dictionary(initials: &str, features: FeatureSet, entries: &[&str]) -> Self {
        MemoryDocument::new(
            DocumentRecord {
                initials: initials.to_string(),
                name: None,
                category: BookCategory::Dictionary,
                features,
                versification: None,
                entries: entries.iter().map(|e| e.to_string()).collect(),
                index_status: IndexStatus::Undone,
                search_hits: BTreeMap::new(),
            },
            None,
        )
    }

    pub fn bible(initials: &str, features: FeatureSet, v11n: Arc<Versification>) -> Self {
        MemoryDocument::new(
            DocumentRecord {
                initials: initials.to_string(),
                name: None,
                category: BookCategory::Bible,
                features,
                versification: Some(v11n.name().to_string()),
                entries: BTreeSet::new(),
                index_status: IndexStatus::Undone,
                search_hits: BTreeMap::new(),
            },
            Some(v11n),
        )
    }

    pub fn with_index(mut self, status: IndexStatus, hits: &[(&str, usize)]) -> Self {
        self.record.index_status = status;
        self.record.search_hits = hits.iter().map(|(q, n)| (q.to_string(), *n)).collect();
        self
    }
}

impl Document for MemoryDocument {
    fn initials(&self) -> &str {
        &self.record.initials
    }

    fn name(&self) -> &str {
        self.record.name.as_deref().unwrap_or(&self.record.initials)
    }

    fn category(&self) -> BookCategory {
        self.record.category
    }

    fn features(&self) -> FeatureSet {
        self.record.features
    }

    fn versification(&self) -> Option<Arc<Versification>> {
        self.v11n.clone()
    }

    fn get_key(&self, text: &str) -> Result<Key, AndBibleError> {
        if let (BookCategory::Bible | BookCategory::Commentary, Some(v11n)) =
            (self.record.category, &self.v11n)
        {
            return Passage::parse(v11n, text)
                .map(Key::Passage)
                .map_err(AndBibleError::into_key_not_found);
        }
        if self.record.entries.contains(text) {
            Ok(Key::Entry(text.to_string()))
        } else {
            Err(AndBibleError::KeyNotFound(format!(
                "'{}' not in {}",
                text.escape_debug(),
                self.record.initials
            )))
        }
    }

    fn index_status(&self) -> IndexStatus {
        self.record.index_status
    }

    fn find(&self, query: &str) -> Result<usize, AndBibleError> {
        if self.record.index_status != IndexStatus::Done {
            return Err(AndBibleError::NotFound(format!(
                "{} is not indexed",
                self.record.initials
            )));
        }
        Ok(self.record.search_hits.get(query).copied().unwrap_or(0))
    }
}

/// A [`DocumentLibrary`] over in-memory documents.
#[derive(Debug, Default)]
pub struct MemoryLibrary {
    documents: BTreeMap<String, DocumentRef>,
    versifications: BTreeMap<String, Arc<Versification>>,
    defaults: LibraryDefaults,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        MemoryLibrary::default()
    }

    pub fn from_manifest(manifest: LibraryManifest) -> Result<Self, AndBibleError> {
        let mut library = MemoryLibrary::new();
        for record in manifest.versifications {
            library.add_versification(Arc::new(Versification::new(&record.name, record.books)));
        }
        for record in manifest.documents {
            let v11n = match &record.versification {
                Some(name) => Some(library.versification(name).ok_or_else(|| {
                    AndBibleError::NotFound(format!(
                        "versification {name} of {} is not defined",
                        record.initials
                    ))
                })?),
                None => None,
            };
            library.add_document(Arc::new(MemoryDocument::new(record, v11n)));
        }
        library.defaults = manifest.defaults;
        tracing::debug!(
            "[MemoryLibrary] loaded {} documents, {} versifications",
            library.documents.len(),
            library.versifications.len()
        );
        Ok(library)
    }

    pub fn from_toml(content: &str) -> Result<Self, AndBibleError> {
        let manifest: LibraryManifest = toml::from_str(content)?;
        MemoryLibrary::from_manifest(manifest)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AndBibleError> {
        tracing::debug!("Reading library manifest {:?}", path.as_ref());
        MemoryLibrary::from_toml(&read_to_string(path)?)
    }

    pub fn add_versification(&mut self, v11n: Arc<Versification>) {
        self.versifications.insert(v11n.name().to_string(), v11n);
    }

    pub fn add_document(&mut self, document: DocumentRef) {
        self.documents
            .insert(document.initials().to_string(), document);
    }

    pub fn set_defaults(&mut self, defaults: LibraryDefaults) {
        self.defaults = defaults;
    }

    pub fn documents(&self) -> impl Iterator<Item = &DocumentRef> {
        self.documents.values()
    }

    fn default_doc(&self, initials: &Option<String>) -> Option<DocumentRef> {
        initials
            .as_ref()
            .and_then(|i| self.document_by_initials(i))
    }

    /// Installed documents among `initials`, keeping their order.
    fn default_docs(&self, initials: &[String]) -> Vec<DocumentRef> {
        initials
            .iter()
            .filter_map(|i| self.document_by_initials(i))
            .collect()
    }
}

impl DocumentLibrary for MemoryLibrary {
    fn document_by_initials(&self, initials: &str) -> Option<DocumentRef> {
        self.documents.get(initials).cloned().or_else(|| {
            self.documents
                .values()
                .find(|d| d.initials().eq_ignore_ascii_case(initials))
                .cloned()
        })
    }

    fn default_strongs_greek_dictionaries(&self) -> Vec<DocumentRef> {
        self.default_docs(&self.defaults.strongs_greek)
    }

    fn default_strongs_hebrew_dictionaries(&self) -> Vec<DocumentRef> {
        self.default_docs(&self.defaults.strongs_hebrew)
    }

    fn default_robinson_morphology(&self) -> Vec<DocumentRef> {
        self.default_docs(&self.defaults.robinson)
    }

    fn default_bible_with_strongs(&self) -> Option<DocumentRef> {
        self.default_doc(&self.defaults.bible_with_strongs)
    }

    fn versification(&self, name: &str) -> Option<Arc<Versification>> {
        self.versifications.get(name).cloned()
    }
}
