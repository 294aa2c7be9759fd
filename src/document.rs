//! Documents, keys and the library seam.
//!
//! The Bible-text library is consumed through two traits: [`DocumentLibrary`] locates documents
//! and versifications, and [`Document`] looks up keys inside one document. Everything the
//! navigation layer produces is expressed as a [`DocumentKey`] (a document plus a key inside
//! it) or a [`ResolvedKey`], which is either one such pair or a non-empty list of them.
use enumset::{EnumSet, EnumSetType};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Debug, Display, Formatter},
    sync::Arc,
};

use crate::{
    error::AndBibleError,
    versification::{Passage, Verse, VerseRange, Versification},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookCategory {
    Bible,
    Commentary,
    Dictionary,
    GeneralBook,
    Maps,
    /// Synthetic documents with no module behind them (multi, compare, journal, my notes).
    Pseudo,
}

/// Module features the navigation layer cares about.
#[derive(Debug, Serialize, Deserialize, EnumSetType, Hash)]
#[enumset(serialize_repr = "list")]
pub enum Feature {
    StrongsNumbers,
    GreekDef,
    HebrewDef,
    GreekParse,
    HebrewParse,
}

pub type FeatureSet = EnumSet<Feature>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexStatus {
    #[default]
    Undone,
    Scheduled,
    Creating,
    Done,
    Invalid,
}

/// One installed (or synthetic) document.
pub trait Document: Send + Sync + Debug {
    fn initials(&self) -> &str;

    fn name(&self) -> &str {
        self.initials()
    }

    fn category(&self) -> BookCategory;

    fn features(&self) -> FeatureSet {
        FeatureSet::empty()
    }

    fn has_feature(&self, feature: Feature) -> bool {
        self.features().contains(feature)
    }

    fn is_greek_def(&self) -> bool {
        self.has_feature(Feature::GreekDef)
    }

    fn is_hebrew_def(&self) -> bool {
        self.has_feature(Feature::HebrewDef)
    }

    /// Versification of a Bible or commentary, `None` for other documents.
    fn versification(&self) -> Option<Arc<Versification>> {
        None
    }

    /// Look up a key by its text. Fails with [`AndBibleError::KeyNotFound`].
    fn get_key(&self, text: &str) -> Result<Key, AndBibleError>;

    fn index_status(&self) -> IndexStatus {
        IndexStatus::Undone
    }

    /// Number of search hits for `query`. Only meaningful when the index is done.
    fn find(&self, query: &str) -> Result<usize, AndBibleError> {
        Err(AndBibleError::NotFound(format!(
            "{} cannot search for '{query}'",
            self.initials()
        )))
    }
}

pub type DocumentRef = Arc<dyn Document>;

/// Locates documents and versifications.
pub trait DocumentLibrary: Send + Sync {
    fn document_by_initials(&self, initials: &str) -> Option<DocumentRef>;

    /// Greek Strong's dictionaries, in preference order.
    fn default_strongs_greek_dictionaries(&self) -> Vec<DocumentRef>;

    /// Hebrew Strong's dictionaries, in preference order.
    fn default_strongs_hebrew_dictionaries(&self) -> Vec<DocumentRef>;

    /// Documents providing Robinson Greek morphology entries, in preference order.
    fn default_robinson_morphology(&self) -> Vec<DocumentRef>;

    fn default_bible_with_strongs(&self) -> Option<DocumentRef>;

    fn versification(&self, name: &str) -> Option<Arc<Versification>>;
}

/// A study pad is addressed by its label, optionally scrolled to one bookmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudyPadKey {
    pub label_id: i64,
    pub bookmark_id: Option<i64>,
}

/// Synthetic key combining several document keys, e.g. when multiple links are opened at once.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeKey {
    pub name: String,
    pub entries: Vec<DocumentKey>,
}

impl CompositeKey {
    /// Build a composite whose name is the comma-joined names of its entries.
    pub fn new(entries: Vec<DocumentKey>) -> CompositeKey {
        let name = entries
            .iter()
            .map(|e| e.key.name())
            .collect::<Vec<String>>()
            .join(", ");
        CompositeKey { name, entries }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Passage(Passage),
    Verse(Verse),
    Range(VerseRange),
    /// A dictionary or general-book entry.
    Entry(String),
    StudyPad(StudyPadKey),
    Composite(CompositeKey),
}

impl Key {
    pub fn name(&self) -> String {
        match self {
            Key::Passage(p) => p.name(),
            Key::Verse(v) => v.name(),
            Key::Range(r) => r.name(),
            Key::Entry(e) => e.trim_end_matches(['\r', '\n']).to_string(),
            Key::StudyPad(k) => format!("StudyPad({})", k.label_id),
            Key::Composite(c) => c.name.clone(),
        }
    }

    /// First verse addressed by a Bible-like key.
    pub fn first_verse(&self) -> Option<&Verse> {
        match self {
            Key::Passage(p) => Some(p.first_verse()),
            Key::Verse(v) => Some(v),
            Key::Range(r) => Some(r.start()),
            _ => None,
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A key together with the document it belongs to. `document` is `None` for plain Bible
/// references, which open in whatever Bible the target window shows.
#[derive(Debug, Clone)]
pub struct DocumentKey {
    pub document: Option<DocumentRef>,
    pub key: Key,
}

impl PartialEq for DocumentKey {
    fn eq(&self, other: &Self) -> bool {
        self.initials() == other.initials() && self.key == other.key
    }
}

impl DocumentKey {
    pub fn new(document: Option<DocumentRef>, key: Key) -> Self {
        DocumentKey { document, key }
    }

    pub fn in_document(document: &DocumentRef, key: Key) -> Self {
        DocumentKey {
            document: Some(document.clone()),
            key,
        }
    }

    pub fn initials(&self) -> Option<&str> {
        self.document.as_ref().map(|d| d.initials())
    }
}

impl Display for DocumentKey {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.initials() {
            Some(initials) => write!(f, "{initials}:{}", self.key),
            None => write!(f, "{}", self.key),
        }
    }
}

/// Outcome of resolving one link.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedKey {
    Single(DocumentKey),
    /// Never empty.
    Multiple(Vec<DocumentKey>),
}

impl ResolvedKey {
    /// Wrap a list of matches, collapsing an empty list to "not found".
    pub fn from_list(keys: Vec<DocumentKey>) -> Option<ResolvedKey> {
        if keys.is_empty() {
            None
        } else {
            Some(ResolvedKey::Multiple(keys))
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ResolvedKey::Single(_) => 1,
            ResolvedKey::Multiple(keys) => keys.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn first(&self) -> &DocumentKey {
        match self {
            ResolvedKey::Single(k) => k,
            ResolvedKey::Multiple(keys) => &keys[0],
        }
    }

    pub fn into_vec(self) -> Vec<DocumentKey> {
        match self {
            ResolvedKey::Single(k) => vec![k],
            ResolvedKey::Multiple(keys) => keys,
        }
    }
}

/// Documents with no module behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoDocument {
    Multi,
    Compare,
    Journal,
    MyNotes,
}

impl PseudoDocument {
    pub fn initials(self) -> &'static str {
        match self {
            PseudoDocument::Multi => "multi",
            PseudoDocument::Compare => "compare",
            PseudoDocument::Journal => "journal",
            PseudoDocument::MyNotes => "mynotes",
        }
    }

    pub fn document(self) -> DocumentRef {
        Arc::new(self)
    }

    pub fn matches(self, document: &DocumentRef) -> bool {
        document.category() == BookCategory::Pseudo && document.initials() == self.initials()
    }
}

impl Document for PseudoDocument {
    fn initials(&self) -> &str {
        PseudoDocument::initials(*self)
    }

    fn category(&self) -> BookCategory {
        BookCategory::Pseudo
    }

    fn get_key(&self, text: &str) -> Result<Key, AndBibleError> {
        Err(AndBibleError::KeyNotFound(format!(
            "{} has no keys of its own ('{text}')",
            PseudoDocument::initials(*self)
        )))
    }
}
