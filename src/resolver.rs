//! Turns classified links into concrete document keys.
//!
//! [`KeyResolver`] owns the per-document cache of which Strong's key encoding last succeeded.
//! Dictionaries disagree on how Strong's numbers are keyed (`25`, `00025`, `00025\r`, `G25`), so
//! each lookup tries a document's preferred encoding first and falls back to the others in a
//! fixed order. Every document is tracked independently.
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};

use crate::{
    document::{
        BookCategory, CompositeKey, Document, DocumentKey, DocumentLibrary, DocumentRef, Key,
        PseudoDocument, ResolvedKey,
    },
    error::AndBibleError,
    link::{BibleLink, DocType, UriAnalyzer},
    versification::{Passage, Versification},
};

static IBT_SPECIAL_CHAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_(\d+)_").expect("static regex"));
static STRONGS_WITH_CATEGORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([GH]?)(0*)([0-9]+)").expect("static regex"));

pub const STRONGS_PAD_WIDTH: usize = 5;

/// Candidate encodings of a Strong's number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrongsKeyFormat {
    /// The text as given.
    Key,
    /// Digits left-padded with `0` to five places.
    ZeroPadded,
    /// Zero padded, followed by a carriage return.
    ZeroPaddedR,
    /// Category letter followed by the digits (MyBible dictionaries).
    Category,
}

impl StrongsKeyFormat {
    pub const ALL: [StrongsKeyFormat; 4] = [
        StrongsKeyFormat::Key,
        StrongsKeyFormat::ZeroPadded,
        StrongsKeyFormat::ZeroPaddedR,
        StrongsKeyFormat::Category,
    ];

    /// `preferred` first, then the rest in the fixed order.
    pub fn lookup_order(preferred: StrongsKeyFormat) -> Vec<StrongsKeyFormat> {
        let mut order = vec![preferred];
        order.extend(Self::ALL.into_iter().filter(|f| *f != preferred));
        order
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrongsKind {
    Greek,
    Hebrew,
}

impl StrongsKind {
    pub fn category(self) -> &'static str {
        match self {
            StrongsKind::Greek => "G",
            StrongsKind::Hebrew => "H",
        }
    }
}

/// The four encodings of one Strong's lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrongsCandidates {
    pub key: String,
    pub zero_padded: String,
    pub zero_padded_r: String,
    pub category: String,
}

impl StrongsCandidates {
    pub fn new(text: &str, kind: StrongsKind) -> Self {
        let digits = STRONGS_WITH_CATEGORY_RE
            .captures(text)
            .and_then(|c| c.get(3))
            .map(|m| m.as_str());
        // Without digits only the text as given can match
        let Some(digits) = digits else {
            return StrongsCandidates {
                key: text.to_string(),
                zero_padded: String::new(),
                zero_padded_r: String::new(),
                category: String::new(),
            };
        };
        let zero_padded = zero_pad(digits);
        StrongsCandidates {
            key: text.to_string(),
            zero_padded_r: format!("{zero_padded}\r"),
            zero_padded,
            category: format!("{}{digits}", kind.category()),
        }
    }

    pub fn get(&self, format: StrongsKeyFormat) -> &str {
        match format {
            StrongsKeyFormat::Key => &self.key,
            StrongsKeyFormat::ZeroPadded => &self.zero_padded,
            StrongsKeyFormat::ZeroPaddedR => &self.zero_padded_r,
            StrongsKeyFormat::Category => &self.category,
        }
    }
}

/// Left-pad a numeric code with `0` to five digits. Longer codes are returned unchanged.
pub fn zero_pad(code: &str) -> String {
    format!("{code:0>width$}", width = STRONGS_PAD_WIDTH)
}

/// Replace `_NNN_` placeholders with the character of code point NNN: `Holy_32_Spirit` becomes
/// `Holy Spirit`. OSIS reference ids cannot hold punctuation or whitespace, so some modules
/// encode them this way. Placeholders that are not valid code points are left untouched.
pub fn decode_ibt_placeholders(text: &str) -> String {
    IBT_SPECIAL_CHAR_RE
        .replace_all(text, |caps: &Captures| {
            caps[1]
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Form-decode a key: `+` is a space, `%XX` escapes are decoded. Invalid UTF-8 keeps the input.
pub fn url_decode(text: &str) -> String {
    let spaced = text.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

pub struct KeyResolver {
    library: Arc<dyn DocumentLibrary>,
    preferred_formats: RwLock<HashMap<String, StrongsKeyFormat>>,
}

impl KeyResolver {
    pub fn new(library: Arc<dyn DocumentLibrary>) -> Self {
        KeyResolver {
            library,
            preferred_formats: RwLock::new(HashMap::new()),
        }
    }

    pub fn library(&self) -> &Arc<dyn DocumentLibrary> {
        &self.library
    }

    /// Format that last succeeded for `initials`, if any lookup has succeeded yet.
    pub fn preferred_format(&self, initials: &str) -> Option<StrongsKeyFormat> {
        self.preferred_formats.read().get(initials).copied()
    }

    pub fn versification(&self, name: &str) -> Result<Arc<Versification>, AndBibleError> {
        self.library
            .versification(name)
            .ok_or_else(|| AndBibleError::NotFound(format!("versification {name}")))
    }

    /// Resolve a link to its key(s). `Ok(None)` means there is nothing to navigate to.
    #[tracing::instrument(skip(self))]
    pub fn resolve(&self, link: &BibleLink) -> Result<Option<ResolvedKey>, AndBibleError> {
        tracing::info!("Loading: {}", link.url);
        let parsed = UriAnalyzer::analyze(&link.url);
        match parsed.doc_type {
            DocType::Bible => {
                let v11n = self.versification(&link.versification)?;
                self.resolve_bible(&parsed.key, &v11n).map(Some)
            }
            DocType::GreekDictionary => {
                let docs = self.library.default_strongs_greek_dictionaries();
                Ok(self.resolve_strongs(&docs, &parsed.key, StrongsKind::Greek))
            }
            DocType::HebrewDictionary => {
                let docs = self.library.default_strongs_hebrew_dictionaries();
                Ok(self.resolve_strongs(&docs, &parsed.key, StrongsKind::Hebrew))
            }
            DocType::Robinson => Ok(self.resolve_morphology(&parsed.key)),
            DocType::SpecificDocument => {
                let v11n = self.versification(&link.versification)?;
                self.resolve_specific_document(
                    parsed.book.as_deref(),
                    &parsed.key,
                    &v11n,
                    link.force_doc,
                )
            }
            DocType::AllGreekOccurrences
            | DocType::AllHebrewOccurrences
            | DocType::Unrecognized => Ok(None),
        }
    }

    /// Parse a passage reference. Malformed text is reported as [`AndBibleError::KeyNotFound`].
    pub fn resolve_bible(
        &self,
        text: &str,
        v11n: &Arc<Versification>,
    ) -> Result<ResolvedKey, AndBibleError> {
        let passage = Passage::parse(v11n, text).map_err(AndBibleError::into_key_not_found)?;
        Ok(ResolvedKey::Single(DocumentKey::new(
            None,
            Key::Passage(passage),
        )))
    }

    /// Look a Strong's number up in every document, dropping documents without a match.
    #[tracing::instrument(skip(self, documents))]
    pub fn resolve_strongs(
        &self,
        documents: &[DocumentRef],
        text: &str,
        kind: StrongsKind,
    ) -> Option<ResolvedKey> {
        let candidates = StrongsCandidates::new(text, kind);
        let matches = documents
            .iter()
            .filter_map(|doc| {
                self.lookup_strongs(doc, &candidates)
                    .map(|key| DocumentKey::in_document(doc, key))
            })
            .collect::<Vec<DocumentKey>>();
        ResolvedKey::from_list(matches)
    }

    fn lookup_strongs(&self, doc: &DocumentRef, candidates: &StrongsCandidates) -> Option<Key> {
        let initials = doc.initials();
        let preferred = self
            .preferred_format(initials)
            .unwrap_or(StrongsKeyFormat::Key);
        for format in StrongsKeyFormat::lookup_order(preferred) {
            let candidate = candidates.get(format);
            if candidate.is_empty() {
                continue;
            }
            match doc.get_key(candidate) {
                Ok(key) => {
                    if preferred != format {
                        tracing::debug!("[KeyResolver] {initials} now prefers {format:?} Strong's keys");
                    }
                    self.preferred_formats
                        .write()
                        .insert(initials.to_string(), format);
                    return Some(key);
                }
                Err(e) => {
                    tracing::trace!("[KeyResolver] {initials}: {format:?} '{candidate:?}' failed: {e}")
                }
            }
        }
        None
    }

    /// Strong's lookup in one dictionary. The category comes from a `G`/`H` prefix on the text,
    /// or from the dictionary's own Greek/Hebrew definition feature.
    pub fn resolve_strongs_in(&self, document: &DocumentRef, text: &str) -> Option<ResolvedKey> {
        let prefix = STRONGS_WITH_CATEGORY_RE
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let kind = match prefix {
            "H" => StrongsKind::Hebrew,
            "G" => StrongsKind::Greek,
            _ if document.is_hebrew_def() => StrongsKind::Hebrew,
            _ if document.is_greek_def() => StrongsKind::Greek,
            _ => return None,
        };
        self.resolve_strongs(std::slice::from_ref(document), text, kind)
            .map(|found| ResolvedKey::Single(found.first().clone()))
    }

    /// Look a Robinson morphology code up in the default morphology documents.
    pub fn resolve_morphology(&self, text: &str) -> Option<ResolvedKey> {
        let matches = self
            .library
            .default_robinson_morphology()
            .iter()
            .filter_map(|doc| match doc.get_key(text) {
                Ok(key) => Some(DocumentKey::in_document(doc, key)),
                Err(e) => {
                    tracing::debug!("[KeyResolver] {}: {e}", doc.initials());
                    None
                }
            })
            .collect::<Vec<DocumentKey>>();
        ResolvedKey::from_list(matches)
    }

    /// Resolve a reference into a named document.
    #[tracing::instrument(skip(self, v11n))]
    pub fn resolve_specific_document(
        &self,
        initials: Option<&str>,
        text: &str,
        v11n: &Arc<Versification>,
        force_doc: bool,
    ) -> Result<Option<ResolvedKey>, AndBibleError> {
        let Some(initials) = initials.filter(|i| !i.is_empty()) else {
            return self.resolve_bible(text, v11n).map(Some);
        };
        let document = self
            .library
            .document_by_initials(initials)
            .ok_or_else(|| AndBibleError::DocumentNotInstalled(initials.to_string()))?;

        if document.category() == BookCategory::Bible && !force_doc {
            return self.resolve_bible(text, v11n).map(Some);
        }
        if document.is_greek_def() || document.is_hebrew_def() {
            return Ok(self.resolve_strongs_in(&document, text));
        }
        // Foreign-language keys may be URL encoded, and may carry _NNN_ placeholders
        let decoded = decode_ibt_placeholders(&url_decode(text));
        let key = document
            .get_key(&decoded)
            .map_err(AndBibleError::into_key_not_found)?;
        Ok(Some(ResolvedKey::Single(DocumentKey::in_document(
            &document, key,
        ))))
    }

    /// Resolve every link, skip the ones that fail, and combine the rest into one composite key
    /// on the multi-document. `None` when nothing resolved.
    pub fn resolve_multi(&self, links: &[BibleLink]) -> Option<DocumentKey> {
        let entries = links
            .iter()
            .filter_map(|link| match self.resolve(link) {
                Ok(found) => found,
                Err(e) => {
                    tracing::debug!("[KeyResolver] skipping {} in multi link: {e}", link.url);
                    None
                }
            })
            .flat_map(ResolvedKey::into_vec)
            .collect::<Vec<DocumentKey>>();
        if entries.is_empty() {
            return None;
        }
        Some(DocumentKey::in_document(
            &PseudoDocument::Multi.document(),
            Key::Composite(CompositeKey::new(entries)),
        ))
    }
}
