//! Navigation routing: where a followed link opens.
//!
//! [`LinkControl`] resolves links through its [`KeyResolver`] and hands the result to the window
//! manager. The target window depends on the current [`WindowMode`]:
//!
//! - `New` opens a fresh window,
//! - otherwise the dedicated links window is used when eligible,
//! - otherwise the active window is changed in place.
//!
//! The dedicated window is never eligible while the layout is maximized. `Special` and `This`
//! force the choice; `Undefined` defers to the `open_links_in_special_window` preference.
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
    sync::Arc,
};

use crate::{
    bookmark::BookmarkStore,
    config::SettingsProvider,
    document::{
        CompositeKey, Document, DocumentKey, DocumentLibrary, DocumentRef, Feature, IndexStatus,
        Key, PseudoDocument, ResolvedKey, StudyPadKey,
    },
    error::AndBibleError,
    link::BibleLink,
    resolver::KeyResolver,
    versification::{Passage, Verse, VerseRange},
    window::{WindowControl, WindowId},
};

/// Searches that find typical Greek or Hebrew Strong's numbers in any Bible carrying them.
const STRONGS_INDEX_SAMPLES: [&str; 3] = [
    "+[Gen 1:1] strong:h7225",
    "+[John 1:1] strong:g746",
    "+[Gen 1:1] strong:g746",
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowMode {
    This,
    Special,
    New,
    #[default]
    Undefined,
}

impl FromStr for WindowMode {
    type Err = AndBibleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "this" => Ok(WindowMode::This),
            "special" => Ok(WindowMode::Special),
            "new" => Ok(WindowMode::New),
            "undefined" | "" => Ok(WindowMode::Undefined),
            other => Err(AndBibleError::Custom(format!("unknown window mode '{other}'"))),
        }
    }
}

/// Part of the Bible a search is restricted to.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchBibleSection {
    #[default]
    All,
    OldTestament,
    NewTestament,
    /// OSIS id of a single book.
    Book(String),
}

impl SearchBibleSection {
    /// Prefix `text` with the range restriction for this section.
    pub fn decorate(&self, text: &str) -> String {
        match self {
            SearchBibleSection::All => text.to_string(),
            SearchBibleSection::OldTestament => format!("+[Gen-Mal] {text}"),
            SearchBibleSection::NewTestament => format!("+[Mat-Rev] {text}"),
            SearchBibleSection::Book(book) => format!("+[{book}] {text}"),
        }
    }
}

/// What the search screen needs to run, or first index for, a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub search_text: String,
    /// Bible searched: carries Strong's numbers.
    pub search_document: String,
    /// Bible the results open in.
    pub target_document: Option<String>,
    /// The search Bible must be indexed before searching.
    pub needs_index: bool,
}

impl Display for SearchRequest {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} in {}", self.search_text, self.search_document)?;
        if self.needs_index {
            write!(f, " (index first)")?;
        }
        Ok(())
    }
}

/// User-facing error notifications.
pub trait ErrorReporter: Send + Sync {
    fn document_not_installed(&self, initials: &str);
    fn show_error(&self, message: &str);
}

/// Reports errors to the log only.
#[derive(Debug, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn document_not_installed(&self, initials: &str) {
        tracing::error!("Document not installed: {initials}");
    }

    fn show_error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

pub struct LinkControl {
    window_mode: WindowMode,
    resolver: KeyResolver,
    windows: Arc<dyn WindowControl>,
    settings: Arc<dyn SettingsProvider>,
    reporter: Arc<dyn ErrorReporter>,
    bookmarks: Arc<dyn BookmarkStore>,
}

impl LinkControl {
    pub fn new(
        library: Arc<dyn DocumentLibrary>,
        windows: Arc<dyn WindowControl>,
        settings: Arc<dyn SettingsProvider>,
        reporter: Arc<dyn ErrorReporter>,
        bookmarks: Arc<dyn BookmarkStore>,
    ) -> Self {
        LinkControl {
            window_mode: WindowMode::Undefined,
            resolver: KeyResolver::new(library),
            windows,
            settings,
            reporter,
            bookmarks,
        }
    }

    pub fn window_mode(&self) -> WindowMode {
        self.window_mode
    }

    pub fn set_window_mode(&mut self, mode: WindowMode) {
        self.window_mode = mode;
    }

    pub fn resolver(&self) -> &KeyResolver {
        &self.resolver
    }

    /// Follow a link. `false` when it leads nowhere.
    pub fn load_application_url(&self, link: &BibleLink) -> bool {
        let resolved = match self.resolver.resolve(link) {
            Ok(Some(resolved)) => resolved,
            Ok(None) => return false,
            Err(AndBibleError::DocumentNotInstalled(initials)) => {
                self.reporter.document_not_installed(&initials);
                return false;
            }
            Err(e) if e.is_key_not_found() => {
                tracing::debug!("[LinkControl] {} leads nowhere: {e}", link.url);
                return false;
            }
            Err(e) => {
                tracing::warn!("[LinkControl] {} not followed: {e}", link.url);
                return false;
            }
        };

        match resolved {
            ResolvedKey::Single(DocumentKey {
                document,
                key: Key::Passage(passage),
            }) if passage.count_ranges() > 1 => {
                let entries = passage
                    .ranges()
                    .iter()
                    .map(|range| DocumentKey::new(document.clone(), Key::Range(range.clone())))
                    .collect::<Vec<DocumentKey>>();
                self.show_multi(entries);
            }
            ResolvedKey::Single(found) => {
                self.show_link(found.document, found.key, false);
            }
            ResolvedKey::Multiple(found) => {
                self.show_multi(found);
            }
        }
        true
    }

    fn show_multi(&self, entries: Vec<DocumentKey>) -> WindowId {
        self.show_link(
            Some(PseudoDocument::Multi.document()),
            Key::Composite(CompositeKey::new(entries)),
            false,
        )
    }

    /// Route `key` to a window. Without a document, Bible keys open in the current Bible.
    pub fn show_link(&self, document: Option<DocumentRef>, key: Key, force_here: bool) -> WindowId {
        tracing::debug!(
            "[LinkControl] show {key} ({:?}, force here: {force_here})",
            self.window_mode
        );
        if self.window_mode == WindowMode::New {
            let document = document.or_else(|| self.windows.current_bible());
            self.windows.add_new_window(document, key)
        } else if self.open_in_dedicated_window() && !force_here {
            self.windows.show_link(document, key)
        } else {
            let document = document.or_else(|| self.windows.current_bible());
            self.windows.set_current_document_and_key(document, key)
        }
    }

    pub fn open_in_dedicated_window(&self) -> bool {
        if self.windows.is_maximized() {
            return false;
        }
        match self.window_mode {
            WindowMode::Special => true,
            WindowMode::This => false,
            WindowMode::New | WindowMode::Undefined => {
                self.settings.open_links_in_special_window()
            }
        }
    }

    /// Open every link that resolves as one combined key on the multi-document.
    pub fn open_multi(&self, links: &[BibleLink]) -> bool {
        match self.resolver.resolve_multi(links) {
            Some(found) => {
                self.show_link(found.document, found.key, false);
                true
            }
            None => {
                tracing::debug!("[LinkControl] none of {} links resolved", links.len());
                false
            }
        }
    }

    pub fn open_compare(&self, range: VerseRange) -> bool {
        self.show_link(
            Some(PseudoDocument::Compare.document()),
            Key::Range(range),
            false,
        );
        true
    }

    /// Open the user's notes at a verse given by its ordinal in the named versification.
    pub fn open_my_notes(&self, v11n_name: &str, ordinal: u32) -> bool {
        let v11n = match self.resolver.versification(v11n_name) {
            Ok(v11n) => v11n,
            Err(e) => {
                tracing::warn!("[LinkControl] cannot open my notes: {e}");
                return false;
            }
        };
        let Some(verse) = Verse::from_ordinal(&v11n, ordinal) else {
            tracing::warn!("[LinkControl] ordinal {ordinal} is outside {v11n_name}");
            return false;
        };
        self.show_link(
            Some(PseudoDocument::MyNotes.document()),
            Key::Verse(verse),
            false,
        );
        true
    }

    /// Open the study pad of a label. `false` if the label does not exist.
    pub fn open_study_pad(&self, label_id: i64, bookmark_id: Option<i64>) -> bool {
        let Some(label) = self.bookmarks.label_by_id(label_id) else {
            tracing::debug!("[LinkControl] no label {label_id}");
            return false;
        };
        self.show_link(
            Some(PseudoDocument::Journal.document()),
            Key::StudyPad(StudyPadKey {
                label_id: label.id,
                bookmark_id,
            }),
            false,
        );
        true
    }

    /// Parse free text as a reference in the current Bible's versification and open it here.
    pub fn try_to_open_ref(&self, text: &str) -> bool {
        let v11n = match self
            .windows
            .current_bible()
            .and_then(|bible| bible.versification())
        {
            Some(v11n) => v11n,
            None => {
                let name = self
                    .settings
                    .settings()
                    .map(|s| s.default_v11n)
                    .unwrap_or_else(|_| crate::config::DEFAULT_VERSIFICATION.to_string());
                match self.resolver.versification(&name) {
                    Ok(v11n) => v11n,
                    Err(e) => {
                        tracing::warn!("[LinkControl] {e}");
                        return false;
                    }
                }
            }
        };
        match Passage::parse(&v11n, text) {
            Ok(passage) => {
                self.show_link(None, Key::Passage(passage), true);
                true
            }
            Err(e) => {
                tracing::debug!("[LinkControl] '{text}' is not a reference: {e}");
                false
            }
        }
    }

    /// Follow a link from the link context menu: the chosen mode applies to this link only.
    pub fn activate_with_mode(&mut self, mode: WindowMode, link: &BibleLink) -> bool {
        self.window_mode = mode;
        let shown = self.load_application_url(link);
        self.window_mode = WindowMode::Undefined;
        shown
    }

    /// The renderer reported an internal error.
    pub fn error_link(&self) {
        self.reporter.show_error("Error in webview-js");
    }

    /// Search for every occurrence of a Strong's number. `false` when no Bible with Strong's
    /// numbers is available.
    pub fn show_all_occurrences(&self, strongs_ref: &str, section: &SearchBibleSection) -> bool {
        let current = self.windows.current_bible();
        let strongs_bible = match &current {
            Some(bible) if bible.has_feature(Feature::StrongsNumbers) => Some(bible.clone()),
            _ => self.resolver.library().default_bible_with_strongs(),
        };
        let Some(strongs_bible) = strongs_bible else {
            self.reporter
                .show_error("No indexed Bible with Strong's numbers is installed");
            return false;
        };

        let uses_current = current
            .as_ref()
            .is_some_and(|c| c.initials() == strongs_bible.initials());
        let needs_index = uses_current && !Self::check_strongs(&strongs_bible);
        if needs_index {
            tracing::info!("Index status is NOT DONE");
        }

        let request = SearchRequest {
            search_text: section.decorate(&format!("strong:{strongs_ref}")),
            search_document: strongs_bible.initials().to_string(),
            target_document: current.map(|c| c.initials().to_string()),
            needs_index,
        };
        self.windows.open_search(request);
        true
    }

    /// The Bible is indexed and the index holds typical Greek or Hebrew Strong's numbers.
    fn check_strongs(bible: &DocumentRef) -> bool {
        if bible.index_status() != IndexStatus::Done {
            return false;
        }
        STRONGS_INDEX_SAMPLES
            .iter()
            .any(|sample| match bible.find(sample) {
                Ok(hits) => hits > 0,
                Err(e) => {
                    tracing::error!("Error checking strongs numbers: {e}");
                    false
                }
            })
    }
}
