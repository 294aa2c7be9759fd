//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use andbible_core::{
    bookmark::{Label, MemoryBookmarkStore},
    commands::RendererCommand,
    config::{MemorySettings, Settings},
    document::DocumentLibrary,
    library::MemoryLibrary,
    renderer::{Renderer, RendererMessage},
    router::{ErrorReporter, LinkControl},
    window::WindowRepository,
    AndBibleError,
};
use parking_lot::{Mutex, RwLock};
use std::{path::PathBuf, sync::Arc};
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

pub const LIBRARY_TOML: &str = r#"
[[versifications]]
name = "KJV"
books = [
    { osis = "Gen", name = "Gen", aliases = ["Genesis"], verses = [31, 25, 24, 26, 32] },
    { osis = "Ps", name = "Ps", aliases = ["Psalm", "Psalms"], verses = [6, 12, 8, 8, 12] },
    { osis = "John", name = "John", aliases = ["Jn"], verses = [51, 25, 36, 54, 47] },
]

[[versifications]]
name = "Synodal"
books = [
    { osis = "Gen", name = "Gen", verses = [31, 25, 24, 26, 32] },
    { osis = "John", name = "John", verses = [51, 25, 36, 54, 47] },
    { osis = "Ps", name = "Ps", verses = [6, 13, 9, 9, 13] },
]

[[documents]]
initials = "KJV"
name = "King James Version"
category = "Bible"
features = ["StrongsNumbers"]
versification = "KJV"
index_status = "Done"
search_hits = { "+[Gen 1:1] strong:h7225" = 1 }

[[documents]]
initials = "RST"
category = "Bible"
versification = "Synodal"

[[documents]]
initials = "StrongsGreek"
category = "Dictionary"
features = ["GreekDef"]
entries = ["00025", "00746"]

[[documents]]
initials = "TDNT"
category = "Dictionary"
features = ["GreekDef"]
entries = ["G25"]

[[documents]]
initials = "StrongsHebrew"
category = "Dictionary"
features = ["HebrewDef"]
entries = ["07225"]

[[documents]]
initials = "Robinson"
category = "Dictionary"
features = ["GreekParse"]
entries = ["N-NSM"]

[[documents]]
initials = "UZV"
category = "GeneralBook"
entries = ["Holy Spirit"]

[defaults]
strongs_greek = ["StrongsGreek", "TDNT"]
strongs_hebrew = ["StrongsHebrew"]
robinson = ["Robinson"]
bible_with_strongs = "KJV"
"#;

/// Write the test library manifest into `temp_dir`.
#[allow(dead_code)]
pub fn write_library(temp_dir: &TempDir) -> PathBuf {
    let path = temp_dir.path().join("library.toml");
    std::fs::write(&path, LIBRARY_TOML).unwrap();
    path
}

pub fn test_library() -> Arc<MemoryLibrary> {
    init_logging();
    Arc::new(MemoryLibrary::from_toml(LIBRARY_TOML).unwrap())
}

/// Error reporter that remembers what it was asked to show.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub not_installed: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl ErrorReporter for RecordingReporter {
    fn document_not_installed(&self, initials: &str) {
        self.not_installed.lock().push(initials.to_string());
    }

    fn show_error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }
}

/// Renderer that records everything it is asked to do.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    messages: Mutex<Vec<RendererMessage>>,
}

#[allow(dead_code)]
impl RecordingRenderer {
    pub fn messages(&self) -> Vec<RendererMessage> {
        self.messages.lock().clone()
    }

    pub fn commands(&self) -> Vec<RendererCommand> {
        self.messages
            .lock()
            .iter()
            .filter_map(|m| match m {
                RendererMessage::Execute(cmd) => Some(cmd.clone()),
                RendererMessage::LoadShell(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl Renderer for RecordingRenderer {
    fn load_shell(&self, url: &str) -> Result<(), AndBibleError> {
        self.messages
            .lock()
            .push(RendererMessage::LoadShell(url.to_string()));
        Ok(())
    }

    fn execute(&self, command: RendererCommand) -> Result<(), AndBibleError> {
        self.messages.lock().push(RendererMessage::Execute(command));
        Ok(())
    }
}

/// A router over a fresh window repository showing KJV.
#[allow(dead_code)]
pub struct Navigation {
    pub library: Arc<MemoryLibrary>,
    pub windows: Arc<RwLock<WindowRepository>>,
    pub settings: Arc<MemorySettings>,
    pub reporter: Arc<RecordingReporter>,
    pub bookmarks: Arc<MemoryBookmarkStore>,
    pub links: LinkControl,
}

#[allow(dead_code)]
impl Navigation {
    pub fn new(open_links_in_special_window: bool) -> Self {
        let library = test_library();
        let windows = Arc::new(RwLock::new(WindowRepository::new(
            library.document_by_initials("KJV"),
            None,
        )));
        let settings = Arc::new(MemorySettings::new(Settings {
            open_links_in_special_window,
            ..Settings::default()
        }));
        let reporter = Arc::new(RecordingReporter::default());
        let bookmarks = Arc::new(MemoryBookmarkStore::new());
        bookmarks.add_label(Label::new(12, "Sermon notes"));
        let links = LinkControl::new(
            library.clone(),
            windows.clone(),
            settings.clone(),
            reporter.clone(),
            bookmarks.clone(),
        );
        Navigation {
            library,
            windows,
            settings,
            reporter,
            bookmarks,
            links,
        }
    }

    pub fn window_count(&self) -> usize {
        self.windows.read().windows().len()
    }

    /// Initials and key name shown in the active window.
    pub fn active_shows(&self) -> (Option<String>, Option<String>) {
        let repo = self.windows.read();
        let window = repo.active_window();
        (
            window.document.as_ref().map(|d| d.initials().to_string()),
            window.key.as_ref().map(|k| k.name()),
        )
    }
}
