//! Windows and the repository that orders them.
//!
//! [`WindowRepository`] is the in-process window manager: it owns every [`Window`], knows which
//! one is active, whether the layout is maximized, and which window (if any) is the dedicated
//! links window. It is shared as `Arc<RwLock<WindowRepository>>`; the lock implements
//! [`WindowControl`] for the navigation router and [`PageSource`] for content views, so views only
//! ever hold a [`WindowId`].
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    bibleview::{PageSource, PageState},
    config::TextDisplaySettings,
    document::{BookCategory, Document, DocumentRef, Key},
    event::ViewEvent,
    router::SearchRequest,
    versification::Verse,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u32);

impl Display for WindowId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Window {
    pub id: WindowId,
    /// Bible shown when the window displays a plain Bible reference.
    pub current_bible: Option<DocumentRef>,
    pub document: Option<DocumentRef>,
    pub key: Option<Key>,
    pub visible: bool,
    pub is_links_window: bool,
    /// Set while the window layout is being restored; scrolls jump instead of animating.
    pub restore_ongoing: bool,
    pub y_offset_ratio: Option<f32>,
}

impl Window {
    fn new(id: WindowId, current_bible: Option<DocumentRef>) -> Self {
        Window {
            id,
            document: current_bible.clone(),
            current_bible,
            key: None,
            visible: true,
            is_links_window: false,
            restore_ongoing: false,
            y_offset_ratio: None,
        }
    }

    /// Show `key`. Without a document the key opens in the window's current Bible.
    fn set_document_and_key(&mut self, document: Option<DocumentRef>, key: Key) {
        match document {
            Some(doc) => {
                if doc.category() == BookCategory::Bible {
                    self.current_bible = Some(doc.clone());
                }
                self.document = Some(doc);
            }
            None => self.document = self.current_bible.clone(),
        }
        self.key = Some(key);
        self.y_offset_ratio = None;
    }

    pub fn is_bible_shown(&self) -> bool {
        match &self.document {
            Some(doc) => doc.category() == BookCategory::Bible,
            None => self.key.as_ref().and_then(Key::first_verse).is_some(),
        }
    }

    /// Verse the window is positioned at, for Bible pages.
    pub fn current_verse(&self) -> Option<Verse> {
        if !self.is_bible_shown() {
            return None;
        }
        self.key.as_ref().and_then(Key::first_verse).cloned()
    }

    pub fn summary(&self, active: WindowId) -> WindowSummary {
        WindowSummary {
            id: self.id,
            document: self.document.as_ref().map(|d| d.initials().to_string()),
            key: self.key.as_ref().map(Key::name),
            visible: self.visible,
            is_links_window: self.is_links_window,
            active: self.id == active,
        }
    }
}

/// Serializable snapshot of a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub id: WindowId,
    pub document: Option<String>,
    pub key: Option<String>,
    pub visible: bool,
    pub is_links_window: bool,
    pub active: bool,
}

/// Window management operations the navigation router depends on.
pub trait WindowControl: Send + Sync {
    fn is_maximized(&self) -> bool;

    fn active_window(&self) -> WindowId;

    /// Bible of the active window, falling back to the default Bible.
    fn current_bible(&self) -> Option<DocumentRef>;

    fn add_new_window(&self, document: Option<DocumentRef>, key: Key) -> WindowId;

    /// Show `key` in the dedicated links window, creating it on first use.
    fn show_link(&self, document: Option<DocumentRef>, key: Key) -> WindowId;

    fn set_current_document_and_key(&self, document: Option<DocumentRef>, key: Key) -> WindowId;

    fn open_search(&self, request: SearchRequest);
}

#[derive(Debug)]
pub struct WindowRepository {
    windows: Vec<Window>,
    active: WindowId,
    next_id: u32,
    maximized: bool,
    full_screen: bool,
    split_vertically: bool,
    toolbar_offset: f32,
    default_bible: Option<DocumentRef>,
    display: TextDisplaySettings,
    searches: Vec<SearchRequest>,
    tx: Option<UnboundedSender<ViewEvent>>,
}

impl WindowRepository {
    /// A repository holding one window showing `default_bible`.
    pub fn new(
        default_bible: Option<DocumentRef>,
        tx: Option<UnboundedSender<ViewEvent>>,
    ) -> Self {
        let first = Window::new(WindowId(1), default_bible.clone());
        WindowRepository {
            active: first.id,
            windows: vec![first],
            next_id: 2,
            maximized: false,
            full_screen: false,
            split_vertically: true,
            toolbar_offset: 0.0,
            default_bible,
            display: TextDisplaySettings::default(),
            searches: Vec::new(),
            tx,
        }
    }

    fn emit(&self, event: ViewEvent) {
        if let Some(tx) = &self.tx {
            if let Err(e) = tx.send(event) {
                tracing::debug!("[WindowRepository] no event listener: {}", e.0);
            }
        }
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.iter().find(|w| w.id == id)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.iter_mut().find(|w| w.id == id)
    }

    /// Remember how far a non-Bible page was scrolled, restored the next time it is shown.
    /// Cleared again whenever the window navigates elsewhere.
    pub fn set_y_offset_ratio(&mut self, id: WindowId, ratio: f32) {
        match self.window_mut(id) {
            Some(window) => window.y_offset_ratio = Some(ratio),
            None => tracing::warn!("[WindowRepository] no window {id} to scroll"),
        }
    }

    pub fn active(&self) -> WindowId {
        self.active
    }

    pub fn active_window(&self) -> &Window {
        self.window(self.active)
            .unwrap_or(&self.windows[0])
    }

    pub fn set_active(&mut self, id: WindowId) {
        if self.active != id && self.window(id).is_some() {
            self.active = id;
            self.emit(ViewEvent::CurrentWindowChanged(id));
        }
    }

    pub fn links_window(&self) -> Option<&Window> {
        self.windows.iter().find(|w| w.is_links_window)
    }

    pub fn is_maximized(&self) -> bool {
        self.maximized
    }

    pub fn set_maximized(&mut self, maximized: bool) {
        self.maximized = maximized;
    }

    pub fn set_full_screen(&mut self, full_screen: bool) {
        if self.full_screen != full_screen {
            self.full_screen = full_screen;
            self.emit(ViewEvent::FullScreen(full_screen));
        }
    }

    pub fn set_split_vertically(&mut self, split_vertically: bool) {
        self.split_vertically = split_vertically;
    }

    pub fn set_toolbar_offset(&mut self, offset: f32) {
        self.toolbar_offset = offset;
    }

    pub fn set_display_settings(&mut self, display: TextDisplaySettings) {
        self.display = display;
    }

    pub fn default_bible(&self) -> Option<&DocumentRef> {
        self.default_bible.as_ref()
    }

    /// Search requests handed over by the router, oldest first.
    pub fn searches(&self) -> &[SearchRequest] {
        &self.searches
    }

    pub fn summaries(&self) -> Vec<WindowSummary> {
        self.windows.iter().map(|w| w.summary(self.active)).collect()
    }

    fn first_visible(&self) -> Option<WindowId> {
        self.windows.iter().find(|w| w.visible).map(|w| w.id)
    }

    fn add_window(&mut self, document: Option<DocumentRef>, key: Key) -> WindowId {
        let id = WindowId(self.next_id);
        self.next_id += 1;
        let mut window = Window::new(id, self.current_bible());
        window.set_document_and_key(document, key);
        self.windows.push(window);
        self.emit(ViewEvent::NumberOfWindowsChanged);
        id
    }

    fn current_bible(&self) -> Option<DocumentRef> {
        self.active_window()
            .current_bible
            .clone()
            .or_else(|| self.default_bible.clone())
    }

    pub fn add_new_window(&mut self, document: Option<DocumentRef>, key: Key) -> WindowId {
        let id = self.add_window(document, key);
        tracing::debug!("[WindowRepository] opened window {id}");
        self.set_active(id);
        id
    }

    pub fn show_link(&mut self, document: Option<DocumentRef>, key: Key) -> WindowId {
        let existing = self.links_window().map(|w| w.id);
        let id = match existing {
            Some(id) => {
                if let Some(window) = self.window_mut(id) {
                    window.set_document_and_key(document, key);
                    window.visible = true;
                }
                id
            }
            None => {
                let id = self.add_window(document, key);
                if let Some(window) = self.window_mut(id) {
                    window.is_links_window = true;
                }
                tracing::debug!("[WindowRepository] created links window {id}");
                id
            }
        };
        self.set_active(id);
        id
    }

    pub fn set_current_document_and_key(
        &mut self,
        document: Option<DocumentRef>,
        key: Key,
    ) -> WindowId {
        let active = self.active;
        if let Some(window) = self.window_mut(active) {
            window.set_document_and_key(document, key);
        }
        active
    }

    pub fn page_state(&self, id: WindowId) -> Option<PageState> {
        let window = self.window(id)?;
        let is_top_window = !self.split_vertically || self.first_visible() == Some(id);
        Some(PageState {
            is_bible: window.is_bible_shown(),
            current_verse: window.current_verse(),
            y_offset_ratio: window.y_offset_ratio,
            restore_ongoing: window.restore_ongoing,
            visible: window.visible,
            is_active: self.active == id,
            is_top_window,
            full_screen: self.full_screen,
            toolbar_offset: if is_top_window && !self.full_screen {
                self.toolbar_offset
            } else {
                0.0
            },
            display: self.display.clone(),
        })
    }
}

impl WindowControl for RwLock<WindowRepository> {
    fn is_maximized(&self) -> bool {
        self.read().is_maximized()
    }

    fn active_window(&self) -> WindowId {
        self.read().active()
    }

    fn current_bible(&self) -> Option<DocumentRef> {
        self.read().current_bible()
    }

    fn add_new_window(&self, document: Option<DocumentRef>, key: Key) -> WindowId {
        self.write().add_new_window(document, key)
    }

    fn show_link(&self, document: Option<DocumentRef>, key: Key) -> WindowId {
        self.write().show_link(document, key)
    }

    fn set_current_document_and_key(&self, document: Option<DocumentRef>, key: Key) -> WindowId {
        self.write().set_current_document_and_key(document, key)
    }

    fn open_search(&self, request: SearchRequest) {
        tracing::info!("Search text: {}", request.search_text);
        self.write().searches.push(request);
    }
}

impl PageSource for RwLock<WindowRepository> {
    fn page_state(&self, window: WindowId) -> Option<PageState> {
        self.read().page_state(window)
    }
}
