//! Content view synchronization between a window and its embedded web renderer.
//!
//! A [`BibleView`] drives one renderer through a small state machine:
//!
//! ```text
//! Uninitialized --initialise--> Loading --show--> ContentPending
//!                                  |                    |
//!                             shell ready          shell ready (flush)
//!                                  v                    v
//!                              ContentVisible <---------+
//! ```
//!
//! Content handed to [`BibleView::show`] before the shell page has loaded is buffered, and a later
//! `show` replaces the buffer entirely. The buffer is flushed exactly once, when the shell reports
//! ready. Once visible, every `show` flushes immediately.
//!
//! The view also tracks which chapters the renderer currently holds, so infinite scrolling can ask
//! [`BibleView::has_chapter_loaded`] before fetching a neighbouring chapter.
//!
//! State is guarded by a mutex since `show` may be called from a worker thread while shell
//! callbacks arrive on the UI thread. The lock is released before anything reaches the renderer,
//! and every renderer call is marshalled onto the UI thread.
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{
    bookmark::{Bookmark, BookmarkStore, Label},
    commands::{
        ClientBookmark, ClientBookmarkLabel, InsertPayload, RendererCommand, ReplacePayload,
        SetupPayload, ToolbarOffsetMode,
    },
    config::TextDisplaySettings,
    error::AndBibleError,
    event::ViewEvent,
    renderer::{Renderer, UiThread},
    versification::{ChapterVerse, Verse},
    window::WindowId,
};

/// What a content view needs to know about the window it belongs to.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PageState {
    pub is_bible: bool,
    /// Reading position of a Bible page.
    pub current_verse: Option<Verse>,
    /// Reading position of any other page, as a fraction of its height.
    pub y_offset_ratio: Option<f32>,
    pub restore_ongoing: bool,
    pub visible: bool,
    pub is_active: bool,
    pub is_top_window: bool,
    pub full_screen: bool,
    pub toolbar_offset: f32,
    pub display: TextDisplaySettings,
}

/// Window lookup by id.
pub trait PageSource: Send + Sync {
    fn page_state(&self, window: WindowId) -> Option<PageState>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewState {
    #[default]
    Uninitialized,
    Loading,
    ContentPending,
    ContentVisible,
    Destroyed,
}

/// Inclusive range of chapters held by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterBounds {
    pub min: u16,
    pub max: u16,
}

impl ChapterBounds {
    pub fn single(chapter: u16) -> Self {
        ChapterBounds {
            min: chapter,
            max: chapter,
        }
    }

    pub fn contains(&self, chapter: u16) -> bool {
        (self.min..=self.max).contains(&chapter)
    }

    /// Widen to include `chapter`. `false` if it was already inside.
    pub fn include(&mut self, chapter: u16) -> bool {
        if chapter < self.min {
            self.min = chapter;
        } else if chapter > self.max {
            self.max = chapter;
        } else {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone)]
struct PendingContent {
    content: String,
    bookmarks: Vec<Bookmark>,
}

#[derive(Debug, Default)]
struct ViewInner {
    state: ViewState,
    bounds: Option<ChapterBounds>,
    content_visible: bool,
    pending: Option<PendingContent>,
    initial_verse: Option<Verse>,
    y_offset_ratio: Option<f32>,
    shown_once: bool,
    notifications_enabled: bool,
    check_windows: bool,
    separator_moving: bool,
}

impl ViewInner {
    fn add_chapter(&mut self, window: WindowId, chapter: u16) {
        match &mut self.bounds {
            None => self.bounds = Some(ChapterBounds::single(chapter)),
            Some(bounds) => {
                if !bounds.include(chapter) {
                    tracing::debug!("[BibleView {window}] chapter {chapter} already included");
                }
            }
        }
    }
}

/// Snapshot taken under the lock for one full content replacement.
struct Flush {
    payload: PendingContent,
    initial_verse: Option<Verse>,
    y_offset_ratio: Option<f32>,
}

pub struct BibleView {
    window: WindowId,
    shell_url: String,
    inner: Mutex<ViewInner>,
    destroyed: Arc<AtomicBool>,
    renderer: Arc<dyn Renderer>,
    ui: Arc<dyn UiThread>,
    pages: Arc<dyn PageSource>,
    bookmarks: Arc<dyn BookmarkStore>,
}

impl BibleView {
    pub fn new(
        window: WindowId,
        shell_url: &str,
        renderer: Arc<dyn Renderer>,
        ui: Arc<dyn UiThread>,
        pages: Arc<dyn PageSource>,
        bookmarks: Arc<dyn BookmarkStore>,
    ) -> Self {
        BibleView {
            window,
            shell_url: shell_url.to_string(),
            inner: Mutex::new(ViewInner::default()),
            destroyed: Arc::new(AtomicBool::new(false)),
            renderer,
            ui,
            pages,
            bookmarks,
        }
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn state(&self) -> ViewState {
        self.inner.lock().state
    }

    pub fn chapter_bounds(&self) -> Option<ChapterBounds> {
        self.inner.lock().bounds
    }

    pub fn is_content_visible(&self) -> bool {
        self.inner.lock().content_visible
    }

    /// Whether scroll position reports from the renderer should be acted on.
    pub fn notifications_enabled(&self) -> bool {
        self.inner.lock().notifications_enabled
    }

    pub fn has_chapter_loaded(&self, chapter: u16) -> bool {
        self.inner
            .lock()
            .bounds
            .is_some_and(|b| b.contains(chapter))
    }

    fn page(&self) -> PageState {
        self.pages.page_state(self.window).unwrap_or_else(|| {
            tracing::warn!("[BibleView {}] window no longer exists", self.window);
            PageState::default()
        })
    }

    /// Start loading the renderer shell. Only the first call has any effect.
    pub fn initialise(&self) {
        {
            let mut inner = self.inner.lock();
            if inner.state != ViewState::Uninitialized {
                tracing::warn!(
                    "[BibleView {}] initialise in state {:?} ignored",
                    self.window,
                    inner.state
                );
                return;
            }
            inner.state = if inner.pending.is_some() {
                ViewState::ContentPending
            } else {
                ViewState::Loading
            };
        }
        let url = self.shell_url.clone();
        self.on_ui_thread("LoadShell", move |renderer| renderer.load_shell(&url));
    }

    /// Hand new content to the view.
    ///
    /// The initial position is `verse` when given. Otherwise, on the first show or when
    /// `update_location` is set, it is the window's reading position: its current verse for Bible
    /// pages, its y-offset ratio for everything else.
    pub fn show(
        &self,
        content: &str,
        bookmarks: Vec<Bookmark>,
        update_location: bool,
        verse: Option<Verse>,
        y_offset_ratio: Option<f32>,
    ) {
        let page = self.page();
        let flush_now = {
            let mut inner = self.inner.lock();
            if inner.state == ViewState::Destroyed {
                tracing::warn!("[BibleView {}] show after destroy ignored", self.window);
                return;
            }
            let mut initial_verse = verse;
            let mut ratio = y_offset_ratio;
            if initial_verse.is_none() && (!inner.shown_once || update_location) {
                if page.is_bible {
                    initial_verse = page.current_verse.clone();
                } else {
                    ratio = page.y_offset_ratio;
                }
            }
            tracing::debug!(
                "[BibleView {}] show {:?}, {ratio:?}, toolbar offset {}",
                self.window,
                initial_verse.as_ref().map(Verse::name),
                page.toolbar_offset
            );
            inner.shown_once = true;
            inner.content_visible = false;
            if let Some(chapter) = initial_verse.as_ref().map(Verse::chapter) {
                inner.add_chapter(self.window, chapter);
            }
            inner.initial_verse = initial_verse;
            inner.y_offset_ratio = ratio;
            inner.pending = Some(PendingContent {
                content: content.to_string(),
                bookmarks,
            });
            match inner.state {
                ViewState::ContentVisible => true,
                ViewState::Loading | ViewState::ContentPending => {
                    inner.state = ViewState::ContentPending;
                    false
                }
                ViewState::Uninitialized | ViewState::Destroyed => false,
            }
        };
        if flush_now {
            self.replace_osis();
        }
    }

    /// The shell page finished loading.
    pub fn on_shell_ready(&self) {
        let flush = {
            let mut inner = self.inner.lock();
            match inner.state {
                ViewState::Loading => {
                    inner.state = ViewState::ContentVisible;
                    inner.content_visible = true;
                    inner.bounds = None;
                    false
                }
                ViewState::ContentPending => true,
                state => {
                    tracing::warn!("[BibleView {}] shell ready in state {state:?}", self.window);
                    false
                }
            }
        };
        if flush {
            self.replace_osis();
        }
    }

    fn take_flush(&self) -> Option<Flush> {
        let mut inner = self.inner.lock();
        let payload = inner.pending.take()?;
        inner.state = ViewState::ContentVisible;
        inner.content_visible = true;
        inner.bounds = inner
            .initial_verse
            .as_ref()
            .map(|v| ChapterBounds::single(v.chapter()));
        Some(Flush {
            payload,
            initial_verse: inner.initial_verse.clone(),
            y_offset_ratio: inner.y_offset_ratio,
        })
    }

    /// Replace the renderer content with the buffered payload.
    fn replace_osis(&self) {
        let Some(flush) = self.take_flush() else {
            tracing::debug!("[BibleView {}] nothing to flush", self.window);
            return;
        };
        let page = self.page();
        let bookmark_labels = self
            .bookmarks
            .all_labels()
            .iter()
            .map(Label::to_client)
            .collect::<Vec<ClientBookmarkLabel>>();
        let bookmarks = flush
            .payload
            .bookmarks
            .iter()
            .map(|b| self.bookmarks.client_bookmark(b))
            .collect::<Vec<ClientBookmark>>();
        self.run(RendererCommand::Replace {
            title: format!("BibleView-{}", self.window),
            config: page.display,
            osis: ReplacePayload {
                key: flush.initial_verse.as_ref().map(Verse::chapter),
                content: flush.payload.content,
                bookmarks,
                bookmark_labels,
            },
            setup: SetupPayload {
                jump_to_ordinal: flush.initial_verse.as_ref().map(Verse::ordinal),
                jump_to_y_offset_ratio: flush.y_offset_ratio,
                tool_bar_offset: page.toolbar_offset,
            },
        });
    }

    /// Prepend a chapter while scrolling backwards.
    pub fn insert_text_at_top(&self, chapter: u16, fragment: &str) {
        self.inner.lock().add_chapter(self.window, chapter);
        self.run(RendererCommand::InsertAtTop(InsertPayload {
            key: chapter,
            content: fragment.to_string(),
        }));
    }

    /// Append a chapter while scrolling forwards.
    pub fn insert_text_at_end(&self, chapter: u16, fragment: &str) {
        self.inner.lock().add_chapter(self.window, chapter);
        self.run(RendererCommand::InsertAtEnd(InsertPayload {
            key: chapter,
            content: fragment.to_string(),
        }));
    }

    pub fn scroll_or_jump_to_verse(&self, verse: &Verse) {
        let restore_ongoing = self.page().restore_ongoing;
        self.scroll_to(verse, restore_ongoing);
    }

    fn scroll_to(&self, verse: &Verse, restore_ongoing: bool) {
        let (content_visible, loaded_v11n) = {
            let inner = self.inner.lock();
            (
                inner.content_visible,
                inner
                    .initial_verse
                    .as_ref()
                    .map(|v| v.versification().clone()),
            )
        };
        // Anchors use ordinals of the versification the content was rendered in
        let ordinal = match &loaded_v11n {
            Some(v11n) => verse.to_v11n(v11n).ordinal(),
            None => verse.ordinal(),
        };
        tracing::debug!("[BibleView {}] scroll or jump to: {verse}", self.window);
        self.run(RendererCommand::ScrollToVerse {
            anchor: format!("v-{ordinal}"),
            now: !content_visible || restore_ongoing,
            toolbar_offset: self.page().toolbar_offset,
        });
    }

    pub fn highlight_verse(&self, chapter_verse: ChapterVerse, start: bool) {
        let page = self.page();
        self.run(RendererCommand::HighlightVerse {
            id: chapter_verse.to_html_id(),
            start,
            offset: if page.is_top_window {
                page.toolbar_offset
            } else {
                0.0
            },
        });
    }

    pub fn unhighlight_verse(&self, chapter_verse: ChapterVerse) {
        self.run(RendererCommand::UnhighlightVerse(chapter_verse.to_html_id()));
    }

    pub fn clear_verse_highlight(&self) {
        self.run(RendererCommand::ClearVerseHighlight);
    }

    pub fn enable_verse_touch_selection(&self) {
        self.run(RendererCommand::EnableVerseTouchSelection);
    }

    pub fn disable_verse_touch_selection(&self) {
        self.run(RendererCommand::DisableVerseTouchSelection);
    }

    pub fn update_text_display_settings(&self) {
        self.run(RendererCommand::SetConfig(self.page().display));
    }

    pub fn on_event(&self, event: &ViewEvent) {
        match event {
            ViewEvent::CurrentWindowChanged(active) => {
                self.inner.lock().notifications_enabled = *active == self.window;
            }
            ViewEvent::ScrollSecondaryWindow { window, verse } => {
                if *window == self.window {
                    self.scroll_or_jump_to_verse(verse);
                }
            }
            ViewEvent::ConfigurationChanged => {
                self.inner.lock().check_windows = true;
            }
            ViewEvent::NumberOfWindowsChanged => {
                let page = self.page();
                if page.visible {
                    self.run(RendererCommand::SetToolbarOffset {
                        offset: page.toolbar_offset,
                        mode: ToolbarOffsetMode::Immediate,
                    });
                }
            }
            ViewEvent::FullScreen(_) => {
                let page = self.page();
                if page.is_top_window && page.visible && self.is_content_visible() {
                    self.run(RendererCommand::SetToolbarOffset {
                        offset: page.toolbar_offset,
                        mode: ToolbarOffsetMode::Animated,
                    });
                }
            }
            ViewEvent::WindowSizeChanged { finished } => {
                self.inner.lock().separator_moving = !finished;
                if *finished {
                    self.check_windows(true);
                }
            }
        }
    }

    /// The view was resized by the layout.
    pub fn on_size_changed(&self, width_changed: bool) {
        let (shown_once, separator_moving) = {
            let inner = self.inner.lock();
            (inner.shown_once, inner.separator_moving)
        };
        if shown_once && !separator_moving && width_changed {
            self.check_windows(false);
        }
    }

    /// Re-sync toolbar offset and verse positions after a geometry change.
    fn check_windows(&self, force: bool) {
        let pending_check = std::mem::take(&mut self.inner.lock().check_windows);
        if !(pending_check || force) {
            return;
        }
        let page = self.page();
        self.run(RendererCommand::SetToolbarOffset {
            offset: page.toolbar_offset,
            mode: ToolbarOffsetMode::DoNotScroll,
        });
        if page.is_bible {
            self.run(RendererCommand::RegisterVersePositions);
            if let Some(verse) = &page.current_verse {
                self.scroll_to(verse, true);
            }
        }
    }

    /// Tear the view down. Later commands, including ones already posted, are dropped.
    pub fn destroy(&self) {
        let mut inner = self.inner.lock();
        inner.state = ViewState::Destroyed;
        inner.pending = None;
        inner.content_visible = false;
        self.destroyed.store(true, Ordering::Release);
        tracing::debug!("[BibleView {}] destroyed", self.window);
    }

    fn run(&self, command: RendererCommand) {
        let label = command.to_string();
        self.on_ui_thread(&label, move |renderer| renderer.execute(command));
    }

    /// Issue a renderer call from the UI thread: inline when already on it, posted otherwise.
    fn on_ui_thread<F>(&self, label: &str, task: F)
    where
        F: FnOnce(&dyn Renderer) -> Result<(), AndBibleError> + Send + 'static,
    {
        if self.destroyed.load(Ordering::Acquire) {
            tracing::warn!("[BibleView {}] dropping {label} after destroy", self.window);
            return;
        }
        let window = self.window;
        let renderer = self.renderer.clone();
        let destroyed = self.destroyed.clone();
        let label = label.to_string();
        let call = move || {
            if destroyed.load(Ordering::Acquire) {
                tracing::warn!("[BibleView {window}] dropping {label} after destroy");
                return;
            }
            tracing::debug!("[BibleView {window}] executing {label}");
            if let Err(e) = task(renderer.as_ref()) {
                tracing::error!("[BibleView {window}] {label} failed: {e}");
            }
        };
        if self.ui.is_ui_thread() {
            call();
        } else {
            self.ui.post(Box::new(call));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bookmark::MemoryBookmarkStore,
        document::{DocumentLibrary, Key},
        renderer::{InlineUi, RendererMessage},
        tests::helpers::{test_library, RecordingRenderer},
        versification::Passage,
        window::WindowRepository,
    };
    use parking_lot::RwLock;
    use test_log::test;

    fn view_on_john_3() -> (BibleView, Arc<RecordingRenderer>, Arc<RwLock<WindowRepository>>) {
        let (library, v11n) = test_library();
        let repo = Arc::new(RwLock::new(WindowRepository::new(
            library.document_by_initials("KJV"),
            None,
        )));
        let passage = Passage::parse(&v11n, "John 3:16").unwrap();
        let id = repo
            .write()
            .set_current_document_and_key(None, Key::Passage(passage));
        let renderer = Arc::new(RecordingRenderer::default());
        let view = BibleView::new(
            id,
            "file:///shell.html",
            renderer.clone(),
            Arc::new(InlineUi),
            repo.clone(),
            Arc::new(MemoryBookmarkStore::new()),
        );
        (view, renderer, repo)
    }

    fn replace_count(renderer: &RecordingRenderer) -> usize {
        renderer
            .commands()
            .iter()
            .filter(|c| matches!(c, RendererCommand::Replace { .. }))
            .count()
    }

    #[test]
    fn content_shown_while_loading_is_flushed_once_on_ready() {
        let (view, renderer, _repo) = view_on_john_3();
        view.initialise();
        assert_eq!(view.state(), ViewState::Loading);
        assert_eq!(
            renderer.messages(),
            vec![RendererMessage::LoadShell("file:///shell.html".to_string())]
        );

        view.show("<p>first</p>", Vec::new(), false, None, None);
        view.show("<p>second</p>", Vec::new(), true, None, None);
        assert_eq!(view.state(), ViewState::ContentPending);
        assert_eq!(replace_count(&renderer), 0);

        view.on_shell_ready();
        assert_eq!(view.state(), ViewState::ContentVisible);
        assert_eq!(replace_count(&renderer), 1);
        match &renderer.commands()[0] {
            RendererCommand::Replace { osis, setup, .. } => {
                assert_eq!(osis.content, "<p>second</p>");
                assert_eq!(osis.key, Some(3));
                assert!(setup.jump_to_ordinal.is_some());
            }
            other => panic!("unexpected {other}"),
        }

        view.on_shell_ready();
        assert_eq!(replace_count(&renderer), 1);
    }

    #[test]
    fn ready_without_content_resets_bounds() {
        let (view, renderer, _repo) = view_on_john_3();
        view.initialise();
        view.on_shell_ready();
        assert_eq!(view.state(), ViewState::ContentVisible);
        assert!(view.is_content_visible());
        assert_eq!(view.chapter_bounds(), None);
        assert_eq!(replace_count(&renderer), 0);

        view.show("<p/>", Vec::new(), false, None, None);
        assert_eq!(replace_count(&renderer), 1);
        assert!(view.has_chapter_loaded(3));
        assert!(!view.has_chapter_loaded(2));
    }

    #[test]
    fn bounds_widen_in_either_direction() {
        let mut bounds = ChapterBounds::single(5);
        assert!(bounds.include(4));
        assert!(bounds.include(7));
        assert!(!bounds.include(6));
        assert_eq!(bounds, ChapterBounds { min: 4, max: 7 });
        assert!(bounds.contains(4) && bounds.contains(7));
        assert!(!bounds.contains(3) && !bounds.contains(8));
    }

    #[test]
    fn first_chapter_starts_the_bounds() {
        let mut inner = ViewInner::default();
        inner.add_chapter(WindowId(1), 3);
        assert_eq!(inner.bounds, Some(ChapterBounds::single(3)));
        inner.add_chapter(WindowId(1), 1);
        inner.add_chapter(WindowId(1), 2);
        assert_eq!(inner.bounds, Some(ChapterBounds { min: 1, max: 3 }));
    }
}
