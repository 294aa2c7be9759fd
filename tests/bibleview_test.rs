//! Integration tests for content views: renderer command sequencing, UI thread marshalling and
//! window event handling.

mod common;

use andbible_core::{
    bibleview::{BibleView, ChapterBounds, ViewState},
    bookmark::{Bookmark, Label, MemoryBookmarkStore, UNLABELLED_LABEL_ID},
    commands::{RendererCommand, ToolbarOffsetMode},
    config::TextDisplaySettings,
    document::{DocumentLibrary, Key},
    event::ViewEvent,
    library::MemoryLibrary,
    renderer::{InlineUi, UiQueue, UiThread},
    versification::{ChapterVerse, Passage, Verse},
    window::{WindowId, WindowRepository},
};
use common::{test_library, RecordingRenderer};
use parking_lot::RwLock;
use std::sync::Arc;
use test_log::test;
use tokio::sync::mpsc::unbounded_channel;

struct Fixture {
    library: Arc<MemoryLibrary>,
    repo: Arc<RwLock<WindowRepository>>,
    renderer: Arc<RecordingRenderer>,
    bookmarks: Arc<MemoryBookmarkStore>,
}

impl Fixture {
    fn new(repo: WindowRepository) -> Self {
        Fixture {
            library: test_library(),
            repo: Arc::new(RwLock::new(repo)),
            renderer: Arc::new(RecordingRenderer::default()),
            bookmarks: Arc::new(MemoryBookmarkStore::new()),
        }
    }

    fn kjv() -> Self {
        let library = test_library();
        Fixture::new(WindowRepository::new(
            library.document_by_initials("KJV"),
            None,
        ))
    }

    /// Point the active window at `reference` in `initials`.
    fn show_in_active(&self, initials: &str, reference: &str) -> WindowId {
        let bible = self.library.document_by_initials(initials).unwrap();
        let v11n = self.library.versification(bible_v11n(initials)).unwrap();
        let passage = Passage::parse(&v11n, reference).unwrap();
        self.repo
            .write()
            .set_current_document_and_key(Some(bible), Key::Passage(passage))
    }

    fn view(&self, window: WindowId, ui: Arc<dyn UiThread>) -> BibleView {
        BibleView::new(
            window,
            "file:///android_asset/bibleview-js/index.html",
            self.renderer.clone(),
            ui,
            self.repo.clone(),
            self.bookmarks.clone(),
        )
    }

    fn visible_view(&self, window: WindowId) -> BibleView {
        let view = self.view(window, Arc::new(InlineUi));
        view.initialise();
        view.on_shell_ready();
        view
    }
}

fn bible_v11n(initials: &str) -> &'static str {
    match initials {
        "RST" => "Synodal",
        _ => "KJV",
    }
}

fn replaces(renderer: &RecordingRenderer) -> Vec<RendererCommand> {
    renderer
        .commands()
        .into_iter()
        .filter(|c| matches!(c, RendererCommand::Replace { .. }))
        .collect()
}

#[test]
fn show_before_initialise_is_buffered() {
    let fx = Fixture::kjv();
    let window = fx.show_in_active("KJV", "Gen 2:4");
    let view = fx.view(window, Arc::new(InlineUi));

    view.show("<div>Gen 2</div>", Vec::new(), false, None, None);
    assert_eq!(view.state(), ViewState::Uninitialized);
    assert!(fx.renderer.messages().is_empty());

    view.initialise();
    assert_eq!(view.state(), ViewState::ContentPending);
    view.on_shell_ready();
    assert_eq!(view.state(), ViewState::ContentVisible);

    let replaced = replaces(&fx.renderer);
    assert_eq!(replaced.len(), 1);
    let RendererCommand::Replace { osis, setup, .. } = &replaced[0] else {
        unreachable!()
    };
    assert_eq!(osis.content, "<div>Gen 2</div>");
    assert_eq!(osis.key, Some(2));
    let v11n = fx.library.versification("KJV").unwrap();
    assert_eq!(
        setup.jump_to_ordinal,
        Some(Verse::new(&v11n, 0, 2, 4).unwrap().ordinal())
    );
    assert_eq!(setup.jump_to_y_offset_ratio, None);
    assert_eq!(view.chapter_bounds(), Some(ChapterBounds::single(2)));
}

#[test]
fn explicit_verse_wins_over_reading_position() {
    let fx = Fixture::kjv();
    let window = fx.show_in_active("KJV", "Gen 2:4");
    let view = fx.visible_view(window);
    let v11n = fx.library.versification("KJV").unwrap();
    let target = Verse::new(&v11n, 2, 4, 1).unwrap();

    view.show("<div/>", Vec::new(), true, Some(target.clone()), None);
    let replaced = replaces(&fx.renderer);
    let RendererCommand::Replace { osis, setup, .. } = &replaced[0] else {
        unreachable!()
    };
    assert_eq!(osis.key, Some(4));
    assert_eq!(setup.jump_to_ordinal, Some(target.ordinal()));
}

#[test]
fn non_bible_pages_restore_their_offset_ratio() {
    let fx = Fixture::kjv();
    let window = fx.repo.write().add_new_window(
        fx.library.document_by_initials("UZV"),
        Key::Entry("Holy Spirit".to_string()),
    );
    fx.repo.write().set_y_offset_ratio(window, 0.25);
    let view = fx.visible_view(window);

    view.show("<div/>", Vec::new(), false, None, None);
    let replaced = replaces(&fx.renderer);
    let RendererCommand::Replace { osis, setup, .. } = &replaced[0] else {
        unreachable!()
    };
    assert_eq!(osis.key, None);
    assert_eq!(setup.jump_to_ordinal, None);
    assert_eq!(setup.jump_to_y_offset_ratio, Some(0.25));
    assert_eq!(view.chapter_bounds(), None);
}

#[test]
fn infinite_scroll_widens_chapter_bounds() {
    let fx = Fixture::kjv();
    let window = fx.show_in_active("KJV", "Gen 3:1");
    let view = fx.visible_view(window);
    view.show("<div/>", Vec::new(), false, None, None);

    view.insert_text_at_end(4, "<div>Gen 4</div>");
    view.insert_text_at_top(2, "<div>Gen 2</div>");
    view.insert_text_at_top(1, "<div>Gen 1</div>");
    assert_eq!(
        view.chapter_bounds(),
        Some(ChapterBounds { min: 1, max: 4 })
    );
    for chapter in 1..=4 {
        assert!(view.has_chapter_loaded(chapter), "{chapter}");
    }
    assert!(!view.has_chapter_loaded(5));

    let inserts = fx
        .renderer
        .commands()
        .into_iter()
        .filter(|c| {
            matches!(
                c,
                RendererCommand::InsertAtTop(_) | RendererCommand::InsertAtEnd(_)
            )
        })
        .count();
    assert_eq!(inserts, 3);

    // A fresh show starts over from the shown chapter
    view.show("<div/>", Vec::new(), false, None, None);
    assert_eq!(view.chapter_bounds(), Some(ChapterBounds::single(3)));
}

#[test]
fn scroll_anchor_uses_the_loaded_versification() {
    let fx = Fixture::kjv();
    let window = fx.show_in_active("RST", "John 3:1");
    let view = fx.visible_view(window);
    view.show("<div/>", Vec::new(), false, None, None);
    fx.renderer.clear();

    let kjv = fx.library.versification("KJV").unwrap();
    let synodal = fx.library.versification("Synodal").unwrap();
    let john_3_16 = Verse::new(&kjv, 2, 3, 16).unwrap();
    let expected = Verse::new(&synodal, 1, 3, 16).unwrap().ordinal();
    assert_ne!(john_3_16.ordinal(), expected);

    view.scroll_or_jump_to_verse(&john_3_16);
    assert_eq!(
        fx.renderer.commands(),
        vec![RendererCommand::ScrollToVerse {
            anchor: format!("v-{expected}"),
            now: false,
            toolbar_offset: 0.0,
        }]
    );
}

#[test]
fn scrolls_jump_while_restoring_or_hidden() {
    let fx = Fixture::kjv();
    let window = fx.show_in_active("KJV", "John 3:1");
    let view = fx.view(window, Arc::new(InlineUi));
    let v11n = fx.library.versification("KJV").unwrap();
    let verse = Verse::new(&v11n, 2, 3, 5).unwrap();

    view.scroll_or_jump_to_verse(&verse);
    let visible = fx.visible_view(window);
    visible.show("<div/>", Vec::new(), false, None, None);
    fx.repo.write().window_mut(window).unwrap().restore_ongoing = true;
    visible.scroll_or_jump_to_verse(&verse);

    let nows = fx
        .renderer
        .commands()
        .into_iter()
        .filter_map(|c| match c {
            RendererCommand::ScrollToVerse { now, .. } => Some(now),
            _ => None,
        })
        .collect::<Vec<bool>>();
    assert_eq!(nows, vec![true, true]);
}

#[test]
fn bookmarks_carry_labels_or_the_unlabelled_label() {
    let fx = Fixture::kjv();
    fx.bookmarks
        .add_label(Label::new(3, "Promises").with_color(&[255, 0, 0]));
    let labelled = Bookmark::new(10, 5, 7);
    let unlabelled = Bookmark::new(11, 9, 9);
    fx.bookmarks.assign(&labelled, &[3]);

    let window = fx.show_in_active("KJV", "Gen 1:1");
    let view = fx.visible_view(window);
    view.show("<div/>", vec![labelled, unlabelled], false, None, None);

    let replaced = replaces(&fx.renderer);
    let RendererCommand::Replace { osis, .. } = &replaced[0] else {
        unreachable!()
    };
    assert_eq!(osis.bookmarks.len(), 2);
    assert_eq!(osis.bookmarks[0].labels, vec![3]);
    assert_eq!(osis.bookmarks[0].range, [5, 7]);
    assert_eq!(osis.bookmarks[1].labels, vec![UNLABELLED_LABEL_ID]);
    let label_ids = osis
        .bookmark_labels
        .iter()
        .map(|l| l.id)
        .collect::<Vec<i64>>();
    assert_eq!(label_ids, vec![3, UNLABELLED_LABEL_ID]);
    assert_eq!(
        osis.bookmark_labels[0].style.as_ref().map(|s| s.color.clone()),
        Some(vec![255, 0, 0])
    );
}

#[test]
fn commands_from_other_threads_wait_for_the_ui_thread() {
    let fx = Fixture::kjv();
    let window = fx.show_in_active("KJV", "Gen 1:1");
    let ui = Arc::new(UiQueue::new());
    let view = fx.view(window, ui.clone());
    view.initialise();
    view.on_shell_ready();
    assert_eq!(fx.renderer.messages().len(), 1);

    std::thread::scope(|s| {
        s.spawn(|| {
            view.show("<div/>", Vec::new(), false, None, None);
            view.clear_verse_highlight();
        });
    });
    assert!(replaces(&fx.renderer).is_empty());

    assert_eq!(ui.run_pending(), 2);
    let commands = fx.renderer.commands();
    assert_eq!(commands.len(), 2);
    assert!(matches!(commands[0], RendererCommand::Replace { .. }));
    assert_eq!(commands[1], RendererCommand::ClearVerseHighlight);
}

#[test]
fn destroy_drops_posted_commands() {
    let fx = Fixture::kjv();
    let window = fx.show_in_active("KJV", "Gen 1:1");
    let ui = Arc::new(UiQueue::new());
    let view = fx.view(window, ui.clone());
    view.initialise();
    view.on_shell_ready();

    std::thread::scope(|s| {
        s.spawn(|| view.enable_verse_touch_selection());
    });
    view.destroy();
    assert_eq!(view.state(), ViewState::Destroyed);
    assert_eq!(ui.run_pending(), 1);
    assert!(fx.renderer.commands().is_empty());

    view.show("<div/>", Vec::new(), false, None, None);
    view.disable_verse_touch_selection();
    assert_eq!(ui.run_pending(), 0);
    assert!(fx.renderer.commands().is_empty());
}

#[test]
fn window_events_drive_toolbar_and_scrolling() {
    let library = test_library();
    let (tx, mut rx) = unbounded_channel();
    let fx = Fixture::new(WindowRepository::new(
        library.document_by_initials("KJV"),
        Some(tx),
    ));
    fx.repo.write().set_toolbar_offset(48.0);
    let first = fx.show_in_active("KJV", "John 3:1");
    let view = fx.visible_view(first);
    view.show("<div/>", Vec::new(), false, None, None);
    fx.renderer.clear();

    let second = fx
        .repo
        .write()
        .add_new_window(None, Key::Entry("x".to_string()));
    let events = std::iter::from_fn(|| rx.try_recv().ok()).collect::<Vec<ViewEvent>>();
    assert_eq!(
        events,
        vec![
            ViewEvent::NumberOfWindowsChanged,
            ViewEvent::CurrentWindowChanged(second)
        ]
    );
    for event in &events {
        view.on_event(event);
    }
    assert_eq!(
        fx.renderer.commands(),
        vec![RendererCommand::SetToolbarOffset {
            offset: 48.0,
            mode: ToolbarOffsetMode::Immediate,
        }]
    );
    assert!(!view.notifications_enabled());
    view.on_event(&ViewEvent::CurrentWindowChanged(first));
    assert!(view.notifications_enabled());

    fx.renderer.clear();
    let v11n = fx.library.versification("KJV").unwrap();
    let verse = Verse::new(&v11n, 2, 3, 20).unwrap();
    view.on_event(&ViewEvent::ScrollSecondaryWindow {
        window: second,
        verse: verse.clone(),
    });
    assert!(fx.renderer.commands().is_empty());
    view.on_event(&ViewEvent::ScrollSecondaryWindow {
        window: first,
        verse: verse.clone(),
    });
    assert_eq!(
        fx.renderer.commands(),
        vec![RendererCommand::ScrollToVerse {
            anchor: format!("v-{}", verse.ordinal()),
            now: false,
            toolbar_offset: 48.0,
        }]
    );
}

#[test]
fn finished_resize_resyncs_bible_pages() {
    let fx = Fixture::kjv();
    let window = fx.show_in_active("KJV", "John 3:16");
    let view = fx.visible_view(window);
    view.show("<div/>", Vec::new(), false, None, None);
    fx.renderer.clear();

    view.on_event(&ViewEvent::WindowSizeChanged { finished: false });
    view.on_size_changed(true);
    assert!(fx.renderer.commands().is_empty());

    view.on_event(&ViewEvent::WindowSizeChanged { finished: true });
    let commands = fx.renderer.commands();
    assert_eq!(commands.len(), 3);
    assert_eq!(
        commands[0],
        RendererCommand::SetToolbarOffset {
            offset: 0.0,
            mode: ToolbarOffsetMode::DoNotScroll,
        }
    );
    assert_eq!(commands[1], RendererCommand::RegisterVersePositions);
    assert!(matches!(
        commands[2],
        RendererCommand::ScrollToVerse { now: true, .. }
    ));

    // Configuration changes only resync on the next width change
    fx.renderer.clear();
    view.on_size_changed(true);
    assert!(fx.renderer.commands().is_empty());
    view.on_event(&ViewEvent::ConfigurationChanged);
    view.on_size_changed(false);
    assert!(fx.renderer.commands().is_empty());
    view.on_size_changed(true);
    assert_eq!(fx.renderer.commands().len(), 3);
}

#[test]
fn highlights_and_display_settings() {
    let fx = Fixture::kjv();
    fx.repo.write().set_toolbar_offset(32.0);
    let window = fx.show_in_active("KJV", "John 3:16");
    let view = fx.visible_view(window);
    fx.renderer.clear();

    let verse = ChapterVerse {
        chapter: 3,
        verse: 16,
    };
    view.highlight_verse(verse, true);
    view.unhighlight_verse(verse);
    view.clear_verse_highlight();

    let mut display = TextDisplaySettings::default();
    display.font_size = 20;
    fx.repo.write().set_display_settings(display.clone());
    view.update_text_display_settings();

    assert_eq!(
        fx.renderer.commands(),
        vec![
            RendererCommand::HighlightVerse {
                id: "3.16".to_string(),
                start: true,
                offset: 32.0,
            },
            RendererCommand::UnhighlightVerse("3.16".to_string()),
            RendererCommand::ClearVerseHighlight,
            RendererCommand::SetConfig(display),
        ]
    );
}
