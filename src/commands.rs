use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::{config::TextDisplaySettings, error::AndBibleError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientBookmarkStyle {
    pub color: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientBookmarkLabel {
    pub id: i64,
    pub style: Option<ClientBookmarkStyle>,
}

/// Bookmark as the renderer sees it: `range` holds the start and end verse ordinals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientBookmark {
    pub id: i64,
    pub range: [u32; 2],
    pub labels: Vec<i64>,
}

/// Document content keyed by the chapter it was rendered for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacePayload {
    pub key: Option<u16>,
    pub content: String,
    pub bookmarks: Vec<ClientBookmark>,
    pub bookmark_labels: Vec<ClientBookmarkLabel>,
}

/// Where the renderer positions freshly replaced content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupPayload {
    pub jump_to_ordinal: Option<u32>,
    pub jump_to_y_offset_ratio: Option<f32>,
    pub tool_bar_offset: f32,
}

/// One chapter appended to, or prepended to, the loaded content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertPayload {
    pub key: u16,
    pub content: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolbarOffsetMode {
    #[default]
    Animated,
    Immediate,
    DoNotScroll,
}

/// Command interface between a content view and its embedded web renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RendererCommand {
    /// Full content replacement: title, display config, content and initial position.
    Replace {
        title: String,
        config: TextDisplaySettings,
        osis: ReplacePayload,
        setup: SetupPayload,
    },
    SetConfig(TextDisplaySettings),
    InsertAtTop(InsertPayload),
    InsertAtEnd(InsertPayload),
    /// `anchor` is the renderer's verse element id, `v-<ordinal>`.
    ScrollToVerse {
        anchor: String,
        now: bool,
        toolbar_offset: f32,
    },
    SetToolbarOffset {
        offset: f32,
        mode: ToolbarOffsetMode,
    },
    HighlightVerse {
        id: String,
        start: bool,
        offset: f32,
    },
    UnhighlightVerse(String),
    ClearVerseHighlight,
    EnableVerseTouchSelection,
    DisableVerseTouchSelection,
    RegisterVersePositions,
}

fn js<T: Serialize>(value: &T) -> Result<String, AndBibleError> {
    Ok(serde_json::to_string(value)?)
}

impl RendererCommand {
    /// Render the command as the JavaScript evaluated inside the web view.
    pub fn to_javascript(&self) -> Result<String, AndBibleError> {
        let script = match self {
            RendererCommand::Replace {
                title,
                config,
                osis,
                setup,
            } => [
                format!("bibleView.setTitle({});", js(title)?),
                format!("bibleView.setConfig({});", js(config)?),
                format!("bibleView.replaceOsis({});", js(osis)?),
                format!("bibleView.setupContent({});", js(setup)?),
            ]
            .join("\n"),
            RendererCommand::SetConfig(config) => {
                format!("bibleView.setConfig({});", js(config)?)
            }
            RendererCommand::InsertAtTop(payload) => {
                format!("bibleView.insertThisTextAtTop({});", js(payload)?)
            }
            RendererCommand::InsertAtEnd(payload) => {
                format!("bibleView.insertThisTextAtEnd({});", js(payload)?)
            }
            RendererCommand::ScrollToVerse {
                anchor,
                now,
                toolbar_offset,
            } => format!(
                "bibleView.scrollToVerse({}, {now}, {toolbar_offset});",
                js(anchor)?
            ),
            RendererCommand::SetToolbarOffset { offset, mode } => match mode {
                ToolbarOffsetMode::Animated => format!("bibleView.setToolbarOffset({offset});"),
                ToolbarOffsetMode::Immediate => {
                    format!("bibleView.setToolbarOffset({offset}, {{immediate: true}});")
                }
                ToolbarOffsetMode::DoNotScroll => {
                    format!("bibleView.setToolbarOffset({offset}, {{doNotScroll: true}});")
                }
            },
            RendererCommand::HighlightVerse { id, start, offset } => {
                format!("highlightVerse({}, {start}, {offset});", js(id)?)
            }
            RendererCommand::UnhighlightVerse(id) => format!("unhighlightVerse({});", js(id)?),
            RendererCommand::ClearVerseHighlight => "clearVerseHighlight();".to_string(),
            RendererCommand::EnableVerseTouchSelection => {
                "enableVerseTouchSelection();".to_string()
            }
            RendererCommand::DisableVerseTouchSelection => {
                "disableVerseTouchSelection();".to_string()
            }
            RendererCommand::RegisterVersePositions => "registerVersePositions();".to_string(),
        };
        Ok(script)
    }
}

impl Display for RendererCommand {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            RendererCommand::Replace { title, osis, setup, .. } => write!(
                f,
                "Replace({title}, chapter: {:?}, {} bookmarks, jump: {:?})",
                osis.key,
                osis.bookmarks.len(),
                setup.jump_to_ordinal
            ),
            RendererCommand::SetConfig(_) => write!(f, "SetConfig"),
            RendererCommand::InsertAtTop(p) => write!(f, "InsertAtTop({})", p.key),
            RendererCommand::InsertAtEnd(p) => write!(f, "InsertAtEnd({})", p.key),
            RendererCommand::ScrollToVerse { anchor, now, .. } => {
                write!(f, "ScrollToVerse({anchor}, now: {now})")
            }
            RendererCommand::SetToolbarOffset { offset, mode } => {
                write!(f, "SetToolbarOffset({offset}, {mode:?})")
            }
            RendererCommand::HighlightVerse { id, start, .. } => {
                write!(f, "HighlightVerse({id}, start: {start})")
            }
            RendererCommand::UnhighlightVerse(id) => write!(f, "UnhighlightVerse({id})"),
            RendererCommand::ClearVerseHighlight => write!(f, "ClearVerseHighlight"),
            RendererCommand::EnableVerseTouchSelection => write!(f, "EnableVerseTouchSelection"),
            RendererCommand::DisableVerseTouchSelection => write!(f, "DisableVerseTouchSelection"),
            RendererCommand::RegisterVersePositions => write!(f, "RegisterVersePositions"),
        }
    }
}
