use std::fmt::{Display, Formatter};

use crate::{versification::Verse, window::WindowId};

/// Window-level events delivered to every content view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// The active window changed; views of other windows stop reporting scroll positions.
    CurrentWindowChanged(WindowId),
    /// Keep a secondary window in step with the verse shown in the active one.
    ScrollSecondaryWindow { window: WindowId, verse: Verse },
    NumberOfWindowsChanged,
    FullScreen(bool),
    /// Screen rotation or similar; window geometry is rechecked on the next size change.
    ConfigurationChanged,
    /// A window separator is being dragged, `finished` once it is released.
    WindowSizeChanged { finished: bool },
}

impl Display for ViewEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ViewEvent::CurrentWindowChanged(id) => write!(f, "CurrentWindowChanged({id})"),
            ViewEvent::ScrollSecondaryWindow { window, verse } => {
                write!(f, "ScrollSecondaryWindow({window}, {verse})")
            }
            ViewEvent::NumberOfWindowsChanged => write!(f, "NumberOfWindowsChanged"),
            ViewEvent::FullScreen(on) => write!(f, "FullScreen({on})"),
            ViewEvent::ConfigurationChanged => write!(f, "ConfigurationChanged"),
            ViewEvent::WindowSizeChanged { finished } => {
                write!(f, "WindowSizeChanged(finished: {finished})")
            }
        }
    }
}
