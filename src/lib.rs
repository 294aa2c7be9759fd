//! # andbible-core
//!
//! Link resolution, window navigation and web content-view synchronization for the AndBible Bible
//! study application.
//!
//! ## Overview
//!
//! Rendered Bible text is full of links: cross references (`bible:John.3.16`), Strong's numbers
//! (`gdef:00025`, `hdef:H07225`), morphology codes (`robinson:N-NSM`) and references into other
//! installed documents (`sword://UZV/Holy_32_Spirit`). Following one takes three steps:
//!
//! 1. **Classify** the link string ([`link::UriAnalyzer`]).
//! 2. **Resolve** it into concrete document keys ([`resolver::KeyResolver`]). Strong's numbers are
//!    keyed differently by different dictionaries, so the resolver tries several encodings and
//!    remembers which one each dictionary uses.
//! 3. **Route** the result to a window ([`router::LinkControl`]): the active window, the dedicated
//!    links window, or a new one, depending on the current [`router::WindowMode`] and the user's
//!    preference.
//!
//! Each window displays its content through a [`bibleview::BibleView`], which keeps an embedded
//! web renderer in sync: it buffers content until the renderer shell is ready, tracks which
//! chapters are loaded for infinite scrolling, and issues scroll, highlight and bookmark commands
//! ([`commands::RendererCommand`]).
//!
//! ## Architecture
//!
//! - **[`versification`]**: books, verses, verse ranges, passages and reference parsing
//! - **[`document`]**: the `Document` / `DocumentLibrary` seam, keys and resolved keys
//! - **[`library`]**: in-memory documents, loadable from a TOML manifest
//! - **[`link`]**: link classification
//! - **[`resolver`]**: link to key resolution
//! - **[`router`]**: navigation routing and Strong's occurrence searches
//! - **[`window`]**: the window repository
//! - **[`bibleview`]**: the content view state machine
//! - **[`commands`]** / **[`renderer`]**: the renderer protocol and transport
//! - **[`bookmark`]**, **[`config`]**, **[`event`]**: bookmarks, settings and window events
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use andbible_core::{
//!     bookmark::MemoryBookmarkStore,
//!     config::MemorySettings,
//!     document::DocumentLibrary,
//!     library::MemoryLibrary,
//!     link::BibleLink,
//!     router::{LinkControl, LogReporter},
//!     window::WindowRepository,
//! };
//! use parking_lot::RwLock;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let library = Arc::new(MemoryLibrary::load("library.toml")?);
//!     let windows = Arc::new(RwLock::new(WindowRepository::new(
//!         library.default_bible_with_strongs(),
//!         None,
//!     )));
//!     let links = LinkControl::new(
//!         library,
//!         windows.clone(),
//!         Arc::new(MemorySettings::default()),
//!         Arc::new(LogReporter),
//!         Arc::new(MemoryBookmarkStore::new()),
//!     );
//!
//!     if links.load_application_url(&BibleLink::new("bible:John.3.16", "KJV")) {
//!         for window in windows.read().summaries() {
//!             println!("{window:?}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
pub mod bibleview;
pub mod bookmark;
pub mod commands;
pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod library;
pub mod link;
pub mod renderer;
pub mod resolver;
pub mod router;
#[cfg(test)]
mod tests;
pub mod versification;
pub mod window;

pub use error::*;
