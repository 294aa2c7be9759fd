//! Bookmarks and labels as read by the content views and the router.
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::commands::{ClientBookmark, ClientBookmarkLabel, ClientBookmarkStyle};

/// Id of the synthetic label given to bookmarks that have none.
pub const UNLABELLED_LABEL_ID: i64 = -1;
pub const UNLABELLED_LABEL_NAME: &str = "__UNLABELLED__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: i64,
    pub name: String,
    /// RGB(A) components.
    #[serde(default)]
    pub color: Option<Vec<i32>>,
}

impl Label {
    pub fn new(id: i64, name: &str) -> Self {
        Label {
            id,
            name: name.to_string(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: &[i32]) -> Self {
        self.color = Some(color.to_vec());
        self
    }

    pub fn unlabelled() -> Self {
        Label::new(UNLABELLED_LABEL_ID, UNLABELLED_LABEL_NAME)
    }

    pub fn to_client(&self) -> ClientBookmarkLabel {
        ClientBookmarkLabel {
            id: self.id,
            style: self
                .color
                .as_ref()
                .map(|color| ClientBookmarkStyle {
                    color: color.clone(),
                }),
        }
    }
}

/// A bookmarked verse range, addressed by verse ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i64,
    pub ordinal_start: u32,
    pub ordinal_end: u32,
}

impl Bookmark {
    pub fn new(id: i64, ordinal_start: u32, ordinal_end: u32) -> Self {
        Bookmark {
            id,
            ordinal_start,
            ordinal_end,
        }
    }
}

/// Read access to persisted bookmarks and labels.
pub trait BookmarkStore: Send + Sync {
    fn all_labels(&self) -> Vec<Label>;

    fn labels_for_bookmark(&self, bookmark: &Bookmark) -> Vec<Label>;

    fn unlabelled_label(&self) -> Label {
        Label::unlabelled()
    }

    fn label_by_id(&self, id: i64) -> Option<Label>;

    /// Renderer form of `bookmark`. A bookmark without labels carries the unlabelled label.
    fn client_bookmark(&self, bookmark: &Bookmark) -> ClientBookmark {
        let mut labels = self
            .labels_for_bookmark(bookmark)
            .iter()
            .map(|l| l.id)
            .collect::<Vec<i64>>();
        if labels.is_empty() {
            labels.push(self.unlabelled_label().id);
        }
        ClientBookmark {
            id: bookmark.id,
            range: [bookmark.ordinal_start, bookmark.ordinal_end],
            labels,
        }
    }
}

#[derive(Debug, Default)]
struct BookmarkTables {
    labels: BTreeMap<i64, Label>,
    assignments: HashMap<i64, Vec<i64>>,
}

#[derive(Debug, Default)]
pub struct MemoryBookmarkStore {
    tables: RwLock<BookmarkTables>,
}

impl MemoryBookmarkStore {
    pub fn new() -> Self {
        MemoryBookmarkStore::default()
    }

    pub fn add_label(&self, label: Label) {
        self.tables.write().labels.insert(label.id, label);
    }

    pub fn assign(&self, bookmark: &Bookmark, label_ids: &[i64]) {
        self.tables
            .write()
            .assignments
            .insert(bookmark.id, label_ids.to_vec());
    }
}

impl BookmarkStore for MemoryBookmarkStore {
    fn all_labels(&self) -> Vec<Label> {
        let mut labels = self
            .tables
            .read()
            .labels
            .values()
            .cloned()
            .collect::<Vec<Label>>();
        if !labels.iter().any(|l| l.id == UNLABELLED_LABEL_ID) {
            labels.push(self.unlabelled_label());
        }
        labels
    }

    fn labels_for_bookmark(&self, bookmark: &Bookmark) -> Vec<Label> {
        let tables = self.tables.read();
        tables
            .assignments
            .get(&bookmark.id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| tables.labels.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn label_by_id(&self, id: i64) -> Option<Label> {
        self.tables.read().labels.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn unlabelled_bookmarks_get_the_synthetic_label() {
        let store = MemoryBookmarkStore::new();
        store.add_label(Label::new(5, "Prayer").with_color(&[0, 128, 255]));
        let labelled = Bookmark::new(1, 10, 12);
        let bare = Bookmark::new(2, 20, 20);
        store.assign(&labelled, &[5, 99]);

        assert_eq!(store.client_bookmark(&labelled).labels, vec![5]);
        let client = store.client_bookmark(&bare);
        assert_eq!(client.labels, vec![UNLABELLED_LABEL_ID]);
        assert_eq!(client.range, [20, 20]);

        let labels = store.all_labels();
        assert_eq!(labels.len(), 2);
        assert_eq!(
            labels[0].to_client().style.unwrap().color,
            vec![0, 128, 255]
        );
        assert!(labels[1].to_client().style.is_none());
    }
}
