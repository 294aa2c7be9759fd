//! Shared test fixtures: versifications, a document library and a recording renderer.

use parking_lot::Mutex;
use std::{collections::BTreeMap, sync::Arc};

use crate::{
    commands::RendererCommand,
    document::{BookCategory, Feature, FeatureSet, IndexStatus},
    error::AndBibleError,
    library::{DocumentRecord, LibraryDefaults, MemoryDocument, MemoryLibrary},
    renderer::{Renderer, RendererMessage},
    versification::{BookInfo, Versification},
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A three book versification. `Synodal` lists the same books in another order with slightly
/// different chapter lengths.
pub fn test_v11n(name: &str) -> Arc<Versification> {
    let gen = BookInfo::new("Gen", "Gen", &[31, 25, 24]).with_aliases(&["Genesis", "Ge"]);
    let john = BookInfo::new("John", "John", &[51, 25, 36]).with_aliases(&["Jn", "Joh"]);
    let first_john = BookInfo::new("1John", "1 John", &[10, 29, 24, 21, 21]).with_aliases(&["1Jn"]);
    let books = match name {
        "Synodal" => vec![
            john,
            BookInfo::new("Gen", "Gen", &[31, 25, 25]).with_aliases(&["Genesis"]),
            first_john,
        ],
        _ => vec![gen, john, first_john],
    };
    Arc::new(Versification::new(name, books))
}

fn general_book(initials: &str, entries: &[&str]) -> MemoryDocument {
    MemoryDocument::new(
        DocumentRecord {
            initials: initials.to_string(),
            name: None,
            category: BookCategory::GeneralBook,
            features: FeatureSet::empty(),
            versification: None,
            entries: entries.iter().map(|e| e.to_string()).collect(),
            index_status: IndexStatus::Undone,
            search_hits: BTreeMap::new(),
        },
        None,
    )
}

/// Library with a Strong's Bible (KJV), a plain Bible (NET), Strong's dictionaries in both key
/// styles, two morphology dictionaries and a general book with non-ASCII keys.
pub fn test_library() -> (Arc<MemoryLibrary>, Arc<Versification>) {
    init_logging();
    let kjv_v11n = test_v11n("KJV");
    let mut library = MemoryLibrary::new();
    library.add_versification(kjv_v11n.clone());
    library.add_versification(test_v11n("Synodal"));

    let docs = vec![
        MemoryDocument::bible("KJV", Feature::StrongsNumbers.into(), kjv_v11n.clone())
            .with_index(IndexStatus::Done, &[("+[John 1:1] strong:g746", 1)]),
        MemoryDocument::bible("NET", FeatureSet::empty(), kjv_v11n.clone()),
        MemoryDocument::dictionary("StrongsGreek", Feature::GreekDef.into(), &["00025", "00746"]),
        MemoryDocument::dictionary("StrongsHebrew", Feature::HebrewDef.into(), &["07225"]),
        MemoryDocument::dictionary("MyBibleGreek", Feature::GreekDef.into(), &["G25"]),
        MemoryDocument::dictionary("MyBibleHebrew", Feature::HebrewDef.into(), &["H7225"]),
        MemoryDocument::dictionary("EmptyGreek", Feature::GreekDef.into(), &[]),
        MemoryDocument::dictionary("Robinson", Feature::GreekParse.into(), &["N-NSM", "V-PAI-3S"]),
        MemoryDocument::dictionary("RobinsonAlt", Feature::GreekParse.into(), &["V-PAI-3S"]),
    ];
    for doc in docs {
        library.add_document(Arc::new(doc));
    }
    library.add_document(Arc::new(general_book("UZV", &["Holy Spirit", "Dávid"])));
    library.set_defaults(LibraryDefaults {
        strongs_greek: vec!["StrongsGreek".to_string()],
        strongs_hebrew: vec!["StrongsHebrew".to_string()],
        robinson: vec!["Robinson".to_string(), "RobinsonAlt".to_string()],
        bible_with_strongs: Some("KJV".to_string()),
    });
    (Arc::new(library), kjv_v11n)
}

/// Renderer that records everything it is asked to do.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    messages: Mutex<Vec<RendererMessage>>,
}

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
