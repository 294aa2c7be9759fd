//! andbible CLI tool
//!
//! Command-line interface for trying out link resolution and navigation against a document
//! library described in TOML (see [`andbible_core::library`] for the manifest format).
//!
//! ## Commands
//!
//! - `resolve <link>`: Print the document keys a link resolves to
//! - `navigate <link>...`: Follow links in order and print the resulting windows as JSON

use andbible_core::{
    bookmark::MemoryBookmarkStore,
    config::{MemorySettings, SettingsProvider, TomlSettingsProvider},
    document::DocumentLibrary,
    library::MemoryLibrary,
    link::{BibleLink, UriAnalyzer},
    resolver::KeyResolver,
    router::{LinkControl, LogReporter, WindowMode},
    window::WindowRepository,
};
use clap::{Parser, Subcommand};
use parking_lot::RwLock;
use std::{path::PathBuf, sync::Arc};

#[derive(Parser)]
#[command(name = "andbible")]
#[command(author, version, about = "Resolve and route AndBible links", long_about = None)]
struct Cli {
    /// Library manifest
    #[arg(short, long, global = true, default_value = "library.toml")]
    library: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a link and print the keys it leads to
    Resolve {
        link: String,

        /// Versification of the page the link was found on
        #[arg(long, default_value = "KJV")]
        v11n: String,

        /// Keep Bible references in the named document
        #[arg(long)]
        force_doc: bool,
    },

    /// Follow links one after another and print the window layout
    Navigate {
        links: Vec<String>,

        #[arg(long, default_value = "KJV")]
        v11n: String,

        /// Window mode: this, special, new or undefined
        #[arg(short, long, default_value = "undefined")]
        mode: WindowMode,

        /// Start with a maximized layout
        #[arg(long)]
        maximized: bool,

        /// Settings file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let library = Arc::new(MemoryLibrary::load(&cli.library)?);

    match cli.command {
        Commands::Resolve {
            link,
            v11n,
            force_doc,
        } => {
            println!("{}", UriAnalyzer::analyze(&link));
            let mut link = BibleLink::new(&link, &v11n);
            if force_doc {
                link = link.forced();
            }
            let resolver = KeyResolver::new(library);
            match resolver.resolve(&link)? {
                Some(found) => {
                    for key in found.into_vec() {
                        println!("{key}");
                    }
                }
                None => println!("(nothing)"),
            }
            Ok(())
        }

        Commands::Navigate {
            links,
            v11n,
            mode,
            maximized,
            config,
        } => {
            let settings: Arc<dyn SettingsProvider> = match config {
                Some(path) => Arc::new(TomlSettingsProvider::new(path)),
                None => Arc::new(MemorySettings::default()),
            };
            let windows = Arc::new(RwLock::new(WindowRepository::new(
                library.default_bible_with_strongs(),
                None,
            )));
            windows.write().set_maximized(maximized);
            let mut control = LinkControl::new(
                library,
                windows.clone(),
                settings,
                Arc::new(LogReporter),
                Arc::new(MemoryBookmarkStore::new()),
            );
            control.set_window_mode(mode);

            for link in &links {
                let shown = control.load_application_url(&BibleLink::new(link, &v11n));
                tracing::info!("{link}: {}", if shown { "shown" } else { "not shown" });
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&windows.read().summaries())?
            );
            Ok(())
        }
    }
}
