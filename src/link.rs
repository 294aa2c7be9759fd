//! [crate::link] contains the link markup parsing that classifies a raw link string from the
//! rendered document into a document type plus raw key text.
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use url::form_urlencoded;

/// Document type a link points at.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocType {
    Bible,
    GreekDictionary,
    HebrewDictionary,
    Robinson,
    AllGreekOccurrences,
    AllHebrewOccurrences,
    SpecificDocument,
    #[default]
    Unrecognized,
}

/// Identifies the URL scheme used in a link string.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkScheme {
    GreekDef,
    HebrewDef,
    Robinson,
    AllGreekOccurrences,
    AllHebrewOccurrences,
    Bible,
    Sword,
    Osis,
    /// No scheme present: a bare reference (e.g. `Gen.1.1`, `KJV/Gen.1.1`)
    #[default]
    None,
    /// Unrecognized scheme (e.g. `https:`, `mailto:`)
    External,
}

impl From<&str> for LinkScheme {
    fn from(scheme_str: &str) -> Self {
        match scheme_str.to_lowercase().trim() {
            "" => LinkScheme::None,
            "gdef" => LinkScheme::GreekDef,
            "hdef" => LinkScheme::HebrewDef,
            "robinson" => LinkScheme::Robinson,
            "allgoccur" => LinkScheme::AllGreekOccurrences,
            "allhoccur" => LinkScheme::AllHebrewOccurrences,
            "bible" => LinkScheme::Bible,
            "sword" => LinkScheme::Sword,
            "osis" => LinkScheme::Osis,
            _ => LinkScheme::External,
        }
    }
}

/// Result of analysing one link.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLink {
    pub doc_type: DocType,
    pub key: String,
    /// Document initials for [`DocType::SpecificDocument`] links.
    pub book: Option<String>,
}

impl ParsedLink {
    fn new(doc_type: DocType, key: &str) -> Self {
        ParsedLink {
            doc_type,
            key: key.to_string(),
            book: None,
        }
    }

    fn specific(book: &str, key: &str) -> Self {
        let book = book.trim();
        ParsedLink {
            doc_type: DocType::SpecificDocument,
            key: key.to_string(),
            book: (!book.is_empty()).then(|| book.to_string()),
        }
    }

    pub fn unrecognized() -> Self {
        ParsedLink::default()
    }

    pub fn is_recognized(&self) -> bool {
        self.doc_type != DocType::Unrecognized
    }
}

impl Display for ParsedLink {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match &self.book {
            Some(book) => write!(f, "{:?}({book}/{})", self.doc_type, self.key),
            None => write!(f, "{:?}({})", self.doc_type, self.key),
        }
    }
}

/// A link tapped in the rendered content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibleLink {
    pub url: String,
    /// Versification the link was written in.
    pub versification: String,
    /// Treat a Bible document named in the link as a plain document instead of opening the
    /// reference in the current Bible.
    #[serde(default)]
    pub force_doc: bool,
}

impl BibleLink {
    pub fn new(url: &str, versification: &str) -> Self {
        BibleLink {
            url: url.to_string(),
            versification: versification.to_string(),
            force_doc: false,
        }
    }

    pub fn forced(mut self) -> Self {
        self.force_doc = true;
        self
    }
}

/// Classifies link strings produced by the renderer.
pub struct UriAnalyzer;

impl UriAnalyzer {
    /// Classify `link`. Never fails: anything that cannot be understood is
    /// [`DocType::Unrecognized`].
    pub fn analyze(link: &str) -> ParsedLink {
        let link = link.trim();
        if link.is_empty() {
            return ParsedLink::unrecognized();
        }
        let decoded;
        let link = if !link.contains(':') && link.contains('%') {
            // Links may arrive fully percent-encoded, scheme separator included
            match percent_decode_str(link).decode_utf8() {
                Ok(d) => {
                    decoded = d.into_owned();
                    decoded.as_str()
                }
                Err(_) => {
                    tracing::debug!("[UriAnalyzer] '{link}' is not valid percent-encoded UTF-8");
                    return ParsedLink::unrecognized();
                }
            }
        } else {
            link
        };

        let (scheme_str, rest) = match link.split_once(':') {
            Some((scheme, rest)) if is_scheme(scheme) => (scheme, rest),
            _ => ("", link),
        };
        let scheme = LinkScheme::from(scheme_str);
        let reference = rest.trim_start_matches('/');

        let parsed = match scheme {
            LinkScheme::External => {
                tracing::debug!("[UriAnalyzer] unsupported scheme in '{link}'");
                return ParsedLink::unrecognized();
            }
            LinkScheme::GreekDef => ParsedLink::new(DocType::GreekDictionary, reference),
            LinkScheme::HebrewDef => ParsedLink::new(DocType::HebrewDictionary, reference),
            LinkScheme::Robinson => ParsedLink::new(DocType::Robinson, reference),
            LinkScheme::AllGreekOccurrences => {
                ParsedLink::new(DocType::AllGreekOccurrences, reference)
            }
            LinkScheme::AllHebrewOccurrences => {
                ParsedLink::new(DocType::AllHebrewOccurrences, reference)
            }
            LinkScheme::Osis if reference.starts_with('?') => {
                return Self::analyze_query(&reference[1..]);
            }
            LinkScheme::Bible | LinkScheme::None => match reference.split_once('/') {
                Some((book, key)) => ParsedLink::specific(book, key),
                None => ParsedLink::new(DocType::Bible, reference),
            },
            LinkScheme::Sword | LinkScheme::Osis => match reference.split_once('/') {
                Some((book, key)) => ParsedLink::specific(book, key),
                None => ParsedLink::specific("", reference),
            },
        };

        if parsed.key.trim().is_empty() {
            tracing::debug!("[UriAnalyzer] no key in '{link}'");
            return ParsedLink::unrecognized();
        }
        parsed
    }

    /// `osis://?osis=Gen.1.1&doc=KJV` form emitted by the web client; `query` is the part
    /// after `?`.
    fn analyze_query(query: &str) -> ParsedLink {
        let mut osis = None;
        let mut doc = None;
        for (name, value) in form_urlencoded::parse(query.as_bytes()) {
            match name.as_ref() {
                "osis" => osis = Some(value.into_owned()),
                "doc" => doc = Some(value.into_owned()),
                _ => {}
            }
        }
        match osis {
            Some(key) if !key.trim().is_empty() => {
                ParsedLink::specific(doc.as_deref().unwrap_or(""), &key)
            }
            _ => {
                tracing::debug!("[UriAnalyzer] no osis parameter in '?{query}'");
                ParsedLink::unrecognized()
            }
        }
    }
}

/// RFC 3986 scheme: a letter followed by letters, digits, `+`, `-` or `.`.
fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
