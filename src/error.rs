use std::{fmt, io};

use regex::Error as RegexError;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;
use url::ParseError as UrlParseError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum AndBibleError {
    #[error("Custom error: {0}")]
    Custom(String),
    #[error("Document not installed: {0}")]
    DocumentNotInstalled(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("No such key: {0}")]
    KeyNotFound(String),
    #[error("Malformed reference: {0}")]
    MalformedReference(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("Renderer communication error: {0}")]
    Renderer(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
}

impl AndBibleError {
    /// Resolution failures that simply mean "nothing to navigate to".
    pub fn is_key_not_found(&self) -> bool {
        matches!(
            self,
            AndBibleError::KeyNotFound(_) | AndBibleError::MalformedReference(_)
        )
    }

    /// Collapse a malformed reference into the recoverable "no such key" condition.
    pub fn into_key_not_found(self) -> Self {
        match self {
            AndBibleError::MalformedReference(msg) => AndBibleError::KeyNotFound(msg),
            other => other,
        }
    }
}

impl From<toml::de::Error> for AndBibleError {
    fn from(src: toml::de::Error) -> AndBibleError {
        AndBibleError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for AndBibleError {
    fn from(src: toml::ser::Error) -> AndBibleError {
        AndBibleError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for AndBibleError {
    fn from(src: JsonError) -> AndBibleError {
        AndBibleError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<UrlParseError> for AndBibleError {
    fn from(src: UrlParseError) -> AndBibleError {
        AndBibleError::MalformedReference(format!("Invalid URL: {src}"))
    }
}

impl From<io::Error> for AndBibleError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => AndBibleError::NotFound(format!("{x}")),
            _ => AndBibleError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<fmt::Error> for AndBibleError {
    fn from(x: fmt::Error) -> Self {
        AndBibleError::Custom(format!("{x}"))
    }
}

impl From<RegexError> for AndBibleError {
    fn from(x: RegexError) -> Self {
        AndBibleError::Serialization(format!("Regex parse failed: {x}"))
    }
}
