//! Raw document sources

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::PathBuf;

use jsoncol::{Error, Result};

/// One raw JSON document (or concatenation of documents) to decode.
///
/// Every variant resolves to an in-memory string before tokenizing; inputs
/// must be UTF-8.
pub enum Source {
    Text(String),
    Bytes(Vec<u8>),
    File(PathBuf),
    Reader(Box<dyn Read + Send>),
    /// A nested collection, flattened before queueing.
    Many(Vec<Source>),
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Reader(_) => f.write_str("Reader(..)"),
            Self::Many(sources) => f.debug_tuple("Many").field(&sources.len()).finish(),
        }
    }
}

impl Source {
    /// Recursively flatten `Many` collections into a flat list of leaves.
    pub fn flatten(sources: Vec<Source>) -> Vec<Source> {
        let mut flat = Vec::with_capacity(sources.len());
        for source in sources {
            match source {
                Self::Many(nested) => flat.extend(Self::flatten(nested)),
                leaf => flat.push(leaf),
            }
        }
        flat
    }

    /// Resolve to the document text, reading files and readers eagerly.
    pub fn into_text(self) -> Result<String> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Bytes(bytes) => String::from_utf8(bytes)
                .map_err(|e| Error::io(format!("source is not valid UTF-8: {e}"))),
            Self::File(path) => fs::read_to_string(&path)
                .map_err(|e| Error::io(format!("cannot read {}: {e}", path.display()))),
            Self::Reader(mut reader) => {
                let mut text = String::new();
                reader
                    .read_to_string(&mut text)
                    .map_err(|e| Error::io(format!("cannot read source: {e}")))?;
                Ok(text)
            }
            Self::Many(_) => Err(Error::io("nested source collection was not flattened")),
        }
    }
}

impl From<String> for Source {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Source {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for Source {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}
