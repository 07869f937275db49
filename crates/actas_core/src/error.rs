use std::path::PathBuf;

/// Why a document could not be obtained from the archive.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("document {id} not found (status {status})")]
    NotFound { id: u64, status: u16 },

    #[error("request for document {id} failed: {source}")]
    Transport {
        id: u64,
        #[source]
        source: reqwest::Error,
    },
}

/// Why a document yielded no usable text.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("document contains no extractable text")]
    NoText,

    #[error("unreadable document: {0}")]
    Malformed(String),
}

/// Reading or writing a year's collection failed.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("year file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("year file {path} is not a valid collection: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot encode collection for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot derive a year from date {0:?}")]
    UnparsableDate(String),
}
