use std::path::PathBuf;

/// Failures of a header conversion run. None are retried.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("cannot access {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} contains no rows, expected a header", .path.display())]
    EmptyInput { path: PathBuf },

    #[error("{} is not valid {encoding} text", .path.display())]
    Encoding { path: PathBuf, encoding: &'static str },

    #[error("cannot write {} as {encoding} text", .path.display())]
    Unencodable { path: PathBuf, encoding: &'static str },

    #[error("unknown encoding label: {0}")]
    UnknownEncoding(String),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl ConvertError {
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::FileAccess {
            path: path.into(),
            source,
        }
    }
}

pub type ConvertResult<T> = std::result::Result<T, ConvertError>;
