use std::path::PathBuf;

use thiserror::Error;

/// Failures of the terminal host itself. API failures never show up here;
/// the controller turns them into banners.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("download directory {0} does not exist")]
    MissingDownloadDir(PathBuf),

    #[error("no customer card #{0}")]
    UnknownCard(usize),
}
