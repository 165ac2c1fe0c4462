use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::models::{Article, FetchedSnapshot, SummarizedArticle, SummariesSnapshot};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize archive: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to persist archive {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Write-once storage for the records of each run
pub trait ArchiveWriter: Send + Sync {
    fn save_fetched(&self, articles: &[Article], run_at: DateTime<Utc>) -> Result<PathBuf, ArchiveError>;

    fn save_summaries(
        &self,
        articles: &[SummarizedArticle],
        run_at: DateTime<Utc>,
    ) -> Result<PathBuf, ArchiveError>;
}

/// Pretty-printed JSON files in a single directory
pub struct JsonArchive {
    dir: PathBuf,
}

impl JsonArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write<T: Serialize>(&self, prefix: &str, run_at: DateTime<Utc>, data: &T) -> Result<PathBuf, ArchiveError> {
        fs::create_dir_all(&self.dir).map_err(|source| ArchiveError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(data)?;

        // Stage in the target directory so the final rename stays on one filesystem
        let mut staged = NamedTempFile::new_in(&self.dir).map_err(|source| ArchiveError::Io {
            path: self.dir.clone(),
            source,
        })?;
        staged
            .write_all(json.as_bytes())
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|source| ArchiveError::Io {
                path: staged.path().to_path_buf(),
                source,
            })?;

        let stamp = run_at.format("%Y-%m-%d_%H-%M-%S");
        let mut attempt = 0u32;
        loop {
            let filename = if attempt == 0 {
                format!("{}_{}.json", prefix, stamp)
            } else {
                format!("{}_{}-{}.json", prefix, stamp, attempt)
            };
            let path = self.dir.join(filename);

            match staged.persist_noclobber(&path) {
                Ok(_) => return Ok(path),
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                    staged = e.file;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(ArchiveError::Persist {
                        path,
                        source: e.error,
                    })
                }
            }
        }
    }
}

impl ArchiveWriter for JsonArchive {
    fn save_fetched(&self, articles: &[Article], run_at: DateTime<Utc>) -> Result<PathBuf, ArchiveError> {
        self.write("fetched_articles", run_at, &FetchedSnapshot::new(articles, run_at))
    }

    fn save_summaries(
        &self,
        articles: &[SummarizedArticle],
        run_at: DateTime<Utc>,
    ) -> Result<PathBuf, ArchiveError> {
        self.write("summaries", run_at, &SummariesSnapshot::new(articles, run_at))
    }
}
