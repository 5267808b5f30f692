//! Book persistence in a single JSON file.
//!
//! The file is a JSON array. Each element is parsed on its own, so one
//! record that does not fit [`Book`] is skipped on reads instead of hiding
//! the rest, and is carried through untouched on writes.
//!
//! Reads degrade to an empty catalog when the file is missing or broken.
//! Mutations are stricter: a file that exists but cannot be read or parsed
//! fails the mutation and is never overwritten. Mutations are
//! load-modify-save cycles serialised by one lock, and each save writes a
//! temporary file next to the catalog and renames it into place, so readers
//! see either the old or the new array.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Deserialize;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::catalog::model::Book;

/// Error returned when the catalog file cannot be read for an update or
/// cannot be written.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a JSON array of records: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode books: {0}")]
    Encode(#[from] serde_json::Error),
}

/// File-backed list of books. The position of a readable record among the
/// readable records is its public id.
#[derive(Debug)]
pub struct BookStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl BookStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every readable book. A missing or broken file yields an empty
    /// list; records that are not valid books are skipped.
    pub fn load(&self) -> Vec<Book> {
        let records = match self.read_records() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Books file unusable, using empty catalog");
                return Vec::new();
            }
        };

        records
            .iter()
            .enumerate()
            .filter_map(|(position, value)| match Book::deserialize(value) {
                Ok(book) => Some(book),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), position, error = %e, "Skipping unreadable book record");
                    None
                }
            })
            .collect()
    }

    /// Append a book and persist. Returns the new book's index.
    pub fn append(&self, book: Book) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut records = self.read_records()?;
        records.push(serde_json::to_value(&book)?);
        self.write_records(&records)?;
        Ok(readable(&records).count() - 1)
    }

    /// Remove the book at `index` and persist.
    ///
    /// Returns `Ok(Err(len))` with the number of readable books when the
    /// index is out of range; nothing is written in that case.
    pub fn remove(&self, index: usize) -> Result<Result<Book, usize>, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut records = self.read_records()?;

        let Some((position, book)) = readable(&records).nth(index) else {
            return Ok(Err(readable(&records).count()));
        };
        records.remove(position);
        self.write_records(&records)?;
        Ok(Ok(book))
    }

    /// Raw records on disk. A missing file is an empty catalog; anything else
    /// that prevents reading the array is an error.
    fn read_records(&self) -> Result<Vec<Value>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Books file not found, using empty catalog");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_records(&self, records: &[Value]) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, records)?;
            writer.flush().map_err(io_err)?;
        }
        file.persist(&self.path).map_err(|e| io_err(e.error))?;

        tracing::debug!(path = %self.path.display(), count = records.len(), "Saved books");
        Ok(())
    }
}

/// Readable books with their position in the raw array.
fn readable(records: &[Value]) -> impl Iterator<Item = (usize, Book)> + '_ {
    records
        .iter()
        .enumerate()
        .filter_map(|(position, value)| Book::deserialize(value).ok().map(|book| (position, book)))
}
