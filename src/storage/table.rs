//! Append-only CSV table with one row per discovered paper.

use crate::sources::PaperRecord;
use crate::storage::StorageError;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Written in place of any missing field.
pub const NOT_AVAILABLE: &str = "N/A";

pub const COLUMNS: [&str; 8] = [
    "title",
    "url",
    "authors",
    "abstract",
    "pdf_link",
    "year",
    "term",
    "local_pdf_path",
];

#[derive(Serialize)]
struct Row<'a> {
    title: &'a str,
    url: &'a str,
    authors: &'a str,
    #[serde(rename = "abstract")]
    abstract_text: &'a str,
    pdf_link: &'a str,
    year: &'a str,
    term: &'a str,
    local_pdf_path: String,
}

impl<'a> From<&'a PaperRecord> for Row<'a> {
    fn from(record: &'a PaperRecord) -> Self {
        Row {
            title: &record.title,
            url: &record.detail_url,
            authors: record.authors.as_deref().unwrap_or(NOT_AVAILABLE),
            abstract_text: record.abstract_text.as_deref().unwrap_or(NOT_AVAILABLE),
            pdf_link: record.pdf_url.as_deref().unwrap_or(NOT_AVAILABLE),
            year: &record.year,
            term: &record.term,
            local_pdf_path: record
                .local_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }
}

pub struct OutputTable {
    writer: csv::Writer<File>,
    path: PathBuf,
    rows: usize,
}

impl OutputTable {
    /// Create (or truncate) the table at `path` and write the header row.
    pub fn create(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        writer.write_record(COLUMNS)?;
        writer.flush().map_err(|source| StorageError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            rows: 0,
        })
    }

    /// Append one row and flush it, so an interrupted run keeps what it wrote.
    pub fn append(&mut self, record: &PaperRecord) -> Result<(), StorageError> {
        self.writer.serialize(Row::from(record))?;
        self.writer.flush().map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.rows += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}
