//! # Guidance Content Table
//!
//! Loads the externally authored table of developmental guidance, one row per
//! stage, into an immutable snapshot.
//!
//! ## Format
//!
//! ```text
//! Age/Timeframe,Motor,Motor Images,Language
//! Week 1,Lifts head briefly,img/week1.png,Startles at sounds
//! 1 Year,Walks with support,-,Says first words
//! ```
//!
//! - The stage column is `Age/Timeframe`; rows with an empty stage are skipped.
//! - Every other named column is a category, except columns ending in
//!   `" Images"`, which hold the illustration for the matching category.
//! - `-`, `N/A` and blank cells carry no content.
//! - Rows with no content are dropped; row order is preserved.
//! - The delimiter is sniffed from the parsed header (`,` `\t` `|` `;`),
//!   with quoted fields respected.
//!
//! The table is loaded once and shared read-only; it is passed to the
//! classifier's window selection as a [`StageCatalog`].

use crate::SproutError;
use crate::development::{Stage, StageCatalog};
use crate::primitives::{
    CONTENT_DELIMITERS, EMPTY_CELL_MARKERS, IMAGE_COLUMN_SUFFIX, MAX_CONTENT_FILE_SIZE,
    STAGE_COLUMN,
};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

// =============================================================================
// ROWS
// =============================================================================

/// One category of guidance for a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub category: String,
    pub description: String,
    pub image: Option<String>,
}

/// All guidance authored for one stage label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRow {
    pub stage: String,
    pub entries: Vec<ContentEntry>,
}

impl ContentRow {
    /// The stage this row is keyed by, if the label is a known stage.
    #[must_use]
    pub fn known_stage(&self) -> Option<Stage> {
        Stage::from_label(&self.stage)
    }
}

// =============================================================================
// TABLE
// =============================================================================

/// Immutable snapshot of the guidance content table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTable {
    rows: Vec<ContentRow>,
    skipped_rows: usize,
}

/// A category column and, when present, its paired illustration column.
struct CategoryColumn {
    index: usize,
    name: String,
    image_index: Option<usize>,
}

impl ContentTable {
    /// An empty table. Every window selected against it is empty.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from rows that were produced elsewhere.
    #[must_use]
    pub fn from_rows(rows: Vec<ContentRow>) -> Self {
        Self {
            rows,
            skipped_rows: 0,
        }
    }

    /// Load a table from a file, rejecting files above `MAX_CONTENT_FILE_SIZE`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SproutError> {
        let path = path.as_ref();
        let io_err = |e: std::io::Error| {
            SproutError::IoError(format!("Cannot read '{}': {}", path.display(), e))
        };

        let metadata = std::fs::metadata(path).map_err(io_err)?;
        if metadata.len() > MAX_CONTENT_FILE_SIZE {
            return Err(oversized(metadata.len()));
        }

        let file = std::fs::File::open(path).map_err(io_err)?;
        Self::from_reader(file)
    }

    /// Load a table from any reader, rejecting input above `MAX_CONTENT_FILE_SIZE`.
    pub fn from_reader(reader: impl Read) -> Result<Self, SproutError> {
        let mut text = String::new();
        reader
            .take(MAX_CONTENT_FILE_SIZE.saturating_add(1))
            .read_to_string(&mut text)
            .map_err(|e| SproutError::IoError(e.to_string()))?;

        let len = text.len() as u64;
        if len > MAX_CONTENT_FILE_SIZE {
            return Err(oversized(len));
        }
        Self::from_csv_str(&text)
    }

    /// Parse a table from delimited text.
    pub fn from_csv_str(text: &str) -> Result<Self, SproutError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let delimiter = sniff_delimiter(text);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| SproutError::ContentError(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        let stage_index = headers
            .iter()
            .position(|h| h == STAGE_COLUMN)
            .ok_or_else(|| {
                SproutError::ContentError(format!("missing '{}' column", STAGE_COLUMN))
            })?;

        let categories = category_columns(&headers, stage_index);

        let mut rows = Vec::new();
        let mut skipped_rows = 0usize;

        for record in reader.records() {
            let record = record.map_err(|e| SproutError::ContentError(e.to_string()))?;

            let stage = record.get(stage_index).unwrap_or_default();
            if stage.is_empty() {
                skipped_rows = skipped_rows.saturating_add(1);
                continue;
            }

            let entries: Vec<ContentEntry> = categories
                .iter()
                .filter_map(|column| {
                    let description = cell(&record, Some(column.index))?;
                    Some(ContentEntry {
                        category: column.name.clone(),
                        description: description.to_string(),
                        image: cell(&record, column.image_index).map(str::to_string),
                    })
                })
                .collect();

            if entries.is_empty() {
                skipped_rows = skipped_rows.saturating_add(1);
                continue;
            }

            rows.push(ContentRow {
                stage: stage.to_string(),
                entries,
            });
        }

        Ok(Self { rows, skipped_rows })
    }

    /// All rows, in file order.
    #[must_use]
    pub fn rows(&self) -> &[ContentRow] {
        &self.rows
    }

    /// Rows authored for `label`, in file order.
    pub fn rows_for<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a ContentRow> + 'a {
        self.rows.iter().filter(move |r| r.stage == label)
    }

    /// Distinct stage labels, in first-seen order.
    #[must_use]
    pub fn stage_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !labels.contains(&row.stage.as_str()) {
                labels.push(&row.stage);
            }
        }
        labels
    }

    /// Row count for every known stage, in stage order.
    #[must_use]
    pub fn coverage(&self) -> Vec<(Stage, usize)> {
        Stage::ORDER
            .iter()
            .map(|stage| (*stage, self.rows_for(stage.label()).count()))
            .collect()
    }

    /// Labels present in the table that are not known stages.
    #[must_use]
    pub fn unknown_stages(&self) -> Vec<&str> {
        self.stage_labels()
            .into_iter()
            .filter(|label| Stage::from_label(label).is_none())
            .collect()
    }

    /// Rows dropped while loading (no stage, or no content).
    #[must_use]
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl StageCatalog for ContentTable {
    fn has_stage(&self, label: &str) -> bool {
        self.rows.iter().any(|r| r.stage == label)
    }
}

// =============================================================================
// PARSING HELPERS
// =============================================================================

fn oversized(len: u64) -> SproutError {
    SproutError::ContentError(format!(
        "File size {} bytes exceeds maximum allowed {} bytes",
        len, MAX_CONTENT_FILE_SIZE
    ))
}

/// Parse the header once per candidate delimiter.
///
/// A header that yields the stage column wins over one that does not; among
/// equals the one with more fields wins, and remaining ties keep the earlier
/// candidate, so `,` is the fallback.
fn sniff_delimiter(text: &str) -> u8 {
    let mut best = b',';
    let mut best_rank = (false, 0usize);

    for &candidate in CONTENT_DELIMITERS {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(candidate)
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let Some(Ok(header)) = reader.records().next() else {
            continue;
        };
        let rank = (header.iter().any(|h| h == STAGE_COLUMN), header.len());
        if rank > best_rank {
            best = candidate;
            best_rank = rank;
        }
    }
    best
}

fn category_columns(headers: &[String], stage_index: usize) -> Vec<CategoryColumn> {
    headers
        .iter()
        .enumerate()
        .filter(|(i, h)| *i != stage_index && !h.is_empty() && !h.ends_with(IMAGE_COLUMN_SUFFIX))
        .map(|(index, name)| {
            let image_header = format!("{}{}", name, IMAGE_COLUMN_SUFFIX);
            CategoryColumn {
                index,
                name: name.clone(),
                image_index: headers.iter().position(|h| *h == image_header),
            }
        })
        .collect()
}

/// A cell's content, or `None` if the cell is missing or carries no content.
fn cell(record: &csv::StringRecord, index: Option<usize>) -> Option<&str> {
    let value = record.get(index?)?.trim();
    if value.is_empty() || EMPTY_CELL_MARKERS.contains(&value) {
        None
    } else {
        Some(value)
    }
}

// =============================================================================
// TESTS
// =============================================================================
