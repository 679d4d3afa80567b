//! Enrollment records and the CSV loader that builds the in-memory dataset.
//!
//! The source file stores every column as text, including the numeric ones
//! ("1,200"), so numeric cells are cleaned and coerced before use. Rows whose
//! enrolled count is not positive never make it into the dataset.

use std::io::Read;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

// ────────────────────────────────────────────────────────────────────────────
// Column headers of the source CSV
// ────────────────────────────────────────────────────────────────────────────

pub const COL_INSTITUTION: &str = "Institución de Educación Superior (IES)";
pub const COL_PROGRAM: &str = "Programa Académico";
pub const COL_DEPARTMENT: &str = "Departamento de oferta del programa";
pub const COL_MUNICIPALITY: &str = "Municipio de oferta del programa";
pub const COL_YEAR: &str = "Año";
pub const COL_GENDER: &str = "Id Género";
pub const COL_ENROLLED: &str = "Total Matriculados";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// One enrollment row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub institution: String,
    pub program: String,
    pub department: String,
    pub municipality: String,
    pub year: i32,
    /// 1 = men, 2 = women. Unparseable cells load as 0.
    pub gender: i32,
    pub enrolled: u64,
}

/// The immutable enrollment table. Built once at startup and shared as `Arc<Dataset>`.
#[derive(Debug, Default)]
pub struct Dataset {
    records: Vec<Record>,
}

/// Positions of the required columns inside a CSV row.
struct ColumnIndex {
    institution: usize,
    program: usize,
    department: usize,
    municipality: usize,
    year: usize,
    gender: usize,
    enrolled: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, DatasetError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
                .ok_or(DatasetError::MissingColumn(name))
        };

        Ok(Self {
            institution: find(COL_INSTITUTION)?,
            program: find(COL_PROGRAM)?,
            department: find(COL_DEPARTMENT)?,
            municipality: find(COL_MUNICIPALITY)?,
            year: find(COL_YEAR)?,
            gender: find(COL_GENDER)?,
            enrolled: find(COL_ENROLLED)?,
        })
    }
}

impl Dataset {
    /// Builds a dataset from already-typed records, dropping rows with no enrollment.
    pub fn from_records(records: Vec<Record>) -> Self {
        let records = records.into_iter().filter(|r| r.enrolled > 0).collect();
        Self { records }
    }

    /// Reads and parses the CSV file at `path`.
    ///
    /// Any IO, structural CSV, or missing-column error aborts the load. The
    /// service must not start on a partial table.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref().to_owned();
        info!("Loading enrollment dataset from {}", path.display());

        let contents = tokio::fs::read(&path).await?;

        // CSV parsing is CPU-bound, spawn blocking
        let dataset =
            tokio::task::spawn_blocking(move || Self::from_reader(contents.as_slice())).await??;

        info!(records = dataset.len(), "Enrollment dataset loaded");
        Ok(dataset)
    }

    /// Parses CSV data from any reader. The first row must be the header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::Reader::from_reader(reader);
        let columns = ColumnIndex::from_headers(reader.headers()?)?;

        let mut records = Vec::new();
        let mut dropped = 0usize;

        for row in reader.records() {
            let row = row?;
            let field = |i: usize| row.get(i).unwrap_or_default();

            let enrolled = parse_count(field(columns.enrolled));
            if enrolled <= 0 {
                dropped += 1;
                continue;
            }

            records.push(Record {
                institution: field(columns.institution).to_string(),
                program: field(columns.program).to_string(),
                department: field(columns.department).to_string(),
                municipality: field(columns.municipality).to_string(),
                year: clamp_i32(parse_count(field(columns.year))),
                gender: clamp_i32(parse_count(field(columns.gender))),
                enrolled: enrolled as u64,
            });
        }

        debug!(kept = records.len(), dropped, "Parsed enrollment rows");
        Ok(Self { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Coerces a text cell to an integer: thousands separators are stripped, blanks
/// and garbage become 0, and decimal renderings ("12.0") are truncated.
fn parse_count(raw: &str) -> i64 {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return 0;
    }

    cleaned
        .parse::<i64>()
        .ok()
        .or_else(|| {
            cleaned
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| f as i64)
        })
        .unwrap_or(0)
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
