//! services/api/src/adapters/spreadsheet.rs
//!
//! The spreadsheet-backed `RecordStore`. The workbook is read fresh on every load
//! and rewritten in full on every save.
//!
//! Two sheet layouts are understood on load:
//! - the intake form export: timestamp, email, ID, full name, grade, then up to
//!   seven subject columns;
//! - the flat layout this adapter writes: Name, ID, Photo, Grade, Subjects, Available.
//!
//! Saves always produce the flat layout, so the intake layout is only ever read once.

use async_trait::async_trait;
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tutor_board_core::domain::{split_subjects, TutorRecord};
use tutor_board_core::ports::{Loaded, PortError, PortResult, RecordStore};

/// Column titles of the flat layout, in order.
pub const FLAT_HEADER: [&str; 6] = ["Name", "ID", "Photo", "Grade", "Subjects", "Available"];

const SHEET_NAME: &str = "Tutors";

// Intake layout columns.
const INTAKE_ID: u32 = 2;
const INTAKE_NAME: u32 = 3;
const INTAKE_GRADE: u32 = 4;
const INTAKE_SUBJECTS: std::ops::Range<u32> = 5..12;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A `RecordStore` over a single `.xlsx` workbook.
#[derive(Clone, Debug)]
pub struct SpreadsheetStore {
    path: PathBuf,
}

impl SpreadsheetStore {
    /// Creates a new `SpreadsheetStore`. The file does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

//=========================================================================================
// `RecordStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecordStore for SpreadsheetStore {
    async fn load(&self) -> Loaded {
        let path = self.path.clone();
        let loaded = tokio::task::spawn_blocking(move || read_workbook(&path))
            .await
            .unwrap_or_else(|e| Loaded::Unreadable {
                reason: e.to_string(),
            });

        match &loaded {
            Loaded::Records(records) => {
                debug!(count = records.len(), "Read tutors from spreadsheet")
            }
            Loaded::Missing => debug!(path = %self.path.display(), "Tutor spreadsheet does not exist yet"),
            Loaded::Unreadable { reason } => {
                warn!(path = %self.path.display(), %reason, "Tutor spreadsheet is unreadable")
            }
        }
        loaded
    }

    async fn save(&self, records: &[TutorRecord]) -> PortResult<()> {
        let path = self.path.clone();
        let records = records.to_vec();
        tokio::task::spawn_blocking(move || write_workbook(&path, &records))
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
    }
}

//=========================================================================================
// Reading
//=========================================================================================

fn read_workbook(path: &Path) -> Loaded {
    if !path.exists() {
        return Loaded::Missing;
    }

    let mut workbook: Xlsx<_> = match open_workbook(path) {
        Ok(workbook) => workbook,
        Err(e) => {
            return Loaded::Unreadable {
                reason: e.to_string(),
            }
        }
    };

    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(e)) => {
            return Loaded::Unreadable {
                reason: e.to_string(),
            }
        }
        None => {
            return Loaded::Unreadable {
                reason: "workbook has no sheets".to_string(),
            }
        }
    };

    Loaded::Records(parse_sheet(&range))
}

/// Parses a sheet in either layout. An empty sheet is an empty record set.
/// Rows with an empty id, or an id already seen higher up, are skipped.
fn parse_sheet(range: &Range<Data>) -> Vec<TutorRecord> {
    let (Some((header_row, _)), Some((last_row, _))) = (range.start(), range.end()) else {
        return Vec::new();
    };

    let cell = |row: u32, col: u32| cell_text(range.get_value((row, col)));
    let data_rows = (header_row + 1)..=last_row;
    let mut seen_ids = HashSet::new();

    if cell(header_row, 0) == FLAT_HEADER[0] {
        data_rows
            .filter_map(|row| {
                let id = cell(row, 1);
                if id.is_empty() || !seen_ids.insert(id.clone()) {
                    return None;
                }
                let name = cell(row, 0);
                let photo = match cell(row, 2) {
                    photo if photo.is_empty() => TutorRecord::default_photo(&name),
                    photo => photo,
                };
                Some(TutorRecord {
                    id,
                    photo,
                    grade: cell(row, 3),
                    subjects: split_subjects(&cell(row, 4)),
                    available: cell_flag(range.get_value((row, 5))),
                    name,
                })
            })
            .collect()
    } else {
        data_rows
            .filter_map(|row| {
                let id = cell(row, INTAKE_ID);
                if id.is_empty() || !seen_ids.insert(id.clone()) {
                    return None;
                }
                let name = cell(row, INTAKE_NAME);
                let subjects = INTAKE_SUBJECTS
                    .flat_map(|col| split_intake_subjects(&cell(row, col)))
                    .collect();
                Some(TutorRecord {
                    id,
                    photo: TutorRecord::default_photo(&name),
                    grade: cell(row, INTAKE_GRADE),
                    subjects,
                    available: false,
                    name,
                })
            })
            .collect()
    }
}

/// The trimmed text of a cell. Whole numbers lose their fractional part,
/// so an ID typed as `12345` does not come back as `12345.0`.
fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Int(i)) => i.to_string(),
        Some(Data::Float(f)) if f.fract() == 0.0 => format!("{}", *f as i64),
        Some(Data::Float(f)) => f.to_string(),
        Some(Data::Bool(b)) => b.to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

fn cell_flag(cell: Option<&Data>) -> bool {
    match cell {
        Some(Data::Bool(b)) => *b,
        Some(Data::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(Data::Int(i)) => *i != 0,
        Some(Data::Float(f)) => *f != 0.0,
        _ => false,
    }
}

/// Intake subject cells hold either one subject, several separated by double
/// spaces, or several separated by commas.
fn split_intake_subjects(cell: &str) -> Vec<String> {
    let parts: Vec<&str> = if cell.contains("  ") {
        cell.split("  ").collect()
    } else {
        cell.split(',').collect()
    };
    parts
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

//=========================================================================================
// Writing
//=========================================================================================

/// Writes the flat layout to a temporary file beside `path`, then renames it
/// over `path` so a failed write leaves the previous workbook intact.
fn write_workbook(path: &Path, records: &[TutorRecord]) -> PortResult<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME).map_err(unavailable)?;

    for (col, title) in FLAT_HEADER.iter().enumerate() {
        sheet
            .write_string(0, col as u16, *title)
            .map_err(unavailable)?;
    }
    for (index, tutor) in records.iter().enumerate() {
        let row = index as u32 + 1;
        let subjects = tutor.subjects_joined();
        let cells = [
            tutor.name.as_str(),
            tutor.id.as_str(),
            tutor.photo.as_str(),
            tutor.grade.as_str(),
            subjects.as_str(),
        ];
        for (col, value) in cells.into_iter().enumerate() {
            sheet
                .write_string(row, col as u16, value)
                .map_err(unavailable)?;
        }
        sheet
            .write_boolean(row, 5, tutor.available)
            .map_err(unavailable)?;
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(unavailable)?;

    let staged = tempfile::NamedTempFile::new_in(&dir).map_err(unavailable)?;
    workbook.save(staged.path()).map_err(unavailable)?;
    staged.persist(path).map_err(|e| unavailable(e.error))?;
    Ok(())
}

fn unavailable(e: impl std::fmt::Display) -> PortError {
    PortError::StoreUnavailable(e.to_string())
}
