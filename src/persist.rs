//! CSV save and load for record stores, plus the merge and overwrite policies
//! used to bring loaded records into an existing store.
//!
//! File format: UTF-8, comma separated, a fixed header row naming the columns
//! of the record type, one record per row, trailing newline.

use crate::error::{PersistError, RowError, StoreError};
use crate::record::{Record, Stocked};
use crate::store::RecordStore;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// A record type with a fixed CSV schema.
pub trait TabularRecord: Record + Sized {
    /// Column names, in file order.
    const HEADER: &'static [&'static str];

    fn to_row(&self) -> Vec<String>;

    fn from_row(row: &StringRecord) -> Result<Self, RowError>;
}

/// Rejects rows whose length differs from `R::HEADER`.
pub fn check_columns<R: TabularRecord>(row: &StringRecord) -> Result<(), RowError> {
    if row.len() == R::HEADER.len() {
        Ok(())
    } else {
        Err(RowError::ColumnCount {
            expected: R::HEADER.len(),
            found: row.len(),
        })
    }
}

/// A data row skipped during load.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    /// 1-based line number, header included.
    pub line: u64,
    pub reason: RowError,
}

/// Records parsed from a file along with the rows that were rejected.
#[derive(Debug)]
pub struct Loaded<R> {
    pub records: Vec<R>,
    pub skipped: Vec<SkippedRow>,
}

/// How many incoming records were appended vs folded into existing ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub added: usize,
    pub updated: usize,
}

/// Policy for combining loaded records with a store that already has data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Sum quantities and take the incoming price for matching keys.
    Merge,
    /// Drop the current contents first.
    Overwrite,
}

impl FromStr for LoadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" | "m" => Ok(LoadMode::Merge),
            "overwrite" | "o" => Ok(LoadMode::Overwrite),
            other => Err(format!("unknown load mode '{other}' (expected merge or overwrite)")),
        }
    }
}

/// Write `records` to `path`, replacing any existing file.
///
/// Returns the number of data rows written.
pub fn save<'a, R, I>(records: I, path: &Path) -> Result<usize, PersistError>
where
    R: TabularRecord + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let file = File::create(path).map_err(|source| io_error(path, source))?;
    let written = write_records(records, file).map_err(|e| csv_error(path, e))?;
    info!(path = %path.display(), rows = written, "records saved");
    Ok(written)
}

/// Write the header and rows to any writer.
pub fn write_records<'a, R, I, W>(records: I, out: W) -> Result<usize, csv::Error>
where
    R: TabularRecord + 'a,
    I: IntoIterator<Item = &'a R>,
    W: Write,
{
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(R::HEADER)?;
    let mut written = 0;
    for record in records {
        writer.write_record(record.to_row())?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// Read and validate the file at `path`.
///
/// The header must match `R::HEADER` exactly or nothing is loaded. Bad data
/// rows are skipped and reported in [`Loaded::skipped`].
pub fn load<R: TabularRecord>(path: &Path) -> Result<Loaded<R>, PersistError> {
    let file = File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => PersistError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => io_error(path, source),
    })?;
    let loaded = read_records(file, path)?;
    info!(
        path = %path.display(),
        loaded = loaded.records.len(),
        skipped = loaded.skipped.len(),
        "records loaded"
    );
    Ok(loaded)
}

/// Parse records from any reader; `path` is only used in error reports.
pub fn read_records<R: TabularRecord, Rd: Read>(
    input: Rd,
    path: &Path,
) -> Result<Loaded<R>, PersistError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::None)
        .from_reader(input);

    let mut rows = reader.records();
    let header = match rows.next() {
        Some(row) => row.map_err(|e| classify(path, e))?,
        None => StringRecord::new(),
    };
    if !header.iter().eq(R::HEADER.iter().copied()) {
        return Err(PersistError::HeaderMismatch {
            path: path.to_path_buf(),
            expected: R::HEADER.join(","),
            found: header.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut loaded = Loaded {
        records: Vec::new(),
        skipped: Vec::new(),
    };
    for row in rows {
        let row = row.map_err(|e| classify(path, e))?;
        let line = row.position().map_or(0, |p| p.line());
        match R::from_row(&row) {
            Ok(record) => loaded.records.push(record),
            Err(reason) => {
                warn!(path = %path.display(), line, %reason, "skipping row");
                loaded.skipped.push(SkippedRow { line, reason });
            }
        }
    }
    Ok(loaded)
}

/// Fold `incoming` into `target`: matching keys get their quantity summed and
/// their price replaced, new keys are appended in order.
///
/// Every incoming record is validated first; one invalid record rejects the
/// whole batch and leaves `target` untouched.
pub fn merge<R: Stocked>(
    target: &mut RecordStore<R>,
    incoming: Vec<R>,
) -> Result<MergeOutcome, StoreError> {
    validate_all(&incoming)?;
    Ok(merge_valid(target, incoming))
}

/// Replace the contents of `target` with `incoming`.
///
/// Duplicate keys inside `incoming` are combined by the merge rule. Nothing
/// is cleared when a record is invalid.
pub fn overwrite<R: Stocked>(
    target: &mut RecordStore<R>,
    incoming: Vec<R>,
) -> Result<MergeOutcome, StoreError> {
    validate_all(&incoming)?;
    target.clear();
    Ok(merge_valid(target, incoming))
}

pub fn apply<R: Stocked>(
    mode: LoadMode,
    target: &mut RecordStore<R>,
    incoming: Vec<R>,
) -> Result<MergeOutcome, StoreError> {
    match mode {
        LoadMode::Merge => merge(target, incoming),
        LoadMode::Overwrite => overwrite(target, incoming),
    }
}

fn validate_all<R: Record>(records: &[R]) -> Result<(), StoreError> {
    for record in records {
        record.validate()?;
    }
    Ok(())
}

fn merge_valid<R: Stocked>(target: &mut RecordStore<R>, incoming: Vec<R>) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    for record in incoming {
        match target.get_mut(record.key()) {
            Some(existing) => {
                existing.add_quantity(record.quantity());
                existing.set_price(record.price());
                outcome.updated += 1;
            }
            None => {
                target.push_unchecked(record);
                outcome.added += 1;
            }
        }
    }
    outcome
}

fn io_error(path: &Path, source: io::Error) -> PersistError {
    PersistError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn csv_error(path: &Path, err: csv::Error) -> PersistError {
    if !err.is_io_error() {
        return PersistError::Csv {
            path: path.to_path_buf(),
            source: err,
        };
    }
    match err.into_kind() {
        csv::ErrorKind::Io(source) => io_error(path, source),
        other => io_error(path, io::Error::other(format!("{other:?}"))),
    }
}

fn classify(path: &Path, err: csv::Error) -> PersistError {
    if let csv::ErrorKind::Utf8 { pos, .. } = err.kind() {
        return PersistError::Encoding {
            path: path.to_path_buf(),
            line: pos.as_ref().map_or(0, |p| p.line()),
        };
    }
    csv_error(path, err)
}
