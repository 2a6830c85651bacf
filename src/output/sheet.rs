//! Spreadsheet writer
//!
//! Each (brand, model) batch lands in its own `.xlsx` file. Appending to an
//! existing file reads the whole workbook back, rewrites every worksheet and
//! continues the first one after its last used row, so earlier runs are
//! never overwritten.

use crate::api::PriceRecord;
use crate::output::filename::output_file_name;
use crate::output::traits::{AppendOutcome, OutputError, OutputResult, RecordSink};
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Header row written to new files
pub const HEADER: [&str; 9] = [
    "CodigoFipe",
    "Marca",
    "Modelo",
    "AnoModelo",
    "Valor",
    "Combustivel",
    "MesReferencia",
    "TipoVeiculo",
    "SiglaCombustivel",
];

/// Excel's limit on worksheet name length
const MAX_SHEET_NAME_LEN: usize = 31;

/// Cells of one data row, in header order
pub fn record_row(record: &PriceRecord) -> [&str; 9] {
    [
        record.fipe_code.as_str(),
        record.brand.as_str(),
        record.model.as_str(),
        record.model_year.as_str(),
        record.value.as_str(),
        record.fuel.as_str(),
        record.reference_month.as_str(),
        record.vehicle_type.as_str(),
        record.fuel_code.as_str(),
    ]
}

/// Worksheet name for files created for a vehicle type
pub fn sheet_name_for(vehicle_type: &str) -> String {
    match vehicle_type {
        "carros" => return "Carros".to_string(),
        "motos" => return "Motos".to_string(),
        "caminhoes" => return "Caminhões".to_string(),
        _ => {}
    }

    let cleaned: String = vehicle_type
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\' | '\''))
        .take(MAX_SHEET_NAME_LEN)
        .collect();

    let mut chars = cleaned.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Sheet1".to_string(),
    }
}

/// A cell read back from an existing workbook
#[derive(Debug, Clone, PartialEq)]
enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date
    DateTime(f64),
    /// Formula text without the leading `=`
    Formula(String),
}

/// One worksheet of an existing file
#[derive(Debug, Default)]
struct ExistingSheet {
    name: String,
    cells: BTreeMap<(u32, u16), CellValue>,
}

impl ExistingSheet {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: BTreeMap::new(),
        }
    }

    /// One past the last row holding a cell
    fn next_row(&self) -> u32 {
        self.cells.keys().map(|(row, _)| row + 1).max().unwrap_or(0)
    }

    /// True when row 0 is exactly the header this writer produces
    fn has_header(&self) -> bool {
        HEADER.iter().enumerate().all(|(col, title)| {
            matches!(self.cells.get(&(0, col as u16)), Some(CellValue::Text(t)) if t == title)
        })
    }
}

/// Writes batches of price records to `.xlsx` files in one directory
pub struct SheetWriter {
    directory: PathBuf,
    sheet_name: String,
    lock: Mutex<()>,
}

impl SheetWriter {
    /// Creates a writer for `directory`
    ///
    /// New files get a worksheet named after `vehicle_type`. The directory
    /// is created on the first write.
    pub fn new(directory: impl Into<PathBuf>, vehicle_type: &str) -> Self {
        Self {
            directory: directory.into(),
            sheet_name: sheet_name_for(vehicle_type),
            lock: Mutex::new(()),
        }
    }

    /// The output directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The file a batch starting with `record` is written to
    pub fn path_for(&self, record: &PriceRecord) -> PathBuf {
        self.directory.join(output_file_name(record))
    }

    fn write_batch(&self, records: &[PriceRecord]) -> OutputResult<AppendOutcome> {
        let Some(first) = records.first() else {
            return Ok(AppendOutcome::Skipped);
        };

        std::fs::create_dir_all(&self.directory)?;
        let path = self.path_for(first);

        let created = !path.exists();
        let sheets = if created {
            vec![ExistingSheet::empty(&self.sheet_name)]
        } else {
            read_existing_workbook(&path)?
        };

        // Records always go to the first worksheet
        let target = &sheets[0];
        let first_row = if target.cells.is_empty() {
            1
        } else {
            target.next_row()
        };

        tracing::debug!(
            "{} {} (sheet '{}' of {}, next row {})",
            if created { "Creating" } else { "Appending to" },
            path.display(),
            target.name,
            sheets.len(),
            first_row
        );

        let mut workbook = Workbook::new();
        for (index, sheet) in sheets.iter().enumerate() {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;
            write_cells(worksheet, sheet)?;

            if index > 0 {
                continue;
            }
            if sheet.cells.is_empty() || sheet.has_header() {
                write_header(worksheet)?;
            }

            let mut row = first_row;
            for record in records {
                for (col, cell) in record_row(record).iter().enumerate() {
                    worksheet.write_string(row, col as u16, *cell)?;
                }
                row += 1;
            }
        }

        // Save beside the target first so a failed save leaves the old file intact
        let tmp_path = path.with_extension("xlsx.tmp");
        workbook.save(&tmp_path)?;
        std::fs::rename(&tmp_path, &path)?;

        Ok(AppendOutcome::Written {
            path,
            rows_written: records.len(),
            first_row,
            created,
        })
    }
}

impl RecordSink for SheetWriter {
    fn append(&self, records: &[PriceRecord]) -> OutputResult<AppendOutcome> {
        if records.is_empty() {
            return Ok(AppendOutcome::Skipped);
        }

        // One batch at a time: two batches may resolve to the same file name
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.write_batch(records)
    }
}

fn write_header(worksheet: &mut Worksheet) -> OutputResult<()> {
    let bold = Format::new().set_bold();
    for (col, title) in HEADER.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }
    Ok(())
}

fn write_cells(worksheet: &mut Worksheet, sheet: &ExistingSheet) -> OutputResult<()> {
    let date = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    for (&(row, col), value) in &sheet.cells {
        match value {
            CellValue::Text(text) => worksheet.write_string(row, col, text)?,
            CellValue::Number(n) => worksheet.write_number(row, col, *n)?,
            CellValue::Bool(b) => worksheet.write_boolean(row, col, *b)?,
            CellValue::DateTime(serial) => {
                worksheet.write_number_with_format(row, col, *serial, &date)?
            }
            CellValue::Formula(formula) => worksheet.write_formula(row, col, formula.as_str())?,
        };
    }
    Ok(())
}

/// Reads every worksheet of `path`, in workbook order
///
/// Values and formulas survive. Cell styles, column widths and other
/// workbook features are not read back; the header style is reapplied
/// when the header row is found.
fn read_existing_workbook(path: &Path) -> OutputResult<Vec<ExistingSheet>> {
    let mut workbook: Xlsx<BufReader<File>> = open_workbook(path)?;

    let names = workbook.sheet_names();
    if names.is_empty() {
        return Err(OutputError::Format(format!(
            "{} has no worksheets",
            path.display()
        )));
    }

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let mut sheet = ExistingSheet::empty(&name);

        let values = workbook.worksheet_range(&name)?;
        let (start_row, start_col) = values.start().unwrap_or((0, 0));
        for (row, col, data) in values.used_cells() {
            let value = match data {
                Data::Empty => continue,
                Data::String(s) => CellValue::Text(s.clone()),
                Data::Float(f) => CellValue::Number(*f),
                Data::Int(i) => CellValue::Number(*i as f64),
                Data::Bool(b) => CellValue::Bool(*b),
                Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
                other => CellValue::Text(other.to_string()),
            };
            let key = cell_key(path, start_row + row as u32, start_col + col as u32)?;
            sheet.cells.insert(key, value);
        }

        // A formula replaces the cached value read above
        let formulas = workbook.worksheet_formula(&name)?;
        let (start_row, start_col) = formulas.start().unwrap_or((0, 0));
        for (row, col, formula) in formulas.used_cells() {
            let key = cell_key(path, start_row + row as u32, start_col + col as u32)?;
            sheet.cells.insert(key, CellValue::Formula(formula.clone()));
        }

        sheets.push(sheet);
    }

    Ok(sheets)
}

fn cell_key(path: &Path, row: u32, col: u32) -> OutputResult<(u32, u16)> {
    let col = u16::try_from(col).map_err(|_| {
        OutputError::Format(format!("{} has too many columns", path.display()))
    })?;
    Ok((row, col))
}
