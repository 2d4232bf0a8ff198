//! Decode uploaded documents into the in-memory workbook model.

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto, open_workbook_auto_from_rs};
use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};
use tracing::debug;

use crate::conf::{C_NUM_FORMAT_DATE, C_NUM_FORMAT_DATETIME, C_NUM_FORMAT_TIME, TUP_BOOL_TEXT};
use crate::sheet::{SpecWorkbook, SpecWorksheet};
use crate::spec::{ChecklistError, EnumCellValue};

////////////////////////////////////////////////////////////////////////////////
// #region Spreadsheet

/// Decode spreadsheet bytes (xlsx, xlsm, xlsb, xls, ods) into a workbook.
pub fn read_workbook_from_bytes(bytes: &[u8]) -> Result<SpecWorkbook, ChecklistError> {
    if bytes.is_empty() {
        return Err(ChecklistError::MissingInput);
    }

    let mut sheets = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|err| ChecklistError::Decode(err.to_string()))?;

    let l_sheet_names = sheets.sheet_names().to_vec();
    let mut l_worksheets = Vec::with_capacity(l_sheet_names.len());
    for c_sheet_name in l_sheet_names {
        let range = sheets
            .worksheet_range(&c_sheet_name)
            .map_err(|err| ChecklistError::Decode(format!("sheet {c_sheet_name:?}: {err}")))?;
        l_worksheets.push(derive_worksheet_from_range(&c_sheet_name, &range));
    }

    debug!(n_sheets = l_worksheets.len(), "decoded workbook bytes");
    Ok(SpecWorkbook::new(l_worksheets))
}

/// Decode a spreadsheet file on disk.
pub fn read_workbook_from_path(path: impl AsRef<Path>) -> Result<SpecWorkbook, ChecklistError> {
    let path = path.as_ref();
    let mut sheets = open_workbook_auto(path)
        .map_err(|err| ChecklistError::Decode(format!("{}: {err}", path.display())))?;

    let l_sheet_names = sheets.sheet_names().to_vec();
    let mut l_worksheets = Vec::with_capacity(l_sheet_names.len());
    for c_sheet_name in l_sheet_names {
        let range = sheets
            .worksheet_range(&c_sheet_name)
            .map_err(|err| ChecklistError::Decode(format!("sheet {c_sheet_name:?}: {err}")))?;
        l_worksheets.push(derive_worksheet_from_range(&c_sheet_name, &range));
    }

    Ok(SpecWorkbook::new(l_worksheets))
}

fn derive_worksheet_from_range(name: &str, range: &Range<Data>) -> SpecWorksheet {
    let mut worksheet = SpecWorksheet::new(name);
    // Ranges start at the first used cell, not at A1.
    let (n_row_start, n_col_start) = range
        .start()
        .map_or((0, 0), |(row, col)| (row as usize, col as usize));

    for (n_idx_row, row) in range.rows().enumerate() {
        for (n_idx_col, data) in row.iter().enumerate() {
            let value = derive_cell_value_from_data(data);
            if value.is_empty() {
                continue;
            }
            let cell =
                worksheet.cell_mut(n_row_start + n_idx_row + 1, n_col_start + n_idx_col + 1);
            cell.value = value;
            if let Some(c_num_format) = derive_num_format_from_data(data) {
                cell.format.num_format = Some(c_num_format.to_string());
            }
        }
    }
    worksheet
}

fn derive_cell_value_from_data(data: &Data) -> EnumCellValue {
    match data {
        Data::Empty => EnumCellValue::None,
        Data::String(val) => EnumCellValue::String(val.clone()),
        Data::Float(val) => EnumCellValue::Number(*val),
        Data::Int(val) => EnumCellValue::Number(*val as f64),
        Data::Bool(val) => EnumCellValue::String(TUP_BOOL_TEXT[usize::from(*val)].to_string()),
        // Serial kept; the cell's number format renders it as a date.
        Data::DateTime(dt) => EnumCellValue::Number(dt.as_f64()),
        _ => EnumCellValue::String(data.to_string()),
    }
}

fn derive_num_format_from_data(data: &Data) -> Option<&'static str> {
    let Data::DateTime(dt) = data else {
        return None;
    };
    let n_serial = dt.as_f64();
    let if_has_date = n_serial.floor() > 0.0;
    let if_has_time = n_serial.fract().abs() > 1e-4;
    match (if_has_date, if_has_time) {
        (true, true) => Some(C_NUM_FORMAT_DATETIME),
        (false, true) => Some(C_NUM_FORMAT_TIME),
        _ => Some(C_NUM_FORMAT_DATE),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ArrowIpc

/// Decode a DataFrame in Arrow IPC form; column names become row 1.
pub fn read_workbook_from_ipc_bytes(
    bytes: &[u8],
    sheet_name: &str,
) -> Result<SpecWorkbook, ChecklistError> {
    if bytes.is_empty() {
        return Err(ChecklistError::MissingInput);
    }

    let df = IpcReader::new(Cursor::new(bytes))
        .finish()
        .map_err(|err| ChecklistError::Decode(format!("Failed to read IPC DataFrame bytes: {err}")))?;

    let worksheet = derive_worksheet_from_dataframe(&df, sheet_name)?;
    Ok(SpecWorkbook::new(vec![worksheet]))
}

fn derive_worksheet_from_dataframe(
    df: &DataFrame,
    sheet_name: &str,
) -> Result<SpecWorksheet, ChecklistError> {
    let mut worksheet = SpecWorksheet::new(sheet_name);

    for (n_idx_col, c_col_name) in df.get_column_names_str().into_iter().enumerate() {
        worksheet.set_value(1, n_idx_col + 1, c_col_name);
    }

    for (n_idx_col, col) in df.get_columns().iter().enumerate() {
        for n_idx_row in 0..df.height() {
            let value = col
                .get(n_idx_row)
                .map_err(|err| ChecklistError::Decode(format!("Failed to read cell value: {err}")))?;
            let value = derive_cell_value_from_any_value(value);
            if !value.is_empty() {
                worksheet.set_value(n_idx_row + 2, n_idx_col + 1, value);
            }
        }
    }
    Ok(worksheet)
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(TUP_BOOL_TEXT[usize::from(val)].to_string())
        }
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
