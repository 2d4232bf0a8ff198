//! XLSX writer kernel that serializes the workbook model with `rust_xlsxwriter`.

use std::collections::{BTreeSet, HashMap};

use rust_xlsxwriter::{DocProperties, Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::conf::{C_MIME_XLSX, N_LEN_EXCEL_SHEET_NAME_MAX};
use crate::sheet::{SpecWorkbook, SpecWorkbookMeta, SpecWorksheet};
use crate::spec::{ChecklistError, EnumCellValue, SpecCellFormat, SpecChecklistOutput};
use crate::util::{cast_col_num, cast_row_num, sanitize_sheet_name};

/// Stateful workbook writer; the document stays in memory until saved.
pub struct ChecklistXlsxWriter {
    workbook: Workbook,
    set_sheet_names_existing: BTreeSet<String>,
    dict_formats: HashMap<SpecCellFormat, Format>,
}

impl Default for ChecklistXlsxWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChecklistXlsxWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            set_sheet_names_existing: BTreeSet::new(),
            dict_formats: HashMap::new(),
        }
    }

    /// Write document properties.
    pub fn write_meta(&mut self, meta: &SpecWorkbookMeta) {
        let properties = DocProperties::new().set_author(&meta.creator);
        self.workbook.set_properties(&properties);
    }

    /// Write one worksheet: cells, formats, widths and page setup.
    pub fn write_sheet(&mut self, sheet: &SpecWorksheet) -> Result<(), ChecklistError> {
        let sheet_name_unique =
            self.derive_unique_sheet_name(&sanitize_sheet_name(&sheet.name, "_"));

        let mut l_cells: Vec<(u32, u16, &EnumCellValue, Format)> = Vec::new();
        for ((row, col), cell) in sheet.cells() {
            if cell.value.is_empty() && cell.format.is_empty() {
                continue;
            }
            let format = self.derive_format(&cell.format);
            l_cells.push((
                cast_row_num(row).map_err(ChecklistError::OutOfBounds)?,
                cast_col_num(col).map_err(ChecklistError::OutOfBounds)?,
                &cell.value,
                format,
            ));
        }

        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet_name_unique)?;

        for (row_num, col_num, value, format) in &l_cells {
            write_cell_with_format(worksheet, *row_num, *col_num, value, format)?;
        }

        for col in 1..=sheet.n_cols() {
            let n_width = sheet
                .column_width(col)
                .unwrap_or(sheet.page.default_col_width);
            worksheet.set_column_width(
                cast_col_num(col).map_err(ChecklistError::OutOfBounds)?,
                n_width,
            )?;
        }

        write_page_setup(worksheet, sheet);
        Ok(())
    }

    /// Encode the workbook into `.xlsx` bytes.
    pub fn save_to_buffer(&mut self) -> Result<Vec<u8>, ChecklistError> {
        Ok(self.workbook.save_to_buffer()?)
    }

    fn derive_format(&mut self, spec: &SpecCellFormat) -> Format {
        self.dict_formats
            .entry(spec.clone())
            .or_insert_with(|| derive_rust_xlsx_format(spec))
            .clone()
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if !self.set_sheet_names_existing.contains(name) {
            self.set_sheet_names_existing.insert(name.to_string());
            return name.to_string();
        }

        let base_name: String = name
            .chars()
            .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
            .collect();

        let mut n_idx = 2usize;
        loop {
            let candidate: String = format!("{base_name}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            if !self.set_sheet_names_existing.contains(&candidate) {
                self.set_sheet_names_existing.insert(candidate.clone());
                return candidate;
            }
            n_idx += 1;
        }
    }
}

/// Serialize every worksheet of `workbook` into a downloadable document.
pub fn serialize_workbook(
    workbook: &SpecWorkbook,
    file_name: &str,
) -> Result<SpecChecklistOutput, ChecklistError> {
    let mut writer = ChecklistXlsxWriter::new();
    writer.write_meta(&workbook.meta);
    for sheet in &workbook.worksheets {
        writer.write_sheet(sheet)?;
    }

    Ok(SpecChecklistOutput {
        bytes: writer.save_to_buffer()?,
        file_name: file_name.to_string(),
        mime_type: C_MIME_XLSX.to_string(),
    })
}

fn write_page_setup(worksheet: &mut Worksheet, sheet: &SpecWorksheet) {
    let page = &sheet.page;

    worksheet.set_default_row_height(page.default_row_height);
    if page.if_landscape {
        worksheet.set_landscape();
    }
    worksheet.set_print_fit_to_pages(page.fit_to_width, page.fit_to_height);
    if let Some(c_header) = &page.header_text {
        worksheet.set_header(c_header);
    }
    if let Some(c_footer) = &page.footer_text {
        worksheet.set_footer(c_footer);
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_num: u32,
    col_num: u16,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), ChecklistError> {
    match value {
        EnumCellValue::None => {
            worksheet.write_blank(row_num, col_num, format)?;
        }
        EnumCellValue::String(val) if val.is_empty() => {
            worksheet.write_blank(row_num, col_num, format)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(row_num, col_num, val, format)?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(row_num, col_num, *val, format)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }

    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if let Some(val) = spec.top {
        format = format.set_border_top(derive_format_border(val));
    }
    if let Some(val) = spec.bottom {
        format = format.set_border_bottom(derive_format_border(val));
    }
    if let Some(val) = spec.left {
        format = format.set_border_left(derive_format_border(val));
    }
    if let Some(val) = spec.right {
        format = format.set_border_right(derive_format_border(val));
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "justify" => Some(FormatAlign::Justify),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}
