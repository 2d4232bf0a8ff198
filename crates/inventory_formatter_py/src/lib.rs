use inventory_formatter::conf::derive_default_checklist_options;
use inventory_formatter::spec::{
    ChecklistError, SpecCellFormat, SpecChecklistOptions, SpecChecklistOutput,
    SpecChecklistRequest,
};
use inventory_formatter::{
    process_checklist_bytes, read_workbook_from_ipc_bytes, run_checklist_pipeline,
    serialize_workbook,
};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyAny, PyBytes, PyTuple};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "inventory_formatter.checklist.v1";
const C_BRIDGE_TRANSPORT: &str = "bytes";

/// Format uploaded spreadsheet bytes into a checklist.
///
/// Returns `(bytes, file_name, mime_type)`.
#[pyfunction]
#[pyo3(signature = (
    data,
    remove_author = false,
    remove_location = false,
    remove_isbn = false,
    remove_edition = false,
    remove_availability = false,
    initials = None,
    end_date = None,
    options = None
))]
#[allow(clippy::too_many_arguments)]
fn process_file<'py>(
    py: Python<'py>,
    data: Option<Vec<u8>>,
    remove_author: bool,
    remove_location: bool,
    remove_isbn: bool,
    remove_edition: bool,
    remove_availability: bool,
    initials: Option<String>,
    end_date: Option<String>,
    options: Option<&Bound<'py, PyAny>>,
) -> PyResult<Bound<'py, PyTuple>> {
    let request = SpecChecklistRequest {
        remove_author,
        remove_location,
        remove_isbn,
        remove_edition,
        remove_availability,
        initials,
        end_date,
    };
    let cfg_options = parse_spec_checklist_options(options)?;
    let v_data = data.unwrap_or_default();

    let (output, _report) = py
        .allow_threads(|| process_checklist_bytes(&v_data, &request, cfg_options))
        .map_err(convert_checklist_error)?;

    create_output_tuple(py, &output)
}

/// Format a DataFrame serialized as Arrow IPC; column names form the header row.
#[pyfunction]
#[pyo3(signature = (
    data_ipc,
    sheet_name = "Sheet1",
    remove_author = false,
    remove_location = false,
    remove_isbn = false,
    remove_edition = false,
    remove_availability = false,
    initials = None,
    end_date = None,
    options = None
))]
#[allow(clippy::too_many_arguments)]
fn process_dataframe_ipc<'py>(
    py: Python<'py>,
    data_ipc: Vec<u8>,
    sheet_name: &str,
    remove_author: bool,
    remove_location: bool,
    remove_isbn: bool,
    remove_edition: bool,
    remove_availability: bool,
    initials: Option<String>,
    end_date: Option<String>,
    options: Option<&Bound<'py, PyAny>>,
) -> PyResult<Bound<'py, PyTuple>> {
    let request = SpecChecklistRequest {
        remove_author,
        remove_location,
        remove_isbn,
        remove_edition,
        remove_availability,
        initials,
        end_date,
    };
    let cfg_options = parse_spec_checklist_options(options)?;
    let c_sheet_name = sheet_name.to_string();

    let output = py
        .allow_threads(|| -> Result<SpecChecklistOutput, ChecklistError> {
            let file_name_out = cfg_options.file_name_out.clone();
            let workbook = read_workbook_from_ipc_bytes(&data_ipc, &c_sheet_name)?;
            let (workbook, _report) = run_checklist_pipeline(workbook, &request, cfg_options)?;
            serialize_workbook(&workbook, &file_name_out)
        })
        .map_err(convert_checklist_error)?;

    create_output_tuple(py, &output)
}

fn create_output_tuple<'py>(
    py: Python<'py>,
    output: &SpecChecklistOutput,
) -> PyResult<Bound<'py, PyTuple>> {
    let obj_bytes = PyBytes::new(py, &output.bytes);
    PyTuple::new(
        py,
        [
            obj_bytes.into_any(),
            output.file_name.clone().into_pyobject(py)?.into_any(),
            output.mime_type.clone().into_pyobject(py)?.into_any(),
        ],
    )
}

fn convert_checklist_error(err: ChecklistError) -> PyErr {
    if err.is_client_error() {
        PyValueError::new_err(err.to_string())
    } else {
        PyRuntimeError::new_err(err.to_string())
    }
}

fn parse_spec_checklist_options(
    obj: Option<&Bound<'_, PyAny>>,
) -> PyResult<SpecChecklistOptions> {
    let mut cfg_options = derive_default_checklist_options();
    let Some(obj) = obj else {
        return Ok(cfg_options);
    };
    if obj.is_none() {
        return Ok(cfg_options);
    }

    if let Some(v) = extract_optional_attr::<String>(obj, "creator")? {
        cfg_options.creator = v;
    }
    if let Some(v) = extract_optional_attr::<String>(obj, "placeholder")? {
        cfg_options.placeholder = v;
    }
    if let Some(v) = extract_optional_attr::<usize>(obj, "width_floor")? {
        cfg_options.width.width_floor = v;
    }
    if let Some(v) = extract_optional_attr::<usize>(obj, "row_padding_first")? {
        cfg_options.padding.row_first = v;
    }
    if let Some(v) = extract_optional_attr::<usize>(obj, "row_padding_last")? {
        cfg_options.padding.row_last = v;
    }
    if let Some(v) = extract_optional_attr::<usize>(obj, "n_rows_header_block")? {
        cfg_options.n_rows_header_block = v;
    }
    if let Some(v) = extract_optional_attr::<Vec<String>>(obj, "prune_baseline")? {
        cfg_options.prune_baseline = v;
    }
    if let Some(v) = extract_optional_attr::<String>(obj, "file_name_out")? {
        cfg_options.file_name_out = v;
    }

    let style = &mut cfg_options.style;
    if let Some(fmt_patch) = parse_spec_cell_format(extract_optional_attr_bound(obj, "fmt_base")?)? {
        style.fmt_base = style.fmt_base.merge(&fmt_patch);
        style.fmt_header = style.fmt_header.merge(&fmt_patch);
    }
    if let Some(fmt_patch) =
        parse_spec_cell_format(extract_optional_attr_bound(obj, "fmt_header")?)?
    {
        style.fmt_header = style.fmt_header.merge(&fmt_patch);
    }
    if let Some(fmt_patch) =
        parse_spec_cell_format(extract_optional_attr_bound(obj, "fmt_border")?)?
    {
        style.fmt_border = style.fmt_border.merge(&fmt_patch);
    }

    Ok(cfg_options)
}

fn parse_spec_cell_format(obj: Option<Bound<'_, PyAny>>) -> PyResult<Option<SpecCellFormat>> {
    let Some(obj) = obj else {
        return Ok(None);
    };

    Ok(Some(SpecCellFormat {
        font_name: extract_optional_attr::<String>(&obj, "font_name")?,
        font_size: extract_optional_attr::<i64>(&obj, "font_size")?,
        bold: extract_optional_attr::<bool>(&obj, "bold")?,
        italic: extract_optional_attr::<bool>(&obj, "italic")?,
        align: extract_optional_attr::<String>(&obj, "align")?,
        valign: extract_optional_attr::<String>(&obj, "valign")?,
        border: extract_optional_attr::<i64>(&obj, "border")?,
        text_wrap: extract_optional_attr::<bool>(&obj, "text_wrap")?,
        top: extract_optional_attr::<i64>(&obj, "top")?,
        bottom: extract_optional_attr::<i64>(&obj, "bottom")?,
        left: extract_optional_attr::<i64>(&obj, "left")?,
        right: extract_optional_attr::<i64>(&obj, "right")?,
        num_format: extract_optional_attr::<String>(&obj, "num_format")?,
    }))
}

fn extract_optional_attr<T>(obj: &Bound<'_, PyAny>, attr: &str) -> PyResult<Option<T>>
where
    for<'a> T: FromPyObject<'a>,
{
    if !obj.hasattr(attr)? {
        return Ok(None);
    }
    let val = obj.getattr(attr)?;
    if val.is_none() {
        return Ok(None);
    }
    Ok(Some(val.extract::<T>()?))
}

fn extract_optional_attr_bound<'py>(
    obj: &Bound<'py, PyAny>,
    attr: &str,
) -> PyResult<Option<Bound<'py, PyAny>>> {
    if !obj.hasattr(attr)? {
        return Ok(None);
    }
    let val = obj.getattr(attr)?;
    if val.is_none() {
        return Ok(None);
    }
    Ok(Some(val))
}

#[pymodule]
fn _inventory_formatter_rs(_py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_function(wrap_pyfunction!(process_file, module)?)?;
    module.add_function(wrap_pyfunction!(process_dataframe_ipc, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
