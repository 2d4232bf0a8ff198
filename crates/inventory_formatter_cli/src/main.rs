//! Command-line front end: format one inventory file into a checklist.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use inventory_formatter::{
    SpecChecklistOptions, SpecChecklistReport, SpecChecklistRequest,
    derive_default_checklist_options, process_checklist_bytes,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Turn an inventory spreadsheet into a printable audit checklist.
#[derive(Debug, Parser)]
#[command(name = "inventory-formatter", version, about)]
struct Args {
    /// Uploaded spreadsheet (xlsx, xls, xlsb, ods).
    input: PathBuf,

    /// Output file; defaults to `ProcessedFile.xlsx` next to the input.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Remove the "Author" column.
    #[arg(long)]
    remove_author: bool,
    /// Remove the "Location" column.
    #[arg(long)]
    remove_location: bool,
    /// Remove the "ISBN/ISSN" column.
    #[arg(long)]
    remove_isbn: bool,
    /// Remove the "Edition" column.
    #[arg(long)]
    remove_edition: bool,
    /// Remove the "Availability" column.
    #[arg(long)]
    remove_availability: bool,

    /// Initials of the person taking inventory.
    #[arg(long)]
    initials: Option<String>,
    /// Inventory end date, written above the initials header.
    #[arg(long)]
    end_date: Option<String>,

    /// Minimum column width in characters.
    #[arg(long)]
    width_floor: Option<usize>,
    /// Font applied to every cell.
    #[arg(long)]
    font_name: Option<String>,
    /// Font size applied to every cell.
    #[arg(long)]
    font_size: Option<i64>,
    /// Author recorded in document properties.
    #[arg(long)]
    creator: Option<String>,
}

impl Args {
    fn to_request(&self) -> SpecChecklistRequest {
        SpecChecklistRequest {
            remove_author: self.remove_author,
            remove_location: self.remove_location,
            remove_isbn: self.remove_isbn,
            remove_edition: self.remove_edition,
            remove_availability: self.remove_availability,
            initials: self.initials.clone(),
            end_date: self.end_date.clone(),
        }
    }

    fn to_options(&self) -> SpecChecklistOptions {
        let mut options = derive_default_checklist_options();
        if let Some(n_floor) = self.width_floor {
            options.width.width_floor = n_floor;
        }
        if let Some(c_font) = &self.font_name {
            options.style.fmt_base.font_name = Some(c_font.clone());
            options.style.fmt_header.font_name = Some(c_font.clone());
        }
        if let Some(n_size) = self.font_size {
            options.style.fmt_base.font_size = Some(n_size);
            options.style.fmt_header.font_size = Some(n_size);
        }
        if let Some(c_creator) = &self.creator {
            options.creator = c_creator.clone();
        }
        options
    }

    fn output_path(&self, file_name: &str) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => self
                .input
                .parent()
                .map_or_else(|| PathBuf::from(file_name), |dir| dir.join(file_name)),
        }
    }
}

fn run(args: &Args) -> Result<(PathBuf, SpecChecklistReport)> {
    let bytes = fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let (output, report) = process_checklist_bytes(&bytes, &args.to_request(), args.to_options())?;

    let path_out = args.output_path(&output.file_name);
    fs::write(&path_out, &output.bytes)
        .with_context(|| format!("failed to write {}", path_out.display()))?;

    Ok((path_out, report))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let (path_out, report) = run(&args)?;

    for c_warning in &report.warnings {
        eprintln!("warning: {c_warning}");
    }
    info!(path = %path_out.display(), "wrote checklist");
    println!("{}", report.format("[CHECKLIST]"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use inventory_formatter::{
        SpecWorkbook, SpecWorksheet, read_workbook_from_path, serialize_workbook,
    };

    use super::*;

    fn write_upload(dir: &std::path::Path) -> PathBuf {
        let ws = SpecWorksheet::from_rows(
            "Sheet1",
            [["Title", "Author", "Edition"], ["Dune", "Herbert", "1st"]],
        );
        let output = serialize_workbook(&SpecWorkbook::new(vec![ws]), "upload.xlsx")
            .expect("serialize upload");
        let path = dir.join("upload.xlsx");
        fs::write(&path, output.bytes).expect("write upload");
        path
    }

    #[test]
    fn test_run_writes_processed_file_next_to_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path_in = write_upload(dir.path());

        let args = Args::parse_from([
            "inventory-formatter",
            path_in.to_str().expect("utf8 path"),
            "--remove-author",
            "--initials",
            "JD",
        ]);
        let (path_out, report) = run(&args).expect("run");

        assert_eq!(path_out, dir.path().join("ProcessedFile.xlsx"));
        assert_eq!(report.cols_removed, vec!["Author"]);

        let workbook = read_workbook_from_path(&path_out).expect("read output");
        assert_eq!(
            workbook.worksheets[0].row_texts(3),
            vec!["Title", "Edition", "Inventory Date", "✓", "Initials"]
        );
    }

    #[test]
    fn test_cli_options_override_defaults() {
        let args = Args::parse_from([
            "inventory-formatter",
            "in.xlsx",
            "--width-floor",
            "14",
            "--font-name",
            "Calibri",
            "--output",
            "out.xlsx",
        ]);
        let options = args.to_options();

        assert_eq!(options.width.width_floor, 14);
        assert_eq!(options.style.fmt_base.font_name.as_deref(), Some("Calibri"));
        assert_eq!(options.style.fmt_header.bold, Some(true));
        assert_eq!(args.output_path("ProcessedFile.xlsx"), PathBuf::from("out.xlsx"));
    }

    #[test]
    fn test_missing_input_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path_in = dir.path().join("absent.xlsx");
        let args = Args::parse_from(["inventory-formatter", path_in.to_str().expect("utf8 path")]);

        let err = run(&args).expect_err("missing file");
        assert!(err.to_string().contains("absent.xlsx"));
    }
}
