// src/report/csv.rs

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::optimization::OptimizationResult;
use crate::sizing::{ReportEntry, SizingReport, DESIGN_DIM};

/// CSV出力の設定とヘッダーの書き込み
pub fn setup_csv_output(path: &Path) -> Result<BufWriter<File>, std::io::Error> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let output_file = File::create(path)?;
    let mut writer = BufWriter::new(output_file);
    write_csv_header(&mut writer)?;
    Ok(writer)
}

/// CSVヘッダーの書き込み
pub fn write_csv_header<W: Write>(writer: &mut W) -> Result<(), std::io::Error> {
    writer.write_all(b"category,name,value,unit\n")
}

/// CSV行の作成
pub fn create_csv_row(entry: &ReportEntry) -> String {
    format!("{},{},{},{}\n", entry.category, entry.name, entry.value, entry.unit)
}

/// 最適化の統計の行
fn summary_rows(result: &OptimizationResult<DESIGN_DIM>) -> String {
    let mut rows = String::new();
    rows.push_str(&format!("optimizer,strategy,{},-\n", result.strategy));
    rows.push_str(&format!("optimizer,iterations,{},-\n", result.iterations));
    rows.push_str(&format!("optimizer,evaluations,{},-\n", result.evaluations));
    rows.push_str(&format!("optimizer,converged,{},-\n", result.converged()));
    rows.push_str(&format!("optimizer,max_violation,{},-\n", result.max_violation));
    rows
}

/// レポート全体をCSVに書き出す
pub fn write_report_csv<W: Write>(
    writer: &mut W,
    report: &SizingReport,
    result: Option<&OptimizationResult<DESIGN_DIM>>,
) -> Result<(), std::io::Error> {
    for entry in report.entries() {
        writer.write_all(create_csv_row(&entry).as_bytes())?;
    }
    if let Some(result) = result {
        writer.write_all(summary_rows(result).as_bytes())?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizing::Category;

    #[test]
    fn test_csv_row_format() {
        let entry = ReportEntry {
            name: "mass_total",
            value: 301.5,
            unit: "kg",
            category: Category::Mass,
        };
        assert_eq!(create_csv_row(&entry), "mass,mass_total,301.5,kg\n");
    }

    #[test]
    fn test_csv_header() {
        let mut buf = Vec::new();
        write_csv_header(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "category,name,value,unit\n");
    }
}
