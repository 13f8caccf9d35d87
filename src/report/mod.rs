// src/report/mod.rs

pub mod csv;
pub mod table;

pub use csv::{create_csv_row, setup_csv_output, write_report_csv};
pub use table::format_table;
