//! Google Sheets facade: spreadsheets addressed by Drive path, rows read as
//! header-keyed records.

pub mod cell;
pub mod client;
pub mod error;
pub mod types;

pub use cell::{parse_cell, CellValue};
pub use client::SheetsClient;
pub use error::SheetsError;
pub use types::{Spreadsheet, ValueRange, Worksheet};
