//! Source reading + row normalization for the authored spreadsheet.

pub mod catalog;
pub mod client;
pub mod rows;

pub const CRATE_NAME: &str = "smena-sheets";

pub use catalog::{MenuSheet, RoleSheet, SheetCatalog};
pub use client::{GoogleSheetClient, RawRow, SheetSource, SourceError};
