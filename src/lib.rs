pub mod config;
pub mod engine;
pub mod import;
pub mod models;
pub mod portfolio;
pub mod proxy;
pub mod store;

pub use import::{
    parse_csv, parse_file, parse_table, parse_xlsx, validate_positions, PreviewRow,
    ValidationResult,
};
pub use models::Position;
