pub mod config;
pub mod excel_read;
pub mod excel_write;
