pub mod cert;
pub mod core;

pub use core::{ApiClient, ExportFormat, GENERIC_ASSIGN_ERROR};
