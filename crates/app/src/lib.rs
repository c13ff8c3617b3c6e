pub mod config;
pub mod session;
pub mod workbook;

pub use config::{ConfigError, SessionConfig, DEFAULT_THRESHOLD};
pub use session::{build_flow_graph, CategoryTotal, LoadError, Session};
pub use workbook::{is_spreadsheet, read_grid, WorkbookError};
