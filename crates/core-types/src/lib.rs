pub mod enums;
pub mod error;
pub mod structs;
pub mod table;
pub mod value;

// Re-export the core types to provide a clean public API.
pub use enums::Severity;
pub use error::CoreError;
pub use structs::ValidationDefinition;
pub use table::Table;
pub use value::{Row, Value, render_rows};
