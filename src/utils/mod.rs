pub mod file_name;
pub mod logging;
pub mod query;

pub use file_name::sanitize_file_name;
pub use logging::truncate_text;
pub use query::parse_query;
