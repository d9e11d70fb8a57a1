pub mod display_info;
pub mod file;

pub use display_info::{localize_display_info, to_pretty_json};
pub use file::localize_file;
