pub mod text_file;

pub use text_file::{load_text_file_with_guess_encoding, substitute_env_vars};
