use std::fs;
use std::io;
use std::path::Path;

use regex::{Captures, Regex};

/// Load text file with encoding detection
///
/// A byte-order mark decides the encoding when present; otherwise the file
/// is read as UTF-8 and falls back to Windows-1252 when that fails.
pub fn load_text_file_with_guess_encoding(file_path: &Path) -> io::Result<String> {
    let bytes = fs::read(file_path)?;
    Ok(decode_with_guess_encoding(&bytes))
}

pub fn decode_with_guess_encoding(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = encoding_rs::Encoding::for_bom(bytes) {
        let (cow, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return cow.into_owned();
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (cow, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            cow.into_owned()
        }
    }
}

/// Replace environment variables written as `${VAR_NAME}`.
///
/// Unset variables are left as written.
pub fn substitute_env_vars(content: &str) -> Result<String, regex::Error> {
    let pattern = Regex::new(r"\$\{(\w+)\}")?;
    let replaced = pattern.replace_all(content, |caps: &Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    Ok(replaced.into_owned())
}
