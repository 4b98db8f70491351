//! Per-project settings file parsing.
//!
//! A project directory is recognized by the presence of a settings file of
//! newline-delimited `key=value` entries. The parser is deliberately
//! forgiving: blank lines, lines without a `=`, and lines whose key is empty
//! are skipped, and unknown keys are kept in the map and ignored by the
//! consumer.

use std::collections::HashMap;
use std::path::Path;

/// Recognized settings keys. Anything else is ignored at resolution time.
pub const KEY_IMAGE_NAME: &str = "ImageName";
pub const KEY_SRC_DIR: &str = "SrcDir";
pub const KEY_ENGINE: &str = "Engine";
pub const KEY_BUILD_COMMAND: &str = "BuildCommand";

/// Parse settings file text into a flat string map.
///
/// Keys and values are whitespace-trimmed. A `=` at position zero makes the
/// line malformed (empty key) and it is skipped.
pub fn parse(text: &str) -> HashMap<String, String> {
    let mut settings = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        let Some(eq) = line.find('=') else {
            continue;
        };
        if eq == 0 {
            continue;
        }
        let key = line[..eq].trim();
        let value = line[eq + 1..].trim();
        settings.insert(key.to_string(), value.to_string());
    }
    settings
}

/// Load and parse a settings file.
///
/// A missing or unreadable file yields an empty map, not an error; the
/// project then runs entirely on defaults.
pub fn load(path: &Path) -> HashMap<String, String> {
    match std::fs::read_to_string(path) {
        Ok(text) => parse(&text),
        Err(_) => HashMap::new(),
    }
}
