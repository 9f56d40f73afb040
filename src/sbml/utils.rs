use std::path::Path;

use super::document::SbmlDocument;
use super::error::SBMLError;

lazy_static::lazy_static! {
    /// Characters that cannot appear in element names, with their replacements
    static ref SPECIAL_CHARACTERS: Vec<(&'static str, &'static str)> = vec![
        ("'", "_prime_"),
        ("/", "_slash_"),
        ("[", "_sbo_"),
        ("]", "_sbc_"),
        ("#", "_hash_"),
        ("\"", "_quote_"),
        ("?", "_question_"),
        ("\\", "_slash"),
        ("&", "_and_"),
        ("<", "_greater_"),
    ];
}

/// Reads and parses an SBML document from a file path.
///
/// # Arguments
///
/// * `path` - Path to the SBML file
///
/// # Returns
///
/// A Result containing either the typed document or an SBMLError
pub(crate) fn read_sbml_file(path: &Path) -> Result<SbmlDocument, SBMLError> {
    let xml = std::fs::read_to_string(path)?;
    SbmlDocument::parse(&xml)
}

/// Turns an SBML name or id into a valid element name.
///
/// Special characters are spelled out and a leading digit is prefixed with `_`.
pub(crate) fn element_name(name: &str) -> String {
    let mut sanitized = name.trim().to_string();
    for (character, replacement) in SPECIAL_CHARACTERS.iter() {
        sanitized = sanitized.replace(character, replacement);
    }

    if sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        sanitized.insert(0, '_');
    }

    sanitized
}

/// Name of an SBML element in the network: its name if set, else its id.
pub(crate) fn display_name(name: Option<&str>, id: &str) -> String {
    match name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => element_name(name),
        None => element_name(id),
    }
}
