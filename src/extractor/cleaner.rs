use crate::error::{PencilTextError, Result};
use quick_xml::escape::resolve_html5_entity;
use regex::{Captures, Regex};

/// Normalizes candidate strings before they are compared or exported:
/// entity references are decoded, inline tags removed, whitespace trimmed.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    entities: Regex,
    tags: Regex,
}

impl TextCleaner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            entities: compile(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{0,31});")?,
            tags: compile(r"<[^>]+>")?,
        })
    }

    pub fn clean(&self, raw: &str) -> String {
        let decoded = self.decode_entities(raw);
        self.tags.replace_all(&decoded, "").trim().to_string()
    }

    /// Decodes each reference on its own; an unknown name or a stray `&`
    /// stays as written without blocking the others.
    fn decode_entities(&self, raw: &str) -> String {
        self.entities
            .replace_all(raw, |caps: &Captures| {
                let reference = &caps[1];
                decode_reference(reference).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

fn decode_reference(reference: &str) -> Option<String> {
    let code = match reference.strip_prefix('#') {
        Some(number) => match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        },
        None => return resolve_html5_entity(reference).map(str::to_string),
    };

    match char::from_u32(code) {
        Some(c) if c != '\0' => Some(c.to_string()),
        _ => None,
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| PencilTextError::Config {
        message: format!("Invalid pattern {}: {}", pattern, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_inline_tags() {
        let cleaner = TextCleaner::new().unwrap();
        assert_eq!(cleaner.clean("<b>Guardar</b> cambios"), "Guardar cambios");
        assert_eq!(cleaner.clean("<span style=\"color:red\">Error</span>"), "Error");
    }

    #[test]
    fn test_decodes_entities() {
        let cleaner = TextCleaner::new().unwrap();
        assert_eq!(cleaner.clean("Fish &amp; Chips"), "Fish & Chips");
        assert_eq!(cleaner.clean("Espa&ntilde;a"), "España");
        assert_eq!(cleaner.clean("&#191;Seguro?"), "¿Seguro?");
        assert_eq!(cleaner.clean("&#xBF;Seguro?"), "¿Seguro?");
    }

    #[test]
    fn test_escaped_markup_is_decoded_then_stripped() {
        let cleaner = TextCleaner::new().unwrap();
        assert_eq!(cleaner.clean("&lt;i&gt;Nota&lt;/i&gt;"), "Nota");
    }

    #[test]
    fn test_trims_and_keeps_bare_ampersand() {
        let cleaner = TextCleaner::new().unwrap();
        assert_eq!(cleaner.clean("  Tom & Jerry \n"), "Tom & Jerry");
        assert_eq!(cleaner.clean(" \t "), "");
    }

    #[test]
    fn test_bare_ampersand_does_not_block_other_entities() {
        let cleaner = TextCleaner::new().unwrap();
        assert_eq!(cleaner.clean("Fish & Chips &amp; more"), "Fish & Chips & more");
        assert_eq!(cleaner.clean("R&D &bogus; &eacute;xito"), "R&D &bogus; éxito");
        assert_eq!(cleaner.clean("&#0; &#1114112;"), "&#0; &#1114112;");
    }
}
