use crate::error::{PencilTextError, Result};
use crate::records::{read_records, TextRecord, NEW_TEXT_COLUMN, PAGE_COLUMN, TEXT_COLUMN};
use std::collections::HashMap;
use std::path::Path;

/// Replacement lookup keyed by page file name, then by original text.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionMap {
    pages: HashMap<String, HashMap<String, String>>,
    len: usize,
}

impl SubstitutionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the map from records, skipping any with an empty page, text or
    /// replacement. A repeated `(page, text)` key keeps the later replacement.
    pub fn from_records<I: IntoIterator<Item = TextRecord>>(records: I) -> Self {
        let mut map = Self::new();
        for record in records {
            let Some(replacement) = record.replacement else {
                continue;
            };
            map.insert(record.page, record.text, replacement);
        }
        map
    }

    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let records = read_records(path, &[PAGE_COLUMN, TEXT_COLUMN, NEW_TEXT_COLUMN])?;
        let map = Self::from_records(records);

        if map.is_empty() {
            return Err(PencilTextError::EmptySubstitutionSet {
                path: path.display().to_string(),
            });
        }

        log::debug!("Loaded {} substitutions from {}", map.len(), path.display());
        Ok(map)
    }

    pub fn insert(&mut self, page: String, text: String, replacement: String) {
        if page.is_empty() || text.is_empty() || replacement.is_empty() {
            return;
        }

        let texts = self.pages.entry(page).or_default();
        match texts.get_mut(&text) {
            Some(existing) => {
                if *existing != replacement {
                    log::warn!(
                        "Duplicate substitution for \"{}\": \"{}\" replaces \"{}\"",
                        text,
                        replacement,
                        existing
                    );
                }
                *existing = replacement;
            }
            None => {
                texts.insert(text, replacement);
                self.len += 1;
            }
        }
    }

    pub fn get(&self, page: &str, text: &str) -> Option<&str> {
        self.pages.get(page)?.get(text).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_lookup_is_page_scoped() {
        let map = SubstitutionMap::from_records(vec![
            TextRecord::new("page_1.xml", "Hello").with_replacement("Hola"),
        ]);

        assert_eq!(map.get("page_1.xml", "Hello"), Some("Hola"));
        assert_eq!(map.get("page_2.xml", "Hello"), None);
        assert_eq!(map.get("page_1.xml", "hello"), None);
    }

    #[test]
    fn test_incomplete_rows_are_discarded() {
        let map = SubstitutionMap::from_records(vec![
            TextRecord::new("", "Hello").with_replacement("Hola"),
            TextRecord::new("page_1.xml", "").with_replacement("Hola"),
            TextRecord::new("page_1.xml", "Hello"),
            TextRecord::new("page_1.xml", "Bye").with_replacement(""),
        ]);
        assert!(map.is_empty());
    }

    #[test]
    fn test_later_duplicate_wins() {
        let map = SubstitutionMap::from_records(vec![
            TextRecord::new("page_1.xml", "OK").with_replacement("Vale"),
            TextRecord::new("page_1.xml", "OK").with_replacement("De acuerdo"),
        ]);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("page_1.xml", "OK"), Some("De acuerdo"));
    }

    #[test]
    fn test_from_csv_rejects_empty_set() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("texts_translated.csv");
        fs::write(&path, "page,text,new_text\npage_1.xml,Hola,\n").unwrap();

        let result = SubstitutionMap::from_csv(&path);
        assert!(matches!(result, Err(PencilTextError::EmptySubstitutionSet { .. })));
    }

    #[test]
    fn test_from_csv_requires_new_text_column() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("texts.csv");
        fs::write(&path, "page,text\npage_1.xml,Hola\n").unwrap();

        let result = SubstitutionMap::from_csv(&path);
        assert!(matches!(result, Err(PencilTextError::InvalidHeader { .. })));
    }

    #[test]
    fn test_from_csv_trims_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("texts_translated.csv");
        fs::write(&path, "page,text,new_text\n page_1.xml , Login ,  Iniciar sesión \n").unwrap();

        let map = SubstitutionMap::from_csv(&path).unwrap();
        assert_eq!(map.get("page_1.xml", "Login"), Some("Iniciar sesión"));
    }
}
