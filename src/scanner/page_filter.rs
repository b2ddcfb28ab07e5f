use crate::config::ExtractionConfig;
use std::path::Path;

/// Decides which files inside an unpacked document hold page markup.
#[derive(Debug, Clone)]
pub struct PageFilter {
    prefix: String,
    extension: String,
}

impl PageFilter {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            prefix: config.page_prefix.clone(),
            extension: config.page_extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn is_page_file(&self, path: &Path) -> bool {
        let Some(filename) = path.file_name().and_then(|s| s.to_str()) else {
            return false;
        };

        let extension_matches = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext == self.extension);

        extension_matches && filename.starts_with(&self.prefix)
    }
}

impl Default for PageFilter {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_file_detection() {
        let filter = PageFilter::default();

        assert!(filter.is_page_file(Path::new("page_1.xml")));
        assert!(filter.is_page_file(Path::new("content/page_a1b2c3.xml")));
        assert!(filter.is_page_file(Path::new("page_.xml")));

        assert!(!filter.is_page_file(Path::new("content.xml")));
        assert!(!filter.is_page_file(Path::new("page_1.xml.bak")));
        assert!(!filter.is_page_file(Path::new("mypage_1.xml")));
        assert!(!filter.is_page_file(Path::new("page_1.png")));
        assert!(!filter.is_page_file(Path::new("page_1")));
    }

    #[test]
    fn test_custom_convention() {
        let config = ExtractionConfig {
            page_prefix: "screen-".to_string(),
            page_extension: ".svg".to_string(),
            ..ExtractionConfig::default()
        };
        let filter = PageFilter::new(&config);

        assert!(filter.is_page_file(Path::new("screen-home.svg")));
        assert!(!filter.is_page_file(Path::new("page_1.xml")));
    }
}
