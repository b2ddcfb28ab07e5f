use crate::config::ExtractionConfig;
use crate::error::{PencilTextError, Result};
use crate::markup::Element;
use crate::scanner::page_filter::PageFilter;
use std::path::{Component, Path, PathBuf};

/// A page markup file found inside an unpacked document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFile {
    pub source_path: PathBuf,
    pub relative_path: PathBuf,
    /// File name of the page; used as the page identifier in CSV rows.
    pub name: String,
}

impl PageFile {
    pub fn new(source_path: PathBuf, relative_path: PathBuf) -> Self {
        let name = source_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();

        Self {
            source_path,
            relative_path,
            name,
        }
    }

    pub fn display_path(&self) -> String {
        self.relative_path.display().to_string()
    }

    pub fn load_markup(&self) -> Result<Element> {
        Element::parse_file(&self.source_path).map_err(|e| PencilTextError::Markup {
            page: self.display_path(),
            message: e.to_string(),
        })
    }

    /// Overwrites the page file with `root`, XML declaration included.
    pub fn store_markup(&self, root: &Element) -> Result<()> {
        root.write_file(&self.source_path).map_err(|e| PencilTextError::Markup {
            page: self.display_path(),
            message: e.to_string(),
        })
    }
}

pub struct PageLocator {
    filter: PageFilter,
}

impl PageLocator {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            filter: PageFilter::new(config),
        }
    }

    /// Returns the pages under `root`. Nothing is read until the sequence is iterated.
    pub fn find_pages<P: Into<PathBuf>>(&self, root: P) -> Pages {
        Pages {
            root: root.into(),
            filter: self.filter.clone(),
        }
    }
}

impl Default for PageLocator {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

/// Lazy, restartable sequence of page files. Each call to [`Pages::iter`]
/// walks the directory again; entries come back sorted by file name so the
/// order is stable across runs.
#[derive(Debug, Clone)]
pub struct Pages {
    root: PathBuf,
    filter: PageFilter,
}

impl Pages {
    pub fn iter(&self) -> PageIter<'_> {
        let walker = walkdir::WalkDir::new(&self.root)
            .follow_links(false) // Security: don't follow symlinks
            .sort_by_file_name()
            .into_iter();

        PageIter {
            pages: self,
            walker,
        }
    }

    pub fn count(&self) -> Result<usize> {
        self.iter().try_fold(0, |count, page| page.map(|_| count + 1))
    }
}

impl<'a> IntoIterator for &'a Pages {
    type Item = Result<PageFile>;
    type IntoIter = PageIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct PageIter<'a> {
    pages: &'a Pages,
    walker: walkdir::IntoIter,
}

impl Iterator for PageIter<'_> {
    type Item = Result<PageFile>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(err.into())),
            };

            if !entry.file_type().is_file() || !self.pages.filter.is_page_file(entry.path()) {
                continue;
            }

            return Some(
                relative_path(entry.path(), &self.pages.root)
                    .map(|relative| PageFile::new(entry.path().to_path_buf(), relative)),
            );
        }
    }
}

fn relative_path(file_path: &Path, root_path: &Path) -> Result<PathBuf> {
    let relative = file_path
        .strip_prefix(root_path)
        .map_err(|_| PencilTextError::InvalidPath {
            path: format!(
                "Cannot calculate relative path for {} from root {}",
                file_path.display(),
                root_path.display()
            ),
        })?;

    if relative
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(PencilTextError::InvalidPath {
            path: format!(
                "Path contains parent directory references: {}",
                relative.display()
            ),
        });
    }

    Ok(relative.to_path_buf())
}
