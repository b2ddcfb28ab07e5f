use crate::archive::{Format, WorkingDirectory};
use crate::config::ExtractionConfig;
use crate::error::{PencilTextError, Result};
use crate::markup::{walk_mut, Element, MarkupNode};
use crate::scanner::{PageLocator, PageProgress};
use crate::substitution::map::SubstitutionMap;
use crate::ui::GracefulShutdown;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Serialize)]
pub struct ReplaceReport {
    pub archive: PathBuf,
    /// `None` when nothing matched and no archive was written.
    pub output: Option<PathBuf>,
    pub format: Format,
    pub substitutions_loaded: usize,
    pub pages_scanned: usize,
    pub pages_modified: usize,
    pub replacements: usize,
    pub duration: Duration,
    pub replaced_at: DateTime<Utc>,
}

impl ReplaceReport {
    pub fn is_unchanged(&self) -> bool {
        self.replacements == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub pages_scanned: usize,
    pub pages_modified: usize,
    pub replacements: usize,
}

pub struct SubstitutionEngine {
    locator: PageLocator,
    shutdown: Option<GracefulShutdown>,
}

impl SubstitutionEngine {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            locator: PageLocator::new(config),
            shutdown: None,
        }
    }

    pub fn with_shutdown(mut self, shutdown: GracefulShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn replace<P, Q, R>(
        &self,
        archive: P,
        csv_in: Q,
        output: R,
        progress_callback: Option<&dyn Fn(&PageProgress)>,
    ) -> Result<ReplaceReport>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        let map = SubstitutionMap::from_csv(csv_in)?;
        self.apply(archive, &map, output, progress_callback)
    }

    /// Rewrites every page of `archive` with `map` and repacks into `output`
    /// with the archive's own format. When no text matched, `output` is left
    /// untouched.
    pub fn apply<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        archive: P,
        map: &SubstitutionMap,
        output: Q,
        progress_callback: Option<&dyn Fn(&PageProgress)>,
    ) -> Result<ReplaceReport> {
        let start = Instant::now();
        let archive = archive.as_ref();
        let output = output.as_ref();
        ensure_distinct(archive, output)?;

        let workspace = WorkingDirectory::unpack(archive)?;
        let outcome = self.rewrite_pages(workspace.path(), map, progress_callback)?;

        let written = if outcome.replacements == 0 {
            log::warn!("No text in {} matched the substitutions; no archive written", archive.display());
            None
        } else {
            workspace.repack(output)?;
            log::info!(
                "{} replacements in {} pages written to {}",
                outcome.replacements,
                outcome.pages_modified,
                output.display()
            );
            Some(output.to_path_buf())
        };

        Ok(ReplaceReport {
            archive: archive.to_path_buf(),
            output: written,
            format: workspace.format(),
            substitutions_loaded: map.len(),
            pages_scanned: outcome.pages_scanned,
            pages_modified: outcome.pages_modified,
            replacements: outcome.replacements,
            duration: start.elapsed(),
            replaced_at: Utc::now(),
        })
    }

    /// Applies `map` to every page under `root`, saving the pages that changed.
    pub fn rewrite_pages(
        &self,
        root: &Path,
        map: &SubstitutionMap,
        progress_callback: Option<&dyn Fn(&PageProgress)>,
    ) -> Result<RewriteOutcome> {
        let pages = self.locator.find_pages(root);
        let mut progress = PageProgress::new(pages.count()?);
        let mut outcome = RewriteOutcome::default();

        for page in &pages {
            if let Some(shutdown) = &self.shutdown {
                shutdown.check_shutdown()?;
            }
            if let Some(callback) = progress_callback {
                callback(&progress);
            }

            let page = page?;
            let mut tree = page.load_markup()?;
            let count = substitute(&page.name, &mut tree, map);

            if count > 0 {
                page.store_markup(&tree)?;
                outcome.pages_modified += 1;
                outcome.replacements += count;
                log::debug!("{}: {} replacements", page.display_path(), count);
            }

            outcome.pages_scanned += 1;
            progress.update_page(page.name);
        }

        if let Some(callback) = progress_callback {
            callback(&progress);
        }

        Ok(outcome)
    }
}

/// Replaces every text and tail span of `root` whose trimmed content has an
/// entry for `page` in `map`. Returns the number of spans replaced.
pub fn substitute(page: &str, root: &mut Element, map: &SubstitutionMap) -> usize {
    let mut count = 0;

    walk_mut(root, &mut |node: &mut Element| {
        if let Some(replacement) = node.text().and_then(|t| map.get(page, t.trim())) {
            node.set_text(replacement.to_string());
            count += 1;
        }
        if let Some(replacement) = node.tail().and_then(|t| map.get(page, t.trim())) {
            node.set_tail(replacement.to_string());
            count += 1;
        }
    });

    count
}

fn ensure_distinct(archive: &Path, output: &Path) -> Result<()> {
    let same = match (archive.canonicalize(), output.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };

    if same {
        return Err(PencilTextError::InvalidPath {
            path: format!("Output would overwrite the input archive: {}", output.display()),
        });
    }
    Ok(())
}
