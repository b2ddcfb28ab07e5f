use crate::archive::codec::{self, Format};
use crate::error::Result;
use std::path::Path;
use tempfile::TempDir;

/// Scratch directory owned by a single unpack/modify/repack cycle.
///
/// The directory and everything in it is removed when the value is dropped,
/// so early returns and `?` propagation never leak scratch space.
pub struct WorkingDirectory {
    dir: TempDir,
    format: Format,
}

impl WorkingDirectory {
    /// Creates a fresh scratch directory and unpacks `archive` into it.
    pub fn unpack<P: AsRef<Path>>(archive: P) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("pencil-text-").tempdir()?;
        let format = codec::unpack(archive, dir.path())?;

        Ok(Self { dir, format })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Repacks the current contents using the format the archive was unpacked with.
    pub fn repack<P: AsRef<Path>>(&self, output: P) -> Result<()> {
        codec::repack(self.path(), output, self.format)
    }
}
