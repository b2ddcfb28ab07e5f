use crate::error::{PencilTextError, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const ZIP_MAGIC: [u8; 2] = *b"PK";
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Container flavour of an `.epgz` document. Detected once at unpack time
/// and carried through to repack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Zip,
    TarGz,
}

impl Format {
    pub fn from_magic(magic: &[u8]) -> Option<Self> {
        match magic {
            m if m == ZIP_MAGIC => Some(Format::Zip),
            m if m == GZIP_MAGIC => Some(Format::TarGz),
            _ => None,
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Zip => write!(f, "zip"),
            Format::TarGz => write!(f, "tar.gz"),
        }
    }
}

pub fn detect_format<P: AsRef<Path>>(path: P) -> Result<Format> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| missing_or_io(path, e))?;

    let mut magic = [0u8; 2];
    let mut filled = 0;
    while filled < magic.len() {
        let n = file.read(&mut magic[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    Format::from_magic(&magic[..filled]).ok_or_else(|| PencilTextError::UnrecognizedFormat {
        path: path.display().to_string(),
    })
}

/// Unpacks `archive` into `dest` and returns the detected container format.
pub fn unpack<P: AsRef<Path>, Q: AsRef<Path>>(archive: P, dest: Q) -> Result<Format> {
    let archive = archive.as_ref();
    let dest = dest.as_ref();
    let format = detect_format(archive)?;

    log::debug!("Unpacking {} ({}) into {}", archive.display(), format, dest.display());

    match format {
        Format::Zip => unpack_zip(archive, dest)?,
        Format::TarGz => unpack_tar_gz(archive, dest)?,
    }

    Ok(format)
}

fn unpack_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file))?;
    zip.extract(dest)?;
    Ok(())
}

fn unpack_tar_gz(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    let base = fs::canonicalize(dest)?;

    for entry in tar.entries()? {
        let mut entry = entry?;
        let name = entry.path()?.into_owned();

        // Security: every entry must land inside the destination before anything is written
        let target = contained_path(&base, &name).ok_or_else(|| PencilTextError::PathTraversal {
            entry: name.display().to_string(),
        })?;

        let kind = entry.header().entry_type();
        if kind.is_symlink() || kind.is_hard_link() {
            log::warn!("Skipping link entry {} in {}", name.display(), archive.display());
            continue;
        }

        if kind.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        entry.unpack(&target)?;
    }

    Ok(())
}

/// Resolves `entry` against `base` and returns the destination path only if
/// it stays inside `base`, including through symlinks already on disk.
pub fn contained_path(base: &Path, entry: &Path) -> Option<PathBuf> {
    let mut resolved = base.to_path_buf();

    for component in entry.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if resolved == base || !resolved.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if !resolved.starts_with(base) {
        return None;
    }

    // Follow the deepest existing ancestor so a symlink planted earlier cannot redirect the write
    let mut existing = resolved.as_path();
    while !existing.exists() {
        existing = existing.parent()?;
    }
    let real = fs::canonicalize(existing).ok()?;
    if !real.starts_with(base) {
        return None;
    }

    Some(resolved)
}

/// Writes every regular file under `source_dir` into a new archive at
/// `output`, preserving relative paths. A failed repack leaves no output
/// file behind.
pub fn repack<P: AsRef<Path>, Q: AsRef<Path>>(source_dir: P, output: Q, format: Format) -> Result<()> {
    let source_dir = source_dir.as_ref();
    let output = output.as_ref();

    let files = collect_files(source_dir)?;
    log::debug!(
        "Repacking {} files from {} into {} ({})",
        files.len(),
        source_dir.display(),
        output.display(),
        format
    );

    let result = match format {
        Format::Zip => repack_zip(&files, output),
        Format::TarGz => repack_tar_gz(&files, output),
    };

    if result.is_err() && output.exists() {
        let _ = fs::remove_file(output);
    }

    result
}

struct PackedFile {
    source: PathBuf,
    name: String,
}

fn collect_files(source_dir: &Path) -> Result<Vec<PackedFile>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(source_dir)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|_| PencilTextError::InvalidPath {
                path: entry.path().display().to_string(),
            })?;

        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        files.push(PackedFile {
            source: entry.path().to_path_buf(),
            name,
        });
    }

    Ok(files)
}

fn repack_zip(files: &[PackedFile], output: &Path) -> Result<()> {
    let file = File::create(output)?;
    let mut zip = zip::ZipWriter::new(BufWriter::new(file));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for packed in files {
        zip.start_file(packed.name.as_str(), options)?;
        let mut source = File::open(&packed.source)?;
        io::copy(&mut source, &mut zip)?;
    }

    let mut writer = zip.finish()?;
    writer.flush()?;
    Ok(())
}

fn repack_tar_gz(files: &[PackedFile], output: &Path) -> Result<()> {
    let mut builder = tar::Builder::new(Vec::new());
    for packed in files {
        builder.append_path_with_name(&packed.source, &packed.name)?;
    }
    let tar_bytes = builder.into_inner()?;

    let file = File::create(output)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    encoder.write_all(&tar_bytes)?;
    encoder.finish()?.flush()?;
    Ok(())
}

fn missing_or_io(path: &Path, error: io::Error) -> PencilTextError {
    if error.kind() == io::ErrorKind::NotFound {
        PencilTextError::MissingFile {
            path: path.display().to_string(),
        }
    } else {
        PencilTextError::Io(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn write_tree(root: &Path) {
        fs::create_dir_all(root.join("content")).unwrap();
        fs::write(root.join("content.xml"), b"<Document/>").unwrap();
        fs::write(root.join("content/page_1.xml"), b"<Page>one</Page>").unwrap();
        fs::write(root.join("content/logo.png"), [0u8, 1, 2, 3, 255]).unwrap();
    }

    fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
        collect_files(root)
            .unwrap()
            .into_iter()
            .map(|f| (f.name, fs::read(f.source).unwrap()))
            .collect()
    }

    #[test]
    fn test_format_from_magic() {
        assert_eq!(Format::from_magic(b"PK"), Some(Format::Zip));
        assert_eq!(Format::from_magic(&[0x1F, 0x8B]), Some(Format::TarGz));
        assert_eq!(Format::from_magic(b"<?"), None);
        assert_eq!(Format::from_magic(b"P"), None);
    }

    #[test]
    fn test_detect_format_rejects_unknown_and_short_files() {
        let temp = TempDir::new().unwrap();
        let text = temp.path().join("doc.epgz");
        fs::write(&text, b"<?xml version='1.0'?>").unwrap();
        assert!(matches!(
            detect_format(&text),
            Err(PencilTextError::UnrecognizedFormat { .. })
        ));

        let short = temp.path().join("short.epgz");
        fs::write(&short, b"P").unwrap();
        assert!(matches!(
            detect_format(&short),
            Err(PencilTextError::UnrecognizedFormat { .. })
        ));

        assert!(matches!(
            detect_format(temp.path().join("absent.epgz")),
            Err(PencilTextError::MissingFile { .. })
        ));
    }

    #[test]
    fn test_zip_round_trip() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let unpacked = temp.path().join("unpacked");
        fs::create_dir_all(&unpacked).unwrap();
        write_tree(&source);

        let archive = temp.path().join("doc.epgz");
        repack(&source, &archive, Format::Zip).unwrap();
        assert_eq!(detect_format(&archive).unwrap(), Format::Zip);

        assert_eq!(unpack(&archive, &unpacked).unwrap(), Format::Zip);
        assert_eq!(read_tree(&source), read_tree(&unpacked));
    }

    #[test]
    fn test_tar_gz_round_trip() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let unpacked = temp.path().join("unpacked");
        fs::create_dir_all(&unpacked).unwrap();
        write_tree(&source);

        let archive = temp.path().join("doc.epgz");
        repack(&source, &archive, Format::TarGz).unwrap();
        assert_eq!(detect_format(&archive).unwrap(), Format::TarGz);

        assert_eq!(unpack(&archive, &unpacked).unwrap(), Format::TarGz);
        assert_eq!(read_tree(&source), read_tree(&unpacked));
    }

    #[test]
    fn test_contained_path_rules() {
        let temp = TempDir::new().unwrap();
        let base = fs::canonicalize(temp.path()).unwrap();

        assert_eq!(
            contained_path(&base, Path::new("content/page_1.xml")),
            Some(base.join("content/page_1.xml"))
        );
        assert_eq!(
            contained_path(&base, Path::new("./content/../page_2.xml")),
            Some(base.join("page_2.xml"))
        );
        assert_eq!(contained_path(&base, Path::new("../../evil")), None);
        assert_eq!(contained_path(&base, Path::new("content/../../evil")), None);
        assert_eq!(contained_path(&base, Path::new("/etc/passwd")), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_contained_path_rejects_symlink_escape() {
        let temp = TempDir::new().unwrap();
        let base = fs::canonicalize(temp.path()).unwrap().join("root");
        let outside = fs::canonicalize(temp.path()).unwrap().join("outside");
        fs::create_dir_all(&base).unwrap();
        fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, base.join("link")).unwrap();

        assert_eq!(contained_path(&base, Path::new("link/evil")), None);
    }

    #[test]
    fn test_failed_repack_leaves_no_output() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("missing_dir").join("out.epgz");
        let source = temp.path().join("source");
        write_tree(&source);

        assert!(repack(&source, &output, Format::Zip).is_err());
        assert!(!output.exists());
    }
}
