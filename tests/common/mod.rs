#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use pencil_text::{PencilTextError, Translator};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

pub fn page_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<p:Page xmlns:p="http://www.evolus.vn/Namespace/Pencil" xmlns="http://www.w3.org/2000/svg">
  <p:Properties>
    <p:property name="width">1024</p:property>
  </p:Properties>
  <p:Content>
    {}
  </p:Content>
</p:Page>
"#,
        body
    )
}

pub fn content_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<Document xmlns="http://www.evolus.vn/Namespace/Pencil"><Pages><Page href="page_1.xml"/></Pages></Document>
"#
}

pub fn build_zip(path: &Path, entries: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

pub fn build_tar_gz(path: &Path, entries: &[(&str, &str)]) {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        builder
            .append_data(&mut header, name, content.as_bytes())
            .unwrap();
    }
    write_gzip(path, &builder.into_inner().unwrap());
}

/// A tar.gz whose single entry name climbs out of the extraction directory.
/// The name is written into the raw header because the builder refuses `..`.
pub fn build_traversal_tar_gz(path: &Path, entry_name: &str) {
    let data = b"pwned";
    let mut header = tar::Header::new_old();
    header.as_old_mut().name[..entry_name.len()].copy_from_slice(entry_name.as_bytes());
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_entry_type(tar::EntryType::Regular);
    header.set_cksum();

    let mut builder = tar::Builder::new(Vec::new());
    builder.append(&header, &data[..]).unwrap();
    write_gzip(path, &builder.into_inner().unwrap());
}

fn write_gzip(path: &Path, bytes: &[u8]) {
    let mut encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap();
}

/// Unpacks `archive` and returns every file keyed by its relative path.
pub fn archive_contents(archive: &Path) -> BTreeMap<String, Vec<u8>> {
    let dir = TempDir::new().unwrap();
    pencil_text::archive::unpack(archive, dir.path()).unwrap();

    WalkDir::new(dir.path())
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e
                .path()
                .strip_prefix(dir.path())
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            (relative, std::fs::read(e.path()).unwrap())
        })
        .collect()
}

pub fn archive_page(archive: &Path, name: &str) -> String {
    let contents = archive_contents(archive);
    String::from_utf8(contents[name].clone()).unwrap()
}

/// Translator that prefixes the target language and fails on chosen texts.
#[derive(Debug, Default)]
pub struct StubTranslator {
    pub failing: Vec<String>,
    pub calls: RefCell<Vec<String>>,
}

impl StubTranslator {
    pub fn failing_on(texts: &[&str]) -> Self {
        Self {
            failing: texts.iter().map(|t| t.to_string()).collect(),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl Translator for StubTranslator {
    fn translate(&self, text: &str, _source: &str, target: &str) -> pencil_text::Result<String> {
        self.calls.borrow_mut().push(text.to_string());
        if self.failing.iter().any(|f| f == text) {
            return Err(PencilTextError::ProviderError {
                message: "429 Too Many Requests".to_string(),
            });
        }
        Ok(format!("[{}] {}", target, text))
    }
}
