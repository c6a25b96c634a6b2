//! EPUB archives as corpus entries, using the `epub` crate.
//!
//! Spine items are read in reading order, followed by every other XHTML
//! resource of the manifest sorted by path. Guide and index pages are often
//! linked from the spine without being part of it. Each page becomes a
//! [`CorpusEntry`] named by its path inside the archive.

use std::collections::HashSet;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use epub::doc::EpubDoc;
use tracing::{debug, info};

use crate::error::{CorpusError, CorpusResult};

use super::{CorpusEntry, DocumentClass, classify};

/// An opened EPUB archive.
pub struct EpubArchive<R: Read + Seek> {
    origin: String,
    doc: EpubDoc<R>,
}

impl EpubArchive<Cursor<Vec<u8>>> {
    /// Open an archive from a file on disk.
    pub fn open(path: &Path) -> CorpusResult<Self> {
        let data = std::fs::read(path).map_err(|e| CorpusError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_bytes(&path.display().to_string(), data)
    }

    /// Open an archive held in memory. `origin` names it in errors.
    pub fn from_bytes(origin: &str, data: Vec<u8>) -> CorpusResult<Self> {
        let doc = EpubDoc::from_reader(Cursor::new(data)).map_err(|e| CorpusError::Archive {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            origin: origin.to_string(),
            doc,
        })
    }
}

const XHTML_MIME: &str = "application/xhtml+xml";

impl<R: Read + Seek> EpubArchive<R> {
    /// Every XHTML page that is not classified as skippable.
    pub fn entries(&mut self) -> CorpusResult<Vec<CorpusEntry>> {
        let mut entries = Vec::new();
        for path in self.page_paths() {
            let name = path.to_string_lossy().replace('\\', "/");
            if classify(&name) == DocumentClass::Skip {
                debug!(path = %name, "skipping structural entry");
                continue;
            }
            let Some(content) = self.doc.get_resource_str_by_path(&path) else {
                return Err(CorpusError::Archive {
                    path: self.origin.clone(),
                    message: format!("unreadable page {name}"),
                });
            };
            entries.push(CorpusEntry::new(name, content));
        }

        info!(archive = %self.origin, entries = entries.len(), "read archive");
        Ok(entries)
    }

    /// Spine paths in reading order, then the remaining XHTML resources.
    fn page_paths(&mut self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut paths = Vec::new();
        for index in 0..self.doc.get_num_chapters() {
            self.doc.set_current_chapter(index);
            if let Some(path) = self.doc.get_current_path() {
                if seen.insert(path.clone()) {
                    paths.push(path);
                }
            }
        }

        let mut rest: Vec<PathBuf> = self
            .doc
            .resources
            .values()
            .filter(|r| r.mime == XHTML_MIME && !seen.contains(&r.path))
            .map(|r| r.path.clone())
            .collect();
        rest.sort();
        rest.dedup();
        if !rest.is_empty() {
            debug!(archive = %self.origin, pages = rest.len(), "pages outside the spine");
        }
        paths.extend(rest);
        paths
    }
}

/// Read the entries of several archives, in the order given.
pub fn read_archives(paths: &[impl AsRef<Path>]) -> CorpusResult<Vec<CorpusEntry>> {
    let mut entries = Vec::new();
    for path in paths {
        entries.extend(EpubArchive::open(path.as_ref())?.entries()?);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    const PACKAGE: &str = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Scriptures</dc:title>
    <dc:identifier id="uid">scriptures</dc:identifier>
  </metadata>
  <manifest>
    <item id="cover" href="cover.xhtml" media-type="application/xhtml+xml"/>
    <item id="gen_1" href="gen_1.xhtml" media-type="application/xhtml+xml"/>
    <item id="tg_faith" href="tg_faith.xhtml" media-type="application/xhtml+xml"/>
    <item id="style" href="style.css" media-type="text/css"/>
  </manifest>
  <spine>
    <itemref idref="cover"/>
    <itemref idref="gen_1"/>
  </spine>
</package>"#;

    fn archive() -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let stored =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let files = [
            ("mimetype", "application/epub+zip"),
            ("META-INF/container.xml", CONTAINER),
            ("OEBPS/content.opf", PACKAGE),
            ("OEBPS/cover.xhtml", "<html><body>cover</body></html>"),
            ("OEBPS/gen_1.xhtml", "<html><body>genesis</body></html>"),
            ("OEBPS/tg_faith.xhtml", "<html><body>faith</body></html>"),
            ("OEBPS/style.css", "p {}"),
        ];
        for (name, content) in files {
            zip.start_file(name, stored).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn pages_outside_the_spine_are_read() {
        let mut archive = EpubArchive::from_bytes("scriptures.epub", archive()).unwrap();
        let entries = archive.entries().unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["OEBPS/gen_1.xhtml", "OEBPS/tg_faith.xhtml"]);
        assert_eq!(entries[1].content, "<html><body>faith</body></html>");
    }

    #[test]
    fn invalid_archive_returns_error() {
        let err = EpubArchive::from_bytes("bogus.epub", b"This is not an EPUB".to_vec())
            .err()
            .unwrap();
        assert!(matches!(err, CorpusError::Archive { ref path, .. } if path == "bogus.epub"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = read_archives(&[dir.path().join("absent.epub")]).unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));
    }
}
