//! Physical (ZIP) container of an OPC package.
//!
//! Reading loads every member into memory: source decks are opened, copied
//! from and dropped within a single merge step, and random access to slide,
//! layout and media members dominates.

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// All members of a package archive, keyed by member name.
pub struct PhysPkgReader {
    members: HashMap<String, Vec<u8>>,
}

impl PhysPkgReader {
    /// Open a package file.
    ///
    /// A missing file is reported as [`OpcError::PackageNotFound`] so callers
    /// can tell it apart from a file that exists but is not a package.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(OpcError::PackageNotFound(path.to_path_buf()));
        }
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let mut members = HashMap::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut blob = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut blob)?;
            members.insert(file.name().to_string(), blob);
        }

        Ok(Self { members })
    }

    /// Number of members in the archive.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, pack_uri: &PackURI) -> bool {
        self.members.contains_key(pack_uri.membername())
    }

    pub fn blob_for(&self, pack_uri: &PackURI) -> Option<&[u8]> {
        self.members.get(pack_uri.membername()).map(Vec::as_slice)
    }

    /// Move a member's content out of the reader.
    pub fn take_blob(&mut self, pack_uri: &PackURI) -> Option<Vec<u8>> {
        self.members.remove(pack_uri.membername())
    }
}

/// Writes package members into a new deflated archive.
pub struct PhysPkgWriter {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl PhysPkgWriter {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    pub fn write(&mut self, pack_uri: &PackURI, blob: &[u8]) -> Result<()> {
        self.writer.start_file(pack_uri.membername(), self.options)?;
        self.writer.write_all(blob)?;
        Ok(())
    }

    /// Finish the archive and return its bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        Ok(self.writer.finish()?.into_inner())
    }
}

impl Default for PhysPkgWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let uri = PackURI::new("/ppt/slides/slide1.xml").unwrap();
        let mut writer = PhysPkgWriter::new();
        writer.write(&uri, b"<p:sld/>").unwrap();
        let bytes = writer.finish().unwrap();

        let mut reader = PhysPkgReader::from_bytes(bytes).unwrap();
        assert_eq!(reader.len(), 1);
        assert!(reader.contains(&uri));
        assert_eq!(reader.blob_for(&uri), Some(&b"<p:sld/>"[..]));
        assert_eq!(reader.take_blob(&uri).unwrap(), b"<p:sld/>".to_vec());
        assert!(reader.is_empty());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = PhysPkgReader::open(dir.path().join("absent.pptx")).err().unwrap();
        assert!(matches!(err, OpcError::PackageNotFound(_)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(PhysPkgReader::from_bytes(b"not a zip archive".to_vec()).is_err());
    }
}
