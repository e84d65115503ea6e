/*!
 * Zip container access for OOXML packages.
 *
 * Entries are kept in archive order with their original compression method so
 * an untouched part is written back byte-for-byte.
 */

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use log::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::errors::DocxError;

// @struct: One archive entry
#[derive(Debug, Clone)]
pub struct PackagePart {
    // @field: Entry name, e.g. "word/document.xml"
    pub name: String,

    // @field: Raw entry bytes
    pub data: Vec<u8>,

    // @field: Compression used when the entry was read
    pub compression: CompressionMethod,

    // @field: Directory entries carry no data
    pub is_dir: bool,
}

/// An opened OOXML package
#[derive(Debug, Clone, Default)]
pub struct DocxPackage {
    parts: Vec<PackagePart>,
}

impl DocxPackage {
    /// Read a package from a file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DocxError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        debug!("Opened package {:?} ({} bytes)", path, bytes.len());
        Self::from_bytes(&bytes)
    }

    /// Read a package from an in-memory archive
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| DocxError::archive("<archive>", e))?;

        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|e| DocxError::archive(format!("<entry {}>", index), e))?;
            let name = file.name().to_string();
            let is_dir = file.is_dir();
            let compression = match file.compression() {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };

            let mut data = Vec::with_capacity(file.size() as usize);
            if !is_dir {
                file.read_to_end(&mut data)
                    .map_err(|e| DocxError::archive(&name, e))?;
            }

            parts.push(PackagePart { name, data, compression, is_dir });
        }

        Ok(Self { parts })
    }

    /// Names of all entries, in archive order
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Whether an entry exists
    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|p| p.name == name)
    }

    /// Raw bytes of an entry
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name && !p.is_dir)
            .map(|p| p.data.as_slice())
    }

    /// Raw bytes of an entry that must exist
    pub fn require_part(&self, name: &str) -> Result<&[u8], DocxError> {
        self.part(name)
            .ok_or_else(|| DocxError::MissingPart(name.to_string()))
    }

    /// Entry decoded as UTF-8 text
    pub fn part_text(&self, name: &str) -> Result<Option<&str>, DocxError> {
        match self.part(name) {
            Some(bytes) => std::str::from_utf8(bytes)
                .map(Some)
                .map_err(|_| DocxError::Encoding { part: name.to_string() }),
            None => Ok(None),
        }
    }

    /// Replace an entry's bytes, appending the entry when it is new
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        if let Some(part) = self.parts.iter_mut().find(|p| p.name == name) {
            part.data = data;
            part.is_dir = false;
        } else {
            self.parts.push(PackagePart {
                name: name.to_string(),
                data,
                compression: CompressionMethod::Deflated,
                is_dir: false,
            });
        }
    }

    /// Serialize the package to an in-memory archive
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for part in &self.parts {
            // Fixed timestamps keep repeated writes byte-identical
            let options = SimpleFileOptions::default()
                .compression_method(part.compression)
                .last_modified_time(DateTime::default());
            if part.is_dir {
                writer
                    .add_directory(part.name.as_str(), options)
                    .map_err(|e| DocxError::archive(&part.name, e))?;
                continue;
            }
            writer
                .start_file(part.name.as_str(), options)
                .map_err(|e| DocxError::archive(&part.name, e))?;
            writer
                .write_all(&part.data)
                .map_err(|e| DocxError::archive(&part.name, e))?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| DocxError::archive("<archive>", e))?;
        Ok(cursor.into_inner())
    }
}
