use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};

/// In-memory copy of an OPC (ZIP) package.
///
/// Entries keep their original order and metadata so that an unmodified
/// package is written back with the same layout.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    entries: Vec<PackageEntry>,
}

#[derive(Debug, Clone)]
pub struct PackageEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub compression: CompressionMethod,
    pub last_modified: zip::DateTime,
    pub unix_mode: Option<u32>,
    pub is_dir: bool,
}

impl DocxPackage {
    /// Read every entry of a ZIP archive.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| Error::DocxOpen(format!("not a ZIP package: {e}")))?;

        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut file = zip
                .by_index(i)
                .map_err(|e| Error::DocxOpen(format!("bad ZIP entry {i}: {e}")))?;
            let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
            file.read_to_end(&mut data)
                .map_err(|e| Error::DocxOpen(format!("failed to read {}: {e}", file.name())))?;
            entries.push(PackageEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                last_modified: file.last_modified().unwrap_or_default(),
                unix_mode: file.unix_mode(),
                is_dir: file.is_dir(),
            });
        }

        Ok(Self { entries })
    }

    /// Raw bytes of a part, by exact entry name.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| !e.is_dir && e.name == name)
            .map(|e| e.data.as_slice())
    }

    /// Write the package, substituting the parts named in `replacements`.
    pub fn to_bytes(&self, replacements: &HashMap<String, Vec<u8>>) -> Result<Vec<u8>> {
        let mut zout = ZipWriter::new(Cursor::new(Vec::new()));

        for entry in &self.entries {
            let mut opts = SimpleFileOptions::default()
                .compression_method(entry.compression)
                .last_modified_time(entry.last_modified);
            if let Some(mode) = entry.unix_mode {
                opts = opts.unix_permissions(mode);
            }

            if entry.is_dir || entry.name.ends_with('/') {
                zout.add_directory(entry.name.as_str(), opts)
                    .map_err(|e| Error::DocxSave(format!("add dir {}: {e}", entry.name)))?;
                continue;
            }

            let data = replacements
                .get(&entry.name)
                .map_or(entry.data.as_slice(), Vec::as_slice);
            zout.start_file(entry.name.as_str(), opts)
                .map_err(|e| Error::DocxSave(format!("start {}: {e}", entry.name)))?;
            zout.write_all(data)
                .map_err(|e| Error::DocxSave(format!("write {}: {e}", entry.name)))?;
        }

        let cursor = zout
            .finish()
            .map_err(|e| Error::DocxSave(format!("finish ZIP: {e}")))?;
        Ok(cursor.into_inner())
    }
}
