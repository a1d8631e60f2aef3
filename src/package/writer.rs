use std::collections::HashMap;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use super::Package;
use crate::error::Result;

/// Write `package` back to a new container, replacing the parts named in
/// `replaced`.
///
/// Entries keep their original order and compression method. Entries that are
/// not replaced are copied through raw, without recompressing.
pub(crate) fn write_package(package: &Package, replaced: &HashMap<String, Vec<u8>>) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(package.data()))?;
    let mut zip = ZipWriter::new(Cursor::new(Vec::with_capacity(package.data().len())));

    for index in 0..archive.len() {
        let file = archive.by_index_raw(index)?;
        match replaced.get(file.name()) {
            Some(data) => {
                let name = file.name().to_string();
                let options = SimpleFileOptions::default().compression_method(file.compression());
                drop(file);
                zip.start_file(name, options)?;
                zip.write_all(data)?;
            }
            None => zip.raw_copy_file(file)?,
        }
    }

    Ok(zip.finish()?.into_inner())
}
