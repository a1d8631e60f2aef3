use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::xml::local_name;

const OFFICE_DOCUMENT_REL: &str = "/officeDocument";
const SLIDE_REL: &str = "/slide";

/// A single relationship from a `.rels` part.
#[derive(Debug, Clone)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
    external: bool,
}

/// An opened PPTX package.
///
/// Holds the original container bytes so untouched entries can be copied
/// through verbatim when the package is written back.
#[derive(Debug, Clone)]
pub(crate) struct Package {
    data: Vec<u8>,
    main_part: String,
    slide_parts: Vec<String>,
}

impl Package {
    /// Open a package and resolve its slide parts in presentation order.
    pub(crate) fn open(data: Vec<u8>) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data.as_slice()))?;

        // 1. Package relationships name the main presentation part
        let package_rels = read_archive_file(&mut archive, "_rels/.rels")?;
        let main_part = parse_relationships(&package_rels)?
            .into_iter()
            .find(|rel| !rel.external && rel.rel_type.ends_with(OFFICE_DOCUMENT_REL))
            .map(|rel| resolve_target("", &rel.target))
            .ok_or_else(|| {
                Error::TemplateCorrupt("no officeDocument relationship in _rels/.rels".into())
            })?;
        let main_part = entry_name(&archive, &main_part)?;

        // 2. Slide order comes from the presentation's sldIdLst
        let presentation = read_archive_file(&mut archive, &main_part)?;
        let slide_ids = parse_slide_id_list(&presentation)?;

        // 3. Map each slide r:id through the presentation relationships
        let presentation_rels = read_archive_file(&mut archive, &rels_part_for(&main_part))?;
        let rels = parse_relationships(&presentation_rels)?;

        let mut slide_parts = Vec::with_capacity(slide_ids.len());
        for rid in slide_ids {
            let rel = rels
                .iter()
                .find(|rel| rel.id == rid && rel.rel_type.ends_with(SLIDE_REL))
                .ok_or_else(|| {
                    Error::TemplateCorrupt(format!("slide relationship {rid} not found"))
                })?;
            let target = resolve_target(&main_part, &rel.target);
            slide_parts.push(entry_name(&archive, &target)?);
        }

        drop(archive);
        Ok(Self {
            data,
            main_part,
            slide_parts,
        })
    }

    pub(crate) fn main_part(&self) -> &str {
        &self.main_part
    }

    /// Slide part names in presentation order, spelled as the archive entries
    /// that hold them.
    pub(crate) fn slide_parts(&self) -> &[String] {
        &self.slide_parts
    }

    /// The original container bytes.
    pub(crate) fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn read_part(&self, name: &str) -> Result<Vec<u8>> {
        let mut archive = ZipArchive::new(Cursor::new(self.data.as_slice()))?;
        read_archive_file_bytes(&mut archive, name)
    }
}

fn read_archive_file<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<String> {
    let bytes = read_archive_file_bytes(archive, path)?;
    let bytes = strip_bom(&bytes);
    Ok(String::from_utf8(bytes.to_vec())?)
}

fn read_archive_file_bytes<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Vec<u8>> {
    let name = entry_name(archive, path)?;
    let mut file = archive.by_name(&name)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

/// Name of the archive entry holding the part `path`.
///
/// Relationship targets may be percent-encoded while the entry name is not,
/// and part names compare case-insensitively.
fn entry_name<R: Read + std::io::Seek>(archive: &ZipArchive<R>, path: &str) -> Result<String> {
    let decoded = percent_encoding::percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| Error::TemplateCorrupt(format!("invalid UTF-8 in part name: {path}")))?;
    let candidates = [path, decoded.as_ref()];

    if let Some(exact) = candidates
        .iter()
        .find(|name| archive.index_for_name(name).is_some())
    {
        return Ok(exact.to_string());
    }

    let lowered: Vec<String> = candidates.iter().map(|name| name.to_lowercase()).collect();
    archive
        .file_names()
        .find(|name| lowered.contains(&name.to_lowercase()))
        .map(str::to_string)
        .ok_or_else(|| Error::TemplateCorrupt(format!("missing part: {path}")))
}

/// Strip UTF-8 BOM (byte order mark) if present
pub(crate) fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}

fn parse_relationships(content: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut rels = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                    external: false,
                };
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => rel.id = String::from_utf8(attr.value.to_vec())?,
                        b"Type" => rel.rel_type = String::from_utf8(attr.value.to_vec())?,
                        b"Target" => rel.target = String::from_utf8(attr.value.to_vec())?,
                        b"TargetMode" => rel.external = attr.value.as_ref() == b"External",
                        _ => {}
                    }
                }
                if !rel.id.is_empty() {
                    rels.push(rel);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }
    Ok(rels)
}

/// Collect the `r:id` of every `p:sldId` in document order.
fn parse_slide_id_list(content: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut ids = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                // The unprefixed `id` is the numeric slide id; the relationship
                // id is the namespaced one.
                for attr in e.attributes().flatten() {
                    if attr.key.prefix().is_some() && attr.key.local_name().as_ref() == b"id" {
                        ids.push(String::from_utf8(attr.value.to_vec())?);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }
    Ok(ids)
}

/// Name of the relationships part belonging to `part`.
fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target against the part that declares it.
fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize_part_name(absolute);
    }
    match source_part.rsplit_once('/') {
        Some((dir, _)) => normalize_part_name(&format!("{dir}/{target}")),
        None => normalize_part_name(target),
    }
}

fn normalize_part_name(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
