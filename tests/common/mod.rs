//! In-memory PPTX fixtures for integration tests.
#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// A plain run. `text` is inserted as-is, so it must already be escaped.
pub fn run(text: &str) -> String {
    format!("<a:r><a:rPr lang=\"en-US\" dirty=\"0\"/><a:t>{text}</a:t></a:r>")
}

/// A run with an optional typeface and size in points.
pub fn styled_run(text: &str, typeface: Option<&str>, size_pt: Option<u32>) -> String {
    let sz = size_pt
        .map(|pt| format!(" sz=\"{}\"", pt * 100))
        .unwrap_or_default();
    let latin = typeface
        .map(|face| format!("<a:solidFill><a:srgbClr val=\"1F497D\"/></a:solidFill><a:latin typeface=\"{face}\"/>"))
        .unwrap_or_default();
    format!("<a:r><a:rPr lang=\"ko-KR\" altLang=\"en-US\"{sz}>{latin}</a:rPr><a:t>{text}</a:t></a:r>")
}

pub fn line_break() -> String {
    "<a:br><a:rPr lang=\"en-US\"/></a:br>".to_string()
}

pub fn paragraph(runs: &[String]) -> String {
    format!(
        "<a:p><a:pPr algn=\"ctr\"/>{}<a:endParaRPr lang=\"en-US\"/></a:p>",
        runs.concat()
    )
}

pub fn text_box(id: u32, name: &str, paragraphs: &[String]) -> String {
    format!(
        "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"{name}\"/><p:cNvSpPr txBox=\"1\"/><p:nvPr/></p:nvSpPr>\
         <p:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"100\" cy=\"100\"/></a:xfrm></p:spPr>\
         <p:txBody><a:bodyPr wrap=\"square\"/><a:lstStyle/>{}</p:txBody></p:sp>",
        paragraphs.concat()
    )
}

pub fn picture(id: u32, name: &str) -> String {
    format!(
        "<p:pic><p:nvPicPr><p:cNvPr id=\"{id}\" name=\"{name}\"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr>\
         <p:blipFill><a:blip r:embed=\"rId2\"/></p:blipFill><p:spPr/></p:pic>"
    )
}

pub fn slide_xml(shapes: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
         <p:sld {NS}><p:cSld><p:spTree>\
         <p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>\
         <p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/></a:xfrm></p:grpSpPr>\
         {}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>",
        shapes.concat()
    )
}

/// Builder for a minimal but well-formed presentation package.
#[derive(Default)]
pub struct Pptx {
    /// (entry name, relationship target, slide xml)
    slides: Vec<(String, String, String)>,
    order: Option<Vec<usize>>,
    extra: Vec<(String, Vec<u8>)>,
}

impl Pptx {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slide holding `shapes`. Slide files are numbered in call order.
    pub fn slide(self, shapes: &[String]) -> Self {
        let n = self.slides.len() + 1;
        self.slide_at(
            &format!("ppt/slides/slide{n}.xml"),
            &format!("slides/slide{n}.xml"),
            shapes,
        )
    }

    /// Add a slide stored under `entry` and referenced from the presentation
    /// relationships as `target`.
    pub fn slide_at(mut self, entry: &str, target: &str, shapes: &[String]) -> Self {
        self.slides
            .push((entry.to_string(), target.to_string(), slide_xml(shapes)));
        self
    }

    /// Presentation order as 0-based indices into the added slides.
    pub fn order(mut self, order: &[usize]) -> Self {
        self.order = Some(order.to_vec());
        self
    }

    /// Add an extra part, stored without compression.
    pub fn part(mut self, name: &str, data: &[u8]) -> Self {
        self.extra.push((name.to_string(), data.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        let mut write = |name: &str, data: &[u8], options: SimpleFileOptions| {
            zip.start_file(name, options).unwrap();
            zip.write_all(data).unwrap();
        };

        write("[Content_Types].xml", self.content_types().as_bytes(), deflated);
        write(
            "_rels/.rels",
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
                 <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
                 <Relationship Id=\"rId3\" Type=\"{REL_NS}/extended-properties\" Target=\"docProps/app.xml\"/>\
                 <Relationship Id=\"rId1\" Type=\"{REL_NS}/officeDocument\" Target=\"ppt/presentation.xml\"/>\
                 </Relationships>"
            )
            .as_bytes(),
            deflated,
        );
        write("ppt/presentation.xml", self.presentation().as_bytes(), deflated);
        write(
            "ppt/_rels/presentation.xml.rels",
            self.presentation_rels().as_bytes(),
            deflated,
        );
        for (entry, _, slide) in &self.slides {
            write(entry.as_str(), slide.as_bytes(), deflated);
        }
        write("docProps/app.xml", b"<Properties/>", deflated);
        for (name, data) in &self.extra {
            write(name.as_str(), data.as_slice(), stored);
        }

        zip.finish().unwrap().into_inner()
    }

    fn content_types(&self) -> String {
        let overrides: String = self
            .slides
            .iter()
            .map(|(entry, _, _)| {
                format!(
                    "<Override PartName=\"/{entry}\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>"
                )
            })
            .collect();
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
             <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
             <Default Extension=\"xml\" ContentType=\"application/xml\"/>{overrides}</Types>"
        )
    }

    fn presentation(&self) -> String {
        let order: Vec<usize> = self
            .order
            .clone()
            .unwrap_or_else(|| (0..self.slides.len()).collect());
        let ids: String = order
            .iter()
            .enumerate()
            .map(|(pos, slide)| {
                format!("<p:sldId id=\"{}\" r:id=\"rId{}\"/>", 256 + pos, slide + 2)
            })
            .collect();
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
             <p:presentation {NS}>\
             <p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"rId1\"/></p:sldMasterIdLst>\
             <p:sldIdLst>{ids}</p:sldIdLst><p:sldSz cx=\"9144000\" cy=\"6858000\"/></p:presentation>"
        )
    }

    fn presentation_rels(&self) -> String {
        let slides: String = self
            .slides
            .iter()
            .enumerate()
            .map(|(i, (_, target, _))| {
                format!(
                    "<Relationship Id=\"rId{}\" Type=\"{REL_NS}/slide\" Target=\"{target}\"/>",
                    i + 2
                )
            })
            .collect();
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
             <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
             <Relationship Id=\"rId1\" Type=\"{REL_NS}/slideMaster\" Target=\"slideMasters/slideMaster1.xml\"/>\
             {slides}</Relationships>"
        )
    }
}

/// Names of all entries, in archive order.
pub fn entry_names(pptx: &[u8]) -> Vec<String> {
    let mut archive = ZipArchive::new(Cursor::new(pptx)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Decompressed contents of one entry.
pub fn entry(pptx: &[u8], name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(pptx)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut data = Vec::new();
    file.read_to_end(&mut data).unwrap();
    data
}

pub fn entry_compression(pptx: &[u8], name: &str) -> CompressionMethod {
    let mut archive = ZipArchive::new(Cursor::new(pptx)).unwrap();
    archive.by_name(name).unwrap().compression()
}
