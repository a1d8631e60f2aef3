//! The presentation tree: slides, shapes, paragraphs and runs.
//!
//! A [`Document`] is loaded from PPTX bytes and exposes its structure for
//! reading. Run text can only be changed from inside the crate; the
//! substitution engine is the single writer.

mod parser;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::package::Package;
use crate::store::TemplateStore;

pub(crate) use parser::SlideXml;

/// A loaded presentation.
#[derive(Debug, Clone)]
pub struct Document {
    package: Package,
    slides: Vec<Slide>,
}

/// One slide, with its shapes in z-order.
#[derive(Debug, Clone)]
pub struct Slide {
    part_name: String,
    shapes: Vec<Shape>,
    xml: SlideXml,
}

/// A shape on a slide: either a text container or something opaque.
#[derive(Debug, Clone)]
pub enum Shape {
    Text(TextShape),
    Other(OtherShape),
}

/// A shape that can hold text (`p:sp`).
#[derive(Debug, Clone, Default)]
pub struct TextShape {
    name: Option<String>,
    paragraphs: Vec<Paragraph>,
}

/// A shape without a text body (picture, table, group, connector, ...).
#[derive(Debug, Clone)]
pub struct OtherShape {
    kind: String,
    name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    runs: Vec<Run>,
}

/// What kind of element a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// A regular text run (`a:r`).
    Text,
    /// A field such as a slide number or date (`a:fld`).
    Field,
    /// A line break (`a:br`).
    Break,
}

/// Explicit font attributes of a run. Inherited values are not resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Font {
    /// Latin typeface (`a:latin@typeface`).
    pub family: Option<String>,
    /// Size in points.
    pub size: Option<f64>,
}

/// Location of a run's `a:t` element in the slide event list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TextSlot {
    pub(crate) start: usize,
    pub(crate) end: usize,
}

/// The smallest unit of styled text.
#[derive(Debug, Clone)]
pub struct Run {
    kind: RunKind,
    text: Option<String>,
    font: Font,
    slot: Option<TextSlot>,
    edited: bool,
}

impl Document {
    /// Parse a PPTX package.
    ///
    /// Any failure to read the container, its relationships or a slide part
    /// is reported as [`Error::TemplateCorrupt`].
    pub fn load(bytes: Vec<u8>) -> Result<Self> {
        Self::load_inner(bytes).map_err(|e| match e {
            Error::TemplateCorrupt(_) => e,
            other => Error::TemplateCorrupt(other.to_string()),
        })
    }

    /// Fetch the named template from `store` and parse it.
    pub fn open(store: &dyn TemplateStore, name: &str) -> Result<Self> {
        let bytes = store.open(name)?;
        Self::load(bytes)
    }

    fn load_inner(bytes: Vec<u8>) -> Result<Self> {
        let package = Package::open(bytes)?;
        let mut slides = Vec::with_capacity(package.slide_parts().len());
        for part_name in package.slide_parts() {
            let data = package.read_part(part_name)?;
            let (xml, shapes) = parser::parse_slide(data)?;
            slides.push(Slide {
                part_name: part_name.clone(),
                shapes,
                xml,
            });
        }
        tracing::trace!(
            main_part = package.main_part(),
            slides = slides.len(),
            "Loaded presentation"
        );
        Ok(Self { package, slides })
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub(crate) fn slides_mut(&mut self) -> &mut [Slide] {
        &mut self.slides
    }

    pub(crate) fn package(&self) -> &Package {
        &self.package
    }
}

impl Slide {
    /// Package part name, e.g. `ppt/slides/slide1.xml`.
    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Text shapes only, in z-order.
    pub fn text_shapes(&self) -> impl Iterator<Item = &TextShape> {
        self.shapes.iter().filter_map(Shape::as_text)
    }

    /// Every run of every text shape, in document order.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.text_shapes()
            .flat_map(|shape| shape.paragraphs.iter())
            .flat_map(|para| para.runs.iter())
    }

    pub(crate) fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.shapes
            .iter_mut()
            .filter_map(|shape| match shape {
                Shape::Text(text) => Some(text),
                Shape::Other(_) => None,
            })
            .flat_map(|shape| shape.paragraphs.iter_mut())
            .flat_map(|para| para.runs.iter_mut())
    }

    /// True if any run has been rewritten since load.
    pub(crate) fn is_dirty(&self) -> bool {
        self.runs().any(|run| run.edited)
    }

    pub(crate) fn xml(&self) -> &SlideXml {
        &self.xml
    }
}

impl Shape {
    pub fn as_text(&self) -> Option<&TextShape> {
        match self {
            Shape::Text(text) => Some(text),
            Shape::Other(_) => None,
        }
    }

    /// Human-readable kind: `TextShape` for text containers, otherwise the
    /// opaque shape's kind.
    pub fn kind(&self) -> &str {
        match self {
            Shape::Text(_) => "TextShape",
            Shape::Other(other) => &other.kind,
        }
    }

    /// The shape's `cNvPr@name`, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Shape::Text(text) => text.name.as_deref(),
            Shape::Other(other) => other.name.as_deref(),
        }
    }
}

impl TextShape {
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Flattened text: paragraph texts joined with newlines.
    ///
    /// For display only; substitution never looks at this view.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OtherShape {
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl Paragraph {
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Concatenated raw text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().filter_map(Run::raw_text).collect()
    }
}

impl Run {
    pub fn kind(&self) -> RunKind {
        self.kind
    }

    /// The run's text exactly as stored, with entities decoded.
    ///
    /// `None` when the run has no text element.
    pub fn raw_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    /// Replace the run's text. Only runs backed by a text element can change;
    /// others are left untouched and `false` is returned.
    pub(crate) fn set_text(&mut self, text: String) -> bool {
        if self.slot.is_none() {
            return false;
        }
        self.text = Some(text);
        self.edited = true;
        true
    }

    pub(crate) fn edit(&self) -> Option<(TextSlot, &str)> {
        match (self.edited, self.slot, self.text.as_deref()) {
            (true, Some(slot), Some(text)) => Some((slot, text)),
            _ => None,
        }
    }
}

#[cfg(test)]
impl Slide {
    /// Point every non-empty text slot at the element's content instead of
    /// the element, so rendering an edited run fails.
    pub(crate) fn misalign_text_slots(&mut self) {
        for run in self.runs_mut() {
            if let Some(slot) = run.slot.as_mut().filter(|slot| slot.end > slot.start + 1) {
                slot.start += 1;
            }
        }
    }
}
