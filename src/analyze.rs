//! Template analysis: a read-only walk that lists every run, marks the ones
//! holding placeholders, and renders a report for template authors.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::Serialize;

use crate::document::{Document, Font, Shape, TextShape};
use crate::error::{Error, Result};
use crate::events::{Observer, TracingObserver};
use crate::store::TemplateStore;
use crate::substitute::{PLACEHOLDER_OPEN, contains_placeholder};
use crate::xml::escape_xml;

/// Structured result of analyzing a template.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateAnalysis {
    pub slides: Vec<SlideAnalysis>,
    pub totals: AnalysisTotals,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlideAnalysis {
    /// 1-based position in the presentation.
    pub index: usize,
    pub part_name: String,
    pub shapes: Vec<ShapeAnalysis>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeAnalysis {
    Text {
        /// 1-based position within the slide.
        index: usize,
        name: Option<String>,
        /// Trimmed flattened text; `None` when blank.
        full_text: Option<String>,
        runs: Vec<RunAnalysis>,
    },
    Other {
        index: usize,
        name: Option<String>,
        kind: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunClass {
    Placeholder,
    Text,
}

/// A run with non-blank text.
#[derive(Debug, Clone, Serialize)]
pub struct RunAnalysis {
    /// 1-based paragraph index within the shape.
    pub paragraph: usize,
    pub class: RunClass,
    /// Raw text for placeholders, trimmed text otherwise.
    pub text: String,
    pub font: Font,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisTotals {
    pub slides: usize,
    pub text_shapes: usize,
    /// Runs containing `${`, not individual tokens.
    pub placeholders: usize,
}

const REPORT_HEADER: &str = "=== Template analysis ===";
const SUMMARY_HEADER: &str = "=== Summary ===";

/// Walk `document` and classify every non-blank run.
pub fn analyze(document: &Document) -> TemplateAnalysis {
    let mut totals = AnalysisTotals {
        slides: document.slides().len(),
        ..Default::default()
    };

    let slides = document
        .slides()
        .iter()
        .enumerate()
        .map(|(i, slide)| {
            let shapes = slide
                .shapes()
                .iter()
                .enumerate()
                .map(|(j, shape)| match shape {
                    Shape::Text(text) => {
                        totals.text_shapes += 1;
                        let runs = analyze_runs(text);
                        totals.placeholders += runs
                            .iter()
                            .filter(|run| run.class == RunClass::Placeholder)
                            .count();
                        let full_text = text.text().trim().to_string();
                        ShapeAnalysis::Text {
                            index: j + 1,
                            name: shape.name().map(str::to_string),
                            full_text: (!full_text.is_empty()).then_some(full_text),
                            runs,
                        }
                    }
                    Shape::Other(other) => ShapeAnalysis::Other {
                        index: j + 1,
                        name: shape.name().map(str::to_string),
                        kind: other.kind().to_string(),
                    },
                })
                .collect();

            SlideAnalysis {
                index: i + 1,
                part_name: slide.part_name().to_string(),
                shapes,
            }
        })
        .collect();

    TemplateAnalysis { slides, totals }
}

fn analyze_runs(shape: &TextShape) -> Vec<RunAnalysis> {
    let mut runs = Vec::new();
    for (p, para) in shape.paragraphs().iter().enumerate() {
        for run in para.runs() {
            let Some(text) = run.raw_text() else {
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }
            let (class, text) = if contains_placeholder(text) {
                (RunClass::Placeholder, text.to_string())
            } else {
                (RunClass::Text, text.trim().to_string())
            };
            runs.push(RunAnalysis {
                paragraph: p + 1,
                class,
                text,
                font: run.font().clone(),
            });
        }
    }
    runs
}

impl TemplateAnalysis {
    /// Render the human-readable report.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(REPORT_HEADER);
        out.push('\n');

        for slide in &self.slides {
            let _ = writeln!(out, "\nSlide {}:", slide.index);
            if slide.shapes.is_empty() {
                out.push_str("  (empty slide)\n");
            }
            for shape in &slide.shapes {
                match shape {
                    ShapeAnalysis::Text {
                        index,
                        full_text,
                        runs,
                        ..
                    } => {
                        let _ = writeln!(out, "  [Text box {index}]");
                        if let Some(full_text) = full_text {
                            let _ = writeln!(out, "    Full text: {full_text}");
                        }
                        for run in runs {
                            match run.class {
                                RunClass::Placeholder => {
                                    let _ = writeln!(out, "    ✓ Placeholder: {}", run.text);
                                }
                                RunClass::Text => {
                                    let _ = writeln!(out, "    - Text: {}", run.text);
                                }
                            }
                            if let Some(line) = font_line(&run.font) {
                                let _ = writeln!(out, "      {line}");
                            }
                        }
                    }
                    ShapeAnalysis::Other { index, kind, .. } => {
                        let _ = writeln!(out, "  [Other shape {index}]: {kind}");
                    }
                }
            }
        }

        let _ = writeln!(out, "\n{SUMMARY_HEADER}");
        let _ = writeln!(out, "Total slides: {}", self.totals.slides);
        let _ = writeln!(out, "Total text boxes: {}", self.totals.text_shapes);
        let _ = writeln!(out, "Total placeholders: {}", self.totals.placeholders);
        out
    }

    /// The report wrapped in a minimal HTML page.
    pub fn render_html(&self) -> String {
        render_html(&self.render())
    }

    /// Distinct keys of the `${key}` tokens found in placeholder runs.
    pub fn placeholder_keys(&self) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        for slide in &self.slides {
            for shape in &slide.shapes {
                let ShapeAnalysis::Text { runs, .. } = shape else {
                    continue;
                };
                for run in runs.iter().filter(|run| run.class == RunClass::Placeholder) {
                    collect_keys(&run.text, &mut keys);
                }
            }
        }
        keys
    }
}

fn collect_keys(text: &str, keys: &mut BTreeSet<String>) {
    let mut rest = text;
    while let Some(open) = rest.find(PLACEHOLDER_OPEN) {
        let body = &rest[open + PLACEHOLDER_OPEN.len()..];
        let Some(close) = body.find('}') else {
            break;
        };
        let key = &body[..close];
        // `${a${b}` holds the token `${b}`, not `${a${b}`
        match key.rfind(PLACEHOLDER_OPEN) {
            Some(inner) => keys.insert(key[inner + PLACEHOLDER_OPEN.len()..].to_string()),
            None => keys.insert(key.to_string()),
        };
        rest = &body[close + 1..];
    }
}

fn font_line(font: &Font) -> Option<String> {
    match (&font.family, font.size) {
        (Some(family), Some(size)) => Some(format!("Font: {family}, Size: {size}pt")),
        (Some(family), None) => Some(format!("Font: {family}")),
        (None, Some(size)) => Some(format!("Size: {size}pt")),
        (None, None) => None,
    }
}

/// Report used when the template cannot be loaded.
fn render_failure(error: &Error) -> String {
    format!("{REPORT_HEADER}\nAnalysis failed: {error}\n")
}

/// Wrap a report string in a minimal HTML page.
pub fn render_html(report: &str) -> String {
    format!(
        "<html><head><meta charset='UTF-8'><title>Template analysis</title></head>\
         <body style='font-family: arial, sans-serif; margin: 20px;'>\
         <h2>PPTX template analysis</h2>\
         <pre style='background: #f5f5f5; padding: 15px; border-radius: 5px; overflow-x: auto;'>{}</pre>\
         </body></html>",
        escape_xml(report)
    )
}

fn analyze_loaded(document: Result<Document>, observer: &mut dyn Observer) -> String {
    match document {
        Ok(document) => {
            let analysis = analyze(&document);
            observer.analysis_finished(&analysis.totals);
            analysis.render()
        }
        Err(error) => {
            observer.analysis_failed(&error);
            render_failure(&error)
        }
    }
}

/// Analyze template bytes. Never fails: load errors are reported inside the
/// returned string.
pub fn analyze_bytes(template: Vec<u8>) -> String {
    analyze_loaded(Document::load(template), &mut TracingObserver)
}

/// Analyze the named template from `store`. Never fails: a missing or corrupt
/// template yields a report describing the error.
pub fn analyze_template(store: &dyn TemplateStore, name: &str) -> String {
    analyze_template_with(store, name, &mut TracingObserver)
}

/// [`analyze_template`] with a caller-supplied observer.
pub fn analyze_template_with(
    store: &dyn TemplateStore,
    name: &str,
    observer: &mut dyn Observer,
) -> String {
    analyze_loaded(Document::open(store, name), observer)
}
