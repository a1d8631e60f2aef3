//! # deckfill
//!
//! Fill PowerPoint (PPTX) templates with values and inspect which
//! placeholders a template holds.
//!
//! ## Features
//!
//! - Replace `${key}` placeholders inside individual text runs
//! - Keep fonts, sizes and every other part of the package untouched
//! - Report every slide, shape and run of a template, with font details
//!
//! ## Quick Start
//!
//! ```no_run
//! use deckfill::{DirTemplateStore, Report, analyze_template, generate_from_store};
//!
//! let store = DirTemplateStore::new("templates");
//!
//! // Fill the template from a report record
//! let report = Report::new("Q1 Report", "Summary text");
//! let pptx = generate_from_store(&store, "template.pptx", &report.to_substitution_map())?;
//! std::fs::write(report.attachment_name(), pptx)?;
//!
//! // List the placeholders a template author left behind
//! println!("{}", analyze_template(&store, "template.pptx"));
//! # Ok::<(), deckfill::Error>(())
//! ```
//!
//! ## Placeholder rules
//!
//! A placeholder is the literal text `${key}` inside a single text run.
//! Unknown keys are left as they are, values are inserted verbatim, and a
//! token split across two runs (for instance by a spell-check or formatting
//! boundary) is not recognized:
//!
//! ```no_run
//! use deckfill::{Document, SubstitutionMap, substitute};
//!
//! let document = Document::load(std::fs::read("template.pptx")?)?;
//! let map = SubstitutionMap::from([("title".to_string(), "Q1 Report".to_string())]);
//! let pptx = substitute(document, &map, &mut ())?;
//! # Ok::<(), deckfill::Error>(())
//! ```

pub mod analyze;
pub mod document;
pub mod error;
pub mod events;
mod package;
pub mod report;
pub mod store;
pub mod substitute;
pub(crate) mod xml;

pub use analyze::{
    AnalysisTotals, TemplateAnalysis, analyze, analyze_bytes, analyze_template,
    analyze_template_with, render_html,
};
pub use document::{Document, Font, OtherShape, Paragraph, Run, RunKind, Shape, Slide, TextShape};
pub use error::{Error, Result};
pub use events::{Observer, TracingObserver};
pub use package::PPTX_MEDIA_TYPE;
pub use report::Report;
pub use store::{DEFAULT_TEMPLATE, DirTemplateStore, MemoryTemplateStore, TemplateStore};
pub use substitute::{
    SubstitutionMap, generate, generate_from_store, generate_with, replace_placeholders, substitute,
};
