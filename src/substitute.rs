//! The substitution engine.
//!
//! Placeholders are replaced run by run. Adjacent runs are never merged, so a
//! token whose characters are split across runs is left alone.

use std::collections::{BTreeMap, HashMap};

use memchr::memmem;

use crate::document::{Document, Run};
use crate::error::{Error, Result};
use crate::events::{Observer, TracingObserver};
use crate::package::write_package;
use crate::store::TemplateStore;

/// Placeholder key → replacement value.
pub type SubstitutionMap = BTreeMap<String, String>;

/// Marks a run as possibly holding placeholders.
pub const PLACEHOLDER_OPEN: &str = "${";

/// Returns true if `text` contains the placeholder opener `${`.
pub fn contains_placeholder(text: &str) -> bool {
    memmem::find(text.as_bytes(), PLACEHOLDER_OPEN.as_bytes()).is_some()
}

/// Replace every `${key}` in `text` whose key is in `map`.
///
/// The scan runs once, left to right, over the original text. Inserted values
/// are never rescanned, and tokens with unknown keys are copied unchanged.
/// When several keys match at one position the longest wins.
/// `on_replace` is called with each replaced token and its value.
pub fn replace_placeholders(
    text: &str,
    map: &SubstitutionMap,
    mut on_replace: impl FnMut(&str, &str),
) -> String {
    let finder = memmem::Finder::new(PLACEHOLDER_OPEN);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    while let Some(offset) = finder.find(&text.as_bytes()[cursor..]) {
        let open = cursor + offset;
        let body = &text[open + PLACEHOLDER_OPEN.len()..];
        let matched = map
            .iter()
            .filter(|(key, _)| body.starts_with(key.as_str()) && body[key.len()..].starts_with('}'))
            .max_by_key(|(key, _)| key.len());

        match matched {
            Some((key, value)) => {
                let close = open + PLACEHOLDER_OPEN.len() + key.len() + 1;
                out.push_str(&text[cursor..open]);
                out.push_str(value);
                on_replace(&text[open..close], value);
                cursor = close;
            }
            None => {
                let skip = open + PLACEHOLDER_OPEN.len();
                out.push_str(&text[cursor..skip]);
                cursor = skip;
            }
        }
    }

    out.push_str(&text[cursor..]);
    out
}

/// Fill `document` from `map` and serialize it to PPTX bytes.
///
/// Only run text changes. Slides without a changed run, and every other part
/// of the package, are copied through unchanged. Any failure is reported as
/// [`Error::GenerationFailed`] and no bytes are returned.
pub fn substitute(
    mut document: Document,
    map: &SubstitutionMap,
    observer: &mut dyn Observer,
) -> Result<Vec<u8>> {
    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    observer.generation_started(&keys);

    let mut rewritten = 0;
    for (i, slide) in document.slides_mut().iter_mut().enumerate() {
        let index = i + 1;
        observer.slide_started(index, slide.part_name());

        for run in slide.runs_mut() {
            let Some(original) = run.raw_text() else {
                continue;
            };
            if !contains_placeholder(original) {
                continue;
            }

            let original = original.to_string();
            let replaced = replace_placeholders(&original, map, |placeholder, value| {
                observer.replacement_made(index, placeholder, value)
            });
            if replaced != original && run.set_text(replaced) {
                let replaced = run.raw_text().unwrap_or_default();
                observer.run_rewritten(index, &original, replaced);
                rewritten += 1;
            }
        }
    }

    let pptx = serialize(&document).map_err(Error::generation)?;
    observer.generation_finished(document.slides().len(), rewritten);
    Ok(pptx)
}

fn serialize(document: &Document) -> Result<Vec<u8>> {
    let mut parts = HashMap::new();
    for slide in document.slides().iter().filter(|slide| slide.is_dirty()) {
        let rendered = slide.xml().render(slide.runs().filter_map(Run::edit))?;
        parts.insert(slide.part_name().to_string(), rendered);
    }
    write_package(document.package(), &parts)
}

/// Load a template from bytes, fill it, and serialize the result.
///
/// Load failures surface as [`Error::TemplateCorrupt`]; anything after that as
/// [`Error::GenerationFailed`]. Progress is logged through `tracing`.
pub fn generate(template: Vec<u8>, map: &SubstitutionMap) -> Result<Vec<u8>> {
    generate_with(template, map, &mut TracingObserver)
}

/// [`generate`] with a caller-supplied observer.
pub fn generate_with(
    template: Vec<u8>,
    map: &SubstitutionMap,
    observer: &mut dyn Observer,
) -> Result<Vec<u8>> {
    let document = Document::load(template)?;
    substitute(document, map, observer)
}

/// Fetch the named template from `store` and fill it.
///
/// A missing template fails with [`Error::TemplateNotFound`].
pub fn generate_from_store(
    store: &dyn TemplateStore,
    name: &str,
    map: &SubstitutionMap,
) -> Result<Vec<u8>> {
    let template = store.open(name)?;
    generate(template, map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> SubstitutionMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn replace(text: &str, m: &SubstitutionMap) -> String {
        replace_placeholders(text, m, |_, _| {})
    }

    #[test]
    fn test_known_keys() {
        let m = map(&[("title", "Q1 Report"), ("content", "Summary text")]);
        assert_eq!(replace("${title}: ${content}", &m), "Q1 Report: Summary text");
    }

    #[test]
    fn test_unknown_key_passthrough() {
        assert_eq!(replace("Hello ${name}", &SubstitutionMap::new()), "Hello ${name}");
        let m = map(&[("title", "T")]);
        assert_eq!(replace("${title} ${other}", &m), "T ${other}");
    }

    #[test]
    fn test_every_occurrence_replaced() {
        let m = map(&[("x", "1")]);
        assert_eq!(replace("${x}+${x}=${x}${x}", &m), "1+1=11");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let m = map(&[("a", "${b}"), ("b", "B")]);
        assert_eq!(replace("${a} ${b}", &m), "${b} B");
    }

    #[test]
    fn test_longest_key_wins() {
        let m = map(&[("a", "short"), ("a}b", "long")]);
        assert_eq!(replace("${a}b}", &m), "long");
    }

    #[test]
    fn test_partial_tokens_untouched() {
        let m = map(&[("name", "N")]);
        assert_eq!(replace("${na", &m), "${na");
        assert_eq!(replace("me}", &m), "me}");
        assert_eq!(replace("$${name}", &m), "$N");
        assert_eq!(replace("${${name}}", &m), "${N}");
    }

    #[test]
    fn test_values_inserted_verbatim() {
        let m = map(&[("v", "<b> & \"q\" 한글")]);
        assert_eq!(replace("[${v}]", &m), "[<b> & \"q\" 한글]");
    }

    #[test]
    fn test_on_replace_reports_tokens() {
        let m = map(&[("title", "T"), ("content", "C")]);
        let mut seen = Vec::new();
        replace_placeholders("${title}${content}${title}", &m, |token, value| {
            seen.push((token.to_string(), value.to_string()))
        });
        assert_eq!(
            seen,
            vec![
                ("${title}".to_string(), "T".to_string()),
                ("${content}".to_string(), "C".to_string()),
                ("${title}".to_string(), "T".to_string()),
            ]
        );
    }

    fn one_slide_package(text: &str) -> Vec<u8> {
        use std::io::{Cursor, Write};
        use zip::write::{SimpleFileOptions, ZipWriter};

        let rel = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
        let parts = [
            (
                "_rels/.rels".to_string(),
                format!(r#"<Relationships><Relationship Id="rId1" Type="{rel}/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#),
            ),
            (
                "ppt/presentation.xml".to_string(),
                r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst></p:presentation>"#.to_string(),
            ),
            (
                "ppt/_rels/presentation.xml.rels".to_string(),
                format!(r#"<Relationships><Relationship Id="rId2" Type="{rel}/slide" Target="slides/slide1.xml"/></Relationships>"#),
            ),
            (
                "ppt/slides/slide1.xml".to_string(),
                format!(r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#),
            ),
        ];

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in parts {
            zip.start_file(name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[derive(Default)]
    struct Finished(Option<(usize, usize)>);

    impl Observer for Finished {
        fn generation_finished(&mut self, slides: usize, rewritten_runs: usize) {
            self.0 = Some((slides, rewritten_runs));
        }
    }

    #[test]
    fn test_finished_reported_after_write() {
        let document = Document::load(one_slide_package("${title}")).unwrap();
        let mut observer = Finished::default();
        substitute(document, &map(&[("title", "T")]), &mut observer).unwrap();
        assert_eq!(observer.0, Some((1, 1)));
    }

    #[test]
    fn test_failed_write_is_not_reported_finished() {
        let mut document = Document::load(one_slide_package("${title}")).unwrap();
        document.slides_mut()[0].misalign_text_slots();

        let mut observer = Finished::default();
        let err = substitute(document, &map(&[("title", "T")]), &mut observer).unwrap_err();
        assert!(matches!(err, Error::GenerationFailed(_)));
        assert_eq!(observer.0, None);
    }

    #[test]
    fn test_contains_placeholder() {
        assert!(contains_placeholder("a ${b"));
        assert!(!contains_placeholder("a $ {b}"));
        assert!(!contains_placeholder(""));
    }
}
