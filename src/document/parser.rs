//! Slide part parsing.
//!
//! A slide is kept as its flat list of XML events. The shape tree is built
//! over that list, and each run remembers where its `a:t` element sits so an
//! edited run can be written back without touching anything around it.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::{Font, OtherShape, Paragraph, Run, RunKind, Shape, TextShape, TextSlot};
use crate::error::{Error, Result};
use crate::package::strip_bom;
use crate::xml::{escape_xml, local_name, resolve_entity};

/// A slide part as read from the package.
#[derive(Debug, Clone)]
pub(crate) struct SlideXml {
    /// Part bytes as read from the package.
    original: Vec<u8>,
    events: Vec<Event<'static>>,
}

impl SlideXml {
    /// Serialize the slide, rewriting the `a:t` element of every edited run.
    pub(crate) fn render<'a>(
        &self,
        edits: impl IntoIterator<Item = (TextSlot, &'a str)>,
    ) -> Result<Vec<u8>> {
        let mut edits: Vec<_> = edits.into_iter().collect();
        edits.sort_by_key(|(slot, _)| slot.start);
        let mut edits = edits.into_iter().peekable();

        let mut writer = Writer::new(Vec::with_capacity(self.original.len() + 256));
        let mut index = 0;
        while index < self.events.len() {
            if let Some((slot, text)) = edits.next_if(|(slot, _)| slot.start == index) {
                let start = match &self.events[slot.start] {
                    Event::Start(e) | Event::Empty(e) => e.clone(),
                    _ => {
                        return Err(Error::TemplateCorrupt(format!(
                            "text slot at event {} is not an element",
                            slot.start
                        )));
                    }
                };
                let end = BytesEnd::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
                writer.write_event(Event::Start(start))?;
                writer.write_event(Event::Text(BytesText::from_escaped(escape_xml(text))))?;
                writer.write_event(Event::End(end))?;
                index = slot.end + 1;
                continue;
            }
            writer.write_event(self.events[index].clone())?;
            index += 1;
        }

        Ok(writer.into_inner())
    }
}

/// Parse a slide part into its event list and shape tree.
pub(crate) fn parse_slide(data: Vec<u8>) -> Result<(SlideXml, Vec<Shape>)> {
    let events = read_events(&data)?;
    let shapes = match find_element(&events, 0, events.len(), b"spTree") {
        Some(tree) => parse_shape_tree(&events, tree),
        None => Vec::new(),
    };
    Ok((
        SlideXml {
            original: data,
            events,
        },
        shapes,
    ))
}

fn read_events(data: &[u8]) -> Result<Vec<Event<'static>>> {
    let text = std::str::from_utf8(strip_bom(data))
        .map_err(|e| Error::TemplateCorrupt(format!("slide part is not UTF-8: {e}")))?;
    let mut reader = Reader::from_str(text);

    let mut events = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Eof => break,
            event => events.push(event.into_owned()),
        }
    }
    Ok(events)
}

fn parse_shape_tree(events: &[Event<'static>], tree: usize) -> Vec<Shape> {
    let mut shapes = Vec::new();
    for child in children(events, tree) {
        let Some(name) = element_name(&events[child]) else {
            continue;
        };
        match name {
            // The group's own properties, not shapes
            b"nvGrpSpPr" | b"grpSpPr" | b"extLst" => {}
            b"sp" => shapes.push(Shape::Text(parse_text_shape(events, child))),
            other => shapes.push(Shape::Other(OtherShape {
                kind: other_kind(events, child, other),
                name: shape_name(events, child),
            })),
        }
    }
    shapes
}

fn other_kind(events: &[Event<'static>], shape: usize, name: &[u8]) -> String {
    let end = end_of(events, shape);
    let kind = match name {
        b"pic" => "Picture",
        b"graphicFrame" if find_element(events, shape, end, b"tbl").is_some() => "Table",
        b"graphicFrame" if find_element(events, shape, end, b"chart").is_some() => "Chart",
        b"graphicFrame" => "GraphicFrame",
        b"grpSp" => "Group",
        b"cxnSp" => "Connector",
        b"contentPart" => "ContentPart",
        b"AlternateContent" => "AlternateContent",
        other => return String::from_utf8_lossy(other).into_owned(),
    };
    kind.to_string()
}

fn shape_name(events: &[Event<'static>], shape: usize) -> Option<String> {
    let end = end_of(events, shape);
    find_element(events, shape, end, b"cNvPr").and_then(|i| attribute(&events[i], b"name"))
}

fn parse_text_shape(events: &[Event<'static>], shape: usize) -> TextShape {
    let paragraphs = child_named(events, shape, b"txBody")
        .map(|body| {
            children(events, body)
                .into_iter()
                .filter(|&i| element_name(&events[i]) == Some(b"p"))
                .map(|p| parse_paragraph(events, p))
                .collect()
        })
        .unwrap_or_default();

    TextShape {
        name: shape_name(events, shape),
        paragraphs,
    }
}

fn parse_paragraph(events: &[Event<'static>], para: usize) -> Paragraph {
    let runs = children(events, para)
        .into_iter()
        .filter_map(|child| match element_name(&events[child]) {
            Some(b"r") => Some(parse_run(events, child, RunKind::Text)),
            Some(b"fld") => Some(parse_run(events, child, RunKind::Field)),
            Some(b"br") => Some(Run {
                kind: RunKind::Break,
                text: Some("\n".to_string()),
                font: parse_font(events, child),
                slot: None,
                edited: false,
            }),
            _ => None,
        })
        .collect();
    Paragraph { runs }
}

fn parse_run(events: &[Event<'static>], run: usize, kind: RunKind) -> Run {
    let (text, slot) = match child_named(events, run, b"t") {
        Some(t) => {
            let end = end_of(events, t);
            // <a:t/> has no content events
            let content = if end > t { &events[t + 1..end] } else { &[][..] };
            (
                Some(collect_text(content)),
                Some(TextSlot { start: t, end }),
            )
        }
        None => (None, None),
    };

    Run {
        kind,
        text,
        font: parse_font(events, run),
        slot,
        edited: false,
    }
}

/// Read `a:rPr` of a run-like element.
fn parse_font(events: &[Event<'static>], run: usize) -> Font {
    let Some(props) = child_named(events, run, b"rPr") else {
        return Font::default();
    };

    // sz is in hundredths of a point
    let size = attribute(&events[props], b"sz")
        .and_then(|sz| sz.parse::<f64>().ok())
        .map(|sz| sz / 100.0);
    let family = child_named(events, props, b"latin")
        .and_then(|latin| attribute(&events[latin], b"typeface"))
        .filter(|face| !face.is_empty());

    Font { family, size }
}

/// Decode the content events of a text element.
fn collect_text(events: &[Event<'static>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(e) => text.push_str(&String::from_utf8_lossy(e)),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(e)),
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(e);
                match resolve_entity(&entity) {
                    Some(c) => text.push(c),
                    None => {
                        text.push('&');
                        text.push_str(&entity);
                        text.push(';');
                    }
                }
            }
            _ => {}
        }
    }
    text
}

fn start_of<'e>(event: &'e Event<'static>) -> Option<&'e BytesStart<'static>> {
    match event {
        Event::Start(e) | Event::Empty(e) => Some(e),
        _ => None,
    }
}

/// Local name of an element-opening event.
fn element_name<'e>(event: &'e Event<'static>) -> Option<&'e [u8]> {
    match event {
        Event::Start(e) | Event::Empty(e) => Some(local_name(e.name().into_inner())),
        _ => None,
    }
}

fn attribute(event: &Event<'static>, key: &[u8]) -> Option<String> {
    start_of(event)?
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// Index of the event closing the element opened at `start`.
///
/// For an empty element this is `start` itself.
fn end_of(events: &[Event<'static>], start: usize) -> usize {
    if !matches!(events[start], Event::Start(_)) {
        return start;
    }
    let mut depth = 0usize;
    for (i, event) in events.iter().enumerate().skip(start) {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    events.len() - 1
}

/// Indices of the direct child elements of the element opened at `parent`.
fn children(events: &[Event<'static>], parent: usize) -> Vec<usize> {
    let end = end_of(events, parent);
    let mut result = Vec::new();
    let mut i = parent + 1;
    while i < end {
        if start_of(&events[i]).is_some() {
            result.push(i);
            i = end_of(events, i) + 1;
        } else {
            i += 1;
        }
    }
    result
}

fn child_named(events: &[Event<'static>], parent: usize, name: &[u8]) -> Option<usize> {
    children(events, parent)
        .into_iter()
        .find(|&i| element_name(&events[i]) == Some(name))
}

/// First element named `name` in `events[from..to]`, at any depth.
fn find_element(events: &[Event<'static>], from: usize, to: usize, name: &[u8]) -> Option<usize> {
    (from..to).find(|&i| element_name(&events[i]) == Some(name))
}
