//! SVG minification by streaming XML rewrite.
//!
//! Drops what editors leave behind and browsers ignore: comments, doctype,
//! processing instructions (the XML declaration stays), `<metadata>`,
//! `sodipodi:`/`inkscape:` elements and attributes, and whitespace-only text.
//!
//! Whitespace inside text content elements (`<text>`, `<tspan>`, ...) and
//! under `xml:space="preserve"` is rendered, so it stays.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

const EDITOR_PREFIXES: &[&[u8]] = &[b"sodipodi:", b"inkscape:"];
const EDITOR_NAMESPACES: &[&[u8]] = &[b"xmlns:sodipodi", b"xmlns:inkscape"];

/// Elements whose whitespace is part of the rendered text.
const TEXT_ELEMENTS: &[&[u8]] = &[b"text", b"tspan", b"textPath", b"tref", b"title", b"desc"];

/// Minify SVG source.
pub fn minify(content: &[u8]) -> Result<Vec<u8>, String> {
    let mut reader = Reader::from_reader(content);
    let mut writer = Writer::new(Vec::with_capacity(content.len()));
    // one entry per open element: whether its whitespace is kept
    let mut preserve: Vec<bool> = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            format!(
                "XML parse error at position {}: {}",
                reader.error_position(),
                e
            )
        })?;
        let inside_text = preserve.last().copied().unwrap_or(false);

        let keep = match event {
            Event::Eof => break,
            Event::Comment(_) | Event::PI(_) | Event::DocType(_) => None,
            Event::Text(ref text) if !inside_text && text.iter().all(u8::is_ascii_whitespace) => {
                None
            }
            Event::Start(ref elem) if is_dropped(elem) => {
                let end = elem.to_end().into_owned();
                reader
                    .read_to_end(end.name())
                    .map_err(|e| format!("unclosed <{}>: {e}", name_of(elem)))?;
                None
            }
            Event::Empty(ref elem) if is_dropped(elem) => None,
            Event::Start(ref elem) => {
                preserve.push(inside_text || keeps_whitespace(elem));
                Some(Event::Start(strip_attributes(elem)?))
            }
            Event::Empty(ref elem) => Some(Event::Empty(strip_attributes(elem)?)),
            Event::End(end) => {
                preserve.pop();
                Some(Event::End(end))
            }
            other => Some(other),
        };

        if let Some(event) = keep {
            writer.write_event(event).map_err(|e| e.to_string())?;
        }
    }

    Ok(writer.into_inner())
}

fn keeps_whitespace(elem: &BytesStart<'_>) -> bool {
    let preserved = matches!(
        elem.try_get_attribute("xml:space"),
        Ok(Some(attr)) if attr.value.as_ref() == b"preserve"
    );
    preserved || TEXT_ELEMENTS.contains(&elem.name().as_ref())
}

fn is_dropped(elem: &BytesStart<'_>) -> bool {
    let name = elem.name();
    name.as_ref() == b"metadata" || is_editor_name(name.as_ref())
}

fn is_editor_name(name: &[u8]) -> bool {
    EDITOR_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
        || EDITOR_NAMESPACES.contains(&name)
}

fn strip_attributes(elem: &BytesStart<'_>) -> Result<BytesStart<'static>, String> {
    let mut out = elem.to_owned();
    out.clear_attributes();
    for attr in elem.attributes() {
        let attr = attr.map_err(|e| format!("bad attribute in <{}>: {e}", name_of(elem)))?;
        if !is_editor_name(attr.key.as_ref()) {
            out.push_attribute(attr);
        }
    }
    Ok(out)
}

fn name_of(elem: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(elem.name().as_ref()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minify_str(svg: &str) -> String {
        String::from_utf8(minify(svg.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn test_strips_editor_noise() {
        let svg = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- Created with Inkscape -->
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape" inkscape:version="1.0" width="10">
  <metadata><rdf:RDF/></metadata>
  <sodipodi:namedview id="base"/>
  <rect x="0" y="0" inkscape:label="bg" width="10" height="10"/>
</svg>
"#;
        assert_eq!(
            minify_str(svg),
            r#"<?xml version="1.0" encoding="UTF-8"?><svg xmlns="http://www.w3.org/2000/svg" width="10"><rect x="0" y="0" width="10" height="10"/></svg>"#
        );
    }

    #[test]
    fn test_keeps_text_content() {
        let svg = r#"<svg><text x="1">Hello &amp; bye</text></svg>"#;
        assert_eq!(minify_str(svg), svg);
    }

    #[test]
    fn test_keeps_whitespace_in_text_elements() {
        let svg = concat!(
            "<svg>\n  <text><tspan>Hello</tspan> <tspan>world</tspan></text>\n",
            "  <text>&lt; &gt;</text>\n",
            "  <g xml:space=\"preserve\"><desc> </desc> </g>\n</svg>"
        );
        assert_eq!(
            minify_str(svg),
            concat!(
                "<svg><text><tspan>Hello</tspan> <tspan>world</tspan></text>",
                "<text>&lt; &gt;</text>",
                "<g xml:space=\"preserve\"><desc> </desc> </g></svg>"
            )
        );
    }

    #[test]
    fn test_drops_whitespace_between_shapes() {
        let svg = "<svg>\n  <g>\n    <rect/>\n  </g>\n</svg>";
        assert_eq!(minify_str(svg), "<svg><g><rect/></g></svg>");
    }

    #[test]
    fn test_mismatched_tags() {
        assert!(minify(b"<svg><g></svg>").is_err());
    }
}
