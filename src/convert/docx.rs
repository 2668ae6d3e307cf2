//! DOCX to HTML conversion.
//!
//! Reads `word/document.xml` from the package and walks it with a
//! pull parser. Only structure and basic run formatting survive:
//! headings, paragraphs, bullet-style lists, tables, bold, italic,
//! underline, tabs and breaks. Images, footnotes and styles are dropped.

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::relay::error::{RelayError, RelayResult};
use crate::relay::rewrite::escape_html;

const DOCUMENT_PART: &str = "word/document.xml";

/// Convert a DOCX package into an HTML body fragment.
///
/// Fails when `word/document.xml` inflates beyond `max_expanded` bytes.
pub fn docx_to_html(bytes: &[u8], max_expanded: usize) -> RelayResult<String> {
    let xml = read_document_part(bytes, max_expanded)?;
    document_xml_to_html(&xml)
}

fn read_document_part(bytes: &[u8], max_expanded: usize) -> RelayResult<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| RelayError::ConversionFailed(format!("not a DOCX package: {}", e)))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| RelayError::ConversionFailed(format!("{}: {}", DOCUMENT_PART, e)))?;
    let mut xml = String::new();
    let limit = u64::try_from(max_expanded).unwrap_or(u64::MAX).saturating_add(1);
    part.by_ref()
        .take(limit)
        .read_to_string(&mut xml)
        .map_err(|e| RelayError::ConversionFailed(format!("{}: {}", DOCUMENT_PART, e)))?;
    if xml.len() > max_expanded {
        return Err(RelayError::ConversionFailed(format!(
            "{} expands beyond {} bytes",
            DOCUMENT_PART, max_expanded
        )));
    }
    Ok(xml)
}

#[derive(Default)]
struct Paragraph {
    style: Option<String>,
    list: bool,
    html: String,
}

#[derive(Default)]
struct Run {
    bold: bool,
    italic: bool,
    underline: bool,
    text: String,
}

impl Run {
    fn render(&self) -> String {
        let mut html = self.text.clone();
        if self.underline {
            html = format!("<u>{}</u>", html);
        }
        if self.italic {
            html = format!("<em>{}</em>", html);
        }
        if self.bold {
            html = format!("<strong>{}</strong>", html);
        }
        html
    }
}

#[derive(Default)]
struct Converter {
    out: String,
    paragraph: Option<Paragraph>,
    run: Option<Run>,
    in_text: bool,
    list_open: bool,
}

impl Converter {
    fn open(&mut self, reader: &Reader<&[u8]>, e: &BytesStart<'_>, empty: bool) {
        match e.local_name().as_ref() {
            b"p" if !empty => {
                self.paragraph = Some(Paragraph::default());
            }
            b"pStyle" => {
                let style = attr_val(reader, e);
                if let Some(p) = self.paragraph.as_mut() {
                    p.style = style;
                }
            }
            b"numPr" => {
                if let Some(p) = self.paragraph.as_mut() {
                    p.list = true;
                }
            }
            b"r" if !empty => {
                self.run = Some(Run::default());
            }
            b"b" => self.set_run_flag(reader, e, |run, on| run.bold = on),
            b"i" => self.set_run_flag(reader, e, |run, on| run.italic = on),
            b"u" => self.set_run_flag(reader, e, |run, on| run.underline = on),
            b"t" if !empty => self.in_text = true,
            b"tab" => self.push_text(" "),
            b"br" | b"cr" => {
                if let Some(run) = self.run.as_mut() {
                    run.text.push_str("<br>");
                }
            }
            b"tbl" if !empty => {
                self.close_list();
                self.out.push_str("<table>");
            }
            b"tr" if !empty => self.out.push_str("<tr>"),
            b"tc" if !empty => self.out.push_str("<td>"),
            _ => {}
        }
    }

    fn close(&mut self, local_name: &[u8]) {
        match local_name {
            b"t" => self.in_text = false,
            b"r" => {
                if let Some(run) = self.run.take() {
                    if let Some(p) = self.paragraph.as_mut() {
                        p.html.push_str(&run.render());
                    }
                }
            }
            b"p" => {
                if let Some(p) = self.paragraph.take() {
                    self.emit_paragraph(p);
                }
            }
            b"tc" => {
                self.close_list();
                self.out.push_str("</td>");
            }
            b"tr" => self.out.push_str("</tr>"),
            b"tbl" => self.out.push_str("</table>"),
            _ => {}
        }
    }

    fn set_run_flag<F>(&mut self, reader: &Reader<&[u8]>, e: &BytesStart<'_>, set: F)
    where
        F: FnOnce(&mut Run, bool),
    {
        let on = !matches!(
            attr_val(reader, e).as_deref(),
            Some("0") | Some("false") | Some("none")
        );
        if let Some(run) = self.run.as_mut() {
            set(run, on);
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(run) = self.run.as_mut() {
            run.text.push_str(&escape_html(text));
        }
    }

    fn emit_paragraph(&mut self, p: Paragraph) {
        if p.list {
            if p.html.trim().is_empty() {
                return;
            }
            if !self.list_open {
                self.out.push_str("<ul>");
                self.list_open = true;
            }
            self.out.push_str("<li>");
            self.out.push_str(&p.html);
            self.out.push_str("</li>");
            return;
        }

        self.close_list();
        if p.html.trim().is_empty() {
            return;
        }
        let tag = block_tag(p.style.as_deref());
        self.out.push('<');
        self.out.push_str(tag);
        self.out.push('>');
        self.out.push_str(&p.html);
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
    }

    fn close_list(&mut self) {
        if self.list_open {
            self.out.push_str("</ul>");
            self.list_open = false;
        }
    }
}

/// HTML element for a paragraph style id.
fn block_tag(style: Option<&str>) -> &'static str {
    let Some(style) = style else {
        return "p";
    };
    let lower = style.to_ascii_lowercase();
    if lower == "title" {
        return "h1";
    }
    let level = lower
        .strip_prefix("heading")
        .map(str::trim)
        .and_then(|n| n.parse::<u8>().ok());
    match level {
        Some(1) => "h1",
        Some(2) => "h2",
        Some(3) => "h3",
        Some(4) => "h4",
        Some(5) => "h5",
        Some(6) => "h6",
        _ => "p",
    }
}

fn attr_val(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"val")
        .and_then(|attr| reader.decoder().decode(&attr.value).ok().map(|v| v.into_owned()))
}

fn document_xml_to_html(xml: &str) -> RelayResult<String> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut converter = Converter::default();
    let mut entity = String::with_capacity(16);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => converter.open(&reader, &e, false),
            Ok(Event::Empty(e)) => converter.open(&reader, &e, true),
            Ok(Event::End(e)) => converter.close(e.local_name().as_ref()),
            Ok(Event::Text(e)) if converter.in_text => {
                let text = e
                    .decode()
                    .map_err(|err| RelayError::ConversionFailed(format!("text decode: {}", err)))?;
                converter.push_text(&text);
            }
            Ok(Event::GeneralRef(e)) if converter.in_text => {
                let name = e
                    .decode()
                    .map_err(|err| RelayError::ConversionFailed(format!("entity decode: {}", err)))?;
                entity.clear();
                entity.push('&');
                entity.push_str(&name);
                entity.push(';');
                let resolved = quick_xml::escape::unescape(&entity)
                    .map_err(|err| RelayError::ConversionFailed(format!("entity: {}", err)))?;
                converter.push_text(&resolved);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(RelayError::ConversionFailed(format!(
                    "malformed document.xml at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
        }
        buf.clear();
    }

    converter.close_list();
    Ok(converter.out)
}
