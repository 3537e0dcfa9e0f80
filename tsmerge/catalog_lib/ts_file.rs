//
// Copyright (c) 2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! .ts (Qt Linguist) catalog reader and writer
//!
//! TS file format:
//! - `<TS version language sourcelanguage>` root, optional `extra-*` children
//! - `<context>` with a `<name>`, an optional `<comment>` and messages
//! - `<message numerus="yes">` with, in order:
//!   - `<location filename line>` - relative source references
//!   - `<source>`, `<oldsource>` - original text and its previous value
//!   - `<comment>`, `<oldcomment>` - disambiguation
//!   - `<extracomment>`, `<translatorcomment>` - notes
//!   - `<translation type>` - text or `<numerusform>` children; `type` is
//!     absent (finished), `unfinished`, `obsolete` or `vanished`
//!   - `extra-*` elements, kept verbatim
//!
//! Control characters are stored as `<byte value="xNN"/>`.

use std::collections::HashSet;
use std::io;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::catalog_lib::catalog::{Catalog, LocationAnomaly};
use crate::catalog_lib::error::{ParseError, ParseErrorKind};
use crate::catalog_lib::key::{Disambiguation, MessageKey};
use crate::catalog_lib::location::{
    parse_line_attr, DecodeOptions, Decoded, DecoderState, EncoderState, LocationRecord,
};
use crate::catalog_lib::message::{Extra, Message, Status, Translation};

/// Catalog-level extra element holding the scan fingerprint
pub const FINGERPRINT_EXTRA: &str = "extra-scan-fingerprint";

/// Message-level extra element holding the vanished pass counter
pub const VANISHED_PASSES_EXTRA: &str = "extra-vanished-passes";

/// Message-level extra element holding the status of a message before it
/// went obsolete: `finished` or `unfinished`
pub const STATUS_BEFORE_GONE_EXTRA: &str = "extra-status-before-gone";

const INDENT: &str = "    ";

/// Parse a catalog from its on-disk bytes
pub fn load(bytes: &[u8]) -> Result<Catalog, ParseError> {
    load_with(bytes, DecodeOptions::default())
}

/// Parse a catalog, with explicit location decoding options
pub fn load_with(bytes: &[u8], options: DecodeOptions) -> Result<Catalog, ParseError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ParseError::malformed(format!("catalog is not UTF-8: {}", e)))?;
    TsParser::new(text, options).parse()
}

struct TsParser<'a> {
    reader: Reader<&'a [u8]>,
    options: DecodeOptions,
    cursor: Option<DecoderState>,
    seen: HashSet<MessageKey>,
}

/// Partially parsed message, before its key is known
#[derive(Default)]
struct RawMessage {
    source: Option<String>,
    comment: Option<String>,
    old_source: Option<String>,
    old_comment: Option<String>,
    extra_comment: Option<String>,
    translator_comment: Option<String>,
    translation: Option<Translation>,
    status: Option<Status>,
    vanished_passes: u32,
    status_before_gone: Option<Status>,
    extras: Vec<Extra>,
}

fn tag_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn is_blank(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

impl<'a> TsParser<'a> {
    fn new(text: &'a str, options: DecodeOptions) -> Self {
        TsParser {
            reader: Reader::from_str(text),
            options,
            cursor: Some(DecoderState::default()),
            seen: HashSet::new(),
        }
    }

    fn error(&self, detail: String) -> ParseError {
        ParseError::malformed(format!("{} (byte {})", detail, self.reader.buffer_position()))
    }

    fn read(&mut self) -> Result<Event<'a>, ParseError> {
        self.reader
            .read_event()
            .map_err(|e| self.error(format!("XML error: {}", e)))
    }

    /// Next event that carries structure: skips declarations, comments and
    /// whitespace between elements
    fn next_structural(&mut self) -> Result<Event<'a>, ParseError> {
        loop {
            match self.read()? {
                Event::Decl(_) | Event::DocType(_) | Event::Comment(_) | Event::PI(_) => {}
                Event::Text(t) => {
                    let text = t
                        .unescape()
                        .map_err(|e| self.error(format!("bad text: {}", e)))?;
                    if !is_blank(&text) {
                        return Err(self.error(format!("unexpected text {:?}", text.trim())));
                    }
                }
                Event::CData(_) => return Err(self.error("unexpected CDATA".to_string())),
                event => return Ok(event),
            }
        }
    }

    fn attr(&self, e: &BytesStart, name: &str) -> Result<Option<String>, ParseError> {
        for attr in e.attributes() {
            let attr = attr.map_err(|err| self.error(format!("bad attribute: {}", err)))?;
            if attr.key.as_ref() == name.as_bytes() {
                let value = attr
                    .unescape_value()
                    .map_err(|err| self.error(format!("bad attribute value: {}", err)))?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    fn skip(&mut self, e: &BytesStart) -> Result<(), ParseError> {
        let name = e.name();
        self.reader
            .read_to_end(name)
            .map_err(|err| self.error(format!("XML error: {}", err)))?;
        Ok(())
    }

    fn parse(mut self) -> Result<Catalog, ParseError> {
        let root = match self.next_structural()? {
            Event::Start(e) if e.name().as_ref() == b"TS" => e,
            Event::Eof => return Err(self.error("empty catalog".to_string())),
            _ => return Err(self.error("expected <TS> root element".to_string())),
        };

        let mut catalog = Catalog::new(self.attr(&root, "language")?);
        if let Some(version) = self.attr(&root, "version")? {
            catalog.version = version;
        }
        catalog.source_language = self.attr(&root, "sourcelanguage")?;

        loop {
            match self.next_structural()? {
                Event::Start(e) if e.name().as_ref() == b"context" => {
                    self.parse_context(&mut catalog)?;
                }
                Event::Start(e) if e.name().as_ref().starts_with(b"extra-") => {
                    let name = tag_name(&e);
                    let value = self.read_text(&name)?;
                    if name == FINGERPRINT_EXTRA {
                        catalog.scan_fingerprint = Some(value);
                    } else {
                        catalog.extras.push(Extra { name, value });
                    }
                }
                Event::Start(e) => {
                    log::warn!("ignoring <{}> in catalog", tag_name(&e));
                    self.skip(&e)?;
                }
                Event::Empty(e) => {
                    log::warn!("ignoring <{}/> in catalog", tag_name(&e));
                }
                Event::End(e) if e.name().as_ref() == b"TS" => break,
                Event::Eof => return Err(self.error("unterminated <TS>".to_string())),
                _ => return Err(self.error("unexpected content in <TS>".to_string())),
            }
        }

        match self.next_structural()? {
            Event::Eof => Ok(catalog),
            _ => Err(self.error("content after </TS>".to_string())),
        }
    }

    fn parse_context(&mut self, catalog: &mut Catalog) -> Result<(), ParseError> {
        let mut name: Option<String> = None;
        let mut comment: Option<String> = None;
        let mut messages = Vec::new();
        let mut anomalies = Vec::new();

        loop {
            match self.next_structural()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"name" => name = Some(self.read_text("name")?),
                    b"comment" => comment = Some(self.read_text("comment")?),
                    b"message" => {
                        let context = match &name {
                            Some(name) => name.clone(),
                            None => {
                                return Err(self.error("<message> before context <name>".into()))
                            }
                        };
                        let numerus = self.attr(&e, "numerus")?.as_deref() == Some("yes");
                        let (message, found) = self.parse_message(context, numerus)?;
                        anomalies.extend(found);
                        messages.push(message);
                    }
                    _ => {
                        log::warn!("ignoring <{}> in context", tag_name(&e));
                        self.skip(&e)?;
                    }
                },
                Event::Empty(e) if e.name().as_ref() == b"message" => {
                    return Err(self.error("empty <message/>".to_string()));
                }
                Event::Empty(e) if e.name().as_ref() == b"name" => name = Some(String::new()),
                Event::Empty(_) => {}
                Event::End(e) if e.name().as_ref() == b"context" => break,
                _ => return Err(self.error("unexpected content in <context>".to_string())),
            }
        }

        let name = name.ok_or_else(|| self.error("<context> without <name>".to_string()))?;
        for message in &messages {
            if !self.seen.insert(message.key.clone()) {
                return Err(ParseError::new(
                    ParseErrorKind::DuplicateKey,
                    format!("{} appears twice", message.key),
                ));
            }
        }

        let context = catalog.context_entry(&name);
        if context.comment.is_none() {
            context.comment = comment;
        }
        context.messages.extend(messages);
        catalog.anomalies.extend(anomalies);
        Ok(())
    }

    fn parse_message(
        &mut self,
        context: String,
        numerus: bool,
    ) -> Result<(Message, Vec<LocationAnomaly>), ParseError> {
        let mut raw = RawMessage::default();
        let mut occurrences = Vec::new();
        let mut found = Vec::new();

        loop {
            match self.next_structural()? {
                Event::Empty(e) if e.name().as_ref() == b"location" => {
                    let decoded = self.parse_location(&e)?;
                    occurrences.push(decoded.occurrence);
                    found.extend(decoded.anomaly);
                }
                Event::Start(e) if e.name().as_ref() == b"location" => {
                    let decoded = self.parse_location(&e)?;
                    self.skip(&e)?;
                    occurrences.push(decoded.occurrence);
                    found.extend(decoded.anomaly);
                }
                Event::Start(e) => match e.name().as_ref() {
                    b"source" => raw.source = Some(self.read_text("source")?),
                    b"oldsource" => raw.old_source = Some(self.read_text("oldsource")?),
                    b"comment" => raw.comment = Some(self.read_text("comment")?),
                    b"oldcomment" => raw.old_comment = Some(self.read_text("oldcomment")?),
                    b"extracomment" => raw.extra_comment = Some(self.read_text("extracomment")?),
                    b"translatorcomment" => {
                        raw.translator_comment = Some(self.read_text("translatorcomment")?)
                    }
                    b"translation" => {
                        raw.status = Some(self.parse_status(&e)?);
                        raw.translation = Some(self.parse_translation(numerus)?);
                    }
                    name if name.starts_with(b"extra-") => {
                        let name = tag_name(&e);
                        let value = self.read_text(&name)?;
                        if name == STATUS_BEFORE_GONE_EXTRA {
                            raw.status_before_gone =
                                Some(parse_live_status(value.trim()).ok_or_else(|| {
                                    self.error(format!(
                                        "bad {} value {:?}",
                                        STATUS_BEFORE_GONE_EXTRA, value
                                    ))
                                })?);
                        } else if name == VANISHED_PASSES_EXTRA {
                            raw.vanished_passes = value.trim().parse().map_err(|_| {
                                self.error(format!("bad {} value {:?}", VANISHED_PASSES_EXTRA, value))
                            })?;
                        } else {
                            raw.extras.push(Extra { name, value });
                        }
                    }
                    _ => {
                        log::warn!("ignoring <{}> in message", tag_name(&e));
                        self.skip(&e)?;
                    }
                },
                Event::Empty(e) if e.name().as_ref() == b"source" => {
                    raw.source = Some(String::new())
                }
                Event::Empty(e) if e.name().as_ref() == b"translation" => {
                    raw.status = Some(self.parse_status(&e)?);
                    raw.translation = Some(Translation::empty(numerus));
                }
                Event::Empty(_) => {}
                Event::End(e) if e.name().as_ref() == b"message" => break,
                _ => return Err(self.error("unexpected content in <message>".to_string())),
            }
        }

        let source = raw
            .source
            .ok_or_else(|| self.error(format!("message in {:?} without <source>", context)))?;
        let key = MessageKey::new(
            context,
            source,
            Disambiguation::from_option(raw.comment.as_deref()),
        );
        let status = raw.status.unwrap_or(Status::Unfinished);
        let mut vanished_passes = raw.vanished_passes;
        if status == Status::Vanished && vanished_passes == 0 {
            vanished_passes = 1;
        }
        if status.is_gone() {
            occurrences.clear();
        }

        let message = Message {
            key: key.clone(),
            old_source: raw.old_source,
            old_comment: raw.old_comment,
            extra_comment: raw.extra_comment,
            translator_comment: raw.translator_comment,
            translation: raw.translation.unwrap_or_else(|| Translation::empty(numerus)),
            status,
            occurrences,
            vanished_passes,
            status_before_gone: raw.status_before_gone.filter(|_| status.is_gone()),
            extras: raw.extras,
        };
        let anomalies = found
            .into_iter()
            .map(|anomaly| LocationAnomaly {
                key: key.clone(),
                anomaly,
            })
            .collect();
        Ok((message, anomalies))
    }

    fn parse_location(&mut self, e: &BytesStart) -> Result<Decoded, ParseError> {
        let file = self.attr(e, "filename")?;
        let line = self.attr(e, "line")?.ok_or_else(|| {
            ParseError::new(ParseErrorKind::BadDelta, "<location> without line".to_string())
        })?;
        let delta = parse_line_attr(&line)
            .map_err(|err| ParseError::new(ParseErrorKind::BadDelta, err.to_string()))?;
        let record = LocationRecord { file, delta };

        let state = self.cursor.take().unwrap_or_default();
        let (next, decoded) = state
            .decode(&record, self.options)
            .map_err(|err| ParseError::new(ParseErrorKind::BadDelta, err.to_string()))?;
        self.cursor = Some(next);
        Ok(decoded)
    }

    fn parse_status(&self, e: &BytesStart) -> Result<Status, ParseError> {
        match self.attr(e, "type")?.as_deref() {
            None => Ok(Status::Finished),
            Some("unfinished") => Ok(Status::Unfinished),
            Some("obsolete") => Ok(Status::Obsolete),
            Some("vanished") => Ok(Status::Vanished),
            Some(other) => Err(self.error(format!("unknown translation type {:?}", other))),
        }
    }

    fn parse_translation(&mut self, numerus: bool) -> Result<Translation, ParseError> {
        let mut text = String::new();
        let mut forms = Vec::new();
        loop {
            match self.read()? {
                Event::Text(t) => {
                    let t = t
                        .unescape()
                        .map_err(|e| self.error(format!("bad text: {}", e)))?;
                    text.push_str(&t);
                }
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
                Event::Empty(e) if e.name().as_ref() == b"byte" => {
                    text.extend(self.parse_byte(&e)?);
                }
                Event::Start(e) if e.name().as_ref() == b"numerusform" => {
                    if !numerus {
                        return Err(self.error("<numerusform> in a singular message".into()));
                    }
                    forms.push(self.read_text("numerusform")?);
                }
                Event::Empty(e) if e.name().as_ref() == b"numerusform" => {
                    forms.push(String::new());
                }
                Event::Comment(_) => {}
                Event::End(e) if e.name().as_ref() == b"translation" => break,
                _ => return Err(self.error("unexpected content in <translation>".to_string())),
            }
        }

        if numerus {
            if !is_blank(&text) {
                return Err(self.error("text outside <numerusform>".to_string()));
            }
            Ok(Translation::Numerus(forms))
        } else {
            Ok(Translation::Single(text))
        }
    }

    fn parse_byte(&self, e: &BytesStart) -> Result<Option<char>, ParseError> {
        let value = self
            .attr(e, "value")?
            .ok_or_else(|| self.error("<byte> without value".to_string()))?;
        let (radix, digits) = if let Some(hex) = value.strip_prefix("0x") {
            (16, hex)
        } else if let Some(hex) = value.strip_prefix('x') {
            (16, hex)
        } else {
            (10, value.as_str())
        };
        let n = u32::from_str_radix(digits, radix)
            .map_err(|_| self.error(format!("bad <byte> value {:?}", value)))?;
        if n == 0 {
            return Ok(None);
        }
        char::from_u32(n)
            .map(Some)
            .ok_or_else(|| self.error(format!("bad <byte> value {:?}", value)))
    }

    /// Read character content up to the end of `tag`
    fn read_text(&mut self, tag: &str) -> Result<String, ParseError> {
        let mut text = String::new();
        loop {
            match self.read()? {
                Event::Text(t) => {
                    let t = t
                        .unescape()
                        .map_err(|e| self.error(format!("bad text: {}", e)))?;
                    text.push_str(&t);
                }
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
                Event::Empty(e) if e.name().as_ref() == b"byte" => {
                    text.extend(self.parse_byte(&e)?);
                }
                Event::Comment(_) => {}
                Event::End(e) if e.name().as_ref() == tag.as_bytes() => return Ok(text),
                Event::Eof => return Err(self.error(format!("unterminated <{}>", tag))),
                _ => return Err(self.error(format!("unexpected markup in <{}>", tag))),
            }
        }
    }
}

/// Serialize a catalog
///
/// Locations are always re-encoded from the current message order; the
/// output depends only on the catalog contents.
pub fn serialize(catalog: &Catalog) -> Vec<u8> {
    let mut out = Vec::new();
    if let Err(e) = write_to(&mut out, catalog) {
        log::error!("serializing catalog: {}", e);
    }
    out
}

/// Write a catalog to `out`
pub fn write_to<W: io::Write>(out: W, catalog: &Catalog) -> io::Result<()> {
    let mut w = TsWriter {
        writer: Writer::new(out),
    };

    w.event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    w.newline()?;
    w.event(Event::DocType(BytesText::from_escaped("TS")))?;
    w.newline()?;

    let mut root = BytesStart::new("TS");
    root.push_attribute(("version", catalog.version.as_str()));
    if let Some(language) = &catalog.language {
        root.push_attribute(("language", language.as_str()));
    }
    if let Some(source_language) = &catalog.source_language {
        root.push_attribute(("sourcelanguage", source_language.as_str()));
    }
    w.start(0, root)?;
    w.newline()?;
    if let Some(fingerprint) = &catalog.scan_fingerprint {
        w.element(0, FINGERPRINT_EXTRA, fingerprint)?;
    }
    for extra in &catalog.extras {
        w.element(0, &extra.name, &extra.value)?;
    }

    let mut cursor = EncoderState::default();
    for context in &catalog.contexts {
        w.start(0, BytesStart::new("context"))?;
        w.newline()?;
        w.element(1, "name", &context.name)?;
        if let Some(comment) = &context.comment {
            w.element(1, "comment", comment)?;
        }
        for message in &context.messages {
            cursor = w.message(message, cursor)?;
        }
        w.end("context")?;
        w.newline()?;
    }
    w.end("TS")?;
    w.newline()
}

struct TsWriter<W: io::Write> {
    writer: Writer<W>,
}

impl<W: io::Write> TsWriter<W> {
    fn event(&mut self, event: Event<'_>) -> io::Result<()> {
        self.writer.write_event(event).map_err(io::Error::other)
    }

    /// Layout whitespace, written as is
    fn layout(&mut self, s: &str) -> io::Result<()> {
        self.event(Event::Text(BytesText::from_escaped(s)))
    }

    fn newline(&mut self) -> io::Result<()> {
        self.layout("\n")
    }

    fn indent(&mut self, depth: usize) -> io::Result<()> {
        for _ in 0..depth {
            self.layout(INDENT)?;
        }
        Ok(())
    }

    fn start(&mut self, depth: usize, start: BytesStart<'_>) -> io::Result<()> {
        self.indent(depth)?;
        self.event(Event::Start(start))
    }

    fn end(&mut self, tag: &str) -> io::Result<()> {
        self.event(Event::End(BytesEnd::new(tag)))
    }

    /// Character data, with control characters as `<byte>` elements
    fn text(&mut self, text: &str) -> io::Result<()> {
        let mut run_start = 0;
        for (idx, c) in text.char_indices() {
            if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') {
                self.event(Event::Text(BytesText::new(&text[run_start..idx])))?;
                let value = format!("x{:x}", c as u32);
                let byte = BytesStart::new("byte").with_attributes([("value", value.as_str())]);
                self.event(Event::Empty(byte))?;
                run_start = idx + c.len_utf8();
            }
        }
        self.event(Event::Text(BytesText::new(&text[run_start..])))
    }

    /// `<tag>text</tag>` on a line of its own
    fn element(&mut self, depth: usize, tag: &str, text: &str) -> io::Result<()> {
        self.start(depth, BytesStart::new(tag))?;
        self.text(text)?;
        self.end(tag)?;
        self.newline()
    }

    fn message(&mut self, message: &Message, mut cursor: EncoderState) -> io::Result<EncoderState> {
        let mut start = BytesStart::new("message");
        if message.is_numerus() {
            start.push_attribute(("numerus", "yes"));
        }
        self.start(1, start)?;
        self.newline()?;

        if message.status.is_live() {
            for occurrence in &message.occurrences {
                let (next, record) = cursor.encode(occurrence);
                cursor = next;
                let mut location = BytesStart::new("location");
                if let Some(file) = &record.file {
                    location.push_attribute(("filename", file.as_str()));
                }
                location.push_attribute(("line", record.line_attr().as_str()));
                self.indent(2)?;
                self.event(Event::Empty(location))?;
                self.newline()?;
            }
        }

        self.element(2, "source", &message.key.source)?;
        if let Some(old_source) = &message.old_source {
            self.element(2, "oldsource", old_source)?;
        }
        if let Disambiguation::Comment(comment) = &message.key.comment {
            self.element(2, "comment", comment)?;
        }
        if let Some(old_comment) = &message.old_comment {
            self.element(2, "oldcomment", old_comment)?;
        }
        if let Some(extra_comment) = &message.extra_comment {
            self.element(2, "extracomment", extra_comment)?;
        }
        if let Some(translator_comment) = &message.translator_comment {
            self.element(2, "translatorcomment", translator_comment)?;
        }

        let mut translation = BytesStart::new("translation");
        if let Some(kind) = status_type(message.status) {
            translation.push_attribute(("type", kind));
        }
        self.start(2, translation)?;
        match &message.translation {
            Translation::Single(text) => self.text(text)?,
            Translation::Numerus(forms) => {
                self.newline()?;
                for form in forms {
                    self.element(3, "numerusform", form)?;
                }
                self.indent(2)?;
            }
        }
        self.end("translation")?;
        self.newline()?;

        if message.vanished_passes > 0 {
            self.element(2, VANISHED_PASSES_EXTRA, &message.vanished_passes.to_string())?;
        }
        if let Some(status) = message.status_before_gone.filter(|_| message.status.is_gone()) {
            if let Some(kind) = live_status_name(status) {
                self.element(2, STATUS_BEFORE_GONE_EXTRA, kind)?;
            }
        }
        for extra in &message.extras {
            self.element(2, &extra.name, &extra.value)?;
        }
        self.indent(1)?;
        self.end("message")?;
        self.newline()?;
        Ok(cursor)
    }
}

fn live_status_name(status: Status) -> Option<&'static str> {
    match status {
        Status::Finished => Some("finished"),
        Status::New | Status::Unfinished => Some("unfinished"),
        Status::Obsolete | Status::Vanished => None,
    }
}

fn parse_live_status(name: &str) -> Option<Status> {
    match name {
        "finished" => Some(Status::Finished),
        "unfinished" => Some(Status::Unfinished),
        _ => None,
    }
}

/// `type` attribute of `<translation>`; finished has none
fn status_type(status: Status) -> Option<&'static str> {
    match status {
        Status::New | Status::Unfinished => Some("unfinished"),
        Status::Finished => None,
        Status::Obsolete => Some("obsolete"),
        Status::Vanished => Some("vanished"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_lib::key::normalize;
    use crate::catalog_lib::location::DeltaAnomaly;
    use crate::catalog_lib::message::Occurrence;
    use pretty_assertions::assert_eq;

    const QTERMINAL_NL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="nl">
<context>
    <name>QTerminal</name>
    <message>
        <location filename="../src/qterminal.cpp" line="+88"/>
        <source>Edit %1</source>
        <translation>Bewerk %1</translation>
    </message>
    <message>
        <location line="+7"/>
        <source>Close &amp; quit</source>
        <translation type="unfinished"></translation>
    </message>
</context>
<context>
    <name>UrlFilter</name>
    <message>
        <location line="+31"/>
        <location filename="../src/urlfilter.cpp" line="+40"/>
        <source>Copy link</source>
        <translation>Koppeling kopiëren</translation>
    </message>
</context>
</TS>
"#;

    #[test]
    fn test_load_relative_locations() {
        let catalog = load(QTERMINAL_NL.as_bytes()).unwrap();
        assert_eq!(catalog.language.as_deref(), Some("nl"));
        assert_eq!(catalog.contexts.len(), 2);

        let edit = &catalog.contexts[0].messages[0];
        assert_eq!(edit.key, normalize("QTerminal", "Edit %1", None));
        assert_eq!(edit.status, Status::Finished);
        assert_eq!(edit.occurrences, vec![Occurrence::new("../src/qterminal.cpp", 88)]);

        let close = &catalog.contexts[0].messages[1];
        assert_eq!(close.key.source, "Close & quit");
        assert_eq!(close.status, Status::Unfinished);
        assert_eq!(close.occurrences, vec![Occurrence::new("../src/qterminal.cpp", 95)]);

        // the cursor continues across the context boundary
        let copy = &catalog.contexts[1].messages[0];
        assert_eq!(
            copy.occurrences,
            vec![
                Occurrence::new("../src/qterminal.cpp", 126),
                Occurrence::new("../src/urlfilter.cpp", 40),
            ]
        );
        assert!(catalog.anomalies.is_empty());
    }

    #[test]
    fn test_serialize_is_stable() {
        let catalog = load(QTERMINAL_NL.as_bytes()).unwrap();
        let bytes = serialize(&catalog);
        assert_eq!(String::from_utf8(bytes.clone()).unwrap(), QTERMINAL_NL);
        assert_eq!(load(&bytes).unwrap(), catalog);
    }

    #[test]
    fn test_serialize_reencodes_after_reorder() {
        let mut catalog = load(QTERMINAL_NL.as_bytes()).unwrap();
        catalog.contexts[0].messages.swap(0, 1);
        let text = String::from_utf8(serialize(&catalog)).unwrap();
        assert!(text.contains("<location filename=\"../src/qterminal.cpp\" line=\"+95\"/>"));
        assert!(text.contains("<location line=\"-7\"/>"));
        let reloaded = load(text.as_bytes()).unwrap();
        assert_eq!(reloaded.contexts[0].messages, catalog.contexts[0].messages);
    }

    #[test]
    fn test_comment_numerus_and_extras() {
        let input = r#"<TS version="2.1" language="de">
<extra-scan-fingerprint>abc</extra-scan-fingerprint>
<context>
    <name>QObject</name>
    <message numerus="yes">
        <location filename="a.cpp" line="+3"/>
        <source>%n file(s)</source>
        <comment>status bar</comment>
        <extracomment>shown after a copy</extracomment>
        <translation>
            <numerusform>%n Datei</numerusform>
            <numerusform>%n Dateien</numerusform>
        </translation>
        <extra-po-flags>c-format</extra-po-flags>
    </message>
</context>
</TS>
"#;
        let catalog = load(input.as_bytes()).unwrap();
        assert_eq!(catalog.scan_fingerprint.as_deref(), Some("abc"));
        let msg = &catalog.contexts[0].messages[0];
        assert_eq!(msg.key, normalize("QObject", "%n file(s)", Some("status bar")));
        assert_eq!(msg.extra_comment.as_deref(), Some("shown after a copy"));
        assert_eq!(
            msg.translation,
            Translation::Numerus(vec!["%n Datei".into(), "%n Dateien".into()])
        );
        assert_eq!(msg.extras.len(), 1);
        assert_eq!(msg.extras[0].name, "extra-po-flags");

        let reloaded = load(&serialize(&catalog)).unwrap();
        assert_eq!(reloaded, catalog);
    }

    #[test]
    fn test_obsolete_only_round_trip() {
        let mut catalog = Catalog::new(Some("de".into()));
        catalog.push(
            Message::new(normalize("QObject", "b", Some("short form for bold")), false)
                .with_translation(Translation::Single("F".into()), Status::Obsolete),
        );
        let mut vanished = Message::new(normalize("QObject", "i", Some("short form for italic")), false)
            .with_translation(Translation::Single("K".into()), Status::Vanished);
        vanished.vanished_passes = 2;
        catalog.push(vanished);

        let text = String::from_utf8(serialize(&catalog)).unwrap();
        assert!(!text.contains("<location"));
        assert!(text.contains("<translation type=\"obsolete\">F</translation>"));
        assert!(text.contains("<extra-vanished-passes>2</extra-vanished-passes>"));
        assert_eq!(load(text.as_bytes()).unwrap(), catalog);
    }

    #[test]
    fn test_status_before_gone_round_trip() {
        let mut draft = Message::new(normalize("QTerminal", "draft", None), false)
            .with_translation(Translation::Single("ontwerp?".into()), Status::Obsolete);
        draft.status_before_gone = Some(Status::Unfinished);
        let mut catalog = Catalog::new(Some("nl".into()));
        catalog.push(draft);

        let text = String::from_utf8(serialize(&catalog)).unwrap();
        assert!(text.contains("<extra-status-before-gone>unfinished</extra-status-before-gone>"));
        assert_eq!(load(text.as_bytes()).unwrap(), catalog);

        let bad = text.replace(">unfinished</extra-status-before-gone>", ">obsolete</extra-status-before-gone>");
        assert_eq!(load(bad.as_bytes()).unwrap_err().kind, ParseErrorKind::MalformedStructure);
    }

    #[test]
    fn test_control_characters() {
        let mut catalog = Catalog::new(None);
        catalog.push(
            Message::new(normalize("Bell", "ring\u{7}now", None), false)
                .with_translation(Translation::Single("<\u{1b}>".into()), Status::Finished),
        );
        let text = String::from_utf8(serialize(&catalog)).unwrap();
        assert!(text.contains("<source>ring<byte value=\"x7\"/>now</source>"));
        assert!(text.contains("&lt;<byte value=\"x1b\"/>&gt;"));
        assert_eq!(load(text.as_bytes()).unwrap(), catalog);
    }

    #[test]
    fn test_unbalanced_is_malformed() {
        let input = "<TS version=\"2.1\"><context><name>A</name></TS>";
        let err = load(input.as_bytes()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MalformedStructure);

        let err = load(b"<TS version=\"2.1\"><context><name>A</name></context>").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MalformedStructure);
    }

    #[test]
    fn test_duplicate_key() {
        let input = r#"<TS version="2.1">
<context><name>A</name>
<message><source>x</source><translation>y</translation></message>
<message><source>x</source><translation>z</translation></message>
</context>
</TS>"#;
        let err = load(input.as_bytes()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DuplicateKey);
        assert!(err.detail.contains("A::\"x\""));
    }

    #[test]
    fn test_same_source_different_comment_is_not_duplicate() {
        let input = r#"<TS version="2.1">
<context><name>QObject</name>
<message><source>b</source><comment>short form for bold</comment><translation>F</translation></message>
<message><source>b</source><comment>short form for italic</comment><translation>K</translation></message>
<message><source>i</source><translation>F</translation></message>
</context>
</TS>"#;
        let catalog = load(input.as_bytes()).unwrap();
        assert_eq!(catalog.contexts[0].messages.len(), 3);
    }

    #[test]
    fn test_bad_delta() {
        let orphan = r#"<TS version="2.1"><context><name>A</name>
<message><location line="+3"/><source>x</source><translation>y</translation></message>
</context></TS>"#;
        let err = load(orphan.as_bytes()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::BadDelta);

        let garbage = r#"<TS version="2.1"><context><name>A</name>
<message><location filename="a.c" line="three"/><source>x</source><translation>y</translation></message>
</context></TS>"#;
        let err = load(garbage.as_bytes()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::BadDelta);

        let signs = r#"<TS version="2.1"><context><name>A</name>
<message><location filename="a.c" line="+-3"/><source>x</source><translation>y</translation></message>
</context></TS>"#;
        let err = load(signs.as_bytes()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::BadDelta);
    }

    #[test]
    fn test_delta_overflow() {
        let input = r#"<TS version="2.1"><context><name>A</name>
<message><location filename="a.c" line="+9223372036854775807"/><location line="+9223372036854775807"/><source>x</source><translation>y</translation></message>
</context></TS>"#;
        let err = load(input.as_bytes()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::BadDelta);
        assert!(err.detail.contains("out of range"));
    }

    #[test]
    fn test_negative_chain_is_flagged_not_fatal() {
        let input = r#"<TS version="2.1"><context><name>A</name>
<message><location filename="a.c" line="+2"/><source>x</source><translation>y</translation></message>
<message><location line="-5"/><source>z</source><translation>w</translation></message>
</context></TS>"#;
        let catalog = load(input.as_bytes()).unwrap();
        assert_eq!(catalog.anomalies.len(), 1);
        assert_eq!(catalog.anomalies[0].key, normalize("A", "z", None));
        assert_eq!(
            catalog.anomalies[0].anomaly,
            DeltaAnomaly::NonPositiveLine {
                file: "a.c".into(),
                line: -3
            }
        );
    }

    #[test]
    fn test_context_names_merge() {
        let input = r#"<TS version="2.1">
<context><name>A</name><message><source>x</source><translation>1</translation></message></context>
<context><name>B</name><message><source>x</source><translation>2</translation></message></context>
<context><name>A</name><message><source>y</source><translation>3</translation></message></context>
</TS>"#;
        let catalog = load(input.as_bytes()).unwrap();
        assert_eq!(catalog.contexts.len(), 2);
        assert_eq!(catalog.contexts[0].messages.len(), 2);
    }
}
