use super::events::{Attribute, SpannedEvent, XmlEvent};
use crate::error::AnalysisError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Pull parser producing namespace-resolved, spanned events.
///
/// Well-formedness is enforced beyond what the underlying tokenizer checks:
/// a document must have exactly one root element, no text outside of it, and
/// every element must be closed before EOF. The first error ends the stream.
pub struct EventReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    path: PathBuf,
    pending: VecDeque<SpannedEvent>,
    /// Namespace bindings declared by each open element
    scopes: Vec<Vec<(Option<String>, String)>>,
    /// Qualified names of open elements
    open: Vec<String>,
    /// End of the last token read from the tokenizer
    cursor: u64,
    /// End of the last emitted event
    span_start: u64,
    /// Newlines consumed before `cursor`
    lines: u64,
    root_seen: bool,
    finished: bool,
}

impl EventReader<BufReader<File>> {
    /// Open a file for streaming. The handle is closed when the reader drops.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file), path))
    }
}

impl<'a> EventReader<&'a [u8]> {
    /// Stream over an in-memory document; `path` is only used in errors
    pub fn from_bytes(bytes: &'a [u8], path: impl AsRef<Path>) -> Self {
        Self::new(bytes, path.as_ref())
    }
}

/// Owned copy of a start tag, detached from the read buffer
struct RawStart {
    qname: String,
    local: String,
    prefix: Option<String>,
    attributes: Vec<(String, String)>,
}

enum RawToken {
    Start(RawStart),
    Empty(RawStart),
    End(String),
    Text(String),
    CData(String),
    Skipped,
    Eof,
}

enum DecodeError {
    Syntax(String),
    Encoding,
}

impl<R: BufRead> EventReader<R> {
    pub fn new(source: R, path: &Path) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(false);

        Self {
            reader,
            buf: Vec::new(),
            path: path.to_path_buf(),
            pending: VecDeque::new(),
            scopes: Vec::new(),
            open: Vec::new(),
            cursor: 0,
            span_start: 0,
            lines: 0,
            root_seen: false,
            finished: false,
        }
    }

    /// Read the next event, `Ok(None)` at the end of a well-formed document
    pub fn next_event(&mut self) -> Result<Option<SpannedEvent>, AnalysisError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            if self.finished {
                return Ok(None);
            }
            self.read_token()?;
        }
    }

    fn read_token(&mut self) -> Result<(), AnalysisError> {
        self.buf.clear();
        let raw_start = self.cursor;

        let (token, raw_end) = match self.reader.read_event_into(&mut self.buf) {
            Ok(event) => {
                let position = self.reader.buffer_position() as u64;
                let token = match event {
                    Event::Start(e) => decode_start(&e).map(RawToken::Start),
                    Event::Empty(e) => decode_start(&e).map(RawToken::Empty),
                    Event::End(e) => std::str::from_utf8(e.name().as_ref())
                        .map(|name| RawToken::End(name.to_string()))
                        .map_err(|_| DecodeError::Encoding),
                    Event::Text(e) => match e.unescape() {
                        Ok(text) => Ok(RawToken::Text(text.into_owned())),
                        Err(err) => {
                            debug!("Keeping raw text after unescape failure: {}", err);
                            Ok(RawToken::Text(String::from_utf8_lossy(&e).into_owned()))
                        }
                    },
                    Event::CData(e) => std::str::from_utf8(&e)
                        .map(|text| RawToken::CData(text.to_string()))
                        .map_err(|_| DecodeError::Encoding),
                    Event::Eof => Ok(RawToken::Eof),
                    _ => Ok(RawToken::Skipped),
                };
                (token, position)
            }
            Err(err) => {
                let offset = self.reader.buffer_position() as u64;
                return Err(self.fail(offset, err.to_string()));
            }
        };

        // Text tokens end where their raw bytes end; the tokenizer may already
        // have consumed the `<` that terminated them.
        let raw_end = match &token {
            Ok(RawToken::Text(_)) => raw_start + self.buf.len() as u64,
            _ => raw_end,
        };
        let line = self.lines + 1;
        self.lines += self.buf.iter().filter(|&&b| b == b'\n').count() as u64;
        self.cursor = raw_end;

        let token = match token {
            Ok(token) => token,
            Err(DecodeError::Encoding) => {
                self.finished = true;
                return Err(AnalysisError::Encoding {
                    path: self.path.clone(),
                    offset: raw_start,
                });
            }
            Err(DecodeError::Syntax(message)) => return Err(self.fail(raw_start, message)),
        };

        match token {
            RawToken::Start(start) => self.start_element(start, false, raw_start, raw_end, line),
            RawToken::Empty(start) => self.start_element(start, true, raw_start, raw_end, line),
            RawToken::End(qname) => self.end_element(qname, raw_start, raw_end, line),
            RawToken::Text(text) | RawToken::CData(text) => {
                if self.open.is_empty() {
                    if !text.trim().is_empty() {
                        return Err(self.fail(raw_start, "text outside of the root element".to_string()));
                    }
                    Ok(())
                } else {
                    self.emit(XmlEvent::Characters(text), raw_end, line);
                    Ok(())
                }
            }
            RawToken::Skipped => Ok(()),
            RawToken::Eof => self.finish(raw_start),
        }
    }

    fn start_element(
        &mut self,
        start: RawStart,
        empty: bool,
        raw_start: u64,
        raw_end: u64,
        line: u64,
    ) -> Result<(), AnalysisError> {
        if self.open.is_empty() && self.root_seen {
            return Err(self.fail(
                raw_start,
                format!("second root element <{}>", start.qname),
            ));
        }
        self.root_seen = true;

        let mut declared = Vec::new();
        let mut attributes = Vec::new();
        for (key, value) in start.attributes {
            if key == "xmlns" {
                declared.push((None, value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declared.push((Some(prefix.to_string()), value));
            } else {
                let (prefix, name) = split_qname(&key);
                attributes.push(Attribute {
                    name: name.to_string(),
                    prefix: prefix.map(str::to_string),
                    value,
                });
            }
        }

        for (prefix, uri) in &declared {
            self.pending.push_back(SpannedEvent {
                event: XmlEvent::StartNamespace {
                    prefix: prefix.clone(),
                    uri: uri.clone(),
                },
                span: self.span_start..self.span_start,
                line,
            });
        }
        self.scopes.push(declared);
        let namespace_uri = self.resolve(start.prefix.as_deref());

        self.emit(
            XmlEvent::StartElement {
                name: start.local.clone(),
                prefix: start.prefix,
                namespace_uri,
                attributes,
                empty,
            },
            raw_end,
            line,
        );

        if empty {
            self.scopes.pop();
            self.emit(XmlEvent::EndElement { name: start.local }, raw_end, line);
        } else {
            self.open.push(start.qname);
        }
        Ok(())
    }

    fn end_element(
        &mut self,
        qname: String,
        raw_start: u64,
        raw_end: u64,
        line: u64,
    ) -> Result<(), AnalysisError> {
        match self.open.pop() {
            Some(expected) if expected == qname => {}
            Some(expected) => {
                return Err(self.fail(
                    raw_start,
                    format!("expected </{}>, found </{}>", expected, qname),
                ));
            }
            None => {
                return Err(self.fail(raw_start, format!("unmatched end tag </{}>", qname)));
            }
        }
        self.scopes.pop();

        let (_, local) = split_qname(&qname);
        let name = local.to_string();
        self.emit(XmlEvent::EndElement { name }, raw_end, line);
        Ok(())
    }

    fn finish(&mut self, offset: u64) -> Result<(), AnalysisError> {
        if let Some(unclosed) = self.open.last() {
            let message = format!(
                "unexpected end of document with {} unclosed element(s), innermost <{}>",
                self.open.len(),
                unclosed
            );
            return Err(self.fail(offset, message));
        }
        if !self.root_seen {
            return Err(self.fail(offset, "document has no root element".to_string()));
        }
        self.finished = true;
        Ok(())
    }

    fn emit(&mut self, event: XmlEvent, raw_end: u64, line: u64) {
        let span = self.span_start..raw_end.max(self.span_start);
        self.span_start = span.end;
        self.pending.push_back(SpannedEvent { event, span, line });
    }

    /// Look up a prefix through the open scopes, innermost first
    fn resolve(&self, prefix: Option<&str>) -> Option<String> {
        for scope in self.scopes.iter().rev() {
            for (declared, uri) in scope.iter().rev() {
                if declared.as_deref() == prefix {
                    // `xmlns=""` undeclares the default namespace
                    return if uri.is_empty() { None } else { Some(uri.clone()) };
                }
            }
        }
        match prefix {
            Some("xml") => Some("http://www.w3.org/XML/1998/namespace".to_string()),
            _ => None,
        }
    }

    fn fail(&mut self, offset: u64, message: String) -> AnalysisError {
        self.finished = true;
        self.pending.clear();
        AnalysisError::Parse {
            path: self.path.clone(),
            offset,
            line: self.lines + 1,
            message,
        }
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = Result<SpannedEvent, AnalysisError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

fn decode_start(e: &BytesStart) -> Result<RawStart, DecodeError> {
    let name = e.name();
    let qname = std::str::from_utf8(name.as_ref()).map_err(|_| DecodeError::Encoding)?;
    let (prefix, local) = split_qname(qname);

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| DecodeError::Syntax(err.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(|_| DecodeError::Encoding)?;
        let value = match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        attributes.push((key.to_string(), value));
    }

    Ok(RawStart {
        qname: qname.to_string(),
        local: local.to_string(),
        prefix: prefix.map(str::to_string),
        attributes,
    })
}

/// Split `prefix:local` into its parts
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    }
}
