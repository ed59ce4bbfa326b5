//! Saving and loading roots and state overrides as XML.
//!
//! ```xml
//! <directories>
//!   <root_directory path="/data"/>
//!   <state path="/data/backup" value="1"/>
//! </directories>
//! ```
//!
//! State values are `0` (normal), `1` (reference) and `2` (excluded).

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use thiserror::Error;
use tracing::debug;

use dupedirs_core::ScanState;

use crate::directories::Directories;
use crate::fs::FileSystem;

const ROOT_ELEMENT: &str = "directories";
const ROOT_DIRECTORY: &str = "root_directory";
const STATE: &str = "state";

/// Errors reading or writing a state document.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Opening or creating the document file failed.
    #[error("I/O error at {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the document failed.
    #[error("Write error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The document is XML but not a single-element document.
    #[error("Malformed document: {message}")]
    Malformed { message: String },
}

impl PersistError {
    fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// What a load applied and what it skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Roots added.
    pub roots_added: usize,
    /// Roots rejected as already present or missing.
    pub roots_rejected: usize,
    /// State entries applied.
    pub states_applied: usize,
    /// Entries skipped for missing or invalid attributes.
    pub entries_skipped: usize,
}

#[derive(Debug, Default)]
struct Document {
    roots: Vec<Option<String>>,
    states: Vec<(Option<String>, Option<String>)>,
}

impl<F: FileSystem> Directories<F> {
    /// Load roots and overrides from the file at `path`.
    ///
    /// A missing, unreadable or malformed file changes nothing.
    pub fn load_from_file(&mut self, path: &Path) -> LoadSummary {
        match File::open(path) {
            Ok(file) => self.load_from_reader(BufReader::new(file)),
            Err(err) => {
                debug!(path = %path.display(), %err, "State document not loaded");
                LoadSummary::default()
            }
        }
    }

    /// Load roots and overrides from an XML document.
    ///
    /// The whole document is parsed before anything is applied, so a
    /// malformed document changes nothing. Roots go through
    /// [`Directories::add_root`] and states through
    /// [`Directories::set_state`]; rejected or incomplete entries are skipped.
    pub fn load_from_reader<R: BufRead>(&mut self, reader: R) -> LoadSummary {
        let document = match parse_document(reader) {
            Ok(document) => document,
            Err(err) => {
                debug!(%err, "Ignoring unreadable state document");
                return LoadSummary::default();
            }
        };

        let mut summary = LoadSummary::default();
        for path in document.roots {
            let Some(path) = path else {
                summary.entries_skipped += 1;
                continue;
            };
            match self.add_root(PathBuf::from(path)) {
                Ok(()) => summary.roots_added += 1,
                Err(err) => {
                    debug!(%err, "Skipping stored root");
                    summary.roots_rejected += 1;
                }
            }
        }
        let mut states = Vec::with_capacity(document.states.len());
        for (path, value) in document.states {
            let state = value.and_then(|v| v.trim().parse::<u8>().ok().and_then(ScanState::from_value));
            match (path, state) {
                (Some(path), Some(state)) => states.push((PathBuf::from(path), state)),
                _ => summary.entries_skipped += 1,
            }
        }
        // Ancestors first, so no override is judged against a partial table.
        states.sort_by_key(|(path, _)| path.components().count());
        for (path, state) in states {
            self.set_state(&path, state);
            summary.states_applied += 1;
        }

        debug!(?summary, "Loaded state document");
        summary
    }

    /// Save roots and overrides to the file at `path`.
    pub fn save_to_file(&self, path: &Path) -> Result<(), PersistError> {
        let file = File::create(path).map_err(|source| PersistError::File {
            path: path.to_path_buf(),
            source,
        })?;
        self.save_to_writer(BufWriter::new(file))
    }

    /// Write roots (in order) and overrides as a UTF-8 XML document.
    pub fn save_to_writer<W: Write>(&self, writer: W) -> Result<(), PersistError> {
        let mut writer = Writer::new_with_indent(writer, b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))?;

        for root in self.roots().iter() {
            let Some(root) = utf8_path(root) else {
                continue;
            };
            let mut element = BytesStart::new(ROOT_DIRECTORY);
            element.push_attribute(("path", root));
            writer.write_event(Event::Empty(element))?;
        }
        for (path, state) in self.overrides().iter() {
            let Some(path) = utf8_path(path) else {
                continue;
            };
            let mut element = BytesStart::new(STATE);
            element.push_attribute(("path", path));
            element.push_attribute(("value", state.value().to_string().as_str()));
            writer.write_event(Event::Empty(element))?;
        }

        writer.write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))?;
        let mut inner = writer.into_inner();
        inner.write_all(b"\n")?;
        inner.flush()?;
        Ok(())
    }
}

fn utf8_path(path: &Path) -> Option<&str> {
    let utf8 = path.to_str();
    if utf8.is_none() {
        debug!(path = %path.display(), "Not saving non UTF-8 path");
    }
    utf8
}

fn parse_document<R: BufRead>(reader: R) -> Result<Document, PersistError> {
    let mut reader = Reader::from_reader(reader);
    let mut buf = Vec::new();
    let mut document = Document::default();
    let mut depth = 0usize;
    let mut top_level_elements = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) => {
                enter_element(depth, &mut top_level_elements)?;
                collect_entry(&element, &mut document)?;
                depth += 1;
            }
            Event::Empty(element) => {
                enter_element(depth, &mut top_level_elements)?;
                collect_entry(&element, &mut document)?;
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Text(text) if depth == 0 => {
                if !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(PersistError::malformed("text outside of the top-level element"));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if depth != 0 {
        return Err(PersistError::malformed("unclosed element"));
    }
    if top_level_elements == 0 {
        return Err(PersistError::malformed("no element found"));
    }
    Ok(document)
}

fn enter_element(depth: usize, top_level_elements: &mut usize) -> Result<(), PersistError> {
    if depth == 0 {
        *top_level_elements += 1;
        if *top_level_elements > 1 {
            return Err(PersistError::malformed("more than one top-level element"));
        }
    }
    Ok(())
}

fn collect_entry(element: &BytesStart<'_>, document: &mut Document) -> Result<(), PersistError> {
    let name = element.name();
    if name.as_ref() == ROOT_DIRECTORY.as_bytes() {
        document.roots.push(attribute(element, "path")?);
    } else if name.as_ref() == STATE.as_bytes() {
        document
            .states
            .push((attribute(element, "path")?, attribute(element, "value")?));
    }
    Ok(())
}

fn attribute(element: &BytesStart<'_>, key: &str) -> Result<Option<String>, PersistError> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == key.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
