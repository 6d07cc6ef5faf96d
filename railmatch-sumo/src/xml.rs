use std::{
    io::Write,
    path::{Path, PathBuf},
};

use crate::SumoFileError;

const INDENT: &str = "    ";

/// replaces the five XML special characters with entity references.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// minimal streaming writer for the indented, attribute-only documents SUMO reads.
pub struct XmlWriter<W: Write> {
    inner: W,
    path: PathBuf,
    open: Vec<String>,
}

impl<W: Write> XmlWriter<W> {
    /// writes the XML declaration. `path` is only used for error messages.
    pub fn new(inner: W, path: &Path) -> Result<Self, SumoFileError> {
        let mut writer = Self {
            inner,
            path: path.to_owned(),
            open: vec![],
        };
        writer.write_line("<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        Ok(writer)
    }

    /// opens an element that will hold children.
    pub fn start(&mut self, tag: &str, attributes: &[(&str, &str)]) -> Result<(), SumoFileError> {
        let line = format!("{}<{tag}{}>", self.indent(), render_attributes(attributes));
        self.write_line(&line)?;
        self.open.push(tag.to_string());
        Ok(())
    }

    /// writes a self-closing element.
    pub fn empty(&mut self, tag: &str, attributes: &[(&str, &str)]) -> Result<(), SumoFileError> {
        let line = format!("{}<{tag}{}/>", self.indent(), render_attributes(attributes));
        self.write_line(&line)
    }

    /// closes the most recently opened element.
    pub fn end(&mut self) -> Result<(), SumoFileError> {
        let tag = self.open.pop().ok_or_else(|| SumoFileError::WriteError {
            path: self.path.clone(),
            message: String::from("closing tag written without a matching start tag"),
        })?;
        let line = format!("{}</{tag}>", self.indent());
        self.write_line(&line)
    }

    /// closes any open elements and flushes. returns the inner writer.
    pub fn finish(mut self) -> Result<W, SumoFileError> {
        while !self.open.is_empty() {
            self.end()?;
        }
        self.inner.flush().map_err(|e| SumoFileError::WriteError {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        Ok(self.inner)
    }

    fn indent(&self) -> String {
        INDENT.repeat(self.open.len())
    }

    fn write_line(&mut self, line: &str) -> Result<(), SumoFileError> {
        writeln!(self.inner, "{line}").map_err(|e| SumoFileError::WriteError {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

fn render_attributes(attributes: &[(&str, &str)]) -> String {
    attributes
        .iter()
        .map(|(k, v)| format!(" {k}=\"{}\"", escape(v)))
        .collect()
}

/// parses a document, attributing syntax errors to `path`.
pub fn parse_document<'a>(
    text: &'a str,
    path: &Path,
) -> Result<roxmltree::Document<'a>, SumoFileError> {
    roxmltree::Document::parse(text).map_err(|e| SumoFileError::XmlError {
        path: path.to_owned(),
        message: e.to_string(),
    })
}
