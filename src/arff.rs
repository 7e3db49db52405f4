//! Reads categorical ARFF files into a [`Dataset`].
//!
//! The attribute named `class` supplies the label set; every other
//! attribute is kept in declaration order. Data rows carry the label as
//! their last field.

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::{info, warn};

use crate::dataset::{Attribute, Dataset, Instance};
use crate::error::{BayesError, Result};

pub fn read_path<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let dataset = parse_str(&text)?;
    info!(
        path = %path.display(),
        relation = dataset.relation().unwrap_or("-"),
        instances = dataset.len(),
        attributes = dataset.attributes().len(),
        "loaded dataset"
    );
    Ok(dataset)
}

pub fn parse_str(text: &str) -> Result<Dataset> {
    let mut relation = None;
    let mut labels: Option<Vec<String>> = None;
    let mut attributes = Vec::new();
    let mut data_offset = None;

    // Header:
    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('%') {
            continue;
        }
        if !trimmed.starts_with('@') {
            return Err(BayesError::parse(line, "data found before @data"));
        }

        let (keyword, rest) = match trimmed.find(char::is_whitespace) {
            Some(at) => trimmed.split_at(at),
            None => (trimmed, ""),
        };
        match keyword.to_ascii_lowercase().as_str() {
            "@relation" => relation = Some(unquote(rest.trim()).to_string()),
            "@attribute" => {
                let attribute = parse_attribute(line, rest)?;
                if attribute.name().eq_ignore_ascii_case("class") {
                    if labels.is_some() {
                        return Err(BayesError::parse(line, "class attribute declared twice"));
                    }
                    labels = Some(attribute.domain().to_vec());
                } else {
                    attributes.push(attribute);
                }
            }
            "@data" => {
                data_offset = Some(line);
                break;
            }
            other => {
                return Err(BayesError::parse(
                    line,
                    format!("unknown declaration '{other}'"),
                ))
            }
        }
    }

    let labels = labels.ok_or_else(|| BayesError::invalid("no class attribute declared"))?;

    let instances = match data_offset {
        Some(offset) => {
            let body: String = text
                .lines()
                .skip(offset)
                .map(|line| if line.trim_start().starts_with('%') { "" } else { line })
                .flat_map(|line| [line, "\n"])
                .collect();
            parse_rows(&body, offset, &labels, &attributes)?
        }
        None => Vec::new(),
    };

    let dataset = Dataset::new(labels, attributes, instances)?;
    Ok(match relation {
        Some(relation) => dataset.with_relation(relation),
        None => dataset,
    })
}

fn parse_rows(
    body: &str,
    offset: usize,
    labels: &[String],
    attributes: &[Attribute],
) -> Result<Vec<Instance>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .comment(Some(b'%'))
        .quote(b'\'')
        .from_reader(body.as_bytes());

    let mut instances = Vec::new();
    let mut skipped = 0;
    for record in reader.records() {
        let record = record?;
        let line = offset + record.position().map_or(0, |p| p.line() as usize);

        let mut fields: Vec<String> = record.iter().map(|f| unquote(f).to_string()).collect();
        if fields.len() != attributes.len() + 1 {
            warn!(
                line,
                expected = attributes.len() + 1,
                found = fields.len(),
                "skipping malformed row"
            );
            skipped += 1;
            continue;
        }

        let label = fields.pop().unwrap_or_default();
        if !labels.contains(&label) {
            return Err(BayesError::parse(line, format!("undeclared class label '{label}'")));
        }
        for (attribute, value) in attributes.iter().zip(&fields) {
            if !attribute.is_open() && !attribute.domain().contains(value) {
                return Err(BayesError::parse(
                    line,
                    format!("'{value}' is not a value of attribute '{}'", attribute.name()),
                ));
            }
        }
        instances.push(Instance::new(label, fields));
    }

    if skipped > 0 {
        warn!(skipped, "ignored malformed rows");
    }
    Ok(instances)
}

/// Parses the part of an `@attribute` line after the keyword.
fn parse_attribute(line: usize, rest: &str) -> Result<Attribute> {
    let rest = rest.trim();
    let (name, spec) = split_name(rest).ok_or_else(|| BayesError::parse(line, "missing attribute name"))?;
    let spec = spec.trim();

    if let Some(inner) = spec.strip_prefix('{') {
        let inner = inner
            .strip_suffix('}')
            .ok_or_else(|| BayesError::parse(line, "unterminated value list"))?;
        let values = split_values(inner)?;
        if values.is_empty() {
            return Err(BayesError::parse(line, format!("attribute '{name}' has no values")));
        }
        return Ok(Attribute::new(name, values));
    }

    let kind = spec
        .split_whitespace()
        .next()
        .ok_or_else(|| BayesError::parse(line, format!("attribute '{name}' has no type")))?;
    let attribute = Attribute::new(name, vec![kind.to_string()]);
    if !attribute.is_open() {
        return Err(BayesError::parse(
            line,
            format!("unsupported attribute type '{kind}'"),
        ));
    }
    Ok(attribute)
}

/// Splits a possibly quoted leading name from the rest of the line.
fn split_name(text: &str) -> Option<(String, &str)> {
    let first = text.chars().next()?;
    if first == '\'' || first == '"' {
        let close = text[1..].find(first)? + 1;
        Some((text[1..close].to_string(), &text[close + 1..]))
    } else {
        let end = text.find(char::is_whitespace).unwrap_or(text.len());
        Some((text[..end].to_string(), &text[end..]))
    }
}

fn split_values(list: &str) -> Result<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .quote(b'\'')
        .from_reader(list.as_bytes());

    match reader.records().next() {
        Some(record) => Ok(record?
            .iter()
            .map(|v| unquote(v).to_string())
            .filter(|v| !v.is_empty())
            .collect()),
        None => Ok(Vec::new()),
    }
}

fn unquote(token: &str) -> &str {
    let token = token.trim();
    for quote in ['\'', '"'] {
        if token.len() >= 2 && token.starts_with(quote) && token.ends_with(quote) {
            return &token[1..token.len() - 1];
        }
    }
    token
}
