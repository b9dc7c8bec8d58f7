//! Minimal reader for the Prometheus text exposition format.
//!
//! Enough to sum a family across label sets and to tell which families a
//! scrape declares. Timestamps are ignored.

use std::collections::BTreeSet;

use crate::error::{ConformanceError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    /// In exposition order.
    pub labels: Vec<(String, String)>,
    pub value: f64,
}

impl Sample {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Exposition {
    samples: Vec<Sample>,
    /// Families named by `# TYPE` lines.
    declared: BTreeSet<String>,
}

impl Exposition {
    pub fn parse(text: &str) -> Result<Self> {
        let mut out = Exposition::default();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix('#') {
                let mut parts = rest.split_whitespace();
                if parts.next() == Some("TYPE") {
                    if let Some(name) = parts.next() {
                        out.declared.insert(name.to_string());
                    }
                }
                continue;
            }
            let sample = parse_sample(line).map_err(|detail| {
                ConformanceError::schema(format!("metrics line {}", idx + 1), detail)
            })?;
            out.samples.push(sample);
        }
        Ok(out)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Sum of every sample named exactly `name`, across label sets.
    pub fn sum(&self, name: &str) -> f64 {
        self.samples
            .iter()
            .filter(|s| s.name == name)
            .map(|s| s.value)
            .sum()
    }

    /// Value of the sample with exactly these labels (any order).
    pub fn get(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.samples
            .iter()
            .find(|s| {
                s.name == name
                    && s.labels.len() == labels.len()
                    && labels.iter().all(|(k, v)| s.label(k) == Some(*v))
            })
            .map(|s| s.value)
    }

    /// Whether the scrape declares `family` or carries any of its series.
    pub fn has_family(&self, family: &str) -> bool {
        if self.declared.contains(family) {
            return true;
        }
        self.samples.iter().any(|s| {
            s.name == family
                || s.name
                    .strip_prefix(family)
                    .is_some_and(|sfx| matches!(sfx, "_bucket" | "_sum" | "_count" | "_total"))
        })
    }

    /// [`has_family`](Self::has_family), except a trailing `*` matches any
    /// family or series name with that prefix.
    pub fn has_family_matching(&self, pattern: &str) -> bool {
        match pattern.strip_suffix('*') {
            Some(prefix) => {
                self.declared.iter().any(|f| f.starts_with(prefix))
                    || self.samples.iter().any(|s| s.name.starts_with(prefix))
            }
            None => self.has_family(pattern),
        }
    }
}

fn parse_sample(line: &str) -> std::result::Result<Sample, String> {
    let name_end = line
        .find(|c: char| c == '{' || c.is_whitespace())
        .ok_or_else(|| format!("no value in {line:?}"))?;
    let name = &line[..name_end];
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':') {
        return Err(format!("bad metric name in {line:?}"));
    }

    let mut rest = &line[name_end..];
    let mut labels = Vec::new();
    if let Some(body) = rest.strip_prefix('{') {
        let (parsed, after) = parse_labels(body)?;
        labels = parsed;
        rest = after;
    }

    let value_str = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| format!("no value in {line:?}"))?;
    let value = value_str
        .parse::<f64>()
        .map_err(|e| format!("bad value {value_str:?}: {e}"))?;

    Ok(Sample {
        name: name.to_string(),
        labels,
        value,
    })
}

/// Parse `k="v",...}` and return the labels plus the text after `}`.
fn parse_labels(body: &str) -> std::result::Result<(Vec<(String, String)>, &str), String> {
    let mut labels = Vec::new();
    let mut chars = body.char_indices().peekable();

    loop {
        while chars.next_if(|(_, c)| *c == ',' || c.is_whitespace()).is_some() {}
        let Some(&(start, c)) = chars.peek() else {
            return Err("unterminated label set".into());
        };
        if c == '}' {
            return Ok((labels, &body[start + 1..]));
        }

        let mut key = String::new();
        loop {
            match chars.next() {
                Some((_, '=')) => break,
                Some((_, c)) => key.push(c),
                None => return Err("label without value".into()),
            }
        }
        if chars.next().map(|(_, c)| c) != Some('"') {
            return Err(format!("label {key} value is not quoted"));
        }

        let mut value = String::new();
        loop {
            match chars.next() {
                Some((_, '"')) => break,
                Some((_, '\\')) => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, c)) => value.push(c),
                    None => return Err("dangling escape".into()),
                },
                Some((_, c)) => value.push(c),
                None => return Err(format!("label {key} value is unterminated")),
            }
        }
        labels.push((key.trim().to_string(), value));
    }
}
