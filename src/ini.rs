//! INI text layer over the dictionary.
//!
//! The reader turns a file into flat `set` calls: a `[section]` header
//! becomes a key with no value, and every `name = value` line below it
//! becomes a `section:name` entry. The dictionary itself never learns
//! INI structure; composite keys are opaque strings to it. The `:`
//! join, lowercase normalization, comment and quote handling all live
//! here. The writer walks entries in store order and regroups them
//! under their section headers.
//!
//! Syntax errors do not abort the scan: each offending line is reported
//! through `log::warn!` and counted, and the total is returned as
//! [`IniError::Syntax`] once the whole input has been read.

use crate::dict::{DictError, Dictionary, Value};
use crate::hash::KeyHash;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IniError {
    #[error("cannot open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("i/o error reading {origin}")]
    Read {
        origin: String,
        #[source]
        source: io::Error,
    },
    #[error("{errors} syntax error(s) in {origin}")]
    Syntax { origin: String, errors: usize },
}

/// Parse the INI file at `path` into a fresh dictionary.
pub fn load(path: impl AsRef<Path>) -> Result<Dictionary, IniError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IniError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read(BufReader::new(file), &path.display().to_string())
}

/// Parse INI text from any buffered reader. `origin` names the input in
/// diagnostics (a path, `"<stdin>"`, ...).
pub fn read<R: BufRead>(reader: R, origin: &str) -> Result<Dictionary, IniError> {
    let mut dict = Dictionary::new();
    let mut section = String::new();
    let mut pending = String::new();
    let mut errors = 0usize;
    let mut lineno = 0usize;

    for line in reader.lines() {
        lineno += 1;
        let line = line.map_err(|source| IniError::Read {
            origin: origin.to_owned(),
            source,
        })?;

        // A trailing backslash folds the next physical line into this
        // logical one.
        if let Some(stem) = line.trim_end().strip_suffix('\\') {
            pending.push_str(stem);
            continue;
        }
        pending.push_str(&line);
        let logical = std::mem::take(&mut pending);

        if !parse_line(&mut dict, &mut section, &logical) {
            log::warn!("syntax error in {origin} ({lineno}): {:?}", logical.trim());
            errors += 1;
        }
    }
    if !pending.is_empty() && !parse_line(&mut dict, &mut section, &pending) {
        log::warn!("syntax error in {origin} ({lineno}): {:?}", pending.trim());
        errors += 1;
    }

    if errors > 0 {
        return Err(IniError::Syntax {
            origin: origin.to_owned(),
            errors,
        });
    }
    Ok(dict)
}

/// Write `dict` back out as INI text: each section header followed by
/// its `name = "value"` lines, sections and entries in store order. A
/// dictionary with no sections at all is dumped as bare pairs.
pub fn dump_ini<H: KeyHash, W: Write>(dict: &Dictionary<H>, out: &mut W) -> io::Result<()> {
    let secs: Vec<&str> = sections(dict).collect();
    if secs.is_empty() {
        for (key, value) in dict.iter() {
            writeln!(out, "{key} = {}", value.and_then(Value::as_text).unwrap_or(""))?;
        }
        return Ok(());
    }
    for sec in secs {
        writeln!(out, "\n[{sec}]")?;
        let prefix = format!("{sec}:");
        for (key, value) in dict.iter() {
            if let Some(name) = key.strip_prefix(&prefix) {
                let text = value.and_then(Value::as_text).unwrap_or("");
                writeln!(out, "{name:<30} = \"{text}\"")?;
            }
        }
    }
    writeln!(out)?;
    Ok(())
}

/// Section names: entries whose key carries no `:`, in store order.
pub fn sections<H: KeyHash>(dict: &Dictionary<H>) -> impl Iterator<Item = &str> {
    dict.iter()
        .filter(|(key, _)| !key.contains(':'))
        .map(|(key, _)| key)
}

/// Full composite keys belonging to `section`, in store order.
pub fn section_keys<'a, H: KeyHash>(
    dict: &'a Dictionary<H>,
    section: &str,
) -> impl Iterator<Item = &'a str> {
    let prefix = format!("{}:", normalize(section));
    dict.iter()
        .filter(move |(key, _)| key.starts_with(&prefix))
        .map(|(key, _)| key)
}

/// The string under `key`, or `default` when the key is missing or
/// holds no value.
pub fn get_string<'a, H: KeyHash>(dict: &'a Dictionary<H>, key: &str, default: &'a str) -> &'a str {
    dict.get_text(&normalize(key)).unwrap_or(default)
}

/// The integer under `key`, read with C `strtol(_, _, 0)` semantics:
/// `0x` prefix is hex, a leading `0` is octal, and parsing stops at the
/// first invalid character (yielding 0 if that is the first one).
pub fn get_int<H: KeyHash>(dict: &Dictionary<H>, key: &str, default: i64) -> i64 {
    match dict.get_text(&normalize(key)) {
        Some(v) => parse_long(v),
        None => default,
    }
}

/// The float under `key`; an unparseable value reads as 0.0, matching
/// `atof`.
pub fn get_double<H: KeyHash>(dict: &Dictionary<H>, key: &str, default: f64) -> f64 {
    match dict.get_text(&normalize(key)) {
        Some(v) => v.trim().parse().unwrap_or(0.0),
        None => default,
    }
}

/// The boolean under `key`: values starting `1/t/T/y/Y` read true,
/// `0/f/F/n/N` read false, anything else falls back to `default`.
pub fn get_bool<H: KeyHash>(dict: &Dictionary<H>, key: &str, default: bool) -> bool {
    match dict.get_text(&normalize(key)).and_then(|v| v.chars().next()) {
        Some('1' | 't' | 'T' | 'y' | 'Y') => true,
        Some('0' | 'f' | 'F' | 'n' | 'N') => false,
        _ => default,
    }
}

/// Set `key` (normalized like the reader would) to `value`.
pub fn set<H: KeyHash>(
    dict: &mut Dictionary<H>,
    key: &str,
    value: Option<&str>,
) -> Result<(), DictError> {
    dict.set(&normalize(key), value)
}

/// Remove `key` (normalized like the reader would) if present.
pub fn unset<H: KeyHash>(dict: &mut Dictionary<H>, key: &str) {
    dict.unset(&normalize(key));
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

// One logical line. Returns false on a line that is neither blank,
// comment, section header, nor key/value pair.
fn parse_line(dict: &mut Dictionary, section: &mut String, raw: &str) -> bool {
    let line = raw.trim();
    if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
        return true;
    }
    if let Some(rest) = line.strip_prefix('[') {
        let Some(end) = rest.find(']') else {
            return false;
        };
        // Text after the bracket (usually a comment) is ignored.
        *section = normalize(&rest[..end]);
        let name = section.clone();
        let _ = dict.set(&name, None);
        return true;
    }
    if let Some((key, value)) = line.split_once('=') {
        if key.trim().is_empty() {
            return false;
        }
        let composite = format!("{section}:{}", normalize(key));
        let _ = dict.set(&composite, Some(&clean_value(value)));
        return true;
    }
    false
}

fn clean_value(raw: &str) -> String {
    let v = raw.trim();
    if let Some(inner) = unquote(v) {
        return inner.to_owned();
    }
    // Unquoted: an inline comment starts at the first ';' or '#'.
    let v = match v.find(|c| c == ';' || c == '#') {
        Some(at) => v[..at].trim_end(),
        None => v,
    };
    match unquote(v) {
        Some(inner) => inner.to_owned(),
        None => v.to_owned(),
    }
}

fn unquote(v: &str) -> Option<&str> {
    let wrapped = v.len() >= 2
        && ((v.starts_with('"') && v.ends_with('"'))
            || (v.starts_with('\'') && v.ends_with('\'')));
    wrapped.then(|| &v[1..v.len() - 1])
}

fn parse_long(s: &str) -> i64 {
    let s = s.trim_start();
    let (neg, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (radix, digits) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (16, hex)
    } else if s.len() > 1 && s.starts_with('0') {
        (8, &s[1..])
    } else {
        (10, s)
    };
    let mut value: i64 = 0;
    for c in digits.chars() {
        match c.to_digit(radix) {
            Some(d) => value = value.wrapping_mul(i64::from(radix)).wrapping_add(i64::from(d)),
            None => break,
        }
    }
    if neg {
        -value
    } else {
        value
    }
}
