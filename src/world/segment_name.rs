//! Segment level-name codec.
//!
//! GMAP segments are ordinary levels whose names encode their grid cell.
//! Two conventions exist on the wire: the letter-column form
//! `<base>-<a..z><row>.nw` and the numeric form `<base>_<col>-<row>.nw`
//! with two-digit fields. Names are parsed by hand, the same way the
//! sector grid filenames are elsewhere in this codebase.

/// File extension of a playable level.
pub const LEVEL_EXTENSION: &str = ".nw";

/// File extension of a map descriptor (not itself enterable).
pub const GMAP_EXTENSION: &str = ".gmap";

/// Highest letter-format column plus one; `z` is column 25.
pub const MAX_LETTER_COLUMNS: i32 = 26;

const INVALID_SUFFIX: &str = "-INVALID";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSegment {
    pub base: String,
    pub x: i32,
    pub y: i32,
}

/// Extracts the grid cell encoded in a segment level-name.
///
/// Tries the letter-column form first, then the numeric form. Returns
/// `None` for anything else; stand-alone levels and descriptor files are
/// not segments.
pub fn parse_segment_name(name: &str) -> Option<ParsedSegment> {
    parse_letter_format(name).or_else(|| parse_numeric_format(name))
}

fn parse_letter_format(name: &str) -> Option<ParsedSegment> {
    let stem = name.strip_suffix(LEVEL_EXTENSION)?;
    // The base is greedy: only the last hyphen can start the cell suffix,
    // since the row digits cannot contain a hyphen themselves.
    let (base, tail) = stem.rsplit_once('-')?;
    if base.is_empty() {
        return None;
    }
    let mut chars = tail.chars();
    let column = chars.next()?;
    if !column.is_ascii_lowercase() {
        return None;
    }
    let digits = chars.as_str();
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let y = digits.parse::<i32>().ok()?;
    Some(ParsedSegment {
        base: base.to_string(),
        x: i32::from(column as u8 - b'a'),
        y,
    })
}

fn parse_numeric_format(name: &str) -> Option<ParsedSegment> {
    let stem = name.strip_suffix(LEVEL_EXTENSION)?;
    let (rest, row) = stem.rsplit_once('-')?;
    let (base, column) = rest.rsplit_once('_')?;
    if base.is_empty() || !is_two_digits(column) || !is_two_digits(row) {
        return None;
    }
    Some(ParsedSegment {
        base: base.to_string(),
        x: column.parse::<i32>().ok()?,
        y: row.parse::<i32>().ok()?,
    })
}

fn is_two_digits(field: &str) -> bool {
    field.len() == 2 && field.bytes().all(|byte| byte.is_ascii_digit())
}

/// Builds the letter-format name for a grid cell.
///
/// Out-of-range cells (negative, or column past `z`) yield the
/// `<base>-INVALID` marker instead of a usable name; callers must check
/// with [`is_invalid_segment_name`] before using the result as a lookup key.
pub fn build_segment_name(base: &str, x: i32, y: i32) -> String {
    if x < 0 || y < 0 || x >= MAX_LETTER_COLUMNS {
        return format!("{base}{INVALID_SUFFIX}");
    }
    let column = (b'a' + x as u8) as char;
    format!("{base}-{column}{y}{LEVEL_EXTENSION}")
}

pub fn is_invalid_segment_name(name: &str) -> bool {
    name.ends_with(INVALID_SUFFIX)
}

/// Whether a level name participates in GMAP handling at all.
///
/// True for descriptor files and for letter-format segment names with
/// exactly one hyphen. Gates segment-coordinate inference: plain levels
/// must never be fed through it.
pub fn is_gmap_related(name: &str) -> bool {
    if name.ends_with(GMAP_EXTENSION) {
        return true;
    }
    name.bytes().filter(|byte| *byte == b'-').count() == 1
        && parse_letter_format(name).is_some()
}
