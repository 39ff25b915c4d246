//! Extension section framing and the per-tag payload codecs.
//!
//! Every section is framed the same way: a 4-byte ASCII tag, a u16 LE
//! payload length, a u16 LE payload checksum, the payload, one trailing
//! NUL.  A checksum or terminator mismatch is fatal; an *unknown* tag is
//! not — callers skip it with a diagnostic, keeping the format forward
//! compatible.

use std::collections::BTreeMap;

use byteorder::{ByteOrder, LittleEndian};

use super::cursor::Cursor;
use super::FormatError;
use crate::checksum::checksum;
use crate::puzzle::{is_rebus_symbol, RebusKey, SquareMarkup, Timer};

/// The extension sections this crate understands, in the order the
/// printer emits them.  The order is a compatibility contract with
/// existing readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionTag {
    /// `GRBS` — per-cell rebus keys.
    RebusGrid,
    /// `RTBL` — rebus answer table.
    RebusSolution,
    /// `LTIM` — solve timer.
    Timer,
    /// `GEXT` — per-cell markup bits.
    MarkupGrid,
    /// `RUSR` — per-cell user rebus entries.
    RebusState,
}

impl ExtensionTag {
    pub const fn tag(self) -> &'static [u8; 4] {
        match self {
            ExtensionTag::RebusGrid => b"GRBS",
            ExtensionTag::RebusSolution => b"RTBL",
            ExtensionTag::Timer => b"LTIM",
            ExtensionTag::MarkupGrid => b"GEXT",
            ExtensionTag::RebusState => b"RUSR",
        }
    }

    pub fn from_tag(tag: &[u8; 4]) -> Option<Self> {
        match tag {
            b"GRBS" => Some(ExtensionTag::RebusGrid),
            b"RTBL" => Some(ExtensionTag::RebusSolution),
            b"LTIM" => Some(ExtensionTag::Timer),
            b"GEXT" => Some(ExtensionTag::MarkupGrid),
            b"RUSR" => Some(ExtensionTag::RebusState),
            _ => None,
        }
    }
}

/// One decoded section: raw tag plus checksum-verified payload.
#[derive(Debug)]
pub struct RawSection<'a> {
    pub tag: [u8; 4],
    pub data: &'a [u8],
}

/// Read one section from the cursor, verifying its payload checksum and
/// terminator.
pub fn parse_section<'a>(cursor: &mut Cursor<'a>) -> Result<RawSection<'a>, FormatError> {
    let mut tag = [0u8; 4];
    tag.copy_from_slice(cursor.read_bytes(4, "extension tag")?);
    let length = usize::from(cursor.read_u16("extension length")?);
    let declared = cursor.read_u16("extension checksum")?;
    let data = cursor.read_bytes(length, "extension payload")?;
    let terminator = cursor.read_u8("extension terminator")?;

    if checksum(data, 0) != declared {
        return Err(FormatError::SectionChecksumMismatch {
            tag: tag_string(&tag),
        });
    }
    if terminator != 0x00 {
        return Err(FormatError::SectionTerminatorMissing {
            tag: tag_string(&tag),
        });
    }
    Ok(RawSection { tag, data })
}

/// Frame a payload as a complete section.
pub fn encode_section(tag: ExtensionTag, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + data.len() + 1);
    out.extend_from_slice(tag.tag());
    let mut word = [0u8; 2];
    LittleEndian::write_u16(&mut word, data.len() as u16);
    out.extend_from_slice(&word);
    LittleEndian::write_u16(&mut word, checksum(data, 0));
    out.extend_from_slice(&word);
    out.extend_from_slice(data);
    out.push(0x00);
    out
}

pub fn tag_string(tag: &[u8; 4]) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

// ── GRBS ─────────────────────────────────────────────────────────────────────

/// One byte per cell: 0 means no rebus, otherwise the key shifted up by
/// one to avoid colliding with the empty marker.
pub fn decode_rebus_grid(data: &[u8]) -> Vec<Option<RebusKey>> {
    data.iter().map(|&byte| byte.checked_sub(1)).collect()
}

pub fn encode_rebus_grid(grid: &[Option<RebusKey>]) -> Vec<u8> {
    grid.iter()
        .map(|key| key.map_or(0x00, |k| k.wrapping_add(1)))
        .collect()
}

// ── RTBL ─────────────────────────────────────────────────────────────────────

/// ASCII text of semicolon-terminated entries, keys right-justified to
/// width two: `" 0:CAT;10:DOG;"`.
pub fn decode_rebus_table(data: &[u8]) -> Result<BTreeMap<RebusKey, String>, FormatError> {
    let text =
        std::str::from_utf8(data).map_err(|_| FormatError::MalformedRebusTable)?;
    let mut table = BTreeMap::new();
    if text.is_empty() {
        return Ok(table);
    }
    let body = text
        .strip_suffix(';')
        .ok_or(FormatError::MalformedRebusTable)?;
    for entry in body.split(';') {
        let (key, value) = entry
            .split_once(':')
            .ok_or(FormatError::MalformedRebusTable)?;
        if key.len() != 2 {
            return Err(FormatError::MalformedRebusTable);
        }
        let key: RebusKey = key
            .trim_start()
            .parse()
            .map_err(|_| FormatError::MalformedRebusTable)?;
        if !value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || is_rebus_symbol(b))
        {
            return Err(FormatError::MalformedRebusTable);
        }
        table.insert(key, value.to_string());
    }
    Ok(table)
}

pub fn encode_rebus_table(table: &BTreeMap<RebusKey, String>) -> Vec<u8> {
    use std::fmt::Write;
    let mut out = String::new();
    for (key, value) in table {
        let _ = write!(out, "{key:>2}:{value};");
    }
    out.into_bytes()
}

// ── RUSR ─────────────────────────────────────────────────────────────────────

/// One substitution per cell, NUL-separated with a single trailing NUL;
/// an empty string marks a cell without user input.
pub fn decode_rebus_state(data: &[u8]) -> Vec<Option<String>> {
    let body = data.strip_suffix(&[0x00]).unwrap_or(data);
    body.split(|&b| b == 0x00)
        .map(|entry| {
            if entry.is_empty() {
                None
            } else {
                Some(String::from_utf8_lossy(entry).into_owned())
            }
        })
        .collect()
}

pub fn encode_rebus_state(state: &[Option<String>]) -> Vec<u8> {
    let mut out = Vec::new();
    for entry in state {
        if let Some(value) = entry {
            out.extend_from_slice(value.as_bytes());
        }
        out.push(0x00);
    }
    out
}

// ── LTIM ─────────────────────────────────────────────────────────────────────

/// ASCII `secondsElapsed,isPausedFlag` with the flag as `0` or `1`.
pub fn decode_timer(data: &[u8]) -> Result<Timer, FormatError> {
    let malformed = || FormatError::MalformedTimer {
        text: String::from_utf8_lossy(data).into_owned(),
    };
    let text = std::str::from_utf8(data).map_err(|_| malformed())?;
    let (seconds, paused) = text.split_once(',').ok_or_else(malformed)?;
    if seconds.is_empty() || !seconds.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let seconds_elapsed: u32 = seconds.parse().map_err(|_| malformed())?;
    let is_paused = match paused {
        "0" => false,
        "1" => true,
        _ => return Err(malformed()),
    };
    Ok(Timer {
        seconds_elapsed,
        is_paused,
    })
}

pub fn encode_timer(timer: &Timer) -> Vec<u8> {
    format!("{},{}", timer.seconds_elapsed, u8::from(timer.is_paused)).into_bytes()
}

// ── GEXT ─────────────────────────────────────────────────────────────────────

/// One markup byte per cell.  Reserved bits are retained as-is.
pub fn decode_markup_grid(data: &[u8]) -> Vec<SquareMarkup> {
    data.iter()
        .map(|&byte| SquareMarkup::from_bits_retain(byte))
        .collect()
}

pub fn encode_markup_grid(grid: &[SquareMarkup]) -> Vec<u8> {
    grid.iter().map(|markup| markup.bits()).collect()
}
