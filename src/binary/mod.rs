//! The binary `.puz` codec.
//!
//! `parse_binary` turns a byte buffer into a [`Puzzle`], verifying all
//! three checksums; `print_binary` is its inverse.  Layout, offsets and
//! checksum coverage are documented in [`crate::header`].
//!
//! Bytes before the `ACROSS&DOWN` signature (some download paths prepend
//! junk) are preserved verbatim so a decode/encode cycle reproduces the
//! input.

pub mod cursor;
pub mod extension;

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

use crate::encoding::Encoding;
use crate::header::{encode_header_without_checksums, offset, FILE_SIGNATURE};
use crate::projections::{get_file_checksum, get_header_checksum, get_masked_checksum, get_state};
use crate::puzzle::{Puzzle, Rebus};
use crate::validate::{validate, ValidationError};
use cursor::Cursor;
use extension::{
    decode_markup_grid, decode_rebus_grid, decode_rebus_state, decode_rebus_table, decode_timer,
    encode_markup_grid, encode_rebus_grid, encode_rebus_state, encode_rebus_table, encode_section,
    encode_timer, parse_section, tag_string, ExtensionTag,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("file does not contain the ACROSS&DOWN signature")]
    MissingSignature,
    #[error("unexpected end of file at offset {offset} while reading {field}")]
    UnexpectedEof { offset: usize, field: &'static str },
    #[error("file ended after clue {index} of {expected}")]
    MissingClue { index: usize, expected: usize },
    #[error("header checksum mismatch: stored {stored:#06x}, computed {computed:#06x}")]
    HeaderChecksumMismatch { stored: u16, computed: u16 },
    #[error("file checksum mismatch: stored {stored:#06x}, computed {computed:#06x}")]
    FileChecksumMismatch { stored: u16, computed: u16 },
    #[error("masked checksum mismatch")]
    MaskedChecksumMismatch,
    #[error("checksum mismatch in extension section {tag:?}")]
    SectionChecksumMismatch { tag: String },
    #[error("extension section {tag:?} is not NUL-terminated")]
    SectionTerminatorMissing { tag: String },
    #[error("malformed rebus table")]
    MalformedRebusTable,
    #[error("malformed timer payload {text:?}")]
    MalformedTimer { text: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Parse a binary `.puz` buffer.
pub fn parse_binary(data: &[u8]) -> Result<Puzzle, FormatError> {
    let start = data
        .windows(FILE_SIGNATURE.len())
        .position(|window| window == FILE_SIGNATURE)
        .filter(|&index| index >= offset::FILE_SIGNATURE)
        .map(|index| index - offset::FILE_SIGNATURE)
        .ok_or(FormatError::MissingSignature)?;
    let preamble = data[..start].to_vec();

    // The header holds no encoded text, so any encoding will do here.
    let mut header = Cursor::new(data, Encoding::Latin1, start);
    let stored_file_checksum = header.read_u16("file checksum")?;
    header.read_bytes(FILE_SIGNATURE.len(), "signature")?;
    let stored_header_checksum = header.read_u16("header checksum")?;
    let mut stored_masked = [0u8; 8];
    stored_masked.copy_from_slice(header.read_bytes(8, "masked checksum")?);
    let file_version = String::from_utf8_lossy(header.read_bytes(4, "file version")?)
        .trim_end_matches('\0')
        .to_string();
    let unknown1 = header.read_u16("reserved 0x1C")?;
    let scrambled_checksum = header.read_u16("scrambled checksum")?;
    let mut unknown2 = [0u8; 12];
    unknown2.copy_from_slice(header.read_bytes(12, "reserved 0x20")?);
    let width = header.read_u8("width")?;
    let height = header.read_u8("height")?;
    let clue_count = usize::from(header.read_u16("clue count")?);
    let unknown3 = header.read_u16("bitmask")?;
    let is_scrambled = header.read_u16("scrambled flag")? & 0x0004 != 0;

    let encoding = Encoding::for_version(&file_version)?;
    let mut cursor = Cursor::new(data, encoding, header.position());

    let grid_size = usize::from(width) * usize::from(height);
    let solution = cursor.read_string(grid_size, "solution")?;
    let state = cursor.read_string(grid_size, "state")?;
    let title = cursor.read_zstring();
    let author = cursor.read_zstring();
    let copyright = cursor.read_zstring();
    let mut clues = Vec::with_capacity(clue_count);
    for index in 0..clue_count {
        clues.push(cursor.read_zstring().ok_or(FormatError::MissingClue {
            index,
            expected: clue_count,
        })?);
    }
    let notepad = cursor.read_zstring();

    let mut rebus_grid = None;
    let mut rebus_solution = None;
    let mut rebus_state = None;
    let mut timer = None;
    let mut markup_grid = None;
    while cursor.has_bytes_left() {
        let section = parse_section(&mut cursor)?;
        match ExtensionTag::from_tag(&section.tag) {
            Some(ExtensionTag::RebusGrid) => rebus_grid = Some(decode_rebus_grid(section.data)),
            Some(ExtensionTag::RebusSolution) => {
                rebus_solution = Some(decode_rebus_table(section.data)?)
            }
            Some(ExtensionTag::RebusState) => rebus_state = Some(decode_rebus_state(section.data)),
            Some(ExtensionTag::Timer) => timer = Some(decode_timer(section.data)?),
            Some(ExtensionTag::MarkupGrid) => {
                markup_grid = Some(decode_markup_grid(section.data))
            }
            None => {
                eprintln!(
                    "skipping unrecognized extension section {:?}",
                    tag_string(&section.tag)
                );
            }
        }
    }

    let rebus = if rebus_grid.is_some() || rebus_solution.is_some() || rebus_state.is_some() {
        Some(Rebus {
            grid: rebus_grid,
            solution: rebus_solution,
            state: rebus_state,
        })
    } else {
        None
    };

    let puzzle = Puzzle {
        width,
        height,
        solution,
        state: Some(state),
        clues,
        title,
        author,
        copyright,
        notepad,
        file_version,
        is_scrambled,
        rebus,
        markup_grid,
        timer,
        misc: crate::puzzle::Misc {
            unknown1,
            unknown2,
            unknown3,
            scrambled_checksum,
            preamble,
        },
    };

    let computed_header = get_header_checksum(&puzzle);
    if computed_header != stored_header_checksum {
        return Err(FormatError::HeaderChecksumMismatch {
            stored: stored_header_checksum,
            computed: computed_header,
        });
    }
    let computed_file = get_file_checksum(&puzzle)?;
    if computed_file != stored_file_checksum {
        return Err(FormatError::FileChecksumMismatch {
            stored: stored_file_checksum,
            computed: computed_file,
        });
    }
    if get_masked_checksum(&puzzle)? != stored_masked {
        return Err(FormatError::MaskedChecksumMismatch);
    }

    validate(&puzzle)?;
    Ok(puzzle)
}

/// Encode a puzzle as a binary `.puz` buffer.
pub fn print_binary(puzzle: &Puzzle) -> Result<Vec<u8>, ValidationError> {
    validate(puzzle)?;
    let encoding = Encoding::for_version(&puzzle.file_version)?;

    let mut header = encode_header_without_checksums(puzzle);
    LittleEndian::write_u16(
        &mut header[offset::FILE_CHECKSUM..],
        get_file_checksum(puzzle)?,
    );
    LittleEndian::write_u16(
        &mut header[offset::HEADER_CHECKSUM..],
        get_header_checksum(puzzle),
    );
    header[offset::MASKED_CHECKSUM..offset::MASKED_CHECKSUM_END]
        .copy_from_slice(&get_masked_checksum(puzzle)?);

    let mut out = puzzle.misc.preamble.clone();
    out.extend_from_slice(&header);
    out.extend_from_slice(&encoding.encode(&puzzle.solution));
    out.extend_from_slice(&encoding.encode(&get_state(puzzle)));
    // Unlike the checksum text, the body writes a terminator for absent
    // fields too: the reader finds the next field by counting NULs.
    push_body_zstring(&mut out, encoding, puzzle.title.as_deref());
    push_body_zstring(&mut out, encoding, puzzle.author.as_deref());
    push_body_zstring(&mut out, encoding, puzzle.copyright.as_deref());
    out.extend_from_slice(&encoding.encode(&puzzle.clues.join("\0")));
    out.push(0x00);
    push_body_zstring(&mut out, encoding, puzzle.notepad.as_deref());

    if let Some(rebus) = &puzzle.rebus {
        if let Some(grid) = &rebus.grid {
            out.extend_from_slice(&encode_section(
                ExtensionTag::RebusGrid,
                &encode_rebus_grid(grid),
            ));
        }
        if let Some(table) = &rebus.solution {
            out.extend_from_slice(&encode_section(
                ExtensionTag::RebusSolution,
                &encode_rebus_table(table),
            ));
        }
    }
    if let Some(timer) = &puzzle.timer {
        out.extend_from_slice(&encode_section(ExtensionTag::Timer, &encode_timer(timer)));
    }
    if let Some(markup) = &puzzle.markup_grid {
        out.extend_from_slice(&encode_section(
            ExtensionTag::MarkupGrid,
            &encode_markup_grid(markup),
        ));
    }
    if let Some(state) = puzzle.rebus.as_ref().and_then(|rebus| rebus.state.as_ref()) {
        out.extend_from_slice(&encode_section(
            ExtensionTag::RebusState,
            &encode_rebus_state(state),
        ));
    }
    Ok(out)
}

fn push_body_zstring(out: &mut Vec<u8>, encoding: Encoding, value: Option<&str>) {
    if let Some(value) = value {
        out.extend_from_slice(&encoding.encode(value));
    }
    out.push(0x00);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::checksum;
    use crate::puzzle::{SquareMarkup, Timer};
    use std::collections::BTreeMap;

    fn sample() -> Puzzle {
        Puzzle {
            width: 3,
            height: 3,
            solution: "CATARETEN".to_string(),
            state: Some("---------".to_string()),
            clues: vec![
                "Feline".into(),
                "Vehicle".into(),
                "Exist".into(),
                "Number".into(),
                "Be".into(),
                "Group of 10".into(),
            ],
            title: Some("Tiny".into()),
            author: Some("A. Constructor".into()),
            copyright: Some("© 2024".into()),
            notepad: Some("themeless".into()),
            file_version: "1.3".to_string(),
            ..Puzzle::default()
        }
    }

    #[test]
    fn round_trip_preserves_every_field() {
        let puzzle = sample();
        let bytes = print_binary(&puzzle).unwrap();
        assert_eq!(parse_binary(&bytes).unwrap(), puzzle);
    }

    #[test]
    fn round_trip_with_extensions() {
        let mut puzzle = sample();
        let mut grid = vec![None; 9];
        grid[4] = Some(0);
        puzzle.rebus = Some(Rebus {
            grid: Some(grid),
            solution: Some(BTreeMap::from([(0, "REB".to_string())])),
            state: Some({
                let mut state = vec![None; 9];
                state[4] = Some("REB".to_string());
                state
            }),
        });
        puzzle.timer = Some(Timer {
            seconds_elapsed: 301,
            is_paused: false,
        });
        let mut markup = vec![SquareMarkup::empty(); 9];
        markup[0] = SquareMarkup::CIRCLED;
        puzzle.markup_grid = Some(markup);

        let bytes = print_binary(&puzzle).unwrap();
        assert_eq!(parse_binary(&bytes).unwrap(), puzzle);
    }

    #[test]
    fn all_empty_user_rebus_round_trips() {
        let mut puzzle = sample();
        puzzle.rebus = Some(Rebus {
            grid: None,
            solution: None,
            state: Some(vec![None; 9]),
        });
        let bytes = print_binary(&puzzle).unwrap();
        let parsed = parse_binary(&bytes).unwrap();
        assert_eq!(parsed, puzzle);
        // and byte-for-byte: the RUSR section survives even when empty
        assert_eq!(print_binary(&parsed).unwrap(), bytes);
    }

    #[test]
    fn corrupted_solution_fails_the_file_checksum() {
        let mut bytes = print_binary(&sample()).unwrap();
        bytes[0x34] = b'X'; // first solution cell
        assert!(matches!(
            parse_binary(&bytes),
            Err(FormatError::FileChecksumMismatch { .. })
        ));
    }

    #[test]
    fn corrupted_header_checksum_is_reported() {
        let mut bytes = print_binary(&sample()).unwrap();
        bytes[0x0E] ^= 0xFF;
        assert!(matches!(
            parse_binary(&bytes),
            Err(FormatError::HeaderChecksumMismatch { .. })
        ));
    }

    #[test]
    fn rejects_buffers_without_a_signature() {
        assert_eq!(
            parse_binary(b"not a crossword at all"),
            Err(FormatError::MissingSignature)
        );
    }

    #[test]
    fn preamble_survives_a_round_trip() {
        let bytes = print_binary(&sample()).unwrap();
        let mut with_junk = b"<html junk>".to_vec();
        with_junk.extend_from_slice(&bytes);
        let parsed = parse_binary(&with_junk).unwrap();
        assert_eq!(parsed.misc.preamble, b"<html junk>");
        assert_eq!(print_binary(&parsed).unwrap(), with_junk);
    }

    #[test]
    fn unknown_extension_sections_are_skipped() {
        let mut bytes = print_binary(&sample()).unwrap();
        let payload = b"future";
        bytes.extend_from_slice(b"XYZT");
        bytes.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&checksum(payload, 0).to_le_bytes());
        bytes.extend_from_slice(payload);
        bytes.push(0x00);
        assert_eq!(parse_binary(&bytes).unwrap(), sample());
    }

    #[test]
    fn truncated_clue_list_is_reported() {
        let bytes = print_binary(&sample()).unwrap();
        // cut right after the second clue's terminator: title, author and
        // copyright account for the first three NULs of the body
        let body = 0x34 + 2 * 9;
        let cut = bytes[body..]
            .iter()
            .enumerate()
            .filter(|&(_, &byte)| byte == 0)
            .nth(4)
            .map(|(i, _)| body + i + 1)
            .unwrap();
        assert_eq!(
            parse_binary(&bytes[..cut]),
            Err(FormatError::MissingClue {
                index: 2,
                expected: 6
            })
        );
    }
}
