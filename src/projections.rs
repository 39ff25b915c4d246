//! Pure derived views over a [`Puzzle`].
//!
//! These are the functional equivalents of getters: each takes a puzzle
//! snapshot and computes a value without touching anything else.  The
//! three checksum projections are used both by the binary codec (to
//! verify on decode and patch on encode) and by external consumers.

use crate::checksum::checksum;
use crate::encoding::Encoding;
use crate::header::{encode_header_without_checksums, offset};
use crate::puzzle::{
    meta_strings, square_needs_across_clue, square_needs_down_clue, substitution, Puzzle,
};
use crate::validate::{validate, ValidationError};

/// Mask applied to the 8-byte masked checksum.
const CHECKSUM_MASK: &[u8; 8] = b"ICHEATED";

fn header_region_checksum(puzzle: &Puzzle) -> u16 {
    let header = encode_header_without_checksums(puzzle);
    checksum(&header[offset::WIDTH..offset::HEADER_END], 0)
}

/// Checksum over the width/height/clue-count/bitmask/scrambled-flag
/// sub-region of the header.
pub fn get_header_checksum(puzzle: &Puzzle) -> u16 {
    header_region_checksum(puzzle)
}

/// The whole-file checksum: the header checksum chained through the
/// board strings (solution then state) and the metadata text.
pub fn get_file_checksum(puzzle: &Puzzle) -> Result<u16, ValidationError> {
    let encoding = Encoding::for_version(&puzzle.file_version)?;
    let board = format!("{}{}", puzzle.solution, get_state(puzzle));
    let meta = meta_strings(puzzle)?;
    let checksum_h = header_region_checksum(puzzle);
    Ok(checksum(
        &encoding.encode(&format!("{board}{meta}")),
        checksum_h,
    ))
}

/// The masked 8-byte checksum: four region checksums (header sub-region,
/// solution, state, metadata text) packed low bytes first then high
/// bytes, each XORed against `ICHEATED`.
pub fn get_masked_checksum(puzzle: &Puzzle) -> Result<[u8; 8], ValidationError> {
    let encoding = Encoding::for_version(&puzzle.file_version)?;
    let words = [
        header_region_checksum(puzzle),
        checksum(&encoding.encode(&puzzle.solution), 0),
        checksum(&encoding.encode(&get_state(puzzle)), 0),
        checksum(&encoding.encode(&meta_strings(puzzle)?), 0),
    ];
    let mut out = [0u8; 8];
    for (i, word) in words.iter().enumerate() {
        out[i] = (word & 0x00ff) as u8 ^ CHECKSUM_MASK[i];
        out[i + 4] = (word >> 8) as u8 ^ CHECKSUM_MASK[i + 4];
    }
    Ok(out)
}

/// The string encoding the file version implies.
pub fn get_file_encoding(puzzle: &Puzzle) -> Result<Encoding, ValidationError> {
    Encoding::for_version(&puzzle.file_version)
}

/// Clue number per cell, `None` where no across or down entry starts.
pub fn grid_numbering(puzzle: &Puzzle) -> Vec<Option<u32>> {
    let mut number = 0u32;
    (0..puzzle.solution.len())
        .map(|i| {
            if square_needs_across_clue(&puzzle.solution, puzzle.width, i)
                || square_needs_down_clue(&puzzle.solution, puzzle.width, i)
            {
                number += 1;
                Some(number)
            } else {
                None
            }
        })
        .collect()
}

/// An all-blank working state: every non-black cell becomes `-`.
pub fn get_blank_state(puzzle: &Puzzle) -> String {
    puzzle
        .solution
        .chars()
        .map(|c| if matches!(c, '.' | ':') { c } else { '-' })
        .collect()
}

/// The current working state, defaulting to blank when unset.
pub fn get_state(puzzle: &Puzzle) -> String {
    puzzle
        .state
        .clone()
        .unwrap_or_else(|| get_blank_state(puzzle))
}

/// Does the puzzle expect any rebus substitution?
pub fn has_rebus_solution(puzzle: &Puzzle) -> bool {
    puzzle
        .rebus
        .as_ref()
        .and_then(|rebus| rebus.solution.as_ref())
        .is_some_and(|table| !table.is_empty())
}

/// Has the user entered any rebus substitution?
pub fn has_rebus_state(puzzle: &Puzzle) -> bool {
    puzzle
        .rebus
        .as_ref()
        .and_then(|rebus| rebus.state.as_ref())
        .is_some_and(|state| state.iter().any(Option::is_some))
}

/// Is the puzzle solved?
///
/// A puzzle is correct iff it is not scrambled, its plain fill equals
/// the solution character for character, and every expected rebus
/// substitution was entered exactly (unless `ignore_rebus` suppresses
/// rebus checking, useful for applications without rebus input).
/// A required rebus cell left empty is incorrect, as is a user rebus
/// where none was expected.
pub fn is_correct(puzzle: &Puzzle, ignore_rebus: bool) -> Result<bool, ValidationError> {
    validate(puzzle)?;
    if puzzle.is_scrambled {
        return Err(ValidationError::ScrambledPuzzle);
    }

    let rebus_correct = if !has_rebus_solution(puzzle) && has_rebus_state(puzzle) {
        false
    } else if ignore_rebus || !has_rebus_solution(puzzle) {
        true
    } else {
        match puzzle.rebus.as_ref().and_then(|rebus| rebus.state.as_ref()) {
            Some(state) => (0..puzzle.solution.len()).all(|i| {
                let entered = state.get(i).and_then(|value| value.as_deref());
                match (substitution(puzzle, i), entered) {
                    (Some(expected), Some(entered)) => expected == entered,
                    (None, None) => true,
                    _ => false,
                }
            }),
            None => false,
        }
    };

    let state_correct = puzzle.state.as_deref() == Some(puzzle.solution.as_str());
    Ok(rebus_correct && state_correct)
}
