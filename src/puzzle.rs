//! The in-memory puzzle entity and the pure helpers that interpret it.
//!
//! A puzzle is one flat record: optional features (rebus, markup, timer,
//! notepad) are optional fields, never subtypes.  Nothing in this crate
//! mutates a `Puzzle` in place — parsers construct them, printers and
//! projections read them.

use std::collections::BTreeMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Version written when the caller does not set one.
pub const DEFAULT_FILE_VERSION: &str = "1.4";

/// A rebus key.  The binary grid section stores `key + 1` in a single
/// byte, so keys above 254 are not representable on disk.
pub type RebusKey = u8;

/// Per-cell markup bits from the GEXT extension section.
///
/// The low four bits have no published meaning; they are retained
/// verbatim so unknown annotations survive a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquareMarkup(u8);

bitflags! {
    impl SquareMarkup: u8 {
        const CIRCLED              = 0x80;
        const REVEALED             = 0x40;
        const INCORRECT            = 0x20;
        const PREVIOUSLY_INCORRECT = 0x10;
        const UNKNOWN_08           = 0x08;
        const UNKNOWN_04           = 0x04;
        const UNKNOWN_02           = 0x02;
        const UNKNOWN_01           = 0x01;
    }
}

/// Solve timer from the LTIM extension section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub seconds_elapsed: u32,
    pub is_paused: bool,
}

/// Rebus data: cells whose correct answer is a multi-character string
/// represented on the grid by one placeholder character.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rebus {
    /// Per-cell key, `None` where the cell has no rebus.
    pub grid: Option<Vec<Option<RebusKey>>>,
    /// Expected answer per key.
    pub solution: Option<BTreeMap<RebusKey, String>>,
    /// Per-cell user-entered substitution.
    pub state: Option<Vec<Option<String>>>,
}

/// Reserved header regions and the file preamble, preserved verbatim so
/// that decode followed by encode reproduces the input bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Misc {
    pub unknown1: u16,
    pub unknown2: [u8; 12],
    pub unknown3: u16,
    /// Checksum of the unscrambled solution, present in scrambled files.
    /// Read and round-tripped, never recomputed or verified here.
    pub scrambled_checksum: u16,
    /// Bytes preceding the `ACROSS&DOWN` signature.  Some download paths
    /// prepend junk; AcrossLite tolerates it, so we preserve it.
    pub preamble: Vec<u8>,
}

/// A complete crossword puzzle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Puzzle {
    pub width: u8,
    pub height: u8,
    /// Row-major answer grid, exactly `width * height` characters.
    pub solution: String,
    /// Player fill.  `None` is equivalent to an all-blank grid.
    pub state: Option<String>,
    /// Unified clue list in solution-scan order.
    pub clues: Vec<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub copyright: Option<String>,
    pub notepad: Option<String>,
    /// `major.minor[patch-letter]`, e.g. `1.3` or `2.0c`.
    pub file_version: String,
    pub is_scrambled: bool,
    pub rebus: Option<Rebus>,
    pub markup_grid: Option<Vec<SquareMarkup>>,
    pub timer: Option<Timer>,
    pub misc: Misc,
}

impl Default for Puzzle {
    fn default() -> Self {
        Puzzle {
            width: 0,
            height: 0,
            solution: String::new(),
            state: None,
            clues: Vec::new(),
            title: None,
            author: None,
            copyright: None,
            notepad: None,
            file_version: DEFAULT_FILE_VERSION.to_string(),
            is_scrambled: false,
            rebus: None,
            markup_grid: None,
            timer: None,
            misc: Misc::default(),
        }
    }
}

impl Puzzle {
    /// Cell count of the grid.
    pub fn grid_size(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
}

/// True for the characters that mark a black square.
pub fn is_black_square(byte: u8) -> bool {
    matches!(byte, b'.' | b':')
}

/// Characters permitted in a solution string.
pub fn is_valid_solution_char(byte: u8) -> bool {
    is_black_square(byte) || byte.is_ascii_alphanumeric() || is_rebus_symbol(byte)
}

/// Characters permitted in a state string (solution set plus the blank
/// marker `-`).
pub fn is_valid_state_char(byte: u8) -> bool {
    byte == b'-' || is_valid_solution_char(byte)
}

/// The seven symbol characters shared by solutions and rebus keys.
pub fn is_rebus_symbol(byte: u8) -> bool {
    matches!(byte, b'@' | b'#' | b'$' | b'%' | b'&' | b'+' | b'?')
}

/// Split a `major.minor[patch-letter]` version string.
pub fn parse_version(version: &str) -> Result<(u16, u16, Option<char>), ValidationError> {
    fn digits(s: &str) -> Option<u16> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse().ok()
    }
    let bad = || ValidationError::MalformedVersion(version.to_string());
    let (major_s, rest) = version.split_once('.').ok_or_else(bad)?;
    let major = digits(major_s).ok_or_else(bad)?;
    let (minor_s, patch) = if rest.ends_with(|c: char| c.is_ascii_lowercase()) {
        let mut chars = rest.chars();
        let patch = chars.next_back();
        (chars.as_str(), patch)
    } else {
        (rest, None)
    };
    let minor = digits(minor_s).ok_or_else(bad)?;
    Ok((major, minor, patch))
}

/// True when cell `i` starts an across entry: not black, at the left
/// edge or right of a black square, and the start of a run of length
/// at least two.
pub fn square_needs_across_clue(solution: &str, width: u8, i: usize) -> bool {
    let cells = solution.as_bytes();
    let w = usize::from(width);
    !is_black_square(cells[i])
        && (i % w == 0 || is_black_square(cells[i - 1]))
        && !(i % w == w - 1 || is_black_square(cells[i + 1]))
}

/// Vertical mirror of [`square_needs_across_clue`].
pub fn square_needs_down_clue(solution: &str, width: u8, i: usize) -> bool {
    let cells = solution.as_bytes();
    let w = usize::from(width);
    !is_black_square(cells[i])
        && (i < w || is_black_square(cells[i - w]))
        && !(i >= cells.len() - w || is_black_square(cells[i + w]))
}

/// Number of clues the solution requires.
pub fn required_clue_count(solution: &str, width: u8) -> usize {
    (0..solution.len())
        .map(|i| {
            usize::from(square_needs_across_clue(solution, width, i))
                + usize::from(square_needs_down_clue(solution, width, i))
        })
        .sum()
}

/// Split the unified clue list into across and down lists, consuming
/// clues in solution-scan order.
pub fn divide_clues(puzzle: &Puzzle) -> (Vec<String>, Vec<String>) {
    let mut queue = puzzle.clues.iter();
    let mut across = Vec::new();
    let mut down = Vec::new();
    for i in 0..puzzle.solution.len() {
        if square_needs_across_clue(&puzzle.solution, puzzle.width, i) {
            if let Some(clue) = queue.next() {
                across.push(clue.clone());
            }
        }
        if square_needs_down_clue(&puzzle.solution, puzzle.width, i) {
            if let Some(clue) = queue.next() {
                down.push(clue.clone());
            }
        }
    }
    (across, down)
}

/// Reassemble the unified clue list from across and down lists — the
/// inverse of [`divide_clues`].
pub fn merge_clues(solution: &str, width: u8, across: &[String], down: &[String]) -> Vec<String> {
    let mut across_queue = across.iter();
    let mut down_queue = down.iter();
    let mut clues = Vec::with_capacity(across.len() + down.len());
    for i in 0..solution.len() {
        if square_needs_across_clue(solution, width, i) {
            if let Some(clue) = across_queue.next() {
                clues.push(clue.clone());
            }
        }
        if square_needs_down_clue(solution, width, i) {
            if let Some(clue) = down_queue.next() {
                clues.push(clue.clone());
            }
        }
    }
    clues
}

/// Metadata text concatenated for the file and masked checksums: each
/// present field as a zstring, clues joined bare, notepad from version
/// 1.3 onward.  Absent fields contribute nothing, not even their NUL.
pub fn meta_strings(puzzle: &Puzzle) -> Result<String, ValidationError> {
    let (major, minor, _) = parse_version(&puzzle.file_version)?;
    let mut out = String::new();
    push_zstring(&mut out, puzzle.title.as_deref());
    push_zstring(&mut out, puzzle.author.as_deref());
    push_zstring(&mut out, puzzle.copyright.as_deref());
    for clue in &puzzle.clues {
        out.push_str(clue);
    }
    if major >= 1 && minor >= 3 {
        push_zstring(&mut out, puzzle.notepad.as_deref());
    }
    Ok(out)
}

fn push_zstring(out: &mut String, value: Option<&str>) {
    if let Some(value) = value {
        out.push_str(value);
        out.push('\0');
    }
}

/// The expected rebus answer for cell `i`, if any.
pub fn substitution(puzzle: &Puzzle, i: usize) -> Option<&str> {
    let rebus = puzzle.rebus.as_ref()?;
    let key = (*rebus.grid.as_ref()?.get(i)?)?;
    rebus.solution.as_ref()?.get(&key).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parsing() {
        assert_eq!(parse_version("1.3").unwrap(), (1, 3, None));
        assert_eq!(parse_version("1.4c").unwrap(), (1, 4, Some('c')));
        assert_eq!(parse_version("2.0").unwrap(), (2, 0, None));
        assert!(parse_version("1").is_err());
        assert!(parse_version("a.b").is_err());
        assert!(parse_version("1.3C").is_err());
        assert!(parse_version("").is_err());
    }

    #[test]
    fn open_grid_clue_starts() {
        // CAT / ARE / TEN: every row and column is a full-length run.
        let solution = "CATARETEN";
        let across: Vec<usize> = (0..9)
            .filter(|&i| square_needs_across_clue(solution, 3, i))
            .collect();
        let down: Vec<usize> = (0..9)
            .filter(|&i| square_needs_down_clue(solution, 3, i))
            .collect();
        assert_eq!(across, vec![0, 3, 6]);
        assert_eq!(down, vec![0, 1, 2]);
        assert_eq!(required_clue_count(solution, 3), 6);
    }

    #[test]
    fn black_square_short_circuits_neighbors() {
        // Center black square leaves rows 2's runs at length one; those
        // cells must start nothing in either direction.
        let solution = "CATA.ETEN";
        for i in [3, 4, 5] {
            assert!(!square_needs_across_clue(solution, 3, i));
        }
        assert!(!square_needs_down_clue(solution, 3, 1));
        assert!(!square_needs_down_clue(solution, 3, 7));
        assert_eq!(required_clue_count(solution, 3), 4);
    }

    #[test]
    fn divide_and_merge_are_inverse() {
        let puzzle = Puzzle {
            width: 3,
            height: 3,
            solution: "CATARETEN".to_string(),
            clues: vec![
                "1A".into(),
                "1D".into(),
                "2D".into(),
                "3D".into(),
                "4A".into(),
                "5A".into(),
            ],
            ..Puzzle::default()
        };
        let (across, down) = divide_clues(&puzzle);
        assert_eq!(across, vec!["1A", "4A", "5A"]);
        assert_eq!(down, vec!["1D", "2D", "3D"]);
        assert_eq!(
            merge_clues(&puzzle.solution, puzzle.width, &across, &down),
            puzzle.clues
        );
    }

    #[test]
    fn meta_strings_gate_notepad_on_version() {
        let mut puzzle = Puzzle {
            title: Some("T".into()),
            notepad: Some("note".into()),
            file_version: "1.2".to_string(),
            ..Puzzle::default()
        };
        assert_eq!(meta_strings(&puzzle).unwrap(), "T\0");
        puzzle.file_version = "1.3".to_string();
        assert_eq!(meta_strings(&puzzle).unwrap(), "T\0note\0");
    }
}
