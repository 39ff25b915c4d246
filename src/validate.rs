//! Structural validation of a [`Puzzle`].
//!
//! One assertion pass in a fixed order; the first violated invariant is
//! returned as a field-named error and nothing is ever silently
//! repaired.  Scrambled puzzles are accepted as-is — the scrambling
//! checksum is round-tripped, never verified.

use thiserror::Error;

use crate::puzzle::{
    is_black_square, is_valid_solution_char, is_valid_state_char, parse_version,
    required_clue_count, Puzzle, RebusKey,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("puzzle width and height must both be at least 1")]
    EmptyGrid,
    #[error("file version {0:?} does not match the supported format: #.#[a]")]
    MalformedVersion(String),
    #[error("solution should be {expected} characters for a {width}x{height} grid, found {found}")]
    SolutionLength {
        width: u8,
        height: u8,
        expected: usize,
        found: usize,
    },
    #[error("solution may only contain '.', ':', alphanumerics and the symbols @ # $ % & + ?")]
    SolutionCharset,
    #[error("state should be {expected} characters long, found {found}")]
    StateLength { expected: usize, found: usize },
    #[error("black squares in state and solution must coincide (first mismatch at cell {index})")]
    BlackSquareMismatch { index: usize },
    #[error("state may only contain '-', '.', ':', alphanumerics and the symbols @ # $ % & + ?")]
    StateCharset,
    #[error("solution requires {required} clues, found {found}")]
    ClueCount { required: usize, found: usize },
    #[error("markup grid should match the solution in length: expected {expected}, found {found}")]
    MarkupGridLength { expected: usize, found: usize },
    #[error("rebus grid should match the solution in length: expected {expected}, found {found}")]
    RebusGridLength { expected: usize, found: usize },
    #[error("rebus grid references key {key} that has no entry in the rebus solution")]
    RebusKeyUnmapped { key: RebusKey },
    #[error("rebus state should match the solution in length: expected {expected}, found {found}")]
    RebusStateLength { expected: usize, found: usize },
    #[error("unscramble the puzzle before checking correctness")]
    ScrambledPuzzle,
}

/// Check every structural invariant of `puzzle`, stopping at the first
/// violation.
pub fn validate(puzzle: &Puzzle) -> Result<(), ValidationError> {
    if puzzle.width == 0 || puzzle.height == 0 {
        return Err(ValidationError::EmptyGrid);
    }
    parse_version(&puzzle.file_version)?;

    let expected = puzzle.grid_size();
    if puzzle.solution.len() != expected {
        return Err(ValidationError::SolutionLength {
            width: puzzle.width,
            height: puzzle.height,
            expected,
            found: puzzle.solution.len(),
        });
    }
    if !puzzle.solution.bytes().all(is_valid_solution_char) {
        return Err(ValidationError::SolutionCharset);
    }

    if let Some(state) = &puzzle.state {
        if state.len() != expected {
            return Err(ValidationError::StateLength {
                expected,
                found: state.len(),
            });
        }
        for (index, (state_byte, solution_byte)) in
            state.bytes().zip(puzzle.solution.bytes()).enumerate()
        {
            if is_black_square(state_byte) != is_black_square(solution_byte) {
                return Err(ValidationError::BlackSquareMismatch { index });
            }
        }
        if !state.bytes().all(is_valid_state_char) {
            return Err(ValidationError::StateCharset);
        }
    }

    let required = required_clue_count(&puzzle.solution, puzzle.width);
    if required != puzzle.clues.len() {
        return Err(ValidationError::ClueCount {
            required,
            found: puzzle.clues.len(),
        });
    }

    if let Some(markup) = &puzzle.markup_grid {
        if markup.len() != expected {
            return Err(ValidationError::MarkupGridLength {
                expected,
                found: markup.len(),
            });
        }
    }

    if let Some(rebus) = &puzzle.rebus {
        if let Some(grid) = &rebus.grid {
            if grid.len() != expected {
                return Err(ValidationError::RebusGridLength {
                    expected,
                    found: grid.len(),
                });
            }
            for key in grid.iter().flatten() {
                let mapped = rebus
                    .solution
                    .as_ref()
                    .is_some_and(|table| table.contains_key(key));
                if !mapped {
                    return Err(ValidationError::RebusKeyUnmapped { key: *key });
                }
            }
        }
        if let Some(state) = &rebus.state {
            if state.len() != expected {
                return Err(ValidationError::RebusStateLength {
                    expected,
                    found: state.len(),
                });
            }
        }
    }

    Ok(())
}
