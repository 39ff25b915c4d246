//! The AcrossLite text dialect.
//!
//! A text puzzle is a signature line followed by tagged sections
//! (`<TITLE>`, `<SIZE>`, `<GRID>`, ...).  Two signatures exist: the V1
//! form `<ACROSS PUZZLE>` limits the grid to `A-Z`, `.` and `:`; the V2
//! form `<ACROSS PUZZLE V2>` widens the charset and adds the `<REBUS>`
//! section.  The printer always emits V2.
//!
//! Rebus cells are written as a one-character key in the grid plus a
//! `key:ANSWER:fallback` annotation; circled squares are written as
//! lowercase grid letters under a `MARK;` annotation.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::puzzle::{
    divide_clues, is_rebus_symbol, is_valid_solution_char, merge_clues, Puzzle, Rebus, RebusKey,
    SquareMarkup,
};
use crate::rebus::{char_to_key, compress_keys, key_to_char, RebusKeyError};
use crate::validate::{validate, ValidationError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    #[error("file does not carry an <ACROSS PUZZLE> signature line")]
    MissingSignature,
    #[error("file is missing the required <{tag}> section")]
    MissingSection { tag: &'static str },
    #[error("expected a section tag, found {line:?}")]
    ExpectedSectionTag { line: String },
    #[error("<{tag}> expects exactly one line, found {found}")]
    SectionLineCount { tag: &'static str, found: usize },
    #[error("puzzle size expected as WIDTHxHEIGHT (e.g. \"15x15\"), found {text:?}")]
    MalformedSize { text: String },
    #[error("<GRID> contains characters the {dialect} dialect does not permit")]
    GridCharset { dialect: &'static str },
    #[error("the <REBUS> tag requires the <ACROSS PUZZLE V2> signature")]
    RebusInV1,
    #[error("the <REBUS> section must come after <GRID>")]
    RebusBeforeGrid,
    #[error("rebus key {key:?} maps to multiple distinct grid characters, which the text format cannot express")]
    AmbiguousShortSolution { key: char },
    #[error("rebus key {key:?} has no corresponding grid cell")]
    UnusedRebusKey { key: char },
    #[error(transparent)]
    RebusKey(#[from] RebusKeyError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// The two text signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    V1,
    V2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Unix,
    Windows,
}

impl LineEnding {
    fn as_str(self) -> &'static str {
        match self {
            LineEnding::Unix => "\n",
            LineEnding::Windows => "\r\n",
        }
    }
}

/// Whitespace conventions for the printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFormat {
    /// Prefix for section content lines.
    pub indent: String,
    pub line_ending: LineEnding,
}

impl Default for TextFormat {
    fn default() -> Self {
        TextFormat {
            indent: "\t".to_string(),
            line_ending: LineEnding::Unix,
        }
    }
}

const SECTION_TAGS: [&str; 9] = [
    "TITLE",
    "AUTHOR",
    "COPYRIGHT",
    "SIZE",
    "GRID",
    "ACROSS",
    "DOWN",
    "NOTEPAD",
    "REBUS",
];

const REQUIRED_TAGS: [&str; 7] = [
    "TITLE",
    "AUTHOR",
    "COPYRIGHT",
    "SIZE",
    "GRID",
    "ACROSS",
    "DOWN",
];

fn section_tag(line: &str) -> Option<&'static str> {
    let inner = line.trim().strip_prefix('<')?.strip_suffix('>')?;
    SECTION_TAGS.iter().copied().find(|&tag| tag == inner)
}

fn single_line<'a>(tag: &'static str, lines: &[&'a str]) -> Result<&'a str, TextError> {
    match lines {
        [line] => Ok(line),
        _ => Err(TextError::SectionLineCount {
            tag,
            found: lines.len(),
        }),
    }
}

fn is_key_char(c: char) -> bool {
    c.is_ascii() && (c.is_ascii_alphanumeric() || is_rebus_symbol(c as u8))
}

fn single_key_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    let c = chars.next().filter(|&c| is_key_char(c))?;
    chars.next().is_none().then_some(c)
}

/// Split a `key:ANSWER:fallback` annotation; the answer is either
/// uppercase letters or a bracketed number like `[7]`.
fn parse_substitution(line: &str) -> Option<(char, String, char)> {
    let mut parts = line.split(':');
    let key = single_key_char(parts.next()?)?;
    let answer = parts.next()?;
    let fallback = single_key_char(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    let plain = !answer.is_empty() && answer.bytes().all(|b| b.is_ascii_uppercase());
    let bracketed = answer.len() > 2
        && answer.starts_with('[')
        && answer.ends_with(']')
        && answer[1..answer.len() - 1].bytes().all(|b| b.is_ascii_digit());
    if !plain && !bracketed {
        return None;
    }
    Some((key, answer.to_string(), fallback))
}

fn parse_size(text: &str) -> Option<(u8, u8)> {
    let (width, height) = text.split_once('x')?;
    let digits = |s: &str| {
        (!s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
            .then(|| s.parse::<u8>().ok())
            .flatten()
    };
    Some((digits(width)?, digits(height)?))
}

fn grid_char_allowed(dialect: Dialect, byte: u8) -> bool {
    match dialect {
        Dialect::V1 => byte.is_ascii_uppercase() || matches!(byte, b'.' | b':'),
        Dialect::V2 => is_valid_solution_char(byte),
    }
}

/// Parse an AcrossLite text puzzle.
pub fn parse_text(text: &str) -> Result<Puzzle, TextError> {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .collect();

    let dialect = match lines.first().map(|line| line.trim()) {
        Some("<ACROSS PUZZLE>") => Dialect::V1,
        Some("<ACROSS PUZZLE V2>") => Dialect::V2,
        _ => return Err(TextError::MissingSignature),
    };
    for tag in REQUIRED_TAGS {
        if !lines.iter().any(|line| section_tag(line) == Some(tag)) {
            return Err(TextError::MissingSection { tag });
        }
    }

    let mut width = 0u8;
    let mut height = 0u8;
    let mut solution: Option<String> = None;
    let mut title = None;
    let mut author = None;
    let mut copyright = None;
    let mut notepad = None;
    let mut across: Vec<String> = Vec::new();
    let mut down: Vec<String> = Vec::new();
    let mut markup_grid: Option<Vec<SquareMarkup>> = None;
    let mut rebus: Option<Rebus> = None;

    let mut queue = lines[1..].iter().copied().peekable();
    while let Some(line) = queue.next() {
        let tag = section_tag(line).ok_or_else(|| TextError::ExpectedSectionTag {
            line: line.to_string(),
        })?;
        let mut section: Vec<&str> = Vec::new();
        while let Some(&next) = queue.peek() {
            if section_tag(next).is_some() {
                break;
            }
            section.push(next);
            queue.next();
        }
        match tag {
            "TITLE" => title = Some(single_line(tag, &section)?.trim().to_string()),
            "AUTHOR" => author = Some(single_line(tag, &section)?.trim().to_string()),
            "COPYRIGHT" => copyright = Some(single_line(tag, &section)?.trim().to_string()),
            "SIZE" => {
                let size = single_line(tag, &section)?.trim();
                (width, height) = parse_size(size).ok_or_else(|| TextError::MalformedSize {
                    text: size.to_string(),
                })?;
            }
            "GRID" => {
                let rows: Vec<&str> = section.iter().map(|line| line.trim()).collect();
                let dialect_name = match dialect {
                    Dialect::V1 => "V1",
                    Dialect::V2 => "V2",
                };
                if !rows
                    .iter()
                    .all(|row| row.bytes().all(|b| grid_char_allowed(dialect, b)))
                {
                    return Err(TextError::GridCharset {
                        dialect: dialect_name,
                    });
                }
                solution = Some(rows.concat());
            }
            "ACROSS" => across = section.iter().map(|line| line.trim().to_string()).collect(),
            "DOWN" => down = section.iter().map(|line| line.trim().to_string()).collect(),
            // preserve whitespace, standardize line breaks
            "NOTEPAD" => notepad = Some(section.join("\n")),
            "REBUS" => {
                if dialect == Dialect::V1 {
                    return Err(TextError::RebusInV1);
                }
                let mut working = solution.clone().ok_or(TextError::RebusBeforeGrid)?;
                let mut rebus_grid: Vec<Option<RebusKey>> = vec![None; working.len()];
                let mut rebus_solution: BTreeMap<RebusKey, String> = BTreeMap::new();
                for line in &section {
                    let line = line.trim();
                    if line.eq_ignore_ascii_case("MARK;") && markup_grid.is_none() {
                        let grid: Vec<SquareMarkup> = working
                            .bytes()
                            .map(|b| {
                                if b.is_ascii_lowercase() {
                                    SquareMarkup::CIRCLED
                                } else {
                                    SquareMarkup::empty()
                                }
                            })
                            .collect();
                        if grid.iter().any(|m| m.contains(SquareMarkup::CIRCLED)) {
                            markup_grid = Some(grid);
                        }
                    }
                    if let Some((key_char, answer, fallback)) = parse_substitution(line) {
                        let key = char_to_key(key_char)?;
                        for (i, byte) in working.bytes().enumerate() {
                            if byte == key_char as u8 {
                                rebus_grid[i] = Some(key);
                            }
                        }
                        rebus_solution.insert(key, answer);
                        working = working.replace(key_char, &fallback.to_string());
                    }
                }
                if !rebus_solution.is_empty() {
                    solution = Some(working);
                    rebus = Some(Rebus {
                        grid: Some(rebus_grid),
                        solution: Some(rebus_solution),
                        state: None,
                    });
                }
            }
            _ => unreachable!("section_tag only yields known tags"),
        }
    }

    let solution = solution.unwrap_or_default().to_ascii_uppercase();
    // the clue-start predicates assume a plausible grid, so check the
    // dimensions before merging instead of leaving it all to validate()
    if width == 0 || height == 0 {
        return Err(ValidationError::EmptyGrid.into());
    }
    let expected = usize::from(width) * usize::from(height);
    if solution.len() != expected {
        return Err(ValidationError::SolutionLength {
            width,
            height,
            expected,
            found: solution.len(),
        }
        .into());
    }
    let clues = merge_clues(&solution, width, &across, &down);
    let puzzle = Puzzle {
        width,
        height,
        solution,
        clues,
        title,
        author,
        copyright,
        notepad,
        rebus,
        markup_grid,
        ..Puzzle::default()
    };
    validate(&puzzle)?;
    Ok(puzzle)
}

/// Print a puzzle in the V2 text dialect.
pub fn print_text(puzzle: &Puzzle, format: &TextFormat) -> Result<String, TextError> {
    validate(puzzle)?;
    let eol = format.line_ending.as_str();
    let indent = format.indent.as_str();

    // circled squares become lowercase grid letters
    let mut grid: Vec<u8> = puzzle.solution.clone().into_bytes();
    if let Some(markup) = &puzzle.markup_grid {
        for (cell, flags) in grid.iter_mut().zip(markup) {
            if flags.contains(SquareMarkup::CIRCLED) {
                *cell = cell.to_ascii_lowercase();
            }
        }
    }

    // rebus cells become one-character keys plus annotations
    let mut annotations = Vec::new();
    if let Some(rebus) = &puzzle.rebus {
        if let (Some(rebus_grid), Some(rebus_solution)) = (&rebus.grid, &rebus.solution) {
            let (rebus_grid, rebus_solution) = compress_keys(rebus_grid, rebus_solution);
            for (&key, answer) in &rebus_solution {
                let key_char = key_to_char(key)?;
                let mut short: Option<u8> = None;
                let mut indices = Vec::new();
                for (i, entry) in rebus_grid.iter().enumerate() {
                    if *entry == Some(key) {
                        match short {
                            None => short = Some(grid[i]),
                            Some(existing) if existing != grid[i] => {
                                return Err(TextError::AmbiguousShortSolution { key: key_char });
                            }
                            _ => {}
                        }
                        indices.push(i);
                    }
                }
                let short = short.ok_or(TextError::UnusedRebusKey { key: key_char })?;
                for &i in &indices {
                    grid[i] = key_char as u8;
                }
                annotations.push(format!("{key_char}:{answer}:{}", char::from(short)));
            }
        }
    }

    let push_tag = |out: &mut String, tag: &str| {
        out.push('<');
        out.push_str(tag);
        out.push('>');
        out.push_str(eol);
    };
    let push_line = |out: &mut String, content: &str| {
        out.push_str(indent);
        out.push_str(content);
        out.push_str(eol);
    };

    let mut out = String::new();
    out.push_str("<ACROSS PUZZLE V2>");
    out.push_str(eol);
    push_tag(&mut out, "TITLE");
    push_line(&mut out, puzzle.title.as_deref().unwrap_or(""));
    push_tag(&mut out, "AUTHOR");
    push_line(&mut out, puzzle.author.as_deref().unwrap_or(""));
    push_tag(&mut out, "COPYRIGHT");
    push_line(&mut out, puzzle.copyright.as_deref().unwrap_or(""));
    push_tag(&mut out, "SIZE");
    push_line(&mut out, &format!("{}x{}", puzzle.width, puzzle.height));
    push_tag(&mut out, "GRID");
    for row in grid.chunks(usize::from(puzzle.width)) {
        push_line(&mut out, &String::from_utf8_lossy(row));
    }
    if puzzle.markup_grid.is_some() || puzzle.rebus.is_some() {
        push_tag(&mut out, "REBUS");
        let circled = puzzle.markup_grid.as_ref().is_some_and(|markup| {
            markup.iter().any(|m| m.contains(SquareMarkup::CIRCLED))
        });
        if circled {
            push_line(&mut out, "MARK;");
        }
        for annotation in &annotations {
            push_line(&mut out, annotation);
        }
    }
    let (across, down) = divide_clues(puzzle);
    push_tag(&mut out, "ACROSS");
    for clue in &across {
        push_line(&mut out, clue);
    }
    push_tag(&mut out, "DOWN");
    for clue in &down {
        push_line(&mut out, clue);
    }
    if let Some(notepad) = &puzzle.notepad {
        push_tag(&mut out, "NOTEPAD");
        out.push_str(notepad);
        out.push_str(eol);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const TINY_V1: &str = "\
<ACROSS PUZZLE>
<TITLE>
\tTiny
<AUTHOR>
\tA. Constructor
<COPYRIGHT>
\t2024
<SIZE>
\t3x3
<GRID>
\tCAT
\tARE
\tTEN
<ACROSS>
\tFeline
\tNumber
\tGroup of 10
<DOWN>
\tVehicle
\tExist
\tBe
";

    #[test]
    fn parses_a_v1_puzzle() {
        let puzzle = parse_text(TINY_V1).unwrap();
        assert_eq!((puzzle.width, puzzle.height), (3, 3));
        assert_eq!(puzzle.solution, "CATARETEN");
        assert_eq!(puzzle.title.as_deref(), Some("Tiny"));
        // clues interleave in solution-scan order
        assert_eq!(
            puzzle.clues,
            vec!["Feline", "Vehicle", "Exist", "Be", "Number", "Group of 10"]
        );
    }

    #[test]
    fn round_trips_through_the_printer() {
        let puzzle = parse_text(TINY_V1).unwrap();
        let printed = print_text(&puzzle, &TextFormat::default()).unwrap();
        assert!(printed.starts_with("<ACROSS PUZZLE V2>\n"));
        assert_eq!(parse_text(&printed).unwrap(), puzzle);
    }

    #[test]
    fn windows_line_endings_parse_and_print() {
        let windows = TINY_V1.replace('\n', "\r\n");
        let puzzle = parse_text(&windows).unwrap();
        let format = TextFormat {
            line_ending: LineEnding::Windows,
            ..TextFormat::default()
        };
        let printed = print_text(&puzzle, &format).unwrap();
        assert!(printed.contains("<SIZE>\r\n"));
        assert_eq!(parse_text(&printed).unwrap(), puzzle);
    }

    #[test]
    fn rebus_and_circles_round_trip() {
        let mut puzzle = parse_text(TINY_V1).unwrap();
        let mut grid = vec![None; 9];
        grid[0] = Some(0);
        puzzle.rebus = Some(Rebus {
            grid: Some(grid),
            solution: Some(BTreeMap::from([(0, "CATS".to_string())])),
            state: None,
        });
        let mut markup = vec![SquareMarkup::empty(); 9];
        markup[8] = SquareMarkup::CIRCLED;
        puzzle.markup_grid = Some(markup);

        let printed = print_text(&puzzle, &TextFormat::default()).unwrap();
        assert!(printed.contains("\tMARK;\n"));
        assert!(printed.contains("\t1:CATS:C\n"));
        assert!(printed.contains("\t1AT\n"));
        assert!(printed.contains("\tTEn\n"));
        assert_eq!(parse_text(&printed).unwrap(), puzzle);
    }

    #[test]
    fn v1_files_cannot_carry_a_rebus() {
        let text = TINY_V1.replace("<ACROSS>", "<REBUS>\n\t1:CATS:C\n<ACROSS>");
        assert_eq!(parse_text(&text), Err(TextError::RebusInV1));
    }

    #[test]
    fn v1_grid_charset_is_narrow() {
        let text = TINY_V1.replace("\tTEN", "\tT3N");
        assert_eq!(
            parse_text(&text),
            Err(TextError::GridCharset { dialect: "V1" })
        );
        let v2 = text.replace("<ACROSS PUZZLE>", "<ACROSS PUZZLE V2>");
        assert!(parse_text(&v2).is_ok());
    }

    #[test]
    fn missing_required_section_is_reported() {
        let text = TINY_V1.replace("<DOWN>", "<NOTEPAD>");
        assert_eq!(parse_text(&text), Err(TextError::MissingSection { tag: "DOWN" }));
    }

    #[test]
    fn zero_width_size_is_rejected() {
        let text = TINY_V1.replace("\t3x3", "\t0x3");
        assert_eq!(
            parse_text(&text),
            Err(TextError::Validation(ValidationError::EmptyGrid))
        );
    }

    #[test]
    fn size_larger_than_the_grid_is_rejected() {
        // a grid shorter than one declared row
        let text = TINY_V1
            .replace("\t3x3", "\t9x9")
            .replace("\tARE\n\tTEN\n", "");
        assert_eq!(
            parse_text(&text),
            Err(TextError::Validation(ValidationError::SolutionLength {
                width: 9,
                height: 9,
                expected: 81,
                found: 3,
            }))
        );
    }

    #[test]
    fn malformed_size_is_reported() {
        let text = TINY_V1.replace("\t3x3", "\tthree by three");
        assert_eq!(
            parse_text(&text),
            Err(TextError::MalformedSize {
                text: "three by three".to_string()
            })
        );
    }

    #[test]
    fn ambiguous_short_solutions_cannot_print() {
        let mut puzzle = parse_text(TINY_V1).unwrap();
        let mut grid = vec![None; 9];
        grid[0] = Some(0);
        grid[1] = Some(0); // C and A share a key
        puzzle.rebus = Some(Rebus {
            grid: Some(grid),
            solution: Some(BTreeMap::from([(0, "CATS".to_string())])),
            state: None,
        });
        assert_eq!(
            print_text(&puzzle, &TextFormat::default()),
            Err(TextError::AmbiguousShortSolution { key: '1' })
        );
    }
}
