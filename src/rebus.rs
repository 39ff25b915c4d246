//! Rebus key compression and the text dialect's one-character key scheme.
//!
//! Binary files assign rebus keys in encounter order and may leave them
//! sparse; the text dialect can only name a key with a single printable
//! character, so keys are first compressed to a dense `0..N-1` range and
//! then mapped through a fixed 17-symbol alphabet: digits `1`-`9`, `0`
//! (standing for 10), then `@ # $ % & + ?` for 11-17.  Keys are
//! zero-based internally; the shift by one happens at this boundary.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::puzzle::RebusKey;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RebusKeyError {
    /// The text dialect has no way to name more than 17 distinct rebus
    /// answers.  This is a capacity limit of the format, not something
    /// to work around.
    #[error("rebus key {0} cannot be written: the text format supports at most 17 distinct rebus answers")]
    KeyOutOfRange(u16),
    #[error("invalid rebus key character {0:?}")]
    InvalidKeyChar(char),
}

/// Renumber sparse rebus keys to the dense range `0..N-1` while
/// preserving the grid-to-solution association.
///
/// Already-dense key sets are returned unchanged, which makes the
/// operation idempotent.  Grid entries whose key is absent from the
/// solution table map to `None`; the validator rejects such grids before
/// they reach a printer.
pub fn compress_keys(
    grid: &[Option<RebusKey>],
    solution: &BTreeMap<RebusKey, String>,
) -> (Vec<Option<RebusKey>>, BTreeMap<RebusKey, String>) {
    let supplied: Vec<RebusKey> = solution.keys().copied().collect();
    if supplied
        .iter()
        .enumerate()
        .all(|(i, &key)| usize::from(key) == i)
    {
        return (grid.to_vec(), solution.clone());
    }

    let next_key =
        |key: RebusKey| supplied.iter().position(|&k| k == key).map(|i| i as RebusKey);

    let next_grid = grid.iter().map(|entry| entry.and_then(next_key)).collect();
    let next_solution = solution
        .iter()
        .filter_map(|(key, value)| next_key(*key).map(|next| (next, value.clone())))
        .collect();
    (next_grid, next_solution)
}

/// Map a text-dialect key character to its zero-based numeric key.
///
/// Accepts the full character set the text grammar permits — including
/// letters, which [`key_to_char`] can never emit — so that any grid
/// character may serve as a key when parsing.
pub fn char_to_key(c: char) -> Result<RebusKey, RebusKeyError> {
    let num: u16 = match c {
        '1'..='9' => c as u16 - '0' as u16,
        '0' => 10,
        '@' => 11,
        '#' => 12,
        '$' => 13,
        '%' => 14,
        '&' => 15,
        '+' => 16,
        '?' => 17,
        'A'..='Z' => 17 + (c as u16 - 'A' as u16) + 1,
        'a'..='z' => 17 + 26 + (c as u16 - 'a' as u16) + 1,
        _ => return Err(RebusKeyError::InvalidKeyChar(c)),
    };
    Ok((num - 1) as RebusKey)
}

/// Map a zero-based numeric key to its display character.
pub fn key_to_char(key: RebusKey) -> Result<char, RebusKeyError> {
    let num = u16::from(key) + 1;
    Ok(match num {
        1..=9 => char::from(b'0' + num as u8),
        10 => '0',
        11 => '@',
        12 => '#',
        13 => '$',
        14 => '%',
        15 => '&',
        16 => '+',
        17 => '?',
        _ => return Err(RebusKeyError::KeyOutOfRange(num)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn key_char_mappings_are_mutual_inverses() {
        for key in 0..17u8 {
            let c = key_to_char(key).unwrap();
            assert_eq!(char_to_key(c).unwrap(), key);
        }
        assert_eq!(key_to_char(0).unwrap(), '1');
        assert_eq!(key_to_char(9).unwrap(), '0');
        assert_eq!(key_to_char(16).unwrap(), '?');
    }

    #[test]
    fn keys_past_seventeen_fail_to_encode() {
        assert_eq!(key_to_char(17), Err(RebusKeyError::KeyOutOfRange(18)));
        assert_eq!(key_to_char(40), Err(RebusKeyError::KeyOutOfRange(41)));
    }

    #[test]
    fn letters_parse_but_never_print() {
        assert_eq!(char_to_key('A').unwrap(), 17);
        assert_eq!(char_to_key('z').unwrap(), 17 + 26 + 26 - 1);
        assert_eq!(char_to_key('!'), Err(RebusKeyError::InvalidKeyChar('!')));
    }

    #[test]
    fn compress_renumbers_sparse_keys() {
        let grid = vec![Some(1), None, Some(240), Some(6), None];
        let solution = BTreeMap::from([
            (1, "ONE".to_string()),
            (6, "SIX".to_string()),
            (240, "BIG".to_string()),
        ]);
        let (next_grid, next_solution) = compress_keys(&grid, &solution);
        assert_eq!(next_grid, vec![Some(0), None, Some(2), Some(1), None]);
        assert_eq!(
            next_solution,
            BTreeMap::from([
                (0, "ONE".to_string()),
                (1, "SIX".to_string()),
                (2, "BIG".to_string()),
            ])
        );
    }

    #[test]
    fn compress_is_identity_on_dense_keys() {
        let grid = vec![Some(0), Some(1), None];
        let solution =
            BTreeMap::from([(0, "A".to_string()), (1, "B".to_string())]);
        let (next_grid, next_solution) = compress_keys(&grid, &solution);
        assert_eq!(next_grid, grid);
        assert_eq!(next_solution, solution);
    }

    proptest! {
        #[test]
        fn compress_is_idempotent(keys in proptest::collection::btree_set(0u8..200, 0..10)) {
            let solution: BTreeMap<RebusKey, String> = keys
                .iter()
                .map(|&k| (k, format!("W{k}")))
                .collect();
            let grid: Vec<Option<RebusKey>> =
                keys.iter().map(|&k| Some(k)).chain([None]).collect();
            let once = compress_keys(&grid, &solution);
            let twice = compress_keys(&once.0, &once.1);
            prop_assert_eq!(once, twice);
        }
    }
}
