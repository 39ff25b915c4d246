//! The fixed 52-byte PUZ header.
//!
//! Layout (all integers little-endian), offsets relative to the start of
//! the signature-aligned region:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0x00 | 2  | file checksum |
//! | 0x02 | 12 | `ACROSS&DOWN\0` signature |
//! | 0x0E | 2  | header checksum |
//! | 0x10 | 8  | masked ("ICHEATED") checksum |
//! | 0x18 | 4  | version, NUL-padded ASCII |
//! | 0x1C | 2  | reserved |
//! | 0x1E | 2  | scrambled-solution checksum |
//! | 0x20 | 12 | reserved |
//! | 0x2C | 1  | width |
//! | 0x2D | 1  | height |
//! | 0x2E | 2  | clue count |
//! | 0x30 | 2  | reserved bitmask |
//! | 0x32 | 2  | scrambled flag (0x0004 or 0) |

use byteorder::{ByteOrder, LittleEndian};

use crate::puzzle::Puzzle;

/// Byte offsets of the header fields.
pub mod offset {
    pub const FILE_CHECKSUM: usize = 0x00;
    pub const FILE_SIGNATURE: usize = 0x02;
    pub const HEADER_CHECKSUM: usize = 0x0E;
    pub const MASKED_CHECKSUM: usize = 0x10;
    pub const MASKED_CHECKSUM_END: usize = 0x18;
    pub const VERSION: usize = 0x18;
    pub const VERSION_END: usize = 0x1C;
    pub const RESERVED_1C: usize = 0x1C;
    pub const SCRAMBLED_CHECKSUM: usize = 0x1E;
    pub const RESERVED_20: usize = 0x20;
    pub const RESERVED_20_END: usize = 0x2C;
    pub const WIDTH: usize = 0x2C;
    pub const HEIGHT: usize = 0x2D;
    pub const NUMBER_OF_CLUES: usize = 0x2E;
    pub const UNKNOWN_BITMASK: usize = 0x30;
    pub const SCRAMBLED_FLAG: usize = 0x32;
    pub const HEADER_END: usize = 0x34;
}

/// The format signature found at offset 0x02 of every PUZ file.
pub const FILE_SIGNATURE: &[u8; 12] = b"ACROSS&DOWN\0";

pub const HEADER_LEN: usize = offset::HEADER_END;

/// Encode the header with the three checksum regions left zeroed.
///
/// The binary printer patches the checksums in a second pass; the
/// checksum projections use this zeroed form directly, since only the
/// 0x2C..0x34 sub-region participates in any checksum.
pub fn encode_header_without_checksums(puzzle: &Puzzle) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[offset::FILE_SIGNATURE..offset::FILE_SIGNATURE + FILE_SIGNATURE.len()]
        .copy_from_slice(FILE_SIGNATURE);

    let version = puzzle.file_version.as_bytes();
    let len = version.len().min(offset::VERSION_END - offset::VERSION);
    header[offset::VERSION..offset::VERSION + len].copy_from_slice(&version[..len]);

    LittleEndian::write_u16(&mut header[offset::RESERVED_1C..], puzzle.misc.unknown1);
    LittleEndian::write_u16(
        &mut header[offset::SCRAMBLED_CHECKSUM..],
        puzzle.misc.scrambled_checksum,
    );
    header[offset::RESERVED_20..offset::RESERVED_20_END].copy_from_slice(&puzzle.misc.unknown2);
    header[offset::WIDTH] = puzzle.width;
    header[offset::HEIGHT] = puzzle.height;
    LittleEndian::write_u16(
        &mut header[offset::NUMBER_OF_CLUES..],
        puzzle.clues.len() as u16,
    );
    LittleEndian::write_u16(&mut header[offset::UNKNOWN_BITMASK..], puzzle.misc.unknown3);
    LittleEndian::write_u16(
        &mut header[offset::SCRAMBLED_FLAG..],
        if puzzle.is_scrambled { 0x0004 } else { 0x0000 },
    );
    header
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_of_minimal_header() {
        let puzzle = Puzzle {
            width: 15,
            height: 15,
            clues: vec![String::new(); 76],
            file_version: "1.3".to_string(),
            ..Puzzle::default()
        };
        let header = encode_header_without_checksums(&puzzle);
        assert_eq!(&header[0x02..0x0E], FILE_SIGNATURE);
        assert_eq!(&header[0x18..0x1C], b"1.3\0");
        assert_eq!(header[0x2C], 15);
        assert_eq!(header[0x2D], 15);
        assert_eq!(&header[0x2E..0x30], &[76, 0]);
        // checksum regions stay zeroed until the printer patches them
        assert_eq!(&header[0x00..0x02], &[0, 0]);
        assert_eq!(&header[0x0E..0x10], &[0, 0]);
        assert_eq!(&header[0x10..0x18], &[0; 8]);
    }

    #[test]
    fn scrambled_flag_word() {
        let mut puzzle = Puzzle {
            width: 1,
            height: 1,
            ..Puzzle::default()
        };
        puzzle.is_scrambled = true;
        let header = encode_header_without_checksums(&puzzle);
        assert_eq!(&header[0x32..0x34], &[0x04, 0x00]);
    }
}
