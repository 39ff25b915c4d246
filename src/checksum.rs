//! The PUZ 16-bit rotating checksum.
//!
//! For every input byte the accumulator is rotated right by one bit (the
//! low bit wrapping into the high bit), then the byte is added modulo
//! 65536.  Checksums over logically separate byte regions are chained by
//! feeding one call's result in as the next call's initial value; the
//! file checksum and the masked "ICHEATED" checksum both depend on this.
//!
//! Output must be byte-identical to AcrossLite's — this is a
//! wire-compatibility contract, not an implementation detail.

/// Checksum `data`, starting from `initial`.
///
/// Pass `0` for a standalone checksum, or a previous result to chain
/// regions in file order.
pub fn checksum(data: &[u8], initial: u16) -> u16 {
    data.iter().fold(initial, |sum, &byte| {
        sum.rotate_right(1).wrapping_add(u16::from(byte))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_vectors() {
        assert_eq!(checksum(&[], 0), 0);
        assert_eq!(checksum(&[0x01], 0), 0x0001);
        // rotate of 0x0001 wraps the low bit into the high bit
        assert_eq!(checksum(&[0x01, 0x01], 0), 0x8001);
        assert_eq!(checksum(b"AB", 0), 0x8062);
    }

    #[test]
    fn chaining_continues_the_fold() {
        let first = checksum(b"ACROSS", 0);
        assert_eq!(checksum(b"&DOWN", first), checksum(b"ACROSS&DOWN", 0));
    }

    proptest! {
        #[test]
        fn chained_equals_concatenated(a: Vec<u8>, b: Vec<u8>) {
            let concatenated: Vec<u8> = a.iter().chain(b.iter()).copied().collect();
            prop_assert_eq!(
                checksum(&b, checksum(&a, 0)),
                checksum(&concatenated, 0)
            );
        }
    }
}
