pub mod binary;
pub mod checksum;
pub mod encoding;
pub mod header;
pub mod projections;
pub mod puzzle;
pub mod rebus;
pub mod text;
pub mod validate;

pub use binary::{parse_binary, print_binary, FormatError};
pub use encoding::Encoding;
pub use projections::{
    get_blank_state, get_file_checksum, get_file_encoding, get_header_checksum,
    get_masked_checksum, get_state, grid_numbering, has_rebus_solution, has_rebus_state,
    is_correct,
};
pub use puzzle::{Puzzle, Rebus, RebusKey, SquareMarkup, Timer};
pub use text::{parse_text, print_text, LineEnding, TextError, TextFormat};
pub use validate::{validate, ValidationError};
