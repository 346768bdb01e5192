//! Plain text format
//!
//! Raw bytes are decoded (UTF-8, GBK, GB18030, then lossy UTF-8) and split
//! into chapters at heading lines, or into fixed-size windows when there are
//! none. Chapters are byte spans into a UTF-8 file, read back on demand.

mod decode;
mod parser;
mod renderer;

pub use decode::{decode_text, DecodedText};
pub use parser::{TxtParser, CONVERTED_FILE_NAME, DEFAULT_CHUNK_SIZE};
