use std::io::{self, Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

/// Compresses a byte sequence with zlib before it is persisted.
///
/// The exact input is recoverable via [`decompress`]. Empty input is valid
/// and round-trips to empty output.
pub fn compress(input: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(input)?;
    encoder.finish()
}

/// Reverses [`compress`], reproducing the original bytes exactly.
///
/// Input that was not produced by [`compress`] fails with an error instead
/// of returning garbage.
pub fn decompress(input: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(input);
    let mut output = Vec::new();
    decoder.read_to_end(&mut output)?;
    Ok(output)
}
