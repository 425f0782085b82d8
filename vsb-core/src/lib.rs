pub mod config;
pub mod error;
pub mod framing;
pub mod interleave;
pub mod mux;
pub mod reed_solomon;
pub mod stream;
pub mod sync;
pub mod trellis;

#[cfg(feature = "parallel")]
mod parallel;

// Re-export primary API types
pub use config::VsbConfig;
pub use error::{Error, Result};
pub use mux::MuxTable;
pub use reed_solomon::{DecodedCodeword, ReedSolomon};
pub use stream::{StreamDecoder, StreamEncoder, StreamStats};
pub use sync::TsSync;

/// Decode a complete capture of symbols in one call.
///
/// For streaming use, see [`StreamDecoder`].
pub fn decode(symbols: &[f32], config: &VsbConfig) -> Result<(Vec<u8>, StreamStats)> {
    let mut decoder = StreamDecoder::new(config)?;
    let packets = decoder.process_symbols(symbols);
    Ok((packets, decoder.stats()))
}

/// Encode a complete transport stream into symbols, padded with null
/// packets so that every input packet can be recovered by [`decode`].
pub fn encode(transport_stream: &[u8], config: &VsbConfig) -> Result<Vec<f32>> {
    let mut encoder = StreamEncoder::new(config)?;
    let mut symbols = encoder.process(transport_stream);
    symbols.extend(encoder.flush());
    Ok(symbols)
}
