use std::collections::VecDeque;

use tracing::{debug, info, trace, warn};

use crate::config::VsbConfig;
use crate::error::Result;
use crate::framing::{
    BLOCK_CODED_BYTES, BLOCK_SYMBOLS, CODEWORD_LEN, ENCODERS, PAYLOAD_LEN, null_packet,
};
use crate::interleave::ConvolutionalInterleaver;
use crate::mux;
use crate::reed_solomon::ReedSolomon;
use crate::sync::{SyncState, TsSync};
use crate::trellis::{TrellisDecoderBank, TrellisEncoderBank};

/// Receiver statistics. Counters only grow until [`StreamDecoder::reset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub symbols_processed: u64,
    pub packets_emitted: u64,
    /// Codewords the Reed-Solomon decoder could not repair.
    pub rs_errors: u64,
    /// Set on the first emitted packet and never cleared except by reset.
    pub synchronized: bool,
    pub blocks_decoded: u64,
    /// Codewords that decoded, with or without correction.
    pub codewords_decoded: u64,
    pub bytes_corrected: u64,
    /// Current transport stream lock.
    pub locked: bool,
    pub sync_losses: u64,
}

/// Streaming 8-VSB symbol to transport stream decoder.
///
/// Accepts arbitrary-length runs of sliced symbols. Complete 12-segment
/// blocks are trellis decoded, deinterleaved and Reed-Solomon corrected;
/// the recovered bytes are then searched for 188-byte packet alignment.
pub struct StreamDecoder {
    config: VsbConfig,
    trellis: TrellisDecoderBank,
    deinterleaver: ConvolutionalInterleaver,
    rs: ReedSolomon,
    sync: TsSync,
    symbols: VecDeque<f32>,
    block: Vec<f32>,
    coded: Vec<u8>,
    /// Deinterleaved bytes not yet forming a whole codeword.
    pending: Vec<u8>,
    /// End-to-end interleaver delay in bytes.
    latency: usize,
    /// Deinterleaver output still to discard before the first real byte.
    warmup_remaining: usize,
    bytes: VecDeque<u8>,
    stats: StreamStats,
}

impl StreamDecoder {
    pub fn new(config: &VsbConfig) -> Result<Self> {
        let latency = config.validate()?;
        Ok(Self {
            config: config.clone(),
            trellis: TrellisDecoderBank::new(config.traceback_depth),
            deinterleaver: ConvolutionalInterleaver::deinterleaver(
                config.interleave_branches,
                config.interleave_unit,
            ),
            rs: ReedSolomon::new(),
            sync: TsSync::new(),
            symbols: VecDeque::with_capacity(2 * BLOCK_SYMBOLS),
            block: Vec::with_capacity(BLOCK_SYMBOLS),
            coded: vec![0u8; BLOCK_CODED_BYTES],
            pending: Vec::with_capacity(2 * CODEWORD_LEN),
            latency,
            warmup_remaining: latency,
            bytes: VecDeque::new(),
            stats: StreamStats::default(),
        })
    }

    pub fn config(&self) -> &VsbConfig {
        &self.config
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Symbols buffered but not yet part of a decoded block.
    pub fn buffered_symbols(&self) -> usize {
        self.symbols.len()
    }

    /// Decoded bytes waiting for packet alignment.
    pub fn buffered_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Feed symbols and return every whole transport packet recovered so far.
    ///
    /// The returned length is always a multiple of 188.
    pub fn process_symbols(&mut self, symbols: &[f32]) -> Vec<u8> {
        self.stats.symbols_processed += symbols.len() as u64;
        self.symbols.extend(symbols.iter().copied());

        if self.symbols.len() < BLOCK_SYMBOLS {
            return Vec::new();
        }

        while self.symbols.len() >= BLOCK_SYMBOLS {
            self.block.clear();
            self.block.extend(self.symbols.drain(..BLOCK_SYMBOLS));
            self.decode_block();
        }

        let mut out = Vec::new();
        self.extract_packets(&mut out);
        out
    }

    /// Return to the freshly constructed state.
    pub fn reset(&mut self) {
        self.trellis.reset();
        self.deinterleaver.reset();
        self.sync.reset();
        self.symbols.clear();
        self.block.clear();
        self.pending.clear();
        self.bytes.clear();
        self.warmup_remaining = self.latency;
        self.stats = StreamStats::default();
    }

    fn decode_block(&mut self) {
        self.trellis
            .decode_block(&self.block, mux::shared(), &mut self.coded);
        self.stats.blocks_decoded += 1;

        let mut codewords = 0usize;
        for index in 0..ENCODERS {
            let codeword = &mut self.coded[index * CODEWORD_LEN..(index + 1) * CODEWORD_LEN];
            self.deinterleaver.process(codeword);

            let skip = self.warmup_remaining.min(CODEWORD_LEN);
            if skip > 0 {
                self.warmup_remaining -= skip;
                if self.warmup_remaining == 0 {
                    debug!(
                        block = self.stats.blocks_decoded,
                        "deinterleaver warm-up complete"
                    );
                }
            }
            self.pending.extend_from_slice(&codeword[skip..]);

            while self.pending.len() >= CODEWORD_LEN {
                self.decode_codeword();
                codewords += 1;
            }
        }

        trace!(
            block = self.stats.blocks_decoded,
            codewords,
            buffered_bytes = self.bytes.len(),
            "decoded trellis block"
        );
    }

    fn decode_codeword(&mut self) {
        match self.rs.decode(&self.pending[..CODEWORD_LEN]) {
            Ok(decoded) => {
                self.stats.codewords_decoded += 1;
                if decoded.corrected > 0 {
                    self.stats.bytes_corrected += decoded.corrected as u64;
                    debug!(corrected = decoded.corrected, "corrected codeword");
                }
                self.bytes.extend(decoded.payload);
            }
            Err(e) => {
                self.stats.rs_errors += 1;
                debug!(error = %e, rs_errors = self.stats.rs_errors, "dropping codeword");
            }
        }
        self.pending.drain(..CODEWORD_LEN);
    }

    fn extract_packets(&mut self, out: &mut Vec<u8>) {
        let buf = self.bytes.make_contiguous();
        let ex = self.sync.extract(buf, out);
        self.bytes.drain(..ex.consumed);

        if ex.losses > 0 {
            self.stats.sync_losses += ex.losses as u64;
            warn!(
                losses = self.stats.sync_losses,
                "transport stream lost sync"
            );
        }
        if ex.acquired {
            if self.stats.synchronized {
                info!(packets = ex.packets, "transport stream sync re-acquired");
            } else {
                info!(packets = ex.packets, "transport stream sync acquired");
            }
        }
        if ex.packets > 0 {
            self.stats.packets_emitted += ex.packets as u64;
            self.stats.synchronized = true;
        }
        self.stats.locked = self.sync.state() == SyncState::Locked;
    }
}

/// Streaming transport stream to 8-VSB symbol encoder.
///
/// The exact inverse of [`StreamDecoder`]: bytes are cut into 187-byte
/// payloads, Reed-Solomon encoded, interleaved, and mapped to symbols once a
/// full block of 12 codewords is available.
pub struct StreamEncoder {
    /// End-to-end interleaver delay in bytes.
    latency: usize,
    rs: ReedSolomon,
    interleaver: ConvolutionalInterleaver,
    trellis: TrellisEncoderBank,
    payload_buf: Vec<u8>,
    coded: Vec<u8>,
    codewords_encoded: usize,
    null_continuity: u8,
}

impl StreamEncoder {
    pub fn new(config: &VsbConfig) -> Result<Self> {
        let latency = config.validate()?;
        Ok(Self {
            latency,
            rs: ReedSolomon::new(),
            interleaver: ConvolutionalInterleaver::interleaver(
                config.interleave_branches,
                config.interleave_unit,
            ),
            trellis: TrellisEncoderBank::new(),
            payload_buf: Vec::with_capacity(2 * PAYLOAD_LEN),
            coded: Vec::with_capacity(BLOCK_CODED_BYTES),
            codewords_encoded: 0,
            null_continuity: 0,
        })
    }

    /// Codewords produced so far, including those still waiting for a full block.
    pub fn codewords_encoded(&self) -> usize {
        self.codewords_encoded
    }

    /// Append transport stream bytes and return the symbols for every completed block.
    pub fn process(&mut self, bytes: &[u8]) -> Vec<f32> {
        self.payload_buf.extend_from_slice(bytes);
        let mut symbols = Vec::new();
        while self.payload_buf.len() >= PAYLOAD_LEN {
            self.encode_codeword(&mut symbols);
        }
        symbols
    }

    /// Stuff null packets until every byte handed to [`Self::process`] has
    /// cleared the interleaver and the final block is complete.
    pub fn flush(&mut self) -> Vec<f32> {
        let mut symbols = Vec::new();
        let real = self.codewords_encoded + usize::from(!self.payload_buf.is_empty());
        let drain = self.latency.div_ceil(CODEWORD_LEN);
        let target = (real + drain).next_multiple_of(ENCODERS);

        while self.codewords_encoded < target {
            if self.payload_buf.len() < PAYLOAD_LEN {
                let packet = null_packet(self.null_continuity);
                self.null_continuity = self.null_continuity.wrapping_add(1) & 0x0F;
                self.payload_buf.extend_from_slice(&packet);
            }
            self.encode_codeword(&mut symbols);
        }
        symbols
    }

    fn encode_codeword(&mut self, symbols: &mut Vec<f32>) {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&self.payload_buf[..PAYLOAD_LEN]);
        self.payload_buf.drain(..PAYLOAD_LEN);

        let mut codeword = self.rs.encode(&payload);
        self.interleaver.process(&mut codeword);
        self.coded.extend_from_slice(&codeword);
        self.codewords_encoded += 1;

        if self.coded.len() == BLOCK_CODED_BYTES {
            symbols.extend(self.trellis.encode_block(&self.coded, mux::shared()));
            self.coded.clear();
        }
    }
}
