//! Symbol to trellis-encoder to byte wiring for one 12-segment block.
//!
//! The transmitter feeds coded bytes to its 12 trellis encoders one byte
//! per encoder, dibits MSB first. Each dibit position produces one symbol
//! per encoder in round-robin order. Every segment boundary skips the four
//! sync symbols and rotates the round-robin start by four encoders.

use once_cell::sync::Lazy;

use crate::framing::{
    CODEWORD_LEN, ENCODERS, SEGMENT_DATA_SYMBOLS, SEGMENT_SYMBOLS, SEGMENT_SYNC_SYMBOLS,
};

/// Encoder rotation applied at each segment boundary.
const SEGMENT_ROTATION: usize = 4;
/// Dibits packed into one coded byte.
const DIBITS_PER_BYTE: usize = 4;
/// Entries owned by each encoder in one block.
pub const LANE_ENTRIES: usize = CODEWORD_LEN * DIBITS_PER_BYTE;

const _: () = assert!(LANE_ENTRIES == SEGMENT_DATA_SYMBOLS);

static SHARED: Lazy<MuxTable> = Lazy::new(MuxTable::generate);

/// The process-wide table. It is built on first use and immutable afterwards.
pub fn shared() -> &'static MuxTable {
    &SHARED
}

/// Where one data symbol of a block comes from and goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxEntry {
    /// Symbol index relative to the start of the block.
    pub symbol: usize,
    /// Byte index in the block's coded output. The output is filled in
    /// 12-byte chunks, one byte per encoder, so byte `k` of encoder `e`
    /// lands at `12 * k + e`.
    pub byte: usize,
    /// Left shift of the dibit inside that byte (6, 4, 2 or 0).
    pub shift: u8,
}

#[derive(Debug, Clone)]
pub struct MuxTable {
    lanes: Vec<Vec<MuxEntry>>,
}

impl MuxTable {
    pub fn generate() -> Self {
        let mut lanes = vec![Vec::with_capacity(LANE_ENTRIES); ENCODERS];
        let mut symbol = 0usize;
        let mut start = 0usize;

        for byte in 0..CODEWORD_LEN {
            for dibit in 0..DIBITS_PER_BYTE {
                let shift = (6 - 2 * dibit) as u8;
                // Segments hold a whole number of rounds, so boundaries only land here.
                if symbol % SEGMENT_SYMBOLS == 0 {
                    if symbol > 0 {
                        start = (start + SEGMENT_ROTATION) % ENCODERS;
                    }
                    symbol += SEGMENT_SYNC_SYMBOLS;
                }
                for k in 0..ENCODERS {
                    let encoder = (start + k) % ENCODERS;
                    lanes[encoder].push(MuxEntry {
                        symbol,
                        byte: byte * ENCODERS + encoder,
                        shift,
                    });
                    symbol += 1;
                }
            }
        }

        debug_assert!(lanes.iter().all(|lane| lane.len() == LANE_ENTRIES));
        Self { lanes }
    }

    /// Entries for one encoder, in transmission order.
    pub fn lane(&self, encoder: usize) -> &[MuxEntry] {
        &self.lanes[encoder]
    }

    pub fn lanes(&self) -> &[Vec<MuxEntry>] {
        &self.lanes
    }

    /// Encoder that owns the data symbol at `symbol`, if it is a data symbol.
    pub fn encoder_of(&self, symbol: usize) -> Option<usize> {
        self.lanes
            .iter()
            .position(|lane| lane.binary_search_by_key(&symbol, |e| e.symbol).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::{BLOCK_CODED_BYTES, BLOCK_SYMBOLS, is_segment_sync};

    #[test]
    fn every_lane_has_828_entries() {
        let table = MuxTable::generate();
        assert_eq!(table.lanes().len(), ENCODERS);
        for lane in table.lanes() {
            assert_eq!(lane.len(), 828);
        }
    }

    #[test]
    fn entries_partition_data_symbols() {
        let table = MuxTable::generate();
        let mut seen = vec![false; BLOCK_SYMBOLS];
        for lane in table.lanes() {
            for entry in lane {
                assert!(!is_segment_sync(entry.symbol), "sync symbol {} mapped", entry.symbol);
                assert!(!seen[entry.symbol], "symbol {} mapped twice", entry.symbol);
                seen[entry.symbol] = true;
            }
        }
        for (index, &hit) in seen.iter().enumerate() {
            assert_eq!(hit, !is_segment_sync(index), "symbol {index}");
        }
    }

    #[test]
    fn every_destination_dibit_written_once() {
        let table = MuxTable::generate();
        let mut seen = vec![0u8; ENCODERS * CODEWORD_LEN];
        for (encoder, lane) in table.lanes().iter().enumerate() {
            for entry in lane {
                assert_eq!(entry.byte % ENCODERS, encoder);
                let mask = 0b11 << entry.shift;
                assert_eq!(seen[entry.byte] & mask, 0);
                seen[entry.byte] |= mask;
            }
        }
        assert!(seen.iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn lanes_are_in_transmission_order() {
        let table = MuxTable::generate();
        for lane in table.lanes() {
            assert!(lane.windows(2).all(|w| w[0].symbol < w[1].symbol));
            // Dibit k of a lane lands in byte k / 4, MSB first.
            for (k, entry) in lane.iter().enumerate() {
                assert_eq!(entry.byte / ENCODERS, k / 4);
                assert_eq!(entry.shift as usize, 6 - 2 * (k % 4));
            }
        }
    }

    #[test]
    fn encoders_share_each_12_byte_chunk() {
        let table = MuxTable::generate();
        let first: Vec<usize> = table.lanes().iter().map(|lane| lane[0].byte).collect();
        assert_eq!(first, (0..ENCODERS).collect::<Vec<_>>());
        // Codeword 0 (bytes 0..207) draws from every encoder.
        let last: Vec<usize> = table.lanes().iter().map(|lane| lane[827].byte).collect();
        assert_eq!(last, (BLOCK_CODED_BYTES - ENCODERS..BLOCK_CODED_BYTES).collect::<Vec<_>>());
    }

    #[test]
    fn segment_boundary_rotates_by_four() {
        let table = MuxTable::generate();
        // First data symbol of each segment belongs to encoder 0, 4, 8, 0, ...
        for segment in 0..12 {
            let first = segment * SEGMENT_SYMBOLS + SEGMENT_SYNC_SYMBOLS;
            assert_eq!(table.encoder_of(first), Some((segment * 4) % ENCODERS));
        }
        assert_eq!(table.encoder_of(0), None);
    }

    #[test]
    fn shared_table_matches_generated() {
        let table = MuxTable::generate();
        assert_eq!(shared().lanes(), table.lanes());
    }
}
