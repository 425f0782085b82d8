//! Optional parallel processing using rayon.
//!
//! Enable with the `parallel` feature flag. The 12 trellis lanes of a block
//! are independent, so each lane decodes on its own rayon task. Packing the
//! decisions into bytes happens afterwards, since lanes share every 12-byte
//! chunk of the output. Blocks are still decoded strictly in order.

use rayon::prelude::*;

use crate::mux::MuxTable;
use crate::trellis::TrellisLane;

/// Decode all lanes of one block concurrently into per-lane dibits.
pub(crate) fn decode_lanes(
    lanes: &mut [TrellisLane],
    dibits: &mut [Vec<u8>],
    block: &[f32],
    table: &MuxTable,
    traceback_depth: usize,
) {
    lanes
        .par_iter_mut()
        .zip(dibits.par_iter_mut())
        .enumerate()
        .for_each(|(encoder, (lane, out))| {
            lane.decode_lane(block, table, encoder, traceback_depth, out);
        });
}
