use crate::framing::{BLOCK_CODED_BYTES, BLOCK_SYMBOLS, ENCODERS, SEGMENT_SYMBOLS, SEGMENT_SYNC};
use crate::mux::{LANE_ENTRIES, MuxTable};

/// Trellis states per encoder.
pub const NUM_STATES: usize = 4;
/// Candidate 2-bit values per symbol.
pub const NUM_DIBITS: usize = 4;

/// The two nominal 8-VSB levels associated with each dibit.
pub const DIBIT_LEVELS: [[f32; 2]; NUM_DIBITS] = [
    [-7.0, -5.0], // 0
    [-3.0, -1.0], // 1
    [1.0, 3.0],   // 2
    [5.0, 7.0],   // 3
];

/// Received symbols are clipped to this magnitude before metric computation.
/// Anything beyond it is already unambiguous, and the bound keeps every
/// branch metric finite.
pub const SYMBOL_CLIP: f32 = 16.0;

/// Squared distance from `symbol` to the nearer of the two levels of `dibit`.
#[inline]
pub fn branch_metric(symbol: f32, dibit: usize) -> f32 {
    let [a, b] = DIBIT_LEVELS[dibit];
    let da = symbol - a;
    let db = symbol - b;
    (da * da).min(db * db)
}

#[inline]
fn next_state(state: usize, dibit: usize) -> usize {
    ((state << 1) | (dibit & 1)) & (NUM_STATES - 1)
}

/// Survivor record for one trellis step.
#[derive(Debug, Clone, Copy, Default)]
struct Survivors {
    prev: [u8; NUM_STATES],
    dibit: [u8; NUM_STATES],
    best: u8,
}

/// One of the 12 soft-decision decoders. Path metrics persist across blocks.
#[derive(Debug, Clone)]
pub struct TrellisLane {
    path_metric: [f32; NUM_STATES],
    history: Vec<Survivors>,
}

impl Default for TrellisLane {
    fn default() -> Self {
        Self::new()
    }
}

impl TrellisLane {
    pub fn new() -> Self {
        let mut lane = Self {
            path_metric: [0.0; NUM_STATES],
            history: Vec::with_capacity(LANE_ENTRIES),
        };
        lane.reset();
        lane
    }

    /// Return to the assumed start state 0.
    pub fn reset(&mut self) {
        self.path_metric = [f32::INFINITY; NUM_STATES];
        self.path_metric[0] = 0.0;
        self.history.clear();
    }

    pub fn path_metrics(&self) -> &[f32; NUM_STATES] {
        &self.path_metric
    }

    /// Add-compare-select for one received symbol.
    fn step(&mut self, symbol: f32) -> Survivors {
        // Non-finite input is a mid-scale erasure. Huge finite input is clipped.
        let symbol = if symbol.is_finite() {
            symbol.clamp(-SYMBOL_CLIP, SYMBOL_CLIP)
        } else {
            0.0
        };

        let mut metric = [f32::INFINITY; NUM_STATES];
        let mut survivors = Survivors::default();

        for state in 0..NUM_STATES {
            let current = self.path_metric[state];
            if current == f32::INFINITY {
                continue;
            }
            for dibit in 0..NUM_DIBITS {
                let next = next_state(state, dibit);
                let candidate = current + branch_metric(symbol, dibit);
                if candidate < metric[next] {
                    metric[next] = candidate;
                    survivors.prev[next] = state as u8;
                    survivors.dibit[next] = dibit as u8;
                }
            }
        }

        let mut best = 0;
        for state in 1..NUM_STATES {
            if metric[state] < metric[best] {
                best = state;
            }
        }
        survivors.best = best as u8;

        // Renormalize so metrics stay bounded over an unbounded stream.
        let floor = metric[best];
        if floor.is_finite() {
            for m in metric.iter_mut() {
                *m -= floor;
            }
        } else {
            // Every path died; restart with all states equally likely.
            metric = [0.0; NUM_STATES];
        }
        self.path_metric = metric;
        survivors
    }

    /// Decode a run of symbols into one dibit per symbol.
    ///
    /// With `traceback_depth == 0` each dibit is the survivor of whichever
    /// state holds the minimum metric right after that symbol. Otherwise the
    /// decision for symbol `t` is read by tracing back from the best state at
    /// `t + traceback_depth`, clamped to the last symbol of the run.
    pub fn decode(&mut self, symbols: &[f32], traceback_depth: usize) -> Vec<u8> {
        let mut dibits = Vec::with_capacity(symbols.len());
        self.decode_into(symbols.iter().copied(), traceback_depth, &mut dibits);
        dibits
    }

    pub(crate) fn decode_into(
        &mut self,
        symbols: impl Iterator<Item = f32>,
        traceback_depth: usize,
        dibits: &mut Vec<u8>,
    ) {
        self.history.clear();
        for symbol in symbols {
            let survivors = self.step(symbol);
            self.history.push(survivors);
        }

        let n = self.history.len();
        if n == 0 {
            return;
        }
        for t in 0..n {
            let horizon = (t + traceback_depth).min(n - 1);
            let mut state = self.history[horizon].best as usize;
            for k in (t + 1..=horizon).rev() {
                state = self.history[k].prev[state] as usize;
            }
            dibits.push(self.history[t].dibit[state]);
        }
    }

    /// Decode this lane's 828 symbols of one block, in table order.
    pub(crate) fn decode_lane(
        &mut self,
        block: &[f32],
        table: &MuxTable,
        encoder: usize,
        traceback_depth: usize,
        dibits: &mut Vec<u8>,
    ) {
        dibits.clear();
        self.decode_into(
            table.lane(encoder).iter().map(|e| block[e.symbol]),
            traceback_depth,
            dibits,
        );
    }
}

/// Pack per-lane dibits into the block's coded bytes.
///
/// Lanes interleave byte by byte, so this runs once all lanes are decoded.
pub(crate) fn scatter_dibits(table: &MuxTable, dibits: &[Vec<u8>], coded: &mut [u8]) {
    coded.fill(0);
    for (lane, decided) in table.lanes().iter().zip(dibits) {
        for (entry, &dibit) in lane.iter().zip(decided) {
            coded[entry.byte] |= dibit << entry.shift;
        }
    }
}

/// The 12 interleaved trellis decoders of an 8-VSB receiver.
#[derive(Debug, Clone)]
pub struct TrellisDecoderBank {
    lanes: Vec<TrellisLane>,
    /// Per-lane decisions for the block being decoded.
    dibits: Vec<Vec<u8>>,
    traceback_depth: usize,
}

impl TrellisDecoderBank {
    pub fn new(traceback_depth: usize) -> Self {
        Self {
            lanes: vec![TrellisLane::new(); ENCODERS],
            dibits: vec![Vec::with_capacity(LANE_ENTRIES); ENCODERS],
            traceback_depth,
        }
    }

    pub fn traceback_depth(&self) -> usize {
        self.traceback_depth
    }

    pub fn lanes(&self) -> &[TrellisLane] {
        &self.lanes
    }

    pub fn reset(&mut self) {
        for lane in &mut self.lanes {
            lane.reset();
        }
    }

    /// Decode one full block of symbols into 12 x 207 coded bytes.
    ///
    /// `coded` is laid out as the transmitter's output space: 12 consecutive
    /// 207-byte codewords, each built from bytes of all 12 encoders.
    ///
    /// # Panics
    ///
    /// Panics if `block` is not exactly 9984 symbols or `coded` is not
    /// exactly 2484 bytes.
    pub fn decode_block(&mut self, block: &[f32], table: &MuxTable, coded: &mut [u8]) {
        assert_eq!(block.len(), BLOCK_SYMBOLS, "trellis block must be complete");
        assert_eq!(coded.len(), BLOCK_CODED_BYTES);

        #[cfg(feature = "parallel")]
        {
            crate::parallel::decode_lanes(
                &mut self.lanes,
                &mut self.dibits,
                block,
                table,
                self.traceback_depth,
            );
        }

        #[cfg(not(feature = "parallel"))]
        {
            for (encoder, (lane, dibits)) in
                self.lanes.iter_mut().zip(self.dibits.iter_mut()).enumerate()
            {
                lane.decode_lane(block, table, encoder, self.traceback_depth, dibits);
            }
        }

        scatter_dibits(table, &self.dibits, coded);
    }
}

/// Transmit-side mapper: coded bytes to 8-VSB symbol levels.
///
/// Each lane keeps the same 4-state register the decoder models, choosing
/// between the two levels of a dibit with the low state bit.
#[derive(Debug, Clone, Default)]
pub struct TrellisEncoderBank {
    states: [usize; ENCODERS],
}

impl TrellisEncoderBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.states = [0; ENCODERS];
    }

    /// Map 12 x 207 coded bytes to one block of symbols, segment syncs included.
    ///
    /// # Panics
    ///
    /// Panics if `coded` is not exactly 2484 bytes.
    pub fn encode_block(&mut self, coded: &[u8], table: &MuxTable) -> Vec<f32> {
        assert_eq!(coded.len(), BLOCK_CODED_BYTES);
        let mut block = vec![0.0f32; BLOCK_SYMBOLS];

        for segment in block.chunks_exact_mut(SEGMENT_SYMBOLS) {
            segment[..SEGMENT_SYNC.len()].copy_from_slice(&SEGMENT_SYNC);
        }

        for (encoder, state) in self.states.iter_mut().enumerate() {
            for entry in table.lane(encoder) {
                let dibit = ((coded[entry.byte] >> entry.shift) & 0b11) as usize;
                block[entry.symbol] = DIBIT_LEVELS[dibit][*state & 1];
                *state = next_state(*state, dibit);
            }
        }
        block
    }
}
