//! Convolutional byte interleaving (A/53: B = 52 branches, M = 4 bytes).
//!
//! Byte `n` of the stream goes through branch `n mod B`. On the transmit side
//! branch `i` delays by `i * M` bytes; the receiver's branch `i` delays by
//! `(B - 1 - i) * M`, so every byte sees the same total delay of
//! `(B - 1) * M * B` stream positions.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct ConvolutionalInterleaver {
    lines: Vec<VecDeque<u8>>,
    branch: usize,
}

impl ConvolutionalInterleaver {
    /// Transmit-side interleaver.
    pub fn interleaver(branches: usize, unit: usize) -> Self {
        Self::with_delays((0..branches).map(|i| i * unit))
    }

    /// Receive-side deinterleaver, the inverse of [`Self::interleaver`].
    pub fn deinterleaver(branches: usize, unit: usize) -> Self {
        Self::with_delays((0..branches).map(|i| (branches - 1 - i) * unit))
    }

    fn with_delays(delays: impl Iterator<Item = usize>) -> Self {
        let mut lines: Vec<VecDeque<u8>> = delays
            .map(|delay| {
                let mut line = VecDeque::with_capacity(delay + 1);
                line.resize(delay, 0);
                line
            })
            .collect();
        if lines.is_empty() {
            lines.push(VecDeque::new());
        }
        Self { lines, branch: 0 }
    }

    pub fn branches(&self) -> usize {
        self.lines.len()
    }

    /// Delay of this side alone plus its counterpart: (B - 1) * M * B bytes.
    pub fn latency(&self) -> usize {
        let b = self.lines.len();
        let longest = self.lines.iter().map(VecDeque::len).max().unwrap_or(0);
        longest * b
    }

    /// Push `data` through the delay lines, replacing each byte with the
    /// byte leaving its branch.
    pub fn process(&mut self, data: &mut [u8]) {
        let b = self.lines.len();
        for byte in data.iter_mut() {
            let line = &mut self.lines[self.branch];
            if !line.is_empty() {
                line.push_back(*byte);
                if let Some(out) = line.pop_front() {
                    *byte = out;
                }
            }
            self.branch += 1;
            if self.branch == b {
                self.branch = 0;
            }
        }
    }

    /// Zero every delay line and realign to branch 0.
    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.iter_mut().for_each(|b| *b = 0);
        }
        self.branch = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::CODEWORD_LEN;

    fn stream(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 13 + i / 207) as u8).collect()
    }

    #[test]
    fn atsc_latency() {
        assert_eq!(ConvolutionalInterleaver::deinterleaver(52, 4).latency(), 10_608);
        assert_eq!(ConvolutionalInterleaver::interleaver(52, 4).latency(), 10_608);
    }

    #[test]
    fn single_branch_is_passthrough() {
        let mut stage = ConvolutionalInterleaver::deinterleaver(1, 4);
        let original = stream(CODEWORD_LEN);
        let mut data = original.clone();
        stage.process(&mut data);
        assert_eq!(data, original);
        assert_eq!(stage.latency(), 0);
    }

    #[test]
    fn interleaver_actually_reorders() {
        let original = stream(CODEWORD_LEN * 60);
        let mut data = original.clone();
        ConvolutionalInterleaver::interleaver(52, 4).process(&mut data);
        assert_ne!(data, original);
    }

    #[test]
    fn deinterleave_restores_delayed_stream() {
        let latency = 10_608;
        let original = stream(CODEWORD_LEN * 120);
        let mut data = original.clone();

        let mut tx = ConvolutionalInterleaver::interleaver(52, 4);
        let mut rx = ConvolutionalInterleaver::deinterleaver(52, 4);
        for codeword in data.chunks_mut(CODEWORD_LEN) {
            tx.process(codeword);
            rx.process(codeword);
        }

        assert!(data[..latency].iter().all(|&b| b == 0));
        assert_eq!(data[latency..], original[..original.len() - latency]);
    }

    #[test]
    fn branch_zero_passes_through_on_transmit() {
        let mut tx = ConvolutionalInterleaver::interleaver(52, 4);
        let mut data = stream(52);
        let first = data[0];
        tx.process(&mut data);
        assert_eq!(data[0], first);
        assert!(data[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn reset_clears_lines() {
        let mut rx = ConvolutionalInterleaver::deinterleaver(4, 2);
        let mut data = vec![9u8; 40];
        rx.process(&mut data);
        rx.reset();
        let mut zeros = vec![0u8; 4];
        rx.process(&mut zeros);
        assert!(zeros.iter().all(|&b| b == 0));
    }
}
