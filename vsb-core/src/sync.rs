use crate::framing::{TS_PACKET_LEN, TS_SYNC_BYTE};

/// Transport stream lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Hunting,
    Locked,
}

/// Outcome of one extraction pass over the byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extraction {
    /// Whole packets appended to the output.
    pub packets: usize,
    /// Leading bytes of the buffer that may be dropped.
    pub consumed: usize,
    /// Times a locked walk hit a full-length position without a sync byte.
    pub losses: usize,
    /// Whether this pass moved the extractor from hunting to locked.
    pub acquired: bool,
}

/// Finds 188-byte packet alignment in a decoded byte stream.
///
/// Hunting requires a sync byte at `i` and again at `i + 188` so a stray
/// 0x47 inside payload data cannot cause a false lock. Once locked, packets
/// are taken at a fixed stride for as long as each one starts with 0x47.
#[derive(Debug, Clone, Default)]
pub struct TsSync {
    state: SyncState,
}

impl TsSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = SyncState::Hunting;
    }

    /// Extract every whole packet reachable from the start of `buf`.
    pub fn extract(&mut self, buf: &[u8], out: &mut Vec<u8>) -> Extraction {
        let mut result = Extraction::default();
        let mut pos = 0usize;

        loop {
            let Some(start) = find_double_sync(buf, pos) else {
                if buf.len() - pos > TS_PACKET_LEN {
                    // A full packet's worth of bytes and no continuation.
                    if self.state == SyncState::Locked {
                        self.state = SyncState::Hunting;
                        result.losses += 1;
                    }
                    // Below len - 188 every candidate has already failed its second check.
                    pos = buf.len() - TS_PACKET_LEN;
                }
                break;
            };

            let mut j = start;
            let mut walked = 0usize;
            while j + TS_PACKET_LEN <= buf.len() && buf[j] == TS_SYNC_BYTE {
                out.extend_from_slice(&buf[j..j + TS_PACKET_LEN]);
                j += TS_PACKET_LEN;
                walked += 1;
            }
            result.packets += walked;
            pos = j;

            if self.state == SyncState::Hunting {
                self.state = SyncState::Locked;
                result.acquired = true;
            }

            if j + TS_PACKET_LEN <= buf.len() {
                // Stopped on a full-length position that is not a sync byte.
                self.state = SyncState::Hunting;
                result.losses += 1;
                continue;
            }
            break;
        }

        result.consumed = pos;
        result
    }
}

/// First index `i >= from` with sync bytes at both `i` and `i + 188`.
pub fn find_double_sync(buf: &[u8], from: usize) -> Option<usize> {
    if buf.len() <= TS_PACKET_LEN {
        return None;
    }
    (from..buf.len() - TS_PACKET_LEN)
        .find(|&i| buf[i] == TS_SYNC_BYTE && buf[i + TS_PACKET_LEN] == TS_SYNC_BYTE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(tag: u8) -> Vec<u8> {
        let mut p = vec![tag; TS_PACKET_LEN];
        p[0] = TS_SYNC_BYTE;
        p[1] = 0x01;
        p[2] = tag;
        p
    }

    #[test]
    fn locks_after_garbage() {
        let mut buf = vec![0x12, 0x47, 0x00, 0x99, 0x47];
        let mut packets = Vec::new();
        for tag in 1..=3 {
            packets.extend(packet(tag));
        }
        buf.extend(&packets);
        buf.extend(&packet(4)[..50]);

        let mut sync = TsSync::new();
        let mut out = Vec::new();
        let ex = sync.extract(&buf, &mut out);

        assert_eq!(ex.packets, 3);
        assert!(ex.acquired);
        assert_eq!(out, packets);
        assert_eq!(ex.consumed, buf.len() - 50);
        assert_eq!(sync.state(), SyncState::Locked);
    }

    #[test]
    fn single_packet_waits_for_second_sync() {
        let buf = packet(1);
        let mut sync = TsSync::new();
        let mut out = Vec::new();
        let ex = sync.extract(&buf, &mut out);
        assert_eq!(ex.packets, 0);
        assert_eq!(ex.consumed, 0);
        assert!(out.is_empty());
        assert_eq!(sync.state(), SyncState::Hunting);
    }

    #[test]
    fn stray_sync_byte_in_payload_not_locked() {
        let mut buf = vec![0u8; 600];
        buf[10] = TS_SYNC_BYTE;
        buf[300] = TS_SYNC_BYTE;
        let mut sync = TsSync::new();
        let mut out = Vec::new();
        let ex = sync.extract(&buf, &mut out);
        assert_eq!(ex.packets, 0);
        assert!(out.is_empty());
        // Only the tail that could still pair up with future bytes is kept.
        assert_eq!(ex.consumed, 600 - TS_PACKET_LEN);
    }

    #[test]
    fn loss_then_reacquire_in_one_pass() {
        let mut buf = Vec::new();
        buf.extend(packet(1));
        buf.extend(packet(2));
        buf.extend(vec![0u8; 77]);
        buf.extend(packet(3));
        buf.extend(packet(4));
        buf.extend(&packet(5)[..10]);

        let mut sync = TsSync::new();
        let mut out = Vec::new();
        let ex = sync.extract(&buf, &mut out);

        assert_eq!(ex.packets, 4);
        assert_eq!(ex.losses, 1);
        assert_eq!(sync.state(), SyncState::Locked);
        assert_eq!(out.len(), 4 * TS_PACKET_LEN);
        assert_eq!(out[2 * TS_PACKET_LEN + 2], 3);
        assert_eq!(ex.consumed, buf.len() - 10);
    }

    #[test]
    fn trailing_garbage_marks_loss() {
        let mut buf = Vec::new();
        buf.extend(packet(1));
        buf.extend(packet(2));
        buf.extend(vec![0u8; 400]);

        let mut sync = TsSync::new();
        let mut out = Vec::new();
        let ex = sync.extract(&buf, &mut out);
        assert_eq!(ex.packets, 2);
        assert_eq!(ex.losses, 1);
        assert_eq!(sync.state(), SyncState::Hunting);
        // Garbage that can never pair up is released.
        assert_eq!(ex.consumed, buf.len() - TS_PACKET_LEN);
    }

    #[test]
    fn locked_stream_without_continuation_drops_lock() {
        let mut sync = TsSync::new();
        let mut out = Vec::new();

        let mut first = packet(1);
        first.extend(packet(2));
        first.extend(&packet(3)[..20]);
        let ex = sync.extract(&first, &mut out);
        assert_eq!(ex.packets, 2);
        assert_eq!(sync.state(), SyncState::Locked);

        // Next pass sees the retained partial packet followed by noise.
        let mut second = first[ex.consumed..].to_vec();
        second.extend(vec![0x5Au8; 300]);
        let ex = sync.extract(&second, &mut out);
        assert_eq!(ex.packets, 0);
        assert_eq!(ex.losses, 1);
        assert_eq!(sync.state(), SyncState::Hunting);
        assert_eq!(ex.consumed, second.len() - TS_PACKET_LEN);
    }

    #[test]
    fn find_double_sync_bounds() {
        assert_eq!(find_double_sync(&[TS_SYNC_BYTE; 188], 0), None);
        assert_eq!(find_double_sync(&[TS_SYNC_BYTE; 189], 0), Some(0));
        assert_eq!(find_double_sync(&[TS_SYNC_BYTE; 189], 1), None);
    }
}
