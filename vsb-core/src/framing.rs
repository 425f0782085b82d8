//! ATSC A/53 framing constants and small helpers shared by every stage.

/// Symbols per data segment.
pub const SEGMENT_SYMBOLS: usize = 832;
/// Segment sync symbols at the start of every segment.
pub const SEGMENT_SYNC_SYMBOLS: usize = 4;
/// Trellis-coded data symbols per segment.
pub const SEGMENT_DATA_SYMBOLS: usize = SEGMENT_SYMBOLS - SEGMENT_SYNC_SYMBOLS;
/// Segments per trellis block (one full rotation of the 12 encoders).
pub const BLOCK_SEGMENTS: usize = 12;
/// Symbols per trellis block.
pub const BLOCK_SYMBOLS: usize = BLOCK_SEGMENTS * SEGMENT_SYMBOLS;
/// Interleaved trellis encoders.
pub const ENCODERS: usize = 12;

/// Reed-Solomon codeword length in bytes.
pub const CODEWORD_LEN: usize = 207;
/// Systematic payload length in bytes.
pub const PAYLOAD_LEN: usize = 187;
/// Parity bytes per codeword.
pub const PARITY_LEN: usize = CODEWORD_LEN - PAYLOAD_LEN;
/// Correctable byte errors per codeword.
pub const MAX_CORRECTABLE: usize = PARITY_LEN / 2;
/// Coded bytes produced by one trellis block (one codeword per encoder).
pub const BLOCK_CODED_BYTES: usize = ENCODERS * CODEWORD_LEN;

/// MPEG-2 transport stream packet length.
pub const TS_PACKET_LEN: usize = 188;
/// MPEG-2 transport stream sync byte.
pub const TS_SYNC_BYTE: u8 = 0x47;
/// PID reserved for null (stuffing) packets.
pub const NULL_PID: u16 = 0x1FFF;

/// Binary segment sync pattern transmitted in place of data at the start of each segment.
pub const SEGMENT_SYNC: [f32; SEGMENT_SYNC_SYMBOLS] = [5.0, -5.0, -5.0, 5.0];

const _: () = assert!(SEGMENT_DATA_SYMBOLS % ENCODERS == 0);
const _: () = assert!(BLOCK_SYMBOLS - BLOCK_SEGMENTS * SEGMENT_SYNC_SYMBOLS == CODEWORD_LEN * 4 * ENCODERS);

/// Whether `index` (relative to the start of a block) falls on a segment sync symbol.
pub fn is_segment_sync(index: usize) -> bool {
    index % SEGMENT_SYMBOLS < SEGMENT_SYNC_SYMBOLS
}

/// Build a null packet: PID 0x1FFF, payload only, all-ones stuffing.
pub fn null_packet(continuity: u8) -> [u8; TS_PACKET_LEN] {
    let mut packet = [0xFFu8; TS_PACKET_LEN];
    packet[0] = TS_SYNC_BYTE;
    packet[1] = (NULL_PID >> 8) as u8;
    packet[2] = (NULL_PID & 0xFF) as u8;
    packet[3] = 0x10 | (continuity & 0x0F);
    packet
}

/// The 13-bit PID of a transport packet, or `None` if `packet` is not sync-aligned.
pub fn packet_pid(packet: &[u8]) -> Option<u16> {
    if packet.len() < 4 || packet[0] != TS_SYNC_BYTE {
        return None;
    }
    Some((((packet[1] & 0x1F) as u16) << 8) | packet[2] as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_geometry() {
        assert_eq!(BLOCK_SYMBOLS, 9984);
        assert_eq!(SEGMENT_DATA_SYMBOLS, 828);
        assert_eq!(BLOCK_CODED_BYTES, 2484);
        assert_eq!(MAX_CORRECTABLE, 10);
    }

    #[test]
    fn sync_positions() {
        assert!(is_segment_sync(0));
        assert!(is_segment_sync(3));
        assert!(!is_segment_sync(4));
        assert!(is_segment_sync(SEGMENT_SYMBOLS + 2));
        assert!(!is_segment_sync(SEGMENT_SYMBOLS - 1));
    }

    #[test]
    fn null_packet_header() {
        let packet = null_packet(0x13);
        assert_eq!(packet_pid(&packet), Some(NULL_PID));
        assert_eq!(packet[3], 0x13);
        assert!(packet[4..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn pid_requires_sync() {
        assert_eq!(packet_pid(&[0x00, 0x00, 0x11, 0x10]), None);
        assert_eq!(packet_pid(&[0x47, 0x40, 0x00, 0x10]), Some(0));
    }
}
