use criterion::{Criterion, black_box, criterion_group, criterion_main};

use vsb_core::framing::{BLOCK_CODED_BYTES, PAYLOAD_LEN, TS_PACKET_LEN, TS_SYNC_BYTE};
use vsb_core::trellis::{TrellisDecoderBank, TrellisEncoderBank};
use vsb_core::{ReedSolomon, StreamDecoder, VsbConfig, mux};

fn make_transport_stream(count: usize) -> Vec<u8> {
    let mut ts = Vec::with_capacity(count * TS_PACKET_LEN);
    for n in 0..count {
        ts.extend([TS_SYNC_BYTE, 0x01, 0x00, 0x10 | (n as u8 & 0x0F)]);
        ts.extend((0..TS_PACKET_LEN - 4).map(|i| (n * 13 + i) as u8));
    }
    ts
}

fn bench_rs_decode(c: &mut Criterion) {
    let rs = ReedSolomon::new();
    let payload: [u8; PAYLOAD_LEN] = std::array::from_fn(|i| (i * 37) as u8);
    let clean = rs.encode(&payload);

    c.bench_function("rs_decode_clean", |b| {
        b.iter(|| rs.decode(black_box(&clean)).unwrap());
    });

    let mut damaged = clean;
    for k in 0..10 {
        damaged[k * 19] ^= 0x5A;
    }
    c.bench_function("rs_decode_10_errors", |b| {
        b.iter(|| rs.decode(black_box(&damaged)).unwrap());
    });
}

fn bench_trellis_block(c: &mut Criterion) {
    let table = mux::shared();
    let coded: Vec<u8> = (0..BLOCK_CODED_BYTES).map(|i| (i * 29) as u8).collect();
    let block = TrellisEncoderBank::new().encode_block(&coded, table);

    for depth in [0usize, 32] {
        let mut bank = TrellisDecoderBank::new(depth);
        let mut out = vec![0u8; BLOCK_CODED_BYTES];
        c.bench_function(&format!("trellis_block_traceback_{depth}"), |b| {
            b.iter(|| {
                bank.decode_block(black_box(&block), table, &mut out);
                black_box(&out);
            });
        });
    }
}

fn bench_stream_decode(c: &mut Criterion) {
    let config = VsbConfig::default();
    // About 100 blocks of symbols.
    let symbols = vsb_core::encode(&make_transport_stream(1150), &config).unwrap();

    c.bench_function("stream_decode_4096_chunks", |b| {
        b.iter(|| {
            let mut decoder = StreamDecoder::new(&config).unwrap();
            let mut output = Vec::new();
            for chunk in symbols.chunks(4096) {
                output.extend(decoder.process_symbols(black_box(chunk)));
            }
            black_box(output);
        });
    });
}

fn bench_stream_encode(c: &mut Criterion) {
    let config = VsbConfig::default();
    let ts = make_transport_stream(1150);

    c.bench_function("stream_encode", |b| {
        b.iter(|| black_box(vsb_core::encode(black_box(&ts), &config).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_rs_decode,
    bench_trellis_block,
    bench_stream_decode,
    bench_stream_encode,
);

criterion_main!(benches);
