use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use lsdirs::fs::{ByteOrder, DirentDecoder, DirentLayout, Field, FieldWidth, Listing};
use std::hint::black_box;

const DT_DIR: u8 = 4;
const DT_REG: u8 = 8;

// Same shape as linux_dirent64 on a little endian machine
const LAYOUT: DirentLayout = DirentLayout {
    inode: Field::new(0, FieldWidth::U64),
    record_len: Field::new(16, FieldWidth::U16),
    entry_type: Field::new(18, FieldWidth::U8),
    name_offset: 19,
    dir_type: DT_DIR as u64,
    unknown_type: 0,
    byte_order: ByteOrder::Little,
};

fn push_record(buf: &mut Vec<u8>, inode: u64, d_type: u8, name: &[u8]) {
    let reclen = (19 + name.len() + 1).next_multiple_of(8);
    let start = buf.len();
    buf.resize(start + reclen, 0);
    let rec = &mut buf[start..];
    rec[0..8].copy_from_slice(&inode.to_le_bytes());
    rec[16..18].copy_from_slice(&u16::try_from(reclen).unwrap().to_le_bytes());
    rec[18] = d_type;
    rec[19..19 + name.len()].copy_from_slice(name);
}

/// An 8 KiB-ish buffer like one `getdents64` call returns, `dir_every` sets the mix
fn make_stream(dir_every: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8192);
    push_record(&mut buf, 1, DT_DIR, b".");
    push_record(&mut buf, 2, DT_DIR, b"..");

    let mut i = 0_u64;
    while buf.len() < 8000 {
        let name = format!("entry_{i:05}_with_some_length");
        let d_type = if i as usize % dir_every == 0 { DT_DIR } else { DT_REG };
        push_record(&mut buf, 100 + i, d_type, name.as_bytes());
        i += 1;
    }
    buf
}

fn bench_decode(c: &mut Criterion) {
    let decoder = DirentDecoder::new(LAYOUT);
    let mut group = c.benchmark_group("decode");

    for dir_every in [1_usize, 4, 32] {
        let stream = make_stream(dir_every);
        group.throughput(Throughput::Bytes(stream.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("one_in", dir_every),
            &stream,
            |b, stream| {
                b.iter(|| {
                    let mut listing = Listing::with_capacity(64);
                    let consumed = decoder.decode(black_box(stream), &mut listing);
                    black_box((consumed, listing));
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
