//! Benchmarks for the placement-tag decoder.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use stagehand::tag::{TagCursor, TagKind, decode_place_tag};

/// MSB-first bit packer mirroring the on-disk layout.
struct Enc {
    out: Vec<u8>,
    acc: u8,
    filled: u32,
}

impl Enc {
    fn new() -> Self {
        Self {
            out: Vec::new(),
            acc: 0,
            filled: 0,
        }
    }

    fn bits(&mut self, value: u32, n: u32) {
        for i in (0..n).rev() {
            self.acc = (self.acc << 1) | ((value >> i) & 1) as u8;
            self.filled += 1;
            if self.filled == 8 {
                self.out.push(self.acc);
                self.acc = 0;
                self.filled = 0;
            }
        }
    }

    fn align(&mut self) {
        if self.filled > 0 {
            self.out.push(self.acc << (8 - self.filled));
            self.acc = 0;
            self.filled = 0;
        }
    }

    fn u16(&mut self, v: u16) {
        self.align();
        self.out.extend_from_slice(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.align();
        self.out.extend_from_slice(&v.to_le_bytes());
    }

    fn bytes(&mut self, b: &[u8]) {
        self.align();
        self.out.extend_from_slice(b);
    }

    fn finish(mut self) -> Vec<u8> {
        self.align();
        self.out
    }
}

/// Move at a depth carrying only a translate matrix.
fn minimal_move_tag() -> Vec<u8> {
    let mut e = Enc::new();
    e.bits(0b0000_0101, 8); // has-matrix | move
    e.u16(12); // depth
    e.bits(0, 1); // matrix: no scale
    e.bits(0, 1); // no rotate
    e.bits(12, 5);
    e.bits(200, 12);
    e.bits(400, 12);
    e.finish()
}

/// Place with matrix, color transform, ratio, and a name.
fn full_place_tag() -> Vec<u8> {
    let mut e = Enc::new();
    e.bits(0b0011_1110, 8); // name | ratio | cxform | matrix | character
    e.u16(3); // depth
    e.u16(42); // character id
    e.bits(1, 1); // matrix: has scale
    e.bits(20, 5);
    e.bits(0x0000_8000, 20);
    e.bits(0x0000_8000, 20);
    e.bits(0, 1); // no rotate
    e.bits(10, 5);
    e.bits(100, 10);
    e.bits(100, 10);
    e.align();
    e.bits(1, 1); // cxform: has add
    e.bits(1, 1); // has mult
    e.bits(9, 4);
    for _ in 0..8 {
        e.bits(128, 9);
    }
    e.u16(500); // ratio
    e.bytes(b"instance_name\0");
    e.finish()
}

/// Place registering a three-kind event table.
fn place_with_events_tag() -> Vec<u8> {
    let mut e = Enc::new();
    e.bits(0b1000_0010, 8); // has-actions | character
    e.u16(7); // depth
    e.u16(9); // character id
    e.u16(0); // reserved
    let flags = (1 << 4) | (1 << 5) | (1 << 10);
    e.u32(flags); // all-events word
    e.u32(flags);
    e.u32(64);
    e.bytes(&[0x96; 64]);
    e.u32(0); // terminator
    e.finish()
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_place_tag");

    let cases = [
        ("minimal_move", minimal_move_tag()),
        ("full_place", full_place_tag()),
        ("place_with_events", place_with_events_tag()),
    ];

    for (name, bytes) in cases {
        let data: std::sync::Arc<[u8]> = bytes.into();
        group.bench_with_input(BenchmarkId::from_parameter(name), &data, |b, data| {
            b.iter(|| {
                let mut cursor = TagCursor::new(std::sync::Arc::clone(data), 0, data.len());
                decode_place_tag(black_box(&mut cursor), TagKind::PlaceObject2, 6).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
