//! Benchmark for game encoding and decoding.
//!
//! Run with: cargo bench --package fancade_codec --bench codec_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use fancade_codec::{ByteReader, ByteWriter, CodecConfig, Game, CURRENT_VERSION};
use fancade_core::{Int3, Prefab, Voxel, Voxels};

/// A game with meshed blocks placed densely in a few large levels.
fn dense_game() -> Game {
    let mut game = Game::new("Bench");
    let mut voxels = Voxels::new();
    for i in 0..8 {
        voxels.set(i, i, i, Voxel::solid(i as u8 + 1));
    }
    let blocks: Vec<u16> = (0..32)
        .map(|i| game.prefabs.add_prefab(Prefab::single(format!("Block {i}"), Some(voxels.clone()))).unwrap())
        .collect();

    for level in 0..4 {
        let host = game.prefabs.add_prefab(Prefab::single(format!("Level {level}"), None)).unwrap();
        for z in 0..64 {
            for x in 0..64 {
                let placed = blocks[(x + z) as usize % blocks.len()];
                game.prefabs.place_prefab(host, Int3::new(x, 0, z), placed, false, None).unwrap();
            }
        }
    }
    game
}

fn benchmark_raw(c: &mut Criterion) {
    let game = dense_game();
    let mut writer = ByteWriter::new();
    game.write(&mut writer, CURRENT_VERSION).unwrap();
    let bytes = writer.into_inner();

    let mut group = c.benchmark_group("game_raw");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("write", |b| {
        b.iter(|| {
            let mut writer = ByteWriter::with_capacity(bytes.len());
            game.write(&mut writer, CURRENT_VERSION).unwrap();
            black_box(writer)
        });
    });

    group.bench_function("read", |b| {
        b.iter(|| black_box(Game::read(&mut ByteReader::new(&bytes), true).unwrap()));
    });

    group.finish();
}

fn benchmark_compressed(c: &mut Criterion) {
    let game = dense_game();
    let config = CodecConfig::default();
    let packed = game.to_bytes(&config).unwrap();

    let mut group = c.benchmark_group("game_compressed");
    group.bench_function("save", |b| b.iter(|| black_box(game.to_bytes(&config).unwrap())));
    group.bench_function("load", |b| b.iter(|| black_box(Game::from_bytes(&packed, &config).unwrap())));
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = benchmark_raw,
              benchmark_compressed
}

criterion_main!(benches);
