use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use rchess_core::Position;
use rchess_core::movegen::{MoveList, generate_all, generate_captures};
use rchess_core::nnue::{AccumulatorStack, Network};
use rchess_core::perft::perft;

const POSITIONS: [(&str, &str); 3] = [
    ("startpos", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
    ("kiwipete", "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"),
    ("endgame", "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1"),
];

fn bench_generate_all(c: &mut Criterion) {
    for (name, fen) in POSITIONS {
        let pos = Position::from_fen(fen).expect("valid FEN");
        c.bench_function(&format!("generate_all_{name}"), |b| {
            b.iter(|| {
                let mut list = MoveList::new();
                generate_all(black_box(&pos), &mut list);
                list.len()
            });
        });
    }
}

fn bench_generate_captures(c: &mut Criterion) {
    let pos = Position::from_fen(POSITIONS[1].1).expect("valid FEN");
    c.bench_function("generate_captures_kiwipete", |b| {
        b.iter(|| {
            let mut list = MoveList::new();
            generate_captures(black_box(&pos), &mut list);
            list.len()
        });
    });
}

fn bench_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");
    group.sample_size(10);
    group.bench_function("startpos_d4", |b| {
        let mut pos = Position::startpos();
        b.iter(|| perft(black_box(&mut pos), 4));
    });
    group.bench_function("kiwipete_d3", |b| {
        let mut pos = Position::from_fen(POSITIONS[1].1).expect("valid FEN");
        b.iter(|| perft(black_box(&mut pos), 3));
    });
    group.finish();
}

fn bench_nnue_refresh(c: &mut Criterion) {
    let net = Network::random(1);
    let pos = Position::from_fen(POSITIONS[1].1).expect("valid FEN");
    let mut stack = AccumulatorStack::new();
    c.bench_function("nnue_refresh_evaluate", |b| {
        b.iter(|| {
            stack.refresh(&net, black_box(&pos));
            stack.evaluate(&net, &pos)
        });
    });
}

criterion_group!(
    benches,
    bench_generate_all,
    bench_generate_captures,
    bench_perft,
    bench_nnue_refresh
);
criterion_main!(benches);
