use ai_2048_expectimax::engine::{Board, Move};
use ai_2048_expectimax::expectimax::{evaluate_board, evaluate_board_detailed, HeuristicWeights};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;

fn corpus() -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(1337);
    let mut boards = Vec::new();
    boards.push(Board::EMPTY);
    let mut b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    boards.push(b);
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..24 {
        let dir = seq[i % seq.len()];
        let nb = b.shift(dir);
        if nb != b { b = nb.with_random_tile(&mut rng); }
        boards.push(b);
    }
    boards
}

fn bench_heuristic(c: &mut Criterion) {
    let boards = corpus();
    let weights = HeuristicWeights::default();
    c.bench_function("heuristic/value", |bch| {
        bch.iter(|| {
            let mut acc = 0f64;
            for bd in &boards {
                let v = evaluate_board(bd, &weights);
                acc = acc.mul_add(1.000_000_1, v);
            }
            black_box(acc)
        })
    });
    c.bench_function("heuristic/detailed", |bch| {
        bch.iter(|| {
            let mut acc = 0u32;
            for bd in &boards { acc = acc.wrapping_add(evaluate_board_detailed(bd, &weights).merges); }
            black_box(acc)
        })
    });
}

fn bench_shift(c: &mut Criterion) {
    let boards = corpus();
    c.bench_function("shift/all_directions", |bch| {
        bch.iter(|| {
            let mut acc = 0usize;
            for &bd in &boards {
                for dir in Move::ALL { acc += bd.shift(dir).count_empty(); }
            }
            black_box(acc)
        })
    });
}

criterion_group!(heuristic, bench_heuristic, bench_shift);
criterion_main!(heuristic);
