use ai_2048_expectimax::engine::{Board, Move};
use ai_2048_expectimax::expectimax::{Expectimax, ExpectimaxConfig};
use ai_2048_expectimax::game::Game;
use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;

fn corpus() -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(4242);
    let mut boards = Vec::new();
    let mut b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    boards.push(b);
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..32 {
        let dir = seq[i % seq.len()];
        let nb = b.shift(dir);
        if nb != b { b = nb.with_random_tile(&mut rng); }
        boards.push(b);
    }
    boards
}

fn bench_seq_branch_and_value(c: &mut Criterion) {
    let boards = corpus();
    let cfg = ExpectimaxConfig { max_depth: 4, ..Default::default() };
    let mut ex = Expectimax::with_config(cfg);

    c.bench_function("expectimax_seq/branch_evals", |bch| {
        bch.iter(|| {
            let mut acc = 0.0;
            for &bd in &boards {
                let branches = ex.branch_evals(bd);
                for be in branches { if be.legal { acc += be.ev; } }
            }
            black_box(acc)
        })
    });

    c.bench_function("expectimax_seq/best_move", |bch| {
        bch.iter(|| {
            let mut acc = 0usize;
            for &bd in &boards {
                let m = ex.best_move(bd);
                acc ^= m.map(|mv| mv.index()).unwrap_or(4);
            }
            black_box(acc)
        })
    });

    c.bench_function("expectimax_seq/report", |bch| {
        bch.iter(|| {
            let mut acc = 0.0;
            for &bd in &boards { acc += ex.report(bd).moves.iter().filter_map(|m| m.breakdown).map(|b| b.total).sum::<f64>(); }
            black_box(acc)
        })
    });
}

fn bench_seq_e2e(c: &mut Criterion) {
    let cfg = ExpectimaxConfig { max_depth: 4, ..Default::default() };
    let mut ex = Expectimax::with_config(cfg);
    c.bench_function("e2e_seq/32_moves", |bch| {
        bch.iter(|| {
            let mut rng = StdRng::seed_from_u64(7);
            let mut game = Game::random(&mut rng);
            let mut steps = 0;
            while steps < 32 && !game.is_game_over() {
                if let Some(dir) = ex.best_move(game.board()) { game.step(dir, &mut rng); } else { break; }
                steps += 1;
            }
            black_box((game.board(), steps))
        })
    });
}

criterion_group!(expectimax_seq, bench_seq_branch_and_value, bench_seq_e2e);
criterion_main!(expectimax_seq);
