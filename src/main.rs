use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use ai_2048_expectimax::config::Config;
use ai_2048_expectimax::engine::{Board, Move};
use ai_2048_expectimax::expectimax::{
    evaluate_board_detailed, EvalBreakdown, Expectimax, ExpectimaxConfig, ExpectimaxParallel, MoveReport,
    SearchStats,
};
use ai_2048_expectimax::game::Game;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rand::{rngs::StdRng, SeedableRng};

#[derive(Debug, Parser)]
#[command(name = "ai-2048-expectimax", about = "2048 expectimax move search")]
struct Args {
    /// TOML file with [search] and [weights] overrides
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Search the four root directions on separate threads
    #[arg(long, global = true)]
    parallel: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Let the engine play a game from two random tiles
    Play {
        /// RNG seed for tile spawns (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Stop after this many moves
        #[arg(long)]
        steps: Option<u64>,
        /// Print the board after every move
        #[arg(long)]
        show: bool,
        /// Suppress the spinner status line
        #[arg(long)]
        quiet: bool,
    },
    /// Best move and per-direction breakdown for a board (16 row-major values)
    Hint {
        #[arg(required = true, num_args = 1..)]
        cells: Vec<String>,
    },
    /// Static evaluation of a board (16 row-major values)
    Eval {
        #[arg(required = true, num_args = 1..)]
        cells: Vec<String>,
    },
}

enum Policy {
    Seq(Expectimax),
    Par(ExpectimaxParallel),
}

impl Policy {
    fn new(cfg: ExpectimaxConfig, parallel: bool) -> Self {
        if parallel {
            Policy::Par(ExpectimaxParallel::with_config(cfg))
        } else {
            Policy::Seq(Expectimax::with_config(cfg))
        }
    }

    fn best_move(&mut self, board: Board) -> Option<Move> {
        match self {
            Policy::Seq(ex) => ex.best_move(board),
            Policy::Par(ex) => ex.best_move(board),
        }
    }

    fn report(&mut self, board: Board) -> MoveReport {
        match self {
            Policy::Seq(ex) => ex.report(board),
            Policy::Par(ex) => ex.report(board),
        }
    }

    fn last_stats(&self) -> SearchStats {
        match self {
            Policy::Seq(ex) => ex.last_stats(),
            Policy::Par(ex) => ex.last_stats(),
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match Config::from_toml(path) {
            Ok(cfg) => {
                info!("Using configuration file: {}", path.display());
                cfg
            }
            Err(e) => {
                eprintln!("Failed to load {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };
    let cfg = config.expectimax_config();

    match args.cmd {
        Cmd::Play { seed, steps, show, quiet } => {
            play(Policy::new(cfg, args.parallel), seed, steps, show, quiet);
            ExitCode::SUCCESS
        }
        Cmd::Hint { cells } => match parse_board(&cells) {
            Ok(board) => {
                let report = Policy::new(cfg, args.parallel).report(board);
                print_report(&report);
                ExitCode::SUCCESS
            }
            Err(code) => code,
        },
        Cmd::Eval { cells } => match parse_board(&cells) {
            Ok(board) => {
                print!("{board}");
                print_breakdown(&evaluate_board_detailed(&board, &cfg.weights));
                ExitCode::SUCCESS
            }
            Err(code) => code,
        },
    }
}

fn parse_board(cells: &[String]) -> Result<Board, ExitCode> {
    cells.join(" ").parse::<Board>().map_err(|e| {
        eprintln!("Invalid board: {e}");
        ExitCode::FAILURE
    })
}

fn play(mut policy: Policy, seed: Option<u64>, steps: Option<u64>, show: bool, quiet: bool) {
    let seed = seed.unwrap_or_else(rand::random);
    info!("Seed: {seed}");
    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = Game::random(&mut rng);

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        match ProgressStyle::with_template("{spinner} {elapsed_precise} | Moves: {msg}") {
            Ok(style) => pb.set_style(style.tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃")),
            Err(e) => warn!("spinner template rejected: {e}"),
        }
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };

    let start = Instant::now();
    let mut move_count: u64 = 0;
    let mut total_states: u64 = 0;
    if show {
        pb.println(game.board().to_string());
    }
    while !game.is_game_over() {
        let Some(dir) = policy.best_move(game.board()) else { break };
        game.step(dir, &mut rng);
        move_count += 1;
        total_states = total_states.saturating_add(policy.last_stats().nodes);
        if show {
            pb.println(format!("{dir}\n{}", game.board()));
        }
        let rate = move_count as f64 / start.elapsed().as_secs_f64().max(1e-6);
        pb.set_message(format!("{move_count} | moves/sec: {rate:.1} | max tile: {}", game.board().max_tile()));
        if steps.is_some_and(|limit| move_count >= limit) {
            break;
        }
    }
    pb.finish_and_clear();

    let peak_states = policy.last_stats().peak_nodes;
    println!("{}", game.board());
    println!(
        "Moves made: {}, Highest tile: {}, States considered: {}, Max states considered for a move: {}",
        move_count,
        game.board().max_tile(),
        total_states,
        peak_states
    );
}

fn print_report(report: &MoveReport) {
    print!("{}", report.board);
    println!("search depth: {}", report.depth);
    for m in &report.moves {
        if !m.legal {
            println!("{:>5}: illegal", m.dir.to_string());
            continue;
        }
        println!("{:>5}: score {:.1} (game direction {})", m.dir.to_string(), m.score, m.dir.to_game().index());
        if let Some(b) = &m.breakdown {
            print_breakdown(b);
        }
    }
    match report.best {
        Some(dir) => println!("best: {dir}"),
        None => println!("best: none (game over)"),
    }
    println!("nodes: {}, cache hits: {}", report.stats.nodes, report.stats.cache_hits);
}

fn print_breakdown(b: &EvalBreakdown) {
    println!(
        "       empty {} ({:+.1}), merges {} ({:+.1}), monotonicity {:.1} ({:+.1}), sum {:.1} ({:+.1}), total {:.1}",
        b.empty, b.empty_score, b.merges, b.merges_score, b.monotonicity, b.monotonicity_score, b.sum, b.sum_score, b.total
    );
}
