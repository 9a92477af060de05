mod io;
mod options;
mod search;
mod state;

use std::io::{self as stdio, BufRead};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rchess_core::Position;
use rchess_core::bench::{DEFAULT_BENCH_DEPTH, bench};
use rchess_core::bitboard::slider_table;
use rchess_core::perft::perft_divide;
use rchess_core::search::SearchTuneParams;

use io::uci_println;
use options::{handle_setoption, send_id_and_options};
use search::{handle_go, handle_position};
use state::{EngineState, UciOptions, install_slider_table, load_network};

#[derive(Parser, Debug)]
#[command(author, version, about = "UCI chess engine with NNUE evaluation")]
struct Cli {
    /// transposition table size in MB
    #[arg(long, default_value_t = 16)]
    hash: usize,

    /// NNUE network file (random weights when omitted)
    #[arg(long)]
    eval_file: Option<PathBuf>,

    /// JSON file with search tuning parameters
    #[arg(long)]
    tune_file: Option<PathBuf>,

    /// precomputed sliding-attack table (generated at startup when omitted)
    #[arg(long)]
    slider_table: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// count leaf nodes of the legal move tree
    Perft {
        depth: u32,

        /// start position (defaults to the initial position)
        #[arg(long)]
        fen: Option<String>,
    },
    /// search a fixed set of positions and report nodes and nps
    Bench {
        #[arg(long, default_value_t = DEFAULT_BENCH_DEPTH)]
        depth: i32,
    },
    /// write the sliding-attack table as little-endian u64 values
    WriteSliderTable { path: PathBuf },
}

fn load_tune_params(path: Option<&PathBuf>) -> Result<SearchTuneParams> {
    let Some(path) = path else {
        return Ok(SearchTuneParams::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read tune file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid tune file {}", path.display()))
}

fn run_perft(depth: u32, fen: Option<&str>) -> Result<()> {
    let mut pos = match fen {
        Some(f) => Position::from_fen(f).with_context(|| format!("invalid FEN: {f}"))?,
        None => Position::startpos(),
    };
    let start = std::time::Instant::now();
    let divide = perft_divide(&mut pos, depth);
    let total: u64 = divide.iter().map(|(_, n)| n).sum();
    for (mv, nodes) in &divide {
        println!("{}: {nodes}", mv.to_uci());
    }
    let ms = start.elapsed().as_millis() as u64;
    println!();
    println!("Nodes searched: {total}");
    println!("time: {ms}ms nps: {}", total * 1000 / ms.max(1));
    Ok(())
}

fn run_uci(cli: &Cli) -> Result<()> {
    let eval_file = cli.eval_file.as_ref().map(|p| p.display().to_string());
    let network = load_network(eval_file.as_deref())?;
    let tune_params = load_tune_params(cli.tune_file.as_ref())?;

    let opts = UciOptions {
        hash_mb: cli.hash,
        eval_file,
    };
    let mut state = EngineState::new(opts, network, tune_params);

    let stdin = stdio::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        let cmd = line.trim();
        if cmd.is_empty() {
            continue;
        }

        match cmd.split_whitespace().next().unwrap_or("") {
            "uci" => {
                send_id_and_options(&state);
                uci_println("uciok");
            }
            "isready" => uci_println("readyok"),
            "ucinewgame" => {
                state.finish_search();
                if let Some(worker) = state.worker.as_mut() {
                    worker.clear_history();
                    worker.tt().clear();
                }
            }
            "setoption" => handle_setoption(cmd, &mut state),
            "position" => handle_position(cmd, &mut state),
            "go" => handle_go(cmd, &mut state)?,
            "stop" => state.finish_search(),
            "quit" => {
                state.finish_search();
                break;
            }
            _ => log::info!("ignoring command: {cmd}"),
        }
    }

    state.finish_search();
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    // 読み込みに失敗したら起動しない
    if let Some(path) = &cli.slider_table {
        install_slider_table(path)?;
    }

    match &cli.command {
        Some(Command::Perft { depth, fen }) => run_perft(*depth, fen.as_deref()),
        Some(Command::Bench { depth }) => {
            let eval_file = cli.eval_file.as_ref().map(|p| p.display().to_string());
            let network = load_network(eval_file.as_deref())?;
            let tune_params = load_tune_params(cli.tune_file.as_ref())?;
            let report = bench(network, tune_params, *depth)?;
            println!("Nodes searched: {}", report.nodes);
            println!("nps: {}", report.nps);
            println!("benchok");
            Ok(())
        }
        Some(Command::WriteSliderTable { path }) => {
            std::fs::write(path, slider_table().to_bytes())
                .with_context(|| format!("failed to write {}", path.display()))
        }
        None => run_uci(&cli),
    }
}
