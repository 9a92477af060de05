//! ベンチマーク
//!
//! 固定の局面集を固定深さで探索し、総ノード数と NPS を出す。
//! 探索の変更でノード数が変わったかを見る目安にもなる。

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::nnue::Network;
use crate::position::Position;
use crate::search::{SearchLimits, SearchTuneParams, SearchWorker};
use crate::tt::TranspositionTable;

/// 既定の探索深さ
pub const DEFAULT_BENCH_DEPTH: i32 = 8;

/// ベンチ用の置換表サイズ（MB）
const BENCH_HASH_MB: usize = 16;

/// ベンチ局面
pub const BENCH_FENS: [&str; 10] = [
    "r3k2r/2pb1ppp/2pp1q2/p7/1nP1B3/1P2P3/P2N1PPP/R2QK2R w KQkq a6 0 14",
    "4rrk1/2p1b1p1/p1p3q1/4p3/2P2n1p/1P1NR2P/PB3PP1/3R1QK1 b - - 2 24",
    "r3qbrk/6p1/2b2pPp/p3pP1Q/PpPpP2P/3P1B2/2PB3K/R5R1 w - - 16 42",
    "6k1/1R3p2/6p1/2Bp3p/3P2q1/P7/1P2rQ1K/5R2 b - - 4 44",
    "8/8/1p2k1p1/3p3p/1p1P1P1P/1P2PK2/8/8 w - - 3 54",
    "7r/2p3k1/1p1p1qp1/1P1Bp3/p1P2r1P/P7/4R3/Q4RK1 w - - 0 36",
    "r1bq1rk1/pp2b1pp/n1pp1n2/3P1p2/2P1p3/2N1P2N/PP2BPPP/R1BQ1RK1 b - - 2 10",
    "3r3k/2r4p/1p1b3q/p4P2/P2Pp3/1B2P3/3BQ1RP/6K1 w - - 3 87",
    "2r4r/1p4k1/1Pnp4/3Qb1pq/8/4BpPp/5P2/2RR1BK1 w - - 0 42",
    "4q1bk/6b1/7p/p1p4p/PNPpP2P/KN4P1/3Q4/4R3 b - - 0 37",
];

/// ベンチ結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchReport {
    pub nodes: u64,
    pub elapsed_ms: u64,
    pub nps: u64,
}

/// 全局面を `depth` で探索する
///
/// 局面ごとに置換表と history を消すので、同じ深さなら毎回同じノード数になる。
pub fn bench(network: Arc<Network>, tune_params: SearchTuneParams, depth: i32) -> Result<BenchReport> {
    let mut nodes = 0;
    let start = Instant::now();

    for (i, fen) in BENCH_FENS.iter().enumerate() {
        let pos = Position::from_fen(fen).with_context(|| format!("bench position {i}: {fen}"))?;
        let tt = Arc::new(TranspositionTable::new(BENCH_HASH_MB));
        let mut worker = SearchWorker::new(tt, Arc::clone(&network), tune_params);
        let result = worker.search(&pos, SearchLimits::depth(depth), |_| {});
        log::debug!(
            "bench {}/{}: bestmove {} nodes {}",
            i + 1,
            BENCH_FENS.len(),
            result.best_move.to_uci(),
            result.nodes
        );
        nodes += result.nodes;
    }

    let elapsed_ms = start.elapsed().as_millis() as u64;
    Ok(BenchReport {
        nodes,
        elapsed_ms,
        nps: nodes * 1000 / elapsed_ms.max(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bench_fens_parse() {
        for fen in BENCH_FENS {
            assert!(Position::from_fen(fen).is_ok(), "{fen}");
        }
    }

    #[test]
    fn test_bench_is_deterministic() {
        let net = Arc::new(Network::random(11));
        let a = bench(Arc::clone(&net), SearchTuneParams::default(), 2).unwrap();
        let b = bench(net, SearchTuneParams::default(), 2).unwrap();
        assert!(a.nodes > 0);
        assert_eq!(a.nodes, b.nodes);
    }
}
