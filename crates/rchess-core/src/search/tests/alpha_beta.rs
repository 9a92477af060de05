//! alpha_beta モジュールのテスト

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use crate::nnue::Network;
use crate::position::Position;
use crate::search::alpha_beta::{SearchContext, SearchState, SearchWorker, reduction, search_node};
use crate::search::tune_params::SearchTuneParams;
use crate::search::types::{NodeType, SearchLimits};
use crate::tt::TranspositionTable;
use crate::types::{Move, Value};

fn worker() -> SearchWorker {
    SearchWorker::new(
        Arc::new(TranspositionTable::new(4)),
        Arc::new(Network::random(7)),
        SearchTuneParams::default(),
    )
}

fn play(pos: &mut Position, moves: &[&str]) {
    for s in moves {
        let mv = pos.parse_uci_move(s).unwrap();
        assert!(pos.make_move(mv), "illegal move {s}");
    }
}

#[test]
fn test_reduction_values() {
    let tune = SearchTuneParams::default();
    // 0.77 + ln(1) * ln(1) / 2.16
    assert_eq!(reduction(&tune, 1, 1), 0);
    // 0.77 + ln(10) * ln(10) / 2.16 = 3.22...
    assert_eq!(reduction(&tune, 10, 10), 3);
    assert!(reduction(&tune, 20, 40) >= reduction(&tune, 10, 10));
}

#[test]
fn test_reduction_extremes_no_overflow() {
    let tune = SearchTuneParams::default();
    assert_eq!(reduction(&tune, 0, 0), 0);
    let r = reduction(&tune, 1000, 1000);
    assert!(r > 0 && r < 64, "unexpected reduction {r}");
}

#[test]
fn test_depth_one_returns_legal_move() {
    let mut w = worker();
    let mut pos = Position::startpos();
    let mut infos = Vec::new();
    let result = w.search(&pos, SearchLimits::depth(1), |info| infos.push(info.clone()));

    assert!(pos.legal_moves().contains(&result.best_move));
    assert_eq!(result.depth, 1);
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].pv.first(), Some(&result.best_move));
    assert!(result.nodes > 0);
}

#[test]
fn test_finds_mate_in_one() {
    let mut w = worker();
    let pos = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
    let result = w.search(&pos, SearchLimits::depth(3), |_| {});

    assert_eq!(result.best_move.to_uci(), "a1a8");
    assert_eq!(result.score_cp, Value::mate_in(1).raw());
    assert_eq!(Value::new(result.score_cp).mate_moves(), Some(1));
}

#[test]
fn test_mated_side_reports_loss() {
    // 黒は Kg8 しかなく Ra8# で詰む
    let mut w = worker();
    let pos = Position::from_fen("7k/8/6K1/8/8/8/8/R7 b - - 0 1").unwrap();
    let result = w.search(&pos, SearchLimits::depth(4), |_| {});
    assert_eq!(result.best_move.to_uci(), "h8g8");
    assert_eq!(result.score_cp, Value::mated_in(2).raw());
}

#[test]
fn test_finds_quiet_mate_in_two() {
    // 1.Kg6 Kg8 2.Ra8# (または 1.Kf7 Kh7 2.Rh1#)。詰め手は PV 上の静かな王手
    let mut w = worker();
    let pos = Position::from_fen("7k/8/5K2/8/8/8/8/R7 w - - 0 1").unwrap();
    let result = w.search(&pos, SearchLimits::depth(5), |_| {});
    assert_eq!(result.score_cp, Value::mate_in(3).raw());
    assert!(pos.clone().legal_moves().contains(&result.best_move));
}

#[test]
fn test_single_legal_move() {
    let mut w = worker();
    let pos = Position::from_fen("7k/8/8/8/8/8/1r6/K7 w - - 0 1").unwrap();
    let result = w.search(&pos, SearchLimits::depth(4), |_| {});
    assert_eq!(result.best_move.to_uci(), "a1b2");
    // 取った後は K 対 K で引き分け
    assert_eq!(result.score_cp, 0);
}

#[test]
fn test_no_legal_move_returns_none() {
    let mut w = worker();
    // ステイルメイト
    let pos = Position::from_fen("k7/8/1Q6/8/8/8/8/7K b - - 0 1").unwrap();
    let result = w.search(&pos, SearchLimits::depth(2), |_| {});
    assert_eq!(result.best_move, Move::NONE);
    assert_eq!(result.score_cp, 0);
    assert!(result.pv.is_empty());
}

#[test]
fn test_fifty_move_rule_scores_zero() {
    // どの手を指しても 50 手ルールに達する
    let mut w = worker();
    let pos = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 99 80").unwrap();
    let result = w.search(&pos, SearchLimits::depth(3), |_| {});
    assert_eq!(result.score_cp, 0);
    assert!(result.best_move.is_some());
}

fn search_at_ply_one(pos: &mut Position) -> Value {
    let tt = TranspositionTable::new(1);
    let net = Network::random(3);
    let tune = SearchTuneParams::default();
    let stop = AtomicBool::new(false);
    let ctx = SearchContext {
        tt: &tt,
        network: &net,
        tune_params: &tune,
        stop: &stop,
        start: Instant::now(),
        hard_ms: None,
        node_limit: None,
    };
    let mut st = SearchState::new();
    st.nnue_stack.refresh(&net, pos);
    st.root_depth = 4;
    search_node::<{ NodeType::NonPV as u8 }>(
        &mut st,
        &ctx,
        pos,
        4,
        -Value::INFINITE,
        Value::INFINITE,
        1,
        false,
    )
}

#[test]
fn test_threefold_repetition_is_draw_inside_tree() {
    let mut pos = Position::startpos();
    play(&mut pos, &["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"]);
    assert!(pos.is_draw());
    assert_eq!(search_at_ply_one(&mut pos), Value::DRAW);
}

#[test]
fn test_halfmove_clock_hundred_is_draw_inside_tree() {
    let mut pos = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 100 80").unwrap();
    assert_eq!(search_at_ply_one(&mut pos), Value::DRAW);
}

#[test]
fn test_stop_before_search_falls_back_to_legal_move() {
    let mut w = worker();
    w.stop();
    let mut pos = Position::startpos();
    let mut called = false;
    let result = w.search(&pos, SearchLimits::default(), |_| called = true);

    assert!(!called);
    assert_eq!(result.depth, 0);
    assert!(pos.legal_moves().contains(&result.best_move));

    // 停止フラグを下ろせば普通に探索できる
    w.reset_stop();
    let result = w.search(&pos, SearchLimits::depth(2), |_| {});
    assert_eq!(result.depth, 2);
}

#[test]
fn test_stop_handle_is_shared() {
    let w = worker();
    let handle = w.stop_handle();
    handle.store(true, std::sync::atomic::Ordering::Relaxed);
    assert!(w.stop_handle().load(std::sync::atomic::Ordering::Relaxed));
}

#[test]
fn test_node_limit_stops_search() {
    let mut w = worker();
    let pos = Position::startpos();
    let limits = SearchLimits { nodes: Some(5_000), ..Default::default() };
    let result = w.search(&pos, limits, |_| {});
    assert!(result.best_move.is_some());
    // 中断チェックは 2048 ノードごと
    assert!(result.nodes < 5_000 + 2 * 2048, "nodes {}", result.nodes);
}

#[test]
fn test_iterations_report_increasing_depth() {
    let mut w = worker();
    let pos = Position::from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3")
        .unwrap();
    let mut depths = Vec::new();
    let result = w.search(&pos, SearchLimits::depth(5), |info| depths.push(info.depth));
    assert_eq!(depths, vec![1, 2, 3, 4, 5]);
    assert_eq!(result.depth, 5);
    assert!(!result.pv.is_empty());
    assert_eq!(result.pv[0], result.best_move);
}

#[test]
fn test_history_survives_between_searches() {
    let mut w = worker();
    let pos = Position::startpos();
    let first = w.search(&pos, SearchLimits::depth(4), |_| {});
    let second = w.search(&pos, SearchLimits::depth(4), |_| {});
    assert!(first.best_move.is_some());
    assert!(second.best_move.is_some());
    w.clear_history();
}

#[test]
fn test_resize_tt_in_place_and_when_shared() {
    let mut w = worker();
    let tt = Arc::as_ptr(w.tt());
    w.resize_tt(8);
    assert_eq!(Arc::as_ptr(w.tt()), tt);
    assert_eq!(w.tt().bucket_count(), TranspositionTable::new(8).bucket_count());

    // 共有されているときは差し替える
    let shared = Arc::clone(w.tt());
    w.resize_tt(2);
    assert!(!Arc::ptr_eq(&shared, w.tt()));
    assert_eq!(w.tt().bucket_count(), TranspositionTable::new(2).bucket_count());
}
