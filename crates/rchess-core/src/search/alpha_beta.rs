//! αβ探索（PVS）と反復深化
//!
//! 探索本体は `SearchState`（可変状態）と `SearchContext`（読み取り専用の共有物）を
//! 引数に取る関数群として書く。`SearchWorker` はそれらを所有し、反復深化を回す。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::Instant;

use crate::nnue::{AccumulatorStack, Network};
use crate::position::Position;
use crate::tt::{SCORE_NONE_TT, TranspositionTable, score_from_tt, score_to_tt};
use crate::types::{Bound, Depth, MAX_MOVES, MAX_PLY, Move, Piece, Square, Value};

use super::history::{BUTTERFLY_MAX, HistoryTables, stat_bonus};
use super::movepicker::{MovePicker, is_capture_stage};
use super::pruning::{
    QuietPruneContext, QuietPruneOutcome, iir_applies, quiet_move_pruning, quiet_see_threshold,
    try_null_move_pruning, try_razoring, try_reverse_futility,
};
use super::qsearch::qsearch;
use super::search_helpers::{check_abort, do_move, nnue_evaluate, undo_move, update_pv};
#[cfg(feature = "search-stats")]
use super::stats::SearchStats;
use super::stats::{inc_stat, inc_stat_by_depth};
use super::tune_params::SearchTuneParams;
use super::types::{NodeType, SearchInfo, SearchLimits, SearchResult, StackArray, new_stack_array};

// =============================================================================
// 定数
// =============================================================================

/// 反復深化の最大深さ
pub const MAX_DEPTH: Depth = 64;

/// この深さからアスピレーションウィンドウを使う
const ASPIRATION_MIN_DEPTH: Depth = 4;

/// アスピレーションウィンドウの初期幅
const ASPIRATION_DELTA: i32 = 12;

/// 置換表カットを許す50手ルールカウンタの上限
const TT_CUT_HALFMOVE_LIMIT: u32 = 90;

/// 記録する quiet 手の最大数（history の減点用）
const MAX_QUIETS_TRIED: usize = 64;

/// history がこれを下回る手は LMR を深くする
const BAD_HISTORY: i32 = -BUTTERFLY_MAX / 4;

/// `ln(i)` のテーブル（LMR 用）
static LOG_TABLE: LazyLock<[f64; MAX_MOVES]> = LazyLock::new(|| {
    let mut table = [0.0; MAX_MOVES];
    for (i, v) in table.iter_mut().enumerate().skip(1) {
        *v = (i as f64).ln();
    }
    table
});

/// LMR の基本削減量
///
/// `lmr_base + ln(depth) * ln(move_count) / lmr_divisor`
#[inline]
pub(super) fn reduction(tune: &SearchTuneParams, depth: Depth, move_count: i32) -> Depth {
    let d = (depth.max(1) as usize).min(MAX_MOVES - 1);
    let m = (move_count.max(1) as usize).min(MAX_MOVES - 1);
    (tune.lmr_base() + LOG_TABLE[d] * LOG_TABLE[m] / tune.lmr_divisor()) as Depth
}

// =============================================================================
// SearchContext / SearchState
// =============================================================================

/// 探索中に変化しない共有物
pub(super) struct SearchContext<'a> {
    pub tt: &'a TranspositionTable,
    pub network: &'a Network,
    pub tune_params: &'a SearchTuneParams,
    pub stop: &'a AtomicBool,
    pub start: Instant,
    /// 探索を中断する経過時間（ms）
    pub hard_ms: Option<u64>,
    pub node_limit: Option<u64>,
}

impl SearchContext<'_> {
    #[inline]
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// 探索中に変化する状態
pub(super) struct SearchState {
    pub nodes: u64,
    pub sel_depth: i32,
    pub root_depth: Depth,
    pub stack: StackArray,
    pub history: Box<HistoryTables>,
    pub nnue_stack: AccumulatorStack,
    /// 中断フラグ（立ったら以降の結果は使わない）
    pub abort: bool,
    /// 次の中断チェックまでの残りノード数
    pub calls_cnt: i32,
    #[cfg(feature = "search-stats")]
    pub stats: SearchStats,
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            nodes: 0,
            sel_depth: 0,
            root_depth: 0,
            stack: new_stack_array(),
            history: HistoryTables::new_boxed(),
            nnue_stack: AccumulatorStack::new(),
            abort: false,
            calls_cnt: 0,
            #[cfg(feature = "search-stats")]
            stats: SearchStats::default(),
        }
    }

    /// `go` ごとの初期化（history は残す）
    fn prepare(&mut self, network: &Network, pos: &Position) {
        self.nodes = 0;
        self.sel_depth = 0;
        self.root_depth = 0;
        self.abort = false;
        self.calls_cnt = 0;
        self.nnue_stack.refresh(network, pos);
        #[cfg(feature = "search-stats")]
        self.stats.reset();
    }
}

// =============================================================================
// αβ探索
// =============================================================================

/// αβ探索の1ノード
///
/// `depth <= 0` なら静止探索に渡す。中断時の戻り値は使われない。
#[allow(clippy::too_many_arguments)]
pub(super) fn search_node<const NT: u8>(
    st: &mut SearchState,
    ctx: &SearchContext<'_>,
    pos: &mut Position,
    depth: Depth,
    mut alpha: Value,
    mut beta: Value,
    ply: i32,
    cut_node: bool,
) -> Value {
    let root_node = NT == NodeType::Root as u8;
    let pv_node = NT != NodeType::NonPV as u8;
    let ply_idx = ply as usize;

    if depth <= 0 {
        return if pv_node {
            qsearch::<{ NodeType::PV as u8 }>(st, ctx, pos, alpha, beta, ply)
        } else {
            qsearch::<{ NodeType::NonPV as u8 }>(st, ctx, pos, alpha, beta, ply)
        };
    }

    // Step 1. 中断チェック
    if check_abort(st, ctx) {
        return Value::ZERO;
    }
    st.nodes += 1;
    inc_stat_by_depth!(st, nodes_by_depth, depth);
    st.stack[ply_idx].pv_len = 0;
    if pv_node {
        st.sel_depth = st.sel_depth.max(ply);
    }

    let in_check = pos.is_in_check();
    st.stack[ply_idx].in_check = in_check;

    if !root_node {
        // Step 2. 引き分け
        if pos.is_draw() {
            return Value::DRAW;
        }
        if ply >= MAX_PLY - 1 {
            return if in_check { Value::DRAW } else { nnue_evaluate(st, ctx, pos) };
        }

        // Step 3. 詰みまでの距離による枝刈り
        alpha = alpha.max(Value::mated_in(ply));
        beta = beta.min(Value::mate_in(ply + 1));
        if alpha >= beta {
            return alpha;
        }
    }

    let original_alpha = alpha;
    let excluded = st.stack[ply_idx].excluded_move;

    // Step 4. 置換表
    let key = pos.key();
    let probe = ctx.tt.probe(key);
    let tt_hit = probe.found;
    let tt_data = probe.data;
    let tt_score = if tt_hit { score_from_tt(tt_data.score, ply) } else { Value::NONE };
    let tt_move = if tt_hit { tt_data.mv } else { Move::NONE };

    if !pv_node
        && excluded.is_none()
        && tt_hit
        && tt_data.depth >= depth
        && pos.halfmove_clock() < TT_CUT_HALFMOVE_LIMIT
    {
        let cut = match tt_data.bound {
            Bound::Exact => true,
            Bound::Lower => tt_score >= beta,
            Bound::Upper => tt_score <= alpha,
            Bound::None => false,
        };
        if cut {
            inc_stat!(st, tt_cutoff);
            return tt_score;
        }
    }

    // Step 5. 静的評価
    let static_eval = if in_check {
        Value::NONE
    } else if excluded.is_some() {
        st.stack[ply_idx].static_eval
    } else if tt_hit && tt_data.has_eval() {
        tt_data.eval
    } else {
        let eval = nnue_evaluate(st, ctx, pos);
        if !tt_hit {
            probe.write(
                key,
                Value::new(SCORE_NONE_TT as i32),
                eval,
                Bound::None,
                0,
                Move::NONE,
                pv_node,
                false,
            );
        }
        eval
    };
    st.stack[ply_idx].static_eval = static_eval;

    let improving = !in_check
        && ply_idx >= 2
        && st.stack[ply_idx - 2].static_eval != Value::NONE
        && static_eval > st.stack[ply_idx - 2].static_eval;

    // Step 6. 前向き枝刈り
    if !pv_node && !in_check && excluded.is_none() {
        if let Some(v) = try_razoring(st, ctx, pos, depth, alpha, static_eval, ply) {
            return v;
        }
        if st.abort {
            return Value::ZERO;
        }

        if let Some(v) = try_reverse_futility(ctx.tune_params, depth, beta, static_eval) {
            inc_stat!(st, rfp_cutoff);
            return v;
        }

        if let Some(v) =
            try_null_move_pruning(st, ctx, pos, depth, beta, static_eval, ply, cut_node)
        {
            return v;
        }
        if st.abort {
            return Value::ZERO;
        }
    }

    // Step 7. Internal iterative reduction
    let mut depth = depth;
    if tt_move.is_none() && excluded.is_none() && iir_applies(ctx.tune_params, pv_node, cut_node, depth)
    {
        inc_stat!(st, iir_applied);
        depth -= 1;
    }

    // Step 8. 指し手ループ
    let us = pos.side_to_move();
    let prev = if ply_idx > 0 { st.stack[ply_idx - 1].moved } else { None };
    let killer = st.stack[ply_idx].killer;
    let counter = prev.map_or(Move::NONE, |(pc, to)| st.history.counter_moves.get(pc, to));
    let mut mp = MovePicker::new(pos, tt_move, killer, counter, prev, true);

    let mut best_value = -Value::INFINITE;
    let mut best_move = Move::NONE;
    let mut move_count = 0;
    let mut pruned_any = false;
    let mut quiets_tried: Vec<Move> = Vec::with_capacity(MAX_QUIETS_TRIED);

    loop {
        let mv = mp.next_move(pos, &st.history);
        if mv.is_none() {
            break;
        }
        if mv == excluded {
            continue;
        }

        let capture = is_capture_stage(pos, mv);
        let Some(moved_pc) = pos.piece_on(mv.from()) else {
            continue;
        };
        let history_score =
            if capture { 0 } else { st.history.quiet_score(us, mv, moved_pc, prev) };

        // Step 9. 取らない手の枝刈り（PV ノードと王手をかける手は対象外）
        if !pv_node
            && !in_check
            && !capture
            && move_count > 0
            && best_value > Value::MATED_IN_MAX_PLY
            && !pos.gives_check(mv)
        {
            let qc = QuietPruneContext {
                depth,
                move_count,
                improving,
                static_eval,
                alpha,
                see_ok: pos.see_ge(mv, quiet_see_threshold(ctx.tune_params, depth)),
            };
            match quiet_move_pruning(ctx.tune_params, &qc) {
                QuietPruneOutcome::Search => {}
                QuietPruneOutcome::Skip => {
                    inc_stat!(st, move_loop_pruned);
                    pruned_any = true;
                    continue;
                }
                QuietPruneOutcome::SkipQuiets => {
                    inc_stat!(st, move_loop_pruned);
                    mp.skip_quiets();
                    pruned_any = true;
                    continue;
                }
            }
        }

        // Step 10. Singular extension
        let mut extension = 0;
        if !root_node
            && mv == tt_move
            && excluded.is_none()
            && depth >= ctx.tune_params.se_min_depth
            && tt_data.bound.is_lower_or_exact()
            && tt_data.depth >= depth - 3
            && !tt_score.is_mate_score()
            && ply < st.root_depth * 2
        {
            let s_beta = tt_score - ctx.tune_params.se_margin * depth / 8;
            let s_depth = (((depth as f64) * ctx.tune_params.se_depth_scale()) as Depth).max(1);

            st.stack[ply_idx].excluded_move = mv;
            let value = search_node::<{ NodeType::NonPV as u8 }>(
                st,
                ctx,
                pos,
                s_depth,
                s_beta - 1,
                s_beta,
                ply,
                cut_node,
            );
            st.stack[ply_idx].excluded_move = Move::NONE;
            if st.abort {
                return Value::ZERO;
            }

            if value < s_beta {
                inc_stat!(st, singular_extension);
                extension = 1;
            } else if s_beta >= beta {
                inc_stat!(st, multi_cut);
                return s_beta;
            }
        }

        if !do_move(st, ctx, pos, mv) {
            continue;
        }
        move_count += 1;
        st.stack[ply_idx].current_move = mv;
        st.stack[ply_idx].null_move = false;
        st.stack[ply_idx].moved = Some((moved_pc, mv.to()));

        // Step 11. 王手延長
        let gives_check = pos.is_in_check();
        if gives_check && extension == 0 && ply < st.root_depth * 2 {
            inc_stat!(st, check_extension);
            extension = 1;
        }
        let new_depth = depth - 1 + extension;

        // Step 12. LMR + PVS
        let mut value = -Value::INFINITE;
        let lmr_ok = depth >= 3 && !capture && move_count > 1 + 2 * (pv_node as i32);
        if lmr_ok {
            let mut r = reduction(ctx.tune_params, depth, move_count);
            if !pv_node {
                r += 1;
            }
            if mv == killer || mv == counter {
                r -= 1;
            }
            if history_score > 0 {
                r -= 1;
            } else if history_score < BAD_HISTORY {
                r += 1;
            }
            let r = r.clamp(0, (new_depth - 1).max(0));
            st.stack[ply_idx].reduction = r;
            inc_stat!(st, lmr_applied);

            value = -search_node::<{ NodeType::NonPV as u8 }>(
                st,
                ctx,
                pos,
                new_depth - r,
                -(alpha + 1),
                -alpha,
                ply + 1,
                true,
            );
            st.stack[ply_idx].reduction = 0;

            if value > alpha && r > 0 {
                inc_stat!(st, lmr_research);
                value = -search_node::<{ NodeType::NonPV as u8 }>(
                    st,
                    ctx,
                    pos,
                    new_depth,
                    -(alpha + 1),
                    -alpha,
                    ply + 1,
                    !cut_node,
                );
            }
        } else if !pv_node || move_count > 1 {
            value = -search_node::<{ NodeType::NonPV as u8 }>(
                st,
                ctx,
                pos,
                new_depth,
                -(alpha + 1),
                -alpha,
                ply + 1,
                !cut_node,
            );
        }

        if pv_node && (move_count == 1 || (value > alpha && value < beta)) {
            value = -search_node::<{ NodeType::PV as u8 }>(
                st,
                ctx,
                pos,
                new_depth,
                -beta,
                -alpha,
                ply + 1,
                false,
            );
        }

        undo_move(st, pos);

        if st.abort {
            return Value::ZERO;
        }

        // Step 13. 最善手の更新
        if value > best_value {
            best_value = value;
            if value > alpha {
                best_move = mv;
                if pv_node {
                    update_pv(&mut st.stack, ply_idx, mv);
                }
                if value >= beta {
                    inc_stat_by_depth!(st, cutoff_by_depth, depth);
                    if move_count == 1 {
                        inc_stat_by_depth!(st, first_move_cutoff_by_depth, depth);
                    }
                    if !capture {
                        update_quiet_stats(st, pos, ply_idx, mv, depth, prev, &quiets_tried);
                    }
                    break;
                }
                alpha = value;
            }
        }

        if !capture && mv != best_move && quiets_tried.len() < MAX_QUIETS_TRIED {
            quiets_tried.push(mv);
        }
    }

    // Step 14. 合法手がない
    if move_count == 0 {
        if excluded.is_some() {
            return alpha;
        }
        if pruned_any && pos.has_legal_move() {
            return alpha;
        }
        return if in_check { Value::mated_in(ply) } else { Value::DRAW };
    }

    // Step 15. 置換表への保存
    if excluded.is_none() {
        let bound = if best_value >= beta {
            Bound::Lower
        } else if best_value > original_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        let eval = if in_check { Value::new(SCORE_NONE_TT as i32) } else { static_eval };
        probe.write(
            key,
            score_to_tt(best_value, ply),
            eval,
            bound,
            depth,
            best_move,
            pv_node,
            pv_node || (tt_hit && tt_data.was_pv),
        );
    }

    best_value
}

/// fail high した quiet 手の統計を更新する
///
/// 最善手は加点、それより前に試した quiet 手は減点する。
fn update_quiet_stats(
    st: &mut SearchState,
    pos: &Position,
    ply_idx: usize,
    best: Move,
    depth: Depth,
    prev: Option<(Piece, Square)>,
    quiets_tried: &[Move],
) {
    let us = pos.side_to_move();
    let bonus = stat_bonus(depth);

    st.stack[ply_idx].killer = best;
    if let Some((prev_pc, prev_to)) = prev {
        st.history.counter_moves.set(prev_pc, prev_to, best);
    }

    let mut update = |mv: Move, bonus: i32| {
        st.history.main_history.update(us, mv, bonus);
        let (Some((prev_pc, prev_to)), Some(pc)) = (prev, pos.piece_on(mv.from())) else {
            return;
        };
        st.history.continuation_history.update(prev_pc, prev_to, pc, mv.to(), bonus);
    };

    update(best, bonus);
    for &mv in quiets_tried {
        update(mv, -bonus);
    }
}

// =============================================================================
// SearchWorker
// =============================================================================

/// 探索ワーカー
///
/// 置換表と NNUE ネットワークを共有し、履歴テーブルは `go` をまたいで保持する。
pub struct SearchWorker {
    tt: Arc<TranspositionTable>,
    network: Arc<Network>,
    tune_params: SearchTuneParams,
    stop: Arc<AtomicBool>,
    state: SearchState,
}

impl SearchWorker {
    pub fn new(
        tt: Arc<TranspositionTable>,
        network: Arc<Network>,
        tune_params: SearchTuneParams,
    ) -> Self {
        Self {
            tt,
            network,
            tune_params,
            stop: Arc::new(AtomicBool::new(false)),
            state: SearchState::new(),
        }
    }

    /// 他スレッドから探索を止めるためのフラグ
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// 停止フラグを下ろす（`go` の前に呼ぶ）
    pub fn reset_stop(&self) {
        self.stop.store(false, Ordering::Relaxed);
    }

    /// 履歴テーブルを消す（新しい対局）
    pub fn clear_history(&mut self) {
        self.state.history.clear();
    }

    pub fn tt(&self) -> &Arc<TranspositionTable> {
        &self.tt
    }

    /// 置換表の大きさを変える（中身は消える）
    ///
    /// 他に共有者がいれば新しい表に差し替える。
    pub fn resize_tt(&mut self, mb_size: usize) {
        match Arc::get_mut(&mut self.tt) {
            Some(tt) => tt.resize(mb_size),
            None => self.tt = Arc::new(TranspositionTable::new(mb_size)),
        }
    }

    pub fn network(&self) -> &Arc<Network> {
        &self.network
    }

    pub fn set_network(&mut self, network: Arc<Network>) {
        self.network = network;
    }

    pub fn tune_params(&self) -> &SearchTuneParams {
        &self.tune_params
    }

    pub fn tune_params_mut(&mut self) -> &mut SearchTuneParams {
        &mut self.tune_params
    }

    /// 直前の探索の統計
    #[cfg(feature = "search-stats")]
    pub fn stats(&self) -> &SearchStats {
        &self.state.stats
    }

    /// 反復深化で探索する
    ///
    /// 停止フラグは下ろさないので、必要なら呼び出し側で `reset_stop` する。
    /// 完了した反復ごとに `on_iteration` を呼ぶ。
    pub fn search(
        &mut self,
        pos: &Position,
        limits: SearchLimits,
        mut on_iteration: impl FnMut(&SearchInfo),
    ) -> SearchResult {
        let start = Instant::now();
        let mut pos = pos.clone();

        let ctx = SearchContext {
            tt: &self.tt,
            network: &self.network,
            tune_params: &self.tune_params,
            stop: &self.stop,
            start,
            hard_ms: limits.hard_ms,
            node_limit: limits.nodes,
        };
        let st = &mut self.state;
        st.prepare(ctx.network, &pos);
        ctx.tt.new_search();

        let max_depth = limits.depth.unwrap_or(MAX_DEPTH).clamp(1, MAX_DEPTH);
        let mut completed: Option<(Value, Vec<Move>, Depth)> = None;

        for root_depth in 1..=max_depth {
            for frame in st.stack.iter_mut() {
                frame.reset();
            }
            st.root_depth = root_depth;

            let prev_score = completed.as_ref().map(|c| c.0);
            let score = aspiration_search(st, &ctx, &mut pos, root_depth, prev_score);
            if st.abort {
                log::debug!("iteration {root_depth} aborted after {} nodes", st.nodes);
                break;
            }

            let pv = st.stack[0].pv[..st.stack[0].pv_len].to_vec();
            let elapsed_ms = ctx.elapsed_ms();
            let info = SearchInfo {
                depth: root_depth,
                sel_depth: st.sel_depth,
                nodes: st.nodes,
                nps: st.nodes * 1000 / elapsed_ms.max(1),
                hashfull: ctx.tt.hashfull(),
                score,
                elapsed_ms,
                pv: pv.clone(),
            };
            on_iteration(&info);
            completed = Some((score, pv, root_depth));

            if limits.soft_ms.is_some_and(|soft| elapsed_ms >= soft) {
                break;
            }
            if ctx.stop.load(Ordering::Relaxed) {
                break;
            }
            // 詰みを読み切ったら続けても変わらない
            if score.is_mate_score()
                && limits.depth.is_none()
                && root_depth >= 2 * score_mate_plies(score)
            {
                break;
            }
        }

        let result = match completed {
            Some((score, pv, depth)) if !pv.is_empty() => SearchResult {
                best_move: pv[0],
                score_cp: score.raw(),
                pv,
                depth,
                nodes: st.nodes,
            },
            other => {
                let best_move = pos.legal_moves().first().copied().unwrap_or(Move::NONE);
                let (score_cp, depth) = other.map_or((0, 0), |(score, _, depth)| (score.raw(), depth));
                SearchResult {
                    best_move,
                    score_cp,
                    pv: if best_move.is_some() { vec![best_move] } else { Vec::new() },
                    depth,
                    nodes: st.nodes,
                }
            }
        };

        log::info!(
            "search done: bestmove {} score {} depth {} nodes {} time {}ms",
            result.best_move.to_uci(),
            result.score_cp,
            result.depth,
            result.nodes,
            ctx.elapsed_ms()
        );
        #[cfg(feature = "search-stats")]
        log::debug!("{}", st.stats.format_report());

        result
    }
}

/// 詰みまでの手数（ply）
#[inline]
fn score_mate_plies(score: Value) -> i32 {
    Value::MATE.raw() - score.raw().abs()
}

/// ルートのアスピレーション探索
///
/// fail low なら beta を中点に寄せて alpha を広げ、fail high なら beta を広げて深さを1つ下げる。
fn aspiration_search(
    st: &mut SearchState,
    ctx: &SearchContext<'_>,
    pos: &mut Position,
    root_depth: Depth,
    prev_score: Option<Value>,
) -> Value {
    let root = |st: &mut SearchState, pos: &mut Position, depth: Depth, alpha: Value, beta: Value| {
        search_node::<{ NodeType::Root as u8 }>(st, ctx, pos, depth, alpha, beta, 0, false)
    };

    let prev_score = match prev_score {
        Some(s) if root_depth >= ASPIRATION_MIN_DEPTH => s,
        _ => return root(st, pos, root_depth, -Value::INFINITE, Value::INFINITE),
    };

    let mut delta = ASPIRATION_DELTA;
    let mut alpha = (prev_score - delta).max(-Value::INFINITE);
    let mut beta = (prev_score + delta).min(Value::INFINITE);
    let mut search_depth = root_depth;

    loop {
        let score = root(st, pos, search_depth, alpha, beta);
        if st.abort {
            return score;
        }

        if score <= alpha {
            beta = Value::new((alpha.raw() + beta.raw()) / 2);
            alpha = (score - delta).max(-Value::INFINITE);
            search_depth = root_depth;
        } else if score >= beta {
            beta = (score + delta).min(Value::INFINITE);
            search_depth = (search_depth - 1).max(1);
        } else {
            return score;
        }

        delta = (delta as f64 * 1.5).round() as i32;
    }
}
