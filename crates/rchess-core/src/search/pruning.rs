//! 枝刈りヘルパー群
//!
//! - Razoring
//! - Reverse Futility Pruning
//! - Null Move Pruning
//! - Internal Iterative Reduction
//! - 指し手ループ内の枝刈り（LMP, Futility, SEE）

use crate::position::Position;
use crate::types::{Depth, Move, Value};

use super::alpha_beta::{SearchContext, SearchState, search_node};
use super::qsearch::qsearch;
use super::search_helpers::{do_null_move, undo_null_move};
use super::stats::inc_stat;
use super::tune_params::SearchTuneParams;
use super::types::NodeType;

// =============================================================================
// Razoring
// =============================================================================

/// Razoring の深さ上限
const RAZORING_MAX_DEPTH: Depth = 3;

/// Razoring の1深さあたりのマージン
const RAZORING_MARGIN_PER_DEPTH: i32 = 200;

/// Razoring
///
/// 静的評価が alpha を大きく下回るなら静止探索で確認し、それでも届かなければ打ち切る。
#[inline]
pub(super) fn try_razoring(
    st: &mut SearchState,
    ctx: &SearchContext<'_>,
    pos: &mut Position,
    depth: Depth,
    alpha: Value,
    static_eval: Value,
    ply: i32,
) -> Option<Value> {
    if depth > RAZORING_MAX_DEPTH || static_eval + RAZORING_MARGIN_PER_DEPTH * depth > alpha {
        return None;
    }

    let value = qsearch::<{ NodeType::NonPV as u8 }>(st, ctx, pos, alpha, alpha + 1, ply);
    if value <= alpha {
        inc_stat!(st, razoring_applied);
        return Some(value);
    }
    None
}

// =============================================================================
// Reverse Futility Pruning
// =============================================================================

/// Reverse futility pruning
#[inline]
pub(super) fn try_reverse_futility(
    tune: &SearchTuneParams,
    depth: Depth,
    beta: Value,
    static_eval: Value,
) -> Option<Value> {
    if depth <= tune.rfp_max_depth
        && !beta.is_loss()
        && !static_eval.is_win()
        && static_eval - tune.rfp_margin_per_depth * depth >= beta
    {
        return Some(static_eval);
    }
    None
}

// =============================================================================
// Null Move Pruning
// =============================================================================

/// Null move の最小深さ
const NMP_MIN_DEPTH: Depth = 3;

/// Null move の削減量
///
/// `R = nmp_base + depth * scale + min((eval - beta) / margin, eval_max)`
#[inline]
pub(super) fn null_move_reduction(
    tune: &SearchTuneParams,
    depth: Depth,
    static_eval: Value,
    beta: Value,
) -> Depth {
    let eval_term = ((static_eval - beta).raw() / tune.nmp_eval_margin).min(tune.nmp_eval_max);
    tune.nmp_base + (depth as f64 * tune.nmp_depth_scale()) as i32 + eval_term
}

/// Null move pruning
///
/// 手番を渡しても beta 以上なら、このノードは fail high とみなす。
/// 詰みスコアは信用せず beta に丸める。
#[allow(clippy::too_many_arguments)]
pub(super) fn try_null_move_pruning(
    st: &mut SearchState,
    ctx: &SearchContext<'_>,
    pos: &mut Position,
    depth: Depth,
    beta: Value,
    static_eval: Value,
    ply: i32,
    cut_node: bool,
) -> Option<Value> {
    let ply_idx = ply as usize;
    let us = pos.side_to_move();
    let prev_was_null = ply_idx > 0 && st.stack[ply_idx - 1].null_move;

    if depth < NMP_MIN_DEPTH
        || static_eval < beta
        || prev_was_null
        || beta.is_loss()
        || !pos.has_non_pawn_material(us)
    {
        return None;
    }

    inc_stat!(st, nmp_attempted);
    let r = null_move_reduction(ctx.tune_params, depth, static_eval, beta);

    st.stack[ply_idx].current_move = Move::NONE;
    st.stack[ply_idx].null_move = true;
    st.stack[ply_idx].moved = None;

    do_null_move(st, ctx, pos);
    let value = -search_node::<{ NodeType::NonPV as u8 }>(
        st,
        ctx,
        pos,
        depth - 1 - r,
        -beta,
        -beta + 1,
        ply + 1,
        !cut_node,
    );
    undo_null_move(st, pos);

    st.stack[ply_idx].null_move = false;

    if st.abort {
        return None;
    }

    if value >= beta {
        inc_stat!(st, nmp_cutoff);
        return Some(if value.is_win() { beta } else { value });
    }
    None
}

// =============================================================================
// Internal Iterative Reduction
// =============================================================================

/// 置換表の手がないとき、深さを1つ減らすか
#[inline]
pub(super) fn iir_applies(
    tune: &SearchTuneParams,
    pv_node: bool,
    cut_node: bool,
    depth: Depth,
) -> bool {
    (pv_node && depth >= tune.iir_min_pv_depth) || (cut_node && depth >= tune.iir_min_cut_depth)
}

// =============================================================================
// 指し手ループ内の枝刈り
// =============================================================================

/// 取らない手の枝刈りに使う値
pub(super) struct QuietPruneContext {
    pub depth: Depth,
    pub move_count: i32,
    pub improving: bool,
    pub static_eval: Value,
    pub alpha: Value,
    /// SEE が閾値以上か（閾値は `-lmp_margin_per_depth * depth`）
    pub see_ok: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum QuietPruneOutcome {
    /// 探索する
    Search,
    /// この手だけ飛ばす
    Skip,
    /// 以降の取らない手をすべて飛ばす
    SkipQuiets,
}

/// SEE 枝刈りの閾値
#[inline]
pub(super) fn quiet_see_threshold(tune: &SearchTuneParams, depth: Depth) -> i32 {
    -tune.lmp_margin_per_depth * depth
}

/// LMP の手数上限（改善していなければ半分）
#[inline]
pub(super) fn lmp_threshold(tune: &SearchTuneParams, depth: Depth, improving: bool) -> i32 {
    (tune.lmp_base_threshold + tune.lmp_per_depth * depth * depth) / (2 - improving as i32)
}

/// 取らない手の枝刈り（LMP → Futility → SEE の順）
#[inline]
pub(super) fn quiet_move_pruning(
    tune: &SearchTuneParams,
    qc: &QuietPruneContext,
) -> QuietPruneOutcome {
    if qc.depth <= tune.lmp_max_depth
        && qc.move_count >= lmp_threshold(tune, qc.depth, qc.improving)
    {
        return QuietPruneOutcome::SkipQuiets;
    }

    if qc.depth <= tune.futility_max_depth
        && qc.static_eval + tune.futility_margin_per_depth * qc.depth <= qc.alpha
    {
        return QuietPruneOutcome::Skip;
    }

    if qc.depth <= tune.lmp_max_depth && !qc.see_ok {
        return QuietPruneOutcome::Skip;
    }

    QuietPruneOutcome::Search
}
