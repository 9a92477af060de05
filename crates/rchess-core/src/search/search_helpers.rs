//! 探索ヘルパー関数群
//!
//! 中断チェック、指し手の実行と NNUE スタックの同期、PV の更新。

use std::sync::atomic::Ordering;

use crate::nnue::DirtyPiece;
use crate::position::Position;
use crate::types::{Move, Value};

use super::alpha_beta::{SearchContext, SearchState};
use super::types::StackArray;

/// 中断チェックの間隔（ノード数）
const CHECK_INTERVAL: i32 = 2048;

// =============================================================================
// 中断チェック
// =============================================================================

/// 中断チェック
///
/// 外部からの停止・ノード数上限・hard deadline を `CHECK_INTERVAL` ノードごとに見る。
#[inline]
pub(super) fn check_abort(st: &mut SearchState, ctx: &SearchContext<'_>) -> bool {
    if st.abort {
        return true;
    }

    st.calls_cnt -= 1;
    if st.calls_cnt > 0 {
        return false;
    }
    st.calls_cnt = CHECK_INTERVAL;

    if ctx.stop.load(Ordering::Relaxed) {
        st.abort = true;
        return true;
    }
    if ctx.node_limit.is_some_and(|limit| st.nodes >= limit) {
        st.abort = true;
        return true;
    }
    if ctx.hard_ms.is_some_and(|hard| ctx.elapsed_ms() >= hard) {
        st.abort = true;
        return true;
    }
    false
}

// =============================================================================
// 指し手の実行（NNUE 同期）
// =============================================================================

/// 指し手を実行し、アキュムレータを積む。非合法なら何もせず `false`。
#[inline]
pub(super) fn do_move(st: &mut SearchState, ctx: &SearchContext<'_>, pos: &mut Position, mv: Move) -> bool {
    if !pos.make_move(mv) {
        return false;
    }
    ctx.tt.prefetch(pos.key());
    st.nnue_stack.push(pos.dirty_piece());
    true
}

#[inline]
pub(super) fn undo_move(st: &mut SearchState, pos: &mut Position) {
    pos.undo_move();
    st.nnue_stack.pop();
}

#[inline]
pub(super) fn do_null_move(st: &mut SearchState, ctx: &SearchContext<'_>, pos: &mut Position) {
    pos.make_null_move();
    ctx.tt.prefetch(pos.key());
    st.nnue_stack.push(DirtyPiece::default());
}

#[inline]
pub(super) fn undo_null_move(st: &mut SearchState, pos: &mut Position) {
    pos.undo_null_move();
    st.nnue_stack.pop();
}

/// 静的評価（詰みスコアの範囲には入れない）
#[inline]
pub(super) fn nnue_evaluate(st: &mut SearchState, ctx: &SearchContext<'_>, pos: &Position) -> Value {
    let v = st.nnue_stack.evaluate(ctx.network, pos);
    Value::new(v.clamp(Value::MATED_IN_MAX_PLY.raw() + 1, Value::MATE_IN_MAX_PLY.raw() - 1))
}

// =============================================================================
// PV
// =============================================================================

/// `ply` の PV を `mv` + 子の PV で置き換える
#[inline]
pub(super) fn update_pv(stack: &mut StackArray, ply: usize, mv: Move) {
    let (head, tail) = stack.split_at_mut(ply + 1);
    let cur = &mut head[ply];
    let child = &tail[0];
    let len = child.pv_len.min(cur.pv.len() - 1);
    cur.pv[0] = mv;
    cur.pv[1..=len].copy_from_slice(&child.pv[..len]);
    cur.pv_len = len + 1;
}
