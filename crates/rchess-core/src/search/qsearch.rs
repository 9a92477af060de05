//! 静止探索
//!
//! 取る手（とクイーン成り）だけを読み、局面が落ち着いたところで静的評価を返す。
//! 王手されているときは全合法手を読む。

use crate::bitboard::Bitboard;
use crate::position::{Position, see_value};
use crate::tt::{SCORE_NONE_TT, score_from_tt, score_to_tt};
use crate::types::{Bound, Color, MAX_PLY, Move, PieceType, Value};

use super::alpha_beta::{SearchContext, SearchState};
use super::movepicker::MovePicker;
use super::search_helpers::{check_abort, do_move, nnue_evaluate, undo_move, update_pv};
use super::stats::inc_stat;
use super::types::NodeType;

/// delta pruning のマージン
const DELTA_MARGIN: i32 = 200;

/// この局面で取る手が得られる最大の駒得
///
/// 相手の最も高い駒（キング以外）と、7段目のポーンがあれば成りの差分。
fn best_capture_gain(pos: &Position) -> i32 {
    let us = pos.side_to_move();
    let them = us.opponent();

    let mut gain = 0;
    for pt in [PieceType::Queen, PieceType::Rook, PieceType::Bishop, PieceType::Knight, PieceType::Pawn] {
        if pos.pieces_of(them, pt).is_not_empty() {
            gain = see_value(pt);
            break;
        }
    }

    let seventh = match us {
        Color::White => Bitboard::RANK_7,
        Color::Black => Bitboard::RANK_2,
    };
    if (pos.pieces_of(us, PieceType::Pawn) & seventh).is_not_empty() {
        gain += see_value(PieceType::Queen) - see_value(PieceType::Pawn);
    }
    gain
}

/// 静止探索
pub(super) fn qsearch<const NT: u8>(
    st: &mut SearchState,
    ctx: &SearchContext<'_>,
    pos: &mut Position,
    mut alpha: Value,
    beta: Value,
    ply: i32,
) -> Value {
    let pv_node = NT == NodeType::PV as u8;
    let ply_idx = ply as usize;

    if check_abort(st, ctx) {
        return Value::ZERO;
    }
    st.nodes += 1;
    inc_stat!(st, qs_nodes);
    st.stack[ply_idx].pv_len = 0;
    if pv_node {
        st.sel_depth = st.sel_depth.max(ply);
    }

    if pos.is_draw() {
        return Value::DRAW;
    }

    let in_check = pos.is_in_check();
    st.stack[ply_idx].in_check = in_check;

    if ply >= MAX_PLY - 1 {
        return if in_check { Value::DRAW } else { nnue_evaluate(st, ctx, pos) };
    }

    // 置換表
    let key = pos.key();
    let probe = ctx.tt.probe(key);
    let tt_hit = probe.found;
    let tt_data = probe.data;
    let tt_score = if tt_hit { score_from_tt(tt_data.score, ply) } else { Value::NONE };

    if !pv_node && tt_hit && tt_data.bound != Bound::None {
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

    // stand pat
    let stand_pat;
    let mut best_value;
    if in_check {
        stand_pat = Value::NONE;
        best_value = -Value::INFINITE;
    } else {
        stand_pat =
            if tt_hit && tt_data.has_eval() { tt_data.eval } else { nnue_evaluate(st, ctx, pos) };
        if stand_pat >= beta {
            return stand_pat;
        }
        if stand_pat + best_capture_gain(pos) + DELTA_MARGIN < alpha {
            inc_stat!(st, delta_pruned);
            return stand_pat;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }
        best_value = stand_pat;
    }
    st.stack[ply_idx].static_eval = stand_pat;

    let prev = if ply_idx > 0 { st.stack[ply_idx - 1].moved } else { None };
    let tt_move = if tt_hit { tt_data.mv } else { Move::NONE };
    let mut mp = MovePicker::new(pos, tt_move, Move::NONE, Move::NONE, prev, in_check);
    let mut best_move = Move::NONE;
    let mut move_count = 0;

    loop {
        let mv = mp.next_move(pos, &st.history);
        if mv.is_none() {
            break;
        }

        if !in_check && !mv.is_promotion() && !pos.see_ge(mv, ctx.tune_params.qsee_margin) {
            continue;
        }

        let moved_pc = pos.piece_on(mv.from());
        if !do_move(st, ctx, pos, mv) {
            continue;
        }
        move_count += 1;
        st.stack[ply_idx].current_move = mv;
        st.stack[ply_idx].null_move = false;
        st.stack[ply_idx].moved = moved_pc.map(|pc| (pc, mv.to()));

        let value = -qsearch::<NT>(st, ctx, pos, -beta, -alpha, ply + 1);
        undo_move(st, pos);

        if st.abort {
            return Value::ZERO;
        }

        if value > best_value {
            best_value = value;
            if value > alpha {
                best_move = mv;
                if pv_node {
                    update_pv(&mut st.stack, ply_idx, mv);
                }
                if value >= beta {
                    break;
                }
                alpha = value;
            }
        }
    }

    if in_check && move_count == 0 {
        return Value::mated_in(ply);
    }

    let bound = if best_value >= beta { Bound::Lower } else { Bound::Upper };
    let eval = if in_check { Value::new(SCORE_NONE_TT as i32) } else { stand_pat };
    probe.write(
        key,
        score_to_tt(best_value, ply),
        eval,
        bound,
        0,
        best_move,
        pv_node,
        pv_node || (tt_hit && tt_data.was_pv),
    );

    best_value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_capture_gain() {
        // 相手の最大駒はルーク
        let pos = Position::from_fen("4k2r/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(best_capture_gain(&pos), 500);

        // 7段目のポーンがあれば成りの分を足す
        let pos = Position::from_fen("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(best_capture_gain(&pos), 800);

        // 黒から見た7段目は2段目
        let pos = Position::from_fen("4k3/8/8/8/8/8/6p1/Q3K3 b - - 0 1").unwrap();
        assert_eq!(best_capture_gain(&pos), 900 + 800);
    }
}
