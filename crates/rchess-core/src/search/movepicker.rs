//! MovePicker（指し手オーダリング）
//!
//! 探索中に指し手を段階的に生成し、カットオフを起こしやすい手から返す。
//!
//! ## Stage
//!
//! 1. TtMove - 置換表の指し手
//! 2. Killer - キラー手
//! 3. CounterMove - 直前の相手の手への応手
//! 4. GenCaptures - 取る手の生成と MVV-LVA スコア付け
//! 5. GoodCaptures - SEE >= 0 の取る手（成りを含む）
//! 6. GenQuiets - 取らない手の生成と history スコア付け
//! 7. Quiets - 取らない手
//! 8. BadCaptures - SEE < 0 の取る手
//!
//! `include_quiets = false`（静止探索）では 2, 3, 6, 7 を飛ばし、悪い取りも捨てる。
//!
//! ## History参照を保持しない設計
//!
//! 再帰呼び出し中に履歴を更新するため、MovePicker は `Position` や
//! `HistoryTables` への参照をフィールドとして保持しない。
//! `next_move()` の呼び出しごとに受け取る。

use super::history::HistoryTables;
use crate::movegen::{MoveList, generate_captures, generate_quiets};
use crate::position::Position;
use crate::types::{Move, Piece, PieceType, Square};

/// 指し手生成の段階
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Stage {
    TtMove,
    Killer,
    CounterMove,
    GenCaptures,
    GoodCaptures,
    GenQuiets,
    Quiets,
    BadCaptures,
    Done,
}

/// 取る手リストに入る手か（取り・EP・クイーンへの成り）
#[inline]
pub fn is_capture_stage(pos: &Position, mv: Move) -> bool {
    mv.is_en_passant()
        || (!mv.is_castle() && pos.piece_on(mv.to()).is_some())
        || mv.promotion() == Some(PieceType::Queen)
}

/// 駒を取る手か
#[inline]
pub fn is_capture(pos: &Position, mv: Move) -> bool {
    mv.is_en_passant() || (!mv.is_castle() && pos.piece_on(mv.to()).is_some())
}

/// MVV-LVA（`victim·16 − attacker`）。成りは成る駒の分を加える。
fn mvv_lva(pos: &Position, mv: Move) -> i32 {
    let attacker = pos.piece_on(mv.from()).map_or(0, |p| p.piece_type().index() as i32);
    let victim = if mv.is_en_passant() {
        PieceType::Pawn.index() as i32
    } else {
        pos.piece_on(mv.to()).map_or(0, |p| p.piece_type().index() as i32)
    };
    let promo = mv.promotion().map_or(0, |pt| pt.index() as i32 * 16);
    victim * 16 - attacker + promo
}

/// 指し手オーダリング器
pub struct MovePicker {
    stage: Stage,
    tt_move: Move,
    killer: Move,
    counter_move: Move,
    /// 1手前に動いた駒と移動先（ContinuationHistory 用）
    prev: Option<(Piece, Square)>,
    include_quiets: bool,
    skip_quiets: bool,

    /// `[0, end_bad)` 悪い取り、`[cur, end_captures)` 未選択の取り、
    /// `[end_captures, len)` 取らない手
    moves: MoveList,
    cur: usize,
    end_bad: usize,
    end_captures: usize,
}

impl MovePicker {
    /// `pos` は初期化時のみ使用する
    pub fn new(
        pos: &Position,
        tt_move: Move,
        killer: Move,
        counter_move: Move,
        prev: Option<(Piece, Square)>,
        include_quiets: bool,
    ) -> Self {
        let tt_ok =
            pos.is_pseudo_legal(tt_move) && (include_quiets || is_capture_stage(pos, tt_move));
        Self {
            stage: Stage::TtMove,
            tt_move: if tt_ok { tt_move } else { Move::NONE },
            killer,
            counter_move,
            prev,
            include_quiets,
            skip_quiets: !include_quiets,
            moves: MoveList::new(),
            cur: 0,
            end_bad: 0,
            end_captures: 0,
        }
    }

    /// 残りの取らない手を返さないようにする（LMP 用）
    pub fn skip_quiets(&mut self) {
        self.skip_quiets = true;
    }

    #[inline]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// 既に特別扱いで返した手か
    #[inline]
    fn is_special(&self, mv: Move) -> bool {
        mv == self.tt_move || mv == self.killer || mv == self.counter_move
    }

    /// キラー・カウンターとして返せる手か
    fn special_quiet_ok(&self, pos: &Position, mv: Move) -> bool {
        mv.is_some()
            && mv != self.tt_move
            && pos.is_pseudo_legal(mv)
            && !is_capture_stage(pos, mv)
    }

    /// 次の指し手を返す。尽きたら `Move::NONE`。
    pub fn next_move(&mut self, pos: &Position, history: &HistoryTables) -> Move {
        loop {
            match self.stage {
                Stage::TtMove => {
                    self.stage = Stage::Killer;
                    if self.tt_move.is_some() {
                        return self.tt_move;
                    }
                }

                Stage::Killer => {
                    self.stage = Stage::CounterMove;
                    if !self.skip_quiets && self.special_quiet_ok(pos, self.killer) {
                        return self.killer;
                    }
                    // 返さなかったキラーは生成リストで除外しない
                    self.killer = Move::NONE;
                }

                Stage::CounterMove => {
                    self.stage = Stage::GenCaptures;
                    if !self.skip_quiets
                        && self.counter_move != self.killer
                        && self.special_quiet_ok(pos, self.counter_move)
                    {
                        return self.counter_move;
                    }
                    self.counter_move = Move::NONE;
                }

                Stage::GenCaptures => {
                    self.moves.clear();
                    generate_captures(pos, &mut self.moves);
                    self.end_captures = self.moves.len();
                    for ext in self.moves.as_mut_slice() {
                        ext.value = mvv_lva(pos, ext.mv);
                    }
                    self.cur = 0;
                    self.end_bad = 0;
                    self.stage = Stage::GoodCaptures;
                }

                Stage::GoodCaptures => {
                    while self.cur < self.end_captures {
                        let mv = self.pick_best(self.cur, self.end_captures);
                        let idx = self.cur;
                        self.cur += 1;
                        if mv == self.tt_move {
                            continue;
                        }
                        if mv.is_promotion() || pos.see_ge(mv, 0) {
                            return mv;
                        }
                        // 悪い取りは先頭側に寄せておく
                        self.moves.as_mut_slice().swap(self.end_bad, idx);
                        self.end_bad += 1;
                    }
                    self.stage = Stage::GenQuiets;
                }

                Stage::GenQuiets => {
                    if !self.skip_quiets {
                        generate_quiets(pos, &mut self.moves);
                        let us = pos.side_to_move();
                        let prev = self.prev;
                        for ext in &mut self.moves.as_mut_slice()[self.end_captures..] {
                            ext.value = match pos.piece_on(ext.mv.from()) {
                                Some(pc) => history.quiet_score(us, ext.mv, pc, prev),
                                None => 0,
                            };
                        }
                    }
                    self.cur = self.end_captures;
                    self.stage = Stage::Quiets;
                }

                Stage::Quiets => {
                    let end = self.moves.len();
                    while !self.skip_quiets && self.cur < end {
                        let mv = self.pick_best(self.cur, end);
                        self.cur += 1;
                        if !self.is_special(mv) {
                            return mv;
                        }
                    }
                    self.cur = 0;
                    self.stage = if self.include_quiets { Stage::BadCaptures } else { Stage::Done };
                }

                Stage::BadCaptures => {
                    while self.cur < self.end_bad {
                        let mv = self.moves.at(self.cur);
                        self.cur += 1;
                        if mv != self.tt_move {
                            return mv;
                        }
                    }
                    self.stage = Stage::Done;
                }

                Stage::Done => return Move::NONE,
            }
        }
    }

    /// `[begin, end)` の最大スコアの手を `begin` に移して返す
    fn pick_best(&mut self, begin: usize, end: usize) -> Move {
        let slice = &mut self.moves.as_mut_slice()[begin..end];
        let mut best = 0;
        for (i, ext) in slice.iter().enumerate().skip(1) {
            if ext.value > slice[best].value {
                best = i;
            }
        }
        slice.swap(0, best);
        slice[0].mv
    }
}
