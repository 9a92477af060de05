//! 指し手の実行と巻き戻し
//!
//! `make_move` は疑似合法手を受け取り、自玉が取られる手なら完全に巻き戻して
//! `false` を返す。ハッシュは差分で更新し、合法手のときだけ履歴に積む。

use super::pos::{
    CR_MASK, CR_SHIFT, EP_MASK, EP_NONE, EP_SHIFT, FM_MASK, FM_MAX, FM_SHIFT, HC_MASK, HC_MAX,
    HC_SHIFT, Position, STM_MASK,
};
use super::state::UndoRecord;
use super::zobrist::{zobrist_castling, zobrist_ep, zobrist_psq, zobrist_side};
use crate::bitboard::pawn_attacks;
use crate::movegen;
use crate::nnue::DirtyPiece;
use crate::types::{Color, Move, MoveKind, Piece, PieceType, Square};

/// 移動元・移動先ごとに残るキャスリング権
const CASTLE_KEEP: [u8; Square::NUM] = {
    let mut keep = [0b1111u8; Square::NUM];
    keep[Square::E1.index()] = 0b1100;
    keep[Square::E8.index()] = 0b0011;
    keep[Square::H1.index()] = 0b1110;
    keep[Square::A1.index()] = 0b1101;
    keep[Square::H8.index()] = 0b1011;
    keep[Square::A8.index()] = 0b0111;
    keep
};

/// キャスリングでのルークの移動（キングの移動先で決まる）
#[inline]
fn castle_rook_squares(king_to: Square) -> Option<(Square, Square)> {
    match king_to {
        Square::G1 => Some((Square::H1, Square::F1)),
        Square::C1 => Some((Square::A1, Square::D1)),
        Square::G8 => Some((Square::H8, Square::F8)),
        Square::C8 => Some((Square::A8, Square::D8)),
        _ => None,
    }
}

impl Position {
    /// 指し手を実行する
    ///
    /// 自玉に王手が残る手・成立しないキャスリングは `false` を返し、局面は変化しない。
    pub fn make_move(&mut self, mv: Move) -> bool {
        let us = self.side_to_move();
        let from = mv.from();
        let to = mv.to();
        let kind = mv.kind();

        let Some(mover) = self.piece_on(from) else {
            return false;
        };
        if mover.color() != us {
            return false;
        }
        if kind == MoveKind::Castle && !movegen::castle_legal(self, mv) {
            return false;
        }

        let prev_meta = self.meta;
        let prev_key = self.key;
        let mut key = prev_key;

        // 取る駒
        let (captured, cap_sq) = match kind {
            MoveKind::EnPassant => (
                Some(Piece::new(us.opponent(), PieceType::Pawn)),
                Square::from_index_unchecked(to.index() ^ 8),
            ),
            MoveKind::Castle => (None, to),
            _ => (self.piece_on(to), to),
        };
        if let Some(cap) = captured {
            self.remove_piece(cap, cap_sq);
            key ^= zobrist_psq(cap, cap_sq);
        }

        self.remove_piece(mover, from);
        key ^= zobrist_psq(mover, from);

        let placed = match mv.promotion() {
            Some(pt) => Piece::new(us, pt),
            None => mover,
        };
        self.put_piece(placed, to);
        key ^= zobrist_psq(placed, to);

        if kind == MoveKind::Castle {
            if let Some((rook_from, rook_to)) = castle_rook_squares(to) {
                let rook = Piece::new(us, PieceType::Rook);
                self.remove_piece(rook, rook_from);
                self.put_piece(rook, rook_to);
                key ^= zobrist_psq(rook, rook_from) ^ zobrist_psq(rook, rook_to);
            }
        }

        let is_pawn = mover.piece_type() == PieceType::Pawn;

        // EP 升は隣に相手ポーンがいるダブルプッシュのときだけ
        let mut new_ep = EP_NONE;
        if is_pawn && from.index().abs_diff(to.index()) == 16 {
            let ep = Square::from_index_unchecked((from.index() + to.index()) / 2);
            let them_pawns = self.pieces_of(us.opponent(), PieceType::Pawn);
            if (pawn_attacks(us, ep) & them_pawns).is_not_empty() {
                new_ep = ep.index() as u32;
            }
        }
        let old_ep = (prev_meta & EP_MASK) >> EP_SHIFT;
        if old_ep != EP_NONE {
            key ^= zobrist_ep(Square::from_index_unchecked(old_ep as usize));
        }
        if new_ep != EP_NONE {
            key ^= zobrist_ep(Square::from_index_unchecked(new_ep as usize));
        }

        let old_cr = ((prev_meta & CR_MASK) >> CR_SHIFT) as u8;
        let new_cr = old_cr & CASTLE_KEEP[from.index()] & CASTLE_KEEP[to.index()];
        key ^= zobrist_castling(old_cr) ^ zobrist_castling(new_cr);

        let old_hc = (prev_meta & HC_MASK) >> HC_SHIFT;
        let new_hc = if is_pawn || captured.is_some() { 0 } else { (old_hc + 1).min(HC_MAX) };

        let mut fm = (prev_meta & FM_MASK) >> FM_SHIFT;
        if us == Color::Black {
            fm = (fm + 1).min(FM_MAX);
        }

        let new_meta = ((prev_meta ^ STM_MASK) & !(CR_MASK | EP_MASK | HC_MASK | FM_MASK))
            | (new_cr as u32) << CR_SHIFT
            | new_ep << EP_SHIFT
            | new_hc << HC_SHIFT
            | fm << FM_SHIFT;
        key ^= zobrist_side();

        self.undo.push(UndoRecord {
            meta_delta: prev_meta ^ new_meta,
            prev_key,
            diff: UndoRecord::pack(from, to, captured, mover, kind, mv.promotion_bits()),
        });
        self.meta = new_meta;
        self.key = key;

        if movegen::king_attacked(self, us) {
            self.unmake();
            return false;
        }

        self.history.push(key);
        true
    }

    /// 直前の `make_move` を取り消す
    pub fn undo_move(&mut self) {
        if self.history.len() > 1 {
            self.history.pop();
        }
        self.unmake();
    }

    /// 盤面と meta を1手分戻す（履歴は触らない）
    fn unmake(&mut self) {
        let Some(rec) = self.undo.pop() else {
            return;
        };
        self.meta ^= rec.meta_delta;
        self.key = rec.prev_key;
        if rec.is_null() {
            return;
        }

        let from = rec.from();
        let to = rec.to();
        let mover = rec.mover();

        self.remove_piece(rec.placed(), to);
        self.put_piece(mover, from);

        if rec.kind() == MoveKind::Castle {
            if let Some((rook_from, rook_to)) = castle_rook_squares(to) {
                let rook = Piece::new(mover.color(), PieceType::Rook);
                self.remove_piece(rook, rook_to);
                self.put_piece(rook, rook_from);
            }
        }

        if let Some(cap) = rec.captured() {
            self.put_piece(cap, rec.capture_square());
        }
    }

    /// null move（手番だけ渡す）
    ///
    /// EP を消し、halfmove clock を進め、履歴に積む。
    pub fn make_null_move(&mut self) {
        let prev_meta = self.meta;
        let prev_key = self.key;
        let mut key = prev_key;

        let old_ep = (prev_meta & EP_MASK) >> EP_SHIFT;
        if old_ep != EP_NONE {
            key ^= zobrist_ep(Square::from_index_unchecked(old_ep as usize));
        }
        let hc = (((prev_meta & HC_MASK) >> HC_SHIFT) + 1).min(HC_MAX);
        let new_meta = ((prev_meta ^ STM_MASK) & !(EP_MASK | HC_MASK))
            | EP_NONE << EP_SHIFT
            | hc << HC_SHIFT;
        key ^= zobrist_side();

        self.undo.push(UndoRecord {
            meta_delta: prev_meta ^ new_meta,
            prev_key,
            diff: UndoRecord::NULL_DIFF,
        });
        self.meta = new_meta;
        self.key = key;
        self.history.push(key);
    }

    pub fn undo_null_move(&mut self) {
        debug_assert!(self.undo.last().is_some_and(|r| r.is_null()));
        self.undo_move();
    }

    /// 直前の指し手による駒の増減（NNUE 差分更新用）
    pub fn dirty_piece(&self) -> DirtyPiece {
        let mut dp = DirtyPiece::default();
        let Some(rec) = self.undo.last() else {
            return dp;
        };
        if rec.is_null() {
            return dp;
        }

        let to = rec.to();
        let mover = rec.mover();
        dp.remove(mover, rec.from());
        dp.add(rec.placed(), to);

        if let Some(cap) = rec.captured() {
            dp.remove(cap, rec.capture_square());
        }
        if rec.kind() == MoveKind::Castle {
            if let Some((rook_from, rook_to)) = castle_rook_squares(to) {
                let rook = Piece::new(mover.color(), PieceType::Rook);
                dp.remove(rook, rook_from);
                dp.add(rook, rook_to);
            }
        }
        dp
    }
}
