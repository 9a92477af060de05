//! 静的交換評価（SEE）
//!
//! 移動先の升での取り合いを、最も安い駒から順に取り返すものとして評価する。
//! 遠方駒は占有を更新するたびに利きを引き直すので、X-ray も自然に入る。

use super::pos::Position;
use crate::bitboard::{
    Bitboard, bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks,
    rook_attacks,
};
use crate::types::{Color, Move, PieceType, Square};

/// SEE 用の駒価値（P, N, B, R, Q, K）
pub const SEE_VALUES: [i32; PieceType::NUM] = [100, 320, 330, 500, 900, 10000];

#[inline]
pub fn see_value(pt: PieceType) -> i32 {
    SEE_VALUES[pt.index()]
}

impl Position {
    /// 取る手の損得（取らない手は 0）
    ///
    /// 成りは動いたポーンの価値で数える。
    pub fn see(&self, mv: Move) -> i32 {
        let from = mv.from();
        let to = mv.to();
        let Some(mover) = self.piece_on(from) else {
            return 0;
        };

        let mut occ = self.occupied();
        let victim = if mv.is_en_passant() {
            occ ^= Bitboard::from_square(Square::from_index_unchecked(to.index() ^ 8));
            PieceType::Pawn
        } else {
            match self.piece_on(to) {
                Some(p) => p.piece_type(),
                None => return 0,
            }
        };

        let mut gain = [0i32; 40];
        let mut d = 0;
        gain[0] = see_value(victim);

        occ ^= Bitboard::from_square(from);
        let mut attacker = mover.piece_type();
        let mut stm = mover.color().opponent();

        loop {
            d += 1;
            gain[d] = see_value(attacker) - gain[d - 1];

            match self.least_valuable_attacker(to, stm, occ) {
                Some((pt, sq)) => {
                    attacker = pt;
                    occ ^= Bitboard::from_square(sq);
                    stm = stm.opponent();
                }
                None => break,
            }
            if d + 1 >= gain.len() {
                break;
            }
        }

        while d > 1 {
            d -= 1;
            gain[d - 1] = -(-gain[d - 1]).max(gain[d]);
        }
        gain[0]
    }

    /// `see(mv) >= threshold`
    #[inline]
    pub fn see_ge(&self, mv: Move, threshold: i32) -> bool {
        self.see(mv) >= threshold
    }

    /// `stm` 側で `to` に利いている最も安い駒（`occ` に残っているもののみ）
    fn least_valuable_attacker(
        &self,
        to: Square,
        stm: Color,
        occ: Bitboard,
    ) -> Option<(PieceType, Square)> {
        let candidates = [
            (PieceType::Pawn, pawn_attacks(stm.opponent(), to)),
            (PieceType::Knight, knight_attacks(to)),
            (PieceType::Bishop, bishop_attacks(to, occ)),
            (PieceType::Rook, rook_attacks(to, occ)),
            (PieceType::Queen, queen_attacks(to, occ)),
            (PieceType::King, king_attacks(to)),
        ];
        for (pt, attacks) in candidates {
            let attackers = attacks & self.pieces_of(stm, pt) & occ;
            if let Some(sq) = attackers.lsb() {
                return Some((pt, sq));
            }
        }
        None
    }
}
