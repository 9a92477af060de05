//! 指し手の妥当性判定と UCI 文字列の解釈

use super::pos::Position;
use crate::bitboard::{
    Bitboard, bishop_attacks, king_attacks, knight_attacks, queen_attacks, rook_attacks,
};
use crate::movegen::{self, MoveList};
use crate::types::{Color, Move, MoveKind, PieceType, Square};

impl Position {
    /// 現局面で疑似合法な手か（置換表やキラーの手を使う前の検査）
    ///
    /// 自玉への王手放置は見ない。キャスリングだけは通過升の利きまで確認する。
    pub fn is_pseudo_legal(&self, mv: Move) -> bool {
        if mv.is_none() {
            return false;
        }
        let us = self.side_to_move();
        let from = mv.from();
        let to = mv.to();
        if from == to {
            return false;
        }
        let Some(mover) = self.piece_on(from) else {
            return false;
        };
        if mover.color() != us {
            return false;
        }
        let target = self.piece_on(to);
        if let Some(p) = target {
            if p.color() == us {
                return false;
            }
        }

        match mv.kind() {
            MoveKind::Castle => {
                let home = if us == Color::White { Square::E1 } else { Square::E8 };
                mover.piece_type() == PieceType::King
                    && from == home
                    && to.rank() == home.rank()
                    && (to.file() == 6 || to.file() == 2)
                    && target.is_none()
                    && movegen::castle_legal(self, mv)
            }
            MoveKind::EnPassant => {
                if mover.piece_type() != PieceType::Pawn || self.ep_square() != Some(to) {
                    return false;
                }
                let dr = to.rank() as i32 - from.rank() as i32;
                let df = to.file() as i32 - from.file() as i32;
                if dr != rank_step(us) || df.abs() != 1 || target.is_some() {
                    return false;
                }
                let victim = Square::from_index_unchecked(to.index() ^ 8);
                matches!(
                    self.piece_on(victim),
                    Some(p) if p.color() != us && p.piece_type() == PieceType::Pawn
                )
            }
            MoveKind::Promotion => {
                if mover.piece_type() != PieceType::Pawn {
                    return false;
                }
                let (from_rank, to_rank) = if us == Color::White { (6, 7) } else { (1, 0) };
                if from.rank() != from_rank || to.rank() != to_rank {
                    return false;
                }
                let df = (to.file() as i32 - from.file() as i32).abs();
                match df {
                    0 => target.is_none(),
                    1 => target.is_some(),
                    _ => false,
                }
            }
            MoveKind::Normal => {
                self.normal_move_reaches(mv, us, mover.piece_type(), target.is_some())
            }
        }
    }

    fn normal_move_reaches(&self, mv: Move, us: Color, pt: PieceType, is_capture: bool) -> bool {
        let from = mv.from();
        let to = mv.to();
        let occ = self.occupied();
        match pt {
            PieceType::Pawn => {
                let last_rank = if us == Color::White { 7 } else { 0 };
                if to.rank() == last_rank {
                    return false;
                }
                let forward = rank_step(us);
                let dr = to.rank() as i32 - from.rank() as i32;
                let df = (to.file() as i32 - from.file() as i32).abs();
                if df == 0 {
                    if is_capture {
                        return false;
                    }
                    if dr == forward {
                        return true;
                    }
                    let start_rank = if us == Color::White { 1 } else { 6 };
                    if dr == 2 * forward && from.rank() == start_rank {
                        let mid = Square::from_index_unchecked((from.index() + to.index()) / 2);
                        return self.piece_on(mid).is_none();
                    }
                    false
                } else {
                    df == 1 && dr == forward && is_capture
                }
            }
            PieceType::Knight => knight_attacks(from).contains(to),
            PieceType::Bishop => bishop_attacks(from, occ).contains(to),
            PieceType::Rook => rook_attacks(from, occ).contains(to),
            PieceType::Queen => queen_attacks(from, occ).contains(to),
            PieceType::King => king_attacks(from).contains(to),
        }
    }

    /// UCI 表記の指し手を解釈する（疑似合法でなければ None）
    pub fn parse_uci_move(&self, s: &str) -> Option<Move> {
        let s = s.trim();
        if !(4..=5).contains(&s.len()) || !s.is_ascii() {
            return None;
        }
        let from = Square::parse(&s[0..2])?;
        let to = Square::parse(&s[2..4])?;

        let mv = if s.len() == 5 {
            let promo = match s.as_bytes()[4].to_ascii_lowercase() {
                b'n' => PieceType::Knight,
                b'b' => PieceType::Bishop,
                b'r' => PieceType::Rook,
                b'q' => PieceType::Queen,
                _ => return None,
            };
            Move::new_promotion(from, to, promo)
        } else {
            let pt = self.piece_on(from)?.piece_type();
            let file_delta = (to.file() as i32 - from.file() as i32).abs();
            let kind = if pt == PieceType::King && file_delta == 2 {
                MoveKind::Castle
            } else if pt == PieceType::Pawn && self.ep_square() == Some(to) && file_delta != 0 {
                MoveKind::EnPassant
            } else {
                MoveKind::Normal
            };
            Move::new(from, to, kind)
        };

        if self.is_pseudo_legal(mv) { Some(mv) } else { None }
    }

    /// 全合法手（実際に指して自玉が安全なものだけ）
    pub fn legal_moves(&mut self) -> Vec<Move> {
        let mut list = MoveList::new();
        movegen::generate_all(self, &mut list);
        let mut legal = Vec::with_capacity(list.len());
        for mv in list.iter() {
            if self.make_move(mv) {
                self.undo_move();
                legal.push(mv);
            }
        }
        legal
    }

    /// 合法手が1つでもあるか
    pub fn has_legal_move(&mut self) -> bool {
        let mut list = MoveList::new();
        movegen::generate_all(self, &mut list);
        for mv in list.iter() {
            if self.make_move(mv) {
                self.undo_move();
                return true;
            }
        }
        false
    }

    /// 指すと相手玉に王手がかかるか（非合法手なら false）
    pub fn gives_check(&mut self, mv: Move) -> bool {
        if !self.make_move(mv) {
            return false;
        }
        let check = self.is_in_check();
        self.undo_move();
        check
    }

    /// `color` の駒で `sq` に利いているものがあるか（占有 `occ` 基準）
    pub fn attacks_square(&self, sq: Square, color: Color, occ: Bitboard) -> bool {
        (movegen::attackers_to(self, sq, occ) & self.colored(color)).is_not_empty()
    }
}

/// 1手で進む段数（白 +1, 黒 -1）
#[inline]
fn rank_step(us: Color) -> i32 {
    us.forward() as i32 / 8
}
