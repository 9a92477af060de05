//! 指し手（Move）
//!
//! 16bit 表現:
//! - bit 0-5: 移動先
//! - bit 6-11: 移動元
//! - bit 12-13: 成り駒（0=N, 1=B, 2=R, 3=Q）
//! - bit 14-15: 種別（0=通常, 1=成り, 2=アンパッサン, 3=キャスリング）

use std::fmt;

use super::{PieceType, Square};

/// 指し手の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveKind {
    Normal = 0,
    Promotion = 1,
    EnPassant = 2,
    Castle = 3,
}

/// 指し手
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Move(u16);

impl Move {
    /// 指し手なし（生成されることはない）
    pub const NONE: Move = Move(0);

    /// 成り駒の並び（2bit 値の順）
    pub const PROMOTION_PIECES: [PieceType; 4] =
        [PieceType::Knight, PieceType::Bishop, PieceType::Rook, PieceType::Queen];

    /// 通常の指し手
    #[inline]
    pub const fn new(from: Square, to: Square, kind: MoveKind) -> Move {
        Move(to.raw() as u16 | (from.raw() as u16) << 6 | (kind as u16) << 14)
    }

    /// 成り（promo は N/B/R/Q のいずれか）
    #[inline]
    pub const fn new_promotion(from: Square, to: Square, promo: PieceType) -> Move {
        let p = match promo {
            PieceType::Bishop => 1,
            PieceType::Rook => 2,
            PieceType::Queen => 3,
            _ => 0,
        };
        Move(to.raw() as u16 | (from.raw() as u16) << 6 | p << 12 | (MoveKind::Promotion as u16) << 14)
    }

    /// 生の16bit値から生成
    #[inline]
    pub const fn from_u16(raw: u16) -> Move {
        Move(raw)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != 0
    }

    #[inline]
    pub const fn to(self) -> Square {
        Square::from_index_unchecked((self.0 & 0x3F) as usize)
    }

    #[inline]
    pub const fn from(self) -> Square {
        Square::from_index_unchecked(((self.0 >> 6) & 0x3F) as usize)
    }

    #[inline]
    pub const fn kind(self) -> MoveKind {
        match self.0 >> 14 {
            0 => MoveKind::Normal,
            1 => MoveKind::Promotion,
            2 => MoveKind::EnPassant,
            _ => MoveKind::Castle,
        }
    }

    /// 成り駒フィールド（0..4）
    #[inline]
    pub const fn promotion_bits(self) -> u8 {
        ((self.0 >> 12) & 3) as u8
    }

    /// 成り駒の駒種（成りでなければ None）
    #[inline]
    pub const fn promotion(self) -> Option<PieceType> {
        if self.is_promotion() {
            Some(Self::PROMOTION_PIECES[self.promotion_bits() as usize])
        } else {
            None
        }
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        matches!(self.kind(), MoveKind::Promotion)
    }

    #[inline]
    pub const fn is_en_passant(self) -> bool {
        matches!(self.kind(), MoveKind::EnPassant)
    }

    #[inline]
    pub const fn is_castle(self) -> bool {
        matches!(self.kind(), MoveKind::Castle)
    }

    /// butterfly history 用 from*64+to
    #[inline]
    pub const fn from_to(self) -> usize {
        (self.0 & 0x0FFF) as usize
    }

    /// UCI 表記（"e2e4", "e7e8q"）
    pub fn to_uci(self) -> String {
        if self.is_none() {
            return "0000".to_string();
        }
        let mut s = format!("{}{}", self.from(), self.to());
        if let Some(pt) = self.promotion() {
            s.push(pt.to_char());
        }
        s
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({} {:?})", self.to_uci(), self.kind())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uci())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn test_move_bit_layout() {
        let mv = Move::new(sq("e2"), sq("e4"), MoveKind::Normal);
        assert_eq!(mv.raw(), 28 | (12 << 6));
        assert_eq!(mv.from(), sq("e2"));
        assert_eq!(mv.to(), sq("e4"));
        assert_eq!(mv.kind(), MoveKind::Normal);
    }

    #[test]
    fn test_move_promotion() {
        let mv = Move::new_promotion(sq("a7"), sq("a8"), PieceType::Queen);
        assert_eq!(mv.kind(), MoveKind::Promotion);
        assert_eq!(mv.promotion(), Some(PieceType::Queen));
        assert_eq!(mv.to_uci(), "a7a8q");

        let under = Move::new_promotion(sq("b2"), sq("b1"), PieceType::Knight);
        assert_eq!(under.promotion(), Some(PieceType::Knight));
        assert_eq!(under.to_uci(), "b2b1n");
    }

    #[test]
    fn test_move_none() {
        assert!(Move::NONE.is_none());
        assert_eq!(Move::NONE.to_uci(), "0000");
        assert!(Move::new(sq("a1"), sq("a2"), MoveKind::Normal).is_some());
    }

    #[test]
    fn test_move_special_kinds() {
        let castle = Move::new(Square::E1, Square::G1, MoveKind::Castle);
        assert!(castle.is_castle());
        assert_eq!(castle.to_uci(), "e1g1");
        let ep = Move::new(sq("e5"), sq("d6"), MoveKind::EnPassant);
        assert!(ep.is_en_passant());
        assert_eq!(ep.promotion(), None);
    }
}
