//! 1手分の巻き戻し情報

use crate::types::{MoveKind, Piece, PieceType, Square};

/// 取った駒なしを表す 4bit 値
pub(crate) const NO_CAPTURE: u32 = 15;

/// 巻き戻し記録
///
/// `diff` のビット配置:
/// - bit 0-5: 移動元
/// - bit 6-11: 移動先
/// - bit 12-15: 取った駒（15 = なし）
/// - bit 16-19: 動かした駒
/// - bit 20-21: 指し手種別
/// - bit 22-23: 成り駒
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoRecord {
    /// 指す前と後の meta の XOR
    pub meta_delta: u32,
    /// 指す前のハッシュ
    pub prev_key: u64,
    pub diff: u32,
}

impl UndoRecord {
    /// null move の diff
    pub(crate) const NULL_DIFF: u32 = u32::MAX;

    pub(crate) fn pack(
        from: Square,
        to: Square,
        captured: Option<Piece>,
        mover: Piece,
        kind: MoveKind,
        promo_bits: u8,
    ) -> u32 {
        let cap = captured.map_or(NO_CAPTURE, |p| p.index() as u32);
        from.index() as u32
            | (to.index() as u32) << 6
            | cap << 12
            | (mover.index() as u32) << 16
            | (kind as u32) << 20
            | (promo_bits as u32) << 22
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.diff == Self::NULL_DIFF
    }

    #[inline]
    pub fn from(&self) -> Square {
        Square::from_index_unchecked((self.diff & 0x3F) as usize)
    }

    #[inline]
    pub fn to(&self) -> Square {
        Square::from_index_unchecked(((self.diff >> 6) & 0x3F) as usize)
    }

    #[inline]
    pub fn captured(&self) -> Option<Piece> {
        Piece::from_index(((self.diff >> 12) & 0xF) as usize)
    }

    #[inline]
    pub fn mover(&self) -> Piece {
        Piece::from_index_unchecked(((self.diff >> 16) & 0xF) as usize)
    }

    #[inline]
    pub fn kind(&self) -> MoveKind {
        match (self.diff >> 20) & 3 {
            0 => MoveKind::Normal,
            1 => MoveKind::Promotion,
            2 => MoveKind::EnPassant,
            _ => MoveKind::Castle,
        }
    }

    /// 移動先に置かれた駒（成りなら成り駒）
    #[inline]
    pub fn placed(&self) -> Piece {
        let mover = self.mover();
        match self.kind() {
            MoveKind::Promotion => {
                let pt = PieceType::from_index(PieceType::Knight.index() + ((self.diff >> 22) & 3) as usize)
                    .unwrap_or(PieceType::Queen);
                Piece::new(mover.color(), pt)
            }
            _ => mover,
        }
    }

    /// 取った駒があった升（アンパッサンは移動先の背後）
    #[inline]
    pub fn capture_square(&self) -> Square {
        let to = self.to();
        if self.kind() == MoveKind::EnPassant {
            Square::from_index_unchecked(to.index() ^ 8)
        } else {
            to
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    #[test]
    fn test_undo_record_pack() {
        let from = Square::parse("b7").unwrap();
        let to = Square::parse("a8").unwrap();
        let diff = UndoRecord::pack(
            from,
            to,
            Some(Piece::B_ROOK),
            Piece::W_PAWN,
            MoveKind::Promotion,
            3,
        );
        let rec = UndoRecord {
            meta_delta: 0,
            prev_key: 0,
            diff,
        };
        assert_eq!(rec.from(), from);
        assert_eq!(rec.to(), to);
        assert_eq!(rec.captured(), Some(Piece::B_ROOK));
        assert_eq!(rec.mover(), Piece::W_PAWN);
        assert_eq!(rec.kind(), MoveKind::Promotion);
        assert_eq!(rec.placed(), Piece::new(Color::White, PieceType::Queen));
        assert!(!rec.is_null());
    }

    #[test]
    fn test_undo_record_en_passant_square() {
        let diff = UndoRecord::pack(
            Square::parse("e5").unwrap(),
            Square::parse("d6").unwrap(),
            Some(Piece::B_PAWN),
            Piece::W_PAWN,
            MoveKind::EnPassant,
            0,
        );
        let rec = UndoRecord {
            meta_delta: 0,
            prev_key: 0,
            diff,
        };
        assert_eq!(rec.capture_square(), Square::parse("d5").unwrap());
        let none = UndoRecord::pack(Square::A1, Square::B1, None, Piece::W_ROOK, MoveKind::Normal, 0);
        assert_eq!((none >> 12) & 0xF, NO_CAPTURE);
    }
}
