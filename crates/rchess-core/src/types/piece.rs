//! 駒種（PieceType）と駒（Piece）
//!
//! 駒のインデックスは `color * 6 + piece_type`。駒種の並びは P, N, B, R, Q, K。

use super::Color;

/// 駒種
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PieceType {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceType {
    /// 駒種の数
    pub const NUM: usize = 6;

    /// 全駒種（インデックス順）
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 0..6 から生成
    #[inline]
    pub const fn from_index(i: usize) -> Option<PieceType> {
        match i {
            0 => Some(PieceType::Pawn),
            1 => Some(PieceType::Knight),
            2 => Some(PieceType::Bishop),
            3 => Some(PieceType::Rook),
            4 => Some(PieceType::Queen),
            5 => Some(PieceType::King),
            _ => None,
        }
    }

    /// 小文字の FEN 表記
    #[inline]
    pub const fn to_char(self) -> char {
        match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        }
    }
}

/// 駒（手番付き）
///
/// 盤上に無いことは `Option<Piece>` で表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Piece(u8);

impl Piece {
    /// 駒の数
    pub const NUM: usize = 12;

    pub const W_PAWN: Piece = Piece(0);
    pub const W_KNIGHT: Piece = Piece(1);
    pub const W_BISHOP: Piece = Piece(2);
    pub const W_ROOK: Piece = Piece(3);
    pub const W_QUEEN: Piece = Piece(4);
    pub const W_KING: Piece = Piece(5);
    pub const B_PAWN: Piece = Piece(6);
    pub const B_KNIGHT: Piece = Piece(7);
    pub const B_BISHOP: Piece = Piece(8);
    pub const B_ROOK: Piece = Piece(9);
    pub const B_QUEEN: Piece = Piece(10);
    pub const B_KING: Piece = Piece(11);

    /// 手番と駒種から生成
    #[inline]
    pub const fn new(color: Color, pt: PieceType) -> Piece {
        Piece(color as u8 * 6 + pt as u8)
    }

    /// 0..12 のインデックスから生成
    #[inline]
    pub const fn from_index(i: usize) -> Option<Piece> {
        if i < Self::NUM { Some(Piece(i as u8)) } else { None }
    }

    /// 範囲検査なし（呼び出し側で 0..12 を保証する）
    #[inline]
    pub(crate) const fn from_index_unchecked(i: usize) -> Piece {
        debug_assert!(i < Self::NUM);
        Piece(i as u8)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn color(self) -> Color {
        if self.0 < 6 { Color::White } else { Color::Black }
    }

    #[inline]
    pub const fn piece_type(self) -> PieceType {
        match self.0 % 6 {
            0 => PieceType::Pawn,
            1 => PieceType::Knight,
            2 => PieceType::Bishop,
            3 => PieceType::Rook,
            4 => PieceType::Queen,
            _ => PieceType::King,
        }
    }

    /// FEN 文字から生成（大文字が白）
    pub fn from_char(c: char) -> Option<Piece> {
        let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
        let pt = match c.to_ascii_lowercase() {
            'p' => PieceType::Pawn,
            'n' => PieceType::Knight,
            'b' => PieceType::Bishop,
            'r' => PieceType::Rook,
            'q' => PieceType::Queen,
            'k' => PieceType::King,
            _ => return None,
        };
        Some(Piece::new(color, pt))
    }

    /// FEN 文字
    pub fn to_char(self) -> char {
        let c = self.piece_type().to_char();
        match self.color() {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_index_layout() {
        assert_eq!(Piece::new(Color::White, PieceType::Pawn).index(), 0);
        assert_eq!(Piece::new(Color::White, PieceType::King).index(), 5);
        assert_eq!(Piece::new(Color::Black, PieceType::Pawn).index(), 6);
        assert_eq!(Piece::new(Color::Black, PieceType::King).index(), 11);
    }

    #[test]
    fn test_piece_color_and_type() {
        assert_eq!(Piece::B_QUEEN.color(), Color::Black);
        assert_eq!(Piece::B_QUEEN.piece_type(), PieceType::Queen);
        assert_eq!(Piece::W_KNIGHT.color(), Color::White);
        assert_eq!(Piece::W_KNIGHT.piece_type(), PieceType::Knight);
    }

    #[test]
    fn test_piece_char_roundtrip() {
        for i in 0..Piece::NUM {
            let pc = Piece::from_index(i).unwrap();
            assert_eq!(Piece::from_char(pc.to_char()), Some(pc));
        }
        assert_eq!(Piece::from_char('x'), None);
    }
}
