//! 近接駒（キング・ナイト・ポーン）の利きテーブル
//!
//! オフセットのテンプレートから生成し、盤端の折り返しは除外する。

use std::sync::OnceLock;

use super::Bitboard;
use crate::types::{Color, Square};

struct LeaperTable {
    king: [Bitboard; Square::NUM],
    knight: [Bitboard; Square::NUM],
    pawn: [[Bitboard; Square::NUM]; Color::NUM],
}

static LEAPER_ATTACKS: OnceLock<LeaperTable> = OnceLock::new();

fn leaper_attacks() -> &'static LeaperTable {
    LEAPER_ATTACKS.get_or_init(LeaperTable::new)
}

const KING_OFFSETS: [(i8, i8); 8] =
    [(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1)];

const KNIGHT_OFFSETS: [(i8, i8); 8] =
    [(-2, -1), (-2, 1), (-1, -2), (-1, 2), (1, -2), (1, 2), (2, -1), (2, 1)];

/// (筋差, 段差) のテンプレートを盤内に限って適用する
fn step_attacks(sq: Square, offsets: &[(i8, i8)]) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    for &(df, dr) in offsets {
        let f = sq.file() as i8 + df;
        let r = sq.rank() as i8 + dr;
        if (0..8).contains(&f) && (0..8).contains(&r) {
            bb |= Bitboard(1u64 << (r * 8 + f));
        }
    }
    bb
}

impl LeaperTable {
    fn new() -> Self {
        let mut king = [Bitboard::EMPTY; Square::NUM];
        let mut knight = [Bitboard::EMPTY; Square::NUM];
        let mut pawn = [[Bitboard::EMPTY; Square::NUM]; Color::NUM];

        for sq in Square::all() {
            king[sq.index()] = step_attacks(sq, &KING_OFFSETS);
            knight[sq.index()] = step_attacks(sq, &KNIGHT_OFFSETS);
            // 白は +7 / +9、黒は -9 / -7
            pawn[Color::White.index()][sq.index()] = step_attacks(sq, &[(-1, 1), (1, 1)]);
            pawn[Color::Black.index()][sq.index()] = step_attacks(sq, &[(-1, -1), (1, -1)]);
        }

        LeaperTable { king, knight, pawn }
    }
}

/// キングの利き
#[inline]
pub fn king_attacks(sq: Square) -> Bitboard {
    leaper_attacks().king[sq.index()]
}

/// ナイトの利き
#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard {
    leaper_attacks().knight[sq.index()]
}

/// `color` のポーンが `sq` にいるときの利き
#[inline]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    leaper_attacks().pawn[color.index()][sq.index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn test_king_attacks_corner() {
        let bb = king_attacks(Square::A1);
        assert_eq!(bb.count(), 3);
        assert!(bb.contains(Square::B1));
        assert!(bb.contains(sq("a2")));
        assert!(bb.contains(sq("b2")));
    }

    #[test]
    fn test_knight_attacks_no_wrap() {
        assert_eq!(knight_attacks(Square::H1).count(), 2);
        assert_eq!(knight_attacks(sq("d4")).count(), 8);
        assert!(!knight_attacks(sq("h3")).contains(sq("a4")));
    }

    #[test]
    fn test_pawn_attacks() {
        let w = pawn_attacks(Color::White, sq("a2"));
        assert_eq!(w, Bitboard::from_square(sq("b3")));
        let b = pawn_attacks(Color::Black, sq("e5"));
        assert!(b.contains(sq("d4")) && b.contains(sq("f4")));
        assert!(pawn_attacks(Color::White, sq("c8")).is_empty());
        assert!(pawn_attacks(Color::Black, sq("c1")).is_empty());
    }
}
