//! マス（Square）
//!
//! a1 = 0, h1 = 7, a8 = 56, h8 = 63。`rank * 8 + file`。

use std::fmt;

/// マス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Square(u8);

impl Square {
    /// マスの数
    pub const NUM: usize = 64;

    pub const A1: Square = Square(0);
    pub const B1: Square = Square(1);
    pub const C1: Square = Square(2);
    pub const D1: Square = Square(3);
    pub const E1: Square = Square(4);
    pub const F1: Square = Square(5);
    pub const G1: Square = Square(6);
    pub const H1: Square = Square(7);
    pub const A8: Square = Square(56);
    pub const B8: Square = Square(57);
    pub const C8: Square = Square(58);
    pub const D8: Square = Square(59);
    pub const E8: Square = Square(60);
    pub const F8: Square = Square(61);
    pub const G8: Square = Square(62);
    pub const H8: Square = Square(63);

    /// 0..64 から生成
    #[inline]
    pub const fn new(index: u8) -> Option<Square> {
        if index < 64 { Some(Square(index)) } else { None }
    }

    /// 範囲チェックなしで生成（呼び出し側で 0..64 を保証する）
    #[inline]
    pub(crate) const fn from_index_unchecked(index: usize) -> Square {
        debug_assert!(index < 64);
        Square((index & 63) as u8)
    }

    /// 筋と段から生成
    #[inline]
    pub const fn from_file_rank(file: u8, rank: u8) -> Option<Square> {
        if file < 8 && rank < 8 { Some(Square(rank * 8 + file)) } else { None }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// 筋（a=0..h=7）
    #[inline]
    pub const fn file(self) -> u8 {
        self.0 & 7
    }

    /// 段（1=0..8=7）
    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 >> 3
    }

    /// 上下反転（黒視点の特徴量用）
    #[inline]
    pub const fn flip(self) -> Square {
        Square(self.0 ^ 56)
    }

    /// 明るいマスか（(rank + file) が奇数。a1 は暗いマス）
    #[inline]
    pub const fn is_light(self) -> bool {
        (self.rank() + self.file()) & 1 == 1
    }

    /// 相対オフセット（盤外なら None）
    #[inline]
    pub const fn offset(self, delta: i8) -> Option<Square> {
        let v = self.0 as i16 + delta as i16;
        if v >= 0 && v < 64 { Some(Square(v as u8)) } else { None }
    }

    /// "e4" 形式の文字列から生成
    pub fn parse(s: &str) -> Option<Square> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::from_file_rank(file, rank)
    }

    /// 全マスのイテレータ
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64u8).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, (b'1' + self.rank()) as char)
    }
}
