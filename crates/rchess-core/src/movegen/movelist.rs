//! 指し手リスト

use crate::types::{MAX_MOVES, Move};

/// 指し手とスコアのペア（オーダリング用）
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtMove {
    pub mv: Move,
    pub value: i32,
}

impl ExtMove {
    #[inline]
    pub const fn new(mv: Move, value: i32) -> Self {
        Self { mv, value }
    }
}

impl From<Move> for ExtMove {
    #[inline]
    fn from(mv: Move) -> Self {
        Self { mv, value: 0 }
    }
}

/// 指し手生成バッファ
pub struct MoveList {
    moves: [ExtMove; MAX_MOVES],
    len: usize,
}

impl MoveList {
    #[inline]
    pub const fn new() -> Self {
        Self {
            moves: [ExtMove::new(Move::NONE, 0); MAX_MOVES],
            len: 0,
        }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// 指し手を追加
    #[inline]
    pub fn push(&mut self, mv: Move) {
        debug_assert!(self.len < MAX_MOVES);
        if self.len < MAX_MOVES {
            self.moves[self.len] = ExtMove::from(mv);
            self.len += 1;
        }
    }

    /// i番目の指し手
    #[inline]
    pub fn at(&self, i: usize) -> Move {
        debug_assert!(i < self.len);
        self.moves[i].mv
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.moves[..self.len].iter().map(|e| e.mv)
    }

    pub fn contains(&self, mv: Move) -> bool {
        self.iter().any(|m| m == mv)
    }

    #[inline]
    pub fn as_slice(&self) -> &[ExtMove] {
        &self.moves[..self.len]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [ExtMove] {
        &mut self.moves[..self.len]
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MoveKind, Square};

    #[test]
    fn test_movelist_push_and_contains() {
        let mut list = MoveList::new();
        assert!(list.is_empty());
        let mv = Move::new(Square::E1, Square::F1, MoveKind::Normal);
        list.push(mv);
        assert_eq!(list.len(), 1);
        assert_eq!(list.at(0), mv);
        assert!(list.contains(mv));
        assert!(!list.contains(Move::new(Square::E1, Square::D1, MoveKind::Normal)));
        list.clear();
        assert!(list.is_empty());
    }
}
