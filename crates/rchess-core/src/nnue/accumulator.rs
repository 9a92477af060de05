//! Accumulator（隠れ層の累積値）と探索用スタック
//!
//! 探索中は ply ごとに 1 エントリを持ち、`push` で直前の指し手の駒の増減を記録する。
//! 累積値は評価が必要になったときに、計算済みの祖先から差分で求める。

use super::HL_SIZE;
use super::network::{Network, feature_index};
use crate::position::Position;
use crate::types::{Color, MAX_PLY, Piece, Square};

/// 1手で変化した駒（最大 2 個の追加と 2 個の削除）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyPiece {
    added: [(Piece, Square); 2],
    removed: [(Piece, Square); 2],
    added_len: u8,
    removed_len: u8,
}

impl Default for DirtyPiece {
    fn default() -> Self {
        Self {
            added: [(Piece::W_PAWN, Square::A1); 2],
            removed: [(Piece::W_PAWN, Square::A1); 2],
            added_len: 0,
            removed_len: 0,
        }
    }
}

impl DirtyPiece {
    #[inline]
    pub fn add(&mut self, piece: Piece, sq: Square) {
        debug_assert!(self.added_len < 2);
        self.added[self.added_len as usize] = (piece, sq);
        self.added_len += 1;
    }

    #[inline]
    pub fn remove(&mut self, piece: Piece, sq: Square) {
        debug_assert!(self.removed_len < 2);
        self.removed[self.removed_len as usize] = (piece, sq);
        self.removed_len += 1;
    }

    #[inline]
    pub fn added_len(&self) -> usize {
        self.added_len as usize
    }

    #[inline]
    pub fn removed_len(&self) -> usize {
        self.removed_len as usize
    }

    #[inline]
    pub fn added(&self) -> &[(Piece, Square)] {
        &self.added[..self.added_len as usize]
    }

    #[inline]
    pub fn removed(&self) -> &[(Piece, Square)] {
        &self.removed[..self.removed_len as usize]
    }
}

/// 両視点の累積値
#[derive(Clone)]
#[repr(C, align(64))]
pub struct Accumulator {
    /// [白視点, 黒視点]
    values: [[i16; HL_SIZE]; 2],
    pub computed: bool,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self {
            values: [[0; HL_SIZE]; 2],
            computed: false,
        }
    }
}

impl Accumulator {
    /// `perspective` 視点の累積値
    #[inline]
    pub fn view(&self, perspective: Color) -> &[i16; HL_SIZE] {
        &self.values[perspective.index()]
    }

    /// 差分なしで計算
    pub fn refresh(&mut self, net: &Network, pos: &Position) {
        for perspective in [Color::White, Color::Black] {
            let acc = &mut self.values[perspective.index()];
            acc.copy_from_slice(net.biases());
            for sq in pos.occupied() {
                if let Some(piece) = pos.piece_on(sq) {
                    add_weights(acc, net.feature_weights(feature_index(perspective, piece, sq)));
                }
            }
        }
        self.computed = true;
    }

    /// `prev` に `dirty` の変化を適用した値を自分に書く
    pub fn update_from(&mut self, prev: &Accumulator, net: &Network, dirty: &DirtyPiece) {
        for perspective in [Color::White, Color::Black] {
            let p = perspective.index();
            let w = |e: &(Piece, Square)| weights_of(net, perspective, e);
            let to = &mut self.values[p];
            let from = &prev.values[p];
            match (dirty.added(), dirty.removed()) {
                ([a], [s]) => add_sub(to, from, w(a), w(s)),
                ([a], [s1, s2]) => add_sub_sub(to, from, w(a), w(s1), w(s2)),
                ([a1, a2], [s1, s2]) => add_add_sub_sub(to, from, w(a1), w(a2), w(s1), w(s2)),
                (added, removed) => {
                    to.copy_from_slice(from);
                    for s in removed {
                        sub_weights(to, w(s));
                    }
                    for a in added {
                        add_weights(to, w(a));
                    }
                }
            }
        }
        self.computed = true;
    }
}

#[inline]
fn weights_of<'n>(
    net: &'n Network,
    perspective: Color,
    &(piece, sq): &(Piece, Square),
) -> &'n [i16] {
    net.feature_weights(feature_index(perspective, piece, sq))
}

#[inline]
fn add_weights(acc: &mut [i16; HL_SIZE], w: &[i16]) {
    for (a, &x) in acc.iter_mut().zip(w) {
        *a = a.wrapping_add(x);
    }
}

#[inline]
fn sub_weights(acc: &mut [i16; HL_SIZE], w: &[i16]) {
    for (a, &x) in acc.iter_mut().zip(w) {
        *a = a.wrapping_sub(x);
    }
}

/// 通常の移動
#[inline]
fn add_sub(to: &mut [i16; HL_SIZE], from: &[i16; HL_SIZE], a: &[i16], s: &[i16]) {
    for i in 0..HL_SIZE {
        to[i] = from[i].wrapping_add(a[i]).wrapping_sub(s[i]);
    }
}

/// 駒取り・アンパッサン・成って取る手
#[inline]
fn add_sub_sub(
    to: &mut [i16; HL_SIZE],
    from: &[i16; HL_SIZE],
    a: &[i16],
    s1: &[i16],
    s2: &[i16],
) {
    for i in 0..HL_SIZE {
        to[i] = from[i].wrapping_add(a[i]).wrapping_sub(s1[i]).wrapping_sub(s2[i]);
    }
}

/// キャスリング
#[inline]
fn add_add_sub_sub(
    to: &mut [i16; HL_SIZE],
    from: &[i16; HL_SIZE],
    a1: &[i16],
    a2: &[i16],
    s1: &[i16],
    s2: &[i16],
) {
    for i in 0..HL_SIZE {
        to[i] = from[i]
            .wrapping_add(a1[i])
            .wrapping_add(a2[i])
            .wrapping_sub(s1[i])
            .wrapping_sub(s2[i]);
    }
}

struct StackEntry {
    acc: Accumulator,
    dirty: DirtyPiece,
}

/// 探索用の Accumulator スタック
///
/// ルートでだけ `refresh` し、以降は `push`/`pop` で ply を上下する。
/// `pop` は添字を戻すだけ。
pub struct AccumulatorStack {
    entries: Vec<StackEntry>,
    current: usize,
}

impl AccumulatorStack {
    pub fn new() -> Self {
        let capacity = MAX_PLY as usize + 8;
        let entries = (0..capacity)
            .map(|_| StackEntry {
                acc: Accumulator::default(),
                dirty: DirtyPiece::default(),
            })
            .collect();
        Self {
            entries,
            current: 0,
        }
    }

    /// ルート局面で全計算し、スタックを空にする
    pub fn refresh(&mut self, net: &Network, pos: &Position) {
        self.current = 0;
        self.entries[0].acc.refresh(net, pos);
    }

    /// 指し手（null move なら変化なし）を積む
    #[inline]
    pub fn push(&mut self, dirty: DirtyPiece) {
        self.current += 1;
        if self.current == self.entries.len() {
            self.entries.push(StackEntry {
                acc: Accumulator::default(),
                dirty,
            });
        }
        let entry = &mut self.entries[self.current];
        entry.dirty = dirty;
        entry.acc.computed = false;
    }

    #[inline]
    pub fn pop(&mut self) {
        debug_assert!(self.current > 0);
        self.current = self.current.saturating_sub(1);
    }

    /// 現在の ply
    #[inline]
    pub fn depth(&self) -> usize {
        self.current
    }

    /// 現在の累積値（未計算なら祖先から差分で求める）
    pub fn current(&mut self, net: &Network) -> &Accumulator {
        let mut base = self.current;
        while base > 0 && !self.entries[base].acc.computed {
            base -= 1;
        }
        for i in base + 1..=self.current {
            let (head, tail) = self.entries.split_at_mut(i);
            let entry = &mut tail[0];
            entry.acc.update_from(&head[i - 1].acc, net, &entry.dirty);
        }
        &self.entries[self.current].acc
    }

    /// 現局面の評価値
    pub fn evaluate(&mut self, net: &Network, pos: &Position) -> i32 {
        let acc = self.current(net);
        net.evaluate(acc, pos)
    }
}

impl Default for AccumulatorStack {
    fn default() -> Self {
        Self::new()
    }
}
