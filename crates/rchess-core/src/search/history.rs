//! History統計
//!
//! 探索中の手の成功/失敗を記録し、手の順序付けに利用する。
//!
//! - `StatsEntry`: 範囲制限付き履歴エントリ
//! - `ButterflyHistory`: [Color][from_to] -> score
//! - `PieceToHistory`: [piece][to] -> score
//! - `ContinuationHistory`: [prev_pc][prev_to][pc][to] -> score
//! - `CounterMoveHistory`: [piece][square] -> Move

use crate::types::{Color, Move, Piece, Square};

/// from_to インデックスのサイズ
pub const FROM_TO_SIZE: usize = Square::NUM * Square::NUM;

/// ButterflyHistory の値の上限
pub const BUTTERFLY_MAX: i32 = 16384;

/// ContinuationHistory の値の上限
pub const CONTINUATION_MAX: i32 = 16384;

/// quiet 手の history ボーナス（depth²）
#[inline]
pub fn stat_bonus(depth: i32) -> i32 {
    depth * depth
}

// =============================================================================
// StatsEntry
// =============================================================================

/// 履歴統計の1エントリ
///
/// 値の範囲を [-D, D] に制限しながら更新できる。
#[derive(Clone, Copy, Default)]
pub struct StatsEntry<const D: i32> {
    value: i16,
}

impl<const D: i32> StatsEntry<D> {
    #[inline]
    pub fn get(&self) -> i16 {
        self.value
    }

    #[inline]
    pub fn set(&mut self, v: i16) {
        self.value = v;
    }

    /// ボーナス値を加算（範囲制限付き）
    ///
    /// 更新式: entry += clamp(bonus, -D, D) - entry * |clamp(bonus, -D, D)| / D
    ///
    /// bonus == D を繰り返すと entry は D に収束し、超えることはない。
    #[inline]
    pub fn update(&mut self, bonus: i32) {
        let clamped = bonus.clamp(-D, D);
        let delta = clamped - (self.value as i32) * clamped.abs() / D;
        self.value = (self.value as i32 + delta) as i16;
        debug_assert!(self.value.abs() as i32 <= D, "StatsEntry out of range: {} (D={})", self.value, D);
    }
}

// =============================================================================
// ButterflyHistory
// =============================================================================

/// ButterflyHistory: [Color][from_to] -> score
pub struct ButterflyHistory {
    table: [[StatsEntry<BUTTERFLY_MAX>; FROM_TO_SIZE]; Color::NUM],
}

impl ButterflyHistory {
    pub fn new() -> Self {
        Self {
            table: [[StatsEntry::default(); FROM_TO_SIZE]; Color::NUM],
        }
    }

    #[inline]
    pub fn get(&self, color: Color, mv: Move) -> i16 {
        self.table[color.index()][mv.from_to()].get()
    }

    #[inline]
    pub fn update(&mut self, color: Color, mv: Move, bonus: i32) {
        self.table[color.index()][mv.from_to()].update(bonus);
    }

    pub fn clear(&mut self) {
        for color_table in &mut self.table {
            for entry in color_table.iter_mut() {
                entry.set(0);
            }
        }
    }
}

impl Default for ButterflyHistory {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// PieceToHistory / ContinuationHistory
// =============================================================================

/// PieceToHistory: [piece][to] -> score
#[derive(Clone)]
pub struct PieceToHistory {
    table: [[StatsEntry<CONTINUATION_MAX>; Square::NUM]; Piece::NUM],
}

impl PieceToHistory {
    pub fn new() -> Self {
        Self {
            table: [[StatsEntry::default(); Square::NUM]; Piece::NUM],
        }
    }

    #[inline]
    pub fn get(&self, pc: Piece, to: Square) -> i16 {
        self.table[pc.index()][to.index()].get()
    }

    #[inline]
    pub fn update(&mut self, pc: Piece, to: Square, bonus: i32) {
        self.table[pc.index()][to.index()].update(bonus);
    }

    pub fn clear(&mut self) {
        for pc_table in &mut self.table {
            for entry in pc_table.iter_mut() {
                entry.set(0);
            }
        }
    }
}

impl Default for PieceToHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// ContinuationHistory: [prev_piece][prev_to][piece][to] -> score
///
/// 1手前の駒と移動先から、現在の駒と移動先へのスコア（約 1.2MB）。
pub struct ContinuationHistory {
    table: [[PieceToHistory; Square::NUM]; Piece::NUM],
}

impl ContinuationHistory {
    #[inline]
    pub fn get_table(&self, prev_pc: Piece, prev_to: Square) -> &PieceToHistory {
        &self.table[prev_pc.index()][prev_to.index()]
    }

    #[inline]
    pub fn get(&self, prev_pc: Piece, prev_to: Square, pc: Piece, to: Square) -> i16 {
        self.get_table(prev_pc, prev_to).get(pc, to)
    }

    #[inline]
    pub fn update(&mut self, prev_pc: Piece, prev_to: Square, pc: Piece, to: Square, bonus: i32) {
        self.table[prev_pc.index()][prev_to.index()].update(pc, to, bonus);
    }

    pub fn clear(&mut self) {
        for row in self.table.iter_mut() {
            for entry in row.iter_mut() {
                entry.clear();
            }
        }
    }
}

// =============================================================================
// CounterMoveHistory
// =============================================================================

/// CounterMoveHistory: [piece][square] -> Move
///
/// 直前の相手の手（動いた駒と移動先）に対する応手。
pub struct CounterMoveHistory {
    table: [[Move; Square::NUM]; Piece::NUM],
}

impl CounterMoveHistory {
    pub fn new() -> Self {
        Self {
            table: [[Move::NONE; Square::NUM]; Piece::NUM],
        }
    }

    #[inline]
    pub fn get(&self, pc: Piece, sq: Square) -> Move {
        self.table[pc.index()][sq.index()]
    }

    #[inline]
    pub fn set(&mut self, pc: Piece, sq: Square, mv: Move) {
        self.table[pc.index()][sq.index()] = mv;
    }

    pub fn clear(&mut self) {
        for pc_table in &mut self.table {
            pc_table.fill(Move::NONE);
        }
    }
}

impl Default for CounterMoveHistory {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// HistoryTables
// =============================================================================

/// 履歴/統計テーブルをまとめて保持するコンテナ
///
/// `ucinewgame` でクリアし、`go` の間では保持する。
pub struct HistoryTables {
    pub main_history: ButterflyHistory,
    pub continuation_history: ContinuationHistory,
    pub counter_moves: CounterMoveHistory,
}

impl HistoryTables {
    /// 新しいHistoryTablesを作成（ヒープ確保）
    ///
    /// 大きな配列のスタック確保を避けるために `Box::new_zeroed` で一括確保する。
    pub fn new_boxed() -> Box<Self> {
        // SAFETY: 各テーブルは i16 と Move(u16) のみで構成され、ゼロは有効な値
        // （Move のゼロは Move::NONE）。
        unsafe { Box::<Self>::new_zeroed().assume_init() }
    }

    pub fn clear(&mut self) {
        self.main_history.clear();
        self.continuation_history.clear();
        self.counter_moves.clear();
    }

    /// quiet 手の並び替えスコア
    ///
    /// `butterfly[side][from][to] + cont_hist[prev_piece][prev_to][piece][to]`
    #[inline]
    pub fn quiet_score(&self, us: Color, mv: Move, pc: Piece, prev: Option<(Piece, Square)>) -> i32 {
        let mut score = self.main_history.get(us, mv) as i32;
        if let Some((prev_pc, prev_to)) = prev {
            score += self.continuation_history.get(prev_pc, prev_to, pc, mv.to()) as i32;
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MoveKind;

    fn mv(from: &str, to: &str) -> Move {
        Move::new(Square::parse(from).unwrap(), Square::parse(to).unwrap(), MoveKind::Normal)
    }

    #[test]
    fn test_stats_entry_update_convergence() {
        let mut entry = StatsEntry::<1000>::default();
        for _ in 0..100 {
            entry.update(1000);
        }
        assert!(entry.get() <= 1000);
        assert!(entry.get() > 900);

        for _ in 0..200 {
            entry.update(-1000);
        }
        assert!(entry.get() >= -1000);
        assert!(entry.get() < -900);
    }

    #[test]
    fn test_stats_entry_bonus_is_clamped() {
        let mut entry = StatsEntry::<1000>::default();
        entry.update(50_000);
        assert_eq!(entry.get(), 1000);
    }

    #[test]
    fn test_butterfly_history() {
        let mut history = ButterflyHistory::new();
        let m = mv("e2", "e4");
        assert_eq!(history.get(Color::White, m), 0);
        history.update(Color::White, m, 100);
        assert_eq!(history.get(Color::White, m), 100);
        assert_eq!(history.get(Color::Black, m), 0);
        history.clear();
        assert_eq!(history.get(Color::White, m), 0);
    }

    #[test]
    fn test_history_tables_boxed_is_zeroed() {
        let mut h = HistoryTables::new_boxed();
        let knight = Piece::W_KNIGHT;
        let f3 = Square::parse("f3").unwrap();
        assert_eq!(h.counter_moves.get(knight, f3), Move::NONE);
        assert_eq!(h.continuation_history.get(knight, f3, Piece::B_PAWN, Square::E8), 0);

        h.counter_moves.set(knight, f3, mv("d7", "d5"));
        h.continuation_history.update(knight, f3, Piece::B_PAWN, Square::E8, 64);
        h.clear();
        assert_eq!(h.counter_moves.get(knight, f3), Move::NONE);
        assert_eq!(h.continuation_history.get(knight, f3, Piece::B_PAWN, Square::E8), 0);
    }

    #[test]
    fn test_quiet_score_combines_tables() {
        let mut h = HistoryTables::new_boxed();
        let m = mv("g1", "f3");
        let prev = (Piece::B_PAWN, Square::parse("d5").unwrap());
        h.main_history.update(Color::White, m, 40);
        h.continuation_history.update(prev.0, prev.1, Piece::W_KNIGHT, m.to(), 25);
        assert_eq!(h.quiet_score(Color::White, m, Piece::W_KNIGHT, Some(prev)), 65);
        assert_eq!(h.quiet_score(Color::White, m, Piece::W_KNIGHT, None), 40);
    }
}
