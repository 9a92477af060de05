//! 置換表エントリ
//!
//! 本体 64bit のレイアウト:
//! - bit 0-15: 指し手
//! - bit 16-31: 評価値（i16、局面基準）
//! - bit 32-47: 静的評価（i16）
//! - bit 48-55: 深さ
//! - bit 56-63: `bound(2) | was_pv(1) | age(5)`

use super::{AGE_CYCLE, AGE_MASK, SCORE_NONE_TT};
use crate::types::{Bound, Move, Value};

/// 置換表から読み出したデータ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TTData {
    pub mv: Move,
    /// 局面基準の値（`score_from_tt` で変換して使う）
    pub score: Value,
    /// 静的評価（なければ `SCORE_NONE_TT`）
    pub eval: Value,
    pub depth: i32,
    pub bound: Bound,
    pub was_pv: bool,
}

impl TTData {
    pub const EMPTY: TTData = TTData {
        mv: Move::NONE,
        score: Value::new(SCORE_NONE_TT as i32),
        eval: Value::new(SCORE_NONE_TT as i32),
        depth: 0,
        bound: Bound::None,
        was_pv: false,
    };

    /// 静的評価が保存されているか
    #[inline]
    pub fn has_eval(&self) -> bool {
        self.eval.raw() != SCORE_NONE_TT as i32
    }
}

/// 置換表エントリ（10バイト）
///
/// 本体は `u64` だとアラインが 8 になるため、16bit 単位で持つ。
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct TTEntry {
    key16: u16,
    body: [u16; 4],
}

const _: () = assert!(std::mem::size_of::<TTEntry>() == 10);

impl TTEntry {
    pub const fn new() -> Self {
        Self {
            key16: 0,
            body: [0; 4],
        }
    }

    #[inline]
    pub fn key16(&self) -> u16 {
        self.key16
    }

    /// 本体を 64bit として読む
    #[inline]
    pub fn body(&self) -> u64 {
        self.body[0] as u64
            | (self.body[1] as u64) << 16
            | (self.body[2] as u64) << 32
            | (self.body[3] as u64) << 48
    }

    #[inline]
    fn set_body(&mut self, body: u64) {
        self.body = [body as u16, (body >> 16) as u16, (body >> 32) as u16, (body >> 48) as u16];
    }

    /// 何か書き込まれたことがあるか
    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.key16 != 0 || self.body() != 0
    }

    #[inline]
    pub fn depth8(&self) -> u8 {
        (self.body() >> 48) as u8
    }

    #[inline]
    fn age_bound_pv(&self) -> u8 {
        (self.body() >> 56) as u8
    }

    #[inline]
    pub fn age(&self) -> u8 {
        (self.age_bound_pv() >> 3) & AGE_MASK
    }

    /// 現在の世代から見た古さ（0..32）
    #[inline]
    pub fn age_distance(&self, table_age: u8) -> u8 {
        (AGE_CYCLE + table_age - self.age()) & AGE_MASK
    }

    /// デコードして読み出す
    pub fn read(&self) -> TTData {
        let body = self.body();
        let abpv = self.age_bound_pv();
        TTData {
            mv: Move::from_u16(body as u16),
            score: Value::new((body >> 16) as u16 as i16 as i32),
            eval: Value::new((body >> 32) as u16 as i16 as i32),
            depth: self.depth8() as i32,
            bound: Bound::from_u8(abpv & 0b11),
            was_pv: abpv & 0b100 != 0,
        }
    }

    /// 書き込み
    ///
    /// 深さが足りない同一局面への書き込みでは、指し手だけを更新する。
    #[allow(clippy::too_many_arguments)]
    pub fn save(
        &mut self,
        key: u64,
        score: Value,
        eval: Value,
        bound: Bound,
        depth: i32,
        mv: Move,
        is_pv: bool,
        was_pv: bool,
        table_age: u8,
    ) {
        let want = key as u16;
        let key_mismatch = self.key16 != want;
        let old = self.body();

        let mut packed_move = old as u16;
        if mv.is_some() || key_mismatch {
            packed_move = mv.raw();
        }

        let pv_bonus = if is_pv { 2 } else { 0 };
        let overwrite = bound == Bound::Exact
            || key_mismatch
            || depth + 5 + pv_bonus > self.depth8() as i32
            || self.age() != table_age;

        let mut body = (old & !0xFFFF) | packed_move as u64;
        if overwrite {
            let score16 = score.raw().clamp(i16::MIN as i32, i16::MAX as i32) as i16;
            let eval16 = eval.raw().clamp(i16::MIN as i32, i16::MAX as i32) as i16;
            let depth8 = depth.clamp(0, 255) as u8;
            let pv_bit = if was_pv { 0b100 } else { 0 };
            let abpv = (bound as u8 & 0b11) | pv_bit | (table_age & AGE_MASK) << 3;
            body = packed_move as u64
                | (score16 as u16 as u64) << 16
                | (eval16 as u16 as u64) << 32
                | (depth8 as u64) << 48
                | (abpv as u64) << 56;
        }
        self.set_body(body);
        self.key16 = want;
    }
}
