//! 置換表モジュール
//!
//! 探索結果をキャッシュする置換表（Transposition Table）。
//!
//! - `TTEntry`: エントリ（10バイト、16bitタグ + 64bit本体）
//! - `Bucket`: エントリ3つのグループ
//! - `TranspositionTable`: テーブル本体
//! - 世代管理（5bit の age）
//!
//! バケットインデックスは `key * buckets` の上位64bit、
//! バケット内マッチングには下位16bitを使う。

mod entry;
mod table;

pub use entry::{TTData, TTEntry};
pub use table::{ProbeResult, TranspositionTable};

use crate::types::Value;

/// バケット内のエントリ数
pub const BUCKET_SIZE: usize = 3;

/// 1エントリのバイト数（サイズ計算用）
pub const ENTRY_BYTES: usize = 10;

/// age の周期
pub const AGE_CYCLE: u8 = 1 << 5;
pub const AGE_MASK: u8 = AGE_CYCLE - 1;

/// これを超える評価値は詰みスコアとして ply 補正する
pub const MATE_THRESHOLD: i32 = 31000;

/// 評価値が入っていないことを表す値
pub const SCORE_NONE_TT: i16 = 0x7FFF;

/// 探索中の値（ルートからの距離基準）を置換表用（局面基準）に変換
#[inline]
pub fn score_to_tt(score: Value, ply: i32) -> Value {
    let s = score.raw();
    if s > MATE_THRESHOLD {
        Value::new(s + ply)
    } else if s < -MATE_THRESHOLD {
        Value::new(s - ply)
    } else {
        score
    }
}

/// 置換表の値を探索中の値に戻す
#[inline]
pub fn score_from_tt(score: Value, ply: i32) -> Value {
    let s = score.raw();
    if s > MATE_THRESHOLD {
        Value::new(s - ply)
    } else if s < -MATE_THRESHOLD {
        Value::new(s + ply)
    } else {
        score
    }
}
