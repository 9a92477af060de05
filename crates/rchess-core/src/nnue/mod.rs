//! NNUE評価関数
//!
//! 768 入力（手番側視点と相手側視点の 2 本）→ 2048 次元の隠れ層 → 8 出力バケット。
//!
//! ```text
//! 入力 768 ──L1(i16)──> 隠れ層 2048 × 2視点 ──SCReLU──> 出力 (バケット = 駒数で選択)
//! ```
//!
//! - `network`: 重みの読み込みと出力層の計算
//! - `accumulator`: 隠れ層の差分更新（探索 ply ごとのスタック）

mod accumulator;
mod network;

pub use accumulator::{Accumulator, AccumulatorStack, DirtyPiece};
pub use network::{Network, feature_index, output_bucket};

/// 入力特徴量数（2色 × 6駒種 × 64マス）
pub const INPUT_SIZE: usize = 768;

/// 隠れ層の次元
pub const HL_SIZE: usize = 2048;

/// 出力バケット数
pub const OUTPUT_BUCKETS: usize = 8;

/// L1 の量子化係数
pub const QA: i64 = 255;

/// 出力層の量子化係数
pub const QB: i64 = 64;

/// 出力を centipawn に直す係数
pub const SCALE: i64 = 400;

/// 重みファイルのバイト数
pub const NETWORK_BYTES: usize =
    (INPUT_SIZE * HL_SIZE + HL_SIZE + 2 * HL_SIZE * OUTPUT_BUCKETS + OUTPUT_BUCKETS) * 2;
