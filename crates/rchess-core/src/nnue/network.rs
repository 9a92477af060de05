//! ネットワークの重みと評価
//!
//! ファイルは i16 のリトルエンディアン列で、以下の順に並ぶ。
//!
//! 1. L1 重み `[768][2048]`
//! 2. L1 バイアス `[2048]`
//! 3. 出力重み: `i in 0..4096` ごとに 8 バケット分（`i < 2048` が手番側）
//! 4. 出力バイアス `[8]`

use super::accumulator::Accumulator;
use super::{HL_SIZE, INPUT_SIZE, NETWORK_BYTES, OUTPUT_BUCKETS, QA, QB, SCALE};
use crate::error::NetworkError;
use crate::position::Position;
use crate::types::{Color, Piece, Square};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::path::Path;

/// 特徴量インデックス
///
/// 白視点は `color*384 + type*64 + sq`、黒視点は色を入れ替えて盤を上下反転する。
#[inline]
pub fn feature_index(perspective: Color, piece: Piece, sq: Square) -> usize {
    let side = piece.color().index();
    let pt = piece.piece_type().index();
    match perspective {
        Color::White => side * 384 + pt * 64 + sq.index(),
        Color::Black => (side ^ 1) * 384 + pt * 64 + (sq.index() ^ 56),
    }
}

/// 出力バケット（玉以外の駒数 / 4）
#[inline]
pub fn output_bucket(pos: &Position) -> usize {
    let non_kings = pos.occupied().count() as i32 - 2;
    (non_kings / 4).clamp(0, OUTPUT_BUCKETS as i32 - 1) as usize
}

#[inline]
fn screlu(x: i16) -> i64 {
    let v = (x as i64).clamp(0, QA);
    v * v
}

/// NNUE ネットワーク
#[derive(Debug)]
pub struct Network {
    /// L1 重み `[INPUT_SIZE][HL_SIZE]`（row-major）
    l1_weights: Box<[i16]>,
    l1_biases: Box<[i16]>,
    /// 出力重み `[bucket][half][HL_SIZE]`（half 0 = 手番側）
    l2_weights: Box<[i16]>,
    l2_biases: [i16; OUTPUT_BUCKETS],
}

impl Network {
    /// ファイルから読み込み
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NetworkError> {
        let bytes = std::fs::read(path.as_ref())?;
        let net = Self::from_bytes(&bytes)?;
        log::debug!("NNUE loaded: {}", path.as_ref().display());
        Ok(net)
    }

    /// バイト列から読み込み（サイズは厳密に一致しなければならない）
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NetworkError> {
        if bytes.len() != NETWORK_BYTES {
            return Err(NetworkError::SizeMismatch {
                expected: NETWORK_BYTES,
                actual: bytes.len(),
            });
        }
        let mut values = bytes.chunks_exact(2).map(|c| i16::from_le_bytes([c[0], c[1]]));
        let mut take = |n: usize| -> Box<[i16]> { values.by_ref().take(n).collect() };

        let l1_weights = take(INPUT_SIZE * HL_SIZE);
        let l1_biases = take(HL_SIZE);

        let raw_out = take(2 * HL_SIZE * OUTPUT_BUCKETS);
        let mut l2_weights = vec![0i16; OUTPUT_BUCKETS * 2 * HL_SIZE].into_boxed_slice();
        for i in 0..2 * HL_SIZE {
            let (half, j) = if i < HL_SIZE { (0, i) } else { (1, i - HL_SIZE) };
            for k in 0..OUTPUT_BUCKETS {
                l2_weights[(k * 2 + half) * HL_SIZE + j] = raw_out[i * OUTPUT_BUCKETS + k];
            }
        }

        let mut l2_biases = [0i16; OUTPUT_BUCKETS];
        for (b, v) in l2_biases.iter_mut().zip(take(OUTPUT_BUCKETS).iter()) {
            *b = *v;
        }

        Ok(Self {
            l1_weights,
            l1_biases,
            l2_weights,
            l2_biases,
        })
    }

    /// 乱数で小さな重みを作る（重みファイルがないときのテスト・ベンチ用）
    ///
    /// 同じシードなら同じネットワークになる。
    pub fn random(seed: u64) -> Self {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let l1_weights = (0..INPUT_SIZE * HL_SIZE).map(|_| rng.random_range(-8..=8)).collect();
        let l1_biases = (0..HL_SIZE).map(|_| rng.random_range(0..=32)).collect();
        let l2_weights = (0..OUTPUT_BUCKETS * 2 * HL_SIZE)
            .map(|_| rng.random_range(-16..=16))
            .collect();
        let mut l2_biases = [0i16; OUTPUT_BUCKETS];
        for b in l2_biases.iter_mut() {
            *b = rng.random_range(-50..=50);
        }
        Self {
            l1_weights,
            l1_biases,
            l2_weights,
            l2_biases,
        }
    }

    /// 書き出し（`from_bytes` と同じ並び）
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NETWORK_BYTES);
        let mut put = |v: i16| out.extend_from_slice(&v.to_le_bytes());
        self.l1_weights.iter().for_each(|&v| put(v));
        self.l1_biases.iter().for_each(|&v| put(v));
        for i in 0..2 * HL_SIZE {
            let (half, j) = if i < HL_SIZE { (0, i) } else { (1, i - HL_SIZE) };
            for k in 0..OUTPUT_BUCKETS {
                put(self.l2_weights[(k * 2 + half) * HL_SIZE + j]);
            }
        }
        self.l2_biases.iter().for_each(|&v| put(v));
        out
    }

    #[inline]
    pub(super) fn biases(&self) -> &[i16] {
        &self.l1_biases
    }

    /// 特徴量 `index` の L1 重み列
    #[inline]
    pub(super) fn feature_weights(&self, index: usize) -> &[i16] {
        let offset = index * HL_SIZE;
        &self.l1_weights[offset..offset + HL_SIZE]
    }

    #[inline]
    fn output_weights(&self, bucket: usize, half: usize) -> &[i16] {
        let offset = (bucket * 2 + half) * HL_SIZE;
        &self.l2_weights[offset..offset + HL_SIZE]
    }

    /// 手番側から見た評価値（centipawn）
    pub fn evaluate(&self, acc: &Accumulator, pos: &Position) -> i32 {
        let stm = pos.side_to_move();
        let bucket = output_bucket(pos);
        let us = acc.view(stm);
        let them = acc.view(stm.opponent());

        let mut sum: i64 = 0;
        for (&a, &w) in us.iter().zip(self.output_weights(bucket, 0)) {
            sum += screlu(a) * w as i64;
        }
        for (&a, &w) in them.iter().zip(self.output_weights(bucket, 1)) {
            sum += screlu(a) * w as i64;
        }

        let out = (sum / QA + self.l2_biases[bucket] as i64) * SCALE / (QA * QB);
        out as i32
    }
}
