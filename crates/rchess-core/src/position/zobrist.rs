//! Zobrist ハッシュ
//!
//! 固定シードの Xoshiro256++ から 64bit 乱数を取り出して初期化する。
//! 取り出し順は 駒×升 → 手番 → 1個捨て → キャスリング16通り → EP筋8通り。

use std::sync::LazyLock;

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::types::{Piece, Square};

const ZOBRIST_SEED: u64 = 934_572;

/// Zobrist 乱数テーブル
pub struct Zobrist {
    pub psq: [[u64; Square::NUM]; Piece::NUM],
    pub side: u64,
    /// キャスリング権 4bit 値そのもので引く（0 も含めて常に XOR する）
    pub castling: [u64; 16],
    pub ep_file: [u64; 8],
}

pub static ZOBRIST: LazyLock<Zobrist> = LazyLock::new(Zobrist::new);

impl Zobrist {
    fn new() -> Self {
        let mut rng = zobrist_rng();

        let mut psq = [[0u64; Square::NUM]; Piece::NUM];
        for piece in psq.iter_mut() {
            for key in piece.iter_mut() {
                *key = rng.next_u64();
            }
        }

        let side = rng.next_u64();
        let _ = rng.next_u64();

        let mut castling = [0u64; 16];
        for key in castling.iter_mut() {
            *key = rng.next_u64();
        }

        let mut ep_file = [0u64; 8];
        for key in ep_file.iter_mut() {
            *key = rng.next_u64();
        }

        Self {
            psq,
            side,
            castling,
            ep_file,
        }
    }
}

fn zobrist_rng() -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(ZOBRIST_SEED)
}

#[inline]
pub fn zobrist_psq(piece: Piece, sq: Square) -> u64 {
    ZOBRIST.psq[piece.index()][sq.index()]
}

#[inline]
pub fn zobrist_side() -> u64 {
    ZOBRIST.side
}

#[inline]
pub fn zobrist_castling(rights: u8) -> u64 {
    ZOBRIST.castling[(rights & 0xF) as usize]
}

#[inline]
pub fn zobrist_ep(sq: Square) -> u64 {
    ZOBRIST.ep_file[sq.file() as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zobrist_draw_order() {
        let mut rng = zobrist_rng();
        let first = rng.next_u64();
        assert_eq!(ZOBRIST.psq[0][0], first);

        let mut rng = zobrist_rng();
        for _ in 0..Piece::NUM * Square::NUM {
            rng.next_u64();
        }
        assert_eq!(ZOBRIST.side, rng.next_u64());
        rng.next_u64();
        assert_eq!(ZOBRIST.castling[0], rng.next_u64());
    }

    #[test]
    fn test_zobrist_keys_distinct() {
        let mut keys: Vec<u64> = ZOBRIST.psq.iter().flatten().copied().collect();
        keys.push(ZOBRIST.side);
        keys.extend_from_slice(&ZOBRIST.castling);
        keys.extend_from_slice(&ZOBRIST.ep_file);
        let n = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), n);
    }
}
