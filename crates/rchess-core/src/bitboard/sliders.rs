//! 遠方駒（ビショップ・ルーク・クイーン）の利きを PEXT 完全ハッシュで引く
//!
//! マスごとに relevant occupancy マスクを持ち、`pext(occ, mask)` を添字として
//! 事前計算済みの利きを引く。テーブルはマスごとに「ルークブロック→ビショップブロック」
//! の順に連続配置され、合計 107 648 要素。
//!
//! 外部リソース（little-endian u64 列）から `SliderTable::from_bytes` で読み込むか、
//! `SliderTable::generate` でビット単位に同一のテーブルを生成する。

use std::sync::OnceLock;

use super::Bitboard;
use crate::error::TableError;
use crate::types::Square;

/// テーブルの総要素数
pub const SLIDER_TABLE_LEN: usize = 107_648;

const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// PEXT 利きテーブル
pub struct SliderTable {
    attacks: Box<[u64]>,
    rook_mask: [u64; Square::NUM],
    bishop_mask: [u64; Square::NUM],
    rook_offset: [u32; Square::NUM],
    bishop_offset: [u32; Square::NUM],
}

static SLIDER_ATTACKS: OnceLock<SliderTable> = OnceLock::new();

/// プロセス共有のテーブル（未設定なら初回アクセス時に生成）
pub fn slider_table() -> &'static SliderTable {
    SLIDER_ATTACKS.get_or_init(SliderTable::generate)
}

impl SliderTable {
    /// 盤上を走査してテーブルを生成する
    pub fn generate() -> Self {
        let (rook_mask, bishop_mask, rook_offset, bishop_offset) = layout();
        let mut attacks = vec![0u64; SLIDER_TABLE_LEN].into_boxed_slice();

        for sq in 0..Square::NUM {
            fill_block(
                &mut attacks,
                sq,
                rook_mask[sq],
                rook_offset[sq] as usize,
                &ROOK_DIRS,
            );
            fill_block(
                &mut attacks,
                sq,
                bishop_mask[sq],
                bishop_offset[sq] as usize,
                &BISHOP_DIRS,
            );
        }

        Self {
            attacks,
            rook_mask,
            bishop_mask,
            rook_offset,
            bishop_offset,
        }
    }

    /// little-endian u64 列から読み込む
    ///
    /// サイズが一致しなければエラー（ゼロ埋めはしない）。
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TableError> {
        let expected = SLIDER_TABLE_LEN * 8;
        if bytes.len() != expected {
            return Err(TableError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let (rook_mask, bishop_mask, rook_offset, bishop_offset) = layout();
        let attacks: Box<[u64]> = bytes
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
            .collect();

        log::debug!("slider table loaded: {} entries", attacks.len());
        Ok(Self {
            attacks,
            rook_mask,
            bishop_mask,
            rook_offset,
            bishop_offset,
        })
    }

    /// little-endian u64 列へ書き出す
    pub fn to_bytes(&self) -> Vec<u8> {
        self.attacks.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    /// プロセス共有テーブルとして登録する（初回アクセス前のみ可能）
    pub fn install(self) -> Result<(), TableError> {
        SLIDER_ATTACKS.set(self).map_err(|_| TableError::AlreadyInitialized)
    }

    #[inline]
    pub fn rook(&self, sq: Square, occ: Bitboard) -> Bitboard {
        let i = sq.index();
        let idx = self.rook_offset[i] as usize + pext(occ.0, self.rook_mask[i]) as usize;
        Bitboard(self.attacks[idx])
    }

    #[inline]
    pub fn bishop(&self, sq: Square, occ: Bitboard) -> Bitboard {
        let i = sq.index();
        let idx = self.bishop_offset[i] as usize + pext(occ.0, self.bishop_mask[i]) as usize;
        Bitboard(self.attacks[idx])
    }
}

/// ルークの利き
#[inline]
pub fn rook_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    slider_table().rook(sq, occ)
}

/// ビショップの利き
#[inline]
pub fn bishop_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    slider_table().bishop(sq, occ)
}

/// クイーンの利き
#[inline]
pub fn queen_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    let table = slider_table();
    table.rook(sq, occ) | table.bishop(sq, occ)
}

// =============================================================================
// 生成
// =============================================================================

type Layout = ([u64; Square::NUM], [u64; Square::NUM], [u32; Square::NUM], [u32; Square::NUM]);

/// マスク列と各ブロックのオフセット
fn layout() -> Layout {
    let mut rook_mask = [0u64; Square::NUM];
    let mut bishop_mask = [0u64; Square::NUM];
    let mut rook_offset = [0u32; Square::NUM];
    let mut bishop_offset = [0u32; Square::NUM];

    let mut offset = 0u32;
    for sq in 0..Square::NUM {
        rook_mask[sq] = relevant_mask(sq, &ROOK_DIRS);
        bishop_mask[sq] = relevant_mask(sq, &BISHOP_DIRS);

        rook_offset[sq] = offset;
        offset += 1 << rook_mask[sq].count_ones();
        bishop_offset[sq] = offset;
        offset += 1 << bishop_mask[sq].count_ones();
    }
    debug_assert_eq!(offset as usize, SLIDER_TABLE_LEN);

    (rook_mask, bishop_mask, rook_offset, bishop_offset)
}

/// 盤端を除いたレイ上のマス
fn relevant_mask(sq: usize, dirs: &[(i8, i8)]) -> u64 {
    let mut mask = 0u64;
    let (f0, r0) = ((sq & 7) as i8, (sq >> 3) as i8);
    for &(df, dr) in dirs {
        let (mut f, mut r) = (f0 + df, r0 + dr);
        // 次のマスも盤内のときだけ（＝端のマスは含めない）
        while (0..8).contains(&(f + df)) && (0..8).contains(&(r + dr)) {
            mask |= 1u64 << (r * 8 + f);
            f += df;
            r += dr;
        }
    }
    mask
}

/// 占有 `occ` のもとでのレイ上の利き（最初の駒を含む）
fn ray_attacks(sq: usize, occ: u64, dirs: &[(i8, i8)]) -> u64 {
    let mut attacks = 0u64;
    let (f0, r0) = ((sq & 7) as i8, (sq >> 3) as i8);
    for &(df, dr) in dirs {
        let (mut f, mut r) = (f0 + df, r0 + dr);
        while (0..8).contains(&f) && (0..8).contains(&r) {
            let bit = 1u64 << (r * 8 + f);
            attacks |= bit;
            if occ & bit != 0 {
                break;
            }
            f += df;
            r += dr;
        }
    }
    attacks
}

fn fill_block(attacks: &mut [u64], sq: usize, mask: u64, offset: usize, dirs: &[(i8, i8)]) {
    let n = 1usize << mask.count_ones();
    for i in 0..n {
        let occ = pdep(i as u64, mask);
        attacks[offset + i] = ray_attacks(sq, occ, dirs);
    }
}

// =============================================================================
// ビット抽出
// =============================================================================

#[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
#[inline]
fn pext(src: u64, mask: u64) -> u64 {
    // SAFETY: target_feature = "bmi2" でコンパイルされている
    unsafe { std::arch::x86_64::_pext_u64(src, mask) }
}

#[cfg(not(all(target_arch = "x86_64", target_feature = "bmi2")))]
#[inline]
fn pext(src: u64, mut mask: u64) -> u64 {
    let mut res = 0u64;
    let mut bit = 1u64;
    while mask != 0 {
        if src & mask & mask.wrapping_neg() != 0 {
            res |= bit;
        }
        mask &= mask - 1;
        bit <<= 1;
    }
    res
}

/// pext の逆（生成時のみ使用）
fn pdep(src: u64, mut mask: u64) -> u64 {
    let mut res = 0u64;
    let mut bit = 1u64;
    while mask != 0 {
        let lsb = mask & mask.wrapping_neg();
        if src & bit != 0 {
            res |= lsb;
        }
        mask &= mask - 1;
        bit <<= 1;
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn test_masks_and_offsets() {
        let (rook_mask, bishop_mask, rook_offset, bishop_offset) = layout();
        assert_eq!(rook_mask[0], 0x0001_0101_0101_017E);
        assert_eq!(bishop_mask[0], 0x0040_2010_0804_0200);
        assert_eq!(rook_offset[0], 0);
        assert_eq!(bishop_offset[0], 4096);
        assert_eq!(rook_offset[1], 4160);
        assert_eq!(bishop_offset[1], 6208);
        assert_eq!(rook_offset[2], 6240);
        assert_eq!(bishop_offset[63], 107_584);
    }

    #[test]
    fn test_rook_attacks_with_blockers() {
        let table = SliderTable::generate();
        let occ = Bitboard::from_square(sq("d6")) | Bitboard::from_square(sq("f4"));
        let att = table.rook(sq("d4"), occ);
        assert!(att.contains(sq("d6")));
        assert!(!att.contains(sq("d7")));
        assert!(att.contains(sq("f4")));
        assert!(!att.contains(sq("g4")));
        assert!(att.contains(sq("a4")));
        assert!(att.contains(sq("d1")));
    }

    #[test]
    fn test_bishop_attacks_empty_board() {
        let table = SliderTable::generate();
        assert_eq!(table.bishop(sq("d4"), Bitboard::EMPTY).count(), 13);
        assert_eq!(table.bishop(Square::A1, Bitboard::EMPTY).count(), 7);
    }

    #[test]
    fn test_from_bytes_roundtrip_and_size_check() {
        let table = SliderTable::generate();
        let bytes = table.to_bytes();
        assert_eq!(bytes.len(), SLIDER_TABLE_LEN * 8);

        let loaded = SliderTable::from_bytes(&bytes).unwrap();
        let occ = Bitboard(0x0000_1200_0400_8100);
        for s in Square::all() {
            assert_eq!(loaded.rook(s, occ), table.rook(s, occ));
            assert_eq!(loaded.bishop(s, occ), table.bishop(s, occ));
        }

        let err = SliderTable::from_bytes(&bytes[..bytes.len() - 8]);
        assert!(matches!(err, Err(TableError::SizeMismatch { .. })));
    }

    #[test]
    fn test_install_after_first_use_is_rejected() {
        let _ = slider_table();
        let err = SliderTable::generate().install();
        assert_eq!(err, Err(TableError::AlreadyInitialized));
    }

    #[test]
    fn test_pext_pdep_inverse() {
        let mask = 0x0001_0101_0101_017Eu64;
        for i in [0u64, 1, 0x55, 0xFFF] {
            assert_eq!(pext(pdep(i, mask), mask), i);
        }
    }
}
