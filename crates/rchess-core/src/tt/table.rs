//! TranspositionTable本体
//!
//! - Bucket: エントリのグループ
//! - TranspositionTable: テーブル本体
//! - probe/write操作

use super::entry::{TTData, TTEntry};
use super::{AGE_MASK, BUCKET_SIZE, ENTRY_BYTES};
use crate::prefetch::prefetch;
use crate::types::{Bound, Move, Value};
use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU8, Ordering};

/// バケット構造
/// 同じハッシュインデックスに対して複数のエントリを持つ
/// 10bytes × 3 + 2padding = 32bytes
#[repr(C, align(32))]
pub struct Bucket {
    entries: [UnsafeCell<TTEntry>; BUCKET_SIZE],
    _padding: [u8; 2],
}

const _: () = assert!(std::mem::size_of::<Bucket>() == 32);

impl Bucket {
    fn new() -> Self {
        Self {
            entries: std::array::from_fn(|_| UnsafeCell::new(TTEntry::new())),
            _padding: [0; 2],
        }
    }

    #[inline]
    fn entry(&self, i: usize) -> TTEntry {
        // SAFETY: 探索スレッドは1本で、読み書きが同時に起きない
        unsafe { *self.entries[i].get() }
    }
}

/// 置換表
///
/// 共有は `Arc<TranspositionTable>` で行うが、書き込むのは探索スレッド1本だけという
/// 前提で `UnsafeCell` を使っている。探索中に `clear` を呼んではならない。
pub struct TranspositionTable {
    buckets: Box<[Bucket]>,
    /// 世代（0..32、初期値 1）
    age: AtomicU8,
}

// SAFETY: 書き込みは単一スレッドに限る（型のドキュメント参照）
unsafe impl Sync for TranspositionTable {}

impl TranspositionTable {
    /// 新しい置換表を作成（サイズはMB単位）
    pub fn new(mb_size: usize) -> Self {
        let count = Self::bucket_count_for(mb_size);
        log::debug!("TT: {mb_size} MB, {count} buckets");
        Self {
            buckets: Self::allocate(count),
            age: AtomicU8::new(1),
        }
    }

    fn bucket_count_for(mb_size: usize) -> usize {
        (mb_size * 1024 * 1024 / (ENTRY_BYTES * BUCKET_SIZE)).max(1)
    }

    fn allocate(count: usize) -> Box<[Bucket]> {
        (0..count).map(|_| Bucket::new()).collect()
    }

    /// サイズを変更（中身は消える）
    pub fn resize(&mut self, mb_size: usize) {
        let count = Self::bucket_count_for(mb_size);
        if count != self.buckets.len() {
            log::debug!("TT resize: {} -> {count} buckets", self.buckets.len());
            self.buckets = Self::allocate(count);
        }
        self.age.store(1, Ordering::Relaxed);
    }

    /// クリア（探索していないときに呼ぶ）
    pub fn clear(&self) {
        for bucket in self.buckets.iter() {
            for cell in &bucket.entries {
                // SAFETY: 探索停止中は他に参照がない
                unsafe {
                    *cell.get() = TTEntry::new();
                }
            }
        }
        self.age.store(1, Ordering::Relaxed);
    }

    /// 新しい探索を開始（世代を進める）
    pub fn new_search(&self) {
        let next = (self.age.load(Ordering::Relaxed) + 1) & AGE_MASK;
        self.age.store(next, Ordering::Relaxed);
    }

    /// 現在の世代を取得
    #[inline]
    pub fn age(&self) -> u8 {
        self.age.load(Ordering::Relaxed)
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// バケットインデックスを計算
    #[inline]
    fn bucket_index(&self, key: u64) -> usize {
        // key * buckets / 2^64
        ((key as u128 * self.buckets.len() as u128) >> 64) as usize
    }

    #[inline]
    fn bucket(&self, key: u64) -> &Bucket {
        &self.buckets[self.bucket_index(key)]
    }

    /// 置換表を検索
    ///
    /// ヒットしなければ、書き込み先として `depth - 4 * 古さ` が最小のスロットを選ぶ。
    pub fn probe(&self, key: u64) -> ProbeResult<'_> {
        let bucket = self.bucket(key);
        let tag = key as u16;

        for (i, cell) in bucket.entries.iter().enumerate() {
            let entry = bucket.entry(i);
            if entry.key16() == tag {
                let found = entry.is_occupied();
                return ProbeResult {
                    found,
                    data: if found { entry.read() } else { TTData::EMPTY },
                    writer: cell.get(),
                    age: self.age(),
                    _table: PhantomData,
                };
            }
        }

        let age = self.age();
        let mut replace = 0;
        let mut min_value = i32::MAX;
        for i in 0..BUCKET_SIZE {
            let entry = bucket.entry(i);
            let value = entry.depth8() as i32 - 4 * entry.age_distance(age) as i32;
            if value < min_value {
                min_value = value;
                replace = i;
            }
        }

        ProbeResult {
            found: false,
            data: TTData::EMPTY,
            writer: bucket.entries[replace].get(),
            age,
            _table: PhantomData,
        }
    }

    /// 使用率（1000分率）
    ///
    /// 先頭 2000 バケットのうち、現世代のエントリを数える。
    pub fn hashfull(&self) -> i32 {
        let age = self.age();
        let sample = self.buckets.len().min(2000);
        let mut hit = 0;
        for bucket in self.buckets.iter().take(sample) {
            for i in 0..BUCKET_SIZE {
                let entry = bucket.entry(i);
                if entry.is_occupied() && entry.age() == age {
                    hit += 1;
                }
            }
        }
        hit * 1000 / (sample * BUCKET_SIZE) as i32
    }

    /// 指定キーのバケットをプリフェッチ
    #[inline]
    pub fn prefetch(&self, key: u64) {
        prefetch(self.bucket(key) as *const Bucket);
    }
}

/// probe結果
pub struct ProbeResult<'a> {
    /// ヒットしたか
    pub found: bool,
    /// 読み取ったデータ
    pub data: TTData,
    /// 書き込み用エントリ
    writer: *mut TTEntry,
    age: u8,
    _table: PhantomData<&'a TranspositionTable>,
}

impl ProbeResult<'_> {
    /// エントリに書き込む
    #[allow(clippy::too_many_arguments)]
    pub fn write(
        &self,
        key: u64,
        score: Value,
        eval: Value,
        bound: Bound,
        depth: i32,
        mv: Move,
        is_pv: bool,
        was_pv: bool,
    ) {
        // SAFETY: writer は probe() が借用中のテーブルから取った有効なポインタで、
        // 書き込むのは探索スレッド1本だけ
        unsafe {
            (*self.writer).save(key, score, eval, bound, depth, mv, is_pv, was_pv, self.age);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    fn store(tt: &TranspositionTable, key: u64, depth: i32) {
        tt.probe(key).write(key, Value::ZERO, Value::ZERO, Bound::Lower, depth, Move::NONE, false, false);
    }

    #[test]
    fn test_tt_new() {
        let tt = TranspositionTable::new(1);
        assert_eq!(tt.bucket_count(), 1024 * 1024 / 30);
        assert_eq!(tt.age(), 1);
    }

    #[test]
    fn test_tt_new_search_wraps() {
        let tt = TranspositionTable::new(1);
        tt.new_search();
        assert_eq!(tt.age(), 2);
        for _ in 0..30 {
            tt.new_search();
        }
        assert_eq!(tt.age(), 0);
        tt.new_search();
        assert_eq!(tt.age(), 1);
    }

    #[test]
    fn test_tt_probe_empty() {
        let tt = TranspositionTable::new(1);
        let result = tt.probe(0x1234_5678_9ABC_DEF1);
        assert!(!result.found);
        assert_eq!(result.data, TTData::EMPTY);
    }

    #[test]
    fn test_tt_probe_and_write() {
        let pos = Position::startpos();
        let tt = TranspositionTable::new(1);
        let key = pos.key();
        let mv = pos.parse_uci_move("e2e4").unwrap();

        let probe1 = tt.probe(key);
        assert!(!probe1.found);
        probe1.write(key, Value::new(50), Value::new(12), Bound::Exact, 10, mv, true, true);

        let probe2 = tt.probe(key);
        assert!(probe2.found);
        assert_eq!(probe2.data.score.raw(), 50);
        assert_eq!(probe2.data.eval.raw(), 12);
        assert_eq!(probe2.data.bound, Bound::Exact);
        assert_eq!(probe2.data.depth, 10);
        assert_eq!(probe2.data.mv, mv);
        assert!(probe2.data.was_pv);
    }

    #[test]
    fn test_tt_replaces_shallowest_slot() {
        let tt = TranspositionTable::new(1);
        // 同じバケットに入り、タグだけが違うキー
        let base = 0x8000_0000_0000_0000u64;
        let keys = [base | 1, base | 2, base | 3, base | 4];
        let depths = [8, 3, 12];
        for (k, d) in keys.iter().zip(depths) {
            store(&tt, *k, d);
        }
        store(&tt, keys[3], 1);
        assert!(tt.probe(keys[0]).found);
        assert!(!tt.probe(keys[1]).found);
        assert!(tt.probe(keys[2]).found);
        assert!(tt.probe(keys[3]).found);
    }

    #[test]
    fn test_tt_hashfull_and_clear() {
        let tt = TranspositionTable::new(1);
        assert_eq!(tt.hashfull(), 0);
        for i in 0..2000u64 {
            let key = (i << 48) | 0x77;
            store(&tt, key, 4);
        }
        assert!(tt.hashfull() > 0);
        tt.clear();
        assert_eq!(tt.hashfull(), 0);
        assert_eq!(tt.age(), 1);
    }

    #[test]
    fn test_tt_resize() {
        let mut tt = TranspositionTable::new(1);
        let initial = tt.bucket_count();
        tt.resize(2);
        assert!(tt.bucket_count() > initial);
        tt.resize(1);
        assert_eq!(tt.bucket_count(), initial);
    }

    #[test]
    fn test_bucket_size() {
        assert_eq!(std::mem::size_of::<Bucket>(), 32);
    }
}
