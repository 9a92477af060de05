//! キャッシュプリフェッチ
//!
//! 探索中に次の局面の置換表バケットを先読みして、実際の参照時の
//! メモリレイテンシを隠す。

/// `ptr` を含むキャッシュラインを L1 に読み込むよう要求する
#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub fn prefetch<T>(ptr: *const T) {
    use std::arch::x86_64::{_MM_HINT_T0, _mm_prefetch};
    // SAFETY: プリフェッチはメモリを読まず、無効なアドレスでも例外にならない
    unsafe { _mm_prefetch(ptr as *const i8, _MM_HINT_T0) }
}

#[cfg(not(target_arch = "x86_64"))]
#[inline(always)]
pub fn prefetch<T>(_ptr: *const T) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefetch_is_harmless() {
        let data = [1u64; 8];
        prefetch(data.as_ptr());
        prefetch(std::ptr::null::<u64>());
        assert_eq!(data[0], 1);
    }
}
