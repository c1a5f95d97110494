//! 256‑bit SIMD engine (AVX2)
//!
//! AVX2 implementation of the `SimdEngine` trait on x86_64: 32 lanes for
//! 8‑bit operations and 16 lanes for 16‑bit operations, mapping directly onto
//! `_mm256_*` saturating arithmetic. Every function is `unsafe` and annotated
//! with `#[target_feature(enable = "avx2")]`; callers must ensure AVX2 is
//! available (the runtime dispatch in `simd.rs` does this).
//!
//! Compared to the 128‑bit engine, each kernel step advances twice as many
//! database sequences.

#[cfg(target_arch = "x86_64")]
use super::SimdEngine;

/// 256-bit SIMD engine (AVX2, x86_64 only)
#[cfg(target_arch = "x86_64")]
#[derive(Clone, Copy, Debug, Default)]
pub struct SimdEngine256;

#[cfg(target_arch = "x86_64")]
mod avx2 {
    use super::{SimdEngine, SimdEngine256};
    use std::arch::x86_64::*;

    #[allow(unsafe_op_in_unsafe_fn, unused_unsafe)]
    impl SimdEngine for SimdEngine256 {
        const NAME: &'static str = "avx2";
        const WIDTH_8: usize = 32; // 256 bits ÷ 8 bits = 32 lanes
        const WIDTH_16: usize = 16; // 256 bits ÷ 16 bits = 16 lanes

        type Vec8 = __m256i;
        type Vec16 = __m256i;

        // ===== 8-bit lanes =====

        #[inline]
        #[target_feature(enable = "avx2")]
        unsafe fn set1_epi8(a: i8) -> Self::Vec8 {
            _mm256_set1_epi8(a)
        }

        #[inline]
        #[target_feature(enable = "avx2")]
        unsafe fn loadu_epi8(src: *const i8) -> Self::Vec8 {
            unsafe { _mm256_loadu_si256(src as *const __m256i) }
        }

        #[inline]
        #[target_feature(enable = "avx2")]
        unsafe fn storeu_epi8(dst: *mut i8, a: Self::Vec8) {
            unsafe { _mm256_storeu_si256(dst as *mut __m256i, a) }
        }

        #[inline]
        #[target_feature(enable = "avx2")]
        unsafe fn adds_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8 {
            _mm256_adds_epi8(a, b)
        }

        #[inline]
        #[target_feature(enable = "avx2")]
        unsafe fn subs_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8 {
            _mm256_subs_epi8(a, b)
        }

        #[inline]
        #[target_feature(enable = "avx2")]
        unsafe fn max_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8 {
            _mm256_max_epi8(a, b)
        }

        #[inline]
        #[target_feature(enable = "avx2")]
        unsafe fn min_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8 {
            _mm256_min_epi8(a, b)
        }

        // ===== 16-bit lanes =====

        #[inline]
        #[target_feature(enable = "avx2")]
        unsafe fn set1_epi16(a: i16) -> Self::Vec16 {
            _mm256_set1_epi16(a)
        }

        #[inline]
        #[target_feature(enable = "avx2")]
        unsafe fn loadu_epi16(src: *const i16) -> Self::Vec16 {
            unsafe { _mm256_loadu_si256(src as *const __m256i) }
        }

        #[inline]
        #[target_feature(enable = "avx2")]
        unsafe fn storeu_epi16(dst: *mut i16, a: Self::Vec16) {
            unsafe { _mm256_storeu_si256(dst as *mut __m256i, a) }
        }

        #[inline]
        #[target_feature(enable = "avx2")]
        unsafe fn adds_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16 {
            _mm256_adds_epi16(a, b)
        }

        #[inline]
        #[target_feature(enable = "avx2")]
        unsafe fn subs_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16 {
            _mm256_subs_epi16(a, b)
        }

        #[inline]
        #[target_feature(enable = "avx2")]
        unsafe fn max_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16 {
            _mm256_max_epi16(a, b)
        }

        #[inline]
        #[target_feature(enable = "avx2")]
        unsafe fn min_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16 {
            _mm256_min_epi16(a, b)
        }
    }
}
