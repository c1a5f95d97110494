//! 128‑bit SIMD engine (SSE4.1 on x86_64; NEON on aarch64)
//!
//! 16 lanes of i8 and 8 lanes of i16. On x86_64 the signed byte max/min
//! (`pmaxsb`/`pminsb`) need SSE4.1, so every operation carries
//! `#[target_feature(enable = "sse4.1")]` and the engine is only selected after
//! runtime detection. On aarch64 NEON is part of the baseline and the
//! operations map one-to-one onto `vq*` intrinsics.
//!
//! Safety
//! - All functions are `unsafe` and expect the caller to execute them on a CPU
//!   that supports the underlying ISA.
//! - Loads/stores access 16 bytes through the given pointer; it must be valid
//!   for that size. No alignment is required.

#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
use super::SimdEngine;

/// 128-bit SIMD engine (SSE4.1 on x86_64, NEON on aarch64)
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
#[derive(Clone, Copy, Debug, Default)]
pub struct SimdEngine128;

#[cfg(target_arch = "x86_64")]
mod x86 {
    use super::{SimdEngine, SimdEngine128};
    use std::arch::x86_64::*;

    #[allow(unsafe_op_in_unsafe_fn, unused_unsafe)]
    impl SimdEngine for SimdEngine128 {
        const NAME: &'static str = "sse4.1";
        const WIDTH_8: usize = 16; // 128 bits ÷ 8 bits = 16 lanes
        const WIDTH_16: usize = 8; // 128 bits ÷ 16 bits = 8 lanes

        type Vec8 = __m128i;
        type Vec16 = __m128i;

        // ===== 8-bit lanes =====

        #[inline]
        #[target_feature(enable = "sse4.1")]
        unsafe fn set1_epi8(a: i8) -> Self::Vec8 {
            _mm_set1_epi8(a)
        }

        #[inline]
        #[target_feature(enable = "sse4.1")]
        unsafe fn loadu_epi8(src: *const i8) -> Self::Vec8 {
            unsafe { _mm_loadu_si128(src as *const __m128i) }
        }

        #[inline]
        #[target_feature(enable = "sse4.1")]
        unsafe fn storeu_epi8(dst: *mut i8, a: Self::Vec8) {
            unsafe { _mm_storeu_si128(dst as *mut __m128i, a) }
        }

        #[inline]
        #[target_feature(enable = "sse4.1")]
        unsafe fn adds_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8 {
            _mm_adds_epi8(a, b)
        }

        #[inline]
        #[target_feature(enable = "sse4.1")]
        unsafe fn subs_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8 {
            _mm_subs_epi8(a, b)
        }

        #[inline]
        #[target_feature(enable = "sse4.1")]
        unsafe fn max_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8 {
            _mm_max_epi8(a, b)
        }

        #[inline]
        #[target_feature(enable = "sse4.1")]
        unsafe fn min_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8 {
            _mm_min_epi8(a, b)
        }

        // ===== 16-bit lanes =====

        #[inline]
        #[target_feature(enable = "sse4.1")]
        unsafe fn set1_epi16(a: i16) -> Self::Vec16 {
            _mm_set1_epi16(a)
        }

        #[inline]
        #[target_feature(enable = "sse4.1")]
        unsafe fn loadu_epi16(src: *const i16) -> Self::Vec16 {
            unsafe { _mm_loadu_si128(src as *const __m128i) }
        }

        #[inline]
        #[target_feature(enable = "sse4.1")]
        unsafe fn storeu_epi16(dst: *mut i16, a: Self::Vec16) {
            unsafe { _mm_storeu_si128(dst as *mut __m128i, a) }
        }

        #[inline]
        #[target_feature(enable = "sse4.1")]
        unsafe fn adds_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16 {
            _mm_adds_epi16(a, b)
        }

        #[inline]
        #[target_feature(enable = "sse4.1")]
        unsafe fn subs_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16 {
            _mm_subs_epi16(a, b)
        }

        #[inline]
        #[target_feature(enable = "sse4.1")]
        unsafe fn max_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16 {
            _mm_max_epi16(a, b)
        }

        #[inline]
        #[target_feature(enable = "sse4.1")]
        unsafe fn min_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16 {
            _mm_min_epi16(a, b)
        }
    }
}

#[cfg(target_arch = "aarch64")]
mod neon {
    use super::{SimdEngine, SimdEngine128};
    use std::arch::aarch64::*;

    #[allow(unused_unsafe)]
    impl SimdEngine for SimdEngine128 {
        const NAME: &'static str = "neon";
        const WIDTH_8: usize = 16;
        const WIDTH_16: usize = 8;

        type Vec8 = int8x16_t;
        type Vec16 = int16x8_t;

        #[inline]
        unsafe fn set1_epi8(a: i8) -> Self::Vec8 {
            unsafe { vdupq_n_s8(a) }
        }

        #[inline]
        unsafe fn loadu_epi8(src: *const i8) -> Self::Vec8 {
            unsafe { vld1q_s8(src) }
        }

        #[inline]
        unsafe fn storeu_epi8(dst: *mut i8, a: Self::Vec8) {
            unsafe { vst1q_s8(dst, a) }
        }

        #[inline]
        unsafe fn adds_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8 {
            unsafe { vqaddq_s8(a, b) }
        }

        #[inline]
        unsafe fn subs_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8 {
            unsafe { vqsubq_s8(a, b) }
        }

        #[inline]
        unsafe fn max_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8 {
            unsafe { vmaxq_s8(a, b) }
        }

        #[inline]
        unsafe fn min_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8 {
            unsafe { vminq_s8(a, b) }
        }

        #[inline]
        unsafe fn set1_epi16(a: i16) -> Self::Vec16 {
            unsafe { vdupq_n_s16(a) }
        }

        #[inline]
        unsafe fn loadu_epi16(src: *const i16) -> Self::Vec16 {
            unsafe { vld1q_s16(src) }
        }

        #[inline]
        unsafe fn storeu_epi16(dst: *mut i16, a: Self::Vec16) {
            unsafe { vst1q_s16(dst, a) }
        }

        #[inline]
        unsafe fn adds_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16 {
            unsafe { vqaddq_s16(a, b) }
        }

        #[inline]
        unsafe fn subs_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16 {
            unsafe { vqsubq_s16(a, b) }
        }

        #[inline]
        unsafe fn max_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16 {
            unsafe { vmaxq_s16(a, b) }
        }

        #[inline]
        unsafe fn min_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16 {
            unsafe { vminq_s16(a, b) }
        }
    }
}

#[cfg(all(test, target_arch = "x86_64"))]
mod tests {
    use super::*;
    use crate::compute::simd_abstraction::SimdEnginePortable;

    #[test]
    fn test_sse41_matches_portable() {
        if !is_x86_feature_detected!("sse4.1") {
            eprintln!("Skipping: SSE4.1 not available");
            return;
        }
        let a: [i8; 16] = std::array::from_fn(|i| ((i as i32) * 9 - 60) as i8);
        let b: [i8; 16] = std::array::from_fn(|i| (70 - (i as i32) * 11) as i8);
        let mut simd = [0i8; 16];
        unsafe {
            let va = SimdEngine128::loadu_epi8(a.as_ptr());
            let vb = SimdEngine128::loadu_epi8(b.as_ptr());
            let r = SimdEngine128::max_epi8(
                SimdEngine128::adds_epi8(va, vb),
                SimdEngine128::subs_epi8(va, vb),
            );
            SimdEngine128::storeu_epi8(simd.as_mut_ptr(), r);

            let pa = SimdEnginePortable::loadu_epi8(a.as_ptr());
            let pb = SimdEnginePortable::loadu_epi8(b.as_ptr());
            let p = SimdEnginePortable::max_epi8(
                SimdEnginePortable::adds_epi8(pa, pb),
                SimdEnginePortable::subs_epi8(pa, pb),
            );
            assert_eq!(simd, p);
        }
    }
}
