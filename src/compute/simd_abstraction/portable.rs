//! Portable array-backed engine.
//!
//! Same lane counts as the 128-bit engine, implemented with scalar saturating
//! arithmetic over fixed arrays. Always available, so it doubles as the
//! reference backend for parity tests on any host.

use super::SimdEngine;

#[derive(Clone, Copy, Debug, Default)]
pub struct SimdEnginePortable;

const W8: usize = 16;
const W16: usize = 8;

#[inline(always)]
fn zip8(a: [i8; W8], b: [i8; W8], f: impl Fn(i8, i8) -> i8) -> [i8; W8] {
    std::array::from_fn(|i| f(a[i], b[i]))
}

#[inline(always)]
fn zip16(a: [i16; W16], b: [i16; W16], f: impl Fn(i16, i16) -> i16) -> [i16; W16] {
    std::array::from_fn(|i| f(a[i], b[i]))
}

impl SimdEngine for SimdEnginePortable {
    const NAME: &'static str = "portable";
    const WIDTH_8: usize = W8;
    const WIDTH_16: usize = W16;

    type Vec8 = [i8; W8];
    type Vec16 = [i16; W16];

    #[inline]
    unsafe fn set1_epi8(a: i8) -> Self::Vec8 {
        [a; W8]
    }

    #[inline]
    unsafe fn loadu_epi8(src: *const i8) -> Self::Vec8 {
        unsafe { std::ptr::read_unaligned(src as *const [i8; W8]) }
    }

    #[inline]
    unsafe fn storeu_epi8(dst: *mut i8, a: Self::Vec8) {
        unsafe { std::ptr::write_unaligned(dst as *mut [i8; W8], a) }
    }

    #[inline]
    unsafe fn adds_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8 {
        zip8(a, b, i8::saturating_add)
    }

    #[inline]
    unsafe fn subs_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8 {
        zip8(a, b, i8::saturating_sub)
    }

    #[inline]
    unsafe fn max_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8 {
        zip8(a, b, Ord::max)
    }

    #[inline]
    unsafe fn min_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8 {
        zip8(a, b, Ord::min)
    }

    #[inline]
    unsafe fn set1_epi16(a: i16) -> Self::Vec16 {
        [a; W16]
    }

    #[inline]
    unsafe fn loadu_epi16(src: *const i16) -> Self::Vec16 {
        unsafe { std::ptr::read_unaligned(src as *const [i16; W16]) }
    }

    #[inline]
    unsafe fn storeu_epi16(dst: *mut i16, a: Self::Vec16) {
        unsafe { std::ptr::write_unaligned(dst as *mut [i16; W16], a) }
    }

    #[inline]
    unsafe fn adds_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16 {
        zip16(a, b, i16::saturating_add)
    }

    #[inline]
    unsafe fn subs_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16 {
        zip16(a, b, i16::saturating_sub)
    }

    #[inline]
    unsafe fn max_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16 {
        zip16(a, b, Ord::max)
    }

    #[inline]
    unsafe fn min_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16 {
        zip16(a, b, Ord::min)
    }
}
