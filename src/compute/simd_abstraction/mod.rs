//! SIMD abstraction layer
//!
//! The striped kernels run one database sequence per vector lane. Everything
//! they need from the hardware is a small set of saturating lane-wise
//! operations on signed 8-bit and 16-bit integers: broadcast, unaligned
//! load/store, saturating add/sub, max and min. This module hides the ISA
//! behind two traits:
//!
//! - [`SimdEngine`]: one implementation per vector backend, exposing the raw
//!   `epi8`/`epi16` operations on its native vector types.
//! - [`LaneScore`]: implemented for `i8` and `i16`, mapping a lane type onto the
//!   matching half of an engine (`Vec8` or `Vec16`). Kernels are written once,
//!   generic over `<E: SimdEngine, T: LaneScore>`.
//!
//! ## Engines and widths
//!
//! - `SimdEnginePortable`: plain arrays, 16 lanes of i8 / 8 lanes of i16.
//!   Always available; used as the reference backend in tests.
//! - `SimdEngine128`: 128-bit vectors, 16 lanes of i8 / 8 lanes of i16
//!   (SSE4.1 on x86_64, NEON on aarch64).
//! - `SimdEngine256`: 256-bit vectors, 32 lanes of i8 / 16 lanes of i16
//!   (AVX2 on x86_64).
//!
//! ## Runtime dispatch pattern
//!
//! Features are detected once (`detect_optimal_simd_engine()`) and the choice
//! is kept in the lightweight [`SimdEngineType`] enum. The kernel layer matches
//! on it and enters a `#[target_feature]` wrapper for the chosen engine.
//!
//! ## Safety model
//!
//! All engine operations are `unsafe`: they may require CPU features that the
//! caller must have verified, and loads/stores read or write `WIDTH` elements
//! through raw pointers. The `LaneScore` helpers take slices and check their
//! length in debug builds.

pub mod engine128;
pub mod engine256;
pub mod portable;
pub mod simd;

pub use portable::SimdEnginePortable;
pub use simd::{
    SimdEngineType, detect_optimal_simd_engine, get_simd_lane_counts, resolve_simd_engine,
    simd_engine_description,
};

#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
pub use engine128::SimdEngine128;
#[cfg(target_arch = "x86_64")]
pub use engine256::SimdEngine256;

use std::fmt::Debug;

/// A vector backend with saturating signed 8-bit and 16-bit lanes.
pub trait SimdEngine: Sized + Copy + Send + Sync + 'static {
    /// Short name used in logs.
    const NAME: &'static str;
    /// Number of 8-bit lanes in the engine's native vector type.
    const WIDTH_8: usize;
    /// Number of 16-bit lanes in the engine's native vector type.
    const WIDTH_16: usize;

    type Vec8: Copy;
    type Vec16: Copy;

    // ===== 8-bit lanes =====
    unsafe fn set1_epi8(a: i8) -> Self::Vec8;
    /// Load `WIDTH_8` values from `src` (no alignment requirement).
    unsafe fn loadu_epi8(src: *const i8) -> Self::Vec8;
    /// Store `WIDTH_8` values to `dst` (no alignment requirement).
    unsafe fn storeu_epi8(dst: *mut i8, a: Self::Vec8);
    unsafe fn adds_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8;
    unsafe fn subs_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8;
    unsafe fn max_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8;
    unsafe fn min_epi8(a: Self::Vec8, b: Self::Vec8) -> Self::Vec8;

    // ===== 16-bit lanes =====
    unsafe fn set1_epi16(a: i16) -> Self::Vec16;
    unsafe fn loadu_epi16(src: *const i16) -> Self::Vec16;
    unsafe fn storeu_epi16(dst: *mut i16, a: Self::Vec16);
    unsafe fn adds_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16;
    unsafe fn subs_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16;
    unsafe fn max_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16;
    unsafe fn min_epi16(a: Self::Vec16, b: Self::Vec16) -> Self::Vec16;
}

/// Scalar score type of one precision tier.
///
/// `MIN` and `MAX` are the saturation bounds; a value equal to either one may
/// be clamped and is never trusted as exact.
pub trait ScoreWidth: Copy + Ord + Default + Debug + Send + Sync + 'static {
    const MIN: Self;
    const MAX: Self;
    const ZERO: Self;

    /// Clamp into `[MIN, MAX]`.
    fn from_i64_saturating(v: i64) -> Self;
    fn to_i64(self) -> i64;

    /// True when `v` is strictly inside `(MIN, MAX)`.
    #[inline]
    fn holds_exactly(v: i64) -> bool {
        v > Self::MIN.to_i64() && v < Self::MAX.to_i64()
    }
}

macro_rules! impl_score_width {
    ($t:ty) => {
        impl ScoreWidth for $t {
            const MIN: Self = <$t>::MIN;
            const MAX: Self = <$t>::MAX;
            const ZERO: Self = 0;

            #[inline]
            fn from_i64_saturating(v: i64) -> Self {
                v.clamp(<$t>::MIN as i64, <$t>::MAX as i64) as $t
            }

            #[inline]
            fn to_i64(self) -> i64 {
                self as i64
            }
        }
    };
}

impl_score_width!(i8);
impl_score_width!(i16);
impl_score_width!(i64);

/// Lane types usable by the striped kernels.
pub trait LaneScore: ScoreWidth {
    type Vector<E: SimdEngine>: Copy;

    /// Lanes per vector for engine `E`.
    fn lanes<E: SimdEngine>() -> usize;

    unsafe fn splat<E: SimdEngine>(v: Self) -> Self::Vector<E>;
    /// Load the first `lanes::<E>()` values of `src`.
    unsafe fn load<E: SimdEngine>(src: &[Self]) -> Self::Vector<E>;
    /// Store into the first `lanes::<E>()` slots of `dst`.
    unsafe fn store<E: SimdEngine>(dst: &mut [Self], v: Self::Vector<E>);
    unsafe fn adds<E: SimdEngine>(a: Self::Vector<E>, b: Self::Vector<E>) -> Self::Vector<E>;
    unsafe fn subs<E: SimdEngine>(a: Self::Vector<E>, b: Self::Vector<E>) -> Self::Vector<E>;
    unsafe fn vmax<E: SimdEngine>(a: Self::Vector<E>, b: Self::Vector<E>) -> Self::Vector<E>;
    unsafe fn vmin<E: SimdEngine>(a: Self::Vector<E>, b: Self::Vector<E>) -> Self::Vector<E>;
}

macro_rules! impl_lane_score {
    ($t:ty, $vec:ident, $width:ident, $set1:ident, $loadu:ident, $storeu:ident,
     $adds:ident, $subs:ident, $max:ident, $min:ident) => {
        impl LaneScore for $t {
            type Vector<E: SimdEngine> = E::$vec;

            #[inline(always)]
            fn lanes<E: SimdEngine>() -> usize {
                E::$width
            }

            #[inline(always)]
            unsafe fn splat<E: SimdEngine>(v: Self) -> Self::Vector<E> {
                unsafe { E::$set1(v) }
            }

            #[inline(always)]
            unsafe fn load<E: SimdEngine>(src: &[Self]) -> Self::Vector<E> {
                debug_assert!(src.len() >= E::$width);
                unsafe { E::$loadu(src.as_ptr()) }
            }

            #[inline(always)]
            unsafe fn store<E: SimdEngine>(dst: &mut [Self], v: Self::Vector<E>) {
                debug_assert!(dst.len() >= E::$width);
                unsafe { E::$storeu(dst.as_mut_ptr(), v) }
            }

            #[inline(always)]
            unsafe fn adds<E: SimdEngine>(a: Self::Vector<E>, b: Self::Vector<E>) -> Self::Vector<E> {
                unsafe { E::$adds(a, b) }
            }

            #[inline(always)]
            unsafe fn subs<E: SimdEngine>(a: Self::Vector<E>, b: Self::Vector<E>) -> Self::Vector<E> {
                unsafe { E::$subs(a, b) }
            }

            #[inline(always)]
            unsafe fn vmax<E: SimdEngine>(a: Self::Vector<E>, b: Self::Vector<E>) -> Self::Vector<E> {
                unsafe { E::$max(a, b) }
            }

            #[inline(always)]
            unsafe fn vmin<E: SimdEngine>(a: Self::Vector<E>, b: Self::Vector<E>) -> Self::Vector<E> {
                unsafe { E::$min(a, b) }
            }
        }
    };
}

impl_lane_score!(
    i8, Vec8, WIDTH_8, set1_epi8, loadu_epi8, storeu_epi8, adds_epi8, subs_epi8, max_epi8,
    min_epi8
);
impl_lane_score!(
    i16, Vec16, WIDTH_16, set1_epi16, loadu_epi16, storeu_epi16, adds_epi16, subs_epi16,
    max_epi16, min_epi16
);
