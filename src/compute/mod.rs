//! # Compute layer
//!
//! Hardware-facing code: the SIMD engines the striped kernels are generic
//! over, and runtime selection of the best one for the current CPU.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  detect_optimal_simd_engine() / resolve_simd_engine()        │
//! │        │                                                     │
//! │        ▼                                                     │
//! │  SimdEngineType ── Portable ── SimdEnginePortable ([i8; 16]) │
//! │                 ├─ Engine128 ── SimdEngine128 (SSE4.1/NEON)  │
//! │                 └─ Engine256 ── SimdEngine256 (AVX2)         │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod simd_abstraction;

pub use simd_abstraction::{SimdEngineType, detect_optimal_simd_engine, resolve_simd_engine};
