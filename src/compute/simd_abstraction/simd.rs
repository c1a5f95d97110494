//! Module for runtime SIMD engine detection and management.
//!
//! This module detects the best engine the CPU supports, validates explicit
//! requests against the hardware, and reports lane counts and human-readable
//! descriptions for logging.

use std::fmt;
use std::str::FromStr;

/// Available SIMD engine types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimdEngineType {
    /// Array-backed fallback - always available
    Portable,
    /// 128-bit SIMD (SSE4.1 on x86_64 / NEON on aarch64)
    Engine128,
    /// 256-bit SIMD (AVX2) - x86_64 only
    Engine256,
}

impl SimdEngineType {
    /// Whether this engine can run on the current CPU.
    pub fn is_available(self) -> bool {
        match self {
            SimdEngineType::Portable => true,
            SimdEngineType::Engine128 => {
                #[cfg(target_arch = "x86_64")]
                {
                    is_x86_feature_detected!("sse4.1")
                }
                #[cfg(target_arch = "aarch64")]
                {
                    true
                }
                #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
                {
                    false
                }
            }
            SimdEngineType::Engine256 => {
                #[cfg(target_arch = "x86_64")]
                {
                    is_x86_feature_detected!("avx2")
                }
                #[cfg(not(target_arch = "x86_64"))]
                {
                    false
                }
            }
        }
    }
}

impl fmt::Display for SimdEngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimdEngineType::Portable => "portable",
            SimdEngineType::Engine128 => "128",
            SimdEngineType::Engine256 => "256",
        };
        f.write_str(name)
    }
}

impl FromStr for SimdEngineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "portable" | "none" | "scalar" => Ok(SimdEngineType::Portable),
            "128" | "sse" | "sse4.1" | "neon" => Ok(SimdEngineType::Engine128),
            "256" | "avx2" => Ok(SimdEngineType::Engine256),
            other => Err(format!("unknown SIMD engine '{other}' (expected portable, 128 or 256)")),
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|v| v == "1").unwrap_or(false)
}

/// Detects the optimal SIMD engine based on CPU features
///
/// Environment variable overrides for testing/debugging:
/// - `FERROUS_SEARCH_FORCE_PORTABLE=1`: Force the array-backed engine
/// - `FERROUS_SEARCH_FORCE_128=1`: Force the 128-bit engine (skip AVX2)
pub fn detect_optimal_simd_engine() -> SimdEngineType {
    if env_flag("FERROUS_SEARCH_FORCE_PORTABLE") {
        log::info!("FERROUS_SEARCH_FORCE_PORTABLE=1: Using portable engine");
        return SimdEngineType::Portable;
    }

    let force_128 = env_flag("FERROUS_SEARCH_FORCE_128");
    if force_128 {
        log::info!("FERROUS_SEARCH_FORCE_128=1: Using 128-bit engine");
    }

    if !force_128 && SimdEngineType::Engine256.is_available() {
        return SimdEngineType::Engine256;
    }
    if SimdEngineType::Engine128.is_available() {
        return SimdEngineType::Engine128;
    }
    SimdEngineType::Portable
}

/// Honour an explicit request when the CPU supports it, otherwise detect.
pub fn resolve_simd_engine(requested: Option<SimdEngineType>) -> SimdEngineType {
    match requested {
        Some(engine) if engine.is_available() => engine,
        Some(engine) => {
            let fallback = detect_optimal_simd_engine();
            log::warn!(
                "Requested SIMD engine {} is not supported on this CPU, using {}",
                simd_engine_description(engine),
                simd_engine_description(fallback)
            );
            fallback
        }
        None => detect_optimal_simd_engine(),
    }
}

/// Returns a human-readable description of the SIMD engine
pub fn simd_engine_description(engine: SimdEngineType) -> &'static str {
    match engine {
        SimdEngineType::Portable => "Portable (array-backed, 16-way parallelism)",
        SimdEngineType::Engine128 => {
            #[cfg(target_arch = "aarch64")]
            {
                "NEON (128-bit, 16-way parallelism)"
            }
            #[cfg(not(target_arch = "aarch64"))]
            {
                "SSE4.1 (128-bit, 16-way parallelism)"
            }
        }
        SimdEngineType::Engine256 => "AVX2 (256-bit, 32-way parallelism)",
    }
}

/// Returns the lane counts `(lanes_8bit, lanes_16bit)` of an engine.
///
/// **Lanes by Engine**:
/// - Portable / SSE4.1 / NEON: 16 x i8, 8 x i16
/// - AVX2: 32 x i8, 16 x i16
pub fn get_simd_lane_counts(engine: SimdEngineType) -> (usize, usize) {
    match engine {
        SimdEngineType::Engine256 => (32, 16),
        SimdEngineType::Engine128 | SimdEngineType::Portable => (16, 8),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
