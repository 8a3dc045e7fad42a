// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Deterministic math functions for cross-platform reproducibility.
//!
//! Provides `det_sin`, `det_cos`, `det_sincos`, and `det_hypot` using only
//! IEEE 754 operations with bit-exact results on every platform (add, sub,
//! mul, div, floor, sqrt, abs). Tone synthesis and FFT twiddle factors go
//! through these kernels so that a signal encoded on one machine analyzes
//! identically on another.
//!
//! Algorithms and coefficients from FDLIBM (Freely Distributable LIBM),
//! which guarantees < 1 ULP error for all functions.

use std::f64::consts::PI;

// ──────────────────────────────────────────────────────────────────────────
// Extended-precision π/2 for Cody-Waite range reduction.
// PIO2_HI + PIO2_LO = π/2 to ~70 bits of precision.
// ──────────────────────────────────────────────────────────────────────────

const PIO2_HI: f64 = f64::from_bits(0x3FF921FB54442D18); // 1.5707963267948966
const PIO2_LO: f64 = f64::from_bits(0x3C91A62633145C07); // 6.123233995736766e-17

// ──────────────────────────────────────────────────────────────────────────
// Sin kernel coefficients (FDLIBM k_sin.c).
// sin(x) ≈ x + x³·(S1 + x²·(S2 + x²·(S3 + x²·(S4 + x²·(S5 + x²·S6)))))
// for |x| ≤ π/4.
// ──────────────────────────────────────────────────────────────────────────

const S1: f64 = f64::from_bits(0xBFC5555555555549); // -1.66666666666666324348e-01
const S2: f64 = f64::from_bits(0x3F8111111110F8A6); //  8.33333333332248946124e-03
const S3: f64 = f64::from_bits(0xBF2A01A019C161D5); // -1.98412698298579493134e-04
const S4: f64 = f64::from_bits(0x3EC71DE357B1FE7D); //  2.75573137070700676789e-06
const S5: f64 = f64::from_bits(0xBE5AE5E68A2B9CEB); // -2.50507602534068634195e-08
const S6: f64 = f64::from_bits(0x3DE5D93A5ACFD57C); //  1.58969099521155010221e-10

// ──────────────────────────────────────────────────────────────────────────
// Cos kernel coefficients (FDLIBM k_cos.c).
// cos(x) ≈ 1 - x²/2 + x⁴·(C1 + x²·(C2 + …))
// Uses Kahan trick for precision: w = 1-hz, return w + ((1-w)-hz+r).
// ──────────────────────────────────────────────────────────────────────────

const C1: f64 = f64::from_bits(0x3FA5555555555549); //  4.16666666666666019037e-02
const C2: f64 = f64::from_bits(0xBF56C16C16C15177); // -1.38888888888741095749e-03
const C3: f64 = f64::from_bits(0x3EFA01A019CB1590); //  2.48015872894767294178e-05
const C4: f64 = f64::from_bits(0xBE927E4F809C52AD); // -2.75573143513906633035e-07
const C5: f64 = f64::from_bits(0x3E21EE9EBDB4B1C4); //  2.08757232129817482790e-09
const C6: f64 = f64::from_bits(0xBDA8FAE9BE8838D4); // -1.13596475577881948265e-11

// ──────────────────────────────────────────────────────────────────────────
// Core polynomial evaluations on reduced range [-π/4, π/4].
// ──────────────────────────────────────────────────────────────────────────

/// Evaluate sin polynomial for |x| ≤ π/4 (FDLIBM __kernel_sin).
#[inline]
fn sin_kern(x: f64) -> f64 {
    let z = x * x;
    let v = z * x;
    let r = S2 + z * (S3 + z * (S4 + z * (S5 + z * S6)));
    x + v * (S1 + z * r)
}

/// Evaluate cos polynomial for |x| ≤ π/4 (FDLIBM __kernel_cos).
/// cos(x) ≈ 1 - z/2 + z²·(C1 + z·C2 + …) where z = x².
#[inline]
fn cos_kern(x: f64) -> f64 {
    let z = x * x;
    let r = z * (C1 + z * (C2 + z * (C3 + z * (C4 + z * (C5 + z * C6)))));
    let hz = 0.5 * z;
    // FDLIBM: return 1 - (hz - z*r), where z*r = z²·(C1 + z·C2 + …)
    1.0 - (hz - z * r)
}

// ──────────────────────────────────────────────────────────────────────────
// Cody-Waite range reduction: x → r in [-π/4, π/4], quadrant n mod 4.
// ──────────────────────────────────────────────────────────────────────────

#[inline]
fn reduce(x: f64) -> (f64, i32) {
    let n = (x * (2.0 / PI) + 0.5).floor();
    let r = (x - n * PIO2_HI) - n * PIO2_LO;
    (r, (n as i64 & 3) as i32)
}

// ──────────────────────────────────────────────────────────────────────────
// Public sin / cos / sincos
// ──────────────────────────────────────────────────────────────────────────

/// Deterministic sine — uses only exactly rounded f64 operations.
pub fn det_sin(x: f64) -> f64 {
    if x.is_nan() || x.is_infinite() {
        return f64::NAN;
    }
    let (r, q) = reduce(x);
    match q {
        0 =>  sin_kern(r),
        1 =>  cos_kern(r),
        2 => -sin_kern(r),
        3 => -cos_kern(r),
        _ => unreachable!(),
    }
}

/// Deterministic cosine — uses only exactly rounded f64 operations.
pub fn det_cos(x: f64) -> f64 {
    if x.is_nan() || x.is_infinite() {
        return f64::NAN;
    }
    let (r, q) = reduce(x);
    match q {
        0 =>  cos_kern(r),
        1 => -sin_kern(r),
        2 => -cos_kern(r),
        3 =>  sin_kern(r),
        _ => unreachable!(),
    }
}

/// Deterministic sin and cos computed together (shared range reduction).
pub fn det_sincos(x: f64) -> (f64, f64) {
    if x.is_nan() || x.is_infinite() {
        return (f64::NAN, f64::NAN);
    }
    let (r, q) = reduce(x);
    let s = sin_kern(r);
    let c = cos_kern(r);
    match q {
        0 => ( s,  c),
        1 => ( c, -s),
        2 => (-s, -c),
        3 => (-c,  s),
        _ => unreachable!(),
    }
}

/// Deterministic hypot(x, y) = sqrt(x² + y²).
///
/// sqrt is correctly rounded by IEEE 754, so this is deterministic.
/// Uses scaling to avoid overflow/underflow for extreme values.
pub fn det_hypot(x: f64, y: f64) -> f64 {
    let xa = x.abs();
    let ya = y.abs();
    let (big, small) = if xa >= ya { (xa, ya) } else { (ya, xa) };
    if big == 0.0 {
        return 0.0;
    }
    let ratio = small / big;
    big * (1.0 + ratio * ratio).sqrt()
}

// ──────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────
