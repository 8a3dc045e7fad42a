// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Deterministic 1D spectral analysis for tone recovery.
//!
//! - Radix-2 Cooley-Tukey for power-of-2 window sizes
//! - Bluestein's chirp-z transform for arbitrary sizes, so whole tone
//!   windows (e.g. 4410 samples at 44.1 kHz × 100 ms) transform without
//!   truncation
//! All twiddle factors computed via `det_sincos()` in f64, spectrum data
//! held as f32 — dominant-bin search only needs coarse peaks.
//!
//! A [`SpectrumPlan`] precomputes the Bluestein chirp factors once per
//! window length and is reused across every tone window of an analysis
//! pass.

use crate::det_math::{det_hypot, det_sincos};
use num_complex::Complex;
use std::f64::consts::PI;

/// Complex32 type alias for f32 complex numbers.
pub type Complex32 = Complex<f32>;

/// Next power of 2 >= n.
fn next_pow2(n: usize) -> usize {
    let mut p = 1;
    while p < n {
        p <<= 1;
    }
    p
}

/// In-place radix-2 Cooley-Tukey FFT for f32. `data.len()` must be a
/// power of 2. `sign`: -1.0 for forward FFT, +1.0 for inverse FFT.
fn fft_radix2(data: &mut [Complex32], sign: f64) {
    let n = data.len();
    debug_assert!(n.is_power_of_two());
    if n <= 1 {
        return;
    }

    // Bit-reversal permutation
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            data.swap(i, j);
        }
    }

    // Butterfly stages
    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let angle_step = sign * PI / half as f64;
        for start in (0..n).step_by(len) {
            for k in 0..half {
                let angle = angle_step * k as f64;
                let (s, c) = det_sincos(angle);
                let w = Complex32::new(c as f32, s as f32);
                let u = data[start + k];
                let v = data[start + k + half] * w;
                data[start + k] = u + v;
                data[start + k + half] = u - v;
            }
        }
        len <<= 1;
    }
}

/// Precomputed Bluestein chirp factors and FFT(b_hat) for length `n`.
///
/// Eliminates redundant chirp computation and FFT(b) calls when the same
/// window length is transformed once per tone.
struct BluesteinPlan {
    n: usize,
    m: usize, // next_pow2(2*n - 1)
    chirp: Vec<Complex32>,
    b_hat: Vec<Complex32>, // FFT of padded conjugate chirp
}

impl BluesteinPlan {
    /// Forward-transform plan for length `n`.
    fn new(n: usize) -> Self {
        let m = next_pow2(2 * n - 1);

        // Chirp factors: w_k = exp(-i * pi * k^2 / n)
        let mut chirp = vec![Complex32::new(0.0, 0.0); n];
        for k in 0..n {
            let angle = -PI * (k as f64 * k as f64) / n as f64;
            let (s, c) = det_sincos(angle);
            chirp[k] = Complex32::new(c as f32, s as f32);
        }

        // b[k] = chirp[k], with wrap-around for negative indices, zero-padded
        let mut b = vec![Complex32::new(0.0, 0.0); m];
        b[0] = chirp[0];
        for k in 1..n {
            b[k] = chirp[k];
            b[m - k] = chirp[k];
        }

        // Precompute FFT(b)
        fft_radix2(&mut b, -1.0);

        BluesteinPlan { n, m, chirp, b_hat: b }
    }

    /// Execute the forward FFT using the precomputed plan.
    fn execute(&self, input: &[Complex32]) -> Vec<Complex32> {
        debug_assert_eq!(input.len(), self.n);

        // a[k] = x[k] * conj(chirp[k]), zero-padded to length m
        let mut a = vec![Complex32::new(0.0, 0.0); self.m];
        for k in 0..self.n {
            a[k] = input[k] * self.chirp[k].conj();
        }

        // Convolve: A = FFT(a), C = IFFT(A * B_hat)
        fft_radix2(&mut a, -1.0);
        for i in 0..self.m {
            a[i] = a[i] * self.b_hat[i];
        }
        fft_radix2(&mut a, 1.0);

        // Normalize radix-2 inverse and apply chirp
        let inv_m = 1.0 / self.m as f32;
        let mut result = vec![Complex32::new(0.0, 0.0); self.n];
        for k in 0..self.n {
            result[k] = a[k] * inv_m * self.chirp[k].conj();
        }

        result
    }
}

/// Forward-FFT plan for one window length, reusable across windows.
pub struct SpectrumPlan {
    fft_len: usize,
    /// Chirp plan; `None` when `fft_len` is a power of two.
    bluestein: Option<BluesteinPlan>,
}

impl SpectrumPlan {
    pub fn new(fft_len: usize) -> Self {
        assert!(fft_len > 0);
        let bluestein = if fft_len.is_power_of_two() {
            None
        } else {
            Some(BluesteinPlan::new(fft_len))
        };
        SpectrumPlan { fft_len, bluestein }
    }

    pub fn fft_len(&self) -> usize {
        self.fft_len
    }

    /// Magnitudes of the first `fft_len / 2` frequency bins.
    ///
    /// Input shorter than the plan length is zero-padded; longer input is
    /// truncated to the plan length.
    pub fn power_spectrum(&self, samples: &[f32]) -> Vec<f32> {
        let mut data = vec![Complex32::new(0.0, 0.0); self.fft_len];
        for (slot, &s) in data.iter_mut().zip(samples.iter()) {
            *slot = Complex32::new(s, 0.0);
        }

        let spectrum = match &self.bluestein {
            None => {
                fft_radix2(&mut data, -1.0);
                data
            }
            Some(plan) => plan.execute(&data),
        };

        spectrum[..self.fft_len / 2]
            .iter()
            .map(|c| det_hypot(c.re as f64, c.im as f64) as f32)
            .collect()
    }
}

/// Index of the bin with maximum magnitude (first maximum on ties).
pub fn dominant_bin(power: &[f32]) -> usize {
    let mut best = 0usize;
    let mut best_mag = f32::MIN;
    for (i, &mag) in power.iter().enumerate() {
        if mag > best_mag {
            best = i;
            best_mag = mag;
        }
    }
    best
}

/// Center frequency of a bin: `bin × sample_rate / fft_len`
/// (equivalently `bin × sample_rate / (2 × bin_count)`).
pub fn bin_frequency(bin: usize, sample_rate: u32, fft_len: usize) -> f64 {
    bin as f64 * sample_rate as f64 / fft_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::det_math::det_sin;

    fn sine(freq: f64, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| det_sin(2.0 * PI * freq * i as f64 / sample_rate as f64) as f32)
            .collect()
    }

    #[test]
    fn impulse_has_flat_spectrum() {
        let mut samples = vec![0.0f32; 64];
        samples[0] = 1.0;
        let plan = SpectrumPlan::new(64);
        let power = plan.power_spectrum(&samples);
        assert_eq!(power.len(), 32);
        for &mag in &power {
            assert!((mag - 1.0).abs() < 1e-4, "flat spectrum expected, got {mag}");
        }
    }

    #[test]
    fn pure_sine_dominates_its_bin() {
        // 400 Hz over a 1024-sample window at 8192 Hz: bin 50 exactly.
        let samples = sine(400.0, 8192, 1024);
        let plan = SpectrumPlan::new(1024);
        let power = plan.power_spectrum(&samples);
        assert_eq!(dominant_bin(&power), 50);
        assert!((bin_frequency(50, 8192, 1024) - 400.0).abs() < 1e-9);
    }

    #[test]
    fn bluestein_window_matches_radix2() {
        // Same sine analyzed through a non-power-of-2 whole window and a
        // power-of-2 window must peak at the same frequency.
        let sr = 4410;
        let samples = sine(630.0, sr, 4410);
        let whole = SpectrumPlan::new(4410); // Bluestein path
        let power = whole.power_spectrum(&samples);
        let bin = dominant_bin(&power);
        // 630 Hz at 1 Hz bin resolution (4410 samples / 4410 Hz).
        assert_eq!(bin, 630);

        let pow2 = SpectrumPlan::new(1024); // radix-2 path, truncated window
        let power2 = pow2.power_spectrum(&samples[..1024]);
        let freq2 = bin_frequency(dominant_bin(&power2), sr as u32, 1024);
        assert!((freq2 - 630.0).abs() < 4410.0 / 1024.0, "freq2 = {freq2}");
    }

    #[test]
    fn short_input_is_zero_padded() {
        let samples = sine(1000.0, 8192, 500);
        let plan = SpectrumPlan::new(2048);
        let power = plan.power_spectrum(&samples);
        let freq = bin_frequency(dominant_bin(&power), 8192, 2048);
        assert!((freq - 1000.0).abs() < 8.0, "freq = {freq}");
    }

    #[test]
    fn dominant_bin_takes_first_maximum() {
        assert_eq!(dominant_bin(&[1.0, 3.0, 3.0, 2.0]), 1);
        assert_eq!(dominant_bin(&[0.0]), 0);
    }

    #[test]
    fn silence_resolves_to_bin_zero() {
        let plan = SpectrumPlan::new(256);
        let power = plan.power_spectrum(&vec![0.0f32; 256]);
        assert_eq!(dominant_bin(&power), 0);
    }
}
