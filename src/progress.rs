// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Progress tracking and cancellation for codec passes.
//!
//! Synthesis and analysis advance one step per tone window, so an
//! interactive caller can show a live bar and abort between tones. Uses
//! atomics so a [`Progress`] can be shared with a UI thread (behind an
//! `Arc`) while the codec thread runs the pass; no other mutable state
//! crosses channel invocations.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::error::CodecError;

/// Step counter and cancellation flag for one codec pass.
#[derive(Debug, Default)]
pub struct Progress {
    step: AtomicU32,
    total: AtomicU32,
    cancelled: AtomicBool,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset progress to 0 and set the total step count.
    /// Also resets the cancellation flag so a fresh pass starts clean.
    pub fn init(&self, total: u32) {
        self.cancelled.store(false, Ordering::Relaxed);
        self.step.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    /// Request cancellation of the pass in flight.
    ///
    /// The synthesis and analysis loops check this flag at tone
    /// boundaries and return [`CodecError::Cancelled`]; partial output is
    /// discarded, since a partial value sequence is not decodable.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns `true` if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Check for cancellation and return an error if requested.
    pub fn check_cancelled(&self) -> Result<(), CodecError> {
        if self.is_cancelled() {
            Err(CodecError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Advance progress by one step, capped at total-1 so the bar never
    /// hits 100% before `finish()`.
    pub fn advance(&self) {
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            self.step.fetch_add(1, Ordering::Relaxed);
        } else {
            let _ = self.step.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| {
                if s + 1 < total { Some(s + 1) } else { Some(s) }
            });
        }
    }

    /// Read the current (step, total) progress.
    pub fn get(&self) -> (u32, u32) {
        (self.step.load(Ordering::Relaxed), self.total.load(Ordering::Relaxed))
    }

    /// Mark progress as complete (step = total).
    pub fn finish(&self) {
        let t = self.total.load(Ordering::Relaxed);
        self.step.store(t, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_caps_below_total() {
        let p = Progress::new();
        p.init(3);
        p.advance();
        p.advance();
        p.advance();
        p.advance(); // capped
        assert_eq!(p.get(), (2, 3));
        p.finish();
        assert_eq!(p.get(), (3, 3));
    }

    #[test]
    fn cancel_roundtrip() {
        let p = Progress::new();
        p.init(1);
        assert!(p.check_cancelled().is_ok());
        p.cancel();
        assert!(p.is_cancelled());
        match p.check_cancelled() {
            Err(CodecError::Cancelled) => {}
            other => panic!("expected Cancelled, got {other:?}"),
        }
        p.init(1); // init clears the flag
        assert!(!p.is_cancelled());
    }

    #[test]
    fn indeterminate_total_advances_freely() {
        let p = Progress::new();
        p.init(0);
        p.advance();
        p.advance();
        assert_eq!(p.get(), (2, 0));
    }
}
