// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Per-channel session state machine.
//!
//! `Idle → Encoding → Encoded → Decoding → Decoded`, back to `Idle` on
//! reset. Synthesis and spectral analysis only run inside the two active
//! states; there is no resuming of partially completed work — an aborted
//! pass discards its partial output and the session returns to `Idle`.
//!
//! The session owns the [`Progress`] of the pass in flight. A UI thread
//! keeps a [`Session::cancel_handle`] clone and may abort at any tone
//! boundary while the codec thread drives the session.

use std::fmt;
use std::sync::Arc;

use crate::audio::{self, AnalyzerConfig, ToneConfig};
use crate::error::CodecError;
use crate::opcode::InstructionTable;
use crate::progress::Progress;

/// Lifecycle of one carrier-channel session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Encoding,
    Encoded,
    Decoding,
    Decoded,
}

/// An illegal state-machine transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: ChannelState,
    pub to: ChannelState,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid session transition: {:?} → {:?}", self.from, self.to)
    }
}

impl std::error::Error for InvalidTransition {}

/// One encode/decode session over a single channel.
#[derive(Debug)]
pub struct Session {
    state: ChannelState,
    progress: Arc<Progress>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self { state: ChannelState::Idle, progress: Arc::new(Progress::new()) }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Clone of the progress handle, for a UI thread to poll and cancel.
    pub fn cancel_handle(&self) -> Arc<Progress> {
        Arc::clone(&self.progress)
    }

    /// Enter `Encoding`. Only legal from `Idle`.
    pub fn begin_encode(&mut self) -> Result<(), InvalidTransition> {
        self.transition(ChannelState::Idle, ChannelState::Encoding)
    }

    /// Leave `Encoding` with a completed artifact.
    pub fn finish_encode(&mut self) -> Result<(), InvalidTransition> {
        self.transition(ChannelState::Encoding, ChannelState::Encoded)
    }

    /// Enter `Decoding`. Legal from `Idle` (decode-only session) or
    /// `Encoded` (round trip).
    pub fn begin_decode(&mut self) -> Result<(), InvalidTransition> {
        match self.state {
            ChannelState::Idle | ChannelState::Encoded => {
                self.state = ChannelState::Decoding;
                Ok(())
            }
            from => Err(InvalidTransition { from, to: ChannelState::Decoding }),
        }
    }

    /// Leave `Decoding` with a recovered payload.
    pub fn finish_decode(&mut self) -> Result<(), InvalidTransition> {
        self.transition(ChannelState::Decoding, ChannelState::Decoded)
    }

    /// Return to `Idle` from any state and clear the pass progress.
    pub fn reset(&mut self) {
        self.state = ChannelState::Idle;
        self.progress.init(0);
    }

    fn transition(
        &mut self,
        expect: ChannelState,
        to: ChannelState,
    ) -> Result<(), InvalidTransition> {
        if self.state != expect {
            return Err(InvalidTransition { from: self.state, to });
        }
        self.state = to;
        Ok(())
    }

    /// Run a full audio-channel encode inside this session.
    ///
    /// On any error — including cancellation through the handle from
    /// [`Session::cancel_handle`] — partial output is discarded and the
    /// session returns to `Idle`.
    pub fn encode_audio(
        &mut self,
        values: &[u8],
        cfg: &ToneConfig,
        table: &InstructionTable,
    ) -> Result<Vec<u8>, CodecError> {
        self.begin_encode()?;
        let result = (|| {
            let plan = audio::plan_bytes(values, cfg, table)?;
            let buffer = audio::synthesize(&plan, cfg.sample_rate, &self.progress)?;
            Ok(audio::wav::serialize(&buffer))
        })();
        match result {
            Ok(wav) => {
                self.finish_encode()?;
                Ok(wav)
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    /// Run a full audio-channel decode inside this session.
    pub fn decode_audio(
        &mut self,
        wav_data: &[u8],
        cfg: &AnalyzerConfig,
        table: &InstructionTable,
    ) -> Result<Vec<u8>, CodecError> {
        self.begin_decode()?;
        let result = (|| {
            let buffer = audio::wav::parse(wav_data)?;
            audio::analyze_bytes(&buffer, cfg, table, &self.progress)
        })();
        match result {
            Ok(values) => {
                self.finish_decode()?;
                Ok(values)
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_lifecycle() {
        let mut s = Session::new();
        assert_eq!(s.state(), ChannelState::Idle);
        s.begin_encode().unwrap();
        assert_eq!(s.state(), ChannelState::Encoding);
        s.finish_encode().unwrap();
        assert_eq!(s.state(), ChannelState::Encoded);
        s.begin_decode().unwrap();
        assert_eq!(s.state(), ChannelState::Decoding);
        s.finish_decode().unwrap();
        assert_eq!(s.state(), ChannelState::Decoded);
        s.reset();
        assert_eq!(s.state(), ChannelState::Idle);
    }

    #[test]
    fn decode_only_session() {
        let mut s = Session::new();
        s.begin_decode().unwrap();
        assert_eq!(s.state(), ChannelState::Decoding);
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        let mut s = Session::new();
        assert!(s.finish_encode().is_err());
        s.begin_encode().unwrap();
        assert!(s.begin_encode().is_err()); // no nested encode
        assert!(s.begin_decode().is_err()); // not while encoding
        assert!(s.finish_decode().is_err());
    }

    #[test]
    fn audio_roundtrip_through_session() {
        let table = InstructionTable::global();
        let mut s = Session::new();
        let wav = s.encode_audio(b"Hi", &ToneConfig::default(), table).unwrap();
        assert_eq!(s.state(), ChannelState::Encoded);
        let recovered = s.decode_audio(&wav, &AnalyzerConfig::default(), table).unwrap();
        assert_eq!(s.state(), ChannelState::Decoded);
        assert_eq!(recovered, b"Hi");
    }

    #[test]
    fn stale_cancel_request_clears_at_pass_start() {
        let table = InstructionTable::global();
        let mut s = Session::new();
        let handle = s.cancel_handle();
        handle.cancel();
        // A fresh pass re-inits the progress, clearing the stale flag.
        let wav = s.encode_audio(b"ok", &ToneConfig::default(), table).unwrap();
        assert!(!wav.is_empty());
        assert_eq!(s.state(), ChannelState::Encoded);
    }

    #[test]
    fn cancel_mid_pass_aborts_at_tone_boundary() {
        use std::sync::mpsc;
        use std::thread;

        let table = InstructionTable::global();
        let mut s = Session::new();
        let handle = s.cancel_handle();
        let (tx, rx) = mpsc::channel();
        let canceller = thread::spawn(move || {
            // Wait until the pass has started, then abort it.
            rx.recv().unwrap();
            handle.cancel();
        });
        // Long payload so the pass is still running when cancel lands;
        // if it finishes first, the encode simply succeeds — both
        // outcomes leave the session in a legal state.
        let payload = vec![65u8; 2000];
        let watcher = s.cancel_handle();
        tx.send(()).unwrap();
        let result = s.encode_audio(&payload, &ToneConfig::default(), table);
        canceller.join().unwrap();
        match result {
            Err(CodecError::Cancelled) => {
                assert_eq!(s.state(), ChannelState::Idle);
                assert!(watcher.is_cancelled());
            }
            Ok(_) => assert_eq!(s.state(), ChannelState::Encoded),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn failed_encode_returns_to_idle() {
        let table = InstructionTable::global();
        let mut s = Session::new();
        // Token-octave frequency 28 160 Hz cannot fit under 22.05 kHz.
        let cfg = ToneConfig {
            scheme: crate::audio::FrequencyScheme::TokenOctave,
            ..ToneConfig::default()
        };
        assert!(s.encode_audio(&[130], &cfg, table).is_err());
        assert_eq!(s.state(), ChannelState::Idle);
    }
}
