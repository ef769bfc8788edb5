// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use tracing::debug;

/// Voices tried first, by exact name.
pub const PREFERRED_VOICES: [&str; 3] = [
    "Google US English",
    "Microsoft Zira - English (United States)",
    "Samantha",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP 47 tag, e.g. `en-US`.
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self { name: name.into(), lang: lang.into() }
    }
}

/// Opaque id of one queued utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceHandle(pub u64);

/// Text-to-speech engine supplied by the host platform.
pub trait SpeechSynth {
    fn speak(&mut self, text: &str, voice: Option<&Voice>) -> UtteranceHandle;
    fn cancel(&mut self, handle: UtteranceHandle);
}

/// Best English voice available, in order: a preferred voice by name, a
/// US voice with "Female" in its name, a US voice without "Male", any
/// English voice.
pub fn pick_voice(voices: &[Voice]) -> Option<&Voice> {
    let us = |v: &&Voice| v.lang.starts_with("en-US");
    voices
        .iter()
        .find(|v| PREFERRED_VOICES.contains(&v.name.as_str()) && v.lang.starts_with("en"))
        .or_else(|| voices.iter().filter(us).find(|v| v.name.contains("Female")))
        .or_else(|| voices.iter().filter(us).find(|v| !v.name.contains("Male")))
        .or_else(|| voices.iter().find(|v| v.lang.starts_with("en")))
}

/// At most one message is read aloud at a time.
///
/// Toggling the message that is playing stops it; toggling another one
/// cancels the current utterance first.  Dropping the slot cancels whatever
/// is playing.
pub struct UtteranceSlot<S: SpeechSynth> {
    synth: S,
    voice: Option<Voice>,
    active: Option<(usize, UtteranceHandle)>,
}

impl<S: SpeechSynth> UtteranceSlot<S> {
    pub fn new(synth: S, voice: Option<Voice>) -> Self {
        Self { synth, voice, active: None }
    }

    /// Index of the message being spoken.
    pub fn speaking(&self) -> Option<usize> {
        self.active.map(|(index, _)| index)
    }

    pub fn set_voice(&mut self, voice: Option<Voice>) {
        self.voice = voice;
    }

    /// Start or stop reading message `index`.  Returns whether it is now
    /// playing.
    pub fn toggle(&mut self, index: usize, text: &str) -> bool {
        let same = self.speaking() == Some(index);
        self.stop();
        if same {
            return false;
        }
        let handle = self.synth.speak(text, self.voice.as_ref());
        debug!(index, handle = handle.0, "speaking message");
        self.active = Some((index, handle));
        true
    }

    /// The engine reports `handle` finished on its own.
    pub fn finished(&mut self, handle: UtteranceHandle) {
        if matches!(self.active, Some((_, h)) if h == handle) {
            self.active = None;
        }
    }

    pub fn stop(&mut self) {
        if let Some((_, handle)) = self.active.take() {
            self.synth.cancel(handle);
        }
    }

    pub fn synth(&self) -> &S {
        &self.synth
    }
}

impl<S: SpeechSynth> Drop for UtteranceSlot<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
