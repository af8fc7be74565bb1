#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use binary_explainer::error::SpeechError;
use binary_explainer::speech::{SpeechEngine, SpeechEvent, Utterance, VoiceList};
use binary_explainer::storyboard::{Scene, StoryboardDocument, VoiceHint};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Speak(String),
    Pause,
    Resume,
    Cancel,
}

/// Engine that records every call and never finishes on its own.
pub struct RecordingEngine {
    voices: VoiceList,
    calls: Rc<RefCell<Vec<Call>>>,
}

impl RecordingEngine {
    pub fn new(voices: VoiceList) -> (Self, Rc<RefCell<Vec<Call>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        (
            RecordingEngine {
                voices,
                calls: Rc::clone(&calls),
            },
            calls,
        )
    }
}

impl SpeechEngine for RecordingEngine {
    fn voices(&mut self) -> VoiceList {
        self.voices.clone()
    }

    fn speak(&mut self, utterance: Utterance) -> Result<(), SpeechError> {
        self.calls.borrow_mut().push(Call::Speak(utterance.text));
        Ok(())
    }

    fn pause(&mut self) -> Result<(), SpeechError> {
        self.calls.borrow_mut().push(Call::Pause);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), SpeechError> {
        self.calls.borrow_mut().push(Call::Resume);
        Ok(())
    }

    fn cancel(&mut self) {
        self.calls.borrow_mut().push(Call::Cancel);
    }

    fn poll_event(&mut self) -> Option<SpeechEvent> {
        None
    }
}

pub fn speak_count(calls: &Rc<RefCell<Vec<Call>>>) -> usize {
    calls
        .borrow()
        .iter()
        .filter(|c| matches!(c, Call::Speak(_)))
        .count()
}

pub fn document(narration: &str, durations: &[u64]) -> StoryboardDocument {
    let scenes = durations
        .iter()
        .map(|&duration_ms| Scene {
            duration_ms,
            ..Scene::default()
        })
        .collect();
    StoryboardDocument::new(narration, VoiceHint::default(), scenes)
        .expect("test document has scenes")
}
