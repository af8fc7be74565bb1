use super::{SpeechEngine, SpeechEvent, Utterance, VoiceList};
use crate::error::SpeechError;

/// Engine that accepts utterances and finishes them immediately.
#[derive(Debug, Default)]
pub struct SilentSpeech {
    in_flight: bool,
}

impl SilentSpeech {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpeechEngine for SilentSpeech {
    fn voices(&mut self) -> VoiceList {
        VoiceList::Ready(Vec::new())
    }

    fn speak(&mut self, _utterance: Utterance) -> Result<(), SpeechError> {
        self.in_flight = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), SpeechError> {
        Ok(())
    }

    fn resume(&mut self) -> Result<(), SpeechError> {
        Ok(())
    }

    fn cancel(&mut self) {
        self.in_flight = false;
    }

    fn poll_event(&mut self) -> Option<SpeechEvent> {
        std::mem::take(&mut self.in_flight).then_some(SpeechEvent::Finished)
    }
}
