use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use tracing::{debug, warn};

use super::{SpeechEngine, SpeechEvent, Utterance, Voice, VoiceList};
use crate::error::SpeechError;

/// espeak's default speaking rate in words per minute.
const BASE_WPM: f64 = 175.0;

/// Speaks through an external synthesizer process (`espeak-ng` style CLI).
///
/// The voice list is fetched on a background thread when the engine is
/// created, so it is `Pending` for a short while.
pub struct CommandSpeech {
    program: String,
    voices: Arc<Mutex<Option<Vec<Voice>>>>,
    child: Option<Child>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        let voices = Arc::new(Mutex::new(None));

        let loader_program = program.clone();
        let slot = Arc::clone(&voices);
        thread::spawn(move || {
            let list = match Command::new(&loader_program)
                .arg("--voices")
                .stdin(Stdio::null())
                .stderr(Stdio::null())
                .output()
            {
                Ok(out) if out.status.success() => {
                    parse_voice_list(&String::from_utf8_lossy(&out.stdout))
                }
                Ok(out) => {
                    warn!(program = %loader_program, status = %out.status, "voice listing failed");
                    Vec::new()
                }
                Err(e) => {
                    warn!(program = %loader_program, error = %e, "voice listing failed");
                    Vec::new()
                }
            };
            debug!(count = list.len(), "voice list loaded");
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(list);
        });

        CommandSpeech {
            program,
            voices,
            child: None,
        }
    }

    fn args(utterance: &Utterance) -> Vec<String> {
        let wpm = (BASE_WPM * utterance.rate).round().clamp(80.0, 450.0);
        let pitch = (utterance.pitch * 50.0).round().clamp(0.0, 99.0);
        let mut args = vec![
            "--stdin".to_string(),
            "-s".to_string(),
            format!("{wpm}"),
            "-p".to_string(),
            format!("{pitch}"),
        ];
        if let Some(voice) = &utterance.voice {
            args.push("-v".to_string());
            args.push(voice.language.clone());
        }
        args
    }

    #[cfg(unix)]
    fn signal(&self, job: Job) -> Result<(), SpeechError> {
        let Some(child) = &self.child else {
            return Ok(());
        };
        let pid = libc::pid_t::try_from(child.id())
            .map_err(|e| SpeechError::Signal(std::io::Error::other(e)))?;
        let sig = match job {
            Job::Stop => libc::SIGSTOP,
            Job::Continue => libc::SIGCONT,
        };
        // SAFETY: `pid` is our own child, which stays unreaped until `cancel`
        // or `poll_event` waits on it.
        if unsafe { libc::kill(pid, sig) } != 0 {
            return Err(SpeechError::Signal(std::io::Error::last_os_error()));
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn signal(&self, job: Job) -> Result<(), SpeechError> {
        debug!(?job, "job control unavailable on this platform");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Job {
    Stop,
    Continue,
}

impl SpeechEngine for CommandSpeech {
    fn voices(&mut self) -> VoiceList {
        match &*self.voices.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(list) => VoiceList::Ready(list.clone()),
            None => VoiceList::Pending,
        }
    }

    fn speak(&mut self, utterance: Utterance) -> Result<(), SpeechError> {
        self.cancel();

        let mut child = Command::new(&self.program)
            .args(Self::args(&utterance))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SpeechError::Spawn {
                command: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(source) = stdin.write_all(utterance.text.as_bytes()) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SpeechError::Spawn {
                    command: self.program.clone(),
                    source,
                });
            }
        }

        debug!(pid = child.id(), "synthesizer started");
        self.child = Some(child);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), SpeechError> {
        self.signal(Job::Stop)
    }

    fn resume(&mut self) -> Result<(), SpeechError> {
        self.signal(Job::Continue)
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.child.take() {
            // A stopped process still dies on SIGKILL.
            let _ = child.kill();
            let _ = child.wait();
            debug!("synthesizer cancelled");
        }
    }

    fn poll_event(&mut self) -> Option<SpeechEvent> {
        let child = self.child.as_mut()?;
        match child.try_wait() {
            Ok(None) => None,
            Ok(Some(status)) => {
                self.child = None;
                if status.success() {
                    Some(SpeechEvent::Finished)
                } else {
                    Some(SpeechEvent::Failed(format!("synthesizer exited with {status}")))
                }
            }
            Err(e) => {
                self.child = None;
                Some(SpeechEvent::Failed(e.to_string()))
            }
        }
    }
}

impl Drop for CommandSpeech {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Parse `espeak-ng --voices` output:
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
/// ```
fn parse_voice_list(output: &str) -> Vec<Voice> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let _priority = cols.next()?;
            let language = cols.next()?;
            let _age_gender = cols.next()?;
            let name = cols.next()?;
            Some(Voice {
                name: name.to_string(),
                language: language.to_string(),
                default: false,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_voice_listing() {
        let out = "Pty Language       Age/Gender VoiceName          File                 Other Languages\n \
                   5  af              --/M      Afrikaans          gmw/af\n \
                   2  en-us           --/M      English_(America)  gmw/en-US            (en 3)\n\n";
        let voices = parse_voice_list(out);
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[1].language, "en-us");
        assert_eq!(voices[1].name, "English_(America)");
    }

    #[test]
    fn maps_rate_and_pitch() {
        let args = CommandSpeech::args(&Utterance {
            text: "x".into(),
            voice: Some(Voice {
                name: "English".into(),
                language: "en-gb".into(),
                default: false,
            }),
            rate: 2.0,
            pitch: 0.0,
        });
        assert_eq!(args, vec!["--stdin", "-s", "350", "-p", "0", "-v", "en-gb"]);
    }

    #[test]
    fn pause_without_a_child_is_a_no_op() {
        let mut engine = CommandSpeech::new("definitely-not-a-synthesizer-binary");
        assert!(engine.pause().is_ok());
        assert!(engine.resume().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn stops_and_continues_the_child() {
        let mut engine = CommandSpeech::new("sleep");
        engine.child = Some(Command::new("sleep").arg("5").spawn().unwrap());
        engine.pause().unwrap();
        engine.resume().unwrap();
        assert_eq!(engine.poll_event(), None);
        engine.cancel();
        assert!(engine.child.is_none());
        assert!(engine.pause().is_ok());
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let mut engine = CommandSpeech::new("definitely-not-a-synthesizer-binary");
        let err = engine
            .speak(Utterance {
                text: "hello".into(),
                voice: None,
                rate: 1.0,
                pitch: 1.0,
            })
            .unwrap_err();
        assert!(matches!(err, SpeechError::Spawn { .. }));
        assert_eq!(engine.poll_event(), None);
    }
}
