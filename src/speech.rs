use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::SpeechSettings;

/// Speaks responses through the OS text-to-speech program: `say` on macOS,
/// `espeak` elsewhere. Degrades to silence when neither is present.
pub struct Speaker {
    program: Option<&'static str>,
    voice: Option<String>,
}

impl Speaker {
    pub fn new(settings: &SpeechSettings) -> Self {
        if !settings.enabled {
            return Self {
                program: None,
                voice: None,
            };
        }

        let program = detect_program();
        match program {
            Some(p) => debug!("TTS available via '{}'", p),
            None => warn!("No TTS program found ('say' or 'espeak'). Speech disabled."),
        }

        Self {
            program,
            voice: settings.voice.clone(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.program.is_some()
    }

    /// Speak a line. Waits for playback so advice isn't talked over, but
    /// failure is never fatal.
    pub async fn speak(&self, text: &str) {
        let Some(program) = self.program else {
            return;
        };
        if text.is_empty() {
            return;
        }

        let mut cmd = Command::new(program);
        if let Some(voice) = &self.voice {
            cmd.arg("-v").arg(voice);
        }
        cmd.arg(text);

        match cmd.status().await {
            Ok(status) if !status.success() => {
                warn!("TTS exited with {}", status);
            }
            Err(e) => warn!("TTS failed to start: {}", e),
            _ => {}
        }
    }
}

fn detect_program() -> Option<&'static str> {
    // `say -v ?` lists voices and exits cleanly; `say` alone would block
    // reading stdin.
    let candidates: &[(&str, &[&str])] = if cfg!(target_os = "macos") {
        &[("say", &["-v", "?"]), ("espeak", &["--version"])]
    } else {
        &[("espeak", &["--version"]), ("say", &["-v", "?"])]
    };

    for (program, probe_args) in candidates {
        let probe = std::process::Command::new(program)
            .args(*probe_args)
            .output();
        if matches!(probe, Ok(o) if o.status.success()) {
            return Some(program);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_speaker_is_silent() {
        let speaker = Speaker::new(&SpeechSettings {
            enabled: false,
            voice: None,
        });
        assert!(!speaker.is_available());
        // Must be a no-op, not an error
        speaker.speak("hello").await;
    }
}
