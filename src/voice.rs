//! Voice-activated capture trigger.
//!
//! A background thread listens to a transcript source (whatever speech
//! recognizer the host wires in) and forwards a capture request whenever a
//! recognized phrase is heard. The request goes through the exact same
//! guarded path as the capture button, so voice can never start a second
//! countdown or interrupt a review.
//!
//! Recognizers lose their listening session; the trigger restarts the
//! source once on failure and otherwise degrades to manual-only capture
//! without disturbing the session. Utterances carry a sequence number so a
//! restart that replays old transcript lines cannot re-trigger a capture.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::UnboundedSender;

/// Phrases that request a capture, matched case-insensitively anywhere in
/// an utterance.
pub const RECOGNIZED_PHRASES: [&str; 3] = ["cheese", "snap", "take photo"];

/// One recognized stretch of speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// Monotonic sequence number; replays after a restart reuse old numbers
    pub seq: u64,
    /// Transcribed text
    pub text: String,
}

/// Errors from the speech recognizer.
#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("speech source failed: {0}")]
    SourceFailed(String),

    #[error("speech source could not be restarted: {0}")]
    RestartFailed(String),
}

/// A stream of transcribed speech.
///
/// Implemented by the host over its recognizer of choice. `next_utterance`
/// blocks until speech arrives and returns `Ok(None)` when the source is
/// exhausted (e.g. the recognizer shut down cleanly).
pub trait TranscriptSource: Send {
    fn next_utterance(&mut self) -> Result<Option<Utterance>, RecognitionError>;

    /// Re-open the underlying listening session after a failure.
    fn restart(&mut self) -> Result<(), RecognitionError>;
}

/// Check whether an utterance contains a recognized capture phrase.
pub fn phrase_matches(text: &str) -> bool {
    let text = text.to_lowercase();
    RECOGNIZED_PHRASES.iter().any(|p| text.contains(p))
}

/// Listener loop: match phrases, dedupe by sequence, restart once.
///
/// Runs on the trigger's background thread; separated out so tests can
/// drive it synchronously with a scripted source.
fn listen_loop(
    mut source: impl TranscriptSource,
    trigger_tx: UnboundedSender<()>,
    stop: Arc<AtomicBool>,
) {
    let mut last_seq: Option<u64> = None;
    let mut restart_spent = false;

    while !stop.load(Ordering::SeqCst) {
        match source.next_utterance() {
            Ok(Some(utterance)) => {
                // A restarted source may replay lines it already delivered
                if last_seq.is_some_and(|seen| utterance.seq <= seen) {
                    continue;
                }
                last_seq = Some(utterance.seq);

                if phrase_matches(&utterance.text) {
                    log::info!("voice capture trigger: {:?}", utterance.text);
                    if trigger_tx.send(()).is_err() {
                        break; // session gone
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                if restart_spent {
                    log::warn!("voice trigger disabled, falling back to manual capture: {}", e);
                    break;
                }
                log::warn!("speech source failed ({}), restarting once", e);
                restart_spent = true;
                if let Err(e) = source.restart() {
                    log::warn!("voice trigger disabled, falling back to manual capture: {}", e);
                    break;
                }
            }
        }
    }
}

/// Transcript source fed programmatically through a channel.
///
/// Whatever produces speech text (a recognizer process, a test, the `say`
/// control line) sends utterances into the channel; the trigger consumes
/// them like any other source. The source ends cleanly when all senders
/// drop.
pub struct ChannelSource {
    rx: std::sync::mpsc::Receiver<Utterance>,
}

impl ChannelSource {
    pub fn new(rx: std::sync::mpsc::Receiver<Utterance>) -> Self {
        Self { rx }
    }
}

impl TranscriptSource for ChannelSource {
    fn next_utterance(&mut self) -> Result<Option<Utterance>, RecognitionError> {
        match self.rx.recv() {
            Ok(utterance) => Ok(Some(utterance)),
            Err(_) => Ok(None), // all senders gone
        }
    }

    fn restart(&mut self) -> Result<(), RecognitionError> {
        Ok(())
    }
}

/// Manages the voice listener thread.
pub struct VoiceTrigger {
    /// Flag to stop the listener thread
    stop_flag: Arc<AtomicBool>,
    /// Handle to the listener thread
    listener_thread: Option<JoinHandle<()>>,
}

impl VoiceTrigger {
    /// Start listening on `source`, forwarding capture requests to
    /// `trigger_tx`.
    pub fn start(
        source: impl TranscriptSource + 'static,
        trigger_tx: UnboundedSender<()>,
    ) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&stop_flag);

        let handle = thread::spawn(move || {
            listen_loop(source, trigger_tx, stop);
        });

        Self {
            stop_flag,
            listener_thread: Some(handle),
        }
    }

    /// Stop the listener.
    ///
    /// The thread exits at its next utterance boundary; a source blocked in
    /// `next_utterance` keeps the thread alive until it yields, but no
    /// further triggers are forwarded.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        self.listener_thread = None;
    }
}

impl Drop for VoiceTrigger {
    fn drop(&mut self) {
        self.stop();
    }
}
