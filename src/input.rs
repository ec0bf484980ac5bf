//! Stdin control surface for the running booth.
//!
//! Reads lines from stdin on a background thread and parses them into booth
//! commands. `say <text>` lines are routed to the voice trigger as
//! utterances instead, so the voice path can be exercised without a speech
//! recognizer attached.

use std::io::{self, BufRead};
use std::sync::mpsc::Sender;
use std::thread;

use tokio::sync::mpsc::UnboundedSender;

use crate::backgrounds::BackgroundSet;
use crate::event_loop::BoothCommand;
use crate::filters::PhotoFilter;
use crate::voice::Utterance;

/// One parsed control line.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlLine {
    /// A booth command
    Command(BoothCommand),
    /// Text for the voice trigger
    Say(String),
}

/// Parse a line of input into a control line.
///
/// Empty input is ignored. Unknown commands and unknown filter/background
/// names return `None`; the listener prints a hint in that case.
pub fn parse_input(input: &str) -> Option<ControlLine> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (trimmed, ""),
    };

    match word.to_lowercase().as_str() {
        "snap" | "capture" => Some(ControlLine::Command(BoothCommand::Capture)),
        "save" => Some(ControlLine::Command(BoothCommand::Save)),
        "retake" => Some(ControlLine::Command(BoothCommand::Retake)),
        "switch" => Some(ControlLine::Command(BoothCommand::SwitchCamera)),
        "quit" | "exit" => Some(ControlLine::Command(BoothCommand::Quit)),
        "filter" => PhotoFilter::from_str(rest)
            .map(|f| ControlLine::Command(BoothCommand::SelectFilter(f))),
        "bg" | "background" => {
            if BackgroundSet::is_known(rest) {
                Some(ControlLine::Command(BoothCommand::SelectBackground(
                    rest.to_string(),
                )))
            } else {
                None
            }
        }
        "say" if !rest.is_empty() => Some(ControlLine::Say(rest.to_string())),
        _ => None,
    }
}

/// Start reading control lines from stdin.
///
/// Commands go to `command_tx`; `say` lines go to `say_tx` with increasing
/// sequence numbers. The thread ends on EOF or when both receivers are
/// gone.
pub fn spawn_listener(command_tx: UnboundedSender<BoothCommand>, say_tx: Sender<Utterance>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        let handle = stdin.lock();
        let mut say_seq = 0u64;

        for line in handle.lines() {
            let Ok(line) = line else { break };

            match parse_input(&line) {
                Some(ControlLine::Command(command)) => {
                    let quit = command == BoothCommand::Quit;
                    if command_tx.send(command).is_err() || quit {
                        break;
                    }
                }
                Some(ControlLine::Say(text)) => {
                    say_seq += 1;
                    // Dropped receiver means voice degraded; keep reading
                    // so manual commands still work
                    let _ = say_tx.send(Utterance {
                        seq: say_seq,
                        text,
                    });
                }
                None => {
                    if !line.trim().is_empty() {
                        eprintln!(
                            "Unknown command '{}'. Try: snap, save, retake, filter <name>, bg <name>, switch, say <text>, quit",
                            line.trim()
                        );
                    }
                }
            }
        }
    });
}
