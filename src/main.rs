//! Binary entrypoint that replays a conversation transcript.

use std::process::ExitCode;

use hangouts_store::replay;

/// Replay the transcript given as the first argument.
fn main() -> ExitCode {
    replay::run()
}
