//! Drive loop assembling a chunked response into applied fragments.

use banter_types::error::StreamError;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::api::transport::ByteStream;
use crate::stream::framing::{LineFramer, SseLine, decode_line};

/// Pull the byte stream to completion, applying each delta fragment in
/// arrival order.
///
/// `apply` returns false when the session no longer wants fragments (it
/// was torn down concurrently); that aborts assembly as a cancellation.
/// Returns `Ok` only when the terminal sentinel arrived; a transport error
/// or an end-of-stream without the sentinel is an interruption, and
/// fragments already applied stay applied.
pub async fn assemble<F>(
    mut stream: ByteStream,
    cancel: &CancellationToken,
    mut apply: F,
) -> Result<(), StreamError>
where
    F: FnMut(&str) -> bool,
{
    let mut framer = LineFramer::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StreamError::Cancelled),
            next = stream.next() => next,
        };
        let Some(chunk) = next else { break };
        let chunk = chunk.map_err(|err| StreamError::Interrupted(err.to_string()))?;

        for line in framer.push(&chunk) {
            match decode_line(&line) {
                SseLine::Fragment(text) => {
                    if !apply(&text) {
                        return Err(StreamError::Cancelled);
                    }
                }
                SseLine::Done => return Ok(()),
                SseLine::Ignored => {}
            }
        }
    }

    // The stream ended without the sentinel. The residue may still hold a
    // final unterminated line; classify it before deciding.
    if let Some(line) = framer.finish() {
        match decode_line(&line) {
            SseLine::Fragment(text) => {
                if !apply(&text) {
                    return Err(StreamError::Cancelled);
                }
            }
            SseLine::Done => return Ok(()),
            SseLine::Ignored => {}
        }
    }

    Err(StreamError::Interrupted(
        "stream ended before the done sentinel".to_string(),
    ))
}
