//! Optional second opinion on weak citations.
//!
//! A [`Verifier`] is consulted for unresolved or low-confidence citations.
//! Each call runs on its own thread and is abandoned after the configured
//! timeout. Anything but a strictly better answer leaves the original
//! citation in place, and a [`VerifierSession`] gives up on a verifier
//! after its first timeout.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::types::{Citation, Span};

/// Why a verifier call produced no answer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifierError {
    #[error("verifier timed out after {0:?}")]
    Timeout(Duration),

    #[error("verifier failed: {0}")]
    Failed(String),

    #[error("verifier panicked")]
    Panicked,
}

/// External judge for citations the engine could not resolve confidently.
pub trait Verifier: Send + Sync {
    /// Propose a citation for `text`, given `context` (the surrounding
    /// normalized text). `Ok(None)` means no opinion.
    fn verify(&self, text: &str, context: &str) -> Result<Option<Citation>, VerifierError>;
}

impl<F> Verifier for F
where
    F: Fn(&str, &str) -> Result<Option<Citation>, VerifierError> + Send + Sync,
{
    fn verify(&self, text: &str, context: &str) -> Result<Option<Citation>, VerifierError> {
        self(text, context)
    }
}

/// Call `verifier` on a worker thread, waiting at most `timeout`.
///
/// A call that times out keeps running detached; its answer is discarded.
pub fn consult(
    verifier: &Arc<dyn Verifier>,
    text: &str,
    context: &str,
    timeout: Duration,
) -> Result<Option<Citation>, VerifierError> {
    let (tx, rx) = mpsc::channel();
    let verifier = Arc::clone(verifier);
    let text = text.to_string();
    let context = context.to_string();

    thread::Builder::new()
        .name("citation-verifier".to_string())
        .spawn(move || {
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| verifier.verify(&text, &context)));
            // The receiver is gone once the caller has timed out.
            let _ = tx.send(outcome);
        })
        .map_err(|err| VerifierError::Failed(err.to_string()))?;

    match rx.recv_timeout(timeout) {
        Ok(Ok(result)) => result,
        Ok(Err(_)) | Err(RecvTimeoutError::Disconnected) => Err(VerifierError::Panicked),
        Err(RecvTimeoutError::Timeout) => Err(VerifierError::Timeout(timeout)),
    }
}

/// Verifier calls made during one extraction.
///
/// Once a call times out the session stops consulting the verifier, so a
/// hanging verifier costs at most one abandoned thread per extraction.
pub struct VerifierSession {
    verifier: Arc<dyn Verifier>,
    timeout: Duration,
    stalled: bool,
}

impl VerifierSession {
    #[must_use]
    pub fn new(verifier: Arc<dyn Verifier>, timeout: Duration) -> Self {
        Self {
            verifier,
            timeout,
            stalled: false,
        }
    }

    /// Whether an earlier call timed out.
    #[must_use]
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Replace `original` with the verifier's answer when that answer is
    /// strictly more confident. The original source, span and text are kept.
    #[must_use]
    pub fn review(&mut self, original: Citation, context: &str) -> Citation {
        if self.stalled {
            return original;
        }
        match consult(&self.verifier, &original.text, context, self.timeout) {
            Ok(Some(answer))
                if (0.0..=1.0).contains(&answer.confidence)
                    && answer.confidence > original.confidence =>
            {
                tracing::debug!(
                    text = %original.text,
                    before = original.confidence,
                    after = answer.confidence,
                    "verifier improved citation"
                );
                Citation {
                    source: original.source,
                    text: original.text,
                    span: original.span,
                    verified: true,
                    ..answer
                }
            }
            Ok(_) => original,
            Err(err @ VerifierError::Timeout(_)) => {
                tracing::warn!(
                    error = %err,
                    text = %original.text,
                    "verifier stalled, skipping it for the rest of the document"
                );
                self.stalled = true;
                original
            }
            Err(err) => {
                tracing::warn!(error = %err, text = %original.text, "verifier call failed");
                original
            }
        }
    }
}

/// Up to `chars` characters on each side of `span`, plus the span itself.
#[must_use]
pub fn surrounding(text: &str, span: Span, chars: usize) -> &str {
    let start = text[..span.start]
        .char_indices()
        .rev()
        .take(chars)
        .last()
        .map_or(span.start, |(i, _)| i);
    let end = text[span.end..]
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(i, _)| span.end + i);
    &text[start..end]
}
