//! Session control
//!
//! The only state shared between the alignment process and the outside
//! world. Host tasks (UI, network, buttons) call `proceed()` and `cancel()`;
//! the process observes them at its next resumption point.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicBool, Ordering};

use registra_core::traits::{GatePrompt, GateResponse, UserGate};

/// Queued operator responses
const RESPONSE_QUEUE_SIZE: usize = 4;

/// Proceed/cancel control shared with an alignment run
pub struct SessionControl<M: RawMutex> {
    cancelled: AtomicBool,
    /// Wakes a process suspended on cancellation
    cancel_signal: Signal<M, ()>,
    responses: Channel<M, GateResponse, RESPONSE_QUEUE_SIZE>,
    /// Prompt currently presented to the operator
    prompt: Signal<M, GatePrompt>,
}

impl<M: RawMutex> Default for SessionControl<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> SessionControl<M> {
    pub const fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            cancel_signal: Signal::new(),
            responses: Channel::new(),
            prompt: Signal::new(),
        }
    }

    /// Request cancellation of the running session
    ///
    /// Sticky until `reset()`.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.cancel_signal.signal(());
        let _ = self.responses.try_send(GateResponse::Cancel);
    }

    /// Answer the current prompt with Proceed
    ///
    /// Returns false if the response queue is full.
    pub fn proceed(&self) -> bool {
        self.responses.try_send(GateResponse::Proceed).is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation has been requested
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            self.cancel_signal.wait().await;
        }
    }

    /// Wait for the next prompt the process presents
    pub async fn next_prompt(&self) -> GatePrompt {
        self.prompt.wait().await
    }

    /// Clear cancellation, queued responses, and any pending prompt
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
        self.cancel_signal.reset();
        self.prompt.reset();
        self.drain_responses();
    }

    fn drain_responses(&self) {
        while self.responses.try_receive().is_ok() {}
    }
}

impl<M: RawMutex> UserGate for &SessionControl<M> {
    async fn present(&mut self, prompt: &GatePrompt) -> GateResponse {
        // Responses sent before this prompt was shown are stale
        self.drain_responses();
        if self.is_cancelled() {
            return GateResponse::Cancel;
        }
        trace!("Presenting prompt: {}", prompt.title.as_str());
        self.prompt.signal(prompt.clone());
        self.responses.receive().await
    }
}
