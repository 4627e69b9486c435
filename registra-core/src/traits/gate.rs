//! Operator gate trait
//!
//! Presents instructions to the operator and waits for Proceed or Cancel.

use core::fmt::Write;

use heapless::String;

/// Maximum prompt title length
pub const MAX_TITLE_LEN: usize = 64;
/// Maximum prompt instructions length
pub const MAX_INSTRUCTIONS_LEN: usize = 128;
/// Maximum proceed button label length
pub const MAX_LABEL_LEN: usize = 16;

/// Operator decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateResponse {
    Proceed,
    Cancel,
}

/// Instructions shown while waiting on the operator
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GatePrompt {
    pub title: String<MAX_TITLE_LEN>,
    pub instructions: String<MAX_INSTRUCTIONS_LEN>,
    pub proceed_label: String<MAX_LABEL_LEN>,
    /// False when only Cancel is offered
    pub allow_proceed: bool,
}

impl GatePrompt {
    /// Build a prompt, truncating text that does not fit
    pub fn new(title: &str, instructions: &str, proceed_label: &str, allow_proceed: bool) -> Self {
        Self {
            title: truncated(title),
            instructions: truncated(instructions),
            proceed_label: truncated(proceed_label),
            allow_proceed,
        }
    }

    /// Ask the operator to jog the camera onto a manual fiducial
    pub fn manual_fiducial(board_index: usize, board_count: usize, placement_id: &str) -> Self {
        let mut prompt = Self::new("", "", "Next", true);
        // Overflow only truncates the text
        let _ = write!(
            prompt.title,
            "(Board {}/{}) | Set correct part location",
            board_index + 1,
            board_count
        );
        let _ = write!(
            prompt.instructions,
            "Move camera to '{}' location, then press Next.",
            placement_id
        );
        prompt
    }
}

fn truncated<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Trait for operator interaction
#[allow(async_fn_in_trait)]
pub trait UserGate {
    /// Show `prompt` and wait for the operator's decision
    async fn present(&mut self, prompt: &GatePrompt) -> GateResponse;
}

impl<T: UserGate> UserGate for &mut T {
    async fn present(&mut self, prompt: &GatePrompt) -> GateResponse {
        (**self).present(prompt).await
    }
}
