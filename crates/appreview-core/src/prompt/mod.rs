//! Prompt capabilities and dispatch.
//!
//! The host supplies two capabilities:
//! - [`ReviewTrigger`]: asks the platform for its native store-review dialog
//! - [`ConfirmationPresenter`]: shows a two-button "do you like the app?" modal
//!
//! A [`Prompter`] is resolved from them once at startup and fires
//! [`PromptRequest`]s on behalf of the policy.

mod prompter;

pub use prompter::{PromptSettings, Prompter, DEFAULT_PROMPT_DELAY};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle naming the UI surface (window, scene) a prompt targets.
///
/// Only the handle travels with deferred prompts, never the UI object itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(String);

impl SurfaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SurfaceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// How the caller wants the user to be asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptRequest {
    /// Invoke the native review dialog, in the given surface if any.
    Direct { surface: Option<SurfaceId> },
    /// Ask "do you like the app?" first; only "yes" leads to the native dialog.
    ConfirmFirst { surface: SurfaceId },
}

impl PromptRequest {
    /// Native dialog without a target surface.
    pub fn direct() -> Self {
        Self::Direct { surface: None }
    }

    /// Native dialog targeted at a surface.
    pub fn direct_in(surface: impl Into<SurfaceId>) -> Self {
        Self::Direct {
            surface: Some(surface.into()),
        }
    }

    /// Confirmation modal on a surface, then the native dialog on accept.
    pub fn confirm_first(surface: impl Into<SurfaceId>) -> Self {
        Self::ConfirmFirst {
            surface: surface.into(),
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Direct { .. } => "direct",
            Self::ConfirmFirst { .. } => "confirm_first",
        }
    }
}

/// Labels for the confirmation modal.
///
/// Localization is the host's job; these are the strings it hands over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptCopy {
    pub title: String,
    pub decline: String,
    pub accept: String,
}

impl Default for PromptCopy {
    fn default() -> Self {
        Self {
            title: "Do you like the app?".to_string(),
            decline: "No".to_string(),
            accept: "Yes, I like it!".to_string(),
        }
    }
}

/// Callback handed to a presenter for one of its buttons.
pub type PromptCallback = Box<dyn FnOnce() + Send>;

/// Platform hook that requests the native store-review dialog.
///
/// Fire-and-forget: the platform decides whether UI actually appears and
/// reports nothing back.
#[cfg_attr(test, mockall::automock)]
pub trait ReviewTrigger: Send + Sync {
    /// Whether this trigger can run on the current platform/OS version.
    fn is_available(&self) -> bool {
        true
    }

    /// Request the review dialog.
    fn request_review(&self, surface: Option<SurfaceId>);
}

/// Platform hook that shows a blocking two-button modal.
pub trait ConfirmationPresenter: Send + Sync {
    /// Show the modal on `surface`.
    ///
    /// Exactly one of the callbacks runs when the user answers. Returns
    /// `false` without running either if the surface cannot present.
    fn present(
        &self,
        surface: &SurfaceId,
        copy: &PromptCopy,
        on_decline: PromptCallback,
        on_accept: PromptCallback,
    ) -> bool;
}
