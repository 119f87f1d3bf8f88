//! Resolved prompt capability.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::prompt::{ConfirmationPresenter, PromptCopy, PromptRequest, ReviewTrigger, SurfaceId};

/// Pause before the native dialog is requested, so it does not appear in the
/// middle of a UI transition.
pub const DEFAULT_PROMPT_DELAY: Duration = Duration::from_secs(1);

/// Presentation settings for a [`Prompter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSettings {
    /// Delay before the native dialog is requested (zero = immediately).
    pub delay: Duration,
    /// Labels for the confirmation modal.
    pub copy: PromptCopy,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            delay: DEFAULT_PROMPT_DELAY,
            copy: PromptCopy::default(),
        }
    }
}

/// Fires prompt requests through the capabilities chosen at startup.
pub struct Prompter {
    trigger: Option<Arc<dyn ReviewTrigger>>,
    presenter: Option<Arc<dyn ConfirmationPresenter>>,
    settings: PromptSettings,
}

impl Prompter {
    /// Prompter with a single trigger, kept only if it is available.
    pub fn new(trigger: Arc<dyn ReviewTrigger>) -> Self {
        Self::resolve(vec![trigger])
    }

    /// Pick the first available trigger among `candidates`.
    ///
    /// With none available, direct prompts become no-ops.
    pub fn resolve(candidates: Vec<Arc<dyn ReviewTrigger>>) -> Self {
        let total = candidates.len();
        let trigger = candidates.into_iter().find(|t| t.is_available());
        if trigger.is_none() {
            warn!(
                candidates = total,
                "No review trigger available on this platform; review prompts are disabled"
            );
        }
        Self {
            trigger,
            presenter: None,
            settings: PromptSettings::default(),
        }
    }

    /// Builder method to set the confirmation presenter.
    pub fn with_presenter(mut self, presenter: Arc<dyn ConfirmationPresenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// Builder method to replace all settings.
    pub fn with_settings(mut self, settings: PromptSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Builder method to set the delay before the native dialog.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.settings.delay = delay;
        self
    }

    /// Whether a trigger was resolved.
    pub fn has_trigger(&self) -> bool {
        self.trigger.is_some()
    }

    /// Whether a confirmation presenter is configured.
    pub fn has_presenter(&self) -> bool {
        self.presenter.is_some()
    }

    pub fn settings(&self) -> &PromptSettings {
        &self.settings
    }

    /// Fire a request. Never fails; anything missing degrades to a no-op.
    pub fn fire(&self, request: &PromptRequest) {
        // Captured now: the accept callback may run on a thread without one.
        let runtime = Handle::try_current().ok();

        match request {
            PromptRequest::Direct { surface } => schedule_review(
                self.trigger.clone(),
                surface.clone(),
                self.settings.delay,
                runtime,
            ),
            PromptRequest::ConfirmFirst { surface } => {
                let Some(presenter) = &self.presenter else {
                    warn!(%surface, "No confirmation presenter configured; skipping prompt");
                    return;
                };

                // "Yes" would lead nowhere without a native dialog to open.
                let Some(trigger) = self.trigger.clone() else {
                    warn!(%surface, "No review trigger available; skipping confirmation");
                    return;
                };
                let target = surface.clone();
                let delay = self.settings.delay;
                let on_accept = Box::new(move || {
                    debug!(surface = %target, "User accepted review confirmation");
                    schedule_review(Some(trigger), Some(target), delay, runtime);
                });
                let on_decline = Box::new(|| debug!("User declined review confirmation"));

                if !presenter.present(surface, &self.settings.copy, on_decline, on_accept) {
                    debug!(%surface, "Surface cannot present confirmation; skipping prompt");
                }
            }
        }
    }
}

/// Request the native dialog, after `delay` when a runtime is available.
fn schedule_review(
    trigger: Option<Arc<dyn ReviewTrigger>>,
    surface: Option<SurfaceId>,
    delay: Duration,
    runtime: Option<Handle>,
) {
    let Some(trigger) = trigger else {
        debug!("No review trigger; skipping native review request");
        return;
    };

    match runtime {
        Some(handle) if !delay.is_zero() => {
            handle.spawn(async move {
                tokio::time::sleep(delay).await;
                trigger.request_review(surface);
            });
        }
        _ => trigger.request_review(surface),
    }
}
