use std::fmt;
use tracing::{debug, info, warn};

use super::{BuilderError, UploadCoordinator, ValidationError};

/// What a builder screen needs from its form.
pub trait QuestionForm {
    type Payload;

    fn validate(&self) -> Result<(), ValidationError>;

    fn to_payload(&self) -> Result<Self::Payload, ValidationError>;

    fn reset(&mut self);

    fn uploads(&self) -> &UploadCoordinator;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderPhase {
    /// edit mode only, waiting for the stored question
    Loading,
    LoadFailed(String),
    Editing,
    Validating,
    Saving,
    Succeeded,
}

impl BuilderPhase {
    fn describe(&self) -> &'static str {
        match self {
            BuilderPhase::Loading => "loading",
            BuilderPhase::LoadFailed(_) => "the question failed to load",
            BuilderPhase::Editing => "editing",
            BuilderPhase::Validating => "validating",
            BuilderPhase::Saving => "saving",
            BuilderPhase::Succeeded => "the question is saved",
        }
    }
}

/// One builder screen:
/// `Loading (edit only) -> Editing <-> Validating -> Saving -> Succeeded`,
/// with a failed save going back to `Editing`.
#[derive(Debug)]
pub struct BuilderSession<F> {
    mode: Mode,
    phase: BuilderPhase,
    form: Option<F>,
    last_error: Option<String>,
}

impl<F: QuestionForm> BuilderSession<F> {
    /// Add mode: editing starts immediately on `form`.
    pub fn create(form: F) -> Self {
        Self {
            mode: Mode::Create,
            phase: BuilderPhase::Editing,
            form: Some(form),
            last_error: None,
        }
    }

    /// Edit mode: no form until [`BuilderSession::loaded`].
    pub fn edit() -> Self {
        Self {
            mode: Mode::Edit,
            phase: BuilderPhase::Loading,
            form: None,
            last_error: None,
        }
    }

    pub fn loaded(&mut self, form: F) -> Result<(), BuilderError> {
        self.expect_phase(&BuilderPhase::Loading)?;
        self.form = Some(form);
        self.enter(BuilderPhase::Editing);
        Ok(())
    }

    pub fn load_failed(&mut self, message: impl fmt::Display) -> Result<(), BuilderError> {
        self.expect_phase(&BuilderPhase::Loading)?;
        let message = message.to_string();
        warn!(%message, "question failed to load");
        self.last_error = Some(message.clone());
        self.enter(BuilderPhase::LoadFailed(message));
        Ok(())
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> &BuilderPhase {
        &self.phase
    }

    /// Message of the last failed validation, save or load.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn form(&self) -> Option<&F> {
        self.form.as_ref()
    }

    /// The form for editing. A create session that already saved goes back
    /// to editing a fresh question.
    pub fn form_mut(&mut self) -> Result<&mut F, BuilderError> {
        self.resume_after_save();
        if self.phase != BuilderPhase::Editing {
            return Err(BuilderError::Busy(self.phase.describe()));
        }
        self.form
            .as_mut()
            .ok_or(BuilderError::Busy(BuilderPhase::Loading.describe()))
    }

    /// Validates the form and, when it passes, moves to `Saving` and returns
    /// the payload to submit. A failing rule sends the session back to
    /// `Editing` with the message in [`BuilderSession::last_error`]. Like
    /// [`BuilderSession::form_mut`], a create session that already saved
    /// starts over on the reset form.
    pub fn begin_save(&mut self) -> Result<F::Payload, BuilderError> {
        self.resume_after_save();
        self.expect_phase(&BuilderPhase::Editing)?;
        self.enter(BuilderPhase::Validating);

        let result = match &self.form {
            Some(form) => form.to_payload(),
            None => return Err(BuilderError::Busy(BuilderPhase::Loading.describe())),
        };

        match result {
            Ok(payload) => {
                self.last_error = None;
                self.enter(BuilderPhase::Saving);
                Ok(payload)
            }
            Err(err) => {
                debug!(%err, "validation failed");
                self.last_error = Some(err.to_string());
                self.enter(BuilderPhase::Editing);
                Err(err.into())
            }
        }
    }

    /// Records the outcome of submitting the payload from
    /// [`BuilderSession::begin_save`].
    pub fn finish_save<E: fmt::Display>(&mut self, result: Result<(), E>) -> Result<(), BuilderError> {
        self.expect_phase(&BuilderPhase::Saving)?;
        match result {
            Ok(()) => {
                info!(mode = ?self.mode, "question saved");
                if self.mode == Mode::Create {
                    if let Some(form) = self.form.as_mut() {
                        form.reset();
                    }
                }
                self.last_error = None;
                self.enter(BuilderPhase::Succeeded);
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                warn!(%message, "save failed");
                self.last_error = Some(message.clone());
                self.enter(BuilderPhase::Editing);
                Err(BuilderError::SaveFailed(message))
            }
        }
    }

    /// `begin_save`, `submit`, then `finish_save` in one go.
    pub fn save<E: fmt::Display>(
        &mut self,
        submit: impl FnOnce(&F::Payload) -> Result<(), E>,
    ) -> Result<(), BuilderError> {
        let payload = self.begin_save()?;
        let result = submit(&payload);
        self.finish_save(result)
    }

    fn resume_after_save(&mut self) {
        if self.phase == BuilderPhase::Succeeded && self.mode == Mode::Create {
            self.enter(BuilderPhase::Editing);
        }
    }

    fn expect_phase(&self, expected: &BuilderPhase) -> Result<(), BuilderError> {
        if &self.phase == expected {
            Ok(())
        } else {
            Err(BuilderError::Busy(self.phase.describe()))
        }
    }

    fn enter(&mut self, phase: BuilderPhase) {
        debug!(from = ?self.phase, to = ?phase, "builder phase");
        self.phase = phase;
    }
}
