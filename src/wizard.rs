use crate::validate::{self, ValidationErrors};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetStep {
    RequestCode,
    VerifyCode { email: String },
    SetPassword { email: String, code: String },
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetAction {
    SendCode {
        email: String,
    },
    VerifyCode {
        email: String,
        code: String,
    },
    SetPassword {
        email: String,
        code: String,
        password: String,
    },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("expected {expected}, but the reset flow is at {current}")]
    WrongStep {
        expected: &'static str,
        current: &'static str,
    },
    #[error("invalid input: {0}")]
    Invalid(#[from] ValidationErrors),
}

#[derive(Debug, Clone)]
pub struct ResetWizard {
    step: ResetStep,
}

impl Default for ResetWizard {
    fn default() -> Self {
        ResetWizard {
            step: ResetStep::RequestCode,
        }
    }
}

impl ResetWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> &ResetStep {
        &self.step
    }

    pub fn is_done(&self) -> bool {
        self.step == ResetStep::Done
    }

    pub fn submit_email(&self, email: &str) -> Result<ResetAction, WizardError> {
        if self.step != ResetStep::RequestCode {
            return Err(self.wrong_step("an email address"));
        }
        let email = email.trim();
        if !validate::is_valid_email(email) {
            return Err(WizardError::Invalid(ValidationErrors {
                errors: vec![validate::FieldError {
                    field: "email",
                    message: "must be a valid email address".to_string(),
                }],
            }));
        }
        Ok(ResetAction::SendCode {
            email: email.to_string(),
        })
    }

    pub fn submit_code(&self, code: &str) -> Result<ResetAction, WizardError> {
        let ResetStep::VerifyCode { email } = &self.step else {
            return Err(self.wrong_step("a verification code"));
        };
        validate::validate_reset_code(code)?;
        Ok(ResetAction::VerifyCode {
            email: email.clone(),
            code: code.trim().to_string(),
        })
    }

    pub fn submit_password(
        &self,
        password: &str,
        confirmation: &str,
    ) -> Result<ResetAction, WizardError> {
        let ResetStep::SetPassword { email, code } = &self.step else {
            return Err(self.wrong_step("a new password"));
        };
        validate::validate_new_password(password, confirmation)?;
        Ok(ResetAction::SetPassword {
            email: email.clone(),
            code: code.clone(),
            password: password.to_string(),
        })
    }

    /// Advances past the step that produced `action`.
    pub fn complete(&mut self, action: ResetAction) -> Result<(), WizardError> {
        let next = match (&self.step, action) {
            (ResetStep::RequestCode, ResetAction::SendCode { email }) => {
                ResetStep::VerifyCode { email }
            }
            (ResetStep::VerifyCode { .. }, ResetAction::VerifyCode { email, code }) => {
                ResetStep::SetPassword { email, code }
            }
            (ResetStep::SetPassword { .. }, ResetAction::SetPassword { .. }) => ResetStep::Done,
            (_, action) => {
                return Err(self.wrong_step(match action {
                    ResetAction::SendCode { .. } => "the email step",
                    ResetAction::VerifyCode { .. } => "the code step",
                    ResetAction::SetPassword { .. } => "the password step",
                }))
            }
        };
        self.step = next;
        Ok(())
    }

    /// Starts over from the email step.
    pub fn resend(&mut self) {
        self.step = ResetStep::RequestCode;
    }

    fn wrong_step(&self, expected: &'static str) -> WizardError {
        WizardError::WrongStep {
            expected,
            current: match self.step {
                ResetStep::RequestCode => "the email step",
                ResetStep::VerifyCode { .. } => "the code step",
                ResetStep::SetPassword { .. } => "the password step",
                ResetStep::Done => "completion",
            },
        }
    }
}
