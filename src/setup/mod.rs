//! First-run setup, teardown, and setup read-back.

pub mod orchestrator;
pub mod spec;

use std::fmt;

pub use orchestrator::{SetupOrchestrator, read_setup};
pub use spec::{ConfigEntry, CtfdSetup, EmailConfig, SetupSpec};

/// Steps of the setup and teardown workflows, used in errors and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupStep {
    InitialSetup,
    Import,
    RepeatSetup,
    Availability,
    SignIn,
    TokenProvisioning,
    MailConfiguration,
    Reset,
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SetupStep::InitialSetup => "initial setup",
            SetupStep::Import => "configuration import",
            SetupStep::RepeatSetup => "repeat setup",
            SetupStep::Availability => "availability check",
            SetupStep::SignIn => "sign-in",
            SetupStep::TokenProvisioning => "token provisioning",
            SetupStep::MailConfiguration => "mail configuration",
            SetupStep::Reset => "reset",
        };
        f.write_str(name)
    }
}
