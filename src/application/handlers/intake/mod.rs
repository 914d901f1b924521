//! Intake conversation handlers.
//!
//! The per-connection control loop, the registry of live sessions, and the
//! outbound message shapes it sends.

mod messages;
mod registry;
mod run_intake;

pub use messages::{ErrorMessage, OutboundMessage, TurnMessage};
pub use registry::{RegistryError, SessionHandle, SessionRegistry};
pub use run_intake::IntakeConversationHandler;
