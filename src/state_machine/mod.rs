// Registration workflow state machine
//
// Per-actor states live on the Actor record; this module owns the transition
// table, the input guards and the event vocabulary.

pub mod errors;
pub mod events;
pub mod guards;
pub mod registration;
pub mod states;

// Re-export main types for convenient access
pub use errors::{StateMachineError, StateMachineResult};
pub use events::RegistrationEvent;
pub use guards::{InputKind, NameField, Rejection, RegistrationGuards};
pub use registration::{
    determine_target, expected_input, AcceptedInput, RegistrationInput, RegistrationStateMachine,
    Transition,
};
pub use states::{ConversationState, VerificationStatus};
