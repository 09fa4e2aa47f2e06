pub mod assembler;
pub mod conversation;
pub mod persona;
pub mod session;

pub use assembler::PromptAssembler;
pub use conversation::{Conversation, Turn, TurnRole};
pub use persona::PersonaSpec;
pub use session::{PendingTurn, Session, SessionError, TurnPhase};
