mod core;
pub mod testing;

pub use self::core::{ChatModel, CompletionRequest, Message, ModelError, OpenAiClient, Role, completion};
