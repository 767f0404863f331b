pub mod assembler;
pub mod credential;
pub mod driver;
pub mod error;
pub mod render;
pub mod state;
pub mod transcript;
pub mod transport;

pub use assembler::StreamSession;
pub use driver::ChatClient;
pub use error::ChatError;
pub use state::{Action, ChatMode, ChatState, Transition};
pub use transcript::{Message, Role, SessionId, Transcript};
pub use transport::{ChatTransport, ChunkStream, HttpTransport, OutboundRequest};
