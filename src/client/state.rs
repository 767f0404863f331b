use bytes::Bytes;
use tracing::{debug, warn};

use crate::api::models::{ChatRequest, RagChatRequest};
use crate::client::assembler::StreamSession;
use crate::client::credential::{validate_api_key, CredentialError};
use crate::client::error::ChatError;
use crate::client::transcript::{Message, Transcript};
use crate::client::transport::OutboundRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatMode {
    #[default]
    Plain,
    /// Questions go to the document-grounded endpoint.
    Rag,
}

#[derive(Debug)]
pub enum Action {
    SetCredential(String),
    SetMode(ChatMode),
    Submit(String),
    Chunk(Bytes),
    StreamEnded,
    StreamFailed(ChatError),
    /// Report a failure outside of any stream, e.g. a rejected upload.
    ReportError(ChatError),
    Notice(String),
    Clear,
}

#[derive(Debug, PartialEq)]
pub enum Transition {
    /// Nothing changed.
    Ignored,
    /// Nothing changed; the action is not allowed in the current state.
    Rejected(ChatError),
    /// A user turn was recorded and this request must be sent.
    Dispatch(OutboundRequest),
    Updated,
    /// The open session closed and its entry is sealed.
    Sealed,
}

/// All client-side chat state. Every change goes through [`ChatState::apply`], which is what
/// guarantees a single open session.
#[derive(Debug)]
pub struct ChatState {
    credential: Option<String>,
    mode: ChatMode,
    model: Option<String>,
    developer_message: String,
    transcript: Transcript,
    session: Option<StreamSession>,
}

impl ChatState {
    pub fn new(developer_message: impl Into<String>, model: Option<String>) -> Self {
        Self {
            credential: None,
            mode: ChatMode::default(),
            model,
            developer_message: developer_message.into(),
            transcript: Transcript::new(),
            session: None,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn is_streaming(&self) -> bool {
        self.session.is_some()
    }

    pub fn credential(&self) -> Result<&str, ChatError> {
        self.credential
            .as_deref()
            .ok_or(ChatError::Credential(CredentialError::Missing))
    }

    pub fn apply(&mut self, action: Action) -> Transition {
        match action {
            Action::SetCredential(key) => {
                let key = key.trim();
                match validate_api_key(key) {
                    Ok(()) => {
                        self.credential = Some(key.to_string());
                        Transition::Updated
                    }
                    Err(e) => Transition::Rejected(e.into()),
                }
            }
            Action::SetMode(mode) => {
                if self.mode == mode {
                    return Transition::Ignored;
                }
                self.mode = mode;
                Transition::Updated
            }
            Action::Submit(text) => self.submit(text),
            Action::Chunk(bytes) => {
                let Some(session) = self.session.as_mut() else {
                    warn!("Dropping {} bytes that arrived with no open session", bytes.len());
                    return Transition::Ignored;
                };
                match session.accept(&bytes, &mut self.transcript) {
                    Ok(()) => Transition::Updated,
                    Err(e) => {
                        if let Some(session) = self.session.take() {
                            session.fail(&mut self.transcript, &e);
                        }
                        Transition::Sealed
                    }
                }
            }
            Action::StreamEnded => match self.session.take() {
                Some(session) => {
                    // finish() records its own error entry on a truncated code point
                    if let Ok(text) = session.finish(&mut self.transcript) {
                        debug!("Reply complete, {} bytes", text.len());
                    }
                    Transition::Sealed
                }
                None => Transition::Ignored,
            },
            Action::StreamFailed(err) => match self.session.take() {
                Some(session) => {
                    session.fail(&mut self.transcript, &err);
                    Transition::Sealed
                }
                None => {
                    self.transcript.append(Message::assistant(err.to_entry_text()));
                    Transition::Updated
                }
            },
            Action::ReportError(err) => {
                self.transcript.append(Message::assistant(err.to_entry_text()));
                Transition::Updated
            }
            Action::Notice(text) => {
                self.transcript.append(Message::assistant(text));
                Transition::Updated
            }
            Action::Clear => {
                if self.is_streaming() {
                    return Transition::Rejected(ChatError::Busy);
                }
                self.transcript.clear();
                Transition::Updated
            }
        }
    }

    fn submit(&mut self, text: String) -> Transition {
        let text = text.trim();
        if text.is_empty() {
            return Transition::Ignored;
        }
        if self.is_streaming() {
            return Transition::Rejected(ChatError::Busy);
        }
        let api_key = match self.credential() {
            Ok(key) => key.to_string(),
            Err(e) => return Transition::Rejected(e),
        };
        if let Err(e) = validate_api_key(&api_key) {
            return Transition::Rejected(e.into());
        }

        let request = match self.mode {
            ChatMode::Plain => OutboundRequest::Chat(ChatRequest {
                developer_message: self.developer_message.clone(),
                user_message: text.to_string(),
                model: self.model.clone(),
                api_key,
            }),
            ChatMode::Rag => OutboundRequest::Rag(RagChatRequest {
                user_message: text.to_string(),
                model: self.model.clone(),
                api_key,
            }),
        };

        self.transcript.append(Message::user(text));
        let session = StreamSession::new();
        debug!("Opened session {}", session.id());
        self.session = Some(session);

        Transition::Dispatch(request)
    }
}
