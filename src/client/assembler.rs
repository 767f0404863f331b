//! Turns the chunked bytes of one streamed reply into a single growing transcript entry.

use tracing::debug;

use crate::client::error::ChatError;
use crate::client::transcript::{Message, SessionId, Transcript};

/// State of one in-flight reply.
///
/// Chunk boundaries are arbitrary, so bytes of a code point cut in half are held back until
/// the rest arrives. The transcript entry is created on the first non-empty text and every
/// later chunk replaces its content with the accumulated reply.
#[derive(Debug)]
pub struct StreamSession {
    id: SessionId,
    acc: String,
    pending: Vec<u8>,
    /// Bytes of the stream decoded so far, for error offsets.
    consumed: usize,
    entry_created: bool,
}

impl StreamSession {
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            acc: String::new(),
            pending: Vec::new(),
            consumed: 0,
            entry_created: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Text assembled so far.
    pub fn text(&self) -> &str {
        &self.acc
    }

    pub fn has_entry(&self) -> bool {
        self.entry_created
    }

    /// Decodes as much of `chunk` as possible. Text before a malformed byte is still written to
    /// the entry, so the result does not depend on where chunk boundaries fall.
    pub fn accept(&mut self, chunk: &[u8], transcript: &mut Transcript) -> Result<(), ChatError> {
        self.pending.extend_from_slice(chunk);
        let (decoded, malformed) = decode_available(&mut self.pending);
        self.consumed += decoded.len();
        self.append_text(&decoded, transcript);

        if malformed {
            return Err(ChatError::Decode(format!(
                "invalid byte sequence at offset {}",
                self.consumed
            )));
        }
        Ok(())
    }

    fn append_text(&mut self, decoded: &str, transcript: &mut Transcript) {
        if decoded.is_empty() {
            return;
        }
        self.acc.push_str(decoded);
        if transcript.write_session(self.id, &self.acc) {
            debug!("Session {} opened its transcript entry", self.id);
            self.entry_created = true;
        }
    }

    /// Normal end of stream. Leftover bytes of an unfinished code point fail the session.
    pub fn finish(self, transcript: &mut Transcript) -> Result<String, ChatError> {
        if !self.pending.is_empty() {
            let err = ChatError::Decode(format!(
                "stream ended inside a multi-byte character ({} bytes left)",
                self.pending.len()
            ));
            self.fail(transcript, &err);
            return Err(err);
        }

        transcript.seal(self.id);
        Ok(self.acc)
    }

    /// Seals whatever arrived so far and appends an entry describing `err`.
    pub fn fail(self, transcript: &mut Transcript, err: &ChatError) {
        debug!(
            "Session {} failed after {} bytes of text: {}",
            self.id,
            self.acc.len(),
            err
        );
        transcript.seal(self.id);
        transcript.append(Message::assistant(err.to_entry_text()));
    }
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Takes the longest valid UTF-8 prefix out of `pending`. An incomplete trailing code point
/// stays behind; the flag is set when a malformed sequence follows the prefix.
fn decode_available(pending: &mut Vec<u8>) -> (String, bool) {
    let (valid, malformed) = match std::str::from_utf8(pending) {
        Ok(_) => (pending.len(), false),
        Err(e) => (e.valid_up_to(), e.error_len().is_some()),
    };

    let bytes: Vec<u8> = pending.drain(..valid).collect();
    let text = String::from_utf8(bytes).unwrap_or_default();
    (text, malformed)
}
