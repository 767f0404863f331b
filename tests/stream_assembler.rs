#[cfg(test)]
mod tests {
    use streamchat::client::{ChatError, Message, Role, StreamSession, Transcript};

    fn assemble(chunks: &[&[u8]]) -> (Transcript, Result<String, ChatError>) {
        let mut transcript = Transcript::new();
        let mut session = StreamSession::new();
        for chunk in chunks {
            if let Err(e) = session.accept(chunk, &mut transcript) {
                session.fail(&mut transcript, &e);
                return (transcript, Err(e));
            }
        }
        let result = session.finish(&mut transcript);
        (transcript, result)
    }

    #[test]
    fn test_hello_world_scenario() {
        let (transcript, result) = assemble(&[b"Hel", b"lo, ", b"world!"]);

        assert_eq!(result.unwrap(), "Hello, world!");
        assert_eq!(transcript.len(), 1);
        let entry = transcript.last_entry().unwrap();
        assert_eq!(entry.role, Role::Assistant);
        assert_eq!(entry.content, "Hello, world!");
        assert!(!entry.is_open());
    }

    #[test]
    fn test_chunk_boundaries_do_not_matter() {
        let reply = "Grüße aus Zürich - 東京 🚀 done.";
        let bytes = reply.as_bytes();

        // Every split point, including ones inside multi-byte characters
        for split in 0..=bytes.len() {
            let (transcript, result) = assemble(&[&bytes[..split], &bytes[split..]]);
            assert_eq!(result.as_deref(), Ok(reply), "split at {split}");
            assert_eq!(transcript.len(), 1);
        }

        // One byte at a time
        let singles: Vec<&[u8]> = bytes.chunks(1).collect();
        let (transcript, result) = assemble(&singles);
        assert_eq!(result.as_deref(), Ok(reply));
        assert_eq!(transcript.entries()[0].content, reply);
    }

    #[test]
    fn test_one_entry_per_session_regardless_of_chunk_count() {
        let chunks: Vec<Vec<u8>> = (0..200).map(|i| format!("{i} ").into_bytes()).collect();
        let refs: Vec<&[u8]> = chunks.iter().map(Vec::as_slice).collect();
        let (transcript, _) = assemble(&refs);

        let assistant_entries = transcript
            .entries()
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .count();
        assert_eq!(assistant_entries, 1);
    }

    #[test]
    fn test_content_grows_while_open() {
        let mut transcript = Transcript::new();
        let mut session = StreamSession::new();

        session.accept(b"a", &mut transcript).unwrap();
        assert!(transcript.last_entry().unwrap().is_open());
        assert_eq!(transcript.open_entry(session.id()).unwrap().content, "a");

        session.accept(b"bc", &mut transcript).unwrap();
        assert_eq!(transcript.last_entry().unwrap().content, "abc");
        assert_eq!(session.text(), "abc");
    }

    #[test]
    fn test_no_entry_until_text_exists() {
        let mut transcript = Transcript::new();
        let mut session = StreamSession::new();

        // First half of "é"
        session.accept(&[0xC3], &mut transcript).unwrap();
        assert!(transcript.is_empty());
        assert!(!session.has_entry());

        session.accept(&[0xA9], &mut transcript).unwrap();
        assert_eq!(transcript.last_entry().unwrap().content, "é");
    }

    #[test]
    fn test_failure_before_any_chunk_creates_only_the_error_entry() {
        let mut transcript = Transcript::new();
        let session = StreamSession::new();

        session.fail(&mut transcript, &ChatError::Stream("connection reset".to_string()));

        assert_eq!(transcript.len(), 1);
        assert_eq!(
            transcript.entries()[0].content,
            "Error: Reply stream interrupted: connection reset"
        );
    }

    #[test]
    fn test_failure_mid_stream_keeps_partial_output() {
        let mut transcript = Transcript::new();
        transcript.append(Message::user("hi"));
        let mut session = StreamSession::new();

        session.accept(b"partial ", &mut transcript).unwrap();
        session.accept(b"answer", &mut transcript).unwrap();
        session.fail(&mut transcript, &ChatError::Stream("eof".to_string()));

        let entries = transcript.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].content, "partial answer");
        assert!(!entries[1].is_open());
        assert!(entries[2].content.starts_with("Error: "));
    }

    #[test]
    fn test_malformed_bytes_are_fatal() {
        let (transcript, result) = assemble(&[b"ok ", &[0xFF, 0xFE], b"never seen"]);

        assert!(matches!(result, Err(ChatError::Decode(_))));
        let entries = transcript.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, "ok ");
        assert!(entries[1].content.starts_with("Error: Reply was not valid UTF-8"));
    }

    #[test]
    fn test_malformed_byte_keeps_text_before_it_at_any_split() {
        let contents = |transcript: &Transcript| -> Vec<String> {
            transcript.entries().iter().map(|m| m.content.clone()).collect()
        };

        let (joined, joined_result) = assemble(&[b"ok \xFF"]);
        let (split, split_result) = assemble(&[b"ok ", b"\xFF"]);

        assert_eq!(contents(&joined), contents(&split));
        assert_eq!(joined_result, split_result);
        assert_eq!(joined.entries()[0].content, "ok ");
        assert!(!joined.entries()[0].is_open());
        assert_eq!(
            joined.entries()[1].content,
            "Error: Reply was not valid UTF-8: invalid byte sequence at offset 3"
        );
    }

    #[test]
    fn test_truncated_character_at_end_is_a_decode_error() {
        let (transcript, result) = assemble(&[b"caf", &[0xC3]]);

        assert!(matches!(result, Err(ChatError::Decode(_))));
        assert_eq!(transcript.entries()[0].content, "caf");
        assert!(!transcript.entries()[0].is_open());
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn test_empty_stream_completes_without_entry() {
        let (transcript, result) = assemble(&[]);
        assert_eq!(result.unwrap(), "");
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_sessions_only_write_to_their_own_entry() {
        let mut transcript = Transcript::new();

        let mut first = StreamSession::new();
        first.accept(b"first", &mut transcript).unwrap();
        first.finish(&mut transcript).unwrap();

        let mut second = StreamSession::new();
        second.accept(b"second", &mut transcript).unwrap();

        let entries = transcript.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, "first");
        assert_eq!(entries[1].content, "second");
    }

    #[test]
    fn test_replace_last_content_only_touches_open_entries() {
        let mut transcript = Transcript::new();
        transcript.append(Message::assistant("sealed"));
        assert!(!transcript.replace_last_content("changed"));
        assert_eq!(transcript.last_entry().unwrap().content, "sealed");

        let mut session = StreamSession::new();
        session.accept(b"x", &mut transcript).unwrap();
        assert!(transcript.replace_last_content("y"));
        assert_eq!(transcript.last_entry().unwrap().content, "y");
    }
}
