use crate::error::{ProtocolError, ProtocolErrorKind, ProtocolResult};
use crate::models::BoardSize;
use crate::parse::{self, Parsed};
use crate::protocol::ServerMessage;

/// Incremental framer for the server byte stream.
///
/// Bytes are appended with [`push`](Self::push) and complete frames are pulled
/// from the front with [`next_message`](Self::next_message). Whatever is left
/// over stays buffered until more bytes arrive. The first error is sticky: the
/// stream is never resynchronized.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
    size: Option<BoardSize>,
    /// Last consumed frame ended in a bare `\r` at the end of the buffer.
    skip_lf: bool,
    failed: Option<ProtocolError>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the greeting has been decoded.
    pub fn has_seen_greeting(&self) -> bool {
        self.size.is_some()
    }

    /// Board size announced by the greeting.
    pub fn board_size(&self) -> Option<BoardSize> {
        self.size
    }

    /// Number of bytes waiting for the rest of their frame.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Append bytes received from the transport.
    pub fn push(&mut self, mut bytes: &[u8]) {
        if self.skip_lf && !bytes.is_empty() {
            if bytes[0] == b'\n' {
                bytes = &bytes[1..];
            }
            self.skip_lf = false;
        }
        self.buffer.extend_from_slice(bytes);
    }

    /// Extract the next complete frame, or `None` if more bytes are needed.
    pub fn next_message(&mut self) -> ProtocolResult<Option<ServerMessage>> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }

        match self.decode_front() {
            Ok(Some((message, consumed))) => {
                self.skip_lf = consumed == self.buffer.len() && self.buffer[consumed - 1] == b'\r';
                self.buffer.drain(..consumed);
                Ok(Some(message))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                self.failed = Some(err.clone());
                Err(err)
            }
        }
    }

    /// The violation that stopped decoding, if any.
    pub fn error(&self) -> Option<&ProtocolError> {
        self.failed.as_ref()
    }

    /// Append `bytes` and decode every frame that is now complete, in order.
    ///
    /// Frames decoded ahead of a violation in the same call are still returned;
    /// the violation is then reported by [`error`](Self::error) and by every
    /// later call. An error is returned directly only when nothing preceded it.
    pub fn feed(&mut self, bytes: &[u8]) -> ProtocolResult<Vec<ServerMessage>> {
        self.push(bytes);

        let mut messages = Vec::new();
        loop {
            match self.next_message() {
                Ok(Some(message)) => messages.push(message),
                Ok(None) => return Ok(messages),
                Err(err) if messages.is_empty() => return Err(err),
                Err(_) => return Ok(messages),
            }
        }
    }

    fn violation(&self, kind: ProtocolErrorKind) -> ProtocolError {
        ProtocolError::new(kind, String::from_utf8_lossy(&self.buffer))
    }

    fn decode_front(&mut self) -> ProtocolResult<Option<(ServerMessage, usize)>> {
        let Some(size) = self.size else {
            return match parse::parse_greeting(&self.buffer) {
                Parsed::Complete { value, consumed } => {
                    if let ServerMessage::Greeting { size, .. } = &value {
                        if size.tile_count().is_none() {
                            return Err(self.violation(parse::size_violation(*size)));
                        }
                        self.size = Some(*size);
                    }
                    Ok(Some((value, consumed)))
                }
                Parsed::NotReady => Ok(None),
                Parsed::NoMatch => Err(self.violation(ProtocolErrorKind::InvalidGreeting)),
            };
        };

        match parse::parse_next(&self.buffer, size)? {
            Parsed::Complete { value, consumed } => Ok(Some((value, consumed))),
            Parsed::NotReady | Parsed::NoMatch => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tile;

    const GREETING: &str = "Welcome to Minesweeper. Board: 3 columns by 2 rows. Players: 1 including you. Type 'help' for help.\n";

    fn greeted() -> StreamDecoder {
        let mut decoder = StreamDecoder::new();
        decoder.feed(GREETING.as_bytes()).unwrap();
        decoder
    }

    fn board_rows(message: &ServerMessage) -> Vec<String> {
        match message {
            ServerMessage::BoardDump { board } => board.rows().collect(),
            other => panic!("expected a board dump, got {other:?}"),
        }
    }

    #[test]
    fn greeting_is_decoded() {
        let mut decoder = StreamDecoder::new();

        let messages = decoder.feed(GREETING.as_bytes()).unwrap();

        assert_eq!(
            messages,
            vec![ServerMessage::Greeting {
                size: BoardSize::new(3, 2),
                players: 1
            }]
        );
        assert_eq!(decoder.board_size(), Some(BoardSize::new(3, 2)));
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn greeting_split_at_every_boundary() {
        let whole = StreamDecoder::new().feed(GREETING.as_bytes()).unwrap();

        for split in 0..=GREETING.len() {
            let mut decoder = StreamDecoder::new();
            let (head, tail) = GREETING.as_bytes().split_at(split);

            let mut messages = decoder.feed(head).unwrap();
            if split < GREETING.len() {
                assert!(messages.is_empty(), "greeting emitted early at {split}");
            }
            messages.extend(decoder.feed(tail).unwrap());

            assert_eq!(messages, whole, "split at {split}");
        }
    }

    #[test]
    fn bad_greeting_is_fatal() {
        let mut decoder = StreamDecoder::new();

        assert!(decoder.feed(b"Hello").unwrap().is_empty());
        let err = decoder.feed(b".\r\n").unwrap_err();

        assert_eq!(err.kind, ProtocolErrorKind::InvalidGreeting);
        assert_eq!(err.buffer, "Hello.\r\n");
        assert_eq!(decoder.feed(GREETING.as_bytes()).unwrap_err(), err);
    }

    #[test]
    fn zero_sized_greeting_is_fatal() {
        let mut decoder = StreamDecoder::new();

        let err = decoder
            .feed(b"Welcome to Minesweeper. Board: 0 columns by 2 rows. Players: 1 including you. Type 'help' for help.\n")
            .unwrap_err();

        assert_eq!(err.kind, ProtocolErrorKind::ZeroSizedBoard);
    }

    #[test]
    fn oversized_greeting_is_fatal() {
        for greeting in [
            &b"Welcome to Minesweeper. Board: 1 columns by 1000000000000000000 rows. Players: 1 including you. Type 'help' for help.\n"[..],
            b"Welcome to Minesweeper. Board: 1000000000000000000 columns by 1 rows. Players: 1 including you. Type 'help' for help.\n",
            b"Welcome to Minesweeper. Board: 5000 columns by 5000 rows. Players: 1 including you. Type 'help' for help.\n",
        ] {
            let mut decoder = StreamDecoder::new();

            let err = decoder.feed(greeting).unwrap_err();

            assert!(matches!(err.kind, ProtocolErrorKind::BoardTooLarge { .. }));
            assert_eq!(decoder.board_size(), None);
            assert!(decoder.feed(b"-\n").is_err());
        }
    }

    #[test]
    fn board_waits_for_last_row() {
        let mut decoder = greeted();

        assert!(decoder.feed(b"- F -\n").unwrap().is_empty());
        assert!(decoder.feed(b"  8 ").unwrap().is_empty());
        let messages = decoder.feed(b"2\n").unwrap();

        assert_eq!(messages.len(), 1);
        let ServerMessage::BoardDump { board } = &messages[0] else {
            panic!("expected a board dump");
        };
        assert_eq!(board.get(0, 0).unwrap(), Tile::Untouched);
        assert_eq!(board.get(1, 0).unwrap(), Tile::Flagged);
        assert_eq!(board.get(2, 0).unwrap(), Tile::Untouched);
        assert_eq!(board.get(0, 1).unwrap(), Tile::dug(0).unwrap());
        assert_eq!(board.get(1, 1).unwrap(), Tile::dug(8).unwrap());
        assert_eq!(board.get(2, 1).unwrap(), Tile::dug(2).unwrap());
    }

    #[test]
    fn back_to_back_boards_are_both_emitted() {
        let mut decoder = greeted();

        let messages = decoder.feed(b"- - -\n- - -\nF 1 -\n- - 2\n").unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(board_rows(&messages[0]), vec!["- - -", "- - -"]);
        assert_eq!(board_rows(&messages[1]), vec!["F 1 -", "- - 2"]);
    }

    #[test]
    fn second_board_is_kept_for_next_feed() {
        let mut decoder = greeted();

        let messages = decoder.feed(b"- - -\n- - -\nF 1 -\n").unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(decoder.buffered(), 6);

        let messages = decoder.feed(b"- - 2\n").unwrap();
        assert_eq!(board_rows(&messages[0]), vec!["F 1 -", "- - 2"]);
    }

    #[test]
    fn mixed_frames_keep_order() {
        let mut decoder = StreamDecoder::new();
        let mut stream = GREETING.to_string();
        stream.push_str("Help text\r\n- - -\r\n1 F  \r\nBOOM!\r\ntrailing");

        let messages = decoder.feed(stream.as_bytes()).unwrap();

        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[0], ServerMessage::Greeting { .. }));
        assert_eq!(
            messages[1],
            ServerMessage::StatusText {
                text: "Help text".to_string()
            }
        );
        assert_eq!(board_rows(&messages[2]), vec!["- - -", "1 F  "]);
        assert_eq!(messages[3], ServerMessage::Detonation);
        assert_eq!(decoder.buffered(), "trailing".len());
    }

    #[test]
    fn split_crlf_after_bare_cr() {
        let mut decoder = greeted();

        assert_eq!(decoder.feed(b"BOOM!\r").unwrap(), vec![ServerMessage::Detonation]);
        let messages = decoder.feed(b"\nhelp\n").unwrap();

        assert_eq!(
            messages,
            vec![ServerMessage::StatusText {
                text: "help".to_string()
            }]
        );
    }

    #[test]
    fn malformed_board_is_fatal() {
        let mut decoder = StreamDecoder::new();
        decoder
            .feed(b"Welcome to Minesweeper. Board: 2 columns by 2 rows. Players: 3 including you. Type 'help' for help.\n")
            .unwrap();

        let err = decoder.feed(b"- -\r-\n").unwrap_err();

        assert_eq!(err.kind, ProtocolErrorKind::WrongSizeBoard { line: 1 });
        assert!(decoder.next_message().is_err());
    }

    #[test]
    fn feed_returns_frames_ahead_of_a_violation() {
        let mut decoder = greeted();

        let messages = decoder.feed(b"BOOM!\n- - -\n- x -\n").unwrap();

        assert_eq!(messages, vec![ServerMessage::Detonation]);
        let err = decoder.error().cloned().unwrap();
        assert_eq!(
            err.kind,
            ProtocolErrorKind::InvalidTile {
                line: 1,
                column: 1,
                glyph: 'x'
            }
        );
        assert_eq!(decoder.feed(b"BOOM!\n").unwrap_err(), err);
    }

    #[test]
    fn frames_before_a_violation_are_still_delivered() {
        let mut decoder = greeted();
        decoder.push(b"BOOM!\n- - -\n- x -\n");

        assert_eq!(decoder.next_message().unwrap(), Some(ServerMessage::Detonation));
        assert!(decoder.next_message().is_err());
    }
}
