//! Recognizers for the server's wire messages.
//!
//! Each recognizer looks at the front of a byte buffer and reports whether a
//! complete frame of its kind is there, whether it definitely is not, or
//! whether it cannot tell until more bytes arrive. Lines end in `\n`, `\r\n`
//! or a bare `\r`.

use crate::error::{ProtocolError, ProtocolErrorKind, ProtocolResult};
use crate::models::{Board, BoardSize, Tile};
use crate::protocol::ServerMessage;

const GREETING_PREFIX: &[u8] = b"Welcome to Minesweeper. Board: ";
const GREETING_COLUMNS: &[u8] = b" columns by ";
const GREETING_ROWS: &[u8] = b" rows. Players: ";
const GREETING_SUFFIX: &[u8] = b" including you. Type 'help' for help.";
const DETONATION: &[u8] = b"BOOM!";

/// Result of running a recognizer against the front of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed<T> {
    /// A whole frame was recognized; `consumed` bytes (terminators included) belong to it.
    Complete { value: T, consumed: usize },
    /// The buffer does not start with this kind of frame.
    NoMatch,
    /// More bytes are needed before a decision can be made.
    NotReady,
}

/// One terminated line at the front of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// Line contents without the terminator.
    pub content: &'a [u8],
    /// Bytes occupied including the terminator.
    pub len: usize,
}

/// Split the first terminated line off `buf`, if there is one.
pub fn next_line(buf: &[u8]) -> Option<Line<'_>> {
    let end = buf.iter().position(|b| *b == b'\r' || *b == b'\n')?;
    let terminator = if buf[end] == b'\r' && buf.get(end + 1) == Some(&b'\n') {
        2
    } else {
        1
    };

    Some(Line {
        content: &buf[..end],
        len: end + terminator,
    })
}

fn take_number(input: &[u8]) -> Option<(usize, &[u8])> {
    let digits = input.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let value = std::str::from_utf8(&input[..digits]).ok()?.parse().ok()?;
    Some((value, &input[digits..]))
}

fn match_greeting(line: &[u8]) -> Option<(BoardSize, usize)> {
    let rest = line.strip_prefix(GREETING_PREFIX)?;
    let (width, rest) = take_number(rest)?;
    let rest = rest.strip_prefix(GREETING_COLUMNS)?;
    let (height, rest) = take_number(rest)?;
    let rest = rest.strip_prefix(GREETING_ROWS)?;
    let (players, rest) = take_number(rest)?;

    (rest == GREETING_SUFFIX).then_some((BoardSize::new(width, height), players))
}

/// Recognize the greeting that opens every connection.
pub fn parse_greeting(buf: &[u8]) -> Parsed<ServerMessage> {
    let Some(line) = next_line(buf) else {
        return Parsed::NotReady;
    };

    match match_greeting(line.content) {
        Some((size, players)) => Parsed::Complete {
            value: ServerMessage::Greeting { size, players },
            consumed: line.len,
        },
        None => Parsed::NoMatch,
    }
}

/// Recognize `BOOM!`.
pub fn parse_detonation(buf: &[u8]) -> Parsed<ServerMessage> {
    match next_line(buf) {
        None => Parsed::NotReady,
        Some(line) if line.content == DETONATION => Parsed::Complete {
            value: ServerMessage::Detonation,
            consumed: line.len,
        },
        Some(_) => Parsed::NoMatch,
    }
}

/// Whether a line has the shape of a board row: glyphs separated by single spaces.
fn looks_like_row(content: &[u8]) -> bool {
    content.len() % 2 == 1
        && content.iter().enumerate().all(|(i, b)| {
            if i % 2 == 1 {
                *b == b' '
            } else {
                Tile::from_glyph(char::from(*b)).is_some()
            }
        })
}

fn decode_row(content: &[u8], line: usize, width: usize) -> Result<Vec<Tile>, ProtocolErrorKind> {
    if content.iter().step_by(2).count() != width {
        return Err(ProtocolErrorKind::WrongSizeBoard { line });
    }
    if content.len() % 2 == 0 || content.iter().skip(1).step_by(2).any(|b| *b != b' ') {
        return Err(ProtocolErrorKind::MalformedRow { line });
    }

    content
        .iter()
        .step_by(2)
        .enumerate()
        .map(|(column, b)| {
            let glyph = char::from(*b);
            Tile::from_glyph(glyph).ok_or(ProtocolErrorKind::InvalidTile {
                line,
                column,
                glyph,
            })
        })
        .collect()
}

/// Why a board of `size` cannot be built.
pub fn size_violation(size: BoardSize) -> ProtocolErrorKind {
    if size.width == 0 || size.height == 0 {
        ProtocolErrorKind::ZeroSizedBoard
    } else {
        ProtocolErrorKind::BoardTooLarge {
            width: size.width,
            height: size.height,
        }
    }
}

/// Recognize a full board dump of `size.height` rows.
///
/// Only the first row decides whether this is a board at all. Once it is, every
/// row that has arrived must follow the board grammar or the stream is broken,
/// even before the dump is complete. Rows beyond `size.height` are left for the
/// next frame.
pub fn parse_board(buf: &[u8], size: BoardSize) -> ProtocolResult<Parsed<ServerMessage>> {
    let Some(first) = next_line(buf) else {
        return Ok(Parsed::NotReady);
    };
    if !looks_like_row(first.content) {
        return Ok(Parsed::NoMatch);
    }

    let mut tiles = Vec::new();
    let mut consumed = 0;
    for y in 0..size.height {
        let Some(line) = next_line(&buf[consumed..]) else {
            return Ok(Parsed::NotReady);
        };
        consumed += line.len;

        let violation = |kind| ProtocolError::new(kind, String::from_utf8_lossy(&buf[..consumed]));
        tiles.extend(decode_row(line.content, y, size.width).map_err(violation)?);
    }

    let board = Board::from_tiles(size, tiles).map_err(|_| {
        ProtocolError::new(size_violation(size), String::from_utf8_lossy(&buf[..consumed]))
    })?;

    Ok(Parsed::Complete {
        value: ServerMessage::BoardDump { board },
        consumed,
    })
}

/// Recognize any single line as free text.
pub fn parse_status(buf: &[u8]) -> Parsed<ServerMessage> {
    match next_line(buf) {
        Some(line) => Parsed::Complete {
            value: ServerMessage::StatusText {
                text: String::from_utf8_lossy(line.content).into_owned(),
            },
            consumed: line.len,
        },
        None => Parsed::NotReady,
    }
}

/// Try every post-greeting recognizer in priority order.
pub fn parse_next(buf: &[u8], size: BoardSize) -> ProtocolResult<Parsed<ServerMessage>> {
    if next_line(buf).is_none() {
        return Ok(Parsed::NotReady);
    }

    if let found @ Parsed::Complete { .. } = parse_detonation(buf) {
        return Ok(found);
    }

    match parse_board(buf, size)? {
        Parsed::NoMatch => Ok(parse_status(buf)),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREETING: &[u8] =
        b"Welcome to Minesweeper. Board: 40 columns by 37 rows. Players: 1 including you. Type 'help' for help.\n";

    fn complete(parsed: Parsed<ServerMessage>) -> (ServerMessage, usize) {
        match parsed {
            Parsed::Complete { value, consumed } => (value, consumed),
            other => panic!("expected a complete frame, got {other:?}"),
        }
    }

    #[test]
    fn line_terminators() {
        assert_eq!(next_line(b"ab\ncd").unwrap().len, 3);
        assert_eq!(next_line(b"ab\r\ncd").unwrap().len, 4);
        assert_eq!(next_line(b"ab\rcd").unwrap().len, 3);
        assert_eq!(next_line(b"ab\r").unwrap().content, b"ab");
        assert_eq!(next_line(b"ab"), None);
    }

    #[test]
    fn greeting_is_decoded() {
        let (message, consumed) = complete(parse_greeting(GREETING));

        assert_eq!(
            message,
            ServerMessage::Greeting {
                size: BoardSize::new(40, 37),
                players: 1
            }
        );
        assert_eq!(consumed, GREETING.len());
    }

    #[test]
    fn greeting_leaves_following_lines() {
        let mut buf = GREETING.to_vec();
        buf.extend_from_slice(b"RTFM\nRTFM\n");

        let (_, consumed) = complete(parse_greeting(&buf));

        assert_eq!(&buf[consumed..], b"RTFM\nRTFM\n");
    }

    #[test]
    fn greeting_mismatch_and_partial() {
        assert_eq!(parse_greeting(b"Hello.\r\n"), Parsed::NoMatch);
        assert_eq!(
            parse_greeting(b"Welcome to Minesweeper. Board: x columns by 2 rows. Players: 1 including you. Type 'help' for help.\n"),
            Parsed::NoMatch
        );
        assert_eq!(parse_greeting(b"hi"), Parsed::NotReady);
    }

    #[test]
    fn detonation_with_each_terminator() {
        for input in [&b"BOOM!\n"[..], b"BOOM!\r\n", b"BOOM!\r"] {
            let (message, consumed) = complete(parse_detonation(input));
            assert_eq!(message, ServerMessage::Detonation);
            assert_eq!(consumed, input.len());
        }

        let (_, consumed) = complete(parse_detonation(b"BOOM!\rBOOM!\r\n"));
        assert_eq!(consumed, 6);
        assert_eq!(parse_detonation(b"BOOM!!\n"), Parsed::NoMatch);
    }

    #[test]
    fn board_is_decoded() {
        let (message, consumed) =
            complete(parse_board(b"- F -\r\n  8 2\n", BoardSize::new(3, 2)).unwrap());

        let ServerMessage::BoardDump { board } = message else {
            panic!("expected a board dump");
        };
        assert_eq!(consumed, 13);
        assert_eq!(board.get(0, 0).unwrap(), Tile::Untouched);
        assert_eq!(board.get(1, 0).unwrap(), Tile::Flagged);
        assert_eq!(board.get(2, 0).unwrap(), Tile::Untouched);
        assert_eq!(board.get(0, 1).unwrap(), Tile::dug(0).unwrap());
        assert_eq!(board.get(1, 1).unwrap(), Tile::dug(8).unwrap());
        assert_eq!(board.get(2, 1).unwrap(), Tile::dug(2).unwrap());
    }

    #[test]
    fn board_leaves_queued_rows() {
        let buf = b"-   F 8 -\n- - - - -\n";

        let (message, consumed) = complete(parse_board(buf, BoardSize::new(5, 1)).unwrap());

        assert_eq!(&buf[consumed..], b"- - - - -\n");
        let ServerMessage::BoardDump { board } = message else {
            panic!("expected a board dump");
        };
        assert_eq!(board.get(1, 0).unwrap(), Tile::dug(0).unwrap());
        assert_eq!(board.get(3, 0).unwrap(), Tile::dug(8).unwrap());
    }

    #[test]
    fn board_waits_for_all_rows() {
        assert_eq!(
            parse_board(b"- -\n- -\n", BoardSize::new(2, 3)).unwrap(),
            Parsed::NotReady
        );
        assert_eq!(
            parse_board(b"- -\n- -", BoardSize::new(2, 2)).unwrap(),
            Parsed::NotReady
        );
    }

    #[test]
    fn board_with_wrong_row_width_fails() {
        let err = parse_board(b"- -\r-\n", BoardSize::new(2, 2)).unwrap_err();

        assert_eq!(err.kind, ProtocolErrorKind::WrongSizeBoard { line: 1 });
        assert_eq!(err.buffer, "- -\r-\n");
    }

    #[test]
    fn board_row_errors() {
        let size = BoardSize::new(2, 2);

        assert_eq!(
            parse_board(b"- -\n- x\n", size).unwrap_err().kind,
            ProtocolErrorKind::InvalidTile {
                line: 1,
                column: 1,
                glyph: 'x'
            }
        );
        assert_eq!(
            parse_board(b"- -\n-_-\n", size).unwrap_err().kind,
            ProtocolErrorKind::MalformedRow { line: 1 }
        );
        assert_eq!(
            parse_board(b"- - -\n- -\n", size).unwrap_err().kind,
            ProtocolErrorKind::WrongSizeBoard { line: 0 }
        );
    }

    #[test]
    fn bad_row_fails_before_the_dump_completes() {
        let size = BoardSize::new(3, 1_000_000);

        let err = parse_board(b"- -\n", size).unwrap_err();

        assert_eq!(err.kind, ProtocolErrorKind::WrongSizeBoard { line: 0 });
        assert_eq!(
            parse_board(b"- - -\n- x -\n", size).unwrap_err().kind,
            ProtocolErrorKind::InvalidTile {
                line: 1,
                column: 1,
                glyph: 'x'
            }
        );
    }

    #[test]
    fn huge_sizes_do_not_allocate_up_front() {
        let tall = BoardSize::new(1, usize::MAX);
        assert_eq!(parse_board(b"-\n", tall).unwrap(), Parsed::NotReady);

        let wide = BoardSize::new(usize::MAX, 1);
        assert_eq!(
            parse_board(b"-\n", wide).unwrap_err().kind,
            ProtocolErrorKind::WrongSizeBoard { line: 0 }
        );
    }

    #[test]
    fn non_board_text_is_not_a_board() {
        let size = BoardSize::new(2, 2);

        assert_eq!(parse_board(b"HELP!\n", size).unwrap(), Parsed::NoMatch);
        assert_eq!(parse_board(b"\n", size).unwrap(), Parsed::NoMatch);
    }

    #[test]
    fn status_lines() {
        let (message, consumed) = complete(parse_status(b"rtfm.\r\n"));
        assert_eq!(
            message,
            ServerMessage::StatusText {
                text: "rtfm.".to_string()
            }
        );
        assert_eq!(consumed, 7);

        let long = "oh no ".repeat(1500) + "\r";
        let (_, consumed) = complete(parse_status(long.as_bytes()));
        assert_eq!(consumed, long.len());

        assert_eq!(parse_status(b"banana banana banana"), Parsed::NotReady);
    }

    #[test]
    fn priority_order() {
        let size = BoardSize::new(1, 1);

        let (message, _) = complete(parse_next(b"BOOM!\n", size).unwrap());
        assert_eq!(message, ServerMessage::Detonation);

        let (message, _) = complete(parse_next(b"F\n", size).unwrap());
        assert!(matches!(message, ServerMessage::BoardDump { .. }));

        let (message, consumed) =
            complete(parse_next(b"RTFM\ri am an unfinished message", size).unwrap());
        assert_eq!(
            message,
            ServerMessage::StatusText {
                text: "RTFM".to_string()
            }
        );
        assert_eq!(consumed, 5);

        assert_eq!(parse_next(b"half a line", size).unwrap(), Parsed::NotReady);
    }
}
