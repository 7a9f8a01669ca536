//! Client requests and the transmission decoder.
//!
//! The decoder flattens a transmission into a single field sequence (record
//! separators tokenize like field separators) and interprets it by command:
//!
//! | Command     | Payload                                               |
//! |-------------|-------------------------------------------------------|
//! | `GET_BOARD` | optional author filter, optional title filter         |
//! | `POST`      | one or more `(author, title, body)` triples           |
//! | `QUIT`      | ignored                                               |
//!
//! A `POST` batch may repeat the `POST` token at the head of each record after
//! the first, which is how clients usually chain posts:
//!
//! ```text
//! POST}+{A}+{T1}+{B1}#{POST}+{B}+{T2}+{B2}
//! ```
//!
//! The repeated token is dropped only when the rest of its record is exactly
//! one triple, so an author literally named `POST` still parses.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    FIELD_SEPARATOR, RECORD_SEPARATOR, TERMINATOR,
    errors::{ParseError, Result},
    fields::{Post, split_records, strip_terminator},
};

/// Commands a client may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Read the board, optionally filtered
    GetBoard,
    /// Append one or more posts
    Post,
    /// Close the session
    Quit,
}

impl Command {
    /// Every client command.
    pub const ALL: [Self; 3] = [Self::GetBoard, Self::Post, Self::Quit];

    /// Wire token for the command.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetBoard => "GET_BOARD",
            Self::Post => "POST",
            Self::Quit => "QUIT",
        }
    }

    /// Match a wire token. Case-sensitive.
    pub fn from_token(token: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.as_str().as_bytes() == token)
    }
}

/// Successfully decoded client transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Read the whole board. `None` filters match everything.
    GetBoard {
        /// Keep only posts whose author equals this, byte for byte
        author_filter: Option<Bytes>,
        /// Keep only posts whose title equals this, byte for byte
        title_filter: Option<Bytes>,
    },
    /// Append a batch of posts. Never empty, and every body is non-empty.
    Post(Vec<Post>),
    /// Close the session gracefully.
    Quit,
}

impl Request {
    /// Command this request was decoded from.
    pub fn command(&self) -> Command {
        match self {
            Self::GetBoard { .. } => Command::GetBoard,
            Self::Post(_) => Command::Post,
            Self::Quit => Command::Quit,
        }
    }

    /// Unfiltered board request.
    pub fn get_board() -> Self {
        Self::GetBoard { author_filter: None, title_filter: None }
    }

    /// Encode the client form of this request, terminator included.
    ///
    /// Filters are written only when present. Posts after the first are
    /// chained as separate records that repeat the `POST` token.
    pub fn encode(&self, dst: &mut impl BufMut) {
        match self {
            Self::GetBoard { author_filter, title_filter } => {
                dst.put_slice(Command::GetBoard.as_str().as_bytes());
                match (author_filter, title_filter) {
                    (None, None) => {},
                    (Some(author), None) => {
                        dst.put_slice(FIELD_SEPARATOR);
                        dst.put_slice(author);
                    },
                    (author, Some(title)) => {
                        dst.put_slice(FIELD_SEPARATOR);
                        if let Some(author) = author {
                            dst.put_slice(author);
                        }
                        dst.put_slice(FIELD_SEPARATOR);
                        dst.put_slice(title);
                    },
                }
            },
            Self::Post(posts) => {
                for (i, post) in posts.iter().enumerate() {
                    if i > 0 {
                        dst.put_slice(RECORD_SEPARATOR);
                    }
                    dst.put_slice(Command::Post.as_str().as_bytes());
                    post.encode_fields(dst);
                }
            },
            Self::Quit => dst.put_slice(Command::Quit.as_str().as_bytes()),
        }
        dst.put_slice(TERMINATOR);
    }

    /// [`Request::encode`] into a fresh buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.freeze()
    }
}

/// Decode one client transmission.
///
/// `message` is the transmission up to, but not including, its terminator. If
/// a terminator is present anyway, everything from it onwards is ignored.
///
/// # Errors
///
/// - [`ParseError::Empty`] for an empty transmission
/// - [`ParseError::UnknownCommand`] when the first field is not a command
/// - [`ParseError::NoPosts`] / [`ParseError::BadPostShape`] when a `POST`
///   payload is not a nonzero multiple of three fields
/// - [`ParseError::EmptyBody`] when any triple of a `POST` has an empty body
pub fn parse_message(message: Bytes) -> Result<Request> {
    let message = strip_terminator(message);
    if message.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut records = split_records(&message).into_iter();
    let mut first = records.next().unwrap_or_default().into_iter();
    let token = first.next().unwrap_or_default();

    let Some(command) = Command::from_token(&token) else {
        return Err(ParseError::UnknownCommand(String::from_utf8_lossy(&token).into_owned()));
    };

    match command {
        Command::GetBoard => {
            let mut filters = first.chain(records.flatten());
            let author_filter = filters.next().filter(|f| !f.is_empty());
            let title_filter = filters.next().filter(|f| !f.is_empty());
            Ok(Request::GetBoard { author_filter, title_filter })
        },
        Command::Post => {
            let mut payload: Vec<Bytes> = first.collect();
            for record in records {
                payload.extend(elide_repeated_post_token(record));
            }
            parse_posts(&payload).map(Request::Post)
        },
        Command::Quit => Ok(Request::Quit),
    }
}

/// Drop a leading `POST` token from a chained batch record.
fn elide_repeated_post_token(record: Vec<Bytes>) -> impl Iterator<Item = Bytes> {
    let skip = usize::from(record.len() == 4 && record[0] == Command::Post.as_str().as_bytes());
    record.into_iter().skip(skip)
}

fn parse_posts(payload: &[Bytes]) -> Result<Vec<Post>> {
    if payload.is_empty() {
        return Err(ParseError::NoPosts);
    }
    if payload.len() % 3 != 0 {
        return Err(ParseError::BadPostShape { fields: payload.len() });
    }

    let mut posts = Vec::with_capacity(payload.len() / 3);
    for (index, triple) in payload.chunks_exact(3).enumerate() {
        if let [author, title, body] = triple {
            if body.is_empty() {
                return Err(ParseError::EmptyBody { index });
            }
            posts.push(Post { author: author.clone(), title: title.clone(), body: body.clone() });
        }
    }

    debug_assert_eq!(posts.len() * 3, payload.len());
    Ok(posts)
}
