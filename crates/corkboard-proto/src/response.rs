//! Server responses.
//!
//! Every response is a fixed-shape record closed by the terminator. Status
//! responses carry three fields after the token, the first two always empty:
//!
//! ```text
//! POST_OK}+{}+{}+{}}&{{
//! POST_ERROR}+{}+{}+{<reason>}}&{{
//! INVALID_COMMAND}+{}+{}+{<reason>}}&{{
//! ```
//!
//! A board response writes each post as `F author F title F body`, joining
//! posts with the record separator. The first post therefore sits in the
//! token's record while later records start with an empty field:
//!
//! ```text
//! GET_BOARD}+{a1}+{t1}+{b1}#{}+{a2}+{t2}+{b2}}&{{
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    FIELD_SEPARATOR, RECORD_SEPARATOR, TERMINATOR,
    errors::{ParseError, Result},
    fields::{Post, split_records, strip_terminator},
};

const POST_OK: &str = "POST_OK";
const POST_ERROR: &str = "POST_ERROR";
const GET_BOARD: &str = "GET_BOARD";
const GET_BOARD_ERROR: &str = "GET_BOARD_ERROR";
const INVALID_COMMAND: &str = "INVALID_COMMAND";
const QUIT: &str = "QUIT";
const SERVER: &str = "SERVER";

const GOODBYE_FIELDS: [&str; 3] = ["SERVER", "BYE!!!", "Server says: BYE!!!"];
const SHUTDOWN_FIELDS: [&str; 2] = ["SHUTDOWN", "Server is shutting down"];

/// Transmission sent from the server to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A `POST` batch was stored.
    PostOk,
    /// A `POST` batch was refused by the store.
    PostError(String),
    /// Posts matching a `GET_BOARD` request, in board order.
    Board(Vec<Post>),
    /// A `GET_BOARD` request could not be served.
    BoardError(String),
    /// The transmission could not be decoded.
    InvalidCommand(String),
    /// Reply to `QUIT`, sent right before the server closes the connection.
    Goodbye,
    /// Broadcast to every connection while the server shuts down.
    Shutdown,
}

impl Response {
    /// Wire token that opens the response.
    pub fn token(&self) -> &'static str {
        match self {
            Self::PostOk => POST_OK,
            Self::PostError(_) => POST_ERROR,
            Self::Board(_) => GET_BOARD,
            Self::BoardError(_) => GET_BOARD_ERROR,
            Self::InvalidCommand(_) => INVALID_COMMAND,
            Self::Goodbye => QUIT,
            Self::Shutdown => SERVER,
        }
    }

    /// Encode the response, terminator included.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_slice(self.token().as_bytes());
        match self {
            Self::PostOk => put_status(dst, ""),
            Self::PostError(reason) | Self::BoardError(reason) | Self::InvalidCommand(reason) => {
                put_status(dst, reason);
            },
            Self::Board(posts) => {
                for (i, post) in posts.iter().enumerate() {
                    if i > 0 {
                        dst.put_slice(RECORD_SEPARATOR);
                    }
                    post.encode_fields(dst);
                }
            },
            Self::Goodbye => put_fields(dst, &GOODBYE_FIELDS),
            Self::Shutdown => put_fields(dst, &SHUTDOWN_FIELDS),
        }
        dst.put_slice(TERMINATOR);
    }

    /// [`Response::encode`] into a fresh buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Decode a response transmission, without its terminator.
    ///
    /// Accepts exactly the shapes [`Response::encode`] produces.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Empty`] for an empty transmission
    /// - [`ParseError::UnknownCommand`] for an unknown response token
    /// - [`ParseError::MalformedResponse`] when the fields do not fit the
    ///   token's shape
    pub fn decode(message: Bytes) -> Result<Self> {
        let message = strip_terminator(message);
        if message.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut records = split_records(&message).into_iter();
        let first = records.next().unwrap_or_default();
        let rest: Vec<Vec<Bytes>> = records.collect();
        let token =
            first.first().map(|t| String::from_utf8_lossy(t).into_owned()).unwrap_or_default();
        let fields = first.get(1..).unwrap_or_default();

        if token != GET_BOARD && !rest.is_empty() {
            return Err(malformed(&token, "unexpected record separator"));
        }

        match token.as_str() {
            POST_OK => match status_reason(&token, fields)? {
                reason if reason.is_empty() => Ok(Self::PostOk),
                _ => Err(malformed(&token, "unexpected reason")),
            },
            POST_ERROR => status_reason(&token, fields).map(Self::PostError),
            GET_BOARD_ERROR => status_reason(&token, fields).map(Self::BoardError),
            INVALID_COMMAND => status_reason(&token, fields).map(Self::InvalidCommand),
            GET_BOARD => decode_board(fields, &rest).map(Self::Board),
            QUIT if matches_fixed(fields, &GOODBYE_FIELDS) => Ok(Self::Goodbye),
            SERVER if matches_fixed(fields, &SHUTDOWN_FIELDS) => Ok(Self::Shutdown),
            QUIT | SERVER => Err(malformed(&token, "unexpected fields")),
            _ => Err(ParseError::UnknownCommand(token)),
        }
    }
}

fn put_status(dst: &mut impl BufMut, reason: &str) {
    put_fields(dst, &["", "", reason]);
}

fn put_fields(dst: &mut impl BufMut, fields: &[&str]) {
    for field in fields {
        dst.put_slice(FIELD_SEPARATOR);
        dst.put_slice(field.as_bytes());
    }
}

fn malformed(token: &str, detail: &str) -> ParseError {
    ParseError::MalformedResponse(format!("{token}: {detail}"))
}

/// Reason text of a `TOKEN F F F reason` status response.
fn status_reason(token: &str, fields: &[Bytes]) -> Result<String> {
    match fields {
        [author, title, reason] if author.is_empty() && title.is_empty() => {
            String::from_utf8(reason.to_vec()).map_err(|_| malformed(token, "reason is not UTF-8"))
        },
        _ => Err(malformed(token, "expected three status fields")),
    }
}

fn matches_fixed(fields: &[Bytes], expected: &[&str]) -> bool {
    fields.len() == expected.len()
        && fields.iter().zip(expected).all(|(field, want)| field == want.as_bytes())
}

fn decode_board(first: &[Bytes], rest: &[Vec<Bytes>]) -> Result<Vec<Post>> {
    let mut posts = Vec::with_capacity(rest.len() + 1);

    match first {
        [] if rest.is_empty() => return Ok(posts),
        [author, title, body] => posts.push(Post::new(author.clone(), title.clone(), body.clone())),
        _ => return Err(malformed(GET_BOARD, "first post is not a triple")),
    }

    for record in rest {
        match record.as_slice() {
            [lead, author, title, body] if lead.is_empty() => {
                posts.push(Post::new(author.clone(), title.clone(), body.clone()));
            },
            _ => return Err(malformed(GET_BOARD, "post record is not a triple")),
        }
    }

    Ok(posts)
}
