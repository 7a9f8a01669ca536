//! Record and field tokenization shared by requests and responses.

use bytes::{BufMut, Bytes};

use crate::{FIELD_SEPARATOR, RECORD_SEPARATOR, TERMINATOR};

/// Both separators have the same width, which lets the tokenizer test one
/// window per position.
const SEPARATOR_LEN: usize = 3;

const _: () = assert!(FIELD_SEPARATOR.len() == SEPARATOR_LEN);
const _: () = assert!(RECORD_SEPARATOR.len() == SEPARATOR_LEN);

/// One message board entry as it travels on the wire.
///
/// Author and title may be empty. The server refuses to store a post with an
/// empty body, but the type itself does not enforce that so that responses
/// can be decoded faithfully.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Post {
    /// Author name, possibly empty
    pub author: Bytes,
    /// Title, possibly empty
    pub title: Bytes,
    /// Message body
    pub body: Bytes,
}

impl Post {
    /// Build a post from anything convertible to [`Bytes`].
    pub fn new(author: impl Into<Bytes>, title: impl Into<Bytes>, body: impl Into<Bytes>) -> Self {
        Self { author: author.into(), title: title.into(), body: body.into() }
    }

    /// Write `F author F title F body`.
    pub(crate) fn encode_fields(&self, dst: &mut impl BufMut) {
        for field in [&self.author, &self.title, &self.body] {
            dst.put_slice(FIELD_SEPARATOR);
            dst.put_slice(field);
        }
    }
}

/// Split a transmission body into records of fields.
///
/// Always yields at least one record. A record separator at the very end of
/// the input, with nothing after it, does not open a new record.
pub(crate) fn split_records(body: &Bytes) -> Vec<Vec<Bytes>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i + SEPARATOR_LEN <= body.len() {
        let window = &body[i..i + SEPARATOR_LEN];
        if window == FIELD_SEPARATOR {
            fields.push(body.slice(start..i));
            i += SEPARATOR_LEN;
            start = i;
        } else if window == RECORD_SEPARATOR {
            fields.push(body.slice(start..i));
            records.push(std::mem::take(&mut fields));
            i += SEPARATOR_LEN;
            start = i;
        } else {
            i += 1;
        }
    }

    let trailing_empty_record = start == body.len() && fields.is_empty() && !records.is_empty();
    if !trailing_empty_record {
        fields.push(body.slice(start..));
        records.push(fields);
    }

    debug_assert!(!records.is_empty());
    records
}

/// Position of the first terminator in `haystack`.
pub(crate) fn find_terminator(haystack: &[u8]) -> Option<usize> {
    haystack.windows(TERMINATOR.len()).position(|window| window == TERMINATOR)
}

/// Drop everything from the first terminator onwards.
pub(crate) fn strip_terminator(message: Bytes) -> Bytes {
    match find_terminator(&message) {
        Some(pos) => message.slice(..pos),
        None => message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(input: &'static str) -> Vec<Vec<String>> {
        let body = Bytes::from_static(input.as_bytes());
        split_records(&body)
            .into_iter()
            .map(|record| {
                record.iter().map(|field| String::from_utf8_lossy(field).into_owned()).collect()
            })
            .collect()
    }

    #[test]
    fn splits_fields_in_one_record() {
        assert_eq!(records("cmd}+{author}+{title}+{message"), vec![vec![
            "cmd", "author", "title", "message"
        ]]);
    }

    #[test]
    fn preserves_empty_fields() {
        assert_eq!(records("cmd}+{}+{title}+{"), vec![vec!["cmd", "", "title", ""]]);
    }

    #[test]
    fn single_field() {
        assert_eq!(records("onlycommand"), vec![vec!["onlycommand"]]);
    }

    #[test]
    fn splits_records() {
        assert_eq!(records("GET_BOARD}+{a}+{t}+{b}#{}+{a2}+{t2}+{b2"), vec![
            vec!["GET_BOARD", "a", "t", "b"],
            vec!["", "a2", "t2", "b2"],
        ]);
    }

    #[test]
    fn trailing_record_separator_opens_nothing() {
        assert_eq!(records("POST}+{a}+{t}+{b}#{"), vec![vec!["POST", "a", "t", "b"]]);
    }

    #[test]
    fn record_of_empty_fields_is_kept() {
        assert_eq!(records("X}#{}+{"), vec![vec!["X"], vec!["", ""]]);
    }

    #[test]
    fn strip_terminator_truncates() {
        let stripped = strip_terminator(Bytes::from_static(b"QUIT}}&{{GET_BOARD"));
        assert_eq!(&stripped[..], b"QUIT");
    }
}
