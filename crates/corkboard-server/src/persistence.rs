//! Board file.
//!
//! One post per line, `author|title|body|client_id`. Author and title end at
//! the first and second `|`; the client id starts after the last one, so a
//! body may itself contain `|`. Lines are written as raw bytes with no
//! escaping, so a post whose author or title contains `|`, or whose body
//! contains a newline, cannot be stored. [`save`] leaves such posts out and
//! reports them in its [`SaveReport`].

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use bytes::{BufMut, Bytes, BytesMut};
use corkboard_proto::Post;

use crate::{board::StoredPost, error::PersistError};

/// Result of reading a board file.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Posts restored, in file order
    pub posts: Vec<StoredPost>,
    /// One-based numbers of lines that could not be parsed
    pub skipped_lines: Vec<usize>,
}

/// Result of writing a board file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Posts written
    pub saved: usize,
    /// One-based board positions of posts the format cannot represent
    pub skipped: Vec<usize>,
}

/// Read a board file. A missing file yields an empty report.
///
/// # Errors
///
/// [`PersistError::Read`] for any I/O error other than the file not existing.
pub fn load(path: &Path) -> Result<LoadReport, PersistError> {
    let contents = match fs::read(path) {
        Ok(contents) => Bytes::from(contents),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LoadReport::default()),
        Err(source) => return Err(PersistError::Read { path: path.to_path_buf(), source }),
    };

    let mut report = LoadReport::default();
    let mut start = 0;
    for (number, line) in contents.split(|b| *b == b'\n').enumerate() {
        let end = start + line.len();
        let line_bytes = contents.slice(start..end);
        start = end + 1;

        let line_bytes = match line_bytes.last() {
            Some(b'\r') => line_bytes.slice(..line_bytes.len() - 1),
            _ => line_bytes,
        };
        if line_bytes.is_empty() {
            continue;
        }
        match parse_line(&line_bytes) {
            Some(stored) => report.posts.push(stored),
            None => report.skipped_lines.push(number + 1),
        }
    }
    Ok(report)
}

/// Write the board, replacing the file atomically.
///
/// Posts that [`is_representable`] rejects are left out and listed in the
/// report.
///
/// # Errors
///
/// [`PersistError::Write`] if the temporary file cannot be written or moved
/// into place.
pub fn save(path: &Path, posts: &[StoredPost]) -> Result<SaveReport, PersistError> {
    let mut buf = BytesMut::new();
    let mut report = SaveReport::default();
    for (index, stored) in posts.iter().enumerate() {
        if is_representable(&stored.post) {
            encode_line(stored, &mut buf);
            report.saved += 1;
        } else {
            report.skipped.push(index + 1);
        }
    }

    let tmp = temporary_path(path);
    let write_error = |source| PersistError::Write { path: path.to_path_buf(), source };
    fs::write(&tmp, &buf).map_err(write_error)?;
    fs::rename(&tmp, path).map_err(write_error)?;
    Ok(report)
}

/// Whether `post` reads back unchanged after [`encode_line`].
///
/// Author and title must not contain `|`, no field may contain a newline, and
/// the body must be non-empty.
pub fn is_representable(post: &Post) -> bool {
    let no_newline = |field: &Bytes| !field.contains(&b'\n');
    !post.body.is_empty()
        && !post.author.contains(&b'|')
        && !post.title.contains(&b'|')
        && [&post.author, &post.title, &post.body].into_iter().all(no_newline)
}

/// Parse `author|title|body|client_id`.
pub fn parse_line(line: &Bytes) -> Option<StoredPost> {
    let first = line.iter().position(|b| *b == b'|')?;
    let second = first + 1 + line[first + 1..].iter().position(|b| *b == b'|')?;
    let last = line.iter().rposition(|b| *b == b'|')?;
    if last <= second {
        return None;
    }

    let client_id = std::str::from_utf8(&line[last + 1..]).ok()?.trim().parse().ok()?;
    let body = line.slice(second + 1..last);
    if body.is_empty() {
        return None;
    }

    let post = Post { author: line.slice(..first), title: line.slice(first + 1..second), body };
    Some(StoredPost { post, client_id })
}

/// Append `author|title|body|client_id\n`.
pub fn encode_line(stored: &StoredPost, dst: &mut impl BufMut) {
    let post = &stored.post;
    dst.put_slice(&post.author);
    dst.put_u8(b'|');
    dst.put_slice(&post.title);
    dst.put_u8(b'|');
    dst.put_slice(&post.body);
    dst.put_u8(b'|');
    dst.put_slice(stored.client_id.to_string().as_bytes());
    dst.put_u8(b'\n');
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(s: &'static str) -> Option<StoredPost> {
        parse_line(&Bytes::from_static(s.as_bytes()))
    }

    #[test]
    fn parses_plain_line() {
        let stored = line("Alice|Hi|hello|3").unwrap();
        assert_eq!(stored.post, Post::new("Alice", "Hi", "hello"));
        assert_eq!(stored.client_id, 3);
    }

    #[test]
    fn body_may_contain_pipes() {
        let stored = line("a|t|x|y|z|12").unwrap();
        assert_eq!(stored.post.body, "x|y|z");
        assert_eq!(stored.client_id, 12);
    }

    #[test]
    fn empty_author_and_title() {
        let stored = line("||anonymous|1").unwrap();
        assert_eq!(stored.post, Post::new("", "", "anonymous"));
    }

    #[test]
    fn rejects_malformed_lines() {
        for bad in ["no pipes", "a|b|c", "a|t|body|notanumber", "a|t||4", "a|t|body|"] {
            assert!(line(bad).is_none(), "{bad}");
        }
    }

    #[test]
    fn encode_matches_parse() {
        let stored = StoredPost { post: Post::new("Bob", "News", "a|b"), client_id: 9 };
        let mut buf = BytesMut::new();
        encode_line(&stored, &mut buf);
        assert_eq!(&buf[..], b"Bob|News|a|b|9\n");

        let encoded = buf.freeze();
        assert_eq!(parse_line(&encoded.slice(..encoded.len() - 1)), Some(stored));
    }

    #[test]
    fn representable_posts() {
        assert!(is_representable(&Post::new("Bob", "News", "a|b")));
        assert!(is_representable(&Post::new("", "", "carriage\rreturn")));
        assert!(!is_representable(&Post::new("a|b", "t", "body")));
        assert!(!is_representable(&Post::new("a", "t|u", "body")));
        assert!(!is_representable(&Post::new("a", "t", "line1\nline2")));
        assert!(!is_representable(&Post::new("a\n", "t", "body")));
    }

    #[test]
    fn temporary_path_is_a_sibling() {
        assert_eq!(
            temporary_path(Path::new("/var/board/MessageBoard.txt")),
            Path::new("/var/board/MessageBoard.txt.tmp")
        );
    }
}
