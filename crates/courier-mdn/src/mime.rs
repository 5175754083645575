//! Minimal MIME entity rendering for the two-part disposition report
//! and its signed envelope. Only what the MDN wire shape needs: header
//! blocks, multipart bodies and fixed boundaries.

use uuid::Uuid;

const CRLF: &str = "\r\n";

/// A single MIME body part: header block plus raw body.
#[derive(Debug, Clone)]
pub struct MimePart {
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl MimePart {
    pub fn new(content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            headers: vec![("Content-Type".to_owned(), content_type.to_owned())],
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn content_type(&self) -> &str {
        // First header is always Content-Type, set in `new`.
        &self.headers[0].1
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Header block, blank line, body. The byte-exact form that gets
    /// transmitted and, for the report part, signed.
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.body.len() + 128);
        for (name, value) in &self.headers {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(CRLF.as_bytes());
        }
        out.extend_from_slice(CRLF.as_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}

/// A multipart entity with a generated boundary.
#[derive(Debug, Clone)]
pub struct Multipart {
    subtype: String,
    boundary: String,
    parts: Vec<MimePart>,
}

impl Multipart {
    /// `subtype` is everything after `multipart/`, including its
    /// parameters, e.g. `report; report-type=disposition-notification`.
    pub fn new(subtype: &str) -> Self {
        Self {
            subtype: subtype.to_owned(),
            boundary: new_boundary(),
            parts: Vec::new(),
        }
    }

    pub fn push(&mut self, part: MimePart) {
        self.parts.push(part);
    }

    /// Full Content-Type value, boundary parameter included.
    pub fn content_type(&self) -> String {
        format!(
            "multipart/{}; boundary=\"{}\"",
            self.subtype, self.boundary
        )
    }

    /// Render the multipart body: each part preceded by the boundary
    /// delimiter, closed with the terminating delimiter.
    pub fn render_body(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(format!("--{}{CRLF}", self.boundary).as_bytes());
            out.extend_from_slice(&part.render());
            out.extend_from_slice(CRLF.as_bytes());
        }
        out.extend_from_slice(format!("--{}--{CRLF}", self.boundary).as_bytes());
        out
    }

    /// The whole entity as a single body part, ready for nesting.
    pub fn into_part(self) -> MimePart {
        let content_type = self.content_type();
        let body = self.render_body();
        MimePart::new(&content_type, body)
    }
}

fn new_boundary() -> String {
    format!("----=_Part_{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_renders_headers_then_blank_line_then_body() {
        let part = MimePart::new("text/plain", "hello")
            .with_header("Content-Transfer-Encoding", "7bit");
        let rendered = String::from_utf8(part.render()).unwrap();
        assert_eq!(
            rendered,
            "Content-Type: text/plain\r\nContent-Transfer-Encoding: 7bit\r\n\r\nhello"
        );
    }

    #[test]
    fn multipart_body_is_boundary_delimited() {
        let mut multipart = Multipart::new("report; report-type=disposition-notification");
        multipart.push(MimePart::new("text/plain", "a"));
        multipart.push(MimePart::new("text/plain", "b"));

        let boundary = multipart.boundary.clone();
        let body = String::from_utf8(multipart.render_body()).unwrap();

        assert_eq!(body.matches(&format!("--{boundary}\r\n")).count(), 2);
        assert!(body.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn content_type_carries_subtype_and_boundary() {
        let multipart = Multipart::new("signed; protocol=\"application/pkcs7-signature\"");
        let content_type = multipart.content_type();
        assert!(content_type.starts_with("multipart/signed; protocol=\"application/pkcs7-signature\"; boundary=\""));
    }

    #[test]
    fn boundaries_are_unique() {
        assert_ne!(new_boundary(), new_boundary());
    }
}
