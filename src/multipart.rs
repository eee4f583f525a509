// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Byte-exact `multipart/form-data` encoding.
//!
//! Field values are inserted verbatim; callers pass already sanitized text.

use uuid::Uuid;

const CRLF: &[u8] = b"\r\n";

/// The binary part of a multipart body
#[derive(Debug, Clone)]
pub struct FilePart<'a> {
    pub field_name: &'a str,
    pub file_name: &'a str,
    pub mime_type: &'a str,
    pub bytes: &'a [u8],
}

/// An encoded body together with the boundary that delimits it
#[derive(Debug, Clone)]
pub struct MultipartBody {
    pub boundary: String,
    pub body: Vec<u8>,
}

impl MultipartBody {
    /// Value for the request's `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

/// Generate a fresh boundary token
pub fn generate_boundary() -> String {
    format!("----PostcastBoundary{}", Uuid::new_v4().simple())
}

/// Encode text fields followed by one file part, using a random boundary
pub fn encode(fields: &[(&str, &str)], file: &FilePart<'_>) -> MultipartBody {
    encode_with_boundary(generate_boundary(), fields, file)
}

/// Encode with a caller-chosen boundary
///
/// Text fields are written in the given order, then the file part.
pub fn encode_with_boundary(
    boundary: String,
    fields: &[(&str, &str)],
    file: &FilePart<'_>,
) -> MultipartBody {
    let delimiter = format!("--{}", boundary);
    let text_len: usize = fields.iter().map(|(n, v)| n.len() + v.len() + 64).sum();
    let mut body = Vec::with_capacity(text_len + file.bytes.len() + 256);

    for (name, value) in fields {
        body.extend_from_slice(delimiter.as_bytes());
        body.extend_from_slice(CRLF);
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"", name).as_bytes(),
        );
        body.extend_from_slice(CRLF);
        body.extend_from_slice(CRLF);
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(CRLF);
    }

    body.extend_from_slice(delimiter.as_bytes());
    body.extend_from_slice(CRLF);
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"",
            file.field_name, file.file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(CRLF);
    body.extend_from_slice(format!("Content-Type: {}", file.mime_type).as_bytes());
    body.extend_from_slice(CRLF);
    body.extend_from_slice(CRLF);
    body.extend_from_slice(file.bytes);
    body.extend_from_slice(CRLF);

    body.extend_from_slice(delimiter.as_bytes());
    body.extend_from_slice(b"--");
    body.extend_from_slice(CRLF);

    MultipartBody { boundary, body }
}
