//! RFC 2822 message construction for `messages.send`.

use std::path::Path;

use base64::Engine;
use goog_core::mime;

use crate::error::GmailError;

const LINE_WIDTH: usize = 76;

/// Build the raw message bytes.
///
/// Without attachments the message is a single `text/plain` part, otherwise
/// `multipart/mixed` with the text first and one base64 part per file.
pub fn build_message(
    sender: &str,
    to: &str,
    subject: &str,
    body: &str,
    attachments: &[impl AsRef<Path>],
) -> Result<Vec<u8>, GmailError> {
    let mut headers = format!(
        "MIME-Version: 1.0\r\nTo: {}\r\nFrom: {}\r\nSubject: {}\r\n",
        single_line("To", to)?,
        single_line("From", sender)?,
        encode_header(single_line("Subject", subject)?)
    );

    if attachments.is_empty() {
        headers.push_str(&text_part(body));
        return Ok(headers.into_bytes());
    }

    let boundary = format!(
        "=_goog_{:x}",
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    );
    headers.push_str(&format!(
        "Content-Type: multipart/mixed; boundary=\"{}\"\r\n\r\n",
        boundary
    ));

    let mut message = headers;
    message.push_str(&format!("--{}\r\n", boundary));
    message.push_str(&text_part(body));
    message.push_str("\r\n");

    for file in attachments {
        let path = file.as_ref();
        let content = std::fs::read(path).map_err(|source| GmailError::Attachment {
            path: path.display().to_string(),
            source,
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = mime::sniff(&content)
            .or_else(|| mime::guess_from_name(&filename))
            .unwrap_or(mime::OCTET_STREAM);

        message.push_str(&format!("--{}\r\n", boundary));
        message.push_str(&format!(
            "Content-Type: {}\r\nContent-Transfer-Encoding: base64\r\nContent-Disposition: attachment; filename=\"{}\"\r\n\r\n",
            content_type,
            single_line("Content-Disposition", &filename)?.replace('"', "")
        ));
        message.push_str(&wrap_base64(&content));
    }

    message.push_str(&format!("--{}--\r\n", boundary));
    Ok(message.into_bytes())
}

/// `text/plain` headers and body, 7bit when ASCII and base64 otherwise.
fn text_part(body: &str) -> String {
    if body.is_ascii() {
        format!(
            "Content-Type: text/plain; charset=\"us-ascii\"\r\nContent-Transfer-Encoding: 7bit\r\n\r\n{}\r\n",
            body
        )
    } else {
        format!(
            "Content-Type: text/plain; charset=\"utf-8\"\r\nContent-Transfer-Encoding: base64\r\n\r\n{}",
            wrap_base64(body.as_bytes())
        )
    }
}

/// Header values may not contain line breaks.
fn single_line<'a>(name: &'static str, value: &'a str) -> Result<&'a str, GmailError> {
    if value.contains(['\r', '\n']) {
        return Err(GmailError::InvalidHeader(name));
    }
    Ok(value)
}

/// RFC 2047 encoded-word for non-ASCII header values.
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!(
            "=?utf-8?b?{}?=",
            base64::engine::general_purpose::STANDARD.encode(value)
        )
    }
}

fn wrap_base64(content: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(content);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / LINE_WIDTH * 2 + 2);
    for chunk in encoded.as_bytes().chunks(LINE_WIDTH) {
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push_str("\r\n");
    }
    out
}

/// Base64url encoding expected in the `raw` field.
pub fn encode_raw(message: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE.encode(message)
}
