//! MIME decoding of a raw message into a [`ParsedEmailMessage`].

use chrono::{DateTime, Utc};
use mail_parser::{Address, MessageParser, PartType};

use crate::error::{LeadError, Result};
use crate::model::address::EmailAddress;
use crate::model::message::{ParsedEmailMessage, RawMessage};

/// Decode a raw RFC 5322 message.
///
/// A leading UTF-8 BOM and MBOX `From ` separator line are skipped. Only the
/// first `text/plain` and first `text/html` parts are kept; `mail-parser`'s
/// automatic html<->text conversion is bypassed so that callers see exactly
/// which representations the sender provided.
pub fn parse_message(uid: &str, raw: &[u8]) -> Result<ParsedEmailMessage> {
    let bytes = skip_from_line(raw);
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(LeadError::Mime(format!("message {uid} is empty")));
    }

    let msg = MessageParser::default()
        .parse(bytes)
        .ok_or_else(|| LeadError::Mime(format!("message {uid} could not be parsed")))?;

    let from = msg.from().map(addresses).unwrap_or_default();

    let text = msg
        .text_body
        .first()
        .and_then(|&id| msg.parts.get(id))
        .and_then(|part| match &part.body {
            PartType::Text(t) => Some(t.to_string()),
            _ => None,
        });

    let html = msg
        .html_body
        .first()
        .and_then(|&id| msg.parts.get(id))
        .and_then(|part| match &part.body {
            PartType::Html(h) => Some(h.to_string()),
            _ => None,
        });

    let date = msg.date().and_then(|d| {
        DateTime::parse_from_rfc3339(&d.to_rfc3339())
            .ok()
            .map(|d| d.with_timezone(&Utc))
    });

    Ok(ParsedEmailMessage {
        uid: uid.to_string(),
        from,
        subject: msg.subject().map(str::to_string),
        text,
        html,
        date,
        message_id: msg
            .message_id()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty()),
    })
}

/// Decode a [`RawMessage`].
pub fn parse_raw(raw: &RawMessage) -> Result<ParsedEmailMessage> {
    parse_message(&raw.uid, &raw.bytes)
}

/// Flatten a `From:` header (plain list or RFC 5322 groups) into addresses.
fn addresses(header: &Address<'_>) -> Vec<EmailAddress> {
    let to_model = |a: &mail_parser::Addr<'_>| {
        EmailAddress::new(a.name.as_deref(), a.address.as_deref().unwrap_or(""))
    };
    match header {
        Address::List(list) => list.iter().map(to_model).collect(),
        Address::Group(groups) => groups
            .iter()
            .flat_map(|g| g.addresses.iter())
            .map(to_model)
            .collect(),
    }
}

/// Skip a UTF-8 BOM and the `From ` separator line at the start of MBOX messages.
fn skip_from_line(data: &[u8]) -> &[u8] {
    let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);

    if data.starts_with(b"From ") {
        if let Some(pos) = data.iter().position(|&b| b == b'\n') {
            return &data[pos + 1..];
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &[u8] = b"From: Jane Doe <jane.doe@clientco.com>\r\n\
Subject: Website Inquiry - Need Quote\r\n\
Date: Thu, 04 Jan 2024 10:00:00 +0000\r\n\
Message-ID: <lead001@clientco.com>\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
We are interested in a quote.\r\n";

    #[test]
    fn test_skip_from_line() {
        let data = b"From user@example.com Thu Jan 01 00:00:00 2024\nSubject: Test\n\nBody\n";
        assert!(skip_from_line(data).starts_with(b"Subject:"));
    }

    #[test]
    fn test_skip_from_line_no_from() {
        let data = b"Subject: Test\n\nBody\n";
        assert_eq!(skip_from_line(data), data);
    }

    #[test]
    fn test_skip_bom() {
        let mut data = vec![0xEF, 0xBB, 0xBF];
        data.extend_from_slice(b"Subject: Test\n\nBody\n");
        assert!(skip_from_line(&data).starts_with(b"Subject:"));
    }

    #[test]
    fn test_parse_plain_message() {
        let msg = parse_message("1", PLAIN).unwrap();
        assert_eq!(msg.uid, "1");
        assert_eq!(msg.from.len(), 1);
        assert_eq!(msg.from[0].address, "jane.doe@clientco.com");
        assert_eq!(msg.from[0].name.as_deref(), Some("Jane Doe"));
        assert_eq!(msg.subject.as_deref(), Some("Website Inquiry - Need Quote"));
        assert!(msg.text.as_deref().unwrap().contains("interested in a quote"));
        assert_eq!(msg.html, None);
        assert_eq!(
            msg.date.unwrap().to_rfc3339(),
            "2024-01-04T10:00:00+00:00"
        );
    }

    #[test]
    fn test_parse_html_only_message() {
        let raw = b"From: bob@acme.com\n\
Subject: Hi\n\
Content-Type: text/html; charset=utf-8\n\
\n\
<p>Need <b>pricing</b></p>\n";
        let msg = parse_message("2", raw).unwrap();
        assert_eq!(msg.text, None);
        assert!(msg.html.as_deref().unwrap().contains("<b>pricing</b>"));
        assert_eq!(msg.from[0].name, None);
    }

    #[test]
    fn test_parse_encoded_subject() {
        let raw = b"From: =?UTF-8?B?Sm9zw6kgR2FyY8OtYQ==?= <jose@example.com>\n\
Subject: =?UTF-8?Q?Caf=C3=A9_con_le=C3=B1a?=\n\
\n\
Body\n";
        let msg = parse_message("3", raw).unwrap();
        assert_eq!(msg.subject.as_deref(), Some("Café con leña"));
        assert_eq!(msg.from[0].name.as_deref(), Some("José García"));
    }

    #[test]
    fn test_parse_empty_is_error() {
        assert!(matches!(
            parse_message("4", b"  \r\n"),
            Err(LeadError::Mime(_))
        ));
    }

    #[test]
    fn test_message_id() {
        let msg = parse_message("5", PLAIN).unwrap();
        assert_eq!(msg.message_id.as_deref(), Some("lead001@clientco.com"));
        let bare = parse_message("6", b"From: a@b.com\nSubject: x\n\nbody\n").unwrap();
        assert_eq!(bare.message_id, None);
    }
}
