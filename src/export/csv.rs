//! Export leads to CSV.
//!
//! Output is UTF-8 with BOM for Excel compatibility.

use std::io::Write;
use std::path::Path;

use crate::error::{LeadError, Result};
use crate::model::lead::Lead;

const HEADER: [&str; 12] = [
    "Id",
    "Received",
    "Name",
    "Email",
    "Company",
    "Phone",
    "Subject",
    "Source",
    "Priority",
    "Status",
    "Tags",
    "Assigned_To",
];

/// Export leads to a CSV file, one row per lead in the given order.
pub fn export_csv(leads: &[&Lead], output_path: &Path, separator: char) -> Result<()> {
    let mut buf = Vec::new();
    write_csv(&mut buf, leads, separator)?;
    std::fs::write(output_path, buf).map_err(|e| LeadError::io(output_path, e))
}

/// Write CSV (with BOM) to any writer.
pub fn write_csv(out: &mut impl Write, leads: &[&Lead], separator: char) -> Result<()> {
    if matches!(separator, '"' | '\n' | '\r') {
        return Err(LeadError::Export(format!(
            "{separator:?} cannot be used as a CSV separator"
        )));
    }
    let sep = separator.to_string();

    // UTF-8 BOM for Excel
    out.write_all(&[0xEF, 0xBB, 0xBF])?;
    writeln!(out, "{}", HEADER.join(&sep))?;

    for lead in leads {
        let fields = [
            lead.id.clone(),
            lead.received_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            lead.name.clone(),
            lead.email.clone(),
            lead.company.clone().unwrap_or_default(),
            lead.phone.clone().unwrap_or_default(),
            lead.subject.clone(),
            lead.source.to_string(),
            lead.priority.to_string(),
            lead.status.to_string(),
            lead.tag_list().join("; "),
            lead.assigned_to.clone().unwrap_or_default(),
        ];
        let row = fields
            .iter()
            .map(|f| csv_escape(f, separator))
            .collect::<Vec<_>>()
            .join(&sep);
        writeln!(out, "{row}")?;
    }

    Ok(())
}

/// Escape a value for CSV (RFC 4180).
///
/// Wraps in double quotes if the value contains the separator, quotes, or newlines.
fn csv_escape(value: &str, separator: char) -> String {
    if value.contains(separator) || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::lead::{LeadPriority, LeadSource, LeadStatus};
    use chrono::{DateTime, Utc};

    fn lead() -> Lead {
        let at: DateTime<Utc> = "2024-01-04T10:00:00Z".parse().unwrap();
        Lead {
            id: "email-7".into(),
            name: "Doe, Jane".into(),
            email: "jane@clientco.com".into(),
            subject: "Say \"hi\"".into(),
            message: "body".into(),
            company: None,
            phone: Some("+213 555 123 456".into()),
            source: LeadSource::Website,
            status: LeadStatus::New,
            priority: LeadPriority::High,
            assigned_to: None,
            tags: Some(vec!["quote".into(), "energy".into()]),
            notes: None,
            received_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_csv_escape_simple() {
        assert_eq!(csv_escape("hello", ','), "hello");
    }

    #[test]
    fn test_csv_escape_comma() {
        assert_eq!(csv_escape("hello, world", ','), "\"hello, world\"");
        assert_eq!(csv_escape("hello, world", ';'), "hello, world");
    }

    #[test]
    fn test_csv_escape_quotes() {
        assert_eq!(csv_escape("say \"hi\"", ','), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_csv_escape_newline() {
        assert_eq!(csv_escape("line1\nline2", ','), "\"line1\nline2\"");
    }

    #[test]
    fn test_write_csv_rows() {
        let l = lead();
        let mut buf = Vec::new();
        write_csv(&mut buf, &[&l], ',').unwrap();
        assert!(buf.starts_with(&[0xEF, 0xBB, 0xBF]));
        let text = String::from_utf8(buf[3..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Id,Received,Name,Email,Company,Phone,Subject,Source,Priority,Status,Tags,Assigned_To"
        );
        assert_eq!(
            lines.next().unwrap(),
            "email-7,2024-01-04 10:00:00,\"Doe, Jane\",jane@clientco.com,,+213 555 123 456,\
             \"Say \"\"hi\"\"\",website,high,new,quote; energy,"
        );
    }

    #[test]
    fn test_rejects_quote_separator() {
        let mut buf = Vec::new();
        assert!(matches!(
            write_csv(&mut buf, &[], '"'),
            Err(LeadError::Export(_))
        ));
    }
}
