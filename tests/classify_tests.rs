//! Integration tests: MBOX/EML input through parsing and classification.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use leadsift::classify::{classify, classify_at};
use leadsift::classify::rules::SYSTEM_SENDER_MARKERS;
use leadsift::inbox::local::{local_uid, scan_path};
use leadsift::model::lead::{Lead, LeadPriority, LeadSource, LeadStatus};
use leadsift::model::message::ParsedEmailMessage;
use leadsift::parser::eml::read_eml;
use leadsift::parser::mbox::MboxParser;
use leadsift::parser::message::parse_message;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn clock() -> DateTime<Utc> {
    "2024-05-02T08:00:00Z".parse().unwrap()
}

fn by_email<'a>(leads: &'a [Lead], email: &str) -> &'a Lead {
    leads
        .iter()
        .find(|l| l.email == email)
        .unwrap_or_else(|| panic!("no lead for {email}"))
}

// ─── MBOX splitting ─────────────────────────────────────────────────

#[test]
fn test_leads_mbox_message_count() {
    let parser = MboxParser::new(fixture("leads.mbox")).unwrap();
    let mut count: u64 = 0;
    parser
        .parse(
            &mut |_offset, _bytes| {
                count += 1;
                true
            },
            None,
        )
        .unwrap();
    assert_eq!(count, 6, "leads.mbox should contain exactly 6 messages");
}

#[test]
fn test_escaped_from_stays_in_body() {
    let parser = MboxParser::new(fixture("leads.mbox")).unwrap();
    let mut bodies = Vec::new();
    parser
        .parse(
            &mut |_offset, bytes| {
                bodies.push(String::from_utf8_lossy(bytes).into_owned());
                true
            },
            None,
        )
        .unwrap();
    assert!(bodies[2].contains(">From our side this is urgent"));
}

#[test]
fn test_empty_mbox() {
    let parser = MboxParser::new(fixture("empty.mbox")).unwrap();
    let count = parser.parse(&mut |_, _| true, None).unwrap();
    assert_eq!(count, 0);

    let report = scan_path(&fixture("empty.mbox"), None).unwrap();
    assert_eq!(report.total, 0);
    assert!(report.leads.is_empty());
}

// ─── Scanning a mixed archive ───────────────────────────────────────

#[test]
fn test_scan_counts_and_order() {
    let report = scan_path(&fixture("leads.mbox"), None).unwrap();
    assert_eq!(report.total, 6);
    assert_eq!(report.filtered, 2, "noreply and MAILER-DAEMON are not leads");
    assert_eq!(report.failed, 0);

    let emails: Vec<&str> = report.leads.iter().map(|l| l.email.as_str()).collect();
    assert_eq!(
        emails,
        [
            "bob@acme.com",
            "omar@client.dz",
            "jane.doe@clientco.com",
            "jose@constructora.es"
        ]
    );
    assert!(report.leads.iter().all(|l| l.status == LeadStatus::New));
}

#[test]
fn test_website_quote_lead() {
    let report = scan_path(&fixture("leads.mbox"), None).unwrap();
    let jane = by_email(&report.leads, "jane.doe@clientco.com");

    assert_eq!(jane.name, "Jane Doe");
    assert_eq!(jane.subject, "Website Inquiry - Need Quote");
    assert_eq!(jane.source, LeadSource::Website);
    assert_eq!(jane.priority, LeadPriority::Medium);
    assert_eq!(jane.company.as_deref(), Some("Sahara Solar Ltd"));
    assert_eq!(jane.phone.as_deref(), Some("+213 555 123 456"));
    assert_eq!(jane.tag_list(), ["energy", "quote"]);
    assert_eq!(jane.received_at.to_rfc3339(), "2024-01-04T10:00:00+00:00");
    assert_eq!(
        jane.id,
        Lead::id_for_uid(&local_uid(Some("lead001@clientco.com"), b""))
    );
}

#[test]
fn test_referral_urgent_lead() {
    let report = scan_path(&fixture("leads.mbox"), None).unwrap();
    let bob = by_email(&report.leads, "bob@acme.com");

    assert_eq!(bob.name, "bob");
    assert_eq!(bob.source, LeadSource::Referral);
    assert_eq!(bob.priority, LeadPriority::High);
    assert_eq!(bob.tag_list(), ["telecom", "support"]);
    assert_eq!(bob.phone, None);
}

#[test]
fn test_html_only_lead() {
    let report = scan_path(&fixture("leads.mbox"), None).unwrap();
    let omar = by_email(&report.leads, "omar@client.dz");

    assert_eq!(omar.message, "Please send pricing for a 2 MW solar plant.");
    assert_eq!(omar.source, LeadSource::Direct);
    assert_eq!(omar.priority, LeadPriority::Low);
    assert_eq!(omar.tag_list(), ["energy", "quote"]);
}

#[test]
fn test_encoded_words_lead() {
    let report = scan_path(&fixture("leads.mbox"), None).unwrap();
    let jose = by_email(&report.leads, "jose@constructora.es");

    assert_eq!(jose.name, "José García");
    assert_eq!(jose.subject, "Consultation meeting");
    assert_eq!(jose.priority, LeadPriority::Medium);
    assert_eq!(jose.tag_list(), ["partnership", "consultation"]);
}

#[test]
fn test_eml_and_mbox_share_lead_id() {
    let raw = read_eml(fixture("single.eml")).unwrap();
    let mut msg = parse_message("placeholder", &raw).unwrap();
    msg.uid = local_uid(msg.message_id.as_deref(), &raw);
    let from_eml = classify(&msg).expect("lead");

    let report = scan_path(&fixture("leads.mbox"), None).unwrap();
    let from_mbox = by_email(&report.leads, "jane.doe@clientco.com");
    assert_eq!(from_eml.id, from_mbox.id);
}

// ─── Classifier properties ──────────────────────────────────────────

#[test]
fn test_system_markers_are_case_insensitive() {
    for marker in SYSTEM_SENDER_MARKERS {
        let msg = ParsedEmailMessage::new("1", &format!("{}@Example.COM", marker.to_uppercase()))
            .with_text("Please send a quote");
        assert!(
            classify_at(&msg, clock()).is_none(),
            "{marker} sender should be filtered"
        );
    }
}

#[test]
fn test_high_priority_wins_over_medium() {
    let msg = ParsedEmailMessage::new("2", "client@acme.com")
        .with_subject("Quote")
        .with_text("We need a proposal and a budget ASAP.");
    let lead = classify_at(&msg, clock()).expect("lead");
    assert_eq!(lead.priority, LeadPriority::High);
}

#[test]
fn test_tags_are_independent_and_unique() {
    let msg = ParsedEmailMessage::new("3", "client@acme.com")
        .with_subject("Pricing and price list")
        .with_text("Quote the cost and budget for our solar power network.");
    let lead = classify_at(&msg, clock()).expect("lead");
    assert_eq!(lead.tag_list(), ["telecom", "energy", "quote"]);
}

#[test]
fn test_same_input_same_lead() {
    let raw = read_eml(fixture("single.eml")).unwrap();
    let msg = parse_message("9", &raw).unwrap();
    assert_eq!(classify_at(&msg, clock()), classify_at(&msg, clock()));
}
