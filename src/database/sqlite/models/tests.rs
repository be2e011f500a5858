use super::*;
use chrono::Utc;

#[test]
fn new_document_from_jsonl_line() {
    let parsed: NewDocument =
        serde_json::from_str(r#"{"title": "Amboise", "text": "Amboise is a commune in France."}"#)
            .expect("should parse line");
    assert_eq!(parsed.title, "Amboise");
    assert_eq!(parsed.text, "Amboise is a commune in France.");
}

#[test]
fn wikipedia_dump_fields_are_ignored() {
    let parsed: NewDocument = serde_json::from_str(
        r#"{"id": "12", "url": "https://en.wikipedia.org/wiki/Anarchism", "title": "Anarchism", "text": "Anarchism is a political philosophy."}"#,
    )
    .expect("should parse line");
    assert_eq!(
        parsed,
        NewDocument {
            title: "Anarchism".to_string(),
            text: "Anarchism is a political philosophy.".to_string(),
        }
    );
}

#[test]
fn new_document_requires_title_and_text() {
    let missing_text: Result<NewDocument, _> = serde_json::from_str(r#"{"title": "Only"}"#);
    assert!(missing_text.is_err());
}

#[test]
fn document_converts_to_record() {
    let document = Document {
        id: 3,
        title: "Rivers".to_string(),
        text: "Rivers provide water.".to_string(),
        imported_date: Utc::now().naive_utc(),
    };

    let record = DocumentRecord::from(document);
    assert_eq!(record.id, 3);
    assert_eq!(record.title, "Rivers");
    assert_eq!(record.text, "Rivers provide water.");
}
