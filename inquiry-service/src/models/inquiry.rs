use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer contact request as persisted in the inquiry collection.
///
/// `id` is absent on the way in (the store assigns it) and always the string
/// form of the store identifier on the way out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inquiry {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub contact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mongodb::bson::{self, Bson};

    fn sample() -> Inquiry {
        Inquiry {
            id: None,
            name: "Jane Doe".to_string(),
            contact: "jane@example.com".to_string(),
            message: None,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn new_inquiry_document_has_no_id_and_bson_timestamp() {
        let doc = bson::to_document(&sample()).unwrap();

        assert!(!doc.contains_key("_id"));
        assert!(!doc.contains_key("message"));
        assert!(matches!(doc.get("timestamp"), Some(Bson::DateTime(_))));
    }

    #[test]
    fn reads_back_stringified_id() {
        let mut doc = bson::to_document(&sample()).unwrap();
        doc.insert("_id", "65f1c0ffee0000000000abcd");

        let inquiry: Inquiry = bson::from_document(doc).unwrap();
        assert_eq!(inquiry.id.as_deref(), Some("65f1c0ffee0000000000abcd"));
        assert_eq!(inquiry.timestamp, sample().timestamp);
    }
}
