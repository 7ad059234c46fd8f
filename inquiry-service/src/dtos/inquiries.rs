use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Inquiry;

pub const DEFAULT_LIST_LIMIT: i64 = 20;
pub const MAX_LIST_LIMIT: i64 = 1000;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateInquiryResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListInquiriesQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIST_LIMIT
}

/// Inquiry as rendered to clients: string id, ISO 8601 timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InquiryResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub contact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<Inquiry> for InquiryResponse {
    fn from(inquiry: Inquiry) -> Self {
        Self {
            id: inquiry.id.unwrap_or_default(),
            name: inquiry.name,
            contact: inquiry.contact,
            message: inquiry.message,
            timestamp: inquiry.timestamp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListInquiriesResponse {
    pub items: Vec<InquiryResponse>,
}
