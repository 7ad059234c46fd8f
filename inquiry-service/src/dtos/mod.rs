pub mod health;
pub mod inquiries;

pub use health::HealthResponse;
pub use inquiries::{
    CreateInquiryResponse, InquiryResponse, ListInquiriesQuery, ListInquiriesResponse,
};
