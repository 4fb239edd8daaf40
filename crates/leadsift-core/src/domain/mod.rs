pub mod address;
pub mod category;
pub mod contact;
pub mod message;

pub use address::{
    company_from_domain, normalize_email, parse_address, split_address_list, ParsedAddress,
};
pub use category::Category;
pub use contact::{AggregatedContact, Direction, MAX_SUBJECT_CHARS};
pub use message::MessageObservation;
