pub mod dump;
pub mod error;
pub mod export;
pub mod imap;
pub mod known;
pub mod retry;
pub mod run;
pub mod source;

pub use error::{Result, SyncError};
