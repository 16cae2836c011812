//! Outbound HTTP clients for the third-party services this library
//! delegates to: the storage accounts holding PDF payloads and the
//! transactional email relay.

pub mod email;
pub mod imagekit;
