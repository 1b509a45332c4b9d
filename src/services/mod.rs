//! Outbound integrations and the post-payment workflow. Email, storage and
//! event failures never fail the parent request on their own.

pub mod email;
pub mod events;
pub mod fulfilment;
pub mod storage;
