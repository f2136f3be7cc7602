//! CAB - a CSP-style pair of Channel And ring Buffer funneled into a single
//! consumer thread.
//!
//! Any number of producer threads claim and fill ring entries, any number of
//! sender threads post control messages to the single-slot channel, and
//! exactly one consumer thread drains both streams one item at a time. The
//! resulting flow of entries and messages is linearized, which makes the
//! structure a building block for event loops and single-threaded state
//! machines that must never be re-entered concurrently.
//!
//! Pending messages always win over ring entries: whenever the channel slot
//! is occupied at the moment the consumer asks for its next item, the
//! message is delivered first.

// Module naming follows project convention (CAB = Channel And Buffer)
#[allow(non_snake_case)]
pub mod CAB;
#[allow(non_snake_case)]
pub mod Core;
