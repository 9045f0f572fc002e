//! Protocol encoding and decoding.
//!
//! Each protocol follows a layered structure:
//! - `layout`: byte offsets and ranges (source of truth)
//! - `reader`: safe byte access and protocol conventions
//! - `writer`: the encode-side mirror of `reader`
//! - `parser`: domain-level decoding (no direct byte indexing)
//! - `error`: explicit, actionable errors
//!
//! Codecs are pure and contain no I/O; the node owns the transport.

pub mod artnet;
