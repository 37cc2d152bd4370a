//! otrp_wire — the binary wire codec shared by every protocol message
//! type in the OTRv4 prekey server: fixed-width big-endian integers,
//! length-prefixed byte strings, MPIs, Unix timestamps, and the
//! fixed-size Ed448 scalar/point encodings.
//!
//! There is no self-describing schema; every composite type encodes and
//! decodes its fields in a fixed order using the primitives in
//! [`codec`].

pub mod codec;
pub mod error;

pub use codec::{Decoder, Encoder, POINT_LEN, SCALAR_LEN};
pub use error::WireError;
