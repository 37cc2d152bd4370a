//! Base64 + punctuation framing around protocol frames.
//!
//! Outbound: `base64(body) ‖ "."`. Inbound: the trailing `.` is
//! mandatory, the body is stripped of it and base64-decoded.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::ProtoError;

/// Frames a complete (unfragmented) body for the wire.
pub fn frame_whole(body: &[u8]) -> String {
    let mut out = STANDARD.encode(body);
    out.push('.');
    out
}

/// Strips the trailing `.` and base64-decodes the body.
///
/// Returns `EmptyMessage` for an empty input, `MalformedFrame` if the
/// terminating `.` is missing, and `CorruptedBase64` if the stripped
/// body doesn't decode.
pub fn deframe(input: &str) -> Result<Vec<u8>, ProtoError> {
    if input.is_empty() {
        return Err(ProtoError::EmptyMessage);
    }
    let body = input.strip_suffix('.').ok_or(ProtoError::MalformedFrame)?;
    STANDARD.decode(body).map_err(|_| ProtoError::CorruptedBase64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty_message() {
        assert_eq!(deframe(""), Err(ProtoError::EmptyMessage));
    }

    #[test]
    fn missing_terminator_is_malformed_frame() {
        let r = deframe("aGk=");
        assert_eq!(r, Err(ProtoError::MalformedFrame));
    }

    #[test]
    fn corrupted_base64_body_is_corrupted_base64() {
        // missing the trailing "=" padding character of the valid message below.
        let r = deframe("aGksIHRoaXMgaXMgbm90IGEgdmFsaWQgb3RyNCBtZXNzYWdlLCBidXQgc3RpbGwuLi4.");
        assert_eq!(r, Err(ProtoError::CorruptedBase64));
    }

    #[test]
    fn round_trips_a_plain_body() {
        let body = b"hi, this is not a valid otr4 message, but still...";
        let framed = frame_whole(body);
        assert_eq!(deframe(&framed).unwrap(), body);
    }

    #[test]
    fn decodes_a_known_framed_message() {
        let framed = "aGksIHRoaXMgaXMgbm90IGEgdmFsaWQgb3RyNCBtZXNzYWdlLCBidXQgc3RpbGwuLi4=.";
        let decoded = deframe(framed).unwrap();
        assert_eq!(
            decoded,
            b"hi, this is not a valid otr4 message, but still...".to_vec()
        );
    }
}
