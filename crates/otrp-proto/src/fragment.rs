//! Splits outbound frames that exceed a size budget and reassembles
//! inbound fragments keyed by sender tag.
//!
//! Fragment wire format: `?OTRP|<sender-tag>|<from-tag>|<to-tag>,<k>,<n>,<piece>,`
//! The sender tag is rendered as a plain decimal u32 (fresh per outbound
//! batch); the instance tags are rendered as zero-padded 8-digit uppercase
//! hex on output, and parsed case-insensitively on input.

use std::collections::HashMap;

use otrp_crypto::rand::WithRandom;

use crate::error::ProtoError;

pub const PREFIX: &str = "?OTRP|";

/// Digit width the reference fragmentor reserves for `k` and `n` when
/// sizing pieces, independent of how many digits the final count renders
/// as. Five digits covers any fragment count this protocol produces.
const RESERVED_COUNT_DIGITS: usize = 5;

struct Reassembly {
    n: u32,
    from_tag: u32,
    to_tag: u32,
    pieces: HashMap<u32, String>,
    touched_at: u64,
}

/// Per-peer fragment reassembly table and outbound splitter.
#[derive(Default)]
pub struct Fragmentor {
    pending: HashMap<(String, u32), Reassembly>,
}

struct ParsedFragment {
    sender_tag: u32,
    from_tag: u32,
    to_tag: u32,
    k: u32,
    n: u32,
    piece: String,
}

fn parse_fragment(frame: &str) -> Option<ParsedFragment> {
    let rest = frame.strip_prefix(PREFIX)?;
    let rest = rest.strip_suffix(',')?;
    let mut bar = rest.splitn(2, ',');
    let header = bar.next()?;
    let body = bar.next()?;

    let mut tags = header.splitn(3, '|');
    let sender_tag: u32 = tags.next()?.parse().ok()?;
    let from_tag = u32::from_str_radix(tags.next()?, 16).ok()?;
    let to_tag = u32::from_str_radix(tags.next()?, 16).ok()?;

    let mut parts = body.splitn(3, ',');
    let k: u32 = parts.next()?.parse().ok()?;
    let n: u32 = parts.next()?.parse().ok()?;
    let piece = parts.next()?.to_string();

    Some(ParsedFragment {
        sender_tag,
        from_tag,
        to_tag,
        k,
        n,
        piece,
    })
}

impl Fragmentor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one inbound frame (already known to carry the `?OTRP|`
    /// prefix) into the reassembly table for `peer`. Returns the
    /// completed body once every piece `1..=n` has arrived, or `None`
    /// if the reassembly is still incomplete.
    pub fn reassemble(
        &mut self,
        peer: &str,
        frame: &str,
        now: u64,
    ) -> Result<Option<Vec<u8>>, ProtoError> {
        let parsed = parse_fragment(frame).ok_or(ProtoError::InvalidFragmentationParse)?;
        if parsed.k == 0 || parsed.n == 0 || parsed.k > parsed.n {
            return Err(ProtoError::InvalidFragmentationParse);
        }

        let key = (peer.to_string(), parsed.sender_tag);
        let entry = self.pending.entry(key.clone()).or_insert_with(|| Reassembly {
            n: parsed.n,
            from_tag: parsed.from_tag,
            to_tag: parsed.to_tag,
            pieces: HashMap::new(),
            touched_at: now,
        });

        if entry.n != parsed.n || entry.from_tag != parsed.from_tag || entry.to_tag != parsed.to_tag {
            self.pending.remove(&key);
            return Err(ProtoError::InvalidFragmentationParse);
        }
        if entry.pieces.contains_key(&parsed.k) {
            self.pending.remove(&key);
            return Err(ProtoError::InvalidFragmentationParse);
        }

        entry.touched_at = now;
        entry.pieces.insert(parsed.k, parsed.piece);

        if entry.pieces.len() as u32 == entry.n {
            let entry = self.pending.remove(&key).unwrap();
            let mut whole = String::new();
            for i in 1..=entry.n {
                whole.push_str(&entry.pieces[&i]);
            }
            return Ok(Some(whole.into_bytes()));
        }
        Ok(None)
    }

    /// Drops any reassembly that hasn't been touched in over
    /// `timeout_secs` seconds.
    pub fn evict_stale(&mut self, now: u64, timeout_secs: u64) {
        self.pending
            .retain(|_, r| now.saturating_sub(r.touched_at) <= timeout_secs);
    }
}

/// Splits `whole` (an already base64+`.`-framed string) into one or more
/// `?OTRP|` pieces, each no longer than `frag_len`. Returns `whole`
/// unmodified as the sole element when `frag_len == 0` or the string
/// already fits.
pub fn split(
    source: &dyn WithRandom,
    frag_len: usize,
    from_tag: u32,
    to_tag: u32,
    whole: &str,
) -> Result<Vec<String>, ProtoError> {
    if frag_len == 0 || whole.len() <= frag_len {
        return Ok(vec![whole.to_string()]);
    }

    let mut sender_buf = [0u8; 4];
    otrp_crypto::rand::random_into(source, &mut sender_buf)
        .map_err(|_| ProtoError::InvalidFragmentationParse)?;
    let sender_tag = u32::from_be_bytes(sender_buf);

    let header_fixed = PREFIX.len() + sender_tag.to_string().len() + 1 + 8 + 1 + 8 + 1;

    // The reference implementation sizes pieces against a fixed 5-digit
    // reservation for k and n, regardless of how many digits the final
    // count actually renders as. Matching that reservation here (rather
    // than iterating to the tightest-fitting width) reproduces its
    // fragment count and piece boundaries exactly.
    let overhead_estimate = header_fixed + RESERVED_COUNT_DIGITS + 1 + RESERVED_COUNT_DIGITS + 1 + 1;
    if overhead_estimate >= frag_len {
        return Err(ProtoError::InvalidFragmentationParse);
    }
    let piece_len = frag_len - overhead_estimate;
    let n = whole.len().div_ceil(piece_len);

    let bytes = whole.as_bytes();
    let mut out = Vec::with_capacity(n);
    for k in 1..=n {
        let start = (k - 1) * piece_len;
        let end = (start + piece_len).min(bytes.len());
        let piece = std::str::from_utf8(&bytes[start..end]).unwrap_or_default();
        out.push(format!(
            "{PREFIX}{sender_tag}|{from_tag:08X}|{to_tag:08X},{k},{n},{piece},"
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use otrp_crypto::rand::SystemRandom;

    #[test]
    fn unfragmented_when_body_fits() {
        let r = split(&SystemRandom, 0, 0xDEAD, 0xBEEF, "aGk=.").unwrap();
        assert_eq!(r, vec!["aGk=.".to_string()]);
    }

    #[test]
    fn fragments_the_reference_fixture_into_six_pinned_pieces() {
        use otrp_crypto::rand::FixtureRandom;

        let source = FixtureRandom::new(vec![0xAB, 0xCD, 0xAB, 0xCD]);
        let whole = "dGhpcyBpcyBvdXIgZmFuY3kgcmV0dXJu.";
        let pieces = split(&source, 54, 0x0000_DEAD, 0x0000_BEEF, whole).unwrap();

        assert_eq!(
            pieces,
            vec![
                "?OTRP|2882382797|0000DEAD|0000BEEF,1,6,dGhpcy,".to_string(),
                "?OTRP|2882382797|0000DEAD|0000BEEF,2,6,BpcyBv,".to_string(),
                "?OTRP|2882382797|0000DEAD|0000BEEF,3,6,dXIgZm,".to_string(),
                "?OTRP|2882382797|0000DEAD|0000BEEF,4,6,FuY3kg,".to_string(),
                "?OTRP|2882382797|0000DEAD|0000BEEF,5,6,cmV0dX,".to_string(),
                "?OTRP|2882382797|0000DEAD|0000BEEF,6,6,Ju.,".to_string(),
            ]
        );
    }

    #[test]
    fn splits_and_reassembles_round_trip() {
        let whole = "dGhpcyBpcyBvdXIgZmFuY3kgcmV0dXJu.";
        let pieces = split(&SystemRandom, 60, 0xDEAD, 0xBEEF, whole).unwrap();
        assert!(pieces.len() > 1);

        let mut f = Fragmentor::new();
        let mut last = None;
        for p in &pieces {
            last = f.reassemble("alice", p, 0).unwrap();
        }
        assert_eq!(last.unwrap(), whole.as_bytes());
    }

    #[test]
    fn rejects_k_greater_than_n() {
        let mut f = Fragmentor::new();
        let r = f.reassemble("alice", "?OTRP|1234|BEEF|CADE,3,2,aGksIHRoaXMgaXMgbm90IGEg,", 0);
        assert_eq!(r, Err(ProtoError::InvalidFragmentationParse));
    }

    #[test]
    fn reassembles_out_of_order_fragments() {
        let mut f = Fragmentor::new();
        let r1 = f
            .reassemble(
                "myname",
                "?OTRP|1234|BEEF|CADE,2,2,dmFsaWQgb3RyNCBtZXNzYWdlLCBidXQgc3RpbGwuLi4=.,",
                0,
            )
            .unwrap();
        assert!(r1.is_none());

        let r2 = f
            .reassemble(
                "myname",
                "?OTRP|1234|BEEF|CADE,1,2,aGksIHRoaXMgaXMgbm90IGEg,",
                0,
            )
            .unwrap();
        assert!(r2.is_some());
    }

    #[test]
    fn duplicate_k_is_rejected() {
        let mut f = Fragmentor::new();
        let frame = "?OTRP|1234|BEEF|CADE,1,2,aGksIHRoaXMgaXMgbm90IGEg,";
        f.reassemble("myname", frame, 0).unwrap();
        let r = f.reassemble("myname", frame, 0);
        assert_eq!(r, Err(ProtoError::InvalidFragmentationParse));
    }

    #[test]
    fn stale_reassembly_is_evicted() {
        let mut f = Fragmentor::new();
        f.reassemble(
            "myname",
            "?OTRP|1234|BEEF|CADE,1,2,aGksIHRoaXMgaXMgbm90IGEg,",
            0,
        )
        .unwrap();
        f.evict_stale(1000, 60);
        assert!(f.pending.is_empty());
    }
}
