//! Big-endian primitive encodings shared by every wire type in this
//! protocol: fixed-width integers, length-prefixed byte strings, MPIs,
//! Unix timestamps, and the fixed-size Ed448 scalar/point encodings.
//!
//! `Decoder` walks a borrowed buffer with a cursor; every read either
//! succeeds or returns `WireError::MalformedInput` when the declared
//! length would run past the end of the buffer — there is no partial
//! read.

use crate::error::WireError;

pub const SCALAR_LEN: usize = 56;
pub const POINT_LEN: usize = 57;

pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Decoder { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if n > self.remaining() {
            return Err(WireError::MalformedInput);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, WireError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, WireError> {
        let b = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_be_bytes(arr))
    }

    pub fn read_time(&mut self) -> Result<u64, WireError> {
        self.read_u64()
    }

    pub fn read_data(&mut self) -> Result<Vec<u8>, WireError> {
        let len = self.read_u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    /// Minimal big-endian unsigned integer, length-prefixed. No leading
    /// zero byte (the zero value itself is the empty byte string).
    pub fn read_mpi(&mut self) -> Result<Vec<u8>, WireError> {
        let bytes = self.read_data()?;
        if bytes.first() == Some(&0) {
            return Err(WireError::MalformedInput);
        }
        Ok(bytes)
    }

    pub fn read_scalar(&mut self) -> Result<[u8; SCALAR_LEN], WireError> {
        let b = self.take(SCALAR_LEN)?;
        let mut arr = [0u8; SCALAR_LEN];
        arr.copy_from_slice(b);
        Ok(arr)
    }

    pub fn read_point(&mut self) -> Result<[u8; POINT_LEN], WireError> {
        let b = self.take(POINT_LEN)?;
        let mut arr = [0u8; POINT_LEN];
        arr.copy_from_slice(b);
        Ok(arr)
    }
}

#[derive(Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn write_u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn write_u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn write_u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn write_time(&mut self, v: u64) -> &mut Self {
        self.write_u64(v)
    }

    pub fn write_data(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_u32(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Encodes `bytes` as a minimal big-endian MPI, stripping any
    /// leading zero bytes first.
    pub fn write_mpi(&mut self, bytes: &[u8]) -> &mut Self {
        let mut start = 0;
        while start < bytes.len() && bytes[start] == 0 {
            start += 1;
        }
        self.write_data(&bytes[start..])
    }

    pub fn write_scalar(&mut self, bytes: &[u8; SCALAR_LEN]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn write_point(&mut self, bytes: &[u8; POINT_LEN]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn data_round_trips_for_any_byte_string(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
            let mut e = Encoder::new();
            e.write_data(&bytes);
            let encoded = e.into_bytes();
            let mut d = Decoder::new(&encoded);
            prop_assert_eq!(d.read_data().unwrap(), bytes);
            prop_assert!(d.is_empty());
        }

        #[test]
        fn mpi_round_trips_with_leading_zeros_stripped(mut bytes in prop::collection::vec(any::<u8>(), 1..64)) {
            let mut e = Encoder::new();
            e.write_mpi(&bytes);
            let encoded = e.into_bytes();
            let mut d = Decoder::new(&encoded);
            let decoded = d.read_mpi().unwrap();

            while bytes.first() == Some(&0) {
                bytes.remove(0);
            }
            prop_assert_eq!(decoded, bytes);
        }
    }
}
