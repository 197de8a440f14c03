//! Fixed-width binary record codec
//!
//! One layout serves both the wire and the on-disk log. All integers are
//! big-endian, no delimiters, no header, no checksum:
//!
//! - Vote row (22 bytes): `shard:u16 | voter:u64 | candidate:u32 | timestamp:i64`
//! - Resolve request (20 bytes): `target:u16 | shard:u16 | start:i64 | end:i64`
//!
//! Batch bodies are plain concatenations of 22-byte vote rows.

use crate::common::{Error, Result};
use bytes::Bytes;

/// Width of an encoded vote row.
pub const RECORD_LEN: usize = 22;

/// Width of an encoded resolve request.
pub const RESOLVE_LEN: usize = 20;

/// A single accepted vote. Immutable once stored; at most one per
/// `(shard, voter)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteRecord {
    pub shard: u16,
    pub voter: u64,
    pub candidate: u32,
    /// Submission timestamp in milliseconds, assigned by the master.
    pub timestamp: i64,
}

impl VoteRecord {
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[0..2].copy_from_slice(&self.shard.to_be_bytes());
        buf[2..10].copy_from_slice(&self.voter.to_be_bytes());
        buf[10..14].copy_from_slice(&self.candidate.to_be_bytes());
        buf[14..22].copy_from_slice(&self.timestamp.to_be_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != RECORD_LEN {
            return Err(Error::Corrupted(format!(
                "vote record must be {} bytes, got {}",
                RECORD_LEN,
                buf.len()
            )));
        }
        Ok(Self {
            shard: u16::from_be_bytes(buf[0..2].try_into().unwrap()),
            voter: u64::from_be_bytes(buf[2..10].try_into().unwrap()),
            candidate: u32::from_be_bytes(buf[10..14].try_into().unwrap()),
            timestamp: i64::from_be_bytes(buf[14..22].try_into().unwrap()),
        })
    }

    /// Decode a concatenation of vote rows. The body length must be an exact
    /// multiple of the row width.
    pub fn decode_batch(buf: &[u8]) -> Result<Vec<Self>> {
        if buf.len() % RECORD_LEN != 0 {
            return Err(Error::Corrupted(format!(
                "batch body of {} bytes is not a multiple of {}",
                buf.len(),
                RECORD_LEN
            )));
        }
        buf.chunks_exact(RECORD_LEN).map(Self::decode).collect()
    }

    pub fn encode_batch(records: &[Self]) -> Bytes {
        let mut buf = Vec::with_capacity(records.len() * RECORD_LEN);
        for record in records {
            buf.extend_from_slice(&record.encode());
        }
        Bytes::from(buf)
    }
}

/// Anti-entropy request: asks the receiver to forward every record it holds
/// for `shard` inside the `(start, end)` window to worker `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveRequest {
    pub target: u16,
    pub shard: u16,
    pub start: i64,
    pub end: i64,
}

impl ResolveRequest {
    pub fn encode(&self) -> [u8; RESOLVE_LEN] {
        let mut buf = [0u8; RESOLVE_LEN];
        buf[0..2].copy_from_slice(&self.target.to_be_bytes());
        buf[2..4].copy_from_slice(&self.shard.to_be_bytes());
        buf[4..12].copy_from_slice(&self.start.to_be_bytes());
        buf[12..20].copy_from_slice(&self.end.to_be_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != RESOLVE_LEN {
            return Err(Error::Corrupted(format!(
                "resolve request must be {} bytes, got {}",
                RESOLVE_LEN,
                buf.len()
            )));
        }
        Ok(Self {
            target: u16::from_be_bytes(buf[0..2].try_into().unwrap()),
            shard: u16::from_be_bytes(buf[2..4].try_into().unwrap()),
            start: i64::from_be_bytes(buf[4..12].try_into().unwrap()),
            end: i64::from_be_bytes(buf[12..20].try_into().unwrap()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_roundtrip() {
        let record = VoteRecord {
            shard: 3,
            voter: 123_456_789,
            candidate: 2,
            timestamp: 1_700_000_000_123,
        };
        let buf = record.encode();
        assert_eq!(buf.len(), RECORD_LEN);
        assert_eq!(VoteRecord::decode(&buf).unwrap(), record);
    }

    #[test]
    fn test_record_is_big_endian() {
        let record = VoteRecord {
            shard: 1,
            voter: 2,
            candidate: 3,
            timestamp: 4,
        };
        let buf = record.encode();
        assert_eq!(&buf[0..2], &[0, 1]);
        assert_eq!(buf[9], 2);
        assert_eq!(buf[13], 3);
        assert_eq!(buf[21], 4);
    }

    #[test]
    fn test_record_rejects_wrong_length() {
        assert!(VoteRecord::decode(&[0u8; 21]).is_err());
        assert!(VoteRecord::decode(&[0u8; 23]).is_err());
        assert!(VoteRecord::decode(&[]).is_err());
    }

    #[test]
    fn test_batch_roundtrip() {
        let records = vec![
            VoteRecord {
                shard: 0,
                voter: 1,
                candidate: 0,
                timestamp: 10,
            },
            VoteRecord {
                shard: 1,
                voter: 2,
                candidate: 1,
                timestamp: 20,
            },
        ];
        let body = VoteRecord::encode_batch(&records);
        assert_eq!(body.len(), 2 * RECORD_LEN);
        assert_eq!(VoteRecord::decode_batch(&body).unwrap(), records);
    }

    #[test]
    fn test_batch_rejects_ragged_body() {
        let body = vec![0u8; RECORD_LEN + 7];
        assert!(VoteRecord::decode_batch(&body).is_err());
    }

    #[test]
    fn test_empty_batch_is_valid() {
        assert!(VoteRecord::decode_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_roundtrip() {
        let req = ResolveRequest {
            target: 2,
            shard: 1,
            start: -1,
            end: 1_700_000_000_000,
        };
        let buf = req.encode();
        assert_eq!(buf.len(), RESOLVE_LEN);
        assert_eq!(ResolveRequest::decode(&buf).unwrap(), req);
    }
}
