//! Segment extraction, LZ4 decompression and SHA-256 verification
use super::header::NsoHeader;
use crate::error::{Error, Result};
use crate::ext::io::*;
use crate::types::Segment;
use sha2::{Digest, Sha256};
use std::io::{Read, Seek, SeekFrom};

#[derive(Debug, Clone)]
/// The decompressed contents of one segment
pub struct RecoveredSegment {
    pub segment: Segment,
    data: Vec<u8>,
    verified: bool,
}

impl RecoveredSegment {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Whether the segment's digest was present and matched.
    pub fn is_verified(&self) -> bool {
        self.verified
    }
}

/// Reads `seg` from `reader`, decompressing and verifying it as the header's flags demand.
pub fn recover_segment<R: Read + Seek>(
    header: &NsoHeader,
    seg: Segment,
    mut reader: R,
) -> Result<RecoveredSegment> {
    let desc = header.segment(seg);
    let compressed = header.is_compressed(seg);
    let stored_size = if compressed {
        header.compressed_size(seg)
    } else {
        desc.size
    };
    log::debug!(
        "Reading {} segment at {:#x}, {} bytes on disk, {} bytes in memory",
        seg,
        desc.file_offset,
        stored_size,
        desc.size
    );
    reader.seek(SeekFrom::Start(desc.file_offset as u64))?;
    let raw = reader.read_exact_vec(stored_size as usize)?;
    let data = if compressed {
        decompress(seg, &raw, desc.size as usize)?
    } else {
        raw
    };
    let verified = if header.is_hashed(seg) {
        let hash: [u8; 32] = Sha256::digest(&data).into();
        if &hash != header.digest(seg) {
            return Err(Error::Integrity { segment: seg });
        }
        log::debug!("{} segment digest verified", seg);
        true
    } else {
        false
    };
    Ok(RecoveredSegment {
        segment: seg,
        data,
        verified,
    })
}

fn decompress(seg: Segment, raw: &[u8], size: usize) -> Result<Vec<u8>> {
    let expected = i32::try_from(size).map_err(|_| Error::Decompression {
        segment: seg,
        reason: format!("declared size {} is too large", size),
    })?;
    let data = lz4::block::decompress(raw, Some(expected)).map_err(|e| Error::Decompression {
        segment: seg,
        reason: e.to_string(),
    })?;
    if data.len() != size {
        return Err(Error::Decompression {
            segment: seg,
            reason: format!("expected {} bytes, got {}", size, data.len()),
        });
    }
    Ok(data)
}
