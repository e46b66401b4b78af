//! IPS patch records
use crate::error::{Error, Result};
use crate::ext::io::*;
use std::io::Write;

pub const IPS_MAGIC: &[u8; 5] = b"PATCH";
pub const IPS_EOF: &[u8; 3] = b"EOF";
/// Largest offset a 24-bit record can address.
pub const MAX_OFFSET: u32 = 0xFF_FFFF;
/// An offset equal to `"EOF"` would be read back as the end marker.
const EOF_OFFSET: u32 = 0x45_4F46;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A single byte-range replacement
pub struct PatchRecord {
    offset: u32,
    data: Vec<u8>,
}

impl PatchRecord {
    pub fn new(offset: u64, data: Vec<u8>) -> Result<Self> {
        if offset > MAX_OFFSET as u64 || offset == EOF_OFFSET as u64 {
            return Err(Error::OffsetOutOfRange(offset));
        }
        if data.len() > u16::MAX as usize {
            return Err(Error::PayloadTooLarge(data.len()));
        }
        Ok(Self {
            offset: offset as u32,
            data,
        })
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Writes a complete patch file containing only this record.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(IPS_MAGIC)?;
        writer.write_u24_be(self.offset)?;
        writer.write_u16_be(self.data.len() as u16)?;
        writer.write_all(&self.data)?;
        writer.write_all(IPS_EOF)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(IPS_MAGIC.len() + 5 + self.data.len() + IPS_EOF.len());
        self.write_to(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize() {
        let record = PatchRecord::new(0x001234, vec![0xE0, 0x03, 0x1F, 0x2A]).unwrap();
        assert_eq!(
            record.to_bytes().unwrap(),
            [
                0x50, 0x41, 0x54, 0x43, 0x48, 0x00, 0x12, 0x34, 0x00, 0x04, 0xE0, 0x03, 0x1F, 0x2A,
                0x45, 0x4F, 0x46
            ]
        );
    }

    #[test]
    fn test_empty_payload() {
        let record = PatchRecord::new(0, Vec::new()).unwrap();
        assert_eq!(record.to_bytes().unwrap(), b"PATCH\0\0\0\0\0EOF");
    }

    #[test]
    fn test_offset_range() {
        assert!(PatchRecord::new(MAX_OFFSET as u64, vec![0]).is_ok());
        assert!(matches!(
            PatchRecord::new(1 << 24, vec![0]),
            Err(Error::OffsetOutOfRange(0x100_0000))
        ));
        assert!(matches!(
            PatchRecord::new(0x454F46, vec![0]),
            Err(Error::OffsetOutOfRange(_))
        ));
    }

    #[test]
    fn test_payload_too_large() {
        assert!(PatchRecord::new(0, vec![0; 0xFFFF]).is_ok());
        assert!(matches!(
            PatchRecord::new(0, vec![0; 0x10000]),
            Err(Error::PayloadTooLarge(0x10000))
        ));
    }
}
