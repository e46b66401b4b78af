//! NSO container header
use crate::error::{Error, Result};
use crate::ext::io::*;
use crate::types::Segment;
use crate::utils::struct_pack::*;
use nso_patch_macro::{StructPack, StructUnpack};
use std::io::{Read, Seek, Write};

/// `"NSO0"` read as a little-endian u32.
pub const NSO_MAGIC: u32 = 0x304F_534E;
/// Size of [NsoHeader] on disk.
pub const NSO_HEADER_SIZE: usize = 0x100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, StructPack, StructUnpack)]
/// Location of a segment in the file and in memory
pub struct SegmentHeader {
    pub file_offset: u32,
    pub memory_offset: u32,
    /// Decompressed size
    pub size: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, StructPack, StructUnpack)]
/// A region inside another segment
pub struct SegmentHeaderRelative {
    pub offset: u32,
    pub size: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, StructPack, StructUnpack)]
pub struct NsoHeader {
    pub magic: u32,
    pub version: u32,
    pub reserved1: u32,
    pub flags: u32,
    pub text: SegmentHeader,
    pub module_name_offset: u32,
    pub rodata: SegmentHeader,
    pub module_name_size: u32,
    pub data: SegmentHeader,
    pub bss_size: u32,
    pub build_id: [u8; 0x20],
    pub text_compressed_size: u32,
    pub rodata_compressed_size: u32,
    pub data_compressed_size: u32,
    pub reserved2: [u8; 0x1c],
    pub api_info: SegmentHeaderRelative,
    pub dynstr_info: SegmentHeaderRelative,
    pub dynsym_info: SegmentHeaderRelative,
    pub text_hash: [u8; 0x20],
    pub rodata_hash: [u8; 0x20],
    pub data_hash: [u8; 0x20],
}

impl Default for NsoHeader {
    fn default() -> Self {
        Self {
            magic: NSO_MAGIC,
            version: 0,
            reserved1: 0,
            flags: 0,
            text: SegmentHeader::default(),
            module_name_offset: 0,
            rodata: SegmentHeader::default(),
            module_name_size: 0,
            data: SegmentHeader::default(),
            bss_size: 0,
            build_id: [0; 0x20],
            text_compressed_size: 0,
            rodata_compressed_size: 0,
            data_compressed_size: 0,
            reserved2: [0; 0x1c],
            api_info: SegmentHeaderRelative::default(),
            dynstr_info: SegmentHeaderRelative::default(),
            dynsym_info: SegmentHeaderRelative::default(),
            text_hash: [0; 0x20],
            rodata_hash: [0; 0x20],
            data_hash: [0; 0x20],
        }
    }
}

impl NsoHeader {
    /// Reads and validates the header from the start of `reader`.
    ///
    /// The whole header is read before any field is decoded, so a short
    /// source is reported as a malformed header rather than a bare I/O error.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = [0u8; NSO_HEADER_SIZE];
        reader.read_exact(&mut buf).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::MalformedHeader(format!(
                "file is shorter than the {:#x}-byte header",
                NSO_HEADER_SIZE
            )),
            _ => Error::Io(e),
        })?;
        Self::parse(&buf)
    }

    /// Decodes a header from a buffer of at least [NSO_HEADER_SIZE] bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < NSO_HEADER_SIZE {
            return Err(Error::MalformedHeader(format!(
                "expected {} bytes, got {}",
                NSO_HEADER_SIZE,
                data.len()
            )));
        }
        let mut reader = MemReaderRef::new(&data[..NSO_HEADER_SIZE]);
        let header: Self = reader.read_struct(false)?;
        if header.magic != NSO_MAGIC {
            return Err(Error::MalformedHeader(format!(
                "bad magic {:02x?}",
                header.magic.to_le_bytes()
            )));
        }
        Ok(header)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(NSO_HEADER_SIZE);
        self.pack(&mut out, false)?;
        Ok(out)
    }

    pub fn segment(&self, seg: Segment) -> &SegmentHeader {
        match seg {
            Segment::Text => &self.text,
            Segment::Rodata => &self.rodata,
            Segment::Data => &self.data,
        }
    }

    /// Number of bytes the segment occupies in the file.
    pub fn compressed_size(&self, seg: Segment) -> u32 {
        match seg {
            Segment::Text => self.text_compressed_size,
            Segment::Rodata => self.rodata_compressed_size,
            Segment::Data => self.data_compressed_size,
        }
    }

    pub fn digest(&self, seg: Segment) -> &[u8; 0x20] {
        match seg {
            Segment::Text => &self.text_hash,
            Segment::Rodata => &self.rodata_hash,
            Segment::Data => &self.data_hash,
        }
    }

    pub fn is_compressed(&self, seg: Segment) -> bool {
        self.flags & seg.compress_flag() != 0
    }

    pub fn is_hashed(&self, seg: Segment) -> bool {
        self.flags & seg.hash_flag() != 0
    }

    pub fn module_name(&self) -> SegmentHeaderRelative {
        SegmentHeaderRelative {
            offset: self.module_name_offset,
            size: self.module_name_size,
        }
    }

    /// Lowercase hex of the build id with trailing zero bytes removed.
    pub fn build_id_hex(&self) -> String {
        let len = self
            .build_id
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |i| i + 1);
        hex::encode(&self.build_id[..len])
    }

    /// Names of the flags that are set, e.g. `text_compressed`.
    pub fn flag_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for seg in Segment::ALL {
            if self.is_compressed(seg) {
                names.push(format!("{}_compressed", seg));
            }
        }
        for seg in Segment::ALL {
            if self.is_hashed(seg) {
                names.push(format!("{}_hashed", seg));
            }
        }
        names
    }
}
