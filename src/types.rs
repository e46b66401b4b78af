use crate::arm64::locator::Pattern;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
/// NSO segment
pub enum Segment {
    /// Executable code
    Text,
    /// Read-only data
    Rodata,
    /// Writable data
    Data,
}

impl Segment {
    pub const ALL: [Segment; 3] = [Segment::Text, Segment::Rodata, Segment::Data];

    /// Bit in the header flags telling that this segment is LZ4 compressed.
    pub fn compress_flag(&self) -> u32 {
        match self {
            Segment::Text => 1 << 0,
            Segment::Rodata => 1 << 1,
            Segment::Data => 1 << 2,
        }
    }

    /// Bit in the header flags telling that this segment carries a SHA-256 digest.
    pub fn hash_flag(&self) -> u32 {
        match self {
            Segment::Text => 1 << 3,
            Segment::Rodata => 1 << 4,
            Segment::Data => 1 << 5,
        }
    }
}

impl AsRef<str> for Segment {
    fn as_ref(&self) -> &str {
        match self {
            Segment::Text => "text",
            Segment::Rodata => "rodata",
            Segment::Data => "data",
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

#[derive(Debug, Clone)]
/// Options for the patch command
pub struct PatchConfig {
    /// Call site to look for
    pub pattern: Pattern,
    /// Bytes written over the located instruction
    pub replacement: Vec<u8>,
    /// Directory for the generated patches. Defaults to the input's directory.
    pub output: Option<String>,
}

#[derive(Debug, Serialize)]
/// Summary of one segment of an NSO file
pub struct SegmentInfo {
    pub name: Segment,
    pub file_offset: u32,
    pub memory_offset: u32,
    pub size: u32,
    pub compressed_size: u32,
    pub compressed: bool,
    pub hashed: bool,
    /// Result of recovering the segment, present only when verification was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

#[derive(Debug, Serialize)]
/// Summary of an NSO file, printed by the info command
pub struct NsoInfo {
    pub path: String,
    pub build_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    pub version: u32,
    pub flags: Vec<String>,
    pub bss_size: u32,
    pub segments: Vec<SegmentInfo>,
}
