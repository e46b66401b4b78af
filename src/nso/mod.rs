//! Nintendo Switch NSO executables
pub mod header;
pub mod segment;

use crate::error::Result;
use crate::ext::io::*;
use crate::types::{NsoInfo, Segment, SegmentInfo};
pub use header::*;
pub use segment::*;
use std::io::{Read, Seek, SeekFrom};

/// Reads the module name stored at the header's module name location.
///
/// Returns `None` when the header declares no name (size of 0 or 1, the latter
/// being a lone terminator).
pub fn read_module_name<R: Read + Seek>(header: &NsoHeader, mut reader: R) -> Result<Option<String>> {
    let desc = header.module_name();
    if desc.size <= 1 {
        return Ok(None);
    }
    reader.seek(SeekFrom::Start(desc.offset as u64))?;
    let raw = reader.read_exact_vec(desc.size as usize)?;
    let len = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    Ok(Some(String::from_utf8_lossy(&raw[..len]).into_owned()))
}

/// Collects a summary of the file. With `verify`, every segment is recovered
/// and the result of that recovery is recorded instead of aborting.
pub fn describe<R: Read + Seek>(
    path: &str,
    header: &NsoHeader,
    mut reader: R,
    verify: bool,
) -> Result<NsoInfo> {
    let module_name = read_module_name(header, &mut reader)?;
    let mut segments = Vec::with_capacity(Segment::ALL.len());
    for seg in Segment::ALL {
        let desc = header.segment(seg);
        let verified = if verify {
            match recover_segment(header, seg, &mut reader) {
                Ok(_) => Some(true),
                Err(e) => {
                    log::warn!("{}: {}", path, e);
                    Some(false)
                }
            }
        } else {
            None
        };
        segments.push(SegmentInfo {
            name: seg,
            file_offset: desc.file_offset,
            memory_offset: desc.memory_offset,
            size: desc.size,
            compressed_size: header.compressed_size(seg),
            compressed: header.is_compressed(seg),
            hashed: header.is_hashed(seg),
            verified,
        });
    }
    Ok(NsoInfo {
        path: path.to_string(),
        build_id: header.build_id_hex(),
        module_name,
        version: header.version,
        flags: header.flag_names(),
        bss_size: header.bss_size,
        segments,
    })
}
