//! Per-file pipeline: header, text segment, call site, patch.
use crate::arm64::locator::locate;
use crate::error::{Error, Result};
use crate::ips::PatchRecord;
use crate::nso::{NSO_HEADER_SIZE, NsoHeader, read_module_name, recover_segment};
use crate::types::{PatchConfig, Segment};
use crate::utils::files::make_sure_dir_exists;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

/// `mov w0, wzr`
pub const DEFAULT_REPLACEMENT: [u8; 4] = [0xE0, 0x03, 0x1F, 0x2A];
/// ioctl request code whose call gets replaced by default
pub const DEFAULT_IOCTL: u32 = 0xC99A020E;

#[derive(Debug, Clone)]
pub struct PatchOutcome {
    pub build_id: String,
    pub module_name: Option<String>,
    /// Offset of the call site inside the text segment
    pub text_offset: usize,
    pub record: PatchRecord,
    pub output: PathBuf,
}

/// Where the patch for `input` is written.
pub fn patch_path(input: &Path, header: &NsoHeader, output_dir: Option<&str>) -> PathBuf {
    let mut name = header.build_id_hex();
    if name.is_empty() {
        name = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("patch"));
    }
    let mut pb = match output_dir {
        Some(dir) => PathBuf::from(dir),
        None => input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    pb.push(name);
    pb.set_extension("ips");
    pb
}

/// Builds the patch record for an already parsed file without touching the disk.
pub fn build_patch(
    header: &NsoHeader,
    text: &[u8],
    cfg: &PatchConfig,
) -> Result<(usize, PatchRecord)> {
    let text_offset = locate(text, &cfg.pattern).ok_or(Error::PatternNotFound {
        constant: cfg.pattern.constant,
    })?;
    // IPS offsets address the image with its header in front of the segments.
    let offset =
        NSO_HEADER_SIZE as u64 + header.text.memory_offset as u64 + text_offset as u64;
    let record = PatchRecord::new(offset, cfg.replacement.clone())?;
    Ok((text_offset, record))
}

pub fn patch_file(filename: &str, cfg: &PatchConfig) -> Result<PatchOutcome> {
    log::info!("Patching {}", filename);
    let path = Path::new(filename);
    let mut reader = BufReader::new(File::open(path)?);
    let header = NsoHeader::read_from(&mut reader)?;
    let build_id = header.build_id_hex();
    log::info!("Build id: {}", build_id);
    let module_name = read_module_name(&header, &mut reader)?;
    if let Some(name) = &module_name {
        log::info!("Module name: {}", name);
    }
    let text = recover_segment(&header, Segment::Text, &mut reader)?;
    let (text_offset, record) = build_patch(&header, text.data(), cfg)?;
    log::info!(
        "Found call site at text+{:#x}, patching file offset {:#x}",
        text_offset,
        record.offset()
    );
    let output = patch_path(path, &header, cfg.output.as_deref());
    make_sure_dir_exists(&output)?;
    let bytes = record.to_bytes()?;
    let mut f = File::create(&output)?;
    f.write_all(&bytes)?;
    log::info!("Wrote {}", output.display());
    Ok(PatchOutcome {
        build_id,
        module_name,
        text_offset,
        record,
        output,
    })
}
