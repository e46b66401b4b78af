use clap::{ArgAction, Args, Parser, Subcommand};
use nso_patch::arm64::disasm::Register;

/// Tools for inspecting NSO executables and generating IPS patches
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Arg {
    #[arg(short, long, action = ArgAction::SetTrue, global = true)]
    /// Search for NSO files in the directory recursively
    pub recursive: bool,
    #[arg(global = true, action = ArgAction::SetTrue, short, long)]
    /// Print backtrace on error
    pub backtrace: bool,
    #[command(subcommand)]
    /// Command
    pub command: Command,
}

#[derive(Subcommand, Debug)]
/// Commands
pub enum Command {
    /// Generate an IPS patch that replaces the ioctl call site
    Patch(PatchArgs),
    /// Print header information as JSON
    Info {
        /// Input NSO files or directories
        #[arg(required = true)]
        input: Vec<String>,
        #[arg(long, action = ArgAction::SetTrue)]
        /// Decompress and verify every segment
        verify: bool,
        #[arg(long, action = ArgAction::SetTrue)]
        /// Pretty print the JSON output
        pretty: bool,
    },
}

#[derive(Args, Debug)]
pub struct PatchArgs {
    /// Input NSO files or directories
    #[arg(required = true)]
    pub input: Vec<String>,
    #[arg(short, long)]
    /// Output directory. Defaults to the directory of each input file
    pub output: Option<String>,
    #[arg(long, value_parser = parse_u32, default_value = "0xC99A020E")]
    /// ioctl request code loaded before the call to replace
    pub ioctl: u32,
    #[arg(long, default_value = "w1")]
    /// Register the request code is loaded into
    pub register: Register,
    #[arg(long, value_parser = parse_hex_bytes, default_value = "e0031f2a")]
    /// Replacement bytes in hex (default: mov w0, wzr)
    pub replacement: HexBytes,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

fn parse_u32(s: &str) -> Result<u32, String> {
    let r = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    r.map_err(|e| format!("Invalid number {}: {}", s, e))
}

fn parse_hex_bytes(s: &str) -> Result<HexBytes, String> {
    let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&cleaned)
        .map(HexBytes)
        .map_err(|e| format!("Invalid hex string {}: {}", s, e))
}

pub fn parse_args() -> Arg {
    Arg::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nso_patch::patcher::DEFAULT_IOCTL;

    #[test]
    fn test_parse_u32() {
        assert_eq!(parse_u32("0xC99A020E").unwrap(), 0xC99A020E);
        assert_eq!(parse_u32("16").unwrap(), 16);
        assert!(parse_u32("0x1_0000_0000").is_err());
    }

    #[test]
    fn test_parse_hex_bytes() {
        assert_eq!(parse_hex_bytes("e0 03 1f 2a").unwrap().0, [0xE0, 0x03, 0x1F, 0x2A]);
        assert!(parse_hex_bytes("e00").is_err());
    }

    #[test]
    fn test_patch_defaults() {
        let arg = Arg::try_parse_from(["nso_patch", "patch", "main"]).unwrap();
        let Command::Patch(args) = arg.command else {
            panic!("expected patch command");
        };
        assert_eq!(args.ioctl, DEFAULT_IOCTL);
        assert_eq!(args.register, Register::w(1));
        assert_eq!(args.replacement.0, [0xE0, 0x03, 0x1F, 0x2A]);
        assert!(Arg::try_parse_from(["nso_patch", "patch"]).is_err());
    }
}
