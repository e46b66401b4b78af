pub mod args;

use nso_patch::arm64::locator::Pattern;
use nso_patch::nso::{NsoHeader, describe};
use nso_patch::patcher::patch_file;
use nso_patch::types::PatchConfig;
use nso_patch::utils;
use std::fs::File;
use std::io::BufReader;

fn info_file(filename: &str, verify: bool, pretty: bool) -> anyhow::Result<()> {
    let mut reader = BufReader::new(File::open(filename)?);
    let header = NsoHeader::read_from(&mut reader)?;
    let info = describe(filename, &header, &mut reader, verify)?;
    let s = if pretty {
        serde_json::to_string_pretty(&info)?
    } else {
        serde_json::to_string(&info)?
    };
    println!("{}", s);
    Ok(())
}

fn collect_inputs(inputs: &[String], recursive: bool) -> Vec<String> {
    let mut files = Vec::new();
    for input in inputs {
        match utils::files::collect_files(input, recursive) {
            Ok(mut found) => {
                if found.is_empty() {
                    log::warn!("No NSO files found in {}", input);
                }
                files.append(&mut found);
            }
            Err(e) => log::error!("{}", e),
        }
    }
    files
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let arg = args::parse_args();
    if arg.backtrace {
        unsafe { std::env::set_var("RUST_LIB_BACKTRACE", "1") };
    }
    let mut failed = 0usize;
    match &arg.command {
        args::Command::Patch(args) => {
            let cfg = PatchConfig {
                pattern: Pattern::new(args.ioctl).with_register(args.register),
                replacement: args.replacement.0.clone(),
                output: args.output.clone(),
            };
            let files = collect_inputs(&args.input, arg.recursive);
            for file in files.iter() {
                match patch_file(file, &cfg) {
                    Ok(outcome) => {
                        log::debug!(
                            "{}: text+{:#x} -> {}",
                            outcome.build_id,
                            outcome.text_offset,
                            outcome.output.display()
                        );
                    }
                    Err(e) => {
                        failed += 1;
                        log::error!("Error patching {}: {}", file, e);
                        if arg.backtrace {
                            log::error!("Backtrace: {}", anyhow::Error::from(e).backtrace());
                        }
                    }
                }
            }
            if files.is_empty() {
                failed += 1;
            }
        }
        args::Command::Info {
            input,
            verify,
            pretty,
        } => {
            let files = collect_inputs(input, arg.recursive);
            for file in files.iter() {
                if let Err(e) = info_file(file, *verify, *pretty) {
                    failed += 1;
                    log::error!("Error reading {}: {}", file, e);
                    if arg.backtrace {
                        log::error!("Backtrace: {}", e.backtrace());
                    }
                }
            }
            if files.is_empty() {
                failed += 1;
            }
        }
    }
    if failed > 0 {
        std::process::exit(1);
    }
}
