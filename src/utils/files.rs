use crate::ext::io::ReadExt;
use crate::nso::NSO_MAGIC;
use std::fs;
use std::io;
use std::path::Path;

/// Checks whether the file starts with the NSO magic.
pub fn is_nso_file<F: AsRef<Path> + ?Sized>(f: &F) -> bool {
    fs::File::open(f)
        .and_then(|mut file| file.read_u32())
        .map_or(false, |magic| magic == NSO_MAGIC)
}

/// Lists NSO files in a directory. NSO files rarely carry an extension, so
/// files are recognised by their magic.
pub fn find_files(path: &str, recursive: bool) -> io::Result<Vec<String>> {
    let mut result = Vec::new();
    let dir_path = Path::new(&path);

    if dir_path.is_dir() {
        let mut entries = fs::read_dir(dir_path)?.collect::<io::Result<Vec<_>>>()?;
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let path = entry.path();

            if path.is_file() && is_nso_file(&path) {
                if let Some(path_str) = path.to_str() {
                    result.push(path_str.to_string());
                }
            } else if recursive && path.is_dir() {
                if let Some(path_str) = path.to_str() {
                    let mut sub_files = find_files(path_str, recursive)?;
                    result.append(&mut sub_files);
                }
            }
        }
    }

    Ok(result)
}

/// Expands an input path into the files to process. Explicitly named files are
/// always returned, even without the magic, so that a bad file gets reported.
pub fn collect_files(path: &str, recursive: bool) -> io::Result<Vec<String>> {
    let pa = Path::new(path);
    if pa.is_dir() {
        return find_files(path, recursive);
    }
    if pa.is_file() {
        return Ok(vec![path.to_string()]);
    }
    Err(io::Error::new(
        io::ErrorKind::NotFound,
        format!("Path {} is neither a file nor a directory", pa.display()),
    ))
}

pub fn make_sure_dir_exists<F: AsRef<Path> + ?Sized>(f: &F) -> io::Result<()> {
    let path = f.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_files_by_magic() {
        let dir = std::env::temp_dir().join(format!("nso_patch_files_{}", std::process::id()));
        let sub = dir.join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(dir.join("main"), b"NSO0rest").unwrap();
        fs::write(dir.join("readme.txt"), b"hello").unwrap();
        fs::write(sub.join("subsdk0"), b"NSO0").unwrap();
        let root = dir.to_str().unwrap();

        let flat = find_files(root, false).unwrap();
        assert_eq!(flat.len(), 1);
        assert!(flat[0].ends_with("main"));
        assert_eq!(find_files(root, true).unwrap().len(), 2);

        let txt = dir.join("readme.txt");
        assert_eq!(collect_files(txt.to_str().unwrap(), false).unwrap().len(), 1);
        assert!(collect_files(dir.join("missing").to_str().unwrap(), false).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }
}
