use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;

const ASSET_DIR: &str = "static";

// Fingerprints the stylesheet directory so templates can bust browser caches
// with `?v=<hash>` after every asset change.
fn main() {
    println!("cargo:rerun-if-changed={ASSET_DIR}/");

    let mut hasher = DefaultHasher::new();
    let mut files: Vec<_> = match fs::read_dir(Path::new(ASSET_DIR)) {
        Ok(dir) => dir.filter_map(Result::ok).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    };
    files.sort();

    for path in files.iter().filter(|p| p.is_file()) {
        if let (Some(name), Ok(bytes)) = (path.file_name(), fs::read(path)) {
            name.hash(&mut hasher);
            bytes.hash(&mut hasher);
        }
    }

    let digest = format!("{:016x}", hasher.finish());
    println!("cargo:rustc-env=STATIC_HASH={}", &digest[..8]);
}
