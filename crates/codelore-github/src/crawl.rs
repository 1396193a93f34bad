//! Ignore rules for the repository crawl.

/// Generated lockfiles carry no semantic content worth indexing.
const IGNORED_FILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "Cargo.lock",
    "poetry.lock",
    "composer.lock",
    "Gemfile.lock",
];

/// Extensions that are never UTF-8 source text; skipping them up front
/// avoids fetching blobs that would be rejected at decode time anyway.
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "ico", "webp", "pdf", "woff", "woff2", "ttf", "eot", "otf",
    "zip", "gz", "tar", "jar", "class", "exe", "dll", "so", "dylib", "wasm", "mp3", "mp4",
    "webm", "ogg", "bin",
];

/// Whether a tree path should be excluded from indexing.
#[must_use]
pub fn is_ignored(path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    if IGNORED_FILES.contains(&file_name) {
        return true;
    }
    match file_name.rsplit_once('.') {
        Some((_, ext)) => BINARY_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}
