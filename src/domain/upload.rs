//! Naming of uploaded files
//!
//! An upload keeps its original name unless a stored file already contains
//! the same base name. In that case it gets a numbered suffix one above the
//! highest suffix in use: `photo.jpg`, `photo_0.jpg`, `photo_1.jpg`, ...

/// Splits a file name into its base and a 3-4 character extension
/// (including the dot). Names without such an extension keep it all as base.
pub fn split_extension(name: &str) -> (&str, &str) {
    if let Some(dot) = name.rfind('.') {
        let ext = &name[dot + 1..];
        let len = ext.chars().count();
        if (3..=4).contains(&len) && !ext.chars().any(char::is_whitespace) {
            return (&name[..dot], &name[dot..]);
        }
    }
    (name, "")
}

/// Numbered suffix of a stored name produced for `base` and `ext`, e.g.
/// `3` for `photo_3.jpg`. The stored name is never re-split: `data.gz_0`
/// has no extension of its own.
fn suffix_of(stored: &str, base: &str, ext: &str) -> Option<u64> {
    let digits = stored
        .strip_suffix(ext)?
        .strip_prefix(base)?
        .strip_prefix('_')?;

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Picks the name an upload called `original` is stored under, given the
/// paths already present in the destination
pub fn available_name(original: &str, existing: &[String]) -> String {
    let (base, ext) = split_extension(original);

    let collisions: Vec<&str> = existing
        .iter()
        .map(|path| path.rsplit('/').next().unwrap_or(path.as_str()))
        .filter(|name| name.contains(base))
        .collect();

    if collisions.is_empty() {
        return original.to_string();
    }

    let next = collisions
        .iter()
        .filter_map(|name| suffix_of(name, base, ext))
        .max()
        .map_or(0, |n| n + 1);

    format!("{}_{}{}", base, next, ext)
}
