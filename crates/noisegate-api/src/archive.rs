use std::collections::HashMap;
use std::io::{Cursor, Write};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Virtual folder every entry lands under.
pub const FOLDER: &str = "denoised";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("no entries to archive")]
    EmptyInput,

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Write `(name, bytes)` entries into a deflate-compressed zip.
/// Returns the archive bytes and the number of entries written.
pub fn build(entries: &[(String, Vec<u8>)]) -> Result<(Vec<u8>, usize), ArchiveError> {
    if entries.is_empty() {
        return Err(ArchiveError::EmptyInput);
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut seen: HashMap<String, u32> = HashMap::new();

    for (name, bytes) in entries {
        writer.start_file(dedup(entry_name(name), &mut seen), options)?;
        writer.write_all(bytes)?;
    }

    let cursor = writer.finish()?;
    Ok((cursor.into_inner(), entries.len()))
}

/// Normalize an uploaded path into an archive entry name: backslashes
/// become forward slashes, the final segment's extension is forced to
/// `.png`, and everything sits under the `denoised/` folder.
fn entry_name(raw: &str) -> String {
    let name = raw.replace('\\', "/");
    let name = name.trim_matches('/');
    if name.is_empty() {
        return format!("{FOLDER}/frame.png");
    }

    let (dir, file) = match name.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, name),
    };
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };

    match dir {
        Some(dir) => format!("{FOLDER}/{dir}/{stem}.png"),
        None => format!("{FOLDER}/{stem}.png"),
    }
}

/// Colliding normalized names get a `-2`, `-3`, ... suffix; the first
/// occurrence keeps the bare name.
fn dedup(name: String, seen: &mut HashMap<String, u32>) -> String {
    let count = seen.entry(name.clone()).or_insert(0);
    *count += 1;
    let count = *count;
    if count == 1 {
        name
    } else {
        let stem = name.strip_suffix(".png").unwrap_or(&name);
        format!("{stem}-{count}.png")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn names(bytes: &[u8]) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(build(&[]), Err(ArchiveError::EmptyInput)));
    }

    #[test]
    fn names_are_normalized() {
        let entries = vec![
            ("frames\\shot.jpeg".to_string(), vec![1u8]),
            ("a.PNG".to_string(), vec![2u8]),
            ("noext".to_string(), vec![3u8]),
            (String::new(), vec![4u8]),
        ];
        let (bytes, count) = build(&entries).unwrap();
        assert_eq!(count, 4);
        assert_eq!(
            names(&bytes),
            [
                "denoised/frames/shot.png",
                "denoised/a.png",
                "denoised/noext.png",
                "denoised/frame.png",
            ]
        );
    }

    #[test]
    fn colliding_names_are_suffixed() {
        let entries = vec![
            ("a.png".to_string(), vec![1u8]),
            ("a.jpeg".to_string(), vec![2u8]),
            ("a.png".to_string(), vec![3u8]),
        ];
        let (bytes, _) = build(&entries).unwrap();
        assert_eq!(
            names(&bytes),
            ["denoised/a.png", "denoised/a-2.png", "denoised/a-3.png"]
        );
    }

    #[test]
    fn entry_bytes_survive_compression() {
        let payload = b"not really a png, but bytes are bytes".to_vec();
        let (bytes, _) = build(&[("x.png".to_string(), payload.clone())]).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name("denoised/x.png").unwrap();
        let mut out = Vec::new();
        file.read_to_end(&mut out).unwrap();
        assert_eq!(out, payload);
    }
}
