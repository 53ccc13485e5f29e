// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License

use std::path::{Path, PathBuf};
use wavetrace::viewers::{detect_file_format, format_from_extension, loader_for};
use wavetrace::{FileFormat, LoadOptions};

fn find_files(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).unwrap().filter_map(Result::ok) {
        let entry_path = entry.path();
        if entry_path.is_dir() {
            let mut sub = find_files(&entry_path);
            out.append(&mut sub);
        } else if entry_path.is_file() {
            out.push(entry_path);
        }
    }
    out.sort();
    out
}

#[test]
fn test_detect_file_format() {
    let files = find_files(Path::new("inputs/"));
    assert!(files.len() >= 5);
    for filename in files {
        let file = std::fs::File::open(&filename).unwrap();
        let format = detect_file_format(&mut std::io::BufReader::new(file)).unwrap();
        let filename_str = filename.to_str().unwrap();
        assert_eq!(format, FileFormat::Vcd, "{filename_str}");
        assert_eq!(format_from_extension(&filename), format, "{filename_str}");
        let loader = loader_for(format, &LoadOptions::default()).unwrap();
        let ext = filename.extension().unwrap().to_str().unwrap();
        assert!(loader.extensions().contains(&ext), "{filename_str}");
    }
}

#[test]
fn test_empty_input_is_unknown() {
    let model = wavetrace::simple::read_from_bytes(b"");
    assert!(matches!(
        model,
        Err(wavetrace::WavetraceError::UnknownFileFormat)
    ));
}
