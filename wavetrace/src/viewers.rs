// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
//
// Format independent loading interface for waveform viewers

use crate::hierarchy::{TraceBuilder, TraceDataModel};
use crate::vcd::{LoadStats, VcdLoader};
use crate::{FileFormat, LoadOptions, Result, WavetraceError};
use std::io::BufRead;
use std::path::Path;

/// A parser for one trace file format.
pub trait TraceLoader {
    fn format(&self) -> FileFormat;
    /// File extensions (lower case, without the dot) that usually carry this format.
    fn extensions(&self) -> &'static [&'static str];
    /// Streams the whole input into `builder`.
    fn load(&self, input: &mut dyn BufRead, builder: &mut dyn TraceBuilder) -> Result<LoadStats>;
}

impl TraceLoader for VcdLoader {
    fn format(&self) -> FileFormat {
        FileFormat::Vcd
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["vcd"]
    }

    fn load(&self, input: &mut dyn BufRead, builder: &mut dyn TraceBuilder) -> Result<LoadStats> {
        Ok(VcdLoader::load(self, input, builder)?)
    }
}

/// Returns the loader for `format` or `None` if the format is not supported.
pub fn loader_for(format: FileFormat, options: &LoadOptions) -> Option<Box<dyn TraceLoader>> {
    match format {
        FileFormat::Vcd => Some(Box::new(VcdLoader::new(options))),
        FileFormat::Unknown => None,
    }
}

/// Guesses the format from the first non-whitespace byte of the input.
/// Only leading whitespace is consumed.
pub fn detect_file_format(input: &mut (impl BufRead + ?Sized)) -> std::io::Result<FileFormat> {
    loop {
        let buf = input.fill_buf()?;
        if buf.is_empty() {
            return Ok(FileFormat::Unknown);
        }
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(pos) => {
                let format = if buf[pos] == b'$' {
                    FileFormat::Vcd
                } else {
                    FileFormat::Unknown
                };
                input.consume(pos);
                return Ok(format);
            }
            None => {
                let len = buf.len();
                input.consume(len);
            }
        }
    }
}

/// Guesses the format from the file extension.
pub fn format_from_extension(filename: impl AsRef<Path>) -> FileFormat {
    let ext = filename
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("vcd") => FileFormat::Vcd,
        _ => FileFormat::Unknown,
    }
}

/// Detects the format of `input` and loads it into `builder`. If the content does not
/// reveal the format, `fallback` is used.
pub fn load_into(
    input: &mut dyn BufRead,
    fallback: FileFormat,
    options: &LoadOptions,
    builder: &mut dyn TraceBuilder,
) -> Result<LoadStats> {
    let format = match detect_file_format(input)? {
        FileFormat::Unknown => fallback,
        known => known,
    };
    let loader = loader_for(format, options).ok_or(WavetraceError::UnknownFileFormat)?;
    log::debug!("loading trace as {:?}", loader.format());
    loader.load(input, builder)
}

/// Replaces the contents of `model` with the trace stored in `filename`.
pub fn load_file(
    filename: impl AsRef<Path>,
    options: &LoadOptions,
    model: &mut TraceDataModel,
) -> Result<LoadStats> {
    let filename = filename.as_ref();
    let file = std::fs::File::open(filename)?;
    let mut input = std::io::BufReader::new(file);
    let mut builder = model.start_building();
    load_into(
        &mut input,
        format_from_extension(filename),
        options,
        &mut builder,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(input: &str) -> FileFormat {
        detect_file_format(&mut input.as_bytes()).unwrap()
    }

    #[test]
    fn test_detect_file_format() {
        assert_eq!(detect("$date today $end"), FileFormat::Vcd);
        assert_eq!(detect("\n\t  $timescale 1ns $end"), FileFormat::Vcd);
        assert_eq!(detect("GHDLwave\n"), FileFormat::Unknown);
        assert_eq!(detect(""), FileFormat::Unknown);
        assert_eq!(detect("   \n"), FileFormat::Unknown);
    }

    #[test]
    fn test_detect_only_consumes_whitespace() {
        let mut input = "  \n$end".as_bytes();
        assert_eq!(detect_file_format(&mut input).unwrap(), FileFormat::Vcd);
        assert_eq!(input, b"$end");
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(format_from_extension("a/b/trace.vcd"), FileFormat::Vcd);
        assert_eq!(format_from_extension("TRACE.VCD"), FileFormat::Vcd);
        assert_eq!(format_from_extension("trace.fst"), FileFormat::Unknown);
        assert_eq!(format_from_extension("trace"), FileFormat::Unknown);
    }

    #[test]
    fn test_loader_for() {
        let opts = LoadOptions::default();
        let loader = loader_for(FileFormat::Vcd, &opts).unwrap();
        assert_eq!(loader.format(), FileFormat::Vcd);
        assert_eq!(loader.extensions(), ["vcd"]);
        assert!(loader_for(FileFormat::Unknown, &opts).is_none());
    }

    #[test]
    fn test_load_into_unknown_format() {
        let mut model = TraceDataModel::new();
        let mut builder = model.start_building();
        let mut input = "hello".as_bytes();
        let res = load_into(
            &mut input,
            FileFormat::Unknown,
            &LoadOptions::default(),
            &mut builder,
        );
        assert!(matches!(res, Err(WavetraceError::UnknownFileFormat)));
    }
}
