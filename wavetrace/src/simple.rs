// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License
//
// A simpler interface to load traces. Use `wavetrace::viewers` instead if you want to reuse
// a `TraceDataModel` or inspect load statistics.

use crate::hierarchy::TraceDataModel;
use crate::{viewers, FileFormat, LoadOptions, Result};
use std::io::BufRead;

/// Read a trace file with the default options.
pub fn read<P: AsRef<std::path::Path>>(filename: P) -> Result<TraceDataModel> {
    read_with_options(filename, &LoadOptions::default())
}

/// Read a trace file.
pub fn read_with_options<P: AsRef<std::path::Path>>(
    filename: P,
    options: &LoadOptions,
) -> Result<TraceDataModel> {
    let mut model = TraceDataModel::new();
    viewers::load_file(filename, options, &mut model)?;
    Ok(model)
}

/// Read from something that is not a file. The format is detected from the content.
pub fn read_from_reader<R: BufRead>(mut input: R) -> Result<TraceDataModel> {
    let mut model = TraceDataModel::new();
    {
        let mut builder = model.start_building();
        viewers::load_into(
            &mut input,
            FileFormat::Unknown,
            &LoadOptions::default(),
            &mut builder,
        )?;
    }
    Ok(model)
}

/// Read a trace that is already in memory.
pub fn read_from_bytes(bytes: &[u8]) -> Result<TraceDataModel> {
    read_from_reader(bytes)
}
