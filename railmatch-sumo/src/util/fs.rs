use std::{
    fs::File,
    io::{BufWriter, Read},
    path::Path,
};

use flate2::read::GzDecoder;
use kdam::tqdm;
use serde::Serialize;

use crate::SumoFileError;

/// reads a whole text file, transparently decompressing files ending in `.gz`.
pub fn read_to_string(path: &Path) -> Result<String, SumoFileError> {
    let file = File::open(path).map_err(|e| SumoFileError::ReadError {
        path: path.to_owned(),
        message: e.to_string(),
    })?;
    let mut contents = String::new();
    let result = if is_gzip(path) {
        GzDecoder::new(file).read_to_string(&mut contents)
    } else {
        let mut file = file;
        file.read_to_string(&mut contents)
    };
    result.map_err(|e| SumoFileError::ReadError {
        path: path.to_owned(),
        message: e.to_string(),
    })?;
    Ok(contents)
}

pub fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

/// helper function to "mkdir -p path" - make all directories along a path
pub fn create_dirs<P>(path: P) -> Result<(), SumoFileError>
where
    P: AsRef<Path>,
{
    let dirspath = path.as_ref();
    if !dirspath.is_dir() {
        std::fs::create_dir_all(dirspath).map_err(|e| {
            let msg = format!(
                "error building output directory '{}': {e}",
                dirspath.to_str().unwrap_or_default()
            );
            SumoFileError::InvalidUserInput(msg)
        })
    } else {
        Ok(())
    }
}

/// opens `path` for writing, creating parent directories. returns None if the file
/// exists and `overwrite` is false.
pub fn create_writer(path: &Path, overwrite: bool) -> Result<Option<BufWriter<File>>, SumoFileError> {
    if path.exists() && !overwrite {
        log::warn!(
            "'{}' exists and overwrite is disabled, skipping",
            path.display()
        );
        return Ok(None);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dirs(parent)?;
    }
    let file = File::create(path).map_err(|e| SumoFileError::WriteError {
        path: path.to_owned(),
        message: e.to_string(),
    })?;
    Ok(Some(BufWriter::new(file)))
}

/// writes rows with a header line into `output_directory/filename`. returns false when
/// the file exists and `overwrite` is disabled.
pub fn serialize_into_csv<I>(
    iterable: I,
    filename: &str,
    output_directory: &Path,
    overwrite: bool,
    desc: &str,
) -> Result<bool, SumoFileError>
where
    I: IntoIterator,
    I::IntoIter: ExactSizeIterator,
    I::Item: Serialize,
{
    let filepath = output_directory.join(filename);
    let Some(file) = create_writer(&filepath, overwrite)? else {
        return Ok(false);
    };
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(file);
    let iter = iterable.into_iter();
    let total = iter.len();
    let bar_iter = tqdm!(iter, total = total, desc = desc);
    for element in bar_iter {
        writer.serialize(element).map_err(|e| {
            SumoFileError::CsvWriteError(format!("Failed to write to {filename}: {e}"))
        })?;
    }
    eprintln!();
    writer.flush().map_err(|e| {
        SumoFileError::CsvWriteError(format!("Failed to flush {filename}: {e}"))
    })?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        id: &'static str,
    }

    #[test]
    fn test_csv_respects_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        std::fs::write(&path, "kept\n").unwrap();

        let rows = vec![Row { id: "a" }];
        let written = serialize_into_csv(rows, "rows.csv", dir.path(), false, "rows").unwrap();
        assert!(!written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "kept\n");

        let rows = vec![Row { id: "a" }];
        let written = serialize_into_csv(rows, "rows.csv", dir.path(), true, "rows").unwrap();
        assert!(written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "id\na\n");
    }
}
