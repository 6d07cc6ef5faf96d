use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use flate2::read::GzDecoder;

use crate::app::RailMatchAppError;

/// opens a delimited text file with headers. files ending in `.gz` are decompressed.
pub fn csv_reader(path: &Path) -> Result<csv::Reader<Box<dyn Read>>, RailMatchAppError> {
    let file = File::open(path).map_err(|e| RailMatchAppError::ReadError {
        path: path.to_owned(),
        message: e.to_string(),
    })?;
    let is_gzip = path.extension().and_then(|e| e.to_str()) == Some("gz");
    let inner: Box<dyn Read> = if is_gzip {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(inner);
    Ok(reader)
}

/// header names of an open reader, in column order.
pub fn headers<R: Read>(
    reader: &mut csv::Reader<R>,
    path: &Path,
) -> Result<Vec<String>, RailMatchAppError> {
    let headers = reader.headers().map_err(|e| RailMatchAppError::ReadError {
        path: path.to_owned(),
        message: format!("failed to read header row: {e}"),
    })?;
    Ok(headers.iter().map(String::from).collect())
}

/// position of `column` in `headers`, failing with a message naming the file.
pub fn column_index(
    headers: &[String],
    column: &str,
    path: &Path,
) -> Result<usize, RailMatchAppError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| RailMatchAppError::ReadError {
            path: path.to_owned(),
            message: format!(
                "missing column '{column}', found [{}]",
                headers.join(", ")
            ),
        })
}
