use crate::models::LogLine;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

// 512KB is large enough for good sequential throughput on big logs
const BUFFER_SIZE: usize = 512 * 1024;

/// Line source over a single log file.
/// Plain, gzip and zstd files are all read through the same `BufRead` handle,
/// which is closed when the reader is dropped.
pub(crate) struct LogFileReader {
    inner: Box<dyn BufRead>,
    line_number: u64,
    raw: Vec<u8>,
    text: String,
}

impl LogFileReader {
    /// Opens a log file, picking the decoder from the extension (.gz, .zst, anything else = plain)
    pub(crate) fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        let reader: Box<dyn BufRead> = match extension {
            "gz" => Box::new(BufReader::with_capacity(BUFFER_SIZE, GzDecoder::new(file))),
            "zst" => {
                let decoder = zstd::Decoder::new(file)
                    .with_context(|| format!("Failed to open zstd stream: {}", path.display()))?;
                Box::new(BufReader::with_capacity(BUFFER_SIZE, decoder))
            }
            _ => Box::new(BufReader::with_capacity(BUFFER_SIZE, file)),
        };

        Ok(Self::from_reader(reader))
    }

    pub(crate) fn from_reader(reader: Box<dyn BufRead>) -> Self {
        Self {
            inner: reader,
            line_number: 0,
            raw: Vec::with_capacity(2048),
            text: String::with_capacity(2048),
        }
    }

    /// Next line with its 1-based number, or `None` at end of input.
    /// Invalid UTF-8 is replaced rather than failing the whole run; the line
    /// terminator is stripped.
    pub(crate) fn next_line(&mut self) -> Result<Option<LogLine<'_>>> {
        self.raw.clear();
        let bytes_read = self
            .inner
            .read_until(b'\n', &mut self.raw)
            .context("Failed to read line from log file")?;
        if bytes_read == 0 {
            return Ok(None);
        }

        self.line_number += 1;
        self.text.clear();
        self.text.push_str(&String::from_utf8_lossy(&self.raw));

        Ok(Some(LogLine {
            number: self.line_number,
            text: self.text.trim_end_matches(['\n', '\r']),
        }))
    }

    #[allow(dead_code)]
    pub(crate) fn lines_read(&self) -> u64 {
        self.line_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;

    fn collect_lines(reader: &mut LogFileReader) -> Vec<(u64, String)> {
        let mut lines = Vec::new();
        while let Some(line) = reader.next_line().unwrap() {
            lines.push((line.number, line.text.to_string()));
        }
        lines
    }

    #[test]
    fn test_numbers_lines_and_strips_terminators() {
        let data = b"first\r\nsecond\n\nlast without newline".to_vec();
        let mut reader = LogFileReader::from_reader(Box::new(Cursor::new(data)));

        assert_eq!(
            collect_lines(&mut reader),
            vec![
                (1, "first".to_string()),
                (2, "second".to_string()),
                (3, String::new()),
                (4, "last without newline".to_string()),
            ]
        );
        assert_eq!(reader.lines_read(), 4);
    }

    #[test]
    fn test_invalid_utf8_does_not_abort() {
        let data = b"ok\n\xff\xfe broken\nstill ok\n".to_vec();
        let mut reader = LogFileReader::from_reader(Box::new(Cursor::new(data)));

        let lines = collect_lines(&mut reader);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].1.ends_with(" broken"));
        assert_eq!(lines[2].1, "still ok");
    }

    #[test]
    fn test_open_plain_and_gzip() {
        let dir = TempDir::new().unwrap();

        let plain = dir.path().join("access.log");
        std::fs::write(&plain, "a\nb\n").unwrap();
        let mut reader = LogFileReader::open(&plain).unwrap();
        assert_eq!(collect_lines(&mut reader).len(), 2);

        let gz = dir.path().join("access.log.1.gz");
        let mut encoder = GzEncoder::new(std::fs::File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(b"x\ny\nz\n").unwrap();
        encoder.finish().unwrap();
        let mut reader = LogFileReader::open(&gz).unwrap();
        assert_eq!(
            collect_lines(&mut reader)
                .into_iter()
                .map(|(_, text)| text)
                .collect::<Vec<_>>(),
            vec!["x", "y", "z"]
        );
    }

    #[test]
    fn test_open_zstd() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("access.log.zst");
        let compressed = zstd::encode_all(&b"one\ntwo\n"[..], 3).unwrap();
        std::fs::write(&path, compressed).unwrap();

        let mut reader = LogFileReader::open(&path).unwrap();
        assert_eq!(collect_lines(&mut reader).len(), 2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.log");

        let err = LogFileReader::open(&missing).err().expect("open should fail");
        assert!(err.to_string().contains("Failed to open log file"));
    }
}
