//! Line-oriented text format for vectors.
//!
//! Each line holds a key followed by the vector components, separated by
//! spaces:
//!
//! ```text
//! key -0.37604 0.24116 -0.26098 -0.0079604
//! 0x6b6579 0.5 0.25
//! ```
//!
//! A key starting with `0x` is hex-decoded; any other key is taken as raw
//! bytes. Blank lines are skipped.

use std::io::BufRead;

use thiserror::Error;

/// Errors produced while scanning input.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Lazy iterator over `(key, vector)` records of a reader.
///
/// Iteration ends after the first error.
pub struct Scanner<R> {
    reader: R,
    line: usize,
    buf: String,
    failed: bool,
}

impl<R: BufRead> Scanner<R> {
    /// Scan records from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
            failed: false,
        }
    }

    fn parse(&self, text: &str) -> Result<(Vec<u8>, Vec<f32>), ScanError> {
        let mut fields = text.split_ascii_whitespace();
        let key = fields.next().unwrap_or_default();

        let key = match key.strip_prefix("0x") {
            Some(digits) => hex::decode(digits).map_err(|e| self.error(format!("key {}: {}", key, e)))?,
            None => key.as_bytes().to_vec(),
        };

        let vector = fields
            .map(|x| {
                x.parse::<f32>()
                    .map_err(|e| self.error(format!("component {:?}: {}", x, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((key, vector))
    }

    fn error(&self, message: String) -> ScanError {
        ScanError::Parse {
            line: self.line,
            message,
        }
    }
}

impl<R: BufRead> Iterator for Scanner<R> {
    type Item = Result<(Vec<u8>, Vec<f32>), ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e.into()));
                }
            }
            self.line += 1;

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }

            let record = self.parse(text);
            self.failed = record.is_err();
            return Some(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan(input: &str) -> Vec<Result<(Vec<u8>, Vec<f32>), ScanError>> {
        Scanner::new(input.as_bytes()).collect()
    }

    #[test]
    fn test_plain_and_hex_keys() {
        let records: Vec<_> = scan("abc 0.5 -1\n0x6b6579 2.25\n")
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(
            records,
            vec![
                (b"abc".to_vec(), vec![0.5, -1.0]),
                (b"key".to_vec(), vec![2.25]),
            ]
        );
    }

    #[test]
    fn test_skips_blank_lines_and_tolerates_crlf() {
        let records = scan("\r\na 1\r\n\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].as_ref().unwrap().1, vec![1.0]);
    }

    #[test]
    fn test_key_without_components() {
        let records = scan("lonely\n");
        assert_eq!(records[0].as_ref().unwrap(), &(b"lonely".to_vec(), vec![]));
    }

    #[test]
    fn test_stops_after_first_error() {
        let records = scan("a 1\nb nope\nc 3\n");
        assert_eq!(records.len(), 2);
        assert!(records[0].is_ok());
        match &records[1] {
            Err(ScanError::Parse { line, .. }) => assert_eq!(*line, 2),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_bad_hex_key_is_an_error() {
        let records = scan("0xzz 1\n");
        assert!(matches!(records[0], Err(ScanError::Parse { line: 1, .. })));
    }
}
