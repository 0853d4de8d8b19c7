//! Scanning vector files from disk.

use std::fs::File;
use std::io::{BufReader, Write};

use tempfile::NamedTempFile;

use optimum_cli::{ScanError, Scanner};

#[test]
fn test_scan_file_in_order() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "alpha -0.37604 0.24116").unwrap();
    writeln!(file, "0x00ff 1 2").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "gamma 3.5 4e-2").unwrap();

    let reader = BufReader::new(File::open(file.path()).unwrap());
    let records: Vec<(Vec<u8>, Vec<f32>)> = Scanner::new(reader).map(Result::unwrap).collect();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].0, b"alpha".to_vec());
    assert_eq!(records[0].1, vec![-0.37604, 0.24116]);
    assert_eq!(records[1].0, vec![0x00, 0xff]);
    assert_eq!(records[2].1, vec![3.5, 0.04]);
}

#[test]
fn test_scan_reports_line_of_bad_component() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "a 1").unwrap();
    writeln!(file, "b 2").unwrap();
    writeln!(file, "c 3,5").unwrap();

    let reader = BufReader::new(File::open(file.path()).unwrap());
    let last = Scanner::new(reader).last().unwrap();

    match last {
        Err(ScanError::Parse { line, message }) => {
            assert_eq!(line, 3);
            assert!(message.contains("3,5"));
        }
        other => panic!("unexpected: {:?}", other),
    }
}
