#![cfg(feature = "serde")]

use std::num::NonZeroUsize;
use syncratio::{Analysis, ScanResult, SizeReport, analyze, scan};

#[test]
fn test_scan_result_serde() {
    let basis = b"Hello, world! This is a test for serde serialization.";
    let new = b"Hello, world! This is another test for serde serialization.";
    let result = scan(basis, new, NonZeroUsize::new(8).unwrap());

    let json = serde_json::to_string(&result).unwrap();
    let deserialized: ScanResult = serde_json::from_str(&json).unwrap();

    assert_eq!(result, deserialized);
}

#[test]
fn test_size_report_fields() {
    let data = vec![3u8; 4096];
    let analysis = analyze(&data, &data, &[1024]).unwrap();

    let value = serde_json::to_value(&analysis.reports[0]).unwrap();
    assert_eq!(value["block_size"], 1024);
    assert_eq!(value["matched_bytes"], 4096);
    assert_eq!(value["literal_bytes"], 0);
    assert_eq!(value["total_bytes"], 4096);
    assert_eq!(value["redundancy"], 1.0);

    let restored: SizeReport = serde_json::from_value(value).unwrap();
    assert_eq!(restored, analysis.reports[0]);
}

#[test]
fn test_analysis_roundtrip() {
    let basis = b"The quick brown fox jumps over the lazy dog.".repeat(40);
    let new = b"The quick brown fox leaps over the lazy cat.".repeat(40);
    let analysis = analyze(&basis, &new, &[16, 32, 64]).unwrap();

    let json = serde_json::to_string(&analysis).unwrap();
    let restored: Analysis = serde_json::from_str(&json).unwrap();

    assert_eq!(analysis.len(), restored.len());
    for (original, restored) in analysis.reports.iter().zip(&restored.reports) {
        assert_eq!(original.block_size, restored.block_size);
        assert_eq!(original.matched_bytes, restored.matched_bytes);
        assert_eq!(original.literal_bytes, restored.literal_bytes);
        assert!((original.redundancy - restored.redundancy).abs() < 1e-12);
    }
    assert_eq!(
        analysis.best().map(|r| r.block_size),
        restored.best().map(|r| r.block_size)
    );
}
