//! Tests for error types

use labbook::Error;

#[test]
fn test_not_found_error() {
    let error = Error::NotFound("experiment 17".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Not found"));
    assert!(error_str.contains("experiment 17"));
    assert!(error.is_not_found());
    assert!(!error.is_unsupported());
}

#[test]
fn test_unsupported_operation_error() {
    let error = Error::UnsupportedOperation("dump needs a database-backed run".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Unsupported operation"));
    assert!(error.is_unsupported());
}

#[test]
fn test_decode_error() {
    let error = Error::DecodeError("ndarray object without values".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Decode error"));
    assert!(error_str.contains("ndarray"));
    assert!(error.is_decode());
}

#[test]
fn test_storage_error() {
    let error = Error::StorageError("connection refused".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Storage error"));
    assert!(error_str.contains("connection refused"));
}

#[test]
fn test_other_error() {
    let error = Error::Other("custom error message".to_string());
    assert_eq!(format!("{error}"), "custom error message");
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
    // io NotFound is not a missing experiment or artifact
    assert!(!error.is_not_found());
}

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: Error = json_error.into();
    assert!(format!("{error}").contains("JSON error"));
}

#[test]
fn test_zip_error_conversion() {
    let error: Error = zip::result::ZipError::FileNotFound.into();
    assert!(format!("{error}").contains("Zip error"));
}

#[test]
fn test_error_debug() {
    let error = Error::NotFound("artifact weights.bin".to_string());
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("NotFound"));
}
