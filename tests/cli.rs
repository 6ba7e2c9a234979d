use std::fs;

use assert_cmd::Command;
use mseed_detide::{MseedReader, MseedRecord, NanoTime, Samples, encode};
use predicates::prelude::*;

fn msdetide() -> Command {
    Command::cargo_bin("msdetide").unwrap()
}

fn gauge_bytes(samples: Vec<i32>) -> Vec<u8> {
    let record = MseedRecord::new()
        .with_nslc("NZ", "GISB", "41", "BTZ")
        .with_start_time(NanoTime::from_epoch_seconds(1_342_742_400.0))
        .with_sample_rate(1.0)
        .with_samples(Samples::Int(samples));
    encode(&record).unwrap()
}

fn decode_all(bytes: &[u8]) -> Vec<MseedRecord> {
    MseedReader::new(bytes)
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

// =============================================================================
// GENERAL
// =============================================================================

#[test]
fn test_version_flag() {
    msdetide()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("msdetide"));
}

#[test]
fn test_help_flag() {
    msdetide()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--alpha"))
        .stdout(predicate::str::contains("--tide"));
}

// =============================================================================
// CONFIGURATION ERRORS
// =============================================================================

#[test]
fn test_malformed_tide_is_config_error() {
    msdetide()
        .args(["-T", "M2/0.5"])
        .write_stdin(gauge_bytes(vec![1]))
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn test_unknown_tide_label_is_config_error() {
    msdetide()
        .args(["-T", "XYZ/0.5/10"])
        .write_stdin(Vec::new())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("XYZ"));
}

#[test]
fn test_bad_latitude_and_record_length() {
    msdetide()
        .args(["-L", "-91"])
        .write_stdin(Vec::new())
        .assert()
        .code(2);
    msdetide()
        .args(["-r", "300"])
        .write_stdin(Vec::new())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("record length"));
}

#[test]
fn test_float_encoding_rejected() {
    msdetide()
        .args(["-e", "float32"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("float32").or(predicate::str::contains("FLOAT32")));
}

// =============================================================================
// PROCESSING
// =============================================================================

#[test]
fn test_stdin_to_stdout() {
    let output = msdetide()
        .args(["-A", "-10", "-B", "0"])
        .write_stdin(gauge_bytes(vec![100, 200, 300]))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let records = decode_all(&output);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].channel, "BTT");
    assert_eq!(records[0].samples, Samples::Int(vec![110, 210, 310]));
}

#[test]
fn test_files_to_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("a.mseed");
    let second = dir.path().join("b.mseed");
    let out = dir.path().join("out.mseed");
    fs::write(&first, gauge_bytes(vec![1, 2])).unwrap();
    fs::write(&second, gauge_bytes(vec![3])).unwrap();

    msdetide()
        .args(["-B", "0", "-O", "X", "-T", "M2/0.4/90", "-T", "S2/0.1/120"])
        .arg("-o")
        .arg(&out)
        .arg(&first)
        .arg(&second)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let records = decode_all(&fs::read(&out).unwrap());
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.channel == "BTX"));
    assert_eq!(records[0].samples, Samples::Int(vec![1, 2]));
    assert_eq!(records[1].samples, Samples::Int(vec![3]));
}

#[test]
fn test_no_orient_keeps_channel() {
    let output = msdetide()
        .args(["--no-orient", "-B", "0", "-e", "int32", "-"])
        .write_stdin(gauge_bytes(vec![5]))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let records = decode_all(&output);
    assert_eq!(records[0].channel, "BTZ");
    assert_eq!(records[0].encoding, mseed_detide::EncodingFormat::Int32);
}

#[test]
fn test_missing_file_fails_but_processes_others() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.mseed");
    fs::write(&good, gauge_bytes(vec![42])).unwrap();

    let output = msdetide()
        .args(["-B", "0"])
        .arg(dir.path().join("missing.mseed"))
        .arg(&good)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing.mseed"))
        .get_output()
        .stdout
        .clone();

    let records = decode_all(&output);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].samples, Samples::Int(vec![42]));
}

#[test]
fn test_verbose_logs_trace_list() {
    msdetide()
        .args(["-v", "-B", "0"])
        .write_stdin(gauge_bytes(vec![1, 2, 3]))
        .assert()
        .success()
        .stderr(predicate::str::contains("NZ.GISB.41.BTT"))
        .stderr(predicate::str::contains("tidal [T]"));
}
