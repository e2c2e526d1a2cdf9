use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;
use tempfile;

type STDRESULT = Result<(), Box<dyn std::error::Error>>;

/// Round-trips `data` through `compress` then `expand` for `method`, via the
/// built binary, and checks the expanded file matches the original byte for
/// byte.
fn round_trip_via_cli(method: &str, name: &str, data: &[u8]) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join(format!("{name}.bin"));
    let compressed_path = temp_dir.path().join(format!("{name}.cmp"));
    let expanded_path = temp_dir.path().join(format!("{name}.exp"));
    std::fs::write(&in_path, data)?;

    Command::cargo_bin("d64compress")?
        .arg("compress")
        .arg("-m").arg(method)
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&compressed_path)
        .assert()
        .success();

    Command::cargo_bin("d64compress")?
        .arg("expand")
        .arg("-m").arg(method)
        .arg("-i").arg(&compressed_path)
        .arg("-o").arg(&expanded_path)
        .assert()
        .success();

    let expanded = std::fs::read(&expanded_path)?;
    assert_eq!(expanded, data, "{method} round trip mismatch for {name}");
    Ok(())
}

fn repeated_text() -> Vec<u8> {
    let mut data = Vec::new();
    for _ in 0..40 {
        data.extend_from_slice(b"the quick brown fox jumps over the lazy dog. ");
    }
    data
}

#[test]
fn d64_round_trip_empty() -> STDRESULT {
    round_trip_via_cli("d64", "empty", &[])
}

#[test]
fn d64_round_trip_single_byte() -> STDRESULT {
    round_trip_via_cli("d64", "single", &[0x41])
}

#[test]
fn d64_round_trip_repeated_text() -> STDRESULT {
    round_trip_via_cli("d64", "repeated", &repeated_text())
}

#[test]
fn d64_round_trip_binary_data() -> STDRESULT {
    let data: Vec<u8> = (0..4000).map(|i| (i * 37 % 251) as u8).collect();
    round_trip_via_cli("d64", "binary", &data)
}

#[test]
fn jaguar_round_trip_empty() -> STDRESULT {
    round_trip_via_cli("jaguar", "empty", &[])
}

#[test]
fn jaguar_round_trip_single_byte() -> STDRESULT {
    round_trip_via_cli("jaguar", "single", &[0xAB])
}

#[test]
fn jaguar_round_trip_repeated_text() -> STDRESULT {
    round_trip_via_cli("jaguar", "repeated", &repeated_text())
}

#[test]
fn unsupported_method_is_rejected() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = Path::new("Cargo.toml");
    let out_path = temp_dir.path().join("out.bin");
    Command::cargo_bin("d64compress")?
        .arg("compress")
        .arg("-m").arg("lzhuf")
        .arg("-i").arg(in_path)
        .arg("-o").arg(&out_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
    Ok(())
}

#[test]
fn truncated_compressed_file_fails_to_expand() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("in.bin");
    let compressed_path = temp_dir.path().join("out.cmp");
    let truncated_path = temp_dir.path().join("truncated.cmp");
    let expanded_path = temp_dir.path().join("out.exp");
    std::fs::write(&in_path, repeated_text())?;

    Command::cargo_bin("d64compress")?
        .arg("compress")
        .arg("-m").arg("d64")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&compressed_path)
        .assert()
        .success();

    let mut compressed = std::fs::read(&compressed_path)?;
    compressed.truncate(compressed.len() - 1);
    std::fs::write(&truncated_path, &compressed)?;

    Command::cargo_bin("d64compress")?
        .arg("expand")
        .arg("-m").arg("d64")
        .arg("-i").arg(&truncated_path)
        .arg("-o").arg(&expanded_path)
        .assert()
        .failure();
    Ok(())
}
