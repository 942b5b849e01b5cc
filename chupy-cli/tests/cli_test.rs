//! End-to-end tests driving the `chupy` binary.

use assert_cmd::prelude::*;
use std::process::Command;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn chupy() -> Command {
    Command::cargo_bin("chupy").expect("binary builds")
}

#[test]
fn file_compress_decompress_roundtrip() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("notes.txt");
    let packed = dir.path().join("notes.chupy");
    let restored = dir.path().join("restored.txt");

    let content = b"ABRACADABRA ABRACADABRA ABRACADABRA".repeat(20);
    std::fs::write(&input, &content)?;

    chupy()
        .args(["-c", "--comp-alg", "deflate"])
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&packed)
        .assert()
        .success();

    chupy()
        .args(["-d", "--comp-alg", "deflate"])
        .arg("-i")
        .arg(&packed)
        .arg("-o")
        .arg(&restored)
        .assert()
        .success();

    assert_eq!(std::fs::read(&restored)?, content);
    Ok(())
}

#[test]
fn decompress_restores_stored_extension() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("photo.raw");
    let packed = dir.path().join("photo.chupy");

    std::fs::write(&input, b"not really a photo")?;

    chupy()
        .args(["-c", "--comp-alg", "deflate"])
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&packed)
        .assert()
        .success();

    // Output named without an extension: the stored one is applied.
    chupy()
        .args(["-d", "--comp-alg", "deflate"])
        .arg("-i")
        .arg(&packed)
        .arg("-o")
        .arg(dir.path().join("restored"))
        .assert()
        .success();

    assert_eq!(
        std::fs::read(dir.path().join("restored.raw"))?,
        b"not really a photo"
    );
    Ok(())
}

#[test]
fn directory_archive_roundtrip() -> TestResult {
    let dir = tempfile::tempdir()?;
    let src = dir.path().join("src");
    std::fs::create_dir_all(src.join("sub"))?;
    std::fs::write(src.join("a.txt"), b"hello")?;
    let bin_content: Vec<u8> = (0..=255u8).collect();
    std::fs::write(src.join("sub/b.bin"), &bin_content)?;

    let packed = dir.path().join("src.chupydir");
    let out = dir.path().join("out");

    chupy()
        .args(["-c", "--comp-alg", "deflate"])
        .arg("-i")
        .arg(&src)
        .arg("-o")
        .arg(&packed)
        .assert()
        .success();

    chupy()
        .args(["-d", "--comp-alg", "deflate"])
        .arg("-i")
        .arg(&packed)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    assert_eq!(std::fs::read(out.join("a.txt"))?, b"hello");
    assert_eq!(std::fs::read(out.join("sub/b.bin"))?, bin_content);
    Ok(())
}

#[test]
fn encrypt_decrypt_roundtrip() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("secret.txt");
    let encrypted = dir.path().join("secret.enc");
    let restored = dir.path().join("secret.out");

    std::fs::write(&input, b"the cake is a lie")?;

    chupy()
        .args(["-e", "--enc-alg", "chacha20", "-k", "hunter2"])
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&encrypted)
        .assert()
        .success();

    // Ciphertext is nonce + payload and differs from the plaintext.
    let ct = std::fs::read(&encrypted)?;
    assert_eq!(ct.len(), 12 + 17);
    assert_ne!(&ct[12..], b"the cake is a lie");

    chupy()
        .args(["-u", "--enc-alg", "chacha20", "-k", "hunter2"])
        .arg("-i")
        .arg(&encrypted)
        .arg("-o")
        .arg(&restored)
        .assert()
        .success();

    assert_eq!(std::fs::read(&restored)?, b"the cake is a lie");
    Ok(())
}

#[test]
fn compress_encrypt_then_decrypt_decompress() -> TestResult {
    let dir = tempfile::tempdir()?;
    let src = dir.path().join("tree");
    std::fs::create_dir_all(src.join("deep/deeper"))?;
    std::fs::write(src.join("top.txt"), b"top level")?;
    std::fs::write(src.join("deep/deeper/leaf.txt"), b"leaf data".repeat(100))?;

    let sealed = dir.path().join("tree.enc");
    let out = dir.path().join("tree-out");

    chupy()
        .args([
            "-ce",
            "--comp-alg",
            "deflate",
            "--enc-alg",
            "chacha20",
            "-k",
            "correct horse battery staple",
        ])
        .arg("-i")
        .arg(&src)
        .arg("-o")
        .arg(&sealed)
        .assert()
        .success();

    chupy()
        .args([
            "-ud",
            "--comp-alg",
            "deflate",
            "--enc-alg",
            "chacha20",
            "-k",
            "correct horse battery staple",
        ])
        .arg("-i")
        .arg(&sealed)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    assert_eq!(std::fs::read(out.join("top.txt"))?, b"top level");
    assert_eq!(
        std::fs::read(out.join("deep/deeper/leaf.txt"))?,
        b"leaf data".repeat(100)
    );
    Ok(())
}

#[test]
fn flipped_magic_fails_with_bad_magic() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("data.txt");
    let packed = dir.path().join("data.chupy");

    std::fs::write(&input, b"some bytes")?;

    chupy()
        .args(["-c", "--comp-alg", "deflate"])
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&packed)
        .assert()
        .success();

    // Flip the first magic byte from 'C' to 'X'.
    let mut bytes = std::fs::read(&packed)?;
    assert_eq!(bytes[0], b'C');
    bytes[0] = b'X';
    std::fs::write(&packed, &bytes)?;

    chupy()
        .args(["-d", "--comp-alg", "deflate"])
        .arg("-i")
        .arg(&packed)
        .arg("-o")
        .arg(dir.path().join("out.txt"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicates::str::contains("magic"));
    Ok(())
}

#[test]
fn wrong_algorithm_rejected() -> TestResult {
    chupy()
        .args(["-c", "--comp-alg", "lzma", "-i", "x", "-o", "y"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicates::str::contains("Unsupported algorithm"));
    Ok(())
}

#[test]
fn missing_operation_rejected() -> TestResult {
    chupy()
        .args(["-i", "x", "-o", "y"])
        .assert()
        .failure()
        .code(1);
    Ok(())
}

#[test]
fn conflicting_operations_rejected() -> TestResult {
    chupy()
        .args(["-c", "-d", "--comp-alg", "deflate", "-i", "x", "-o", "y"])
        .assert()
        .failure()
        .code(1);
    Ok(())
}

#[test]
fn missing_input_file_reports_path() -> TestResult {
    let dir = tempfile::tempdir()?;
    chupy()
        .args(["-c", "--comp-alg", "deflate"])
        .arg("-i")
        .arg(dir.path().join("does-not-exist.txt"))
        .arg("-o")
        .arg(dir.path().join("out.chupy"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicates::str::contains("does-not-exist.txt"));
    Ok(())
}

#[test]
fn help_prints_usage() -> TestResult {
    chupy()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("-c"))
        .stdout(predicates::str::contains("--comp-alg"));
    Ok(())
}
