//! Chupy CLI - compress, encrypt, and archive files.
//!
//! One binary, flag-driven: `-c` compress, `-d` decompress, `-e` encrypt,
//! `-u` decrypt, and the combinations `-ce` (compress then encrypt) and
//! `-ud` (decrypt then decompress). Compression of a directory produces a
//! `.chupydir` archive; a single file produces a `.chupy` file.

mod fsops;

use chupy_archive::chupydir::CHUPYDIR_MAGIC;
use chupy_archive::{ChupyDirArchive, chupy, chupydir, encrypted};
use chupy_core::error::{ChupyError, Result};
use chupy_crypto::derive_key;
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "chupy")]
#[command(version, about = "Compress and encrypt files and directories")]
#[command(long_about = "\
Chupy compresses files and directory trees with a DEFLATE-style pipeline
and optionally encrypts them with ChaCha20 under a password-derived key.

Examples:
  chupy -c -i notes.txt -o notes.chupy --comp-alg deflate
  chupy -d -i notes.chupy -o notes.txt --comp-alg deflate
  chupy -c -i project/ -o project.chupydir --comp-alg deflate
  chupy -e -i notes.txt -o notes.enc --enc-alg chacha20 -k secret
  chupy -ce -i project/ -o project.enc --comp-alg deflate --enc-alg chacha20 -k secret
  chupy -ud -i project.enc -o project/ --comp-alg deflate --enc-alg chacha20 -k secret
")]
struct Cli {
    /// Compress the input
    #[arg(short = 'c')]
    compress: bool,

    /// Decompress the input
    #[arg(short = 'd')]
    decompress: bool,

    /// Encrypt the input
    #[arg(short = 'e')]
    encrypt: bool,

    /// Decrypt the input
    #[arg(short = 'u')]
    decrypt: bool,

    /// Input path (file, or directory when compressing)
    #[arg(short = 'i', value_name = "PATH")]
    input: PathBuf,

    /// Output path
    #[arg(short = 'o', value_name = "PATH")]
    output: PathBuf,

    /// Compression algorithm (only "deflate" is accepted)
    #[arg(long = "comp-alg", value_name = "NAME")]
    comp_alg: Option<String>,

    /// Encryption algorithm (only "chacha20" is accepted)
    #[arg(long = "enc-alg", value_name = "NAME")]
    enc_alg: Option<String>,

    /// Password for encryption/decryption
    #[arg(short = 'k', value_name = "STR")]
    password: Option<String>,
}

/// The selected operation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Compress,
    Decompress,
    Encrypt,
    Decrypt,
    CompressEncrypt,
    DecryptDecompress,
}

impl Mode {
    fn uses_compression(self) -> bool {
        matches!(
            self,
            Mode::Compress | Mode::Decompress | Mode::CompressEncrypt | Mode::DecryptDecompress
        )
    }

    fn uses_encryption(self) -> bool {
        matches!(
            self,
            Mode::Encrypt | Mode::Decrypt | Mode::CompressEncrypt | Mode::DecryptDecompress
        )
    }
}

/// Apply the operation-mode validity matrix.
fn resolve_mode(cli: &Cli) -> Result<Mode> {
    let mode = match (cli.compress, cli.decompress, cli.encrypt, cli.decrypt) {
        (true, false, false, false) => Mode::Compress,
        (false, true, false, false) => Mode::Decompress,
        (false, false, true, false) => Mode::Encrypt,
        (false, false, false, true) => Mode::Decrypt,
        (true, false, true, false) => Mode::CompressEncrypt,
        (false, true, false, true) => Mode::DecryptDecompress,
        (false, false, false, false) => {
            return Err(ChupyError::invalid_args(
                "no operation selected; use -c, -d, -e, -u, -ce or -ud",
            ));
        }
        _ => {
            return Err(ChupyError::invalid_args(
                "conflicting operation flags; use exactly one of -c, -d, -e, -u, -ce, -ud",
            ));
        }
    };

    if mode.uses_compression() {
        match cli.comp_alg.as_deref() {
            Some("deflate") => {}
            Some(other) => return Err(ChupyError::unsupported_algorithm(other)),
            None => {
                return Err(ChupyError::invalid_args(
                    "compression operations require --comp-alg",
                ));
            }
        }
    }

    if mode.uses_encryption() {
        match cli.enc_alg.as_deref() {
            Some("chacha20") => {}
            Some(other) => return Err(ChupyError::unsupported_algorithm(other)),
            None => {
                return Err(ChupyError::invalid_args(
                    "encryption operations require --enc-alg",
                ));
            }
        }
        if cli.password.is_none() {
            return Err(ChupyError::invalid_args(
                "encryption operations require a password (-k)",
            ));
        }
    }

    Ok(mode)
}

fn main() {
    // A failing run always exits 1; clap's default of 2 for usage errors
    // does not apply here. Help and version still exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Derive the cipher key, wiping the password buffer immediately.
fn derive_cli_key(cli: &Cli) -> Result<[u8; 32]> {
    let password = cli
        .password
        .as_ref()
        .ok_or_else(|| ChupyError::invalid_args("encryption operations require a password (-k)"))?;
    let mut bytes = password.clone().into_bytes();
    Ok(derive_key(&mut bytes))
}

fn run(cli: Cli) -> Result<()> {
    let mode = resolve_mode(&cli)?;

    match mode {
        Mode::Compress => {
            let output = compress_input(&cli.input)?;
            fsops::write_file(&cli.output, &output.bytes)?;
            println!(
                "{} -> {} bytes ({:.1}%)",
                output.original_size,
                output.bytes.len(),
                percent(output.bytes.len(), output.original_size)
            );
        }
        Mode::Decompress => {
            let data = fsops::read_file(&cli.input)?;
            decompress_to(&data, &cli.output)?;
        }
        Mode::Encrypt => {
            let key = derive_cli_key(&cli)?;
            let data = fsops::read_file(&cli.input)?;
            let encrypted = encrypted::encrypt(&data, &key)?;
            fsops::write_file(&cli.output, &encrypted)?;
        }
        Mode::Decrypt => {
            let key = derive_cli_key(&cli)?;
            let data = fsops::read_file(&cli.input)?;
            let decrypted = encrypted::decrypt(&data, &key)?;
            fsops::write_file(&cli.output, &decrypted)?;
        }
        Mode::CompressEncrypt => {
            let key = derive_cli_key(&cli)?;
            let output = compress_input(&cli.input)?;
            let encrypted = encrypted::encrypt(&output.bytes, &key)?;
            fsops::write_file(&cli.output, &encrypted)?;
            println!(
                "{} -> {} bytes ({:.1}%)",
                output.original_size,
                encrypted.len(),
                percent(encrypted.len(), output.original_size)
            );
        }
        Mode::DecryptDecompress => {
            let key = derive_cli_key(&cli)?;
            let data = fsops::read_file(&cli.input)?;
            let decrypted = encrypted::decrypt(&data, &key)?;
            decompress_to(&decrypted, &cli.output)?;
        }
    }

    Ok(())
}

/// A compressed container plus the size it started from.
struct CompressedOutput {
    bytes: Vec<u8>,
    original_size: u64,
}

/// Compress a file into a `.chupy` container or a directory into a
/// `.chupydir` archive.
fn compress_input(input: &Path) -> Result<CompressedOutput> {
    if input.is_dir() {
        let files = fsops::read_dir_files(input)?;
        let original_size = files.iter().map(|(_, data)| data.len() as u64).sum();
        let bytes = chupydir::pack_files(&files)?;
        Ok(CompressedOutput {
            bytes,
            original_size,
        })
    } else {
        let data = fsops::read_file(input)?;
        let extension = input
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let original_size = data.len() as u64;
        let bytes = chupy::compress(&data, &extension)?;
        Ok(CompressedOutput {
            bytes,
            original_size,
        })
    }
}

/// Decompress container bytes to the output path, dispatching on the
/// container magic.
fn decompress_to(data: &[u8], output: &Path) -> Result<()> {
    if data.starts_with(&CHUPYDIR_MAGIC) {
        let archive = ChupyDirArchive::read(data)?;
        fsops::extract_archive(&archive, output)
    } else {
        let (header, restored) = chupy::decompress(data)?;
        let path = restore_extension(output, &header.extension);
        fsops::write_file(&path, &restored)
    }
}

/// Append the stored extension when the requested output has none.
fn restore_extension(output: &Path, stored: &str) -> PathBuf {
    if output.extension().is_none() && !stored.is_empty() {
        let mut name = output.as_os_str().to_os_string();
        name.push(stored);
        PathBuf::from(name)
    } else {
        output.to_path_buf()
    }
}

fn percent(part: usize, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}
