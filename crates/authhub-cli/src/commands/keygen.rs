//! Signing key generation.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

use authhub_auth::jwt::SigningKeys;
use authhub_core::error::{AppError, ErrorKind};
use authhub_core::result::AppResult;

use crate::output;

/// Private key file name.
pub const PRIVATE_KEY_FILE: &str = "jwt_private.pem";
/// Public key file name.
pub const PUBLIC_KEY_FILE: &str = "jwt_public.pem";

/// Arguments for the keygen command
#[derive(Debug, Args)]
pub struct KeygenArgs {
    /// Directory the PEM files are written to
    #[arg(long, default_value = "keys")]
    pub out_dir: PathBuf,

    /// RSA modulus size in bits
    #[arg(long, default_value_t = 2048)]
    pub bits: usize,

    /// Overwrite existing key files
    #[arg(long)]
    pub force: bool,
}

/// Generates a key pair and writes it to `out_dir`.
pub fn execute(args: &KeygenArgs) -> AppResult<()> {
    let (private_path, public_path) = write_key_pair(&args.out_dir, args.bits, args.force)?;
    output::print_success("Generated RSA signing key pair");
    output::print_kv("Private key", &private_path.display().to_string());
    output::print_kv("Public key", &public_path.display().to_string());
    output::print_warning("Keep the private key out of version control.");
    Ok(())
}

fn write_key_pair(out_dir: &Path, bits: usize, force: bool) -> AppResult<(PathBuf, PathBuf)> {
    if bits < 2048 {
        return Err(AppError::validation("RSA keys must be at least 2048 bits"));
    }

    let private_path = out_dir.join(PRIVATE_KEY_FILE);
    let public_path = out_dir.join(PUBLIC_KEY_FILE);
    if !force && (private_path.exists() || public_path.exists()) {
        return Err(AppError::conflict(format!(
            "Key files already exist in {}; pass --force to replace them",
            out_dir.display()
        )));
    }

    let (private_pem, public_pem) = SigningKeys::generate_pem_pair(bits)?;
    fs::create_dir_all(out_dir).map_err(|e| io_error(out_dir, e))?;
    fs::write(&private_path, private_pem).map_err(|e| io_error(&private_path, e))?;
    restrict_permissions(&private_path)?;
    fs::write(&public_path, public_pem).map_err(|e| io_error(&public_path, e))?;

    Ok((private_path, public_path))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> AppResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_error(path, e))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> AppResult<()> {
    Ok(())
}

fn io_error(path: &Path, e: std::io::Error) -> AppError {
    AppError::with_source(
        ErrorKind::Internal,
        format!("Failed to write {}", path.display()),
        e,
    )
}
