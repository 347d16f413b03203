//! Produce an Argon2 hash for provisioning the administrator record.
//!
//! Reads the password from stdin so it never lands in shell history:
//!
//! ```sh
//! printf '%s' 'the-password' | hash-password
//! ```
//!
//! Insert the printed hash into the `administrator` table, see
//! `db/sql/01_kustos.sql`.

use anyhow::{Context, Result, bail};
use kustos::credentials::password::hash_password;
use std::io::Read;

fn main() -> Result<()> {
    let mut password = String::new();
    std::io::stdin()
        .read_to_string(&mut password)
        .context("Failed to read password from stdin")?;

    let password = password.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("Refusing to hash an empty password");
    }

    println!("{}", hash_password(password)?);
    Ok(())
}
