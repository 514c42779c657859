//! Prints a password digest for `auth.password_hash`.
//!
//! Argon2 by default; `--sha512` prints the hex SHA-512 form instead, which
//! is what a plain `password.txt` holds.

use std::io::{self, Write};

use hummingbird_core::PasswordDigest;

fn main() -> anyhow::Result<()> {
    let legacy = std::env::args().skip(1).any(|arg| arg == "--sha512");

    eprint!("Enter password: ");
    io::stderr().flush()?;

    let mut password = String::new();
    io::stdin().read_line(&mut password)?;
    let password = password.trim();

    if password.is_empty() {
        eprintln!("Password cannot be empty");
        std::process::exit(1);
    }

    let digest = if legacy {
        PasswordDigest::sha512_of(password)
    } else {
        PasswordDigest::argon2_of(password)?
    };

    println!("{}", digest.encoded());
    Ok(())
}
