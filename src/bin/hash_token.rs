//! CLI tool to hash an admin token for `security.admin_token_hash`.
//!
//! Usage: `cargo run --bin hash-token -- <token>`
//!
//! Prints the Argon2id PHC string to stdout.

use std::process::ExitCode;

use static_html_importer::services::hash_token;

fn main() -> ExitCode {
    let Some(token) = std::env::args().nth(1) else {
        eprintln!("Usage: hash-token <token>");
        return ExitCode::FAILURE;
    };

    if token.trim().is_empty() {
        eprintln!("Token must not be empty");
        return ExitCode::FAILURE;
    }

    match hash_token(&token) {
        Ok(hash) => {
            println!("{}", hash);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
