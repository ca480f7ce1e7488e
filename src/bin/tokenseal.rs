//! Command-line filter around the codec: reads seed data as JSON (a string
//! or an array of strings) from stdin and writes the token bundle as JSON to
//! stdout.
//!
//! Usage: `tokenseal KEY [LIFETIME] [ALGORITHM]`
//!
//! KEY is read from the filesystem when a file exists at that path, otherwise
//! it is taken literally as key material.

use std::{
    env, fs,
    io::{self, Read},
    process::ExitCode,
};
use tokenseal::{codec::CodecConfig, token::Seed};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);

    let key_arg = args.next().ok_or("no private key specified")?;
    let private_key = match fs::read(&key_arg) {
        Ok(bytes) => bytes,
        Err(_) => key_arg.into_bytes(),
    };

    let mut config = CodecConfig::new(private_key);
    if let Some(lifetime) = args.next() {
        // An unparseable lifetime keeps the default, like a missing one.
        if let Ok(seconds) = lifetime.parse() {
            config = config.lifetime(seconds);
        }
    }
    if let Some(algorithm) = args.next() {
        config = config.algorithm(algorithm.parse()?);
    }
    let codec = config.build()?;

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    let seed: Seed = serde_json::from_str(input.trim())
        .map_err(|_| "input data must be a string or an array of strings")?;

    let bundle = codec.encode(seed)?;
    println!("{}", serde_json::to_string(&bundle)?);
    Ok(())
}
