//! # Logle
//!
//! The command-line front end of logle-core. The binary in `main.rs` only
//! sets up logging and hands the parsed [`cli::Cli`] to [`cli::execute`].

pub mod cli;
