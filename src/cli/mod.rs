pub mod config;
pub mod curve;
pub mod inspect;

use std::path::Path;
use std::process;

use burn::config::Config;

use netlab::Error;

/// Print an error and exit with status 1.
pub fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", err);
    process::exit(1);
}

/// Load a burn config from JSON, or fall back to `default` when no path is given.
pub fn load_config<C: Config>(path: Option<&Path>, default: impl FnOnce() -> C) -> Result<C, Error> {
    match path {
        None => Ok(default()),
        Some(path) => C::load(path).map_err(|err| Error::Load {
            path: path.to_path_buf(),
            message: err.to_string(),
        }),
    }
}
