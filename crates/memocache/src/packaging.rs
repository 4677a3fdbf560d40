//! Installed-package directory lookup
//!
//! A package `foo` advertises its install location through the `FOO_DIR`
//! environment variable.

use std::env;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{Error, Result};

/// Name of the environment variable holding `package`'s directory
pub fn package_dir_var(package: &str) -> String {
    let mut var = package.to_ascii_uppercase();
    var.push_str("_DIR");
    var
}

/// Return the root directory of a setup package
///
/// Fails with [`Error::PackageNotFound`] when the package's `<NAME>_DIR`
/// variable is not set.
pub fn package_dir(package: &str) -> Result<PathBuf> {
    let var = package_dir_var(package);
    match env::var_os(&var) {
        Some(dir) => {
            debug!("Resolved package {} via {}: {:?}", package, var, dir);
            Ok(PathBuf::from(dir))
        }
        None => Err(Error::PackageNotFound(package.to_string())),
    }
}
