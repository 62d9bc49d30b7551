// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::{Path, PathBuf};

use path_clean::clean;

pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

pub fn find_in_parent(path: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = PathBuf::from(path);

    loop {
        let file_path = current.join(filename);
        if file_path.exists() {
            return Some(file_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Where to read configuration from. `None` means run on defaults and environment only.
pub fn resolve_config_path<P: Into<PathBuf>>(
    find_in_parent: FindInParent,
    cwd: P,
    default_filename: &str,
    cli_file: Option<P>,
) -> Option<PathBuf> {
    let cli_file: Option<PathBuf> = cli_file.map(Into::into);
    let cwd = cwd.into();

    if let Some(cli_file) = cli_file {
        // config is passed in and is absolute
        if cli_file.is_absolute() {
            return Some(cli_file);
        }

        // config is passed in and is relative
        return Some(clean(cwd.join(cli_file)));
    }

    // search from cwd
    find_in_parent(&cwd, default_filename)
}

/// Resolve `path` against `base` unless it is absolute. `~` is expanded first.
pub fn relative_to(base: &Path, path: &Path) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref());
    if expanded.is_absolute() {
        return clean(expanded);
    }
    clean(base.join(expanded))
}
