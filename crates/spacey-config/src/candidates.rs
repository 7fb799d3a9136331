// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Candidate configuration file names.

use std::path::{Path, PathBuf};

/// Candidates the native host can run unmodified, highest priority first.
pub const NATIVE_CANDIDATES: &[&str] = &["astro.config.mjs", "astro.config.js"];

/// Candidates that need the transformation service, highest priority first.
pub const TRANSFORM_CANDIDATES: &[&str] = &["astro.config.ts", "astro.config.mts", "astro.config.cts"];

/// Joins each name onto `root`, preserving order.
///
/// Existence is not checked; a missing file is discovered when a strategy
/// attempts it.
pub fn resolve(root: &Path, names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(|name| root.join(name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_preserves_order() {
        let paths = resolve(Path::new("/p"), NATIVE_CANDIDATES);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/p/astro.config.mjs"),
                PathBuf::from("/p/astro.config.js")
            ]
        );
    }

    #[test]
    fn test_resolve_does_not_touch_disk() {
        let paths = resolve(Path::new("/definitely/not/here"), TRANSFORM_CANDIDATES);
        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("astro.config.ts"));
        assert!(paths[2].ends_with("astro.config.cts"));
    }
}
