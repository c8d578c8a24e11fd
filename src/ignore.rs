//! Name-based ignore predicate used while walking a directory tree.

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::ffi::OsStr;

/// Case-sensitive glob set matched against a single path component
/// (a file or directory name, never a full path).
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    set: GlobSet,
}

impl IgnoreMatcher {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            set: builder.build()?,
        })
    }

    pub fn is_ignored(&self, name: &OsStr) -> bool {
        self.set.is_match(name)
    }
}
