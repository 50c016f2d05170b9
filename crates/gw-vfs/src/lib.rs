//! Read-only file system abstraction for the goweb site engine.
//!
//! All content served by the engine is read through the [`Vfs`] trait, so the
//! same code paths work against an OS directory ([`DirFs`]), an overlay of
//! several trees ([`UnionFs`]), or an in-memory tree for tests ([`MemFs`],
//! behind the `mem` feature).
//!
//! # Path Convention
//!
//! All paths are slash-separated, relative, UTF-8 strings:
//! - `"."` - the root
//! - `"doc/install.md"` - a file
//! - `"doc"` - a directory
//!
//! A path is valid when it has no empty, `.` or `..` elements and no leading
//! or trailing slash. [`check_path`] enforces this before any backend I/O.

mod dir;
#[cfg(feature = "mem")]
mod mem;
mod union;
mod vfs;

pub use dir::DirFs;
#[cfg(feature = "mem")]
pub use mem::MemFs;
pub use union::UnionFs;
pub use vfs::{DirEntry, FileInfo, Vfs, VfsError, VfsErrorKind, check_path, file_ext, path_dir, path_join};
