//! DXBC container codec.
//!
//! A DXBC container bundles a compiled shader blob with named metadata
//! chunks (`RDEF`, `ISGN`, `SHDR`, ...), located through an offset table.
//!
//! ## Wire layout
//!
//! All fields are little-endian `u32`s; there is no padding between chunks.
//!
//! ```text
//! offset  size  field
//! 0       4     magic "DXBC"
//! 4       16    reserved (zero on write, ignored on read)
//! 20      4     reserved (1 on write)
//! 24      4     total size, equal to the buffer length
//! 28      4     chunk count
//! 32      4*n   absolute chunk offsets
//! ...           per chunk: tag (4), payload size (4), payload
//! ```
//!
//! ## Usage
//!
//! ```
//! use hlslc_container::{Container, FourCC};
//!
//! let shader = [0xAAu8, 0xBB, 0xCC, 0xDD];
//! let mut container = Container::new();
//! container.add_section(FourCC::SHDR, &shader)?;
//!
//! let bytes = container.serialize()?;
//! let parsed = Container::parse(&bytes)?;
//! assert_eq!(parsed.section(FourCC::SHDR).map(|s| s.data()), Some(&shader[..]));
//! # Ok::<(), hlslc_core::ContainerError>(())
//! ```

mod container;
mod tag;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use container::{Container, Section, HEADER_LEN};
pub use tag::FourCC;
