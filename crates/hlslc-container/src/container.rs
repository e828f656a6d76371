//! Container parsing and serialization.
//!
//! Sections never own their payload: [`Container::parse`] borrows from the
//! input buffer and [`Container::add_section`] borrows from the caller, so the
//! buffers must outlive the container. [`Container::serialize`] allocates the
//! single output buffer.

use core::fmt;

use hlslc_core::ContainerError;

use crate::FourCC;

/// Size of the fixed header that precedes the offset table.
pub const HEADER_LEN: usize = 4 + 16 + 4 + 4 + 4;

const CHUNK_HEADER_LEN: usize = 8;
const RESERVED_CONSTANT: u32 = 1;
const DEFAULT_CAPACITY: usize = 2;

// ============================================================================
// Section
// ============================================================================

/// A tagged, borrowed view over one chunk's payload.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    tag: FourCC,
    data: &'a [u8],
}

impl<'a> Section<'a> {
    pub fn new(tag: FourCC, data: &'a [u8]) -> Self {
        Self { tag, data }
    }

    pub fn tag(&self) -> FourCC {
        self.tag
    }

    /// Payload bytes, without the 8-byte chunk header.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Debug for Section<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("tag", &self.tag)
            .field("size", &self.data.len())
            .finish()
    }
}

// ============================================================================
// Container
// ============================================================================

/// An ordered list of sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container<'a> {
    sections: Vec<Section<'a>>,
}

impl<'a> Container<'a> {
    /// An empty container with room for two sections.
    pub fn new() -> Self {
        Self {
            sections: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// An empty container with room for `capacity` sections (two when zero).
    pub fn with_capacity(capacity: usize) -> Result<Self, ContainerError> {
        let capacity = if capacity == 0 { DEFAULT_CAPACITY } else { capacity };
        let mut sections = Vec::new();
        sections
            .try_reserve_exact(capacity)
            .map_err(|_| ContainerError::OutOfMemory)?;
        Ok(Self { sections })
    }

    /// Parses a container, borrowing every section payload from `bytes`.
    ///
    /// Fails with a malformed-container error when the magic is not `DXBC`,
    /// when the declared total size differs from `bytes.len()`, or when the
    /// offset table or a chunk lies outside the buffer.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ContainerError> {
        let magic = read_u32_le(bytes, 0)?;
        if magic != FourCC::DXBC.to_u32_le() {
            tracing::warn!(found = %FourCC::from_u32_le(magic), "bad container magic");
            return Err(ContainerError::BadMagic { found: magic });
        }

        // 16 reserved bytes at 4 and one reserved word at 20 are skipped.
        let total_size = read_u32_le(bytes, 24)?;
        if total_size as usize != bytes.len() {
            tracing::warn!(
                declared = total_size,
                actual = bytes.len(),
                "container size does not match buffer"
            );
            return Err(ContainerError::SizeMismatch {
                declared: total_size,
                actual: bytes.len(),
            });
        }

        let chunk_count = read_u32_le(bytes, 28)?;
        tracing::trace!(total_size, chunk_count, "parsing container");

        let table_len = (chunk_count as usize)
            .checked_mul(4)
            .ok_or(ContainerError::Truncated {
                offset: HEADER_LEN,
                needed: usize::MAX,
                len: bytes.len(),
            })?;
        ensure_available(bytes, HEADER_LEN, table_len)?;

        let mut container = Container::with_capacity(chunk_count as usize)?;
        for index in 0..chunk_count {
            let offset = read_u32_le(bytes, HEADER_LEN + index as usize * 4)?;
            let out_of_bounds = |size| ContainerError::ChunkOutOfBounds {
                index,
                offset,
                size,
            };

            let start = offset as usize;
            if start
                .checked_add(CHUNK_HEADER_LEN)
                .is_none_or(|end| end > bytes.len())
            {
                return Err(out_of_bounds(0));
            }
            let tag = FourCC::from_u32_le(read_u32_le(bytes, start)?);
            let size = read_u32_le(bytes, start + 4)?;

            let data_start = start + CHUNK_HEADER_LEN;
            let data = data_start
                .checked_add(size as usize)
                .and_then(|data_end| bytes.get(data_start..data_end))
                .ok_or_else(|| out_of_bounds(size))?;

            tracing::trace!(index, offset, %tag, size, "chunk");
            container.add_section(tag, data)?;
        }

        Ok(container)
    }

    /// Appends a section, doubling capacity when full.
    pub fn add_section(&mut self, tag: FourCC, data: &'a [u8]) -> Result<(), ContainerError> {
        if self.sections.len() == self.sections.capacity() {
            let grow_by = self.sections.capacity().max(DEFAULT_CAPACITY);
            self.sections
                .try_reserve_exact(grow_by)
                .map_err(|_| ContainerError::OutOfMemory)?;
        }
        self.sections.push(Section::new(tag, data));
        Ok(())
    }

    /// Total serialized size: header, offset table, and each chunk with its
    /// 8-byte header.
    pub fn serialized_size(&self) -> Result<u32, ContainerError> {
        let table = u32::try_from(self.sections.len())
            .ok()
            .and_then(|count| count.checked_mul(4))
            .ok_or(ContainerError::SizeOverflow)?;

        self.sections
            .iter()
            .try_fold(HEADER_LEN as u32, |acc, section| {
                u32::try_from(section.size())
                    .ok()
                    .and_then(|size| size.checked_add(CHUNK_HEADER_LEN as u32))
                    .and_then(|chunk| acc.checked_add(chunk))
            })
            .and_then(|chunks| chunks.checked_add(table))
            .ok_or(ContainerError::SizeOverflow)
    }

    /// Writes the container into a freshly allocated buffer of exactly
    /// [`serialized_size`](Self::serialized_size) bytes.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn serialize(&self) -> Result<Vec<u8>, ContainerError> {
        let total_size = self.serialized_size()?;
        let count = self.sections.len() as u32;

        let mut out = Vec::new();
        out.try_reserve_exact(total_size as usize)
            .map_err(|_| ContainerError::OutOfMemory)?;

        out.extend_from_slice(&FourCC::DXBC.0);
        out.extend_from_slice(&[0u8; 16]);
        out.extend_from_slice(&RESERVED_CONSTANT.to_le_bytes());
        out.extend_from_slice(&total_size.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());

        let mut offset = HEADER_LEN as u32 + 4 * count;
        for section in &self.sections {
            out.extend_from_slice(&offset.to_le_bytes());
            offset += CHUNK_HEADER_LEN as u32 + section.size() as u32;
        }

        for section in &self.sections {
            out.extend_from_slice(&section.tag.0);
            out.extend_from_slice(&(section.size() as u32).to_le_bytes());
            out.extend_from_slice(section.data);
        }

        debug_assert_eq!(out.len(), total_size as usize);
        tracing::trace!(total_size, count, "serialized container");
        Ok(out)
    }

    /// The first section with `tag`.
    pub fn section(&self, tag: FourCC) -> Option<&Section<'a>> {
        self.sections.iter().find(|s| s.tag == tag)
    }

    /// Every section with `tag`, in registration order.
    pub fn sections_with_tag(&self, tag: FourCC) -> impl Iterator<Item = &Section<'a>> + '_ {
        self.sections.iter().filter(move |s| s.tag == tag)
    }

    pub fn sections(&self) -> &[Section<'a>] {
        &self.sections
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section<'a>> + '_ {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Allocated section slots.
    pub fn capacity(&self) -> usize {
        self.sections.capacity()
    }
}

impl<'c, 'a> IntoIterator for &'c Container<'a> {
    type Item = &'c Section<'a>;
    type IntoIter = core::slice::Iter<'c, Section<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn ensure_available(bytes: &[u8], offset: usize, needed: usize) -> Result<(), ContainerError> {
    match offset.checked_add(needed) {
        Some(end) if end <= bytes.len() => Ok(()),
        _ => Err(ContainerError::Truncated {
            offset,
            needed,
            len: bytes.len(),
        }),
    }
}

fn read_u32_le(bytes: &[u8], offset: usize) -> Result<u32, ContainerError> {
    ensure_available(bytes, offset, 4)?;
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    Ok(u32::from_le_bytes(word))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::build_container;

    fn header(total_size: u32, chunk_count: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"DXBC");
        bytes.extend_from_slice(&[0u8; 16]);
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&total_size.to_le_bytes());
        bytes.extend_from_slice(&chunk_count.to_le_bytes());
        bytes
    }

    #[test]
    fn parse_single_empty_chunk() {
        let mut bytes = header(44, 1);
        bytes.extend_from_slice(&36u32.to_le_bytes());
        bytes.extend_from_slice(b"STAT");
        bytes.extend_from_slice(&0u32.to_le_bytes());
        assert_eq!(bytes.len(), 44);

        let container = Container::parse(&bytes).unwrap();
        assert_eq!(container.len(), 1);
        assert_eq!(container.sections()[0].tag(), FourCC::STAT);
        assert_eq!(container.sections()[0].size(), 0);
    }

    #[test]
    fn parse_empty_container_reserves_default_capacity() {
        let bytes = header(32, 0);
        let container = Container::parse(&bytes).unwrap();
        assert!(container.is_empty());
        assert!(container.capacity() >= 2);
    }

    #[test]
    fn parse_rejects_bad_magic() {
        let mut bytes = build_container(&[(FourCC::SHDR, &[1, 2, 3, 4])]);
        bytes[0] = b'X';
        let err = Container::parse(&bytes).unwrap_err();
        assert!(matches!(err, ContainerError::BadMagic { .. }));
        assert!(err.is_malformed());
    }

    #[test]
    fn parse_rejects_size_mismatch() {
        let mut bytes = build_container(&[(FourCC::SHDR, &[1, 2, 3, 4])]);
        bytes.push(0);
        let err = Container::parse(&bytes).unwrap_err();
        assert_eq!(
            err,
            ContainerError::SizeMismatch {
                declared: 48,
                actual: 49
            }
        );
    }

    #[test]
    fn parse_rejects_short_buffer() {
        let err = Container::parse(b"DXBC").unwrap_err();
        assert!(matches!(err, ContainerError::Truncated { .. }));
        assert!(err.is_malformed());
    }

    #[test]
    fn parse_rejects_chunk_past_end() {
        let mut bytes = header(44, 1);
        bytes.extend_from_slice(&36u32.to_le_bytes());
        bytes.extend_from_slice(b"SHDR");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        let err = Container::parse(&bytes).unwrap_err();
        assert_eq!(
            err,
            ContainerError::ChunkOutOfBounds {
                index: 0,
                offset: 36,
                size: 16
            }
        );
    }

    #[test]
    fn parse_borrows_input() {
        let bytes = build_container(&[(FourCC::RDEF, b"abcd")]);
        let container = Container::parse(&bytes).unwrap();
        let data = container.sections()[0].data();
        assert!(bytes.as_ptr_range().contains(&data.as_ptr()));
    }

    #[test]
    fn add_section_doubles_capacity() {
        let payload = [0u8; 4];
        let mut container = Container::new();
        assert_eq!(container.capacity(), 2);
        for _ in 0..3 {
            container.add_section(FourCC::STAT, &payload).unwrap();
        }
        assert_eq!(container.len(), 3);
        assert!(container.capacity() >= 4);
    }

    #[test]
    fn serialize_layout() {
        let a = [1u8, 2, 3];
        let b = [9u8; 5];
        let mut container = Container::new();
        container.add_section(FourCC::ISGN, &a).unwrap();
        container.add_section(FourCC::SHDR, &b).unwrap();

        let bytes = container.serialize().unwrap();
        // 32 + 2 * 4 + (8 + 3) + (8 + 5)
        assert_eq!(bytes.len(), 64);
        assert_eq!(container.serialized_size().unwrap(), 64);
        assert_eq!(&bytes[0..4], b"DXBC");
        assert!(bytes[4..20].iter().all(|&b| b == 0));
        assert_eq!(read_u32_le(&bytes, 20).unwrap(), 1);
        assert_eq!(read_u32_le(&bytes, 24).unwrap(), 64);
        assert_eq!(read_u32_le(&bytes, 28).unwrap(), 2);
        assert_eq!(read_u32_le(&bytes, 32).unwrap(), 40);
        assert_eq!(read_u32_le(&bytes, 36).unwrap(), 51);
        assert_eq!(&bytes[40..44], b"ISGN");
        assert_eq!(read_u32_le(&bytes, 44).unwrap(), 3);
        assert_eq!(&bytes[48..51], &a);
        assert_eq!(&bytes[51..55], b"SHDR");
        assert_eq!(&bytes[59..64], &b);
    }

    #[test]
    fn serialize_matches_reference_builder() {
        let rdef = b"resource definitions";
        let shdr = [0xAAu8; 12];
        let mut container = Container::new();
        container.add_section(FourCC::RDEF, rdef).unwrap();
        container.add_section(FourCC::SHDR, &shdr).unwrap();

        let expected = build_container(&[(FourCC::RDEF, rdef), (FourCC::SHDR, &shdr)]);
        assert_eq!(container.serialize().unwrap(), expected);
    }

    #[test]
    fn round_trip_preserves_order_and_duplicates() {
        let payloads: [&[u8]; 4] = [b"", b"one", b"two!", b"three"];
        let tags = [FourCC::STAT, FourCC::SHDR, FourCC::STAT, FourCC::OSGN];
        let mut container = Container::new();
        for (tag, data) in tags.iter().zip(payloads) {
            container.add_section(*tag, data).unwrap();
        }

        let bytes = container.serialize().unwrap();
        let parsed = Container::parse(&bytes).unwrap();
        assert_eq!(parsed.sections(), container.sections());
        assert_eq!(parsed.sections_with_tag(FourCC::STAT).count(), 2);
        assert_eq!(parsed.section(FourCC::STAT).map(|s| s.size()), Some(0));
        assert!(parsed.section(FourCC::RDEF).is_none());
    }
}
