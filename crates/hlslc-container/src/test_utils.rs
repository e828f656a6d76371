//! Helpers for building container fixtures by hand.

use crate::FourCC;

/// Builds a well-formed container holding `chunks`, independently of
/// [`Container::serialize`](crate::Container::serialize).
///
/// The 16 reserved bytes are zero and the reserved word is 1, so the output
/// is byte-identical to what the serializer produces for the same chunks.
pub fn build_container(chunks: &[(FourCC, &[u8])]) -> Vec<u8> {
    let table_len = 4 * chunks.len();
    let chunk_bytes = chunks.iter().map(|(_, data)| 8 + data.len()).sum::<usize>();
    let mut out = Vec::with_capacity(crate::HEADER_LEN + table_len + chunk_bytes);

    out.extend_from_slice(b"DXBC");
    out.extend_from_slice(&[0u8; 16]);
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // total size, patched below
    out.extend_from_slice(&(chunks.len() as u32).to_le_bytes());

    let table_pos = out.len();
    out.resize(out.len() + table_len, 0);

    for (i, (tag, data)) in chunks.iter().enumerate() {
        let offset = out.len() as u32;
        out[table_pos + i * 4..table_pos + i * 4 + 4].copy_from_slice(&offset.to_le_bytes());

        out.extend_from_slice(&tag.0);
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
    }

    let total_size = out.len() as u32;
    out[24..28].copy_from_slice(&total_size.to_le_bytes());
    out
}
