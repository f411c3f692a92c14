//! Binary container layout: header, chunk scanning and chunk assembly.
//!
//! All integers are little-endian. A container is a 12-byte header followed
//! by length-prefixed chunks; this codec needs the JSON and BIN chunks and
//! skips anything else.

use serde_json::Value;

use super::error::{ChunkKind, FormatError, RebuildError};

/// Magic number, ASCII `glTF`.
pub const GLB_MAGIC: u32 = 0x46546C67;
/// The only container version this codec reads and writes.
pub const GLB_VERSION: u32 = 2;
/// Chunk type tag of the structural description, ASCII `JSON`.
pub const CHUNK_JSON: u32 = 0x4E4F534A;
/// Chunk type tag of the raw-data block, ASCII `BIN\0`.
pub const CHUNK_BIN: u32 = 0x004E4942;
/// Size of the file header.
pub const HEADER_LEN: usize = 12;
/// Size of a chunk header (length + type).
pub const CHUNK_HEADER_LEN: usize = 8;

/// A parsed container: the decoded structural document plus a view of the
/// raw-data block.
#[derive(Debug, Clone)]
pub struct Container<'a> {
    /// The JSON chunk, decoded into a generic tree.
    pub document: Value,
    /// The BIN chunk payload, borrowed from the input buffer.
    pub bin: &'a [u8],
    /// Total length claimed by the header. Not enforced.
    pub declared_length: u32,
}

/// Split a binary container into its structural document and raw block.
///
/// Chunks are read in file order until the buffer is exhausted. Unknown chunk
/// types are skipped. If a chunk type appears twice, the first one wins.
pub fn parse_container(data: &[u8]) -> Result<Container<'_>, FormatError> {
    if data.len() < 4 {
        return Err(FormatError::NotAContainer { found: 0 });
    }
    let magic = read_u32(data, 0)?;
    if magic != GLB_MAGIC {
        return Err(FormatError::NotAContainer { found: magic });
    }

    let version = read_u32(data, 4)?;
    if version != GLB_VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }

    let declared_length = read_u32(data, 8)?;
    if declared_length as usize != data.len() {
        log::warn!(
            "container header declares {} bytes but buffer holds {}",
            declared_length,
            data.len()
        );
    }

    let mut json_chunk: Option<&[u8]> = None;
    let mut bin_chunk: Option<&[u8]> = None;
    let mut offset = HEADER_LEN;

    while offset < data.len() {
        let length = read_u32(data, offset)? as usize;
        let kind = read_u32(data, offset + 4)?;
        let start = offset + CHUNK_HEADER_LEN;
        let payload = data
            .get(start..start.saturating_add(length))
            .ok_or(FormatError::Truncated {
                offset: start,
                needed: length,
                available: data.len().saturating_sub(start),
            })?;

        match kind {
            CHUNK_JSON if json_chunk.is_none() => json_chunk = Some(payload),
            CHUNK_BIN if bin_chunk.is_none() => bin_chunk = Some(payload),
            CHUNK_JSON | CHUNK_BIN => {
                log::warn!("duplicate chunk {kind:#010x} at offset {offset} ignored");
            }
            other => {
                log::debug!(
                    "skipping unknown chunk {other:#010x} ({length} bytes) at offset {offset}"
                );
            }
        }

        offset = start + length;
    }

    let json = json_chunk.ok_or(FormatError::MissingChunk(ChunkKind::Json))?;
    let bin = bin_chunk.ok_or(FormatError::MissingChunk(ChunkKind::Bin))?;

    let text = std::str::from_utf8(json)?;
    let document: Value = serde_json::from_str(text)?;

    log::debug!(
        "parsed container: {} byte JSON chunk, {} byte BIN chunk",
        json.len(),
        bin.len()
    );

    Ok(Container {
        document,
        bin,
        declared_length,
    })
}

/// Assemble a container from serialized JSON and a raw block.
///
/// Always emits exactly two chunks, JSON first. The JSON chunk is padded with
/// spaces and the BIN chunk with zeros up to a multiple of 4 bytes.
pub fn write_container(json: &[u8], bin: &[u8]) -> Result<Vec<u8>, RebuildError> {
    let json_pad = padding_for(json.len(), 4);
    let json_chunk_len = json.len() + json_pad;

    let bin_pad = padding_for(bin.len(), 4);
    let bin_chunk_len = bin.len() + bin_pad;

    let total_length =
        HEADER_LEN + CHUNK_HEADER_LEN + json_chunk_len + CHUNK_HEADER_LEN + bin_chunk_len;
    let total_u32 =
        u32::try_from(total_length).map_err(|_| RebuildError::TooLarge(total_length))?;

    let mut glb = Vec::with_capacity(total_length);

    // Header
    glb.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
    glb.extend_from_slice(&total_u32.to_le_bytes());

    // JSON chunk
    glb.extend_from_slice(&(json_chunk_len as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    glb.extend_from_slice(json);
    glb.extend(std::iter::repeat_n(b' ', json_pad));

    // BIN chunk
    glb.extend_from_slice(&(bin_chunk_len as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    glb.extend_from_slice(bin);
    glb.extend(std::iter::repeat_n(0u8, bin_pad));

    Ok(glb)
}

/// Bytes needed to bring `len` up to the next multiple of `align`.
pub(crate) fn padding_for(len: usize, align: usize) -> usize {
    (align - (len % align)) % align
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, FormatError> {
    let bytes = data
        .get(offset..offset.saturating_add(4))
        .ok_or(FormatError::Truncated {
            offset,
            needed: 4,
            available: data.len().saturating_sub(offset),
        })?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
