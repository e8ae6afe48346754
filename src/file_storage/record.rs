//! On-disk object record format used by the disk backend
//!
//! ```text
//! +------------------+
//! | Record Length    | (u64 LE, whole record including this field)
//! +------------------+
//! | Hash             | (length-prefixed string)
//! +------------------+
//! | Name             | (length-prefixed string)
//! +------------------+
//! | Content Type     | (length-prefixed string)
//! +------------------+
//! | Payload          | (u64 LE length + bytes)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! Checksum covers all bytes except the checksum itself. Size is not stored
//! separately; it is the payload length.

use std::io::{self, Read, Write};

use super::checksum::{compute_checksum_parts, verify_checksum};
use super::hash::ContentHash;
use super::metadata::{FileMetadata, FileRecord};

const LEN_FIELD: usize = 8;
const CHECKSUM_FIELD: usize = 4;
/// length + three empty strings + payload length + checksum
const MIN_RECORD_SIZE: usize = LEN_FIELD + 4 * 3 + 8 + CHECKSUM_FIELD;

/// Serialize everything before the payload bytes.
fn encode_header(record: &FileRecord) -> Vec<u8> {
    let meta = &record.metadata;
    let strings = [meta.hash.as_str(), meta.name.as_str(), meta.content_type.as_str()];

    let body_len: usize = strings.iter().map(|s| 4 + s.len()).sum::<usize>() + 8;
    let record_length = (LEN_FIELD + body_len + record.data.len() + CHECKSUM_FIELD) as u64;

    let mut header = Vec::with_capacity(LEN_FIELD + body_len);
    header.extend_from_slice(&record_length.to_le_bytes());
    for s in strings {
        header.extend_from_slice(&(s.len() as u32).to_le_bytes());
        header.extend_from_slice(s.as_bytes());
    }
    header.extend_from_slice(&(record.data.len() as u64).to_le_bytes());
    header
}

/// Write a complete record to `writer` without copying the payload.
pub fn write_record<W: Write>(writer: &mut W, record: &FileRecord) -> io::Result<()> {
    let header = encode_header(record);
    let checksum = compute_checksum_parts(&[&header, &record.data]);

    writer.write_all(&header)?;
    writer.write_all(&record.data)?;
    writer.write_all(&checksum.to_le_bytes())?;
    Ok(())
}

/// Deserialize a record, verifying length and checksum.
pub fn decode_record(data: &[u8]) -> io::Result<FileRecord> {
    if data.len() < MIN_RECORD_SIZE {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "Record too short"));
    }

    let mut len_buf = [0u8; LEN_FIELD];
    len_buf.copy_from_slice(&data[..LEN_FIELD]);
    let record_length = u64::from_le_bytes(len_buf);

    if record_length != data.len() as u64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Record length mismatch: header says {} bytes, file has {}",
                record_length,
                data.len()
            ),
        ));
    }

    let checksum_offset = data.len() - CHECKSUM_FIELD;
    let mut checksum_buf = [0u8; CHECKSUM_FIELD];
    checksum_buf.copy_from_slice(&data[checksum_offset..]);
    let stored_checksum = u32::from_le_bytes(checksum_buf);

    if !verify_checksum(&data[..checksum_offset], stored_checksum) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Checksum mismatch: stored {:08x}", stored_checksum),
        ));
    }

    let body = &data[LEN_FIELD..checksum_offset];
    let mut cursor = io::Cursor::new(body);

    fn read_string<R: Read>(reader: &mut R) -> io::Result<String> {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf)?;
        let len = u32::from_le_bytes(len_buf) as usize;

        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf)?;

        String::from_utf8(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("Invalid UTF-8: {}", e)))
    }

    let hash = read_string(&mut cursor)?;
    let name = read_string(&mut cursor)?;
    let content_type = read_string(&mut cursor)?;

    let mut payload_len_buf = [0u8; 8];
    cursor.read_exact(&mut payload_len_buf)?;
    let payload_len = u64::from_le_bytes(payload_len_buf);

    let start = cursor.position() as usize;
    let remaining = (body.len() - start) as u64;
    if payload_len != remaining {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Payload length {} does not match remaining {}", payload_len, remaining),
        ));
    }

    let hash = ContentHash::parse(&hash).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, format!("Malformed hash: {}", hash))
    })?;

    Ok(FileRecord {
        metadata: FileMetadata {
            name,
            size: payload_len,
            hash,
            content_type,
        },
        data: body[start..].to_vec(),
    })
}
