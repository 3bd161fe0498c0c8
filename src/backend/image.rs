//! Store image encoding
//!
//! Frames a bincode-encoded `StoreImage` with a checksummed header.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, RmsError};

use super::{StoreImage, FORMAT_VERSION, HEADER_SIZE, MAGIC};

/// Encode an image into its on-disk representation
pub fn encode_image(image: &StoreImage) -> Result<Vec<u8>> {
    let body = bincode::serialize(image)?;
    let body_len = u32::try_from(body.len()).map_err(|_| {
        RmsError::Serialization(format!("Store image too large: {} bytes", body.len()))
    })?;

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + body.len());
    buf.put_slice(MAGIC);
    buf.put_u16_le(FORMAT_VERSION);
    buf.put_u32_le(body_len);
    buf.put_u32_le(crc32fast::hash(&body));
    buf.put_slice(&body);

    Ok(buf.to_vec())
}

/// Decode and validate an on-disk image
///
/// Rejects bad magic, unknown versions, truncated bodies, checksum
/// mismatches, and images whose bookkeeping disagrees with their records.
pub fn decode_image(bytes: &[u8]) -> Result<StoreImage> {
    if bytes.len() < HEADER_SIZE {
        return Err(RmsError::Corruption(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_SIZE];
    if &header[0..4] != MAGIC {
        return Err(RmsError::Corruption(format!(
            "Invalid image magic: expected RMS1, got {:?}",
            &header[0..4]
        )));
    }
    header.advance(4);

    let version = header.get_u16_le();
    if version != FORMAT_VERSION {
        return Err(RmsError::Corruption(format!(
            "Unsupported image version: {}",
            version
        )));
    }

    let body_len = header.get_u32_le() as usize;
    let expected_crc = header.get_u32_le();

    let body = &bytes[HEADER_SIZE..];
    if body.len() != body_len {
        return Err(RmsError::Corruption(format!(
            "Body length mismatch: header says {}, found {}",
            body_len,
            body.len()
        )));
    }

    let actual_crc = crc32fast::hash(body);
    if actual_crc != expected_crc {
        return Err(RmsError::Corruption(format!(
            "Checksum mismatch: expected {:08x}, got {:08x}",
            expected_crc, actual_crc
        )));
    }

    let image: StoreImage = bincode::deserialize(body)?;
    validate(&image)?;
    Ok(image)
}

/// Write an image atomically (temp file + rename)
///
/// On failure the previous image at `path` is left in place.
pub fn write_image(path: &Path, image: &StoreImage) -> Result<()> {
    let bytes = encode_image(image)?;
    let tmp_path = path.with_extension("rms.tmp");

    let written = File::create(&tmp_path)
        .and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp_path, path));

    if let Err(e) = written {
        // Best effort; the temp path may not be a file at all
        let _ = fs::remove_file(&tmp_path);
        return Err(RmsError::Io(e));
    }

    Ok(())
}

/// Read and decode an image file
pub fn read_image(path: &Path) -> Result<StoreImage> {
    let bytes = fs::read(path)?;
    decode_image(&bytes)
}

fn validate(image: &StoreImage) -> Result<()> {
    if image.next_id == 0 {
        return Err(RmsError::Corruption("next_id must be positive".to_string()));
    }

    if let Some((&first, _)) = image.records.first_key_value() {
        if first == 0 {
            return Err(RmsError::Corruption("record id 0 is reserved".to_string()));
        }
    }
    if let Some((&last, _)) = image.records.last_key_value() {
        if last >= image.next_id {
            return Err(RmsError::Corruption(format!(
                "record id {} not below next_id {}",
                last, image.next_id
            )));
        }
    }

    let used: usize = image.records.values().map(Vec::len).sum();
    if used != image.used_bytes {
        return Err(RmsError::Corruption(format!(
            "used_bytes {} disagrees with record total {}",
            image.used_bytes, used
        )));
    }

    Ok(())
}
