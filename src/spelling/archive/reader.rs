//! ZIP member lookup and extraction.

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use flate2::Crc;
use log::trace;

use super::{CENTRAL_HEADER_SIGNATURE, EOCD_SIGNATURE, LOCAL_HEADER_SIGNATURE, METHOD_DEFLATE, METHOD_STORED};
use crate::spelling::error::{Result, SpellingError};

/// Fixed part of the end-of-central-directory record.
const EOCD_LEN: u64 = 22;
/// EOCD fixed part plus the maximum archive comment length.
const EOCD_SEARCH_WINDOW: u64 = EOCD_LEN + u16::MAX as u64;

const FLAG_ENCRYPTED: u16 = 0x0001;

/// One member as recorded in the central directory.
#[derive(Debug, Clone)]
pub struct ZipEntry {
    pub name: String,
    pub uncompressed_size: u64,
    method: u16,
    flags: u16,
    crc32: u32,
    compressed_size: u64,
    header_offset: u64,
}

/// A ZIP container opened for member reads.
///
/// The central directory is parsed eagerly on open; member payloads are
/// read, inflated and checksum-verified on demand.
#[derive(Debug)]
pub struct ZipArchive<R: Read + Seek> {
    reader: R,
    entries: Vec<ZipEntry>,
}

impl<R: Read + Seek> ZipArchive<R> {
    /// Open a container and parse its central directory.
    ///
    /// # Errors
    /// Returns an error if the end-of-central-directory record cannot be
    /// located (truncated or not a ZIP container) or any central directory
    /// entry is malformed.
    pub fn new(mut reader: R) -> Result<Self> {
        let file_len = reader.seek(SeekFrom::End(0))?;
        let (cd_offset, cd_size, entry_count) = locate_central_directory(&mut reader, file_len)?;
        trace!(
            "Central directory: offset={}, size={}, entries={}",
            cd_offset,
            cd_size,
            entry_count
        );

        if cd_offset + cd_size > file_len {
            return Err(SpellingError::InvalidArchive(
                "central directory extends past end of file".to_string(),
            ));
        }

        reader.seek(SeekFrom::Start(cd_offset))?;
        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            entries.push(parse_central_entry(&mut reader)?);
        }

        Ok(Self { reader, entries })
    }

    /// All members in central directory order.
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Member names in central directory order.
    pub fn member_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// Whether a member with this exact name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Read, decompress and checksum-verify one member.
    ///
    /// # Errors
    /// [`ArchiveMemberMissing`](SpellingError::ArchiveMemberMissing) if no
    /// member has this name; otherwise a typed error for encrypted members,
    /// unknown compression methods, size mismatches or CRC failures.
    pub fn read_member(&mut self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .cloned()
            .ok_or_else(|| SpellingError::ArchiveMemberMissing {
                member: name.to_string(),
            })?;
        self.read_entry(&entry)
    }

    fn read_entry(&mut self, entry: &ZipEntry) -> Result<Vec<u8>> {
        trace!(
            "Reading member {:?}: method={}, {} -> {} bytes",
            entry.name,
            entry.method,
            entry.compressed_size,
            entry.uncompressed_size
        );
        if entry.flags & FLAG_ENCRYPTED != 0 {
            return Err(SpellingError::InvalidArchive(format!(
                "member {:?} is encrypted",
                entry.name
            )));
        }

        let payload_offset = self.locate_payload(entry)?;
        self.reader.seek(SeekFrom::Start(payload_offset))?;
        let mut compressed = vec![0u8; entry.compressed_size as usize];
        self.reader.read_exact(&mut compressed)?;

        let data = match entry.method {
            METHOD_STORED => compressed,
            METHOD_DEFLATE => {
                let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
                DeflateDecoder::new(compressed.as_slice()).read_to_end(&mut out)?;
                out
            }
            other => {
                return Err(SpellingError::InvalidArchive(format!(
                    "member {:?} uses unsupported compression method {}",
                    entry.name, other
                )));
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            return Err(SpellingError::SizeMismatch {
                context: "member payload",
                expected: entry.uncompressed_size,
                found: data.len() as u64,
            });
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            return Err(SpellingError::ChecksumMismatch {
                expected: entry.crc32,
                actual: crc.sum(),
            });
        }

        Ok(data)
    }

    /// Resolve the payload start by walking the member's local header.
    ///
    /// Sizes come from the central directory; the local header's name and
    /// extra-field lengths may differ from the central copy and are read
    /// from the local record itself.
    fn locate_payload(&mut self, entry: &ZipEntry) -> Result<u64> {
        self.reader.seek(SeekFrom::Start(entry.header_offset))?;
        let signature = self.reader.read_u32::<LittleEndian>()?;
        if signature != LOCAL_HEADER_SIGNATURE {
            return Err(SpellingError::InvalidArchive(format!(
                "bad local header signature for member {:?}",
                entry.name
            )));
        }
        // version(2) flags(2) method(2) time(2) date(2) crc(4) csize(4) usize(4)
        self.reader.seek(SeekFrom::Current(22))?;
        let name_len = self.reader.read_u16::<LittleEndian>()? as u64;
        let extra_len = self.reader.read_u16::<LittleEndian>()? as u64;
        Ok(entry.header_offset + 30 + name_len + extra_len)
    }
}

/// Locate the end-of-central-directory record by scanning backwards from
/// the end of the file, then read the central directory bounds from it.
fn locate_central_directory<R: Read + Seek>(
    reader: &mut R,
    file_len: u64,
) -> Result<(u64, u64, u16)> {
    if file_len < EOCD_LEN {
        return Err(SpellingError::InvalidArchive(
            "file too short for an end-of-central-directory record".to_string(),
        ));
    }

    let window = EOCD_SEARCH_WINDOW.min(file_len);
    let window_start = file_len - window;
    reader.seek(SeekFrom::Start(window_start))?;
    let mut tail = vec![0u8; window as usize];
    reader.read_exact(&mut tail)?;

    let signature = EOCD_SIGNATURE.to_le_bytes();
    let mut pos = tail.len() - EOCD_LEN as usize;
    loop {
        if tail[pos..pos + 4] == signature {
            let record = &tail[pos..];
            let entry_count = u16::from_le_bytes([record[10], record[11]]);
            let cd_size = u32::from_le_bytes([record[12], record[13], record[14], record[15]]);
            let cd_offset = u32::from_le_bytes([record[16], record[17], record[18], record[19]]);
            return Ok((cd_offset as u64, cd_size as u64, entry_count));
        }
        if pos == 0 {
            return Err(SpellingError::InvalidArchive(
                "no end-of-central-directory record found".to_string(),
            ));
        }
        pos -= 1;
    }
}

/// Parse one central directory entry at the reader's current position.
fn parse_central_entry<R: Read + Seek>(reader: &mut R) -> Result<ZipEntry> {
    let signature = reader.read_u32::<LittleEndian>()?;
    if signature != CENTRAL_HEADER_SIGNATURE {
        return Err(SpellingError::InvalidArchive(format!(
            "bad central directory signature {:#010x}",
            signature
        )));
    }
    // version-made-by(2) version-needed(2)
    reader.seek(SeekFrom::Current(4))?;
    let flags = reader.read_u16::<LittleEndian>()?;
    let method = reader.read_u16::<LittleEndian>()?;
    // mod-time(2) mod-date(2)
    reader.seek(SeekFrom::Current(4))?;
    let crc32 = reader.read_u32::<LittleEndian>()?;
    let compressed_size = reader.read_u32::<LittleEndian>()? as u64;
    let uncompressed_size = reader.read_u32::<LittleEndian>()? as u64;
    let name_len = reader.read_u16::<LittleEndian>()? as usize;
    let extra_len = reader.read_u16::<LittleEndian>()? as i64;
    let comment_len = reader.read_u16::<LittleEndian>()? as i64;
    // disk-start(2) internal-attrs(2) external-attrs(4)
    reader.seek(SeekFrom::Current(8))?;
    let header_offset = reader.read_u32::<LittleEndian>()? as u64;

    let mut name_bytes = vec![0u8; name_len];
    reader.read_exact(&mut name_bytes)?;
    let name = String::from_utf8_lossy(&name_bytes).into_owned();
    reader.seek(SeekFrom::Current(extra_len + comment_len))?;

    Ok(ZipEntry {
        name,
        method,
        flags,
        crc32,
        compressed_size,
        uncompressed_size,
        header_offset,
    })
}
