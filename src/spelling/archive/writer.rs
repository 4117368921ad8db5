//! ZIP member writing for installed packages.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};
use log::trace;

use super::{CENTRAL_HEADER_SIGNATURE, EOCD_SIGNATURE, LOCAL_HEADER_SIGNATURE, METHOD_DEFLATE, METHOD_STORED};
use crate::spelling::error::{Result, SpellingError};

struct MemberRecord {
    name: String,
    method: u16,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    header_offset: u32,
}

/// A streaming ZIP writer.
///
/// Members are deflate-compressed unless compression would grow them, in
/// which case they are stored verbatim. The central directory is emitted by
/// [`finish`](ZipWriter::finish); a writer that is dropped without
/// finishing leaves an unreadable container.
pub struct ZipWriter<W: Write> {
    inner: W,
    offset: u64,
    members: Vec<MemberRecord>,
}

impl<W: Write> ZipWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            offset: 0,
            members: Vec::new(),
        }
    }

    /// Append one member with the given exact name.
    pub fn add_member(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let mut crc = Crc::new();
        crc.update(data);

        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        let compressed = encoder.finish()?;

        let (method, payload) = if compressed.len() < data.len() {
            (METHOD_DEFLATE, compressed)
        } else {
            (METHOD_STORED, data.to_vec())
        };
        trace!(
            "Writing member {:?}: method={}, {} -> {} bytes",
            name,
            method,
            data.len(),
            payload.len()
        );

        let record = MemberRecord {
            name: name.to_string(),
            method,
            crc32: crc.sum(),
            compressed_size: fit_u32(payload.len(), "compressed member")?,
            uncompressed_size: fit_u32(data.len(), "member")?,
            header_offset: fit_u32(self.offset as usize, "archive")?,
        };

        let name_bytes = record.name.as_bytes();
        self.inner.write_u32::<LittleEndian>(LOCAL_HEADER_SIGNATURE)?;
        self.inner.write_u16::<LittleEndian>(20)?; // version needed
        self.inner.write_u16::<LittleEndian>(0)?; // flags
        self.inner.write_u16::<LittleEndian>(record.method)?;
        self.inner.write_u16::<LittleEndian>(0)?; // mod time
        self.inner.write_u16::<LittleEndian>(0)?; // mod date
        self.inner.write_u32::<LittleEndian>(record.crc32)?;
        self.inner.write_u32::<LittleEndian>(record.compressed_size)?;
        self.inner.write_u32::<LittleEndian>(record.uncompressed_size)?;
        self.inner.write_u16::<LittleEndian>(name_bytes.len() as u16)?;
        self.inner.write_u16::<LittleEndian>(0)?; // extra length
        self.inner.write_all(name_bytes)?;
        self.inner.write_all(&payload)?;

        self.offset += 30 + name_bytes.len() as u64 + payload.len() as u64;
        self.members.push(record);
        Ok(())
    }

    /// Write the central directory and end-of-central-directory record,
    /// returning the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        let cd_offset = self.offset;
        let mut cd_size: u64 = 0;

        for member in &self.members {
            let name_bytes = member.name.as_bytes();
            self.inner.write_u32::<LittleEndian>(CENTRAL_HEADER_SIGNATURE)?;
            self.inner.write_u16::<LittleEndian>(20)?; // version made by
            self.inner.write_u16::<LittleEndian>(20)?; // version needed
            self.inner.write_u16::<LittleEndian>(0)?; // flags
            self.inner.write_u16::<LittleEndian>(member.method)?;
            self.inner.write_u16::<LittleEndian>(0)?; // mod time
            self.inner.write_u16::<LittleEndian>(0)?; // mod date
            self.inner.write_u32::<LittleEndian>(member.crc32)?;
            self.inner.write_u32::<LittleEndian>(member.compressed_size)?;
            self.inner.write_u32::<LittleEndian>(member.uncompressed_size)?;
            self.inner.write_u16::<LittleEndian>(name_bytes.len() as u16)?;
            self.inner.write_u16::<LittleEndian>(0)?; // extra length
            self.inner.write_u16::<LittleEndian>(0)?; // comment length
            self.inner.write_u16::<LittleEndian>(0)?; // disk number start
            self.inner.write_u16::<LittleEndian>(0)?; // internal attributes
            self.inner.write_u32::<LittleEndian>(0)?; // external attributes
            self.inner.write_u32::<LittleEndian>(member.header_offset)?;
            self.inner.write_all(name_bytes)?;
            cd_size += 46 + name_bytes.len() as u64;
        }

        self.inner.write_u32::<LittleEndian>(EOCD_SIGNATURE)?;
        self.inner.write_u16::<LittleEndian>(0)?; // disk number
        self.inner.write_u16::<LittleEndian>(0)?; // central directory disk
        self.inner.write_u16::<LittleEndian>(self.members.len() as u16)?;
        self.inner.write_u16::<LittleEndian>(self.members.len() as u16)?;
        self.inner.write_u32::<LittleEndian>(fit_u32(cd_size as usize, "central directory")?)?;
        self.inner.write_u32::<LittleEndian>(fit_u32(cd_offset as usize, "archive")?)?;
        self.inner.write_u16::<LittleEndian>(0)?; // comment length
        self.inner.flush()?;
        Ok(self.inner)
    }
}

fn fit_u32(value: usize, what: &'static str) -> Result<u32> {
    u32::try_from(value).map_err(|_| SpellingError::InvalidArchive(format!("{} exceeds 4 GiB", what)))
}
