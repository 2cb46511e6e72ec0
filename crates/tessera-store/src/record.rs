//! Record framing for multipage frame files
//!
//! Format: [kind: u8][header_len: u32 BE][header: JSON]
//! Image records follow the header with [pixels_len: u32 BE][pixels].

use std::io::{self, Read, Write};
use tessera_core::{Result, TesseraError};

const KIND_SUMMARY: u8 = 0;
const KIND_IMAGE: u8 = 1;

/// One decoded record
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Summary { header: Vec<u8> },
    Image { header: Vec<u8>, pixels: Vec<u8> },
}

fn write_len<W: Write>(w: &mut W, len: usize) -> Result<()> {
    let len = u32::try_from(len).map_err(|_| {
        TesseraError::Storage(format!("Record section of {} bytes exceeds u32 encoding limit", len))
    })?;
    w.write_all(&len.to_be_bytes())?;
    Ok(())
}

pub fn write_summary<W: Write>(w: &mut W, header: &[u8]) -> Result<()> {
    w.write_all(&[KIND_SUMMARY])?;
    write_len(w, header.len())?;
    w.write_all(header)?;
    Ok(())
}

pub fn write_image<W: Write>(w: &mut W, header: &[u8], pixels: &[u8]) -> Result<()> {
    w.write_all(&[KIND_IMAGE])?;
    write_len(w, header.len())?;
    w.write_all(header)?;
    write_len(w, pixels.len())?;
    w.write_all(pixels)?;
    Ok(())
}

fn read_section<R: Read>(r: &mut R) -> Result<Vec<u8>> {
    let mut len = [0u8; 4];
    r.read_exact(&mut len).map_err(truncated)?;
    let mut buf = vec![0u8; u32::from_be_bytes(len) as usize];
    r.read_exact(&mut buf).map_err(truncated)?;
    Ok(buf)
}

fn truncated(e: io::Error) -> TesseraError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        TesseraError::Storage("Truncated record in frames file".into())
    } else {
        TesseraError::Io(e)
    }
}

/// Read the next record, or None at a clean end of input
pub fn read_record<R: Read>(r: &mut R) -> Result<Option<Record>> {
    let mut kind = [0u8; 1];
    if r.read(&mut kind)? == 0 {
        return Ok(None);
    }

    match kind[0] {
        KIND_SUMMARY => Ok(Some(Record::Summary {
            header: read_section(r)?,
        })),
        KIND_IMAGE => {
            let header = read_section(r)?;
            let pixels = read_section(r)?;
            Ok(Some(Record::Image { header, pixels }))
        }
        other => Err(TesseraError::Storage(format!(
            "Unknown record kind {} in frames file",
            other
        ))),
    }
}
