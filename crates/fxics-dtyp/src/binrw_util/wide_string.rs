//! [`NulWideString`]: a single NUL-terminated UTF-16LE string, as used by
//! `UNICODE`-typed properties on the wire.

use std::io::{Read, Seek, Write};
use std::ops::Deref;

use binrw::{BinRead, BinResult, BinWrite, Endian};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NulWideString(String);

impl NulWideString {
    pub fn into_string(self) -> String {
        self.0
    }

    /// Length in bytes on the wire, including the trailing NUL.
    pub fn wire_len(&self) -> u32 {
        (self.0.encode_utf16().count() as u32 + 1) * 2
    }
}

impl Deref for NulWideString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NulWideString {
    fn from(s: &str) -> Self {
        NulWideString(s.to_owned())
    }
}

impl From<String> for NulWideString {
    fn from(s: String) -> Self {
        NulWideString(s)
    }
}

impl BinRead for NulWideString {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        _: Endian,
        _: Self::Args<'_>,
    ) -> BinResult<Self> {
        let mut units = Vec::new();
        loop {
            let mut buf = [0u8; 2];
            reader.read_exact(&mut buf)?;
            let unit = u16::from_le_bytes(buf);
            if unit == 0 {
                break;
            }
            units.push(unit);
        }
        let s = String::from_utf16_lossy(&units);
        Ok(NulWideString(s))
    }
}

impl BinWrite for NulWideString {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        _: Endian,
        _: Self::Args<'_>,
    ) -> BinResult<()> {
        for unit in self.0.encode_utf16() {
            writer.write_all(&unit.to_le_bytes())?;
        }
        writer.write_all(&[0u8, 0u8])?;
        Ok(())
    }
}
