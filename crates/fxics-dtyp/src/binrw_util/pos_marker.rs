//! A placeholder value that records the stream position it was written at,
//! so a later field can seek back and patch in a size or offset once it is
//! known. Used for length-prefixed wire records such as
//! [`crate::PredecessorChangeList`].

use std::cell::Cell;
use std::io::{Read, Seek, SeekFrom, Write};

use binrw::{BinRead, BinResult, BinWrite, Endian};

#[derive(Debug, Default)]
pub struct PosMarker<T> {
    pub value: T,
    pos: Cell<u64>,
}

impl<T: Clone> Clone for PosMarker<T> {
    fn clone(&self) -> Self {
        PosMarker {
            value: self.value.clone(),
            pos: self.pos.clone(),
        }
    }
}

impl<T: PartialEq> PartialEq for PosMarker<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Eq> Eq for PosMarker<T> {}

impl<T> BinRead for PosMarker<T>
where
    T: for<'a> BinRead<Args<'a> = ()>,
{
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _: Self::Args<'_>,
    ) -> BinResult<Self> {
        let pos = reader.stream_position()?;
        let value = T::read_options(reader, endian, ())?;
        Ok(PosMarker {
            value,
            pos: Cell::new(pos),
        })
    }
}

impl<T> BinWrite for PosMarker<T>
where
    T: for<'a> BinWrite<Args<'a> = ()> + Default,
{
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        endian: Endian,
        _: Self::Args<'_>,
    ) -> BinResult<()> {
        self.pos.set(writer.stream_position()?);
        self.value.write_options(writer, endian, ())
    }
}

impl PosMarker<u32> {
    /// `write_with` helper for a field following a `PosMarker<u32>`: writes
    /// every item in `value`, then seeks back and patches the marker with
    /// the number of bytes just written.
    pub fn write_size<W, Item>(
        value: &Vec<Item>,
        writer: &mut W,
        endian: Endian,
        args: (&PosMarker<u32>,),
    ) -> BinResult<()>
    where
        W: Write + Seek,
        Item: for<'a> BinWrite<Args<'a> = ()>,
    {
        let (marker,) = args;
        let start = writer.stream_position()?;
        for item in value {
            item.write_options(writer, endian, ())?;
        }
        let end = writer.stream_position()?;
        let size = u32::try_from(end - start).map_err(|_| binrw::Error::AssertFail {
            pos: start,
            message: "field too large for a u32 size marker".into(),
        })?;

        let restore = writer.stream_position()?;
        writer.seek(SeekFrom::Start(marker.pos.get()))?;
        size.write_options(writer, endian, ())?;
        writer.seek(SeekFrom::Start(restore))?;
        Ok(())
    }
}
