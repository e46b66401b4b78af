use crate::utils::struct_pack::StructUnpack;
use std::io::*;

pub trait ReadExt {
    fn read_u32(&mut self) -> Result<u32>;

    fn read_exact_vec(&mut self, len: usize) -> Result<Vec<u8>>;
}

impl<T: Read> ReadExt for T {
    fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_exact_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }
}

pub trait ReadStructExt {
    fn read_struct<T: StructUnpack>(&mut self, big: bool) -> crate::error::Result<T>;
}

impl<T: Read + Seek> ReadStructExt for T {
    fn read_struct<S: StructUnpack>(&mut self, big: bool) -> crate::error::Result<S> {
        S::unpack(self, big)
    }
}

pub trait WriteExt {
    fn write_u16_be(&mut self, value: u16) -> Result<()>;
    /// Writes the low 24 bits of `value` in big-endian order.
    fn write_u24_be(&mut self, value: u32) -> Result<()>;
}

impl<T: Write> WriteExt for T {
    fn write_u16_be(&mut self, value: u16) -> Result<()> {
        self.write_all(&value.to_be_bytes())
    }
    fn write_u24_be(&mut self, value: u32) -> Result<()> {
        if value > 0xFF_FFFF {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("Value {:#x} does not fit in 24 bits", value),
            ));
        }
        self.write_all(&value.to_be_bytes()[1..])
    }
}

/// A cursor over a borrowed byte slice.
pub struct MemReaderRef<'a> {
    pub data: &'a [u8],
    pub pos: usize,
}

impl<'a> std::fmt::Debug for MemReaderRef<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemReaderRef")
            .field("pos", &self.pos)
            .field("data_length", &self.data.len())
            .finish_non_exhaustive()
    }
}

impl<'a> MemReaderRef<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        MemReaderRef { data, pos: 0 }
    }
}

impl<'a> Read for MemReaderRef<'a> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.pos >= self.data.len() {
            return Ok(0);
        }
        let bytes_to_read = buf.len().min(self.data.len() - self.pos);
        buf[..bytes_to_read].copy_from_slice(&self.data[self.pos..self.pos + bytes_to_read]);
        self.pos += bytes_to_read;
        Ok(bytes_to_read)
    }
}

impl<'a> Seek for MemReaderRef<'a> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(offset) => self.data.len() as i64 + offset,
            SeekFrom::Current(offset) => self.pos as i64 + offset,
        };
        if new_pos < 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Seek resulted in negative position",
            ));
        }
        if new_pos as u64 > self.data.len() as u64 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Seek position is beyond the end of the data",
            ));
        }
        self.pos = new_pos as usize;
        Ok(self.pos as u64)
    }

    fn stream_position(&mut self) -> Result<u64> {
        Ok(self.pos as u64)
    }

    fn rewind(&mut self) -> Result<()> {
        self.pos = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_u24_be() {
        let mut out = Vec::new();
        out.write_u24_be(0x001234).unwrap();
        out.write_u24_be(0xABCDEF).unwrap();
        assert_eq!(out, [0x00, 0x12, 0x34, 0xAB, 0xCD, 0xEF]);
        assert!(out.write_u24_be(0x0100_0000).is_err());
    }

    #[test]
    fn test_mem_reader_seek() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let mut reader = MemReaderRef::new(&data);
        reader.seek(SeekFrom::Start(1)).unwrap();
        assert_eq!(reader.read_u32().unwrap(), 0x05040302);
        reader.seek(SeekFrom::End(-1)).unwrap();
        assert_eq!(reader.read_exact_vec(1).unwrap(), [6]);
        assert_eq!(reader.stream_position().unwrap(), 6);
        assert!(reader.seek(SeekFrom::Start(7)).is_err());
        assert!(reader.seek(SeekFrom::Current(-10)).is_err());
        assert!(reader.read_exact_vec(1).is_err());
    }
}
