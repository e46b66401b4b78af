//! Field-by-field binary (de)serialization
use crate::error::Result;
use nso_patch_macro::struct_unpack_impl_for_num;
use std::io::{Read, Seek, Write};

pub trait StructUnpack: Sized {
    fn unpack<R: Read + Seek>(reader: R, big: bool) -> Result<Self>;
}

pub trait StructPack: Sized {
    fn pack<W: Write>(&self, writer: &mut W, big: bool) -> Result<()>;
}

struct_unpack_impl_for_num!(u8);
struct_unpack_impl_for_num!(u16);
struct_unpack_impl_for_num!(u32);

impl<const N: usize> StructUnpack for [u8; N] {
    fn unpack<R: Read + Seek>(mut reader: R, _big: bool) -> Result<Self> {
        let mut buf = [0u8; N];
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl<const N: usize> StructPack for [u8; N] {
    fn pack<W: Write>(&self, writer: &mut W, _big: bool) -> Result<()> {
        writer.write_all(self)?;
        Ok(())
    }
}
