//! Raw on-disk structures: header, folder table, file table, data-block
//! headers. Parsing is field-by-field via [`Cursor`](crate::cursor::Cursor);
//! nothing here casts a byte span onto a struct.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::consts;
use crate::cursor::Cursor;
use crate::error::{CabError, Result};

/// The 36-byte cabinet header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub reserved1: u32,
    pub cb_cabinet: u32,
    pub reserved2: u32,
    pub coff_files: u32,
    pub reserved3: u32,
    pub version_minor: u8,
    pub version_major: u8,
    pub c_folders: u16,
    pub c_files: u16,
    pub flags: u16,
    pub set_id: u16,
    pub i_cabinet: u16,
}

impl Header {
    pub fn new_for_pack(c_folders: u16, c_files: u16, set_id: u16) -> Header {
        Header {
            reserved1: 0,
            cb_cabinet: 0,
            reserved2: 0,
            coff_files: 0,
            reserved3: 0,
            version_minor: consts::VERSION_MINOR,
            version_major: consts::VERSION_MAJOR,
            c_folders,
            c_files,
            flags: 0,
            set_id,
            i_cabinet: 0,
        }
    }
}

/// Parses the header at the start of `base`.
pub fn parse_header(base: &[u8]) -> Result<Header> {
    if base.len() < consts::HEADER_SIZE {
        return Err(CabError::Range { offset: 0, len: consts::HEADER_SIZE, available: base.len() });
    }
    let mut cur = Cursor::new(base);
    let signature = cur.take_slice(4)?;
    if signature != consts::FILE_SIGNATURE {
        let mut found = [0u8; 4];
        found.copy_from_slice(signature);
        return Err(CabError::BadSignature { found });
    }
    let reserved1 = cur.read_u32()?;
    let cb_cabinet = cur.read_u32()?;
    let reserved2 = cur.read_u32()?;
    let coff_files = cur.read_u32()?;
    let reserved3 = cur.read_u32()?;
    let version_minor = cur.read_u8()?;
    let version_major = cur.read_u8()?;
    let c_folders = cur.read_u16()?;
    let c_files = cur.read_u16()?;
    let flags = cur.read_u16()?;
    let set_id = cur.read_u16()?;
    let i_cabinet = cur.read_u16()?;
    Ok(Header {
        reserved1,
        cb_cabinet,
        reserved2,
        coff_files,
        reserved3,
        version_minor,
        version_major,
        c_folders,
        c_files,
        flags,
        set_id,
        i_cabinet,
    })
}

pub fn write_header(out: &mut Vec<u8>, header: &Header) {
    out.extend_from_slice(&consts::FILE_SIGNATURE);
    out.write_u32::<LittleEndian>(header.reserved1).unwrap();
    out.write_u32::<LittleEndian>(header.cb_cabinet).unwrap();
    out.write_u32::<LittleEndian>(header.reserved2).unwrap();
    out.write_u32::<LittleEndian>(header.coff_files).unwrap();
    out.write_u32::<LittleEndian>(header.reserved3).unwrap();
    out.push(header.version_minor);
    out.push(header.version_major);
    out.write_u16::<LittleEndian>(header.c_folders).unwrap();
    out.write_u16::<LittleEndian>(header.c_files).unwrap();
    out.write_u16::<LittleEndian>(header.flags).unwrap();
    out.write_u16::<LittleEndian>(header.set_id).unwrap();
    out.write_u16::<LittleEndian>(header.i_cabinet).unwrap();
}

/// An 8-byte folder-table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FolderEntry {
    pub coff_cab_start: u32,
    pub c_cf_data: u16,
    pub type_compress: u16,
}

impl FolderEntry {
    /// The low nibble of `type_compress`: 0=stored, 1=ms-zip, 2=quantum, 3=lzx.
    pub fn compression_kind(&self) -> u16 {
        self.type_compress & consts::COMPRESS_TYPE_MASK
    }
}

pub fn parse_folder_entry(cur: &mut Cursor<'_>) -> Result<FolderEntry> {
    let coff_cab_start = cur.read_u32()?;
    let c_cf_data = cur.read_u16()?;
    let type_compress = cur.read_u16()?;
    Ok(FolderEntry { coff_cab_start, c_cf_data, type_compress })
}

pub fn write_folder_entry(out: &mut Vec<u8>, entry: &FolderEntry) {
    out.write_u32::<LittleEndian>(entry.coff_cab_start).unwrap();
    out.write_u16::<LittleEndian>(entry.c_cf_data).unwrap();
    out.write_u16::<LittleEndian>(entry.type_compress).unwrap();
}

/// A 16-byte file-table entry plus its name, and the byte offset of the
/// fixed-size record within the archive (used by clone to patch fields
/// in place).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    pub cb_file: u32,
    pub uoff_folder_start: u32,
    pub i_folder: u16,
    pub date: u16,
    pub time: u16,
    pub attribs: u16,
    pub name: String,
}

impl FileEntry {
    pub fn is_read_only(&self) -> bool {
        self.attribs & consts::ATTR_READ_ONLY != 0
    }
    pub fn is_hidden(&self) -> bool {
        self.attribs & consts::ATTR_HIDDEN != 0
    }
    pub fn is_system(&self) -> bool {
        self.attribs & consts::ATTR_SYSTEM != 0
    }
    pub fn is_archive(&self) -> bool {
        self.attribs & consts::ATTR_ARCH != 0
    }
    pub fn is_exec(&self) -> bool {
        self.attribs & consts::ATTR_EXEC != 0
    }
    pub fn is_name_utf(&self) -> bool {
        self.attribs & consts::ATTR_NAME_IS_UTF != 0
    }

    pub fn datetime(&self) -> Option<time::PrimitiveDateTime> {
        crate::datetime::datetime_from_bits(self.date, self.time)
    }
}

/// Parses one file entry, returning it alongside the byte offset its
/// fixed-size record started at (the offset the `date`/`time`/`attribs`
/// fields live at is `offset + 10`/`+12`/`+14`).
pub fn parse_file_entry(cur: &mut Cursor<'_>) -> Result<(FileEntry, usize)> {
    let offset = cur.position();
    let cb_file = cur.read_u32()?;
    let uoff_folder_start = cur.read_u32()?;
    let i_folder = cur.read_u16()?;
    let date = cur.read_u16()?;
    let time = cur.read_u16()?;
    let attribs = cur.read_u16()?;
    let name = cur.read_null_terminated_string()?;
    Ok((FileEntry { cb_file, uoff_folder_start, i_folder, date, time, attribs, name }, offset))
}

pub fn write_file_entry(out: &mut Vec<u8>, entry: &FileEntry) {
    out.write_u32::<LittleEndian>(entry.cb_file).unwrap();
    out.write_u32::<LittleEndian>(entry.uoff_folder_start).unwrap();
    out.write_u16::<LittleEndian>(entry.i_folder).unwrap();
    out.write_u16::<LittleEndian>(entry.date).unwrap();
    out.write_u16::<LittleEndian>(entry.time).unwrap();
    out.write_u16::<LittleEndian>(entry.attribs).unwrap();
    out.extend_from_slice(entry.name.as_bytes());
    out.push(0);
}

/// The 8-byte header preceding each data block's payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataBlockHeader {
    pub csum: u32,
    pub cb_data: u16,
    pub cb_uncomp: u16,
}

pub fn parse_data_block_header(cur: &mut Cursor<'_>) -> Result<DataBlockHeader> {
    let csum = cur.read_u32()?;
    let cb_data = cur.read_u16()?;
    let cb_uncomp = cur.read_u16()?;
    Ok(DataBlockHeader { csum, cb_data, cb_uncomp })
}

pub fn write_data_block_header(out: &mut Vec<u8>, header: &DataBlockHeader) {
    out.write_u32::<LittleEndian>(header.csum).unwrap();
    out.write_u16::<LittleEndian>(header.cb_data).unwrap();
    out.write_u16::<LittleEndian>(header.cb_uncomp).unwrap();
}
