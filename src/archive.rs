//! The parsed, read-only view of a cabinet: header, folder table, file
//! table, and the data-block chain for each folder. Everything here
//! borrows from a single contiguous byte range for its whole lifetime.

use crate::consts;
use crate::cursor::Cursor;
use crate::error::{CabError, Result};
use crate::model::{
    self, DataBlockHeader, FileEntry, FolderEntry, Header,
};

/// A parsed cabinet, borrowing its bytes from `'a` (typically a
/// memory-mapped file).
pub struct Cabinet<'a> {
    base: &'a [u8],
    header: Header,
    folders: Vec<FolderEntry>,
    files: Vec<FileEntry>,
    file_offsets: Vec<usize>,
}

impl<'a> Cabinet<'a> {
    /// Parses a cabinet from `base`. Borrows `base` for the cabinet's
    /// entire lifetime; never copies header/folder/file-table bytes.
    pub fn parse(base: &'a [u8]) -> Result<Cabinet<'a>> {
        let header = model::parse_header(base)?;

        let folders_start = consts::HEADER_SIZE;
        let folders_len = header.c_folders as usize * consts::FOLDER_ENTRY_SIZE;
        Cursor::assert_span(base.len(), folders_start, folders_len)?;
        let mut cur = Cursor::at(base, folders_start);
        let mut folders = Vec::with_capacity(header.c_folders as usize);
        for _ in 0..header.c_folders {
            folders.push(model::parse_folder_entry(&mut cur)?);
        }

        let mut cur = Cursor::at(base, header.coff_files as usize);
        if header.coff_files as usize > base.len() {
            return Err(CabError::Range {
                offset: header.coff_files as usize,
                len: 0,
                available: base.len(),
            });
        }
        let mut files = Vec::with_capacity(header.c_files as usize);
        let mut file_offsets = Vec::with_capacity(header.c_files as usize);
        for _ in 0..header.c_files {
            let (entry, offset) = model::parse_file_entry(&mut cur)?;
            if entry.i_folder as usize >= header.c_folders as usize {
                return Err(CabError::Range { offset, len: 2, available: base.len() });
            }
            files.push(entry);
            file_offsets.push(offset);
        }

        Ok(Cabinet { base, header, folders, files, file_offsets })
    }

    pub fn base(&self) -> &'a [u8] {
        self.base
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn folders(&self) -> &[FolderEntry] {
        &self.folders
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// The byte offset of the fixed-size file-table record for `files()[index]`.
    pub fn file_record_offset(&self, index: usize) -> usize {
        self.file_offsets[index]
    }

    pub fn files_in_folder(&self, folder_index: usize) -> impl Iterator<Item = &FileEntry> {
        self.files.iter().filter(move |f| f.i_folder as usize == folder_index)
    }

    pub fn get_file(&self, name: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Returns the `(header, payload)` pairs for every data block of
    /// `folder`, bounds-checking each against both the mapped byte range
    /// and the archive's declared `cbCabinet`.
    pub fn iter_blocks(&self, folder: &FolderEntry) -> Result<Vec<(DataBlockHeader, &'a [u8])>> {
        let mut cur = Cursor::at(self.base, folder.coff_cab_start as usize);
        if folder.coff_cab_start as usize > self.base.len() {
            return Err(CabError::Range {
                offset: folder.coff_cab_start as usize,
                len: 0,
                available: self.base.len(),
            });
        }
        let mut blocks = Vec::with_capacity(folder.c_cf_data as usize);
        for _ in 0..folder.c_cf_data {
            let block_start = cur.position();
            let block_header = model::parse_data_block_header(&mut cur)?;
            let payload = cur.take_slice(block_header.cb_data as usize)?;
            let block_end = cur.position();
            if block_end > self.header.cb_cabinet as usize {
                return Err(CabError::Range {
                    offset: block_start,
                    len: block_end - block_start,
                    available: self.header.cb_cabinet as usize,
                });
            }
            blocks.push((block_header, payload));
        }
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{write_file_entry, write_folder_entry, write_header};

    fn build_minimal(c_folders: u16, c_files: u16, files: &[FileEntry]) -> Vec<u8> {
        let mut buf = Vec::new();
        let coff_files = consts::HEADER_SIZE + c_folders as usize * consts::FOLDER_ENTRY_SIZE;
        let mut header = Header::new_for_pack(c_folders, c_files, 0);
        header.coff_files = coff_files as u32;
        header.cb_cabinet = 1_000_000;
        write_header(&mut buf, &header);
        for i in 0..c_folders {
            write_folder_entry(
                &mut buf,
                &FolderEntry { coff_cab_start: 0, c_cf_data: 0, type_compress: i as u16 % 2 },
            );
        }
        for f in files {
            write_file_entry(&mut buf, f);
        }
        buf
    }

    #[test]
    fn parses_header_and_empty_folder_table() {
        let buf = build_minimal(2, 0, &[]);
        let cab = Cabinet::parse(&buf).unwrap();
        assert_eq!(cab.folders().len(), 2);
        assert_eq!(cab.files().len(), 0);
    }

    #[test]
    fn rejects_file_with_out_of_range_folder_index() {
        let files = vec![FileEntry {
            cb_file: 0,
            uoff_folder_start: 0,
            i_folder: 5,
            date: 0,
            time: 0,
            attribs: 0,
            name: "x".to_string(),
        }];
        let buf = build_minimal(1, 1, &files);
        assert!(Cabinet::parse(&buf).is_err());
    }

    #[test]
    fn groups_files_by_folder() {
        let files = vec![
            FileEntry {
                cb_file: 1,
                uoff_folder_start: 0,
                i_folder: 0,
                date: 0,
                time: 0,
                attribs: 0,
                name: "a".to_string(),
            },
            FileEntry {
                cb_file: 1,
                uoff_folder_start: 0,
                i_folder: 1,
                date: 0,
                time: 0,
                attribs: 0,
                name: "b".to_string(),
            },
        ];
        let buf = build_minimal(2, 2, &files);
        let cab = Cabinet::parse(&buf).unwrap();
        assert_eq!(cab.files_in_folder(0).count(), 1);
        assert_eq!(cab.files_in_folder(1).count(), 1);
        assert_eq!(cab.get_file("a").unwrap().i_folder, 0);
    }
}
