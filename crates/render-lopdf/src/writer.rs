use client_report_types::win_ansi_byte;
use lopdf::content::Content;
use lopdf::xref::{Xref, XrefEntry, XrefType};
use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat, dictionary};
use std::collections::BTreeMap;
use std::io::{self, Seek, Write};

/// Assembles a PDF file object by object.
///
/// Objects are buffered until [`PdfWriter::finish`], which writes them in id
/// order followed by the cross-reference table and trailer. The shared
/// resources dictionary (fonts and image XObjects) is written last so images
/// can be registered while pages are being produced.
pub struct PdfWriter<W: Write + Seek> {
    writer: W,
    xref: Xref,
    max_id: u32,
    pub catalog_id: ObjectId,
    pub pages_id: ObjectId,
    pub resources_id: ObjectId,
    info_id: ObjectId,
    fonts: Dictionary,
    xobjects: Dictionary,
    page_ids: Vec<ObjectId>,
    info: Dictionary,
    buffered_objects: BTreeMap<ObjectId, Object>,
}

impl<W: Write + Seek> PdfWriter<W> {
    pub fn new(mut writer: W, version: &str, fonts: Dictionary) -> io::Result<Self> {
        writer.write_all(format!("%PDF-{}\n%âãÏÓ\n", version).as_bytes())?;

        Ok(Self {
            writer,
            xref: Xref::new(0, XrefType::CrossReferenceTable),
            max_id: 4,
            resources_id: (1, 0),
            pages_id: (2, 0),
            catalog_id: (3, 0),
            info_id: (4, 0),
            fonts,
            xobjects: Dictionary::new(),
            page_ids: Vec::new(),
            info: Dictionary::new(),
            buffered_objects: BTreeMap::new(),
        })
    }

    pub fn new_object_id(&mut self) -> ObjectId {
        self.max_id += 1;
        (self.max_id, 0)
    }

    pub fn buffer_object(&mut self, object: Object) -> ObjectId {
        let id = self.new_object_id();
        self.buffered_objects.insert(id, object);
        id
    }

    pub fn buffer_object_at_id(&mut self, id: ObjectId, object: Object) {
        if id.0 > self.max_id {
            self.max_id = id.0;
        }
        self.buffered_objects.insert(id, object);
    }

    pub fn buffer_content_stream(&mut self, content: Content) -> Result<ObjectId, lopdf::Error> {
        let stream = Stream::new(dictionary! {}, content.encode()?);
        Ok(self.buffer_object(Object::Stream(stream)))
    }

    /// Registers an image XObject under `name` in the shared resources.
    pub fn add_xobject(&mut self, name: &str, stream: Stream) -> ObjectId {
        let id = self.buffer_object(Object::Stream(stream));
        self.xobjects.set(name.as_bytes(), Object::Reference(id));
        id
    }

    pub fn push_page_id(&mut self, page_id: ObjectId) {
        self.page_ids.push(page_id);
    }

    pub fn set_title(&mut self, title: &str) {
        self.info.set(
            "Title",
            Object::String(to_win_ansi(title), StringFormat::Literal),
        );
    }

    pub fn finish(mut self) -> io::Result<W> {
        let mut resources = dictionary! { "Font" => Object::Dictionary(self.fonts.clone()) };
        if !self.xobjects.is_empty() {
            resources.set("XObject", Object::Dictionary(self.xobjects.clone()));
        }
        self.buffer_object_at_id(self.resources_id, resources.into());

        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => self.page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<Object>>(),
            "Count" => self.page_ids.len() as i64,
        };
        self.buffer_object_at_id(self.pages_id, pages_dict.into());

        let catalog_dict = dictionary! { "Type" => "Catalog", "Pages" => self.pages_id };
        self.buffer_object_at_id(self.catalog_id, catalog_dict.into());

        let mut info = self.info.clone();
        info.set(
            "Producer",
            Object::String(b"client-report".to_vec(), StringFormat::Literal),
        );
        self.buffer_object_at_id(self.info_id, info.into());

        for (id, object) in &self.buffered_objects {
            internal_writer::write_indirect_object(&mut self.writer, *id, object, &mut self.xref)?;
        }

        let xref_start = self.writer.stream_position()?;
        self.xref.size = self.max_id + 1;
        internal_writer::write_xref(&mut self.writer, &self.xref)?;

        let trailer = dictionary! {
            "Size" => self.xref.size as i64,
            "Root" => self.catalog_id,
            "Info" => self.info_id,
        };
        writeln!(self.writer, "trailer")?;
        internal_writer::write_dictionary(&mut self.writer, &trailer)?;
        writeln!(self.writer, "\nstartxref")?;
        writeln!(self.writer, "{}", xref_start)?;
        write!(self.writer, "%%EOF")?;

        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Encodes text for the standard fonts' WinAnsi encoding. Characters the
/// encoding has no glyph for are replaced with `?`.
pub(crate) fn to_win_ansi(s: &str) -> Vec<u8> {
    s.chars().map(|c| win_ansi_byte(c).unwrap_or(b'?')).collect()
}

mod internal_writer {
    use super::*;

    pub fn write_indirect_object<W: Write + Seek>(
        writer: &mut W,
        id: ObjectId,
        object: &Object,
        xref: &mut Xref,
    ) -> io::Result<()> {
        let offset = writer.stream_position()?;
        let offset = u32::try_from(offset)
            .map_err(|_| io::Error::other("PDF exceeds the 4 GiB cross-reference limit"))?;
        xref.insert(id.0, XrefEntry::Normal { offset, generation: id.1 });
        writeln!(writer, "{} {} obj", id.0, id.1)?;
        write_object(writer, object)?;
        writeln!(writer, "\nendobj")?;
        Ok(())
    }

    pub fn write_object(writer: &mut dyn Write, object: &Object) -> io::Result<()> {
        match object {
            Object::Null => writer.write_all(b"null"),
            Object::Boolean(b) => writer.write_all(if *b { b"true" } else { b"false" }),
            Object::Integer(i) => write!(writer, "{}", i),
            Object::Real(r) => write!(writer, "{:.3}", r),
            Object::Name(n) => {
                writer.write_all(b"/")?;
                writer.write_all(n)
            }
            Object::String(s, format) => match format {
                StringFormat::Literal => {
                    writer.write_all(b"(")?;
                    for &byte in s {
                        if byte == b'(' || byte == b')' || byte == b'\\' {
                            writer.write_all(b"\\")?;
                        }
                        writer.write_all(&[byte])?;
                    }
                    writer.write_all(b")")
                }
                StringFormat::Hexadecimal => {
                    write!(
                        writer,
                        "<{}>",
                        s.iter().map(|b| format!("{:02X}", b)).collect::<String>()
                    )
                }
            },
            Object::Array(arr) => {
                writer.write_all(b"[")?;
                for (i, obj) in arr.iter().enumerate() {
                    if i > 0 {
                        writer.write_all(b" ")?;
                    }
                    write_object(writer, obj)?;
                }
                writer.write_all(b"]")
            }
            Object::Dictionary(dict) => write_dictionary(writer, dict),
            Object::Stream(stream) => {
                let mut dict = stream.dict.clone();
                dict.set("Length", stream.content.len() as i64);
                write_dictionary(writer, &dict)?;
                writer.write_all(b"\nstream\n")?;
                writer.write_all(&stream.content)?;
                writer.write_all(b"\nendstream")
            }
            Object::Reference(id) => write!(writer, "{} {} R", id.0, id.1),
        }
    }

    pub fn write_dictionary(writer: &mut dyn Write, dict: &Dictionary) -> io::Result<()> {
        writer.write_all(b"<<")?;
        let sorted_keys: BTreeMap<_, _> = dict.iter().collect();
        for (key, value) in sorted_keys {
            writer.write_all(b"/")?;
            writer.write_all(key)?;
            writer.write_all(b" ")?;
            write_object(writer, value)?;
            writer.write_all(b" ")?;
        }
        writer.write_all(b">>")
    }

    /// Writes the classic cross-reference table, one subsection per run of
    /// consecutive object ids.
    pub fn write_xref<W: Write>(writer: &mut W, xref: &Xref) -> io::Result<()> {
        writeln!(writer, "xref")?;
        writeln!(writer, "0 1")?;
        writeln!(writer, "0000000000 65535 f ")?;

        let mut section: Vec<(u32, &XrefEntry)> = Vec::new();
        for (&id, entry) in &xref.entries {
            if id == 0 {
                continue;
            }
            if let Some(&(last_id, _)) = section.last()
                && last_id + 1 != id
            {
                write_section(writer, &section)?;
                section.clear();
            }
            section.push((id, entry));
        }
        write_section(writer, &section)
    }

    fn write_section<W: Write>(writer: &mut W, entries: &[(u32, &XrefEntry)]) -> io::Result<()> {
        let Some(&(start_id, _)) = entries.first() else {
            return Ok(());
        };
        writeln!(writer, "{} {}", start_id, entries.len())?;
        for (_, entry) in entries {
            if let XrefEntry::Normal { offset, generation } = entry {
                writeln!(writer, "{:010} {:05} n ", offset, generation)?;
            } else {
                writeln!(writer, "0000000000 65535 f ")?;
            }
        }
        Ok(())
    }
}
