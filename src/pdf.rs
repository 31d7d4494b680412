use image::RgbaImage;
use lopdf::Object;
use std::{io::BufWriter, mem};
use time::OffsetDateTime;

use crate::error::ResumeError;

/// The low-level image representation for a PDF document.
#[derive(Debug, Clone)]
pub struct ImageXObject {
    /// Width of the image in pixels.
    pub width: u32,
    /// Height of the image in pixels.
    pub height: u32,
    /// The RGB samples of the image, 8 bits per component.
    pub image_data: Vec<u8>,
    /// The alpha samples of the image, `None` when the image is fully opaque.
    /// See page 444 of the adobe pdf 1.4 reference.
    pub soft_mask: Option<Vec<u8>>,
}

impl ImageXObject {
    /// Splits an RGBA raster into color samples and, if any pixel is translucent, a soft mask.
    pub fn from_rgba(raster: &RgbaImage) -> Self {
        let pixel_count = (raster.width() * raster.height()) as usize;
        let mut image_data = Vec::with_capacity(pixel_count * 3);
        let mut alpha = Vec::with_capacity(pixel_count);
        for pixel in raster.pixels() {
            let [r, g, b, a] = pixel.0;
            image_data.extend_from_slice(&[r, g, b]);
            alpha.push(a);
        }
        let soft_mask = if alpha.iter().any(|a| *a < u8::MAX) {
            Some(alpha)
        } else {
            None
        };

        ImageXObject {
            width: raster.width(),
            height: raster.height(),
            image_data,
            soft_mask,
        }
    }

    /// Inserts the image (and its soft mask) into the document, returning the image's ID.
    fn insert_into_document(&self, inner_document: &mut lopdf::Document) -> lopdf::ObjectId {
        use lopdf::Object::*;

        let image_dictionary = |color_space: &str| {
            lopdf::Dictionary::from_iter(vec![
                ("Type", Name("XObject".into())),
                ("Subtype", Name("Image".into())),
                ("Width", Integer(i64::from(self.width))),
                ("Height", Integer(i64::from(self.height))),
                ("ColorSpace", Name(color_space.into())),
                ("BitsPerComponent", Integer(8)),
                ("Interpolate", Boolean(false)),
            ])
        };

        let mut dictionary = image_dictionary("DeviceRGB");
        if let Some(soft_mask) = &self.soft_mask {
            let soft_mask_stream =
                lopdf::Stream::new(image_dictionary("DeviceGray"), soft_mask.clone());
            dictionary.set("SMask", Reference(inner_document.add_object(soft_mask_stream)));
        }

        inner_document.add_object(lopdf::Stream::new(dictionary, self.image_data.clone()))
    }
}

/// The representation of a PDF page holding a single image stretched over its whole area.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// Page width in points.
    pub width: u32,
    /// Page height in points.
    pub height: u32,
    pub image: ImageXObject,
}

impl PdfPage {
    /// The content stream which paints image `X0` over the whole page. The `q`/`Q` pair isolates
    /// the transformation matrix set by `cm`.
    fn content(&self) -> Result<lopdf::Stream, ResumeError> {
        use lopdf::content::Operation;

        let content = lopdf::content::Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Integer(i64::from(self.width)),
                        0.into(),
                        0.into(),
                        Object::Integer(i64::from(self.height)),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name("X0".into())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded_content = content.encode().map_err(|error| {
            ResumeError::capture("Failed to encode the PDF page content", &error)
        })?;

        Ok(lopdf::Stream::new(lopdf::Dictionary::new(), encoded_content))
    }
}

/// Document-level information written into the PDF `Info` dictionary.
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    pub title: String,
    pub creation_date: OffsetDateTime,
}

impl Default for PdfMetadata {
    fn default() -> Self {
        PdfMetadata {
            title: "Resume".into(),
            creation_date: OffsetDateTime::UNIX_EPOCH,
        }
    }
}

/// This struct represents the actual PDF document on a high-level. It is an interface to the
/// underlying `lopdf::Document` with the addition of the pages and the document identifier.
pub struct PdfDocument {
    /// The underlying PDF document: this is a low-level interface and shouldn't be directly
    /// interacted with unless strictly necessary.
    pub inner_document: lopdf::Document,
    /// The identifier of the document, used for the PDF `ID` tag.
    pub identifier: String,
    pub metadata: PdfMetadata,
    pages: Vec<PdfPage>,
}

impl PdfDocument {
    /// Create a new `PdfDocument` by defaulting the underlying PDF document to version 1.5
    /// of the PDF specification.
    pub fn new(identifier: String, metadata: PdfMetadata) -> Self {
        PdfDocument {
            inner_document: lopdf::Document::with_version("1.5"),
            identifier,
            metadata,
            pages: Vec::new(),
        }
    }

    /// Adds a page sized exactly to the raster, one point per pixel, with the raster as its
    /// only content. Returns the index of the page.
    pub fn add_image_page(&mut self, raster: &RgbaImage) -> usize {
        self.pages.push(PdfPage {
            width: raster.width(),
            height: raster.height(),
            image: ImageXObject::from_rgba(raster),
        });

        self.pages.len() - 1
    }

    /// Write the pages added so far into the underlying document and finalize it.
    pub fn write_all(&mut self) -> Result<(), ResumeError> {
        use lopdf::Object::*;
        use lopdf::StringFormat::*;

        let timestamp = to_pdf_timestamp_format(&self.metadata.creation_date);
        let document_info = lopdf::Dictionary::from_iter(vec![
            ("Trapped", "False".into()),
            ("CreationDate", String(timestamp.clone().into_bytes(), Literal)),
            ("ModDate", String(timestamp.into_bytes(), Literal)),
            ("Title", String(text_string(&self.metadata.title), Literal)),
            ("Creator", String(b"vitae".to_vec(), Literal)),
            ("Producer", String(b"vitae".to_vec(), Literal)),
            (
                "Identifier",
                String(self.identifier.clone().into_bytes(), Literal),
            ),
        ]);
        let document_info_id = self.inner_document.add_object(Dictionary(document_info));

        let pages_id = self.inner_document.new_object_id();
        let catalog = lopdf::Dictionary::from_iter(vec![
            ("Type", "Catalog".into()),
            ("PageLayout", "OneColumn".into()),
            ("PageMode", "UseNone".into()),
            ("Pages", Reference(pages_id)),
        ]);
        let catalog_id = self.inner_document.add_object(catalog);

        self.inner_document
            .trailer
            .set("Root", Reference(catalog_id));
        self.inner_document
            .trailer
            .set("Info", Reference(document_info_id));
        self.inner_document.trailer.set(
            "ID",
            Array(vec![
                String(self.identifier.clone().into_bytes(), Literal),
                String(self.identifier.clone().into_bytes(), Literal),
            ]),
        );

        let mut page_ids = Vec::<lopdf::Object>::new();
        for page in &self.pages {
            let media_box: Vec<lopdf::Object> = vec![
                0.into(),
                0.into(),
                Integer(i64::from(page.width)),
                Integer(i64::from(page.height)),
            ];
            let mut page_dictionary = lopdf::Dictionary::from_iter(vec![
                ("Type", "Page".into()),
                ("Rotate", Integer(0)),
                ("MediaBox", media_box.clone().into()),
                ("CropBox", media_box.into()),
                ("Parent", Reference(pages_id)),
            ]);

            let image_id = page.image.insert_into_document(&mut self.inner_document);
            let resources = lopdf::Dictionary::from_iter(vec![(
                "XObject",
                Dictionary(lopdf::Dictionary::from_iter(vec![("X0", Reference(image_id))])),
            )]);
            page_dictionary.set("Resources", Dictionary(resources));

            let content_id = self.inner_document.add_object(page.content()?);
            page_dictionary.set("Contents", Reference(content_id));

            page_ids.push(Reference(self.inner_document.add_object(page_dictionary)));
        }

        let pages = lopdf::Dictionary::from_iter(vec![
            ("Type", "Pages".into()),
            ("Count", Integer(page_ids.len() as i64)),
            ("Kids", Array(page_ids)),
        ]);
        self.inner_document
            .objects
            .insert(pages_id, Dictionary(pages));

        Ok(())
    }

    /// Compress the streams and drop unreferenced objects.
    pub fn optimize(&mut self) {
        self.inner_document.prune_objects();
        self.inner_document.delete_zero_length_streams();
        self.inner_document.renumber_objects();
        self.inner_document.compress();
    }

    /// Save the `PdfDocument` to bytes in order for it to be written to a file or further processed.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, ResumeError> {
        let mut pdf_document_bytes = Vec::new();
        let mut writer = BufWriter::new(&mut pdf_document_bytes);
        self.inner_document.save_to(&mut writer).map_err(|error| {
            ResumeError::sink("Error while saving the PDF document to bytes", &error)
        })?;
        mem::drop(writer);

        Ok(pdf_document_bytes)
    }
}

/// Packages a raster as a finished single-page PDF.
pub fn raster_to_pdf(
    raster: &RgbaImage,
    identifier: String,
    metadata: PdfMetadata,
) -> Result<Vec<u8>, ResumeError> {
    let mut pdf_document = PdfDocument::new(identifier, metadata);
    pdf_document.add_image_page(raster);
    pdf_document.write_all()?;
    pdf_document.optimize();

    pdf_document.save_to_bytes()
}

/// Encodes a PDF text string: ASCII is kept as it is, anything else becomes UTF-16BE
/// behind the `FE FF` byte order mark.
fn text_string(text: &str) -> Vec<u8> {
    if text.is_ascii() {
        return text.as_bytes().to_vec();
    }

    [0xFE, 0xFF]
        .into_iter()
        .chain(text.encode_utf16().flat_map(u16::to_be_bytes))
        .collect()
}

/// Formats the given time so that it matches what the PDF specification expects.
/// An example of it is the following: D:20170505150224+02'00'.
fn to_pdf_timestamp_format(date: &OffsetDateTime) -> String {
    let offset = date.offset();
    let offset_sign = if offset.is_negative() { '-' } else { '+' };
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}{offset_sign}{:02}'{:02}'",
        date.year(),
        u8::from(date.month()),
        date.day(),
        date.hour(),
        date.minute(),
        date.second(),
        offset.whole_hours().abs(),
        offset.minutes_past_hour().abs(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn page_dictionary(document: &lopdf::Document) -> lopdf::Dictionary {
        let pages = document.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        document
            .get_object(page_id)
            .unwrap()
            .as_dict()
            .unwrap()
            .clone()
    }

    #[test]
    fn single_page_is_sized_to_the_raster() {
        let raster = RgbaImage::from_pixel(120, 340, Rgba([255, 255, 255, 255]));
        let bytes = raster_to_pdf(&raster, "0".repeat(32), PdfMetadata::default()).unwrap();
        let document = lopdf::Document::load_mem(&bytes).unwrap();
        let page = page_dictionary(&document);

        assert_eq!(
            page.get(b"MediaBox").unwrap().as_array().unwrap(),
            &vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(120),
                Object::Integer(340)
            ]
        );
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        let image_id = xobjects.get(b"X0").unwrap().as_reference().unwrap();
        let image = document.get_object(image_id).unwrap().as_stream().unwrap();

        assert_eq!(image.dict.get(b"Width").unwrap().as_i64().unwrap(), 120);
        assert_eq!(image.dict.get(b"Height").unwrap().as_i64().unwrap(), 340);
        assert!(image.dict.get(b"SMask").is_err());
    }

    #[test]
    fn translucent_rasters_carry_a_soft_mask() {
        let raster = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 128]));
        let image = ImageXObject::from_rgba(&raster);

        assert_eq!(image.image_data.len(), 4 * 4 * 3);
        assert_eq!(image.soft_mask, Some(vec![128; 16]));
    }

    #[test]
    fn identical_inputs_produce_identical_documents() {
        let raster = RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255]));
        let first = raster_to_pdf(&raster, "a".repeat(32), PdfMetadata::default()).unwrap();
        let second = raster_to_pdf(&raster, "a".repeat(32), PdfMetadata::default()).unwrap();

        assert_eq!(first, second);
    }

    fn document_title(bytes: &[u8]) -> Vec<u8> {
        let document = lopdf::Document::load_mem(bytes).unwrap();
        let info_id = document.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = document.get_object(info_id).unwrap().as_dict().unwrap();

        info.get(b"Title").unwrap().as_str().unwrap().to_vec()
    }

    #[test]
    fn non_ascii_titles_are_written_as_utf16() {
        let raster = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let metadata = PdfMetadata {
            title: "José Núñez".into(),
            ..PdfMetadata::default()
        };
        let bytes = raster_to_pdf(&raster, "0".repeat(32), metadata).unwrap();
        let title = document_title(&bytes);

        assert_eq!(&title[..2], &[0xFE, 0xFF]);
        let code_units: Vec<u16> = title[2..]
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        assert_eq!(std::string::String::from_utf16(&code_units).unwrap(), "José Núñez");
    }

    #[test]
    fn ascii_titles_are_kept_verbatim() {
        let raster = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let bytes = raster_to_pdf(&raster, "0".repeat(32), PdfMetadata::default()).unwrap();

        assert_eq!(document_title(&bytes), b"Resume".to_vec());
    }

    #[test]
    fn timestamps_follow_the_pdf_date_format() {
        assert_eq!(
            to_pdf_timestamp_format(&OffsetDateTime::UNIX_EPOCH),
            "D:19700101000000+00'00'"
        );
    }
}
