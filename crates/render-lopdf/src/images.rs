use crate::error::RenderError;
use client_report_types::{ImageData, ImageResource};
use image::{ColorType, ImageFormat};
use lopdf::{Stream, dictionary};

/// Decodes raw image bytes (JPEG, PNG or GIF) into an embeddable resource.
///
/// JPEG streams are kept as they are and embedded with `DCTDecode`; anything
/// else is flattened to 8-bit RGB.
pub fn decode_image(key: &str, bytes: &[u8]) -> Result<ImageResource, RenderError> {
    let to_error = |source| RenderError::Image { key: key.to_string(), source };
    let format = image::guess_format(bytes).map_err(to_error)?;
    let decoded = image::load_from_memory_with_format(bytes, format).map_err(to_error)?;
    let (width_px, height_px) = (decoded.width(), decoded.height());

    let data = match (format, decoded.color()) {
        (ImageFormat::Jpeg, ColorType::L8) => ImageData::Jpeg { bytes: bytes.to_vec(), grayscale: true },
        (ImageFormat::Jpeg, ColorType::Rgb8) => ImageData::Jpeg { bytes: bytes.to_vec(), grayscale: false },
        _ => ImageData::Rgb8(decoded.to_rgb8().into_raw()),
    };
    log::debug!("Decoded image '{}' ({}x{}, {:?})", key, width_px, height_px, format);

    Ok(ImageResource { key: key.to_string(), width_px, height_px, data })
}

/// Builds the image XObject stream for a decoded resource.
pub(crate) fn image_xobject(resource: &ImageResource) -> Stream {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => resource.width_px as i64,
        "Height" => resource.height_px as i64,
        "BitsPerComponent" => 8,
    };
    match &resource.data {
        ImageData::Jpeg { bytes, grayscale } => {
            dict.set("ColorSpace", if *grayscale { "DeviceGray" } else { "DeviceRGB" });
            dict.set("Filter", "DCTDecode");
            Stream::new(dict, bytes.clone())
        }
        ImageData::Rgb8(samples) => {
            dict.set("ColorSpace", "DeviceRGB");
            Stream::new(dict, samples.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, RgbImage};
    use std::io::Cursor;

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    #[test]
    fn jpeg_bytes_are_passed_through() {
        let bytes = encode(DynamicImage::ImageRgb8(RgbImage::new(8, 4)), ImageFormat::Jpeg);
        let resource = decode_image("logo", &bytes).unwrap();
        assert_eq!((resource.width_px, resource.height_px), (8, 4));
        assert_eq!(resource.data, ImageData::Jpeg { bytes, grayscale: false });
    }

    #[test]
    fn grayscale_jpeg_keeps_its_colour_space() {
        let bytes = encode(DynamicImage::ImageLuma8(GrayImage::new(4, 4)), ImageFormat::Jpeg);
        let resource = decode_image("logo", &bytes).unwrap();
        let stream = image_xobject(&resource);
        assert_eq!(stream.dict.get(b"ColorSpace").unwrap().as_name().unwrap(), b"DeviceGray");
    }

    #[test]
    fn png_is_flattened_to_rgb() {
        let bytes = encode(DynamicImage::ImageRgb8(RgbImage::new(3, 2)), ImageFormat::Png);
        let resource = decode_image("logo", &bytes).unwrap();
        match resource.data {
            ImageData::Rgb8(samples) => assert_eq!(samples.len(), 3 * 2 * 3),
            other => panic!("expected raw RGB, got {:?}", other),
        }
    }

    #[test]
    fn garbage_is_rejected() {
        let err = decode_image("logo", b"not an image").unwrap_err();
        assert!(matches!(err, RenderError::Image { ref key, .. } if key == "logo"));
    }
}
