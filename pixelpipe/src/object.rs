//! Pixel container implementation for DICOM objects from `dicom-object`.

use std::borrow::Cow;

use dicom_core::dictionary::DataDictionary;
use dicom_core::{DataElement, DicomValue, PrimitiveValue, Tag, VR};
use dicom_dictionary_std::tags;
use dicom_object::{FileDicomObject, InMemDicomObject};

use crate::container::{PixelContainer, PixelData};
use crate::palette::{LutDescriptor, PaletteLut, PaletteLutChannel};
use crate::registry;

fn palette_channel<D>(
    obj: &FileDicomObject<InMemDicomObject<D>>,
    descriptor_tag: Tag,
    data_tag: Tag,
) -> Option<PaletteLutChannel>
where
    D: DataDictionary + Clone,
{
    // the first mapped value may be encoded as SS
    let descriptor: Vec<i32> = obj.get(descriptor_tag)?.to_multi_int().ok()?;
    let descriptor: Vec<u16> = descriptor.into_iter().map(|v| v as u16).collect();
    let descriptor = LutDescriptor::from_values(&descriptor)?;
    let data = obj.get(data_tag)?.to_bytes().ok()?;
    PaletteLutChannel::from_bytes(descriptor, &data)
}

impl<D> PixelContainer for FileDicomObject<InMemDicomObject<D>>
where
    D: DataDictionary + Clone,
{
    fn transfer_syntax_uid(&self) -> &str {
        registry::normalize_uid(self.meta().transfer_syntax())
    }

    fn bits_allocated(&self) -> Option<u16> {
        self.get(tags::BITS_ALLOCATED)?.uint16().ok()
    }

    fn pixel_representation(&self) -> Option<u16> {
        self.get(tags::PIXEL_REPRESENTATION)?.uint16().ok()
    }

    fn rows(&self) -> Option<u16> {
        self.get(tags::ROWS)?.uint16().ok()
    }

    fn cols(&self) -> Option<u16> {
        self.get(tags::COLUMNS)?.uint16().ok()
    }

    fn number_of_frames(&self) -> Option<u32> {
        self.get(tags::NUMBER_OF_FRAMES)?.to_int().ok()
    }

    fn samples_per_pixel(&self) -> Option<u16> {
        self.get(tags::SAMPLES_PER_PIXEL)?.uint16().ok()
    }

    fn planar_configuration(&self) -> Option<u16> {
        self.get(tags::PLANAR_CONFIGURATION)?.uint16().ok()
    }

    fn photometric_interpretation(&self) -> Option<&str> {
        self.get(tags::PHOTOMETRIC_INTERPRETATION)?
            .string()
            .ok()
            .map(|s| s.trim_end())
    }

    fn palette_lut(&self) -> Option<PaletteLut> {
        Some(PaletteLut::new(
            palette_channel(
                self,
                tags::RED_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
                tags::RED_PALETTE_COLOR_LOOKUP_TABLE_DATA,
            )?,
            palette_channel(
                self,
                tags::GREEN_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
                tags::GREEN_PALETTE_COLOR_LOOKUP_TABLE_DATA,
            )?,
            palette_channel(
                self,
                tags::BLUE_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
                tags::BLUE_PALETTE_COLOR_LOOKUP_TABLE_DATA,
            )?,
        ))
    }

    fn window_center(&self) -> Option<f64> {
        self.get(tags::WINDOW_CENTER)?.to_float64().ok()
    }

    fn window_width(&self) -> Option<f64> {
        self.get(tags::WINDOW_WIDTH)?.to_float64().ok()
    }

    fn rescale_slope(&self) -> Option<f64> {
        self.get(tags::RESCALE_SLOPE)?.to_float64().ok()
    }

    fn rescale_intercept(&self) -> Option<f64> {
        self.get(tags::RESCALE_INTERCEPT)?.to_float64().ok()
    }

    fn pixel_data(&self) -> Option<PixelData<'_>> {
        let pixel_data = self.get(tags::PIXEL_DATA)?;
        match pixel_data.value() {
            // 16-bit samples are kept in the byte order of the transfer syntax,
            // 8-bit samples packed in words stay in stream order
            DicomValue::Primitive(PrimitiveValue::U16(words))
                if registry::is_big_endian(self.transfer_syntax_uid())
                    && self.bits_allocated() == Some(16) =>
            {
                Some(PixelData::Native(Cow::Owned(
                    words.iter().flat_map(|w| w.to_be_bytes()).collect(),
                )))
            }
            DicomValue::Primitive(p) => Some(PixelData::Native(p.to_bytes())),
            DicomValue::PixelSequence(seq) => Some(PixelData::Encapsulated {
                offset_table: Cow::Borrowed(seq.offset_table()),
                fragments: seq
                    .fragments()
                    .iter()
                    .map(|f| Cow::Borrowed(f.as_ref()))
                    .collect(),
            }),
            DicomValue::Sequence(..) => None,
        }
    }

    fn set_pixel_data(&mut self, data: Vec<u8>) {
        let vr = if self.bits_allocated() == Some(8) {
            VR::OB
        } else {
            VR::OW
        };
        self.put(DataElement::new(
            tags::PIXEL_DATA,
            vr,
            PrimitiveValue::from(data),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode_single, encode, DecodeOptions, Decoded, SampleBuffer};
    use dicom_core::dicom_value;
    use dicom_object::meta::FileMetaTableBuilder;

    fn object(ts: &str) -> FileDicomObject<InMemDicomObject> {
        let mut obj = InMemDicomObject::new_empty();
        obj.put(DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(1_u16)));
        obj.put(DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(2_u16)));
        obj.put(DataElement::new(
            tags::BITS_ALLOCATED,
            VR::US,
            PrimitiveValue::from(16_u16),
        ));
        obj.put(DataElement::new(
            tags::PIXEL_REPRESENTATION,
            VR::US,
            PrimitiveValue::from(0_u16),
        ));
        obj.put(DataElement::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            VR::CS,
            PrimitiveValue::from("MONOCHROME2 "),
        ));
        obj.put(DataElement::new(
            tags::WINDOW_CENTER,
            VR::DS,
            dicom_value!(Strs, ["100", "200"]),
        ));
        obj.put(DataElement::new(
            tags::WINDOW_WIDTH,
            VR::DS,
            dicom_value!(Strs, ["50", "60"]),
        ));
        obj.with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(ts)
                .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
                .media_storage_sop_instance_uid("2.25.1"),
        )
        .unwrap()
    }

    #[test]
    fn attributes_from_object() {
        let obj = object("1.2.840.10008.1.2.1");
        assert_eq!(obj.rows(), Some(1));
        assert_eq!(obj.cols(), Some(2));
        assert_eq!(obj.bits_allocated(), Some(16));
        assert_eq!(obj.photometric_interpretation(), Some("MONOCHROME2"));
        assert_eq!(obj.window_center(), Some(100.));
        assert_eq!(obj.window_width(), Some(50.));
        assert_eq!(obj.number_of_frames(), None);
        assert!(!obj.is_compressed());
        assert!(obj.pixel_data().is_none());
        assert!(obj.palette_lut().is_none());
    }

    #[test]
    fn encode_then_decode_object() {
        let mut obj = object("1.2.840.10008.1.2.1");
        let raster = SampleBuffer::new(2, 1, 1, 16, vec![100, 125]).unwrap();
        encode(&mut obj, &raster).unwrap();

        let decoded: Decoded<SampleBuffer> =
            decode_single(&obj, &DecodeOptions::new().level_default()).unwrap();
        let raster = decoded.raster().unwrap();
        // window [75, 125]
        assert_eq!(raster.samples(), &[128, 255]);
    }

    #[test]
    fn big_endian_words() {
        let mut obj = object("1.2.840.10008.1.2.2");
        obj.put(DataElement::new(
            tags::PIXEL_DATA,
            VR::OW,
            PrimitiveValue::U16([0x0102, 0x0304].into()),
        ));
        match obj.pixel_data() {
            Some(PixelData::Native(bytes)) => assert_eq!(&*bytes, &[1, 2, 3, 4]),
            other => panic!("unexpected pixel data {:?}", other),
        }
    }

    #[test]
    fn big_endian_8bit_samples_in_words() {
        let mut obj = object("1.2.840.10008.1.2.2");
        obj.put(DataElement::new(
            tags::BITS_ALLOCATED,
            VR::US,
            PrimitiveValue::from(8_u16),
        ));
        // the first sample is in the low byte of the word
        obj.put(DataElement::new(
            tags::PIXEL_DATA,
            VR::OW,
            PrimitiveValue::U16((&[0x140Au16][..]).into()),
        ));
        match obj.pixel_data() {
            Some(PixelData::Native(bytes)) => assert_eq!(&*bytes, &[10, 20]),
            other => panic!("unexpected pixel data {:?}", other),
        }

        let decoded: Decoded<SampleBuffer> = decode_single(&obj, &DecodeOptions::new()).unwrap();
        assert_eq!(decoded.raster().unwrap().samples(), &[10, 20]);
    }
}
