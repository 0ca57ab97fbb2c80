//! Template record layout and zero-copy access.

use crate::error::{CoreError, CoreResult};
use crate::types::{ImageId, Roi};
use std::fmt;

/// Size of the fixed record header in bytes.
///
/// image_id (16) + algorithm_id (4) + x (4) + y (4) + width (4) + height (4)
/// + label (4) + url_size (4) + fv_size (4) = 48
pub const HEADER_SIZE: usize = 48;

const ALGORITHM_ID_OFFSET: usize = 16;
const X_OFFSET: usize = 20;
const Y_OFFSET: usize = 24;
const WIDTH_OFFSET: usize = 28;
const HEIGHT_OFFSET: usize = 32;
const LABEL_OFFSET: usize = 36;
const URL_SIZE_OFFSET: usize = 40;
const FV_SIZE_OFFSET: usize = 44;

fn u32_at(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Total payload length (`url_size + fv_size`) declared by a record header.
///
/// The caller must supply at least [`HEADER_SIZE`] bytes. Computed in `u64`
/// so untrusted size fields cannot overflow the addition.
pub(crate) fn declared_payload_len(header: &[u8]) -> u64 {
    u64::from(u32_at(header, URL_SIZE_OFFSET)) + u64::from(u32_at(header, FV_SIZE_OFFSET))
}

/// A zero-copy view of one encoded template record.
///
/// The view borrows the backing buffer; it is only valid while that buffer
/// lives. To keep a record past the borrow, copy it out with
/// [`TemplateView::to_template`].
///
/// Accessors read directly from the record's fixed header and variable
/// payload regions. The view is only constructed over byte ranges whose
/// declared sizes have been validated, so accessors cannot overrun.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TemplateView<'a> {
    data: &'a [u8],
}

impl<'a> TemplateView<'a> {
    /// Decodes the record starting at `offset` in `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Corruption`] if fewer than [`HEADER_SIZE`] bytes
    /// remain at `offset`, or if the record's declared payload runs past the
    /// end of `buf`. A malformed record is never clamped to the bytes that
    /// happen to be available.
    pub fn parse_at(buf: &'a [u8], offset: usize) -> CoreResult<Self> {
        let remaining = buf.len().saturating_sub(offset);
        if remaining < HEADER_SIZE {
            return Err(CoreError::corruption(
                offset as u64,
                format!("truncated header: {remaining} bytes remain, {HEADER_SIZE} required"),
            ));
        }

        let header = &buf[offset..offset + HEADER_SIZE];
        let total = HEADER_SIZE as u64 + declared_payload_len(header);
        if total > remaining as u64 {
            return Err(CoreError::corruption(
                offset as u64,
                format!("record of {total} bytes overruns buffer: {remaining} bytes remain"),
            ));
        }

        Ok(Self {
            data: &buf[offset..offset + total as usize],
        })
    }

    /// Decodes `data` as exactly one record, with no trailing bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Corruption`] if `data` is not a single
    /// well-formed record.
    pub fn new(data: &'a [u8]) -> CoreResult<Self> {
        let view = Self::parse_at(data, 0)?;
        let trailing = data.len() - view.data.len();
        if trailing != 0 {
            return Err(CoreError::corruption(
                0,
                format!("{trailing} trailing bytes after record"),
            ));
        }
        Ok(view)
    }

    /// Wraps bytes already known to hold exactly one well-formed record.
    pub(crate) const fn from_trusted(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Content hash of the originating image.
    #[must_use]
    pub fn image_id(&self) -> ImageId {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&self.data[..16]);
        ImageId::from_bytes(bytes)
    }

    /// Tag identifying how to interpret the feature-vector payload.
    #[must_use]
    pub fn algorithm_id(&self) -> i32 {
        i32::from_le_bytes([
            self.data[ALGORITHM_ID_OFFSET],
            self.data[ALGORITHM_ID_OFFSET + 1],
            self.data[ALGORITHM_ID_OFFSET + 2],
            self.data[ALGORITHM_ID_OFFSET + 3],
        ])
    }

    /// Region of interest within the originating image.
    #[must_use]
    pub fn roi(&self) -> Roi {
        Roi::new(
            u32_at(self.data, X_OFFSET),
            u32_at(self.data, Y_OFFSET),
            u32_at(self.data, WIDTH_OFFSET),
            u32_at(self.data, HEIGHT_OFFSET),
        )
    }

    /// Supervised class or ground-truth annotation.
    #[must_use]
    pub fn label(&self) -> u32 {
        u32_at(self.data, LABEL_OFFSET)
    }

    /// Byte length of the URL segment, terminator included.
    #[must_use]
    pub fn url_size(&self) -> u32 {
        u32_at(self.data, URL_SIZE_OFFSET)
    }

    /// Byte length of the feature-vector segment.
    #[must_use]
    pub fn fv_size(&self) -> u32 {
        u32_at(self.data, FV_SIZE_OFFSET)
    }

    /// Raw URL segment including its null terminator, if present.
    #[must_use]
    pub fn url_bytes(&self) -> Option<&'a [u8]> {
        let url_size = self.url_size() as usize;
        if url_size == 0 {
            return None;
        }
        Some(&self.data[HEADER_SIZE..HEADER_SIZE + url_size])
    }

    /// Source URL as a string, without the terminator.
    ///
    /// Returns `None` when the record carries no URL or the segment is not
    /// valid UTF-8.
    #[must_use]
    pub fn url(&self) -> Option<&'a str> {
        let segment = self.url_bytes()?;
        let text = segment.strip_suffix(&[0]).unwrap_or(segment);
        std::str::from_utf8(text).ok()
    }

    /// Opaque feature-vector bytes; interpretation is keyed by
    /// [`algorithm_id`](Self::algorithm_id).
    #[must_use]
    pub fn feature_vector(&self) -> &'a [u8] {
        &self.data[HEADER_SIZE + self.url_size() as usize..]
    }

    /// Total encoded size: `HEADER_SIZE + url_size + fv_size`.
    ///
    /// This is the sole mechanism by which the next record's start offset is
    /// located in a stream.
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.data.len()
    }

    /// The record's full byte image, header and payload.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Copies the record into an owned [`Template`].
    #[must_use]
    pub fn to_template(&self) -> Template {
        Template {
            data: self.data.to_vec(),
        }
    }
}

impl fmt::Debug for TemplateView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateView")
            .field("image_id", &self.image_id().to_string())
            .field("algorithm_id", &self.algorithm_id())
            .field("roi", &self.roi())
            .field("label", &self.label())
            .field("url", &self.url())
            .field("fv_size", &self.fv_size())
            .finish()
    }
}

/// An owned template record backed by one contiguous buffer.
///
/// Created by [`TemplateBuilder`](super::TemplateBuilder) or by copying a
/// [`TemplateView`]. The buffer is reclaimed on drop; there is no explicit
/// release operation.
#[derive(Clone, PartialEq, Eq)]
pub struct Template {
    data: Vec<u8>,
}

impl Template {
    /// Takes ownership of a buffer holding exactly one record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Corruption`] if `data` is not a single
    /// well-formed record.
    pub fn from_bytes(data: Vec<u8>) -> CoreResult<Self> {
        TemplateView::new(&data)?;
        Ok(Self { data })
    }

    /// Wraps an encoder-produced buffer. The builder guarantees validity.
    pub(crate) fn from_encoded(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Borrows the record as a [`TemplateView`].
    #[must_use]
    pub fn as_view(&self) -> TemplateView<'_> {
        TemplateView::from_trusted(&self.data)
    }

    /// Content hash of the originating image.
    #[must_use]
    pub fn image_id(&self) -> ImageId {
        self.as_view().image_id()
    }

    /// Tag identifying how to interpret the feature-vector payload.
    #[must_use]
    pub fn algorithm_id(&self) -> i32 {
        self.as_view().algorithm_id()
    }

    /// Region of interest within the originating image.
    #[must_use]
    pub fn roi(&self) -> Roi {
        self.as_view().roi()
    }

    /// Supervised class or ground-truth annotation.
    #[must_use]
    pub fn label(&self) -> u32 {
        self.as_view().label()
    }

    /// Byte length of the URL segment, terminator included.
    #[must_use]
    pub fn url_size(&self) -> u32 {
        self.as_view().url_size()
    }

    /// Byte length of the feature-vector segment.
    #[must_use]
    pub fn fv_size(&self) -> u32 {
        self.as_view().fv_size()
    }

    /// Source URL as a string, without the terminator.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.as_view().url()
    }

    /// Opaque feature-vector bytes.
    #[must_use]
    pub fn feature_vector(&self) -> &[u8] {
        self.as_view().feature_vector()
    }

    /// Total encoded size in bytes.
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.data.len()
    }

    /// The record's full byte image, header and payload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the record, returning its byte image.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_view(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateBuilder;

    fn sample() -> Template {
        TemplateBuilder::new(ImageId::ZERO, 1)
            .roi(Roi::new(0, 0, 100, 100))
            .label(7)
            .url("foo.jpg")
            .feature_vector(&[0x01, 0x02, 0x03])
            .build()
            .unwrap()
    }

    #[test]
    fn concrete_record_layout() {
        let template = sample();

        // "foo.jpg" is 7 chars plus the terminator
        assert_eq!(template.url_size(), 8);
        assert_eq!(template.fv_size(), 3);
        assert_eq!(template.total_size(), HEADER_SIZE + 11);

        let view = template.as_view();
        assert_eq!(view.image_id(), ImageId::ZERO);
        assert_eq!(view.algorithm_id(), 1);
        assert_eq!(view.roi(), Roi::new(0, 0, 100, 100));
        assert_eq!(view.label(), 7);
        assert_eq!(view.url(), Some("foo.jpg"));
        assert_eq!(view.url_bytes(), Some(&b"foo.jpg\0"[..]));
        assert_eq!(view.feature_vector(), &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn header_fields_little_endian() {
        let template = sample();
        let bytes = template.as_bytes();

        assert_eq!(&bytes[16..20], &1i32.to_le_bytes());
        assert_eq!(&bytes[28..32], &100u32.to_le_bytes());
        assert_eq!(&bytes[36..40], &7u32.to_le_bytes());
        assert_eq!(&bytes[40..44], &8u32.to_le_bytes());
        assert_eq!(&bytes[44..48], &3u32.to_le_bytes());
    }

    #[test]
    fn short_header_is_corruption() {
        let err = TemplateView::parse_at(&[0u8; 10], 0).unwrap_err();
        assert!(matches!(err, CoreError::Corruption { offset: 0, .. }));
    }

    #[test]
    fn overlong_declared_size_is_corruption() {
        let mut bytes = sample().into_bytes();
        // Inflate fv_size past the actual payload
        bytes[FV_SIZE_OFFSET..FV_SIZE_OFFSET + 4].copy_from_slice(&100u32.to_le_bytes());

        let err = TemplateView::parse_at(&bytes, 0).unwrap_err();
        assert!(matches!(err, CoreError::Corruption { .. }));
    }

    #[test]
    fn truncated_payload_is_corruption() {
        let bytes = sample().into_bytes();
        let err = TemplateView::parse_at(&bytes[..bytes.len() - 1], 0).unwrap_err();
        assert!(matches!(err, CoreError::Corruption { .. }));
    }

    #[test]
    fn exact_fit_required_for_single_record() {
        let mut bytes = sample().into_bytes();
        bytes.push(0xFF);

        assert!(TemplateView::new(&bytes).is_err());
        assert!(Template::from_bytes(bytes).is_err());
    }

    #[test]
    fn record_without_url() {
        let template = TemplateBuilder::new(ImageId::from_bytes([9; 16]), -3)
            .feature_vector(&[0xAA; 5])
            .build()
            .unwrap();

        assert_eq!(template.url_size(), 0);
        assert_eq!(template.url(), None);
        assert_eq!(template.as_view().url_bytes(), None);
        assert_eq!(template.feature_vector(), &[0xAA; 5]);
        assert_eq!(template.total_size(), HEADER_SIZE + 5);
    }

    #[test]
    fn non_utf8_url_segment_reads_as_none() {
        let mut bytes = sample().into_bytes();
        // Stomp the URL segment with invalid UTF-8
        bytes[HEADER_SIZE] = 0xFF;
        bytes[HEADER_SIZE + 1] = 0xFE;

        let template = Template::from_bytes(bytes).unwrap();
        assert_eq!(template.url(), None);
        assert!(template.as_view().url_bytes().is_some());
    }

    #[test]
    fn view_roundtrips_through_owned_copy() {
        let template = sample();
        let copy = template.as_view().to_template();
        assert_eq!(copy, template);
        assert_eq!(copy.as_bytes(), template.as_bytes());
    }

    #[test]
    fn parse_at_mid_buffer() {
        let a = sample();
        let b = TemplateBuilder::new(ImageId::from_bytes([2; 16]), 2)
            .feature_vector(&[1, 2, 3, 4])
            .build()
            .unwrap();

        let mut buf = a.as_bytes().to_vec();
        buf.extend_from_slice(b.as_bytes());

        let second = TemplateView::parse_at(&buf, a.total_size()).unwrap();
        assert_eq!(second.algorithm_id(), 2);
        assert_eq!(second.feature_vector(), &[1, 2, 3, 4]);
    }
}
