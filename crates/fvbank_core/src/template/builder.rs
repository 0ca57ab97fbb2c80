//! Template record construction.

use crate::error::{CoreError, CoreResult};
use crate::template::record::{Template, HEADER_SIZE};
use crate::types::{ImageId, Roi};

/// Builds an owned [`Template`] from discrete field values.
///
/// Field values and payload slices are borrowed until [`build`](Self::build),
/// which validates them and copies everything into one contiguous buffer.
///
/// # Example
///
/// ```rust
/// use fvbank_core::{ImageId, Roi, TemplateBuilder};
///
/// let template = TemplateBuilder::new(ImageId::ZERO, 1)
///     .roi(Roi::new(0, 0, 100, 100))
///     .label(7)
///     .url("foo.jpg")
///     .feature_vector(&[0x01, 0x02, 0x03])
///     .build()
///     .unwrap();
///
/// assert_eq!(template.url(), Some("foo.jpg"));
/// ```
#[derive(Debug, Clone)]
pub struct TemplateBuilder<'a> {
    image_id: ImageId,
    algorithm_id: i32,
    roi: Roi,
    label: u32,
    url: Option<&'a str>,
    feature_vector: &'a [u8],
}

impl<'a> TemplateBuilder<'a> {
    /// Starts a builder for the given image and algorithm.
    #[must_use]
    pub const fn new(image_id: ImageId, algorithm_id: i32) -> Self {
        Self {
            image_id,
            algorithm_id,
            roi: Roi::new(0, 0, 0, 0),
            label: 0,
            url: None,
            feature_vector: &[],
        }
    }

    /// Sets the region of interest.
    #[must_use]
    pub const fn roi(mut self, roi: Roi) -> Self {
        self.roi = roi;
        self
    }

    /// Sets the supervised class or ground-truth annotation.
    #[must_use]
    pub const fn label(mut self, label: u32) -> Self {
        self.label = label;
        self
    }

    /// Sets the source URL. When absent, no URL segment is written at all.
    #[must_use]
    pub const fn url(mut self, url: &'a str) -> Self {
        self.url = Some(url);
        self
    }

    /// Sets the feature-vector payload.
    #[must_use]
    pub const fn feature_vector(mut self, feature_vector: &'a [u8]) -> Self {
        self.feature_vector = feature_vector;
        self
    }

    /// Validates the fields and encodes the record.
    ///
    /// The URL segment is written null-terminated, with the terminator
    /// counted inside `url_size`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if:
    /// - the URL contains an interior NUL byte (it would forge the segment
    ///   terminator)
    /// - the URL or feature vector exceeds a `u32` byte length
    pub fn build(self) -> CoreResult<Template> {
        let url_size = match self.url {
            Some(url) => {
                if url.as_bytes().contains(&0) {
                    return Err(CoreError::invalid_argument(
                        "URL contains interior NUL byte",
                    ));
                }
                u32::try_from(url.len() as u64 + 1).map_err(|_| {
                    CoreError::invalid_argument(format!(
                        "URL of {} bytes exceeds the u32 size field",
                        url.len()
                    ))
                })?
            }
            None => 0,
        };

        let fv_size = u32::try_from(self.feature_vector.len()).map_err(|_| {
            CoreError::invalid_argument(format!(
                "feature vector of {} bytes exceeds the u32 size field",
                self.feature_vector.len()
            ))
        })?;

        let total = HEADER_SIZE + url_size as usize + fv_size as usize;
        let mut data = Vec::with_capacity(total);

        data.extend_from_slice(self.image_id.as_bytes());
        data.extend_from_slice(&self.algorithm_id.to_le_bytes());
        data.extend_from_slice(&self.roi.x.to_le_bytes());
        data.extend_from_slice(&self.roi.y.to_le_bytes());
        data.extend_from_slice(&self.roi.width.to_le_bytes());
        data.extend_from_slice(&self.roi.height.to_le_bytes());
        data.extend_from_slice(&self.label.to_le_bytes());
        data.extend_from_slice(&url_size.to_le_bytes());
        data.extend_from_slice(&fv_size.to_le_bytes());

        if let Some(url) = self.url {
            data.extend_from_slice(url.as_bytes());
            data.push(0);
        }
        data.extend_from_slice(self.feature_vector);

        debug_assert_eq!(data.len(), total);
        Ok(Template::from_encoded(data))
    }
}
