//! 身份解析 - 业务能力层
//!
//! 从标准画布左上角的固定区域读取二维码，解析 `课程-评估-学生` 三段数字。
//! 每张图片只尝试一次，读不到或格式不符都是 `Unknown`，不是错误。

use image::{imageops, GrayImage};
use regex::Regex;
use rqrr::PreparedImage;

use crate::error::AppResult;
use crate::models::identity::Identity;
use crate::models::template::Region;

/// 二维码读取能力
pub trait CodeReader: Send + Sync {
    /// 读取图像中的第一个码，读不到返回 `None`
    fn read(&self, image: &GrayImage) -> Option<String>;
}

/// 基于 rqrr 的二维码读取
#[derive(Debug, Default, Clone, Copy)]
pub struct QrCodeReader;

impl CodeReader for QrCodeReader {
    fn read(&self, image: &GrayImage) -> Option<String> {
        let mut prepared = PreparedImage::prepare_from_greyscale(
            image.width() as usize,
            image.height() as usize,
            |x, y| image.get_pixel(x as u32, y as u32).0[0],
        );
        let grids = prepared.detect_grids();
        grids
            .first()
            .and_then(|grid| grid.decode().ok())
            .map(|(_, content)| content)
    }
}

/// 身份解析器
pub struct IdentityResolver {
    region: Region,
    pattern: Regex,
    reader: Box<dyn CodeReader>,
}

impl IdentityResolver {
    pub fn new(region: Region) -> AppResult<Self> {
        Self::with_reader(region, Box::new(QrCodeReader))
    }

    pub fn with_reader(region: Region, reader: Box<dyn CodeReader>) -> AppResult<Self> {
        Ok(Self {
            region,
            pattern: Regex::new(r"^([0-9]+)-([0-9]+)-([0-9]+)$")?,
            reader,
        })
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// 解析标准画布上的身份
    pub fn resolve(&self, image: &GrayImage) -> Identity {
        let code_area = self.crop_code_area(image);
        match self.reader.read(&code_area) {
            Some(payload) => self.parse_payload(&payload),
            None => Identity::unknown(None),
        }
    }

    /// 解析二维码文本；格式不符时保留原文
    pub fn parse_payload(&self, payload: &str) -> Identity {
        let trimmed = payload.trim();
        match self.pattern.captures(trimmed) {
            Some(caps) => Identity::decoded(&caps[1], &caps[2], &caps[3], trimmed),
            None => {
                tracing::debug!("二维码格式不符: {:?}", trimmed);
                let raw = (!trimmed.is_empty()).then(|| trimmed.to_string());
                Identity::unknown(raw)
            }
        }
    }

    /// 截取二维码区域，超出图像的部分裁掉
    fn crop_code_area(&self, image: &GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        let x = self.region.x.min(width);
        let y = self.region.y.min(height);
        let w = self.region.width.min(width - x);
        let h = self.region.height.min(height - y);
        imageops::crop_imm(image, x, y, w, h).to_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::identity::IdentityStatus;
    use image::Luma;

    struct FixedReader(Option<&'static str>);

    impl CodeReader for FixedReader {
        fn read(&self, _image: &GrayImage) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn resolver(payload: Option<&'static str>) -> IdentityResolver {
        IdentityResolver::with_reader(Region::rect(1, 1, 469, 469), Box::new(FixedReader(payload)))
            .unwrap()
    }

    #[test]
    fn test_three_numeric_tokens_decoded() {
        let identity = resolver(None).parse_payload("12-4405-59652\n");
        assert_eq!(identity.status, IdentityStatus::Decoded);
        assert_eq!(identity.course_id.as_deref(), Some("12"));
        assert_eq!(identity.assessment_id.as_deref(), Some("4405"));
        assert_eq!(identity.student_id.as_deref(), Some("59652"));
    }

    #[test]
    fn test_malformed_payload_kept_as_raw() {
        let resolver = resolver(None);
        for payload in ["12-4405", "12-44a5-1", "1-2-3-4", "-1-2", "12 - 4405 - 1", "١-٢-٣"] {
            let identity = resolver.parse_payload(payload);
            assert_eq!(identity.status, IdentityStatus::Unknown, "{}", payload);
            assert_eq!(identity.raw.as_deref(), Some(payload.trim()));
            assert_eq!(identity.student_id, None);
        }
        assert_eq!(resolver.parse_payload("   ").raw, None);
    }

    #[test]
    fn test_resolve_uses_reader() {
        let image = GrayImage::from_pixel(600, 600, Luma([255]));
        assert_eq!(resolver(Some("1-2-3")).resolve(&image).status, IdentityStatus::Decoded);
        assert!(resolver(None).resolve(&image).is_unknown());
    }

    #[test]
    fn test_small_image_does_not_panic() {
        let image = GrayImage::from_pixel(10, 10, Luma([255]));
        assert!(resolver(None).resolve(&image).is_unknown());
        assert!(IdentityResolver::new(Region::rect(1, 1, 469, 469))
            .unwrap()
            .resolve(&image)
            .is_unknown());
    }

    #[test]
    fn test_blank_code_area_is_unknown() {
        let image = GrayImage::from_pixel(500, 500, Luma([255]));
        let identity = IdentityResolver::new(Region::rect(1, 1, 469, 469))
            .unwrap()
            .resolve(&image);
        assert!(identity.is_unknown());
        assert_eq!(identity.raw, None);
    }
}
