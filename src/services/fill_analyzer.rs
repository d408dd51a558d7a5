//! 区域填涂分析 - 业务能力层
//!
//! 固定灰度阈值二值化，统计区域内墨迹像素所占百分比。纯函数，不修改图像。

use image::GrayImage;

use crate::error::TemplateError;
use crate::models::template::{Region, RegionShape};

/// 单个区域的读数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionReading {
    /// 填涂比例，范围 [0, 100]
    pub fill_ratio: f64,
    /// `fill_ratio >= threshold`
    pub marked: bool,
}

/// 填涂分析器，阈值按流水线实例配置
#[derive(Debug, Clone, Copy)]
pub struct FillAnalyzer {
    threshold: f64,
    ink_cutoff: u8,
}

impl FillAnalyzer {
    pub fn new(threshold: f64, ink_cutoff: u8) -> Self {
        Self {
            threshold,
            ink_cutoff,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// 唯一的标记判定
    pub fn is_marked(&self, fill_ratio: f64) -> bool {
        fill_ratio >= self.threshold
    }

    fn is_ink(&self, luma: u8) -> bool {
        luma <= self.ink_cutoff
    }

    /// 分析一个区域；区域越出图像边界时返回 `RegionOutOfBounds`
    pub fn analyze(&self, image: &GrayImage, region: &Region) -> Result<RegionReading, TemplateError> {
        region.check_bounds(image.width(), image.height())?;

        let (ink, total) = match region.shape {
            RegionShape::Rectangle => self.count_rectangle(image, region),
            RegionShape::Circle => self.count_circle(image, region),
        };

        let fill_ratio = if total == 0 {
            0.0
        } else {
            ink as f64 * 100.0 / total as f64
        };

        Ok(RegionReading {
            fill_ratio,
            marked: self.is_marked(fill_ratio),
        })
    }

    fn count_rectangle(&self, image: &GrayImage, region: &Region) -> (u64, u64) {
        let mut ink = 0u64;
        for y in region.y..region.y + region.height {
            for x in region.x..region.x + region.width {
                if self.is_ink(image.get_pixel(x, y).0[0]) {
                    ink += 1;
                }
            }
        }
        (ink, region.area())
    }

    /// 统计外接框内切圆内的像素
    fn count_circle(&self, image: &GrayImage, region: &Region) -> (u64, u64) {
        let radius = i64::from(region.width.min(region.height) / 2);
        let cx = i64::from(region.x + region.width / 2);
        let cy = i64::from(region.y + region.height / 2);
        if region.area() == 0 {
            return (0, 0);
        }

        let (mut ink, mut total) = (0u64, 0u64);
        for y in region.y..region.y + region.height {
            for x in region.x..region.x + region.width {
                let (dx, dy) = (i64::from(x) - cx, i64::from(y) - cy);
                if dx * dx + dy * dy <= radius * radius {
                    total += 1;
                    if self.is_ink(image.get_pixel(x, y).0[0]) {
                        ink += 1;
                    }
                }
            }
        }
        (ink, total)
    }
}
