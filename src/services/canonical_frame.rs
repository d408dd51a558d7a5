//! 标准画布 - 业务能力层
//!
//! 超出最大尺寸的图像居中裁剪到最大尺寸；小于最大尺寸的维度原样保留，不补边。

use image::{imageops, GrayImage};

/// 标准画布尺寸上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLimits {
    pub max_width: u32,
    pub max_height: u32,
}

impl FrameLimits {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// 裁剪框 `(x, y, width, height)`，原点取 `((w - maxw) / 2, (h - maxh) / 2)`，余数偏向左上
    pub fn crop_box(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        (
            width.saturating_sub(self.max_width) / 2,
            height.saturating_sub(self.max_height) / 2,
            width.min(self.max_width),
            height.min(self.max_height),
        )
    }

    pub fn needs_crop(&self, width: u32, height: u32) -> bool {
        width > self.max_width || height > self.max_height
    }
}

/// 生成标准画布；无需裁剪时直接返回原图
pub fn canonicalize(image: GrayImage, limits: &FrameLimits) -> GrayImage {
    let (width, height) = image.dimensions();
    if !limits.needs_crop(width, height) {
        return image;
    }

    let (x, y, crop_width, crop_height) = limits.crop_box(width, height);
    tracing::debug!(
        "裁剪 {}x{} → {}x{} (原点 {}, {})",
        width,
        height,
        crop_width,
        crop_height,
        x,
        y
    );
    imageops::crop_imm(&image, x, y, crop_width, crop_height).to_image()
}
