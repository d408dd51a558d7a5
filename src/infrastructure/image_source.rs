//! 图像读取 - 基础设施层
//!
//! 从磁盘解码图像并转为灰度。解码失败只终止这一张图片。

use std::path::Path;

use image::{DynamicImage, GrayImage, Luma, RgbImage};

use crate::error::{AppError, AppResult};

/// 读取图像并转为 8 位灰度
pub fn load_grayscale(path: &Path) -> AppResult<GrayImage> {
    let image = image::open(path).map_err(|e| AppError::image_unreadable(path.display().to_string(), e))?;
    Ok(match image {
        DynamicImage::ImageLuma8(gray) => gray,
        other => bt601_luma(&other.to_rgb8()),
    })
}

/// BT.601 亮度：Y = 0.299 R + 0.587 G + 0.114 B，14 位定点并四舍五入
///
/// `DynamicImage::to_luma8` 使用 Rec. 709 权重，彩色笔迹在 128 附近会得到不同的判定。
fn bt601_luma(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let y = (u32::from(r) * 4899 + u32::from(g) * 9617 + u32::from(b) * 1868 + 8192) >> 14;
        Luma([y.min(255) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageError;
    use image::Rgb;

    #[test]
    fn test_load_png_as_grayscale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.png");
        RgbImage::from_pixel(8, 6, Rgb([255, 255, 255])).save(&path).unwrap();

        let gray = load_grayscale(&path).unwrap();
        assert_eq!(gray.dimensions(), (8, 6));
        assert_eq!(*gray.get_pixel(3, 3), Luma([255]));
    }

    #[test]
    fn test_color_uses_bt601_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("color.png");
        let mut rgb = RgbImage::new(3, 1);
        rgb.put_pixel(0, 0, Rgb([255, 0, 0]));
        rgb.put_pixel(1, 0, Rgb([0, 255, 0]));
        rgb.put_pixel(2, 0, Rgb([0, 0, 255]));
        rgb.save(&path).unwrap();

        let gray = load_grayscale(&path).unwrap();
        assert_eq!(gray.get_pixel(0, 0).0[0], 76);
        assert_eq!(gray.get_pixel(1, 0).0[0], 150);
        assert_eq!(gray.get_pixel(2, 0).0[0], 29);
    }

    #[test]
    fn test_gray_png_kept_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        GrayImage::from_pixel(4, 4, Luma([128])).save(&path).unwrap();
        assert_eq!(*load_grayscale(&path).unwrap().get_pixel(1, 1), Luma([128]));
    }

    #[test]
    fn test_corrupt_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not a jpeg").unwrap();

        let err = load_grayscale(&path).unwrap_err();
        assert!(matches!(err, AppError::Image(ImageError::Unreadable { .. })));
        assert!(err.is_per_image());
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_grayscale(&dir.path().join("missing.png")).is_err());
    }
}
