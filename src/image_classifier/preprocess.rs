use crate::config::TensorLayout;
use image::{imageops, DynamicImage, RgbImage};
use tract_onnx::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preprocess {
    pub width: u32,
    pub height: u32,
    pub layout: TensorLayout,
    pub pixel_scale: f32,
    pub letterbox: bool,
}

impl Preprocess {
    pub fn input_shape(&self) -> [usize; 4] {
        let (w, h) = (self.width as usize, self.height as usize);
        match self.layout {
            TensorLayout::Nhwc => [1, h, w, 3],
            TensorLayout::Nchw => [1, 3, h, w],
        }
    }

    pub fn image_to_tensor(&self, image: &DynamicImage) -> Tensor {
        let rgb = self.resize(image);
        let scale = self.pixel_scale;
        let value = |x: usize, y: usize, c: usize| rgb.get_pixel(x as u32, y as u32)[c] as f32 * scale;

        let (w, h) = (self.width as usize, self.height as usize);
        match self.layout {
            TensorLayout::Nhwc => {
                tract_ndarray::Array4::from_shape_fn((1, h, w, 3), |(_, y, x, c)| value(x, y, c))
                    .into()
            }
            TensorLayout::Nchw => {
                tract_ndarray::Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| value(x, y, c))
                    .into()
            }
        }
    }

    fn resize(&self, image: &DynamicImage) -> RgbImage {
        if !self.letterbox || image.width() * self.height == image.height() * self.width {
            return image
                .resize_exact(self.width, self.height, imageops::FilterType::Triangle)
                .to_rgb8();
        }

        let scaled = image
            .resize(self.width, self.height, imageops::FilterType::Triangle)
            .to_rgb8();
        let mut padded = RgbImage::new(self.width, self.height);
        let x_offset = (self.width - scaled.width()) / 2;
        let y_offset = (self.height - scaled.height()) / 2;
        imageops::overlay(&mut padded, &scaled, x_offset as i64, y_offset as i64);
        padded
    }
}
