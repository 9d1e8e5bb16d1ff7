//! CPU-side texels.
//!
//! An [`Image`] is a tightly packed, row-major block of 8-bit texels, first row first, ready to
//! be handed to [`Texture::upload_level`](crate::texture::Texture::upload_level).

/// Layout of a single texel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PixelFormat {
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    /// Number of bytes in one texel.
    pub fn size(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }

    /// `(format, internal format, type)` as expected by `texImage2D`.
    pub(crate) fn glow_pixel_format(self) -> (u32, i32, u32) {
        match self {
            PixelFormat::Rgb8 => (glow::RGB, glow::RGB as i32, glow::UNSIGNED_BYTE),
            PixelFormat::Rgba8 => (glow::RGBA, glow::RGBA as i32, glow::UNSIGNED_BYTE),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub texels: Vec<u8>,
}

impl Image {
    pub fn new(width: u32, height: u32, format: PixelFormat, texels: Vec<u8>) -> Self {
        Image {
            width,
            height,
            format,
            texels,
        }
    }

    /// Decode a PNG or JPEG file and convert it to `format`.
    pub fn decode(bytes: &[u8], format: PixelFormat) -> Result<Self, image::ImageError> {
        let decoded = image::load_from_memory(bytes)?;
        let (width, height) = (decoded.width(), decoded.height());

        let texels = match format {
            PixelFormat::Rgb8 => decoded.to_rgb8().into_raw(),
            PixelFormat::Rgba8 => decoded.to_rgba8().into_raw(),
        };

        Ok(Image::new(width, height, format, texels))
    }

    /// Number of bytes needed to hold every texel.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.size()
    }

    /// Bytes in one row of texels.
    pub fn row_len(&self) -> usize {
        self.width as usize * self.format.size()
    }

    /// Reverse the row order, so that the last row of the file is uploaded first.
    ///
    /// Texture coordinates put `t = 0` at the first uploaded row; image files store their top row
    /// first.
    pub fn flip_rows(mut self) -> Self {
        let row_len = self.row_len();

        if row_len == 0 {
            return self;
        }

        let rows = self.texels.len() / row_len;
        let mut flipped = Vec::with_capacity(self.texels.len());

        for row in (0..rows).rev() {
            flipped.extend_from_slice(&self.texels[row * row_len..(row + 1) * row_len]);
        }

        self.texels = flipped;
        self
    }
}

/// Convert a float channel to a byte, rounding to the nearest value.
pub fn channel_round(v: f32) -> u8 {
    (v * 255.).round().clamp(0., 255.) as u8
}

/// Convert a float channel to a byte, rounding up.
pub fn channel_ceil(v: f32) -> u8 {
    (v * 255.).ceil().clamp(0., 255.) as u8
}

/// A `size`×`size` RGB image filled with a single color.
pub fn solid_rgb(size: u32, rgb: [f32; 3]) -> Image {
    let texel = rgb.map(channel_round);
    let texels = texel
        .iter()
        .copied()
        .cycle()
        .take((size * size) as usize * 3)
        .collect();

    Image::new(size, size, PixelFormat::Rgb8, texels)
}

/// A `size`×`size` RGBA image filled with a single color.
pub fn solid_rgba(size: u32, rgba: [f32; 4]) -> Image {
    let texel = rgba.map(channel_ceil);
    let texels = texel
        .iter()
        .copied()
        .cycle()
        .take((size * size) as usize * 4)
        .collect();

    Image::new(size, size, PixelFormat::Rgba8, texels)
}

/// A 32×32 white RGB image with a black first row and first column, except texel `(0, 0)`
/// which stays white. Repeated, it draws a one-texel grid.
pub fn grid_image() -> Image {
    const SIZE: u32 = 32;
    let mut texels = Vec::with_capacity((SIZE * SIZE * 3) as usize);

    for row in 0..SIZE {
        for col in 0..SIZE {
            let black = (row == 0) != (col == 0);
            let v = if black { 0 } else { 255 };
            texels.extend_from_slice(&[v, v, v]);
        }
    }

    Image::new(SIZE, SIZE, PixelFormat::Rgb8, texels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texel(image: &Image, x: u32, y: u32) -> &[u8] {
        let size = image.format.size();
        let start = (y * image.width + x) as usize * size;
        &image.texels[start..start + size]
    }

    #[test]
    fn grid_corners() {
        let grid = grid_image();
        assert_eq!(grid.texels.len(), grid.expected_len());
        assert_eq!(texel(&grid, 0, 0), &[255, 255, 255]);
        assert_eq!(texel(&grid, 1, 0), &[0, 0, 0]);
        assert_eq!(texel(&grid, 0, 1), &[0, 0, 0]);
        assert_eq!(texel(&grid, 31, 0), &[0, 0, 0]);
        assert_eq!(texel(&grid, 1, 1), &[255, 255, 255]);
        assert_eq!(texel(&grid, 31, 31), &[255, 255, 255]);
    }

    #[test]
    fn solid_rgb_rounds_to_nearest() {
        let image = solid_rgb(2, [1., 0.5, 0.]);
        assert_eq!(image.texels.len(), 12);
        assert_eq!(texel(&image, 1, 1), &[255, 128, 0]);
    }

    #[test]
    fn solid_rgba_rounds_up() {
        let image = solid_rgba(4, [0., 0., 1., 0.25]);
        assert_eq!(image.texels.len(), 64);
        assert_eq!(texel(&image, 3, 2), &[0, 0, 255, 64]);
    }

    #[test]
    fn single_texel_levels() {
        assert_eq!(solid_rgb(1, [1., 0., 0.]).texels, vec![255, 0, 0]);
        assert_eq!(solid_rgba(1, [0., 0., 0., 1.]).texels, vec![0, 0, 0, 255]);
    }

    #[test]
    fn flip_reverses_rows_only() {
        let image = Image::new(
            2,
            2,
            PixelFormat::Rgb8,
            vec![255, 255, 255, 0, 0, 0, 0, 0, 0, 255, 255, 255],
        );

        let flipped = image.flip_rows();
        assert_eq!(
            flipped.texels,
            vec![0, 0, 0, 255, 255, 255, 255, 255, 255, 0, 0, 0]
        );
    }

    #[test]
    fn flip_of_empty_image_is_empty() {
        let image = Image::new(0, 0, PixelFormat::Rgba8, Vec::new()).flip_rows();
        assert!(image.texels.is_empty());
    }

    #[test]
    fn decode_png() {
        let mut png = Vec::new();
        let source = image::RgbaImage::from_raw(1, 2, vec![255, 0, 0, 255, 0, 0, 255, 128])
            .expect("two texels");
        source
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .expect("png encoding");

        let rgba = Image::decode(&png, PixelFormat::Rgba8).expect("png decoding");
        assert_eq!((rgba.width, rgba.height), (1, 2));
        assert_eq!(rgba.texels, vec![255, 0, 0, 255, 0, 0, 255, 128]);

        let rgb = Image::decode(&png, PixelFormat::Rgb8).expect("png decoding");
        assert_eq!(rgb.texels, vec![255, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn decode_garbage_fails() {
        assert!(Image::decode(b"not an image", PixelFormat::Rgb8).is_err());
    }

    #[test]
    fn gl_formats() {
        assert_eq!(
            PixelFormat::Rgb8.glow_pixel_format(),
            (glow::RGB, glow::RGB as i32, glow::UNSIGNED_BYTE)
        );
        assert_eq!(PixelFormat::Rgba8.size(), 4);
    }
}
