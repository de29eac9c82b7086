//! [`Surface`] implementation for the Linux framebuffer
//!
//! The projector is driven from the Pi's HDMI output, which the kernel exposes as `/dev/fb0`.
//! Frames are converted to the framebuffer's pixel format and written from the top-left corner,
//! clipping anything which doesn't fit.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    fs::{self, File, OpenOptions},
    io::{Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};
use log::debug;

use eqpt_if::eqpt::display::{RgbImage, Surface, SurfaceError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Geometry and pixel format of a framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FbInfo {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u32,

    /// Number of bytes per line, which may be more than `width * bytes_per_pixel`
    pub stride: u32,
}

pub struct FbSurface {
    file: File,
    info: FbInfo,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FbSurface {
    /// Open a framebuffer device such as `/dev/fb0`.
    ///
    /// The geometry is read from the device's sysfs entry.
    pub fn open<P: AsRef<Path>>(device: P) -> Result<Self, SurfaceError> {
        let name = device
            .as_ref()
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SurfaceError::UnsupportedFormat(
                format!("{:?} is not a framebuffer device", device.as_ref())
            ))?;

        let info = FbInfo::from_sysfs(&PathBuf::from("/sys/class/graphics").join(name))?;

        if info.bits_per_pixel != 16 && info.bits_per_pixel != 32 {
            return Err(SurfaceError::UnsupportedFormat(
                format!("{} bits per pixel", info.bits_per_pixel)
            ));
        }

        let file = OpenOptions::new()
            .write(true)
            .open(device.as_ref())
            .map_err(SurfaceError::Open)?;

        debug!("Opened framebuffer {:?}: {:?}", device.as_ref(), info);

        Ok(Self { file, info })
    }

    pub fn info(&self) -> FbInfo {
        self.info
    }
}

impl Surface for FbSurface {
    fn present(&mut self, frame: &RgbImage) -> Result<(), SurfaceError> {
        let data = encode_frame(frame, &self.info);

        self.file.seek(SeekFrom::Start(0)).map_err(SurfaceError::Write)?;
        self.file.write_all(&data).map_err(SurfaceError::Write)?;
        self.file.flush().map_err(SurfaceError::Write)
    }
}

impl FbInfo {
    /// Read the geometry from a sysfs directory like `/sys/class/graphics/fb0`.
    pub fn from_sysfs(dir: &Path) -> Result<Self, SurfaceError> {
        let read = |name: &str| -> Result<String, SurfaceError> {
            fs::read_to_string(dir.join(name))
                .map(|s| s.trim().to_string())
                .map_err(SurfaceError::Open)
        };

        let bad = |what: &str, s: &str| SurfaceError::UnsupportedFormat(
            format!("Could not parse {} from {:?}", what, s)
        );

        let size = read("virtual_size")?;
        let mut parts = size.split(',');
        let width = parts.next()
            .and_then(|w| w.trim().parse().ok())
            .ok_or_else(|| bad("virtual_size", &size))?;
        let height = parts.next()
            .and_then(|h| h.trim().parse().ok())
            .ok_or_else(|| bad("virtual_size", &size))?;

        let bpp = read("bits_per_pixel")?;
        let bits_per_pixel = bpp.parse().map_err(|_| bad("bits_per_pixel", &bpp))?;

        let stride = read("stride")?;
        let stride = stride.parse().map_err(|_| bad("stride", &stride))?;

        Ok(Self { width, height, bits_per_pixel, stride })
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a frame into raw framebuffer memory.
///
/// 16 bit framebuffers use little-endian RGB565, 32 bit ones little-endian XRGB8888. Areas of the
/// framebuffer outside the frame are left black.
pub fn encode_frame(frame: &RgbImage, info: &FbInfo) -> Vec<u8> {
    let bytes_pp = (info.bits_per_pixel / 8) as usize;
    let stride = info.stride as usize;
    let mut data = vec![0u8; stride * info.height as usize];

    let w = frame.width().min(info.width);
    let h = frame.height().min(info.height);

    for y in 0..h {
        for x in 0..w {
            let p = frame.get_pixel(x, y);
            let (r, g, b) = (p[0], p[1], p[2]);
            let offset = y as usize * stride + x as usize * bytes_pp;

            match bytes_pp {
                2 => {
                    let v: u16 = ((r as u16 >> 3) << 11)
                        | ((g as u16 >> 2) << 5)
                        | (b as u16 >> 3);
                    data[offset..offset + 2].copy_from_slice(&v.to_le_bytes());
                },
                _ => {
                    data[offset..offset + 4].copy_from_slice(&[b, g, r, 0xff]);
                }
            }
        }
    }

    data
}

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgb;

    fn frame() -> RgbImage {
        let mut f = RgbImage::new(2, 2);
        f.put_pixel(0, 0, Rgb([255, 255, 255]));
        f.put_pixel(1, 1, Rgb([255, 0, 0]));
        f
    }

    #[test]
    fn test_encode_32bpp() {
        let info = FbInfo { width: 3, height: 2, bits_per_pixel: 32, stride: 12 };
        let data = encode_frame(&frame(), &info);

        assert_eq!(data.len(), 24);
        assert_eq!(&data[0..4], &[255, 255, 255, 255]);
        assert_eq!(&data[4..8], &[0, 0, 0, 255]);
        // Column outside the frame stays black
        assert_eq!(&data[8..12], &[0, 0, 0, 0]);
        assert_eq!(&data[16..20], &[0, 0, 255, 255]);
    }

    #[test]
    fn test_encode_16bpp_clipped() {
        let info = FbInfo { width: 1, height: 1, bits_per_pixel: 16, stride: 2 };
        let data = encode_frame(&frame(), &info);

        assert_eq!(data, vec![0xff, 0xff]);
    }

    #[test]
    fn test_from_sysfs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("virtual_size"), "854,480\n").unwrap();
        fs::write(dir.path().join("bits_per_pixel"), "16\n").unwrap();
        fs::write(dir.path().join("stride"), "1708\n").unwrap();

        assert_eq!(
            FbInfo::from_sysfs(dir.path()).unwrap(),
            FbInfo { width: 854, height: 480, bits_per_pixel: 16, stride: 1708 }
        );
    }
}
