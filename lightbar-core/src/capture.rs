//! Screen capture into a bounds-checked BGR pixel buffer.

use crate::error::Error;

use log::debug;

/// Width of the fixed capture window, in pixels.
pub const CAPTURE_WIDTH: u32 = 200;
/// Height of the fixed capture window, in pixels.
pub const CAPTURE_HEIGHT: u32 = 150;

/// Bytes per pixel in a [`PixelBuffer`] (24-bit BGR).
const BYTES_PER_PIXEL: usize = 3;

/// Compute the top-left corner of the capture window, centered on the
/// configured desktop resolution and clamped to the origin for screens
/// smaller than the window.
pub fn capture_origin(screen_width: u32, screen_height: u32) -> (u32, u32) {
    (
        screen_width.saturating_sub(CAPTURE_WIDTH) / 2,
        screen_height.saturating_sub(CAPTURE_HEIGHT) / 2,
    )
}

/// A row-major 24-bit BGR pixel buffer with an explicit row stride.
///
/// The stride is in bytes and may exceed `width * 3` when rows are padded
/// for alignment, like the DIB layout this capture path replaces. All access
/// goes through the checked [`bgr`](Self::bgr) accessor; there is no
/// raw-pointer path.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
}

impl PixelBuffer {
    /// Wrap an existing BGR byte buffer.
    ///
    /// # Panics
    ///
    /// Panics if the stride is smaller than a row or the buffer is shorter
    /// than `stride * height`.
    pub fn from_bgr(data: Vec<u8>, width: u32, height: u32, stride: usize) -> Self {
        assert!(
            stride >= width as usize * BYTES_PER_PIXEL,
            "stride {stride} shorter than row of width {width}"
        );
        assert!(
            data.len() >= stride * height as usize,
            "buffer of {} bytes too short for {height} rows of stride {stride}",
            data.len()
        );
        Self {
            data,
            width,
            height,
            stride,
        }
    }

    /// A buffer uniformly filled with one color, with 4-byte-aligned rows.
    pub fn solid(width: u32, height: u32, (r, g, b): (u8, u8, u8)) -> Self {
        let stride = aligned_stride(width);
        let mut data = vec![0u8; stride * height as usize];
        for y in 0..height as usize {
            for x in 0..width as usize {
                let at = y * stride + x * BYTES_PER_PIXEL;
                data[at] = b;
                data[at + 1] = g;
                data[at + 2] = r;
            }
        }
        Self::from_bgr(data, width, height, stride)
    }

    /// Buffer width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The `[blue, green, red]` bytes of one pixel.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the buffer.
    pub fn bgr(&self, x: u32, y: u32) -> [u8; 3] {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} buffer",
            self.width,
            self.height
        );
        let at = y as usize * self.stride + x as usize * BYTES_PER_PIXEL;
        [self.data[at], self.data[at + 1], self.data[at + 2]]
    }
}

/// Row stride for a BGR row padded to a 4-byte boundary.
fn aligned_stride(width: u32) -> usize {
    (width as usize * BYTES_PER_PIXEL).next_multiple_of(4)
}

/// Produces one capture-window frame per call.
///
/// The returned buffer is owned by the caller and lives for the duration of
/// one tick only; a failed capture is session-fatal and bubbles up to the
/// control loop.
pub trait PixelSource {
    /// Capture the fixed-size window whose top-left corner is `origin`.
    fn capture(&mut self, origin: (u32, u32)) -> Result<PixelBuffer, Error>;
}

/// Real screen source backed by the primary monitor.
///
/// The monitor handle is cached across ticks and dropped on any capture
/// failure so the next session re-enumerates displays.
#[derive(Default)]
pub struct ScreenSource {
    monitor: Option<xcap::Monitor>,
}

impl ScreenSource {
    /// Create a screen source; monitors are enumerated lazily on the first
    /// capture so construction never fails.
    pub fn new() -> Self {
        Self::default()
    }

    fn primary_monitor() -> Result<xcap::Monitor, Error> {
        let monitors =
            xcap::Monitor::all().map_err(|err| Error::Capture(err.to_string()))?;
        monitors
            .into_iter()
            .find(|monitor| monitor.is_primary())
            .ok_or_else(|| Error::Capture("no primary monitor found".into()))
    }
}

impl PixelSource for ScreenSource {
    fn capture(&mut self, origin: (u32, u32)) -> Result<PixelBuffer, Error> {
        if self.monitor.is_none() {
            debug!("enumerating monitors");
            self.monitor = Some(Self::primary_monitor()?);
        }
        let image = match self.monitor.as_ref() {
            Some(monitor) => monitor.capture_image(),
            None => return Err(Error::Capture("monitor cache empty".into())),
        };
        match image {
            Ok(image) => Ok(window_from_rgba(
                image.as_raw(),
                image.width(),
                image.height(),
                origin,
            )),
            Err(err) => {
                self.monitor = None;
                Err(Error::Capture(err.to_string()))
            }
        }
    }
}

/// Crop the capture window out of a full-frame RGBA image, converting to the
/// BGR layout the reducer samples. Pixels outside the frame stay black; a
/// stale resolution setting must never crash the tick.
fn window_from_rgba(rgba: &[u8], frame_width: u32, frame_height: u32, origin: (u32, u32)) -> PixelBuffer {
    let stride = aligned_stride(CAPTURE_WIDTH);
    let mut data = vec![0u8; stride * CAPTURE_HEIGHT as usize];
    for y in 0..CAPTURE_HEIGHT {
        let src_y = origin.1 + y;
        if src_y >= frame_height {
            break;
        }
        for x in 0..CAPTURE_WIDTH {
            let src_x = origin.0 + x;
            if src_x >= frame_width {
                break;
            }
            let src = (src_y as usize * frame_width as usize + src_x as usize) * 4;
            let dst = y as usize * stride + x as usize * BYTES_PER_PIXEL;
            data[dst] = rgba[src + 2];
            data[dst + 1] = rgba[src + 1];
            data[dst + 2] = rgba[src];
        }
    }
    PixelBuffer::from_bgr(data, CAPTURE_WIDTH, CAPTURE_HEIGHT, stride)
}
