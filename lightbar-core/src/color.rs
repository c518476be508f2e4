//! The per-tick color pipeline: reduce, smooth, scale.

use crate::capture::PixelBuffer;

/// Distance between sampled pixels on both axes.
pub const SAMPLE_STRIDE: u32 = 10;
/// First-order EMA factor applied to every channel each tick.
pub const SMOOTH_FACTOR: f32 = 0.2;
/// Maximum channel value the device accepts, below full byte range by
/// device design.
pub const HARDWARE_CEILING: u8 = 200;

/// Average color of one captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawColor {
    /// Red channel average.
    pub r: u8,
    /// Green channel average.
    pub g: u8,
    /// Blue channel average.
    pub b: u8,
}

/// The final byte-range color written to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalColor {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl FinalColor {
    /// All channels off.
    pub const BLACK: FinalColor = FinalColor { r: 0, g: 0, b: 0 };
}

/// Reduce a frame to its average color by sampling a fixed grid.
///
/// Samples every [`SAMPLE_STRIDE`]th pixel on both axes, reading channels in
/// the buffer's BGR order, and integer-divides the wide sums by the sample
/// count. An empty grid yields black instead of failing; that path cannot be
/// reached with the fixed capture dimensions.
pub fn average(frame: &PixelBuffer) -> RawColor {
    let mut sum_r: u64 = 0;
    let mut sum_g: u64 = 0;
    let mut sum_b: u64 = 0;
    let mut count: u64 = 0;

    let mut y = 0;
    while y < frame.height() {
        let mut x = 0;
        while x < frame.width() {
            let [b, g, r] = frame.bgr(x, y);
            sum_b += u64::from(b);
            sum_g += u64::from(g);
            sum_r += u64::from(r);
            count += 1;
            x += SAMPLE_STRIDE;
        }
        y += SAMPLE_STRIDE;
    }

    if count == 0 {
        return RawColor { r: 0, g: 0, b: 0 };
    }
    RawColor {
        r: (sum_r / count) as u8,
        g: (sum_g / count) as u8,
        b: (sum_b / count) as u8,
    }
}

/// Per-channel exponential moving average across the ticks of one session.
///
/// State is kept in floating point so truncation bias cannot accumulate;
/// only the final scaling step truncates to bytes. The state must be
/// [`reset`](Self::reset) whenever a new device session starts.
#[derive(Debug, Default)]
pub struct Smoother {
    r: f32,
    g: f32,
    b: f32,
}

impl Smoother {
    /// A smoother starting from black.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero all channels, forgetting the previous session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fold one raw sample into the state and return the smoothed channels.
    pub fn update(&mut self, raw: RawColor) -> (f32, f32, f32) {
        self.r += (f32::from(raw.r) - self.r) * SMOOTH_FACTOR;
        self.g += (f32::from(raw.g) - self.g) * SMOOTH_FACTOR;
        self.b += (f32::from(raw.b) - self.b) * SMOOTH_FACTOR;
        (self.r, self.g, self.b)
    }
}

/// The brightness ceiling for a user setting: the hardware ceiling of 200
/// scaled by `percent / 100`, floored.
pub fn effective_limit(brightness_percent: u8) -> u8 {
    let percent = u32::from(brightness_percent.min(100));
    (u32::from(HARDWARE_CEILING) * percent / 100) as u8
}

/// Truncate the smoothed channels to bytes and cap them at the effective
/// brightness limit. A setting of 0 forces black regardless of content.
pub fn scale((r, g, b): (f32, f32, f32), brightness_percent: u8) -> FinalColor {
    let limit = effective_limit(brightness_percent);
    let clamp = |channel: f32| -> u8 {
        let truncated = channel.floor().clamp(0.0, 255.0) as u8;
        truncated.min(limit)
    };
    FinalColor {
        r: clamp(r),
        g: clamp(g),
        b: clamp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CAPTURE_HEIGHT, CAPTURE_WIDTH};

    #[test]
    fn uniform_frame_averages_exactly() {
        let frame = PixelBuffer::solid(CAPTURE_WIDTH, CAPTURE_HEIGHT, (17, 130, 255));
        let raw = average(&frame);
        assert_eq!(raw, RawColor { r: 17, g: 130, b: 255 });
    }

    #[test]
    fn sample_grid_is_20_by_15() {
        // Paint only the sampled pixels white; the average must be pure
        // white, proving exactly the grid positions are read.
        let stride = CAPTURE_WIDTH as usize * 3;
        let mut data = vec![0u8; stride * CAPTURE_HEIGHT as usize];
        for y in (0..CAPTURE_HEIGHT).step_by(SAMPLE_STRIDE as usize) {
            for x in (0..CAPTURE_WIDTH).step_by(SAMPLE_STRIDE as usize) {
                let at = y as usize * stride + x as usize * 3;
                data[at] = 255;
                data[at + 1] = 255;
                data[at + 2] = 255;
            }
        }
        let frame = PixelBuffer::from_bgr(data, CAPTURE_WIDTH, CAPTURE_HEIGHT, stride);
        assert_eq!(average(&frame), RawColor { r: 255, g: 255, b: 255 });
    }

    #[test]
    fn smoother_converges_geometrically() {
        let mut smoother = Smoother::new();
        let raw = RawColor { r: 100, g: 100, b: 100 };
        let mut last = (0.0, 0.0, 0.0);
        for _ in 0..8 {
            last = smoother.update(raw);
        }
        // After n ticks from zero: v * (1 - 0.8^n).
        let expected = 100.0 * (1.0 - 0.8f32.powi(8));
        assert!((last.0 - expected).abs() < 1e-3);
        assert!((last.1 - expected).abs() < 1e-3);
        assert!((last.2 - expected).abs() < 1e-3);
    }

    #[test]
    fn smoother_reset_returns_to_black() {
        let mut smoother = Smoother::new();
        smoother.update(RawColor { r: 200, g: 200, b: 200 });
        smoother.reset();
        let (r, g, b) = smoother.update(RawColor { r: 0, g: 0, b: 0 });
        assert_eq!((r, g, b), (0.0, 0.0, 0.0));
    }

    #[test]
    fn effective_limit_floors_across_the_range() {
        for percent in 0..=100u8 {
            let expected = (200 * u32::from(percent) / 100) as u8;
            assert_eq!(effective_limit(percent), expected);
        }
        assert_eq!(effective_limit(0), 0);
        assert_eq!(effective_limit(50), 100);
        assert_eq!(effective_limit(100), HARDWARE_CEILING);
    }

    #[test]
    fn scaled_channels_never_exceed_limit_or_byte_range() {
        for percent in [0u8, 13, 50, 99, 100, 255] {
            let color = scale((999.9, 200.0, 0.4), percent);
            let limit = effective_limit(percent);
            assert!(color.r <= limit);
            assert!(color.g <= limit);
            assert!(color.b <= limit);
        }
    }

    #[test]
    fn zero_brightness_forces_black() {
        assert_eq!(scale((180.0, 90.0, 45.0), 0), FinalColor::BLACK);
    }

    #[test]
    fn scaling_truncates_toward_zero() {
        let color = scale((20.9, 30.1, 40.999), 100);
        assert_eq!(color, FinalColor { r: 20, g: 30, b: 40 });
    }
}
