use std::fmt;
use std::str::FromStr;

use crate::error::{CamError, Result};

/// Supported capture resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSize {
    /// 160×120
    Qqvga,
    /// 320×240
    Qvga,
    /// 640×480
    Vga,
    /// 800×600
    Svga,
}

impl FrameSize {
    pub const ALL: [FrameSize; 4] = [Self::Qqvga, Self::Qvga, Self::Vga, Self::Svga];

    /// Width and height in pixels.
    pub fn dimensions(self) -> (u16, u16) {
        match self {
            Self::Qqvga => (160, 120),
            Self::Qvga => (320, 240),
            Self::Vga => (640, 480),
            Self::Svga => (800, 600),
        }
    }

    /// Name as used on the wire (`/control?var=resolution&val=...`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Qqvga => "QQVGA",
            Self::Qvga => "QVGA",
            Self::Vga => "VGA",
            Self::Svga => "SVGA",
        }
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrameSize {
    type Err = CamError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|size| size.as_str() == s)
            .ok_or_else(|| CamError::InvalidResolution(s.to_string()))
    }
}

/// A single sensor mutation, as requested through `/control`.
///
/// The wire names are mapped once at the boundary by [`parse`](Self::parse);
/// everything past that point matches on the enum. Integer payloads are not
/// range-checked here, that is up to the [`Sensor`](super::Sensor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlParam {
    Brightness(i32),
    Contrast(i32),
    Saturation(i32),
    Sharpness(i32),
    /// Manual exposure value (used when `aec` is off).
    AecValue(i32),
    /// Manual gain (used when `agc` is off).
    AgcGain(i32),
    /// Auto white balance gain enable.
    AwbGain(i32),
    /// Auto exposure control enable.
    Aec(i32),
    /// Auto gain control enable.
    Agc(i32),
    /// Auto white balance enable.
    Awb(i32),
    VFlip(i32),
    HMirror(i32),
    ColorBar(i32),
    SpecialEffect(i32),
    Resolution(FrameSize),
}

impl ControlParam {
    /// Map a `(var, val)` pair from the query string.
    pub fn parse(name: &str, value: &str) -> Result<Self> {
        let int = || {
            value.trim().parse::<i32>().map_err(|_| CamError::InvalidValue {
                name: name.to_string(),
                value: value.to_string(),
            })
        };

        let param = match name {
            "brightness" => Self::Brightness(int()?),
            "contrast" => Self::Contrast(int()?),
            "saturation" => Self::Saturation(int()?),
            "sharpness" => Self::Sharpness(int()?),
            "aec_value" => Self::AecValue(int()?),
            "agc_gain" => Self::AgcGain(int()?),
            "awb_gain" => Self::AwbGain(int()?),
            "aec" => Self::Aec(int()?),
            "agc" => Self::Agc(int()?),
            "awb" => Self::Awb(int()?),
            "vflip" => Self::VFlip(int()?),
            "hmirror" => Self::HMirror(int()?),
            "colorbar" => Self::ColorBar(int()?),
            "special_effect" => Self::SpecialEffect(int()?),
            "resolution" => Self::Resolution(value.trim().parse()?),
            _ => return Err(CamError::UnknownParameter(name.to_string())),
        };
        Ok(param)
    }

    /// Wire name of the parameter.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Brightness(_) => "brightness",
            Self::Contrast(_) => "contrast",
            Self::Saturation(_) => "saturation",
            Self::Sharpness(_) => "sharpness",
            Self::AecValue(_) => "aec_value",
            Self::AgcGain(_) => "agc_gain",
            Self::AwbGain(_) => "awb_gain",
            Self::Aec(_) => "aec",
            Self::Agc(_) => "agc",
            Self::Awb(_) => "awb",
            Self::VFlip(_) => "vflip",
            Self::HMirror(_) => "hmirror",
            Self::ColorBar(_) => "colorbar",
            Self::SpecialEffect(_) => "special_effect",
            Self::Resolution(_) => "resolution",
        }
    }
}
