use image::Rgb;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ImagingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Red => write!(f, "red"),
            Channel::Green => write!(f, "green"),
            Channel::Blue => write!(f, "blue"),
        }
    }
}

impl FromStr for Channel {
    type Err = ImagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "red" | "r" => Ok(Channel::Red),
            "green" | "g" => Ok(Channel::Green),
            "blue" | "b" => Ok(Channel::Blue),
            other => Err(ImagingError::InvalidArgument(format!("Unknown channel: '{other}'"))),
        }
    }
}

impl TryFrom<u8> for Channel {
    type Error = ImagingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Channel::Red),
            1 => Ok(Channel::Green),
            2 => Ok(Channel::Blue),
            other => Err(ImagingError::InvalidArgument(format!("Channel index {other} out of range"))),
        }
    }
}

type PixelFn = dyn Fn(Rgb<u8>) -> Rgb<u8> + Send + Sync;

/// A pointwise color mapping, always expressed in logical (R, G, B) order.
#[derive(Clone)]
pub struct PixelTransform {
    name: String,
    f: Arc<PixelFn>,
}

impl fmt::Debug for PixelTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelTransform").field("name", &self.name).finish()
    }
}

impl PixelTransform {
    pub fn custom(name: impl Into<String>, f: impl Fn(Rgb<u8>) -> Rgb<u8> + Send + Sync + 'static) -> Self {
        Self { name: name.into(), f: Arc::new(f) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn apply(&self, px: Rgb<u8>) -> Rgb<u8> {
        (self.f)(px)
    }

    pub fn invert() -> Self {
        Self::custom("invert", |Rgb([r, g, b])| Rgb([255 - r, 255 - g, 255 - b]))
    }

    /// Luma with the BT.601 weights, truncated.
    pub fn greyscale() -> Self {
        Self::custom("greyscale", |Rgb([r, g, b])| {
            let grey = (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64) as u8;
            Rgb([grey, grey, grey])
        })
    }

    /// One lookup table, shared by all three channels.
    pub fn gamma(gamma: f64) -> Result<Self, ImagingError> {
        let lut = gamma_table(gamma)?;
        Ok(Self::custom(format!("gamma({gamma})"), move |Rgb([r, g, b])| {
            Rgb([lut[r as usize], lut[g as usize], lut[b as usize]])
        }))
    }

    /// Keep `channel`. The other two become 0, or copies of `channel` when `clone` is set.
    pub fn single_channel(channel: Channel, clone: bool) -> Self {
        let i = channel.index();
        let name = format!("channel({channel}{})", if clone { ", cloned" } else { "" });
        Self::custom(name, move |px| {
            let v = px.0[i];
            let mut out = if clone { [v; 3] } else { [0; 3] };
            out[i] = v;
            Rgb(out)
        })
    }
}

/// `lut[i] = min(255, floor(255 * (i/255)^(1/gamma) + 0.5))`
pub fn gamma_table(gamma: f64) -> Result<[u8; 256], ImagingError> {
    if !gamma.is_finite() || gamma <= 0.0 {
        return Err(ImagingError::InvalidArgument(format!(
            "gamma must be a positive finite number, got {gamma}"
        )));
    }
    let exponent = 1.0 / gamma;
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        let v = (255.0 * (i as f64 / 255.0).powf(exponent) + 0.5).floor();
        *slot = v.min(255.0) as u8;
    }
    Ok(lut)
}

/// Selection of a built-in transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformKind {
    Invert,
    Greyscale,
    Gamma(f64),
    SingleChannel { channel: Channel, clone: bool },
}

impl TransformKind {
    pub fn build(&self) -> Result<PixelTransform, ImagingError> {
        match *self {
            TransformKind::Invert => Ok(PixelTransform::invert()),
            TransformKind::Greyscale => Ok(PixelTransform::greyscale()),
            TransformKind::Gamma(g) => PixelTransform::gamma(g),
            TransformKind::SingleChannel { channel, clone } => {
                Ok(PixelTransform::single_channel(channel, clone))
            }
        }
    }
}
