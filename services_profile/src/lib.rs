//! # Profile Service
//!
//! Populates the profile card from the session and derives its
//! background gradient from the avatar's dominant color.
//!
//! ## Philosophy
//!
//! - **Session in, view out**: population is a pure function of the
//!   session context and an optional avatar pixel buffer
//! - **Cosmetic failures are silent**: if no dominant color can be
//!   extracted, the card keeps its default background; nothing errors

use serde::{Deserialize, Serialize};
use session::SessionContext;
use std::collections::BTreeMap;
use std::fmt;

/// Base URL for a user's page on the external account service
const ACCOUNT_URL_BASE: &str = "https://open.spotify.com/user/";

/// Fraction of the card height covered by the tinted color
const GRADIENT_STOP_PERCENT: u8 = 60;

/// An opaque RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Creates a color from its channels
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Black
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    /// Tints the color toward white: `0.7·c + 0.3·255` per channel,
    /// floored
    pub fn tint_toward_white(self) -> Rgb {
        fn tint(channel: u8) -> u8 {
            (f32::from(channel) * 0.7 + 255.0 * 0.3) as u8
        }
        Rgb::new(tint(self.r), tint(self.g), tint(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// One pixel of an avatar image buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Creates a pixel from its channels
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a fully opaque pixel
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    fn rgb(self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }
}

/// Extracts the dominant color of a pixel buffer
///
/// Opaque pixels vote into 4-bit-per-channel buckets; the winning
/// bucket's members are averaged. Returns None if the buffer holds no
/// opaque pixels (the caller keeps its default styling).
pub fn dominant_color(pixels: &[Rgba]) -> Option<Rgb> {
    // (count, channel sums) per quantized bucket; BTreeMap keeps the
    // tie-break deterministic.
    let mut buckets: BTreeMap<(u8, u8, u8), (u32, u64, u64, u64)> = BTreeMap::new();

    for pixel in pixels.iter().filter(|p| p.a > 0) {
        let key = (pixel.r >> 4, pixel.g >> 4, pixel.b >> 4);
        let bucket = buckets.entry(key).or_insert((0, 0, 0, 0));
        bucket.0 += 1;
        bucket.1 += u64::from(pixel.r);
        bucket.2 += u64::from(pixel.g);
        bucket.3 += u64::from(pixel.b);
    }

    let (count, r_sum, g_sum, b_sum) = buckets
        .into_values()
        .max_by_key(|&(count, ..)| count)?;

    let count = u64::from(count);
    Some(Rgb::new(
        (r_sum / count) as u8,
        (g_sum / count) as u8,
        (b_sum / count) as u8,
    ))
}

/// A vertical two-stop background gradient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gradient {
    /// Top color
    pub top: Rgb,
    /// Bottom color
    pub bottom: Rgb,
    /// Percentage of the height where the top color ends
    pub stop_percent: u8,
}

impl Gradient {
    /// The card gradient: the given color fading into black, with the
    /// color stop at 60%
    pub fn card(top: Rgb) -> Self {
        Self {
            top,
            bottom: Rgb::BLACK,
            stop_percent: GRADIENT_STOP_PERCENT,
        }
    }
}

impl fmt::Display for Gradient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "linear-gradient(to bottom, {} {}%, {})",
            self.top, self.stop_percent, self.bottom
        )
    }
}

/// The populated profile card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileView {
    /// Display name prefixed with `@`
    pub display_handle: String,
    /// Link to the user's page on the external service
    pub external_url: String,
    /// Derived card background; None keeps the default styling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_background: Option<Gradient>,
}

impl ProfileView {
    /// Populates the card from the session and an optional avatar
    /// pixel buffer
    pub fn populate(session: &SessionContext, avatar_pixels: Option<&[Rgba]>) -> Self {
        let card_background = avatar_pixels
            .and_then(dominant_color)
            .map(|color| Gradient::card(color.tint_toward_white()));

        Self {
            display_handle: format!("@{}", session.display_name),
            external_url: format!("{}{}", ACCOUNT_URL_BASE, session.handle),
            card_background,
        }
    }

    /// Renders the card to plain text lines for a text surface
    pub fn to_lines(&self) -> Vec<String> {
        vec![self.display_handle.clone(), self.external_url.clone()]
    }
}
