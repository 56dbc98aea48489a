use std::fmt;

pub const MIN_DIMENSION: u32 = 256;
pub const MAX_DIMENSION: u32 = 2048;
pub const MAX_PIXELS: u64 = 4_194_304;

/// Ratios the generation endpoint accepts. Order is significant: on a tie the
/// earlier entry wins.
pub const ASPECT_RATIOS: [(&str, f64); 15] = [
    ("1:1", 1.0),
    ("4:3", 4.0 / 3.0),
    ("3:4", 3.0 / 4.0),
    ("16:9", 16.0 / 9.0),
    ("9:16", 9.0 / 16.0),
    ("3:2", 3.0 / 2.0),
    ("2:3", 2.0 / 3.0),
    ("5:4", 5.0 / 4.0),
    ("4:5", 4.0 / 5.0),
    ("16:10", 16.0 / 10.0),
    ("10:16", 10.0 / 16.0),
    ("3:1", 3.0),
    ("1:3", 1.0 / 3.0),
    ("2:1", 2.0),
    ("1:2", 0.5),
];

/// Closest named ratio to `width / height`. A zero height maps to `1:1`.
pub fn calculate_aspect_ratio(width: u32, height: u32) -> &'static str {
    if height == 0 {
        return "1:1";
    }
    let ratio = f64::from(width) / f64::from(height);
    let mut best = ASPECT_RATIOS[0].0;
    let mut best_delta = f64::MAX;
    for (name, value) in ASPECT_RATIOS {
        let delta = (ratio - value).abs();
        if delta < best_delta {
            best_delta = delta;
            best = name;
        }
    }
    best
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionCheck {
    Valid,
    TooSmall,
    TooLarge,
    TooManyPixels,
}

impl DimensionCheck {
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }

    pub fn message(self) -> String {
        self.to_string()
    }

    pub fn into_parts(self) -> (bool, String) {
        (self.is_valid(), self.message())
    }
}

impl fmt::Display for DimensionCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "Valid dimensions"),
            Self::TooSmall => write!(
                f,
                "Image dimensions too small. Minimum dimension is {MIN_DIMENSION}px"
            ),
            Self::TooLarge => write!(
                f,
                "Image dimensions too large. Maximum dimension is {MAX_DIMENSION}px"
            ),
            Self::TooManyPixels => {
                write!(f, "Image resolution too high. Maximum is {MAX_PIXELS} pixels")
            }
        }
    }
}

pub fn validate_image_dimensions(width: u32, height: u32) -> DimensionCheck {
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return DimensionCheck::TooSmall;
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return DimensionCheck::TooLarge;
    }
    if u64::from(width) * u64::from(height) > MAX_PIXELS {
        return DimensionCheck::TooManyPixels;
    }
    DimensionCheck::Valid
}
