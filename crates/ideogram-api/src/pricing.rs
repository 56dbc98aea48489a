/// Per-image price used when the render speed label is not recognised.
pub const FALLBACK_PRICE_USD: f64 = 0.07;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderSpeed {
    Turbo,
    Default,
    Quality,
}

impl RenderSpeed {
    pub const ALL: [RenderSpeed; 3] = [Self::Turbo, Self::Default, Self::Quality];

    /// Exact, case-sensitive match on the labels the API accepts.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Turbo" => Some(Self::Turbo),
            "Default" => Some(Self::Default),
            "Quality" => Some(Self::Quality),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Turbo => "Turbo",
            Self::Default => "Default",
            Self::Quality => "Quality",
        }
    }

    pub fn base_price_usd(self) -> f64 {
        match self {
            Self::Turbo => 0.03,
            Self::Default => 0.06,
            Self::Quality => 0.09,
        }
    }

    /// Character-reference generations are billed at a higher rate.
    pub fn character_price_usd(self) -> f64 {
        match self {
            Self::Turbo => 0.04,
            Self::Default => 0.07,
            Self::Quality => 0.10,
        }
    }
}

pub fn calculate_cost(image_count: u32, render_speed: &str, use_character_ref: bool) -> f64 {
    let price_per_image = match RenderSpeed::from_label(render_speed) {
        Some(speed) if use_character_ref => speed.character_price_usd(),
        Some(speed) => speed.base_price_usd(),
        None => FALLBACK_PRICE_USD,
    };
    price_per_image * f64::from(image_count)
}

/// Display block shown once a generation finishes. Always priced with
/// character-reference rates.
pub fn format_generation_info(
    generation_id: &str,
    image_count: u32,
    render_speed: &str,
    seed: &str,
    dimensions: &str,
) -> String {
    let cost = calculate_cost(image_count, render_speed, true);
    [
        "=== Generation Complete ===".to_string(),
        format!("ID: {generation_id}"),
        format!("Images: {image_count}"),
        format!("Speed: {render_speed}"),
        format!("Seed: {seed}"),
        format!("Dimensions: {dimensions}"),
        format!("Estimated Cost: ${cost:.3}"),
        "=========================".to_string(),
    ]
    .join("\n")
}
