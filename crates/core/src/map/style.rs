use busline_transit::StopType;
use palette::Srgb;

pub type Color = Srgb<u8>;

pub const VEHICLE_BLUE: Color = Srgb::new(0x66, 0x7e, 0xea);
pub const CORAL: Color = Srgb::new(0xff, 0x6b, 0x6b);
pub const WHITE: Color = Srgb::new(0xff, 0xff, 0xff);
pub const ORIGIN_BLUE: Color = Srgb::new(0x21, 0x96, 0xf3);
pub const DESTINATION_RED: Color = Srgb::new(0xf4, 0x43, 0x36);
pub const STOP_GREEN: Color = Srgb::new(0x4c, 0xaf, 0x50);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Color,
    /// Screen-space pixels
    pub width: f32,
    pub opacity: f32,
}

/// Style of a fixed-pixel-size circle marker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerStyle {
    pub radius: f32,
    pub fill: Color,
    pub fill_opacity: f32,
    pub stroke: Stroke,
}

impl MarkerStyle {
    pub fn solid_color(radius: f32, fill: Color) -> Self {
        Self {
            radius,
            fill,
            fill_opacity: 0.8,
            stroke: Stroke {
                color: WHITE,
                width: 2.0,
                opacity: 1.0,
            },
        }
    }

    pub fn with_border(mut self, width: f32, color: Color) -> Self {
        self.stroke.width = width;
        self.stroke.color = color;
        self
    }

    pub fn vehicle() -> Self {
        Self::solid_color(8.0, VEHICLE_BLUE)
    }

    pub fn highlighted_vehicle() -> Self {
        Self::solid_color(8.0, CORAL).with_border(3.0, WHITE)
    }

    pub fn user_location() -> Self {
        Self::solid_color(10.0, CORAL).with_border(3.0, WHITE)
    }

    pub fn stop(stop_type: StopType) -> Self {
        match stop_type {
            StopType::Origin => Self::solid_color(8.0, ORIGIN_BLUE),
            StopType::Destination => Self::solid_color(8.0, DESTINATION_RED),
            StopType::Regular => Self::solid_color(6.0, STOP_GREEN),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineStyle {
    pub stroke: Stroke,
    /// Dash and gap lengths in pixels; `None` draws a solid line
    pub dash: Option<[f32; 2]>,
}

impl LineStyle {
    pub fn route() -> Self {
        Self {
            stroke: Stroke {
                color: CORAL,
                width: 4.0,
                opacity: 0.8,
            },
            dash: Some([10.0, 5.0]),
        }
    }
}

/// Style of a circle whose radius is in meters on the ground.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircleStyle {
    pub fill: Color,
    pub fill_opacity: f32,
    pub stroke: Stroke,
}

impl CircleStyle {
    pub fn accuracy() -> Self {
        Self {
            fill: CORAL,
            fill_opacity: 0.1,
            stroke: Stroke {
                color: CORAL,
                width: 1.0,
                opacity: 0.3,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_styles_are_distinct() {
        let origin = MarkerStyle::stop(StopType::Origin);
        let destination = MarkerStyle::stop(StopType::Destination);
        let regular = MarkerStyle::stop(StopType::Regular);

        assert_ne!(origin.fill, destination.fill);
        assert_ne!(origin.fill, regular.fill);
        assert_ne!(destination.fill, regular.fill);
        assert!(regular.radius < origin.radius);
        assert_eq!(origin.radius, destination.radius);
    }

    #[test]
    fn test_highlight_differs_from_default() {
        let default = MarkerStyle::vehicle();
        let highlighted = MarkerStyle::highlighted_vehicle();

        assert_ne!(default, highlighted);
        assert_eq!(highlighted.stroke.width, 3.0);
        assert_eq!(default.stroke.width, 2.0);
    }
}
