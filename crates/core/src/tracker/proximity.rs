use std::collections::HashSet;

use busline_transit::VehicleIdentifier;

use super::markers::MarkerReconciler;
use crate::map::{MapSurface, MarkerStyle};

pub struct ProximityHighlighter {
    default_style: MarkerStyle,
    highlight_style: MarkerStyle,
}

impl ProximityHighlighter {
    pub fn new() -> Self {
        Self {
            default_style: MarkerStyle::vehicle(),
            highlight_style: MarkerStyle::highlighted_vehicle(),
        }
    }

    /// Reset every live marker, then highlight those in `matching`. Ids without
    /// a live marker are ignored. Returns how many markers were highlighted.
    pub fn highlight(
        &self,
        markers: &MarkerReconciler,
        matching: &HashSet<VehicleIdentifier>,
        map: &mut dyn MapSurface,
    ) -> usize {
        for (_, marker) in markers.iter() {
            map.set_marker_style(marker.layer, &self.default_style);
        }

        let mut highlighted = 0;
        for id in matching {
            if let Some(marker) = markers.get(id) {
                map.set_marker_style(marker.layer, &self.highlight_style);
                highlighted += 1;
            }
        }
        highlighted
    }
}

impl Default for ProximityHighlighter {
    fn default() -> Self {
        Self::new()
    }
}
