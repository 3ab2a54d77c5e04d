use serde::{Deserialize, Serialize};

/// Base-map style presets offered by the map-type picker.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MapStyle {
    #[default]
    Topographic,
    Satellite,
    #[serde(rename = "3d-buildings")]
    Buildings3d,
    Terrain,
}

const STYLE_HOST: &str = "https://api.maptiler.com/maps";

impl MapStyle {
    pub const ALL: [MapStyle; 4] = [
        MapStyle::Topographic,
        MapStyle::Satellite,
        MapStyle::Buildings3d,
        MapStyle::Terrain,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MapStyle::Topographic => "topographic",
            MapStyle::Satellite => "satellite",
            MapStyle::Buildings3d => "3d-buildings",
            MapStyle::Terrain => "terrain",
        }
    }

    /// Unknown names fall back to the default style rather than failing.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|s| s.name() == name || (name == "3dbuildings" && *s == MapStyle::Buildings3d))
            .unwrap_or_default()
    }

    fn map_id(self) -> &'static str {
        match self {
            MapStyle::Topographic => "basic-v2",
            MapStyle::Satellite => "satellite",
            MapStyle::Buildings3d => "e3502d9d-91d8-41e3-ab8d-de7965bc0fde",
            MapStyle::Terrain => "winter-v2",
        }
    }

    /// Style document URL for the host map.
    pub fn style_url(self, api_key: &str) -> String {
        format!("{STYLE_HOST}/{}/style.json?key={api_key}", self.map_id())
    }
}

#[cfg(test)]
mod tests {
    use super::MapStyle;

    #[test]
    fn maps_presets_to_style_documents() {
        assert_eq!(
            MapStyle::Satellite.style_url("k"),
            "https://api.maptiler.com/maps/satellite/style.json?key=k"
        );
        assert_eq!(
            MapStyle::Terrain.style_url("k"),
            "https://api.maptiler.com/maps/winter-v2/style.json?key=k"
        );
    }

    #[test]
    fn names_round_trip_and_unknown_falls_back() {
        for style in MapStyle::ALL {
            assert_eq!(MapStyle::from_name(style.name()), style);
        }
        assert_eq!(MapStyle::from_name("3Dbuildings"), MapStyle::Buildings3d);
        assert_eq!(MapStyle::from_name("watercolor"), MapStyle::Topographic);
    }

    #[test]
    fn serializes_with_kebab_names() {
        let json = serde_json::to_string(&MapStyle::Buildings3d).expect("serialize");
        assert_eq!(json, "\"3d-buildings\"");
    }
}
