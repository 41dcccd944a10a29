//! RBI reference data for the supported denominations
//!
//! The catalog is presentation data: descriptions, the official feature
//! lists and guideline text shown next to detector results. The detection
//! parameters recorded here describe the physical note and are not fed to
//! the detectors, whose thresholds live in [`crate::config`].

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::Denomination;

/// Physical characteristics of one denomination
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionParams {
    /// Security thread width range in millimetres
    pub thread_width_range_mm: (f64, f64),
    /// Color shift of the thread, e.g. `green_to_blue`
    pub thread_color: String,
    /// Micro text height in millimetres
    pub micro_text_size_mm: f64,
}

/// Catalog entry for one denomination
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceEntry {
    pub denomination: Denomination,
    pub description: String,
    /// Official security features, in RBI listing order
    pub security_features: Vec<String>,
    pub detection_params: DetectionParams,
}

/// Catalog entry for one scored security feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityFeatureEntry {
    pub description: String,
    /// Free-form descriptive parameters
    pub detection_params: Value,
    pub rbi_guidelines: String,
}

/// Immutable reference catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceCatalog {
    entries: BTreeMap<Denomination, ReferenceEntry>,
    security_features: BTreeMap<String, SecurityFeatureEntry>,
}

impl Default for ReferenceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceCatalog {
    /// Build the catalog for the current RBI note series
    pub fn new() -> Self {
        let entries = [
            rs2000_entry(),
            rs500_entry(),
            rs200_entry(),
            rs100_entry(),
        ]
        .into_iter()
        .map(|entry| (entry.denomination, entry))
        .collect();

        Self {
            entries,
            security_features: security_feature_entries(),
        }
    }

    pub fn entry(&self, denomination: Denomination) -> Option<&ReferenceEntry> {
        self.entries.get(&denomination)
    }

    /// Entries ordered from highest to lowest denomination
    pub fn entries(&self) -> impl Iterator<Item = &ReferenceEntry> {
        self.entries.values().rev()
    }

    pub fn get_description(&self, denomination: Denomination) -> &str {
        self.entry(denomination)
            .map(|e| e.description.as_str())
            .unwrap_or_default()
    }

    pub fn get_feature_list(&self, denomination: Denomination) -> &[String] {
        self.entry(denomination)
            .map(|e| e.security_features.as_slice())
            .unwrap_or_default()
    }

    pub fn detection_params(&self, denomination: Denomination) -> Option<&DetectionParams> {
        self.entry(denomination).map(|e| &e.detection_params)
    }

    /// Look up a security feature by key or display name
    ///
    /// "Security Thread" and "security_thread" resolve to the same entry.
    pub fn security_feature(&self, name: &str) -> Option<&SecurityFeatureEntry> {
        self.security_features.get(&feature_key(name))
    }

    pub fn get_guideline(&self, feature_name: &str) -> Option<&str> {
        self.security_feature(feature_name)
            .map(|f| f.rbi_guidelines.as_str())
    }
}

fn feature_key(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn description(reverse_motif: &str, value: u32) -> String {
    format!(
        "The ₹{value} note features {reverse_motif} on the reverse side.\n\
         Key RBI security features include:\n\
         - Color-shifting windowed security thread with RBI and ₹{value}\n\
         - Portrait watermark of Mahatma Gandhi\n\
         - Micro letters 'RBI' and '{value}'\n\
         - See-through register in denomination numeral"
    )
}

fn params(width: (f64, f64), color: &str, micro_text: f64) -> DetectionParams {
    DetectionParams {
        thread_width_range_mm: width,
        thread_color: color.to_string(),
        micro_text_size_mm: micro_text,
    }
}

fn rs2000_entry() -> ReferenceEntry {
    ReferenceEntry {
        denomination: Denomination::Rs2000,
        description: description("the Mangalyaan", 2000),
        security_features: lines(&[
            "Color-shifting windowed security thread with RBI inscription",
            "Portrait and electrotype watermarks",
            "Micro lettering \"RBI\" and \"2000\"",
            "See-through register with denominational numeral",
            "Color-shifting windowed security thread",
            "Latent image of denomination",
            "Optically variable ink on denomination numeral",
        ]),
        detection_params: params((0.8, 1.2), "green_to_blue", 0.2),
    }
}

fn rs500_entry() -> ReferenceEntry {
    ReferenceEntry {
        denomination: Denomination::Rs500,
        description: description("the Red Fort", 500),
        security_features: lines(&[
            "Color-shifting windowed security thread with RBI inscription",
            "Portrait and electrotype watermarks",
            "Micro lettering \"RBI\" and \"500\"",
            "See-through register with denominational numeral",
            "Color-shifting windowed security thread",
            "Latent image of denomination",
        ]),
        detection_params: params((0.7, 1.1), "green_to_blue", 0.18),
    }
}

fn rs200_entry() -> ReferenceEntry {
    ReferenceEntry {
        denomination: Denomination::Rs200,
        description: description("Sanchi Stupa", 200),
        security_features: lines(&[
            "Color-shifting windowed security thread with RBI inscription",
            "Portrait and electrotype watermarks",
            "Micro lettering \"RBI\" and \"200\"",
            "See-through register with denominational numeral",
            "Latent image of denomination",
        ]),
        detection_params: params((0.7, 1.0), "orange_to_green", 0.18),
    }
}

fn rs100_entry() -> ReferenceEntry {
    ReferenceEntry {
        denomination: Denomination::Rs100,
        description: description("Rani ki Vav", 100),
        security_features: lines(&[
            "Windowed security thread with inscriptions",
            "Portrait and electrotype watermarks",
            "Micro lettering \"RBI\" and \"100\"",
            "See-through register with denominational numeral",
            "Latent image of denomination",
        ]),
        detection_params: params((0.6, 0.9), "green_to_blue", 0.15),
    }
}

fn security_feature_entries() -> BTreeMap<String, SecurityFeatureEntry> {
    let mut features = BTreeMap::new();

    features.insert(
        "security_thread".to_string(),
        SecurityFeatureEntry {
            description: "Color-shifting windowed security thread with RBI inscriptions"
                .to_string(),
            detection_params: json!({
                "threshold": 0.7,
                "min_area": 1000,
                "aspect_ratio": [8, 12],
                "color_shift_detection": true
            }),
            rbi_guidelines: "The security thread is a windowed thread that changes color when \
                viewed from different angles. It contains micro-printed text 'RBI' and the \
                denomination value."
                .to_string(),
        },
    );

    features.insert(
        "watermark".to_string(),
        SecurityFeatureEntry {
            description: "Portrait watermark of Mahatma Gandhi and electrotype denomination"
                .to_string(),
            detection_params: json!({
                "threshold": 0.6,
                "min_contrast": 0.3,
                "portrait_area_ratio": 0.15,
                "electrotype_present": true
            }),
            rbi_guidelines: "The watermark should show a portrait of Mahatma Gandhi and an \
                electrotype denomination numeral. The portrait should be visible when held \
                against light."
                .to_string(),
        },
    );

    features.insert(
        "micro_lettering".to_string(),
        SecurityFeatureEntry {
            description: "Micro letters RBI and denomination value".to_string(),
            detection_params: json!({
                "threshold": 0.8,
                "min_size": 5,
                "text_pattern": r"(RBI|\d{3,4})",
                "min_confidence": 0.7
            }),
            rbi_guidelines: "Micro letters 'RBI' and the denomination value should be present. \
                These are visible under a magnifying glass."
                .to_string(),
        },
    );

    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FeatureKind;

    #[test]
    fn test_every_denomination_has_entry() {
        let catalog = ReferenceCatalog::new();
        for denomination in Denomination::ALL {
            assert!(catalog.entry(denomination).is_some());
            assert!(!catalog.get_feature_list(denomination).is_empty());
        }
    }

    #[test]
    fn test_description_mentions_value_and_motif() {
        let catalog = ReferenceCatalog::new();
        let text = catalog.get_description(Denomination::Rs500);
        assert!(text.starts_with("The ₹500 note features the Red Fort"));
        assert!(text.contains("Micro letters 'RBI' and '500'"));
    }

    #[test]
    fn test_feature_list_order() {
        let catalog = ReferenceCatalog::new();
        let features = catalog.get_feature_list(Denomination::Rs2000);
        assert_eq!(features.len(), 7);
        assert_eq!(features[1], "Portrait and electrotype watermarks");
        assert_eq!(features[6], "Optically variable ink on denomination numeral");

        assert_eq!(
            catalog.get_feature_list(Denomination::Rs100)[0],
            "Windowed security thread with inscriptions"
        );
    }

    #[test]
    fn test_entries_highest_first() {
        let catalog = ReferenceCatalog::new();
        let order: Vec<u32> = catalog.entries().map(|e| e.denomination.value()).collect();
        assert_eq!(order, [2000, 500, 200, 100]);
    }

    #[test]
    fn test_detection_params() {
        let catalog = ReferenceCatalog::new();
        let params = catalog.detection_params(Denomination::Rs200).unwrap();
        assert_eq!(params.thread_color, "orange_to_green");
        assert_eq!(params.thread_width_range_mm, (0.7, 1.0));
    }

    #[test]
    fn test_guideline_lookup_by_display_name() {
        let catalog = ReferenceCatalog::new();
        for kind in FeatureKind::ALL {
            let by_name = catalog.get_guideline(kind.name());
            let by_key = catalog.get_guideline(kind.catalog_key());
            assert!(by_name.is_some(), "no guideline for {}", kind.name());
            assert_eq!(by_name, by_key);
        }
        assert!(catalog
            .get_guideline("Security Thread")
            .unwrap()
            .contains("changes color"));
        assert_eq!(catalog.get_guideline("Latent Image"), None);
    }

    #[test]
    fn test_security_feature_params_are_descriptive() {
        let catalog = ReferenceCatalog::new();
        let watermark = catalog.security_feature("watermark").unwrap();
        assert_eq!(watermark.detection_params["portrait_area_ratio"], 0.15);
    }
}
