//! Static field catalog shared by the Cura and Slic3r profile formats.
//!
//! Every known setting key belongs to exactly one [`FieldCategory`]. The
//! category decides how a raw value is normalized and written back.

use crate::error::ProfileError;

/// How a catalog key's raw value is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldCategory {
    /// Encoded as `"false"/"true"`, `"False"/"True"`, or `"0"/"1"`.
    Boolean,
    /// Number or string, possibly with a trailing `%`.
    Scalar,
    /// One of a fixed, ordered set of strings.
    Enum,
    /// An array in Cura profiles, a plain value in Slic3r profiles.
    Array,
}

impl FieldCategory {
    /// Order in which categories are processed during normalization.
    pub const NORMALIZE_ORDER: [Self; 4] = [Self::Scalar, Self::Boolean, Self::Enum, Self::Array];
}

/// An enumerated key and its legal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumField {
    /// Setting key.
    pub key: &'static str,
    /// Legal values, in display order.
    pub values: &'static [&'static str],
}

/// Keys whose G-code text Slic3r stores with escaped newlines.
pub const ESCAPED_NEWLINE_KEYS: [&str; 2] = ["end_gcode", "start_gcode"];

const SCALAR_KEYS: &[&str] = &[
    "layer_height",
    "temperature",
    "bed_temperature",
    "print_bed_temperature",
    "fill_density",
    "wall_thickness",
    "print_speed",
    "solid_layer_thickness",
    "travel_speed",
    "outer_shell_speed",
    "inner_shell_speed",
    "infill_speed",
    "bottom_layer_speed",
    "filament_flow",
    "retraction_speed",
    "retraction_amount",
    "extrusion_multiplier",
    "fan_full_height",
    "fan_speed",
    "fan_speed_max",
    "first_layer_temperature",
    "first_layer_bed_temperature",
    "brim_width",
    "skirts",
    "min_skirt_length",
    "brim_line_count",
];

const BOOLEAN_KEYS: &[&str] = &[
    "support_material",
    "overhangs",
    "retraction_enable",
    "fan_enabled",
    "cooling",
    "fan_always_on",
    "spiral_vase",
];

const ENUM_FIELDS: &[EnumField] = &[
    EnumField {
        key: "support",
        values: &["none", "buildplate", "everywhere"],
    },
    EnumField {
        key: "platform_adhesion",
        values: &["none", "brim", "raft"],
    },
];

const ARRAY_KEYS: &[&str] = &[
    "print_temperature",
    "start_gcode",
    "end_gcode",
    "filament_diameter",
];

/// Read-only partition of setting keys into categories.
#[derive(Debug, Clone, Copy)]
pub struct FieldCatalog {
    scalar_keys: &'static [&'static str],
    boolean_keys: &'static [&'static str],
    enum_fields: &'static [EnumField],
    array_keys: &'static [&'static str],
}

static FIELD_CATALOG: FieldCatalog = FieldCatalog {
    scalar_keys: SCALAR_KEYS,
    boolean_keys: BOOLEAN_KEYS,
    enum_fields: ENUM_FIELDS,
    array_keys: ARRAY_KEYS,
};

/// The process-wide catalog.
#[must_use]
pub fn catalog() -> &'static FieldCatalog {
    &FIELD_CATALOG
}

impl FieldCatalog {
    /// Category of `key`, or `None` for keys outside the catalog.
    #[must_use]
    pub fn category_of(&self, key: &str) -> Option<FieldCategory> {
        if self.scalar_keys.contains(&key) {
            Some(FieldCategory::Scalar)
        } else if self.boolean_keys.contains(&key) {
            Some(FieldCategory::Boolean)
        } else if self.enum_fields.iter().any(|field| field.key == key) {
            Some(FieldCategory::Enum)
        } else if self.array_keys.contains(&key) {
            Some(FieldCategory::Array)
        } else {
            None
        }
    }

    /// True when `key` is in the catalog.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.category_of(key).is_some()
    }

    /// Legal values for an enumerated key.
    pub fn enum_values_of(&self, key: &str) -> Result<&'static [&'static str], ProfileError> {
        self.enum_fields
            .iter()
            .find(|field| field.key == key)
            .map(|field| field.values)
            .ok_or_else(|| ProfileError::NotAnEnumKey {
                key: key.to_string(),
            })
    }

    /// Keys of one category, in catalog order.
    pub fn keys_in(&self, category: FieldCategory) -> impl Iterator<Item = &'static str> + '_ {
        let keys: Box<dyn Iterator<Item = &'static str>> = match category {
            FieldCategory::Scalar => Box::new(self.scalar_keys.iter().copied()),
            FieldCategory::Boolean => Box::new(self.boolean_keys.iter().copied()),
            FieldCategory::Enum => Box::new(self.enum_fields.iter().map(|field| field.key)),
            FieldCategory::Array => Box::new(self.array_keys.iter().copied()),
        };
        keys
    }

    /// Every key with its category, in normalization order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, FieldCategory)> + '_ {
        FieldCategory::NORMALIZE_ORDER
            .into_iter()
            .flat_map(move |category| self.keys_in(category).map(move |key| (key, category)))
    }

    /// Every key, in normalization order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries().map(|(key, _)| key)
    }

    /// Number of keys in the catalog.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.scalar_keys.len()
            + self.boolean_keys.len()
            + self.enum_fields.len()
            + self.array_keys.len()
    }

    /// True when the catalog has no keys.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn categories_are_disjoint() {
        let keys: BTreeSet<_> = catalog().entries().map(|(key, _)| key).collect();
        assert_eq!(keys.len(), catalog().len());
    }

    #[test]
    fn entries_agree_with_category_of() {
        for (key, category) in catalog().entries() {
            assert_eq!(catalog().category_of(key), Some(category), "{key}");
        }
    }

    #[test]
    fn known_keys_resolve() {
        assert_eq!(
            catalog().category_of("fill_density"),
            Some(FieldCategory::Scalar)
        );
        assert_eq!(
            catalog().category_of("spiral_vase"),
            Some(FieldCategory::Boolean)
        );
        assert_eq!(catalog().category_of("support"), Some(FieldCategory::Enum));
        assert_eq!(
            catalog().category_of("start_gcode"),
            Some(FieldCategory::Array)
        );
        assert_eq!(catalog().category_of("perimeters"), None);
        assert!(!catalog().contains("magic_spiralize"));
    }

    #[test]
    fn enum_values_keep_display_order() {
        assert_eq!(
            catalog().enum_values_of("support"),
            Ok(&["none", "buildplate", "everywhere"][..])
        );
        assert_eq!(
            catalog().enum_values_of("platform_adhesion"),
            Ok(&["none", "brim", "raft"][..])
        );
    }

    #[test]
    fn enum_values_of_rejects_other_categories() {
        assert_eq!(
            catalog().enum_values_of("layer_height"),
            Err(ProfileError::NotAnEnumKey {
                key: "layer_height".into()
            })
        );
    }

    #[test]
    fn entries_start_with_scalars_and_end_with_arrays() {
        let entries: Vec<_> = catalog().entries().collect();
        assert_eq!(
            entries.first(),
            Some(&("layer_height", FieldCategory::Scalar))
        );
        assert_eq!(
            entries.last(),
            Some(&("filament_diameter", FieldCategory::Array))
        );
        assert_eq!(catalog().len(), 39);
    }

    #[test]
    fn escaped_newline_keys_are_array_keys() {
        for key in ESCAPED_NEWLINE_KEYS {
            assert_eq!(catalog().category_of(key), Some(FieldCategory::Array));
        }
    }
}
