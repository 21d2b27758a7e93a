//! Material registry
//!
//! One table for both the built-in materials and the ones the user creates
//! at runtime. Particles only keep the material name; density and colour are
//! looked up here whenever the editor applies a material.

use std::collections::BTreeMap;

use bevy::log::debug;
use bevy::prelude::Resource;

use super::states::Rgb;

/// Name of the material new particles are placed with
pub const DEFAULT_MATERIAL: &str = "Custom Material 1 - 1.0kgm^-3";
pub const DEFAULT_COLOUR: Rgb = Rgb(144, 202, 249);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    BuiltIn,
    Custom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub density: f64, // kg/m^3
    pub colour: Rgb,
    pub kind: MaterialKind,
}

/// Bevy resource shared by the editor and scenario loading
#[derive(Resource, Debug, Clone)]
pub struct MaterialRegistry {
    entries: BTreeMap<String, Material>,
}

impl MaterialRegistry {
    /// Registry holding only the built-in table and the default custom material
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        let built_in: [(&str, f64, Rgb); 8] = [
            ("Aluminium - 2700kgm^-3", 2700.0, Rgb(165, 168, 176)),
            ("Copper - 8960kgm^-3", 8960.0, Rgb(184, 115, 51)),
            ("Gold - 19300kgm^-3", 19300.0, Rgb(212, 175, 55)),
            ("Ice - 917kgm^-3", 917.0, Rgb(190, 230, 245)),
            ("Lead - 11340kgm^-3", 11340.0, Rgb(87, 92, 104)),
            ("Rubber - 1100kgm^-3", 1100.0, Rgb(40, 40, 40)),
            ("Steel - 7850kgm^-3", 7850.0, Rgb(120, 130, 140)),
            ("Wood - 700kgm^-3", 700.0, Rgb(133, 94, 66)),
        ];
        for (name, density, colour) in built_in {
            entries.insert(name.to_string(), Material { density, colour, kind: MaterialKind::BuiltIn });
        }
        entries.insert(
            DEFAULT_MATERIAL.to_string(),
            Material { density: 1.0, colour: DEFAULT_COLOUR, kind: MaterialKind::Custom },
        );

        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.entries.get(name)
    }

    pub fn density(&self, name: &str) -> Option<f64> {
        self.get(name).map(|m| m.density)
    }

    pub fn colour(&self, name: &str) -> Option<Rgb> {
        self.get(name).map(|m| m.colour)
    }

    /// Add a user material; the stored name carries its density with at
    /// least one decimal, e.g. `"Foam - 30.0kgm^-3"`. Returns the full name.
    pub fn register_custom(&mut self, name: &str, density: f64, colour: Rgb) -> String {
        let full = format!("{name} - {density:?}kgm^-3");
        debug!("registering custom material {full}");
        self.entries.insert(full.clone(), Material { density, colour, kind: MaterialKind::Custom });
        full
    }

    /// Insert an entry under an already formatted name (used when loading)
    pub fn insert_named(&mut self, name: String, density: f64, colour: Rgb) {
        self.entries.insert(name, Material { density, colour, kind: MaterialKind::Custom });
    }

    /// All names, custom materials first, each group sorted
    pub fn names(&self) -> Vec<&str> {
        let custom = self.entries.iter().filter(|(_, m)| m.kind == MaterialKind::Custom);
        let built_in = self.entries.iter().filter(|(_, m)| m.kind == MaterialKind::BuiltIn);
        custom.chain(built_in).map(|(n, _)| n.as_str()).collect()
    }

    pub fn custom(&self) -> impl Iterator<Item = (&str, &Material)> {
        self.entries
            .iter()
            .filter(|(_, m)| m.kind == MaterialKind::Custom)
            .map(|(n, m)| (n.as_str(), m))
    }
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        Self::new()
    }
}
