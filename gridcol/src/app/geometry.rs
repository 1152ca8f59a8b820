use crate::config::Config;
use color_eyre::eyre::{eyre, Result};
use nalgebra::Vector3;
use periodic_table_on_an_enum::Element;
use tracing::info;

/// Atoms (elements and coordinates) that carry basis-set shells.
pub struct Geometry {
    pub elements: Vec<Element>,
    pub coords: Vec<Vector3<f64>>,
}

impl Geometry {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Build the geometry defined in the YAML configuration.
pub fn build_geometry(config: &Config) -> Result<Geometry> {
    let mut elements = Vec::with_capacity(config.geometry.len());
    let mut coords = Vec::with_capacity(config.geometry.len());

    for atom in &config.geometry {
        let element = Element::from_symbol(&atom.element)
            .ok_or_else(|| eyre!("Invalid element symbol: {}", atom.element))?;
        elements.push(element);
        coords.push(Vector3::new(atom.coords[0], atom.coords[1], atom.coords[2]));
    }
    if !elements.is_empty() {
        info!("Geometry: {} atoms", elements.len());
    }

    Ok(Geometry { elements, coords })
}
