use crate::app::geometry::Geometry;
use crate::config::{Config, ShellConfig};
use crate::io::{parse_basis, read_basis_file, resolve_relative};
use collocation::{BasisSet, Shell, ShellKind};
use color_eyre::eyre::{eyre, Result, WrapErr};
use nalgebra::Vector3;
use periodic_table_on_an_enum::Element;
use std::collections::HashMap;
use tracing::info;

fn shell_kind(spherical: bool) -> ShellKind {
    if spherical {
        ShellKind::Spherical
    } else {
        ShellKind::Cartesian
    }
}

/// Caches the NWChem text of every element so that repeated atoms read
/// their basis file once.
pub struct BasisRegistry<'a> {
    config_file: &'a str,
    config: &'a Config,
    cache: HashMap<&'static str, String>,
}

impl<'a> BasisRegistry<'a> {
    pub fn new(config_file: &'a str, config: &'a Config) -> Self {
        Self {
            config_file,
            config,
            cache: HashMap::new(),
        }
    }

    fn text_for(&mut self, element: &Element) -> Result<&str> {
        let symbol = element.get_symbol();
        if !self.cache.contains_key(symbol) {
            let file = self
                .config
                .basis_sets
                .get(symbol)
                .ok_or_else(|| eyre!("No basis set file given for element {}", symbol))?;
            let path = resolve_relative(self.config_file, file);
            info!("Loading basis for {} from {}", symbol, path.display());
            let text = read_basis_file(&path)?;
            self.cache.insert(symbol, text);
        }
        Ok(self.cache[symbol].as_str())
    }

    /// Shells of every atom in `geometry`, in atom order.
    pub fn load_for_geometry(&mut self, geometry: &Geometry, kind: ShellKind) -> Result<BasisSet> {
        let mut basis = BasisSet::default();
        for (element, center) in geometry.elements.iter().zip(&geometry.coords) {
            let text = self.text_for(element)?;
            basis.extend(parse_basis(text, element.get_symbol(), *center, kind)?);
        }
        Ok(basis)
    }
}

fn build_shell(idx: usize, spec: &ShellConfig) -> Result<Shell> {
    let center = Vector3::new(spec.center[0], spec.center[1], spec.center[2]);
    let kind = shell_kind(spec.spherical.unwrap_or(false));
    Shell::from_exponents(spec.am, &spec.exponents, &spec.coefficients, center, kind)
        .wrap_err_with(|| format!("Invalid shell #{}", idx + 1))
}

/// Atom shells from the basis files followed by the explicit shells.
pub fn build_basis(config_file: &str, config: &Config, geometry: &Geometry) -> Result<BasisSet> {
    let mut basis = if geometry.is_empty() {
        BasisSet::default()
    } else {
        BasisRegistry::new(config_file, config)
            .load_for_geometry(geometry, shell_kind(config.basis_spherical()))?
    };
    for (idx, spec) in config.shells.iter().enumerate() {
        basis.push(build_shell(idx, spec)?);
    }
    if basis.is_empty() {
        return Err(eyre!("Configuration defines no shells"));
    }
    Ok(basis)
}
