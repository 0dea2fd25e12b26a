use nalgebra::Vector3;
use phf::{Map, phf_map};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Boltzmann constant in J/K.
pub const BOLTZMANN: f64 = 1.380649e-23;
/// Atomic mass unit in kg.
pub const AMU_KG: f64 = 1.66053906660e-27;
/// Typical exospheric temperature in K.
pub const EXOSPHERE_TEMPERATURE_K: f64 = 1000.0;
/// Relative flow speed of a low Earth orbit, in m/s.
pub const DEFAULT_ORBITAL_SPEED: f64 = 7_700.0;

/// Molecular masses in amu for species that may be named without an explicit mass.
static KNOWN_SPECIES_AMU: Map<&'static str, f64> = phf_map! {
    "H" => 1.0,
    "He" => 4.0,
    "N" => 14.0,
    "O" => 16.0,
    "N2" => 28.0,
    "NO" => 30.0,
    "O2" => 32.0,
    "Ar" => 40.0,
    "N+" => 14.0,
    "O+" => 16.0,
    "NO+" => 30.0,
    "O2+" => 32.0,
};

pub fn known_species_mass_amu(name: &str) -> Option<f64> {
    KNOWN_SPECIES_AMU.get(name).copied()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub name: String,
    pub mass_kg: f64,
    pub temperature_k: f64,
    pub number_density_m3: f64,
}

impl Species {
    pub fn new(name: &str, mass_amu: f64, temperature_k: f64, number_density_m3: f64) -> Self {
        Self {
            name: name.to_string(),
            mass_kg: mass_amu * AMU_KG,
            temperature_k,
            number_density_m3,
        }
    }

    /// One-dimensional thermal speed scale `sqrt(k_B T / m)` in m/s.
    pub fn thermal_speed(&self) -> f64 {
        (BOLTZMANN * self.temperature_k / self.mass_kg).sqrt()
    }
}

#[derive(Debug, Error)]
pub enum AtmosphereLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Species '{0}' has no mass-amu and is not a known species")]
    UnknownSpeciesMass(String),
    #[error("Invalid atmosphere model: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawSpecies {
    name: String,
    mass_amu: Option<f64>,
    temperature_k: Option<f64>,
    number_density: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawAtmosphere {
    orbital_speed: Option<f64>,
    crosswind: Option<[f64; 3]>,
    species: Vec<RawSpecies>,
}

/// Free-stream gas seen by the shield: species populations, the orbital flow speed and a
/// crosswind in the spacecraft frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AtmosphereModel {
    pub species: Vec<Species>,
    pub orbital_speed: f64,
    pub crosswind: Vector3<f64>,
}

impl Default for AtmosphereModel {
    fn default() -> Self {
        let t = EXOSPHERE_TEMPERATURE_K;
        Self {
            species: vec![
                Species::new("O", 16.0, t, 5.0e14),
                Species::new("O2", 32.0, t, 1.2e13),
                Species::new("N2", 28.0, t, 1.0e14),
                Species::new("O+", 16.0, t, 1.0e11),
                Species::new("O2+", 32.0, t, 1.0e10),
            ],
            orbital_speed: DEFAULT_ORBITAL_SPEED,
            crosswind: Vector3::zeros(),
        }
    }
}

impl AtmosphereModel {
    pub fn load(path: &Path) -> Result<Self, AtmosphereLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| AtmosphereLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let raw: RawAtmosphere =
            toml::from_str(&content).map_err(|e| AtmosphereLoadError::Toml {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
        Self::from_raw(raw)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, AtmosphereLoadError> {
        let raw: RawAtmosphere =
            toml::from_str(content).map_err(|e| AtmosphereLoadError::Toml {
                path: "<inline>".to_string(),
                source: e,
            })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawAtmosphere) -> Result<Self, AtmosphereLoadError> {
        let species = raw
            .species
            .into_iter()
            .map(|s| {
                let mass_amu = match s.mass_amu {
                    Some(m) => m,
                    None => known_species_mass_amu(&s.name)
                        .ok_or_else(|| AtmosphereLoadError::UnknownSpeciesMass(s.name.clone()))?,
                };
                Ok(Species::new(
                    &s.name,
                    mass_amu,
                    s.temperature_k.unwrap_or(EXOSPHERE_TEMPERATURE_K),
                    s.number_density,
                ))
            })
            .collect::<Result<Vec<_>, AtmosphereLoadError>>()?;

        let model = Self {
            species,
            orbital_speed: raw.orbital_speed.unwrap_or(DEFAULT_ORBITAL_SPEED),
            crosswind: raw.crosswind.map(Vector3::from).unwrap_or_else(Vector3::zeros),
        };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), AtmosphereLoadError> {
        if self.species.is_empty() {
            return Err(AtmosphereLoadError::Invalid(
                "at least one species is required".to_string(),
            ));
        }
        for s in &self.species {
            if !(s.mass_kg.is_finite() && s.mass_kg > 0.0) {
                return Err(AtmosphereLoadError::Invalid(format!(
                    "species '{}' must have a positive mass",
                    s.name
                )));
            }
            if !(s.temperature_k.is_finite() && s.temperature_k > 0.0) {
                return Err(AtmosphereLoadError::Invalid(format!(
                    "species '{}' must have a positive temperature",
                    s.name
                )));
            }
            if !(s.number_density_m3.is_finite() && s.number_density_m3 >= 0.0) {
                return Err(AtmosphereLoadError::Invalid(format!(
                    "species '{}' must have a non-negative number density",
                    s.name
                )));
            }
        }
        if self.total_number_density() <= 0.0 {
            return Err(AtmosphereLoadError::Invalid(
                "total number density must be positive".to_string(),
            ));
        }
        if !(self.orbital_speed.is_finite() && self.orbital_speed >= 0.0) {
            return Err(AtmosphereLoadError::Invalid(format!(
                "orbital speed must be non-negative, got {}",
                self.orbital_speed
            )));
        }
        Ok(())
    }

    /// Number densities in table order, used as species sampling weights.
    pub fn weights(&self) -> Vec<f64> {
        self.species.iter().map(|s| s.number_density_m3).collect()
    }

    pub fn total_number_density(&self) -> f64 {
        self.species.iter().map(|s| s.number_density_m3).sum()
    }

    /// Speed of the bulk flow, `|v_orb * z + crosswind|`.
    pub fn directed_speed(&self) -> f64 {
        (Vector3::z() * self.orbital_speed + self.crosswind).norm()
    }

    /// Particle flux through a plane normal to the flow, in particles / m^2 / s.
    pub fn directed_flux(&self) -> f64 {
        self.total_number_density() * self.directed_speed()
    }
}
