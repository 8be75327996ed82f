use gridconv::core::utils::box_size::Species;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid species '{0}'. Expected 'SYMBOL:MOLAR_MASS:COUNT' (e.g., 'H2O:18.015:64').")]
    InvalidSpeciesFormat(String),

    #[error("Invalid {component} '{value}' in species '{species}'.")]
    InvalidNumber {
        component: &'static str,
        value: String,
        species: String,
    },

    #[error("Component '{component}' cannot be empty in '{name}'.")]
    EmptyComponent {
        component: &'static str,
        name: String,
    },

    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidKeyValue(String),
}

pub fn parse_species(s: &str) -> Result<Species, ParseError> {
    let parts: Vec<&str> = s.split(':').collect();
    let [symbol, mass, count] = parts[..] else {
        return Err(ParseError::InvalidSpeciesFormat(s.to_string()));
    };
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "symbol",
            name: s.to_string(),
        });
    }
    let mass = mass
        .trim()
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber {
            component: "molar mass",
            value: mass.to_string(),
            species: s.to_string(),
        })?;
    let count = count
        .trim()
        .parse::<usize>()
        .map_err(|_| ParseError::InvalidNumber {
            component: "count",
            value: count.to_string(),
            species: s.to_string(),
        })?;
    Ok(Species {
        symbol: symbol.to_string(),
        mass,
        count,
    })
}

pub fn parse_key_value(s: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidKeyValue(s.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::InvalidKeyValue(s.to_string()));
    }
    Ok((key, value.trim()))
}
