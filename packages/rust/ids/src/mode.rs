//! Key derivation rules for matching run tables against a master table.

use std::fmt;
use std::str::FromStr;

use ligbench_shared::{LigbenchError, Result};

/// Named rule for turning a run table's ID column into a `PDB_ID` key.
///
/// `PdbIdFirst5`, `CifFileFirst5` and `ComplexSeedFirst5` behave
/// identically; each name documents the ID shape it was written for and
/// existing master tables depend on all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdMode {
    PdbIdFirst4,
    PdbIdFirst5,
    CifFileFirst5,
    ComplexSeedFirst5,
    PdbPlusChain,
    PdbNoUnderscoreUpper,
}

impl IdMode {
    pub const ALL: [IdMode; 6] = [
        IdMode::PdbIdFirst4,
        IdMode::PdbIdFirst5,
        IdMode::CifFileFirst5,
        IdMode::ComplexSeedFirst5,
        IdMode::PdbPlusChain,
        IdMode::PdbNoUnderscoreUpper,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IdMode::PdbIdFirst4 => "pdb_id_first4",
            IdMode::PdbIdFirst5 => "pdb_id_first5",
            IdMode::CifFileFirst5 => "cif_file_first5",
            IdMode::ComplexSeedFirst5 => "complex_seed_first5",
            IdMode::PdbPlusChain => "pdb_plus_chain",
            IdMode::PdbNoUnderscoreUpper => "pdb_no_underscore_upper",
        }
    }
}

impl fmt::Display for IdMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdMode {
    type Err = LigbenchError;

    fn from_str(s: &str) -> Result<Self> {
        IdMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<_> = IdMode::ALL.iter().map(|m| m.as_str()).collect();
                LigbenchError::config(format!(
                    "unknown id_mode '{s}': expected one of {}",
                    known.join(", ")
                ))
            })
    }
}

/// A fully configured key rule. Built once from an [`IdMode`] plus any
/// extra column it needs, so a missing chain column is reported before any
/// table is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdRule {
    PdbIdFirst4,
    PdbIdFirst5,
    CifFileFirst5,
    ComplexSeedFirst5,
    PdbPlusChain { chain_col: String },
    PdbNoUnderscoreUpper,
}

impl IdRule {
    pub fn new(mode: IdMode, chain_col: Option<&str>) -> Result<Self> {
        Ok(match mode {
            IdMode::PdbIdFirst4 => IdRule::PdbIdFirst4,
            IdMode::PdbIdFirst5 => IdRule::PdbIdFirst5,
            IdMode::CifFileFirst5 => IdRule::CifFileFirst5,
            IdMode::ComplexSeedFirst5 => IdRule::ComplexSeedFirst5,
            IdMode::PdbPlusChain => {
                let chain_col = chain_col
                    .filter(|c| !c.trim().is_empty())
                    .ok_or_else(|| LigbenchError::config("pdb_plus_chain requires a chain column"))?;
                IdRule::PdbPlusChain {
                    chain_col: chain_col.to_string(),
                }
            }
            IdMode::PdbNoUnderscoreUpper => IdRule::PdbNoUnderscoreUpper,
        })
    }

    pub fn mode(&self) -> IdMode {
        match self {
            IdRule::PdbIdFirst4 => IdMode::PdbIdFirst4,
            IdRule::PdbIdFirst5 => IdMode::PdbIdFirst5,
            IdRule::CifFileFirst5 => IdMode::CifFileFirst5,
            IdRule::ComplexSeedFirst5 => IdMode::ComplexSeedFirst5,
            IdRule::PdbPlusChain { .. } => IdMode::PdbPlusChain,
            IdRule::PdbNoUnderscoreUpper => IdMode::PdbNoUnderscoreUpper,
        }
    }

    /// Extra column the rule reads besides the ID column.
    pub fn chain_column(&self) -> Option<&str> {
        match self {
            IdRule::PdbPlusChain { chain_col } => Some(chain_col),
            _ => None,
        }
    }

    /// Derive the key for one row. `chain` is only consulted by
    /// [`IdRule::PdbPlusChain`], which yields `None` without it.
    pub fn key(&self, id: &str, chain: Option<&str>) -> Option<String> {
        match self {
            IdRule::PdbIdFirst4 => Some(upper_prefix(id, 4)),
            IdRule::PdbIdFirst5 | IdRule::CifFileFirst5 | IdRule::ComplexSeedFirst5 => {
                Some(upper_prefix(id, 5))
            }
            IdRule::PdbPlusChain { .. } => chain.map(|c| id_with_chain(id, c)),
            IdRule::PdbNoUnderscoreUpper => Some(id.replace('_', "").to_uppercase()),
        }
    }
}

fn upper_prefix(id: &str, n: usize) -> String {
    id.chars().take(n).collect::<String>().to_uppercase()
}

fn id_with_chain(id: &str, chain: &str) -> String {
    format!("{}{}", id.trim(), chain.trim()).to_uppercase()
}
