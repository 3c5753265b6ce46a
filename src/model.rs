//!
//! Owned model parameters and their JSON files
//!
//! The kernels only borrow; `HmmParams` and `SubHmmParams` own the arrays
//! and hand out validated `Hmm` / `SubHmm` views. The JSON layout is a
//! tagged object:
//!
//! ```text
//! {"kind": "flat", "init": [..M], "trans": [[..M]; M]}
//! {"kind": "sub", "nsubs": [..B], "rs": [..N], "ps": [..N],
//!  "super_trans": [[..B]; B], "super_init": [..B],
//!  "sub_transs": [[[..Nsubs[b]]; Nsubs[b]]; B], "sub_inits": [[..Nsubs[b]]; B]}
//! ```
//!
//! Emission files are a list of `T x M` matrices of log likelihoods. JSON
//! has no infinities: an impossible emission (`-inf`) is written as the
//! string `"-inf"`, and `"-inf"`, `"-Infinity"` and `null` are all read
//! back as `-inf`.
//!
use crate::error::HmmError;
use crate::hmm::Hmm;
use crate::subhmm::SubHmm;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

///
/// Flat HMM parameters.
///
#[derive(Debug, Clone, PartialEq)]
pub struct HmmParams {
    pub trans: Array2<f64>,
    pub init: Array1<f64>,
}

impl HmmParams {
    ///
    /// Borrow as a validated `Hmm`.
    ///
    pub fn view(&self) -> Result<Hmm<'_, f64>, HmmError> {
        Hmm::new(self.trans.view(), self.init.view())
    }
}

///
/// Sub-HMM parameters, laid out as in `SubHmm::new`.
///
#[derive(Debug, Clone, PartialEq)]
pub struct SubHmmParams {
    pub nsubs: Vec<u32>,
    pub rs: Vec<u32>,
    pub ps: Array1<f64>,
    pub super_trans: Array2<f64>,
    pub super_init: Array1<f64>,
    pub sub_transs: Vec<Array2<f64>>,
    pub sub_inits: Vec<Array1<f64>>,
}

impl SubHmmParams {
    /// Total number of sub-states `N`
    pub fn n_states(&self) -> usize {
        self.rs.len()
    }
    ///
    /// Borrow as a validated `SubHmm`.
    ///
    pub fn view(&self) -> Result<SubHmm<'_, f64>, HmmError> {
        SubHmm::new(
            &self.nsubs,
            &self.rs,
            self.ps.view(),
            self.super_trans.view(),
            self.super_init.view(),
            self.sub_transs.iter().map(|m| m.view()).collect(),
            self.sub_inits.iter().map(|v| v.view()).collect(),
        )
    }
}

///
/// Either kind of model, as stored in a JSON file.
///
#[derive(Debug, Clone, PartialEq)]
pub enum ModelParams {
    Flat(HmmParams),
    Sub(SubHmmParams),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ModelFile {
    Flat {
        init: Vec<f64>,
        trans: Vec<Vec<f64>>,
    },
    Sub {
        nsubs: Vec<u32>,
        rs: Vec<u32>,
        ps: Vec<f64>,
        super_trans: Vec<Vec<f64>>,
        super_init: Vec<f64>,
        sub_transs: Vec<Vec<Vec<f64>>>,
        sub_inits: Vec<Vec<f64>>,
    },
}

impl ModelParams {
    ///
    /// Read a model from a JSON file. Ragged matrices are rejected here;
    /// probabilities are checked by `view`.
    ///
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, HmmError> {
        let file = File::open(path)?;
        let parsed: ModelFile = serde_json::from_reader(BufReader::new(file))?;
        ModelParams::from_file(parsed)
    }
    ///
    /// Write the model as a JSON file.
    ///
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), HmmError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.to_file())?;
        Ok(())
    }
    pub fn from_json_str(s: &str) -> Result<Self, HmmError> {
        let parsed: ModelFile = serde_json::from_str(s)?;
        ModelParams::from_file(parsed)
    }
    fn from_file(f: ModelFile) -> Result<Self, HmmError> {
        match f {
            ModelFile::Flat { init, trans } => Ok(ModelParams::Flat(HmmParams {
                trans: matrix_from_rows("transition matrix", &trans)?,
                init: Array1::from(init),
            })),
            ModelFile::Sub {
                nsubs,
                rs,
                ps,
                super_trans,
                super_init,
                sub_transs,
                sub_inits,
            } => Ok(ModelParams::Sub(SubHmmParams {
                nsubs,
                rs,
                ps: Array1::from(ps),
                super_trans: matrix_from_rows("super transition matrix", &super_trans)?,
                super_init: Array1::from(super_init),
                sub_transs: sub_transs
                    .iter()
                    .map(|m| matrix_from_rows("sub transition matrix", m))
                    .collect::<Result<_, _>>()?,
                sub_inits: sub_inits.into_iter().map(Array1::from).collect(),
            })),
        }
    }
    fn to_file(&self) -> ModelFile {
        match self {
            ModelParams::Flat(p) => ModelFile::Flat {
                init: p.init.to_vec(),
                trans: matrix_to_rows(&p.trans),
            },
            ModelParams::Sub(p) => ModelFile::Sub {
                nsubs: p.nsubs.clone(),
                rs: p.rs.clone(),
                ps: p.ps.to_vec(),
                super_trans: matrix_to_rows(&p.super_trans),
                super_init: p.super_init.to_vec(),
                sub_transs: p.sub_transs.iter().map(matrix_to_rows).collect(),
                sub_inits: p.sub_inits.iter().map(|v| v.to_vec()).collect(),
            },
        }
    }
}

///
/// Emission log likelihood as stored in JSON.
///
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(try_from = "RawLogProb", into = "RawLogProb")]
struct LogProb(f64);

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawLogProb {
    Value(f64),
    Named(String),
    Missing(Option<f64>),
}

impl TryFrom<RawLogProb> for LogProb {
    type Error = String;
    fn try_from(raw: RawLogProb) -> Result<Self, Self::Error> {
        match raw {
            RawLogProb::Value(x) | RawLogProb::Missing(Some(x)) => Ok(LogProb(x)),
            RawLogProb::Missing(None) => Ok(LogProb(f64::NEG_INFINITY)),
            RawLogProb::Named(s) => match s.as_str() {
                "-inf" | "-Infinity" => Ok(LogProb(f64::NEG_INFINITY)),
                _ => Err(format!("unknown log likelihood {:?}", s)),
            },
        }
    }
}

impl From<LogProb> for RawLogProb {
    fn from(p: LogProb) -> Self {
        if p.0 == f64::NEG_INFINITY {
            RawLogProb::Named("-inf".to_owned())
        } else {
            RawLogProb::Value(p.0)
        }
    }
}

///
/// Read a list of emission log likelihood matrices.
///
pub fn read_emissions<P: AsRef<Path>>(path: P) -> Result<Vec<Array2<f64>>, HmmError> {
    let file = File::open(path)?;
    let parsed: Vec<Vec<Vec<LogProb>>> = serde_json::from_reader(BufReader::new(file))?;
    parsed
        .iter()
        .map(|rows| {
            let rows: Vec<Vec<f64>> = rows
                .iter()
                .map(|row| row.iter().map(|p| p.0).collect())
                .collect();
            matrix_from_rows("emission log likelihoods", &rows)
        })
        .collect()
}

///
/// Write a list of emission log likelihood matrices.
///
pub fn write_emissions<P: AsRef<Path>>(path: P, abls: &[Array2<f64>]) -> Result<(), HmmError> {
    let file = File::create(path)?;
    let rows: Vec<Vec<Vec<LogProb>>> = abls
        .iter()
        .map(|abl| {
            abl.rows()
                .into_iter()
                .map(|row| row.iter().map(|&x| LogProb(x)).collect())
                .collect()
        })
        .collect();
    serde_json::to_writer(BufWriter::new(file), &rows)?;
    Ok(())
}

///
/// Rectangular matrix from nested rows.
///
pub fn matrix_from_rows(what: &'static str, rows: &[Vec<f64>]) -> Result<Array2<f64>, HmmError> {
    let n_cols = rows.first().map_or(0, |row| row.len());
    let mut m = Array2::zeros((rows.len(), n_cols));
    for (i, row) in rows.iter().enumerate() {
        if row.len() != n_cols {
            return Err(HmmError::DimensionMismatch {
                what,
                expected: n_cols,
                actual: row.len(),
            });
        }
        for (j, &x) in row.iter().enumerate() {
            m[[i, j]] = x;
        }
    }
    Ok(m)
}

pub fn matrix_to_rows(m: &Array2<f64>) -> Vec<Vec<f64>> {
    m.rows().into_iter().map(|row| row.to_vec()).collect()
}
