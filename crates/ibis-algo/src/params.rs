//! String-keyed solver parameters.
//!
//! A [`Params`] store holds integer, float, string and tolerance values
//! under textual keys. The defaults cover every parameter the solvers
//! read; typed getters fail with a structural error on an unknown key or
//! a kind mismatch, so misspelled keys surface early instead of silently
//! using defaults.
//!
//! Loading from a concrete file format is a caller concern (the store is
//! serde-serializable); the core only defines names, kinds and defaults.

use hashbrown::HashMap;
use ibis_core::{IbisError, IbisResult, Tolerance};
use serde::{Deserialize, Serialize};

/// A parameter value of one of the four recognized kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Int(i64),
    Dbl(f64),
    Str(String),
    Tol(Tolerance),
}

impl ParamValue {
    fn kind(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "integer",
            ParamValue::Dbl(_) => "float",
            ParamValue::Str(_) => "string",
            ParamValue::Tol(_) => "tolerance",
        }
    }
}

/// String-keyed configuration of the solvers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    map: HashMap<String, ParamValue>,
}

impl Default for Params {
    fn default() -> Self {
        let mut p = Params {
            map: HashMap::new(),
        };

        p.def("PROPAGATION_ITER_LIMIT", ParamValue::Int(200));
        p.def("SPLIT_NB_SLICES", ParamValue::Int(7));
        p.def("SPLIT_SSR_LF_FREQUENCY", ParamValue::Int(4));
        p.def("NODE_LIMIT", ParamValue::Int(500_000));
        p.def("SOLUTION_LIMIT", ParamValue::Int(1000));
        p.def("DEPTH_LIMIT", ParamValue::Int(1000));
        p.def("NEWTON_ITER_LIMIT", ParamValue::Int(20));
        p.def("NEWTON_CERTIFY_ITER_LIMIT", ParamValue::Int(20));
        p.def("BC3_ITER_LIMIT", ParamValue::Int(30));
        p.def("BB_SPACE_FREQUENCY", ParamValue::Int(1));
        p.def("LOCAL_SOLVER_ITER_LIMIT", ParamValue::Int(100));

        p.def("PROPAGATION_REL_TOL", ParamValue::Dbl(1e-3));
        p.def("SPLIT_PEEL_FACTOR", ParamValue::Dbl(10.0));
        p.def("SOLUTION_CLUSTER_GAP", ParamValue::Dbl(-1.0));
        p.def("TIME_LIMIT", ParamValue::Dbl(3600.0));
        p.def("INFLATION_DELTA", ParamValue::Dbl(1.125));
        p.def("INFLATION_CHI", ParamValue::Dbl(1e-12));
        p.def("NEWTON_IMPROVEMENT", ParamValue::Dbl(50.0));
        p.def("BC3_PEEL_FACTOR", ParamValue::Dbl(2.0));
        p.def("RELAXATION_EQ_TOL", ParamValue::Dbl(1e-8));

        p.def("BP_NODE_SELECTION", ParamValue::Str("DFS".into()));
        p.def("SPLIT_SLICING", ParamValue::Str("BI".into()));
        p.def("SPLIT_SELECTION", ParamValue::Str("RR".into()));
        p.def("SPLIT_INNER_BOX", ParamValue::Str("NO".into()));
        p.def("SPLIT_OBJECTIVE", ParamValue::Str("NO".into()));
        p.def("PROPAGATION_BASE", ParamValue::Str("HC4".into()));
        p.def("PROPAGATION_WITH_ACID", ParamValue::Str("NO".into()));
        p.def("PROPAGATION_WITH_POLYTOPE_HULL", ParamValue::Str("NO".into()));
        p.def("PROPAGATION_WITH_NEWTON", ParamValue::Str("NO".into()));
        p.def("PROPAGATION_ALGORITHM", ParamValue::Str("HC4".into()));
        p.def("CERTIFICATION", ParamValue::Str("NO".into()));
        p.def("RELAXATION_CORNER", ParamValue::Str("RANDOM".into()));

        p.def(
            "OBJ_TOL",
            ParamValue::Tol(Tolerance::rel(1e-6).unwrap_or_default()),
        );
        p.def("VAR_TOL", ParamValue::Tol(Tolerance::default()));

        p
    }
}

impl Params {
    pub fn new() -> Self {
        Params::default()
    }

    fn def(&mut self, name: &str, value: ParamValue) {
        self.map.insert(name.to_string(), value);
    }

    fn lookup(&self, name: &str) -> IbisResult<&ParamValue> {
        self.map
            .get(name)
            .ok_or_else(|| IbisError::Structure(format!("unknown parameter {name}")))
    }

    pub fn get_int(&self, name: &str) -> IbisResult<i64> {
        match self.lookup(name)? {
            ParamValue::Int(v) => Ok(*v),
            other => Err(kind_mismatch(name, "integer", other)),
        }
    }

    pub fn get_dbl(&self, name: &str) -> IbisResult<f64> {
        match self.lookup(name)? {
            ParamValue::Dbl(v) => Ok(*v),
            ParamValue::Int(v) => Ok(*v as f64),
            other => Err(kind_mismatch(name, "float", other)),
        }
    }

    pub fn get_str(&self, name: &str) -> IbisResult<&str> {
        match self.lookup(name)? {
            ParamValue::Str(v) => Ok(v),
            other => Err(kind_mismatch(name, "string", other)),
        }
    }

    pub fn get_tol(&self, name: &str) -> IbisResult<Tolerance> {
        match self.lookup(name)? {
            ParamValue::Tol(v) => Ok(*v),
            other => Err(kind_mismatch(name, "tolerance", other)),
        }
    }

    fn set(&mut self, name: &str, value: ParamValue) -> IbisResult<()> {
        match self.map.get(name) {
            Some(old) if old.kind() == value.kind() => {
                self.map.insert(name.to_string(), value);
                Ok(())
            }
            Some(old) => Err(kind_mismatch(name, old.kind(), &value)),
            None => Err(IbisError::Structure(format!("unknown parameter {name}"))),
        }
    }

    pub fn set_int(&mut self, name: &str, v: i64) -> IbisResult<()> {
        self.set(name, ParamValue::Int(v))
    }

    pub fn set_dbl(&mut self, name: &str, v: f64) -> IbisResult<()> {
        self.set(name, ParamValue::Dbl(v))
    }

    pub fn set_str(&mut self, name: &str, v: &str) -> IbisResult<()> {
        self.set(name, ParamValue::Str(v.to_string()))
    }

    pub fn set_tol(&mut self, name: &str, v: Tolerance) -> IbisResult<()> {
        self.set(name, ParamValue::Tol(v))
    }

    /// The propagation re-queue tolerance as a [`Tolerance`] value.
    pub fn propagation_tol(&self) -> IbisResult<Tolerance> {
        Tolerance::rel(self.get_dbl("PROPAGATION_REL_TOL")?)
    }

    /// Output tolerance for variables created without an explicit one.
    pub fn var_tol(&self) -> Tolerance {
        self.get_tol("VAR_TOL").unwrap_or_default()
    }
}

fn kind_mismatch(name: &str, want: &str, got: &ParamValue) -> IbisError {
    IbisError::Structure(format!(
        "parameter {name} is a {} parameter, not a {want} one",
        got.kind()
    ))
}
