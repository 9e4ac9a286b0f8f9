//! Typed access to the fitted attributes of an estimator dump
//!
//! Every accessor maps a missing or mistyped attribute to
//! `IncompleteModel`, naming the attribute.

use crate::error::{PorterError, Result};
use serde_json::{Map, Value};

#[derive(Clone, Copy)]
pub struct Attributes<'a> {
    estimator: &'a str,
    map: &'a Map<String, Value>,
}

impl<'a> Attributes<'a> {
    pub fn new(estimator: &'a str, map: &'a Map<String, Value>) -> Self {
        Self { estimator, map }
    }

    pub fn estimator(&self) -> &'a str {
        self.estimator
    }

    fn fail(&self, reason: impl Into<String>) -> PorterError {
        PorterError::incomplete(self.estimator, reason)
    }

    pub fn has(&self, name: &str) -> bool {
        self.map.get(name).map(|v| !v.is_null()).unwrap_or(false)
    }

    pub fn get(&self, name: &str) -> Result<&'a Value> {
        match self.map.get(name) {
            Some(Value::Null) | None => Err(self.fail(format!("missing fitted attribute `{}`", name))),
            Some(value) => Ok(value),
        }
    }

    /// First present attribute among `names` (for renamed attributes across versions)
    pub fn get_any(&self, names: &[&str]) -> Result<&'a Value> {
        names
            .iter()
            .find_map(|n| self.map.get(*n).filter(|v| !v.is_null()))
            .ok_or_else(|| self.fail(format!("missing fitted attribute `{}`", names.join("` / `"))))
    }

    pub fn f64(&self, name: &str) -> Result<f64> {
        self.to_f64(self.get(name)?, name)
    }

    pub fn usize(&self, name: &str) -> Result<usize> {
        self.to_usize(self.get(name)?, name)
    }

    pub fn string(&self, name: &str) -> Result<&'a str> {
        self.get(name)?
            .as_str()
            .ok_or_else(|| self.fail(format!("`{}` must be a string", name)))
    }

    /// String attribute with a default when absent
    pub fn string_or(&self, name: &str, default: &'a str) -> Result<&'a str> {
        if self.has(name) {
            self.string(name)
        } else {
            Ok(default)
        }
    }

    pub fn vec_f64(&self, name: &str) -> Result<Vec<f64>> {
        self.to_vec_f64(self.get(name)?, name)
    }

    pub fn matrix(&self, name: &str) -> Result<Vec<Vec<f64>>> {
        self.to_matrix(self.get(name)?, name)
    }

    pub fn vec_usize(&self, name: &str) -> Result<Vec<usize>> {
        self.to_vec_usize(self.get(name)?, name)
    }

    /// Integer class labels
    pub fn labels(&self, name: &str) -> Result<Vec<i64>> {
        self.to_array(self.get(name)?, name)?
            .iter()
            .map(|v| self.to_i64(v, name))
            .collect()
    }

    /// Nested object, e.g. `tree_`
    pub fn object(&self, name: &str) -> Result<Attributes<'a>> {
        let map = self
            .get(name)?
            .as_object()
            .ok_or_else(|| self.fail(format!("`{}` must be an object", name)))?;
        Ok(Attributes::new(self.estimator, map))
    }

    /// List of nested objects, e.g. `estimators_`
    pub fn objects(&self, name: &str) -> Result<Vec<Attributes<'a>>> {
        self.to_array(self.get(name)?, name)?
            .iter()
            .map(|v| {
                v.as_object()
                    .map(|map| Attributes::new(self.estimator, map))
                    .ok_or_else(|| self.fail(format!("`{}` must hold objects", name)))
            })
            .collect()
    }

    /// List of matrices, e.g. `coefs_`
    pub fn matrices(&self, name: &str) -> Result<Vec<Vec<Vec<f64>>>> {
        self.to_array(self.get(name)?, name)?
            .iter()
            .map(|v| self.to_matrix(v, name))
            .collect()
    }

    /// List of vectors, e.g. `intercepts_`
    pub fn vectors(&self, name: &str) -> Result<Vec<Vec<f64>>> {
        self.to_matrix(self.get(name)?, name)
    }

    pub fn to_array(&self, value: &'a Value, name: &str) -> Result<&'a Vec<Value>> {
        value
            .as_array()
            .ok_or_else(|| self.fail(format!("`{}` must be an array", name)))
    }

    pub fn to_f64(&self, value: &Value, name: &str) -> Result<f64> {
        value
            .as_f64()
            .ok_or_else(|| self.fail(format!("`{}` must hold numbers", name)))
    }

    fn to_i64(&self, value: &Value, name: &str) -> Result<i64> {
        if let Some(i) = value.as_i64() {
            return Ok(i);
        }
        match value.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
            _ => Err(self.fail(format!("`{}` must hold integers", name))),
        }
    }

    fn to_usize(&self, value: &Value, name: &str) -> Result<usize> {
        let i = self.to_i64(value, name)?;
        usize::try_from(i).map_err(|_| self.fail(format!("`{}` must be non-negative", name)))
    }

    /// Counts and indices: integral and non-negative
    pub fn to_vec_usize(&self, value: &'a Value, name: &str) -> Result<Vec<usize>> {
        self.to_array(value, name)?
            .iter()
            .map(|v| self.to_usize(v, name))
            .collect()
    }

    pub fn to_vec_f64(&self, value: &Value, name: &str) -> Result<Vec<f64>> {
        value
            .as_array()
            .ok_or_else(|| self.fail(format!("`{}` must be an array", name)))?
            .iter()
            .map(|v| self.to_f64(v, name))
            .collect()
    }

    pub fn to_matrix(&self, value: &Value, name: &str) -> Result<Vec<Vec<f64>>> {
        value
            .as_array()
            .ok_or_else(|| self.fail(format!("`{}` must be a 2-d array", name)))?
            .iter()
            .map(|row| self.to_vec_f64(row, name))
            .collect()
    }
}
