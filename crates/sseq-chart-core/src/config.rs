use crate::page_property::{INFINITY, PageRange};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Loosely-typed chart configuration, as read from a JSON file.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig(Value);

impl Default for ChartConfig {
    fn default() -> Self {
        Self::empty_object()
    }
}

impl ChartConfig {
    pub fn empty_object() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn get(&self, dotted_path: &str) -> Option<&Value> {
        let mut cur = &self.0;
        for segment in dotted_path.split('.') {
            cur = cur.as_object()?.get(segment)?;
        }
        Some(cur)
    }

    pub fn get_str(&self, dotted_path: &str) -> Option<&str> {
        self.get(dotted_path)?.as_str()
    }

    pub fn get_bool(&self, dotted_path: &str) -> Option<bool> {
        self.get(dotted_path)?.as_bool()
    }

    pub fn get_i64(&self, dotted_path: &str) -> Option<i64> {
        self.get(dotted_path)?.as_i64()
    }

    pub fn get_f64(&self, dotted_path: &str) -> Option<f64> {
        self.get(dotted_path)?.as_f64()
    }

    pub fn set_value(&mut self, dotted_path: &str, value: Value) {
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }
        let Value::Object(ref mut root) = self.0 else {
            return;
        };
        let mut cur: &mut Map<String, Value> = root;
        let mut segments = dotted_path.split('.').peekable();
        while let Some(seg) = segments.next() {
            if segments.peek().is_none() {
                cur.insert(seg.to_string(), value);
                return;
            }
            let slot = cur.entry(seg).or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Some(next) = slot.as_object_mut() else {
                return;
            };
            cur = next;
        }
    }

    pub fn deep_merge(&mut self, other: &Value) {
        deep_merge_value(&mut self.0, other);
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}

/// Global, chart-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSettings {
    pub name: String,
    pub num_gradings: usize,
    pub offset_size: f64,
    pub page_list: Vec<PageRange>,
    pub initial_x_range: [i32; 2],
    pub initial_y_range: [i32; 2],
    pub x_range: [i32; 2],
    pub y_range: [i32; 2],
    pub x_projection: Vec<i32>,
    pub y_projection: Vec<i32>,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self::new("", 2)
    }
}

impl ChartSettings {
    pub const DEFAULT_OFFSET_SIZE: f64 = 45.0;

    /// Defaults: degrees project onto their first two coordinates.
    pub fn new(name: impl Into<String>, num_gradings: usize) -> Self {
        let unit = |axis: usize| -> Vec<i32> {
            (0..num_gradings).map(|i| i32::from(i == axis)).collect()
        };
        Self {
            name: name.into(),
            num_gradings,
            offset_size: Self::DEFAULT_OFFSET_SIZE,
            page_list: vec![[2, INFINITY], [INFINITY, INFINITY]],
            initial_x_range: [0, 10],
            initial_y_range: [0, 10],
            x_range: [0, 10],
            y_range: [0, 10],
            x_projection: unit(0),
            y_projection: unit(1),
        }
    }

    pub fn from_config(config: &ChartConfig) -> Result<Self> {
        let num_gradings = match config.get_i64("num_gradings") {
            Some(n) => usize::try_from(n).map_err(|_| Error::InvalidSetting {
                key: "num_gradings",
                message: format!("expected a non-negative integer, found {n}"),
            })?,
            None => 2,
        };
        let defaults = Self::new(config.get_str("name").unwrap_or_default(), num_gradings);
        match config.as_value() {
            Value::Object(fields) => defaults.overlay(fields),
            _ => Ok(defaults),
        }
    }

    /// Returns these settings with every recognized key of `fields` assigned over them.
    ///
    /// Unrecognized keys are ignored. The result is validated.
    pub fn overlay(&self, fields: &Map<String, Value>) -> Result<Self> {
        let mut current = serde_json::to_value(self)?;
        if let Value::Object(slots) = &mut current {
            for (key, value) in fields {
                match slots.get_mut(key) {
                    Some(slot) => *slot = value.clone(),
                    None => tracing::trace!(key = key.as_str(), "ignoring unknown chart field"),
                }
            }
        }
        let next: Self = serde_json::from_value(current)?;
        next.validate()?;
        Ok(next)
    }

    pub fn validate(&self) -> Result<()> {
        let projections = [
            ("x_projection", &self.x_projection),
            ("y_projection", &self.y_projection),
        ];
        for (axis, projection) in projections {
            if projection.len() != self.num_gradings {
                return Err(Error::ProjectionArity {
                    axis,
                    found: projection.len(),
                    num_gradings: self.num_gradings,
                });
            }
        }
        Ok(())
    }

    /// Plane position of `degree`: its dot products with the two projections.
    pub fn project(&self, degree: &[i32]) -> (i64, i64) {
        let dot = |projection: &[i32]| -> i64 {
            projection
                .iter()
                .zip(degree)
                .map(|(&p, &d)| i64::from(p) * i64::from(d))
                .sum()
        };
        (dot(&self.x_projection), dot(&self.y_projection))
    }
}
