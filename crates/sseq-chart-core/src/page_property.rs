//! Page-valued properties.
//!
//! A [`PageProperty`] is a step function from pages to values, stored as a list of breakpoints
//! `(page, value)`. The first breakpoint always sits at `-INFINITY`, so every page has a value,
//! and no two adjacent breakpoints carry equal values.
//!
//! On the wire a property that never changes is just its value; anything else is
//! `{"type": "PageProperty", "values": [[page, value], ...]}`.

use crate::{Error, Result};
use serde::de::{DeserializeOwned, Error as _};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::ops::{Bound, RangeBounds};

/// A page of the spectral sequence. `INFINITY` and `-INFINITY` are the sentinels.
pub type Page = i32;

/// `[lo, hi]` pair of pages selectable for display.
pub type PageRange = [Page; 2];

/// The "infinity" page. Shared with producers, which encode it as the same integer.
pub const INFINITY: Page = 65_535;

#[derive(Debug, Clone, PartialEq)]
pub struct PageProperty<V> {
    values: Vec<(Page, V)>,
}

impl<V: Clone + PartialEq> PageProperty<V> {
    /// A property that holds `value` on every page.
    pub fn new(value: V) -> Self {
        Self {
            values: vec![(-INFINITY, value)],
        }
    }

    /// Builds a property from raw breakpoints.
    ///
    /// Breakpoints must be non-empty, start at `-INFINITY` and be strictly increasing in page.
    /// Redundant breakpoints are merged.
    pub fn from_breakpoints(values: Vec<(Page, V)>) -> Result<Self> {
        let Some(&(first, _)) = values.first() else {
            return Err(Error::InvalidPageProperty {
                message: "a page property needs at least one breakpoint".to_string(),
            });
        };
        if first != -INFINITY {
            return Err(Error::InvalidPageProperty {
                message: format!("first breakpoint is at page {first}, expected {}", -INFINITY),
            });
        }
        if let Some(w) = values.windows(2).find(|w| w[0].0 >= w[1].0) {
            return Err(Error::InvalidPageProperty {
                message: format!(
                    "breakpoints must be strictly increasing (page {} is followed by page {})",
                    w[0].0, w[1].0
                ),
            });
        }
        let mut result = Self { values };
        result.merge_redundant();
        Ok(result)
    }

    pub fn breakpoints(&self) -> &[(Page, V)] {
        &self.values
    }

    /// `true` when the property holds the same value on every page.
    pub fn is_constant(&self) -> bool {
        self.values.len() == 1
    }

    /// The value in effect on `page`.
    pub fn get(&self, page: Page) -> &V {
        let (idx, _) = self.find_index(page);
        &self.values[idx].1
    }

    /// Writes `value` at the breakpoint for `page`.
    ///
    /// The new value holds from `page` up to the next existing breakpoint. Use
    /// [`PageProperty::set_range`] to confine a change to an explicit range of pages.
    pub fn set_point(&mut self, page: Page, value: V) {
        self.set_item_single(page.max(-INFINITY), value);
        self.merge_redundant();
    }

    /// Assigns `value` to every page in `range`.
    ///
    /// Pages past the end of the range keep the value they had before the call. An unbounded
    /// end covers every page from the start upward, `INFINITY` included.
    pub fn set_range(&mut self, range: impl RangeBounds<Page>, value: V) {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => -INFINITY,
        }
        .max(-INFINITY);
        let stop = match range.end_bound() {
            Bound::Included(&s) => s.checked_add(1),
            Bound::Excluded(&s) => Some(s),
            Bound::Unbounded => None,
        }
        .filter(|&s| s <= INFINITY);

        if stop.is_some_and(|stop| stop <= start) {
            return;
        }
        tracing::trace!(start, ?stop, "page property range assignment");

        let orig_value = stop.map(|stop| self.get(stop).clone());
        let start_idx = self.set_item_single(start, value);
        let end_idx = match (stop, orig_value) {
            (Some(stop), Some(orig_value)) => match self.find_index(stop) {
                (idx, true) => idx,
                _ => self.set_item_single(stop, orig_value),
            },
            _ => self.values.len(),
        };
        self.values.drain(start_idx + 1..end_idx);
        self.merge_redundant();
    }

    /// Returns a property with the same breakpoints and mapped values.
    pub fn map<U: Clone + PartialEq>(&self, mut f: impl FnMut(&V) -> U) -> PageProperty<U> {
        let mut result = PageProperty {
            values: self.values.iter().map(|(p, v)| (*p, f(v))).collect(),
        };
        result.merge_redundant();
        result
    }

    /// Index of the last breakpoint at or before `target`, and whether it sits exactly there.
    fn find_index(&self, target: Page) -> (usize, bool) {
        let idx = self
            .values
            .partition_point(|(page, _)| *page <= target)
            .saturating_sub(1);
        (idx, self.values[idx].0 == target)
    }

    fn set_item_single(&mut self, page: Page, value: V) -> usize {
        match self.find_index(page) {
            (idx, true) => {
                self.values[idx].1 = value;
                idx
            }
            (idx, false) => {
                self.values.insert(idx + 1, (page, value));
                idx + 1
            }
        }
    }

    fn merge_redundant(&mut self) {
        self.values.dedup_by(|later, earlier| later.1 == earlier.1);
    }
}

impl<V: Clone + PartialEq + Default> Default for PageProperty<V> {
    fn default() -> Self {
        Self::new(V::default())
    }
}

impl<V: Clone + PartialEq> From<V> for PageProperty<V> {
    fn from(value: V) -> Self {
        Self::new(value)
    }
}

impl<V: Serialize> Serialize for PageProperty<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if let [(_, value)] = self.values.as_slice() {
            return value.serialize(serializer);
        }
        let mut state = serializer.serialize_struct("PageProperty", 2)?;
        state.serialize_field("type", "PageProperty")?;
        state.serialize_field("values", &self.values)?;
        state.end()
    }
}

impl<'de, V> Deserialize<'de> for PageProperty<V>
where
    V: Clone + PartialEq + DeserializeOwned,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.get("type").and_then(Value::as_str) != Some("PageProperty") {
            return V::deserialize(value).map(Self::new).map_err(D::Error::custom);
        }
        // Older producers used `data` for the breakpoint list.
        let raw = value
            .get("values")
            .or_else(|| value.get("data"))
            .cloned()
            .ok_or_else(|| D::Error::missing_field("values"))?;
        let values: Vec<(Page, V)> = serde_json::from_value(raw).map_err(D::Error::custom)?;
        Self::from_breakpoints(values).map_err(D::Error::custom)
    }
}
