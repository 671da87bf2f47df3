use crate::chart::SseqChart;
use crate::message::TargetType;
use crate::page_property::{INFINITY, Page, PageProperty};
use crate::style::{Color, Shape};
use crate::{Error, Result};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Fields accepted by the class constructor and by `update` messages targeting a class.
///
/// Every field is optional. Cosmetic fields take either a bare value or a serialized
/// [`PageProperty`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChartClassArgs {
    #[serde(rename = "type")]
    pub ty: Option<String>,
    pub degree: Option<Vec<i32>>,
    pub idx: Option<usize>,
    pub uuid: Option<Uuid>,
    pub name: Option<PageProperty<String>>,
    pub max_page: Option<Page>,
    pub shape: Option<PageProperty<Shape>>,
    pub background_color: Option<PageProperty<Color>>,
    pub border_color: Option<PageProperty<Color>>,
    pub border_width: Option<PageProperty<f64>>,
    pub foreground_color: Option<PageProperty<Color>>,
    pub scale: Option<PageProperty<f64>>,
    pub visible: Option<PageProperty<bool>>,
    pub x_nudge: Option<PageProperty<f64>>,
    pub y_nudge: Option<PageProperty<f64>>,
    pub user_data: Option<Map<String, Value>>,
    pub extra_tooltip: Option<String>,
}

impl ChartClassArgs {
    pub fn at_degree(degree: impl Into<Vec<i32>>) -> Self {
        Self {
            degree: Some(degree.into()),
            ..Self::default()
        }
    }
}

/// A point of the chart.
///
/// `uuid` and `degree` never change after construction. `idx` and the plane position are
/// assigned when the class is committed into a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartClass {
    uuid: Uuid,
    degree: Vec<i32>,
    idx: Option<usize>,
    x: i64,
    y: i64,
    pub max_page: Page,
    pub name: PageProperty<String>,
    pub shape: PageProperty<Shape>,
    pub background_color: PageProperty<Color>,
    pub border_color: PageProperty<Color>,
    pub border_width: PageProperty<f64>,
    pub foreground_color: PageProperty<Color>,
    pub scale: PageProperty<f64>,
    pub visible: PageProperty<bool>,
    pub x_nudge: PageProperty<f64>,
    pub y_nudge: PageProperty<f64>,
    pub user_data: Map<String, Value>,
    pub extra_tooltip: Option<String>,
}

impl ChartClass {
    pub fn new(args: ChartClassArgs) -> Result<Self> {
        let Some(degree) = args.degree else {
            return Err(Error::MissingField {
                target: "ChartClass",
                field: "degree",
            });
        };
        if let Some(ty) = args.ty.as_deref() {
            let actual = TargetType::parse(ty)?;
            if actual != TargetType::ChartClass {
                return Err(Error::TypeMismatch {
                    command: "create",
                    claimed: TargetType::ChartClass,
                    actual,
                });
            }
        }
        Ok(Self {
            uuid: args.uuid.unwrap_or_else(Uuid::new_v4),
            degree,
            idx: args.idx,
            x: 0,
            y: 0,
            max_page: args.max_page.unwrap_or(INFINITY),
            name: args.name.unwrap_or_default(),
            shape: args.shape.unwrap_or_default(),
            background_color: args.background_color.unwrap_or_default(),
            border_color: args.border_color.unwrap_or_default(),
            border_width: args.border_width.unwrap_or(PageProperty::new(3.0)),
            foreground_color: args.foreground_color.unwrap_or_default(),
            scale: args.scale.unwrap_or(PageProperty::new(1.0)),
            visible: args.visible.unwrap_or(PageProperty::new(true)),
            x_nudge: args.x_nudge.unwrap_or_default(),
            y_nudge: args.y_nudge.unwrap_or_default(),
            user_data: args.user_data.unwrap_or_default(),
            extra_tooltip: args.extra_tooltip,
        })
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Self::new(serde_json::from_value(value)?)
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn degree(&self) -> &[i32] {
        &self.degree
    }

    /// Position among the classes sharing this degree. `None` until committed.
    pub fn idx(&self) -> Option<usize> {
        self.idx
    }

    pub fn x(&self) -> i64 {
        self.x
    }

    pub fn y(&self) -> i64 {
        self.y
    }

    pub(crate) fn place(&mut self, idx: usize, x: i64, y: i64) {
        self.idx = Some(idx);
        self.x = x;
        self.y = y;
    }

    /// Applies the present fields of an `update` message.
    ///
    /// `uuid`, `degree`, `type` and `idx` identify the class and must agree with the current
    /// values. Any other present field replaces the current one, falsy values included.
    pub fn update(&mut self, args: ChartClassArgs) -> Result<()> {
        if args.uuid.is_some_and(|uuid| uuid != self.uuid) {
            return Err(self.inconsistent("uuid"));
        }
        if args.degree.as_ref().is_some_and(|d| *d != self.degree) {
            return Err(self.inconsistent("degree"));
        }
        if let Some(ty) = args.ty.as_deref() {
            if TargetType::parse(ty)? != TargetType::ChartClass {
                return Err(self.inconsistent("type"));
            }
        }
        if args.idx.is_some_and(|idx| Some(idx) != self.idx) {
            return Err(self.inconsistent("idx"));
        }

        if let Some(max_page) = args.max_page {
            self.max_page = max_page;
        }
        if let Some(name) = args.name {
            self.name = name;
        }
        if let Some(shape) = args.shape {
            self.shape = shape;
        }
        if let Some(color) = args.background_color {
            self.background_color = color;
        }
        if let Some(color) = args.border_color {
            self.border_color = color;
        }
        if let Some(width) = args.border_width {
            self.border_width = width;
        }
        if let Some(color) = args.foreground_color {
            self.foreground_color = color;
        }
        if let Some(scale) = args.scale {
            self.scale = scale;
        }
        if let Some(visible) = args.visible {
            self.visible = visible;
        }
        if let Some(nudge) = args.x_nudge {
            self.x_nudge = nudge;
        }
        if let Some(nudge) = args.y_nudge {
            self.y_nudge = nudge;
        }
        if let Some(user_data) = args.user_data {
            self.user_data = user_data;
        }
        if let Some(extra) = args.extra_tooltip {
            self.extra_tooltip = Some(extra);
        }
        Ok(())
    }

    fn inconsistent(&self, field: &'static str) -> Error {
        Error::Inconsistent {
            uuid: self.uuid,
            field,
        }
    }

    pub fn draw_on_page_q(&self, page: Page) -> bool {
        page <= self.max_page && *self.visible.get(page)
    }

    pub fn in_range_q(&self, xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> bool {
        let (x, y) = (self.x as f64, self.y as f64);
        xmin <= x && x <= xmax && ymin <= y && y <= ymax
    }

    /// Horizontal offset from the center of the degree, laying out its classes side by side.
    pub fn x_offset(&self, chart: &SseqChart, page: Page) -> f64 {
        let num_classes = chart.degree_bucket_len(&self.degree) as f64;
        let idx = self.idx.map_or(f64::NAN, |idx| idx as f64);
        let mut offset = (idx - (num_classes - 1.0) / 2.0) * chart.settings().offset_size;
        if !offset.is_finite() {
            tracing::warn!(uuid = %self.uuid, idx = ?self.idx, "invalid x offset for class");
            offset = 0.0;
        }
        offset + *self.x_nudge.get(page)
    }

    pub fn y_offset(&self, page: Page) -> f64 {
        *self.y_nudge.get(page)
    }

    /// `\(\large name\)&nbsp;&mdash;&nbsp;(x, y)`, without the name part when it is empty.
    pub fn name_coord(&self, page: Page) -> String {
        let name = self.name.get(page);
        let mut tooltip = String::new();
        if !name.is_empty() {
            tooltip.push_str(&format!("\\(\\large {name}\\)&nbsp;&mdash;&nbsp;"));
        }
        tooltip.push_str(&format!("({}, {})", self.x, self.y));
        tooltip
    }

    pub fn tooltip(&self, page: Page) -> String {
        let mut tooltip = self.name_coord(page);
        if let Some(extra) = &self.extra_tooltip {
            tooltip.push_str(extra);
        }
        tooltip
    }
}

impl Serialize for ChartClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ChartClass", 17)?;
        state.serialize_field("type", TargetType::ChartClass.as_str())?;
        state.serialize_field("degree", &self.degree)?;
        state.serialize_field("idx", &self.idx)?;
        state.serialize_field("uuid", &self.uuid)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("max_page", &self.max_page)?;
        state.serialize_field("shape", &self.shape)?;
        state.serialize_field("background_color", &self.background_color)?;
        state.serialize_field("border_color", &self.border_color)?;
        state.serialize_field("border_width", &self.border_width)?;
        state.serialize_field("foreground_color", &self.foreground_color)?;
        state.serialize_field("scale", &self.scale)?;
        state.serialize_field("visible", &self.visible)?;
        state.serialize_field("x_nudge", &self.x_nudge)?;
        state.serialize_field("y_nudge", &self.y_nudge)?;
        state.serialize_field("user_data", &self.user_data)?;
        if let Some(extra) = &self.extra_tooltip {
            state.serialize_field("extra_tooltip", extra)?;
        } else {
            state.skip_field("extra_tooltip")?;
        }
        state.end()
    }
}
