use crate::chart::SseqChart;
use crate::message::TargetType;
use crate::page_property::{INFINITY, Page, PageProperty, PageRange};
use crate::style::{self, ArrowTip, Color, DashPattern, EdgeStyle};
use crate::{Error, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Fields accepted by the edge constructors and by `update` messages targeting an edge.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EdgeArgs {
    #[serde(rename = "type")]
    pub ty: Option<String>,
    pub uuid: Option<Uuid>,
    pub source_uuid: Option<Uuid>,
    pub target_uuid: Option<Uuid>,
    pub user_data: Option<Map<String, Value>>,
    /// Differentials only.
    pub page: Option<Page>,
    #[serde(deserialize_with = "style::present")]
    pub start_tip: Option<PageProperty<ArrowTip>>,
    #[serde(deserialize_with = "style::present")]
    pub end_tip: Option<PageProperty<ArrowTip>>,
    pub bend: Option<PageProperty<f64>>,
    pub color: Option<PageProperty<Color>>,
    pub dash_pattern: Option<PageProperty<DashPattern>>,
    pub line_width: Option<PageProperty<f64>>,
    pub visible: Option<PageProperty<bool>>,
    pub action: Option<PageProperty<String>>,
}

impl EdgeArgs {
    pub fn between(source_uuid: Uuid, target_uuid: Uuid) -> Self {
        Self {
            source_uuid: Some(source_uuid),
            target_uuid: Some(target_uuid),
            ..Self::default()
        }
    }

    pub fn on_page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }
}

/// Page-dependent style of a structline.
#[derive(Debug, Clone, PartialEq)]
pub struct StructlineStyle {
    pub start_tip: PageProperty<ArrowTip>,
    pub end_tip: PageProperty<ArrowTip>,
    pub bend: PageProperty<f64>,
    pub color: PageProperty<Color>,
    pub dash_pattern: PageProperty<DashPattern>,
    pub line_width: PageProperty<f64>,
    pub visible: PageProperty<bool>,
    pub action: PageProperty<String>,
}

impl Default for StructlineStyle {
    fn default() -> Self {
        Self::from(EdgeStyle::default())
    }
}

impl From<EdgeStyle> for StructlineStyle {
    fn from(style: EdgeStyle) -> Self {
        Self {
            start_tip: style.start_tip.into(),
            end_tip: style.end_tip.into(),
            bend: style.bend.into(),
            color: style.color.into(),
            dash_pattern: style.dash_pattern.into(),
            line_width: style.line_width.into(),
            visible: style.visible.into(),
            action: style.action.into(),
        }
    }
}

impl StructlineStyle {
    pub fn at(&self, page: Page) -> EdgeStyle {
        EdgeStyle {
            start_tip: self.start_tip.get(page).clone(),
            end_tip: self.end_tip.get(page).clone(),
            bend: *self.bend.get(page),
            color: self.color.get(page).clone(),
            dash_pattern: self.dash_pattern.get(page).clone(),
            line_width: *self.line_width.get(page),
            visible: *self.visible.get(page),
            action: self.action.get(page).clone(),
        }
    }

    fn apply(&mut self, args: EdgeArgs) {
        if let Some(v) = args.start_tip {
            self.start_tip = v;
        }
        if let Some(v) = args.end_tip {
            self.end_tip = v;
        }
        if let Some(v) = args.bend {
            self.bend = v;
        }
        if let Some(v) = args.color {
            self.color = v;
        }
        if let Some(v) = args.dash_pattern {
            self.dash_pattern = v;
        }
        if let Some(v) = args.line_width {
            self.line_width = v;
        }
        if let Some(v) = args.visible {
            self.visible = v;
        }
        if let Some(v) = args.action {
            self.action = v;
        }
    }
}

/// Reads the single value of a style field on an edge whose style does not vary by page.
fn constant<V: Clone + PartialEq>(property: PageProperty<V>, field: &str) -> Result<V> {
    match property.breakpoints() {
        [(_, value)] => Ok(value.clone()),
        _ => Err(Error::InvalidPageProperty {
            message: format!("\"{field}\" cannot vary by page on a differential or extension"),
        }),
    }
}

fn apply_single_page(style: &mut EdgeStyle, args: EdgeArgs) -> Result<()> {
    if let Some(v) = args.start_tip {
        style.start_tip = constant(v, "start_tip")?;
    }
    if let Some(v) = args.end_tip {
        style.end_tip = constant(v, "end_tip")?;
    }
    if let Some(v) = args.bend {
        style.bend = constant(v, "bend")?;
    }
    if let Some(v) = args.color {
        style.color = constant(v, "color")?;
    }
    if let Some(v) = args.dash_pattern {
        style.dash_pattern = constant(v, "dash_pattern")?;
    }
    if let Some(v) = args.line_width {
        style.line_width = constant(v, "line_width")?;
    }
    if let Some(v) = args.visible {
        style.visible = constant(v, "visible")?;
    }
    if let Some(v) = args.action {
        style.action = constant(v, "action")?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub enum EdgeKind {
    Structline(StructlineStyle),
    Differential { page: Page, style: EdgeStyle },
    Extension(EdgeStyle),
}

/// A connection between two classes.
///
/// Endpoints are stored by uuid; the chart resolves them when the edge is committed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartEdge {
    uuid: Uuid,
    source_uuid: Uuid,
    target_uuid: Uuid,
    pub user_data: Map<String, Value>,
    kind: EdgeKind,
}

impl ChartEdge {
    pub fn structline(args: EdgeArgs) -> Result<Self> {
        Self::from_args(TargetType::ChartStructline, args)
    }

    pub fn differential(args: EdgeArgs) -> Result<Self> {
        Self::from_args(TargetType::ChartDifferential, args)
    }

    pub fn extension(args: EdgeArgs) -> Result<Self> {
        Self::from_args(TargetType::ChartExtension, args)
    }

    pub fn from_value(target_type: TargetType, value: Value) -> Result<Self> {
        Self::from_args(target_type, serde_json::from_value(value)?)
    }

    /// Builds an edge of type `target_type`. A `type` in `args` must agree with it.
    pub fn from_args(target_type: TargetType, mut args: EdgeArgs) -> Result<Self> {
        let target = target_type.as_str();
        let Some(source_uuid) = args.source_uuid else {
            return Err(Error::MissingField {
                target,
                field: "source_uuid",
            });
        };
        let Some(target_uuid) = args.target_uuid else {
            return Err(Error::MissingField {
                target,
                field: "target_uuid",
            });
        };
        if let Some(ty) = args.ty.take() {
            let actual = TargetType::parse(&ty)?;
            if actual != target_type {
                return Err(Error::TypeMismatch {
                    command: "create",
                    claimed: target_type,
                    actual,
                });
            }
        }
        let uuid = args.uuid.take().unwrap_or_else(Uuid::new_v4);
        let user_data = args.user_data.take().unwrap_or_default();

        let kind = match target_type {
            TargetType::ChartStructline => {
                let mut style = StructlineStyle::default();
                style.apply(args);
                EdgeKind::Structline(style)
            }
            TargetType::ChartDifferential => {
                let Some(page) = args.page else {
                    return Err(Error::MissingField {
                        target,
                        field: "page",
                    });
                };
                let mut style = EdgeStyle::default();
                apply_single_page(&mut style, args)?;
                EdgeKind::Differential { page, style }
            }
            TargetType::ChartExtension => {
                let mut style = EdgeStyle::default();
                apply_single_page(&mut style, args)?;
                EdgeKind::Extension(style)
            }
            TargetType::ChartClass | TargetType::SseqChart => {
                return Err(Error::UnsupportedCommand {
                    command: "create",
                    target_type,
                });
            }
        };
        Ok(Self {
            uuid,
            source_uuid,
            target_uuid,
            user_data,
            kind,
        })
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn source_uuid(&self) -> Uuid {
        self.source_uuid
    }

    pub fn target_uuid(&self) -> Uuid {
        self.target_uuid
    }

    pub fn kind(&self) -> &EdgeKind {
        &self.kind
    }

    pub fn target_type(&self) -> TargetType {
        match self.kind {
            EdgeKind::Structline(_) => TargetType::ChartStructline,
            EdgeKind::Differential { .. } => TargetType::ChartDifferential,
            EdgeKind::Extension(_) => TargetType::ChartExtension,
        }
    }

    /// The page of a differential.
    pub fn page(&self) -> Option<Page> {
        match self.kind {
            EdgeKind::Differential { page, .. } => Some(page),
            _ => None,
        }
    }

    pub fn update(&mut self, mut args: EdgeArgs) -> Result<()> {
        let inconsistent = |field| Error::Inconsistent {
            uuid: self.uuid,
            field,
        };
        if args.uuid.is_some_and(|uuid| uuid != self.uuid) {
            return Err(inconsistent("uuid"));
        }
        if args.source_uuid.is_some_and(|uuid| uuid != self.source_uuid) {
            return Err(inconsistent("source_uuid"));
        }
        if args.target_uuid.is_some_and(|uuid| uuid != self.target_uuid) {
            return Err(inconsistent("target_uuid"));
        }
        if let Some(ty) = args.ty.as_deref() {
            if TargetType::parse(ty)? != self.target_type() {
                return Err(inconsistent("type"));
            }
        }
        if args.page.is_some() && args.page != self.page() {
            return Err(inconsistent("page"));
        }

        // Convert every field before touching the edge, so a rejected update changes nothing.
        let user_data = args.user_data.take();
        match &mut self.kind {
            EdgeKind::Structline(style) => style.apply(args),
            EdgeKind::Differential { style, .. } | EdgeKind::Extension(style) => {
                let mut next = style.clone();
                apply_single_page(&mut next, args)?;
                *style = next;
            }
        }
        if let Some(user_data) = user_data {
            self.user_data = user_data;
        }
        Ok(())
    }

    /// Whether the edge should be shown when displaying `range`.
    ///
    /// A differential shows when `range` starts at 0 or contains its page. An extension shows
    /// only on the `INFINITY` range. A structline shows while it is visible and both endpoints
    /// are drawn on the first page of `range`.
    pub fn draw_on_page_q(&self, chart: &SseqChart, range: PageRange) -> bool {
        let [lo, hi] = range;
        match &self.kind {
            EdgeKind::Structline(style) => {
                let drawn = |uuid| chart.class(uuid).is_some_and(|c| c.draw_on_page_q(lo));
                *style.visible.get(lo) && drawn(self.source_uuid) && drawn(self.target_uuid)
            }
            EdgeKind::Differential { page, .. } => lo == 0 || (lo <= *page && *page <= hi),
            EdgeKind::Extension(_) => lo == INFINITY,
        }
    }

    pub fn edge_style(&self, page: Page) -> EdgeStyle {
        match &self.kind {
            EdgeKind::Structline(style) => style.at(page),
            EdgeKind::Differential { style, .. } | EdgeKind::Extension(style) => style.clone(),
        }
    }
}

impl Serialize for ChartEdge {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.target_type().as_str())?;
        map.serialize_entry("uuid", &self.uuid)?;
        map.serialize_entry("source_uuid", &self.source_uuid)?;
        map.serialize_entry("target_uuid", &self.target_uuid)?;
        match &self.kind {
            EdgeKind::Structline(style) => {
                map.serialize_entry("visible", &style.visible)?;
                map.serialize_entry("color", &style.color)?;
                map.serialize_entry("dash_pattern", &style.dash_pattern)?;
                map.serialize_entry("line_width", &style.line_width)?;
                map.serialize_entry("bend", &style.bend)?;
                map.serialize_entry("start_tip", &style.start_tip)?;
                map.serialize_entry("end_tip", &style.end_tip)?;
                map.serialize_entry("action", &style.action)?;
            }
            EdgeKind::Differential { style, .. } | EdgeKind::Extension(style) => {
                map.serialize_entry("start_tip", &style.start_tip)?;
                map.serialize_entry("end_tip", &style.end_tip)?;
                map.serialize_entry("bend", &style.bend)?;
                map.serialize_entry("color", &style.color)?;
                map.serialize_entry("dash_pattern", &style.dash_pattern)?;
                map.serialize_entry("line_width", &style.line_width)?;
                map.serialize_entry("visible", &style.visible)?;
                map.serialize_entry("action", &style.action)?;
            }
        }
        map.serialize_entry("user_data", &self.user_data)?;
        if let EdgeKind::Differential { page, .. } = self.kind {
            map.serialize_entry("page", &page)?;
        }
        map.end()
    }
}
