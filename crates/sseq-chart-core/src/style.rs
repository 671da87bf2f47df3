//! Visual attribute types shared by classes and edges.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value, json};

/// RGBA color, components in `[0, 1]`.
///
/// Written as a bare `[r, g, b, a]` array. Producers may instead send
/// `{"type": "Color", "color": "#rrggbb[aa]", "name": ...}`; a color that carries a name is
/// written back in that form.
#[derive(Debug, Clone, PartialEq)]
pub struct Color {
    pub rgba: [f64; 4],
    /// CSS color name attached by the producer.
    pub name: Option<String>,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            rgba: [r, g, b, a],
            name: None,
        }
    }

    /// Parses `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if !matches!(digits.len(), 6 | 8) || !digits.is_ascii() {
            return None;
        }
        let mut rgba = [1.0; 4];
        for (slot, i) in rgba.iter_mut().zip((0..digits.len()).step_by(2)) {
            let byte = u8::from_str_radix(&digits[i..i + 2], 16).ok()?;
            *slot = f64::from(byte) / 255.0;
        }
        Some(Self { rgba, name: None })
    }

    /// `#rrggbbaa`, channels clamped to `[0, 1]`.
    pub fn to_hex(&self) -> String {
        let mut hex = String::from("#");
        for c in self.rgba {
            let byte = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
            hex.push_str(&format!("{byte:02x}"));
        }
        hex
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Rgba([f64; 4]),
    Tagged {
        #[serde(rename = "type", default)]
        ty: Option<String>,
        color: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.name {
            None => ColorRepr::Rgba(self.rgba),
            Some(name) => ColorRepr::Tagged {
                ty: Some("Color".to_string()),
                color: self.to_hex(),
                name: Some(name.clone()),
            },
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match ColorRepr::deserialize(deserializer)? {
            ColorRepr::Rgba(rgba) => Ok(Self { rgba, name: None }),
            ColorRepr::Tagged { ty, color, name } => {
                if let Some(ty) = ty.filter(|ty| ty != "Color") {
                    return Err(D::Error::custom(format!(
                        "expected a Color, found type \"{ty}\""
                    )));
                }
                let parsed = Color::from_hex(&color)
                    .ok_or_else(|| D::Error::custom(format!("invalid hex color \"{color}\"")))?;
                Ok(Self { name, ..parsed })
            }
        }
    }
}

/// Glyph description. Interpreted by the renderer; the core only stores and compares it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shape(pub Value);

impl Default for Shape {
    fn default() -> Self {
        Shape(json!({ "ty": "empty" }))
    }
}

pub type DashPattern = Vec<f64>;

/// Arrow head at one end of an edge. `"None"` means no tip and is written as `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrowTip {
    pub tip: String,
}

impl ArrowTip {
    pub const NONE: &'static str = "None";

    pub fn none() -> Self {
        Self {
            tip: Self::NONE.to_string(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.tip == Self::NONE
    }
}

impl Default for ArrowTip {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Serialize, Deserialize)]
struct ArrowTipRepr {
    #[serde(rename = "type", default)]
    ty: Option<String>,
    #[serde(default)]
    tip: Option<String>,
}

impl Serialize for ArrowTip {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_none() {
            return serializer.serialize_none();
        }
        ArrowTipRepr {
            ty: Some("ArrowTip".to_string()),
            tip: Some(self.tip.clone()),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ArrowTip {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr: Option<ArrowTipRepr> = Option::deserialize(deserializer)?;
        Ok(match repr.and_then(|r| r.tip) {
            Some(tip) if !tip.is_empty() => ArrowTip { tip },
            _ => ArrowTip::none(),
        })
    }
}

/// Field deserializer that keeps an explicit `null` as `Some`, so that `"end_tip": null` is an
/// assignment rather than an absent field.
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

pub const DEFAULT_LINE_WIDTH: f64 = 3.0;

/// Resolved style of an edge on a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    pub start_tip: ArrowTip,
    pub end_tip: ArrowTip,
    pub bend: f64,
    pub color: Color,
    pub dash_pattern: DashPattern,
    pub line_width: f64,
    pub visible: bool,
    pub action: String,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            start_tip: ArrowTip::none(),
            end_tip: ArrowTip::none(),
            bend: 0.0,
            color: Color::BLACK,
            dash_pattern: Vec::new(),
            line_width: DEFAULT_LINE_WIDTH,
            visible: true,
            action: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tip_is_null_on_the_wire() {
        assert_eq!(serde_json::to_value(ArrowTip::none()).unwrap(), Value::Null);
        let tip = ArrowTip { tip: "vee".into() };
        assert_eq!(
            serde_json::to_value(&tip).unwrap(),
            json!({"type": "ArrowTip", "tip": "vee"})
        );
        let back: ArrowTip = serde_json::from_value(json!(null)).unwrap();
        assert!(back.is_none());
        let back: ArrowTip = serde_json::from_value(json!({"type": "ArrowTip"})).unwrap();
        assert!(back.is_none());
    }

    #[test]
    fn producer_colors_decode_from_hex() {
        let black: Color =
            serde_json::from_value(json!({"type": "Color", "color": "#000000ff", "name": "black"}))
                .unwrap();
        assert_eq!(black.rgba, Color::BLACK.rgba);
        assert_eq!(black.name.as_deref(), Some("black"));
        assert_eq!(
            serde_json::to_value(&black).unwrap(),
            json!({"type": "Color", "color": "#000000ff", "name": "black"})
        );

        let red: Color = serde_json::from_value(json!({"type": "Color", "color": "#ff0000"})).unwrap();
        assert_eq!(red, Color::rgba(1.0, 0.0, 0.0, 1.0));
        assert_eq!(serde_json::to_value(&red).unwrap(), json!([1.0, 0.0, 0.0, 1.0]));

        let half: Color = serde_json::from_value(json!({"color": "#00000080"})).unwrap();
        assert_eq!(half.to_hex(), "#00000080");

        for bad in [json!({"color": "#12345"}), json!({"type": "ArrowTip", "color": "#000000"})] {
            assert!(serde_json::from_value::<Color>(bad).is_err());
        }
    }

    #[test]
    fn default_edge_style() {
        let style = serde_json::to_value(EdgeStyle::default()).unwrap();
        assert_eq!(
            style,
            json!({
                "start_tip": null,
                "end_tip": null,
                "bend": 0.0,
                "color": [0.0, 0.0, 0.0, 1.0],
                "dash_pattern": [],
                "line_width": 3.0,
                "visible": true,
                "action": ""
            })
        );
    }
}
