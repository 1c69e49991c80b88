//! Recipe system for declarative layer composition.
//!
//! Recipes are YAML files that stack mosaics. Each layer names a tiling
//! file, the figure for each of its tiles, and a drawing style.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use girih::render::parse_color;
use girih::{
    Color, Faces, Figure, HankinInference, InferMode, InferParams, IrregularFigure, Map, MapCache, Mosaic,
    Rect, Style, SvgSurface, TileId, TileShape, Transform, load_tiling,
};

/// A complete recipe defining a layered composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Recipe name/title
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Output image configuration
    pub canvas: Canvas,

    /// Part of the plane to show, in tiling units
    #[serde(default)]
    pub region: Region,

    /// Default style applied to all layers (can be overridden)
    #[serde(default)]
    pub defaults: LayerStyle,

    /// Ordered list of layers (rendered bottom to top)
    pub layers: Vec<Layer>,
}

/// Output image configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Canvas {
    /// Width in pixels
    pub width: f64,

    /// Height in pixels
    pub height: f64,

    /// Background color (default: white)
    #[serde(default = "default_background")]
    pub background: String,
}

fn default_background() -> String {
    "white".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Region {
    fn default() -> Self {
        Self {
            x: -3.0,
            y: -3.0,
            width: 6.0,
            height: 6.0,
        }
    }
}

impl Region {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// A single mosaic layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    /// Layer name (for identification)
    pub name: String,

    /// Tiling file, relative to the recipe
    pub tiling: PathBuf,

    /// Figure for each tile, in the tiling's tile order
    #[serde(default)]
    pub figures: Vec<FigureEntry>,

    /// Layer style (merged with defaults)
    #[serde(default)]
    pub style: LayerStyle,

    /// Extra placement of the whole layer, `[m11, m12, m21, m22, m31, m32]`
    #[serde(default)]
    pub transform: Option<[f64; 6]>,

    /// Whether this layer is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// How a radial figure is run out to its tile border: `extend: true` picks
/// the scale at which neighbouring tips connect, a number gives it directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Extension {
    Connect(bool),
    Scale(f64),
}

/// What to put in one tile. `n` defaults to the tile's side count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FigureEntry {
    Star {
        #[serde(default)]
        n: Option<usize>,
        d: f64,
        #[serde(default = "default_s")]
        s: usize,
        #[serde(default)]
        extend: Option<Extension>,
    },
    Rosette {
        #[serde(default)]
        n: Option<usize>,
        #[serde(default)]
        q: f64,
        #[serde(default = "default_s")]
        s: usize,
        #[serde(default)]
        extend: Option<Extension>,
    },
    Infer {
        mode: String,
        #[serde(default)]
        q: Option<f64>,
        #[serde(default)]
        d: Option<f64>,
        #[serde(default)]
        s: Option<usize>,
    },
    Empty,
}

fn default_s() -> usize {
    1
}

impl FigureEntry {
    /// The figure for a tile of the given shape, or `None` for an empty tile.
    pub fn to_figure(&self, shape: &TileShape) -> Result<Option<Figure>> {
        let radial_n = |n: &Option<usize>| -> Result<usize> {
            match (n, shape) {
                (Some(n), _) => Ok(*n),
                (None, TileShape::Regular(sides)) => Ok(*sides),
                (None, TileShape::Polygon(_)) => bail!("radial figure on an irregular tile needs an explicit `n`"),
            }
        };
        let figure = match self {
            FigureEntry::Star { n, d, s, extend } => {
                with_extension(Figure::star(radial_n(n)?, *d, *s), *extend)
            }
            FigureEntry::Rosette { n, q, s, extend } => {
                with_extension(Figure::rosette(radial_n(n)?, *q, *s), *extend)
            }
            FigureEntry::Infer { mode, q, d, s } => {
                let Some(mode) = InferMode::from_name(mode) else {
                    bail!("unknown inference mode '{}'", mode);
                };
                let defaults = InferParams::default();
                let params = InferParams {
                    q: q.unwrap_or(defaults.q),
                    d: d.unwrap_or(defaults.d),
                    s: s.unwrap_or(defaults.s),
                };
                Figure::Irregular(IrregularFigure::new(shape.polygon(), mode, params))
            }
            FigureEntry::Empty => return Ok(None),
        };
        Ok(Some(figure))
    }
}

fn with_extension(figure: Figure, extend: Option<Extension>) -> Figure {
    match extend {
        Some(Extension::Connect(true)) => figure.extended_to_border(),
        Some(Extension::Scale(k)) => figure.extended(k),
        Some(Extension::Connect(false)) | None => figure,
    }
}

/// Style properties for a layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    /// Style name (plain, thick, outline, filled, interlace, emboss)
    #[serde(default)]
    pub kind: Option<String>,

    /// Band or line color
    #[serde(default)]
    pub color: Option<String>,

    /// Band or line width, in tiling units
    #[serde(default)]
    pub width: Option<f64>,

    /// Outline color
    #[serde(default)]
    pub outline: Option<String>,

    /// Outline width
    #[serde(default)]
    pub outline_width: Option<f64>,

    /// Interlace gap at under-crossings
    #[serde(default)]
    pub gap: Option<f64>,

    /// Emboss light direction (degrees)
    #[serde(default)]
    pub light_angle: Option<f64>,

    /// Filled face colors
    #[serde(default)]
    pub inside: Option<String>,
    #[serde(default)]
    pub outside: Option<String>,
    #[serde(default)]
    pub odd: Option<String>,
}

impl LayerStyle {
    /// Merge this style with defaults, preferring self's values.
    pub fn merge_with(&self, defaults: &LayerStyle) -> LayerStyle {
        LayerStyle {
            kind: self.kind.clone().or_else(|| defaults.kind.clone()),
            color: self.color.clone().or_else(|| defaults.color.clone()),
            width: self.width.or(defaults.width),
            outline: self.outline.clone().or_else(|| defaults.outline.clone()),
            outline_width: self.outline_width.or(defaults.outline_width),
            gap: self.gap.or(defaults.gap),
            light_angle: self.light_angle.or(defaults.light_angle),
            inside: self.inside.clone().or_else(|| defaults.inside.clone()),
            outside: self.outside.clone().or_else(|| defaults.outside.clone()),
            odd: self.odd.clone().or_else(|| defaults.odd.clone()),
        }
    }

    /// The named style with any overrides applied.
    pub fn to_style(&self) -> Result<Style> {
        let name = self.kind.as_deref().unwrap_or("thick");
        let Some(mut style) = Style::default_named(name) else {
            bail!("unknown style '{}' (expected one of: {})", name, Style::names().join(", "));
        };

        let color = color_field(&self.color)?;
        let outline = color_field(&self.outline)?;
        match &mut style {
            Style::Plain { color: c, width: w } | Style::Thick { color: c, width: w } => {
                override_with(c, color);
                override_with(w, self.width);
            }
            Style::Outline {
                color: c,
                width: w,
                outline: o,
                outline_width: ow,
            } => {
                override_with(c, color);
                override_with(w, self.width);
                override_with(o, outline);
                override_with(ow, self.outline_width);
            }
            Style::Filled { inside, outside, odd } => {
                if let Some(c) = color_field(&self.inside)? {
                    *inside = Some(c);
                }
                if let Some(c) = color_field(&self.outside)? {
                    *outside = Some(c);
                }
                if let Some(c) = color_field(&self.odd)? {
                    *odd = Some(c);
                }
            }
            Style::Interlace {
                color: c,
                width: w,
                gap,
                outline: o,
                outline_width: ow,
            } => {
                override_with(c, color);
                override_with(w, self.width);
                override_with(gap, self.gap);
                override_with(o, outline);
                override_with(ow, self.outline_width);
            }
            Style::Emboss {
                color: c,
                width: w,
                light_angle,
            } => {
                override_with(c, color);
                override_with(w, self.width);
                override_with(light_angle, self.light_angle.map(f64::to_radians));
            }
        }
        Ok(style)
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn color_field(value: &Option<String>) -> Result<Option<Color>> {
    match value {
        None => Ok(None),
        Some(text) => match parse_color(text) {
            Some(c) => Ok(Some(c)),
            None => bail!("invalid color '{}'", text),
        },
    }
}

/// Result of rendering a recipe.
pub struct RenderedRecipe {
    pub name: String,
    pub canvas: Canvas,
    pub view: Rect,
    pub layers: Vec<RenderedLayer>,
}

/// A rendered layer with its map and style.
pub struct RenderedLayer {
    pub name: String,
    pub map: Map,
    pub style: Style,
}

impl Recipe {
    /// Load a recipe from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("failed to read recipe file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("failed to parse recipe {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Build every enabled layer. Tiling paths resolve against `base`.
    pub fn render(&self, base: &Path) -> Result<RenderedRecipe> {
        let region = self.region.rect();
        let mut cache = MapCache::new();
        let mut layers = Vec::new();

        for layer in &self.layers {
            if !layer.enabled {
                continue;
            }
            let style = layer.style.merge_with(&self.defaults).to_style()?;
            let tiling = load_tiling(base.join(&layer.tiling))?;

            let mut mosaic = Mosaic::new(tiling);
            let shapes: Vec<TileShape> = mosaic.tiling().tiles().iter().map(|t| t.shape.clone()).collect();
            if layer.figures.len() > shapes.len() {
                warn!(
                    layer = %layer.name,
                    extra = layer.figures.len() - shapes.len(),
                    "more figures than tiles; extras ignored"
                );
            }
            for (index, (entry, shape)) in layer.figures.iter().zip(&shapes).enumerate() {
                let figure = entry
                    .to_figure(shape)
                    .with_context(|| format!("layer '{}', tile {}", layer.name, index))?;
                if let Some(figure) = figure {
                    mosaic.assign_new(TileId(index), figure);
                }
            }

            let placement = layer.transform.map(Transform::from_parameters).unwrap_or_default();
            let local_region = match placement.invert() {
                Some(inverse) => region.transformed(&inverse),
                None => bail!("layer '{}' has a singular transform", layer.name),
            };
            let map = mosaic
                .construct(&local_region, &mut cache, &HankinInference)
                .transformed(&placement);

            info!(
                layer = %layer.name,
                tiling = %mosaic.tiling().name,
                edges = map.edge_count(),
                "layer built"
            );
            layers.push(RenderedLayer {
                name: layer.name.clone(),
                map,
                style,
            });
        }

        Ok(RenderedRecipe {
            name: self.name.clone(),
            canvas: self.canvas.clone(),
            view: fit_aspect(&region, self.canvas.width / self.canvas.height),
            layers,
        })
    }
}

/// `region` grown in one direction so its aspect ratio is `aspect`.
pub fn fit_aspect(region: &Rect, aspect: f64) -> Rect {
    if !(aspect.is_finite() && aspect > 0.0) || region.height <= 0.0 {
        return *region;
    }
    let c = region.center();
    let (w, h) = if region.width / region.height < aspect {
        (region.height * aspect, region.height)
    } else {
        (region.width, region.width / aspect)
    };
    Rect::new(c.x - w / 2.0, c.y - h / 2.0, w, h)
}

impl RenderedRecipe {
    /// Export to SVG string.
    pub fn to_svg(&self) -> Result<String> {
        let background = parse_color(&self.canvas.background)
            .with_context(|| format!("invalid background color '{}'", self.canvas.background))?;
        let mut surface = SvgSurface::new();
        for layer in &self.layers {
            layer.style.draw(&layer.map, &mut surface);
        }
        Ok(surface.finish(&self.view, Some(background), Some(self.canvas.width)))
    }

    /// Faces check for every filled layer.
    pub fn verify(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for layer in &self.layers {
            if let Err(err) = Faces::build(&layer.map).verify() {
                problems.push(format!("{}: {}", layer.name, err));
            }
        }
        problems
    }

    /// Edge lists per layer, for downstream tools.
    pub fn to_json(&self) -> serde_json::Value {
        let layers: Vec<serde_json::Value> = self
            .layers
            .iter()
            .map(|layer| {
                let edges: Vec<[f64; 4]> = layer
                    .map
                    .edges()
                    .iter()
                    .map(|e| [e.p1.x, e.p1.y, e.p2.x, e.p2.y])
                    .collect();
                serde_json::json!({
                    "name": layer.name,
                    "style": layer.style.name(),
                    "vertices": layer.map.vertex_count(),
                    "edges": edges,
                })
            })
            .collect();
        serde_json::json!({
            "name": self.name,
            "view": [self.view.x, self.view.y, self.view.width, self.view.height],
            "layers": layers,
        })
    }
}

/// Print an example recipe.
pub fn print_example() {
    println!("{}", EXAMPLE);
}

pub const EXAMPLE: &str = r##"# Example girih recipe
name: "Octagon stars"
description: "Interlaced {8/3} stars over the 4.8.8 tiling"

canvas:
  width: 800     # pixels
  height: 800
  background: "#f7f1e3"

region: { x: -2.5, y: -2.5, width: 5, height: 5 }

defaults:
  color: "#f2e8cf"
  outline: "#1a1a1a"

layers:
  - name: faces
    tiling: ../tilings/4.8.8.tiling
    figures:
      - { kind: star, d: 3, s: 2 }
      - { kind: star, d: 1.5, s: 1 }
    style:
      kind: filled
      inside: "#263b5e"
      outside: "#e9c46a"

  - name: bands
    tiling: ../tilings/4.8.8.tiling
    figures:
      - { kind: star, d: 3, s: 2 }
      - { kind: star, d: 1.5, s: 1 }
    style:
      kind: interlace
      width: 0.08
      gap: 0.02
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_parses() {
        let recipe = Recipe::parse(EXAMPLE).expect("example is valid YAML");
        assert_eq!(recipe.layers.len(), 2);
        assert_eq!(recipe.layers[0].figures[0], FigureEntry::Star { n: None, d: 3.0, s: 2, extend: None });
        assert!(recipe.layers.iter().all(|l| l.enabled));
    }

    #[test]
    fn style_merges_defaults() {
        let recipe = Recipe::parse(EXAMPLE).expect("valid");
        let style = recipe.layers[1].style.merge_with(&recipe.defaults).to_style().expect("style");
        match style {
            Style::Interlace { color, width, outline, .. } => {
                assert_eq!(color, Color::new_rgb(0xf2, 0xe8, 0xcf));
                assert_eq!(outline, Color::new_rgb(0x1a, 0x1a, 0x1a));
                assert!((width - 0.08).abs() < 1e-12);
            }
            other => panic!("unexpected style {:?}", other),
        }
    }

    #[test]
    fn unknown_style_and_color_are_errors() {
        let bad_kind = LayerStyle {
            kind: Some("pastel".into()),
            ..LayerStyle::default()
        };
        assert!(bad_kind.to_style().is_err());
        let bad_color = LayerStyle {
            color: Some("not-a-color".into()),
            ..LayerStyle::default()
        };
        assert!(bad_color.to_style().is_err());
    }

    #[test]
    fn star_takes_side_count_from_regular_tile() {
        let entry = FigureEntry::Star { n: None, d: 2.0, s: 1, extend: None };
        let figure = entry.to_figure(&TileShape::Regular(6)).expect("ok").expect("figure");
        assert_eq!(figure.symmetry(), Some(6));
    }

    #[test]
    fn extend_takes_a_flag_or_a_scale() {
        let connect: FigureEntry = serde_yaml::from_str("{ kind: star, d: 2, s: 1, extend: true }").expect("valid");
        let figure = connect.to_figure(&TileShape::Regular(8)).expect("ok").expect("figure");
        assert_eq!(figure, Figure::star(8, 2.0, 1).extended_to_border());

        let scaled: FigureEntry = serde_yaml::from_str("{ kind: rosette, q: 0.2, extend: 0.8 }").expect("valid");
        let figure = scaled.to_figure(&TileShape::Regular(6)).expect("ok").expect("figure");
        assert_eq!(figure, Figure::rosette(6, 0.2, 1).extended(0.8));

        let off: FigureEntry = serde_yaml::from_str("{ kind: star, d: 2, extend: false }").expect("valid");
        let figure = off.to_figure(&TileShape::Regular(8)).expect("ok").expect("figure");
        assert_eq!(figure.kind(), "star");
    }

    #[test]
    fn radial_on_irregular_tile_needs_n() {
        let triangle = girih::Polygon::new(vec![
            girih::Point::new(0.0, 0.0),
            girih::Point::new(1.0, 0.0),
            girih::Point::new(0.0, 1.0),
        ]);
        let entry = FigureEntry::Rosette { n: None, q: 0.0, s: 1, extend: None };
        assert!(entry.to_figure(&TileShape::Polygon(triangle)).is_err());
    }

    #[test]
    fn infer_entry_parses_mode() {
        let yaml = "{ kind: infer, mode: girih, q: 0.3 }";
        let entry: FigureEntry = serde_yaml::from_str(yaml).expect("valid");
        let figure = entry.to_figure(&TileShape::Regular(5)).expect("ok").expect("figure");
        assert_eq!(figure.kind(), "irregular");

        let bad: FigureEntry = serde_yaml::from_str("{ kind: infer, mode: spiral }").expect("valid yaml");
        assert!(bad.to_figure(&TileShape::Regular(5)).is_err());
    }

    #[test]
    fn fit_aspect_widens_or_heightens() {
        let square = Rect::new(0.0, 0.0, 2.0, 2.0);
        let wide = fit_aspect(&square, 2.0);
        assert!((wide.width - 4.0).abs() < 1e-12 && (wide.height - 2.0).abs() < 1e-12);
        assert!((wide.x + 1.0).abs() < 1e-12);
        let tall = fit_aspect(&square, 0.5);
        assert!((tall.height - 4.0).abs() < 1e-12);
    }

    #[test]
    fn bundled_recipe_renders() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../recipes");
        let recipe = Recipe::load(dir.join("octagons.yaml")).expect("recipe loads");
        let rendered = recipe.render(&dir).expect("renders");
        assert_eq!(rendered.layers.len(), 2);
        assert!(rendered.layers.iter().all(|l| !l.map.is_empty()));
        let svg = rendered.to_svg().expect("svg");
        assert!(svg.contains("<polygon"));
        let json = rendered.to_json();
        assert_eq!(json["layers"].as_array().map(|a| a.len()), Some(2));
    }
}
