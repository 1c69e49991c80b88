//! Drawing maps through an abstract surface.
//!
//! Styles only talk to a [`DrawingSurface`]; the crate ships an SVG
//! implementation in [`crate::svg`], and anything that can stroke and fill
//! polygons can implement the trait.

use std::f64::consts::{FRAC_PI_2, PI};

pub use svgtypes::Color;

use crate::faces::Faces;
use crate::geometry::{Point, Polygon, Rect};
use crate::interlace::{Interlace, InterlaceParams, fat_line};
use crate::map::Map;
use crate::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    Butt,
    #[default]
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    Miter,
    #[default]
    Round,
    Bevel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
}

impl Stroke {
    pub fn new(width: f64) -> Self {
        Self {
            width,
            cap: LineCap::default(),
            join: LineJoin::default(),
        }
    }
}

/// A 2D canvas that styles draw into.
///
/// Transforms nest: `push_transform` composes onto the current one and
/// `pop_transform` restores the previous.
pub trait DrawingSurface {
    fn push_transform(&mut self, t: &Transform);
    fn pop_transform(&mut self);
    fn set_color(&mut self, color: Color);
    fn set_stroke(&mut self, stroke: Stroke);
    fn draw_line(&mut self, a: Point, b: Point);
    fn draw_polygon(&mut self, polygon: &Polygon);
    fn fill_polygon(&mut self, polygon: &Polygon);
    fn draw_oval(&mut self, bounds: &Rect);
    fn fill_oval(&mut self, bounds: &Rect);
    /// Pie slice of the ellipse inscribed in `bounds`, angles in radians.
    fn fill_arc(&mut self, bounds: &Rect, start: f64, sweep: f64);

    fn draw_rect(&mut self, rect: &Rect) {
        self.draw_polygon(&rect.to_polygon());
    }

    fn fill_rect(&mut self, rect: &Rect) {
        self.fill_polygon(&rect.to_polygon());
    }
}

/// `#rrggbb`, `rgb(...)` or a named colour.
pub fn parse_color(text: &str) -> Option<Color> {
    text.trim().parse::<Color>().ok()
}

/// `color` with its RGB channels multiplied by `factor`.
pub fn shade(color: Color, factor: f64) -> Color {
    let scale = |c: u8| (c as f64 * factor).round().clamp(0.0, 255.0) as u8;
    let mut out = Color::new_rgb(scale(color.red), scale(color.green), scale(color.blue));
    out.alpha = color.alpha;
    out
}

fn square_around(center: Point, radius: f64) -> Rect {
    Rect::new(center.x - radius, center.y - radius, 2.0 * radius, 2.0 * radius)
}

/// How a map is turned into marks on a surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Style {
    /// Hairlines along every edge.
    Plain { color: Color, width: f64 },
    /// Solid bands with round joins.
    Thick { color: Color, width: f64 },
    /// Bands drawn over a wider band in a second colour.
    Outline {
        color: Color,
        width: f64,
        outline: Color,
        outline_width: f64,
    },
    /// The two face colour classes, filled.
    Filled {
        inside: Option<Color>,
        outside: Option<Color>,
        odd: Option<Color>,
    },
    /// Outlined bands woven over and under.
    Interlace {
        color: Color,
        width: f64,
        /// Space left between an under end and the outline of the band it
        /// passes beneath.
        gap: f64,
        outline: Color,
        outline_width: f64,
    },
    /// Bands split lengthwise and shaded against a light direction.
    Emboss {
        color: Color,
        width: f64,
        light_angle: f64,
    },
}

impl Style {
    pub fn names() -> &'static [&'static str] {
        &["plain", "thick", "outline", "filled", "interlace", "emboss"]
    }

    /// The named style with default parameters.
    pub fn default_named(name: &str) -> Option<Style> {
        let ink = Color::new_rgb(0x26, 0x3b, 0x5e);
        let line = Color::new_rgb(0x1a, 0x1a, 0x1a);
        let style = match name.to_lowercase().as_str() {
            "plain" => Style::Plain { color: line, width: 0.01 },
            "thick" => Style::Thick { color: ink, width: 0.06 },
            "outline" => Style::Outline {
                color: Color::new_rgb(0xf2, 0xe8, 0xcf),
                width: 0.06,
                outline: line,
                outline_width: 0.015,
            },
            "filled" => Style::Filled {
                inside: Some(ink),
                outside: Some(Color::new_rgb(0xe9, 0xc4, 0x6a)),
                odd: Some(Color::new_rgb(0xd6, 0x28, 0x28)),
            },
            "interlace" => Style::Interlace {
                color: Color::new_rgb(0xf2, 0xe8, 0xcf),
                width: 0.06,
                gap: 0.02,
                outline: line,
                outline_width: 0.012,
            },
            "emboss" => Style::Emboss {
                color: Color::new_rgb(0xb0, 0x8d, 0x57),
                width: 0.06,
                light_angle: PI / 4.0,
            },
            _ => return None,
        };
        Some(style)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Style::Plain { .. } => "plain",
            Style::Thick { .. } => "thick",
            Style::Outline { .. } => "outline",
            Style::Filled { .. } => "filled",
            Style::Interlace { .. } => "interlace",
            Style::Emboss { .. } => "emboss",
        }
    }

    pub fn draw(&self, map: &Map, surface: &mut dyn DrawingSurface) {
        match self {
            Style::Plain { color, width } => {
                surface.set_color(*color);
                surface.set_stroke(Stroke::new(*width));
                for e in map.edges() {
                    surface.draw_line(e.p1, e.p2);
                }
            }
            Style::Thick { color, width } => draw_bands(map, surface, *color, *width),
            Style::Outline {
                color,
                width,
                outline,
                outline_width,
            } => {
                draw_bands(map, surface, *outline, width + 2.0 * outline_width);
                draw_bands(map, surface, *color, *width);
            }
            Style::Filled { inside, outside, odd } => {
                let faces = Faces::build(map);
                for (polygons, color) in [(&faces.inside, inside), (&faces.outside, outside), (&faces.odd, odd)] {
                    let Some(color) = color else { continue };
                    surface.set_color(*color);
                    for polygon in polygons {
                        surface.fill_polygon(polygon);
                    }
                }
            }
            Style::Interlace {
                color,
                width,
                gap,
                outline,
                outline_width,
            } => {
                let weave = Interlace::build(map);
                let half = width / 2.0 + outline_width;
                // Under ends stop short of the crossing band, so paint order
                // cannot bring them back on top.
                let clearance = half + gap;
                let inner = weave.segments(
                    map,
                    &InterlaceParams {
                        width: width / 2.0,
                        gap: clearance,
                    },
                );
                let outer = weave.segments(map, &InterlaceParams { width: half, gap: clearance });
                for (border, band) in outer.iter().zip(&inner) {
                    surface.set_color(*outline);
                    surface.fill_polygon(&border.outline);
                    surface.set_color(*color);
                    surface.fill_polygon(&band.outline);
                }
            }
            Style::Emboss {
                color,
                width,
                light_angle,
            } => draw_embossed(map, surface, *color, *width, *light_angle),
        }
    }
}

/// Filled bands of full width `width`, with discs at the vertices.
fn draw_bands(map: &Map, surface: &mut dyn DrawingSurface, color: Color, width: f64) {
    surface.set_color(color);
    for e in map.edges() {
        surface.fill_polygon(&fat_line(e, width / 2.0));
    }
    for v in map.vertices() {
        surface.fill_oval(&square_around(*v, width / 2.0));
    }
}

fn draw_embossed(map: &Map, surface: &mut dyn DrawingSurface, color: Color, width: f64, light_angle: f64) {
    let light = Point::from_angle(light_angle);
    let half = width / 2.0;
    let tone = |facing: Point| shade(color, 0.75 + 0.35 * facing.dot(light));

    for e in map.edges() {
        let Some(d) = e.direction().normalize().valid() else {
            continue;
        };
        for side in [d.perp(), -d.perp()] {
            surface.set_color(tone(side));
            surface.fill_polygon(&Polygon::new(vec![
                e.p1,
                e.p1 + (d + side) * half,
                e.p2 + (side - d) * half,
                e.p2,
            ]));
        }
    }
    for v in map.vertices() {
        let bounds = square_around(*v, half);
        surface.set_color(tone(light));
        surface.fill_arc(&bounds, light_angle - FRAC_PI_2, PI);
        surface.set_color(tone(-light));
        surface.fill_arc(&bounds, light_angle + FRAC_PI_2, PI);
    }
}

/// Small circles at every vertex, for inspecting a map's structure.
pub fn mark_vertices(map: &Map, surface: &mut dyn DrawingSurface, color: Color, radius: f64) {
    surface.set_color(color);
    surface.set_stroke(Stroke::new(radius / 4.0));
    for v in map.vertices() {
        surface.draw_oval(&square_around(*v, radius));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Edge;

    /// Records calls instead of drawing.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fills: Vec<Polygon>,
    }

    impl DrawingSurface for Recorder {
        fn push_transform(&mut self, _t: &Transform) {
            self.calls.push("push".into());
        }
        fn pop_transform(&mut self) {
            self.calls.push("pop".into());
        }
        fn set_color(&mut self, c: Color) {
            self.calls.push(format!("color {} {} {}", c.red, c.green, c.blue));
        }
        fn set_stroke(&mut self, s: Stroke) {
            self.calls.push(format!("stroke {}", s.width));
        }
        fn draw_line(&mut self, _a: Point, _b: Point) {
            self.calls.push("line".into());
        }
        fn draw_polygon(&mut self, _p: &Polygon) {
            self.calls.push("polygon".into());
        }
        fn fill_polygon(&mut self, p: &Polygon) {
            self.calls.push("fill".into());
            self.fills.push(p.clone());
        }
        fn draw_oval(&mut self, _r: &Rect) {
            self.calls.push("oval".into());
        }
        fn fill_oval(&mut self, _r: &Rect) {
            self.calls.push("fill-oval".into());
        }
        fn fill_arc(&mut self, _r: &Rect, _s: f64, _w: f64) {
            self.calls.push("arc".into());
        }
    }

    impl Recorder {
        fn count(&self, name: &str) -> usize {
            self.calls.iter().filter(|c| c.as_str() == name).count()
        }
    }

    fn triangle() -> Map {
        let mut map = Map::new();
        map.add_loop(&[Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.5, 1.0)]);
        map
    }

    #[test]
    fn every_named_style_exists() {
        for name in Style::names() {
            let style = Style::default_named(name).expect("named style");
            assert_eq!(style.name(), *name);
        }
        assert!(Style::default_named("watercolour").is_none());
    }

    #[test]
    fn plain_draws_one_line_per_edge() {
        let mut rec = Recorder::default();
        Style::default_named("plain").expect("plain").draw(&triangle(), &mut rec);
        assert_eq!(rec.count("line"), 3);
    }

    #[test]
    fn outline_draws_two_layers() {
        let mut rec = Recorder::default();
        Style::default_named("outline").expect("outline").draw(&triangle(), &mut rec);
        assert_eq!(rec.count("fill"), 6);
        assert_eq!(rec.count("fill-oval"), 6);
    }

    #[test]
    fn filled_paints_faces() {
        let mut rec = Recorder::default();
        Style::default_named("filled").expect("filled").draw(&triangle(), &mut rec);
        assert_eq!(rec.count("fill"), 1);
    }

    #[test]
    fn interlace_fills_border_and_band_per_edge() {
        let mut rec = Recorder::default();
        Style::default_named("interlace").expect("interlace").draw(&triangle(), &mut rec);
        assert_eq!(rec.count("fill"), 6);
    }

    #[test]
    fn interlace_keeps_under_ends_out_of_the_crossing_band() {
        let mut map = Map::new();
        map.insert(Edge::new(Point::new(-1.0, 0.0), Point::new(1.0, 0.0)));
        map.insert(Edge::new(Point::new(0.0, -1.0), Point::new(0.0, 1.0)));
        assert_eq!(map.edge_count(), 4);

        let origin = Point::new(0.0, 0.0);
        let weave = Interlace::build(&map);
        let under: Vec<Point> = (0..map.edge_count())
            .filter(|&e| !weave.over_at(&map, e, origin))
            .map(|e| map.edges()[e].other(origin))
            .collect();
        assert_eq!(under.len(), 2);

        let mut rec = Recorder::default();
        Style::default_named("interlace").expect("interlace").draw(&map, &mut rec);
        assert_eq!(rec.fills.len(), 8);

        for far in under {
            let along = far.normalize();
            // Inside the over band's outline, which is 0.042 wide each side.
            for t in [0.01, 0.025, 0.04] {
                let near = along * t;
                assert!(
                    !rec.fills.iter().any(|f| f.contains(near) && f.contains(along * 0.5)),
                    "under band toward {:?} reaches {:?}",
                    far,
                    near
                );
            }
            assert!(
                rec.fills.iter().any(|f| f.contains(along * 0.5)),
                "under band toward {:?} is still drawn",
                far
            );
        }
    }

    #[test]
    fn emboss_shades_both_halves() {
        let mut rec = Recorder::default();
        let map = Map::from_edges([Edge::new(Point::new(0.0, 0.0), Point::new(1.0, 0.0))]);
        Style::default_named("emboss").expect("emboss").draw(&map, &mut rec);
        assert_eq!(rec.count("fill"), 2);
        assert_eq!(rec.count("arc"), 4);
    }

    #[test]
    fn shade_scales_channels() {
        let c = shade(Color::new_rgb(100, 200, 255), 0.5);
        assert_eq!((c.red, c.green, c.blue), (50, 100, 128));
    }

    #[test]
    fn parse_color_accepts_hex_and_names() {
        assert_eq!(parse_color("#ff0000"), Some(Color::new_rgb(255, 0, 0)));
        assert_eq!(parse_color(" white "), Some(Color::new_rgb(255, 255, 255)));
        assert!(parse_color("not a colour").is_none());
    }
}
