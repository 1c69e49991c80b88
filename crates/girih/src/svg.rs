//! SVG output: a [`DrawingSurface`] that accumulates SVG elements.
//!
//! ## Rust Lesson #24: Building Strings
//!
//! `format!` returns a fresh `String`; `push_str` appends to one we own.
//! Writing a document is just a long series of both, with the body kept
//! separate so the header can be written last, once the view is known.
//!
//! Geometry is y-up. The document flips the y axis once at the root so
//! figures keep their mathematical orientation.

use std::f64::consts::TAU;

use crate::geometry::{Point, Polygon, Rect};
use crate::render::{Color, DrawingSurface, LineCap, LineJoin, Stroke};
use crate::transform::Transform;

/// Digits after the decimal point in coordinates.
pub const DEFAULT_PRECISION: usize = 4;

#[derive(Debug, Clone)]
pub struct SvgSurface {
    body: String,
    color: Color,
    stroke: Stroke,
    depth: usize,
    precision: usize,
}

impl Default for SvgSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgSurface {
    pub fn new() -> Self {
        Self {
            body: String::new(),
            color: Color::new_rgb(0, 0, 0),
            stroke: Stroke::new(0.01),
            depth: 0,
            precision: DEFAULT_PRECISION,
        }
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Close any open groups and wrap the body in a document showing
    /// `view`. `width` sets the pixel width; the height follows the aspect.
    pub fn finish(mut self, view: &Rect, background: Option<Color>, width: Option<f64>) -> String {
        while self.depth > 0 {
            self.pop_transform();
        }

        let mut svg = String::new();
        svg.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        svg.push('\n');

        let size = match width {
            Some(w) if view.width > 0.0 => {
                format!(r#" width="{:.0}" height="{:.0}""#, w, w * view.height / view.width)
            }
            _ => String::new(),
        };
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}"{}>"#,
            self.num(view.x),
            self.num(view.y),
            self.num(view.width),
            self.num(view.height),
            size
        ));
        svg.push('\n');

        if let Some(bg) = background {
            svg.push_str(&format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}"{}/>"#,
                self.num(view.x),
                self.num(view.y),
                self.num(view.width),
                self.num(view.height),
                paint("fill", bg)
            ));
            svg.push('\n');
        }

        svg.push_str(&format!(
            r#"<g transform="matrix(1 0 0 -1 0 {})">"#,
            self.num(view.y + view.bottom())
        ));
        svg.push('\n');
        svg.push_str(&self.body);
        svg.push_str("</g>\n</svg>\n");
        svg
    }

    fn num(&self, v: f64) -> String {
        let text = format!("{:.*}", self.precision, v);
        // Avoid "-0.0000" in the output.
        if text.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
            text.trim_start_matches('-').to_string()
        } else {
            text
        }
    }

    fn points(&self, polygon: &Polygon) -> String {
        polygon
            .points
            .iter()
            .map(|p| format!("{},{}", self.num(p.x), self.num(p.y)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn stroke_attrs(&self) -> String {
        let cap = match self.stroke.cap {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        };
        let join = match self.stroke.join {
            LineJoin::Miter => "miter",
            LineJoin::Round => "round",
            LineJoin::Bevel => "bevel",
        };
        format!(
            r#" fill="none"{} stroke-width="{}" stroke-linecap="{}" stroke-linejoin="{}""#,
            paint("stroke", self.color),
            self.num(self.stroke.width),
            cap,
            join
        )
    }

    fn fill_attrs(&self) -> String {
        paint("fill", self.color)
    }

    fn ellipse(&self, bounds: &Rect, attrs: &str) -> String {
        let c = bounds.center();
        format!(
            "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\"{}/>\n",
            self.num(c.x),
            self.num(c.y),
            self.num(bounds.width / 2.0),
            self.num(bounds.height / 2.0),
            attrs
        )
    }
}

/// `#rrggbb` for a colour, ignoring alpha.
pub fn hex_color(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

fn paint(attr: &str, color: Color) -> String {
    if color.alpha == 255 {
        format!(r#" {}="{}""#, attr, hex_color(color))
    } else {
        format!(
            r#" {}="{}" {}-opacity="{:.3}""#,
            attr,
            hex_color(color),
            attr,
            color.alpha as f64 / 255.0
        )
    }
}

impl DrawingSurface for SvgSurface {
    fn push_transform(&mut self, t: &Transform) {
        let m = t.parameters();
        let attrs: Vec<String> = m.iter().map(|&v| self.num(v)).collect();
        self.body
            .push_str(&format!("<g transform=\"matrix({})\">\n", attrs.join(" ")));
        self.depth += 1;
    }

    fn pop_transform(&mut self) {
        if self.depth > 0 {
            self.body.push_str("</g>\n");
            self.depth -= 1;
        }
    }

    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    fn set_stroke(&mut self, stroke: Stroke) {
        self.stroke = stroke;
    }

    fn draw_line(&mut self, a: Point, b: Point) {
        let line = format!(
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\"{}/>\n",
            self.num(a.x),
            self.num(a.y),
            self.num(b.x),
            self.num(b.y),
            self.stroke_attrs()
        );
        self.body.push_str(&line);
    }

    fn draw_polygon(&mut self, polygon: &Polygon) {
        if polygon.is_empty() {
            return;
        }
        let element = format!(
            "<polygon points=\"{}\"{}/>\n",
            self.points(polygon),
            self.stroke_attrs()
        );
        self.body.push_str(&element);
    }

    fn fill_polygon(&mut self, polygon: &Polygon) {
        if polygon.is_empty() {
            return;
        }
        let element = format!("<polygon points=\"{}\"{}/>\n", self.points(polygon), self.fill_attrs());
        self.body.push_str(&element);
    }

    fn draw_oval(&mut self, bounds: &Rect) {
        let element = self.ellipse(bounds, &self.stroke_attrs());
        self.body.push_str(&element);
    }

    fn fill_oval(&mut self, bounds: &Rect) {
        let element = self.ellipse(bounds, &self.fill_attrs());
        self.body.push_str(&element);
    }

    fn fill_arc(&mut self, bounds: &Rect, start: f64, sweep: f64) {
        if sweep.abs() >= TAU {
            self.fill_oval(bounds);
            return;
        }
        let c = bounds.center();
        let (rx, ry) = (bounds.width / 2.0, bounds.height / 2.0);
        let at = |theta: f64| Point::new(c.x + rx * theta.cos(), c.y + ry * theta.sin());
        let (from, to) = (at(start), at(start + sweep));
        let large = u8::from(sweep.abs() > std::f64::consts::PI);
        let positive = u8::from(sweep > 0.0);
        let element = format!(
            "<path d=\"M{},{} L{},{} A{},{} 0 {} {} {},{} Z\"{}/>\n",
            self.num(c.x),
            self.num(c.y),
            self.num(from.x),
            self.num(from.y),
            self.num(rx),
            self.num(ry),
            large,
            positive,
            self.num(to.x),
            self.num(to.y),
            self.fill_attrs()
        );
        self.body.push_str(&element);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Map;
    use crate::render::Style;

    fn view() -> Rect {
        Rect::new(-1.0, -1.0, 2.0, 2.0)
    }

    #[test]
    fn empty_document_has_header_and_view() {
        let svg = SvgSurface::new().finish(&view(), None, None);
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(r#"viewBox="-1.0000 -1.0000 2.0000 2.0000""#), "{svg}");
        assert!(svg.contains("matrix(1 0 0 -1 0 0.0000)"), "{svg}");
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn background_and_size() {
        let svg = SvgSurface::new().finish(&view(), Some(Color::new_rgb(255, 255, 255)), Some(400.0));
        assert!(svg.contains(r##"fill="#ffffff""##));
        assert!(svg.contains(r#"width="400" height="400""#));
    }

    #[test]
    fn unbalanced_transforms_are_closed() {
        let mut surface = SvgSurface::new();
        surface.push_transform(&Transform::translation(1.0, 2.0));
        surface.push_transform(&Transform::scale(2.0));
        surface.pop_transform();
        let svg = surface.finish(&view(), None, None);
        assert_eq!(svg.matches("<g").count(), svg.matches("</g>").count());
        assert!(svg.contains("matrix(1.0000 0.0000 0.0000 1.0000 1.0000 2.0000)"), "{svg}");
    }

    #[test]
    fn plain_style_writes_lines() {
        let mut map = Map::new();
        map.add_loop(&[Point::new(0.0, 0.0), Point::new(0.5, 0.0), Point::new(0.0, 0.5)]);
        let mut surface = SvgSurface::new().with_precision(2);
        Style::Plain {
            color: Color::new_rgb(255, 0, 0),
            width: 0.02,
        }
        .draw(&map, &mut surface);
        let svg = surface.finish(&view(), None, None);
        assert_eq!(svg.matches("<line").count(), 3);
        assert!(svg.contains(r##"stroke="#ff0000""##));
        assert!(svg.contains(r#"stroke-width="0.02""#));
    }

    #[test]
    fn translucent_fill_gets_opacity() {
        let mut surface = SvgSurface::new();
        let mut color = Color::new_rgb(0, 0, 255);
        color.alpha = 128;
        surface.set_color(color);
        surface.fill_rect(&Rect::new(0.0, 0.0, 1.0, 1.0));
        let svg = surface.finish(&view(), None, None);
        assert!(svg.contains(r#"fill-opacity="0.502""#), "{svg}");
    }

    #[test]
    fn half_arc_is_a_path() {
        let mut surface = SvgSurface::new().with_precision(1);
        surface.fill_arc(&Rect::new(-1.0, -1.0, 2.0, 2.0), 0.0, std::f64::consts::PI);
        let svg = surface.finish(&view(), None, None);
        assert!(svg.contains("M0.0,0.0 L1.0,0.0 A1.0,1.0 0 0 1 -1.0,0.0 Z"), "{svg}");
    }

    #[test]
    fn hex_color_pads() {
        assert_eq!(hex_color(Color::new_rgb(1, 2, 255)), "#0102ff");
    }
}
