//! The `.tiling` XML format.
//!
//! ```xml
//! <tiling name="4.8.8">
//!   <translation t1="2.414 0" t2="0 2.414"/>
//!   <tile regular="8">
//!     <placement transform="1.306 0 0 1.306 0 0"/>
//!   </tile>
//!   <tile>
//!     <point x="0" y="0"/>
//!     <point x="1" y="0"/>
//!     <point x="0" y="1"/>
//!     <placement transform="1 0 0 1 0 0"/>
//!   </tile>
//!   <description>Octagons and squares</description>
//!   <author>anon</author>
//! </tiling>
//! ```
//!
//! An inflation tiling replaces `<translation>` with
//! `<inflation from="x1 y1 x2 y2" to="x1 y1 x2 y2" t1=".." t2=".."/>`.
//! Transforms are the six parameters `m11 m12 m21 m22 m31 m32`, the same
//! order as SVG's `matrix(a b c d e f)`. Numbers are written with the
//! shortest representation that reads back exactly, so a tiling survives
//! a write/read cycle unchanged.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::{debug, warn};

use crate::error::TilingFileError;
use crate::geometry::{Point, Polygon};
use crate::map::Edge;
use crate::tiling::{Lattice, TileShape, Tiling};
use crate::transform::Transform;

pub const EXTENSION: &str = "tiling";

// ============================================================================
// Reading
// ============================================================================

pub fn read_tiling(content: &str) -> Result<Tiling, TilingFileError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut doc = Document::default();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| xml_error(reader.error_position() as u64, err))?;
        match event {
            Event::Start(ref e) => doc.open(e, false)?,
            Event::Empty(ref e) => doc.open(e, true)?,
            Event::End(ref e) => doc.close(e.name().as_ref())?,
            Event::Text(ref t) => {
                let text = t
                    .unescape()
                    .map_err(|err| xml_error(reader.buffer_position() as u64, err))?;
                doc.text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    doc.finish()
}

fn xml_error(position: u64, err: impl std::fmt::Display) -> TilingFileError {
    TilingFileError::Xml {
        position,
        message: err.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Description,
    Author,
}

#[derive(Debug, Default)]
struct TileBuilder {
    regular: Option<usize>,
    points: Vec<Point>,
    placements: Vec<Transform>,
}

/// Accumulates elements as the reader streams through the file.
#[derive(Debug, Default)]
struct Document {
    root_seen: bool,
    name: String,
    lattice: Option<Lattice>,
    tiles: Vec<(TileShape, Vec<Transform>)>,
    tile: Option<TileBuilder>,
    text_field: Option<TextField>,
    description: String,
    author: String,
}

impl Document {
    fn open(&mut self, e: &BytesStart, is_empty: bool) -> Result<(), TilingFileError> {
        let element = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let attrs = Attributes::read(e)?;

        if !self.root_seen {
            if element != "tiling" {
                return Err(TilingFileError::UnexpectedRoot(element));
            }
            self.root_seen = true;
            self.name = attrs.get("name").unwrap_or_default().to_string();
            return Ok(());
        }

        match element.as_str() {
            "translation" => {
                let [x1, y1] = attrs.numbers(&element, "t1")?;
                let [x2, y2] = attrs.numbers(&element, "t2")?;
                self.lattice = Some(Lattice::translation(Point::new(x1, y1), Point::new(x2, y2)));
            }
            "inflation" => {
                let [a, b, c, d] = attrs.numbers(&element, "from")?;
                let [e, f, g, h] = attrs.numbers(&element, "to")?;
                let t1 = attrs.optional_numbers::<2>("t1")?.unwrap_or([0.0, 0.0]);
                let t2 = attrs.optional_numbers::<2>("t2")?.unwrap_or([0.0, 0.0]);
                self.lattice = Some(Lattice::Inflation {
                    from: Edge::new(Point::new(a, b), Point::new(c, d)),
                    to: Edge::new(Point::new(e, f), Point::new(g, h)),
                    t1: Point::new(t1[0], t1[1]),
                    t2: Point::new(t2[0], t2[1]),
                });
            }
            "tile" => {
                let regular = attrs.optional_numbers::<1>("regular")?.map(|[n]| n as usize);
                self.tile = Some(TileBuilder {
                    regular,
                    ..TileBuilder::default()
                });
                if is_empty {
                    self.finish_tile()?;
                }
            }
            "point" => {
                let [x] = attrs.numbers(&element, "x")?;
                let [y] = attrs.numbers(&element, "y")?;
                self.current_tile(&element)?.points.push(Point::new(x, y));
            }
            "placement" => {
                let params = attrs.numbers::<6>(&element, "transform")?;
                self.current_tile(&element)?
                    .placements
                    .push(Transform::from_parameters(params));
            }
            "description" if !is_empty => self.text_field = Some(TextField::Description),
            "author" if !is_empty => self.text_field = Some(TextField::Author),
            other => debug!(element = other, "ignoring element"),
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) -> Result<(), TilingFileError> {
        match name {
            b"tile" => self.finish_tile()?,
            b"description" | b"author" => self.text_field = None,
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        match self.text_field {
            Some(TextField::Description) => self.description.push_str(text),
            Some(TextField::Author) => self.author.push_str(text),
            None => {}
        }
    }

    fn current_tile(&mut self, element: &str) -> Result<&mut TileBuilder, TilingFileError> {
        self.tile
            .as_mut()
            .ok_or_else(|| TilingFileError::Orphan(element.to_string()))
    }

    fn finish_tile(&mut self) -> Result<(), TilingFileError> {
        let Some(tile) = self.tile.take() else {
            return Ok(());
        };
        let shape = match tile.regular {
            Some(n) if n >= 3 => TileShape::Regular(n),
            _ if tile.points.len() >= 3 && tile.regular.is_none() => TileShape::Polygon(Polygon::new(tile.points)),
            _ => {
                return Err(TilingFileError::BadTile {
                    index: self.tiles.len(),
                    points: tile.points.len(),
                });
            }
        };
        self.tiles.push((shape, tile.placements));
        Ok(())
    }

    fn finish(self) -> Result<Tiling, TilingFileError> {
        let lattice = self.lattice.ok_or(TilingFileError::NoLattice)?;
        let mut tiling = Tiling::new(self.name, lattice);
        tiling.description = self.description.trim().to_string();
        tiling.author = self.author.trim().to_string();
        for (shape, placements) in self.tiles {
            tiling.add_tile(shape, placements);
        }
        Ok(tiling)
    }
}

/// Unescaped attributes of one element.
struct Attributes(Vec<(String, String)>);

impl Attributes {
    fn read(e: &BytesStart) -> Result<Self, TilingFileError> {
        let mut pairs = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| xml_error(0, err))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|err| xml_error(0, err))?;
            pairs.push((key, value.into_owned()));
        }
        Ok(Attributes(pairs))
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn numbers<const N: usize>(&self, element: &str, key: &'static str) -> Result<[f64; N], TilingFileError> {
        self.optional_numbers(key)?
            .ok_or_else(|| TilingFileError::MissingAttribute {
                element: element.to_string(),
                attribute: key,
            })
    }

    fn optional_numbers<const N: usize>(&self, key: &str) -> Result<Option<[f64; N]>, TilingFileError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let bad = || TilingFileError::BadNumbers {
            attribute: key.to_string(),
            value: value.to_string(),
            expected: N,
        };
        let parsed = value
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|_| bad())?;
        let numbers: [f64; N] = parsed.try_into().map_err(|_| bad())?;
        if numbers.iter().any(|v| !v.is_finite()) {
            return Err(bad());
        }
        Ok(Some(numbers))
    }
}

// ============================================================================
// Writing
// ============================================================================

fn join(values: &[f64]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ")
}

pub fn write_tiling(tiling: &Tiling) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<tiling name=\"{}\">\n", escape(tiling.name.as_str())));

    match &tiling.lattice {
        Lattice::Translation { t1, t2 } => {
            xml.push_str(&format!(
                "  <translation t1=\"{}\" t2=\"{}\"/>\n",
                join(&[t1.x, t1.y]),
                join(&[t2.x, t2.y])
            ));
        }
        Lattice::Inflation { from, to, t1, t2 } => {
            xml.push_str(&format!(
                "  <inflation from=\"{}\" to=\"{}\" t1=\"{}\" t2=\"{}\"/>\n",
                join(&[from.p1.x, from.p1.y, from.p2.x, from.p2.y]),
                join(&[to.p1.x, to.p1.y, to.p2.x, to.p2.y]),
                join(&[t1.x, t1.y]),
                join(&[t2.x, t2.y])
            ));
        }
    }

    for tile in tiling.tiles() {
        match &tile.shape {
            TileShape::Regular(n) => xml.push_str(&format!("  <tile regular=\"{}\">\n", n)),
            TileShape::Polygon(polygon) => {
                xml.push_str("  <tile>\n");
                for p in &polygon.points {
                    xml.push_str(&format!("    <point x=\"{}\" y=\"{}\"/>\n", p.x, p.y));
                }
            }
        }
        for placement in &tile.placements {
            xml.push_str(&format!(
                "    <placement transform=\"{}\"/>\n",
                join(&placement.parameters())
            ));
        }
        xml.push_str("  </tile>\n");
    }

    if !tiling.description.is_empty() {
        xml.push_str(&format!(
            "  <description>{}</description>\n",
            escape(tiling.description.as_str())
        ));
    }
    if !tiling.author.is_empty() {
        xml.push_str(&format!("  <author>{}</author>\n", escape(tiling.author.as_str())));
    }
    xml.push_str("</tiling>\n");
    xml
}

// ============================================================================
// Files
// ============================================================================

pub fn load_tiling(path: impl AsRef<Path>) -> Result<Tiling, TilingFileError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| TilingFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_tiling(&content).map_err(|err| TilingFileError::InFile {
        path: path.to_path_buf(),
        source: Box::new(err),
    })
}

pub fn save_tiling(path: impl AsRef<Path>, tiling: &Tiling) -> Result<(), TilingFileError> {
    let path = path.as_ref();
    fs::write(path, write_tiling(tiling)).map_err(|source| TilingFileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Every `*.tiling` file in `dir`, in file-name order. A file that fails
/// to load adds a message to the second list and the rest still load.
pub fn load_tiling_dir(dir: impl AsRef<Path>) -> (Vec<Tiling>, Vec<String>) {
    let dir = dir.as_ref();
    let mut tilings = Vec::new();
    let mut errors = Vec::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) => {
            let err = TilingFileError::Io {
                path: dir.to_path_buf(),
                source,
            };
            warn!(%err, "cannot read tiling folder");
            errors.push(err.to_string());
            return (tilings, errors);
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == EXTENSION))
        .collect();
    paths.sort();

    for path in paths {
        match load_tiling(&path) {
            Ok(tiling) => {
                debug!(name = %tiling.name, tiles = tiling.tile_count(), "loaded tiling");
                tilings.push(tiling);
            }
            Err(err) => {
                warn!(%err, "skipping tiling file");
                errors.push(err.to_string());
            }
        }
    }

    debug!(loaded = tilings.len(), failed = errors.len(), folder = %dir.display(), "tiling folder read");
    (tilings, errors)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiling::regular_placement;

    fn sample() -> Tiling {
        let mut tiling = Tiling::new(
            "squares & kites",
            Lattice::translation(Point::new(1.0, 0.0), Point::new(0.1, 0.7)),
        );
        tiling.add_tile(
            TileShape::Regular(4),
            vec![regular_placement(4, 0.5, 0.3, Point::new(0.25, 1.0 / 3.0))],
        );
        tiling.add_tile(
            TileShape::Polygon(Polygon::new(vec![
                Point::new(0.0, 0.0),
                Point::new(0.2, 0.0),
                Point::new(0.1, 0.3),
            ])),
            vec![Transform::identity(), Transform::rotation(std::f64::consts::PI / 7.0)],
        );
        tiling.description = "Two <shapes> & one lattice".to_string();
        tiling.author = "A. N. Author".to_string();
        tiling
    }

    #[test]
    fn round_trip_is_exact() {
        let tiling = sample();
        let text = write_tiling(&tiling);
        let back = read_tiling(&text).expect("reads back");
        assert_eq!(back, tiling);
    }

    #[test]
    fn inflation_round_trip() {
        let mut tiling = Tiling::new(
            "spiral",
            Lattice::Inflation {
                from: Edge::new(Point::new(0.0, 0.0), Point::new(1.0, 0.0)),
                to: Edge::new(Point::new(0.0, 0.0), Point::new(1.5, 0.4)),
                t1: Point::new(1.0, 0.0),
                t2: Point::new(0.0, 1.0),
            },
        );
        tiling.add_tile(TileShape::Regular(5), vec![Transform::scale(0.2)]);
        let back = read_tiling(&write_tiling(&tiling)).expect("reads back");
        assert_eq!(back, tiling);
        assert_eq!(back.lattice.kind(), "inflation");
    }

    #[test]
    fn text_fields_are_trimmed() {
        let text = r#"<tiling name="t">
            <translation t1="1 0" t2="0 1"/>
            <tile regular="3"/>
            <description>
                multi-line
            </description>
        </tiling>"#;
        let tiling = read_tiling(text).expect("valid file");
        assert_eq!(tiling.description, "multi-line");
        assert_eq!(tiling.tile_count(), 1);
        assert!(tiling.tiles()[0].placements.is_empty());
    }

    #[test]
    fn commas_separate_numbers_too() {
        let text = r#"<tiling><translation t1="1,0" t2="0, 1"/></tiling>"#;
        let tiling = read_tiling(text).expect("valid file");
        assert_eq!(tiling.lattice, Lattice::translation(Point::new(1.0, 0.0), Point::new(0.0, 1.0)));
        assert_eq!(tiling.name, "");
    }

    #[test]
    fn missing_lattice_is_an_error() {
        let err = read_tiling(r#"<tiling name="x"><tile regular="4"/></tiling>"#).unwrap_err();
        assert!(matches!(err, TilingFileError::NoLattice), "{err}");
    }

    #[test]
    fn wrong_root_is_an_error() {
        let err = read_tiling("<mosaic/>").unwrap_err();
        assert!(matches!(err, TilingFileError::UnexpectedRoot(ref r) if r == "mosaic"), "{err}");
    }

    #[test]
    fn bad_transform_reports_attribute() {
        let text = r#"<tiling><translation t1="1 0" t2="0 1"/>
            <tile regular="4"><placement transform="1 0 0 1 0"/></tile></tiling>"#;
        let err = read_tiling(text).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("transform"), "{message}");
        assert!(message.contains("expected 6 numbers"), "{message}");
    }

    #[test]
    fn point_outside_tile_is_an_error() {
        let text = r#"<tiling><translation t1="1 0" t2="0 1"/><point x="0" y="0"/></tiling>"#;
        assert!(matches!(read_tiling(text), Err(TilingFileError::Orphan(_))));
    }

    #[test]
    fn degenerate_tile_is_an_error() {
        let text = r#"<tiling><translation t1="1 0" t2="0 1"/>
            <tile><point x="0" y="0"/><point x="1" y="0"/></tile></tiling>"#;
        assert!(matches!(
            read_tiling(text),
            Err(TilingFileError::BadTile { index: 0, points: 2 })
        ));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let err = read_tiling(r#"<tiling><translation t1="1 0" t2="0 1"></tiling>"#).unwrap_err();
        assert!(matches!(err, TilingFileError::Xml { .. }), "{err}");
    }

    #[test]
    fn folder_load_collects_errors() {
        let dir = tempfile::tempdir().expect("temp dir");
        save_tiling(dir.path().join("a.tiling"), &sample()).expect("write");
        fs::write(dir.path().join("b.tiling"), "<tiling>").expect("write");
        fs::write(dir.path().join("notes.txt"), "not a tiling").expect("write");

        let (tilings, errors) = load_tiling_dir(dir.path());
        assert_eq!(tilings.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("b.tiling"), "{}", errors[0]);
    }

    #[test]
    fn missing_folder_is_one_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (tilings, errors) = load_tiling_dir(dir.path().join("nope"));
        assert!(tilings.is_empty());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn bundled_tilings_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../tilings");
        let (tilings, errors) = load_tiling_dir(&dir);
        assert!(errors.is_empty(), "{errors:?}");
        assert!(tilings.iter().any(|t| t.name == "4.8.8"));
        assert!(tilings.iter().any(|t| t.name == "6.6.6"));
    }
}
