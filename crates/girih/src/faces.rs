//! Faces of a planar map and their two-colouring.
//!
//! Every edge contributes two half-edges, one per direction. At each vertex
//! the outgoing half-edges are sorted by angle; walking "turn as far left as
//! possible" from each unvisited half-edge traces one face boundary. Bounded
//! faces come out counter-clockwise (positive area); each connected
//! component also yields one clockwise outer boundary.
//!
//! Girih patterns alternate: neighbouring faces take opposite colours. The
//! outer boundaries are seeded as [`FaceClass::Outside`] and the colouring
//! spreads across shared edges. A face that would need both colours is
//! *odd*, which means the map was not a proper planar subdivision.

use std::collections::VecDeque;

use tracing::warn;

use crate::error::FaceError;
use crate::geometry::{Point, Polygon, TOLERANCE};
use crate::map::Map;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceClass {
    Inside,
    Outside,
    Odd,
}

impl FaceClass {
    fn opposite(self) -> FaceClass {
        match self {
            FaceClass::Inside => FaceClass::Outside,
            FaceClass::Outside => FaceClass::Inside,
            FaceClass::Odd => FaceClass::Odd,
        }
    }
}

/// The classified bounded faces of a map.
#[derive(Debug, Clone, Default)]
pub struct Faces {
    pub inside: Vec<Polygon>,
    pub outside: Vec<Polygon>,
    pub odd: Vec<Polygon>,
    problems: Vec<String>,
}

/// One traced boundary cycle.
struct Cycle {
    polygon: Polygon,
    area: f64,
}

impl Faces {
    pub fn build(map: &Map) -> Faces {
        let half_count = map.edge_count() * 2;
        let mut problems = Vec::new();
        if half_count == 0 {
            return Faces::default();
        }

        // Half-edge h runs along edge h/2, forward when h is even.
        let origin = |h: usize| {
            let (a, b) = map.edge_ends(h / 2);
            if h % 2 == 0 { a } else { b }
        };
        let direction = |h: usize| {
            let e = map.edges()[h / 2];
            if h % 2 == 0 { e.p2 - e.p1 } else { e.p1 - e.p2 }
        };

        // Outgoing half-edges around each vertex, counter-clockwise.
        let around: Vec<Vec<usize>> = (0..map.vertex_count())
            .map(|v| {
                let mut out: Vec<usize> = map
                    .incident(v)
                    .iter()
                    .map(|&e| if map.edge_ends(e).0 == v { 2 * e } else { 2 * e + 1 })
                    .collect();
                out.sort_by(|&a, &b| direction(a).angle().total_cmp(&direction(b).angle()));
                out
            })
            .collect();
        let mut slot = vec![0usize; half_count];
        for list in &around {
            for (i, &h) in list.iter().enumerate() {
                slot[h] = i;
            }
        }
        // Next half-edge along the face to the left of h.
        let next = |h: usize| {
            let twin = h ^ 1;
            let list = &around[origin(twin)];
            list[(slot[twin] + list.len() - 1) % list.len()]
        };

        let mut face_of = vec![usize::MAX; half_count];
        let mut cycles: Vec<Cycle> = Vec::new();
        for start in 0..half_count {
            if face_of[start] != usize::MAX {
                continue;
            }
            let id = cycles.len();
            let mut points = Vec::new();
            let mut h = start;
            loop {
                face_of[h] = id;
                points.push(map.vertices()[origin(h)]);
                h = next(h);
                if h == start || face_of[h] != usize::MAX || points.len() > half_count {
                    break;
                }
            }
            if h != start {
                problems.push(format!("face {id} does not close"));
            }
            let polygon = Polygon::new(points);
            let area = polygon.signed_area();
            cycles.push(Cycle { polygon, area });
        }

        // Faces across each edge.
        let mut adjacent: Vec<Vec<usize>> = vec![Vec::new(); cycles.len()];
        for h in (0..half_count).step_by(2) {
            let (f, g) = (face_of[h], face_of[h + 1]);
            if f != g {
                adjacent[f].push(g);
                adjacent[g].push(f);
            }
        }
        for list in &mut adjacent {
            list.sort_unstable();
            list.dedup();
        }

        let bounded = |f: usize| cycles[f].area > TOLERANCE;
        let mut class: Vec<Option<FaceClass>> = vec![None; cycles.len()];
        let mut queue = VecDeque::new();
        for f in (0..cycles.len()).filter(|&f| !bounded(f)) {
            class[f] = Some(FaceClass::Outside);
            queue.push_back(f);
        }
        while let Some(f) = queue.pop_front() {
            let Some(c) = class[f] else { continue };
            for &g in &adjacent[f] {
                if class[g].is_none() {
                    class[g] = Some(c.opposite());
                    queue.push_back(g);
                }
            }
        }

        // Same-colour neighbours poison both faces.
        let mut odd = vec![false; cycles.len()];
        for (f, list) in adjacent.iter().enumerate() {
            for &g in list.iter().filter(|&&g| g > f) {
                if class[f].is_some() && class[f] == class[g] {
                    odd[f] = true;
                    odd[g] = true;
                    problems.push(format!("faces {f} and {g} share an edge and a colour"));
                }
            }
        }

        problems.extend(boundary_problems(&face_of));
        problems.extend(euler_problems(map, cycles.len()));
        problems.extend(outer_face_problems(map, &face_of, &cycles));

        let mut faces = Faces {
            problems,
            ..Faces::default()
        };
        for (f, cycle) in cycles.into_iter().enumerate() {
            if cycle.area <= TOLERANCE {
                continue;
            }
            let bucket = if odd[f] {
                &mut faces.odd
            } else {
                match class[f] {
                    Some(FaceClass::Inside) => &mut faces.inside,
                    Some(FaceClass::Outside) => &mut faces.outside,
                    _ => &mut faces.odd,
                }
            };
            bucket.push(cycle.polygon);
        }

        if !faces.problems.is_empty() {
            warn!(problems = faces.problems.len(), "face classification found problems");
        }
        faces
    }

    pub fn len(&self) -> usize {
        self.inside.len() + self.outside.len() + self.odd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn problems(&self) -> &[String] {
        &self.problems
    }

    /// Every face in the two colour classes, with no odd faces and no
    /// structural problems.
    pub fn verify(&self) -> Result<(), FaceError> {
        let mut problems = self.problems.clone();
        if !self.odd.is_empty() {
            problems.push(format!("{} odd faces", self.odd.len()));
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(FaceError::Inconsistent { problems })
        }
    }

    /// Class of the bounded face containing `p`, if any.
    pub fn classify(&self, p: Point) -> Option<FaceClass> {
        let smallest = |faces: &[Polygon]| {
            faces
                .iter()
                .filter(|f| f.contains(p))
                .map(|f| f.signed_area())
                .fold(f64::INFINITY, f64::min)
        };
        [
            (FaceClass::Inside, smallest(&self.inside)),
            (FaceClass::Outside, smallest(&self.outside)),
            (FaceClass::Odd, smallest(&self.odd)),
        ]
        .into_iter()
        .filter(|(_, area)| area.is_finite())
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(class, _)| class)
    }
}

/// Components of the vertex graph, by union-find.
fn components(map: &Map) -> (Vec<usize>, usize) {
    fn root(parent: &mut [usize], mut v: usize) -> usize {
        while parent[v] != v {
            parent[v] = parent[parent[v]];
            v = parent[v];
        }
        v
    }
    let mut parent: Vec<usize> = (0..map.vertex_count()).collect();
    for e in 0..map.edge_count() {
        let (a, b) = map.edge_ends(e);
        let (ra, rb) = (root(&mut parent, a), root(&mut parent, b));
        if ra != rb {
            parent[ra] = rb;
        }
    }
    let mut label = vec![usize::MAX; map.vertex_count()];
    let mut count = 0;
    let mut of_vertex = vec![0; map.vertex_count()];
    for v in 0..map.vertex_count() {
        let r = root(&mut parent, v);
        if label[r] == usize::MAX {
            label[r] = count;
            count += 1;
        }
        of_vertex[v] = label[r];
    }
    (of_vertex, count)
}

/// Every edge bounds faces on exactly two sides.
fn boundary_problems(face_of: &[usize]) -> Vec<String> {
    face_of
        .chunks(2)
        .enumerate()
        .filter_map(|(e, sides)| {
            let traced = sides.iter().filter(|&&f| f != usize::MAX).count();
            (traced != 2).then(|| format!("edge {e} appears on {traced} face boundaries"))
        })
        .collect()
}

/// A planar embedding traced component by component has
/// `V - E + F = 2C`.
fn euler_problems(map: &Map, face_count: usize) -> Option<String> {
    let (_, c) = components(map);
    let lhs = map.vertex_count() as i64 - map.edge_count() as i64 + face_count as i64;
    let rhs = 2 * c as i64;
    (lhs != rhs).then(|| format!("Euler characteristic {lhs} but {c} components need {rhs}"))
}

/// Each component must have exactly one outer (non-positive) boundary.
fn outer_face_problems(map: &Map, face_of: &[usize], cycles: &[Cycle]) -> Vec<String> {
    let (of_vertex, count) = components(map);
    let mut outer = vec![0usize; count];
    let mut seen = vec![false; cycles.len()];
    for (h, &f) in face_of.iter().enumerate() {
        if seen[f] {
            continue;
        }
        seen[f] = true;
        if cycles[f].area <= TOLERANCE {
            let (a, _) = map.edge_ends(h / 2);
            outer[of_vertex[a]] += 1;
        }
    }
    outer
        .iter()
        .enumerate()
        .filter(|&(_, &n)| n != 1)
        .map(|(c, n)| format!("component {c} has {n} outer boundaries"))
        .collect()
}
