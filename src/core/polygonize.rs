//! Raster to polygon conversion
//!
//! Each 4-connected region of equal cell value becomes one polygon. Rings follow
//! cell edges exactly (no simplification); only vertices where the boundary turns
//! are kept. Rings are traced with the region on the right, so in pixel space
//! (row axis pointing down) exteriors run clockwise and holes counter-clockwise.
//! With a north-up transform exteriors stay clockwise in map space, as shapefile
//! readers expect.

use crate::types::{FloodError, FloodResult, GeoTransform, Raster};
use ndarray::Array2;
use std::collections::{HashMap, VecDeque};

/// Cell corner in pixel space: (col, row)
type Vertex = (i64, i64);
type Edge = (Vertex, Vertex);

/// Polygon of one connected region
#[derive(Debug, Clone, PartialEq)]
pub struct ValuePolygon {
    /// Cell value shared by the region
    pub value: f32,
    /// Closed exterior ring in map coordinates
    pub exterior: Vec<(f64, f64)>,
    /// Closed hole rings in map coordinates
    pub holes: Vec<Vec<(f64, f64)>>,
    /// Number of cells in the region
    pub cell_count: usize,
    /// Area in squared map units
    pub area: f64,
}

impl ValuePolygon {
    pub fn to_wkt(&self) -> String {
        let ring = |points: &[(f64, f64)]| {
            let coords: Vec<String> = points.iter().map(|(x, y)| format!("{} {}", x, y)).collect();
            format!("({})", coords.join(", "))
        };
        let mut rings = vec![ring(&self.exterior)];
        rings.extend(self.holes.iter().map(|h| ring(h)));
        format!("POLYGON ({})", rings.join(", "))
    }
}

/// Label 4-connected regions of equal, non-NaN value.
/// Returns the label grid (0 = NoData) and per-label (value, cell count).
pub fn label_regions(data: &Array2<f32>) -> (Array2<usize>, Vec<(f32, usize)>) {
    let (rows, cols) = data.dim();
    let mut labels = Array2::<usize>::zeros((rows, cols));
    let mut regions = Vec::new();
    let mut queue = VecDeque::new();

    for r in 0..rows {
        for c in 0..cols {
            let value = data[[r, c]];
            if value.is_nan() || labels[[r, c]] != 0 {
                continue;
            }
            let label = regions.len() + 1;
            let mut count = 0usize;
            labels[[r, c]] = label;
            queue.push_back((r, c));

            while let Some((cr, cc)) = queue.pop_front() {
                count += 1;
                let neighbors = [
                    (cr.wrapping_sub(1), cc),
                    (cr + 1, cc),
                    (cr, cc.wrapping_sub(1)),
                    (cr, cc + 1),
                ];
                for (nr, nc) in neighbors {
                    if nr < rows && nc < cols && labels[[nr, nc]] == 0 && data[[nr, nc]] == value {
                        labels[[nr, nc]] = label;
                        queue.push_back((nr, nc));
                    }
                }
            }
            regions.push((value, count));
        }
    }
    (labels, regions)
}

/// Boundary edges of every region, oriented with the region on the right
fn boundary_edges(labels: &Array2<usize>, region_count: usize) -> Vec<Vec<Edge>> {
    let (rows, cols) = labels.dim();
    let mut edges = vec![Vec::new(); region_count];
    let label_at = |r: i64, c: i64| -> usize {
        if r < 0 || c < 0 || r >= rows as i64 || c >= cols as i64 {
            0
        } else {
            labels[[r as usize, c as usize]]
        }
    };

    for r in 0..rows as i64 {
        for c in 0..cols as i64 {
            let label = label_at(r, c);
            if label == 0 {
                continue;
            }
            let list = &mut edges[label - 1];
            if label_at(r - 1, c) != label {
                list.push(((c, r), (c + 1, r)));
            }
            if label_at(r, c + 1) != label {
                list.push(((c + 1, r), (c + 1, r + 1)));
            }
            if label_at(r + 1, c) != label {
                list.push(((c + 1, r + 1), (c, r + 1)));
            }
            if label_at(r, c - 1) != label {
                list.push(((c, r + 1), (c, r)));
            }
        }
    }
    edges
}

fn direction(edge: &Edge) -> (i64, i64) {
    (edge.1 .0 - edge.0 .0, edge.1 .1 - edge.0 .1)
}

/// Chain edges into closed vertex loops (without repeated closing vertex).
///
/// At a vertex shared by two diagonal cells the right-most turn wins, which keeps
/// diagonal neighbours apart as 4-connectivity requires.
fn trace_loops(edges: &[Edge]) -> FloodResult<Vec<Vec<Vertex>>> {
    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::new();
    for (i, edge) in edges.iter().enumerate() {
        outgoing.entry(edge.0).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut loops = Vec::new();

    for first in 0..edges.len() {
        if used[first] {
            continue;
        }
        used[first] = true;
        let start = edges[first].0;
        let mut vertex = edges[first].1;
        let mut dir = direction(&edges[first]);
        let mut path = vec![start];

        while vertex != start {
            path.push(vertex);
            let (dx, dy) = dir;
            let preferred = [(-dy, dx), (dx, dy), (dy, -dx)];
            let candidates = outgoing.get(&vertex).map(|v| v.as_slice()).unwrap_or(&[]);
            let next = preferred
                .iter()
                .find_map(|want| {
                    candidates
                        .iter()
                        .copied()
                        .find(|&i| !used[i] && direction(&edges[i]) == *want)
                })
                .ok_or_else(|| {
                    FloodError::Processing(format!("Open region boundary at {:?}", vertex))
                })?;
            used[next] = true;
            dir = direction(&edges[next]);
            vertex = edges[next].1;
        }
        loops.extend(split_self_touching(path));
    }
    Ok(loops)
}

/// Split a loop that passes a vertex more than once into simple loops
fn split_self_touching(path: Vec<Vertex>) -> Vec<Vec<Vertex>> {
    let mut loops = Vec::new();
    let mut stack: Vec<Vertex> = Vec::with_capacity(path.len());
    let mut position: HashMap<Vertex, usize> = HashMap::new();

    for v in path {
        if let Some(&at) = position.get(&v) {
            let inner: Vec<Vertex> = stack.drain(at + 1..).collect();
            for p in &inner {
                position.remove(p);
            }
            let mut ring = vec![v];
            ring.extend(inner);
            loops.push(ring);
        } else {
            position.insert(v, stack.len());
            stack.push(v);
        }
    }
    if !stack.is_empty() {
        loops.push(stack);
    }
    loops
}

/// Drop vertices in the middle of straight runs
fn remove_collinear(ring: Vec<Vertex>) -> Vec<Vertex> {
    let n = ring.len();
    if n < 4 {
        return ring;
    }
    (0..n)
        .filter(|&i| {
            let prev = ring[(i + n - 1) % n];
            let cur = ring[i];
            let next = ring[(i + 1) % n];
            let d1 = (cur.0 - prev.0, cur.1 - prev.1);
            let d2 = (next.0 - cur.0, next.1 - cur.1);
            d1.0 * d2.1 - d1.1 * d2.0 != 0
        })
        .map(|i| ring[i])
        .collect()
}

/// Shoelace area in pixel space; positive for exteriors
fn signed_area(ring: &[Vertex]) -> i64 {
    let n = ring.len();
    let twice: i64 = (0..n)
        .map(|i| {
            let (x0, y0) = ring[i];
            let (x1, y1) = ring[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum();
    twice / 2
}

fn to_map(ring: &[Vertex], transform: &GeoTransform) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = ring
        .iter()
        .map(|&(c, r)| transform.pixel_to_map(c as f64, r as f64))
        .collect();
    if let Some(&first) = points.first() {
        points.push(first);
    }
    points
}

/// Polygons of one region: normally one, with holes
fn region_polygons(
    value: f32,
    cell_count: usize,
    edges: &[Edge],
    transform: &GeoTransform,
) -> FloodResult<Vec<ValuePolygon>> {
    let cell_area = transform.cell_area();
    let mut exteriors = Vec::new();
    let mut holes = Vec::new();
    for ring in trace_loops(edges)? {
        let ring = remove_collinear(ring);
        let area = signed_area(&ring);
        if area > 0 {
            exteriors.push((area, ring));
        } else if area < 0 {
            holes.push(ring);
        }
    }
    exteriors.sort_by(|a, b| b.0.cmp(&a.0));

    let mut exteriors = exteriors.into_iter();
    let (outer_area, outer) = exteriors.next().ok_or_else(|| {
        FloodError::Processing(format!("Region of value {} has no exterior ring", value))
    })?;
    let hole_area: i64 = holes.iter().map(|h| -signed_area(h)).sum();

    let mut polygons = vec![ValuePolygon {
        value,
        exterior: to_map(&outer, transform),
        holes: holes.iter().map(|h| to_map(h, transform)).collect(),
        cell_count,
        area: (outer_area - hole_area) as f64 * cell_area,
    }];
    for (area, extra) in exteriors {
        log::debug!("Region of value {} has a detached exterior ring", value);
        polygons.push(ValuePolygon {
            value,
            exterior: to_map(&extra, transform),
            holes: Vec::new(),
            cell_count: area as usize,
            area: area as f64 * cell_area,
        });
    }
    Ok(polygons)
}

/// Convert every connected region of equal value into a polygon
pub fn polygonize(raster: &Raster) -> FloodResult<Vec<ValuePolygon>> {
    let transform = &raster.geo.transform;
    let (labels, regions) = label_regions(&raster.data);
    let edges = boundary_edges(&labels, regions.len());
    log::debug!("Polygonizing {} regions", regions.len());

    #[cfg(feature = "parallel")]
    let per_region: Vec<FloodResult<Vec<ValuePolygon>>> = {
        use rayon::prelude::*;
        regions
            .into_par_iter()
            .zip(edges.into_par_iter())
            .map(|((value, count), region_edges)| {
                region_polygons(value, count, &region_edges, transform)
            })
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let per_region: Vec<FloodResult<Vec<ValuePolygon>>> = regions
        .into_iter()
        .zip(edges)
        .map(|((value, count), region_edges)| region_polygons(value, count, &region_edges, transform))
        .collect();

    let mut polygons = Vec::with_capacity(per_region.len());
    for region in per_region {
        polygons.extend(region?);
    }

    log::info!("Converted raster to {} polygons", polygons.len());
    Ok(polygons)
}
