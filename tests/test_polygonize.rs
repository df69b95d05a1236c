use ndarray::{array, Array2};
use s2flood::core::polygonize::polygonize;
use s2flood::types::{GeoReference, GeoTransform, Raster};

const NAN: f32 = f32::NAN;

fn raster(data: Array2<f32>) -> Raster {
    Raster::new(
        data,
        GeoReference {
            transform: GeoTransform::north_up(0.0, 0.0, 1.0, -1.0),
            projection: String::new(),
        },
    )
}

fn pixel_ring(ring: &[(f64, f64)]) -> Vec<(i64, i64)> {
    // Undo the (x, -y) mapping of the test transform
    ring.iter().map(|&(x, y)| (x as i64, -y as i64)).collect()
}

#[test]
fn test_rectangle_keeps_only_corners() {
    let data = Array2::from_elem((3, 5), 2.0);
    let polygons = polygonize(&raster(data)).unwrap();

    assert_eq!(polygons.len(), 1);
    assert_eq!(
        pixel_ring(&polygons[0].exterior),
        vec![(0, 0), (5, 0), (5, 3), (0, 3), (0, 0)]
    );
    assert_eq!(polygons[0].cell_count, 15);
    assert_eq!(polygons[0].area, 15.0);
}

#[test]
fn test_ring_region_has_hole() {
    let data = array![
        [2.0, 2.0, 2.0],
        [2.0, NAN, 2.0],
        [2.0, 2.0, 2.0],
    ];
    let polygons = polygonize(&raster(data)).unwrap();

    assert_eq!(polygons.len(), 1);
    let polygon = &polygons[0];
    assert_eq!(polygon.holes.len(), 1);
    assert_eq!(polygon.cell_count, 8);
    assert_eq!(polygon.area, 8.0);

    let hole = pixel_ring(&polygon.holes[0]);
    assert_eq!(hole.len(), 5);
    assert_eq!(hole.first(), hole.last());
    for corner in [(1, 1), (2, 1), (2, 2), (1, 2)] {
        assert!(hole.contains(&corner), "hole misses corner {:?}", corner);
    }

    let wkt = polygon.to_wkt();
    assert!(wkt.starts_with("POLYGON ((0 0, 3 0, 3 -3, 0 -3, 0 0), ("));
}

#[test]
fn test_diagonal_cells_stay_separate() {
    let data = array![
        [2.0, NAN],
        [NAN, 2.0],
    ];
    let polygons = polygonize(&raster(data)).unwrap();

    assert_eq!(polygons.len(), 2);
    for polygon in &polygons {
        assert_eq!(polygon.cell_count, 1);
        assert_eq!(polygon.exterior.len(), 5);
        assert!(polygon.holes.is_empty());
    }
}

#[test]
fn test_hole_touching_exterior_at_a_corner() {
    // Enclosed cell (1,1) touches the outside diagonally through (0,2)
    let data = array![
        [2.0, 2.0, NAN],
        [2.0, NAN, 2.0],
        [2.0, 2.0, 2.0],
    ];
    let polygons = polygonize(&raster(data)).unwrap();

    assert_eq!(polygons.len(), 1);
    assert_eq!(polygons[0].cell_count, 7);
    assert_eq!(polygons[0].holes.len(), 1);
    assert_eq!(polygons[0].area, 7.0);
}

#[test]
fn test_regions_split_by_value() {
    let data = array![
        [1.0, 1.0, 2.0],
        [1.0, 2.0, 2.0],
    ];
    let polygons = polygonize(&raster(data)).unwrap();

    assert_eq!(polygons.len(), 2);
    let ones = polygons.iter().find(|p| p.value == 1.0).unwrap();
    let twos = polygons.iter().find(|p| p.value == 2.0).unwrap();
    assert_eq!(ones.cell_count, 3);
    assert_eq!(twos.cell_count, 3);
    // L-shapes have six corners
    assert_eq!(ones.exterior.len(), 7);
    assert_eq!(twos.exterior.len(), 7);
}

#[test]
fn test_all_nodata_gives_no_polygons() {
    let data = Array2::from_elem((4, 4), NAN);
    assert!(polygonize(&raster(data)).unwrap().is_empty());
}
