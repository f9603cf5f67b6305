use proptest::prelude::*;
use std::io::Cursor;
use wt_windfield::{BtsHeader, ComponentScaling, WindField, WindFieldError};

fn field(nt: usize, ny: usize, nz: usize, ntwr: usize) -> WindField {
    let header = BtsHeader {
        format_tag: 7,
        nz: nz as i32,
        ny: ny as i32,
        ntwr: ntwr as i32,
        nt: nt as i32,
        dz: 10.0,
        dy: 10.0,
        dt: 0.1,
        mean_wind_speed: 8.0,
        hub_height: 90.0,
        grid_bottom: 60.0,
        scaling: [ComponentScaling { slope: 1.0, offset: 0.0 }; 3],
        description: "synthetic field".into(),
    };
    let velocity = (0..nt * 3 * ny * nz)
        .map(|i| 8.0 + ((i * 7) % 13) as f32 * 0.1 - 0.6)
        .collect();
    let tower = (0..nt * 3 * ntwr).map(|i| (i % 5) as f32 * 0.2).collect();
    let mut f = WindField::new(header, velocity, tower).unwrap();
    f.rescale();
    f
}

#[test]
fn write_then_read_preserves_header_and_shape() {
    let f = field(4, 3, 5, 2);
    let mut buf = Vec::new();
    f.write(&mut buf).unwrap();

    let g = WindField::read(&mut Cursor::new(buf)).unwrap();
    assert_eq!(g.header, f.header);
    assert_eq!(g.shape(), [4, 3, 3, 5]);
    assert_eq!(g.tower.len(), 4 * 3 * 2);
    for (a, b) in f.velocity.iter().zip(&g.velocity) {
        assert!((a - b).abs() < 1e-3);
    }
    for (a, b) in f.tower.iter().zip(&g.tower) {
        assert!((a - b).abs() < 1e-3);
    }
}

#[test]
fn file_round_trip() {
    let dir = std::env::temp_dir().join(format!("wt-windfield-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("field.bts");

    let f = field(2, 2, 2, 0);
    f.to_path(&path).unwrap();
    let g = WindField::from_path(&path).unwrap();
    assert_eq!(g.shape(), [2, 3, 2, 2]);
    assert!(g.tower.is_empty());
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn negative_description_length_is_rejected() {
    let f = field(1, 1, 1, 0);
    let mut buf = Vec::new();
    f.write(&mut buf).unwrap();
    // description length lives after the tag, 4 ints and 12 floats
    let off = 2 + 4 * 4 + 12 * 4;
    buf[off..off + 4].copy_from_slice(&(-3i32).to_le_bytes());
    let err = WindField::read(&mut Cursor::new(buf)).unwrap_err();
    assert!(matches!(err, WindFieldError::InvalidHeader { .. }));
}

#[test]
fn shape_mismatch_is_reported() {
    let f = field(1, 2, 2, 0);
    let err = WindField::new(f.header.clone(), vec![0.0; 5], vec![]).unwrap_err();
    assert!(matches!(
        err,
        WindFieldError::Shape { what: "velocity", expected: 12, actual: 5 }
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn decoded_values_stay_within_quantization(
        nt in 1usize..4, ny in 1usize..4, nz in 1usize..4, ntwr in 0usize..3
    ) {
        let f = field(nt, ny, nz, ntwr);
        let mut buf = Vec::new();
        f.write(&mut buf).unwrap();
        let g = WindField::read(&mut Cursor::new(buf)).unwrap();
        prop_assert_eq!(g.shape(), [nt, 3, ny, nz]);
        for it in 0..nt {
            for k in 0..3 {
                let slope = g.header.scaling[k].slope;
                for iy in 0..ny {
                    for iz in 0..nz {
                        let a = f.velocity_at(it, k, iy, iz).unwrap();
                        let b = g.velocity_at(it, k, iy, iz).unwrap();
                        prop_assert!((a - b).abs() <= 0.5 / slope + 1e-4);
                    }
                }
            }
        }
    }
}
