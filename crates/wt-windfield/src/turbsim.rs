//! Reader and writer for the TurbSim full-field format.

use crate::error::{WindFieldError, WindFieldResult};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// Longest description TurbSim writes.
pub const MAX_DESCRIPTION: usize = 200;

/// Number of velocity components (u, v, w).
const NFFC: usize = 3;

/// Linear i16 scaling of one velocity component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComponentScaling {
    pub slope: f32,
    pub offset: f32,
}

impl ComponentScaling {
    fn decode(&self, raw: i16) -> f32 {
        (raw as f32 - self.offset) / self.slope
    }

    fn encode(&self, v: f32) -> i16 {
        (v * self.slope + self.offset)
            .round()
            .clamp(i16::MIN as f32, i16::MAX as f32) as i16
    }

    /// Scaling that maps `[min, max]` onto the full i16 range.
    pub fn spanning(min: f32, max: f32) -> Self {
        let range = u16::MAX as f32;
        let span = max - min;
        let slope = if span > 0.0 { range / span } else { 1.0 };
        ComponentScaling {
            slope,
            offset: i16::MIN as f32 - slope * min,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BtsHeader {
    pub format_tag: i16,
    pub nz: i32,
    pub ny: i32,
    pub ntwr: i32,
    pub nt: i32,
    pub dz: f32,
    pub dy: f32,
    pub dt: f32,
    pub mean_wind_speed: f32,
    pub hub_height: f32,
    pub grid_bottom: f32,
    pub scaling: [ComponentScaling; 3],
    /// Raw description bytes, kept as stored.
    pub description: Vec<u8>,
}

impl BtsHeader {
    /// `(nt, ny, nz, ntwr)` as sizes.
    pub fn dims(&self) -> WindFieldResult<(usize, usize, usize, usize)> {
        let conv = |v: i32, what: &str| {
            usize::try_from(v).map_err(|_| WindFieldError::InvalidHeader {
                what: format!("negative {what}: {v}"),
            })
        };
        Ok((
            conv(self.nt, "nt")?,
            conv(self.ny, "ny")?,
            conv(self.nz, "nz")?,
            conv(self.ntwr, "ntwr")?,
        ))
    }

    /// Description for display, with invalid UTF-8 replaced.
    pub fn description_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.description)
    }

    fn grid_len(&self) -> WindFieldResult<usize> {
        let (nt, ny, nz, _) = self.dims()?;
        checked_product(&[nt, NFFC, ny, nz])
    }

    fn tower_len(&self) -> WindFieldResult<usize> {
        let (nt, _, _, ntwr) = self.dims()?;
        checked_product(&[nt, NFFC, ntwr])
    }

    fn read<R: Read>(r: &mut R) -> WindFieldResult<Self> {
        let format_tag = r.read_i16::<LittleEndian>()?;
        let nz = r.read_i32::<LittleEndian>()?;
        let ny = r.read_i32::<LittleEndian>()?;
        let ntwr = r.read_i32::<LittleEndian>()?;
        let nt = r.read_i32::<LittleEndian>()?;

        let mut f = [0f32; 6];
        r.read_f32_into::<LittleEndian>(&mut f)?;
        let [dz, dy, dt, mean_wind_speed, hub_height, grid_bottom] = f;

        let mut s = [0f32; 6];
        r.read_f32_into::<LittleEndian>(&mut s)?;
        let scaling = [
            ComponentScaling { slope: s[0], offset: s[1] },
            ComponentScaling { slope: s[2], offset: s[3] },
            ComponentScaling { slope: s[4], offset: s[5] },
        ];

        let nchar = r.read_i32::<LittleEndian>()?;
        let nchar = usize::try_from(nchar).map_err(|_| WindFieldError::InvalidHeader {
            what: format!("negative description length: {nchar}"),
        })?;
        if nchar > MAX_DESCRIPTION {
            return Err(WindFieldError::InvalidHeader {
                what: format!("description is {nchar} bytes, at most {MAX_DESCRIPTION} allowed"),
            });
        }
        let mut description = vec![0u8; nchar];
        r.read_exact(&mut description)?;

        let header = BtsHeader {
            format_tag,
            nz,
            ny,
            ntwr,
            nt,
            dz,
            dy,
            dt,
            mean_wind_speed,
            hub_height,
            grid_bottom,
            scaling,
            description,
        };
        header.validate()?;
        Ok(header)
    }

    fn write<W: Write>(&self, w: &mut W) -> WindFieldResult<()> {
        self.validate()?;
        if self.description.len() > MAX_DESCRIPTION {
            return Err(WindFieldError::InvalidHeader {
                what: format!(
                    "description is {} bytes, at most {MAX_DESCRIPTION} allowed",
                    self.description.len()
                ),
            });
        }

        w.write_i16::<LittleEndian>(self.format_tag)?;
        for v in [self.nz, self.ny, self.ntwr, self.nt] {
            w.write_i32::<LittleEndian>(v)?;
        }
        for v in [
            self.dz,
            self.dy,
            self.dt,
            self.mean_wind_speed,
            self.hub_height,
            self.grid_bottom,
        ] {
            w.write_f32::<LittleEndian>(v)?;
        }
        for s in &self.scaling {
            w.write_f32::<LittleEndian>(s.slope)?;
            w.write_f32::<LittleEndian>(s.offset)?;
        }
        w.write_i32::<LittleEndian>(self.description.len() as i32)?;
        w.write_all(&self.description)?;
        Ok(())
    }

    fn validate(&self) -> WindFieldResult<()> {
        self.dims()?;
        if self.scaling.iter().any(|s| s.slope == 0.0 || !s.slope.is_finite()) {
            return Err(WindFieldError::InvalidHeader {
                what: "component slope must be finite and non-zero".into(),
            });
        }
        Ok(())
    }
}

fn checked_product(dims: &[usize]) -> WindFieldResult<usize> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .filter(|&n| n <= isize::MAX as usize / size_of::<f32>())
        .ok_or_else(|| WindFieldError::InvalidHeader {
            what: format!("grid dimensions {dims:?} overflow"),
        })
}

/// Buffer of `n` default values, failing instead of aborting when the
/// allocation cannot be made.
fn buffer<T: Clone + Default>(n: usize) -> WindFieldResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(n)
        .map_err(|e| WindFieldError::InvalidHeader {
            what: format!("cannot allocate {n} values: {e}"),
        })?;
    v.resize(n, T::default());
    Ok(v)
}

/// Decoded full-field turbulence.
///
/// `velocity` has shape `(nt, 3, ny, nz)` and `tower` has shape
/// `(nt, 3, ntwr)`, both row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct WindField {
    pub header: BtsHeader,
    pub velocity: Vec<f32>,
    pub tower: Vec<f32>,
}

impl WindField {
    pub fn new(header: BtsHeader, velocity: Vec<f32>, tower: Vec<f32>) -> WindFieldResult<Self> {
        let field = Self {
            header,
            velocity,
            tower,
        };
        field.check_shape()?;
        Ok(field)
    }

    fn check_shape(&self) -> WindFieldResult<()> {
        self.header.validate()?;
        let expected = self.header.grid_len()?;
        if self.velocity.len() != expected {
            return Err(WindFieldError::Shape {
                what: "velocity",
                expected,
                actual: self.velocity.len(),
            });
        }
        let expected = self.header.tower_len()?;
        if self.tower.len() != expected {
            return Err(WindFieldError::Shape {
                what: "tower",
                expected,
                actual: self.tower.len(),
            });
        }
        Ok(())
    }

    /// Replace the header scaling with one spanning each component's range.
    pub fn rescale(&mut self) {
        for k in 0..NFFC {
            let (mut lo, mut hi) = (f32::INFINITY, f32::NEG_INFINITY);
            for v in self.component_values(k) {
                lo = lo.min(v);
                hi = hi.max(v);
            }
            if lo.is_finite() && hi.is_finite() {
                self.header.scaling[k] = ComponentScaling::spanning(lo, hi);
            }
        }
    }

    fn component_values(&self, k: usize) -> impl Iterator<Item = f32> + '_ {
        let (nt, ny, nz, ntwr) = self.header.dims().unwrap_or((0, 0, 0, 0));
        let plane = ny * nz;
        let grid = (0..nt).flat_map(move |it| {
            let start = (it * NFFC + k) * plane;
            self.velocity.get(start..start + plane).into_iter().flatten().copied()
        });
        let tower = (0..nt).flat_map(move |it| {
            let start = (it * NFFC + k) * ntwr;
            self.tower.get(start..start + ntwr).into_iter().flatten().copied()
        });
        grid.chain(tower)
    }

    /// `(nt, 3, ny, nz)`
    pub fn shape(&self) -> [usize; 4] {
        let (nt, ny, nz, _) = self.header.dims().unwrap_or((0, 0, 0, 0));
        [nt, NFFC, ny, nz]
    }

    pub fn velocity_at(&self, it: usize, k: usize, iy: usize, iz: usize) -> Option<f32> {
        let [nt, nc, ny, nz] = self.shape();
        if it >= nt || k >= nc || iy >= ny || iz >= nz {
            return None;
        }
        self.velocity.get(((it * nc + k) * ny + iy) * nz + iz).copied()
    }

    pub fn tower_at(&self, it: usize, k: usize, itw: usize) -> Option<f32> {
        let (nt, _, _, ntwr) = self.header.dims().ok()?;
        if it >= nt || k >= NFFC || itw >= ntwr {
            return None;
        }
        self.tower.get((it * NFFC + k) * ntwr + itw).copied()
    }

    pub fn read<R: Read>(r: &mut R) -> WindFieldResult<Self> {
        let header = BtsHeader::read(r)?;
        let (nt, ny, nz, ntwr) = header.dims()?;
        header.grid_len()?;
        header.tower_len()?;
        let nv = checked_product(&[NFFC, ny, nz])?;
        let nv_twr = checked_product(&[NFFC, ntwr])?;

        // Grown one time step at a time so a short file fails on read.
        let mut velocity = Vec::new();
        let mut tower = Vec::new();
        let mut raw = buffer::<i16>(nv)?;
        let mut raw_twr = buffer::<i16>(nv_twr)?;
        let mut step = buffer::<f32>(nv)?;
        let mut step_twr = buffer::<f32>(nv_twr)?;

        for _ in 0..nt {
            r.read_i16_into::<LittleEndian>(&mut raw)?;
            let mut ip = 0;
            for iz in 0..nz {
                for iy in 0..ny {
                    for (k, s) in header.scaling.iter().enumerate() {
                        step[(k * ny + iy) * nz + iz] = s.decode(raw[ip]);
                        ip += 1;
                    }
                }
            }
            velocity.extend_from_slice(&step);

            if ntwr > 0 {
                r.read_i16_into::<LittleEndian>(&mut raw_twr)?;
                let mut ip = 0;
                for itw in 0..ntwr {
                    for (k, s) in header.scaling.iter().enumerate() {
                        step_twr[k * ntwr + itw] = s.decode(raw_twr[ip]);
                        ip += 1;
                    }
                }
                tower.extend_from_slice(&step_twr);
            }
        }

        debug!(nt, ny, nz, ntwr, "read turbsim full field");
        Ok(Self {
            header,
            velocity,
            tower,
        })
    }

    pub fn write<W: Write>(&self, w: &mut W) -> WindFieldResult<()> {
        self.check_shape()?;
        self.header.write(w)?;
        let (nt, ny, nz, ntwr) = self.header.dims()?;
        let s = &self.header.scaling;

        for it in 0..nt {
            for iz in 0..nz {
                for iy in 0..ny {
                    for (k, sk) in s.iter().enumerate() {
                        let v = self.velocity[((it * NFFC + k) * ny + iy) * nz + iz];
                        w.write_i16::<LittleEndian>(sk.encode(v))?;
                    }
                }
            }
            for itw in 0..ntwr {
                for (k, sk) in s.iter().enumerate() {
                    let v = self.tower[(it * NFFC + k) * ntwr + itw];
                    w.write_i16::<LittleEndian>(sk.encode(v))?;
                }
            }
        }
        Ok(())
    }

    pub fn from_path(path: impl AsRef<Path>) -> WindFieldResult<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read(&mut reader)
    }

    pub fn to_path(&self, path: impl AsRef<Path>) -> WindFieldResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(nt: i32, ny: i32, nz: i32, ntwr: i32) -> BtsHeader {
        BtsHeader {
            format_tag: 7,
            nz,
            ny,
            ntwr,
            nt,
            dz: 5.0,
            dy: 5.0,
            dt: 0.05,
            mean_wind_speed: 11.4,
            hub_height: 90.0,
            grid_bottom: 30.0,
            scaling: [
                ComponentScaling { slope: 1000.0, offset: -11400.0 },
                ComponentScaling { slope: 1000.0, offset: 0.0 },
                ComponentScaling { slope: 1000.0, offset: 0.0 },
            ],
            description: "Generated by TurbSim".into(),
        }
    }

    #[test]
    fn header_field_order_on_disk() {
        let h = header(2, 3, 4, 0);
        let mut buf = Vec::new();
        h.write(&mut buf).unwrap();
        assert_eq!(&buf[0..2], &7i16.to_le_bytes());
        // nz precedes ny
        assert_eq!(&buf[2..6], &4i32.to_le_bytes());
        assert_eq!(&buf[6..10], &3i32.to_le_bytes());
        assert_eq!(buf.len(), 2 + 4 * 4 + 6 * 4 + 6 * 4 + 4 + h.description.len());
    }

    #[test]
    fn decodes_component_fastest() {
        let h = header(1, 2, 1, 0);
        let mut buf = Vec::new();
        h.write(&mut buf).unwrap();
        // iz = 0: iy = 0 (u, v, w), iy = 1 (u, v, w)
        for raw in [0i16, 500, -500, 1000, 250, 0] {
            buf.extend_from_slice(&raw.to_le_bytes());
        }
        let f = WindField::read(&mut Cursor::new(buf)).unwrap();
        assert_eq!(f.shape(), [1, 3, 2, 1]);
        assert!((f.velocity_at(0, 0, 0, 0).unwrap() - 11.4).abs() < 1e-4);
        assert!((f.velocity_at(0, 1, 0, 0).unwrap() - 0.5).abs() < 1e-6);
        assert!((f.velocity_at(0, 2, 0, 0).unwrap() + 0.5).abs() < 1e-6);
        assert!((f.velocity_at(0, 0, 1, 0).unwrap() - 12.4).abs() < 1e-4);
        assert!((f.velocity_at(0, 1, 1, 0).unwrap() - 0.25).abs() < 1e-6);
        assert_eq!(f.velocity_at(1, 0, 0, 0), None);
    }

    #[test]
    fn truncated_data_is_io_error() {
        let h = header(2, 2, 2, 0);
        let mut buf = Vec::new();
        h.write(&mut buf).unwrap();
        buf.extend_from_slice(&[0u8; 10]);
        let err = WindField::read(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, WindFieldError::Io(_)));
    }

    #[test]
    fn rejects_bad_headers() {
        let mut h = header(1, 1, 1, 0);
        h.description = vec![b'x'; MAX_DESCRIPTION + 1];
        assert!(h.write(&mut Vec::new()).is_err());

        let mut h = header(1, 1, 1, 0);
        h.ny = -1;
        assert!(h.write(&mut Vec::new()).is_err());

        let mut h = header(1, 1, 1, 0);
        h.scaling[1].slope = 0.0;
        assert!(WindField::new(h, vec![0.0; 3], vec![]).is_err());
    }

    #[test]
    fn oversized_grid_is_an_error() {
        let mut buf = Vec::new();
        header(1, 1, 1, 0).write(&mut buf).unwrap();
        // nz, ny and nt on disk, no data behind them
        buf[2..6].copy_from_slice(&(1i32 << 15).to_le_bytes());
        buf[6..10].copy_from_slice(&(1i32 << 15).to_le_bytes());
        buf[14..18].copy_from_slice(&i32::MAX.to_le_bytes());
        let err = WindField::read(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, WindFieldError::InvalidHeader { .. }));
    }

    #[test]
    fn large_grid_with_short_data_fails_on_read() {
        let mut buf = Vec::new();
        header(1, 1, 1, 0).write(&mut buf).unwrap();
        buf[14..18].copy_from_slice(&1_000_000i32.to_le_bytes());
        buf.extend_from_slice(&[0u8; 6]);
        let err = WindField::read(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, WindFieldError::Io(_)));
    }

    #[test]
    fn long_description_on_disk_is_rejected() {
        let mut buf = Vec::new();
        header(1, 1, 1, 0).write(&mut buf).unwrap();
        let off = 2 + 4 * 4 + 12 * 4;
        buf[off..off + 4].copy_from_slice(&(i32::MAX).to_le_bytes());
        let err = WindField::read(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, WindFieldError::InvalidHeader { .. }));
    }

    #[test]
    fn description_bytes_survive_unchanged() {
        let mut h = header(1, 1, 1, 0);
        h.description = vec![b'T', 0xff, b'S', 0x80];
        let mut buf = Vec::new();
        h.write(&mut buf).unwrap();
        buf.extend_from_slice(&[0u8; 6]);
        let f = WindField::read(&mut Cursor::new(buf)).unwrap();
        assert_eq!(f.header.description, vec![b'T', 0xff, b'S', 0x80]);
        assert_eq!(f.header.description_text(), "T\u{fffd}S\u{fffd}");
    }

    #[test]
    fn spanning_scale_covers_range() {
        let s = ComponentScaling::spanning(-2.0, 18.0);
        assert_eq!(s.encode(-2.0), i16::MIN);
        assert_eq!(s.encode(18.0), i16::MAX);
        assert!((s.decode(s.encode(8.0)) - 8.0).abs() < 1e-3);
    }
}
