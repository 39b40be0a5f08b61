//! Well-Known Binary geometry decoding.
//!
//! Handles ISO WKB (Z/M/ZM type offsets) and PostGIS EWKB (flag bits with an
//! optional embedded SRID). Z and M ordinates are read and dropped.

use std::io::{Cursor, Read};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};

const EWKB_Z: u32 = 0x8000_0000;
const EWKB_M: u32 = 0x4000_0000;
const EWKB_SRID: u32 = 0x2000_0000;

/// Nesting guard for geometry collections.
const MAX_DEPTH: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum WkbError {
    #[error("truncated geometry: {0}")]
    Truncated(#[from] std::io::Error),

    #[error("invalid byte order marker {0}")]
    ByteOrder(u8),

    #[error("unsupported geometry type {0}")]
    GeometryType(u32),

    #[error("geometry collections nested too deeply")]
    TooDeep,
}

#[derive(Clone, Copy)]
enum Order {
    Big,
    Little,
}

struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Reader<'a> {
    fn u32(&mut self, order: Order) -> Result<u32, WkbError> {
        Ok(match order {
            Order::Big => self.cursor.read_u32::<BigEndian>()?,
            Order::Little => self.cursor.read_u32::<LittleEndian>()?,
        })
    }

    fn f64(&mut self, order: Order) -> Result<f64, WkbError> {
        Ok(match order {
            Order::Big => self.cursor.read_f64::<BigEndian>()?,
            Order::Little => self.cursor.read_f64::<LittleEndian>()?,
        })
    }

    fn order(&mut self) -> Result<Order, WkbError> {
        let mut marker = [0u8; 1];
        self.cursor.read_exact(&mut marker)?;
        match marker[0] {
            0 => Ok(Order::Big),
            1 => Ok(Order::Little),
            other => Err(WkbError::ByteOrder(other)),
        }
    }

    fn coord(&mut self, order: Order, dims: usize) -> Result<Coord<f64>, WkbError> {
        let x = self.f64(order)?;
        let y = self.f64(order)?;
        for _ in 2..dims {
            self.f64(order)?;
        }
        Ok(Coord { x, y })
    }

    fn coords(&mut self, order: Order, dims: usize) -> Result<Vec<Coord<f64>>, WkbError> {
        let count = self.u32(order)? as usize;
        self.check_remaining(count, dims * 8)?;
        (0..count).map(|_| self.coord(order, dims)).collect()
    }

    fn polygon(&mut self, order: Order, dims: usize) -> Result<Polygon<f64>, WkbError> {
        let rings = self.u32(order)? as usize;
        self.check_remaining(rings, 4)?;
        let mut rings = (0..rings)
            .map(|_| self.coords(order, dims).map(LineString::new))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter();
        let exterior = rings.next().unwrap_or_else(|| LineString::new(vec![]));
        Ok(Polygon::new(exterior, rings.collect()))
    }

    /// Reject counts that cannot fit in the rest of the buffer before allocating.
    fn check_remaining(&self, count: usize, min_size: usize) -> Result<(), WkbError> {
        let remaining = self.cursor.get_ref().len() as u64 - self.cursor.position();
        if (count as u64).saturating_mul(min_size as u64) > remaining {
            return Err(WkbError::Truncated(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("{} elements declared, {} bytes left", count, remaining),
            )));
        }
        Ok(())
    }

    fn geometry(&mut self, depth: usize) -> Result<Geometry<f64>, WkbError> {
        if depth > MAX_DEPTH {
            return Err(WkbError::TooDeep);
        }
        let order = self.order()?;
        let raw = self.u32(order)?;

        let mut has_z = raw & EWKB_Z != 0;
        let mut has_m = raw & EWKB_M != 0;
        if raw & EWKB_SRID != 0 {
            self.u32(order)?;
        }
        let iso = raw & 0x0FFF_FFFF;
        match iso / 1000 {
            0 => {}
            1 => has_z = true,
            2 => has_m = true,
            3 => {
                has_z = true;
                has_m = true;
            }
            _ => return Err(WkbError::GeometryType(raw)),
        }
        let dims = 2 + has_z as usize + has_m as usize;

        let geometry = match iso % 1000 {
            1 => Geometry::Point(Point::from(self.coord(order, dims)?)),
            2 => Geometry::LineString(LineString::new(self.coords(order, dims)?)),
            3 => Geometry::Polygon(self.polygon(order, dims)?),
            4..=7 => {
                let count = self.u32(order)? as usize;
                // every member carries at least an order byte and a type
                self.check_remaining(count, 5)?;
                let members = (0..count)
                    .map(|_| self.geometry(depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                collect(iso % 1000, members)?
            }
            _ => return Err(WkbError::GeometryType(raw)),
        };
        Ok(geometry)
    }
}

fn collect(kind: u32, members: Vec<Geometry<f64>>) -> Result<Geometry<f64>, WkbError> {
    let wrong = |g: &Geometry<f64>| WkbError::GeometryType(geometry_code(g));
    Ok(match kind {
        4 => Geometry::MultiPoint(MultiPoint::new(
            members
                .into_iter()
                .map(|g| match g {
                    Geometry::Point(p) => Ok(p),
                    other => Err(wrong(&other)),
                })
                .collect::<Result<_, _>>()?,
        )),
        5 => Geometry::MultiLineString(MultiLineString::new(
            members
                .into_iter()
                .map(|g| match g {
                    Geometry::LineString(l) => Ok(l),
                    other => Err(wrong(&other)),
                })
                .collect::<Result<_, _>>()?,
        )),
        6 => Geometry::MultiPolygon(MultiPolygon::new(
            members
                .into_iter()
                .map(|g| match g {
                    Geometry::Polygon(p) => Ok(p),
                    other => Err(wrong(&other)),
                })
                .collect::<Result<_, _>>()?,
        )),
        _ => Geometry::GeometryCollection(GeometryCollection::new_from(members)),
    })
}

fn geometry_code(geometry: &Geometry<f64>) -> u32 {
    match geometry {
        Geometry::Point(_) => 1,
        Geometry::LineString(_) | Geometry::Line(_) => 2,
        Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => 3,
        Geometry::MultiPoint(_) => 4,
        Geometry::MultiLineString(_) => 5,
        Geometry::MultiPolygon(_) => 6,
        Geometry::GeometryCollection(_) => 7,
    }
}

/// Decode one WKB or EWKB geometry.
pub fn parse_wkb(bytes: &[u8]) -> Result<Geometry<f64>, WkbError> {
    Reader {
        cursor: Cursor::new(bytes),
    }
    .geometry(0)
}

/// Geometry type name for error messages.
pub fn geometry_type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
