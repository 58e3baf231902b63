use std::collections::BTreeSet;

use log::warn;
use ndarray::Array2;
use serde::Deserialize;

use crate::error::VariogramError;

use super::{aggregator::MissingValues, representations::HeatVariogram};

/// 8 bit RGB colour, parsed from `#rrggbb` in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear interpolation, `t = 0` gives `self` and `t = 1` gives `other`.
    pub fn lerp(&self, other: &Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let hex = value.strip_prefix('#').unwrap_or(&value);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("expected a colour of the form #rrggbb, found {value}"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| format!("invalid colour {value}: {e}"))
        };
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Colour ramp endpoints and resolution used to shade surface facets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SurfaceColors {
    pub low: Rgb,
    pub high: Rgb,
    pub levels: usize,
}

impl Default for SurfaceColors {
    fn default() -> Self {
        Self {
            low: Rgb::new(0x21, 0x66, 0xac),
            high: Rgb::new(0xb2, 0x18, 0x2b),
            levels: 100,
        }
    }
}

/// Fixed size sequence of colours evenly spaced between two endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    pub colors: Vec<Rgb>,
}

impl ColorRamp {
    pub fn new(low: Rgb, high: Rgb, levels: usize) -> Self {
        let levels = levels.max(1);
        let colors = (0..levels)
            .map(|k| {
                let t = if levels == 1 {
                    0.0
                } else {
                    k as f64 / (levels - 1) as f64
                };
                low.lerp(&high, t)
            })
            .collect();
        Self { colors }
    }

    /// Colour of `value` for equal width bins over `[min, max]`.
    pub fn color_for(&self, value: f64, min: f64, max: f64) -> Rgb {
        let levels = self.colors.len();
        let ind = if max > min {
            (((value - min) / (max - min)) * levels as f64).floor() as usize
        } else {
            0
        };
        self.colors[ind.min(levels - 1)]
    }
}

impl From<&SurfaceColors> for ColorRamp {
    fn from(colors: &SurfaceColors) -> Self {
        ColorRamp::new(colors.low, colors.high, colors.levels)
    }
}

/// Heat variogram laid out as a renderable surface.
///
/// Rows follow the distinct absolute row lags, columns the distinct absolute
/// column lags. Facets are the `(rows - 1) x (cols - 1)` quadrilaterals
/// between neighbouring nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMesh {
    pub row_lags: Vec<usize>,
    pub col_lags: Vec<usize>,
    /// Physical separation of each row level.
    pub x: Vec<f64>,
    /// Physical separation of each column level.
    pub y: Vec<f64>,
    pub z: Array2<Option<f64>>,
    pub counts: Array2<u64>,
    pub facets: Array2<Option<f64>>,
    pub facet_colors: Array2<Option<Rgb>>,
    zlim: Option<[f64; 2]>,
    colors: SurfaceColors,
    missing: MissingValues,
}

impl SurfaceMesh {
    pub fn from_heat(heat: &HeatVariogram, colors: &SurfaceColors, missing: MissingValues) -> Self {
        let row_lags = heat
            .cells
            .iter()
            .map(|c| c.row_lag)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        let col_lags = heat
            .cells
            .iter()
            .map(|c| c.col_lag)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();

        let mut x = vec![0f64; row_lags.len()];
        let mut y = vec![0f64; col_lags.len()];
        let mut z = Array2::from_elem((row_lags.len(), col_lags.len()), None);
        let mut counts = Array2::zeros((row_lags.len(), col_lags.len()));

        for cell in heat.cells.iter() {
            //levels are built from these cells so both searches succeed
            let (Ok(i), Ok(j)) = (
                row_lags.binary_search(&cell.row_lag),
                col_lags.binary_search(&cell.col_lag),
            ) else {
                continue;
            };
            x[i] = cell.x;
            y[j] = cell.y;
            z[[i, j]] = cell.mean_sq_diff;
            counts[[i, j]] = cell.pair_count;
        }

        let mut surface = Self {
            row_lags,
            col_lags,
            x,
            y,
            z,
            counts,
            facets: Array2::from_elem((0, 0), None),
            facet_colors: Array2::from_elem((0, 0), None),
            zlim: None,
            colors: colors.clone(),
            missing,
        };
        surface.shade();
        surface
    }

    /// Range of the present `z` values.
    pub fn zlim(&self) -> Result<[f64; 2], VariogramError> {
        self.zlim.ok_or(VariogramError::NoStableCells)
    }

    /// Copy with `z` removed wherever fewer than `min_pairs` pairs contributed.
    ///
    /// `zlim`, facets and facet colours are recomputed from what remains.
    pub fn filter_unstable(&self, min_pairs: u64) -> Self {
        let mut surface = self.clone();
        surface
            .z
            .zip_mut_with(&self.counts, |z, &count| {
                if count < min_pairs {
                    *z = None;
                }
            });
        surface.shade();
        if surface.zlim.is_none() {
            warn!("SurfaceMesh::filter_unstable: no cell has at least {min_pairs} pairs");
        }
        surface
    }

    fn shade(&mut self) {
        self.zlim = value_range(self.z.iter().copied());

        let (rows, cols) = self.z.dim();
        let missing = self.missing;
        let z = &self.z;
        self.facets = Array2::from_shape_fn(
            (rows.saturating_sub(1), cols.saturating_sub(1)),
            |(i, j)| {
                missing.mean([
                    z[[i, j]],
                    z[[i + 1, j]],
                    z[[i, j + 1]],
                    z[[i + 1, j + 1]],
                ])
            },
        );

        let ramp = ColorRamp::from(&self.colors);
        self.facet_colors = match value_range(self.facets.iter().copied()) {
            Some([min, max]) => self
                .facets
                .mapv(|facet| facet.map(|v| ramp.color_for(v, min, max))),
            None => self.facets.mapv(|_| None),
        };
    }
}

fn value_range<I>(values: I) -> Option<[f64; 2]>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values.into_iter().flatten().fold(None, |range, v| match range {
        None => Some([v, v]),
        Some([lo, hi]) => Some([lo.min(v), hi.max(v)]),
    })
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;
    use crate::variography::representations::HeatCell;

    fn cell(row_lag: usize, col_lag: usize, msd: f64, pair_count: u64) -> HeatCell {
        HeatCell {
            row_lag,
            col_lag,
            x: row_lag as f64 * 2.0,
            y: col_lag as f64,
            mean_sq_diff: Some(msd),
            pair_count,
            members: 2,
        }
    }

    fn heat() -> HeatVariogram {
        //3 x 2 levels, (0, 0) never appears as a lag
        HeatVariogram {
            cells: vec![
                cell(0, 1, 1.0, 100),
                cell(1, 0, 2.0, 100),
                cell(1, 1, 3.0, 10),
                cell(2, 0, 4.0, 50),
                cell(2, 1, 6.0, 50),
            ],
        }
    }

    #[test]
    fn rgb_from_hex() {
        assert_eq!(Rgb::try_from("#ff8000".to_string()), Ok(Rgb::new(255, 128, 0)));
        assert_eq!(Rgb::new(1, 2, 255).to_hex(), "#0102ff");
        assert!(Rgb::try_from("red".to_string()).is_err());
    }

    #[test]
    fn ramp_spans_endpoints() {
        let ramp = ColorRamp::new(Rgb::new(0, 0, 0), Rgb::new(255, 255, 255), 100);
        assert_eq!(ramp.colors.len(), 100);
        assert_eq!(ramp.colors[0], Rgb::new(0, 0, 0));
        assert_eq!(ramp.colors[99], Rgb::new(255, 255, 255));
        assert_eq!(ramp.color_for(10.0, 0.0, 10.0), ramp.colors[99]);
        assert_eq!(ramp.color_for(4.95, 0.0, 10.0), ramp.colors[49]);
        assert_eq!(ramp.color_for(3.0, 3.0, 3.0), ramp.colors[0]);
    }

    #[test]
    fn surface_layout() {
        let surface = SurfaceMesh::from_heat(&heat(), &SurfaceColors::default(), MissingValues::Ignore);

        assert_eq!(surface.row_lags, vec![0, 1, 2]);
        assert_eq!(surface.col_lags, vec![0, 1]);
        assert_eq!(surface.x, vec![0.0, 2.0, 4.0]);
        assert_eq!(surface.z[[0, 0]], None);
        assert_eq!(surface.counts[[0, 0]], 0);
        assert_eq!(surface.z[[2, 1]], Some(6.0));
        assert_eq!(surface.zlim().unwrap(), [1.0, 6.0]);

        //facet means skip the missing corner
        assert_eq!(surface.facets.dim(), (2, 1));
        assert_relative_eq!(surface.facets[[0, 0]].unwrap(), 2.0);
        assert_relative_eq!(surface.facets[[1, 0]].unwrap(), 3.75);
        assert_eq!(surface.facet_colors[[0, 0]], Some(SurfaceColors::default().low));
        assert_eq!(surface.facet_colors[[1, 0]], Some(SurfaceColors::default().high));
    }

    #[test]
    fn propagated_missing_corner_blanks_facet() {
        let surface =
            SurfaceMesh::from_heat(&heat(), &SurfaceColors::default(), MissingValues::Propagate);
        assert_eq!(surface.facets[[0, 0]], None);
        assert_eq!(surface.facet_colors[[0, 0]], None);
        assert_relative_eq!(surface.facets[[1, 0]].unwrap(), 3.75);
    }

    #[test]
    fn filter_recomputes_zlim() {
        let surface = SurfaceMesh::from_heat(&heat(), &SurfaceColors::default(), MissingValues::Ignore);

        let filtered = surface.filter_unstable(60);
        assert_eq!(filtered.zlim().unwrap(), [1.0, 2.0]);
        assert_eq!(filtered.z[[1, 1]], None);
        assert_eq!(filtered.z.dim(), surface.z.dim());
        //canonical surface untouched
        assert_eq!(surface.z[[1, 1]], Some(3.0));

        let filtered = surface.filter_unstable(101);
        assert_eq!(filtered.zlim(), Err(VariogramError::NoStableCells));
        assert!(filtered.facet_colors.iter().all(|c| c.is_none()));

        assert_eq!(surface.filter_unstable(0), surface);
    }

    #[test]
    fn single_level_surface_has_no_facets() {
        let heat = HeatVariogram {
            cells: vec![cell(0, 1, 1.0, 5), cell(0, 2, 2.0, 5)],
        };
        let surface = SurfaceMesh::from_heat(&heat, &SurfaceColors::default(), MissingValues::Ignore);
        assert_eq!(surface.facets.dim(), (0, 1));
        assert_eq!(surface.facets.len(), 0);
        assert_eq!(surface.zlim().unwrap(), [1.0, 2.0]);
    }
}
