use std::time::Instant;

use rayon::prelude::*;

use crate::geometry::{Dispatch, GridExtent, InvocationId};
use crate::pattern::{shade, PatternParams, Rgba};
use crate::surface::Surface;

/// How a CPU dispatch distributes invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// One thread, row by row.
    Serial,
    /// Rows are spread across the `rayon` pool.
    #[default]
    Parallel,
}

/// Summary of one CPU dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Invocations whose coordinate landed inside the surface and stored a texel.
    pub stored: u64,
    /// Invocations that fell outside the surface and wrote nothing.
    pub dropped: u64,
}

/// Runs `dispatch` over `surface` at time `t`.
///
/// Every invocation of the grid whose coordinate lies inside the surface stores
/// exactly one texel at its own coordinate. Invocations beyond the surface
/// edge are dropped, and texels beyond the grid edge keep their previous
/// value. Both strategies produce bit-identical surfaces.
pub fn execute(
    surface: &mut Surface,
    dispatch: &Dispatch,
    t: f32,
    params: &PatternParams,
    strategy: Strategy,
) -> ExecutionStats {
    let extent = dispatch.extent();
    let width = surface.width() as usize;
    let covered_w = extent.width().min(surface.width());
    let covered_h = extent.height().min(surface.height()) as usize;
    let started = Instant::now();

    let rows = &mut surface.texels_mut()[..covered_h * width];
    match strategy {
        Strategy::Serial => rows
            .chunks_exact_mut(width)
            .enumerate()
            .for_each(|(y, row)| shade_row(row, y as u32, covered_w, extent, t, params)),
        Strategy::Parallel => rows
            .par_chunks_exact_mut(width)
            .enumerate()
            .for_each(|(y, row)| shade_row(row, y as u32, covered_w, extent, t, params)),
    }

    let stored = u64::from(covered_w) * covered_h as u64;
    let stats = ExecutionStats {
        stored,
        dropped: dispatch.invocation_count() - stored,
    };
    tracing::trace!(
        ?strategy,
        t,
        stored = stats.stored,
        dropped = stats.dropped,
        elapsed_us = started.elapsed().as_micros(),
        "cpu dispatch complete"
    );
    stats
}

fn shade_row(
    row: &mut [Rgba],
    y: u32,
    covered_w: u32,
    extent: GridExtent,
    t: f32,
    params: &PatternParams,
) {
    for (x, texel) in row[..covered_w as usize].iter_mut().enumerate() {
        *texel = shade(InvocationId::new(x as u32, y), extent, t, params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_fit_writes_every_texel() {
        let dispatch = Dispatch::new(4, 3).unwrap();
        let mut surface = Surface::new(40, 30).unwrap();
        let params = PatternParams::default();
        let stats = execute(&mut surface, &dispatch, 0.5, &params, Strategy::Serial);
        assert_eq!(stats.stored, 1200);
        assert_eq!(stats.dropped, 0);
        let extent = dispatch.extent();
        for y in 0..30 {
            for x in 0..40 {
                let expected = shade(InvocationId::new(x, y), extent, 0.5, &params);
                assert!(surface.get(x, y).unwrap().bit_eq(&expected));
            }
        }
    }

    #[test]
    fn parallel_matches_serial_bit_for_bit() {
        let dispatch = Dispatch::new(13, 7).unwrap();
        let params = PatternParams::default();
        let mut serial = Surface::new(130, 70).unwrap();
        let mut parallel = Surface::new(130, 70).unwrap();
        execute(&mut serial, &dispatch, 42.125, &params, Strategy::Serial);
        execute(&mut parallel, &dispatch, 42.125, &params, Strategy::Parallel);
        assert_eq!(serial.as_bytes(), parallel.as_bytes());
    }

    #[test]
    fn overrun_drops_invocations_but_keeps_grid_denominators() {
        let dispatch = Dispatch::covering(25, 15).unwrap();
        assert_eq!(dispatch.workgroups(), (3, 2));
        let mut surface = Surface::new(25, 15).unwrap();
        let params = PatternParams::default();
        let stats = execute(&mut surface, &dispatch, 0.0, &params, Strategy::Parallel);
        assert_eq!(stats.stored, 25 * 15);
        assert_eq!(stats.dropped, 30 * 20 - 25 * 15);

        let texel = surface.get(24, 14).unwrap();
        assert!((texel.r - 24.0 / 30.0).abs() < 1e-6);
        assert!((texel.g - 14.0 / 20.0).abs() < 1e-6);
    }

    #[test]
    fn partial_coverage_leaves_uncovered_texels_untouched() {
        let dispatch = Dispatch::new(1, 1).unwrap();
        let mut surface = Surface::new(15, 12).unwrap();
        let stats = execute(
            &mut surface,
            &dispatch,
            0.0,
            &PatternParams::default(),
            Strategy::Serial,
        );
        assert_eq!(stats.stored, 100);
        assert_eq!(surface.get(9, 9).unwrap().a, 1.0);
        assert_eq!(surface.get(10, 0), Some(Rgba::TRANSPARENT));
        assert_eq!(surface.get(0, 10), Some(Rgba::TRANSPARENT));
        assert_eq!(surface.get(14, 11), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn redispatch_overwrites_without_accumulating() {
        let dispatch = Dispatch::new(2, 2).unwrap();
        let params = PatternParams::default();
        let mut reused = Surface::new(20, 20).unwrap();
        execute(&mut reused, &dispatch, 3.0, &params, Strategy::Parallel);
        execute(&mut reused, &dispatch, 7.5, &params, Strategy::Parallel);
        let mut fresh = Surface::new(20, 20).unwrap();
        execute(&mut fresh, &dispatch, 7.5, &params, Strategy::Parallel);
        assert_eq!(reused.as_bytes(), fresh.as_bytes());
    }
}
