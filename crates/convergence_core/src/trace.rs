use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CobwebPoint {
    pub x: f64,
    pub y: f64,
}

impl CobwebPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<CobwebPoint> for (f64, f64) {
    fn from(point: CobwebPoint) -> Self {
        (point.x, point.y)
    }
}

/// Ordered cobweb path: the seed `(x0, 0)`, then for every step a vertical
/// move to `(x_in, x_out)` and a horizontal move to `(x_out, x_out)`.
///
/// Append-only; the engine drops the whole trace on initialize/reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CobwebTrace {
    points: Vec<CobwebPoint>,
}

impl CobwebTrace {
    pub fn seeded(x0: f64) -> Self {
        Self {
            points: vec![CobwebPoint::new(x0, 0.0)],
        }
    }

    /// Appends the two moves of one step and returns the three points that
    /// draw it, starting at the previous end of the path.
    pub fn push_step(&mut self, x_in: f64, x_out: f64) -> [CobwebPoint; 3] {
        let start = self
            .points
            .last()
            .copied()
            .unwrap_or(CobwebPoint::new(x_in, 0.0));
        let on_curve = CobwebPoint::new(x_in, x_out);
        let on_diagonal = CobwebPoint::new(x_out, x_out);
        self.points.push(on_curve);
        self.points.push(on_diagonal);
        [start, on_curve, on_diagonal]
    }

    pub fn points(&self) -> &[CobwebPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn seed(&self) -> Option<CobwebPoint> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<CobwebPoint> {
        self.points.last().copied()
    }

    /// `(x_in, x_out)` of every recorded step, in order.
    pub fn steps(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points
            .iter()
            .skip(1)
            .step_by(2)
            .map(|p| (p.x, p.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_trace_starts_on_the_axis() {
        let trace = CobwebTrace::seeded(0.5);
        assert_eq!(trace.points(), &[CobwebPoint::new(0.5, 0.0)]);
        assert_eq!(trace.steps().count(), 0);
    }

    #[test]
    fn push_step_appends_vertical_then_horizontal_move() {
        let mut trace = CobwebTrace::seeded(1.0);
        let segment = trace.push_step(1.0, 2.0);
        assert_eq!(
            segment,
            [
                CobwebPoint::new(1.0, 0.0),
                CobwebPoint::new(1.0, 2.0),
                CobwebPoint::new(2.0, 2.0)
            ]
        );

        let segment = trace.push_step(2.0, 3.0);
        assert_eq!(segment[0], CobwebPoint::new(2.0, 2.0));
        assert_eq!(trace.len(), 5);
        assert_eq!(trace.last(), Some(CobwebPoint::new(3.0, 3.0)));
        assert_eq!(trace.steps().collect::<Vec<_>>(), vec![(1.0, 2.0), (2.0, 3.0)]);
    }
}
