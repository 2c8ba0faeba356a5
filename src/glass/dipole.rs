use std::f64::consts::PI;

/// One dot pair of a Glass pattern. Orientation is undirected, so `θ` and
/// `θ + π` describe the same dipole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dipole {
    pub anchor: (f64, f64),
    pub orientation: f64,
    pub is_signal: bool,
}

impl Dipole {
    /// Both dot centres, `anchor ± half_shift · (cos θ, sin θ)`.
    pub fn dot_centers(&self, half_shift: f64) -> [(f64, f64); 2] {
        let (ux, uy) = (self.orientation.cos(), self.orientation.sin());
        let (x, y) = self.anchor;
        [
            (x + ux * half_shift, y + uy * half_shift),
            (x - ux * half_shift, y - uy * half_shift),
        ]
    }
}

/// Orientation of a signal dipole at `anchor`: the polar angle around
/// `center` rotated by `rotation`. `None` at the centre itself.
pub fn field_orientation(anchor: (f64, f64), center: (f64, f64), rotation: f64) -> Option<f64> {
    let rx = anchor.0 - center.0;
    let ry = anchor.1 - center.1;
    if rx.hypot(ry) < 1e-6 {
        return None;
    }
    Some(ry.atan2(rx) + rotation)
}

/// Smallest difference between two undirected orientations, in `[0, π/2]`.
pub fn orientation_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(PI);
    d.min(PI - d)
}

/// True when a dot of `radius` centred at (`x`, `y`) lies fully on a
/// `size`×`size` canvas.
pub fn dot_in_bounds(x: f64, y: f64, radius: f64, size: f64) -> bool {
    radius <= x && x < size - radius && radius <= y && y < size - radius
}
