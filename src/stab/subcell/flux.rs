/// Numerical flux through a subcell face with unit normal `normal` pointing
/// from the `u_m` side to the `u_p` side, evaluated at face center `x`.
pub trait SubcellFlux {
    fn flux(&self, u_m: f64, u_p: f64, normal: [f64; 2], x: [f64; 2]) -> f64;
    /// Flux through a physical boundary face; extrapolates the interior state by default.
    fn boundary_flux(&self, u_m: f64, normal: [f64; 2], x: [f64; 2]) -> f64 {
        self.flux(u_m, u_m, normal, x)
    }
}

/// Upwind flux of linear advection with constant velocity.
#[derive(Clone, Copy, Debug)]
pub struct UpwindAdvection {
    pub velocity: [f64; 2],
}

impl SubcellFlux for UpwindAdvection {
    fn flux(&self, u_m: f64, u_p: f64, normal: [f64; 2], _x: [f64; 2]) -> f64 {
        let vn = self.velocity[0] * normal[0] + self.velocity[1] * normal[1];
        if vn >= 0.0 { vn * u_m } else { vn * u_p }
    }
}

/// Rusanov flux of the 2D Burgers equation `u_t + (u^2/2)_x + (u^2/2)_y = 0`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RusanovBurgers;

impl SubcellFlux for RusanovBurgers {
    fn flux(&self, u_m: f64, u_p: f64, normal: [f64; 2], _x: [f64; 2]) -> f64 {
        let n_sum = normal[0] + normal[1];
        let fl = 0.5 * u_m * u_m * n_sum;
        let fr = 0.5 * u_p * u_p * n_sum;
        // characteristic speed u (n_x + n_y)
        let wave_speed = u_m.abs().max(u_p.abs()) * n_sum.abs();
        0.5 * (fl + fr - wave_speed * (u_p - u_m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fluxes_consistent_and_conservative() {
        let fluxes: [Box<dyn SubcellFlux>; 2] = [
            Box::new(UpwindAdvection {
                velocity: [1.0, -0.5],
            }),
            Box::new(RusanovBurgers),
        ];
        let n = [0.6, 0.8];
        let minus_n = [-0.6, -0.8];
        for flux in &fluxes {
            assert_relative_eq!(
                flux.flux(1.3, -0.4, n, [0.0; 2]),
                -flux.flux(-0.4, 1.3, minus_n, [0.0; 2]),
                epsilon = 1e-14
            );
            assert_relative_eq!(
                flux.boundary_flux(2.0, n, [0.0; 2]),
                flux.flux(2.0, 2.0, n, [0.0; 2]),
                epsilon = 1e-14
            );
        }
        let burgers = RusanovBurgers.flux(2.0, 2.0, [1.0, 0.0], [0.0; 2]);
        assert_relative_eq!(burgers, 2.0, epsilon = 1e-14);
    }
}
