use ndarray::Array3;

use shock_stab::error::Result;
use shock_stab::initialization::{initialize_mesh, initialize_solution};
use shock_stab::io::param_parser::DemoParams;
use shock_stab::stab::{Stab, subcell::flux::RusanovBurgers};

fn run(file_path: &str) -> Result<()> {
    let params = DemoParams::parse(file_path)?;
    params.stab.report();
    let mesh = initialize_mesh(&params)?;
    log::info!(
        "mesh: {} {} elements, N = {}, Np = {}",
        mesh.nelements,
        mesh.element_type,
        mesh.n(),
        mesh.np()
    );

    let mut stab = Stab::setup_with_flux(&mesh, params.stab.clone(), Box::new(RusanovBurgers))?;
    let mut q = initialize_solution(&mesh, stab.s_nfields, params.shock_position);
    let mut rhs = Array3::<f64>::zeros(q.raw_dim());
    stab.apply(q.view_mut(), rhs.view_mut(), params.time)?;
    stab.report(params.time, 0)?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let file_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "inputs/stabparam.json".to_string());
    if let Err(e) = run(&file_path) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
