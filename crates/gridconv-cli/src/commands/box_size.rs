use crate::cli::BoxArgs;
use crate::error::{CliError, Result};
use gridconv::core::utils::box_size::box_dimensions;
use tracing::info;

pub fn run(args: BoxArgs) -> Result<()> {
    let dims = box_dimensions(&args.species, args.density)
        .map_err(|e| CliError::Argument(e.to_string()))?;
    info!(
        species = args.species.len(),
        density = args.density,
        volume = dims.volume,
        "Computed box dimensions."
    );

    println!("Volume:           {:.6}", dims.volume);
    println!("Cubic box length: {:.6}", dims.cubic_length);
    println!("Sphere radius:    {:.6}", dims.spherical_radius);
    Ok(())
}
