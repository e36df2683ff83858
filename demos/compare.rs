use std::path::Path;
use syncratio::{ChunkParams, DEFAULT_BLOCK_SIZES, analyze, compare_chunks};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // compare <new> <basis> [block sizes...]
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (Some(new_path), Some(basis_path)) = (args.first(), args.get(1)) else {
        eprintln!("usage: compare <new> <basis> [block sizes...]");
        std::process::exit(2);
    };

    let mut sizes = args[2..]
        .iter()
        .map(|s| s.parse::<usize>())
        .collect::<Result<Vec<_>, _>>()?;
    if sizes.is_empty() {
        sizes = DEFAULT_BLOCK_SIZES.to_vec();
    }

    let new = std::fs::read(new_path)?;
    let basis = if Path::new(basis_path).is_file() {
        std::fs::read(basis_path)?
    } else {
        log::warn!("basis {basis_path} not found, treating it as empty");
        Vec::new()
    };

    let analysis = analyze(&basis, &new, &sizes)?;

    println!("new:   {new_path}");
    println!("basis: {basis_path}");
    println!();
    for report in &analysis.reports {
        println!("  {report}");
    }
    if let Some(best) = analysis.best() {
        println!();
        println!(
            "best: {} bytes, {:.2}% redundant ({} of {} bytes matched)",
            best.block_size,
            best.percent(),
            best.matched_bytes,
            best.total_bytes
        );
    }


    println!();
    println!("  {}", compare_chunks(&basis, &new, &ChunkParams::default()));

    Ok(())
}
