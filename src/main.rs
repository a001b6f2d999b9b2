use std::env;
use std::error::Error;
use std::fs;

use cdd_engine::{DecisionModel, Evaluator, ResolverCache, create_runtime_registry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err("Usage: cdd-eval <model.json> [active model indices...]".into());
    }

    let json_str = fs::read_to_string(&args[1])?;
    let model = DecisionModel::load(&json_str)?;

    let active: Vec<usize> = if args.len() > 2 {
        args[2..]
            .iter()
            .map(|a| a.parse::<usize>())
            .collect::<Result<_, _>>()?
    } else {
        (0..model.runnable_models.len()).collect()
    };

    let runtimes = create_runtime_registry();
    let cache = ResolverCache::new();
    let resolved = cache.resolve(&model, &runtimes);

    let snapshot = model.snapshot();
    let evaluator = Evaluator::new();
    let result = evaluator
        .evaluate(&model, &resolved.functions, &resolved.assets, &snapshot, &active)
        .await?;

    println!("Model: {} ({} runnable models)", model.meta.name, model.runnable_models.len());
    let mut names: Vec<_> = model
        .io_values
        .iter()
        .map(|def| (def.name.as_str(), def.id))
        .collect();
    names.sort();
    for (name, id) in names {
        match result.get(&id) {
            Some(value) => println!("  {} = {}", name, serde_json::Value::from(value)),
            None => println!("  {} = <unresolved>", name),
        }
    }

    Ok(())
}
