use std::sync::Arc;

use eel::{
    CompilingEvaluator, Context, EelEvaluator, FileExpressionStore, InterpretedEvaluator,
    ProgramCache,
};

fn main() {
    env_logger::init();

    let args: Vec<_> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <expression> [bindings] [store]", args[0]);
        return;
    }

    let bindings: serde_json::Value = if args.len() >= 3 {
        serde_json::from_str(&args[2]).expect("Failed to parse bindings")
    } else {
        serde_json::json!({})
    };
    let ctx = Context::new(bindings);

    let evaluator: Box<dyn EelEvaluator> = match args.get(3) {
        Some(path) => {
            let cache = ProgramCache::with_store(FileExpressionStore::new(path))
                .expect("Failed to load expression store");
            Box::new(CompilingEvaluator::with_cache(Arc::new(cache)))
        }
        None => Box::new(InterpretedEvaluator::new()),
    };

    match evaluator.evaluate(&args[1], &ctx) {
        Ok(res) => println!("{}", res),
        Err(err) => eprintln!("{}", err),
    }
}
