use ptaflow_core::analysis::{analyze, AnalysisError};
use ptaflow_core::format::format_module;
use ptaflow_core::{ModuleBuilder, Type};

fn main() -> Result<(), AnalysisError> {
    println!("Building a two-level pointer chain...\n");

    let mut builder = ModuleBuilder::new("pointer_chain");
    let mut f = builder.function("main", Type::Void);
    let p = f.alloca("p", Type::Int(32));
    let q = f.alloca("q", Type::ptr_to(Type::Int(32)));
    let five = f.const_int(5, Type::Int(32));
    f.store(five, p);
    f.store(p, q);
    let r1 = f.load("r1", q);
    f.load("r2", r1);
    f.ret(None);
    if let Err(e) = f.build() {
        eprintln!("invalid function: {}", e);
        return Ok(());
    }
    let module = builder.build();

    println!("{}", format_module(&module));

    let result = analyze(&module, "main")?;
    let Some(main) = module.get_function("main") else {
        return Ok(());
    };
    let Some(facts) = result.function("main") else {
        return Ok(());
    };

    println!("=== Points-to ===");
    for (context, value, targets) in facts.points_to.iter() {
        let names: Vec<String> = targets
            .iter()
            .map(|target| facts.target_name(main, *target))
            .collect();
        println!("  {} {} -> {{{}}}", context, main.value_name(value), names.join(", "));
    }

    println!("\n=== Aliases ===");
    for (context, value, aliases) in facts.aliases.iter() {
        let names: Vec<String> = aliases.iter().map(|a| main.value_name(*a)).collect();
        println!("  {} {} ~ {{{}}}", context, main.value_name(value), names.join(", "));
    }

    println!(
        "\n{} level(s), {} propagation step(s), {} diagnostic(s)",
        facts.max_level,
        facts.steps,
        result.diagnostics.len()
    );
    Ok(())
}
