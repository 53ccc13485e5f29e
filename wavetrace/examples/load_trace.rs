// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License

use clap::Parser;
use wavetrace::*;

#[derive(Parser, Debug)]
#[command(name = "loadtrace")]
#[command(version)]
#[command(about = "Loads a VCD file and prints the value of every net at a point in time.", long_about = None)]
struct Args {
    #[arg(value_name = "VCDFILE", index = 1)]
    filename: String,
    #[arg(long, help = "time in ns at which to sample the nets, defaults to the end of the trace")]
    time: Option<Time>,
    #[arg(long, default_value_t = 2, help = "radix used to print values (2, 10 or 16)")]
    radix: u32,
    #[arg(long, default_value_t = 1, help = "ns per tick if the file has no $timescale")]
    timescale: u64,
}

fn print_tree(model: &TraceDataModel, node: TreeNode, depth: usize, time: Time, radix: u32) {
    for child in model.child_nodes(node) {
        let indent = "  ".repeat(depth);
        match model.net_for_tree_node(child) {
            Some(net) => {
                let value = model
                    .find_transition(net, time)
                    .current()
                    .map(|t| t.value().format(radix).unwrap_or_else(|e| e.to_string()))
                    .unwrap_or_else(|| "-".to_string());
                println!("{indent}{} = {value}", model.node_name(child));
            }
            None => {
                println!("{indent}{}", model.node_name(child));
                print_tree(model, child, depth + 1, time, radix);
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let options = LoadOptions {
        default_timescale_ns: args.timescale,
    };

    let start = std::time::Instant::now();
    let mut model = TraceDataModel::new();
    let stats = viewers::load_file(&args.filename, &options, &mut model)?;
    println!(
        "Loaded {} nets ({} unique) and {} transitions in {:?}",
        stats.nets,
        stats.ids,
        stats.transitions,
        start.elapsed()
    );

    let time = args.time.unwrap_or(model.max_timestamp());
    println!("Values at {time} ns:");
    print_tree(&model, model.tree_root(), 0, time, args.radix);
    Ok(())
}
