//! Headless workspace runner: load a workspace, evaluate it, report.

use std::env;
use std::process::ExitCode;

use log::error;

use flowvis::model::workspace::WorkspaceDocument;
use flowvis::network::ProcessorNetwork;
use flowvis::util::PoolConfig;
use flowvis::{EngineContext, EngineError};

const MAX_PASSES: usize = 16;

fn main() -> ExitCode {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: flowvis <workspace.json>");
        return ExitCode::from(2);
    };

    match run(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(path: &str) -> Result<(), EngineError> {
    let context = EngineContext::new(PoolConfig::default());
    let mut network = ProcessorNetwork::new();

    let document = WorkspaceDocument::load(path)?;
    let problems = document.instantiate(context.factory(), &mut network)?;
    for problem in &problems {
        eprintln!("warning: {}", problem);
    }

    let mut evaluator = context.evaluator();
    let mut summary = context.run_until_settled(&mut evaluator, &mut network, MAX_PASSES)?;

    // Background jobs may still be in flight; poll until the network stops
    // asking for passes or nothing new arrives.
    for _ in 0..MAX_PASSES {
        std::thread::sleep(std::time::Duration::from_millis(10));
        if context.dispatcher().drain(&mut network) == 0 && !network.evaluation_requested() {
            break;
        }
        summary = context.run_until_settled(&mut evaluator, &mut network, MAX_PASSES)?;
    }

    println!(
        "{} processor(s): {} processed, {} skipped, {} not ready, {} failed",
        network.processor_count(),
        summary.processed.len(),
        summary.skipped.len(),
        summary.not_ready.len(),
        summary.failed.len()
    );
    for (processor, message) in &summary.failed {
        println!("  failed: {}: {}", processor, message);
    }
    for processor in network.processors() {
        for outport in processor.outports() {
            if let Some(data) = outport.data() {
                println!("  {}.{} = {:?}", processor.identifier(), outport.identifier(), data);
            }
        }
    }
    Ok(())
}
