use std::path::Path;

use anyhow::{Context, Result};

use workbench::{Workbench, WorkbenchConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let usage = "usage: run_pipeline <config.json> <pipeline> <location>";
    let config_path = args.next().context(usage)?;
    let pipeline_name = args.next().context(usage)?;
    let location = args.next().context(usage)?;

    let config = WorkbenchConfig::from_file(Path::new(&config_path))?;
    let mut workbench = Workbench::new(config)?;

    let count = workbench.run_pipeline(&pipeline_name, Path::new(&location))?;
    tracing::info!(documents = count, "done");

    for document in workbench.documents() {
        let rendered = model::render::render_document_facts(document);
        if !rendered.is_empty() {
            println!("{rendered}");
        }
    }
    Ok(())
}
