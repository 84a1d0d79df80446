use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};
use log::{error, info};
use shader_graph::catalogue;
use shader_graph::config::{self, ProgramConfig};
use shader_graph::model::NodeId;
use shader_graph::{Document, persist};

const USAGE: &str =
    "supported: --graph <model.json>, --node <id>, --catalogue <types.json>, --config <config.json>";

#[derive(Debug, Default, Clone)]
struct Cli {
    graph: Option<PathBuf>,
    node: Option<NodeId>,
    catalogue: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_cli(args: &[String]) -> Result<Cli> {
    let mut cli = Cli::default();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = || {
            args.get(i + 1)
                .ok_or_else(|| anyhow!("missing value for {flag}"))
        };
        match flag {
            "--graph" => cli.graph = Some(PathBuf::from(value()?)),
            "--node" => {
                let v = value()?;
                let id: u32 = v
                    .parse()
                    .map_err(|e| anyhow!("invalid node id '{v}' for --node: {e}"))?;
                cli.node = Some(NodeId(id));
            }
            "--catalogue" => cli.catalogue = Some(PathBuf::from(value()?)),
            "--config" => cli.config = Some(PathBuf::from(value()?)),
            other => bail!("unknown argument: {other} ({USAGE})"),
        }
        i += 2;
    }
    Ok(cli)
}

fn run(cli: Cli) -> Result<bool> {
    let graph_path = cli
        .graph
        .ok_or_else(|| anyhow!("--graph <model.json> is required ({USAGE})"))?;

    let mut types = catalogue::load_default_catalogue()?;
    if let Some(path) = cli.catalogue.as_deref() {
        let user = catalogue::load_catalogue_from_path(path)?;
        info!("merging {} node type(s) from {}", user.len(), path.display());
        types = catalogue::merge_catalogues(&types, &user);
    }

    let config = match cli.config.as_deref() {
        Some(path) => config::load_config_from_path(path)?,
        None => ProgramConfig::default(),
    };

    let mut doc = Document::new(types);
    doc.apply_persisted(persist::load_model_from_path(&graph_path)?);
    let previews = doc.compile(&config);
    info!(
        "compiled {} node(s) from {}",
        previews.len(),
        graph_path.display()
    );

    let selected: Vec<_> = match cli.node {
        Some(id) => {
            let Some(result) = previews.get(&id) else {
                bail!("node {id} is not part of {}", graph_path.display());
            };
            vec![(id, result)]
        }
        None => previews.iter().map(|(id, r)| (*id, r)).collect(),
    };

    let mut ok = true;
    for (id, result) in selected {
        match result {
            Ok(program) => {
                println!("// node {id}");
                print!("{program}");
            }
            Err(errors) => {
                ok = false;
                error!("node {id} failed to compile ({} error(s))", errors.len());
                for e in errors {
                    eprintln!("  {e}");
                }
            }
        }
    }

    // Only a requested node decides the exit status.
    Ok(ok || cli.node.is_none())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_cli(&argv)?;
    if !run(cli)? {
        std::process::exit(1);
    }
    Ok(())
}
