// SPDX-License-Identifier: MIT

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use stagecraft_rs::kit::config::Settings;
use stagecraft_rs::kit::error::StageError;
use stagecraft_rs::stagecraft::capability::{Capabilities, InspectorMode};
use stagecraft_rs::stagecraft::condition::{node_scope, visible_props};
use stagecraft_rs::stagecraft::expr::{self, BindingScope};
use stagecraft_rs::stagecraft::flow::Dispatcher;
use stagecraft_rs::stagecraft::model::{Node, Project, TAG_PROP};
use stagecraft_rs::stagecraft::policy::PolicyLoader;
use stagecraft_rs::stagecraft::server::{self, AppState};
use stagecraft_rs::stagecraft::store::{Snapshot, SnapshotProvider, Store, StoreEffects};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a when-expression
    Eval {
        /// Expression text
        #[arg(short, long)]
        expr: String,

        /// JSON file with `{data, node, project}`
        #[arg(short, long)]
        scope: Option<PathBuf>,
    },
    /// Show what the inspector allows for a component
    Inspect {
        /// Component-type id
        #[arg(short, long)]
        component: String,

        /// Tag override
        #[arg(short, long)]
        tag: Option<String>,

        /// standard, template or expert
        #[arg(short, long, default_value = "standard")]
        mode: InspectorMode,

        /// Template the node instantiates
        #[arg(long)]
        template: Option<String>,
    },
    /// Fire an event against a project file and print what happened
    Dispatch {
        /// Project file (JSON or YAML)
        #[arg(short, long)]
        project: PathBuf,

        #[arg(short, long)]
        node: String,

        #[arg(short, long, default_value = "click")]
        event: String,

        /// JSON file with the initial runtime data
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Run the HTTP API
    Serve {
        /// Overrides STAGECRAFT_PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn read_json(path: &Path) -> Result<Value, StageError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn read_project(path: &Path) -> Result<Project, StageError> {
    let content = std::fs::read_to_string(path)?;
    let project = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };
    Ok(project)
}

fn eval_expression(text: &str, scope: &BindingScope) -> Result<Option<Value>, StageError> {
    let parsed = expr::parse(text)?;
    Ok(expr::evaluate_expr(&parsed, scope))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let settings = Settings::from_env()?;
    let registry = PolicyLoader::new().load_or_builtin(settings.policy_path.as_ref())?;

    match args.command {
        Commands::Eval { expr: text, scope } => {
            let scope = match scope {
                Some(path) => BindingScope::from_json(&read_json(&path)?),
                None => BindingScope::default(),
            };
            match eval_expression(&text, &scope) {
                Ok(value) => {
                    println!("{}", expr::is_truthy(value.as_ref()));
                    log::debug!("Raw value: {:?}", value);
                }
                Err(e) => {
                    log::warn!("{}", e);
                    println!("false");
                }
            }
        }
        Commands::Inspect {
            component,
            tag,
            mode,
            template,
        } => {
            let mut node = Node::new("inspect", component);
            if let Some(tag) = tag {
                node.props.insert(TAG_PROP.to_string(), Value::String(tag));
            }
            node.template = template;

            let caps = Capabilities::for_node(&registry, &node, mode);
            let scope = node_scope(Value::Object(Map::new()), &node, None);
            let props: Vec<&str> = visible_props(&registry, &node, &scope)
                .into_iter()
                .filter(|p| caps.allows_prop(&p.key))
                .map(|p| p.key.as_str())
                .collect();

            let out = json!({
                "capabilities": caps.report(),
                "visibleProps": props,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Dispatch {
            project,
            node,
            event,
            data,
        } => {
            let mut snapshot = Snapshot::new(read_project(&project)?);
            if let Some(path) = data {
                snapshot = snapshot.with_data(read_json(&path)?);
            }
            let store = Store::new(snapshot);

            let (tx, mut rx) = mpsc::channel(100);
            let effects = StoreEffects::new(store.clone(), settings.http_timeout)?.with_events(tx);
            let printer = tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    match serde_json::to_string(&event) {
                        Ok(line) => println!("{}", line),
                        Err(e) => log::error!("Failed to print event: {}", e),
                    }
                }
            });

            let dispatcher = Dispatcher::new(Arc::new(store.clone()), Arc::new(effects));
            let report = dispatcher.dispatch(&node, &event).await;
            drop(dispatcher);
            printer.await?;

            let final_state = store.snapshot().await;
            let out = json!({
                "report": report,
                "revision": final_state.revision,
                "ui": final_state.ui,
                "data": final_state.data,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(settings.port);
            server::serve(port, AppState::new(registry, &settings)).await?;
        }
    }

    Ok(())
}
