use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use serde_json::Value;
use suna_workflows::client::{ExecuteWorkflowRequest, HttpBackend, WorkflowBackend};
use suna_workflows::config::Config;
use suna_workflows::workflow::{
    convert_to_llm_format, convert_to_nested_json, load_steps, NoticeLevel, SaveOptions, Step,
    StepLoader, WorkflowEditor,
};

use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend API base URL (overrides NEXT_PUBLIC_BACKEND_URL)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Bearer token for the backend (overrides SUNA_ACCESS_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Editable step tree
    Tree,
    /// Nested wire format, as saved to the backend
    Nested,
    /// Plan handed to the agent's model
    Llm,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a steps file (nested, legacy flat or tree) to another format
    Convert {
        /// Path to a JSON or YAML steps file
        #[arg(short, long)]
        file: String,

        #[arg(short, long, value_enum, default_value = "nested")]
        to: Format,
    },
    /// List an agent's workflows
    List {
        #[arg(short, long)]
        agent: String,
    },
    /// Print one workflow's steps
    Show {
        #[arg(short, long)]
        agent: String,

        #[arg(short, long)]
        workflow: String,

        #[arg(short, long, value_enum, default_value = "tree")]
        to: Format,
    },
    /// Save a steps file as a new workflow, or over an existing one
    Push {
        #[arg(short, long)]
        agent: String,

        /// Existing workflow to overwrite; creates a new one when omitted
        #[arg(short, long)]
        workflow: Option<String>,

        #[arg(short, long)]
        file: String,

        /// Workflow name (required when creating)
        #[arg(short, long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        trigger_phrase: Option<String>,

        /// Activate a newly created workflow
        #[arg(long)]
        activate: bool,
    },
    /// Execute a workflow on the backend
    Run {
        #[arg(short, long)]
        agent: String,

        #[arg(short, long)]
        workflow: String,

        /// JSON input data
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Delete a workflow
    Delete {
        #[arg(short, long)]
        agent: String,

        #[arg(short, long)]
        workflow: String,
    },
    /// Serve the conversion API
    Serve {
        #[arg(short, long, default_value_t = 8787)]
        port: u16,
    },
}

fn render(steps: &[Step], format: Format) -> anyhow::Result<String> {
    let text = match format {
        Format::Tree => serde_json::to_string_pretty(steps)?,
        Format::Nested => serde_json::to_string_pretty(&convert_to_nested_json(steps))?,
        Format::Llm => serde_json::to_string_pretty(&convert_to_llm_format(steps))?,
    };
    Ok(text)
}

fn connect(args_url: Option<String>, args_token: Option<String>) -> anyhow::Result<Arc<HttpBackend>> {
    let config = match Config::from_env() {
        Ok(config) => config.with_overrides(args_url, args_token),
        Err(e) => match args_url {
            Some(url) => Config {
                backend_url: url,
                access_token: args_token,
                ..Default::default()
            },
            None => return Err(e).context("no backend URL configured"),
        },
    };
    Ok(Arc::new(HttpBackend::from_config(&config)?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let (url, token) = (args.backend_url, args.token);

    match args.command {
        Commands::Convert { file, to } => {
            let steps = StepLoader::new()
                .load_tree(&file)
                .with_context(|| format!("failed to load steps from {}", file))?;
            println!("{}", render(&steps, to)?);
        }
        Commands::List { agent } => {
            let backend = connect(url, token)?;
            for wf in backend.list_workflows(&agent).await? {
                println!(
                    "{}\t{:?}\t{}{}",
                    wf.id,
                    wf.status,
                    wf.name,
                    if wf.is_default { " (default)" } else { "" }
                );
            }
        }
        Commands::Show { agent, workflow, to } => {
            let backend = connect(url, token)?;
            let wf = backend.get_workflow(&agent, &workflow).await?;
            let steps = load_steps(&wf.steps)
                .with_context(|| format!("workflow {} has unreadable steps", wf.id))?;
            println!("{}", render(&steps, to)?);
        }
        Commands::Push {
            agent,
            workflow,
            file,
            name,
            description,
            trigger_phrase,
            activate,
        } => {
            let steps = StepLoader::new()
                .load_tree(&file)
                .with_context(|| format!("failed to load steps from {}", file))?;
            let backend = connect(url, token)?;

            let mut editor = match &workflow {
                Some(id) => WorkflowEditor::open(backend, agent, id).await?,
                None => WorkflowEditor::new(backend, agent),
            };

            editor.set_steps(steps)?;
            let draft = editor.draft_mut();
            if let Some(name) = name {
                draft.name = name;
            }
            if description.is_some() {
                draft.description = description;
            }
            if trigger_phrase.is_some() {
                draft.trigger_phrase = trigger_phrase;
            }

            let result = editor
                .save(SaveOptions {
                    activate_on_create: activate,
                })
                .await;

            for notice in editor.take_notices() {
                match notice.level {
                    NoticeLevel::Info => log::info!("{}", notice.message),
                    NoticeLevel::Warning => log::warn!("{}", notice.message),
                    NoticeLevel::Error => log::error!("{}", notice.message),
                }
            }

            let saved = result?;
            println!("Saved workflow {} ({:?})", saved.id, saved.status);
        }
        Commands::Run {
            agent,
            workflow,
            input,
        } => {
            let input_data = match input {
                Some(raw) => {
                    Some(serde_json::from_str::<Value>(&raw).context("--input must be valid JSON")?)
                }
                None => None,
            };
            let backend = connect(url, token)?;
            let response = backend
                .execute_workflow(&agent, &workflow, &ExecuteWorkflowRequest { input_data })
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Delete { agent, workflow } => {
            let backend = connect(url, token)?;
            backend.delete_workflow(&agent, &workflow).await?;
            println!("Deleted workflow {}", workflow);
        }
        Commands::Serve { port } => {
            suna_workflows::server::serve(port).await?;
        }
    }

    Ok(())
}
