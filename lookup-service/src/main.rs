//! revit-lookup command-line inspector
//!
//! Snoops a target of the in-memory demo host and prints the member tree:
//! - Settings loaded once from a JSON document, overridable by flags and env
//! - Member passes with per-member timing and allocation diagnostics
//! - Optional JSON output and prometheus metrics dump

use anyhow::Result;
use clap::Parser;
use lookup_core::config::get_config_opt;
use lookup_core::{Context, Settings, SettingsStore};
use lookup_inspector::{HostCommandQueue, InspectorSession, NotificationLevel, Notifier, SnoopTarget};
use lookup_introspection::{CountingAllocator, Descriptor, DescriptorView, InspectionMetrics};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

mod demo;

use demo::DemoHost;

const DEFAULT_SETTINGS_FILE: &str = "lookup-settings.json";

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

#[derive(Parser, Debug)]
#[command(name = "revit-lookup")]
#[command(about = "Inspect host objects and their members")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// What to snoop
    #[arg(short, long, default_value = "selection")]
    target: SnoopTarget,

    /// Root to show when the target yields several
    #[arg(long, default_value = "0")]
    root: usize,

    /// Levels of child objects to expand
    #[arg(short, long, default_value = "0")]
    depth: usize,

    /// Only show members whose name or value contains this text
    #[arg(short, long)]
    search: Option<String>,

    /// Settings document (defaults to $LOOKUP_SETTINGS, then lookup-settings.json)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Show private members
    #[arg(long)]
    private: bool,

    /// Show static members
    #[arg(long = "static")]
    statics: bool,

    /// Show fields
    #[arg(long)]
    fields: bool,

    /// Show events
    #[arg(long)]
    events: bool,

    /// Show members that cannot be evaluated
    #[arg(long)]
    unsupported: bool,

    /// Show members inherited from Object
    #[arg(long)]
    root_hierarchy: bool,

    /// Hide extension entries
    #[arg(long)]
    no_extensions: bool,

    /// Hide the time and allocation column
    #[arg(long)]
    no_time: bool,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Print prometheus metrics after the tree
    #[arg(long)]
    metrics: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Write the default settings document
    InitSettings,
    /// List snoop targets
    Targets,
}

impl Args {
    /// Flags only ever switch a filter on (or the extensions/time column off)
    fn apply(&self, settings: &mut Settings) {
        settings.include_private |= self.private;
        settings.include_static |= self.statics;
        settings.include_fields |= self.fields;
        settings.include_events |= self.events;
        settings.include_unsupported |= self.unsupported;
        settings.include_root_hierarchy |= self.root_hierarchy;
        if self.no_extensions {
            settings.include_extensions = false;
        }
        if self.no_time {
            settings.show_time_column = false;
        }
    }
}

/// Descriptor with its expanded children
#[derive(Serialize)]
struct Node {
    #[serde(flatten)]
    view: DescriptorView,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<Node>,
}

fn tree(members: &[Descriptor], depth: usize) -> Vec<Node> {
    members
        .iter()
        .map(|descriptor| Node {
            view: descriptor.view(),
            children: if depth > 0 && descriptor.value.has_children() {
                tree(&descriptor.value.get_members(), depth - 1)
            } else {
                Vec::new()
            },
        })
        .collect()
}

fn print_tree(nodes: &[Node], indent: usize, show_time: bool) {
    for node in nodes {
        let view = &node.view;
        let name = format!("{:indent$}{}", "", view.name, indent = indent * 2);
        let mut line = format!("{:<40} {:<36} {}", name, view.value, view.declaring_type);
        if view.attributes != "public" {
            line.push_str(&format!(" [{}]", view.attributes));
        }
        if show_time {
            line = format!("{:<100} {:>9.3} ms {:>9} B", line, view.time_ms, view.allocated_bytes);
        }
        println!("{}", line);
        print_tree(&node.children, indent + 1, show_time);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from /etc/revit-lookup/environment (if exists)
    lookup_core::config::load_environment();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lookup_service=info".parse()?)
                .add_directive("lookup_inspector=info".parse()?)
                .add_directive("lookup_introspection=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings_path = args
        .settings
        .clone()
        .or_else(|| get_config_opt("LOOKUP_SETTINGS").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));
    let store = SettingsStore::new(settings_path);

    match &args.command {
        Some(Commands::InitSettings) => {
            store.save(&Settings::default())?;
            println!("Wrote {}", store.path().display());
            return Ok(());
        }
        Some(Commands::Targets) => {
            for target in SnoopTarget::ALL {
                let mode = if target.pick_kind().is_some() { "pick" } else { "direct" };
                println!("{:<16} {}", target, mode);
            }
            return Ok(());
        }
        None => {}
    }

    let mut settings = store.load_with_env()?;
    args.apply(&mut settings);

    let metrics = InspectionMetrics::new()?;
    let host = DemoHost::new();
    let context = Context::with_document(host.clone());
    let queue = HostCommandQueue::start(host, context.clone())?;
    let (notifier, mut notifications) = Notifier::channel();
    let mut session = InspectorSession::new(queue, context, settings.snapshot(), notifier)
        .with_metrics(metrics.clone());

    info!(snoop_target = %args.target, "Snooping");
    if session.snoop(args.target).await && args.root > 0 {
        session.select(args.root).await;
    }

    while let Ok(notification) = notifications.try_recv() {
        let level = match notification.level {
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        };
        eprintln!("{}: {}", level, notification.message);
    }

    if let Some(current) = session.current() {
        let members = match &args.search {
            Some(query) => session.search(query),
            None => session.displayed().map(|m| m.to_vec()).unwrap_or_default(),
        };

        if args.json {
            println!("{}", serde_json::to_string_pretty(&tree(&members, args.depth))?);
        } else {
            let summary = current.summary();
            println!("{} ({})", summary.text, summary.type_full_name);
            for section in lookup_inspector::sections(&members) {
                let header = section.header();
                println!("\n== {} ({}) ==", header.title, header.count);
                print_tree(
                    &tree(&section.members, args.depth),
                    1,
                    settings.show_time_column,
                );
            }
        }
    }

    if args.metrics {
        print!("{}", metrics.gather_text()?);
    }
    Ok(())
}
