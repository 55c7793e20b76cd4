use facet::Facet;
use figue as args;
use heapscope::synthetic::SyntheticHeap;
use heapscope::{NullPolicy, Publisher, PublisherConfig, Session, format_history};
use tracing::info;

mod scenarios;

type AnyResult<T> = Result<T, String>;

const DEFAULT_K: u32 = 3;

#[derive(Facet, Debug)]
struct Cli {
    #[facet(flatten)]
    builtins: args::FigueBuiltins,
    #[facet(args::named, default)]
    listen: Option<String>,
    #[facet(args::named, default)]
    null_sentinels: bool,
    #[facet(args::named, default)]
    hold: bool,
    #[facet(args::subcommand)]
    command: ScenarioKind,
}

#[derive(Facet, Debug)]
#[repr(u8)]
enum ScenarioKind {
    LinearList,
    CyclicLists,
    BinaryTree,
    ListMutation,
    ReverseKGroup {
        #[facet(args::named, default)]
        k: Option<u32>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

async fn run() -> AnyResult<()> {
    let cli = parse_cli()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut config = PublisherConfig::from_env();
    if let Some(listen) = cli.listen {
        config = config.with_listen_addr(listen);
    }
    let publisher = Publisher::start(config).map_err(|e| e.to_string())?;
    println!("Publishing on ws://{}/ws", publisher.local_addr());

    let mut session = Session::new(SyntheticHeap::new(), publisher);
    if cli.null_sentinels {
        session = session.with_null_policy(NullPolicy::Sentinel);
    }

    dispatch(&mut session, cli.command)?;

    let listing = session.list_history();
    info!(snapshots = listing.len(), "scenario finished");
    if !listing.is_empty() {
        println!("{}", format_history(&listing));
    }

    if cli.hold {
        println!("Holding the session open; press ctrl-c to exit");
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| format!("failed to wait for ctrl-c: {e}"))?;
    }
    Ok(())
}

fn dispatch(session: &mut Session<SyntheticHeap>, command: ScenarioKind) -> AnyResult<()> {
    match command {
        ScenarioKind::LinearList => scenarios::linear_list::run(session),
        ScenarioKind::CyclicLists => scenarios::cyclic_lists::run(session),
        ScenarioKind::BinaryTree => scenarios::binary_tree::run(session),
        ScenarioKind::ListMutation => scenarios::list_mutation::run(session),
        ScenarioKind::ReverseKGroup { k } => {
            scenarios::reverse_k_group::run(session, k.unwrap_or(DEFAULT_K))
        }
    }
}

fn parse_cli() -> AnyResult<Cli> {
    let figue_config = args::builder::<Cli>()
        .map_err(|e| format!("failed to build CLI schema: {e}"))?
        .cli(|cli| cli.strict())
        .help(|h| {
            h.program_name("heapscope-examples")
                .description("Run heapscope demo scenarios as subcommands")
                .version(option_env!("CARGO_PKG_VERSION").unwrap_or("dev"))
        })
        .build();

    args::Driver::new(figue_config)
        .run()
        .into_result()
        .map(|v| v.value)
        .map_err(|e| e.to_string())
}
