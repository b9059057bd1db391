mod backend;
mod program_config;
mod protocol;
mod query;
mod query_dispatcher;
mod query_response;
mod render_surface;
mod result_renderer;

use crate::backend::http::HttpQueryBackend;
use crate::backend::QueryBackend;
use crate::program_config::{
    AclCheckArgs, OutputConfig, OutputFormat, ProgramConfig, Query, ReachabilityArgs,
};
use crate::query_dispatcher::{AclCheckForm, QueryDispatcher, ReachabilityForm};
use crate::render_surface::{writer, RenderSurface};
use crate::result_renderer::ResultRenderer;
use anyhow::Context;
use env_logger::Env;
use std::cell::RefCell;
use std::rc::Rc;
use tokio::task::LocalSet;
use tokio::time::{timeout, Duration};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Parse options
    let config = ProgramConfig::parse();

    // Set up logging
    env_logger::Builder::from_env(Env::default().default_filter_or(if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }))
    .format_timestamp(None)
    .format_module_path(false)
    .init();

    // Backend answers are rendered on this thread only
    LocalSet::new().run_until(run(config)).await
}

async fn run(config: ProgramConfig) -> anyhow::Result<()> {
    let backend: Rc<dyn QueryBackend> = Rc::new(
        HttpQueryBackend::new(config.endpoint).context("Failed to initialize backend client")?,
    );

    let renderer = Rc::new(ResultRenderer::new(
        Rc::new(RefCell::new(RenderSurface::new())),
        backend.clone(),
    ));
    let surface = renderer.surface().clone();

    let outcome = match config.query {
        Query::Policies => {
            let policies = backend::fetch_policies(&*backend)
                .await
                .context("Failed to fetch policy list")?;
            for policy in policies {
                println!("{}", policy);
            }
            return Ok(());
        }
        Query::CheckAcl(args) => {
            let mut dispatcher = QueryDispatcher::new(AclCheckForm::new(), backend, renderer);
            dispatcher
                .bootstrap()
                .await
                .context("Failed to fetch policy list")?;
            fill_acl_check_form(dispatcher.form_mut(), args)?;
            log::info!(
                "Checking against policy file '{}'",
                dispatcher.form().policy_file.value().unwrap_or_default()
            );
            dispatcher.submit().await
        }
        Query::CheckUtnet(args) => {
            let mut dispatcher =
                QueryDispatcher::new(ReachabilityForm::new(), backend, renderer);
            fill_reachability_form(dispatcher.form_mut(), args);
            dispatcher.submit().await
        }
    };

    match outcome {
        Ok(pass) => {
            log::info!("Backend matched {} rule(s)", pass.tables);
            let wait = Duration::from_secs(config.output.enrichment_wait);
            if timeout(wait, pass.settle()).await.is_err() {
                log::warn!(
                    "Hostname lookups did not finish within {}s, printing without them",
                    wait.as_secs()
                );
            }
            print_report(&surface.borrow(), config.output);
            Ok(())
        }
        Err(e) => {
            print_report(&surface.borrow(), config.output);
            Err(e).context("Query failed")
        }
    }
}

fn fill_acl_check_form(form: &mut AclCheckForm, args: AclCheckArgs) -> anyhow::Result<()> {
    if let Some(policy_file) = &args.policy_file {
        form.policy_file.select(policy_file)?;
    }
    for protocol in args.protocols {
        form.protocols.set_checked(protocol, true);
    }
    form.destination_addresses = args.destination_addresses;
    form.destination_ports = args.destination_ports;
    form.source_addresses = args.source_addresses;
    form.source_ports = args.source_ports;
    Ok(())
}

fn fill_reachability_form(form: &mut ReachabilityForm, args: ReachabilityArgs) {
    for protocol in args.protocols {
        form.protocols.set_checked(protocol, true);
    }
    form.addresses1 = args.addresses1;
    form.ports1 = args.ports1;
    form.addresses2 = args.addresses2;
    form.ports2 = args.ports2;
}

fn print_report(surface: &RenderSurface, output: OutputConfig) {
    let report = match output.format {
        OutputFormat::text => writer::write_text(surface),
        OutputFormat::html => writer::write_html(surface),
    };
    print!("{}", report);
}
