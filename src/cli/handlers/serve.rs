use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::{
    sync::{Arc, atomic::Ordering},
    time::Duration,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    cli::{dispatcher::AppContext, handlers::commons},
    system::{
        relay,
        transport::{ChatTransport, ConsoleTransport},
    },
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Loads the action aliases, starts the relay webhook and answers chat lines read from stdin."
)]
struct ServeArgs {
    /// Do not start the relay webhook.
    #[arg(long)]
    no_relay: bool,

    /// Address for the relay webhook, overriding `relay.bind`.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
}

/// The main handler for the `serve` command.
pub fn handle(args: Vec<String>, context: &AppContext) -> Result<()> {
    let serve_args = ServeArgs::try_parse_from(&args)?;
    let settings = &context.settings;
    let services = commons::build_services(settings)?;
    let transport: Arc<dyn ChatTransport> = Arc::new(ConsoleTransport);

    commons::runtime()?.block_on(async {
        let snapshot = services.refresher.warm_start().await;

        let interval = Duration::from_secs(settings.stackstorm.timer_update.max(1));
        let refresh_task = Arc::clone(&services.refresher)
            .spawn(interval, Arc::clone(&context.cancellation_token));

        let relay_task = if settings.relay.enabled && !serve_args.no_relay {
            let bind = serve_args.bind.as_deref().unwrap_or(&settings.relay.bind);
            let (listener, addr) = relay::bind(bind)
                .await
                .with_context(|| format!("Failed to bind the relay webhook on '{}'", bind))?;
            println!("{}", format!(t!("serve.relay"), addr = addr).dimmed());
            let relay_transport = Arc::clone(&transport);
            Some(tokio::spawn(async move {
                if let Err(e) = relay::serve(listener, relay_transport).await {
                    log::error!("Relay webhook stopped: {}", e);
                }
            }))
        } else {
            None
        };

        println!(
            "{}",
            format!(t!("serve.listening"), count = snapshot.patterns.len()).green()
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let outcome: Result<()> = loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if let Some(reply) = services.chatops.handle_line(line.trim_end()).await {
                            if let Err(e) = transport.send("", &reply).await {
                                break Err(e).context("Failed to write the reply");
                            }
                        }
                    }
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e).context("Failed to read from stdin"),
                },
                _ = tokio::signal::ctrl_c() => break Ok(()),
            }
        };

        context.cancellation_token.store(true, Ordering::Relaxed);
        refresh_task.abort();
        if let Some(task) = relay_task {
            task.abort();
        }
        println!("{}", t!("serve.stopped"));
        outcome
    })
}
